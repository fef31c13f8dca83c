//! Event dispatch tests

mod common;

use std::sync::Arc;

use common::{build, build_type, git_root, publisher_feature, revision, FakeServer, RecordingSettings};
use deployments_status_publisher::app::console::ConsoleHost;
use deployments_status_publisher::app::replay::{replay, HostEvent};
use deployments_status_publisher::constants::{
    BUILD_PROBLEM_TYPE, DEPLOYMENT_ID_PARAM_KEY, FAIL_BUILD_ON_PUBLISH_ERROR_PARAM,
    PUBLISHING_ENABLED_PROPERTY_NAME, VCS_ROOT_ID_PARAM,
};
use deployments_status_publisher::dispatch::listener::DeploymentsStatusListener;
use deployments_status_publisher::dispatch::runner::{Options, TaskRunner};
use deployments_status_publisher::events::Event;
use deployments_status_publisher::host::{BuildProblem, BuildStatus, QueuedBuild};
use deployments_status_publisher::publisher::manager::PublisherManager;
use deployments_status_publisher::publisher::problems::ProblemTracker;
use deployments_status_publisher::publisher::service::PublisherService;
use deployments_status_publisher::publisher::settings::PublisherSettings;

const ALL_BUILD_EVENTS: [Event; 5] = [
    Event::Starting,
    Event::Started,
    Event::Finished,
    Event::FailureDetected,
    Event::MarkedAsSuccessful,
];

struct Fixture {
    server: Arc<FakeServer>,
    recorder: Arc<RecordingSettings>,
    listener: DeploymentsStatusListener,
}

fn fixture_with(recorder: impl FnOnce(Arc<ProblemTracker>) -> Arc<RecordingSettings>, options: Options) -> Fixture {
    let server = FakeServer::new();
    let problems = Arc::new(ProblemTracker::new(server.clone()));
    let recorder = recorder(problems.clone());
    let settings: Vec<Arc<dyn PublisherSettings>> = vec![recorder.clone()];
    let manager = Arc::new(PublisherManager::new(settings));
    let runner = Arc::new(TaskRunner::new(
        PublisherService::new(manager),
        problems,
        server.clone(),
        &options,
    ));
    let listener = DeploymentsStatusListener::new(runner, server.clone());
    Fixture {
        server,
        recorder,
        listener,
    }
}

fn fixture() -> Fixture {
    fixture_with(
        |problems| RecordingSettings::new("recorder", ALL_BUILD_EVENTS.to_vec(), problems),
        Options::default(),
    )
}

fn events(fixture: &Fixture) -> Vec<&'static str> {
    fixture.recorder.calls().into_iter().map(|c| c.event).collect()
}

#[tokio::test]
async fn test_publishes_for_every_feature() {
    let f = fixture();
    let bt = build_type(vec![
        publisher_feature("f1", "recorder", &[]),
        publisher_feature("f2", "recorder", &[]),
        publisher_feature("f3", "unknown", &[]),
    ]);
    let b = build(1, BuildStatus::Normal, vec![revision(git_root(1, "git@github.com:o/r.git"), "abc", None)]);

    f.listener.build_started(&bt, &b).await;

    let features: Vec<String> = f.recorder.calls().into_iter().map(|c| c.feature_id).collect();
    assert_eq!(features, vec!["f1".to_string(), "f2".to_string()]);
}

#[tokio::test]
async fn test_skips_personal_builds_with_personal_changes() {
    let f = fixture();
    let bt = build_type(vec![publisher_feature("f1", "recorder", &[])]);
    let mut b = build(1, BuildStatus::Normal, vec![revision(git_root(1, "git@github.com:o/r.git"), "abc", None)]);
    b.personal = true;
    b.has_personal_changes = true;

    f.listener.build_started(&bt, &b).await;
    assert!(f.recorder.calls().is_empty());

    b.has_personal_changes = false;
    f.listener.build_started(&bt, &b).await;
    assert_eq!(events(&f), vec!["started"]);
}

#[tokio::test]
async fn test_publishing_disabled() {
    let f = fixture_with(
        |problems| RecordingSettings::new("recorder", ALL_BUILD_EVENTS.to_vec(), problems),
        Options {
            publishing_enabled: false,
            ..Options::default()
        },
    );
    let mut bt = build_type(vec![publisher_feature("f1", "recorder", &[])]);
    let b = build(1, BuildStatus::Normal, vec![revision(git_root(1, "git@github.com:o/r.git"), "abc", None)]);

    f.listener.build_started(&bt, &b).await;
    assert!(f.recorder.calls().is_empty());

    // Enabled per configuration despite the server switch
    bt.parameters
        .insert(PUBLISHING_ENABLED_PROPERTY_NAME.to_string(), "true".to_string());
    f.listener.build_started(&bt, &build(2, BuildStatus::Normal, b.revisions.clone())).await;
    assert_eq!(events(&f), vec!["started"]);
}

#[tokio::test]
async fn test_publishing_disabled_per_configuration() {
    let f = fixture();
    let mut bt = build_type(vec![publisher_feature("f1", "recorder", &[])]);
    bt.parameters
        .insert(PUBLISHING_ENABLED_PROPERTY_NAME.to_string(), "false".to_string());
    let b = build(1, BuildStatus::Normal, vec![revision(git_root(1, "git@github.com:o/r.git"), "abc", None)]);

    f.listener.build_started(&bt, &b).await;
    assert!(f.recorder.calls().is_empty());
}

#[tokio::test]
async fn test_started_after_finished_is_dropped() {
    let f = fixture();
    let bt = build_type(vec![publisher_feature("f1", "recorder", &[])]);
    let b = build(1, BuildStatus::Normal, vec![revision(git_root(1, "git@github.com:o/r.git"), "abc", None)]);
    f.server.finished.lock().unwrap().insert(1, b.clone());

    f.listener.build_finished(&bt, &b).await;
    f.listener.build_started(&bt, &b).await;

    assert_eq!(events(&f), vec!["finished"]);
}

#[tokio::test]
async fn test_finished_without_history_build_is_skipped() {
    let f = fixture();
    let bt = build_type(vec![publisher_feature("f1", "recorder", &[])]);
    let b = build(1, BuildStatus::Normal, vec![revision(git_root(1, "git@github.com:o/r.git"), "abc", None)]);

    f.listener.build_finished(&bt, &b).await;
    assert!(f.recorder.calls().is_empty());
}

#[tokio::test]
async fn test_revisions_follow_vcs_root_filter() {
    let f = fixture();
    let bt = build_type(vec![publisher_feature("f1", "recorder", &[(VCS_ROOT_ID_PARAM, "Project_Root2")])]);
    let b = build(
        1,
        BuildStatus::Normal,
        vec![
            revision(git_root(1, "git@github.com:o/one.git"), "aaa", None),
            revision(git_root(2, "git@github.com:o/two.git"), "bbb", None),
        ],
    );

    f.listener.build_started(&bt, &b).await;

    let versions: Vec<String> = f.recorder.calls().into_iter().map(|c| c.version).collect();
    assert_eq!(versions, vec!["bbb".to_string()]);
}

#[tokio::test]
async fn test_replayed_vcs_root_rename_repoints_features() {
    let f = fixture();
    let bt = build_type(vec![publisher_feature("f1", "recorder", &[(VCS_ROOT_ID_PARAM, "Project_OldRoot")])]);
    let b = build(
        1,
        BuildStatus::Normal,
        vec![
            revision(git_root(1, "git@github.com:o/one.git"), "aaa", None),
            revision(git_root(2, "git@github.com:o/two.git"), "bbb", None),
        ],
    );
    let host = ConsoleHost::new("http://localhost");

    replay(
        &f.listener,
        &host,
        vec![HostEvent::Started {
            build_type: bt.clone(),
            build: b.clone(),
        }],
    )
    .await;
    assert!(f.recorder.calls().is_empty());

    let mut renamed = b.clone();
    renamed.id = 2;
    replay(
        &f.listener,
        &host,
        vec![
            HostEvent::VcsRootRenamed {
                old_external_id: "Project_OldRoot".to_string(),
                old_internal_id: None,
                new_external_id: "Project_Root2".to_string(),
            },
            HostEvent::Started {
                build_type: bt,
                build: renamed,
            },
        ],
    )
    .await;

    let versions: Vec<String> = f.recorder.calls().into_iter().map(|c| c.version).collect();
    assert_eq!(versions, vec!["bbb".to_string()]);
}

#[test]
fn test_vcs_root_rename_reports_changed_configurations() {
    let f = fixture();
    let mut bts = vec![
        build_type(vec![publisher_feature("f1", "recorder", &[(VCS_ROOT_ID_PARAM, "12")])]),
        build_type(vec![publisher_feature("f1", "recorder", &[(VCS_ROOT_ID_PARAM, "Project_Other")])]),
    ];
    bts[1].external_id = "Project_Other_Build".to_string();

    let changed = f
        .listener
        .vcs_root_external_id_changed(&mut bts, "Project_OldRoot", Some(12), "Project_Root2");

    assert_eq!(changed, vec!["Project_Build".to_string()]);
    assert_eq!(
        bts[0].features[0].parameters.get(VCS_ROOT_ID_PARAM).map(String::as_str),
        Some("Project_Root2")
    );
}

#[tokio::test]
async fn test_revisions_without_filter_keep_git_roots() {
    let f = fixture();
    let bt = build_type(vec![publisher_feature("f1", "recorder", &[])]);
    let mut svn = git_root(2, "svn://example.com/repo");
    svn.vcs_name = "svn".to_string();
    let b = build(
        1,
        BuildStatus::Normal,
        vec![
            revision(git_root(1, "git@github.com:o/one.git"), "aaa", None),
            revision(svn, "42", None),
        ],
    );

    f.listener.build_started(&bt, &b).await;

    let versions: Vec<String> = f.recorder.calls().into_iter().map(|c| c.version).collect();
    assert_eq!(versions, vec!["aaa".to_string()]);
}

#[tokio::test]
async fn test_failed_publish_raises_problem_and_fails_build() {
    let f = fixture_with(
        |problems| RecordingSettings::failing("recorder", ALL_BUILD_EVENTS.to_vec(), problems),
        Options::default(),
    );
    let mut bt = build_type(vec![publisher_feature("f1", "recorder", &[])]);
    bt.parameters
        .insert(FAIL_BUILD_ON_PUBLISH_ERROR_PARAM.to_string(), "true".to_string());
    let b = build(5, BuildStatus::Normal, vec![revision(git_root(3, "git@github.com:o/r.git"), "abc", None)]);

    f.listener.build_started(&bt, &b).await;

    let tickets = f.server.open_tickets();
    assert_eq!(tickets.len(), 1);
    assert_eq!(
        tickets[0].problem.description,
        "Deployments Status Publisher has failed to publish publishDeploymentsStatus.buildStarted status. Publisher: recorder. boom"
    );

    let problems = f.server.build_problems();
    assert_eq!(problems.len(), 1);
    assert_eq!(problems[0].0, 5);
    assert_eq!(problems[0].1.identity, "deploymentsStatusPublisher.recorder.3");
    assert_eq!(problems[0].1.problem_type, BUILD_PROBLEM_TYPE);
}

#[tokio::test]
async fn test_failed_publish_without_escalation() {
    let f = fixture_with(
        |problems| RecordingSettings::failing("recorder", ALL_BUILD_EVENTS.to_vec(), problems),
        Options::default(),
    );
    let bt = build_type(vec![publisher_feature("f1", "recorder", &[])]);
    let b = build(5, BuildStatus::Normal, vec![revision(git_root(3, "git@github.com:o/r.git"), "abc", None)]);

    f.listener.build_started(&bt, &b).await;

    assert_eq!(f.server.open_tickets().len(), 1);
    assert!(f.server.build_problems().is_empty());
}

#[tokio::test]
async fn test_removed_feature_problems_are_cancelled() {
    let failing = fixture_with(
        |problems| RecordingSettings::failing("recorder", ALL_BUILD_EVENTS.to_vec(), problems),
        Options::default(),
    );
    let bt = build_type(vec![publisher_feature("f1", "recorder", &[])]);
    let b = build(5, BuildStatus::Normal, vec![revision(git_root(3, "git@github.com:o/r.git"), "abc", None)]);
    failing.listener.build_started(&bt, &b).await;
    assert_eq!(failing.server.open_tickets().len(), 1);

    let without_feature = build_type(vec![]);
    failing
        .listener
        .build_started(&without_feature, &build(6, BuildStatus::Normal, b.revisions.clone()))
        .await;
    assert!(failing.server.open_tickets().is_empty());
}

#[tokio::test]
async fn test_starting_shares_deployment_id() {
    let f = fixture();
    let bt = build_type(vec![publisher_feature("f1", "recorder", &[("createDeployment", "true")])]);
    let b = build(1, BuildStatus::Normal, vec![revision(git_root(1, "git@github.com:o/r.git"), "abc", None)]);

    let params = f.listener.build_starting(&bt, &b).await;

    assert_eq!(params.get(DEPLOYMENT_ID_PARAM_KEY).map(String::as_str), Some("77"));
    assert_eq!(events(&f), vec!["starting", "started"]);
}

#[tokio::test]
async fn test_starting_without_deployment_creation() {
    let f = fixture();
    let bt = build_type(vec![publisher_feature("f1", "recorder", &[])]);
    let b = build(1, BuildStatus::Normal, vec![revision(git_root(1, "git@github.com:o/r.git"), "abc", None)]);

    let params = f.listener.build_starting(&bt, &b).await;

    assert!(params.is_empty());
    assert_eq!(events(&f), vec!["started"]);
}

#[tokio::test]
async fn test_failure_detected_only_on_transition() {
    let f = fixture();
    let bt = build_type(vec![publisher_feature("f1", "recorder", &[])]);
    let b = build(1, BuildStatus::Failure, vec![revision(git_root(1, "git@github.com:o/r.git"), "abc", None)]);

    f.listener
        .build_changed_status(&bt, &b, BuildStatus::Failure, BuildStatus::Error)
        .await;
    f.listener
        .build_changed_status(&bt, &b, BuildStatus::Normal, BuildStatus::Warning)
        .await;
    assert!(f.recorder.calls().is_empty());

    f.listener
        .build_changed_status(&bt, &b, BuildStatus::Normal, BuildStatus::Failure)
        .await;
    assert_eq!(events(&f), vec!["failure_detected"]);
}

#[tokio::test]
async fn test_marked_as_successful_when_problems_cleared() {
    let f = fixture();
    let bt = build_type(vec![publisher_feature("f1", "recorder", &[])]);
    let b = build(1, BuildStatus::Normal, vec![revision(git_root(1, "git@github.com:o/r.git"), "abc", None)]);
    let problem = BuildProblem {
        identity: "p".to_string(),
        problem_type: "t".to_string(),
        description: "d".to_string(),
    };

    f.listener.build_problems_changed(&bt, &b, &[], &[]).await;
    f.listener
        .build_problems_changed(&bt, &b, &[problem.clone()], &[problem.clone()])
        .await;
    assert!(f.recorder.calls().is_empty());

    f.server.running.lock().unwrap().insert(1);
    f.listener.build_problems_changed(&bt, &b, &[problem], &[]).await;
    assert_eq!(events(&f), vec!["marked_as_successful_running"]);
}

#[tokio::test]
async fn test_queued_build_uses_branch_dummy_build() {
    let f = fixture_with(
        |problems| RecordingSettings::new("recorder", vec![Event::Queued], problems),
        Options::default(),
    );
    let bt = build_type(vec![publisher_feature("f1", "recorder", &[])]);
    f.server.dummy_builds.lock().unwrap().insert(
        "<default>".to_string(),
        build(0, BuildStatus::Normal, vec![revision(git_root(1, "git@github.com:o/r.git"), "head", None)]),
    );
    let queued = QueuedBuild {
        item_id: "q1".to_string(),
        build_id: 9,
        build_type_id: "bt1".to_string(),
        personal: false,
        has_personal_changes: false,
        failed_to_collect_changes: false,
        associated_build: None,
        branch: None,
    };

    f.listener.build_type_added_to_queue(&bt, &queued).await;

    let calls = f.recorder.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].build_id, 9);
    assert_eq!(calls[0].version, "head");
}
