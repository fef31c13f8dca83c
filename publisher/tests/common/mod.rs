//! Shared fixtures for integration tests

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use deployments_status_publisher::constants::{BUILD_FEATURE_NAME, GIT_VCS_NAME, PUBLISHER_ID_PARAM};
use deployments_status_publisher::errors::PublisherError;
use deployments_status_publisher::events::Event;
use deployments_status_publisher::host::{
    Build, BuildConfiguration, BuildFeature, BuildProblem, BuildServer, BuildStatus, ProblemNotifier,
    ProblemTicket, Revision, SystemProblem, VcsRoot,
};
use deployments_status_publisher::publisher::problems::ProblemTracker;
use deployments_status_publisher::publisher::settings::PublisherSettings;
use deployments_status_publisher::publisher::{Publisher, PublisherBase};
use deployments_status_publisher::sync::locks::KeyedLocks;

/// In-memory build server
#[derive(Default)]
pub struct FakeServer {
    next_ticket: AtomicU64,
    pub raised: Mutex<Vec<ProblemTicket>>,
    pub cancelled: Mutex<Vec<u64>>,
    pub build_problems: Mutex<Vec<(u64, BuildProblem)>>,
    pub finished: Mutex<HashMap<u64, Build>>,
    pub dummy_builds: Mutex<HashMap<String, Build>>,
    pub running: Mutex<HashSet<u64>>,
}

impl FakeServer {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Tickets raised and not cancelled
    pub fn open_tickets(&self) -> Vec<ProblemTicket> {
        let cancelled = self.cancelled.lock().unwrap();
        self.raised
            .lock()
            .unwrap()
            .iter()
            .filter(|t| !cancelled.contains(&t.id))
            .cloned()
            .collect()
    }

    pub fn build_problems(&self) -> Vec<(u64, BuildProblem)> {
        self.build_problems.lock().unwrap().clone()
    }
}

impl ProblemNotifier for FakeServer {
    fn raise(&self, build_type: &BuildConfiguration, problem: SystemProblem) -> ProblemTicket {
        let ticket = ProblemTicket {
            id: self.next_ticket.fetch_add(1, Ordering::SeqCst) + 1,
            build_type_id: build_type.internal_id.clone(),
            problem,
        };
        self.raised.lock().unwrap().push(ticket.clone());
        ticket
    }

    fn cancel(&self, ticket: &ProblemTicket) {
        self.cancelled.lock().unwrap().push(ticket.id);
    }
}

impl BuildServer for FakeServer {
    fn add_build_problem(&self, build_id: u64, problem: BuildProblem) {
        self.build_problems.lock().unwrap().push((build_id, problem));
    }

    fn view_results_url(&self, build: &Build) -> String {
        format!("http://ci.example.com/viewLog.html?buildId={}", build.id)
    }

    fn branch_dummy_build(&self, _build_type: &BuildConfiguration, branch: &str) -> Option<Build> {
        self.dummy_builds.lock().unwrap().get(branch).cloned()
    }

    fn finished_build(&self, build_id: u64) -> Option<Build> {
        self.finished.lock().unwrap().get(&build_id).cloned()
    }

    fn is_running(&self, build_id: u64) -> bool {
        self.running.lock().unwrap().contains(&build_id)
    }
}

pub fn git_root(id: u64, url: &str) -> VcsRoot {
    VcsRoot {
        id,
        external_id: format!("Project_Root{}", id),
        name: format!("root {}", id),
        vcs_name: GIT_VCS_NAME.to_string(),
        properties: HashMap::from([("url".to_string(), url.to_string())]),
    }
}

pub fn revision(root: VcsRoot, version: &str, branch: Option<&str>) -> Revision {
    Revision {
        root,
        version: version.to_string(),
        vcs_branch: branch.map(str::to_string),
    }
}

pub fn feature(id: &str, params: &[(&str, &str)]) -> BuildFeature {
    BuildFeature {
        id: id.to_string(),
        feature_type: BUILD_FEATURE_NAME.to_string(),
        parameters: params
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect(),
    }
}

pub fn build_type(features: Vec<BuildFeature>) -> BuildConfiguration {
    BuildConfiguration {
        internal_id: "bt1".to_string(),
        external_id: "Project_Build".to_string(),
        name: "Build".to_string(),
        project_name: "Project".to_string(),
        features,
        ..Default::default()
    }
}

pub fn build(id: u64, status: BuildStatus, revisions: Vec<Revision>) -> Build {
    Build {
        id,
        build_type_id: "bt1".to_string(),
        build_number: id.to_string(),
        personal: false,
        has_personal_changes: false,
        failed_to_collect_changes: false,
        revisions,
        status,
        parameters: HashMap::new(),
        dependencies: vec![],
        branch: None,
    }
}

/// What a recording publisher saw
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Call {
    pub event: &'static str,
    pub feature_id: String,
    pub build_id: u64,
    pub version: String,
}

/// Publisher type that records calls and optionally fails them
pub struct RecordingSettings {
    pub id: String,
    pub supported: Vec<Event>,
    pub fail: bool,
    pub calls: Arc<Mutex<Vec<Call>>>,
    pub problems: Arc<ProblemTracker>,
    pub locks: Arc<KeyedLocks>,
}

impl RecordingSettings {
    pub fn new(id: &str, supported: Vec<Event>, problems: Arc<ProblemTracker>) -> Arc<Self> {
        Arc::new(Self {
            id: id.to_string(),
            supported,
            fail: false,
            calls: Arc::new(Mutex::new(Vec::new())),
            problems,
            locks: Arc::new(KeyedLocks::new()),
        })
    }

    pub fn failing(id: &str, supported: Vec<Event>, problems: Arc<ProblemTracker>) -> Arc<Self> {
        Arc::new(Self {
            id: id.to_string(),
            supported,
            fail: true,
            calls: Arc::new(Mutex::new(Vec::new())),
            problems,
            locks: Arc::new(KeyedLocks::new()),
        })
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl PublisherSettings for RecordingSettings {
    fn id(&self) -> &str {
        &self.id
    }

    fn name(&self) -> &str {
        &self.id
    }

    fn create_publisher(
        &self,
        build_type: &BuildConfiguration,
        build_feature_id: &str,
        params: &HashMap<String, String>,
    ) -> Option<Arc<dyn Publisher>> {
        let settings = Arc::new(RecordingSettings {
            id: self.id.clone(),
            supported: self.supported.clone(),
            fail: self.fail,
            calls: self.calls.clone(),
            problems: self.problems.clone(),
            locks: self.locks.clone(),
        });
        let base = PublisherBase::new(
            settings.clone(),
            build_type,
            build_feature_id,
            params,
            self.problems.clone(),
            self.locks.clone(),
        );
        Some(Arc::new(RecordingPublisher { base, settings }))
    }

    fn is_publishing_for_vcs_root(&self, root: &VcsRoot) -> bool {
        root.vcs_name == GIT_VCS_NAME
    }

    fn is_event_supported(&self, event: Event) -> bool {
        self.supported.contains(&event)
    }
}

pub struct RecordingPublisher {
    base: PublisherBase,
    settings: Arc<RecordingSettings>,
}

impl RecordingPublisher {
    fn record(&self, event: &'static str, build_id: u64, revision: &Revision) -> Result<bool, PublisherError> {
        self.settings.calls.lock().unwrap().push(Call {
            event,
            feature_id: self.base.build_feature_id().to_string(),
            build_id,
            version: revision.version.clone(),
        });
        if self.settings.fail {
            return Err(PublisherError::ConnectionError("boom".to_string()));
        }
        Ok(true)
    }
}

#[async_trait]
impl Publisher for RecordingPublisher {
    fn base(&self) -> &PublisherBase {
        &self.base
    }

    fn id(&self) -> &str {
        &self.settings.id
    }

    async fn build_queued(
        &self,
        build: &deployments_status_publisher::host::QueuedBuild,
        revision: &Revision,
    ) -> Result<bool, PublisherError> {
        self.record("queued", build.build_id, revision)
    }

    async fn build_starting(&self, build: &Build, revision: &Revision) -> Result<Option<String>, PublisherError> {
        self.record("starting", build.id, revision)?;
        Ok(Some("77".to_string()))
    }

    async fn build_started(&self, build: &Build, revision: &Revision) -> Result<bool, PublisherError> {
        self.record("started", build.id, revision)
    }

    async fn build_finished(&self, build: &Build, revision: &Revision) -> Result<bool, PublisherError> {
        self.record("finished", build.id, revision)
    }

    async fn build_failure_detected(&self, build: &Build, revision: &Revision) -> Result<bool, PublisherError> {
        self.record("failure_detected", build.id, revision)
    }

    async fn build_marked_as_successful(
        &self,
        build: &Build,
        revision: &Revision,
        build_in_progress: bool,
    ) -> Result<bool, PublisherError> {
        let event = if build_in_progress {
            "marked_as_successful_running"
        } else {
            "marked_as_successful"
        };
        self.record(event, build.id, revision)
    }
}

pub fn publisher_feature(feature_id: &str, publisher_id: &str, extra: &[(&str, &str)]) -> BuildFeature {
    let mut params = vec![(PUBLISHER_ID_PARAM, publisher_id)];
    params.extend_from_slice(extra);
    feature(feature_id, &params)
}
