//! CI server model
//!
//! Plain data describing build configurations, builds and revisions as the
//! CI server hands them over, plus the callbacks the publisher needs from it.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Build status, ordered by priority
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BuildStatus {
    Unknown,
    Normal,
    Warning,
    Failure,
    Error,
}

impl BuildStatus {
    pub fn is_successful(&self) -> bool {
        *self <= BuildStatus::Normal
    }

    pub fn is_failed(&self) -> bool {
        *self >= BuildStatus::Failure
    }
}

/// A VCS root instance attached to a build configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VcsRoot {
    /// Internal numeric id
    pub id: u64,
    /// External id of the parent VCS root
    pub external_id: String,
    pub name: String,
    /// VCS plugin name, `jetbrains.git` for git
    pub vcs_name: String,
    #[serde(default)]
    pub properties: HashMap<String, String>,
}

impl VcsRoot {
    pub fn url(&self) -> Option<&str> {
        self.properties.get("url").map(String::as_str)
    }
}

/// A commit of one VCS root that a build runs on
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Revision {
    pub root: VcsRoot,
    /// Commit hash
    pub version: String,
    /// Full branch name, e.g. `refs/pull/5/merge`
    #[serde(default)]
    pub vcs_branch: Option<String>,
}

/// A build feature instance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildFeature {
    pub id: String,
    pub feature_type: String,
    #[serde(default)]
    pub parameters: HashMap<String, String>,
}

/// A build configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildConfiguration {
    pub internal_id: String,
    pub external_id: String,
    pub name: String,
    pub project_name: String,
    #[serde(default = "default_branch")]
    pub default_branch: String,
    #[serde(default)]
    pub parameters: HashMap<String, String>,
    #[serde(default)]
    pub features: Vec<BuildFeature>,
}

fn default_branch() -> String {
    "<default>".to_string()
}

impl Default for BuildConfiguration {
    fn default() -> Self {
        Self {
            internal_id: String::new(),
            external_id: String::new(),
            name: String::new(),
            project_name: String::new(),
            default_branch: default_branch(),
            parameters: HashMap::new(),
            features: Vec::new(),
        }
    }
}

impl BuildConfiguration {
    pub fn parameter(&self, name: &str) -> Option<&String> {
        self.parameters.get(name)
    }

    /// Enabled features of the given type, in configuration order
    pub fn features_of_type<'a>(&'a self, feature_type: &'a str) -> impl Iterator<Item = &'a BuildFeature> {
        self.features
            .iter()
            .filter(move |f| f.feature_type == feature_type)
    }
}

/// A build that this build depends on in a build chain
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DependencyBuild {
    pub build_id: u64,
    #[serde(default)]
    pub parameters: HashMap<String, String>,
}

/// A running or finished build
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Build {
    pub id: u64,
    pub build_type_id: String,
    #[serde(default)]
    pub build_number: String,
    #[serde(default)]
    pub personal: bool,
    #[serde(default)]
    pub has_personal_changes: bool,
    #[serde(default)]
    pub failed_to_collect_changes: bool,
    #[serde(default)]
    pub revisions: Vec<Revision>,
    pub status: BuildStatus,
    #[serde(default)]
    pub parameters: HashMap<String, String>,
    #[serde(default)]
    pub dependencies: Vec<DependencyBuild>,
    #[serde(default)]
    pub branch: Option<String>,
}

impl Build {
    pub fn parameter(&self, name: &str) -> Option<&String> {
        self.parameters.get(name)
    }

    pub fn describe(&self) -> String {
        format!("Build {{id={}, buildTypeId={}, number={}}}", self.id, self.build_type_id, self.build_number)
    }
}

/// A build waiting in the queue
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueuedBuild {
    pub item_id: String,
    /// Id the build gets once it starts
    pub build_id: u64,
    pub build_type_id: String,
    #[serde(default)]
    pub personal: bool,
    #[serde(default)]
    pub has_personal_changes: bool,
    #[serde(default)]
    pub failed_to_collect_changes: bool,
    /// Build created for this queue item, once changes are collected
    #[serde(default)]
    pub associated_build: Option<Build>,
    #[serde(default)]
    pub branch: Option<String>,
}

impl QueuedBuild {
    pub fn describe(&self) -> String {
        format!("QueuedBuild {{itemId={}, buildTypeId={}}}", self.item_id, self.build_type_id)
    }
}

/// A problem shown on the build configuration
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SystemProblem {
    pub description: String,
    pub problem_type: String,
}

/// Handle of a raised system problem
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ProblemTicket {
    pub id: u64,
    pub build_type_id: String,
    pub problem: SystemProblem,
}

/// A problem attached to a build
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildProblem {
    pub identity: String,
    pub problem_type: String,
    pub description: String,
}

/// Raises and cancels problems on build configurations
pub trait ProblemNotifier: Send + Sync {
    fn raise(&self, build_type: &BuildConfiguration, problem: SystemProblem) -> ProblemTicket;

    fn cancel(&self, ticket: &ProblemTicket);
}

/// Build lookups and mutations provided by the CI server
pub trait BuildServer: Send + Sync {
    /// Attach a problem to a build, failing it
    fn add_build_problem(&self, build_id: u64, problem: BuildProblem);

    /// Link to the build results page
    fn view_results_url(&self, build: &Build) -> String;

    /// Latest changes of a branch, used when a queued build has no build yet
    fn branch_dummy_build(&self, build_type: &BuildConfiguration, branch: &str) -> Option<Build>;

    /// Finished build from history
    fn finished_build(&self, build_id: u64) -> Option<Build>;

    /// `true` while the build is still running
    fn is_running(&self, build_id: u64) -> bool;
}
