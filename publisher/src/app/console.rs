//! Stand-alone host used by the command line

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;

use tracing::{error, info, warn};

use crate::host::{
    Build, BuildConfiguration, BuildProblem, BuildServer, ProblemNotifier, ProblemTicket, SystemProblem,
};

/// Logs problems instead of showing them in a CI server
pub struct ConsoleHost {
    server_url: String,
    next_ticket: AtomicU64,
    builds: RwLock<HashMap<u64, Build>>,
    finished: RwLock<HashSet<u64>>,
}

impl ConsoleHost {
    pub fn new(server_url: impl Into<String>) -> Self {
        Self {
            server_url: server_url.into(),
            next_ticket: AtomicU64::new(1),
            builds: RwLock::new(HashMap::new()),
            finished: RwLock::new(HashSet::new()),
        }
    }

    /// Remember the latest state of a build
    pub fn record(&self, build: Build) {
        let mut builds = self.builds.write().unwrap_or_else(|e| e.into_inner());
        builds.insert(build.id, build);
    }

    /// Mark a recorded build as no longer running
    pub fn finish(&self, build_id: u64) {
        let mut finished = self.finished.write().unwrap_or_else(|e| e.into_inner());
        finished.insert(build_id);
    }
}

impl ProblemNotifier for ConsoleHost {
    fn raise(&self, build_type: &BuildConfiguration, problem: SystemProblem) -> ProblemTicket {
        let id = self.next_ticket.fetch_add(1, Ordering::SeqCst);
        warn!("Problem #{} on {}: {}", id, build_type.external_id, problem.description);
        ProblemTicket {
            id,
            build_type_id: build_type.internal_id.clone(),
            problem,
        }
    }

    fn cancel(&self, ticket: &ProblemTicket) {
        info!("Problem #{} resolved", ticket.id);
    }
}

impl BuildServer for ConsoleHost {
    fn add_build_problem(&self, build_id: u64, problem: BuildProblem) {
        error!("Build {} failed: {} ({})", build_id, problem.description, problem.identity);
    }

    fn view_results_url(&self, build: &Build) -> String {
        format!(
            "{}/viewLog.html?buildId={}&buildTypeId={}",
            self.server_url.trim_end_matches('/'),
            build.id,
            build.build_type_id
        )
    }

    fn branch_dummy_build(&self, _build_type: &BuildConfiguration, _branch: &str) -> Option<Build> {
        None
    }

    fn finished_build(&self, build_id: u64) -> Option<Build> {
        let finished = self.finished.read().unwrap_or_else(|e| e.into_inner());
        if !finished.contains(&build_id) {
            return None;
        }
        let builds = self.builds.read().unwrap_or_else(|e| e.into_inner());
        builds.get(&build_id).cloned()
    }

    fn is_running(&self, build_id: u64) -> bool {
        let builds = self.builds.read().unwrap_or_else(|e| e.into_inner());
        let finished = self.finished.read().unwrap_or_else(|e| e.into_inner());
        builds.contains_key(&build_id) && !finished.contains(&build_id)
    }
}
