//! Problem tickets raised on build configurations
//!
//! Tickets are tracked per build configuration and build feature so that a
//! successful publish, or removal of the feature, cancels stale errors.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, RwLock};

use tracing::{debug, warn};

use crate::constants::DEPLOYMENTS_STATUS_PUBLISHER_PROBLEM_TYPE;
use crate::errors::PublisherError;
use crate::host::{BuildConfiguration, ProblemNotifier, ProblemTicket, SystemProblem};
use crate::publisher::Publisher;

type FeatureTickets = HashMap<String, HashSet<ProblemTicket>>;

/// Owns all raised publisher problem tickets
pub struct ProblemTracker {
    notifier: Arc<dyn ProblemNotifier>,
    tickets: RwLock<HashMap<String, Arc<Mutex<FeatureTickets>>>>,
}

impl ProblemTracker {
    pub fn new(notifier: Arc<dyn ProblemNotifier>) -> Self {
        Self {
            notifier,
            tickets: RwLock::new(HashMap::new()),
        }
    }

    /// Tickets of one build configuration, created on first use
    fn for_build_type(&self, build_type_id: &str) -> Arc<Mutex<FeatureTickets>> {
        {
            let tickets = self.tickets.read().unwrap_or_else(|e| e.into_inner());
            if let Some(entry) = tickets.get(build_type_id) {
                return entry.clone();
            }
        }
        let mut tickets = self.tickets.write().unwrap_or_else(|e| e.into_inner());
        tickets
            .entry(build_type_id.to_string())
            .or_default()
            .clone()
    }

    /// Raise a problem for the publisher's build configuration
    ///
    /// A problem identical to one already open for the feature is not raised again.
    pub fn report_problem(
        &self,
        error_message: &str,
        publisher: &dyn Publisher,
        build_description: &str,
        destination: Option<&str>,
        error: Option<&PublisherError>,
    ) {
        let dst = destination.map(|d| format!("({})", d)).unwrap_or_default();
        let mut description = format!("{}. Publisher: {}{}.", error_message, publisher.id(), dst);
        warn!("{}. Build: {}", description, build_description);
        if let Some(e) = error {
            description.push(' ');
            description.push_str(&e.to_string());
        }

        let build_type = publisher.build_type();
        let entry = self.for_build_type(&build_type.internal_id);
        let mut feature_tickets = entry.lock().unwrap_or_else(|e| e.into_inner());
        let problem = SystemProblem {
            description,
            problem_type: DEPLOYMENTS_STATUS_PUBLISHER_PROBLEM_TYPE.to_string(),
        };
        let tickets = feature_tickets
            .entry(publisher.build_feature_id().to_string())
            .or_default();
        if let Some(open) = tickets.iter().find(|t| t.problem == problem) {
            debug!("Problem #{} is already open: {}", open.id, problem.description);
            return;
        }
        tickets.insert(self.notifier.raise(build_type, problem));
    }

    /// Cancel all tickets of the publisher's build feature
    pub fn clear_problem(&self, publisher: &dyn Publisher) {
        let entry = self.for_build_type(&publisher.build_type().internal_id);
        let mut feature_tickets = entry.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(tickets) = feature_tickets.remove(publisher.build_feature_id()) {
            for ticket in &tickets {
                self.notifier.cancel(ticket);
            }
        }
    }

    /// Cancel tickets of features no longer configured on the build configuration
    pub fn clear_obsolete_problems(
        &self,
        build_type: &BuildConfiguration,
        current_feature_ids: &HashSet<String>,
    ) {
        let entry = self.for_build_type(&build_type.internal_id);
        let mut feature_tickets = entry.lock().unwrap_or_else(|e| e.into_inner());
        let obsolete: Vec<String> = feature_tickets
            .keys()
            .filter(|id| !current_feature_ids.contains(*id))
            .cloned()
            .collect();
        for feature_id in obsolete {
            if let Some(tickets) = feature_tickets.remove(&feature_id) {
                for ticket in &tickets {
                    self.notifier.cancel(ticket);
                }
            }
        }
    }

    /// Open tickets of a build feature, oldest first
    pub fn tickets(&self, build_type_id: &str, feature_id: &str) -> Vec<ProblemTicket> {
        let entry = self.for_build_type(build_type_id);
        let feature_tickets = entry.lock().unwrap_or_else(|e| e.into_inner());
        let mut tickets: Vec<ProblemTicket> = feature_tickets
            .get(feature_id)
            .map(|t| t.iter().cloned().collect())
            .unwrap_or_default();
        tickets.sort_by_key(|t| t.id);
        tickets
    }
}
