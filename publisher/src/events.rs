//! Build lifecycle events

use serde::{Deserialize, Serialize};

const PUBLISHING_TASK_PREFIX: &str = "publishDeploymentsStatus";

/// Ordering class of an event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventPriority {
    /// Rejected once a `Consequent` event was accepted for the build
    First,
    /// Always accepted, never blocks later events
    Any,
    /// Always accepted, blocks later `First` events
    Consequent,
}

/// Build lifecycle event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Event {
    Starting,
    Started,
    Finished,
    Queued,
    RemovedFromQueue,
    Commented,
    Interrupted,
    FailureDetected,
    MarkedAsSuccessful,
}

impl Event {
    pub const ALL: [Event; 9] = [
        Event::Starting,
        Event::Started,
        Event::Finished,
        Event::Queued,
        Event::RemovedFromQueue,
        Event::Commented,
        Event::Interrupted,
        Event::FailureDetected,
        Event::MarkedAsSuccessful,
    ];

    fn task_name(&self) -> &'static str {
        match self {
            Event::Starting => "buildStarting",
            Event::Started => "buildStarted",
            Event::Finished => "buildFinished",
            Event::Queued => "buildQueued",
            Event::RemovedFromQueue => "buildRemovedFromQueue",
            Event::Commented => "buildCommented",
            Event::Interrupted => "buildInterrupted",
            Event::FailureDetected => "buildFailureDetected",
            Event::MarkedAsSuccessful => "buildMarkedAsSuccessful",
        }
    }

    /// Qualified name, e.g. `publishDeploymentsStatus.buildFinished`
    pub fn name(&self) -> String {
        format!("{}.{}", PUBLISHING_TASK_PREFIX, self.task_name())
    }

    pub fn priority(&self) -> EventPriority {
        match self {
            Event::Starting | Event::Started | Event::Queued | Event::RemovedFromQueue => {
                EventPriority::First
            }
            Event::Commented => EventPriority::Any,
            Event::Finished
            | Event::Interrupted
            | Event::FailureDetected
            | Event::MarkedAsSuccessful => EventPriority::Consequent,
        }
    }

    pub fn is_first_task(&self) -> bool {
        self.priority() == EventPriority::First
    }

    pub fn is_consequent_task(&self) -> bool {
        self.priority() == EventPriority::Consequent
    }
}

impl std::fmt::Display for Event {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.name())
    }
}
