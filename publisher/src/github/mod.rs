//! GitHub publishers

pub mod deployments;
pub mod params;
pub mod settings;
pub mod statuses;
pub mod updater;
