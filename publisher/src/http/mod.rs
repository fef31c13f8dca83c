//! GitHub REST client

pub mod client;
pub mod comments;
pub mod deployments;
pub mod pulls;
pub mod repos;
pub mod statuses;
