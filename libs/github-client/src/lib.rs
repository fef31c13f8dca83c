//! GitHub REST models
//!
//! Request and response payloads for the handful of GitHub endpoints used to
//! publish deployment and commit statuses.

pub mod models;

pub use models::*;
