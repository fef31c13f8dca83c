//! Deployments Status Publisher Library
//!
//! Forwards CI build lifecycle events to GitHub as deployment and commit statuses.

pub mod app;
pub mod cache;
pub mod constants;
pub mod dispatch;
pub mod errors;
pub mod events;
pub mod features;
pub mod filesys;
pub mod github;
pub mod host;
pub mod http;
pub mod logs;
pub mod publisher;
pub mod repository;
pub mod storage;
pub mod sync;
pub mod utils;
pub mod workers;
