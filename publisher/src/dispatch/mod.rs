//! Event dispatch

pub mod listener;
pub mod runner;
