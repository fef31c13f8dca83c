//! In-memory caches

pub mod events;
