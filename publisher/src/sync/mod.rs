//! Synchronization primitives

pub mod locks;
