//! Infrastructure adapters for external systems.

pub mod docker;
pub mod mock;
pub mod storage;
