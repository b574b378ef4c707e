//! Mock adapters for testing.

pub mod engine;

pub use engine::{MockEngine, MockRun};
