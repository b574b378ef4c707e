//! Docker adapter (bollard).

pub mod engine;

pub use engine::DockerEngine;
