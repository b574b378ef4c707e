pub mod annotation_driver;
pub mod cleanup;
pub mod conformance;
pub mod container_resolver;
pub mod network;
pub mod probe_executor;
pub mod readiness;
pub mod submission_log;

pub use annotation_driver::AnnotationDriver;
pub use conformance::{ConformanceSettings, ConformanceValidator, ToolInfo};
pub use container_resolver::{ContainerResolver, LaunchSettings};
pub use probe_executor::ProbeExecutor;
pub use readiness::ReadinessPolicy;
pub use submission_log::{SubmissionLogger, UploadOutcome};
