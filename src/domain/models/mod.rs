//! Domain models.

pub mod annotation;
pub mod config;
pub mod probe;
pub mod submission;
pub mod verdict;

pub use annotation::{
    AnnotationPayload, AnnotationRequest, AnnotationResult, AnnotationSource, AnnotatorKind,
    ClinicalNote, NoteBody, TextAnnotation,
};
pub use config::{
    Config, EngineConfig, LoggingConfig, ProbeConfig, ReadinessConfig, SubmissionLogConfig,
};
pub use probe::{ConformanceCommand, HttpMethod, HttpRequest, ProbeOutput, ProbeRequest};
pub use submission::{
    ContainerHandle, ContainerState, ImageRef, NetworkAddress, Submission, SubmissionId,
};
pub use verdict::{
    ConformanceCheck, SubmissionStatus, ValidationAccumulator, ValidationResults,
    ValidationVerdict,
};
