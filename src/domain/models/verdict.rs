//! Validation verdict and the accumulator that produces it.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Terminal status of a validation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SubmissionStatus {
    Validated,
    Invalid,
}

impl SubmissionStatus {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Validated => "VALIDATED",
            Self::Invalid => "INVALID",
        }
    }
}

impl fmt::Display for SubmissionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Conformance checks, in the order they run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConformanceCheck {
    ToolMetadata,
    UserInterface,
    Annotate,
}

impl ConformanceCheck {
    pub const ALL: [Self; 3] = [Self::ToolMetadata, Self::UserInterface, Self::Annotate];

    /// Suffix of the auxiliary container name used by this check.
    pub const fn probe_suffix(self) -> &'static str {
        match self {
            Self::ToolMetadata => "probe_tool",
            Self::UserInterface => "probe_ui",
            Self::Annotate => "probe_annotate",
        }
    }
}

/// Append-only collection of failure reasons for one validation run.
///
/// `finalize` consumes the accumulator, so a run is finalized exactly once.
#[derive(Debug, Default)]
pub struct ValidationAccumulator {
    failures: Vec<(ConformanceCheck, String)>,
}

impl ValidationAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the failure of `check`. A check that already failed keeps its
    /// first reason.
    pub fn record_failure(&mut self, check: ConformanceCheck, reason: impl Into<String>) {
        if self.has_failed(check) {
            return;
        }
        self.failures.push((check, reason.into()));
    }

    pub fn has_failed(&self, check: ConformanceCheck) -> bool {
        self.failures.iter().any(|(c, _)| *c == check)
    }

    pub fn reasons(&self) -> impl Iterator<Item = &str> {
        self.failures.iter().map(|(_, r)| r.as_str())
    }

    pub fn finalize(self) -> ValidationVerdict {
        let status = if self.failures.is_empty() {
            SubmissionStatus::Validated
        } else {
            SubmissionStatus::Invalid
        };
        ValidationVerdict {
            reasons: self.failures.into_iter().map(|(_, r)| r).collect(),
            status,
        }
    }
}

/// Final outcome of a validation run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationVerdict {
    pub reasons: Vec<String>,
    pub status: SubmissionStatus,
}

impl ValidationVerdict {
    pub fn is_valid(&self) -> bool {
        self.status == SubmissionStatus::Validated
    }

    pub fn to_results(&self) -> ValidationResults {
        ValidationResults {
            submission_errors: self.reasons.join("\n"),
            submission_status: self.status,
        }
    }
}

/// Serialized form of a verdict written to the results file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResults {
    pub submission_errors: String,
    pub submission_status: SubmissionStatus,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_accumulator_validates() {
        let verdict = ValidationAccumulator::new().finalize();
        assert!(verdict.is_valid());

        let json = serde_json::to_string(&verdict.to_results()).unwrap();
        assert_eq!(
            json,
            r#"{"submission_errors":"","submission_status":"VALIDATED"}"#
        );
    }

    #[test]
    fn test_failures_keep_order_and_join_with_newlines() {
        let mut acc = ValidationAccumulator::new();
        acc.record_failure(ConformanceCheck::UserInterface, "ui broken");
        acc.record_failure(ConformanceCheck::Annotate, "annotate broken");

        let verdict = acc.finalize();
        assert_eq!(verdict.status, SubmissionStatus::Invalid);
        assert_eq!(verdict.reasons, vec!["ui broken", "annotate broken"]);
        assert_eq!(
            verdict.to_results().submission_errors,
            "ui broken\nannotate broken"
        );
    }

    #[test]
    fn test_one_reason_per_check() {
        let mut acc = ValidationAccumulator::new();
        acc.record_failure(ConformanceCheck::ToolMetadata, "first");
        acc.record_failure(ConformanceCheck::ToolMetadata, "second");

        assert!(acc.has_failed(ConformanceCheck::ToolMetadata));
        assert_eq!(acc.reasons().collect::<Vec<_>>(), vec!["first"]);
    }
}
