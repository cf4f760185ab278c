use super::enumerator::ObjectRef;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// What the orchestrator does when one object fails
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Record the failure in the report and keep sweeping.
    #[default]
    ContinueOnError,
    /// Stop at the first failure and send no report.
    AbortOnError,
}

impl FromStr for FailurePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "continue" | "continue_on_error" | "isolate" => Ok(FailurePolicy::ContinueOnError),
            "abort" | "abort_on_error" | "fail_fast" => Ok(FailurePolicy::AbortOnError),
            other => Err(format!(
                "unknown failure policy '{}', expected 'continue' or 'abort'",
                other
            )),
        }
    }
}

/// An object (or prefix, for listing failures) that did not make it through the sweep.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedObject {
    pub name: String,
    pub reason: String,
}

impl FailedObject {
    pub fn new(name: impl Into<String>, reason: impl fmt::Display) -> Self {
        Self {
            name: name.into(),
            reason: reason.to_string(),
        }
    }
}

/// Outcome of one sweep, bucketed by how far each object got.
///
/// `succeeded` is the processed-files list: an object is in it if and only if
/// both its upload and its archive relocation completed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub succeeded: Vec<ObjectRef>,
    pub failed_transfer: Vec<FailedObject>,
    pub failed_archive: Vec<FailedObject>,
}

impl SweepReport {
    /// Names of the processed objects, in discovery order.
    pub fn processed_names(&self) -> Vec<&str> {
        self.succeeded.iter().map(|o| o.name.as_str()).collect()
    }

    pub fn has_failures(&self) -> bool {
        !self.failed_transfer.is_empty() || !self.failed_archive.is_empty()
    }

    /// True when nothing was found and nothing failed.
    pub fn is_empty(&self) -> bool {
        self.succeeded.is_empty() && !self.has_failures()
    }

    pub fn total(&self) -> usize {
        self.succeeded.len() + self.failed_transfer.len() + self.failed_archive.len()
    }
}

impl fmt::Display for SweepReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "succeeded={} failed_transfer={} failed_archive={}",
            self.succeeded.len(),
            self.failed_transfer.len(),
            self.failed_archive.len()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_policy_from_str() {
        assert_eq!(
            "continue".parse::<FailurePolicy>().unwrap(),
            FailurePolicy::ContinueOnError
        );
        assert_eq!(
            " ABORT ".parse::<FailurePolicy>().unwrap(),
            FailurePolicy::AbortOnError
        );
        assert!("sometimes".parse::<FailurePolicy>().is_err());
        assert_eq!(FailurePolicy::default(), FailurePolicy::ContinueOnError);
    }

    #[test]
    fn test_failure_policy_serde() {
        let json = serde_json::to_string(&FailurePolicy::AbortOnError).unwrap();
        assert_eq!(json, "\"abort_on_error\"");
    }

    #[test]
    fn test_report_buckets() {
        let mut report = SweepReport::default();
        assert!(report.is_empty());

        report.succeeded.push(ObjectRef::new("finance/q1.csv", 10));
        report
            .failed_archive
            .push(FailedObject::new("shipping/label.pdf", "delete denied"));

        assert!(!report.is_empty());
        assert!(report.has_failures());
        assert_eq!(report.total(), 2);
        assert_eq!(report.processed_names(), vec!["finance/q1.csv"]);
        assert_eq!(
            report.to_string(),
            "succeeded=1 failed_transfer=0 failed_archive=1"
        );
    }

    #[test]
    fn test_failures_only_report_is_not_empty() {
        let report = SweepReport {
            failed_transfer: vec![FailedObject::new("marketing/", "listing denied")],
            ..Default::default()
        };
        assert!(!report.is_empty());
        assert!(report.processed_names().is_empty());
    }
}
