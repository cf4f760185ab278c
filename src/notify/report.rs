//! HTML rendering of a sweep report.

use crate::transfer::{FailedObject, SweepReport};
use std::fmt::Write;

pub const SUBJECT_SUCCESS: &str = "File Transfer to GCS Successful";
pub const SUBJECT_WITH_FAILURES: &str = "File Transfer to GCS Completed With Failures";

const HEADING: &str = "<h3>Azure to GCS File Transfer Report</h3>";

/// A rendered report, ready for a notification channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailReport {
    pub subject: String,
    pub html_body: String,
}

/// "1 file" or "N files".
pub fn file_count(n: usize) -> String {
    if n == 1 {
        "1 file".to_string()
    } else {
        format!("{} files", n)
    }
}

/// Render `report` as a subject line and an HTML body.
///
/// Object names are listed as `<li>` items in discovery order. Failure
/// buckets get their own sections, and only appear when non-empty.
pub fn compose_report(report: &SweepReport) -> EmailReport {
    let subject = if report.has_failures() {
        SUBJECT_WITH_FAILURES
    } else {
        SUBJECT_SUCCESS
    };

    let mut html_body = String::from(HEADING);
    let succeeded = report.succeeded.len();

    if succeeded > 0 {
        let verb = if succeeded == 1 { "was" } else { "were" };
        let _ = write!(
            html_body,
            "<p>The following {} {} successfully transferred and archived:</p><ul>",
            file_count(succeeded),
            verb
        );
        for object in &report.succeeded {
            let _ = write!(html_body, "<li>{}</li>", escape_html(&object.name));
        }
        html_body.push_str("</ul>");
    } else {
        html_body.push_str("<p>No files were transferred and archived.</p>");
    }

    push_failures(
        &mut html_body,
        "could not be transferred",
        &report.failed_transfer,
    );
    push_failures(
        &mut html_body,
        "were transferred but could not be archived",
        &report.failed_archive,
    );

    EmailReport {
        subject: subject.to_string(),
        html_body,
    }
}

fn push_failures(html_body: &mut String, what: &str, failures: &[FailedObject]) {
    if failures.is_empty() {
        return;
    }
    let _ = write!(
        html_body,
        "<p>The following {} {}:</p><ul>",
        file_count(failures.len()),
        what
    );
    for failure in failures {
        let _ = write!(
            html_body,
            "<li>{}: {}</li>",
            escape_html(&failure.name),
            escape_html(&failure.reason)
        );
    }
    html_body.push_str("</ul>");
}

fn escape_html(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            other => escaped.push(other),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transfer::ObjectRef;

    fn succeeded(names: &[&str]) -> SweepReport {
        SweepReport {
            succeeded: names.iter().map(|n| ObjectRef::new(*n, 1)).collect(),
            ..Default::default()
        }
    }

    #[test]
    fn test_two_files_report() {
        let email = compose_report(&succeeded(&["finance/q1.csv", "shipping/label.pdf"]));

        assert_eq!(email.subject, SUBJECT_SUCCESS);
        assert!(email.html_body.starts_with(HEADING));
        assert!(email.html_body.contains("<li>finance/q1.csv</li>"));
        assert!(email.html_body.contains("<li>shipping/label.pdf</li>"));
        assert!(email.html_body.contains("2 files were"));
        assert!(!email.html_body.contains("could not"));
    }

    #[test]
    fn test_single_file_phrasing() {
        let email = compose_report(&succeeded(&["marketing/report.csv"]));
        assert!(email.html_body.contains("The following 1 file was successfully"));
    }

    #[test]
    fn test_failures_change_subject_and_add_sections() {
        let mut report = succeeded(&["finance/q1.csv"]);
        report
            .failed_transfer
            .push(FailedObject::new("finance/q2.csv", "upload rejected"));
        report
            .failed_archive
            .push(FailedObject::new("shipping/label.pdf", "copy not confirmed"));

        let email = compose_report(&report);
        assert_eq!(email.subject, SUBJECT_WITH_FAILURES);
        assert!(email
            .html_body
            .contains("1 file could not be transferred:</p><ul><li>finance/q2.csv: upload rejected</li>"));
        assert!(email
            .html_body
            .contains("<li>shipping/label.pdf: copy not confirmed</li>"));
    }

    #[test]
    fn test_only_failures() {
        let report = SweepReport {
            failed_transfer: vec![FailedObject::new("legal/", "listing denied")],
            ..Default::default()
        };
        let email = compose_report(&report);
        assert!(email.html_body.contains("No files were transferred and archived."));
        assert_eq!(email.subject, SUBJECT_WITH_FAILURES);
    }

    #[test]
    fn test_names_are_escaped() {
        let email = compose_report(&succeeded(&["marketing/<draft> & final.csv"]));
        assert!(email
            .html_body
            .contains("<li>marketing/&lt;draft&gt; &amp; final.csv</li>"));
    }

    #[test]
    fn test_file_count() {
        assert_eq!(file_count(0), "0 files");
        assert_eq!(file_count(1), "1 file");
        assert_eq!(file_count(12), "12 files");
    }
}
