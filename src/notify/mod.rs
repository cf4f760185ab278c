// Copyright 2025 Adobe. All rights reserved.
// This file is licensed to you under the Apache License,
// Version 2.0 (http://www.apache.org/licenses/LICENSE-2.0)
// or the MIT license (http://opensource.org/licenses/MIT),
// at your option.
//
// Unless required by applicable law or agreed to in writing,
// this software is distributed on an "AS IS" BASIS, WITHOUT
// WARRANTIES OR REPRESENTATIONS OF ANY KIND, either express or
// implied. See the LICENSE-MIT and LICENSE-APACHE files for the
// specific language governing permissions and limitations under
// each license.

//! Sweep report delivery
//!
//! A [`Notifier`] is any channel that can deliver an HTML message to a
//! recipient. [`ReportNotifier`] turns a [`SweepReport`] into that message and
//! absorbs every delivery problem so a sweep never fails because of mail.

pub mod error;
pub mod graph;
pub mod report;

pub use error::NotificationError;
pub use graph::{GraphCredentials, GraphMailNotifier};
pub use report::{compose_report, EmailReport};

use crate::config::NotificationConfig;
use crate::transfer::SweepReport;
use async_trait::async_trait;
use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::sync::Arc;
use tracing::{error, info, warn};

/// A channel able to deliver a formatted message
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver `html_body` under `subject` to `recipient`.
    ///
    /// # Errors
    ///
    /// * `NotificationError::Auth` if the channel could not authenticate
    /// * `NotificationError::Send` if delivery was rejected
    async fn send(
        &self,
        subject: &str,
        html_body: &str,
        recipient: &str,
    ) -> Result<(), NotificationError>;
}

/// What happened to a report
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationOutcome {
    Sent,
    Skipped,
    Failed,
}

/// Composes and delivers the end-of-sweep report
pub struct ReportNotifier {
    channel: Option<Arc<dyn Notifier>>,
    recipient: String,
    missing: Vec<&'static str>,
}

impl ReportNotifier {
    pub fn new(channel: Arc<dyn Notifier>, recipient: impl Into<String>) -> Self {
        Self {
            channel: Some(channel),
            recipient: recipient.into(),
            missing: Vec::new(),
        }
    }

    /// A notifier that skips every report, remembering which settings were absent.
    pub fn unconfigured(missing: Vec<&'static str>) -> Self {
        Self {
            channel: None,
            recipient: String::new(),
            missing,
        }
    }

    /// Build the Graph mail channel from settings.
    ///
    /// Incomplete settings never fail here: the notifier is created
    /// unconfigured and warns when a report would have been sent.
    pub fn from_config(config: &NotificationConfig) -> Self {
        let recipient = match config.mail_to.as_deref() {
            Some(to) if !to.trim().is_empty() => to.to_string(),
            _ => return Self::unconfigured(config.missing_fields()),
        };

        match GraphMailNotifier::from_config(config) {
            Ok(channel) => Self::new(Arc::new(channel), recipient),
            Err(NotificationError::NotConfigured(missing)) => Self::unconfigured(missing),
            Err(e) => {
                error!("Failed to build mail channel: {}", e);
                Self::unconfigured(Vec::new())
            }
        }
    }

    pub fn is_configured(&self) -> bool {
        self.channel.is_some()
    }

    /// Send one report for `report`.
    ///
    /// Never fails: configuration gaps are logged as warnings and delivery
    /// errors as errors.
    pub async fn notify(&self, report: &SweepReport) -> NotificationOutcome {
        if report.is_empty() {
            info!("Nothing to report, notification skipped");
            return NotificationOutcome::Skipped;
        }

        let Some(channel) = &self.channel else {
            let err = NotificationError::NotConfigured(self.missing.clone());
            warn!("Skipping transfer report for {} objects: {}", report.total(), err);
            return NotificationOutcome::Skipped;
        };

        let email = compose_report(report);
        match channel
            .send(&email.subject, &email.html_body, &self.recipient)
            .await
        {
            Ok(()) => {
                info!(
                    "Successfully sent transfer report subject=\"{}\" recipient={}",
                    email.subject, self.recipient
                );
                NotificationOutcome::Sent
            }
            Err(e @ NotificationError::Auth(_)) => {
                error!("Could not authenticate mail channel, report not sent: {}", e);
                NotificationOutcome::Failed
            }
            Err(e) => {
                error!("An error occurred while sending the transfer report: {}", e);
                NotificationOutcome::Failed
            }
        }
    }
}

impl Debug for ReportNotifier {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("ReportNotifier")
            .field("configured", &self.is_configured())
            .field("recipient", &self.recipient)
            .field("missing", &self.missing)
            .finish()
    }
}
