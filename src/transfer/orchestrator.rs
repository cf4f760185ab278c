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

//! Sweep orchestration: one pass over every configured prefix, ending in a
//! single report.

use super::archiver::{ArchiveReceipt, Archiver, CopyConfirmation};
use super::enumerator::{ObjectRef, SourceEnumerator};
use super::error::{ArchiveError, SweepError, TransferError};
use super::executor::{TransferExecutor, TransferReceipt, DEFAULT_DESTINATION_BASE};
use super::report::{FailedObject, FailurePolicy, SweepReport};
use crate::notify::ReportNotifier;
use crate::storage::StorageProvider;
use crate::util::timing::measure_dur_async;
use futures::StreamExt;
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, warn};

/// Department prefixes swept when none are configured.
pub const DEFAULT_SOURCE_PREFIXES: [&str; 4] =
    ["marketing/", "engineering/", "finance/", "shipping/"];

/// Builder for constructing a `SweepOrchestrator`.
///
/// The three storage handles are built once by the caller and shared for the
/// life of the process.
///
/// # Examples
///
/// ```no_run
/// use blob_relay::storage::{StorageConfig, StorageProviderFactory};
/// use blob_relay::transfer::{FailurePolicy, SweepOrchestrator};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
/// let live = StorageProviderFactory::from_config(
///     StorageConfig::azure()
///         .with_option("container", "outbound")
///         .with_option("connection_string", "AccountName=acme;AccountKey=a2V5"),
/// )
/// .await?;
/// let archive = StorageProviderFactory::from_config(
///     StorageConfig::azure()
///         .with_option("container", "archive")
///         .with_option("connection_string", "AccountName=acme;AccountKey=a2V5"),
/// )
/// .await?;
/// let destination = StorageProviderFactory::from_config(
///     StorageConfig::gcs().with_option("bucket", "partner-drop"),
/// )
/// .await?;
///
/// let orchestrator = SweepOrchestrator::builder(live, archive, destination)
///     .with_prefixes(["finance/", "shipping/"])
///     .with_failure_policy(FailurePolicy::ContinueOnError)
///     .build();
/// let report = orchestrator.run_sweep().await?;
/// println!("{}", report);
/// # Ok(())
/// # }
/// ```
pub struct SweepOrchestratorBuilder {
    live: Arc<dyn StorageProvider>,
    archive: Arc<dyn StorageProvider>,
    destination: Arc<dyn StorageProvider>,
    prefixes: Vec<String>,
    base_path: String,
    failure_policy: FailurePolicy,
    copy_confirmation: CopyConfirmation,
    notifier: Option<ReportNotifier>,
}

impl SweepOrchestratorBuilder {
    pub fn new(
        live: Arc<dyn StorageProvider>,
        archive: Arc<dyn StorageProvider>,
        destination: Arc<dyn StorageProvider>,
    ) -> Self {
        Self {
            live,
            archive,
            destination,
            prefixes: DEFAULT_SOURCE_PREFIXES
                .iter()
                .map(|p| p.to_string())
                .collect(),
            base_path: DEFAULT_DESTINATION_BASE.to_string(),
            failure_policy: FailurePolicy::default(),
            copy_confirmation: CopyConfirmation::default(),
            notifier: None,
        }
    }

    /// Source prefixes, swept in the given order.
    pub fn with_prefixes<I, S>(mut self, prefixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.prefixes = prefixes.into_iter().map(Into::into).collect();
        self
    }

    /// Base path prepended to object names in the destination store.
    pub fn with_base_path(mut self, base_path: impl Into<String>) -> Self {
        self.base_path = base_path.into();
        self
    }

    pub fn with_failure_policy(mut self, failure_policy: FailurePolicy) -> Self {
        self.failure_policy = failure_policy;
        self
    }

    pub fn with_copy_confirmation(mut self, copy_confirmation: CopyConfirmation) -> Self {
        self.copy_confirmation = copy_confirmation;
        self
    }

    /// Report channel invoked once at the end of a sweep that found anything.
    pub fn with_notifier(mut self, notifier: ReportNotifier) -> Self {
        self.notifier = Some(notifier);
        self
    }

    pub fn build(self) -> SweepOrchestrator {
        if !self.copy_confirmation.is_enabled() {
            warn!("Archive copy confirmation is disabled, sources are deleted right after the copy is issued");
        }
        SweepOrchestrator {
            enumerator: SourceEnumerator::new(Arc::clone(&self.live)),
            executor: TransferExecutor::new(
                Arc::clone(&self.live),
                self.destination,
                self.base_path,
            ),
            archiver: Archiver::new(self.live, self.archive, self.copy_confirmation),
            prefixes: self.prefixes,
            failure_policy: self.failure_policy,
            notifier: self.notifier,
        }
    }
}

/// Drives one sweep: enumerate each prefix, transfer and archive every
/// object, then send a single report.
pub struct SweepOrchestrator {
    enumerator: SourceEnumerator,
    executor: TransferExecutor,
    archiver: Archiver,
    prefixes: Vec<String>,
    failure_policy: FailurePolicy,
    notifier: Option<ReportNotifier>,
}

enum ObjectFailure {
    Transfer(TransferError),
    Archive(ArchiveError),
}

impl From<ObjectFailure> for SweepError {
    fn from(failure: ObjectFailure) -> Self {
        match failure {
            ObjectFailure::Transfer(e) => SweepError::Transfer(e),
            ObjectFailure::Archive(e) => SweepError::Archive(e),
        }
    }
}

impl SweepOrchestrator {
    pub fn builder(
        live: Arc<dyn StorageProvider>,
        archive: Arc<dyn StorageProvider>,
        destination: Arc<dyn StorageProvider>,
    ) -> SweepOrchestratorBuilder {
        SweepOrchestratorBuilder::new(live, archive, destination)
    }

    pub fn prefixes(&self) -> &[String] {
        &self.prefixes
    }

    pub fn failure_policy(&self) -> FailurePolicy {
        self.failure_policy
    }

    /// Run one full sweep over every configured prefix.
    ///
    /// Under `FailurePolicy::ContinueOnError` every failure is recorded in the
    /// returned report and the sweep always completes. Under
    /// `FailurePolicy::AbortOnError` the first failure ends the sweep, objects
    /// already moved stay moved, and no report is sent.
    ///
    /// Notification problems are logged and never turn into an error here.
    ///
    /// # Errors
    ///
    /// Only under `FailurePolicy::AbortOnError`: the first `TransferError` or
    /// `ArchiveError` encountered.
    pub async fn run_sweep(&self) -> Result<SweepReport, SweepError> {
        let sweep_start = Instant::now();
        info!(
            "Sweep started prefixes={:?} failure_policy={:?}",
            self.prefixes, self.failure_policy
        );

        let report = match self.sweep_prefixes().await {
            Ok(report) => report,
            Err(e) => {
                error!(
                    "An error occurred during file processing, sweep aborted after {}ms: {}",
                    sweep_start.elapsed().as_millis(),
                    e
                );
                return Err(e);
            }
        };

        if report.is_empty() {
            info!("No new files found in any source directory to process.");
        } else {
            info!(
                "Sweep finished {} total={} took={}",
                report,
                report.total(),
                sweep_start.elapsed().as_millis()
            );
            match &self.notifier {
                Some(notifier) => {
                    notifier.notify(&report).await;
                }
                None => info!("No report notifier attached, skipping summary"),
            }
        }

        Ok(report)
    }

    async fn sweep_prefixes(&self) -> Result<SweepReport, SweepError> {
        let mut report = SweepReport::default();

        for prefix in &self.prefixes {
            info!("Checking for files in source prefix={}", prefix);
            let mut objects = self.enumerator.objects(prefix);
            let mut seen = 0usize;

            while let Some(item) = objects.next().await {
                let object = match item {
                    Ok(object) => object,
                    Err(e) => {
                        if self.failure_policy == FailurePolicy::AbortOnError {
                            return Err(e.into());
                        }
                        error!("Listing failed for prefix={}: {}", prefix, e);
                        report
                            .failed_transfer
                            .push(FailedObject::new(prefix.clone(), &e));
                        break;
                    }
                };
                seen += 1;

                match self.process_object(&object).await {
                    Ok(()) => report.succeeded.push(object),
                    Err(failure) if self.failure_policy == FailurePolicy::AbortOnError => {
                        return Err(failure.into());
                    }
                    Err(ObjectFailure::Transfer(e)) => {
                        error!("Transfer failed for object={}: {}", object.name, e);
                        report
                            .failed_transfer
                            .push(FailedObject::new(object.name, &e));
                    }
                    Err(ObjectFailure::Archive(e)) => {
                        error!(
                            "Archive failed for object={} after upload: {}",
                            object.name, e
                        );
                        report
                            .failed_archive
                            .push(FailedObject::new(object.name, &e));
                    }
                }
            }

            info!("Finished prefix={} objects={}", prefix, seen);
        }

        Ok(report)
    }

    async fn process_object(&self, object: &ObjectRef) -> Result<(), ObjectFailure> {
        info!("Processing blob: {}", object.name);

        let (transferred, _) = measure_dur_async(
            "transfer",
            || self.executor.transfer(object),
            Some(|r: &TransferReceipt| format!("destination={} bytes={}", r.destination, r.bytes)),
        )
        .await;
        transferred.map_err(ObjectFailure::Transfer)?;

        let (archived, _) = measure_dur_async(
            "archive",
            || self.archiver.archive(object),
            Some(|r: &ArchiveReceipt| format!("archive={} confirmed={}", r.archive_uri, r.confirmed)),
        )
        .await;
        archived.map_err(ObjectFailure::Archive)?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{StorageConfig, StorageProviderFactory};
    use bytes::Bytes;
    use std::time::Duration;

    async fn memory(name: &str) -> Arc<dyn StorageProvider> {
        StorageProviderFactory::from_config(StorageConfig::memory().with_option("name", name))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_builder_defaults() {
        let orchestrator =
            SweepOrchestrator::builder(memory("a").await, memory("b").await, memory("c").await)
                .build();
        assert_eq!(
            orchestrator.prefixes(),
            &["marketing/", "engineering/", "finance/", "shipping/"]
        );
        assert_eq!(orchestrator.failure_policy(), FailurePolicy::ContinueOnError);
    }

    #[tokio::test]
    async fn test_sweep_only_visits_configured_prefixes() {
        let live = memory("outbound").await;
        let archive = memory("archive").await;
        let destination = memory("gcs").await;
        live.write_file("finance/q1.csv", Bytes::from_static(b"q1"))
            .await
            .unwrap();
        live.write_file("legal/contract.pdf", Bytes::from_static(b"c"))
            .await
            .unwrap();

        let orchestrator = SweepOrchestrator::builder(live.clone(), archive, destination.clone())
            .with_prefixes(["finance/"])
            .with_copy_confirmation(CopyConfirmation::new(2, Duration::from_millis(1)))
            .build();
        let report = orchestrator.run_sweep().await.unwrap();

        assert_eq!(report.processed_names(), vec!["finance/q1.csv"]);
        assert!(live.exists("legal/contract.pdf").await.unwrap());
        assert!(destination.exists("upload/finance/q1.csv").await.unwrap());
    }

    #[tokio::test]
    async fn test_custom_base_path() {
        let live = memory("outbound").await;
        let destination = memory("gcs").await;
        live.write_file("shipping/label.pdf", Bytes::from_static(b"%PDF"))
            .await
            .unwrap();

        let orchestrator =
            SweepOrchestrator::builder(live, memory("archive").await, destination.clone())
                .with_prefixes(["shipping/"])
                .with_base_path("inbound/acme")
                .build();
        orchestrator.run_sweep().await.unwrap();

        assert!(destination
            .exists("inbound/acme/shipping/label.pdf")
            .await
            .unwrap());
    }
}
