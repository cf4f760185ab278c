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

//! # Blob Relay
//!
//! Moves files dropped into department prefixes of an Azure Blob Storage
//! container to a Google Cloud Storage bucket, archives the originals into a
//! second container and mails a summary of what moved.
//!
//! One call to [`SweepOrchestrator::run_sweep`] is one pass over every
//! configured prefix. Scheduling is left to whatever runs the binary.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use blob_relay::cli::RelayArgs;
//! use blob_relay::{ReportNotifier, StorageProviderFactory, SweepOrchestrator};
//! use clap::Parser;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
//! let config = RelayArgs::parse().into_config()?;
//!
//! let live = StorageProviderFactory::from_config(config.source_storage_config()).await?;
//! let archive = StorageProviderFactory::from_config(config.archive_storage_config()).await?;
//! let destination =
//!     StorageProviderFactory::from_config(config.destination_storage_config()).await?;
//!
//! let orchestrator = SweepOrchestrator::builder(live, archive, destination)
//!     .with_prefixes(config.source_prefixes.clone())
//!     .with_base_path(config.destination_base_path.clone())
//!     .with_failure_policy(config.failure_policy)
//!     .with_copy_confirmation(config.copy_confirmation)
//!     .with_notifier(ReportNotifier::from_config(&config.notification))
//!     .build();
//!
//! let report = orchestrator.run_sweep().await?;
//! println!("{}", report);
//! # Ok(())
//! # }
//! ```
//!
//! ## Modules
//!
//! - [`cli`] - Flags and environment variables for the binary
//! - [`config`] - Validated settings, also loadable from JSON
//! - [`notify`] - Report rendering and mail delivery
//! - [`storage`] - Cloud storage abstraction layer
//! - [`transfer`] - Enumeration, transfer, archiving and the sweep itself
//! - [`util`] - Retry and timing helpers

pub mod cli;
pub mod config;
pub mod notify;
pub mod storage;
pub mod transfer;
pub mod util;

// Re-export commonly used types
pub use config::{ConfigError, RelayConfig};
pub use notify::{Notifier, ReportNotifier};
pub use storage::{StorageConfig, StorageProvider, StorageProviderFactory};
pub use transfer::{FailurePolicy, SweepError, SweepOrchestrator, SweepReport};
