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

//! Sweep pipeline: enumerate, transfer, archive, report.

pub mod archiver;
pub mod enumerator;
pub mod error;
pub mod executor;
pub mod orchestrator;
pub mod report;

pub use archiver::{ArchivePhase, ArchiveReceipt, Archiver, CopyConfirmation};
pub use enumerator::{ObjectRef, SourceEnumerator};
pub use error::{ArchiveError, SweepError, TransferError};
pub use executor::{TransferExecutor, TransferReceipt, DEFAULT_DESTINATION_BASE};
pub use orchestrator::{SweepOrchestrator, SweepOrchestratorBuilder, DEFAULT_SOURCE_PREFIXES};
pub use report::{FailedObject, FailurePolicy, SweepReport};
