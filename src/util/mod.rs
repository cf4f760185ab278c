//! Utility functions and helpers
//!
//! - [`retry`] - Retry logic for transient storage failures
//! - [`timing`] - Wall-time measurement with log output

pub mod retry;
pub mod timing;
