use thiserror::Error;

/// Errors raised while delivering the sweep report.
///
/// None of these abort a sweep; the report notifier logs them and moves on.
#[derive(Error, Debug)]
pub enum NotificationError {
    #[error("Notification channel is not configured, missing: {}", .0.join(", "))]
    NotConfigured(Vec<&'static str>),

    #[error("Failed to acquire access token: {0}")]
    Auth(String),

    #[error("Failed to send message: {0}")]
    Send(String),

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),
}
