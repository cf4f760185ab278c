//! Mail delivery through the Microsoft Graph `sendMail` endpoint.
//!
//! Authentication uses the OAuth2 client-credentials flow against the tenant's
//! token endpoint. A fresh token is requested for every message; a sweep sends
//! at most one.

use super::error::NotificationError;
use super::Notifier;
use crate::config::{NotificationConfig, Secret};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info};

pub const DEFAULT_AUTHORITY_HOST: &str = "https://login.microsoftonline.com";
pub const DEFAULT_GRAPH_BASE_URL: &str = "https://graph.microsoft.com";
const GRAPH_SCOPE: &str = "https://graph.microsoft.com/.default";

/// App registration used to obtain Graph tokens
#[derive(Debug, Clone)]
pub struct GraphCredentials {
    pub tenant_id: String,
    pub client_id: String,
    pub client_secret: Secret,
}

/// Sends HTML mail as a fixed mailbox via Microsoft Graph
#[derive(Debug, Clone)]
pub struct GraphMailNotifier {
    http: reqwest::Client,
    credentials: GraphCredentials,
    sender: String,
    authority_host: String,
    graph_base_url: String,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Debug, Deserialize)]
struct TokenErrorResponse {
    error: String,
    #[serde(default)]
    error_description: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SendMailRequest<'a> {
    message: Message<'a>,
    save_to_sent_items: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Message<'a> {
    subject: &'a str,
    body: ItemBody<'a>,
    to_recipients: Vec<Recipient<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ItemBody<'a> {
    content_type: &'static str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Recipient<'a> {
    email_address: EmailAddress<'a>,
}

#[derive(Debug, Serialize)]
struct EmailAddress<'a> {
    address: &'a str,
}

impl GraphMailNotifier {
    pub fn new(http: reqwest::Client, credentials: GraphCredentials, sender: impl Into<String>) -> Self {
        Self {
            http,
            credentials,
            sender: sender.into(),
            authority_host: DEFAULT_AUTHORITY_HOST.to_string(),
            graph_base_url: DEFAULT_GRAPH_BASE_URL.to_string(),
        }
    }

    /// Build a notifier from the notification settings.
    ///
    /// # Errors
    ///
    /// * `NotificationError::NotConfigured` if any credential or the sender is missing
    /// * `NotificationError::Http` if the HTTP client cannot be built
    pub fn from_config(config: &NotificationConfig) -> Result<Self, NotificationError> {
        let missing = config.missing_fields();
        let (Some(tenant_id), Some(client_id), Some(client_secret), Some(sender)) = (
            config.tenant_id.as_ref(),
            config.client_id.as_ref(),
            config.client_secret.as_ref(),
            config.mail_from.as_ref(),
        ) else {
            return Err(NotificationError::NotConfigured(missing));
        };
        if !missing.is_empty() {
            return Err(NotificationError::NotConfigured(missing));
        }

        let http = reqwest::Client::builder()
            .user_agent(concat!("blob-relay/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;

        let credentials = GraphCredentials {
            tenant_id: tenant_id.clone(),
            client_id: client_id.clone(),
            client_secret: client_secret.clone(),
        };

        Ok(Self::new(http, credentials, sender.clone())
            .with_authority_host(config.authority_host.clone())
            .with_graph_base_url(config.graph_base_url.clone()))
    }

    pub fn with_authority_host(mut self, authority_host: impl Into<String>) -> Self {
        self.authority_host = authority_host.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_graph_base_url(mut self, graph_base_url: impl Into<String>) -> Self {
        self.graph_base_url = graph_base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn sender(&self) -> &str {
        &self.sender
    }

    fn token_url(&self) -> String {
        format!(
            "{}/{}/oauth2/v2.0/token",
            self.authority_host, self.credentials.tenant_id
        )
    }

    fn send_mail_url(&self) -> String {
        format!("{}/v1.0/users/{}/sendMail", self.graph_base_url, self.sender)
    }

    /// Acquire an application token for the Graph scope.
    ///
    /// # Errors
    ///
    /// Returns `NotificationError::Auth` if the token endpoint is unreachable,
    /// rejects the credentials or returns no token.
    pub async fn authenticate(&self) -> Result<String, NotificationError> {
        let response = self
            .http
            .post(self.token_url())
            .form(&[
                ("grant_type", "client_credentials"),
                ("client_id", self.credentials.client_id.as_str()),
                ("client_secret", self.credentials.client_secret.expose()),
                ("scope", GRAPH_SCOPE),
            ])
            .send()
            .await
            .map_err(|e| NotificationError::Auth(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let reason = match serde_json::from_str::<TokenErrorResponse>(&body) {
                Ok(err) => match err.error_description {
                    Some(description) => format!("{}: {}", err.error, description),
                    None => err.error,
                },
                Err(_) => body,
            };
            return Err(NotificationError::Auth(format!("status={} {}", status, reason)));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| NotificationError::Auth(format!("malformed token response: {}", e)))?;
        debug!("Acquired Graph token for client_id={}", self.credentials.client_id);
        Ok(token.access_token)
    }
}

/// Split a recipient setting into addresses; `,` and `;` both separate.
pub fn parse_recipients(recipient: &str) -> Vec<&str> {
    recipient
        .split([',', ';'])
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect()
}

#[async_trait]
impl Notifier for GraphMailNotifier {
    async fn send(
        &self,
        subject: &str,
        html_body: &str,
        recipient: &str,
    ) -> Result<(), NotificationError> {
        let recipients = parse_recipients(recipient);
        if recipients.is_empty() {
            return Err(NotificationError::NotConfigured(vec!["MAIL_TO"]));
        }

        let token = self.authenticate().await?;

        let request = SendMailRequest {
            message: Message {
                subject,
                body: ItemBody {
                    content_type: "HTML",
                    content: html_body,
                },
                to_recipients: recipients
                    .iter()
                    .map(|address| Recipient {
                        email_address: EmailAddress { address },
                    })
                    .collect(),
            },
            save_to_sent_items: true,
        };

        let response = self
            .http
            .post(self.send_mail_url())
            .bearer_auth(token)
            .json(&request)
            .send()
            .await
            .map_err(|e| NotificationError::Send(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(NotificationError::Send(format!("status={} {}", status, body)));
        }

        info!(
            "Report mail sent from={} to={} status={}",
            self.sender,
            recipients.join(","),
            status
        );
        Ok(())
    }
}
