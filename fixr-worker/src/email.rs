/// Transactional email over an HTTP API
///
/// Speaks the Resend wire format: `POST {base}/emails` with a bearer key and
/// a JSON body, answered by `{ "id": "..." }`. Without an API key the client
/// runs in log-only mode, which keeps local development free of provider
/// credentials.
///
/// # Example
///
/// ```no_run
/// use fixr_worker::email::{EmailClient, EmailConfig, EmailMessage};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = EmailClient::new(EmailConfig::from_env())?;
/// let id = client
///     .send(&EmailMessage {
///         to: "ada@example.com".to_string(),
///         subject: "Hello".to_string(),
///         html: "<p>Hello</p>".to_string(),
///         text: "Hello".to_string(),
///     })
///     .await?;
/// println!("provider id: {:?}", id);
/// # Ok(())
/// # }
/// ```

use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_API_URL: &str = "https://api.resend.com";
pub const DEFAULT_FROM: &str = "Fixr <hello@fixr.app>";

#[derive(Debug, Error)]
pub enum EmailError {
    #[error("email transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Provider answered with a non-2xx status
    #[error("email provider rejected request ({status}): {body}")]
    Rejected { status: u16, body: String },
}

impl EmailError {
    /// Client errors other than rate limiting will fail the same way again
    pub fn is_permanent(&self) -> bool {
        match self {
            EmailError::Transport(_) => false,
            EmailError::Rejected { status, .. } => (400..500).contains(status) && *status != 429,
        }
    }
}

#[derive(Debug, Clone)]
pub struct EmailConfig {
    pub api_url: String,

    /// None switches the client to log-only mode
    pub api_key: Option<String>,

    pub from: String,

    pub timeout_secs: u64,
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            api_key: None,
            from: DEFAULT_FROM.to_string(),
            timeout_secs: 10,
        }
    }
}

impl EmailConfig {
    /// Reads `EMAIL_API_URL`, `EMAIL_API_KEY` and `EMAIL_FROM`
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            api_url: env::var("EMAIL_API_URL").unwrap_or(defaults.api_url),
            api_key: env::var("EMAIL_API_KEY").ok().filter(|k| !k.trim().is_empty()),
            from: env::var("EMAIL_FROM").unwrap_or(defaults.from),
            timeout_secs: defaults.timeout_secs,
        }
    }
}

/// One outgoing email
#[derive(Debug, Clone, PartialEq)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub html: String,
    pub text: String,
}

#[derive(Serialize)]
struct SendRequest<'a> {
    from: &'a str,
    to: [&'a str; 1],
    subject: &'a str,
    html: &'a str,
    text: &'a str,
}

#[derive(Deserialize)]
struct SendResponse {
    id: String,
}

#[derive(Clone)]
pub struct EmailClient {
    http: reqwest::Client,
    config: EmailConfig,
}

impl EmailClient {
    pub fn new(config: EmailConfig) -> Result<Self, EmailError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        if config.api_key.is_none() {
            tracing::warn!("EMAIL_API_KEY not set, emails will be logged instead of sent");
        }

        Ok(Self { http, config })
    }

    pub fn is_enabled(&self) -> bool {
        self.config.api_key.is_some()
    }

    /// Sends `message`; returns the provider id, or None in log-only mode
    pub async fn send(&self, message: &EmailMessage) -> Result<Option<String>, EmailError> {
        let Some(api_key) = &self.config.api_key else {
            tracing::info!(
                to = %message.to,
                subject = %message.subject,
                "Email delivery disabled, skipping send"
            );
            return Ok(None);
        };

        let url = format!("{}/emails", self.config.api_url.trim_end_matches('/'));
        let response = self
            .http
            .post(&url)
            .bearer_auth(api_key)
            .json(&SendRequest {
                from: &self.config.from,
                to: [&message.to],
                subject: &message.subject,
                html: &message.html,
                text: &message.text,
            })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(EmailError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        let SendResponse { id } = response.json().await?;
        tracing::info!(to = %message.to, email_id = %id, "Email sent");
        Ok(Some(id))
    }
}
