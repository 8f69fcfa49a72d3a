//! Contact notification mails through the Resend HTTP API
//!
//! Without an API key nothing is sent. Delivery problems are reported to
//! the caller as [`MailError`] and only ever logged by the contact handler.

use chrono::{DateTime, Duration, Utc};
use kaushiru_common::config::ContactConfig;
use kaushiru_common::time::JST_OFFSET_HOURS;
use serde::Serialize;
use std::time::Duration as StdDuration;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::store::contacts::ContactMessage;

const RESEND_ENDPOINT: &str = "https://api.resend.com/emails";
const SENDER: &str = "かうしる <noreply@kau-shiru.vercel.app>";
const USER_AGENT: &str = concat!("kaushiru-server/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Error)]
pub enum MailError {
    #[error("Network error: {0}")]
    Network(String),

    /// Monthly or per-second sending limit reached (HTTP 429)
    #[error("Sending quota exhausted: {0}")]
    Quota(String),

    #[error("API error {0}: {1}")]
    Api(u16, String),
}

/// Outcome of a delivery attempt that did not fail
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MailOutcome {
    Sent,
    /// No API key configured
    Skipped,
}

#[derive(Debug, Serialize)]
struct ResendRequest<'a> {
    from: &'a str,
    to: [&'a str; 1],
    reply_to: &'a str,
    subject: String,
    text: String,
}

#[derive(Clone)]
pub struct Mailer {
    http_client: reqwest::Client,
    api_key: Option<String>,
    recipient: String,
    endpoint: String,
}

impl Mailer {
    pub fn new(config: &ContactConfig) -> Result<Self, MailError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(StdDuration::from_secs(10))
            .build()
            .map_err(|e| MailError::Network(e.to_string()))?;

        Ok(Self {
            http_client,
            api_key: config.resend_api_key.clone().filter(|k| !k.trim().is_empty()),
            recipient: config.email.clone(),
            endpoint: RESEND_ENDPOINT.to_string(),
        })
    }

    /// Send to another Resend-compatible endpoint
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Mailer that never sends
    pub fn disabled() -> Self {
        Self {
            http_client: reqwest::Client::new(),
            api_key: None,
            recipient: String::new(),
            endpoint: RESEND_ENDPOINT.to_string(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.api_key.is_some()
    }

    pub async fn send_contact(&self, contact: &ContactMessage) -> Result<MailOutcome, MailError> {
        let Some(api_key) = &self.api_key else {
            debug!("No Resend API key, contact {} not mailed", contact.id);
            return Ok(MailOutcome::Skipped);
        };

        let request = ResendRequest {
            from: SENDER,
            to: [self.recipient.as_str()],
            reply_to: contact.email.as_deref().unwrap_or(&self.recipient),
            subject: contact_subject(contact),
            text: contact_body(contact, Utc::now()),
        };

        let response = self
            .http_client
            .post(&self.endpoint)
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| MailError::Network(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            info!("Contact {} mailed to {}", contact.id, self.recipient);
            return Ok(MailOutcome::Sent);
        }

        let body = response.text().await.unwrap_or_default();
        if status.as_u16() == 429 || body.contains("rate limit") || body.contains("quota") {
            return Err(MailError::Quota(body));
        }
        Err(MailError::Api(status.as_u16(), body))
    }

    /// Send and log the outcome; never fails
    pub async fn notify_contact(&self, contact: &ContactMessage) {
        match self.send_contact(contact).await {
            Ok(MailOutcome::Sent) => {}
            Ok(MailOutcome::Skipped) => {
                warn!("RESEND_API_KEY not set; contact {} stored without mail", contact.id)
            }
            Err(MailError::Quota(msg)) => {
                warn!("Resend quota reached; contact {} stored without mail: {}", contact.id, msg)
            }
            Err(e) => warn!("Mail for contact {} failed: {}", contact.id, e),
        }
    }
}

fn contact_subject(contact: &ContactMessage) -> String {
    format!(
        "【かうしる】お問い合わせ: {}",
        contact.name.as_deref().unwrap_or("（名前未入力）")
    )
}

fn contact_body(contact: &ContactMessage, sent_at: DateTime<Utc>) -> String {
    let jst = sent_at + Duration::hours(JST_OFFSET_HOURS);
    format!(
        "新しいお問い合わせが届きました。\n\n\
         【お名前】\n{}\n\n\
         【メールアドレス】\n{}\n\n\
         【お問い合わせ内容】\n{}\n\n\
         ---\n\
         送信日時: {}\n\
         問い合わせID: {}",
        contact.name.as_deref().unwrap_or("（未入力）"),
        contact.email.as_deref().unwrap_or("（未入力）"),
        contact.message,
        jst.format("%Y/%m/%d %H:%M:%S"),
        contact.id
    )
}
