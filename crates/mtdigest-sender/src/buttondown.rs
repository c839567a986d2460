//! Buttondown newsletter API sender
//!
//! Queues the digest as a draft, then sends the draft to all active
//! subscribers. Both steps tolerate `email_duplicate` so a re-run for the
//! same date stays green.

use crate::provider::{DigestSender, SendError, SendReceipt, SendResult};
use mtdigest_core::{artifact_date, Secret};
use reqwest::{Client, Response, StatusCode};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info};

pub const BUTTONDOWN_API_URL: &str = "https://api.buttondown.email/v1";
const HTTP_TIMEOUT: Duration = Duration::from_secs(30);
const DUPLICATE_CODE: &str = "email_duplicate";

pub struct ButtondownSender {
    client: Client,
    token: Option<Secret>,
    base_url: String,
    lookup_delay: Duration,
}

impl ButtondownSender {
    pub fn new(token: Option<Secret>) -> Self {
        let client = Client::builder()
            .timeout(HTTP_TIMEOUT)
            .build()
            .unwrap_or_default();
        Self {
            client,
            token,
            base_url: BUTTONDOWN_API_URL.to_string(),
            lookup_delay: Duration::from_secs(1),
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// Pause before searching for an existing draft after a duplicate report.
    pub fn with_lookup_delay(mut self, delay: Duration) -> Self {
        self.lookup_delay = delay;
        self
    }

    fn auth(&self) -> SendResult<String> {
        self.token
            .as_ref()
            .map(|t| format!("Token {}", t.expose()))
            .ok_or(SendError::MissingToken("BUTTONDOWN_TOKEN"))
    }

    async fn create_draft(&self, auth: &str, subject: &str, body: String) -> SendResult<String> {
        let payload = DraftRequest {
            subject,
            body,
            markdown: true,
            publish_url: false,
        };
        let resp = self
            .client
            .post(format!("{}/emails", self.base_url))
            .header("Authorization", auth)
            .json(&payload)
            .send()
            .await?;

        if resp.status().is_success() {
            let email: EmailRef = resp.json().await?;
            info!("Draft created: {}", email.id);
            return Ok(email.id);
        }

        let (status, body, code) = read_failure(resp).await;
        if code.as_deref() != Some(DUPLICATE_CODE) {
            return Err(SendError::Api { status, body });
        }

        info!("Draft already exists, fetching its id");
        tokio::time::sleep(self.lookup_delay).await;
        let id = self.find_draft(auth, subject).await?;
        info!("Re-using draft: {}", id);
        Ok(id)
    }

    async fn find_draft(&self, auth: &str, subject: &str) -> SendResult<String> {
        let resp = self
            .client
            .get(format!("{}/emails", self.base_url))
            .header("Authorization", auth)
            .query(&[("state", "draft"), ("search", subject)])
            .send()
            .await?;

        if !resp.status().is_success() {
            let (status, body, _) = read_failure(resp).await;
            return Err(SendError::Api { status, body });
        }

        let page: EmailPage = resp.json().await?;
        page.results
            .into_iter()
            .next()
            .map(|e| e.id)
            .ok_or(SendError::DuplicateNotFound)
    }

    async fn send_draft(&self, auth: &str, email_id: String) -> SendResult<SendReceipt> {
        let resp = self
            .client
            .post(format!("{}/emails/{}/send-draft", self.base_url, email_id))
            .header("Authorization", auth)
            .json(&serde_json::json!({}))
            .send()
            .await?;

        if resp.status().is_success() {
            info!("Sent draft {} to subscribers", email_id);
            return Ok(SendReceipt::Sent { email_id });
        }

        let (status, body, code) = read_failure(resp).await;
        if status == StatusCode::BAD_REQUEST.as_u16() && code.as_deref() == Some(DUPLICATE_CODE) {
            info!("Email {} already sent earlier, nothing to do", email_id);
            return Ok(SendReceipt::AlreadySent { email_id });
        }
        Err(SendError::Api { status, body })
    }
}

#[async_trait::async_trait]
impl DigestSender for ButtondownSender {
    fn name(&self) -> &str { "buttondown" }

    async fn send(&self, artifact: &Path) -> SendResult<SendReceipt> {
        if !artifact.is_file() {
            return Err(SendError::ArtifactMissing(artifact.display().to_string()));
        }
        let auth = self.auth()?;
        let subject = digest_subject(artifact)?;
        let body = tokio::fs::read_to_string(artifact).await?;

        debug!("Buttondown draft: subject={subject:?}, {} bytes", body.len());
        let email_id = self.create_draft(&auth, &subject, body).await?;
        self.send_draft(&auth, email_id).await
    }
}

/// `Machine-Translation Digest — May 19 2025` for `mt_digest_2025-05-19.md`.
pub fn digest_subject(artifact: &Path) -> SendResult<String> {
    let date = artifact_date(artifact)
        .ok_or_else(|| SendError::BadArtifactName(artifact.display().to_string()))?;
    Ok(format!("Machine-Translation Digest — {}", date.format("%b %d %Y")))
}

/// Status, raw body and the `code` field if the body is a JSON error object.
async fn read_failure(resp: Response) -> (u16, String, Option<String>) {
    let status = resp.status().as_u16();
    let body = resp.text().await.unwrap_or_default();
    let code = serde_json::from_str::<ApiError>(&body)
        .ok()
        .and_then(|e| e.code);
    (status, body, code)
}

#[derive(Serialize)]
struct DraftRequest<'a> {
    subject: &'a str,
    body: String,
    markdown: bool,
    publish_url: bool,
}

#[derive(Deserialize)]
struct EmailRef {
    id: String,
}

#[derive(Deserialize)]
struct EmailPage {
    #[serde(default)]
    results: Vec<EmailRef>,
}

#[derive(Deserialize)]
struct ApiError {
    code: Option<String>,
}
