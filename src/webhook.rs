//! Slack incoming-webhook delivery.
//!
//! One `POST` with a JSON body `{"text": "..."}`. Delivery problems never
//! fail the run: the caller reports them and carries on.

use std::time::Duration;

use anyhow::{Context, Result};

const TIMEOUT: Duration = Duration::from_secs(10);

/// What happened to the digest message.
#[derive(Debug)]
pub enum Delivery {
    /// No webhook URL configured.
    Disabled,
    Sent,
    Failed(anyhow::Error),
}

/// Post `text` to `url`, or do nothing when `url` is `None`.
pub async fn deliver(url: Option<&str>, text: &str) -> Delivery {
    let Some(url) = url else {
        tracing::debug!("no webhook configured; skipping delivery");
        return Delivery::Disabled;
    };

    match post_text(url, text).await {
        Ok(()) => Delivery::Sent,
        Err(e) => {
            tracing::warn!(error = %e, "webhook delivery failed");
            Delivery::Failed(e)
        }
    }
}

async fn post_text(url: &str, text: &str) -> Result<()> {
    let client = reqwest::Client::builder().timeout(TIMEOUT).build()?;
    client
        .post(url)
        .json(&serde_json::json!({ "text": text }))
        .send()
        .await
        .context("webhook request failed")?
        .error_for_status()
        .context("webhook rejected the message")?;
    Ok(())
}
