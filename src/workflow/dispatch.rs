//! Conditional send of a generated digest

use mtdigest_core::{DigestOutcome, Error, Result, TargetDate};
use mtdigest_sender::{DigestSender, SendReceipt};
use serde::Serialize;
use tracing::info;

use super::annotate;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DispatchOutcome {
    Sent { receipt: SendReceipt },
    /// No artifact; `warning` is the annotation that was emitted.
    Skipped { warning: String },
}

/// Send the digest if one was generated; otherwise warn and skip.
///
/// A missing digest is expected and never an error. A failed send is.
pub async fn dispatch(
    outcome: &DigestOutcome,
    date: &TargetDate,
    sender: &dyn DigestSender,
) -> Result<DispatchOutcome> {
    let Some(artifact) = outcome.artifact() else {
        let warning = annotate::warning(
            "No digest",
            &format!("{} was not generated; skipping send", date.artifact_name()),
        );
        return Ok(DispatchOutcome::Skipped { warning });
    };

    info!("Sending {} via {}", artifact.display(), sender.name());
    let receipt = sender
        .send(artifact)
        .await
        .map_err(|e| Error::send_failed(sender.name(), e.to_string()))?;

    info!("Send complete: {:?}", receipt);
    Ok(DispatchOutcome::Sent { receipt })
}
