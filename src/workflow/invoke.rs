//! Digest generator invocation

use mtdigest_core::{CommandSpec, DigestOutcome, Error, Result, Secret, TargetDate};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub const OPENAI_KEY_ENV: &str = "OPENAI_API_KEY";

/// Runs the external digest generator for one date.
pub struct DigestInvoker {
    command: CommandSpec,
    workdir: PathBuf,
    api_key: Option<Secret>,
}

impl DigestInvoker {
    pub fn new(command: CommandSpec, workdir: impl AsRef<Path>) -> Self {
        Self {
            command,
            workdir: workdir.as_ref().to_path_buf(),
            api_key: None,
        }
    }

    /// Forward the AI-service key to the generator as `OPENAI_API_KEY`.
    pub fn with_api_key(mut self, key: Option<Secret>) -> Self {
        self.api_key = key;
        self
    }

    /// Run the generator with `date` as its last argument.
    ///
    /// Any generator failure is fatal. On success the outcome depends only on
    /// whether `mt_digest_<date>.md` now exists in the workdir: a quiet day
    /// legitimately produces nothing.
    pub async fn invoke(&self, date: &TargetDate) -> Result<DigestOutcome> {
        info!("Generating digest: {}", self.command.display_with(&[date.as_str()]));

        let envs: Vec<(&str, &str)> = self
            .api_key
            .iter()
            .map(|k| (OPENAI_KEY_ENV, k.expose()))
            .collect();

        let output = self
            .command
            .run(&[date.as_str()], &self.workdir, &envs)
            .await
            .map_err(|e| Error::generator_failed(format!("{}: {e}", self.command.program)))?;

        for line in output.stdout.lines().filter(|l| !l.trim().is_empty()) {
            info!(target: "mtdigest::generator", "{line}");
        }
        for line in output.stderr.lines().filter(|l| !l.trim().is_empty()) {
            debug!(target: "mtdigest::generator", "{line}");
        }

        if !output.success {
            return Err(Error::generator_failed(output.failure_summary()));
        }

        let outcome = DigestOutcome::from_artifact(date.artifact_path(&self.workdir));
        match &outcome {
            DigestOutcome::Generated(p) => info!("Digest generated: {}", p.display()),
            DigestOutcome::NoContent => info!("Generator produced no digest for {}", date),
        }
        Ok(outcome)
    }
}
