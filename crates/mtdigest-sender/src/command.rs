//! Send through an external script, e.g. `python send_digest.py <file>`

use crate::provider::{DigestSender, SendError, SendReceipt, SendResult};
use mtdigest_core::{CommandSpec, Secret};
use std::path::{Path, PathBuf};
use tracing::info;

pub const TOKEN_ENV: &str = "BUTTONDOWN_TOKEN";

pub struct CommandSender {
    command: CommandSpec,
    workdir: PathBuf,
    token: Option<Secret>,
}

impl CommandSender {
    pub fn new(command: CommandSpec, workdir: impl AsRef<Path>) -> Self {
        Self {
            command,
            workdir: workdir.as_ref().to_path_buf(),
            token: None,
        }
    }

    /// Forward the email-service token to the child as `BUTTONDOWN_TOKEN`.
    pub fn with_token(mut self, token: Option<Secret>) -> Self {
        self.token = token;
        self
    }
}

#[async_trait::async_trait]
impl DigestSender for CommandSender {
    fn name(&self) -> &str { "command" }

    async fn send(&self, artifact: &Path) -> SendResult<SendReceipt> {
        let arg = artifact.to_string_lossy();
        let envs: Vec<(&str, &str)> = self
            .token
            .iter()
            .map(|t| (TOKEN_ENV, t.expose()))
            .collect();

        let output = self
            .command
            .run(&[arg.as_ref()], &self.workdir, &envs)
            .await
            .map_err(|e| SendError::CommandFailed(format!("{}: {e}", self.command.program)))?;

        for line in output.stdout.lines().filter(|l| !l.trim().is_empty()) {
            info!(target: "mtdigest::send", "{line}");
        }

        if output.success {
            Ok(SendReceipt::Delivered)
        } else {
            Err(SendError::CommandFailed(output.failure_summary()))
        }
    }
}
