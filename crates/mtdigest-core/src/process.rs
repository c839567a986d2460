//! External command execution

use serde::{Deserialize, Serialize};
use std::path::Path;
use tokio::process::Command;
use tracing::debug;

/// A program plus its leading arguments. Call sites append their own
/// arguments (a date, a file path) after these.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandSpec {
    pub program: String,
    #[serde(default)]
    pub args: Vec<String>,
}

impl CommandSpec {
    pub fn new(program: impl Into<String>, args: &[&str]) -> Self {
        Self {
            program: program.into(),
            args: args.iter().map(|a| a.to_string()).collect(),
        }
    }

    /// Render for log lines.
    pub fn display_with(&self, extra: &[&str]) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .chain(extra.iter().copied())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Run to completion in `cwd`, capturing output. Only a spawn failure is an `Err`;
    /// a non-zero exit comes back as an unsuccessful [`ProcessOutput`].
    pub async fn run(
        &self,
        extra: &[&str],
        cwd: &Path,
        envs: &[(&str, &str)],
    ) -> std::io::Result<ProcessOutput> {
        debug!("exec: {}", self.display_with(extra));
        let output = Command::new(&self.program)
            .args(&self.args)
            .args(extra)
            .current_dir(cwd)
            .envs(envs.iter().copied())
            .kill_on_drop(true)
            .output()
            .await?;
        Ok(ProcessOutput::from(output))
    }
}

#[derive(Debug, Clone)]
pub struct ProcessOutput {
    pub code: Option<i32>,
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
}

impl ProcessOutput {
    /// One-line failure summary: exit code plus the last stderr line.
    pub fn failure_summary(&self) -> String {
        let code = self
            .code
            .map(|c| format!("exit code {c}"))
            .unwrap_or_else(|| "terminated by signal".into());
        match self.stderr.lines().rev().find(|l| !l.trim().is_empty()) {
            Some(line) => format!("{code}: {}", line.trim()),
            None => code,
        }
    }
}

impl From<std::process::Output> for ProcessOutput {
    fn from(output: std::process::Output) -> Self {
        Self {
            code: output.status.code(),
            success: output.status.success(),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_appends_extra_args() {
        let spec = CommandSpec::new("python", &["mt_arxiv_digest.py"]);
        assert_eq!(spec.display_with(&["2024-03-06"]), "python mt_arxiv_digest.py 2024-03-06");
    }

    #[test]
    fn failure_summary_uses_last_stderr_line() {
        let out = ProcessOutput {
            code: Some(2),
            success: false,
            stdout: String::new(),
            stderr: "Traceback\n  boom\nKeyError: 'x'\n\n".into(),
        };
        assert_eq!(out.failure_summary(), "exit code 2: KeyError: 'x'");
    }

    #[tokio::test]
    async fn run_reports_nonzero_exit() {
        let spec = CommandSpec::new("sh", &["-c", "echo oops >&2; exit 3"]);
        let out = spec.run(&[], Path::new("."), &[]).await.unwrap();
        assert!(!out.success);
        assert_eq!(out.code, Some(3));
        assert_eq!(out.stderr.trim(), "oops");
    }

    #[tokio::test]
    async fn run_passes_extra_args_and_env() {
        let spec = CommandSpec::new("sh", &["-c", "echo \"$1 $GREETING\"", "sh"]);
        let out = spec
            .run(&["2024-03-06"], Path::new("."), &[("GREETING", "hi")])
            .await
            .unwrap();
        assert!(out.success);
        assert_eq!(out.stdout.trim(), "2024-03-06 hi");
    }

    #[tokio::test]
    async fn run_missing_program_is_spawn_error() {
        let spec = CommandSpec::new("definitely-not-a-real-program-mtdigest", &[]);
        assert!(spec.run(&[], Path::new("."), &[]).await.is_err());
    }
}
