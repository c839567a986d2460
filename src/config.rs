//! Digest workflow configuration
//!
//! All tunable parameters in one place. Loaded from TOML at startup,
//! falls back to defaults if no config file exists. Secrets are never
//! part of the file; they come from the environment only.

use mtdigest_core::{CommandSpec, Secret, DEFAULT_OFFSET_DAYS};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DigestConfig {
    pub pipeline: PipelineConfig,
    /// External digest generator.
    pub generator: GeneratorConfig,
    pub sender: SenderConfig,
    pub persist: PersistConfig,
    pub schedule: ScheduleConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Directory the generator writes artifacts into; also the git work tree.
    pub workdir: String,
    /// Days subtracted from today (UTC) when no explicit date is given.
    pub offset_days: i64,
    /// Reject manual dates that are not `YYYY-MM-DD` instead of passing them through.
    pub strict_dates: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    /// Invoked as `<command> <args..> <date>`.
    pub command: CommandSpec,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum SenderBackend {
    /// External send script.
    Command,
    /// Native Buttondown API client.
    Buttondown,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SenderConfig {
    pub backend: SenderBackend,
    /// Buttondown API base URL.
    pub base_url: String,
    /// Pause before looking up an existing draft after a duplicate report.
    pub lookup_delay_ms: u64,
    /// Invoked as `<command> <args..> <artifact>` by the command backend.
    pub command: CommandSpec,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PersistConfig {
    pub enabled: bool,
    /// Globs, relative to the workdir, of files to stage.
    pub patterns: Vec<String>,
    /// `{date}` is replaced with the target date.
    pub commit_message: String,
    pub remote: Option<String>,
    pub branch: Option<String>,
    pub committer_name: Option<String>,
    pub committer_email: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScheduleConfig {
    /// Cron expression, UTC. Five fields like the CI trigger, or the
    /// seven-field `sec min hour day month weekday year` form.
    pub cron: String,
}

// ============================================================
// Defaults
// ============================================================

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            workdir: ".".into(),
            offset_days: DEFAULT_OFFSET_DAYS,
            strict_dates: false,
        }
    }
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            command: CommandSpec::new("python", &["mt_arxiv_digest.py"]),
        }
    }
}

impl Default for SenderConfig {
    fn default() -> Self {
        Self {
            backend: SenderBackend::Command,
            base_url: mtdigest_sender::BUTTONDOWN_API_URL.into(),
            lookup_delay_ms: 1_000,
            command: CommandSpec::new("python", &["send_digest.py"]),
        }
    }
}

impl Default for PersistConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            patterns: vec!["mt_digest_*.md".into(), "logs/*".into()],
            commit_message: "Add MT digest for {date}".into(),
            remote: None,
            branch: None,
            committer_name: None,
            committer_email: None,
        }
    }
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            cron: "20 6 * * *".into(),
        }
    }
}

// ============================================================
// Loading
// ============================================================

impl DigestConfig {
    /// Load config from a TOML file, falling back to defaults.
    pub fn load(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(content) => match toml::from_str(&content) {
                Ok(config) => {
                    tracing::info!("Loaded config from {}", path.display());
                    config
                }
                Err(e) => {
                    tracing::warn!("Failed to parse {}: {}, using defaults", path.display(), e);
                    Self::default()
                }
            },
            Err(_) => {
                tracing::info!("No config at {}, using defaults", path.display());
                Self::default()
            }
        }
    }

    /// Write the current config as TOML (for generating a default config file).
    pub fn to_toml(&self) -> String {
        toml::to_string_pretty(self).unwrap_or_default()
    }
}

impl ScheduleConfig {
    pub fn schedule(&self) -> mtdigest_core::Result<cron::Schedule> {
        crate::workflow::parse_schedule(&self.cron)
    }
}

impl PersistConfig {
    pub fn commit_message_for(&self, date: &str) -> String {
        self.commit_message.replace("{date}", date)
    }
}

// ============================================================
// Credentials
// ============================================================

/// Opaque credentials handed to the collaborators, never inspected.
#[derive(Debug, Clone, Default)]
pub struct Credentials {
    /// AI-service key for the digest generator.
    pub openai_api_key: Option<Secret>,
    /// Email-service token for the sender.
    pub buttondown_token: Option<Secret>,
}

impl Credentials {
    pub fn from_env() -> Self {
        Self {
            openai_api_key: Secret::from_env("OPENAI_API_KEY"),
            buttondown_token: Secret::from_env("BUTTONDOWN_TOKEN"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_daily_workflow() {
        let c = DigestConfig::default();
        assert_eq!(c.pipeline.offset_days, 4);
        assert_eq!(c.schedule.cron, "20 6 * * *");
        assert!(c.schedule.schedule().is_ok());
        assert_eq!(c.persist.patterns, vec!["mt_digest_*.md", "logs/*"]);
        assert_eq!(c.sender.backend, SenderBackend::Command);
        assert_eq!(c.generator.command.display_with(&["2024-03-06"]), "python mt_arxiv_digest.py 2024-03-06");
    }

    #[test]
    fn partial_toml_keeps_other_defaults() {
        let c: DigestConfig = toml::from_str(
            r#"
            [sender]
            backend = "buttondown"

            [generator.command]
            program = "./gen.sh"
            "#,
        )
        .unwrap();
        assert_eq!(c.sender.backend, SenderBackend::Buttondown);
        assert_eq!(c.sender.lookup_delay_ms, 1_000);
        assert_eq!(c.generator.command.program, "./gen.sh");
        assert!(c.generator.command.args.is_empty());
        assert!(c.persist.enabled);
    }

    #[test]
    fn dumped_config_parses_back() {
        let text = DigestConfig::default().to_toml();
        let back: DigestConfig = toml::from_str(&text).unwrap();
        assert_eq!(back.schedule.cron, "20 6 * * *");
        assert_eq!(back.sender.base_url, mtdigest_sender::BUTTONDOWN_API_URL);
    }

    #[test]
    fn missing_file_uses_defaults() {
        let c = DigestConfig::load(Path::new("/nonexistent/mtdigest.toml"));
        assert_eq!(c.pipeline.workdir, ".");
    }

    #[test]
    fn bad_cron_is_config_error() {
        let s = ScheduleConfig { cron: "6h20".into() };
        assert!(matches!(s.schedule(), Err(mtdigest_core::Error::ConfigError(_))));
    }

    #[test]
    fn schedule_section_reads_cron() {
        let c: DigestConfig = toml::from_str("[schedule]\ncron = \"0 7 * * 1-5\"\n").unwrap();
        assert_eq!(c.schedule.cron, "0 7 * * 1-5");
        assert!(c.schedule.schedule().is_ok());
    }

    #[test]
    fn commit_message_substitutes_date() {
        let p = PersistConfig::default();
        assert_eq!(p.commit_message_for("2024-03-06"), "Add MT digest for 2024-03-06");
    }
}
