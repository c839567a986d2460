//! Best-effort commit and push of generated artifacts
//!
//! Nothing here can fail the run. Every git step is attempted exactly once
//! and its failure is logged as a warning.

use globset::{GlobBuilder, GlobSet, GlobSetBuilder};
use mtdigest_core::{CommandSpec, TargetDate};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::config::PersistConfig;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PersistReport {
    /// Paths handed to `git add`, relative to the workdir.
    pub staged: Vec<String>,
    pub committed: bool,
    pub pushed: bool,
}

pub struct ArtifactPersister {
    workdir: PathBuf,
    config: PersistConfig,
    git: String,
}

impl ArtifactPersister {
    pub fn new(workdir: impl AsRef<Path>, config: PersistConfig) -> Self {
        Self {
            workdir: workdir.as_ref().to_path_buf(),
            config,
            git: "git".into(),
        }
    }

    /// Use a different git executable.
    pub fn with_git(mut self, program: impl Into<String>) -> Self {
        self.git = program.into();
        self
    }

    pub async fn persist(&self, date: &TargetDate) -> PersistReport {
        let mut report = PersistReport::default();

        let files = match collect_matches(&self.workdir, &self.config.patterns) {
            Ok(files) => files,
            Err(e) => {
                warn!("Persist patterns invalid, skipping staging: {e}");
                Vec::new()
            }
        };

        if files.is_empty() {
            info!("No artifacts matched {:?}; nothing to stage", self.config.patterns);
        } else {
            let mut args = vec!["add", "--"];
            args.extend(files.iter().map(String::as_str));
            if self.git_step("add", &args).await {
                report.staged = files;
            }
        }

        if !report.staged.is_empty() {
            let message = self.config.commit_message_for(date.as_str());
            let identity = self.identity_args();
            let mut args: Vec<&str> = identity.iter().map(String::as_str).collect();
            args.extend(["commit", "-m", message.as_str()]);
            report.committed = self.git_step("commit", &args).await;
        }

        let mut args = vec!["push"];
        if let Some(remote) = &self.config.remote {
            args.push(remote);
            if let Some(branch) = &self.config.branch {
                args.push(branch);
            }
        }
        report.pushed = self.git_step("push", &args).await;

        info!(
            "Persist: {} staged, committed={}, pushed={}",
            report.staged.len(),
            report.committed,
            report.pushed
        );
        report
    }

    fn identity_args(&self) -> Vec<String> {
        let mut args = Vec::new();
        if let Some(name) = &self.config.committer_name {
            args.extend(["-c".to_string(), format!("user.name={name}")]);
        }
        if let Some(email) = &self.config.committer_email {
            args.extend(["-c".to_string(), format!("user.email={email}")]);
        }
        args
    }

    /// Run one git command; true on success, warning on any failure.
    async fn git_step(&self, step: &str, args: &[&str]) -> bool {
        let git = CommandSpec::new(self.git.as_str(), &[]);
        match git.run(args, &self.workdir, &[]).await {
            Ok(out) if out.success => {
                debug!("git {step}: ok");
                true
            }
            Ok(out) => {
                warn!("git {step} failed (tolerated): {}", out.failure_summary());
                false
            }
            Err(e) => {
                warn!("git {step} could not run (tolerated): {e}");
                false
            }
        }
    }
}

/// Files under `root` whose workdir-relative path matches any pattern.
///
/// `*` does not cross `/`, so `logs/*` means direct children of `logs/`.
/// Hidden directories are not descended into. Sorted for stable staging.
pub fn collect_matches(root: &Path, patterns: &[String]) -> Result<Vec<String>, globset::Error> {
    let set = build_globset(patterns)?;

    let mut matches: Vec<String> = WalkDir::new(root)
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !e.file_name().to_string_lossy().starts_with('.'))
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter_map(|e| {
            let rel = e.path().strip_prefix(root).ok()?;
            set.is_match(rel).then(|| rel.to_string_lossy().to_string())
        })
        .collect();

    matches.sort();
    Ok(matches)
}

fn build_globset(patterns: &[String]) -> Result<GlobSet, globset::Error> {
    let mut builder = GlobSetBuilder::new();
    for p in patterns {
        builder.add(GlobBuilder::new(p).literal_separator(true).build()?);
    }
    builder.build()
}
