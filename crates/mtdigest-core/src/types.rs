//! Run trigger, target date and artifact types

use chrono::{Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::error::Error;

/// Days subtracted from today (UTC) when no explicit date is given.
/// arXiv listings for a submission day are complete a few days later.
pub const DEFAULT_OFFSET_DAYS: i64 = 4;

pub const ARTIFACT_PREFIX: &str = "mt_digest_";
pub const ARTIFACT_EXTENSION: &str = "md";
pub const DATE_FORMAT: &str = "%Y-%m-%d";

// ============================================================
// Trigger
// ============================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerKind {
    Manual,
    Scheduled,
}

impl fmt::Display for TriggerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Manual => write!(f, "manual"),
            Self::Scheduled => write!(f, "scheduled"),
        }
    }
}

impl FromStr for TriggerKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "manual" | "workflow_dispatch" | "dispatch" => Ok(Self::Manual),
            "scheduled" | "schedule" | "cron" => Ok(Self::Scheduled),
            other => Err(format!("unknown trigger kind: {other}")),
        }
    }
}

/// What started this run. Created once, never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RunTrigger {
    Manual { date: Option<String> },
    Scheduled,
}

impl RunTrigger {
    pub fn manual(date: Option<String>) -> Self {
        Self::Manual { date }
    }

    /// Build a trigger from an explicit kind, an explicit date and the CI event name.
    ///
    /// A date always implies a manual run. Without an explicit kind the CI
    /// event name decides; an unknown or missing event counts as scheduled.
    pub fn detect(kind: Option<TriggerKind>, date: Option<String>, event_name: Option<&str>) -> Self {
        let kind = kind.unwrap_or_else(|| {
            if date.as_deref().is_some_and(|d| !d.trim().is_empty()) {
                return TriggerKind::Manual;
            }
            event_name
                .and_then(|e| e.parse().ok())
                .unwrap_or(TriggerKind::Scheduled)
        });
        match kind {
            TriggerKind::Manual => Self::Manual { date },
            TriggerKind::Scheduled => Self::Scheduled,
        }
    }

    pub fn kind(&self) -> TriggerKind {
        match self {
            Self::Manual { .. } => TriggerKind::Manual,
            Self::Scheduled => TriggerKind::Scheduled,
        }
    }

    /// The user-supplied date, if any. Blank input counts as absent.
    pub fn explicit_date(&self) -> Option<&str> {
        match self {
            Self::Manual { date: Some(d) } if !d.trim().is_empty() => Some(d.as_str()),
            _ => None,
        }
    }
}

impl fmt::Display for RunTrigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.explicit_date() {
            Some(d) => write!(f, "manual ({d})"),
            None => write!(f, "{}", self.kind()),
        }
    }
}

// ============================================================
// Target date
// ============================================================

/// The date a run produces a digest for.
///
/// Computed dates are always `YYYY-MM-DD`. Explicit manual input is kept
/// verbatim and may not be; callers that care use [`TargetDate::parse`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TargetDate(String);

impl TargetDate {
    /// Resolve the target date for a trigger, given today's UTC date.
    ///
    /// Fails only when `offset_days` moves the date outside chrono's range.
    pub fn resolve(trigger: &RunTrigger, today: NaiveDate, offset_days: i64) -> crate::Result<Self> {
        if let Some(d) = trigger.explicit_date() {
            return Ok(Self(d.to_string()));
        }
        Duration::try_days(offset_days)
            .and_then(|offset| today.checked_sub_signed(offset))
            .map(Self::from_date)
            .ok_or_else(|| Error::ConfigError(format!("offset_days {offset_days} is out of range")))
    }

    pub fn from_date(date: NaiveDate) -> Self {
        Self(date.format(DATE_FORMAT).to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn parse(&self) -> Option<NaiveDate> {
        NaiveDate::parse_from_str(&self.0, DATE_FORMAT).ok()
    }

    /// True when the value is a real calendar date in `YYYY-MM-DD` form.
    pub fn is_well_formed(&self) -> bool {
        self.parse()
            .is_some_and(|d| d.format(DATE_FORMAT).to_string() == self.0)
    }

    /// File name of the digest artifact for this date.
    pub fn artifact_name(&self) -> String {
        format!("{ARTIFACT_PREFIX}{}.{ARTIFACT_EXTENSION}", self.0)
    }

    pub fn artifact_path(&self, workdir: &Path) -> PathBuf {
        workdir.join(self.artifact_name())
    }
}

impl fmt::Display for TargetDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

pub fn today_utc() -> NaiveDate {
    Utc::now().date_naive()
}

/// Recover the date from an artifact path: the last 10 chars of the file stem.
pub fn artifact_date(path: &Path) -> Option<NaiveDate> {
    let stem = path.file_stem()?.to_str()?;
    let start = stem.len().checked_sub(10)?;
    let tail = stem.get(start..)?;
    NaiveDate::parse_from_str(tail, DATE_FORMAT).ok()
}

// ============================================================
// Outcomes
// ============================================================

/// Result of running the external digest generator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "path", rename_all = "snake_case")]
pub enum DigestOutcome {
    Generated(PathBuf),
    NoContent,
}

impl DigestOutcome {
    /// Classify by whether the expected artifact exists on disk.
    pub fn from_artifact(path: PathBuf) -> Self {
        if path.is_file() {
            Self::Generated(path)
        } else {
            Self::NoContent
        }
    }

    pub fn artifact(&self) -> Option<&Path> {
        match self {
            Self::Generated(p) => Some(p),
            Self::NoContent => None,
        }
    }
}

// ============================================================
// Secrets
// ============================================================

/// An opaque credential. Never printed.
#[derive(Clone, PartialEq, Eq)]
pub struct Secret(String);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Read a secret from the environment; unset or empty means none.
    pub fn from_env(var: &str) -> Option<Self> {
        std::env::var(var)
            .ok()
            .filter(|v| !v.is_empty())
            .map(Self)
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Secret(***)")
    }
}

impl fmt::Display for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("***")
    }
}
