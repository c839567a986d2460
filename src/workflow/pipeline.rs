//! One end-to-end digest run

use chrono::NaiveDate;
use mtdigest_core::{DigestOutcome, Result, RunTrigger, TargetDate};
use mtdigest_sender::{ButtondownSender, CommandSender, DigestSender};
use serde::Serialize;
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;

use super::dispatch::{dispatch, DispatchOutcome};
use super::invoke::DigestInvoker;
use super::persist::{ArtifactPersister, PersistReport};
use super::trigger::resolve_target_date;
use crate::config::{Credentials, DigestConfig, SenderBackend};

/// Everything one run did, in order.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub trigger: RunTrigger,
    pub target_date: TargetDate,
    pub digest: DigestOutcome,
    pub dispatch: DispatchOutcome,
    /// `None` when persisting is disabled.
    pub persist: Option<PersistReport>,
}

/// resolve → generate → dispatch → persist. Linear, no retries.
pub struct Pipeline {
    invoker: DigestInvoker,
    sender: Box<dyn DigestSender>,
    persister: Option<ArtifactPersister>,
    offset_days: i64,
    strict_dates: bool,
}

impl Pipeline {
    pub fn new(invoker: DigestInvoker, sender: Box<dyn DigestSender>) -> Self {
        Self {
            invoker,
            sender,
            persister: None,
            offset_days: mtdigest_core::DEFAULT_OFFSET_DAYS,
            strict_dates: false,
        }
    }

    pub fn with_persister(mut self, persister: Option<ArtifactPersister>) -> Self {
        self.persister = persister;
        self
    }

    pub fn with_offset_days(mut self, days: i64) -> Self {
        self.offset_days = days;
        self
    }

    pub fn with_strict_dates(mut self, strict: bool) -> Self {
        self.strict_dates = strict;
        self
    }

    /// Wire up a pipeline from config and environment credentials.
    pub fn from_config(config: &DigestConfig, credentials: &Credentials) -> Self {
        let workdir = PathBuf::from(&config.pipeline.workdir);

        let invoker = DigestInvoker::new(config.generator.command.clone(), &workdir)
            .with_api_key(credentials.openai_api_key.clone());

        let persister = config
            .persist
            .enabled
            .then(|| ArtifactPersister::new(&workdir, config.persist.clone()));

        Self::new(invoker, build_sender(config, credentials))
            .with_persister(persister)
            .with_offset_days(config.pipeline.offset_days)
            .with_strict_dates(config.pipeline.strict_dates)
    }

    /// Resolve the target date only; no collaborator is invoked.
    pub fn resolve(&self, trigger: &RunTrigger, today: NaiveDate) -> Result<TargetDate> {
        resolve_target_date(trigger, today, self.offset_days, self.strict_dates)
    }

    /// Run once. Only a strict-mode date rejection, a generator failure or a
    /// send failure is an `Err`.
    pub async fn run(&self, trigger: RunTrigger, today: NaiveDate) -> Result<RunReport> {
        let target_date = self.resolve(&trigger, today)?;
        let digest = self.invoker.invoke(&target_date).await?;
        let dispatch = dispatch(&digest, &target_date, self.sender.as_ref()).await?;

        let persist = match &self.persister {
            Some(p) => Some(p.persist(&target_date).await),
            None => {
                info!("Persist disabled; leaving artifacts uncommitted");
                None
            }
        };

        Ok(RunReport {
            trigger,
            target_date,
            digest,
            dispatch,
            persist,
        })
    }
}

pub fn build_sender(config: &DigestConfig, credentials: &Credentials) -> Box<dyn DigestSender> {
    let token = credentials.buttondown_token.clone();
    match config.sender.backend {
        SenderBackend::Command => Box::new(
            CommandSender::new(config.sender.command.clone(), &config.pipeline.workdir)
                .with_token(token),
        ),
        SenderBackend::Buttondown => Box::new(
            ButtondownSender::new(token)
                .with_base_url(config.sender.base_url.clone())
                .with_lookup_delay(Duration::from_millis(config.sender.lookup_delay_ms)),
        ),
    }
}
