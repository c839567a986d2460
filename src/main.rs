//! mtdigest: daily Machine-Translation digest workflow
//!
//! Usage:
//!   mtdigest run                       → scheduled run (today − 4 days)
//!   mtdigest run --date 2024-03-01     → manual run for an explicit date
//!   mtdigest resolve                   → print the target date only
//!   mtdigest send mt_digest_D.md       → send one digest file
//!   mtdigest schedule                  → run on the configured cron schedule (UTC)
//!   mtdigest dump-config               → print default config as TOML

use clap::{Parser, Subcommand};
use mtdigest::config::{Credentials, DigestConfig, SenderBackend};
use mtdigest::workflow::{build_sender, run_schedule, Pipeline};
use mtdigest_core::{today_utc, RunTrigger, TriggerKind};
use mtdigest_sender::DigestSender;
use std::path::PathBuf;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(
    name = "mtdigest",
    about = "Generate, send and archive the daily MT digest",
    version = env!("CARGO_PKG_VERSION")
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to config file (TOML)
    #[arg(long, global = true, default_value = "mtdigest.toml")]
    config: String,

    /// Working directory for artifacts and git (overrides config)
    #[arg(long, global = true)]
    workdir: Option<String>,

    /// Also write logs to a daily rolling file in this directory
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve the date, generate, send and persist
    Run {
        /// manual or scheduled (default: from GITHUB_EVENT_NAME)
        #[arg(long)]
        trigger: Option<TriggerKind>,
        /// Explicit target date, YYYY-MM-DD (implies a manual run)
        #[arg(long)]
        date: Option<String>,
        /// Fail on a manual date that is not YYYY-MM-DD
        #[arg(long, default_value_t = false)]
        strict_date: bool,
        /// Skip the git commit/push step
        #[arg(long, default_value_t = false)]
        no_persist: bool,
    },
    /// Print the target date this run would use
    Resolve {
        #[arg(long)]
        trigger: Option<TriggerKind>,
        #[arg(long)]
        date: Option<String>,
        #[arg(long, default_value_t = false)]
        strict_date: bool,
    },
    /// Send an existing digest file
    Send {
        file: PathBuf,
        /// Sender backend (overrides config)
        #[arg(long, value_enum)]
        backend: Option<SenderBackend>,
    },
    /// Run on the configured cron schedule (UTC)
    Schedule,
    /// Dump default config as TOML and exit
    DumpConfig,
    /// Show version
    Version,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let _guard = init_tracing(cli.log_dir.as_deref());

    let mut config = DigestConfig::load(&PathBuf::from(&cli.config));
    if let Some(workdir) = &cli.workdir {
        config.pipeline.workdir = workdir.clone();
    }
    let credentials = Credentials::from_env();
    let event_name = std::env::var("GITHUB_EVENT_NAME").ok();

    match cli.command {
        Commands::Run {
            trigger,
            date,
            strict_date,
            no_persist,
        } => {
            config.pipeline.strict_dates |= strict_date;
            if no_persist {
                config.persist.enabled = false;
            }
            let trigger = RunTrigger::detect(trigger, date, event_name.as_deref());
            let pipeline = Pipeline::from_config(&config, &credentials);
            let report = pipeline.run(trigger, today_utc()).await?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Commands::Resolve {
            trigger,
            date,
            strict_date,
        } => {
            config.pipeline.strict_dates |= strict_date;
            let trigger = RunTrigger::detect(trigger, date, event_name.as_deref());
            let pipeline = Pipeline::from_config(&config, &credentials);
            println!("{}", pipeline.resolve(&trigger, today_utc())?);
        }
        Commands::Send { file, backend } => {
            if let Some(backend) = backend {
                config.sender.backend = backend;
            }
            let sender = build_sender(&config, &credentials);
            let receipt = sender.send(&file).await?;
            info!("Sent {} via {}: {:?}", file.display(), sender.name(), receipt);
        }
        Commands::Schedule => {
            let schedule = config.schedule.schedule()?;
            let pipeline = Pipeline::from_config(&config, &credentials);
            run_schedule(pipeline, schedule).await?;
        }
        Commands::DumpConfig => {
            println!("{}", DigestConfig::default().to_toml());
        }
        Commands::Version => {
            println!("mtdigest v{}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}

fn init_tracing(log_dir: Option<&std::path::Path>) -> Option<WorkerGuard> {
    let (file_layer, guard) = match log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "mtdigest.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(writer);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mtdigest=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(file_layer)
        .init();

    guard
}
