//! `labmon` binary: run the collection daemon or query the journal.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use labmon_agent::client::PollClient;
use labmon_agent::collector::Collector;
use labmon_agent::journal::JournalWriter;
use labmon_agent::report::{format_report, format_sessions, load_report, load_sessions};
use labmon_agent::transport::{Credentials, HttpTransport};
use labmon_core::replay::ReplayConfig;

#[derive(Parser)]
#[command(name = "labmon", about = "Lab instrument usage collector and reporter")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Poll the scheduler on an interval and append snapshots.
    Daemon(DaemonArgs),
    /// Run exactly one collection cycle and exit.
    Collect(CollectArgs),
    /// Reconstruct and print closed usage sessions.
    Sessions(QueryArgs),
    /// Print the aggregated per-day utilization report.
    Report(QueryArgs),
}

#[derive(Args)]
struct SchedulerOpts {
    /// Scheduler base URL, e.g. https://scheduler.lab.local:8443
    #[arg(long)]
    base_url: String,

    #[arg(long, env = "LABMON_USERNAME")]
    username: String,

    #[arg(long, env = "LABMON_PASSWORD", hide_env_values = true)]
    password: String,

    /// Authentication domain.
    #[arg(long, default_value = "")]
    domain: String,

    /// Accept self-signed TLS certificates from the scheduler.
    #[arg(long)]
    insecure_tls: bool,
}

#[derive(Args)]
struct DaemonArgs {
    #[command(flatten)]
    scheduler: SchedulerOpts,

    /// Snapshot journal path.
    #[arg(long, default_value = "labmon-journal.ndjson")]
    journal: PathBuf,

    /// Seconds between collection cycles.
    #[arg(long, default_value_t = 60)]
    interval_secs: u64,
}

#[derive(Args)]
struct CollectArgs {
    #[command(flatten)]
    scheduler: SchedulerOpts,

    #[arg(long, default_value = "labmon-journal.ndjson")]
    journal: PathBuf,
}

#[derive(Args)]
struct QueryArgs {
    #[arg(long, default_value = "labmon-journal.ndjson")]
    journal: PathBuf,

    /// Idle readings shorter than this keep a session open.
    #[arg(long, default_value_t = 10)]
    idle_gap_minutes: i64,
}

impl SchedulerOpts {
    fn build_client(&self) -> anyhow::Result<PollClient<HttpTransport>> {
        let transport = HttpTransport::new(&self.base_url, self.insecure_tls)
            .context("failed to build HTTP transport")?;
        let credentials = Credentials {
            username: self.username.clone(),
            password: self.password.clone(),
            domain: self.domain.clone(),
        };
        Ok(PollClient::new(transport, credentials))
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Daemon(args) => run_daemon(args).await,
        Command::Collect(args) => run_collect(args).await,
        Command::Sessions(args) => {
            let config = ReplayConfig {
                idle_gap_minutes: args.idle_gap_minutes,
            };
            let sessions = load_sessions(&args.journal, &config)
                .context("failed to read journal")?;
            print!("{}", format_sessions(&sessions));
            Ok(())
        }
        Command::Report(args) => {
            let config = ReplayConfig {
                idle_gap_minutes: args.idle_gap_minutes,
            };
            let rows = load_report(&args.journal, &config).context("failed to read journal")?;
            print!("{}", format_report(&rows));
            Ok(())
        }
    }
}

async fn run_daemon(args: DaemonArgs) -> anyhow::Result<()> {
    let client = args.scheduler.build_client()?;
    let writer = JournalWriter::new(&args.journal);
    let collector = Collector::new(
        client,
        writer,
        Duration::from_secs(args.interval_secs),
    );

    tracing::info!(
        journal = %args.journal.display(),
        interval_secs = args.interval_secs,
        "collection daemon starting"
    );

    tokio::select! {
        _ = collector.run() => {}
        result = tokio::signal::ctrl_c() => {
            result.context("failed to listen for shutdown signal")?;
            tracing::info!("shutdown signal received");
        }
    }
    Ok(())
}

async fn run_collect(args: CollectArgs) -> anyhow::Result<()> {
    let client = args.scheduler.build_client()?;
    let writer = JournalWriter::new(&args.journal);
    let collector = Collector::new(client, writer, Duration::from_secs(60));
    let outcome = collector
        .collect_now()
        .await
        .context("collection cycle failed")?;
    tracing::info!(?outcome, "collection finished");
    Ok(())
}
