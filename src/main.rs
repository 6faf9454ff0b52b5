use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use fdbwatch::{CliOverrides, OutputFormat, Poller, RecordWriter, ServiceCheckStatus, Settings};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "fdbwatch", version)]
#[command(about = "Poll FoundationDB `status json` and report cluster metrics and health")]
struct Args {
    /// Path to a TOML config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Poll once and exit (non-zero status when the check fails)
    #[arg(long)]
    once: bool,

    /// Time between polls (e.g., "15s", "1m")
    #[arg(short, long)]
    interval: Option<String>,

    /// Maximum time to wait for `fdbcli` (e.g., "10s")
    #[arg(long)]
    timeout: Option<String>,

    /// FoundationDB cluster file passed to `fdbcli -C`
    #[arg(short = 'C', long)]
    cluster_file: Option<PathBuf>,

    /// Read a saved `status json` document instead of running `fdbcli`
    #[arg(long)]
    input: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum)]
    format: Option<OutputFormat>,

    /// Append records to this file instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,
}

impl Args {
    fn overrides(&self) -> CliOverrides {
        CliOverrides {
            interval: self.interval.clone(),
            timeout: self.timeout.clone(),
            cluster_file: self.cluster_file.clone(),
            input: self.input.clone(),
            format: self.format,
            output: self.output.clone(),
        }
    }
}

fn main() -> Result<ExitCode> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let settings = Settings::load(args.config.as_deref(), &args.overrides())?;
    let check = settings.build_check()?;
    let writer = RecordWriter::open(settings.output.as_deref(), settings.format)?;
    let mut poller = Poller::new(check, writer, settings.interval()?);

    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    if args.once {
        let status = rt.block_on(poller.poll_once())?;
        return Ok(match status {
            ServiceCheckStatus::Critical => ExitCode::FAILURE,
            _ => ExitCode::SUCCESS,
        });
    }

    rt.block_on(poller.run())?;
    Ok(ExitCode::SUCCESS)
}
