use std::{io, path::PathBuf, time::Duration};

use anyhow::{bail, Context, Result};
use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use sensorline_core::prelude::*;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Receive comma-separated sensor telemetry over a serial port.
#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace); RUST_LOG overrides
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List available serial ports
    #[command(visible_alias = "enumerate")]
    List,

    /// Read telemetry from a serial port
    Read(ReadArgs),

    /// Read telemetry from a simulated sensor board
    Demo(DemoArgs),
}

#[derive(Args)]
struct ReadArgs {
    /// Serial port (e.g. /dev/ttyACM0 or COM3)
    port: Option<String>,

    /// Serial baud rate
    baud: Option<u32>,

    /// JSON configuration file; flags override its values
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Leave DTR untouched after opening the port
    #[arg(long)]
    no_dtr: bool,

    #[command(flatten)]
    limits: LimitArgs,

    #[command(flatten)]
    output: OutputArgs,
}

#[derive(Args)]
struct DemoArgs {
    /// Seed for reproducible output
    #[arg(long)]
    seed: Option<u64>,

    /// Corrupt every Nth line to exercise error handling
    #[arg(long, default_value_t = 0)]
    corrupt_every: u64,

    /// Stop the simulated board after this many lines
    #[arg(long)]
    lines: Option<u64>,

    /// Milliseconds between simulated samples
    #[arg(long, default_value_t = 100)]
    interval_ms: u64,

    #[command(flatten)]
    limits: LimitArgs,

    #[command(flatten)]
    output: OutputArgs,
}

#[derive(Args)]
struct LimitArgs {
    /// Read timeout in milliseconds
    #[arg(short, long)]
    timeout_ms: Option<u64>,

    /// Stop after this many records
    #[arg(short = 'n', long)]
    max_records: Option<u64>,

    /// Stop after this many reads
    #[arg(long)]
    max_reads: Option<u64>,
}

impl LimitArgs {
    fn apply(&self, config: &mut SessionConfig) {
        if let Some(timeout_ms) = self.timeout_ms {
            config.read_timeout_ms = timeout_ms;
        }
        if self.max_records.is_some() {
            config.max_records = self.max_records;
        }
        if self.max_reads.is_some() {
            config.max_reads = self.max_reads;
        }
    }
}

#[derive(Args)]
struct OutputArgs {
    /// Format to print records in
    #[arg(short, long, value_enum, default_value = "text")]
    format: PrintFormat,

    /// Also log valid records to a CSV file
    #[arg(short, long)]
    log: Option<PathBuf>,
}

#[derive(Clone, Copy, ValueEnum)]
enum PrintFormat {
    Text,
    Json,
}

impl From<PrintFormat> for OutputFormat {
    fn from(format: PrintFormat) -> Self {
        match format {
            PrintFormat::Text => OutputFormat::Text,
            PrintFormat::Json => OutputFormat::Json,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Command::List => list(),
        Command::Read(args) => read(args).await,
        Command::Demo(args) => demo(args).await,
    }
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn list() -> Result<()> {
    let ports = list_ports();
    if ports.is_empty() {
        warn!("No serial ports found");
    }
    for port in ports {
        println!("{}", port);
    }
    Ok(())
}

async fn read(args: ReadArgs) -> Result<()> {
    let mut config = match &args.config {
        Some(path) => AppConfig::from_file(path)?,
        None => AppConfig::default(),
    };

    if let Some(port) = args.port {
        config.serial.port = port;
    }
    if let Some(baud) = args.baud {
        config.serial.baud_rate = baud;
    }
    if args.no_dtr {
        config.serial.assert_dtr = false;
    }
    args.limits.apply(&mut config.session);

    if config.serial.port.is_empty() {
        bail!("No serial port given; pass one or run `sensorline list` to find it");
    }
    config.validate()?;

    let port = open_port(&config.serial)
        .with_context(|| format!("Failed to open {}", config.serial.port))?;
    info!("Serial port {} is open", config.serial.port);

    run_session(SerialSource::new(port), config.session, args.output).await
}

async fn demo(args: DemoArgs) -> Result<()> {
    let mut config = SessionConfig::default();
    args.limits.apply(&mut config);

    let device = match args.seed {
        Some(seed) => DemoDevice::with_seed(seed),
        None => DemoDevice::new(),
    }
    .corrupt_every(args.corrupt_every);

    let mut source = DemoSource::new(device).pacing(Duration::from_millis(args.interval_ms));
    if let Some(lines) = args.lines {
        source = source.max_lines(lines);
    }

    info!("Running with a simulated sensor board");
    run_session(source, config, args.output).await
}

/// Run a session on a blocking thread, stopping it on Ctrl-C
async fn run_session<S>(source: S, config: SessionConfig, output: OutputArgs) -> Result<()>
where
    S: ByteSource + 'static,
{
    let token = CancelToken::new();
    let session = Session::new(source, config).with_cancel_token(token.clone());

    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Interrupted, stopping after the current read");
            token.cancel();
        }
    });

    let format = OutputFormat::from(output.format);
    let log = output.log;
    let stats = tokio::task::spawn_blocking(move || -> Result<SessionStats> {
        let printer = PrintSink::new(io::stdout().lock(), format);
        match log {
            Some(path) => {
                let recorder = CsvRecorder::create(&path)
                    .with_context(|| format!("Failed to create {}", path.display()))?;
                let mut sink = Tee::new(printer, recorder);
                let stats = session.run(&mut sink)?;
                let (_, recorder) = sink.into_inner();
                info!("Logged {} rows to {}", recorder.rows(), path.display());
                recorder.finish()?;
                Ok(stats)
            }
            None => {
                let mut sink = printer;
                Ok(session.run(&mut sink)?)
            }
        }
    })
    .await??;

    info!(
        "{} records ({} invalid), {} bytes dropped",
        stats.records(),
        stats.invalid_records,
        stats.overflowed_bytes + stats.discarded_bytes
    );
    Ok(())
}
