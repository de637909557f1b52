mod requests;

use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use appointment_gate::{parse_timestamp, parse_timezone, GateConfig, GateEngine};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, Level};

use requests::{AssignRequest, BookingInput, CancelRequest, CompleteRequest, StartRequest};

#[derive(Parser)]
#[command(name = "apptgate", version, about = "Appointment gate decisions from JSON")]
struct Cli {
    /// JSON file with rule thresholds and timezone
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// IANA timezone defining the local day (overrides the config file)
    #[arg(long, global = true)]
    timezone: Option<String>,

    /// Reference clock as ISO-8601 (defaults to the system clock)
    #[arg(long, global = true)]
    now: Option<String>,

    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Can the actor start this appointment now?
    Start {
        /// Request JSON file (reads stdin if omitted or "-")
        input: Option<PathBuf>,
    },
    /// Can the actor assign this unassigned appointment to themselves?
    Assign { input: Option<PathBuf> },
    /// Can this appointment be completed, and has it run long enough?
    Complete { input: Option<PathBuf> },
    /// Can this appointment be cancelled?
    Cancel { input: Option<PathBuf> },
    /// List bookings overlapping a proposed interval
    Conflicts { input: Option<PathBuf> },
    /// Validate a proposed booking (conflicts plus unit balance)
    Validate { input: Option<PathBuf> },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let mut config = match &cli.config {
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("failed to read config {}", path.display()))?;
            serde_json::from_str::<GateConfig>(&text)
                .with_context(|| format!("failed to parse config {}", path.display()))?
        }
        None => GateConfig::default(),
    };
    if let Some(tz) = &cli.timezone {
        config.timezone = parse_timezone(tz)?;
    }
    let tz = config.timezone;
    let engine = GateEngine::new(config)?;

    let now: DateTime<Utc> = match &cli.now {
        Some(s) => parse_timestamp(s, &tz).context("invalid --now")?,
        None => Utc::now(),
    };
    debug!("reference clock {now}, timezone {tz}");

    match cli.command {
        Command::Start { input } => {
            let req: StartRequest = read_request(input.as_deref())?;
            let appt = requests::appointment(req.appointment, &tz)?;
            emit(&engine.can_start(
                appt.as_ref(),
                req.actor_team_id.as_deref(),
                req.has_active_appointment,
                now,
            ))
        }
        Command::Assign { input } => {
            let req: AssignRequest = read_request(input.as_deref())?;
            let appt = requests::appointment(req.appointment, &tz)?;
            emit(&engine.can_assign_to_self(appt.as_ref(), req.is_qualified, now))
        }
        Command::Complete { input } => {
            let req: CompleteRequest = read_request(input.as_deref())?;
            let appt = requests::appointment(req.appointment, &tz)?;
            emit(&engine.can_complete(appt.as_ref(), now))
        }
        Command::Cancel { input } => {
            let req: CancelRequest = read_request(input.as_deref())?;
            let appt = requests::appointment(req.appointment, &tz)?;
            emit(&engine.can_cancel(appt.as_ref(), req.is_admin))
        }
        Command::Conflicts { input } => {
            let req: BookingInput = read_request(input.as_deref())?;
            let booking = req.booking(&tz)?;
            let siblings = req.candidates(&tz)?;
            emit(&engine.detect_conflicts(&booking, &siblings))
        }
        Command::Validate { input } => {
            let req: BookingInput = read_request(input.as_deref())?;
            let booking = req.booking(&tz)?;
            let siblings = req.candidates(&tz)?;
            emit(&engine.validate_scheduling(&booking, &siblings, req.units()))
        }
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(io::stderr)
        .init();
}

fn read_request<T: DeserializeOwned>(input: Option<&Path>) -> Result<T> {
    let text = match input {
        Some(path) if path != Path::new("-") => fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?,
        _ => {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .context("failed to read stdin")?;
            buf
        }
    };
    serde_json::from_str(&text).context("failed to parse request JSON")
}

fn emit<T: Serialize>(decision: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(decision).context("failed to serialize decision")?;
    println!("{json}");
    Ok(())
}
