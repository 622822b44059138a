use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use booking_engine::engine::request_timezone;
use booking_engine::{
    auto_assign, book, check_availability, parse_timezone, resolve_interval, to_local,
    AutoAssignRequest, AvailabilityRequest, BookingRequest, BookingSource, BookingStore,
    EngineConfig, MemoryStore, SalonData, ServiceId, StaffId, TenantId, TimeOfDay,
};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use tracing::debug;
use tracing_subscriber::EnvFilter;

/// Check salon availability and book appointments against a JSON snapshot.
#[derive(Parser)]
#[command(name = "booking", version, about)]
struct Cli {
    /// Engine configuration (JSON); defaults apply to missing fields
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log decisions to stderr (-v debug, -vv trace). RUST_LOG takes precedence.
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Compact JSON output instead of pretty-printed
    #[arg(long, global = true)]
    compact: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Is the requested slot free, and for whom? Lists alternatives if not.
    Check {
        #[command(flatten)]
        slot: SlotArgs,

        /// Appointment length in minutes (defaults to the service's duration)
        #[arg(long)]
        duration: Option<u32>,

        /// Only consider this staff member
        #[arg(long)]
        staff: Option<String>,

        /// Only consider staff who perform this service
        #[arg(long)]
        service: Option<String>,
    },
    /// Pick the first free staff member for a service
    Assign {
        #[command(flatten)]
        slot: SlotArgs,

        #[arg(long)]
        service: String,
    },
    /// Book an appointment, auto-assigning staff unless --staff is given
    Book {
        #[command(flatten)]
        slot: SlotArgs,

        #[arg(long)]
        service: String,

        #[arg(long)]
        staff: Option<String>,

        #[arg(long)]
        notes: Option<String>,

        /// Record the booking as coming from the API rather than entered manually
        #[arg(long)]
        api: bool,

        /// Write the updated salon data here after a successful booking
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Show the UTC interval a local date and time resolve to
    Resolve {
        #[arg(long)]
        date: NaiveDate,

        /// Wall-clock time, e.g. "14:30" or "2:30 PM"
        #[arg(long)]
        time: TimeOfDay,

        #[arg(long, default_value_t = 30)]
        duration: u32,

        /// IANA timezone, e.g. America/Toronto
        #[arg(long)]
        timezone: String,
    },
}

#[derive(Args)]
struct SlotArgs {
    /// Salon data file (JSON)
    #[arg(long)]
    data: PathBuf,

    #[arg(long)]
    tenant: String,

    /// Local calendar date, YYYY-MM-DD
    #[arg(long)]
    date: NaiveDate,

    /// Wall-clock time, e.g. "14:30" or "2:30 PM"
    #[arg(long)]
    time: TimeOfDay,

    /// Override the tenant's timezone
    #[arg(long)]
    timezone: Option<String>,
}

#[derive(Serialize)]
struct ResolvedSlot {
    timezone: String,
    utc_start: String,
    utc_end: String,
    local_weekday: String,
    local_time: String,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Check {
            slot,
            duration,
            staff,
            service,
        } => {
            let store = load_store(&slot.data)?;
            let tenant_id = TenantId::new(&slot.tenant);
            let service_id = service.map(ServiceId::new);
            let duration_minutes = match (duration, &service_id) {
                (Some(minutes), _) => minutes,
                (None, Some(id)) => store.service(&tenant_id, id)?.duration_minutes,
                (None, None) => anyhow::bail!("--duration is required without --service"),
            };
            let request = AvailabilityRequest {
                tenant_id,
                date: slot.date,
                time_of_day: slot.time,
                duration_minutes,
                timezone: slot.timezone,
                staff_id: staff.map(StaffId::new),
                service_id,
            };
            let result = check_availability(&store, &request, &config)?;
            print_json(&result, cli.compact)
        }
        Commands::Assign { slot, service } => {
            let store = load_store(&slot.data)?;
            let tenant_id = TenantId::new(&slot.tenant);
            let service_id = ServiceId::new(service);
            let duration_minutes = store.service(&tenant_id, &service_id)?.duration_minutes;
            let tz = request_timezone(&store, &tenant_id, slot.timezone.as_deref())?;
            let interval = resolve_interval(slot.date, slot.time, duration_minutes, tz)?;
            let local = to_local(interval.start, tz);
            let request = AutoAssignRequest {
                tenant_id,
                service_id,
                utc_start: interval.start,
                utc_end: interval.end,
                local_weekday: local.weekday,
                local_time_of_day: local.time,
                duration_minutes,
            };
            let result = auto_assign(&store, &request)?;
            print_json(&result, cli.compact)
        }
        Commands::Book {
            slot,
            service,
            staff,
            notes,
            api,
            out,
        } => {
            let store = load_store(&slot.data)?;
            let request = BookingRequest {
                tenant_id: TenantId::new(slot.tenant),
                service_id: ServiceId::new(service),
                staff_id: staff.map(StaffId::new),
                date: slot.date,
                time_of_day: slot.time,
                timezone: slot.timezone,
                source: if api { BookingSource::Api } else { BookingSource::Manual },
                notes,
            };
            let outcome = book(&store, &request, &config)?;
            if let Some(path) = out {
                save_data(&path, &store.data())?;
            }
            print_json(&outcome, cli.compact)
        }
        Commands::Resolve {
            date,
            time,
            duration,
            timezone,
        } => {
            let tz = parse_timezone(&timezone)?;
            let interval = resolve_interval(date, time, duration, tz)?;
            let local = to_local(interval.start, tz);
            let resolved = ResolvedSlot {
                timezone: tz.name().to_string(),
                utc_start: interval.start.to_rfc3339(),
                utc_end: interval.end.to_rfc3339(),
                local_weekday: local.weekday.to_string(),
                local_time: local.time.label(),
            };
            print_json(&resolved, cli.compact)
        }
    }
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn load_config(path: Option<&Path>) -> Result<EngineConfig> {
    let Some(path) = path else {
        return Ok(EngineConfig::default());
    };
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("invalid config {}", path.display()))
}

fn load_store(path: &Path) -> Result<MemoryStore> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read salon data {}", path.display()))?;
    let data: SalonData = serde_json::from_str(&raw)
        .with_context(|| format!("invalid salon data {}", path.display()))?;
    debug!(
        path = %path.display(),
        staff = data.staff.len(),
        appointments = data.appointments.len(),
        "loaded salon data"
    );
    Ok(MemoryStore::new(data)?)
}

fn save_data(path: &Path, data: &SalonData) -> Result<()> {
    let json = serde_json::to_string_pretty(data)?;
    fs::write(path, json).with_context(|| format!("failed to write {}", path.display()))
}

fn print_json<T: Serialize>(value: &T, compact: bool) -> Result<()> {
    let json = if compact {
        serde_json::to_string(value)?
    } else {
        serde_json::to_string_pretty(value)?
    };
    println!("{json}");
    Ok(())
}
