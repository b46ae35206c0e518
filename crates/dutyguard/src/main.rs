//! dutyguard - flight crew duty and rest limits
//!
//! Wires together:
//! - Configuration loading
//! - Store initialization
//! - The duty engine
//! - Plain-text output for each subcommand

mod render;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use dutyguard_api::{Acclimatization, CrewComposition, CrewPreferences, DutyRecord};
use dutyguard_config::{Settings, load_or_default};
use dutyguard_core::{DutyEngine, EndDuty, EngineSettings, RecordUpdate, StartDuty};
use dutyguard_rules::{check_rest_compliance, compute_max_fdp_at, compute_min_rest_at};
use dutyguard_store::{SqliteStore, Store};
use dutyguard_util::{RecordId, TimeOfDay, default_config_path, is_mock_time_active};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

/// dutyguard - Flight duty period and rest limits for flight crew
#[derive(Parser, Debug)]
#[command(name = "dutyguard")]
#[command(about = "Flight duty period and rest limits for flight crew", long_about = None)]
struct Args {
    /// Configuration file path (default: ~/.config/dutyguard/config.toml)
    #[arg(short, long, default_value_os_t = default_config_path())]
    config: PathBuf,

    /// Data directory override (or set DUTYGUARD_DATA_DIR env var)
    #[arg(short, long, env = "DUTYGUARD_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Log level
    #[arg(short, long, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Maximum FDP for a report time and sector count
    Fdp {
        /// Local report time, HH:MM
        #[arg(short, long, required_unless_present = "table")]
        report: Option<TimeOfDay>,
        #[arg(short, long, default_value_t = 1)]
        sectors: u32,
        #[command(flatten)]
        crew: CrewFlags,
        /// Print the whole FDP table instead
        #[arg(long)]
        table: bool,
    },

    /// Minimum rest after a duty (defaults to the last logged duty)
    Rest {
        /// Duty end time, HH:MM
        #[arg(short, long, requires = "duty_hours")]
        end: Option<TimeOfDay>,
        /// Length of the preceding duty in hours
        #[arg(long, requires = "end")]
        duty_hours: Option<f64>,
        #[arg(short, long, default_value_t = 0)]
        timezones: u32,
    },

    /// Check a proposed rest against the minimum
    RestCheck {
        /// Proposed rest in minutes
        #[arg(short, long)]
        proposed_minutes: u32,
        /// Preceding duty in minutes
        #[arg(short, long)]
        duty_minutes: u32,
        #[arg(short, long, default_value_t = 0)]
        timezones: u32,
    },

    /// Start a duty
    Start {
        /// Report date, YYYY-MM-DD (default: today)
        #[arg(long)]
        date: Option<NaiveDate>,
        /// Report time, HH:MM (default: now)
        #[arg(short, long)]
        report: Option<TimeOfDay>,
        #[arg(short, long, default_value_t = 1)]
        sectors: u32,
        #[command(flatten)]
        crew: CrewFlags,
    },

    /// Change the planned sector count of the active duty
    Sectors { sectors: u32 },

    /// End the active duty
    End {
        /// Release time, HH:MM (default: now)
        #[arg(short, long)]
        release: Option<TimeOfDay>,
        #[arg(short, long, default_value_t = 0)]
        flight_minutes: u32,
        #[arg(short, long, default_value = "")]
        note: String,
        /// Don't keep a duty record
        #[arg(long)]
        no_record: bool,
    },

    /// Discard the active duty
    Cancel,

    /// Countdown of the active duty
    Status,

    /// Follow the active duty, printing warnings as they fall due
    Watch {
        /// Poll interval in seconds (default: from config)
        #[arg(short, long)]
        interval: Option<u64>,
    },

    /// Cumulative limits compliance report
    Report {
        /// Flight time flown so far in the active duty, in minutes
        #[arg(short, long, default_value_t = 0)]
        flight_minutes: u32,
    },

    /// Log a completed duty
    Log {
        /// Report date, YYYY-MM-DD
        #[arg(long)]
        date: NaiveDate,
        #[arg(short, long)]
        report: TimeOfDay,
        #[arg(long)]
        release: TimeOfDay,
        #[arg(short, long, default_value_t = 0)]
        flight_minutes: u32,
        #[arg(short, long, default_value_t = 1)]
        sectors: u8,
        #[arg(short, long, default_value = "")]
        note: String,
    },

    /// List logged duties
    List,

    /// Change the times of a logged duty
    Update {
        id: RecordId,
        #[arg(short, long)]
        report: Option<TimeOfDay>,
        #[arg(long)]
        release: Option<TimeOfDay>,
        #[arg(short, long)]
        flight_minutes: Option<u32>,
    },

    /// Delete a logged duty
    Delete { id: RecordId },

    /// Consecutive duty days against the time-off limit
    Consecutive,

    /// Show or change the stored crew defaults
    Prefs {
        #[arg(long)]
        acclimatized: Option<bool>,
        #[arg(long)]
        augmented: Option<bool>,
    },
}

/// Per-command overrides of the stored crew defaults
#[derive(clap::Args, Debug)]
struct CrewFlags {
    #[arg(long)]
    unacclimatized: bool,
    #[arg(long)]
    augmented: bool,
}

impl CrewFlags {
    fn acclimatization(&self) -> Option<Acclimatization> {
        self.unacclimatized.then_some(Acclimatization::Unacclimatized)
    }

    fn crew(&self) -> Option<CrewComposition> {
        self.augmented.then_some(CrewComposition::Augmented)
    }
}

fn open_engine(args: &Args) -> Result<(DutyEngine, Settings)> {
    let mut settings = load_or_default(&args.config)
        .with_context(|| format!("Failed to load config from {:?}", args.config))?;
    if let Some(data_dir) = &args.data_dir {
        settings.service.data_dir = data_dir.clone();
    }

    let db_path = settings.service.database_path();
    let store: Arc<dyn Store> = Arc::new(
        SqliteStore::open(&db_path)
            .with_context(|| format!("Failed to open database {:?}", db_path))?,
    );
    debug!(db_path = %db_path.display(), "Store initialized");

    let engine = DutyEngine::new(EngineSettings::from(&settings), store);
    Ok((engine, settings))
}

async fn run(args: Args) -> Result<()> {
    let (engine, settings) = open_engine(&args)?;
    let now = dutyguard_util::now();

    match args.command {
        Command::Fdp {
            report,
            sectors,
            crew,
            table,
        } => {
            if table {
                println!("{}", render::fdp_table_text());
            } else if let Some(report) = report {
                let acclimatization = crew
                    .acclimatization()
                    .unwrap_or(engine.preferences()?.acclimatization);
                let fdp = compute_max_fdp_at(report, sectors, acclimatization)?;
                println!("{}", render::fdp_result(&fdp));
            }
        }

        Command::Rest {
            end,
            duty_hours,
            timezones,
        } => match (end, duty_hours) {
            (Some(end), Some(hours)) => {
                let rest = compute_min_rest_at(end, hours, timezones)?;
                println!("{}", render::rest_result(&rest));
            }
            _ => match engine.rest_after_last_duty(timezones)? {
                Some((record, rest)) => {
                    println!("After {}", render::record_line(&record));
                    println!("{}", render::rest_result(&rest));
                }
                None => println!("No duty records; give --end and --duty-hours"),
            },
        },

        Command::RestCheck {
            proposed_minutes,
            duty_minutes,
            timezones,
        } => {
            let check = check_rest_compliance(proposed_minutes, duty_minutes, timezones)?;
            println!("{}", render::rest_compliance(&check));
        }

        Command::Start {
            date,
            report,
            sectors,
            crew,
        } => {
            let event = engine.start_duty(
                StartDuty {
                    report_date: date,
                    report_time: report,
                    sectors,
                    acclimatization: crew.acclimatization(),
                    crew: crew.crew(),
                },
                now,
            )?;
            println!("{}", render::core_event(&event));
        }

        Command::Sectors { sectors } => {
            let event = engine.change_sectors(sectors)?;
            println!("{}", render::core_event(&event));
        }

        Command::End {
            release,
            flight_minutes,
            note,
            no_record,
        } => {
            let event = engine.end_duty(
                EndDuty {
                    release_time: release,
                    flight_minutes,
                    note,
                    record: !no_record,
                },
                now,
            )?;
            println!("{}", render::core_event(&event));
        }

        Command::Cancel => {
            let event = engine.cancel_duty()?;
            println!("{}", render::core_event(&event));
        }

        Command::Status => {
            if is_mock_time_active() {
                println!("{}", render::mock_clock(&now));
            }
            match engine.countdown(now)? {
                Some(countdown) => {
                    println!("{}", render::countdown(&countdown));
                    if let Some(fdp) = engine.active_fdp()? {
                        println!("{}", fdp.wocl_note);
                    }
                }
                None => println!("No active duty"),
            }
        }

        Command::Watch { interval } => {
            let interval = interval
                .map(Duration::from_secs)
                .unwrap_or(settings.countdown.poll_interval)
                .max(Duration::from_secs(1));
            watch(&engine, interval).await?;
        }

        Command::Report { flight_minutes } => {
            let report = engine.compliance_report(now, flight_minutes)?;
            println!("{}", render::compliance_report(&report));
        }

        Command::Log {
            date,
            report,
            release,
            flight_minutes,
            sectors,
            note,
        } => {
            let record = engine.log_record(
                DutyRecord::new(date, report, release)
                    .with_flight_minutes(flight_minutes)
                    .with_sectors(sectors)
                    .with_note(note),
            )?;
            println!("Logged {}", render::record_line(&record));
        }

        Command::List => println!("{}", render::records(&engine.list_records()?)),

        Command::Update {
            id,
            report,
            release,
            flight_minutes,
        } => {
            let record = engine.update_record_times(
                &id,
                RecordUpdate {
                    report_time: report,
                    release_time: release,
                    flight_minutes,
                },
            )?;
            println!("Updated {}", render::record_line(&record));
        }

        Command::Delete { id } => {
            engine.delete_record(&id)?;
            println!("Deleted {}", id);
        }

        Command::Consecutive => {
            let status = engine.consecutive_status(now.date_naive())?;
            println!("{}", render::consecutive(&status));
        }

        Command::Prefs {
            acclimatized,
            augmented,
        } => {
            let mut preferences = engine.preferences()?;
            if acclimatized.is_some() || augmented.is_some() {
                preferences = CrewPreferences {
                    acclimatization: acclimatized
                        .map(Acclimatization::from_flag)
                        .unwrap_or(preferences.acclimatization),
                    crew: augmented
                        .map(CrewComposition::from_flag)
                        .unwrap_or(preferences.crew),
                };
                engine.set_preferences(preferences)?;
            }
            println!(
                "Crew defaults: {}, {} crew",
                if preferences.acclimatization.is_acclimatized() {
                    "acclimatized"
                } else {
                    "not acclimatized"
                },
                preferences.crew
            );
        }
    }

    Ok(())
}

/// Poll the engine until the duty ends or the user interrupts
async fn watch(engine: &DutyEngine, interval: Duration) -> Result<()> {
    let mut timer = tokio::time::interval(interval);
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    info!(interval_secs = interval.as_secs(), "Watching active duty");

    loop {
        tokio::select! {
            _ = &mut ctrl_c => {
                info!("Interrupted, leaving watch");
                break;
            }

            _ = timer.tick() => {
                let now = dutyguard_util::now();

                for event in engine.tick(now)? {
                    println!("{}", render::core_event(&event));
                }

                match engine.countdown(now)? {
                    Some(countdown) => println!("{}", countdown.summary()),
                    None => {
                        println!("No active duty");
                        break;
                    }
                }
            }
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    debug!(version = env!("CARGO_PKG_VERSION"), "dutyguard starting");

    run(args).await
}
