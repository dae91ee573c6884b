//! Reprise CLI
//!
//! Command-line interface for the repetition scheduling engine.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use colored::Colorize;
use directories::ProjectDirs;
use reprise_core::{
    Clock, CycleLogEntry, Engine, FixedClock, LearningUnit, Progress, ReviewSlot, SchedulerConfig,
    SlotOrder, SlotStatus, SqliteStore, SystemClock,
};
use serde::Serialize;
use tracing::Level;
use tracing_subscriber::EnvFilter;

/// Reprise - Repetition Scheduling CLI
#[derive(Parser)]
#[command(name = "reprise")]
#[command(author = "Reprise Contributors")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "CLI for the Reprise repetition scheduling engine")]
#[command(long_about = "Reprise schedules reviews of learning units in five-slot cycles.\n\nDates are spread across days so no single day gets crowded, and late or early reviews re-place the rest of the cycle.")]
struct Cli {
    /// Database file (defaults to the platform data directory)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Pretend today is this date (YYYY-MM-DD)
    #[arg(long, global = true, value_parser = parse_date)]
    today: Option<NaiveDate>,

    /// JSON scheduler configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Emit logs as JSON lines on stderr
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start tracking a unit for a learner and schedule its first cycle
    Start {
        /// Learner id
        learner: String,
        /// Learning unit id
        unit: String,
        /// Unit size in words
        #[arg(long)]
        size: u32,
        /// Day learning began (defaults to today)
        #[arg(long, value_parser = parse_date)]
        first_date: Option<NaiveDate>,
    },

    /// Show a progress record and its schedule
    Show {
        /// Progress id
        progress: String,
        /// Include completed cycles
        #[arg(long)]
        history: bool,
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Mark a slot of the current cycle completed today
    Complete {
        /// Progress id
        progress: String,
        /// Slot order (1-5)
        #[arg(value_parser = parse_order)]
        order: SlotOrder,
    },

    /// Mark a slot of the current cycle skipped
    Skip {
        /// Progress id
        progress: String,
        /// Slot order (1-5)
        #[arg(value_parser = parse_order)]
        order: SlotOrder,
    },

    /// Move the slots after ORDER, anchored at a new start date
    Reschedule {
        /// Progress id
        progress: String,
        /// Slots after this order move (1-5)
        #[arg(value_parser = parse_order)]
        order: SlotOrder,
        /// New anchor date (YYYY-MM-DD)
        #[arg(value_parser = parse_date)]
        new_start: NaiveDate,
    },

    /// Record the learner's completion percentage (0-100)
    Percent {
        /// Progress id
        progress: String,
        /// Completion percentage
        #[arg(value_parser = clap::value_parser!(u8).range(0..=100))]
        percent: u8,
    },

    /// List progress records with a review due
    Due {
        /// Due on or before this date (defaults to today)
        #[arg(long, value_parser = parse_date)]
        on: Option<NaiveDate>,
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Show pending reviews per day
    Load {
        /// Days ahead to include
        #[arg(long, default_value = "30")]
        days: u32,
    },

    /// Print the effective scheduler configuration as JSON
    Config,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.log_json);

    let config = load_config(cli.config.as_deref())?;
    if let Commands::Config = cli.command {
        println!("{}", serde_json::to_string_pretty(&config)?);
        return Ok(());
    }

    let engine = open_engine(cli.db, cli.today, config)?;

    match cli.command {
        Commands::Start {
            learner,
            unit,
            size,
            first_date,
        } => run_start(&engine, &learner, &unit, size, first_date),
        Commands::Show {
            progress,
            history,
            json,
        } => run_show(&engine, &progress, history, json),
        Commands::Complete { progress, order } => run_complete(&engine, &progress, order),
        Commands::Skip { progress, order } => run_skip(&engine, &progress, order),
        Commands::Reschedule {
            progress,
            order,
            new_start,
        } => run_reschedule(&engine, &progress, order, new_start),
        Commands::Percent { progress, percent } => run_percent(&engine, &progress, percent),
        Commands::Due { on, json } => run_due(&engine, on, json),
        Commands::Load { days } => run_load(&engine, days),
        Commands::Config => Ok(()),
    }
}

// ============================================================================
// SETUP
// ============================================================================

/// Logs go to stderr; stdout carries command output
fn init_logging(json: bool) {
    let filter = EnvFilter::from_default_env().add_directive(Level::INFO.into());
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .with_ansi(false);

    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

/// `--config`, else `<config dir>/config.json` when present, else defaults
fn load_config(explicit: Option<&Path>) -> anyhow::Result<SchedulerConfig> {
    let path = match explicit {
        Some(p) => Some(p.to_path_buf()),
        None => ProjectDirs::from("com", "reprise", "core")
            .map(|dirs| dirs.config_dir().join("config.json"))
            .filter(|p| p.exists()),
    };

    let Some(path) = path else {
        return Ok(SchedulerConfig::default());
    };

    let raw = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read config {}", path.display()))?;
    let config: SchedulerConfig = serde_json::from_str(&raw)
        .with_context(|| format!("Failed to parse config {}", path.display()))?;
    tracing::debug!(path = %path.display(), "Loaded scheduler config");
    Ok(config)
}

fn open_engine(
    db: Option<PathBuf>,
    today: Option<NaiveDate>,
    config: SchedulerConfig,
) -> anyhow::Result<Engine<SqliteStore>> {
    let store = SqliteStore::new(db).context("Failed to open database")?;
    let clock: Arc<dyn Clock> = match today {
        Some(day) => Arc::new(FixedClock::new(day)),
        None => Arc::new(SystemClock),
    };
    Ok(Engine::new(Arc::new(store), clock, config)?)
}

fn parse_date(s: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|e| format!("expected YYYY-MM-DD: {}", e))
}

fn parse_order(s: &str) -> Result<SlotOrder, String> {
    let value: u8 = s.parse().map_err(|_| format!("'{}' is not a slot order", s))?;
    SlotOrder::try_from(value)
}

// ============================================================================
// COMMANDS
// ============================================================================

fn run_start(
    engine: &Engine<SqliteStore>,
    learner: &str,
    unit: &str,
    size: u32,
    first_date: Option<NaiveDate>,
) -> anyhow::Result<()> {
    let progress = engine.start_progress(learner, LearningUnit::new(unit, size), first_date)?;

    println!("{}", "=== Progress Started ===".cyan().bold());
    println!("{}: {}", "Progress".white().bold(), progress.id);
    println!();
    print_slots(&engine.current_slots(&progress.id)?, engine.today());
    Ok(())
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ShowReport {
    progress: Progress,
    slots: Vec<ReviewSlot>,
    cycle_log: Vec<CycleLogEntry>,
}

fn run_show(
    engine: &Engine<SqliteStore>,
    progress_id: &str,
    history: bool,
    json: bool,
) -> anyhow::Result<()> {
    let progress = engine.progress(progress_id)?;
    let slots = if history {
        engine.slots(progress_id)?
    } else {
        engine.current_slots(progress_id)?
    };

    if json {
        let report = ShowReport {
            progress,
            slots,
            cycle_log: engine.cycle_log(progress_id)?,
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("{}", "=== Progress ===".cyan().bold());
    println!("{}: {}", "Id".white().bold(), progress.id);
    println!("{}: {}", "Learner".white().bold(), progress.learner_id);
    println!(
        "{}: {} ({} words)",
        "Unit".white().bold(),
        progress.unit.id,
        progress.unit.size
    );
    println!("{}: {}", "Cycle".white().bold(), progress.cycle_state);
    println!("{}: {}%", "Completion".white().bold(), progress.percent_complete);
    if let Some(first) = progress.first_learning_date {
        println!("{}: {}", "First Learned".white().bold(), first);
    }
    match progress.next_due_date {
        Some(due) => println!("{}: {}", "Next Due".white().bold(), due),
        None => println!("{}: {}", "Next Due".white().bold(), "nothing pending".dimmed()),
    }
    println!();
    print_slots(&slots, engine.today());
    Ok(())
}

fn run_complete(engine: &Engine<SqliteStore>, progress_id: &str, order: SlotOrder) -> anyhow::Result<()> {
    let outcome = engine.complete_slot(progress_id, order)?;

    println!(
        "{} slot {} of {}",
        "Completed".green().bold(),
        order,
        outcome.slot.cycle
    );
    if outcome.rescheduled > 0 {
        println!("{} later slot(s) moved", outcome.rescheduled);
    }
    if let Some(advance) = &outcome.advance {
        println!();
        println!(
            "{} {} -> {}",
            "Cycle advanced:".magenta().bold(),
            advance.from,
            advance.to
        );
        print_slots(&advance.slots, engine.today());
    } else {
        print_slots(&engine.current_slots(progress_id)?, engine.today());
    }
    Ok(())
}

fn run_skip(engine: &Engine<SqliteStore>, progress_id: &str, order: SlotOrder) -> anyhow::Result<()> {
    let progress = engine.skip_slot(progress_id, order)?;
    println!("{} slot {} of {}", "Skipped".yellow().bold(), order, progress.cycle_state);
    print_slots(&engine.current_slots(progress_id)?, engine.today());
    Ok(())
}

fn run_reschedule(
    engine: &Engine<SqliteStore>,
    progress_id: &str,
    order: SlotOrder,
    new_start: NaiveDate,
) -> anyhow::Result<()> {
    let moved = engine.reschedule(progress_id, order, new_start)?;
    if moved == 0 {
        println!("{}", "Schedule already up to date.".dimmed());
    } else {
        println!("{} {} slot(s)", "Moved".cyan().bold(), moved);
    }
    print_slots(&engine.current_slots(progress_id)?, engine.today());
    Ok(())
}

fn run_percent(engine: &Engine<SqliteStore>, progress_id: &str, percent: u8) -> anyhow::Result<()> {
    let progress = engine.set_percent_complete(progress_id, percent)?;
    println!(
        "{}: {}%",
        "Completion".white().bold(),
        progress.percent_complete
    );
    println!("{}", "Applies from the next reschedule.".dimmed());
    Ok(())
}

fn run_due(engine: &Engine<SqliteStore>, on: Option<NaiveDate>, json: bool) -> anyhow::Result<()> {
    let due = engine.due(on)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&due)?);
        return Ok(());
    }

    let on = on.unwrap_or_else(|| engine.today());
    println!("{}", format!("=== Due on or before {} ===", on).cyan().bold());
    if due.is_empty() {
        println!("{}", "Nothing due.".dimmed());
        return Ok(());
    }

    for p in &due {
        let date = p
            .next_due_date
            .map(|d| d.to_string())
            .unwrap_or_default();
        let date = if p.next_due_date.is_some_and(|d| d < on) {
            date.red()
        } else {
            date.green()
        };
        println!(
            "  {}  {:<20} {:<20} {:<24} {}",
            date,
            truncate(&p.learner_id, 20),
            truncate(&p.unit.id, 20),
            p.cycle_state.to_string().dimmed(),
            p.id.dimmed()
        );
    }
    Ok(())
}

fn run_load(engine: &Engine<SqliteStore>, days: u32) -> anyhow::Result<()> {
    let load = engine.load(days)?;
    let threshold = engine.config().load_threshold;

    println!("{}", "=== Pending Reviews Per Day ===".cyan().bold());
    if load.is_empty() {
        println!("{}", "No reviews scheduled.".dimmed());
        return Ok(());
    }

    let peak = load.iter().map(|(_, count)| count).max().unwrap_or(0);
    for (day, count) in load.iter() {
        print_load_bar(day, count, peak, threshold);
    }
    println!();
    println!(
        "{}: {}  {}: {}",
        "Total".white().bold(),
        load.total(),
        "Threshold".white().bold(),
        threshold
    );
    Ok(())
}

// ============================================================================
// OUTPUT
// ============================================================================

fn print_slots(slots: &[ReviewSlot], today: NaiveDate) {
    if slots.is_empty() {
        println!("{}", "No slots scheduled.".dimmed());
        return;
    }

    for slot in slots {
        let status = match slot.status {
            SlotStatus::Completed => slot.status.as_str().green(),
            SlotStatus::Skipped => slot.status.as_str().yellow(),
            SlotStatus::NotStarted if slot.review_date < today => "OVERDUE".red().bold(),
            SlotStatus::NotStarted => slot.status.as_str().white(),
        };
        let done = slot
            .completed_on
            .map(|d| format!("done {}", d))
            .unwrap_or_default();
        println!(
            "  {:<24} #{}  {}  {:<12} {}",
            slot.cycle.to_string().dimmed(),
            slot.order,
            slot.review_date,
            status,
            done.dimmed()
        );
    }
}

fn print_load_bar(day: NaiveDate, count: u32, peak: u32, threshold: u32) {
    let bar_width: usize = 30;
    let filled = if peak > 0 {
        ((f64::from(count) / f64::from(peak)) * bar_width as f64).round() as usize
    } else {
        0
    };
    let empty = bar_width.saturating_sub(filled);

    let bar = format!("{}{}", "#".repeat(filled), "-".repeat(empty));
    let colored_bar = if count > threshold {
        bar.red()
    } else {
        bar.green()
    };

    println!("  {} [{:30}] {:>4}", day, colored_bar, count);
}

fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max_chars.saturating_sub(3)).collect();
        format!("{}...", cut)
    }
}
