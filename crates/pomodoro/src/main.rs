//! pomodoro - Work/break focus timer
//!
//! Usage:
//!   pomodoro                        Show today's progress
//!   pomodoro start                  Run a work session in the foreground
//!   pomodoro start --cycles 4       Run four work sessions with breaks between
//!   pomodoro stats week             Minutes per day this week
//!   pomodoro stats month 2024-02    Heatmap for a month
//!   pomodoro history                Recent sessions
//!   pomodoro settings set K V       Change a setting
//!   pomodoro task add TITLE         Track what sessions are for

use std::io::Write;
use std::sync::Arc;

use anyhow::{bail, Result};
use chrono::{Datelike, Local, NaiveDate, Utc};
use clap::{Parser, Subcommand};
use tokio::sync::Mutex;
use tracing::warn;
use tracing_subscriber::EnvFilter;

use pomodoro::cue::{Cue, CueSink, LogCues};
use pomodoro::driver::spawn_ticker;
use pomodoro::settings::SETTING_KEYS;
use pomodoro::stats::{self, Stats};
use pomodoro::{Controller, History, PollOutcome, Store, TaskList, TimerMode, TimerStatus, ToggleOutcome};
use pomodoro_core::{format, Config, Locale, Paths};

/// Pomodoro - Work/break focus timer with history and statistics
#[derive(Parser)]
#[command(name = "pomodoro")]
#[command(about = "Work/break focus timer with session history and statistics")]
#[command(version)]
#[command(after_help = r#"CYCLE:
    work -> short break -> work -> ... -> long break every N sessions
    Finished work sessions are saved to history; breaks are not.

EXAMPLES:
    pomodoro start                          # 25-minute work session
    pomodoro start --why "Ship the parser"  # State why before starting
    pomodoro start --cycles 4               # Four sessions with breaks
    pomodoro start --mode short-break       # Just a break, then exit
    pomodoro stats month 2024-02            # February heatmap
    pomodoro settings set work-duration 50  # Longer sessions

FILES:
    Data lives in ~/.local/share/pomodoro (override with POMODORO_DATA_DIR).
    Runtime config lives in ~/.config/pomodoro/config.json.
    Set RUST_LOG=debug for detailed logs on stderr.
"#)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show durations, today's progress and the active task
    #[command(alias = "st")]
    Status,

    /// Run the timer in the foreground (Ctrl-C pauses and exits)
    #[command(alias = "s")]
    Start {
        /// Mode to start in: work, short-break or long-break
        #[arg(long, value_parser = parse_mode)]
        mode: Option<TimerMode>,

        /// Why this session matters
        #[arg(long)]
        why: Option<String>,

        /// Note attached to saved sessions
        #[arg(long)]
        note: Option<String>,

        /// Do not save finished sessions
        #[arg(long)]
        discard: bool,

        /// Work sessions to run before exiting (a run started on a break
        /// exits when that break ends)
        #[arg(long, default_value = "1")]
        cycles: u32,
    },

    /// Show focus statistics
    Stats {
        #[command(subcommand)]
        view: Option<StatsView>,
    },

    /// Show or clear session history
    #[command(alias = "log")]
    History {
        /// Number of sessions to show
        #[arg(long, short = 'n', default_value = "10")]
        limit: usize,

        /// Delete all recorded sessions
        #[arg(long)]
        clear: bool,
    },

    /// Show or change user settings
    Settings {
        #[command(subcommand)]
        action: Option<SettingsAction>,
    },

    /// Show or change runtime configuration
    Config {
        #[command(subcommand)]
        action: Option<ConfigAction>,
    },

    /// Manage tasks that sessions are attributed to
    Task {
        #[command(subcommand)]
        action: Option<TaskAction>,
    },
}

#[derive(Subcommand)]
enum StatsView {
    /// Totals for one day (YYYY-MM-DD, default today)
    Day { date: Option<String> },
    /// Minutes per day for the week containing a date
    Week { date: Option<String> },
    /// Heatmap for a month (YYYY-MM, default this month)
    Month { month: Option<String> },
    /// Minutes per month for a year
    Year { year: Option<i32> },
}

#[derive(Subcommand)]
enum SettingsAction {
    /// Set one value
    Set { key: String, value: String },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Set one value (tick-interval, locale, log-filter)
    Set { key: String, value: String },
}

#[derive(Subcommand)]
enum TaskAction {
    /// Add a task (the first one becomes active)
    Add {
        #[arg(required = true, num_args = 1..)]
        title: Vec<String>,
    },
    /// List tasks
    #[command(alias = "ls")]
    List,
    /// Toggle a task's completed flag
    Done { id: String },
    /// Delete a task
    #[command(alias = "delete")]
    Rm { id: String },
    /// Attribute new sessions to a task
    Use { id: String },
    /// Stop attributing sessions to any task
    Unset,
}

// ANSI color codes
const RED: &str = "\x1b[0;31m";
const GREEN: &str = "\x1b[0;32m";
const YELLOW: &str = "\x1b[1;33m";
const CYAN: &str = "\x1b[0;36m";
const MAGENTA: &str = "\x1b[0;35m";
const BOLD: &str = "\x1b[1m";
const DIM: &str = "\x1b[2m";
const NC: &str = "\x1b[0m";

/// Heatmap cells by intensity level
const HEAT: [&str; 5] = ["·", "░", "▒", "▓", "█"];

/// Check if stdout is a TTY and colors should be used
fn use_colors() -> bool {
    std::io::IsTerminal::is_terminal(&std::io::stdout())
}

/// Conditionally apply color
fn color(code: &str, text: &str) -> String {
    if use_colors() {
        format!("{}{}{}", code, text, NC)
    } else {
        text.to_string()
    }
}

fn mode_color(mode: TimerMode) -> &'static str {
    match mode {
        TimerMode::Work => MAGENTA,
        TimerMode::ShortBreak => GREEN,
        TimerMode::LongBreak => CYAN,
    }
}

fn parse_mode(s: &str) -> std::result::Result<TimerMode, String> {
    TimerMode::from_str(s).ok_or_else(|| format!("unknown mode '{}' (work, short-break, long-break)", s))
}

/// Rings the terminal bell on completions, logs everything
struct TerminalCues;

impl CueSink for TerminalCues {
    fn play(&self, cue: Cue) {
        LogCues.play(cue);
        if cue != Cue::Start && use_colors() {
            print!("\x07");
            let _ = std::io::stdout().flush();
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let paths = Paths::new();
    let (config, config_error) = match Config::load(&paths.config_file()) {
        Ok(config) => (config, None),
        Err(e) => (Config::default(), Some(e)),
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    if let Some(e) = config_error {
        warn!("{:#}, using defaults", e);
    }

    let store = Store::new(&paths.data)?;

    match cli.command {
        Some(Commands::Status) | None => cmd_status(&store),
        Some(Commands::Start {
            mode,
            why,
            note,
            discard,
            cycles,
        }) => {
            let options = StartOptions {
                mode,
                why,
                note,
                discard,
                cycles: cycles.max(1),
            };
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(cmd_start(&store, &config, options))
        }
        Some(Commands::Stats { view }) => cmd_stats(&store, config.locale, view),
        Some(Commands::History { limit, clear }) => cmd_history(&store, limit, clear),
        Some(Commands::Settings { action }) => cmd_settings(&store, action),
        Some(Commands::Config { action }) => cmd_config(&paths, config, action),
        Some(Commands::Task { action }) => cmd_task(&store, action),
    }
}

/// Show today's progress
fn cmd_status(store: &Store) -> Result<()> {
    let settings = store.load_settings();
    let history = store.load_history();
    let tasks = store.load_tasks();

    let today = Stats::new(history.sessions()).day(Local::now().date_naive());

    println!("{}", color(&format!("{}{}", BOLD, MAGENTA), "POMODORO"));
    if !settings.user_name.is_empty() {
        println!("Hello, {}", settings.user_name);
    }
    println!();
    println!(
        "  {}  {}m work / {}m short / {}m long (long break every {})",
        color(CYAN, "Durations:"),
        settings.work_duration,
        settings.short_break_duration,
        settings.long_break_duration,
        settings.long_break_every()
    );

    let goal = settings.daily_goal;
    let ratio = if goal == 0 {
        1.0
    } else {
        f64::from(today.session_count) / f64::from(goal)
    };
    println!(
        "  {}      [{}] {}/{} sessions, {}",
        color(CYAN, "Today:"),
        progress_bar(ratio, 20),
        today.session_count,
        goal,
        format::minutes(today.total_minutes)
    );

    match tasks.active() {
        Some(task) => println!("  {}       {}", color(CYAN, "Task:"), task.title),
        None => println!("  {}       {}", color(CYAN, "Task:"), color(DIM, "none")),
    }

    if goal > 0 && today.session_count >= goal {
        println!();
        println!("{}", color(GREEN, "Daily goal reached."));
    }

    Ok(())
}

struct StartOptions {
    mode: Option<TimerMode>,
    why: Option<String>,
    note: Option<String>,
    discard: bool,
    cycles: u32,
}

/// When a foreground run is over
#[derive(Debug)]
struct RunPlan {
    cycles: u32,
    break_only: bool,
    finished: u32,
}

impl RunPlan {
    fn new(cycles: u32, start_mode: TimerMode) -> Self {
        Self {
            cycles: cycles.max(1),
            break_only: start_mode.is_break(),
            finished: 0,
        }
    }

    /// Count a finished work session; true once enough have run
    fn work_finished(&mut self) -> bool {
        self.finished += 1;
        self.finished >= self.cycles
    }

    /// True when the run ends with the break that just finished
    fn break_finished(&self) -> bool {
        self.break_only
    }
}

/// Run work/break cycles in the foreground
async fn cmd_start(store: &Store, config: &Config, options: StartOptions) -> Result<()> {
    let tasks = store.load_tasks();
    let mut controller = Controller::new(
        store.load_settings(),
        store.load_history(),
        Box::new(TerminalCues),
    );
    controller.set_active_task(tasks.active_id().map(str::to_string));
    if let Some(mode) = options.mode {
        controller.switch_mode(mode);
    }

    let mut plan = RunPlan::new(options.cycles, controller.mode());

    begin(&mut controller, &options);
    print_mode(&controller, &tasks);

    let controller = Arc::new(Mutex::new(controller));
    let (mut ticker, mut outcomes) = spawn_ticker(controller.clone(), config.tick_interval());
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            outcome = outcomes.recv() => {
                let Some(outcome) = outcome else { break };
                let mut controller = controller.lock().await;
                match outcome {
                    PollOutcome::Tick(secs) => render_countdown(controller.mode(), secs, controller.progress()),
                    PollOutcome::Completed => {
                        println!();
                        if controller.pending_session().is_some() {
                            if options.discard {
                                controller.discard_session();
                                println!("{} Session finished (not saved)", color(GREEN, "[ok]"));
                            } else {
                                let note = options.note.clone().unwrap_or_default();
                                if let Some(record) = controller.save_session(note) {
                                    println!(
                                        "{} Session saved: {} at {}",
                                        color(GREEN, "[ok]"),
                                        format::minutes(record.minutes()),
                                        format::time_of_day(record.end_time)
                                    );
                                }
                                store.save_history(controller.history())?;
                            }
                            if plan.work_finished() {
                                let next = controller.mode();
                                println!("Next up: {}", color(mode_color(next), next.title()));
                                break;
                            }
                        } else {
                            println!("{}", Cue::Break.message());
                            if plan.break_finished() {
                                break;
                            }
                        }
                        begin(&mut controller, &options);
                        print_mode(&controller, &tasks);
                    }
                    PollOutcome::Idle => {}
                }
            }
            _ = &mut ctrl_c => {
                let mut controller = controller.lock().await;
                if controller.status() == TimerStatus::Running {
                    controller.toggle();
                }
                println!();
                println!(
                    "{} Stopped at {}; nothing saved",
                    color(RED, "[paused]"),
                    format::clock(controller.remaining_secs())
                );
                break;
            }
        }
    }

    ticker.stop();
    Ok(())
}

/// Start the controller's current mode, answering the commitment prompt
fn begin(controller: &mut Controller, options: &StartOptions) {
    if controller.toggle() == ToggleOutcome::NeedsCommitment {
        controller.commit(options.why.clone().unwrap_or_default());
    }
}

fn print_mode(controller: &Controller, tasks: &TaskList) {
    let mode = controller.mode();
    println!();
    println!(
        "{}  {}",
        color(&format!("{}{}", BOLD, mode_color(mode)), mode.title()),
        format::clock(controller.total_secs())
    );
    if mode == TimerMode::Work {
        if let Some(why) = controller.commitment() {
            println!("  {}  {}", color(CYAN, "Why:"), why);
        }
        if let Some(task) = tasks.active() {
            println!("  {} {}", color(CYAN, "Task:"), task.title);
        }
    }
}

fn render_countdown(mode: TimerMode, secs: u64, progress: f64) {
    print!(
        "\r  {} [{}] ",
        color(&format!("{}{}", BOLD, mode_color(mode)), &format::clock(secs)),
        progress_bar(progress, 30)
    );
    let _ = std::io::stdout().flush();
}

/// Bar of `width` cells filled to `ratio` (clamped to 0..=1)
fn progress_bar(ratio: f64, width: usize) -> String {
    let ratio = if ratio.is_finite() { ratio.clamp(0.0, 1.0) } else { 0.0 };
    let filled = ((width as f64) * ratio).round() as usize;
    format!(
        "{}{}",
        "\u{2588}".repeat(filled),
        "\u{2591}".repeat(width - filled)
    )
}

/// Show focus statistics
fn cmd_stats(store: &Store, locale: Locale, view: Option<StatsView>) -> Result<()> {
    let history = store.load_history();
    let report = Stats::new(history.sessions()).with_locale(locale);
    let today = Local::now().date_naive();

    let parse_day = |value: Option<String>| -> Result<NaiveDate> {
        match value {
            Some(value) => Ok(stats::parse_date_key(&value)?),
            None => Ok(today),
        }
    };

    match view.unwrap_or(StatsView::Week { date: None }) {
        StatsView::Day { date } => {
            let day = report.day(parse_day(date)?);
            println!("{}Focus on {}{}", BOLD, day.date, NC);
            println!();
            println!("  {}  {}", color(CYAN, "Sessions:"), day.session_count);
            println!("  {}      {}", color(CYAN, "Time:"), format::minutes(day.total_minutes));
        }
        StatsView::Week { date } => {
            let week = report.weekly(parse_day(date)?);
            let max = week.iter().map(|d| d.minutes).max().unwrap_or(0);
            let total: u32 = week.iter().map(|d| d.minutes).sum();
            if let (Some(first), Some(last)) = (week.first(), week.last()) {
                println!("{}Week {} to {}{}", BOLD, first.date, last.date, NC);
            }
            println!();
            for day in &week {
                println!(
                    "  {} {} {}",
                    color(CYAN, day.label),
                    scaled_bar(day.minutes, max, 30),
                    format::minutes(day.minutes)
                );
            }
            println!();
            println!("  {} {}", color(CYAN, "Total:"), format::minutes(total));
        }
        StatsView::Month { month } => {
            let (month_index, year) = match month {
                Some(value) => stats::parse_month(&value)?,
                None => (today.month0(), today.year()),
            };
            let cells = report.monthly(month_index, year);
            let Some(first) = NaiveDate::from_ymd_opt(year, month_index + 1, 1) else {
                bail!("Month out of range: {}-{:02}", year, month_index + 1);
            };
            let total: u32 = cells.iter().map(|c| c.minutes).sum();

            println!(
                "{}{} {}{}",
                BOLD,
                locale.month_labels()[month_index as usize],
                year,
                NC
            );
            println!();
            println!("  {}", heatmap(&cells, first, locale).join("\n  "));
            println!();
            println!("  {} {}", color(CYAN, "Total:"), format::minutes(total));
        }
        StatsView::Year { year } => {
            let year = year.unwrap_or_else(|| today.year());
            let months = report.yearly(year);
            let max = months.iter().map(|m| m.total_minutes).max().unwrap_or(0);
            let total: u32 = months.iter().map(|m| m.total_minutes).sum();

            println!("{}Focus in {}{}", BOLD, year, NC);
            println!();
            for month in &months {
                println!(
                    "  {} {} {}",
                    color(CYAN, month.label),
                    scaled_bar(month.total_minutes, max, 30),
                    format::minutes(month.total_minutes)
                );
            }
            println!();
            println!("  {} {}", color(CYAN, "Total:"), format::minutes(total));
        }
    }

    Ok(())
}

fn scaled_bar(value: u32, max: u32, width: usize) -> String {
    if max == 0 {
        return progress_bar(0.0, width);
    }
    progress_bar(f64::from(value) / f64::from(max), width)
}

/// Month grid, Monday first, one row per week
fn heatmap(cells: &[stats::MonthDay], first: NaiveDate, locale: Locale) -> Vec<String> {
    let mut rows = vec![locale
        .weekday_labels()
        .iter()
        .map(|label| format!("{:<4}", format::truncate(label, 3)))
        .collect::<String>()
        .trim_end()
        .to_string()];

    let offset = first.weekday().num_days_from_monday() as usize;
    let mut row = "    ".repeat(offset);
    for (i, cell) in cells.iter().enumerate() {
        row.push_str(&format!("{:<4}", HEAT[usize::from(cell.intensity.min(4))]));
        if (offset + i + 1) % 7 == 0 {
            rows.push(row.trim_end().to_string());
            row = String::new();
        }
    }
    if !row.is_empty() {
        rows.push(row.trim_end().to_string());
    }
    rows
}

/// Show or clear session history
fn cmd_history(store: &Store, limit: usize, clear: bool) -> Result<()> {
    let mut history = store.load_history();

    if clear {
        let count = history.len();
        history.clear();
        store.save_history(&history)?;
        println!("{} Cleared {} sessions", color(GREEN, "[ok]"), count);
        return Ok(());
    }

    if history.is_empty() {
        println!("No sessions recorded yet");
        println!();
        println!("Start one with: pomodoro start");
        return Ok(());
    }

    let tasks = store.load_tasks();
    let recent = History::from_records(history.recent(limit).to_vec());
    for (date, records) in recent.grouped_by_day(&Local) {
        println!("{}", color(BOLD, &date.format("%a %Y-%m-%d").to_string()));
        for record in records {
            let task = record
                .task_id
                .as_deref()
                .and_then(|id| tasks.find(id))
                .map(|t| format!(" [{}]", format::truncate(&t.title, 24)))
                .unwrap_or_default();
            println!(
                "  {}  {:>6}  {}{}",
                format::time_of_day(record.end_time),
                format::minutes(record.minutes()),
                format::truncate(&record.note, 40),
                color(DIM, &task)
            );
            if let Some(why) = &record.commitment {
                println!("         {} {}", color(DIM, "why:"), format::truncate(why, 48));
            }
        }
    }

    Ok(())
}

/// Show or change user settings
fn cmd_settings(store: &Store, action: Option<SettingsAction>) -> Result<()> {
    let mut settings = store.load_settings();

    if let Some(SettingsAction::Set { key, value }) = action {
        settings.set(&key, &value)?;
        store.save_settings(&settings)?;
        println!("{} {} = {}", color(GREEN, "[ok]"), key, value);
        return Ok(());
    }

    let values = [
        settings.work_duration.to_string(),
        settings.short_break_duration.to_string(),
        settings.long_break_duration.to_string(),
        settings.daily_goal.to_string(),
        settings.sessions_before_long_break.to_string(),
        settings.user_name.clone(),
        settings.theme.as_str().to_string(),
        settings.clean_start_tolerance_secs.to_string(),
    ];
    for (key, value) in SETTING_KEYS.iter().zip(values) {
        println!("  {:<28} {}", color(CYAN, key), value);
    }

    Ok(())
}

/// Show or change runtime configuration
fn cmd_config(paths: &Paths, mut config: Config, action: Option<ConfigAction>) -> Result<()> {
    let Some(ConfigAction::Set { key, value }) = action else {
        println!("  {:<16} {}", color(CYAN, "tick-interval"), config.tick_interval_ms);
        println!("  {:<16} {}", color(CYAN, "locale"), config.locale.as_str());
        println!("  {:<16} {}", color(CYAN, "log-filter"), config.log_filter);
        println!();
        println!("  {}", color(DIM, &paths.config_file().display().to_string()));
        return Ok(());
    };

    match key.as_str() {
        "tick-interval" => match value.parse::<u64>() {
            Ok(ms) if ms > 0 => config.tick_interval_ms = ms,
            _ => bail!("Invalid tick interval: {} (milliseconds, above zero)", value),
        },
        "locale" => match Locale::from_str(&value) {
            Some(locale) => config.locale = locale,
            None => bail!("Unknown locale: {} (english, turkish)", value),
        },
        "log-filter" => {
            if let Err(e) = EnvFilter::try_new(&value) {
                bail!("Invalid log filter {}: {}", value, e);
            }
            config.log_filter = value.clone();
        }
        _ => bail!("Unknown config key: {}", key),
    }

    config.save(&paths.config_file())?;
    println!("{} {} = {}", color(GREEN, "[ok]"), key, value);
    Ok(())
}

/// Manage tasks
fn cmd_task(store: &Store, action: Option<TaskAction>) -> Result<()> {
    let mut tasks = store.load_tasks();

    match action.unwrap_or(TaskAction::List) {
        TaskAction::Add { title } => {
            let title = title.join(" ");
            if title.trim().is_empty() {
                bail!("Task title cannot be empty");
            }
            let task = tasks.add(title.trim(), Utc::now().timestamp_millis());
            println!("{} Added {} {}", color(GREEN, "[ok]"), short_id(&task.id), task.title);
        }
        TaskAction::List => {
            print_tasks(&tasks);
            return Ok(());
        }
        TaskAction::Done { id } => {
            let id = tasks.resolve(&id)?.id.clone();
            let completed = tasks.toggle(&id)?;
            let state = if completed { "done" } else { "open" };
            println!("{} Marked {} {}", color(GREEN, "[ok]"), short_id(&id), state);
        }
        TaskAction::Rm { id } => {
            let id = tasks.resolve(&id)?.id.clone();
            let removed = tasks.delete(&id)?;
            println!("{} Deleted {}", color(GREEN, "[ok]"), removed.title);
        }
        TaskAction::Use { id } => {
            let id = tasks.resolve(&id)?.id.clone();
            tasks.set_active(Some(&id))?;
            println!("{} Sessions now count toward {}", color(GREEN, "[ok]"), short_id(&id));
        }
        TaskAction::Unset => {
            tasks.set_active(None)?;
            println!("{} No active task", color(GREEN, "[ok]"));
        }
    }

    store.save_tasks(&tasks)
}

fn print_tasks(tasks: &TaskList) {
    if tasks.is_empty() {
        println!("No tasks");
        println!();
        println!("Add one with: pomodoro task add TITLE");
        return;
    }

    let active = tasks.active_id();
    for task in tasks.tasks() {
        let marker = if Some(task.id.as_str()) == active {
            color(YELLOW, "*")
        } else {
            " ".to_string()
        };
        let check = if task.completed {
            color(GREEN, "[x]")
        } else {
            "[ ]".to_string()
        };
        println!("{} {} {}  {}", marker, check, color(DIM, short_id(&task.id)), task.title);
    }
}

fn short_id(id: &str) -> &str {
    id.get(..8).unwrap_or(id)
}
