use anyhow::{Context, anyhow, bail};
use clap::Parser;
#[cfg(feature = "sqlite")]
use schedule_planner::{ScheduleStore, SqliteScheduleStore};
use schedule_planner::{
    AntiTask, Date, RecurringTask, Schedulable, Schedule, Task, TaskFrequency, TaskKind,
    Timeframe, TransientTask, load_schedule_from_csv, load_schedule_from_json, save_schedule_to_csv,
    save_schedule_to_json,
};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// Interactive front-end for a personal schedule.
#[derive(Parser)]
#[command(name = "cli", version, about)]
struct Cli {
    /// Schedule file (.json or .csv) to load at start-up.
    #[arg(short, long)]
    load: Option<PathBuf>,

    /// SQLite store loaded at start-up and written back on quit.
    #[cfg(feature = "sqlite")]
    #[arg(long)]
    db: Option<PathBuf>,

    /// Log filter used when RUST_LOG is not set.
    #[arg(long, default_value = "warn")]
    log_level: String,
}

fn print_help() {
    println!(
        "Commands:\n  help                                   Show this help\n  show <M/D/YYYY>                        Tasks on a date\n  week <M/D/YYYY>                        Tasks for seven days from a date\n  month <M> <YYYY>                       Tasks for a month\n  category <name>                        Tasks in a category\n  categories                             Categories in use\n  find <name>                            Describe a task\n  add transient <name> <category> <date> <start_min> <duration_min>\n  add recurring <name> <category> <start> <end> <daily|weekly|monthly> <start_min> <duration_min>\n  add anti <name> <date> <start_min> <duration_min>\n  remove [transient|recurring|anti] <name>  Remove a task (anti-task removal restores the occurrence)\n  merge <path>                           Merge a .json or .csv schedule into this one\n  save <path>                            Save to .json or .csv\n  load <path>                            Replace the schedule from .json or .csv\n  quit|exit                              Exit"
    );
}

fn parse_date(input: &str) -> anyhow::Result<Date> {
    let parts: Vec<&str> = input.split('/').collect();
    let [month, day, year] = parts.as_slice() else {
        bail!("Invalid date '{input}' (M/D/YYYY)");
    };
    let month = month.parse::<u32>().with_context(|| format!("Invalid month in '{input}'"))?;
    let day = day.parse::<u32>().with_context(|| format!("Invalid day in '{input}'"))?;
    let year = year.parse::<i32>().with_context(|| format!("Invalid year in '{input}'"))?;
    Ok(Date::new(month, day, year)?)
}

fn parse_minutes(input: &str) -> anyhow::Result<u32> {
    input
        .parse()
        .with_context(|| format!("Invalid number of minutes '{input}'"))
}

fn describe(task: &Task) -> String {
    let detail = match task {
        Task::Transient(transient) => format!("on {}", transient.active_date()),
        Task::Anti(anti_task) => format!("cancels {}", anti_task.active_date()),
        Task::Recurring(recurring) => format!(
            "{} from {} to {}",
            recurring.frequency().as_str(),
            recurring.starting_date(),
            recurring.ending_date()
        ),
    };
    format!(
        "{} [{}] {} ({})",
        task.name(),
        task.category(),
        task.timeframe(),
        detail
    )
}

fn print_day(schedule: &Schedule, date: &Date) {
    println!("{} ({}, {})", date, date.weekday(), date.month_name());
    match schedule.daily_tasks(date) {
        Some(tasks) => {
            for task in tasks {
                for timeframe in task.daily_timeframes(date) {
                    println!("  {:<16} {} [{}]", timeframe.to_string(), task.name(), task.category());
                }
            }
        }
        None => println!("  (nothing scheduled)"),
    }
}

fn print_range(schedule: &Schedule, start: &Date, end: &Date) {
    let days = schedule.tasks_between(start, end);
    if days.is_empty() {
        println!("Nothing scheduled between {start} and {end}.");
        return;
    }
    for date in days.keys() {
        print_day(schedule, date);
    }
}

fn load_path(path: &Path) -> anyhow::Result<Schedule> {
    let schedule = match path.extension().and_then(|ext| ext.to_str()) {
        Some("json") => load_schedule_from_json(path)?,
        Some("csv") => load_schedule_from_csv(path)?,
        _ => bail!("Unsupported file type for {} (use .json or .csv)", path.display()),
    };
    Ok(schedule)
}

fn save_path(schedule: &Schedule, path: &Path) -> anyhow::Result<()> {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("json") => save_schedule_to_json(schedule, path)?,
        Some("csv") => save_schedule_to_csv(schedule, path)?,
        _ => bail!("Unsupported file type for {} (use .json or .csv)", path.display()),
    }
    Ok(())
}

fn add_command(schedule: &mut Schedule, args: &[&str]) -> anyhow::Result<String> {
    match args {
        ["transient", name, category, date, start, duration] => {
            let timeframe = Timeframe::new(parse_minutes(start)?, parse_minutes(duration)?)?;
            let task = TransientTask::new(*name, category, timeframe, parse_date(date)?)?;
            schedule.add_task(task)?;
            Ok(format!("Added transient task {name}."))
        }
        ["recurring", name, category, start_date, end_date, frequency, start, duration] => {
            let frequency = TaskFrequency::from_str(frequency)
                .ok_or_else(|| anyhow!("Invalid frequency '{frequency}'"))?;
            let timeframe = Timeframe::new(parse_minutes(start)?, parse_minutes(duration)?)?;
            let task = RecurringTask::new(
                *name,
                category,
                timeframe,
                parse_date(start_date)?,
                parse_date(end_date)?,
                frequency,
            )?;
            schedule.add_task(task)?;
            Ok(format!("Added recurring task {name}."))
        }
        ["anti", name, date, start, duration] => {
            let timeframe = Timeframe::new(parse_minutes(start)?, parse_minutes(duration)?)?;
            schedule.add_task(AntiTask::new(*name, timeframe, parse_date(date)?))?;
            Ok(format!("Added anti-task {name}."))
        }
        _ => bail!("Usage: add transient|recurring|anti ... (see help)"),
    }
}

fn run_command(schedule: &mut Schedule, cmd: &str, args: &[&str]) -> anyhow::Result<()> {
    match (cmd, args) {
        ("help", _) => print_help(),
        ("show", [date]) => print_day(schedule, &parse_date(date)?),
        ("week", [date]) => {
            let start = parse_date(date)?;
            let end = (0..6).fold(start, |d, _| d.next_day());
            print_range(schedule, &start, &end);
        }
        ("month", [month, year]) => {
            let month: u32 = month.parse().context("Invalid month")?;
            let year: i32 = year.parse().context("Invalid year")?;
            let start = Date::new(month, 1, year)?;
            let end = Date::new(month, Date::max_day(month, year), year)?;
            print_range(schedule, &start, &end);
        }
        ("category", [name]) => match schedule.tasks_by_category(name) {
            Some(tasks) => tasks.iter().for_each(|task| println!("  {}", describe(task))),
            None => println!("No tasks in category {name}."),
        },
        ("categories", []) => {
            let categories = schedule.active_categories();
            if categories.is_empty() {
                println!("No categories in use.");
            } else {
                println!("{}", categories.into_iter().collect::<Vec<_>>().join(", "));
            }
        }
        ("find", [name]) => match schedule.task(name) {
            Some(task) => println!("{}", describe(&task)),
            None => println!("Task {name} not found."),
        },
        ("add", rest) => println!("{}", add_command(schedule, rest)?),
        ("remove", [name]) => {
            let id = match schedule.task_ids(name).as_slice() {
                [] => bail!("Task {name} not found."),
                [id] => *id,
                _ => bail!(
                    "Several tasks are named {name}; use remove transient|recurring|anti {name}"
                ),
            };
            let removed = schedule.remove_task(id)?;
            println!("Removed {}.", removed.name());
        }
        ("remove", [kind, name]) => {
            let kind = TaskKind::from_str(kind).ok_or_else(|| anyhow!("Invalid task kind '{kind}'"))?;
            let id = schedule
                .task_ids(name)
                .into_iter()
                .find(|id| schedule.get(*id).is_some_and(|task| task.kind() == kind))
                .ok_or_else(|| anyhow!("No {} task named {name}.", kind.as_str().to_ascii_lowercase()))?;
            let removed = schedule.remove_task(id)?;
            println!("Removed {}.", removed.name());
        }
        ("merge", [path]) => {
            let other = load_path(Path::new(path))?;
            *schedule = schedule.merge(&other)?;
            println!("Merged {} tasks from {path}.", other.len());
        }
        ("save", [path]) => {
            save_path(schedule, Path::new(path))?;
            println!("Schedule saved to {path}.");
        }
        ("load", [path]) => {
            *schedule = load_path(Path::new(path))?;
            println!("Schedule loaded from {path} ({} tasks).", schedule.len());
        }
        _ => println!("Unknown command or wrong arguments; type 'help'."),
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level)),
        )
        .with_writer(io::stderr)
        .init();

    let mut schedule = match &cli.load {
        Some(path) => load_path(path)?,
        None => Schedule::new(),
    };

    #[cfg(feature = "sqlite")]
    let store = cli.db.as_ref().map(SqliteScheduleStore::new).transpose()?;
    #[cfg(feature = "sqlite")]
    if let Some(store) = &store {
        if let Some(stored) = store.load_schedule()? {
            schedule = schedule.merge(&stored)?;
        }
    }

    println!("Schedule Planner (CLI) - type 'help' for commands\n");

    let stdin = io::stdin();
    let mut line = String::new();
    loop {
        print!("> ");
        let _ = io::stdout().flush();
        line.clear();
        match stdin.read_line(&mut line) {
            Ok(0) | Err(_) => break,
            Ok(_) => {}
        }
        let parts: Vec<&str> = line.split_whitespace().collect();
        let Some((cmd, args)) = parts.split_first() else {
            continue;
        };
        if matches!(*cmd, "quit" | "exit") {
            break;
        }
        if let Err(e) = run_command(&mut schedule, cmd, args) {
            println!("Error: {e}");
        }
    }

    #[cfg(feature = "sqlite")]
    if let Some(store) = &store {
        store.save_schedule(&schedule)?;
        println!("Schedule stored.");
    }

    Ok(())
}
