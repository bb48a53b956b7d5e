//! `habits` command-line entry point.
//!
//! # Responsibility
//! - Translate subcommands into lifecycle controller calls.
//! - Own the single rollover scheduler for the `run` command.

mod cli;

use clap::Parser;
use cli::{Cli, Commands};
use habits_core::{
    consistency, init_logging, logging_status, validate_new_habit, Clock, EngineConfig, Habit,
    HabitService, NewHabit, RolloverScheduler, SystemClock,
};
use log::info;
use serde::Serialize;
use std::error::Error;
use std::sync::Arc;
use std::time::Duration;

type CliResult<T> = Result<T, Box<dyn Error>>;

fn main() {
    if let Err(err) = run(Cli::parse()) {
        eprintln!("Error: {err}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> CliResult<()> {
    let mut config = EngineConfig::from_env()?;
    if let Some(db) = cli.db {
        config.db_path = db;
    }
    if let Some(log_dir) = cli.log_dir {
        config.log_dir = Some(log_dir);
    }
    if let Some(log_dir) = &config.log_dir {
        init_logging(config.log_level, log_dir)?;
    }

    let service = HabitService::open(&config.db_path)?;
    let output = Output { json: cli.json };

    match cli.command {
        Commands::Add { name, goal, bad } => {
            validate_new_habit(&name, &goal)?;
            let habit = service.create_habit(&NewHabit::new(name, !bad, goal))?;
            output.habit(&habit, now(&service))
        }
        Commands::List { archived } => {
            let habits = if archived {
                service.list_archived_habits()?
            } else {
                service.list_active_habits()?
            };
            output.habits(&habits, now(&service))
        }
        Commands::Show { id } => output.habit(&service.get_habit(id)?, now(&service)),
        Commands::Toggle { id } => output.habit(&service.toggle_fulfillment(id)?, now(&service)),
        Commands::Archive { id } => output.habit(&service.archive_habit(id)?, now(&service)),
        Commands::Restore { id } => output.habit(&service.restore_habit(id)?, now(&service)),
        Commands::Rename { id, name, goal } => {
            output.habit(&service.rename_habit(id, name, goal)?, now(&service))
        }
        Commands::Polarity { id, polarity } => {
            let habit = service.set_polarity(id, polarity == "good")?;
            output.habit(&habit, now(&service))
        }
        Commands::Delete { id } => {
            service.delete_habit(id)?;
            output.message(&format!("Deleted {id}."))
        }
        Commands::Consistency { id } => {
            let percent = service.get_consistency(id, now(&service))?;
            if output.json {
                output.value(&serde_json::json!({ "id": id, "consistency": percent }))
            } else {
                output.message(&format!("{percent}%"))
            }
        }
        Commands::Rollover => {
            let report = service.rollover_now()?;
            if output.json {
                output.value(&report)
            } else {
                output.message(&format!(
                    "Rolled over {} habit(s); {} advanced.",
                    report.scanned, report.advanced
                ))
            }
        }
        Commands::Stats => {
            let summary = service.profile_summary(now(&service))?;
            if output.json {
                return output.value(&summary);
            }
            println!("Total habits: {}", summary.total_habits);
            println!("In progress today: {}", summary.in_progress);
            match summary.average_consistency {
                Some(average) => println!("Average consistency: {average:.1}%"),
                None => println!("Average consistency: n/a"),
            }
            Ok(())
        }
        Commands::Run { interval_secs } => {
            let interval = interval_secs
                .map(Duration::from_secs)
                .unwrap_or(config.rollover_interval);
            run_scheduler(Arc::new(service), interval)
        }
    }
}

fn run_scheduler(service: Arc<HabitService<SystemClock>>, interval: Duration) -> CliResult<()> {
    let _scheduler = RolloverScheduler::start(service, interval)?;
    info!(
        "event=cli_run module=cli status=ok interval_ms={}",
        interval.as_millis()
    );
    println!(
        "Rolling over every {}s. Stop with Ctrl-C.",
        interval.as_secs()
    );
    match logging_status() {
        Some((level, log_dir)) => println!("Logging {level} to {}.", log_dir.display()),
        None => println!("File logging is off; pass --log-dir to enable it."),
    }
    loop {
        std::thread::park();
    }
}

fn now(service: &HabitService<SystemClock>) -> i64 {
    service.clock().now_epoch_ms()
}

struct Output {
    json: bool,
}

impl Output {
    fn habit(&self, habit: &Habit, now: i64) -> CliResult<()> {
        if self.json {
            return self.value(habit);
        }
        println!("{}", describe(habit, now));
        Ok(())
    }

    fn habits(&self, habits: &[Habit], now: i64) -> CliResult<()> {
        if self.json {
            return self.value(&habits);
        }
        if habits.is_empty() {
            println!("No habits.");
        }
        for habit in habits {
            println!("{}", describe(habit, now));
        }
        Ok(())
    }

    fn message(&self, text: &str) -> CliResult<()> {
        if self.json {
            return self.value(&serde_json::json!({ "message": text }));
        }
        println!("{text}");
        Ok(())
    }

    fn value(&self, value: &impl Serialize) -> CliResult<()> {
        println!("{}", serde_json::to_string_pretty(value)?);
        Ok(())
    }
}

fn describe(habit: &Habit, now: i64) -> String {
    format!(
        "{id}  {mark} {name} ({polarity}) goal: {goal}  days: {days}  consistency: {percent}%{archived}",
        id = habit.id,
        mark = if habit.goal_fulfilled { "[x]" } else { "[ ]" },
        name = habit.name,
        polarity = if habit.is_good { "good" } else { "bad" },
        goal = habit.goal,
        days = habit.progress_days,
        percent = consistency(habit, now),
        archived = if habit.archived { "  (archived)" } else { "" },
    )
}
