use clap::ValueEnum;
use colored::{ColoredString, Colorize};
use serde::Serialize;

use crate::error::Result;
use crate::model::{Status, StatusUpdate, Task};
use crate::store::tasklist::CommitReport;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Format {
    Json,
    Pretty,
    Minimal,
}

fn badge(status: Status) -> ColoredString {
    match status {
        Status::Blocked => status.label().red(),
        Status::InProgress => status.label().yellow(),
        Status::Todo => status.label().normal(),
        Status::Done => status.label().green(),
    }
}

pub fn print_task(task: &Task, format: Format) -> Result<()> {
    match format {
        Format::Json => println!("{}", serde_json::to_string(task)?),
        Format::Pretty => {
            println!("[{}] {} ({})", task.id, task.title, badge(task.status));
            if !task.description.is_empty() {
                println!("  {}", task.description);
            }
            if !task.dependencies.is_empty() {
                let deps: Vec<String> = task
                    .dependencies
                    .iter()
                    .map(|d| format!("{} {} ({})", d.id, d.title, badge(d.status)))
                    .collect();
                println!("  depends on: {}", deps.join(", "));
            }
        }
        Format::Minimal => {
            println!(
                "{:>4} {:12} {:11} {}",
                task.id,
                truncate_title(&task.title, 12),
                task.status,
                dependency_list(task)
            );
        }
    }
    Ok(())
}

pub fn print_tasks(tasks: &[Task], format: Format) -> Result<()> {
    match format {
        Format::Json => println!("{}", serde_json::to_string(tasks)?),
        Format::Pretty => {
            for task in tasks {
                print_task(task, Format::Pretty)?;
                println!();
            }
        }
        Format::Minimal => {
            println!("{:>4} {:12} {:11} DEPENDS", "ID", "TITLE", "STATUS");
            println!("{}", "-".repeat(40));
            for task in tasks {
                print_task(task, Format::Minimal)?;
            }
        }
    }
    Ok(())
}

pub fn print_updates(updates: &[StatusUpdate], format: Format) -> Result<()> {
    match format {
        Format::Json => println!("{}", serde_json::to_string(updates)?),
        Format::Pretty => {
            if updates.is_empty() {
                println!("no dependent tasks change");
            }
            for update in updates {
                println!("[{}] -> {}", update.id, badge(update.status));
            }
        }
        Format::Minimal => {
            for update in updates {
                println!("{:>4} {}", update.id, update.status);
            }
        }
    }
    Ok(())
}

#[derive(Serialize)]
struct ReportView<'a> {
    task: &'a Task,
    updates: &'a [StatusUpdate],
    stale: bool,
}

pub fn print_report(report: &CommitReport, format: Format) -> Result<()> {
    match format {
        Format::Json => {
            let view = ReportView {
                task: &report.changed,
                updates: &report.updates,
                stale: report.stale,
            };
            println!("{}", serde_json::to_string(&view)?);
        }
        _ => {
            print_task(&report.changed, format)?;
            print_updates(&report.updates, format)?;
        }
    }
    Ok(())
}

fn dependency_list(task: &Task) -> String {
    if task.dependencies.is_empty() {
        return "-".into();
    }
    task.dependencies
        .iter()
        .map(|d| d.id.to_string())
        .collect::<Vec<_>>()
        .join(",")
}

pub fn truncate_title(title: &str, max_len: usize) -> String {
    if title.chars().count() > max_len {
        let truncated: String = title.chars().take(max_len - 3).collect();
        format!("{}...", truncated)
    } else {
        title.to_string()
    }
}
