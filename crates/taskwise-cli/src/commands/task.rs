//! Task commands for CLI.

use chrono::{Local, NaiveDate, NaiveTime};
use clap::Subcommand;
use taskwise_core::task::hhmm;
use taskwise_core::{
    ClassificationRequest, ClassificationService, Config, Task, TaskStore, ValidationError,
};

#[derive(Subcommand)]
pub enum TaskAction {
    /// Add a task; category, priority and due time are filled in automatically
    Add {
        /// Task text
        #[arg(required = true)]
        text: Vec<String>,
        /// Due date (YYYY-MM-DD), overrides the suggestion
        #[arg(long, value_parser = parse_date)]
        date: Option<NaiveDate>,
        /// Due time (HH:MM), overrides the suggestion
        #[arg(long, value_parser = parse_time)]
        time: Option<NaiveTime>,
        /// Print the created task as JSON
        #[arg(long)]
        json: bool,
    },
    /// List tasks
    List {
        /// Only tasks in this category ("all" for every task)
        #[arg(long, default_value = "all")]
        category: String,
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
    /// Toggle a task between done and not done
    Toggle {
        /// Task ID
        id: String,
    },
    /// Delete a task
    Delete {
        /// Task ID
        id: String,
    },
    /// Show how a text would be classified, without saving it
    Classify {
        /// Task text
        #[arg(required = true)]
        text: Vec<String>,
        /// Due date (YYYY-MM-DD)
        #[arg(long, value_parser = parse_date)]
        date: Option<NaiveDate>,
        /// Due time (HH:MM)
        #[arg(long, value_parser = parse_time)]
        time: Option<NaiveTime>,
    },
}

fn parse_date(s: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|e| format!("expected YYYY-MM-DD: {e}"))
}

fn parse_time(s: &str) -> Result<NaiveTime, String> {
    NaiveTime::parse_from_str(s, hhmm::FORMAT).map_err(|e| format!("expected HH:MM: {e}"))
}

fn runtime() -> std::io::Result<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
}

fn service() -> Result<ClassificationService, Box<dyn std::error::Error>> {
    let config = Config::load()?;
    let service = ClassificationService::from_config(&config.ai);
    tracing::debug!(
        ai_enabled = service.is_ai_enabled(),
        model = %config.ai.model,
        "classification service ready"
    );
    Ok(service)
}

fn print_task(task: &Task) {
    let mark = if task.completed { "x" } else { " " };
    println!(
        "[{mark}] {}  {} {}  {:<6}  {:<10}  {}",
        task.id,
        task.due_date,
        task.due_time_label(),
        task.priority.as_str(),
        task.category,
        task.text
    );
}

pub fn run(action: TaskAction) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        TaskAction::Add {
            text,
            date,
            time,
            json,
        } => {
            let mut store = TaskStore::open()?;
            let service = service()?;
            let now = Local::now().naive_local();
            let task = runtime()?.block_on(store.add_task(
                &text.join(" "),
                date,
                time,
                &service,
                now,
            ))?;
            if json {
                println!("{}", serde_json::to_string_pretty(&task)?);
            } else {
                println!("Task added: {}", task.id);
                print_task(&task);
            }
        }
        TaskAction::List { category, json } => {
            let store = TaskStore::open()?;
            let tasks = store.tasks_in(&category);
            if json {
                println!("{}", serde_json::to_string_pretty(&tasks)?);
            } else if tasks.is_empty() {
                println!("No tasks.");
            } else {
                for task in tasks {
                    print_task(task);
                }
            }
        }
        TaskAction::Toggle { id } => {
            let mut store = TaskStore::open()?;
            let task = store.toggle_task(&id)?;
            let state = if task.completed { "done" } else { "open" };
            println!("Task {id} marked {state}");
        }
        TaskAction::Delete { id } => {
            let mut store = TaskStore::open()?;
            store.delete_task(&id)?;
            println!("Task deleted: {id}");
        }
        TaskAction::Classify { text, date, time } => {
            let store = TaskStore::open()?;
            let service = service()?;
            let text = text.join(" ");
            if text.trim().is_empty() {
                return Err(ValidationError::EmptyText.into());
            }
            let request = ClassificationRequest {
                raw_text: text.trim(),
                due_date: date,
                due_time: time,
                categories: store.category_set(),
                recent_tasks: store.recent_tasks(),
                now: Local::now().naive_local(),
            };
            let result = runtime()?.block_on(service.add_task_classification(&request));
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
    }
    Ok(())
}
