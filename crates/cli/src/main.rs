//! taskrank CLI - rank, score and inspect task snapshots.

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use clap::{ArgAction, Args, Parser, Subcommand};
use serde_json::json;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use taskrank_core::{ScoredTask, Task, TaskId, TaskStatus, TaskUpdate, Time};
use taskrank_engine::{CascadeMode, EngineConfig, Resolution, Scheduler, TaskBook};
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "taskrank")]
#[command(about = "Task prioritization and dependency scheduling", long_about = None)]
struct Cli {
    /// Engine configuration file (JSON)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Evaluation instant (RFC 3339), defaults to the current time
    #[arg(long, global = true, value_parser = parse_time)]
    now: Option<Time>,

    /// Log more (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Rank every task by priority
    Rank {
        /// Snapshot file (JSON array of tasks)
        file: PathBuf,
        /// Show at most this many tasks
        #[arg(long)]
        limit: Option<usize>,
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Show the highest-ranked pending or in-progress tasks
    Top {
        /// Snapshot file (JSON array of tasks)
        file: PathBuf,
        /// Number of tasks (defaults to the configured top limit)
        #[arg(long)]
        limit: Option<usize>,
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Show score, tier and breakdown for one task
    Score {
        /// Snapshot file (JSON array of tasks)
        file: PathBuf,
        /// Task ID
        id: String,
    },
    /// Print the dependency graph as JSON
    Graph {
        /// Snapshot file (JSON array of tasks)
        file: PathBuf,
        /// Include title, status and score on each node
        #[arg(long)]
        enriched: bool,
    },
    /// Print task ids with dependencies first
    Order {
        /// Snapshot file (JSON array of tasks)
        file: PathBuf,
    },
    /// Mark a task completed and print the rescored tasks
    Complete {
        /// Snapshot file (JSON array of tasks)
        file: PathBuf,
        /// Task ID
        id: String,
        /// Rescore everything downstream, not just direct dependents
        #[arg(long)]
        transitive: bool,
    },
    /// Mark a task pending again and print the rescored tasks
    Reopen {
        /// Snapshot file (JSON array of tasks)
        file: PathBuf,
        /// Task ID
        id: String,
        /// Rescore everything downstream, not just direct dependents
        #[arg(long)]
        transitive: bool,
    },
    /// Edit task fields and print the rescored tasks
    Update {
        /// Snapshot file (JSON array of tasks)
        file: PathBuf,
        /// Task ID
        id: String,
        #[command(flatten)]
        edits: EditArgs,
        /// Rescore everything downstream, not just direct dependents
        #[arg(long)]
        transitive: bool,
    },
    /// Delete a task and print the rescored dependents
    Remove {
        /// Snapshot file (JSON array of tasks)
        file: PathBuf,
        /// Task ID
        id: String,
    },
    /// Check records, duplicate ids and circular dependencies
    Validate {
        /// Snapshot file (JSON array of tasks)
        file: PathBuf,
    },
}

/// Field edits for `update`; omitted flags leave the field unchanged.
#[derive(Args, Debug, Default)]
struct EditArgs {
    /// New title
    #[arg(long)]
    title: Option<String>,
    /// New category
    #[arg(long)]
    category: Option<String>,
    /// New deadline (RFC 3339)
    #[arg(long, value_parser = parse_time)]
    deadline: Option<Time>,
    /// New urgency (1-5)
    #[arg(long)]
    urgency: Option<u8>,
    /// New importance (1-5)
    #[arg(long)]
    importance: Option<u8>,
    /// New difficulty (1-5)
    #[arg(long)]
    difficulty: Option<u8>,
    /// New status (pending, in-progress, completed, cancelled)
    #[arg(long)]
    status: Option<TaskStatus>,
    /// Replace the dependency list (repeatable)
    #[arg(long = "depends-on", value_name = "ID")]
    depends_on: Vec<String>,
    /// Remove every dependency
    #[arg(long, conflicts_with = "depends_on")]
    no_dependencies: bool,
}

impl EditArgs {
    fn into_update(self) -> Result<TaskUpdate> {
        let dependencies = if self.no_dependencies {
            Some(Vec::new())
        } else if self.depends_on.is_empty() {
            None
        } else {
            Some(
                self.depends_on
                    .iter()
                    .map(|id| parse_id(id))
                    .collect::<Result<Vec<_>>>()?,
            )
        };

        Ok(TaskUpdate {
            title: self.title,
            category: self.category,
            deadline: self.deadline,
            urgency: self.urgency,
            importance: self.importance,
            difficulty: self.difficulty,
            status: self.status,
            dependencies,
            ..TaskUpdate::default()
        })
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = match &cli.config {
        Some(path) => EngineConfig::load(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => EngineConfig::default(),
    };
    let now = cli.now.unwrap_or_else(Utc::now);
    let scheduler = Scheduler::new(&config);
    debug!("Evaluating at {}", now);

    match cli.command {
        Commands::Rank { file, limit, json } => {
            let tasks = load_snapshot(&file)?;
            let mut ranked = scheduler.schedule_greedy(&tasks, now);
            if let Some(limit) = limit {
                ranked.truncate(limit);
            }
            print_ranked(&ranked, json)?;
        }
        Commands::Top { file, limit, json } => {
            let tasks = load_snapshot(&file)?;
            print_ranked(&scheduler.top_tasks(&tasks, limit, now), json)?;
        }
        Commands::Score { file, id } => {
            let tasks = load_snapshot(&file)?;
            let id = parse_id(&id)?;
            let Some(task) = tasks.iter().find(|t| t.id == id) else {
                bail!("Task not found: {}", id);
            };

            let assessment = scheduler.assess(task, &tasks, now);
            let blocked_by = match &assessment.resolution {
                Resolution::Ready => Vec::new(),
                Resolution::Blocked(ids) => ids.clone(),
            };
            print_json(&json!({
                "id": task.id,
                "title": task.title,
                "priority_score": assessment.priority.score,
                "priority_tier": assessment.priority.tier,
                "breakdown": assessment.priority.breakdown,
                "blocked_by": blocked_by,
            }))?;
        }
        Commands::Graph { file, enriched } => {
            let tasks = load_snapshot(&file)?;
            if enriched {
                print_json(&scheduler.graph_view(&tasks, now))?;
            } else {
                print_json(&scheduler.build_task_dag(&tasks))?;
            }
        }
        Commands::Order { file } => {
            let tasks = load_snapshot(&file)?;
            for id in scheduler.topological_order(&tasks) {
                println!("{}", id);
            }
        }
        Commands::Complete { file, id, transitive } => {
            let result = open_book(&file, &config, transitive)?.set_status(
                &parse_id(&id)?,
                TaskStatus::Completed,
                now,
            )?;
            print_json(&result)?;
        }
        Commands::Reopen { file, id, transitive } => {
            let result = open_book(&file, &config, transitive)?.set_status(
                &parse_id(&id)?,
                TaskStatus::Pending,
                now,
            )?;
            print_json(&result)?;
        }
        Commands::Update {
            file,
            id,
            edits,
            transitive,
        } => {
            let update = edits.into_update()?;
            if update.is_empty() {
                bail!("Nothing to update: pass at least one field flag");
            }
            let result =
                open_book(&file, &config, transitive)?.update(&parse_id(&id)?, update, now)?;
            print_json(&result)?;
        }
        Commands::Remove { file, id } => {
            let (removed, result) = open_book(&file, &config, false)?.remove(&parse_id(&id)?, now)?;
            print_json(&json!({
                "removed": removed.id,
                "changed": result.changed,
            }))?;
        }
        Commands::Validate { file } => {
            let tasks = load_snapshot(&file)?;
            let problems = validate_snapshot(&tasks, &scheduler);
            if !problems.is_empty() {
                for problem in &problems {
                    println!("  {}", problem);
                }
                bail!("{} problem(s) in {}", problems.len(), file.display());
            }
            println!("{} tasks OK", tasks.len());
        }
    }

    Ok(())
}

fn init_tracing(verbose: u8) {
    let filter = match verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn parse_time(s: &str) -> Result<Time, chrono::ParseError> {
    DateTime::parse_from_rfc3339(s).map(|t| t.with_timezone(&Utc))
}

fn parse_id(s: &str) -> Result<TaskId> {
    s.parse()
        .with_context(|| format!("Invalid task ID: {}", s))
}

fn load_snapshot(path: &Path) -> Result<Vec<Task>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let tasks: Vec<Task> = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))?;
    debug!("Loaded {} tasks from {}", tasks.len(), path.display());
    Ok(tasks)
}

fn open_book(path: &Path, config: &EngineConfig, transitive: bool) -> Result<TaskBook> {
    let book = TaskBook::new(load_snapshot(path)?, config)?;
    Ok(if transitive {
        book.with_cascade(CascadeMode::Transitive)
    } else {
        book
    })
}

fn validate_snapshot(tasks: &[Task], scheduler: &Scheduler) -> Vec<String> {
    let mut problems = Vec::new();

    let mut seen = HashSet::new();
    for task in tasks {
        if !seen.insert(&task.id) {
            problems.push(format!("{}: duplicate id", task.id));
        }
        if let Err(e) = task.validate() {
            problems.push(format!("{}: {}", task.id, e));
        }
    }

    for edge in scheduler.build_graph(tasks).refused {
        problems.push(format!("{} -> {}: circular dependency", edge.from, edge.to));
    }

    problems
}

fn print_ranked(ranked: &[ScoredTask], json: bool) -> Result<()> {
    if json {
        return print_json(ranked);
    }

    println!("Tasks ({})", ranked.len());
    for (rank, scored) in ranked.iter().enumerate() {
        println!(
            "  {:>3}. {:>3} | {:<8} | {:<11} | {} - {}",
            rank + 1,
            scored.priority_score,
            scored.priority_tier.as_str().to_uppercase(),
            scored.task.status.as_str(),
            scored.task.id,
            scored.task.title,
        );
    }
    Ok(())
}

fn print_json<T: serde::Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use std::io::Write;

    const A: &str = "01HZX3T8Q4M6V2N9K5R7B1C3D5";
    const C: &str = "01HZX3T8Q4M6V2N9K5R7B1C3D7";

    fn snapshot_json() -> String {
        format!(
            r#"[
                {{"id": "{A}", "title": "A", "deadline": "2025-06-01T12:00:00Z",
                  "urgency": 5, "importance": 5, "difficulty": 1}},
                {{"id": "{C}", "title": "C", "deadline": "2025-06-04T12:00:00Z",
                  "dependencies": ["{A}"]}}
            ]"#
        )
    }

    fn write_snapshot(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_global_flags() {
        let cli = Cli::try_parse_from([
            "taskrank",
            "-vv",
            "--now",
            "2025-06-01T12:00:00Z",
            "complete",
            "tasks.json",
            A,
            "--transitive",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.now, Some(parse_time("2025-06-01T12:00:00+00:00").unwrap()));
        assert!(matches!(cli.command, Commands::Complete { transitive: true, .. }));
    }

    #[test]
    fn test_parse_time_rejects_garbage() {
        assert!(parse_time("tomorrow").is_err());
    }

    #[test]
    fn test_parse_id() {
        assert_eq!(parse_id(A).unwrap().to_string(), A);
        assert_eq!(parse_id("64f1c2a9e4b0a1b2c3d4e5f6").unwrap().as_str(), "64f1c2a9e4b0a1b2c3d4e5f6");
        assert!(parse_id("  ").is_err());
    }

    #[test]
    fn test_load_snapshot_applies_defaults() {
        let file = write_snapshot(&snapshot_json());
        let tasks = load_snapshot(file.path()).unwrap();

        assert_eq!(tasks.len(), 2);
        assert_eq!(tasks[1].urgency, 3);
        assert_eq!(tasks[1].status, TaskStatus::Pending);
        assert_eq!(tasks[1].category, "General");
        assert_eq!(tasks[1].dependencies, vec![tasks[0].id.clone()]);
    }

    #[test]
    fn test_load_snapshot_errors() {
        let missing = load_snapshot(Path::new("/nonexistent/tasks.json")).unwrap_err();
        assert!(missing.to_string().contains("Failed to read"));

        let file = write_snapshot("{not json");
        let bad = load_snapshot(file.path()).unwrap_err();
        assert!(bad.to_string().contains("Failed to parse"));
    }

    #[test]
    fn test_open_book_complete() {
        let file = write_snapshot(&snapshot_json());
        let mut book = open_book(file.path(), &EngineConfig::default(), true).unwrap();
        assert_eq!(book.cascade(), CascadeMode::Transitive);

        let now = parse_time("2025-06-01T12:00:00Z").unwrap();
        let result = book
            .set_status(&parse_id(A).unwrap(), TaskStatus::Completed, now)
            .unwrap();
        let c = result.get(&parse_id(C).unwrap()).unwrap();
        assert_eq!(c.priority_score, 65);
    }

    #[test]
    fn test_validate_snapshot_clean() {
        let file = write_snapshot(&snapshot_json());
        let tasks = load_snapshot(file.path()).unwrap();
        assert!(validate_snapshot(&tasks, &Scheduler::default()).is_empty());
    }

    #[test]
    fn test_validate_snapshot_reports_problems() {
        let content = format!(
            r#"[
                {{"id": "{A}", "title": "A", "deadline": "2025-06-01T12:00:00Z",
                  "urgency": 9, "dependencies": ["{C}"]}},
                {{"id": "{C}", "title": "C", "deadline": "2025-06-04T12:00:00Z",
                  "dependencies": ["{A}"]}},
                {{"id": "{C}", "title": "C again", "deadline": "2025-06-04T12:00:00Z"}}
            ]"#
        );
        let file = write_snapshot(&content);
        let tasks = load_snapshot(file.path()).unwrap();
        let problems = validate_snapshot(&tasks, &Scheduler::default());

        assert_eq!(problems.len(), 3);
        assert!(problems.iter().any(|p| p.contains("duplicate id")));
        assert!(problems.iter().any(|p| p.contains("urgency")));
        assert!(problems.iter().any(|p| p.contains("circular dependency")));
    }

    #[test]
    fn test_object_id_snapshot() {
        let content = r#"[
            {"_id": "64f1c2a9e4b0a1b2c3d4e5f6", "title": "A", "deadline": "2025-06-01T12:00:00Z",
             "urgency": 5, "importance": 5, "difficulty": 1},
            {"_id": "64f1c2a9e4b0a1b2c3d4e5f8", "title": "C", "deadline": "2025-06-04T12:00:00Z",
             "dependencies": ["64f1c2a9e4b0a1b2c3d4e5f6"]}
        ]"#;
        let file = write_snapshot(content);
        let tasks = load_snapshot(file.path()).unwrap();
        let scheduler = Scheduler::default();
        let now = parse_time("2025-06-01T12:00:00Z").unwrap();

        let ranked = scheduler.schedule_greedy(&tasks, now);
        assert_eq!(ranked[0].id().as_str(), "64f1c2a9e4b0a1b2c3d4e5f6");
        assert_eq!(ranked[1].priority_score, 45);
        assert!(validate_snapshot(&tasks, &scheduler).is_empty());
        assert!(print_ranked(&ranked, true).is_ok());
    }

    #[test]
    fn test_print_json_output() {
        let file = write_snapshot(&snapshot_json());
        let tasks = load_snapshot(file.path()).unwrap();
        let scheduler = Scheduler::default();
        let now = parse_time("2025-06-01T12:00:00Z").unwrap();

        assert!(print_json(&scheduler.graph_view(&tasks, now)).is_ok());
        assert!(print_ranked(&scheduler.top_tasks(&tasks, None, now), false).is_ok());
    }

    #[test]
    fn test_parse_update_flags() {
        let cli = Cli::try_parse_from([
            "taskrank",
            "update",
            "tasks.json",
            C,
            "--urgency",
            "5",
            "--status",
            "in-progress",
            "--depends-on",
            A,
            "--depends-on",
            "64f1c2a9e4b0a1b2c3d4e5f6",
        ])
        .unwrap();
        let Commands::Update { edits, transitive, .. } = cli.command else {
            panic!("expected update");
        };
        assert!(!transitive);

        let update = edits.into_update().unwrap();
        assert_eq!(update.urgency, Some(5));
        assert_eq!(update.status, Some(TaskStatus::InProgress));
        assert!(update.title.is_none());
        let deps: Vec<_> = update.dependencies.unwrap().iter().map(|d| d.to_string()).collect();
        assert_eq!(deps, vec![A, "64f1c2a9e4b0a1b2c3d4e5f6"]);
    }

    #[test]
    fn test_update_flags_conflict_and_clear() {
        assert!(Cli::try_parse_from([
            "taskrank",
            "update",
            "tasks.json",
            C,
            "--depends-on",
            A,
            "--no-dependencies",
        ])
        .is_err());

        let edits = EditArgs {
            no_dependencies: true,
            ..EditArgs::default()
        };
        assert_eq!(edits.into_update().unwrap().dependencies, Some(Vec::new()));
        assert!(EditArgs::default().into_update().unwrap().is_empty());
    }

    #[test]
    fn test_open_book_update() {
        let file = write_snapshot(&snapshot_json());
        let mut book = open_book(file.path(), &EngineConfig::default(), false).unwrap();
        let now = parse_time("2025-06-01T12:00:00Z").unwrap();

        let edits = EditArgs {
            no_dependencies: true,
            ..EditArgs::default()
        };
        let result = book
            .update(&parse_id(C).unwrap(), edits.into_update().unwrap(), now)
            .unwrap();
        assert_eq!(result.changed.len(), 1);
        assert_eq!(result.get(&parse_id(C).unwrap()).unwrap().priority_score, 65);
    }
}
