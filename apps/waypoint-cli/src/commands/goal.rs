// goal.rs — Goal subcommands: add, list, show, complete, fail, cancel, undo.

use std::path::Path;

use chrono::{DateTime, Utc};
use clap::Subcommand;
use uuid::Uuid;

use waypoint_graph::{AddGoal, Goal, GoalStatus};

use super::{load_graph, save_graph};

#[derive(Subcommand)]
pub enum GoalCommands {
    /// Add a goal to the graph.
    Add {
        /// What the goal is.
        description: String,
        /// Scheduling weight (higher runs first).
        #[arg(long, default_value_t = 1.0)]
        priority: f64,
        /// Deadline (RFC 3339); goals near it get a priority boost.
        #[arg(long)]
        deadline: Option<DateTime<Utc>>,
        /// Expiry (RFC 3339); past it the goal is auto-cancelled.
        #[arg(long)]
        expiry: Option<DateTime<Utc>>,
        /// Goals that must complete first (repeatable).
        #[arg(long = "depends-on")]
        depends_on: Vec<Uuid>,
        /// Who to notify on escalation.
        #[arg(long)]
        owner: Option<String>,
        /// Risk estimate in 0..=1.
        #[arg(long, default_value_t = 0.0)]
        risk: f64,
    },
    /// List goals, optionally filtered by status.
    List {
        /// Filter (pending, blocked, complete, failed, cancelled).
        #[arg(long)]
        status: Option<String>,
    },
    /// Explain one goal: status, blockers, and why.
    Show {
        /// Goal id.
        id: Uuid,
    },
    /// Mark a goal complete.
    Complete {
        id: Uuid,
        /// Feedback note recorded on the goal.
        #[arg(long)]
        feedback: Option<String>,
    },
    /// Mark a goal failed.
    Fail {
        id: Uuid,
        #[arg(long, default_value = "failed via cli")]
        reason: String,
    },
    /// Cancel a goal.
    Cancel {
        id: Uuid,
        #[arg(long, default_value = "cancelled via cli")]
        reason: String,
    },
    /// Remove the most recently added goal.
    Undo,
}

pub fn execute(cmd: &GoalCommands, path: &Path) -> anyhow::Result<()> {
    let graph = load_graph(path)?;

    match cmd {
        GoalCommands::Add {
            description,
            priority,
            deadline,
            expiry,
            depends_on,
            owner,
            risk,
        } => {
            let mut req = AddGoal::new(description)
                .priority(*priority)
                .risk(*risk)
                .depends_on(depends_on.iter().copied());
            if let Some(deadline) = deadline {
                req = req.deadline(*deadline);
            }
            if let Some(expiry) = expiry {
                req = req.expiry(*expiry);
            }
            if let Some(owner) = owner {
                req = req.owner(owner);
            }
            let id = graph.add_goal(req);
            let goal = graph
                .goal(id)
                .ok_or_else(|| anyhow::anyhow!("goal vanished after insert"))?;
            println!("added {} [{}] {}", id, goal.status, goal.description);
        }
        GoalCommands::List { status } => {
            let filter = status.as_deref().map(parse_status).transpose()?;
            for goal in graph.all_goals() {
                if filter.is_some_and(|f| goal.status != f) {
                    continue;
                }
                print_goal_line(&goal);
            }
            return Ok(()); // read-only, skip the save
        }
        GoalCommands::Show { id } => {
            let explanation = graph
                .explain_goal(*id)
                .ok_or_else(|| anyhow::anyhow!("no goal with id {id}"))?;
            println!("{}", serde_json::to_string_pretty(&explanation)?);
            return Ok(());
        }
        GoalCommands::Complete { id, feedback } => {
            report(graph.complete_goal(*id, feedback.as_deref()), *id, "completed")?;
        }
        GoalCommands::Fail { id, reason } => {
            report(graph.fail_goal(*id, reason), *id, "failed")?;
        }
        GoalCommands::Cancel { id, reason } => {
            report(graph.cancel_goal(*id, reason), *id, "cancelled")?;
        }
        GoalCommands::Undo => match graph.undo_last() {
            Some(goal) => println!("removed {} {}", goal.id, goal.description),
            None => println!("nothing to undo"),
        },
    }

    save_graph(&graph, path)
}

fn report(changed: bool, id: Uuid, verb: &str) -> anyhow::Result<()> {
    if changed {
        println!("{verb} {id}");
        Ok(())
    } else {
        anyhow::bail!("goal {id} not found or already terminal")
    }
}

fn print_goal_line(goal: &Goal) {
    let blockers = if goal.blocked_by.is_empty() {
        String::new()
    } else {
        format!(" (blocked by {})", goal.blocked_by.len())
    };
    println!(
        "{} [{}] p={:.2} {}{}",
        goal.id, goal.status, goal.priority, goal.description, blockers
    );
}

fn parse_status(s: &str) -> anyhow::Result<GoalStatus> {
    serde_json::from_value(serde_json::Value::String(s.to_string()))
        .map_err(|_| anyhow::anyhow!("unknown status '{s}'"))
}
