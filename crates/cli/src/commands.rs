//! CLI commands

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::Subcommand;
use std::io::{BufRead, Write};
use taskmate_client::types::{NewTask, Priority, Tag, Task, TaskUpdate};
use taskmate_client::{ApiClient, Board, Filter, Navigator, SortKey};
use tracing::info;

/// Reports the transition to the logged-out state on the terminal
pub struct TerminalNavigator;

impl Navigator for TerminalNavigator {
    fn navigate(&self, _path: &str) {
        eprintln!("Signed out. Run `taskmate login` to sign in again.");
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Log in and store the session
    Login {
        username: String,

        /// Password (prompted for when omitted)
        #[arg(long, env = "TASKMATE_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },

    /// Create an account
    Register {
        username: String,

        /// Password (prompted for when omitted)
        #[arg(long, env = "TASKMATE_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },

    /// Forget the stored session
    Logout,

    /// Show the logged in user
    Whoami,

    /// Manage tasks
    Tasks {
        #[command(subcommand)]
        command: TaskCommands,
    },
}

#[derive(Subcommand)]
pub enum TaskCommands {
    /// List tasks
    List {
        /// Show all, completed or pending tasks
        #[arg(long, default_value_t = Filter::All)]
        filter: Filter,

        /// Sort by deadline, priority or title
        #[arg(long)]
        sort: Option<SortKey>,
    },

    /// Add a task
    Add {
        title: String,

        /// Due date (YYYY-MM-DD)
        #[arg(long)]
        deadline: Option<NaiveDate>,

        #[arg(long, default_value_t = Priority::Medium)]
        priority: Priority,

        #[arg(long, default_value_t = Tag::Personal)]
        tag: Tag,
    },

    /// Change a task's title or deadline
    Edit {
        id: u64,

        #[arg(long)]
        title: Option<String>,

        /// New due date (YYYY-MM-DD)
        #[arg(long, conflicts_with = "clear_deadline")]
        deadline: Option<NaiveDate>,

        /// Remove the due date
        #[arg(long)]
        clear_deadline: bool,
    },

    /// Mark a task completed
    Done { id: u64 },

    /// Mark a task pending again
    Undo { id: u64 },

    /// Delete a task
    Rm { id: u64 },
}

impl Commands {
    pub async fn execute(self, client: &ApiClient) -> Result<()> {
        match self {
            Commands::Login { username, password } => {
                let password = password_or_prompt(password)?;
                client.login(&username, &password).await?;
                println!("Logged in as {username}");
                Ok(())
            }
            Commands::Register { username, password } => {
                let password = password_or_prompt(password)?;
                let response = client.register(&username, &password).await?;
                println!("{}", response.message);
                println!("Run `taskmate login {username}` to sign in.");
                Ok(())
            }
            Commands::Logout => {
                client.logout();
                Ok(())
            }
            Commands::Whoami => {
                if !client.is_authenticated() {
                    anyhow::bail!("Not logged in. Run `taskmate login` first.");
                }
                let me = client.me().await?;
                println!("{} (id {})", me.username, me.id);
                Ok(())
            }
            Commands::Tasks { command } => command.execute(client).await,
        }
    }
}

impl TaskCommands {
    pub async fn execute(self, client: &ApiClient) -> Result<()> {
        match self {
            TaskCommands::List { filter, sort } => {
                let mut board = Board::new(client.list_tasks().await?);
                if let Some(key) = sort {
                    board.sort_by(key);
                }

                let mut shown = 0;
                for task in board.visible(filter) {
                    println!("{}", render(task));
                    shown += 1;
                }
                if shown == 0 {
                    println!("No tasks under \"{filter}\" filter");
                }
                Ok(())
            }
            TaskCommands::Add {
                title,
                deadline,
                priority,
                tag,
            } => {
                let task = client
                    .create_task(&NewTask {
                        title,
                        deadline,
                        priority,
                        tag,
                    })
                    .await?;
                info!(id = task.id, "Task created");
                println!("Added {}", render(&task));
                Ok(())
            }
            TaskCommands::Edit {
                id,
                title,
                deadline,
                clear_deadline,
            } => {
                let current = client
                    .get_task(id)
                    .await
                    .with_context(|| format!("Failed to load task #{id}"))?;
                let update = TaskUpdate {
                    title: title.unwrap_or(current.title),
                    deadline: if clear_deadline {
                        None
                    } else {
                        deadline.or(current.deadline)
                    },
                    priority: None,
                    tag: None,
                };
                let task = client.update_task(id, &update).await?;
                println!("Updated {}", render(&task));
                Ok(())
            }
            TaskCommands::Done { id } => {
                client.set_completed(id, true).await?;
                println!("Marked #{id} as completed");
                Ok(())
            }
            TaskCommands::Undo { id } => {
                client.set_completed(id, false).await?;
                println!("Marked #{id} as pending");
                Ok(())
            }
            TaskCommands::Rm { id } => {
                client.delete_task(id).await?;
                println!("Deleted #{id}");
                Ok(())
            }
        }
    }
}

fn render(task: &Task) -> String {
    let check = if task.completed { "x" } else { " " };
    let mut line = format!(
        "[{check}] #{} {} ({}, {})",
        task.id, task.title, task.priority, task.tag
    );
    if let Some(deadline) = task.deadline {
        line.push_str(&format!(" due {deadline}"));
    }
    line
}

fn password_or_prompt(password: Option<String>) -> Result<String> {
    if let Some(password) = password {
        return Ok(password);
    }

    eprint!("Password: ");
    std::io::stderr().flush()?;
    let mut line = String::new();
    std::io::stdin()
        .lock()
        .read_line(&mut line)
        .context("Failed to read password")?;
    let password = line.trim_end_matches(['\r', '\n']).to_string();
    if password.is_empty() {
        anyhow::bail!("Password must not be empty");
    }
    Ok(password)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_marks_completion_and_deadline() {
        let task = Task {
            id: 3,
            title: "water plants".into(),
            completed: true,
            deadline: NaiveDate::from_ymd_opt(2025, 6, 1),
            priority: Priority::Low,
            tag: Tag::Personal,
        };
        assert_eq!(
            render(&task),
            "[x] #3 water plants (low, personal) due 2025-06-01"
        );
    }

    #[test]
    fn explicit_password_skips_prompt() {
        assert_eq!(password_or_prompt(Some("pw".into())).unwrap(), "pw");
    }
}
