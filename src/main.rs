mod config;
mod error;
mod keys;
mod notify;
mod render;
mod session;
mod slack;
mod timer;
mod toggl;

use clap::Parser;

use crate::session::{Mode, TaskSpec};

#[derive(Parser)]
#[command(name = "zt", about = "Track a task in Toggl and mirror it to Slack", version)]
struct Cli {
    /// Task name, e.g. CSSSR-1234
    #[arg(short, long)]
    name: Option<String>,

    /// Duration in minutes; zero or negative logs the task without a timer
    #[arg(short, long, default_value_t = 25, allow_negative_numbers = true)]
    time: i64,

    /// Take a dinner break instead, announced in this channel
    #[arg(short, long)]
    kitchen: Option<String>,

    /// Only add the entry (shorthand note; a non-positive -t does this)
    #[arg(short, long)]
    add: bool,

    /// Suppress the desktop notification
    #[arg(short, long)]
    silent: bool,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match config::Config::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!(
                "Could not load {}: {e}",
                config::Config::config_path().display()
            );
            std::process::exit(1);
        }
    };

    if config.toggl_token.is_empty() {
        eprintln!("Add toggl_token to {}", config::Config::config_path().display());
        eprintln!("Get it at https://track.toggl.com/profile");
        std::process::exit(1);
    }
    if config.slack_token.is_empty() {
        eprintln!("Add slack_token to {}", config::Config::config_path().display());
        eprintln!("Get it at https://api.slack.com/apps");
        std::process::exit(1);
    }
    let workspace_id = match config.workspace_id() {
        Ok(id) => id,
        Err(e) => {
            eprintln!("{e}");
            eprintln!(
                "Set toggl_workspace in {}",
                config::Config::config_path().display()
            );
            std::process::exit(1);
        }
    };

    if cli.add && cli.time > 0 {
        render::warn("--add does nothing on its own; pass a zero or negative -t to log without a timer");
    }

    // A kitchen channel selects dinner mode; otherwise a task name is required.
    let kitchen = cli.kitchen.as_deref().filter(|channel| !channel.is_empty());
    let task = match (kitchen, cli.name.as_deref()) {
        (Some(channel), _) => TaskSpec {
            name: channel.to_string(),
            minutes: cli.time,
            mode: Mode::Dinner,
        },
        (None, Some(name)) => TaskSpec {
            name: name.to_string(),
            minutes: cli.time,
            mode: Mode::Work,
        },
        (None, None) => {
            eprintln!("Usage: zt -n <task> [-t <minutes>] or zt -k <channel>");
            eprintln!("Examples: zt -n CSSSR-1234, zt -n CSSSR-1234 -t 45, zt -k kitchen");
            std::process::exit(1);
        }
    };

    let tracker = toggl::Toggl::new(&config.toggl_token, workspace_id);
    let chat = slack::Slack::new(&config.slack_token);
    session::run(task, &config, &tracker, &chat, cli.silent).await;
}
