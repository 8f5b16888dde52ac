//! One task per process run: start it everywhere, race the countdown
//! against the keyboard, settle Toggl and Slack exactly once.

use chrono::{DateTime, Duration, Utc};
use tokio::sync::{mpsc, watch};

use crate::config::Config;
use crate::keys;
use crate::render::{self, Bar};
use crate::slack::{Chat, Presence};
use crate::timer::Countdown;
use crate::toggl::{self, TimeEntry, TimeTracker};

const WORK_ICON: &str = ":tomato:";
const DINNER_DONE: &str = "Dinner finished! I am here now!";

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Mode {
    Work,
    Dinner,
}

#[derive(Debug, Clone)]
pub struct TaskSpec {
    pub name: String,
    pub minutes: i64,
    pub mode: Mode,
}

impl TaskSpec {
    /// Display label: the task name, or the configured dinner wording.
    /// A dinner task's `name` holds the kitchen channel instead.
    pub fn label<'a>(&'a self, config: &'a Config) -> &'a str {
        match self.mode {
            Mode::Work => &self.name,
            Mode::Dinner => &config.kitchen_message,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Trigger {
    Elapsed,
    Finish,
    Remove,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Phase {
    Idle,
    Running,
    Completing,
    Removing,
    Done,
}

/// The task state machine. Only `accept` leaves `Running`, and it flips
/// the phase before any remote call goes out, so a second trigger can
/// never double-fire the terminal effects.
struct Lifecycle {
    phase: Phase,
}

impl Lifecycle {
    fn new() -> Self {
        Lifecycle { phase: Phase::Idle }
    }

    fn start(&mut self) {
        if self.phase == Phase::Idle {
            self.phase = Phase::Running;
        }
    }

    /// Accepts the first trigger only; late or duplicate triggers are
    /// dropped.
    fn accept(&mut self, trigger: Trigger) -> bool {
        if self.phase != Phase::Running {
            return false;
        }
        self.phase = match trigger {
            Trigger::Remove => Phase::Removing,
            Trigger::Elapsed | Trigger::Finish => Phase::Completing,
        };
        true
    }

    fn terminate(&mut self) {
        self.phase = Phase::Done;
    }
}

/// What the start transition produced; the terminal transitions close
/// over it.
struct Started {
    entry: Option<TimeEntry>,
    thread_ts: Option<String>,
}

pub async fn run(
    task: TaskSpec,
    config: &Config,
    tracker: &dyn TimeTracker,
    chat: &dyn Chat,
    silent: bool,
) {
    let label = task.label(config).to_string();
    if task.minutes > 0 {
        render::title(&format!("{label} ({} min)", task.minutes));
    } else {
        render::title(&label);
    }

    let mut lifecycle = Lifecycle::new();
    let started = begin_task(&task, config, tracker, chat).await;
    lifecycle.start();

    let trigger = if task.minutes > 0 {
        match task.mode {
            Mode::Work => render::hint("[ctrl+c] finish  [ctrl+r] remove"),
            Mode::Dinner => render::hint("[ctrl+c] finish"),
        }
        await_trigger(&task, config).await
    } else {
        // Nothing to wait for; close the entry right away.
        Trigger::Elapsed
    };

    if !lifecycle.accept(trigger) {
        return;
    }

    match trigger {
        Trigger::Remove => remove_task(&started, tracker, chat).await,
        Trigger::Elapsed | Trigger::Finish => {
            complete_task(&task, &started, tracker, chat).await;
            if trigger == Trigger::Elapsed && task.minutes > 0 {
                crate::notify::send_completion(&label, task.minutes, silent);
            }
        }
    }
    lifecycle.terminate();

    match trigger {
        Trigger::Remove => println!("Removed '{label}'."),
        Trigger::Finish => println!("Finished '{label}' early."),
        Trigger::Elapsed if task.minutes > 0 => {
            println!("Finished '{label}' ({} min).", task.minutes)
        }
        Trigger::Elapsed => println!("Logged '{label}'."),
    }
}

/// Races the countdown against the keyboard. Both feed one channel;
/// whichever lands first decides, and the disarm flag silences the loser.
async fn await_trigger(task: &TaskSpec, config: &Config) -> Trigger {
    let total_secs = (task.minutes * 60) as u64;
    let (trigger_tx, mut trigger_rx) = mpsc::channel(2);
    let (disarm_tx, disarm_rx) = watch::channel(false);

    let raw = render::raw_on().is_ok();
    keys::listen(task.mode, trigger_tx.clone(), disarm_rx.clone());

    let bar = Bar::new(config.bar_width, total_secs);
    let countdown = Countdown::new(total_secs);
    tokio::spawn(async move {
        if countdown.run(&bar, disarm_rx).await {
            let _ = trigger_tx.send(Trigger::Elapsed).await;
        }
    });

    let trigger = trigger_rx.recv().await.unwrap_or(Trigger::Finish);
    let _ = disarm_tx.send(true);
    if raw {
        let _ = render::raw_off();
    }
    println!();
    trigger
}

async fn begin_task(
    task: &TaskSpec,
    config: &Config,
    tracker: &dyn TimeTracker,
    chat: &dyn Chat,
) -> Started {
    if task.minutes > 0 {
        let (text, icon) = away_status(task, config, Utc::now());
        if let Err(e) = chat.set_status(&text, &icon).await {
            render::warn(&format!("Could not set the Slack status: {e}"));
        }
        if let Err(e) = chat.set_presence(Presence::Away).await {
            render::warn(&format!("Could not set Slack presence: {e}"));
        }
    }

    match task.mode {
        Mode::Dinner => {
            let text = dinner_announcement(&task.name, task.minutes, Utc::now());
            let thread_ts = match chat.post(&task.name, &text, None).await {
                Ok(ts) => Some(ts),
                Err(e) => {
                    render::warn(&format!("Could not announce dinner: {e}"));
                    None
                }
            };
            Started {
                entry: None,
                thread_ts,
            }
        }
        Mode::Work => {
            let project_id = match tracker.projects().await {
                Ok(available) => {
                    let resolved = toggl::resolve_project(
                        &task.name,
                        &available,
                        &config.projects,
                        &config.default_project,
                    );
                    if resolved.fallback {
                        let names: Vec<&str> =
                            available.iter().map(|p| p.name.as_str()).collect();
                        render::warn(&format!(
                            "No project rule matched '{}', picked the default; add a rule for one of: {}",
                            task.name,
                            names.join(", ")
                        ));
                    }
                    resolved.project.map(|p| p.id)
                }
                Err(e) => {
                    render::warn(&format!("Could not list Toggl projects: {e}"));
                    None
                }
            };
            let entry = match tracker.start(&task.name, project_id).await {
                Ok(entry) => Some(entry),
                Err(e) => {
                    render::warn(&format!("Could not create the Toggl entry: {e}"));
                    None
                }
            };
            Started {
                entry,
                thread_ts: None,
            }
        }
    }
}

async fn complete_task(
    task: &TaskSpec,
    started: &Started,
    tracker: &dyn TimeTracker,
    chat: &dyn Chat,
) {
    match task.mode {
        Mode::Work => {
            if let Some(entry) = started.entry {
                if let Err(e) = tracker.finish(entry, override_seconds(task.minutes)).await {
                    render::warn(&format!("Could not finish the Toggl entry: {e}"));
                }
            }
        }
        Mode::Dinner => {
            if let Err(e) = chat
                .post(&task.name, DINNER_DONE, started.thread_ts.as_deref())
                .await
            {
                render::warn(&format!("Could not post the dinner reply: {e}"));
            }
        }
    }
    if task.minutes > 0 {
        clear_away(chat).await;
    }
}

async fn remove_task(started: &Started, tracker: &dyn TimeTracker, chat: &dyn Chat) {
    if let Some(entry) = started.entry {
        if let Err(e) = tracker.remove(entry).await {
            render::warn(&format!("Could not delete the Toggl entry: {e}"));
        }
    }
    // The discard path resets Slack even when no status was set.
    clear_away(chat).await;
}

async fn clear_away(chat: &dyn Chat) {
    if let Err(e) = chat.set_status("", "").await {
        render::warn(&format!("Could not clear the Slack status: {e}"));
    }
    if let Err(e) = chat.set_presence(Presence::Auto).await {
        render::warn(&format!("Could not restore Slack presence: {e}"));
    }
}

/// Wall-clock "HH:MM" at UTC+3, `minutes` from `now`; the status audience
/// reads Moscow time.
fn back_time(now: DateTime<Utc>, minutes: i64) -> String {
    (now + Duration::hours(3) + Duration::minutes(minutes))
        .format("%H:%M")
        .to_string()
}

fn away_status(task: &TaskSpec, config: &Config, now: DateTime<Utc>) -> (String, String) {
    let text = format!(
        "I'll be back at {}msk – {}",
        back_time(now, task.minutes),
        task.label(config)
    );
    let icon = match task.mode {
        Mode::Work => WORK_ICON.to_string(),
        Mode::Dinner => config.kitchen_icon.clone(),
    };
    (text, icon)
}

fn dinner_announcement(channel: &str, minutes: i64, now: DateTime<Utc>) -> String {
    format!(
        ":meat_on_bone: Dinner till {}msk from #{channel}",
        back_time(now, minutes)
    )
}

/// Runs without a timer keep a fixed duration instead of the measured
/// wall-clock seconds: zero, or the backdated `-t` minutes.
fn override_seconds(minutes: i64) -> Option<i64> {
    (minutes <= 0).then(|| -(minutes * 60))
}
