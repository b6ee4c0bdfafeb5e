use std::io::Write;

use clap::{Args, Subcommand};
use studyflow_core::driver::{self, TimerHandle, TimerOp};
use studyflow_core::storage::TimerConfig;
use studyflow_core::timer::format_clock;
use studyflow_core::{
    Config, Event, LogNotifier, SilentNotifier, SystemClock, TimerEngine, TimerSettings,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast::{self, error::RecvError, error::TryRecvError};
use tracing::{debug, info};

use crate::notifier::TerminalNotifier;

const HELP: &str = "commands: toggle|t start pause reset skip|s bg fg stats-reset status quit|q";

#[derive(Subcommand)]
pub enum TimerAction {
    /// Run an interactive timer session driven by stdin commands
    Run {
        /// Print events and snapshots as JSON lines
        #[arg(long)]
        json: bool,
        #[command(flatten)]
        overrides: Overrides,
    },
    /// Print the state of a fresh timer built from the config
    Preview {
        #[command(flatten)]
        overrides: Overrides,
    },
}

/// Per-run overrides of the configured timer values.
#[derive(Args, Debug, Default)]
pub struct Overrides {
    /// Focus duration in minutes
    #[arg(long)]
    focus: Option<u32>,
    /// Short break duration in minutes
    #[arg(long)]
    short_break: Option<u32>,
    /// Long break duration in minutes
    #[arg(long)]
    long_break: Option<u32>,
    /// Focus sessions per day
    #[arg(long)]
    goal: Option<u32>,
}

impl Overrides {
    fn apply(&self, mut timer: TimerConfig) -> TimerConfig {
        if let Some(v) = self.focus {
            timer.focus_minutes = v;
        }
        if let Some(v) = self.short_break {
            timer.short_break_minutes = v;
        }
        if let Some(v) = self.long_break {
            timer.long_break_minutes = v;
        }
        if let Some(v) = self.goal {
            timer.daily_goal = v;
        }
        timer
    }
}

/// A line typed by the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Input {
    Op(TimerOp),
    Status,
    Help,
    Quit,
}

fn parse_input(line: &str) -> Result<Input, String> {
    let input = match line.trim() {
        "toggle" | "t" => Input::Op(TimerOp::Toggle),
        "start" => Input::Op(TimerOp::Start),
        "pause" => Input::Op(TimerOp::Pause),
        "reset" => Input::Op(TimerOp::Reset),
        "skip" | "s" => Input::Op(TimerOp::Skip),
        "bg" => Input::Op(TimerOp::Suspend),
        "fg" => Input::Op(TimerOp::Resume),
        "stats-reset" => Input::Op(TimerOp::ResetStatistics),
        "status" => Input::Status,
        "help" | "?" => Input::Help,
        "quit" | "q" | "exit" => Input::Quit,
        other => return Err(format!("unknown command: {other:?} ({HELP})")),
    };
    Ok(input)
}

fn load_settings(
    overrides: &Overrides,
) -> Result<(Config, TimerSettings), Box<dyn std::error::Error>> {
    let config = Config::load()?;
    let timer = overrides.apply(config.timer.clone());
    let settings = TimerSettings::try_from(&timer)?;
    Ok((config, settings))
}

pub fn run(action: TimerAction) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        TimerAction::Preview { overrides } => {
            let (_, settings) = load_settings(&overrides)?;
            let engine = TimerEngine::new(settings, SystemClock, SilentNotifier);
            println!("{}", serde_json::to_string_pretty(&engine.snapshot())?);
            Ok(())
        }
        TimerAction::Run { json, overrides } => {
            let (config, settings) = load_settings(&overrides)?;
            let engine = if config.notifications.enabled {
                TimerEngine::new(
                    settings,
                    SystemClock,
                    TerminalNotifier::new(config.notifications.bell),
                )
            } else {
                TimerEngine::new(settings, SystemClock, LogNotifier)
            };
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()?;
            runtime.block_on(session(engine, json))
        }
    }
}

async fn session(engine: TimerEngine, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let (handle, task) = driver::spawn(engine);
    let mut events = handle.subscribe();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut view = View { json };

    info!("timer session started");
    if !json {
        println!("{HELP}");
    }
    view.snapshot(&handle).await?;

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                if line.trim().is_empty() {
                    continue;
                }
                match parse_input(&line) {
                    Ok(Input::Quit) => break,
                    Ok(Input::Help) => println!("{HELP}"),
                    Ok(Input::Status) => view.snapshot(&handle).await?,
                    Ok(Input::Op(op)) => {
                        if handle.control(op).await?.is_none() {
                            debug!(?op, "command had no effect");
                        }
                        // The actor publishes before replying, so the
                        // command's own event is already queued.
                        view.drain(&mut events)?;
                    }
                    Err(msg) => eprintln!("{msg}"),
                }
            }
            event = events.recv() => match event {
                Ok(event) => view.event(&event)?,
                Err(RecvError::Lagged(missed)) => debug!(missed, "event receiver lagged"),
                Err(RecvError::Closed) => break,
            },
        }
    }

    view.drain(&mut events)?;
    view.snapshot(&handle).await?;
    handle.shutdown().await?;
    task.await?;
    info!("timer session ended");
    Ok(())
}

/// Renders events and snapshots to stdout.
struct View {
    json: bool,
}

impl View {
    fn drain(&mut self, events: &mut broadcast::Receiver<Event>) -> std::io::Result<()> {
        loop {
            match events.try_recv() {
                Ok(event) => self.event(&event)?,
                Err(TryRecvError::Lagged(_)) => continue,
                Err(_) => return Ok(()),
            }
        }
    }

    fn event(&mut self, event: &Event) -> std::io::Result<()> {
        let mut out = std::io::stdout().lock();
        if self.json {
            let line = serde_json::to_string(event).map_err(std::io::Error::other)?;
            return writeln!(out, "{line}");
        }
        match event {
            Event::Ticked {
                phase,
                remaining_ms,
                ..
            } => {
                write!(out, "\r{phase:<11} {}", format_clock(*remaining_ms))?;
                return out.flush();
            }
            Event::TimerStarted {
                phase,
                remaining_ms,
                ..
            } => writeln!(out, "\r{phase} started ({} left)", format_clock(*remaining_ms)),
            Event::TimerPaused { remaining_ms, .. } => {
                writeln!(out, "\rpaused at {}", format_clock(*remaining_ms))
            }
            Event::TimerReset {
                phase,
                remaining_ms,
                ..
            } => writeln!(out, "\r{phase} reset to {}", format_clock(*remaining_ms)),
            Event::PhaseCompleted {
                completed,
                next,
                completed_focus_count,
                skipped,
                ..
            } => {
                let how = if *skipped { "skipped" } else { "complete" };
                writeln!(
                    out,
                    "\r{completed} {how} -> {next} (focus sessions: {completed_focus_count})"
                )
            }
            Event::TimerSuspended { .. } => writeln!(out, "\rsuspended"),
            Event::TimerResumed {
                gap_ms,
                remaining_ms,
                ..
            } => writeln!(
                out,
                "\rresumed after {}s, {} left",
                gap_ms / 1000,
                format_clock(*remaining_ms)
            ),
            Event::StatisticsReset { .. } => writeln!(out, "\rstatistics reset"),
            Event::SettingsApplied { remaining_ms, .. } => {
                writeln!(out, "\rsettings applied, {} left", format_clock(*remaining_ms))
            }
        }
    }

    async fn snapshot(&mut self, handle: &TimerHandle) -> Result<(), Box<dyn std::error::Error>> {
        let snap = handle.snapshot().await?;
        if self.json {
            println!("{}", serde_json::to_string(&snap)?);
        } else {
            println!(
                "{} {} [{:?}] focus {}/{} total {}",
                snap.phase_label,
                snap.formatted_remaining,
                snap.state,
                snap.completed_focus_count,
                snap.daily_goal,
                snap.formatted_total_focus
            );
        }
        Ok(())
    }
}
