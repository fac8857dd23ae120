use std::io::BufRead;

use breathwork_core::storage::Database;
use breathwork_core::{
    Config, Control, Event, LibraryError, PatternLibrary, SavedSessionResolver, SessionDriver,
    SessionEngine, SessionHistory, SessionSummary,
};
use chrono::Utc;
use clap::{Args, Subcommand};
use serde_json::json;
use tokio::sync::mpsc;
use tracing::warn;

use super::pattern::parse_inline;

#[derive(Subcommand)]
pub enum SessionAction {
    /// Start a new session
    Start {
        /// Pattern name, or inline durations such as "4-7-8-0"
        #[arg(long)]
        pattern: Option<String>,
        /// Number of cycles to breathe
        #[arg(long)]
        cycles: Option<u32>,
        #[command(flatten)]
        output: OutputArgs,
    },
    /// Continue the saved session, if it is recent enough
    Resume {
        #[command(flatten)]
        output: OutputArgs,
    },
    /// Show the saved session as JSON
    Status,
    /// Delete the saved session
    Discard,
}

#[derive(Args, Clone, Copy)]
pub struct OutputArgs {
    /// Print every event as a JSON line
    #[arg(long)]
    json: bool,
    /// Only print the final summary
    #[arg(long, conflicts_with = "json")]
    quiet: bool,
}

pub fn run(action: SessionAction) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;
    let db = Database::open()?;

    match action {
        SessionAction::Start {
            pattern,
            cycles,
            output,
        } => {
            let engine = build_engine(&db, &config, pattern.as_deref(), cycles)?;
            if SavedSessionResolver::with_window(&db, config.resume_window())
                .check_for_resumable(Utc::now())
                .is_some()
            {
                eprintln!("note: replacing the saved session");
            }
            drive(&db, &config, engine, output)?;
        }
        SessionAction::Resume { output } => {
            let resolver = SavedSessionResolver::with_window(&db, config.resume_window());
            let snapshot = resolver
                .check_for_resumable(Utc::now())
                .ok_or("no session to resume")?;
            let engine = resolver.resume(&snapshot)?;
            drive(&db, &config, engine, output)?;
        }
        SessionAction::Status => {
            let resolver = SavedSessionResolver::with_window(&db, config.resume_window());
            let now = Utc::now();
            let status = match resolver.check_for_resumable(now) {
                Some(snapshot) => json!({
                    "resumable": true,
                    "ageSeconds": snapshot.age(now).num_seconds(),
                    "snapshot": snapshot,
                }),
                None => json!({ "resumable": false }),
            };
            println!("{}", serde_json::to_string_pretty(&status)?);
        }
        SessionAction::Discard => {
            let resolver = SavedSessionResolver::with_window(&db, config.resume_window());
            match resolver.check_for_resumable(Utc::now()) {
                Some(snapshot) => {
                    resolver.discard(&snapshot);
                    println!("Saved session discarded");
                }
                None => println!("No saved session"),
            }
        }
    }
    Ok(())
}

fn build_engine(
    db: &Database,
    config: &Config,
    pattern: Option<&str>,
    cycles: Option<u32>,
) -> breathwork_core::error::Result<SessionEngine> {
    let library = PatternLibrary::new(db);
    let cycles = cycles.unwrap_or(config.session.default_cycles);

    let engine = match pattern {
        Some(name) => match library.find(name) {
            Some(entry) => SessionEngine::start(entry.pattern, cycles)?.with_pattern_name(entry.name),
            None => {
                let inline = parse_inline(name)
                    .ok_or_else(|| LibraryError::UnknownPattern(name.to_string()))?;
                SessionEngine::start(inline, cycles)?
            }
        },
        None => {
            let entry = library.active_or(&config.session.default_pattern);
            SessionEngine::start(entry.pattern, cycles)?.with_pattern_name(entry.name)
        }
    };
    Ok(engine)
}

/// How a driven session ended.
enum Outcome {
    Finished(SessionSummary),
    Interrupted,
}

/// Run `engine` to completion, exit or Ctrl-C, then record it in history.
///
/// Enter toggles pause; `q` then Enter ends the session. Ctrl-C saves the
/// session for a later `session resume` instead of ending it.
fn drive(
    db: &Database,
    config: &Config,
    engine: SessionEngine,
    output: OutputArgs,
) -> Result<(), Box<dyn std::error::Error>> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    let (tx, mut controls) = mpsc::unbounded_channel();
    spawn_stdin_reader(tx);

    let target = engine.target_cycles();
    render(&engine.opening_event(), target, output);
    if !output.json && !output.quiet {
        println!("Enter: pause/resume   q: finish   Ctrl-C: save and quit");
    }

    let mut driver = SessionDriver::new(engine, db, config.driver_config());
    let outcome = runtime.block_on(async {
        tokio::select! {
            summary = driver.run(&mut controls, |_, events| {
                for event in events {
                    render(event, target, output);
                }
            }) => Outcome::Finished(summary),
            _ = tokio::signal::ctrl_c() => Outcome::Interrupted,
        }
    });

    match outcome {
        Outcome::Finished(summary) => {
            let history = SessionHistory::new(db);
            if let Err(e) = history.record(&summary, Utc::now()) {
                warn!(error = %e, "could not record session history");
            }
            if output.json {
                return Ok(());
            }
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
        Outcome::Interrupted => {
            driver.apply(Control::Background, std::time::Instant::now());
            let progress = driver.engine().progress();
            if output.json {
                println!("{}", json!({ "type": "session_saved", "progress": progress }));
            } else {
                eprintln!(
                    "\nSession saved after {} cycles. Run `breathwork session resume` to continue.",
                    progress.cycles_completed
                );
            }
        }
    }
    Ok(())
}

fn spawn_stdin_reader(tx: mpsc::UnboundedSender<Control>) {
    std::thread::spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else { break };
            let control = match line.trim() {
                "q" | "quit" => Control::Exit,
                _ => Control::TogglePause,
            };
            if tx.send(control).is_err() {
                break;
            }
        }
    });
}

fn render(event: &Event, target: u32, output: OutputArgs) {
    if output.json {
        match serde_json::to_string(event) {
            Ok(line) => println!("{line}"),
            Err(e) => warn!(error = %e, "could not encode event"),
        }
        return;
    }
    if output.quiet {
        return;
    }

    match event {
        Event::SessionStarted { phase, phase_secs, .. } => {
            println!("Starting {target} cycles");
            println!("  {:<12} {phase_secs}s", phase.prompt());
        }
        Event::SessionResumed {
            phase,
            remaining_secs,
            cycles_completed,
        } => {
            println!("Resuming at cycle {}/{target}", cycles_completed + 1);
            println!("  {:<12} {remaining_secs:.1}s left", phase.prompt());
        }
        Event::PhaseChanged {
            phase,
            duration_secs,
            ..
        } => println!("  {:<12} {duration_secs}s", phase.prompt()),
        Event::CycleCompleted { cycles_completed } if *cycles_completed < target => {
            println!("Cycle {cycles_completed}/{target} done");
        }
        Event::Paused { .. } => println!("Paused"),
        Event::Resumed { .. } => println!("Resumed"),
        Event::SessionCompleted { .. } => println!("Session complete"),
        Event::SessionExited { .. } => println!("Session ended"),
        _ => {}
    }
}
