use breathwork_core::storage::Database;
use breathwork_core::SessionHistory;
use chrono::Utc;
use clap::Subcommand;

#[derive(Subcommand)]
pub enum HistoryAction {
    /// List recorded sessions, newest first
    List {
        /// Maximum number of entries to show
        #[arg(long, default_value = "20")]
        limit: usize,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Totals and streaks as JSON
    Stats,
    /// Delete all recorded sessions
    Clear,
}

pub fn run(action: HistoryAction) -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::open()?;
    let history = SessionHistory::new(&db);

    match action {
        HistoryAction::List { limit, json } => {
            let entries: Vec<_> = history.entries().into_iter().rev().take(limit).collect();
            if json {
                println!("{}", serde_json::to_string_pretty(&entries)?);
            } else if entries.is_empty() {
                println!("No sessions recorded yet");
            } else {
                for entry in &entries {
                    println!(
                        "{}  {:<12} {:>3} cycles  {:>5}s",
                        entry.date.format("%Y-%m-%d %H:%M"),
                        entry.exercise,
                        entry.cycles,
                        entry.duration
                    );
                }
            }
        }
        HistoryAction::Stats => {
            let stats = history.stats(Utc::now().date_naive());
            println!("{}", serde_json::to_string_pretty(&stats)?);
        }
        HistoryAction::Clear => {
            history.clear()?;
            println!("history cleared");
        }
    }
    Ok(())
}
