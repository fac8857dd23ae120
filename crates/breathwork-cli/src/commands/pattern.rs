use breathwork_core::storage::Database;
use breathwork_core::{Pattern, PatternEntry, PatternLibrary};
use clap::Subcommand;

#[derive(Subcommand)]
pub enum PatternAction {
    /// List built-in and saved patterns
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show one pattern as JSON
    Show {
        /// Pattern name
        name: String,
    },
    /// Save (or replace) a custom pattern
    Save {
        /// Pattern name
        name: String,
        /// Inhale seconds
        #[arg(long)]
        inhale: f64,
        /// Hold seconds after inhaling
        #[arg(long, default_value = "0")]
        hold: f64,
        /// Exhale seconds
        #[arg(long)]
        exhale: f64,
        /// Pause seconds after exhaling
        #[arg(long, default_value = "0")]
        pause: f64,
    },
    /// Delete a custom pattern
    Remove {
        /// Pattern name
        name: String,
    },
    /// Select the pattern sessions start with by default
    Use {
        /// Pattern name
        name: String,
    },
}

/// Parse an inline `inhale-hold-exhale-pause` pattern such as `4-7-8-0`.
///
/// Returns `None` when `s` is not in that form.
pub fn parse_inline(s: &str) -> Option<Pattern> {
    let parts: Vec<f64> = s
        .split('-')
        .map(|p| p.trim().parse::<f64>())
        .collect::<Result<_, _>>()
        .ok()?;
    match parts.as_slice() {
        [inhale, hold, exhale, pause] => Some(Pattern {
            inhale: *inhale,
            hold: *hold,
            exhale: *exhale,
            pause: *pause,
        }),
        _ => None,
    }
}

fn print_entry_line(entry: &PatternEntry, active: &str) {
    let marker = if entry.name == active { "*" } else { " " };
    let kind = if entry.builtin { "preset" } else { "custom" };
    println!(
        "{marker} {:<12} {:<10} {:<7} {}",
        entry.name,
        entry.pattern.to_string(),
        kind,
        entry.description.as_deref().unwrap_or("")
    );
}

pub fn run(action: PatternAction) -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::open()?;
    let library = PatternLibrary::new(&db);

    match action {
        PatternAction::List { json } => {
            let entries = library.list();
            if json {
                println!("{}", serde_json::to_string_pretty(&entries)?);
            } else {
                let active = library.active();
                for entry in &entries {
                    print_entry_line(entry, &active.name);
                }
            }
        }
        PatternAction::Show { name } => {
            let entry = library
                .find(&name)
                .ok_or_else(|| format!("unknown pattern: {name}"))?;
            println!("{}", serde_json::to_string_pretty(&entry)?);
        }
        PatternAction::Save {
            name,
            inhale,
            hold,
            exhale,
            pause,
        } => {
            let pattern = Pattern::new(inhale, hold, exhale, pause)?;
            library.save_custom(&name, pattern)?;
            println!("Pattern saved: {} ({pattern})", name.trim());
        }
        PatternAction::Remove { name } => {
            if library.remove_custom(&name)? {
                println!("Pattern removed: {name}");
            } else {
                return Err(format!("no custom pattern named {name}").into());
            }
        }
        PatternAction::Use { name } => {
            let entry = library.set_active(&name)?;
            println!("Active pattern: {} ({})", entry.name, entry.pattern);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_inline_patterns() {
        assert_eq!(
            parse_inline("4-7-8-0"),
            Some(Pattern {
                inhale: 4.0,
                hold: 7.0,
                exhale: 8.0,
                pause: 0.0,
            })
        );
        assert_eq!(parse_inline("0.5-0-1.5-0").map(|p| p.exhale), Some(1.5));
    }

    #[test]
    fn rejects_non_inline_names() {
        assert_eq!(parse_inline("box"), None);
        assert_eq!(parse_inline("4-4-4"), None);
        assert_eq!(parse_inline("4-4-4-4-4"), None);
    }
}
