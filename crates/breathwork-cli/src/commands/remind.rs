use std::io::Write;

use breathwork_core::{Config, NotifyError, Notifier, ReminderScheduler};
use clap::Args;

#[derive(Args)]
pub struct RemindArgs {
    /// Minutes between reminders (defaults to `reminders.interval_minutes`)
    #[arg(long)]
    interval_minutes: Option<u32>,
    /// Reminder text (defaults to `reminders.message`)
    #[arg(long)]
    message: Option<String>,
}

/// Rings the terminal bell and prints the reminder.
struct TerminalNotifier;

impl Notifier for TerminalNotifier {
    fn request_permission(&self) -> Result<(), NotifyError> {
        Ok(())
    }

    fn notify(&self, title: &str, body: &str) -> Result<(), NotifyError> {
        let now = chrono::Local::now().format("%H:%M");
        let mut stdout = std::io::stdout().lock();
        writeln!(stdout, "\x07[{now}] {title}: {body}")
            .and_then(|()| stdout.flush())
            .map_err(|e| NotifyError::DeliveryFailed(e.to_string()))
    }
}

pub fn run(args: RemindArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;
    let mut settings = config.reminders;
    settings.enabled = true;
    if let Some(minutes) = args.interval_minutes {
        settings.interval_minutes = minutes;
    }
    if let Some(message) = args.message {
        settings.message = message;
    }
    if settings.interval().is_none() {
        return Err("reminder interval must be at least one minute".into());
    }

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    runtime.block_on(async {
        let mut scheduler = ReminderScheduler::new(TerminalNotifier);
        scheduler.apply(&settings)?;
        println!(
            "Reminding every {} minutes. Ctrl-C to stop.",
            settings.interval_minutes
        );
        tokio::signal::ctrl_c().await?;
        scheduler.stop();
        Ok::<(), Box<dyn std::error::Error>>(())
    })
}
