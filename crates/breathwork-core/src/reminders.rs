//! Periodic breathing reminders.
//!
//! [`ReminderScheduler`] is an ordinary value owned by the application's root
//! scope. It keeps the handle of its reminder task in memory; persisted
//! settings only say whether a reminder loop should be running, and the
//! schedule is derived fresh from them on every start-up.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{info, warn};

use crate::error::NotifyError;

pub const REMINDER_TITLE: &str = "Time to breathe";

/// Reminder preferences, stored in the `[reminders]` config section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReminderSettings {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_interval_minutes")]
    pub interval_minutes: u32,
    #[serde(default = "default_message")]
    pub message: String,
}

fn default_interval_minutes() -> u32 {
    240
}
fn default_message() -> String {
    "Take a minute for a few slow breaths.".into()
}

impl Default for ReminderSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            interval_minutes: default_interval_minutes(),
            message: default_message(),
        }
    }
}

impl ReminderSettings {
    /// Time between reminders, or `None` when reminders should not run.
    pub fn interval(&self) -> Option<Duration> {
        if self.enabled && self.interval_minutes > 0 {
            Some(Duration::from_secs(u64::from(self.interval_minutes) * 60))
        } else {
            None
        }
    }
}

/// Delivers local notifications.
pub trait Notifier: Send + Sync + 'static {
    /// Ask the platform for permission to notify.
    fn request_permission(&self) -> Result<(), NotifyError>;

    fn notify(&self, title: &str, body: &str) -> Result<(), NotifyError>;
}

struct ActiveLoop {
    settings: ReminderSettings,
    handle: JoinHandle<()>,
}

/// Owns the reminder task.
pub struct ReminderScheduler<N: Notifier> {
    notifier: Arc<N>,
    active: Option<ActiveLoop>,
}

impl<N: Notifier> ReminderScheduler<N> {
    pub fn new(notifier: N) -> Self {
        Self::with_shared(Arc::new(notifier))
    }

    pub fn with_shared(notifier: Arc<N>) -> Self {
        Self {
            notifier,
            active: None,
        }
    }

    pub fn is_running(&self) -> bool {
        self.active
            .as_ref()
            .is_some_and(|active| !active.handle.is_finished())
    }

    /// Bring the reminder loop in line with `settings`: start, restart with a
    /// new schedule, or stop. Must be called inside a Tokio runtime.
    ///
    /// # Errors
    /// Returns [`NotifyError::PermissionDenied`] when the notifier refuses
    /// permission. No loop is left running in that case.
    pub fn apply(&mut self, settings: &ReminderSettings) -> Result<(), NotifyError> {
        let Some(period) = settings.interval() else {
            self.stop();
            return Ok(());
        };
        if self.is_running()
            && self
                .active
                .as_ref()
                .is_some_and(|active| active.settings == *settings)
        {
            return Ok(());
        }
        self.stop();

        if let Err(e) = self.notifier.request_permission() {
            warn!(error = %e, "reminders disabled");
            return Err(e);
        }

        let notifier = Arc::clone(&self.notifier);
        let message = settings.message.clone();
        let handle = tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                if let Err(e) = notifier.notify(REMINDER_TITLE, &message) {
                    warn!(error = %e, "reminder not delivered");
                }
            }
        });
        info!(interval_minutes = settings.interval_minutes, "reminders started");
        self.active = Some(ActiveLoop {
            settings: settings.clone(),
            handle,
        });
        Ok(())
    }

    pub fn stop(&mut self) {
        if let Some(active) = self.active.take() {
            active.handle.abort();
            info!("reminders stopped");
        }
    }
}

impl<N: Notifier> Drop for ReminderScheduler<N> {
    fn drop(&mut self) {
        if let Some(active) = self.active.take() {
            active.handle.abort();
        }
    }
}
