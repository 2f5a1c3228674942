//! Success and error notifications for the outcome of mutations.

use std::sync::{Mutex, PoisonError};

/// Shows the outcome of a mutation to the user, e.g. as a toast.
pub trait Notifier: Send + Sync {
    /// Report that an operation succeeded.
    fn success(&self, message: &str);

    /// Report that an operation failed.
    fn error(&self, message: &str);
}

/// Writes notifications to the log.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn success(&self, message: &str) {
        tracing::info!("{message}");
    }

    fn error(&self, message: &str) {
        tracing::error!("{message}");
    }
}

/// A notification kept by [NotificationLog].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    /// A mutation succeeded.
    Success(String),
    /// A mutation failed.
    Error(String),
}

/// Keeps every notification in order so a UI can drain and display them.
#[derive(Debug, Default)]
pub struct NotificationLog {
    notifications: Mutex<Vec<Notification>>,
}

impl NotificationLog {
    /// Remove and return the notifications received so far.
    pub fn drain(&self) -> Vec<Notification> {
        let mut notifications = self
            .notifications
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        std::mem::take(&mut *notifications)
    }

    fn push(&self, notification: Notification) {
        self.notifications
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(notification);
    }
}

impl Notifier for NotificationLog {
    fn success(&self, message: &str) {
        self.push(Notification::Success(message.to_owned()));
    }

    fn error(&self, message: &str) {
        self.push(Notification::Error(message.to_owned()));
    }
}
