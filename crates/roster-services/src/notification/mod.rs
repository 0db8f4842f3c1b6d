//! Best-effort notification dispatch.
//!
//! Delivery never decides the outcome of the operation that triggered it:
//! callers either hand a notification to `dispatch_detached` and move on, or
//! run `deliver` inside their own detached task.

mod smtp;
pub mod templates;

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use roster_core::Config;
use thiserror::Error;
use tokio::task::JoinHandle;

pub use smtp::SmtpNotifier;

/// An outbound message. Bodies may carry one-time secrets, so `Debug`
/// prints only the envelope.
#[derive(Clone)]
pub struct Notification {
    pub to: String,
    pub subject: String,
    pub text: String,
    pub html: Option<String>,
}

impl fmt::Debug for Notification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Notification")
            .field("to", &self.to)
            .field("subject", &self.subject)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Error)]
pub enum NotificationError {
    #[error("Notifications are disabled")]
    Disabled,

    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    #[error("Failed to build message: {0}")]
    Build(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Timed out after {0:?}")]
    TimedOut(Duration),
}

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, notification: &Notification) -> Result<(), NotificationError>;
}

/// Notifier used when email is not configured. Every send fails with `Disabled`.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledNotifier;

#[async_trait]
impl Notifier for DisabledNotifier {
    async fn send(&self, _notification: &Notification) -> Result<(), NotificationError> {
        Err(NotificationError::Disabled)
    }
}

/// SMTP when email is enabled and configured, otherwise `DisabledNotifier`.
pub fn create_notifier(config: &Config) -> Arc<dyn Notifier> {
    match SmtpNotifier::from_config(config) {
        Some(notifier) => Arc::new(notifier),
        None => Arc::new(DisabledNotifier),
    }
}

/// Sends notifications with a bounded wait.
#[derive(Clone)]
pub struct NotificationDispatcher {
    notifier: Arc<dyn Notifier>,
    timeout: Duration,
}

impl NotificationDispatcher {
    pub fn new(notifier: Arc<dyn Notifier>, timeout: Duration) -> Self {
        Self { notifier, timeout }
    }

    /// Send once, giving up after the configured timeout.
    pub async fn deliver(&self, notification: &Notification) -> Result<(), NotificationError> {
        match tokio::time::timeout(self.timeout, self.notifier.send(notification)).await {
            Ok(result) => result,
            Err(_) => Err(NotificationError::TimedOut(self.timeout)),
        }
    }

    /// Send on a detached task. Failures are logged; nothing else observes them
    /// unless the caller keeps the handle.
    pub fn dispatch_detached(
        &self,
        notification: Notification,
    ) -> JoinHandle<Result<(), NotificationError>> {
        let dispatcher = self.clone();
        tokio::spawn(async move {
            let result = dispatcher.deliver(&notification).await;
            match &result {
                Ok(()) => tracing::info!(
                    to = %notification.to,
                    subject = %notification.subject,
                    "Notification sent"
                ),
                Err(NotificationError::Disabled) => tracing::debug!(
                    to = %notification.to,
                    subject = %notification.subject,
                    "Notification skipped, email disabled"
                ),
                Err(e) => tracing::warn!(
                    error = %e,
                    to = %notification.to,
                    subject = %notification.subject,
                    "Notification failed"
                ),
            }
            result
        })
    }
}
