//! Notification emitter that writes each event to the log

use crate::error::Result;
use crate::workflow::application_types::Notification;
use crate::workflow::traits::NotificationEmitter;

pub struct LogNotifier;

impl NotificationEmitter for LogNotifier {
    fn notify(&self, notification: &Notification) -> Result<()> {
        log::info!(
            "Notify user {}: {}{}",
            notification.recipient,
            notification.message,
            notification.comments
                .as_deref()
                .map(|c| format!(" (comments: {})", c))
                .unwrap_or_default()
        );
        Ok(())
    }
}
