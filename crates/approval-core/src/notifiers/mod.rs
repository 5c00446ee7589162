//! Notification emitters
//!
//! Delivery is a collaborator concern; these sinks cover logging the event,
//! keeping a per-recipient inbox on disk, or discarding it.

pub mod file_notifier;
pub mod log_notifier;

pub use file_notifier::FileNotifier;
pub use log_notifier::LogNotifier;

use std::path::Path;

use crate::config::NotificationSink;
use crate::error::Result;
use crate::workflow::application_types::Notification;
use crate::workflow::traits::NotificationEmitter;

/// Drops every notification
pub struct NoopNotifier;

impl NotificationEmitter for NoopNotifier {
    fn notify(&self, _notification: &Notification) -> Result<()> {
        Ok(())
    }
}

/// Build the emitter selected in configuration
pub fn from_config(sink: NotificationSink, root_path: &Path) -> Result<Box<dyn NotificationEmitter>> {
    Ok(match sink {
        NotificationSink::Log => Box::new(LogNotifier),
        NotificationSink::File => Box::new(FileNotifier::new(root_path)?),
        NotificationSink::None => Box::new(NoopNotifier),
    })
}
