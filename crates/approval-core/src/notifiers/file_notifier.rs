//! Per-recipient notification inbox stored as JSON lines

use approval_types::UserId;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::error::{Result, WorkflowError};
use crate::paths;
use crate::workflow::application_types::Notification;
use crate::workflow::traits::NotificationEmitter;

pub struct FileNotifier {
    inbox_dir: PathBuf,
    append_lock: Mutex<()>,
}

impl FileNotifier {
    pub fn new<P: AsRef<Path>>(root_path: P) -> Result<Self> {
        let inbox_dir = paths::notifications_dir(root_path.as_ref());
        fs::create_dir_all(&inbox_dir)?;

        Ok(Self {
            inbox_dir,
            append_lock: Mutex::new(()),
        })
    }

    fn inbox_path(&self, recipient: UserId) -> PathBuf {
        self.inbox_dir.join(format!("user_{}.jsonl", recipient))
    }

    /// Notifications delivered to one user, oldest first
    pub fn inbox(&self, recipient: UserId) -> Result<Vec<Notification>> {
        let path = self.inbox_path(recipient);

        if !path.exists() {
            return Ok(Vec::new());
        }

        let mut notifications = Vec::new();
        for line in fs::read_to_string(&path)?.lines().filter(|l| !l.trim().is_empty()) {
            match serde_json::from_str(line) {
                Ok(notification) => notifications.push(notification),
                Err(e) => log::warn!("Skipping corrupt notification in {:?}: {}", path, e),
            }
        }

        Ok(notifications)
    }
}

impl NotificationEmitter for FileNotifier {
    fn notify(&self, notification: &Notification) -> Result<()> {
        let mut line = serde_json::to_string(notification)?;
        line.push('\n');

        let _guard = self.append_lock
            .lock()
            .map_err(|_| WorkflowError::Persistence("notification inbox lock poisoned".to_string()))?;

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.inbox_path(notification.recipient))?;
        file.write_all(line.as_bytes())?;

        log::debug!("Stored notification {} for user {}", notification.notification_id, notification.recipient);
        Ok(())
    }
}
