//! Append-only history log
//!
//! Entries are stored as JSON lines, one file per application, so insertion
//! order is file order. Nothing in this module rewrites or truncates a file.

use approval_types::{ApplicationId, ApplicationType};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use super::application_types::HistoryEntry;
use super::traits::HistoryLog;
use crate::error::{Result, WorkflowError};
use crate::paths;

pub struct FileHistoryLog {
    history_dir: PathBuf,
    append_lock: Mutex<()>,
}

impl FileHistoryLog {
    pub fn new<P: AsRef<Path>>(root_path: P) -> Result<Self> {
        let history_dir = paths::history_dir(root_path.as_ref());
        fs::create_dir_all(&history_dir)?;

        Ok(Self {
            history_dir,
            append_lock: Mutex::new(()),
        })
    }

    fn log_path(&self, kind: ApplicationType, id: &ApplicationId) -> PathBuf {
        self.history_dir.join(format!("{}_{}.jsonl", kind, id))
    }
}

impl HistoryLog for FileHistoryLog {
    fn append(&self, entry: &HistoryEntry) -> Result<()> {
        let mut line = serde_json::to_string(entry)?;
        line.push('\n');

        let _guard = self.append_lock
            .lock()
            .map_err(|_| WorkflowError::Persistence("history log lock poisoned".to_string()))?;

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.log_path(entry.application_type, &entry.application_id))?;
        file.write_all(line.as_bytes())?;
        file.sync_data()?;

        Ok(())
    }

    fn entries_for(&self, kind: ApplicationType, id: &ApplicationId) -> Result<Vec<HistoryEntry>> {
        let path = self.log_path(kind, id);

        if !path.exists() {
            return Ok(Vec::new());
        }

        fs::read_to_string(&path)?
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(|line| {
                serde_json::from_str(line).map_err(|e| {
                    WorkflowError::Persistence(format!("Corrupt history entry in {:?}: {}", path, e))
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approval_types::{Role, UserId};
    use chrono::Utc;
    use tempfile::TempDir;

    fn entry(id: &ApplicationId, action: &str, status: &str) -> HistoryEntry {
        HistoryEntry {
            application_type: ApplicationType::Gcr,
            application_id: id.clone(),
            action: action.to_string(),
            resulting_status: status.to_string(),
            actor_user_id: UserId::new(3),
            actor_role: Role::Hr,
            comments: None,
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn test_entries_returned_in_insertion_order() {
        let temp_dir = TempDir::new().unwrap();
        let log = FileHistoryLog::new(temp_dir.path()).unwrap();
        let id = ApplicationId::new();

        log.append(&entry(&id, "HR verified", "pending_gm")).unwrap();
        log.append(&entry(&id, "GM approved 5 day(s)", "pending_hr2")).unwrap();
        log.append(&entry(&id, "HR recorded approval", "pending_hr3")).unwrap();

        let entries = log.entries_for(ApplicationType::Gcr, &id).unwrap();
        let statuses: Vec<_> = entries.iter().map(|e| e.resulting_status.as_str()).collect();
        assert_eq!(statuses, vec!["pending_gm", "pending_hr2", "pending_hr3"]);
    }

    #[test]
    fn test_logs_are_separated_per_application() {
        let temp_dir = TempDir::new().unwrap();
        let log = FileHistoryLog::new(temp_dir.path()).unwrap();
        let first = ApplicationId::new();
        let second = ApplicationId::new();

        log.append(&entry(&first, "HR verified", "pending_gm")).unwrap();

        assert_eq!(log.entries_for(ApplicationType::Gcr, &first).unwrap().len(), 1);
        assert!(log.entries_for(ApplicationType::Gcr, &second).unwrap().is_empty());
        assert!(log.entries_for(ApplicationType::Training, &first).unwrap().is_empty());
    }

    #[test]
    fn test_history_survives_reopen() {
        let temp_dir = TempDir::new().unwrap();
        let id = ApplicationId::new();

        FileHistoryLog::new(temp_dir.path()).unwrap()
            .append(&entry(&id, "HR verified", "pending_gm"))
            .unwrap();

        let reopened = FileHistoryLog::new(temp_dir.path()).unwrap();
        reopened.append(&entry(&id, "GM rejected", "rejected")).unwrap();

        let entries = reopened.entries_for(ApplicationType::Gcr, &id).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[1].action, "GM rejected");
    }
}
