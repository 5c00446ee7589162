//! File-backed application repository
//!
//! One JSON document per application under `applications/<type>/`. Writes go
//! to a uniquely named temporary file that is renamed over the target, so
//! readers only ever see a complete record. Inserts and conditional status
//! updates hold an exclusive advisory lock on `application_<id>.lock`, which
//! makes the read-check-write atomic across every store instance and process
//! sharing the data root.

use approval_types::{ApplicationId, ApplicationType, GcrStatus, TrainingStatus};
use chrono::Utc;
use fs2::FileExt;
use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};

use super::application_types::{
    GcrApplication, HealthCheckResult, HealthStatus, StateCountMap, TrainingApplication,
};
use super::traits::{ApplicationRecord, ApplicationRepository};
use crate::error::{Result, WorkflowError};
use crate::paths;

/// Pending applications above this count in a single status mark the store degraded
const BACKLOG_THRESHOLD: usize = 50;

pub struct FileApplicationStore {
    root_path: PathBuf,
}

/// Exclusive lock on one application record; released when dropped
struct RecordLock {
    _file: File,
}

impl FileApplicationStore {
    /// Create a store rooted at `root_path`, creating the directory layout
    pub fn new<P: AsRef<Path>>(root_path: P) -> Result<Self> {
        let root_path = root_path.as_ref().to_path_buf();

        for kind in [ApplicationType::Training, ApplicationType::Gcr] {
            fs::create_dir_all(paths::applications_dir(&root_path, kind))?;
        }

        Ok(Self { root_path })
    }

    /// Block until this handle holds the record's lock file exclusively
    fn lock(&self, kind: ApplicationType, id: &ApplicationId) -> Result<RecordLock> {
        let lock_path = paths::applications_dir(&self.root_path, kind)
            .join(format!("application_{}.lock", id));

        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .open(&lock_path)?;
        FileExt::lock_exclusive(&file).map_err(|e| {
            WorkflowError::Persistence(format!("Failed to lock {:?}: {}", lock_path, e))
        })?;

        Ok(RecordLock { _file: file })
    }

    fn application_path(&self, kind: ApplicationType, id: &ApplicationId) -> PathBuf {
        paths::applications_dir(&self.root_path, kind)
            .join(format!("application_{}.json", id))
    }

    fn read_record<A: ApplicationRecord>(&self, path: &Path) -> Result<A> {
        let json = fs::read_to_string(path)?;

        serde_json::from_str(&json)
            .map_err(|e| WorkflowError::Persistence(format!("Failed to deserialize {:?}: {}", path, e)))
    }

    fn write_record<A: ApplicationRecord>(&self, path: &Path, application: &A) -> Result<()> {
        let json = serde_json::to_string_pretty(application)
            .map_err(|e| WorkflowError::Persistence(format!("Failed to serialize application: {}", e)))?;

        let tmp_path = path.with_extension(format!("json.{}.tmp", uuid::Uuid::new_v4().simple()));
        fs::write(&tmp_path, json)?;
        fs::rename(&tmp_path, path)?;

        Ok(())
    }

    /// Every readable record of one type, plus the number of files that failed to parse
    fn scan<A: ApplicationRecord>(&self) -> Result<(Vec<A>, usize)> {
        let dir = paths::applications_dir(&self.root_path, A::KIND);

        if !dir.exists() {
            return Ok((Vec::new(), 0));
        }

        let mut applications = Vec::new();
        let mut unreadable = 0;

        for entry in fs::read_dir(&dir)? {
            let entry = entry?;

            let path = entry.path();
            if path.is_file() && path.extension().and_then(|s| s.to_str()) == Some("json") {
                match self.read_record::<A>(&path) {
                    Ok(application) => applications.push(application),
                    Err(e) => {
                        log::warn!("Skipping unreadable application file {:?}: {}", path, e);
                        unreadable += 1;
                    }
                }
            }
        }

        applications.sort_by(|a: &A, b: &A| a.id().cmp(b.id()));
        Ok((applications, unreadable))
    }

    /// Applications of one type currently in `status`
    pub fn list_by_status<A: ApplicationRecord>(&self, status: A::Status) -> Result<Vec<A>> {
        Ok(self.list::<A>()?
            .into_iter()
            .filter(|application| application.status() == status)
            .collect())
    }

    /// Perform health check
    pub fn health_check(&self) -> Result<HealthCheckResult> {
        let mut counts = StateCountMap::new();

        let (training, unreadable_training) = self.scan::<TrainingApplication>()?;
        for application in &training {
            counts.increment(ApplicationType::Training, application.status.as_str());
        }

        let (gcr, unreadable_gcr) = self.scan::<GcrApplication>()?;
        for application in &gcr {
            counts.increment(ApplicationType::Gcr, application.status.as_str());
        }

        let unreadable_records = unreadable_training + unreadable_gcr;

        let backlog = TrainingStatus::ALL.iter()
            .filter(|s| !s.is_terminal())
            .map(|s| counts.get(ApplicationType::Training, s.as_str()))
            .chain(
                GcrStatus::ALL.iter()
                    .filter(|s| !s.is_terminal())
                    .map(|s| counts.get(ApplicationType::Gcr, s.as_str())),
            )
            .max()
            .unwrap_or(0);

        let status = if unreadable_records > 0 {
            HealthStatus::Unhealthy
        } else if backlog > BACKLOG_THRESHOLD {
            HealthStatus::Degraded
        } else {
            HealthStatus::Healthy
        };

        Ok(HealthCheckResult {
            status,
            total_applications: counts.total(),
            counts,
            unreadable_records,
            root_path: self.root_path.clone(),
            last_check: Utc::now(),
        })
    }
}

impl ApplicationRepository for FileApplicationStore {
    fn insert<A: ApplicationRecord>(&self, application: &A) -> Result<()> {
        let _lock = self.lock(A::KIND, application.id())?;
        let path = self.application_path(A::KIND, application.id());

        if path.exists() {
            return Err(WorkflowError::Persistence(format!(
                "{} application {} already exists", A::KIND, application.id()
            )));
        }

        self.write_record(&path, application)?;
        log::info!("Created {} application {}", A::KIND, application.id());
        Ok(())
    }

    fn get<A: ApplicationRecord>(&self, id: &ApplicationId) -> Result<Option<A>> {
        let path = self.application_path(A::KIND, id);

        if !path.exists() {
            return Ok(None);
        }

        Ok(Some(self.read_record(&path)?))
    }

    fn update_if_status<A: ApplicationRecord>(
        &self,
        id: &ApplicationId,
        expected: A::Status,
        updated: &A,
    ) -> Result<u64> {
        let _lock = self.lock(A::KIND, id)?;
        let path = self.application_path(A::KIND, id);

        if !path.exists() {
            return Ok(0);
        }

        let current: A = self.read_record(&path)?;
        if current.status() != expected {
            log::warn!(
                "Conditional update of {} application {} skipped: status is '{}', expected '{}'",
                A::KIND, id, current.status(), expected
            );
            return Ok(0);
        }

        self.write_record(&path, updated)?;
        Ok(1)
    }

    fn list<A: ApplicationRecord>(&self) -> Result<Vec<A>> {
        self.scan::<A>().map(|(applications, _)| applications)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflow::processors::test_support::{gcr_submission, training_submission};
    use approval_types::UserId;
    use tempfile::TempDir;

    #[test]
    fn test_store_creation() {
        let temp_dir = TempDir::new().unwrap();
        let _store = FileApplicationStore::new(temp_dir.path()).unwrap();

        assert!(temp_dir.path().join("applications").join("training").exists());
        assert!(temp_dir.path().join("applications").join("gcr").exists());
    }

    #[test]
    fn test_insert_and_get() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileApplicationStore::new(temp_dir.path()).unwrap();

        let application = GcrApplication::new(UserId::new(5), gcr_submission(8));
        store.insert(&application).unwrap();

        let path = temp_dir.path()
            .join("applications")
            .join("gcr")
            .join(format!("application_{}.json", application.id));
        assert!(path.exists());

        let loaded: GcrApplication = store.get(&application.id).unwrap().unwrap();
        assert_eq!(loaded, application);
        assert_eq!(store.get_status::<GcrApplication>(&application.id).unwrap(), GcrStatus::PendingHr1);
        assert_eq!(store.get_owner_user_id::<GcrApplication>(&application.id).unwrap(), UserId::new(5));

        // Same id under the other type does not exist
        let missing: Option<TrainingApplication> = store.get(&application.id).unwrap();
        assert!(missing.is_none());
    }

    #[test]
    fn test_duplicate_insert_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileApplicationStore::new(temp_dir.path()).unwrap();

        let application = TrainingApplication::new(UserId::new(5), training_submission());
        store.insert(&application).unwrap();
        assert!(matches!(store.insert(&application), Err(WorkflowError::Persistence(_))));
    }

    #[test]
    fn test_get_status_of_missing_application() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileApplicationStore::new(temp_dir.path()).unwrap();

        let err = store.get_status::<TrainingApplication>(&ApplicationId::new()).unwrap_err();
        assert!(matches!(err, WorkflowError::NotFound(_)));
    }

    #[test]
    fn test_update_if_status_compares_persisted_status() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileApplicationStore::new(temp_dir.path()).unwrap();

        let application = GcrApplication::new(UserId::new(5), gcr_submission(8));
        store.insert(&application).unwrap();

        let mut advanced = application.clone();
        advanced.status = GcrStatus::PendingGm;

        assert_eq!(store.update_if_status(&application.id, GcrStatus::PendingHr1, &advanced).unwrap(), 1);
        // Same expectation again: the persisted status has moved on
        assert_eq!(store.update_if_status(&application.id, GcrStatus::PendingHr1, &advanced).unwrap(), 0);
        assert_eq!(store.update_if_status(&ApplicationId::new(), GcrStatus::PendingHr1, &advanced).unwrap(), 0);

        assert_eq!(store.get_status::<GcrApplication>(&application.id).unwrap(), GcrStatus::PendingGm);

        let leftovers: Vec<_> = std::fs::read_dir(temp_dir.path().join("applications").join("gcr"))
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .filter(|name| name.ends_with(".tmp"))
            .collect();
        assert!(leftovers.is_empty(), "{:?}", leftovers);
    }

    #[test]
    fn test_separate_stores_on_one_root_commit_once() {
        let temp_dir = TempDir::new().unwrap();
        let first = FileApplicationStore::new(temp_dir.path()).unwrap();
        let second = FileApplicationStore::new(temp_dir.path()).unwrap();

        for _ in 0..50 {
            let application = GcrApplication::new(UserId::new(5), gcr_submission(8));
            first.insert(&application).unwrap();

            let mut advanced = application.clone();
            advanced.status = GcrStatus::PendingGm;

            let barrier = std::sync::Barrier::new(2);
            let rows: u64 = std::thread::scope(|scope| {
                let handles: Vec<_> = [&first, &second]
                    .into_iter()
                    .map(|store| {
                        let (barrier, application, advanced) = (&barrier, &application, &advanced);
                        scope.spawn(move || {
                            barrier.wait();
                            store.update_if_status(&application.id, GcrStatus::PendingHr1, advanced).unwrap()
                        })
                    })
                    .collect();
                handles.into_iter().map(|handle| handle.join().unwrap()).sum()
            });

            assert_eq!(rows, 1);
        }

        // Lock files sit next to the records but are never listed as records
        assert_eq!(first.list::<GcrApplication>().unwrap().len(), 50);
        assert_eq!(second.health_check().unwrap().unreadable_records, 0);
    }

    #[test]
    fn test_records_persist_across_restart() {
        let temp_dir = TempDir::new().unwrap();
        let application = TrainingApplication::new(UserId::new(5), training_submission());

        {
            let store = FileApplicationStore::new(temp_dir.path()).unwrap();
            store.insert(&application).unwrap();
        }

        let store = FileApplicationStore::new(temp_dir.path()).unwrap();
        let pending = store.list_by_status::<TrainingApplication>(TrainingStatus::PendingHod).unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].id, application.id);
    }

    #[test]
    fn test_health_check() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileApplicationStore::new(temp_dir.path()).unwrap();

        store.insert(&TrainingApplication::new(UserId::new(1), training_submission())).unwrap();
        store.insert(&GcrApplication::new(UserId::new(2), gcr_submission(3))).unwrap();
        store.insert(&GcrApplication::new(UserId::new(3), gcr_submission(4))).unwrap();

        let health = store.health_check().unwrap();
        assert_eq!(health.status, HealthStatus::Healthy);
        assert_eq!(health.total_applications, 3);
        assert_eq!(health.counts.get(ApplicationType::Gcr, "pending_hr1"), 2);
        assert_eq!(health.counts.get(ApplicationType::Training, "pending_hod"), 1);
        assert_eq!(health.root_path, temp_dir.path());

        std::fs::write(
            temp_dir.path().join("applications").join("gcr").join("application_broken.json"),
            "{ not json",
        ).unwrap();
        let health = store.health_check().unwrap();
        assert_eq!(health.status, HealthStatus::Unhealthy);
        assert_eq!(health.unreadable_records, 1);
        assert_eq!(health.total_applications, 3);
    }
}
