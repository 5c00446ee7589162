//! Seams between the workflow engine and its collaborators
//!
//! The engine owns the transition rules. Storage, the audit trail and
//! notification delivery are reached only through these traits, which keeps
//! every collaborator swappable in tests.

use approval_types::{ApplicationId, ApplicationType, Role, UserId};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt;

use super::application_types::{HistoryEntry, Notification};
use crate::error::{Result, WorkflowError};

/// A persisted application variant with its own status enumeration
pub trait ApplicationRecord: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    type Status: Copy + Eq + fmt::Debug + fmt::Display + Send + Sync;

    const KIND: ApplicationType;

    fn id(&self) -> &ApplicationId;

    /// Submitter of the application; never changes after creation
    fn owner(&self) -> UserId;

    fn status(&self) -> Self::Status;

    fn status_label(status: Self::Status) -> &'static str;

    fn acting_role(status: Self::Status) -> Option<Role>;
}

/// Load/save contract for application records.
///
/// `update_if_status` is the sole concurrency guard of the engine: it must
/// compare the persisted status with `expected` and replace the record in one
/// atomic step, returning the number of records written (0 or 1).
pub trait ApplicationRepository: Send + Sync {
    /// Persist a brand new record; fails if the id is already taken
    fn insert<A: ApplicationRecord>(&self, application: &A) -> Result<()>;

    fn get<A: ApplicationRecord>(&self, id: &ApplicationId) -> Result<Option<A>>;

    fn update_if_status<A: ApplicationRecord>(
        &self,
        id: &ApplicationId,
        expected: A::Status,
        updated: &A,
    ) -> Result<u64>;

    fn list<A: ApplicationRecord>(&self) -> Result<Vec<A>>;

    fn get_status<A: ApplicationRecord>(&self, id: &ApplicationId) -> Result<A::Status> {
        self.get::<A>(id)?
            .map(|application| application.status())
            .ok_or_else(|| WorkflowError::NotFound(format!("{} application {}", A::KIND, id)))
    }

    fn get_owner_user_id<A: ApplicationRecord>(&self, id: &ApplicationId) -> Result<UserId> {
        self.get::<A>(id)?
            .map(|application| application.owner())
            .ok_or_else(|| WorkflowError::NotFound(format!("{} application {}", A::KIND, id)))
    }
}

/// Append-only audit trail
pub trait HistoryLog: Send + Sync {
    fn append(&self, entry: &HistoryEntry) -> Result<()>;

    /// All entries for one application in insertion order
    fn entries_for(&self, kind: ApplicationType, id: &ApplicationId) -> Result<Vec<HistoryEntry>>;
}

/// Delivery of workflow notifications. Best effort from the engine's view.
pub trait NotificationEmitter: Send + Sync {
    fn notify(&self, notification: &Notification) -> Result<()>;
}
