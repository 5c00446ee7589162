//! Step processors
//!
//! One function per (application type, status). Each one re-checks the
//! status it is bound to and the acting role, applies its field-level rules,
//! writes its own field group exactly once and commits the new status through
//! the repository's conditional write. Processors never touch the history log
//! or notifications; they hand a `CommittedTransition` back instead.

pub mod gcr;
pub mod training;

use approval_types::ActorContext;
use chrono::{DateTime, Utc};

use super::application_types::CommittedTransition;
use super::traits::{ApplicationRecord, ApplicationRepository};
use crate::error::{Result, WorkflowError};

/// The loaded record must still sit in the status this processor is bound to
pub(crate) fn ensure_status<A: ApplicationRecord>(application: &A, bound: A::Status) -> Result<()> {
    if application.status() != bound {
        return Err(WorkflowError::InvalidState(format!(
            "{} application {} is '{}', expected '{}'",
            A::KIND,
            application.id(),
            A::status_label(application.status()),
            A::status_label(bound)
        )));
    }
    Ok(())
}

/// Only the role named by the status may act on it
pub(crate) fn authorize<A: ApplicationRecord>(actor: &ActorContext, status: A::Status) -> Result<()> {
    match A::acting_role(status) {
        Some(role) if role == actor.role => Ok(()),
        _ => Err(WorkflowError::Forbidden {
            role: actor.role,
            status: A::status_label(status),
        }),
    }
}

/// An earlier step's field group must be present before a later step runs
pub(crate) fn require_prior<T>(slot: &Option<T>, group: &'static str) -> Result<()> {
    if slot.is_none() {
        return Err(WorkflowError::InvalidState(format!("{} has not been recorded", group)));
    }
    Ok(())
}

/// Fill a step-owned field group; a group is never overwritten
pub(crate) fn write_once<T>(slot: &mut Option<T>, value: T, group: &'static str) -> Result<()> {
    if slot.is_some() {
        return Err(WorkflowError::InvalidState(format!("{} was already recorded", group)));
    }
    *slot = Some(value);
    Ok(())
}

/// Conditionally persist `application` (already carrying its new status) and
/// describe the committed change. Zero rows written means another writer
/// moved the application first.
pub(crate) fn commit<R, A>(
    repository: &R,
    actor: &ActorContext,
    application: &A,
    from: A::Status,
    action: String,
    comments: Option<String>,
    committed_at: DateTime<Utc>,
) -> Result<CommittedTransition>
where
    R: ApplicationRepository,
    A: ApplicationRecord,
{
    let rows = repository.update_if_status(application.id(), from, application)?;
    if rows != 1 {
        return Err(WorkflowError::InvalidState(format!(
            "{} application {} is no longer '{}'",
            A::KIND,
            application.id(),
            A::status_label(from)
        )));
    }

    Ok(CommittedTransition {
        application_type: A::KIND,
        application_id: application.id().clone(),
        owner: application.owner(),
        actor: *actor,
        from_status: A::status_label(from),
        to_status: A::status_label(application.status()),
        action,
        comments,
        committed_at,
    })
}
