//! Training workflow steps: HOD review, HR review, GM decision

use approval_types::{ActorContext, TrainingDecision, TrainingStatus};
use chrono::{Datelike, Utc};

use super::{authorize, commit, ensure_status, require_prior, write_once};
use crate::error::{Result, WorkflowError};
use crate::workflow::application_types::{
    CommittedTransition, HodReview, HrReview, TrainingApplication, TrainingGmDecision,
};
use crate::workflow::step_inputs::{HodReviewInput, HrReviewInput, TrainingGmInput};
use crate::workflow::traits::ApplicationRepository;

pub(crate) fn hod_review<R: ApplicationRepository>(
    repository: &R,
    actor: &ActorContext,
    mut application: TrainingApplication,
    input: HodReviewInput,
    next: TrainingStatus,
) -> Result<CommittedTransition> {
    let bound = TrainingStatus::PendingHod;
    ensure_status(&application, bound)?;
    authorize::<TrainingApplication>(actor, bound)?;

    let action = match input.decision {
        TrainingDecision::Recommended => "HOD recommended",
        TrainingDecision::NotRecommended => "HOD not recommended",
        other => {
            return Err(WorkflowError::InvalidTransition(format!(
                "'{}' is not a HOD decision", other
            )))
        }
    };

    let now = Utc::now();
    write_once(
        &mut application.hod_review,
        HodReview {
            hod_id: actor.user_id,
            hod_decision: input.decision,
            hod_comments: input.comments.clone(),
            hod_date: now,
        },
        "hod_review",
    )?;
    application.status = next;
    application.updated_at = now;

    commit(repository, actor, &application, bound, action.to_string(), input.comments, now)
}

/// `TRN/2026/1A2B3C4D`: prefix, year of review, first 8 hex digits of the id
pub(crate) fn generate_reference_number(prefix: &str, application: &TrainingApplication, year: i32) -> String {
    let short_id: String = application.id.as_str()
        .chars()
        .filter(|c| c.is_ascii_hexdigit())
        .take(8)
        .collect();
    format!("{}/{}/{}", prefix, year, short_id.to_ascii_uppercase())
}

pub(crate) fn hr_review<R: ApplicationRepository>(
    repository: &R,
    actor: &ActorContext,
    mut application: TrainingApplication,
    input: HrReviewInput,
    next: TrainingStatus,
    reference_prefix: &str,
) -> Result<CommittedTransition> {
    let bound = TrainingStatus::PendingHr;
    ensure_status(&application, bound)?;
    authorize::<TrainingApplication>(actor, bound)?;
    require_prior(&application.hod_review, "hod_review")?;

    let now = Utc::now();
    let reference_number = match input.reference_number {
        Some(reference) => reference,
        None => generate_reference_number(reference_prefix, &application, now.year()),
    };

    log::debug!("Training application {} assigned reference {}", application.id, reference_number);

    write_once(
        &mut application.hr_review,
        HrReview {
            hr_id: actor.user_id,
            hr_comments: input.comments.clone(),
            budget_status: input.budget_status,
            credit_hours: input.credit_hours,
            budget_comments: input.budget_comments,
            hr_date: now,
            reference_number,
        },
        "hr_review",
    )?;
    application.status = next;
    application.updated_at = now;

    commit(repository, actor, &application, bound, "HR reviewed".to_string(), input.comments, now)
}

pub(crate) fn gm_decision<R: ApplicationRepository>(
    repository: &R,
    actor: &ActorContext,
    mut application: TrainingApplication,
    input: TrainingGmInput,
    next: TrainingStatus,
) -> Result<CommittedTransition> {
    let bound = TrainingStatus::PendingGm;
    ensure_status(&application, bound)?;
    authorize::<TrainingApplication>(actor, bound)?;
    require_prior(&application.hr_review, "hr_review")?;

    let action = match input.decision {
        TrainingDecision::Approved => "GM approved",
        TrainingDecision::Rejected => "GM rejected",
        other => {
            return Err(WorkflowError::InvalidTransition(format!(
                "'{}' is not a GM decision", other
            )))
        }
    };

    let now = Utc::now();
    write_once(
        &mut application.gm_decision,
        TrainingGmDecision {
            gm_id: actor.user_id,
            gm_decision: input.decision,
            gm_comments: input.comments.clone(),
            gm_date: now,
        },
        "gm_decision",
    )?;
    application.status = next;
    application.updated_at = now;

    commit(repository, actor, &application, bound, action.to_string(), input.comments, now)
}
