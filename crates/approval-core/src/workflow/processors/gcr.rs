//! GCR workflow steps: HR1 verification, GM decision, HR2 recording,
//! HR3 Lampiran A, GM final sign-off

use approval_types::{ActorContext, GcrDecision, GcrStatus};
use chrono::Utc;

use super::{authorize, commit, ensure_status, require_prior, write_once};
use crate::error::{Result, WorkflowError};
use crate::workflow::application_types::{
    CommittedTransition, GcrApplication, GcrGmDecision, GmFinalSignoff, Hr1Verification,
    Hr2Recording, Hr3Verification, LampiranA,
};
use crate::workflow::step_inputs::{
    GcrGmDecisionInput, GmFinalInput, Hr1VerificationInput, Hr2RecordingInput, Hr3LampiranInput,
};
use crate::workflow::traits::ApplicationRepository;

pub(crate) fn hr1_verification<R: ApplicationRepository>(
    repository: &R,
    actor: &ActorContext,
    mut application: GcrApplication,
    input: Hr1VerificationInput,
    next: GcrStatus,
) -> Result<CommittedTransition> {
    let bound = GcrStatus::PendingHr1;
    ensure_status(&application, bound)?;
    authorize::<GcrApplication>(actor, bound)?;

    let now = Utc::now();
    write_once(
        &mut application.hr1,
        Hr1Verification {
            hr1_id: actor.user_id,
            hr1_signature: input.signature.into_inner(),
            hr1_date: now,
        },
        "hr1",
    )?;
    application.status = next;
    application.updated_at = now;

    commit(repository, actor, &application, bound, "HR verified".to_string(), None, now)
}

pub(crate) fn gm_decision<R: ApplicationRepository>(
    repository: &R,
    actor: &ActorContext,
    mut application: GcrApplication,
    input: GcrGmDecisionInput,
    next: GcrStatus,
) -> Result<CommittedTransition> {
    let bound = GcrStatus::PendingGm;
    ensure_status(&application, bound)?;
    authorize::<GcrApplication>(actor, bound)?;
    require_prior(&application.hr1, "hr1")?;

    let (days_approved, action) = match input.decision {
        GcrDecision::Approved => {
            if input.days_approved == 0 {
                return Err(WorkflowError::validation("days_approved", "must be a positive whole number"));
            }
            if input.days_approved > application.days_requested {
                return Err(WorkflowError::validation(
                    "days_approved",
                    format!(
                        "{} exceeds the {} day(s) requested",
                        input.days_approved, application.days_requested
                    ),
                ));
            }
            (input.days_approved, format!("GM approved {} day(s)", input.days_approved))
        }
        GcrDecision::Rejected => (0, "GM rejected".to_string()),
    };

    let now = Utc::now();
    write_once(
        &mut application.gm_decision,
        GcrGmDecision {
            gm_id: actor.user_id,
            gm_decision: input.decision,
            gm_comments: input.comments.clone(),
            gm_days_approved: days_approved,
            gm_date: now,
        },
        "gm_decision",
    )?;
    application.status = next;
    application.updated_at = now;

    commit(repository, actor, &application, bound, action, input.comments, now)
}

pub(crate) fn hr2_recording<R: ApplicationRepository>(
    repository: &R,
    actor: &ActorContext,
    mut application: GcrApplication,
    input: Hr2RecordingInput,
    next: GcrStatus,
) -> Result<CommittedTransition> {
    let bound = GcrStatus::PendingHr2;
    ensure_status(&application, bound)?;
    authorize::<GcrApplication>(actor, bound)?;
    require_prior(&application.gm_decision, "gm_decision")?;

    let now = Utc::now();
    write_once(
        &mut application.hr2,
        Hr2Recording {
            hr2_id: actor.user_id,
            hr2_signature: input.signature.into_inner(),
            hr2_date: now,
        },
        "hr2",
    )?;
    application.status = next;
    application.updated_at = now;

    commit(repository, actor, &application, bound, "HR recorded approval".to_string(), None, now)
}

pub(crate) fn hr3_lampiran_a<R: ApplicationRepository>(
    repository: &R,
    actor: &ActorContext,
    mut application: GcrApplication,
    input: Hr3LampiranInput,
    next: GcrStatus,
) -> Result<CommittedTransition> {
    let bound = GcrStatus::PendingHr3;
    ensure_status(&application, bound)?;
    authorize::<GcrApplication>(actor, bound)?;
    require_prior(&application.hr2, "hr2")?;

    let details = input.lampiran;
    if details.gc_days_approved > details.total_days_balance {
        return Err(WorkflowError::validation(
            "gc_days_approved",
            format!(
                "{} exceeds the leave balance of {} day(s)",
                details.gc_days_approved, details.total_days_balance
            ),
        ));
    }
    let expected_remaining = details.total_days_balance - details.gc_days_approved;
    if details.remaining_days != expected_remaining {
        return Err(WorkflowError::validation(
            "remaining_days",
            format!("must equal total_days_balance - gc_days_approved ({})", expected_remaining),
        ));
    }

    let now = Utc::now();
    let signature = input.signature.into_inner();
    write_once(
        &mut application.lampiran_a,
        LampiranA {
            employee_id: details.employee_id,
            total_days_balance: details.total_days_balance,
            gc_days_approved: details.gc_days_approved,
            remaining_days: details.remaining_days,
            verified_date: details.verified_date.unwrap_or_else(|| now.date_naive()),
            hr3_signature: signature.clone(),
            gm_final_signature: None,
            finalized_date: None,
        },
        "lampiran_a",
    )?;
    write_once(
        &mut application.hr3,
        Hr3Verification {
            hr3_id: actor.user_id,
            hr3_signature: signature,
            hr3_date: now,
        },
        "hr3",
    )?;
    application.status = next;
    application.updated_at = now;

    commit(
        repository,
        actor,
        &application,
        bound,
        "HR verified leave balance (Lampiran A)".to_string(),
        None,
        now,
    )
}

pub(crate) fn gm_final<R: ApplicationRepository>(
    repository: &R,
    actor: &ActorContext,
    mut application: GcrApplication,
    input: GmFinalInput,
    next: GcrStatus,
) -> Result<CommittedTransition> {
    let bound = GcrStatus::PendingGmFinal;
    ensure_status(&application, bound)?;
    authorize::<GcrApplication>(actor, bound)?;

    let now = Utc::now();
    let signature = input.signature.into_inner();

    // Lampiran A is amended exactly once, here
    let lampiran = application.lampiran_a.as_mut()
        .ok_or_else(|| WorkflowError::InvalidState("lampiran_a has not been recorded".to_string()))?;
    write_once(&mut lampiran.gm_final_signature, signature.clone(), "lampiran_a.gm_final_signature")?;
    write_once(&mut lampiran.finalized_date, now, "lampiran_a.finalized_date")?;

    write_once(
        &mut application.gm_final,
        GmFinalSignoff {
            gm_final_id: actor.user_id,
            gm_final_signature: signature,
            gm_final_date: now,
        },
        "gm_final",
    )?;
    application.status = next;
    application.updated_at = now;

    commit(repository, actor, &application, bound, "GM final approval".to_string(), None, now)
}
