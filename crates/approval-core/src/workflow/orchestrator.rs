//! Workflow orchestrator with strongly-typed steps
//!
//! Loads the application, looks up the next status, dispatches to the step
//! processor bound to the current status and, once the processor's write
//! has committed, records history and emits the notification. Those two
//! follow-ups are best effort: their failures are logged, never returned.

use approval_types::{
    ActorContext, ApplicationId, ApplicationType, GcrDecision, GcrStatus, Role, TrainingDecision,
    TrainingStatus,
};
use chrono::Datelike;
use std::str::FromStr;

use super::application_types::{
    CommittedTransition, GcrApplication, HistoryEntry, Notification, PendingWork, TrainingApplication,
};
use super::processors::{authorize, gcr, training};
use super::step_inputs::{
    GcrGmDecisionInput, GmFinalInput, HodReviewInput, Hr1VerificationInput, Hr2RecordingInput,
    Hr3LampiranInput, HrReviewInput, Signature, TrainingGmInput,
};
use super::traits::{ApplicationRecord, ApplicationRepository, HistoryLog, NotificationEmitter};
use super::transitions::{next_gcr_status, next_training_status, Trigger};
use crate::constants::{DEFAULT_TRAINING_REFERENCE_PREFIX, EARLIEST_LEAVE_YEAR};
use crate::error::{FieldError, Result, WorkflowError};
use crate::types::{GcrSubmission, StepData, TrainingSubmission};

/// Single orchestration component with hard-coded workflow steps
pub struct WorkflowOrchestrator<R: ApplicationRepository> {
    repository: R,
    history: Box<dyn HistoryLog>,
    notifier: Box<dyn NotificationEmitter>,
    reference_prefix: String,
}

/// Turn the caller's decision token into a trigger for `status`.
///
/// Branching steps need a recognised token. Single-path steps take none; a
/// token sent to one anyway is ignored.
fn resolve_trigger<D: FromStr>(
    status: &'static str,
    requires_decision: bool,
    decision: Option<&str>,
) -> Result<Trigger<D>> {
    let token = decision.map(str::trim).filter(|t| !t.is_empty());

    if !requires_decision {
        if let Some(token) = token {
            log::debug!("Ignoring decision '{}' for single-path status '{}'", token, status);
        }
        return Ok(Trigger::Advance);
    }

    let token = token.ok_or_else(|| {
        WorkflowError::InvalidTransition(format!("status '{}' requires a decision", status))
    })?;

    token.parse::<D>()
        .map(Trigger::Decide)
        .map_err(|_| {
            WorkflowError::InvalidTransition(format!(
                "'{}' is not a valid decision for status '{}'", token, status
            ))
        })
}

fn decision_of<D>(trigger: Trigger<D>, status: &'static str) -> Result<D> {
    match trigger {
        Trigger::Decide(decision) => Ok(decision),
        Trigger::Advance => Err(WorkflowError::InvalidTransition(format!(
            "status '{}' requires a decision", status
        ))),
    }
}

fn no_transition(kind: ApplicationType, id: &ApplicationId, status: &'static str) -> WorkflowError {
    WorkflowError::InvalidTransition(format!(
        "{} application {} cannot move on from '{}' with this action", kind, id, status
    ))
}

impl<R: ApplicationRepository> WorkflowOrchestrator<R> {
    pub fn new(
        repository: R,
        history: Box<dyn HistoryLog>,
        notifier: Box<dyn NotificationEmitter>,
    ) -> Self {
        Self {
            repository,
            history,
            notifier,
            reference_prefix: DEFAULT_TRAINING_REFERENCE_PREFIX.to_string(),
        }
    }

    /// Prefix used for auto-generated training reference numbers
    pub fn with_reference_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.reference_prefix = prefix.into();
        self
    }

    pub fn repository(&self) -> &R {
        &self.repository
    }

    fn load<A: ApplicationRecord>(&self, id: &ApplicationId) -> Result<A> {
        self.repository
            .get::<A>(id)?
            .ok_or_else(|| WorkflowError::NotFound(format!("{} application {}", A::KIND, id)))
    }

    /// Fan a committed transition out to the history log and the notifier
    fn publish(&self, transition: &CommittedTransition) {
        log::info!(
            "{} application {}: '{}' -> '{}' ({}) by user {} as {}",
            transition.application_type,
            transition.application_id,
            transition.from_status,
            transition.to_status,
            transition.action,
            transition.actor.user_id,
            transition.actor.role
        );

        if let Err(e) = self.history.append(&HistoryEntry::from(transition)) {
            log::error!(
                "Failed to record history for {} application {}: {}",
                transition.application_type, transition.application_id, e
            );
        }

        if let Err(e) = self.notifier.notify(&Notification::from(transition)) {
            log::error!(
                "Failed to notify user {} about {} application {}: {}",
                transition.owner, transition.application_type, transition.application_id, e
            );
        }
    }

    /// Create a training application; it starts waiting for the HOD
    pub fn submit_training(
        &self,
        actor: &ActorContext,
        submission: TrainingSubmission,
    ) -> Result<TrainingApplication> {
        let mut errors = Vec::new();
        if submission.programme_title.trim().is_empty() {
            errors.push(FieldError::new("programme_title", "is required"));
        }
        if submission.organiser.trim().is_empty() {
            errors.push(FieldError::new("organiser", "is required"));
        }
        if submission.end_date < submission.start_date {
            errors.push(FieldError::new("end_date", "must not be before start_date"));
        }
        if let Err(e) = Signature::parse("applicant_signature", Some(&submission.applicant_signature)) {
            errors.push(e);
        }
        if !errors.is_empty() {
            return Err(WorkflowError::Validation(errors));
        }

        let application = TrainingApplication::new(actor.user_id, submission);
        self.repository.insert(&application)?;

        log::info!(
            "User {} submitted training application {} ('{}', {} day(s))",
            actor.user_id, application.id, application.programme_title, application.days_requested()
        );
        Ok(application)
    }

    /// Create a GCR application; it starts waiting for HR verification
    pub fn submit_gcr(&self, actor: &ActorContext, submission: GcrSubmission) -> Result<GcrApplication> {
        let mut errors = Vec::new();
        if submission.days_requested == 0 {
            errors.push(FieldError::new("days_requested", "must be a positive whole number"));
        }
        let latest_year = chrono::Utc::now().year() + 1;
        if !(EARLIEST_LEAVE_YEAR..=latest_year).contains(&submission.leave_year) {
            errors.push(FieldError::new(
                "leave_year",
                format!("must be between {} and {}", EARLIEST_LEAVE_YEAR, latest_year),
            ));
        }
        if let Err(e) = Signature::parse("applicant_signature", Some(&submission.applicant_signature)) {
            errors.push(e);
        }
        if !errors.is_empty() {
            return Err(WorkflowError::Validation(errors));
        }

        let application = GcrApplication::new(actor.user_id, submission);
        self.repository.insert(&application)?;

        log::info!(
            "User {} submitted GCR application {} for {} day(s)",
            actor.user_id, application.id, application.days_requested
        );
        Ok(application)
    }

    /// Advance a training application by one step
    pub fn process_training_workflow(
        &self,
        actor: &ActorContext,
        id: &ApplicationId,
        decision: Option<&str>,
        data: &StepData,
    ) -> Result<TrainingStatus> {
        let application: TrainingApplication = self.load(id)?;
        let current = application.status;
        let label = current.as_str();

        log::debug!("Processing training application {} at '{}'", id, label);

        let trigger = resolve_trigger::<TrainingDecision>(label, current.requires_decision(), decision)?;
        let next = next_training_status(current, trigger)
            .ok_or_else(|| no_transition(ApplicationType::Training, id, label))?;
        authorize::<TrainingApplication>(actor, current)?;

        let repository = &self.repository;
        let transition = match current {
            TrainingStatus::PendingHod => {
                let input = HodReviewInput::from_step_data(decision_of(trigger, label)?, data)?;
                training::hod_review(repository, actor, application, input, next)?
            }
            TrainingStatus::PendingHr => {
                let input = HrReviewInput::from_step_data(data)?;
                training::hr_review(repository, actor, application, input, next, &self.reference_prefix)?
            }
            TrainingStatus::PendingGm => {
                let input = TrainingGmInput::from_step_data(decision_of(trigger, label)?, data)?;
                training::gm_decision(repository, actor, application, input, next)?
            }
            TrainingStatus::Approved | TrainingStatus::Rejected => {
                return Err(no_transition(ApplicationType::Training, id, label));
            }
        };

        self.publish(&transition);
        Ok(next)
    }

    /// Advance a GCR application by one step
    pub fn process_gcr_workflow(
        &self,
        actor: &ActorContext,
        id: &ApplicationId,
        decision: Option<&str>,
        data: &StepData,
    ) -> Result<GcrStatus> {
        let application: GcrApplication = self.load(id)?;
        let current = application.status;
        let label = current.as_str();

        log::debug!("Processing GCR application {} at '{}'", id, label);

        let trigger = resolve_trigger::<GcrDecision>(label, current.requires_decision(), decision)?;
        let next = next_gcr_status(current, trigger)
            .ok_or_else(|| no_transition(ApplicationType::Gcr, id, label))?;
        authorize::<GcrApplication>(actor, current)?;

        let repository = &self.repository;
        let transition = match current {
            GcrStatus::PendingHr1 => {
                let input = Hr1VerificationInput::from_step_data(data)?;
                gcr::hr1_verification(repository, actor, application, input, next)?
            }
            GcrStatus::PendingGm => {
                let input = GcrGmDecisionInput::from_step_data(decision_of(trigger, label)?, data)?;
                gcr::gm_decision(repository, actor, application, input, next)?
            }
            GcrStatus::PendingHr2 => {
                let input = Hr2RecordingInput::from_step_data(data)?;
                gcr::hr2_recording(repository, actor, application, input, next)?
            }
            GcrStatus::PendingHr3 => {
                let input = Hr3LampiranInput::from_step_data(data)?;
                gcr::hr3_lampiran_a(repository, actor, application, input, next)?
            }
            GcrStatus::PendingGmFinal => {
                let input = GmFinalInput::from_step_data(data)?;
                gcr::gm_final(repository, actor, application, input, next)?
            }
            GcrStatus::Approved | GcrStatus::Rejected => {
                return Err(no_transition(ApplicationType::Gcr, id, label));
            }
        };

        self.publish(&transition);
        Ok(next)
    }

    pub fn training_application(&self, id: &ApplicationId) -> Result<TrainingApplication> {
        self.load(id)
    }

    pub fn gcr_application(&self, id: &ApplicationId) -> Result<GcrApplication> {
        self.load(id)
    }

    /// Audit trail of one application, oldest first
    pub fn history(&self, kind: ApplicationType, id: &ApplicationId) -> Result<Vec<HistoryEntry>> {
        self.history.entries_for(kind, id)
    }

    /// Everything currently waiting on `role`
    pub fn pending_for(&self, role: Role) -> Result<PendingWork> {
        let training = self.repository
            .list::<TrainingApplication>()?
            .into_iter()
            .filter(|a| a.status.acting_role() == Some(role))
            .collect();

        let gcr = self.repository
            .list::<GcrApplication>()?
            .into_iter()
            .filter(|a| a.status.acting_role() == Some(role))
            .collect();

        Ok(PendingWork { training, gcr })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflow::application_store::FileApplicationStore;
    use crate::workflow::history_log::FileHistoryLog;
    use crate::workflow::processors::test_support::{gcr_submission, training_submission, SIGNATURE};
    use approval_types::UserId;
    use serde_json::json;
    use tempfile::TempDir;

    struct FailingNotifier;

    impl NotificationEmitter for FailingNotifier {
        fn notify(&self, _notification: &Notification) -> Result<()> {
            Err(WorkflowError::Persistence("mail server down".to_string()))
        }
    }

    fn orchestrator(dir: &TempDir) -> WorkflowOrchestrator<FileApplicationStore> {
        WorkflowOrchestrator::new(
            FileApplicationStore::new(dir.path()).unwrap(),
            Box::new(FileHistoryLog::new(dir.path()).unwrap()),
            Box::new(FailingNotifier),
        )
    }

    fn actor(id: i64, role: Role) -> ActorContext {
        ActorContext::new(UserId::new(id), role)
    }

    #[test]
    fn test_notification_failure_does_not_fail_transition() {
        let dir = TempDir::new().unwrap();
        let engine = orchestrator(&dir);
        let application = engine.submit_gcr(&actor(1, Role::Staff), gcr_submission(4)).unwrap();

        let data = StepData { signature: Some(SIGNATURE.to_string()), ..Default::default() };
        let status = engine
            .process_gcr_workflow(&actor(2, Role::Hr), &application.id, None, &data)
            .unwrap();

        assert_eq!(status, GcrStatus::PendingGm);
        assert_eq!(engine.history(ApplicationType::Gcr, &application.id).unwrap().len(), 1);
    }

    #[test]
    fn test_decision_ignored_on_single_path_step() {
        let dir = TempDir::new().unwrap();
        let engine = orchestrator(&dir);
        let application = engine.submit_gcr(&actor(1, Role::Staff), gcr_submission(4)).unwrap();

        let data = StepData { signature: Some(SIGNATURE.to_string()), ..Default::default() };
        let status = engine
            .process_gcr_workflow(&actor(2, Role::Hr), &application.id, Some("rejected"), &data)
            .unwrap();

        assert_eq!(status, GcrStatus::PendingGm);
    }

    #[test]
    fn test_branching_step_needs_recognised_decision() {
        let dir = TempDir::new().unwrap();
        let engine = orchestrator(&dir);
        let application = engine.submit_training(&actor(1, Role::Staff), training_submission()).unwrap();
        let hod = actor(2, Role::Hod);

        for decision in [None, Some(""), Some("approve"), Some("approved")] {
            let err = engine
                .process_training_workflow(&hod, &application.id, decision, &StepData::default())
                .unwrap_err();
            assert!(matches!(err, WorkflowError::InvalidTransition(_)), "{:?} gave {:?}", decision, err);
        }

        let saved = engine.training_application(&application.id).unwrap();
        assert_eq!(saved.status, TrainingStatus::PendingHod);
        assert!(engine.history(ApplicationType::Training, &application.id).unwrap().is_empty());
    }

    #[test]
    fn test_submission_validation() {
        let dir = TempDir::new().unwrap();
        let engine = orchestrator(&dir);

        let mut submission = training_submission();
        submission.programme_title = " ".to_string();
        submission.end_date = submission.start_date.pred_opt().unwrap();
        submission.applicant_signature = "scribble".to_string();

        let err = engine.submit_training(&actor(1, Role::Staff), submission).unwrap_err();
        let fields: Vec<_> = err.field_errors().iter().map(|e| e.field).collect();
        assert_eq!(fields, vec!["programme_title", "end_date", "applicant_signature"]);

        let err = engine.submit_gcr(&actor(1, Role::Staff), gcr_submission(0)).unwrap_err();
        assert_eq!(err.field_errors()[0].field, "days_requested");
    }

    #[test]
    fn test_pending_for_role() {
        let dir = TempDir::new().unwrap();
        let engine = orchestrator(&dir);
        let staff = actor(1, Role::Staff);

        engine.submit_training(&staff, training_submission()).unwrap();
        let gcr = engine.submit_gcr(&staff, gcr_submission(2)).unwrap();

        assert_eq!(engine.pending_for(Role::Hod).unwrap().training.len(), 1);
        assert_eq!(engine.pending_for(Role::Hr).unwrap().gcr.len(), 1);
        assert!(engine.pending_for(Role::Gm).unwrap().is_empty());

        let data = StepData::from_json(json!({ "signature": SIGNATURE })).unwrap();
        engine.process_gcr_workflow(&actor(2, Role::Hr), &gcr.id, None, &data).unwrap();

        assert!(engine.pending_for(Role::Hr).unwrap().is_empty());
        assert_eq!(engine.pending_for(Role::Gm).unwrap().gcr[0].id, gcr.id);
    }
}
