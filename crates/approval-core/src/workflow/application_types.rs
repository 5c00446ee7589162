//! Strongly typed application records, history entries and notifications
//!
//! Each approval step owns one `Option<...>` group of fields on the record.
//! A group is `None` until its step has executed and is never replaced after.

use approval_types::{
    ActorContext, ApplicationId, ApplicationType, GcrDecision, GcrStatus, Role,
    TrainingDecision, TrainingStatus, UserId,
};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

use super::traits::ApplicationRecord;
use crate::types::{GcrSubmission, TrainingSubmission};

/// HOD recommendation on a training application
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HodReview {
    pub hod_id: UserId,
    pub hod_decision: TrainingDecision,
    pub hod_comments: Option<String>,
    pub hod_date: DateTime<Utc>,
}

/// HR budget review on a training application
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HrReview {
    pub hr_id: UserId,
    pub hr_comments: Option<String>,
    pub budget_status: Option<String>,
    pub credit_hours: Option<u32>,
    pub budget_comments: Option<String>,
    pub hr_date: DateTime<Utc>,
    pub reference_number: String,
}

/// GM decision on a training application
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingGmDecision {
    pub gm_id: UserId,
    pub gm_decision: TrainingDecision,
    pub gm_comments: Option<String>,
    pub gm_date: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingApplication {
    pub id: ApplicationId,
    pub user_id: UserId,
    pub status: TrainingStatus,

    pub programme_title: String,
    pub organiser: String,
    pub venue: Option<String>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub objectives: Option<String>,
    pub applicant_signature: String,

    pub hod_review: Option<HodReview>,
    pub hr_review: Option<HrReview>,
    pub gm_decision: Option<TrainingGmDecision>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TrainingApplication {
    /// Create a new application waiting for the applicant's HOD
    pub fn new(owner: UserId, submission: TrainingSubmission) -> Self {
        let now = Utc::now();
        Self {
            id: ApplicationId::new(),
            user_id: owner,
            status: TrainingStatus::PendingHod,
            programme_title: submission.programme_title.trim().to_string(),
            organiser: submission.organiser.trim().to_string(),
            venue: submission.venue,
            start_date: submission.start_date,
            end_date: submission.end_date,
            objectives: submission.objectives,
            applicant_signature: submission.applicant_signature,
            hod_review: None,
            hr_review: None,
            gm_decision: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Training length in calendar days, both ends inclusive
    pub fn days_requested(&self) -> i64 {
        (self.end_date - self.start_date).num_days() + 1
    }
}

impl ApplicationRecord for TrainingApplication {
    type Status = TrainingStatus;
    const KIND: ApplicationType = ApplicationType::Training;

    fn id(&self) -> &ApplicationId {
        &self.id
    }

    fn owner(&self) -> UserId {
        self.user_id
    }

    fn status(&self) -> TrainingStatus {
        self.status
    }

    fn status_label(status: TrainingStatus) -> &'static str {
        status.as_str()
    }

    fn acting_role(status: TrainingStatus) -> Option<Role> {
        status.acting_role()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hr1Verification {
    pub hr1_id: UserId,
    pub hr1_signature: String,
    pub hr1_date: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GcrGmDecision {
    pub gm_id: UserId,
    pub gm_decision: GcrDecision,
    pub gm_comments: Option<String>,
    /// Always 0 when rejected
    pub gm_days_approved: u32,
    pub gm_date: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hr2Recording {
    pub hr2_id: UserId,
    pub hr2_signature: String,
    pub hr2_date: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hr3Verification {
    pub hr3_id: UserId,
    pub hr3_signature: String,
    pub hr3_date: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GmFinalSignoff {
    pub gm_final_id: UserId,
    pub gm_final_signature: String,
    pub gm_final_date: DateTime<Utc>,
}

/// Leave-balance statement attached by HR3 and co-signed by the GM.
/// The `gm_final_*` fields stay empty until the final step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LampiranA {
    pub employee_id: String,
    pub total_days_balance: u32,
    pub gc_days_approved: u32,
    pub remaining_days: u32,
    pub verified_date: NaiveDate,
    pub hr3_signature: String,
    pub gm_final_signature: Option<String>,
    pub finalized_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GcrApplication {
    pub id: ApplicationId,
    pub user_id: UserId,
    pub status: GcrStatus,

    pub days_requested: u32,
    pub leave_year: i32,
    pub reason: Option<String>,
    pub applicant_signature: String,

    pub hr1: Option<Hr1Verification>,
    pub gm_decision: Option<GcrGmDecision>,
    pub hr2: Option<Hr2Recording>,
    pub hr3: Option<Hr3Verification>,
    pub lampiran_a: Option<LampiranA>,
    pub gm_final: Option<GmFinalSignoff>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl GcrApplication {
    /// Create a new application waiting for HR verification
    pub fn new(owner: UserId, submission: GcrSubmission) -> Self {
        let now = Utc::now();
        Self {
            id: ApplicationId::new(),
            user_id: owner,
            status: GcrStatus::PendingHr1,
            days_requested: submission.days_requested,
            leave_year: submission.leave_year,
            reason: submission.reason,
            applicant_signature: submission.applicant_signature,
            hr1: None,
            gm_decision: None,
            hr2: None,
            hr3: None,
            lampiran_a: None,
            gm_final: None,
            created_at: now,
            updated_at: now,
        }
    }
}

impl ApplicationRecord for GcrApplication {
    type Status = GcrStatus;
    const KIND: ApplicationType = ApplicationType::Gcr;

    fn id(&self) -> &ApplicationId {
        &self.id
    }

    fn owner(&self) -> UserId {
        self.user_id
    }

    fn status(&self) -> GcrStatus {
        self.status
    }

    fn status_label(status: GcrStatus) -> &'static str {
        status.as_str()
    }

    fn acting_role(status: GcrStatus) -> Option<Role> {
        status.acting_role()
    }
}

/// A status change that has been durably written.
///
/// Step processors hand this back to the orchestrator, which fans it out to
/// the history log and the notification emitter.
#[derive(Debug, Clone, Serialize)]
pub struct CommittedTransition {
    pub application_type: ApplicationType,
    pub application_id: ApplicationId,
    pub owner: UserId,
    pub actor: ActorContext,
    pub from_status: &'static str,
    pub to_status: &'static str,
    pub action: String,
    pub comments: Option<String>,
    pub committed_at: DateTime<Utc>,
}

/// Immutable audit record of one transition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub application_type: ApplicationType,
    pub application_id: ApplicationId,
    pub action: String,
    pub resulting_status: String,
    pub actor_user_id: UserId,
    pub actor_role: Role,
    pub comments: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl From<&CommittedTransition> for HistoryEntry {
    fn from(transition: &CommittedTransition) -> Self {
        Self {
            application_type: transition.application_type,
            application_id: transition.application_id.clone(),
            action: transition.action.clone(),
            resulting_status: transition.to_status.to_string(),
            actor_user_id: transition.actor.user_id,
            actor_role: transition.actor.role,
            comments: transition.comments.clone(),
            timestamp: transition.committed_at,
        }
    }
}

/// Event handed to the notification emitter after a transition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub notification_id: String,
    pub application_type: ApplicationType,
    pub application_id: ApplicationId,
    pub recipient: UserId,
    pub status: String,
    pub message: String,
    pub comments: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<&CommittedTransition> for Notification {
    fn from(transition: &CommittedTransition) -> Self {
        let kind = match transition.application_type {
            ApplicationType::Training => "training",
            ApplicationType::Gcr => "GCR",
        };

        Self {
            notification_id: uuid::Uuid::new_v4().to_string(),
            application_type: transition.application_type,
            application_id: transition.application_id.clone(),
            recipient: transition.owner,
            status: transition.to_status.to_string(),
            message: format!(
                "Your {} application {}: {} (now {})",
                kind, transition.application_id, transition.action, transition.to_status
            ),
            comments: transition.comments.clone(),
            created_at: transition.committed_at,
        }
    }
}

/// Applications currently waiting on one role
#[derive(Debug, Clone, Default, Serialize)]
pub struct PendingWork {
    pub training: Vec<TrainingApplication>,
    pub gcr: Vec<GcrApplication>,
}

impl PendingWork {
    pub fn len(&self) -> usize {
        self.training.len() + self.gcr.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Health check status enum
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HealthStatus {
    Healthy,
    Degraded,
    Unhealthy,
}

/// Application counts keyed by `<type>:<status>`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StateCountMap {
    counts: BTreeMap<String, usize>,
}

impl StateCountMap {
    pub fn new() -> Self {
        Self::default()
    }

    fn key(kind: ApplicationType, status: &str) -> String {
        format!("{}:{}", kind, status)
    }

    pub fn increment(&mut self, kind: ApplicationType, status: &str) {
        *self.counts.entry(Self::key(kind, status)).or_insert(0) += 1;
    }

    pub fn get(&self, kind: ApplicationType, status: &str) -> usize {
        self.counts.get(&Self::key(kind, status)).copied().unwrap_or(0)
    }

    pub fn total(&self) -> usize {
        self.counts.values().sum()
    }
}

/// Health check result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthCheckResult {
    pub status: HealthStatus,
    pub counts: StateCountMap,
    pub total_applications: usize,
    pub unreadable_records: usize,
    pub root_path: PathBuf,
    pub last_check: DateTime<Utc>,
}
