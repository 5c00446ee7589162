//! Shared fixtures for the workflow integration tests

#![allow(dead_code)]

use approval_core::notifiers::FileNotifier;
use approval_core::{
    FileApplicationStore, FileHistoryLog, FileWorkflowOrchestrator, GcrSubmission, StepData,
    TrainingSubmission, WorkflowOrchestrator,
};
use approval_types::{ActorContext, Role, UserId};
use chrono::NaiveDate;
use serde_json::json;
use std::path::Path;
use tempfile::TempDir;

pub const SIGNATURE: &str = "data:image/png;base64,iVBORw0KGgo=";

pub struct Harness {
    pub dir: TempDir,
    pub engine: FileWorkflowOrchestrator,
    pub inbox: FileNotifier,
}

/// Route engine logs through the test harness; `RUST_LOG=debug` shows them
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// A fully independent engine over `root`, as a second process would build it
pub fn engine_on(root: &Path) -> FileWorkflowOrchestrator {
    WorkflowOrchestrator::new(
        FileApplicationStore::new(root).unwrap(),
        Box::new(FileHistoryLog::new(root).unwrap()),
        Box::new(FileNotifier::new(root).unwrap()),
    )
}

pub fn harness() -> Harness {
    init_logging();

    let dir = TempDir::new().unwrap();
    let engine = engine_on(dir.path());
    let inbox = FileNotifier::new(dir.path()).unwrap();

    Harness { dir, engine, inbox }
}

pub fn staff() -> ActorContext {
    ActorContext::new(UserId::new(100), Role::Staff)
}

pub fn hod() -> ActorContext {
    ActorContext::new(UserId::new(200), Role::Hod)
}

pub fn hr() -> ActorContext {
    ActorContext::new(UserId::new(300), Role::Hr)
}

pub fn gm() -> ActorContext {
    ActorContext::new(UserId::new(400), Role::Gm)
}

pub fn training_submission() -> TrainingSubmission {
    TrainingSubmission {
        programme_title: "Occupational Safety Refresher".to_string(),
        organiser: "NIOSH".to_string(),
        venue: None,
        start_date: NaiveDate::from_ymd_opt(2026, 12, 7).unwrap(),
        end_date: NaiveDate::from_ymd_opt(2026, 12, 8).unwrap(),
        objectives: Some("Renew site safety certification".to_string()),
        applicant_signature: SIGNATURE.to_string(),
    }
}

pub fn gcr_submission(days_requested: u32) -> GcrSubmission {
    GcrSubmission {
        days_requested,
        leave_year: 2026,
        reason: None,
        applicant_signature: SIGNATURE.to_string(),
    }
}

pub fn data(value: serde_json::Value) -> StepData {
    StepData::from_json(value).unwrap()
}

pub fn signed() -> StepData {
    data(json!({ "signature": SIGNATURE }))
}

pub fn lampiran(total: u32, gc: u32, remaining: u32) -> StepData {
    data(json!({
        "hr3_signature": SIGNATURE,
        "lampiran_a_details": {
            "employee_id": "EMP-0042",
            "total_days_balance": total,
            "gc_days_approved": gc,
            "remaining_days": remaining,
        }
    }))
}
