//! Approval Core Library
//!
//! Multi-step approval engine for Training and GCR applications: transition
//! tables, step processors, the orchestrator, and file-backed storage for
//! applications, history and notifications.

pub mod config;
pub mod constants;
pub mod error;
pub mod notifiers;
pub mod paths;
pub mod types;
pub mod workflow;

// Re-export main types for easy access
pub use config::{NotificationSink, WorkflowConfig};
pub use error::{FieldError, Result, WorkflowError};
pub use types::{GcrSubmission, LampiranADetails, StepData, TrainingSubmission};

// Re-export workflow types
pub use workflow::{
    ApplicationRecord,
    ApplicationRepository,
    CommittedTransition,
    FileApplicationStore,
    FileHistoryLog,
    GcrApplication,
    HealthCheckResult,
    HealthStatus,
    HistoryEntry,
    HistoryLog,
    Notification,
    NotificationEmitter,
    PendingWork,
    StateCountMap,
    TrainingApplication,
    WorkflowOrchestrator,
};

/// Orchestrator wired to the file-backed store and history log
pub type FileWorkflowOrchestrator = WorkflowOrchestrator<FileApplicationStore>;
