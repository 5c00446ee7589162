//! Workflow management module

pub mod application_store;
pub mod application_types;
pub mod history_log;
pub mod orchestrator;
pub mod processors;
pub mod step_inputs;
pub mod traits;
pub mod transitions;

pub use application_store::FileApplicationStore;
pub use application_types::*;
pub use history_log::FileHistoryLog;
pub use orchestrator::WorkflowOrchestrator;
pub use step_inputs::Signature;
pub use traits::{ApplicationRecord, ApplicationRepository, HistoryLog, NotificationEmitter};
pub use transitions::{next_gcr_status, next_training_status, Trigger};
