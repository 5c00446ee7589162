//! Action inbox watcher
//!
//! Other systems drop one JSON `ActionRequest` per file into `actions/`.
//! Each file is run through the orchestrator and then moved to
//! `actions/processed/` or `actions/failed/` depending on the outcome.

use anyhow::{anyhow, Context, Result};
use approval_core::{paths, FileWorkflowOrchestrator, StepData};
use approval_types::{ActorContext, ApplicationId, ApplicationType};
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use serde::Deserialize;
use std::path::Path;
use std::sync::mpsc::channel;
use std::time::Duration;

/// One workflow action requested through the inbox
#[derive(Debug, Clone, Deserialize)]
pub struct ActionRequest {
    pub application_type: ApplicationType,
    pub application_id: ApplicationId,
    pub actor: ActorContext,
    #[serde(default)]
    pub decision: Option<String>,
    #[serde(default)]
    pub data: StepData,
}

/// Where a handled action file ended up
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionOutcome {
    Processed,
    Failed,
}

fn is_action_file(path: &Path) -> bool {
    path.is_file() && path.extension().and_then(|s| s.to_str()) == Some("json")
}

fn run_action(engine: &FileWorkflowOrchestrator, request: &ActionRequest) -> Result<String> {
    let decision = request.decision.as_deref();

    let status = match request.application_type {
        ApplicationType::Training => engine
            .process_training_workflow(&request.actor, &request.application_id, decision, &request.data)?
            .as_str(),
        ApplicationType::Gcr => engine
            .process_gcr_workflow(&request.actor, &request.application_id, decision, &request.data)?
            .as_str(),
    };

    Ok(status.to_string())
}

/// Run one action file and move it out of the inbox
pub fn process_action_file(
    engine: &FileWorkflowOrchestrator,
    action_path: &Path,
    root: &Path,
) -> Result<ActionOutcome> {
    let file_name = action_path.file_name()
        .ok_or_else(|| anyhow!("Invalid action file name: {:?}", action_path))?;

    log::info!("Processing action file: {:?}", file_name);

    let content = std::fs::read_to_string(action_path)
        .with_context(|| format!("Failed to read {:?}", action_path))?;

    let result = serde_json::from_str::<ActionRequest>(&content)
        .map_err(|e| anyhow!("Failed to parse ActionRequest JSON: {}", e))
        .and_then(|request| run_action(engine, &request));

    let outcome = match &result {
        Ok(status) => {
            log::info!("Action {:?} applied, application is now '{}'", file_name, status);
            ActionOutcome::Processed
        }
        Err(e) => {
            log::error!("Action {:?} failed: {}", file_name, e);
            ActionOutcome::Failed
        }
    };

    let destination_dir = match outcome {
        ActionOutcome::Processed => paths::actions_processed_dir(root),
        ActionOutcome::Failed => paths::actions_failed_dir(root),
    };
    std::fs::rename(action_path, destination_dir.join(file_name))
        .with_context(|| format!("Failed to move {:?} to {:?}", action_path, destination_dir))?;

    Ok(outcome)
}

/// Process whatever is already queued, then block on new files
pub fn watch_actions(engine: &FileWorkflowOrchestrator, root: &Path) -> Result<()> {
    let actions_path = paths::actions_dir(root);
    paths::ensure_layout(root)?;

    let (tx, rx) = channel();
    let mut watcher = RecommendedWatcher::new(
        move |result: std::result::Result<Event, notify::Error>| {
            if let Ok(event) = result {
                let _ = tx.send(event);
            }
        },
        notify::Config::default(),
    )?;
    watcher.watch(&actions_path, RecursiveMode::NonRecursive)?;

    log::info!("Monitoring workflow actions in {}/", actions_path.display());

    let mut queued: Vec<_> = std::fs::read_dir(&actions_path)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| is_action_file(path))
        .collect();
    queued.sort();

    for path in queued {
        if let Err(e) = process_action_file(engine, &path, root) {
            log::error!("Failed to handle action file {:?}: {}", path, e);
        }
    }

    loop {
        match rx.recv() {
            Ok(event) => {
                log::debug!("File system event: {:?}", event);

                if let EventKind::Create(_) | EventKind::Modify(_) = event.kind {
                    for path in event.paths.iter().filter(|path| is_action_file(path)) {
                        if let Err(e) = process_action_file(engine, path, root) {
                            log::error!("Failed to handle action file {:?}: {}", path, e);
                        }
                    }
                }
            }
            Err(e) => {
                log::error!("Watcher error: {}", e);
                std::thread::sleep(Duration::from_secs(5));
            }
        }
    }
}
