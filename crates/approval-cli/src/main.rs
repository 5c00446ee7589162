//! Approval workflow command line
//!
//! Submits applications, advances them one step at a time, answers queries
//! against the data directory and can run as a watcher over the action inbox.

mod action_watcher;

use anyhow::{anyhow, Context, Result};
use approval_core::{
    notifiers, paths, FileApplicationStore, FileHistoryLog, FileWorkflowOrchestrator,
    GcrSubmission, StepData, TrainingSubmission, WorkflowConfig, WorkflowOrchestrator,
};
use approval_types::{ActorContext, ApplicationId, ApplicationType, Role, UserId};
use clap::{Arg, ArgMatches, Command};
use serde::Serialize;
use std::path::{Path, PathBuf};

fn application_args() -> [Arg; 2] {
    [
        Arg::new("type")
            .value_name("TYPE")
            .help("Application type: training or gcr")
            .required(true),
        Arg::new("id")
            .value_name("ID")
            .help("Application id")
            .required(true),
    ]
}

fn user_arg() -> Arg {
    Arg::new("user")
        .long("user")
        .short('u')
        .value_name("USER_ID")
        .help("Acting user id")
        .value_parser(clap::value_parser!(i64))
        .required(true)
}

fn role_arg() -> Arg {
    Arg::new("role")
        .long("role")
        .short('r')
        .value_name("ROLE")
        .help("Acting role: staff, hod, hr or gm")
        .required(true)
}

fn file_arg(help: &'static str) -> Arg {
    Arg::new("file")
        .long("file")
        .short('f')
        .value_name("FILE")
        .help(help)
        .required(true)
}

fn cli() -> Command {
    Command::new("approvals")
        .version("1.0.0")
        .about("Training and GCR approval workflow")
        .subcommand_required(true)
        .arg(
            Arg::new("config")
                .long("config")
                .short('c')
                .value_name("FILE")
                .help("Configuration file path")
                .global(true)
        )
        .arg(
            Arg::new("data-dir")
                .long("data-dir")
                .value_name("DIR")
                .help("Data directory for applications, history and notifications")
                .global(true)
        )
        .subcommand(
            Command::new("submit-training")
                .about("Submit a training application")
                .arg(user_arg())
                .arg(file_arg("JSON file with the training submission"))
        )
        .subcommand(
            Command::new("submit-gcr")
                .about("Submit a GCR application")
                .arg(user_arg())
                .arg(file_arg("JSON file with the GCR submission"))
        )
        .subcommand(
            Command::new("process")
                .about("Advance an application by one step")
                .args(application_args())
                .arg(user_arg())
                .arg(role_arg())
                .arg(
                    Arg::new("decision")
                        .long("decision")
                        .short('d')
                        .value_name("DECISION")
                        .help("Decision for branching steps, e.g. recommended or approved")
                )
                .arg(
                    Arg::new("data")
                        .long("data")
                        .value_name("JSON")
                        .help("Step data as a JSON object")
                        .conflicts_with("data-file")
                )
                .arg(
                    Arg::new("data-file")
                        .long("data-file")
                        .value_name("FILE")
                        .help("Step data read from a JSON file")
                )
        )
        .subcommand(
            Command::new("show")
                .about("Print an application")
                .args(application_args())
        )
        .subcommand(
            Command::new("history")
                .about("Print the audit trail of an application")
                .args(application_args())
        )
        .subcommand(
            Command::new("pending")
                .about("List applications waiting on a role")
                .arg(role_arg())
        )
        .subcommand(
            Command::new("health")
                .about("Report the state of the data directory")
        )
        .subcommand(
            Command::new("watch")
                .about("Process action files dropped into the actions directory")
        )
}

fn main() -> Result<()> {
    // Initialize logging with INFO as default if RUST_LOG not set
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or("info")
    ).init();

    let matches = cli().get_matches();

    let config_path = matches.get_one::<String>("config").map(PathBuf::from);
    let config = WorkflowConfig::load(config_path.as_deref())?;
    if let Some(path) = &config_path {
        log::info!("Loaded configuration from {}", path.display());
    }

    let data_dir = matches.get_one::<String>("data-dir")
        .map(PathBuf::from)
        .unwrap_or_else(|| config.storage.data_dir.clone());
    if let Err(e) = paths::init_data_root(data_dir) {
        log::warn!("Data root initialization warning: {}", e);
    }
    let root = paths::data_root();
    log::info!("Using data directory: {}", root.display());

    let engine = build_engine(&config, &root)?;

    match matches.subcommand() {
        Some(("submit-training", sub)) => {
            let submission: TrainingSubmission = read_json(sub, "file")?;
            let actor = ActorContext::new(user(sub)?, Role::Staff);
            print_json(&engine.submit_training(&actor, submission)?)
        }
        Some(("submit-gcr", sub)) => {
            let submission: GcrSubmission = read_json(sub, "file")?;
            let actor = ActorContext::new(user(sub)?, Role::Staff);
            print_json(&engine.submit_gcr(&actor, submission)?)
        }
        Some(("process", sub)) => process(&engine, sub),
        Some(("show", sub)) => {
            let (kind, id) = application(sub)?;
            match kind {
                ApplicationType::Training => print_json(&engine.training_application(&id)?),
                ApplicationType::Gcr => print_json(&engine.gcr_application(&id)?),
            }
        }
        Some(("history", sub)) => {
            let (kind, id) = application(sub)?;
            print_json(&engine.history(kind, &id)?)
        }
        Some(("pending", sub)) => print_json(&engine.pending_for(role(sub)?)?),
        Some(("health", _)) => {
            let health = engine.repository().health_check()?;
            log::info!("Store health: {:?}, {} application(s)", health.status, health.total_applications);
            print_json(&health)
        }
        Some(("watch", _)) => action_watcher::watch_actions(&engine, &root),
        _ => Err(anyhow!("No action specified. Use --help for options.")),
    }
}

fn build_engine(config: &WorkflowConfig, root: &Path) -> Result<FileWorkflowOrchestrator> {
    paths::ensure_layout(root)
        .with_context(|| format!("Failed to create data directory {}", root.display()))?;

    let engine = WorkflowOrchestrator::new(
        FileApplicationStore::new(root)?,
        Box::new(FileHistoryLog::new(root)?),
        notifiers::from_config(config.notifications.sink, root)?,
    )
    .with_reference_prefix(config.reference_numbers.training_prefix.clone());

    Ok(engine)
}

fn process(engine: &FileWorkflowOrchestrator, sub: &ArgMatches) -> Result<()> {
    let (kind, id) = application(sub)?;
    let actor = ActorContext::new(user(sub)?, role(sub)?);
    let decision = sub.get_one::<String>("decision").map(String::as_str);

    let data = match (sub.get_one::<String>("data"), sub.get_one::<String>("data-file")) {
        (Some(json), _) => serde_json::from_str(json).context("Invalid --data JSON")?,
        (None, Some(_)) => read_json(sub, "data-file")?,
        (None, None) => StepData::default(),
    };

    let status = match kind {
        ApplicationType::Training => engine.process_training_workflow(&actor, &id, decision, &data)?.as_str(),
        ApplicationType::Gcr => engine.process_gcr_workflow(&actor, &id, decision, &data)?.as_str(),
    };

    println!("{}", status);
    Ok(())
}

fn application(sub: &ArgMatches) -> Result<(ApplicationType, ApplicationId)> {
    let kind = required(sub, "type")?.parse::<ApplicationType>()?;
    let id = ApplicationId::from_string(required(sub, "id")?).map_err(|e| anyhow!(e))?;
    Ok((kind, id))
}

fn user(sub: &ArgMatches) -> Result<UserId> {
    sub.get_one::<i64>("user")
        .map(|id| UserId::new(*id))
        .ok_or_else(|| anyhow!("--user is required"))
}

fn role(sub: &ArgMatches) -> Result<Role> {
    Ok(required(sub, "role")?.parse::<Role>()?)
}

fn required<'a>(sub: &'a ArgMatches, name: &str) -> Result<&'a str> {
    sub.get_one::<String>(name)
        .map(String::as_str)
        .ok_or_else(|| anyhow!("missing argument '{}'", name))
}

fn read_json<T: serde::de::DeserializeOwned>(sub: &ArgMatches, name: &str) -> Result<T> {
    let path = required(sub, name)?;
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path))?;
    serde_json::from_str(&content).with_context(|| format!("Failed to parse {}", path))
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
