//! Plan/execute coding-mission runner.
//!
//! Plans a mission goal against a workspace, then executes the plan step by
//! step with a language model, recording everything under the workspace's
//! log directory.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use coder::error::CoderError;
use coder::exit_codes;
use coder::io::config::{load_config, resolve_config_path};
use coder::io::layout::WorkspacePaths;
use coder::io::llm::ChatClient;
use coder::io::persist::WorkspacePersister;
use coder::logging;
use coder::workflow::{DEFAULT_WORKFLOW, MissionOutcome, Phase, Workflow, run_mission};

#[derive(Parser)]
#[command(
    name = "coder",
    version,
    about = "Plan and execute a coding mission with a language model"
)]
struct Cli {
    /// Mission goal in natural language.
    #[arg(long)]
    request: String,

    /// Workflow selector.
    #[arg(long, default_value = DEFAULT_WORKFLOW)]
    agent: String,

    /// Target workspace directory (created if missing).
    #[arg(long, default_value = "./executions/test/")]
    workspace: PathBuf,

    /// Phases to run.
    #[arg(long, value_enum, default_value_t = Phase::All)]
    phase: Phase,

    /// Config file (defaults to `<workspace>/.caconfig.toml`).
    #[arg(long)]
    config: Option<PathBuf>,
}

fn main() {
    logging::init();
    let cli = Cli::parse();
    match run(cli) {
        Ok(outcome) => {
            print_summary(&outcome);
            std::process::exit(exit_codes::OK);
        }
        Err(err) => {
            eprintln!("{:#}", err);
            std::process::exit(exit_code_for(&err));
        }
    }
}

fn run(cli: Cli) -> Result<MissionOutcome> {
    let workflow: Workflow = cli.agent.parse()?;

    fs::create_dir_all(&cli.workspace)
        .with_context(|| format!("create workspace {}", cli.workspace.display()))?;
    let config_path = resolve_config_path(&cli.workspace, cli.config.as_deref());
    let config = load_config(&config_path)?;
    let paths = WorkspacePaths::new(&cli.workspace, &config);

    let model = ChatClient::from_config(&config.llm)?;
    let persister = WorkspacePersister::new(&cli.workspace);

    run_mission(
        workflow,
        cli.phase,
        &paths,
        &config,
        &model,
        &persister,
        &cli.request,
    )
}

fn exit_code_for(err: &anyhow::Error) -> i32 {
    match err.downcast_ref::<CoderError>() {
        Some(CoderError::UnknownWorkflow(_)) => exit_codes::UNKNOWN_WORKFLOW,
        _ => exit_codes::FAILED,
    }
}

fn print_summary(outcome: &MissionOutcome) {
    if let Some(planning) = &outcome.planning {
        println!(
            "planned {} step(s) -> {}",
            planning.record.steps, planning.record.plan_path
        );
    }
    if let Some(execution) = &outcome.execution {
        for record in &execution.records {
            println!("step {}: {}", record.step, record.persist_report);
        }
        println!(
            "registry: {} class(es), {} function(s), {} file(s)",
            execution.definitions.classes.len(),
            execution.definitions.functions.len(),
            execution.definitions.files.len()
        );
    }
}
