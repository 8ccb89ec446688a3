//! `vro` command-line entry point.
//!
//! - `vro run` triggers a workflow, waits for it, and prints a JSON report
//! - `vro generate` turns a finished execution into an Ansible vars file and playbook

use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{ArgGroup, Args, Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use vro_api::HttpTransport;
use vro_engine::{PipelineError, Report, SystemClock, WorkflowOutcome, WorkflowRequest, fetch_execution_record, run_workflow};
use vro_gen::{DEFAULT_PLAYBOOK_TEMPLATE, PlaybookSettings, TemplateSyntax, write_artifacts};
use vro_types::{ExecutionHandle, ServerEndpoint, WorkflowReference};

mod config;
mod inputs;

use config::{ConnectionArgs, FileConfig, prompt_password};

/// Exit status for a workflow that ended `failed`, `canceled` or `timeout`.
const EXIT_WORKFLOW_UNSUCCESSFUL: u8 = 3;

#[derive(Debug, Parser)]
#[command(name = "vro", version, about = "Run vRealize Orchestrator workflows and generate Ansible playbooks for them")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Run a workflow and report how it ended
    Run(RunArgs),
    /// Write vro-vars.yml and vro-playbook.yml from a finished execution
    Generate(GenerateArgs),
}

#[derive(Debug, Args)]
#[command(group(ArgGroup::new("workflow").required(true).args(["name", "uuid"])))]
struct RunArgs {
    #[command(flatten)]
    connection: ConnectionArgs,

    /// Workflow name, resolved to its id on the server
    #[arg(long, short = 'n')]
    name: Option<String>,

    /// Workflow id
    #[arg(long)]
    uuid: Option<String>,

    /// YAML or JSON file with the workflow's input parameters
    #[arg(long)]
    inputs: Option<PathBuf>,

    /// Seconds to wait for the execution to finish [default: 600]
    #[arg(long, short = 't')]
    timeout: Option<u64>,

    /// Seconds between state checks [default: 2]
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    interval: Option<u64>,

    /// Return as soon as the execution has started
    #[arg(long)]
    no_wait: bool,
}

#[derive(Debug, Args)]
struct GenerateArgs {
    #[command(flatten)]
    connection: ConnectionArgs,

    #[arg(long, short = 'w', visible_alias = "workflowid")]
    workflow_id: String,

    #[arg(long, short = 'e', visible_alias = "executionid")]
    execution_id: String,

    /// Directory the two files are written to
    #[arg(long, short = 'o', default_value = ".")]
    output_dir: PathBuf,

    /// Playbook template to use instead of the built-in one
    #[arg(long)]
    template: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing();

    let result = match cli.command {
        Commands::Run(args) => run_command(args).await,
        Commands::Generate(args) => generate_command(args).await,
    };
    result.unwrap_or_else(|error| {
        eprintln!("error: {error:#}");
        ExitCode::FAILURE
    })
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn load_endpoint(connection: &ConnectionArgs, file: &FileConfig) -> Result<(ServerEndpoint, HttpTransport)> {
    let endpoint = connection.endpoint(file, prompt_password)?;
    let transport = match &connection.base_url {
        Some(base_url) => HttpTransport::with_base_url(base_url, &endpoint),
        None => HttpTransport::new(&endpoint),
    }
    .context("failed to set up the HTTP client")?;
    Ok((endpoint, transport))
}

async fn run_command(args: RunArgs) -> Result<ExitCode> {
    let file = FileConfig::load(&FileConfig::default_path())?;
    let reference = WorkflowReference::from_parts(args.name.clone(), args.uuid.clone()).context("pass exactly one of --name or --uuid")?;
    let mut request = WorkflowRequest::new(reference);
    if let Some(path) = &args.inputs {
        request.inputs = Some(inputs::load_inputs(path)?);
    }
    request.wait_for_completion = !args.no_wait;
    request.poll = file.poll_settings(args.timeout, args.interval);

    let cancel = CancellationToken::new();
    let ctrl_c = tokio::spawn({
        let cancel = cancel.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("interrupt received; no longer waiting for the execution");
                cancel.cancel();
            }
        }
    });

    let result = tokio::task::spawn_blocking(move || -> Result<Result<WorkflowOutcome, PipelineError>> {
        let (_, transport) = load_endpoint(&args.connection, &file)?;
        Ok(run_workflow(&transport, &request, &SystemClock, &cancel))
    })
    .await
    .context("workflow task panicked")??;
    ctrl_c.abort();

    let status = exit_status(&result);
    if let Err(error) = &result {
        eprintln!("error: {error}");
    }
    println!("{}", serde_json::to_string_pretty(&Report::from_result(result))?);
    Ok(ExitCode::from(status))
}

fn exit_status(result: &Result<WorkflowOutcome, PipelineError>) -> u8 {
    match result {
        Ok(outcome) if outcome.is_success() => 0,
        Ok(outcome) => {
            info!(execution_id = %outcome.handle().execution_id, "execution did not complete");
            EXIT_WORKFLOW_UNSUCCESSFUL
        }
        Err(_) => 1,
    }
}

async fn generate_command(args: GenerateArgs) -> Result<ExitCode> {
    let file = FileConfig::load(&FileConfig::default_path())?;
    let template = match &args.template {
        Some(path) => fs::read_to_string(path).with_context(|| format!("failed to read template {}", path.display()))?,
        None => DEFAULT_PLAYBOOK_TEMPLATE.to_string(),
    };

    let artifacts = tokio::task::spawn_blocking(move || -> Result<_> {
        let (endpoint, transport) = load_endpoint(&args.connection, &file)?;
        let handle = ExecutionHandle::new(&args.workflow_id, &args.execution_id);
        println!("{}", transport.url_for(&handle.record_path())?);

        let record = fetch_execution_record(&transport, &handle).context("failed to read the execution")?;
        let settings = PlaybookSettings {
            server: endpoint.host.clone(),
            port: endpoint.port,
            workflow_id: handle.workflow_id.clone(),
            execution_id: handle.execution_id.clone(),
            username: endpoint.credentials.username.clone(),
            validate_certs: endpoint.validate_certs,
        };
        Ok(write_artifacts(&args.output_dir, &record, &settings, &template, &TemplateSyntax::default())?)
    })
    .await
    .context("generate task panicked")??;

    info!(vars = %artifacts.vars_path.display(), playbook = %artifacts.playbook_path.display(), "done");
    println!("{}", artifacts.vars_path.display());
    println!("{}", artifacts.playbook_path.display());
    Ok(ExitCode::SUCCESS)
}
