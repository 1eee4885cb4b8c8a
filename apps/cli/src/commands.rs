//! CLI command definitions, routing, and tracing setup.

use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::Utc;
use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use cloudgraph_client::AzureClient;
use cloudgraph_core::job_state::JobState;
use cloudgraph_core::registry::{Step, all_steps, execution_plan};
use cloudgraph_core::runner::{
    ProgressReporter, RunSummary, StartStates, StepOutcome, StepStatus, run_steps,
};
use cloudgraph_shared::{
    AppConfig, IntegrationConfig, RunId, RunRecord, config_dir, init_config, load_config,
    validate_credentials,
};
use cloudgraph_storage::Storage;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

/// Database file name under the config directory.
const DEFAULT_DB_FILE: &str = "cloudgraph.db";

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// cloudgraph: ingest an Azure tenant into an entity graph.
#[derive(Parser)]
#[command(
    name = "cloudgraph",
    version,
    about = "Ingest Azure directory and resource manager data into a local entity graph.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Run an ingestion and store the result.
    Run {
        /// Only run these steps (and what they depend on). Repeatable.
        #[arg(long = "step", value_name = "ID")]
        steps: Vec<String>,

        /// Database path (defaults to ~/.cloudgraph/cloudgraph.db).
        #[arg(long, env = "CLOUDGRAPH_DB")]
        db: Option<PathBuf>,

        /// Subscription to ingest, overriding the config file.
        #[arg(long)]
        subscription: Option<String>,
    },

    /// Print the step execution plan.
    Steps,

    /// List stored runs for the configured instance.
    Runs {
        /// Database path (defaults to ~/.cloudgraph/cloudgraph.db).
        #[arg(long, env = "CLOUDGRAPH_DB")]
        db: Option<PathBuf>,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let level = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = [
        "cloudgraph",
        "cloudgraph_core",
        "cloudgraph_client",
        "cloudgraph_storage",
        "cloudgraph_shared",
    ]
    .map(|target| format!("{target}={level}"))
    .join(",");

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Run {
            steps,
            db,
            subscription,
        } => cmd_run(&steps, db, subscription).await,
        Command::Steps => cmd_steps(),
        Command::Runs { db } => cmd_runs(db).await,
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init().await,
            ConfigAction::Show => cmd_config_show().await,
        },
    }
}

fn db_path(db: Option<PathBuf>) -> Result<PathBuf> {
    match db {
        Some(path) => Ok(path),
        None => Ok(config_dir()?.join(DEFAULT_DB_FILE)),
    }
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

async fn cmd_run(only: &[String], db: Option<PathBuf>, subscription: Option<String>) -> Result<()> {
    // Validate credentials before doing anything
    let mut app_config = load_config()?;
    if let Some(subscription) = subscription {
        app_config.azure.subscription_id = Some(subscription);
    }
    let client_secret = validate_credentials(&app_config)?;
    let config = IntegrationConfig::from_app_config(&app_config, client_secret);

    let steps = all_steps();
    let start_states = StartStates::from_config(steps, &config, only)?;

    // Open the database first so a bad path fails before any API calls
    let db_path = db_path(db)?;
    let storage = Storage::open(&db_path).await?;

    let run = RunRecord {
        id: RunId::new(),
        instance_id: config.instance.id.clone(),
        started_at: Utc::now(),
        finished_at: None,
    };
    storage.insert_run(&run).await?;

    info!(
        run_id = %run.id,
        instance = %config.instance.id,
        subscription = config.subscription_id.as_deref().unwrap_or("-"),
        "starting ingestion"
    );

    let client = AzureClient::new(&config)?;
    let mut job_state = JobState::new();
    let reporter = CliProgress::new()?;

    let summary = run_steps(steps, &start_states, &config, &client, &mut job_state, &reporter).await?;

    persist(&storage, &run.id, &job_state, &summary).await?;
    print_summary(&run.id, &db_path, &job_state, &summary);

    let failed = summary.failed().count();
    if failed > 0 {
        return Err(eyre!("{failed} step(s) failed"));
    }
    Ok(())
}

/// Flush the collected graph and the step outcomes into `storage`.
async fn persist(
    storage: &Storage,
    run_id: &RunId,
    job_state: &JobState,
    summary: &RunSummary,
) -> Result<()> {
    let entities = storage.insert_entities(run_id, job_state.entities()).await?;
    let relationships = storage
        .insert_relationships(run_id, job_state.relationships())
        .await?;
    for (position, outcome) in summary.outcomes.iter().enumerate() {
        storage
            .insert_step_result(run_id, position, &outcome.to_record())
            .await?;
    }
    storage.finish_run(run_id).await?;

    info!(%run_id, entities, relationships, "run stored");
    Ok(())
}

fn print_summary(run_id: &RunId, db_path: &Path, job_state: &JobState, summary: &RunSummary) {
    let succeeded = summary.outcomes.iter().filter(|o| o.is_success()).count();
    let skipped = summary
        .outcomes
        .iter()
        .filter(|o| matches!(o.status, StepStatus::Skipped { .. } | StepStatus::Disabled))
        .count();

    println!();
    println!("  Ingestion finished.");
    println!("  Run:           {run_id}");
    println!("  Entities:      {}", job_state.entities().len());
    println!("  Relationships: {}", job_state.relationships().len());
    println!(
        "  Steps:         {succeeded} ok, {} failed, {skipped} skipped",
        summary.failed().count()
    );
    println!("  Database:      {}", db_path.display());
    println!("  Time:          {:.1}s", summary.elapsed.as_secs_f64());

    for outcome in summary.failed() {
        if let StepStatus::Failed { error, .. } = &outcome.status {
            println!("  ! {error}");
        }
    }
    println!();
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// CLI progress reporter using an indicatif bar, one tick per step.
struct CliProgress {
    bar: ProgressBar,
}

impl CliProgress {
    fn new() -> Result<Self> {
        let bar = ProgressBar::new(0);
        bar.set_style(
            ProgressStyle::with_template("{spinner:.cyan} [{pos}/{len}] {msg}")?
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "✓"]),
        );
        bar.enable_steady_tick(Duration::from_millis(80));
        Ok(Self { bar })
    }
}

impl ProgressReporter for CliProgress {
    fn step_started(&self, step: &Step, position: usize, total: usize) {
        self.bar.set_length(total as u64);
        self.bar.set_position(position as u64);
        self.bar.set_message(step.name);
    }

    fn step_finished(&self, outcome: &StepOutcome) {
        self.bar.inc(1);
        match &outcome.status {
            StepStatus::Failed { error, .. } => {
                self.bar.println(format!("  ✗ {error}"));
            }
            StepStatus::Skipped { failed_dependency } => {
                self.bar.println(format!(
                    "  - {} skipped ({failed_dependency} failed)",
                    outcome.step_id
                ));
            }
            StepStatus::Success { .. } | StepStatus::Disabled => {}
        }
    }

    fn done(&self, _summary: &RunSummary) {
        self.bar.finish_and_clear();
    }
}

fn cmd_steps() -> Result<()> {
    let plan = execution_plan(all_steps())?;
    for (position, step) in plan.iter().enumerate() {
        let depends_on = if step.depends_on.is_empty() {
            "-".to_string()
        } else {
            step.depends_on.join(", ")
        };
        println!(
            "{:>3}  {:<42} {:<40} after: {depends_on}",
            position + 1,
            step.id,
            step.name
        );
    }
    Ok(())
}

async fn cmd_runs(db: Option<PathBuf>) -> Result<()> {
    let config = load_config()?;
    let db_path = db_path(db)?;
    if !db_path.exists() {
        return Err(eyre!("no database at '{}'; run `cloudgraph run` first", db_path.display()));
    }

    let storage = Storage::open_readonly(&db_path).await?;
    let runs = storage.list_runs(&config.instance.id).await?;
    if runs.is_empty() {
        println!("No runs stored for instance '{}'.", config.instance.id);
        return Ok(());
    }

    for run in runs {
        let entities = storage.count_entities(&run.id).await?;
        let relationships = storage.count_relationships(&run.id).await?;
        let finished = run
            .finished_at
            .map(|t| t.to_rfc3339())
            .unwrap_or_else(|| "unfinished".to_string());
        println!(
            "{}  started {}  finished {finished}  {entities} entities  {relationships} relationships",
            run.id,
            run.started_at.to_rfc3339()
        );
    }
    Ok(())
}

async fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

async fn cmd_config_show() -> Result<()> {
    let config: AppConfig = load_config()?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}
