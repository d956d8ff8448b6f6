use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use pixelplus_client::PixelPlusClient;
use rankscope_core::file_config::load_or_default;
use rankscope_core::output::{load_rank_results, save_summaries};
use rankscope_core::{
    aggregate, load_query_set, AppConfig, Engine, RankChecker, RankWriter, RunConfig,
    UrlStatus,
};

#[derive(Parser)]
#[command(name = "rankscope")]
#[command(about = "Search rank checks and per-url visibility summaries")]
#[command(version)]
struct Cli {
    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check rank positions for every url/query pair in the input file
    Check {
        /// Provider variant to query
        #[arg(long, value_enum)]
        engine: Option<EngineArg>,

        /// Input file (`url;query;frequency of impressions`)
        #[arg(long)]
        input: Option<PathBuf>,

        /// Labeled results file
        #[arg(long)]
        output: Option<PathBuf>,

        /// Report id handoff file for two-phase runs
        #[arg(long)]
        handoff: Option<PathBuf>,

        /// Path to config TOML file
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Summarize labeled results into bucket shares and visibility
    Aggregate {
        /// Labeled results file
        #[arg(long)]
        input: Option<PathBuf>,

        /// Summary file
        #[arg(long)]
        output: Option<PathBuf>,

        /// Path to config TOML file
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum EngineArg {
    Google,
    Yandex,
}

impl From<EngineArg> for Engine {
    fn from(arg: EngineArg) -> Self {
        match arg {
            EngineArg::Google => Engine::Google,
            EngineArg::Yandex => Engine::Yandex,
        }
    }
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if json {
        tracing_subscriber::fmt().with_env_filter(filter).json().init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();
    init_tracing(cli.json_logs);

    let result = match cli.command {
        Commands::Check {
            engine,
            input,
            output,
            handoff,
            config,
        } => run_check(engine, input, output, handoff, config).await,
        Commands::Aggregate {
            input,
            output,
            config,
        } => run_aggregate(input, output, config),
    };

    if let Err(e) = result {
        eprintln!("Error: {:#}", e);
        return ExitCode::from(1);
    }
    ExitCode::SUCCESS
}

async fn run_check(
    engine: Option<EngineArg>,
    input: Option<PathBuf>,
    output: Option<PathBuf>,
    handoff: Option<PathBuf>,
    config: Option<PathBuf>,
) -> Result<()> {
    let mut file_config = load_or_default(config.as_deref())?;
    if let Some(engine) = engine {
        file_config.engine = engine.into();
    }
    if let Some(input) = input {
        file_config.input_path = input;
    }
    if let Some(output) = output {
        file_config.output_path = output;
    }
    if let Some(handoff) = handoff {
        file_config.handoff_path = handoff;
    }
    let engine = file_config.engine;

    let app_config = AppConfig::from_env()?;
    let config = RunConfig::new(app_config, file_config);

    let grouped = load_query_set(&config.input_path)
        .with_context(|| format!("Failed to read input {}", config.input_path.display()))?;
    for rejected in &grouped.rejected {
        warn!(error = %rejected, "Skipping input record");
    }
    info!(
        urls = grouped.queries.len(),
        input = %config.input_path.display(),
        "Input grouped"
    );

    let client = PixelPlusClient::new(&config.api_base_url, &config.api_key, engine.endpoint())
        .context("Failed to build provider client")?;

    let mut writer = RankWriter::create(&config.output_path)
        .with_context(|| format!("Failed to create output {}", config.output_path.display()))?;
    let report = RankChecker::new(&client, engine, &config)
        .run(&grouped.queries, &mut writer)
        .await?;
    writer.into_inner()?;

    for outcome in &report.outcomes {
        match &outcome.status {
            UrlStatus::Completed { rows } => info!(url = %outcome.url, rows, "Url completed"),
            UrlStatus::Skipped { reason } => warn!(url = %outcome.url, error = %reason, "Url skipped"),
        }
    }
    info!(
        output = %config.output_path.display(),
        rows = report.rows_written(),
        elapsed_secs = (report.finished_at - report.started_at).num_seconds(),
        "Results written"
    );
    Ok(())
}

fn run_aggregate(
    input: Option<PathBuf>,
    output: Option<PathBuf>,
    config: Option<PathBuf>,
) -> Result<()> {
    let file_config = load_or_default(config.as_deref())?;
    let input = input.unwrap_or(file_config.summary_input_path);
    let output = output.unwrap_or(file_config.summary_output_path);

    let parsed = load_rank_results(&input)
        .with_context(|| format!("Failed to read labeled results {}", input.display()))?;
    for rejected in &parsed.rejected {
        warn!(error = %rejected, "Skipping labeled row");
    }

    let summaries = aggregate(&parsed.rows);
    save_summaries(&output, &summaries, file_config.decimal_separator)
        .with_context(|| format!("Failed to write summaries {}", output.display()))?;

    info!(urls = summaries.len(), output = %output.display(), "Summaries written");
    Ok(())
}
