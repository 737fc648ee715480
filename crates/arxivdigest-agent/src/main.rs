//! arxivdigest: daily arXiv listing digests.
//! Entry point for the `arxivdigest` binary.

mod config;
mod runner;
mod scheduler;

use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Mutex;

use chrono::Local;
use clap::{Args, CommandFactory, Parser, Subcommand};
use tracing::{debug, error, info};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use config::{Config, DEFAULT_CONFIG_FILE, DEFAULT_SCRAPE_SCHEDULE, DEFAULT_SUMMARY_SCHEDULE};
use runner::PipelineRunner;
use scheduler::{Job, Scheduler};

#[derive(Parser)]
#[command(name = "arxivdigest")]
#[command(about = "ArXiv paper scraper and summarizer")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Scrape papers from the arXiv listing
    Scrape(ScrapeArgs),
    /// Generate summaries of the latest scraped papers
    Summarize(SummarizeArgs),
    /// Run scraping and summarizing daily at the configured times
    Schedule(ScheduleArgs),
}

#[derive(Args)]
struct ScrapeArgs {
    /// Path to the topics file
    #[arg(long, default_value = "topics.txt")]
    topics_file: PathBuf,
    /// Directory to save the collection PDFs
    #[arg(long, default_value = "ArxivPapers")]
    output_dir: PathBuf,
    /// Path to the configuration file
    #[arg(long, default_value = DEFAULT_CONFIG_FILE)]
    config_file: PathBuf,
}

#[derive(Args)]
struct SummarizeArgs {
    /// Directory containing the collection PDFs
    #[arg(long, default_value = "ArxivPapers")]
    input_dir: PathBuf,
    /// Directory to save the summary PDFs
    #[arg(long, default_value = "ArxivSummaries")]
    output_dir: PathBuf,
    /// Use AI to generate summaries
    #[arg(long)]
    use_ai: bool,
    /// Path to the configuration file
    #[arg(long, default_value = DEFAULT_CONFIG_FILE)]
    config_file: PathBuf,
}

#[derive(Args)]
struct ScheduleArgs {
    /// Path to the topics file
    #[arg(long, default_value = "topics.txt")]
    topics_file: PathBuf,
    /// Directory to save the collection PDFs
    #[arg(long, default_value = "ArxivPapers")]
    output_dir: PathBuf,
    /// Directory to save the summary PDFs
    #[arg(long, default_value = "ArxivSummaries")]
    summary_dir: PathBuf,
    /// Path to the log file
    #[arg(long, default_value = "arxiv_scheduler.log")]
    log_file: PathBuf,
    /// Path to the configuration file
    #[arg(long, default_value = DEFAULT_CONFIG_FILE)]
    config_file: PathBuf,
}

impl Command {
    fn config_file(&self) -> &Path {
        match self {
            Command::Scrape(a) => &a.config_file,
            Command::Summarize(a) => &a.config_file,
            Command::Schedule(a) => &a.config_file,
        }
    }

    fn log_file(&self) -> Option<&Path> {
        match self {
            Command::Schedule(a) => Some(&a.log_file),
            _ => None,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    let Some(command) = cli.command else {
        eprintln!("{}", Cli::command().render_help());
        return Ok(ExitCode::FAILURE);
    };

    let _ = dotenvy::dotenv();

    let config_path = command.config_file().to_path_buf();
    let created = !config_path.exists();
    let loaded = Config::load_or_create(&config_path);
    init_tracing(
        loaded.as_ref().map(Config::log_directive).unwrap_or("info"),
        command.log_file(),
    );

    info!(version = env!("CARGO_PKG_VERSION"), "arxivdigest starting");
    let config = match loaded {
        Ok(config) => {
            if created {
                info!(path = %config_path.display(), "Created default configuration");
            } else {
                debug!(path = %config_path.display(), "Configuration loaded");
            }
            config
        }
        Err(e) => {
            error!(error = %e, "Configuration unusable; using defaults");
            Config::default()
        }
    };

    let outcome = match command {
        Command::Scrape(args) => scrape(args, config).await,
        Command::Summarize(args) => summarize(args, config).await,
        Command::Schedule(args) => schedule(args, config).await,
    };
    if let Err(e) = outcome {
        error!("{e:#}");
    }
    Ok(ExitCode::SUCCESS)
}

/// Console logging always; `schedule` also appends plain text to its log file.
fn init_tracing(default_directive: &str, log_file: Option<&Path>) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive));

    let file_layer = log_file.and_then(|path| {
        match OpenOptions::new().create(true).append(true).open(path) {
            Ok(file) => Some(fmt::layer().with_ansi(false).with_writer(Mutex::new(file))),
            Err(e) => {
                eprintln!("Cannot open log file {}: {e}", path.display());
                None
            }
        }
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer())
        .with(file_layer)
        .init();
}

async fn scrape(args: ScrapeArgs, config: Config) -> anyhow::Result<()> {
    let runner = PipelineRunner::new(
        config,
        args.topics_file,
        args.output_dir,
        PathBuf::from("ArxivSummaries"),
    );
    let result = runner.collect().await?;
    info!(
        topics = result.artifacts.len(),
        papers = result.papers_collected,
        errors = result.errors.len(),
        "Scrape finished"
    );
    Ok(())
}

async fn summarize(args: SummarizeArgs, mut config: Config) -> anyhow::Result<()> {
    if args.use_ai {
        config.use_ai_summaries = true;
    }
    let runner = PipelineRunner::new(
        config,
        PathBuf::from("topics.txt"),
        args.input_dir,
        args.output_dir,
    );
    let result = runner.summarize().await;
    info!(
        topics = result.artifacts.len(),
        papers = result.papers_summarized,
        errors = result.errors.len(),
        "Summarize finished"
    );
    Ok(())
}

async fn schedule(args: ScheduleArgs, config: Config) -> anyhow::Result<()> {
    fs::create_dir_all(&args.output_dir)?;
    fs::create_dir_all(&args.summary_dir)?;

    let mut scheduler = Scheduler::from_schedule(
        &[
            (Job::Collect, config.scrape_schedule.as_str(), DEFAULT_SCRAPE_SCHEDULE),
            (Job::Summarize, config.summary_schedule.as_str(), DEFAULT_SUMMARY_SCHEDULE),
        ],
        Local::now().naive_local(),
    );
    let runner = PipelineRunner::new(config, args.topics_file, args.output_dir, args.summary_dir);

    info!(
        next_collect = ?scheduler.next_run(Job::Collect),
        next_summarize = ?scheduler.next_run(Job::Summarize),
        "Scheduler running; press Ctrl-C to stop"
    );
    scheduler.run_until(&runner, shutdown_signal()).await;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Cannot listen for Ctrl-C; running until killed");
        std::future::pending::<()>().await;
    }
}
