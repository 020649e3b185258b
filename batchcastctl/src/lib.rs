use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::Serialize;
use thiserror::Error;

use batchcast_core::{
    load_config, normalize_tags, validate_video_url, ApiError, BatchcastConfig, CheckpointError,
    CheckpointStore, Credentials, CsvRowSource, IngestError, IngestMode, Ingestor, PlatformClient,
    RunSummary, SourceError,
};

pub type Result<T> = std::result::Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("config error: {0}")]
    Config(#[from] batchcast_core::ConfigError),
    #[error("csv error: {0}")]
    Source(#[from] SourceError),
    #[error("api client error: {0}")]
    Api(#[from] ApiError),
    #[error("ingest run failed: {0}")]
    Ingest(#[from] IngestError),
    #[error("checkpoint error: {0}")]
    Checkpoint(#[from] CheckpointError),
    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Bulk CSV video ingestion control interface", long_about = None)]
pub struct Cli {
    /// Path to the batchcast.toml config
    #[arg(long, default_value = "configs/batchcast.toml")]
    pub config: PathBuf,
    /// CSV file name inside the configured csv directory (defaults to the
    /// mode's conventional file name)
    #[arg(long)]
    pub csv: Option<String>,
    /// Override for the checkpoint directory
    #[arg(long)]
    pub checkpoint_dir: Option<PathBuf>,
    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Process the CSV batch against the platform
    Run(RunArgs),
    /// Check every row offline; touches neither the network nor the checkpoint
    Validate,
    /// Inspect or clear the resume checkpoint
    #[command(subcommand)]
    Checkpoint(CheckpointCommands),
}

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Override the configured ingest mode
    #[arg(long, value_enum)]
    pub mode: Option<ModeArg>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ModeArg {
    RemoteAssets,
    Master,
}

impl From<ModeArg> for IngestMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::RemoteAssets => IngestMode::RemoteAssets,
            ModeArg::Master => IngestMode::Master,
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum CheckpointCommands {
    /// Print the stored row index
    Show,
    /// Truncate the checkpoint so the next run starts from the top
    Reset,
}

pub async fn run(cli: Cli) -> Result<()> {
    let context = AppContext::new(&cli)?;

    match &cli.command {
        Commands::Run(args) => {
            let summary = context.run_batch(args).await?;
            render(&summary, cli.format)
        }
        Commands::Validate => {
            let report = context.validate_rows()?;
            render(&report, cli.format)
        }
        Commands::Checkpoint(CheckpointCommands::Show) => {
            let status = context.checkpoint_status()?;
            render(&status, cli.format)
        }
        Commands::Checkpoint(CheckpointCommands::Reset) => {
            let status = context.checkpoint_reset()?;
            render(&status, cli.format)
        }
    }
}

fn render<T>(value: &T, format: OutputFormat) -> Result<()>
where
    T: Serialize + TextRender,
{
    match format {
        OutputFormat::Text => {
            println!("{}", value.text());
            Ok(())
        }
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(value)?;
            println!("{}", json);
            Ok(())
        }
    }
}

trait TextRender {
    fn text(&self) -> String;
}

#[derive(Debug)]
struct AppContext {
    config: BatchcastConfig,
    csv_override: Option<String>,
    checkpoint_dir: PathBuf,
}

impl AppContext {
    fn new(cli: &Cli) -> Result<Self> {
        let config = load_config(&cli.config)?;
        let checkpoint_dir = cli
            .checkpoint_dir
            .clone()
            .unwrap_or_else(|| config.checkpoint_dir());
        Ok(Self {
            config,
            csv_override: cli.csv.clone(),
            checkpoint_dir,
        })
    }

    fn csv_path(&self, mode: IngestMode) -> PathBuf {
        let file_name = self
            .csv_override
            .as_deref()
            .unwrap_or_else(|| mode.default_csv_file());
        self.config.csv_path(file_name)
    }

    async fn run_batch(&self, args: &RunArgs) -> Result<RunSummary> {
        let mode = args
            .mode
            .map(IngestMode::from)
            .unwrap_or(self.config.ingest.mode);
        let credentials = Credentials::from_env()?;
        let client = PlatformClient::new(&self.config.platform, credentials)?;
        let store = CheckpointStore::new(&self.checkpoint_dir);
        let rows = CsvRowSource::open(self.csv_path(mode))?;
        let mut ingestor = Ingestor::new(client, store, mode, self.config.ingest.profile.clone());
        Ok(ingestor.run(rows).await?)
    }

    fn validate_rows(&self) -> Result<ValidationReport> {
        let mode = self.config.ingest.mode;
        let mut report = ValidationReport::default();
        for row in CsvRowSource::open(self.csv_path(mode))? {
            let row = row?;
            let verdict = normalize_tags(&row.tags)
                .map(|_| ())
                .and_then(|_| validate_video_url(&row.video_url, mode));
            match verdict {
                Ok(()) => {
                    report.valid += 1;
                    report.rows.push(RowVerdict {
                        index: row.index,
                        name: row.name,
                        reason: None,
                    });
                }
                Err(reason) => {
                    report.invalid += 1;
                    report.rows.push(RowVerdict {
                        index: row.index,
                        name: row.name,
                        reason: Some(reason.to_string()),
                    });
                }
            }
        }
        Ok(report)
    }

    fn checkpoint_status(&self) -> Result<CheckpointStatus> {
        let store = CheckpointStore::new(&self.checkpoint_dir);
        Ok(CheckpointStatus {
            path: store.path().display().to_string(),
            last_processed_row: store.load()?,
        })
    }

    fn checkpoint_reset(&self) -> Result<CheckpointReset> {
        let store = CheckpointStore::new(&self.checkpoint_dir);
        let cleared = store.clear()?;
        Ok(CheckpointReset {
            path: store.path().display().to_string(),
            cleared,
        })
    }
}

#[derive(Debug, Default, Serialize)]
pub struct ValidationReport {
    pub valid: u64,
    pub invalid: u64,
    pub rows: Vec<RowVerdict>,
}

#[derive(Debug, Serialize)]
pub struct RowVerdict {
    pub index: u64,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CheckpointStatus {
    pub path: String,
    pub last_processed_row: Option<u64>,
}

#[derive(Debug, Serialize)]
pub struct CheckpointReset {
    pub path: String,
    pub cleared: bool,
}

impl TextRender for RunSummary {
    fn text(&self) -> String {
        format!(
            "attempted={} succeeded={} skipped={} failed={}",
            self.attempted, self.succeeded, self.skipped, self.failed
        )
    }
}

impl TextRender for ValidationReport {
    fn text(&self) -> String {
        let mut lines = vec![format!("{} valid, {} invalid", self.valid, self.invalid)];
        for row in &self.rows {
            match &row.reason {
                Some(reason) => lines.push(format!("#{} {} — {}", row.index, row.name, reason)),
                None => lines.push(format!("#{} {} — ok", row.index, row.name)),
            }
        }
        lines.join("\n")
    }
}

impl TextRender for CheckpointStatus {
    fn text(&self) -> String {
        match self.last_processed_row {
            Some(index) => format!("{}: last processed row {}", self.path, index),
            None => format!("{}: no recorded progress", self.path),
        }
    }
}

impl TextRender for CheckpointReset {
    fn text(&self) -> String {
        if self.cleared {
            format!("{}: checkpoint cleared", self.path)
        } else {
            format!("{}: already empty", self.path)
        }
    }
}
