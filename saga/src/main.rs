//! Thin command-line front end over the saga-core pipeline.
//!
//! Reads chapter text from a file (or stdin), runs it through a pipeline
//! backed by a directory store, and prints JSON reports. All narrative
//! state lives under the store directory, so successive invocations see
//! the same story.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use saga_core::{
    ChapterContext, ChapterInput, ExecutionMode, FileStore, Pipeline, PipelineConfig,
    PriorityStrategy,
};
use std::io::Read;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "saga", about = "Serialized narrative analysis and optimization")]
struct Cli {
    /// Directory holding persisted narrative state.
    #[arg(long, default_value = "saga-data", global = true)]
    store: PathBuf,

    /// How collaborators run: parallel or sequential.
    #[arg(long, default_value = "parallel", global = true)]
    mode: ExecutionMode,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Analyze one chapter and print the integrated report.
    Analyze(ChapterArgs),

    /// Analyze and optimize one chapter; print the recommendations.
    Optimize(OptimizeArgs),

    /// Print progression, quality and telemetry summaries.
    Status,
}

#[derive(Args)]
struct ChapterArgs {
    /// Chapter number within the work.
    #[arg(long)]
    chapter: u32,

    /// Chapter text file; reads stdin when omitted.
    file: Option<PathBuf>,

    /// Story theme hint (e.g. "redemption").
    #[arg(long)]
    theme: Option<String>,

    /// Genre hint (e.g. "fantasy").
    #[arg(long)]
    genre: Option<String>,

    /// Tension direction hint: raise, ease or sustain.
    #[arg(long)]
    tension: Option<String>,

    /// Target chapter length in words.
    #[arg(long)]
    target_length: Option<u32>,
}

#[derive(Args)]
struct OptimizeArgs {
    #[command(flatten)]
    chapter: ChapterArgs,

    /// Suggestion ranking: impact, effort or balanced.
    #[arg(long, default_value = "balanced")]
    strategy: PriorityStrategy,
}

impl ChapterArgs {
    fn read_chapter(&self) -> Result<ChapterInput> {
        let content = match &self.file {
            Some(path) => std::fs::read_to_string(path)
                .with_context(|| format!("reading {}", path.display()))?,
            None => {
                let mut buffer = String::new();
                std::io::stdin()
                    .read_to_string(&mut buffer)
                    .context("reading chapter from stdin")?;
                buffer
            }
        };

        let mut context = ChapterContext::new();
        if let Some(theme) = &self.theme {
            context.insert("theme", theme);
        }
        if let Some(genre) = &self.genre {
            context.insert("genre", genre);
        }
        if let Some(tension) = &self.tension {
            context.insert("tension", tension);
        }
        if let Some(length) = self.target_length {
            context.insert("target_length", length.to_string());
        }

        Ok(ChapterInput::new(self.chapter, content).with_context(context))
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let store = Arc::new(FileStore::new(&cli.store));

    match cli.command {
        Command::Analyze(args) => {
            let config = PipelineConfig::default().with_mode(cli.mode);
            let mut pipeline = Pipeline::new(store, config);
            let chapter = args.read_chapter()?;

            let result = pipeline.analyze_chapter(&chapter).await;
            println!("{}", serde_json::to_string_pretty(&result)?);
            pipeline.shutdown();
        }
        Command::Optimize(args) => {
            let config = PipelineConfig::default()
                .with_mode(cli.mode)
                .with_strategy(args.strategy);
            let mut pipeline = Pipeline::new(store, config);
            let chapter = args.chapter.read_chapter()?;

            let (_, optimization) = pipeline.process_chapter(&chapter).await;
            println!("{}", serde_json::to_string_pretty(&optimization)?);
            pipeline.shutdown();
        }
        Command::Status => {
            let pipeline = Pipeline::new(store, PipelineConfig::default());
            let status = serde_json::json!({
                "progression": pipeline.progression().await,
                "quality": pipeline.quality_summary().await,
                "statistics": pipeline.stats_summary().await,
            });
            println!("{}", serde_json::to_string_pretty(&status)?);
        }
    }

    Ok(())
}
