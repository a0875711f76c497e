use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use oppmatch_core::config::Settings;
use oppmatch_core::pipeline::{MatchingContext, MatchingPipeline, PipelineOptions};
use oppmatch_core::retrieval::embed::embedder_from_settings;
use oppmatch_core::retrieval::index::VectorIndex;

mod eval;

#[derive(Debug, Parser)]
#[command(name = "oppmatch_worker")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Build the evidence index from DOCS_DIR and persist it to INDEX_PATH.
    BuildIndex {
        /// Rebuild even when a compatible index file already exists.
        #[arg(long)]
        force: bool,
    },

    /// Run every client against the reference market regimes and print summary statistics.
    Eval {
        /// JSON array of client profiles.
        #[arg(long, default_value = "data/clients.json")]
        clients: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = Settings::from_env()?;
    let _sentry_guard = init_sentry(&settings);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .with(sentry_tracing::layer())
        .init();

    let args = Args::parse();

    let result = match args.command {
        Command::BuildIndex { force } => build_index(&settings, force).await,
        Command::Eval { clients } => run_eval(&settings, &clients).await,
    };

    if let Err(err) = &result {
        sentry_anyhow::capture_anyhow(err);
        tracing::error!(error = %err, "worker command failed");
    }
    result
}

async fn build_index(settings: &Settings, force: bool) -> anyhow::Result<()> {
    let embedder = embedder_from_settings(settings)?;
    let index =
        VectorIndex::load_or_build(&settings.docs_dir, &settings.index_path, embedder, force)
            .await?;

    tracing::info!(
        docs_dir = %settings.docs_dir.display(),
        index_path = %settings.index_path.display(),
        chunks = index.len(),
        force,
        "evidence index ready"
    );
    Ok(())
}

async fn run_eval(settings: &Settings, clients_path: &std::path::Path) -> anyhow::Result<()> {
    let clients = eval::load_clients(clients_path)
        .with_context(|| format!("failed to load clients {}", clients_path.display()))?;
    anyhow::ensure!(!clients.is_empty(), "no clients in {}", clients_path.display());

    let ctx = MatchingContext::from_settings(settings, false).await?;
    let pipeline = MatchingPipeline::new(ctx, PipelineOptions::from_env());

    let summary = eval::run(&pipeline, &clients).await;
    print!("{summary}");
    Ok(())
}

fn init_sentry(settings: &Settings) -> Option<sentry::ClientInitGuard> {
    let dsn = settings.sentry_dsn.as_deref()?;
    Some(sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            ..Default::default()
        },
    )))
}
