mod classifier;
mod config;
mod model;
mod normalizer;
mod pipeline;
mod search;
mod storage;

use clap::Parser;
use config::{Cli, load_config};
use model::{AppError, TITLE_FIELD};
use pipeline::Pipeline;
use search::{ImageLookup, PixabayTransport};
use std::process::ExitCode;
use storage::{CsvSource, JsonlSink};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    std::panic::set_hook(Box::new(|panic_info| {
        eprintln!("😱 Panic occurred: {:?}", panic_info);
    }));

    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("❌ {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), AppError> {
    let config = load_config(cli.config.as_deref())?;

    let transport = PixabayTransport::new(
        &config.endpoint,
        &cli.api_key,
        config.per_page,
        config.timeout(),
    )
    .map_err(model::ConfigError::from)?;
    let lookup = ImageLookup::new(transport, config.max_attempts, config.backoff());
    let pipeline = Pipeline::from_config(&config, lookup)?;

    // The input must open before the output file is created.
    let source = CsvSource::open(&cli.input, &config.overflow_key)?;
    if !source.headers().iter().any(|h| h == TITLE_FIELD) {
        warn!(
            "No '{}' column in {}; every record falls back to a category search",
            TITLE_FIELD,
            cli.input.display()
        );
    }
    let mut sink = JsonlSink::create(&cli.output)?;

    info!("Enriching {} -> {}", cli.input.display(), cli.output.display());
    let summary = pipeline.run(source, &mut sink, cli.limit).await?;

    info!(
        "Run took {}s over {} records: {} direct, {} fallback, {} without image",
        (summary.finished_at - summary.started_at).num_seconds(),
        summary.records,
        summary.direct_hits,
        summary.fallback_hits,
        summary.misses
    );
    info!(
        "✅ Done! {} records written to: {}",
        sink.written(),
        cli.output.display()
    );
    Ok(())
}
