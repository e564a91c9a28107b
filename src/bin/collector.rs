//! One extraction run: opens the source's search page, collects up to
//! `--total` listings and writes them to `--output`.
//!
//! Progress lines go to stdout together with the log. Anything written to
//! stderr means the run failed.

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use env_logger::{Env, Target};
use mapscout::{
    configuration::get_configuration,
    domain::{
        record::Record,
        search::{Source, DEFAULT_MAX_RESULTS},
    },
    error::ScrapeError,
    services::{pause, run_extraction, text_codec, Droid, Pacing},
};
use url::Url;

#[derive(Parser, Debug)]
#[command(about = "Collects establishment listings from a map search")]
struct Args {
    /// Search text, e.g. "padarias em Campo Grande"
    #[arg(short, long)]
    search: String,

    /// Maximum number of listings to collect
    #[arg(short, long, default_value_t = DEFAULT_MAX_RESULTS)]
    total: usize,

    /// Where the results file is written
    #[arg(short, long, default_value = "resultados.txt")]
    output: PathBuf,

    #[arg(long, default_value = "google_maps")]
    source: String,
}

async fn extract(
    droid: &Droid,
    url: &Url,
    args: &Args,
    pacing: &Pacing,
) -> Result<Vec<Record>, ScrapeError> {
    droid.goto(url).await?;
    pause(pacing.settle).await;

    let columns = run_extraction(
        droid,
        &args.search,
        args.total,
        pacing,
        &mut std::io::stdout(),
    )
    .await?;
    log::info!("Collected {} rows", columns.len());

    Ok(columns.into_records())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info"))
        .target(Target::Stdout)
        .init();

    let args = Args::parse();
    let source = Source::parse(&args.source)
        .with_context(|| format!("Unknown source '{}'", args.source))?;
    let settings = get_configuration()
        .context("Failed to read configuration.")?
        .collector;
    let pacing = settings.pacing();
    let url = source.search_url(&args.search)?;

    log::info!(
        "Searching {} for \"{}\" (max {})",
        source.name(),
        args.search,
        args.total
    );
    let droid = Droid::launch(&settings)
        .await
        .context("Failed to start the browser session")?;

    let outcome = extract(&droid, &url, &args, &pacing).await;
    if let Err(e) = droid.quit().await {
        log::warn!("Error closing the browser session: {:?}", e);
    }
    let records = outcome?;

    tokio::fs::write(
        &args.output,
        text_codec::encode_document(&args.search, &records),
    )
    .await
    .with_context(|| format!("Failed to write {:?}", args.output))?;
    log::info!("Wrote {} records to {:?}", records.len(), args.output);

    Ok(())
}
