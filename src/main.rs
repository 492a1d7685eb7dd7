use std::error::Error;
use std::sync::Arc;

use clap::Parser;
use tracing::{debug, error, info};
use tracing_subscriber::{fmt as tfmt, EnvFilter};
use url::Url;

use news_notes::cli::{Cli, Command};
use news_notes::http::{start_http_server, HttpState};
use news_notes::scrape::Scraper;
use news_notes::scrapers::{huffpost, PageFetcher, SelectorExtractor, SelectorMap};
use news_notes::store::DocumentStore;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let args = Cli::parse();
    debug!(?args, "Parsed CLI arguments");

    if let Err(e) = run(args).await {
        error!(error = %e, "Fatal error");
        return Err(e);
    }
    Ok(())
}

async fn run(args: Cli) -> Result<(), Box<dyn Error>> {
    let source_url = Url::parse(&args.source_url)?;

    let selector_map = match &args.selectors {
        Some(path) => SelectorMap::load(path)?,
        None => huffpost::selector_map(),
    };
    let extractor = SelectorExtractor::new(&selector_map)?;

    let store = DocumentStore::connect(&args.database_url).await?;
    let scraper = Scraper::new(
        PageFetcher::new()?,
        Arc::new(extractor),
        store.clone(),
        source_url,
    );

    match args.command.unwrap_or(Command::Serve) {
        Command::Serve => {
            let addr = args.addr();
            let state = HttpState {
                store,
                scraper,
                public_dir: args.public_dir,
            };
            start_http_server(state, &addr).await?;
        }
        Command::Scrape => {
            let start_time = std::time::Instant::now();
            let report = scraper.run().await?;
            println!("{}", serde_json::to_string_pretty(&report)?);

            let elapsed = start_time.elapsed();
            info!(
                ?elapsed,
                found = report.found,
                saved = report.saved,
                failed = report.failed,
                "Execution complete"
            );
        }
    }

    Ok(())
}
