use clap::Parser;
use page_elements::results::PageReport;
use page_elements::{ExtractorConfig, InMemoryDedupStore, crawl};
use std::sync::Arc;

mod args;
use args::Args;

#[tokio::main]
async fn main() {
    // Initialize logging
    env_logger::init();

    let args = Args::parse();

    let config = match load_config(&args) {
        Ok(config) => config,
        Err(e) => {
            ::log::error!("Failed to load configuration: {}", e);
            std::process::exit(2);
        }
    };

    eprintln!("Note: extraction requires a WebDriver server (e.g., ChromeDriver).");
    eprintln!(
        "Set WEBDRIVER_URL or --webdriver-url if not using {}",
        config.webdriver_url
    );

    let store = Arc::new(InMemoryDedupStore::new());
    let mut rx = crawl::start(&config, &args.scope, args.urls.clone(), store, None).await;

    let mut pages_processed = 0;
    let mut pages_failed = 0;
    let start_time = std::time::Instant::now();

    while let Some(report) = rx.recv().await {
        pages_processed += 1;
        if report.extraction().is_none() {
            pages_failed += 1;
        }
        print_report(&report, args.pretty);
    }

    ::log::info!(
        "Extraction complete - processed {} pages ({} failed) in {:.2} seconds",
        pages_processed,
        pages_failed,
        start_time.elapsed().as_secs_f64()
    );
}

fn load_config(args: &Args) -> Result<ExtractorConfig, Box<dyn std::error::Error>> {
    let mut config = match &args.config {
        Some(path) => ExtractorConfig::from_file(path)?,
        None => ExtractorConfig::default(),
    }
    .with_env_overrides();

    if let Some(concurrency) = args.concurrency {
        config.max_concurrency = concurrency;
    }
    if let Some(webdriver_url) = &args.webdriver_url {
        config.webdriver_url = webdriver_url.clone();
    }
    Ok(config)
}

fn print_report(report: &PageReport, pretty: bool) {
    let json = if pretty {
        serde_json::to_string_pretty(report)
    } else {
        serde_json::to_string(report)
    };
    match json {
        Ok(json) => println!("{}", json),
        Err(e) => ::log::error!("Failed to serialize report for {}: {}", report.url, e),
    }
}
