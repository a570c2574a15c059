use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "page-elements")]
#[command(about = "Extracts deduplicated, template-classified elements from rendered pages")]
#[command(version)]
pub struct Args {
    /// Pages to extract
    #[arg(required = true)]
    pub urls: Vec<String>,

    /// Audit scope that element records are deduplicated within
    #[arg(short, long, default_value = "default")]
    pub scope: String,

    /// JSON configuration file
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Number of concurrent browser sessions (overrides the config file)
    #[arg(short, long)]
    pub concurrency: Option<usize>,

    /// WebDriver URL (overrides the config file and WEBDRIVER_URL)
    #[arg(long)]
    pub webdriver_url: Option<String>,

    /// Pretty-print each page report
    #[arg(long)]
    pub pretty: bool,
}
