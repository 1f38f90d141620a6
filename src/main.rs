//! `job-scraper`: scrape one job posting and print the result envelope.
//!
//! The JSON envelope goes to stdout; logs go to stderr.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use job_posting_scraper::{CookieConfig, JobScraper, ScraperOptions, load_yaml_config};

#[derive(Parser)]
#[command(
    name = "job-scraper",
    about = "Render a job posting in Chromium and archive it as HTML, PNG, PDF and JSON",
    version
)]
struct Cli {
    /// Job posting URL (http or https)
    url: String,

    /// YAML config file (default: ./job-scraper.yaml when present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Directory for artifacts
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Settle delay after the page body appears, in milliseconds
    #[arg(long)]
    wait_ms: Option<u64>,

    /// Navigation timeout in milliseconds
    #[arg(long)]
    nav_timeout_ms: Option<u64>,

    /// Show the browser window (PDF capture is skipped)
    #[arg(long)]
    headed: bool,

    #[arg(long)]
    no_html: bool,

    #[arg(long)]
    no_screenshot: bool,

    #[arg(long)]
    no_pdf: bool,

    /// Override the browser's User-Agent
    #[arg(long)]
    user_agent: Option<String>,

    /// Attach to a running browser's DevTools WebSocket instead of launching one
    #[arg(long)]
    cdp_url: Option<String>,

    /// Cookie set before navigation, as NAME=VALUE@DOMAIN (repeatable)
    #[arg(long = "cookie", value_name = "NAME=VALUE@DOMAIN", value_parser = parse_cookie)]
    cookies: Vec<CookieConfig>,

    /// Print single-line JSON
    #[arg(long)]
    compact: bool,
}

fn parse_cookie(raw: &str) -> Result<CookieConfig, String> {
    let (pair, domain) = raw
        .rsplit_once('@')
        .ok_or_else(|| format!("expected NAME=VALUE@DOMAIN, got '{raw}'"))?;
    let (name, value) = pair
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=VALUE@DOMAIN, got '{raw}'"))?;
    if name.is_empty() || domain.is_empty() {
        return Err(format!("cookie name and domain must be non-empty: '{raw}'"));
    }
    Ok(CookieConfig {
        name: name.to_string(),
        value: value.to_string(),
        domain: domain.to_string(),
        path: None,
    })
}

impl Cli {
    /// Flags win over the config file
    fn apply(&self, options: &mut ScraperOptions) {
        if let Some(dir) = &self.output_dir {
            options.output_dir = dir.clone();
        }
        if let Some(ms) = self.wait_ms {
            options.wait_millis = ms;
        }
        if let Some(ms) = self.nav_timeout_ms {
            options.navigation_timeout_millis = ms;
        }
        if self.headed {
            options.headless = false;
        }
        if self.no_html {
            options.save_html = false;
        }
        if self.no_screenshot {
            options.save_screenshot = false;
        }
        if self.no_pdf {
            options.save_pdf = false;
        }
        if let Some(agent) = &self.user_agent {
            options.custom_user_agent = Some(agent.clone());
        }
        if let Some(cdp_url) = &self.cdp_url {
            options.cdp_url = Some(cdp_url.clone());
        }
        options.cookies.extend(self.cookies.iter().cloned());
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut options = match load_yaml_config(cli.config.as_deref()) {
        Ok(options) => options,
        Err(e) => {
            tracing::error!("{:#}", e);
            return ExitCode::FAILURE;
        }
    };
    cli.apply(&mut options);

    let scraper = JobScraper::new(options);
    let result = scraper.scrape(&cli.url).await;

    let rendered = if cli.compact {
        serde_json::to_string(&result)
    } else {
        serde_json::to_string_pretty(&result)
    };
    match rendered {
        Ok(json) => println!("{json}"),
        Err(e) => {
            tracing::error!("Failed to serialize result: {}", e);
            return ExitCode::FAILURE;
        }
    }

    if result.success {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
