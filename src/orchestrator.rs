//! Scrape orchestration
//!
//! `Idle → SessionOpen → Extracted → Persisted → Closed(Success|Failure)`
//!
//! Every failure is caught here and folded into the `ScraperResult`
//! envelope; `scrape` never returns an error. Once a session has been
//! opened it is closed before `scrape` returns, on every path.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use crate::{CookieConfig, ScraperOptions};
use crate::artifacts::{PersistOutcome, base_name, persist};
use crate::browser::{BrowserSession, ChromiumLauncher, SessionLauncher};
use crate::page_extractor::{CompiledRules, JobPosting, extract_from_html};
use crate::utils::constants::READY_TIMEOUT;
use crate::utils::{
    ErrorKind, ScrapeError, validate_navigation_timeout, validate_settle_delay,
};

/// Timing and identity of one run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultMetadata {
    /// RFC 3339 start time
    pub timestamp: String,
    pub duration_seconds: f64,
    pub url: String,
}

/// Envelope returned by every scrape
///
/// `data` is present iff `success`; `error` and `error_kind` iff not.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScraperResult {
    pub success: bool,
    pub data: Option<JobPosting>,
    pub error: Option<String>,
    pub error_kind: Option<ErrorKind>,
    pub warnings: Vec<String>,
    pub metadata: ResultMetadata,
}

impl ScraperResult {
    fn pending(url: &str) -> Self {
        Self {
            success: false,
            data: None,
            error: None,
            error_kind: None,
            warnings: Vec::new(),
            metadata: ResultMetadata {
                timestamp: Utc::now().to_rfc3339(),
                duration_seconds: 0.0,
                url: url.to_string(),
            },
        }
    }

    fn succeed(mut self, outcome: PersistOutcome, elapsed: Duration) -> Self {
        self.success = true;
        self.data = Some(outcome.record);
        self.warnings = outcome.warnings;
        self.metadata.duration_seconds = elapsed.as_secs_f64();
        self
    }

    fn fail(mut self, err: &ScrapeError, elapsed: Duration) -> Self {
        self.success = false;
        self.error = Some(err.to_string());
        self.error_kind = Some(err.kind());
        self.metadata.duration_seconds = elapsed.as_secs_f64();
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScrapeState {
    Idle,
    SessionOpen,
    Extracted,
    Persisted,
    Closed { success: bool },
}

impl fmt::Display for ScrapeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScrapeState::Idle => f.write_str("idle"),
            ScrapeState::SessionOpen => f.write_str("session-open"),
            ScrapeState::Extracted => f.write_str("extracted"),
            ScrapeState::Persisted => f.write_str("persisted"),
            ScrapeState::Closed { success: true } => f.write_str("closed(success)"),
            ScrapeState::Closed { success: false } => f.write_str("closed(failure)"),
        }
    }
}

fn enter(url: &str, state: ScrapeState) {
    debug!(url, state = %state, "scrape state");
}

/// Only absolute http(s) URLs are scraped
fn validate_url(url: &str) -> Result<(), ScrapeError> {
    let parsed = url::Url::parse(url)
        .map_err(|e| ScrapeError::InvalidInput(format!("Invalid URL '{url}': {e}")))?;
    match parsed.scheme() {
        "http" | "https" => Ok(()),
        other => Err(ScrapeError::InvalidInput(format!(
            "URL must use http or https, got '{other}': {url}"
        ))),
    }
}

/// Cookies need a name and a domain to be installable before navigation
fn validate_cookies(cookies: &[CookieConfig]) -> Result<(), ScrapeError> {
    for cookie in cookies {
        if cookie.name.trim().is_empty() {
            return Err(ScrapeError::InvalidInput(
                "Cookie name must not be empty".to_string(),
            ));
        }
        if cookie.domain.trim().is_empty() {
            return Err(ScrapeError::InvalidInput(format!(
                "Cookie '{}' has no domain",
                cookie.name
            )));
        }
    }
    Ok(())
}

/// Single-URL job posting scraper
///
/// Holds no browser between calls. Each `scrape` opens its own session
/// through the launcher, so concurrent calls never share a browser.
pub struct JobScraper<L = ChromiumLauncher> {
    options: ScraperOptions,
    launcher: L,
}

impl JobScraper<ChromiumLauncher> {
    pub fn new(options: ScraperOptions) -> Self {
        Self::with_launcher(options, ChromiumLauncher::new())
    }
}

impl<L: SessionLauncher> JobScraper<L> {
    pub fn with_launcher(options: ScraperOptions, launcher: L) -> Self {
        Self { options, launcher }
    }

    /// Scrape `url` into a result envelope
    pub async fn scrape(&self, url: &str) -> ScraperResult {
        let started = Instant::now();
        let result = ScraperResult::pending(url);
        enter(url, ScrapeState::Idle);
        info!("Scraping job posting from {}", url);

        let outcome = self.run(url).await;
        let elapsed = started.elapsed();

        match outcome {
            Ok(outcome) => {
                enter(url, ScrapeState::Closed { success: true });
                info!(
                    "Scraped {} in {:.2}s (record: {})",
                    url,
                    elapsed.as_secs_f64(),
                    outcome.json_path.display()
                );
                result.succeed(outcome, elapsed)
            }
            Err(err) => {
                enter(url, ScrapeState::Closed { success: false });
                warn!("Scrape of {} failed after {:.2}s: {}", url, elapsed.as_secs_f64(), err);
                result.fail(&err, elapsed)
            }
        }
    }

    async fn run(&self, url: &str) -> Result<PersistOutcome, ScrapeError> {
        validate_url(url)?;
        let nav_timeout = validate_navigation_timeout(self.options.navigation_timeout_millis)?;
        let settle = validate_settle_delay(self.options.wait_millis)?;
        validate_cookies(&self.options.cookies)?;
        let rules = self.options.selectors.compile()?;

        let mut session = self.launcher.open(&self.options).await?;
        enter(url, ScrapeState::SessionOpen);

        let outcome = self
            .drive(session.as_mut(), url, &rules, nav_timeout, settle)
            .await;

        // Best-effort: never masks the outcome above
        if let Err(e) = session.close().await {
            warn!("Browser teardown failed: {}", e);
        }

        outcome
    }

    async fn drive(
        &self,
        session: &mut dyn BrowserSession,
        url: &str,
        rules: &CompiledRules,
        nav_timeout: Duration,
        settle: Duration,
    ) -> Result<PersistOutcome, ScrapeError> {
        let base = base_name(url, Utc::now());

        session.navigate(url, nav_timeout).await?;
        session.wait_until_ready(READY_TIMEOUT, settle).await?;
        let raw_page = session.page_source().await?;

        let record = extract_from_html(&raw_page, rules).into_posting(url);
        enter(url, ScrapeState::Extracted);

        let outcome = persist(
            &*session,
            &self.options.output_dir,
            &base,
            record,
            &raw_page,
            &self.options,
        )
        .await?;
        enter(url, ScrapeState::Persisted);

        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_validation() {
        assert!(validate_url("https://example.com/jobs/123").is_ok());
        assert!(validate_url("http://localhost:8080/p").is_ok());
        assert!(matches!(
            validate_url("/jobs/123"),
            Err(ScrapeError::InvalidInput(_))
        ));
        assert!(matches!(
            validate_url("ftp://example.com/jobs"),
            Err(ScrapeError::InvalidInput(_))
        ));
    }

    #[test]
    fn cookies_need_name_and_domain() {
        let cookie = |name: &str, domain: &str| CookieConfig {
            name: name.into(),
            value: "v".into(),
            domain: domain.into(),
            path: None,
        };
        assert!(validate_cookies(&[cookie("session", "jobs.example.com")]).is_ok());
        assert!(matches!(
            validate_cookies(&[cookie(" ", "jobs.example.com")]),
            Err(ScrapeError::InvalidInput(_))
        ));
        assert!(matches!(
            validate_cookies(&[cookie("session", "")]),
            Err(ScrapeError::InvalidInput(_))
        ));
    }

    #[test]
    fn pending_envelope_starts_failed_and_empty() {
        let result = ScraperResult::pending("https://example.com/jobs/1");
        assert!(!result.success);
        assert!(result.data.is_none() && result.error.is_none());
        assert_eq!(result.metadata.duration_seconds, 0.0);
    }

    #[test]
    fn failed_envelope_serializes_null_data() {
        let err = ScrapeError::InvalidInput("bad".into());
        let result =
            ScraperResult::pending("x").fail(&err, Duration::from_millis(1500));
        let value = serde_json::to_value(&result).unwrap();

        assert_eq!(value["success"], false);
        assert!(value["data"].is_null());
        assert_eq!(value["error"], "Invalid input: bad");
        assert_eq!(value["errorKind"], "InvalidInput");
        assert_eq!(value["metadata"]["durationSeconds"], 1.5);
        assert_eq!(value["metadata"]["url"], "x");
    }

    #[test]
    fn state_names() {
        assert_eq!(ScrapeState::SessionOpen.to_string(), "session-open");
        assert_eq!(
            ScrapeState::Closed { success: false }.to_string(),
            "closed(failure)"
        );
    }
}
