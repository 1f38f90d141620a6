//! Browser session abstraction
//!
//! A session is an explicit, exclusively owned value: `SessionLauncher::open`
//! hands one out, the pipeline drives it, and `BrowserSession::close`
//! consumes it. Chromium (via chromiumoxide) is the production backend.

mod launcher;
mod wrapper;

pub use launcher::ChromiumLauncher;
pub use wrapper::ChromiumSession;

use async_trait::async_trait;
use std::path::Path;
use std::time::Duration;

use crate::ScraperOptions;
use crate::utils::ScrapeError;

/// Opens browser sessions configured from `ScraperOptions`
#[async_trait]
pub trait SessionLauncher: Send + Sync {
    /// Launch (or attach to) a browser and open a blank page.
    async fn open(&self, options: &ScraperOptions) -> Result<Box<dyn BrowserSession>, ScrapeError>;
}

/// One browser page owned by one scrape run
#[async_trait]
pub trait BrowserSession: Send + Sync {
    /// Load `url`; returns once the browser reports navigation complete.
    async fn navigate(&mut self, url: &str, timeout: Duration) -> Result<(), ScrapeError>;

    /// Poll for `document.body` up to `timeout`, then sleep `settle`.
    async fn wait_until_ready(
        &mut self,
        timeout: Duration,
        settle: Duration,
    ) -> Result<(), ScrapeError>;

    /// Rendered page markup
    async fn page_source(&self) -> Result<String, ScrapeError>;

    /// Full-page PNG written to `path`
    async fn screenshot(&self, path: &Path) -> Result<(), ScrapeError>;

    /// A4 PDF written to `path`
    async fn pdf(&self, path: &Path) -> Result<(), ScrapeError>;

    /// Whether `pdf` can work at all (printing needs headless Chromium)
    fn supports_pdf(&self) -> bool;

    /// Release the browser. Consumes the session so it runs at most once.
    async fn close(self: Box<Self>) -> Result<(), ScrapeError>;
}
