//! Chromium-backed browser session
//!
//! Owns the Browser, its CDP handler task, the single page the run drives,
//! and (for launched browsers) the temporary profile directory.

use async_trait::async_trait;
use chromiumoxide::browser::Browser;
use chromiumoxide::error::CdpError;
use chromiumoxide::page::{Page, ScreenshotParams};
use chromiumoxide_cdp::cdp::browser_protocol::network::{CookieParam, SetUserAgentOverrideParams};
use chromiumoxide_cdp::cdp::browser_protocol::page::{CaptureScreenshotFormat, PrintToPdfParams};
use std::fmt;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::BrowserSession;
use crate::utils::constants::{A4_HEIGHT_INCHES, A4_WIDTH_INCHES};
use crate::utils::{ScrapeError, SessionStage, wait_for_element};

/// How the session came to own its browser
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Ownership {
    /// We started the process and must shut it down
    Launched,
    /// Attached over CDP; only our tab is ours to close
    Attached,
}

/// Wrapper for Browser and its event handler task
///
/// Handler MUST be aborted to prevent it running indefinitely after
/// browser is closed. `Drop` does that; `close()` does the full shutdown.
pub struct ChromiumSession {
    browser: Browser,
    handler: JoinHandle<()>,
    page: Option<Page>,
    user_data_dir: Option<PathBuf>,
    ownership: Ownership,
    headless: bool,
}

impl ChromiumSession {
    /// Session without a page yet; call `open_page` before driving it
    pub(crate) fn new(
        browser: Browser,
        handler: JoinHandle<()>,
        user_data_dir: Option<PathBuf>,
        ownership: Ownership,
        headless: bool,
    ) -> Self {
        Self {
            browser,
            handler,
            page: None,
            user_data_dir,
            ownership,
            headless,
        }
    }

    /// Open the blank page the run drives, with identity applied
    ///
    /// Navigation happens separately so it can be bounded. A user agent here
    /// is an override on top of (or, when attached, instead of) the launch flag.
    pub(crate) async fn open_page(
        &mut self,
        stage: SessionStage,
        user_agent: Option<SetUserAgentOverrideParams>,
        cookies: Vec<CookieParam>,
    ) -> Result<(), ScrapeError> {
        let page = self
            .browser
            .new_page("about:blank")
            .await
            .map_err(|e| ScrapeError::session(stage, format!("Failed to create page: {e}")))?;

        if let Some(params) = user_agent {
            page.set_user_agent(params)
                .await
                .map_err(|e| ScrapeError::session(stage, format!("Failed to set user agent: {e}")))?;
        }

        if !cookies.is_empty() {
            let count = cookies.len();
            page.set_cookies(cookies)
                .await
                .map_err(|e| ScrapeError::session(stage, format!("Failed to set cookies: {e}")))?;
            debug!("Applied {} cookies", count);
        }

        self.page = Some(page);
        Ok(())
    }

    fn page(&self, stage: SessionStage) -> Result<&Page, ScrapeError> {
        self.page
            .as_ref()
            .ok_or_else(|| ScrapeError::session(stage, "No open page"))
    }

    /// Clean up temp directory (blocking operation)
    ///
    /// MUST be called AFTER `browser.wait()` completes to ensure Chrome
    /// has released all file handles. Windows will fail to remove locked files.
    fn cleanup_temp_dir(&mut self) {
        if let Some(path) = self.user_data_dir.take() {
            info!("Cleaning up temp directory: {}", path.display());
            if let Err(e) = std::fs::remove_dir_all(&path) {
                warn!(
                    "Failed to clean up temp directory {}: {}. Manual cleanup may be required.",
                    path.display(),
                    e
                );
            }
        }
    }
}

/// Run a whole navigation (load plus completion wait) under one timeout
async fn within_navigation_bound<T, E, F>(
    url: &str,
    timeout: Duration,
    step: F,
) -> Result<T, ScrapeError>
where
    E: fmt::Display,
    F: Future<Output = Result<T, E>>,
{
    match tokio::time::timeout(timeout, step).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(e)) => Err(ScrapeError::session(
            SessionStage::Navigate,
            format!("Navigation failed for URL: {url}. Error: {e}"),
        )),
        Err(_) => Err(ScrapeError::session(
            SessionStage::Navigate,
            format!(
                "Navigation timeout after {}ms for URL: {}",
                timeout.as_millis(),
                url
            ),
        )),
    }
}

#[async_trait]
impl BrowserSession for ChromiumSession {
    async fn navigate(&mut self, url: &str, timeout: Duration) -> Result<(), ScrapeError> {
        let page = self.page(SessionStage::Navigate)?;

        within_navigation_bound(url, timeout, async {
            page.goto(url).await?;
            page.wait_for_navigation().await?;
            Ok::<_, CdpError>(())
        })
        .await?;

        let final_url = page.url().await.ok().flatten();
        debug!(requested = %url, final_url = ?final_url, "Navigation complete");
        Ok(())
    }

    async fn wait_until_ready(
        &mut self,
        timeout: Duration,
        settle: Duration,
    ) -> Result<(), ScrapeError> {
        let page = self.page(SessionStage::Ready)?;
        wait_for_element(page, "body", timeout).await?;

        if !settle.is_zero() {
            debug!("Settling for {}ms", settle.as_millis());
            tokio::time::sleep(settle).await;
        }
        Ok(())
    }

    async fn page_source(&self) -> Result<String, ScrapeError> {
        self.page(SessionStage::Capture)?
            .content()
            .await
            .map_err(|e| {
                ScrapeError::session(
                    SessionStage::Capture,
                    format!("Failed to get HTML content: {e}"),
                )
            })
    }

    async fn screenshot(&self, path: &Path) -> Result<(), ScrapeError> {
        let params = ScreenshotParams::builder()
            .format(CaptureScreenshotFormat::Png)
            .full_page(true)
            .build();

        self.page(SessionStage::Capture)?
            .save_screenshot(params, path)
            .await
            .map_err(|e| {
                ScrapeError::session(
                    SessionStage::Capture,
                    format!("Page screenshot failed: {e}"),
                )
            })?;
        Ok(())
    }

    async fn pdf(&self, path: &Path) -> Result<(), ScrapeError> {
        let params = PrintToPdfParams {
            paper_width: Some(A4_WIDTH_INCHES),
            paper_height: Some(A4_HEIGHT_INCHES),
            print_background: Some(true),
            ..Default::default()
        };

        self.page(SessionStage::Capture)?
            .save_pdf(params, path)
            .await
            .map_err(|e| {
                ScrapeError::session(SessionStage::Capture, format!("PDF capture failed: {e}"))
            })?;
        Ok(())
    }

    fn supports_pdf(&self) -> bool {
        self.headless
    }

    async fn close(mut self: Box<Self>) -> Result<(), ScrapeError> {
        let mut first_error: Option<String> = None;

        if let Some(page) = self.page.take()
            && let Err(e) = page.close().await
        {
            // Closing the browser below takes the page with it
            debug!("Failed to close page: {}", e);
        }

        if self.ownership == Ownership::Launched {
            info!("Shutting down browser");

            if let Err(e) = self.browser.close().await {
                warn!("Failed to close browser cleanly: {}", e);
                first_error.get_or_insert_with(|| e.to_string());
            }

            // Wait for process to fully exit before removing its profile
            if let Err(e) = self.browser.wait().await {
                warn!("Failed to wait for browser exit: {}", e);
                first_error.get_or_insert_with(|| e.to_string());
            }

            self.cleanup_temp_dir();
        }

        // Drop aborts the handler task
        drop(self);

        match first_error {
            Some(message) => Err(ScrapeError::session(SessionStage::Close, message)),
            None => Ok(()),
        }
    }
}

impl Drop for ChromiumSession {
    fn drop(&mut self) {
        debug!("Dropping ChromiumSession - aborting handler task");
        self.handler.abort();

        if let Some(dir) = &self.user_data_dir {
            warn!(
                "ChromiumSession dropped without close(). Temp directory will be orphaned: {}",
                dir.display()
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn slow_navigation_hits_the_bound() {
        let slow = async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok::<_, String>(())
        };
        let err = within_navigation_bound("https://example.com/jobs/1", Duration::from_millis(20), slow)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            ScrapeError::Session { stage: SessionStage::Navigate, .. }
        ));
        assert!(err.to_string().contains("timeout after 20ms"));
    }

    #[tokio::test]
    async fn completion_wait_counts_against_the_same_bound() {
        // Load finishes quickly; the completion wait pushes it over the limit
        let load_then_wait = async {
            tokio::time::sleep(Duration::from_millis(15)).await;
            tokio::time::sleep(Duration::from_millis(15)).await;
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok::<_, String>(())
        };
        let result =
            within_navigation_bound("https://example.com/", Duration::from_millis(50), load_then_wait)
                .await;
        assert!(result.unwrap_err().to_string().contains("timeout"));
    }

    #[tokio::test]
    async fn step_errors_keep_their_message() {
        let failing = async { Err::<(), _>("net::ERR_NAME_NOT_RESOLVED") };
        let err = within_navigation_bound("https://nonexistent.invalid/", Duration::from_secs(1), failing)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("net::ERR_NAME_NOT_RESOLVED"));
    }
}
