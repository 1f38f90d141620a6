use async_trait::async_trait;
use chromiumoxide_cdp::cdp::browser_protocol::network::{CookieParam, SetUserAgentOverrideParams};
use tracing::{info, warn};

use super::wrapper::{ChromiumSession, Ownership};
use super::{BrowserSession, SessionLauncher};
use crate::browser_setup::{LaunchSettings, connect_browser, launch_browser};
use crate::utils::{ScrapeError, SessionStage};
use crate::{CookieConfig, ScraperOptions};

/// Launches a fresh Chromium per session, or attaches when `cdp_url` is set
///
/// Sessions are never pooled: each `open` yields an independent browser
/// (or an independent tab when attached).
#[derive(Debug, Clone, Copy, Default)]
pub struct ChromiumLauncher;

impl ChromiumLauncher {
    pub fn new() -> Self {
        Self
    }
}

fn user_agent_override(agent: &str) -> SetUserAgentOverrideParams {
    SetUserAgentOverrideParams::new(agent)
}

fn cookie_params(cookies: &[CookieConfig]) -> Result<Vec<CookieParam>, String> {
    cookies
        .iter()
        .map(|cookie| {
            let mut builder = CookieParam::builder()
                .name(cookie.name.clone())
                .value(cookie.value.clone())
                .domain(cookie.domain.clone());
            if let Some(path) = &cookie.path {
                builder = builder.path(path.clone());
            }
            builder
                .build()
                .map_err(|e| format!("Invalid cookie '{}': {}", cookie.name, e))
        })
        .collect()
}

#[async_trait]
impl SessionLauncher for ChromiumLauncher {
    async fn open(&self, options: &ScraperOptions) -> Result<Box<dyn BrowserSession>, ScrapeError> {
        let (session, stage) = match &options.cdp_url {
            Some(cdp_url) => {
                let (browser, handler) = connect_browser(cdp_url)
                    .await
                    .map_err(|e| ScrapeError::session(SessionStage::Connect, format!("{e:#}")))?;
                info!("Attached to existing browser at {}", cdp_url);
                // PDF support follows the requested mode; the remote's is unknown
                let session =
                    ChromiumSession::new(browser, handler, None, Ownership::Attached, options.headless);
                (session, SessionStage::Connect)
            }
            None => {
                let settings = LaunchSettings {
                    headless: options.headless,
                    user_agent: options.custom_user_agent.clone(),
                    window_width: options.window.width,
                    window_height: options.window.height,
                };
                let (browser, handler, profile) = launch_browser(&settings)
                    .await
                    .map_err(|e| ScrapeError::session(SessionStage::Launch, format!("{e:#}")))?;
                let session = ChromiumSession::new(
                    browser,
                    handler,
                    Some(profile),
                    Ownership::Launched,
                    options.headless,
                );
                (session, SessionStage::Launch)
            }
        };
        let mut session = Box::new(session);

        // Launched browsers already carry the agent as a flag
        let user_agent = match stage {
            SessionStage::Connect => options.custom_user_agent.as_deref().map(user_agent_override),
            _ => None,
        };

        let prepared = match cookie_params(&options.cookies) {
            Ok(cookies) => session.open_page(stage, user_agent, cookies).await,
            Err(message) => Err(ScrapeError::session(stage, message)),
        };

        if let Err(e) = prepared {
            // Browser exists but is unusable: shut it down before reporting
            if let Err(teardown) = session.close().await {
                warn!("Failed to tear down browser after setup failure: {}", teardown);
            }
            return Err(e);
        }

        let session: Box<dyn BrowserSession> = session;
        Ok(session)
    }
}
