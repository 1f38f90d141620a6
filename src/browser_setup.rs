//! Chromium discovery, download and launch
//!
//! Discovery order: `CHROMIUM_PATH`, well-known install locations, `which`.
//! When nothing is installed a managed Chromium is fetched into the user
//! cache directory and reused on later runs.

use anyhow::{Context, Result};
use chromiumoxide::Handler;
use chromiumoxide::browser::{Browser, BrowserConfigBuilder, HeadlessMode};
use chromiumoxide::fetcher::{BrowserFetcher, BrowserFetcherOptions};
use chromiumoxide::handler::viewport::Viewport;
use futures::StreamExt;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Duration;
use tokio::task::{self, JoinHandle};
use tracing::{debug, error, info, trace, warn};

const CDP_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const MANAGED_BROWSER_DIR: &str = "job-scraper/chromium";

/// Always-on launch flags; the sandbox ones let Chromium run in containers
const BASE_ARGS: &[&str] = &[
    "--no-sandbox",
    "--disable-setuid-sandbox",
    "--disable-dev-shm-usage",
    "--no-first-run",
    "--no-default-browser-check",
    "--disable-extensions",
    "--disable-background-networking",
    "--disable-notifications",
    "--hide-scrollbars",
    "--mute-audio",
];

/// Removes a freshly created profile directory unless the launch succeeds
struct ProfileDirGuard {
    path: PathBuf,
    armed: bool,
}

impl ProfileDirGuard {
    fn create(path: PathBuf) -> Result<Self> {
        std::fs::create_dir_all(&path)
            .with_context(|| format!("Failed to create profile directory {}", path.display()))?;
        Ok(Self { path, armed: true })
    }

    /// Hand the directory to the session; it is no longer removed on drop
    fn disarm(mut self) -> PathBuf {
        self.armed = false;
        std::mem::take(&mut self.path)
    }
}

impl Drop for ProfileDirGuard {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        match std::fs::remove_dir_all(&self.path) {
            Ok(()) => info!(
                "Removed profile directory after failed launch: {}",
                self.path.display()
            ),
            Err(e) => warn!(
                "Failed to remove profile directory {}: {}",
                self.path.display(),
                e
            ),
        }
    }
}

/// Launch flags for one browser process
#[derive(Debug, Clone)]
pub struct LaunchSettings {
    pub headless: bool,
    pub user_agent: Option<String>,
    pub window_width: u32,
    pub window_height: u32,
}

fn install_locations() -> &'static [&'static str] {
    if cfg!(target_os = "windows") {
        &[
            r"C:\Program Files\Google\Chrome\Application\chrome.exe",
            r"C:\Program Files (x86)\Google\Chrome\Application\chrome.exe",
            r"%LOCALAPPDATA%\Google\Chrome\Application\chrome.exe",
            r"C:\Program Files\Chromium\Application\chrome.exe",
        ]
    } else if cfg!(target_os = "macos") {
        &[
            "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
            "/Applications/Chromium.app/Contents/MacOS/Chromium",
            "~/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
            "~/Applications/Chromium.app/Contents/MacOS/Chromium",
            "/opt/homebrew/bin/chromium",
        ]
    } else {
        &[
            "/usr/bin/chromium",
            "/usr/bin/chromium-browser",
            "/usr/bin/google-chrome",
            "/usr/bin/google-chrome-stable",
            "/snap/bin/chromium",
            "/usr/local/bin/chromium",
            "/opt/google/chrome/chrome",
        ]
    }
}

/// `~/` and `%VAR%` expansion for an install location
fn expand_location(raw: &str) -> Option<PathBuf> {
    if let Some(rest) = raw.strip_prefix("~/") {
        return dirs::home_dir().map(|home| home.join(rest));
    }
    if raw.contains('%') {
        return Some(PathBuf::from(expand_windows_env_vars(raw)));
    }
    Some(PathBuf::from(raw))
}

/// Expand `%VAR%` tokens; unknown variables are left as-is.
fn expand_windows_env_vars(path: &str) -> String {
    let mut result = String::with_capacity(path.len());
    let mut chars = path.chars();

    while let Some(ch) = chars.next() {
        if ch != '%' {
            result.push(ch);
            continue;
        }
        let name: String = chars.by_ref().take_while(|&c| c != '%').collect();
        if name.is_empty() {
            result.push('%');
        } else if let Ok(value) = std::env::var(&name) {
            result.push_str(&value);
        } else {
            result.push('%');
            result.push_str(&name);
            result.push('%');
        }
    }

    result
}

fn from_env() -> Option<PathBuf> {
    let path = PathBuf::from(std::env::var_os("CHROMIUM_PATH")?);
    if path.exists() {
        info!("Using browser from CHROMIUM_PATH: {}", path.display());
        return Some(path);
    }
    warn!(
        "CHROMIUM_PATH points to a missing file, ignoring: {}",
        path.display()
    );
    None
}

fn from_install_locations() -> Option<PathBuf> {
    install_locations()
        .iter()
        .filter_map(|raw| expand_location(raw))
        .find(|path| path.exists())
        .inspect(|path| info!("Found browser at: {}", path.display()))
}

fn from_search_path() -> Option<PathBuf> {
    if cfg!(target_os = "windows") {
        return None;
    }
    ["chromium", "chromium-browser", "google-chrome", "chrome"]
        .iter()
        .find_map(|cmd| {
            let output = Command::new("which").arg(cmd).output().ok()?;
            if !output.status.success() {
                return None;
            }
            let found = String::from_utf8_lossy(&output.stdout).trim().to_string();
            (!found.is_empty()).then(|| PathBuf::from(found))
        })
        .inspect(|path| info!("Found browser on PATH: {}", path.display()))
}

/// Locally installed Chrome/Chromium, if any
pub fn find_browser_executable() -> Option<PathBuf> {
    from_env()
        .or_else(from_install_locations)
        .or_else(from_search_path)
}

/// Fetch Chromium into the user cache directory and return its executable
pub async fn download_managed_browser() -> Result<PathBuf> {
    let cache_root = dirs::cache_dir().unwrap_or_else(|| {
        let fallback = std::env::temp_dir().join(".cache");
        warn!(
            "No system cache directory, falling back to {}",
            fallback.display()
        );
        fallback
    });
    let cache_dir = cache_root.join(MANAGED_BROWSER_DIR);
    std::fs::create_dir_all(&cache_dir).context("Failed to create browser cache directory")?;

    info!("Downloading managed Chromium into {}", cache_dir.display());
    let options = BrowserFetcherOptions::builder()
        .with_path(&cache_dir)
        .build()
        .context("Failed to build fetcher options")?;
    let revision = BrowserFetcher::new(options)
        .fetch()
        .await
        .context("Failed to fetch browser")?;

    info!("Chromium ready at {}", revision.folder_path.display());
    Ok(revision.executable_path)
}

async fn resolve_executable() -> Result<PathBuf> {
    match find_browser_executable() {
        Some(path) => Ok(path),
        None => {
            warn!("No local Chrome/Chromium found");
            download_managed_browser().await
        }
    }
}

/// Unique per-launch profile directory
pub fn unique_profile_dir() -> PathBuf {
    std::env::temp_dir().join(format!("job_scraper_{}", uuid::Uuid::new_v4()))
}

fn launch_args(settings: &LaunchSettings) -> Vec<String> {
    let mut args: Vec<String> = BASE_ARGS.iter().map(|a| a.to_string()).collect();
    if let Some(agent) = &settings.user_agent {
        args.push(format!("--user-agent={agent}"));
    }
    args
}

fn browser_config(settings: &LaunchSettings, executable: &Path, profile: &Path) -> BrowserConfigBuilder {
    let builder = BrowserConfigBuilder::default()
        .request_timeout(CDP_REQUEST_TIMEOUT)
        .window_size(settings.window_width, settings.window_height)
        .viewport(Viewport {
            width: settings.window_width,
            height: settings.window_height,
            ..Default::default()
        })
        .user_data_dir(profile)
        .chrome_executable(executable)
        .args(launch_args(settings));

    if settings.headless {
        builder.headless_mode(HeadlessMode::default())
    } else {
        builder.with_head()
    }
}

/// Find or download Chromium and launch it with `settings`.
///
/// Returns the browser, its CDP handler task and the profile directory,
/// which the caller removes once the process has exited. The handler task
/// must be aborted when the browser is done with.
pub async fn launch_browser(
    settings: &LaunchSettings,
) -> Result<(Browser, JoinHandle<()>, PathBuf)> {
    let executable = resolve_executable().await?;

    let profile = ProfileDirGuard::create(unique_profile_dir())?;

    let config = browser_config(settings, &executable, &profile.path)
        .build()
        .map_err(|e| anyhow::anyhow!("Invalid browser config: {e}"))?;

    debug!(
        executable = %executable.display(),
        profile = %profile.path.display(),
        headless = settings.headless,
        "Launching browser"
    );
    let (browser, handler) = Browser::launch(config)
        .await
        .context("Failed to launch browser")?;

    Ok((browser, spawn_handler(handler), profile.disarm()))
}

/// Attach to an already running browser's DevTools endpoint
pub async fn connect_browser(cdp_url: &str) -> Result<(Browser, JoinHandle<()>)> {
    info!("Connecting to existing browser at {}", cdp_url);
    let (browser, handler) = Browser::connect(cdp_url)
        .await
        .with_context(|| format!("Failed to connect to browser at {cdp_url}"))?;
    Ok((browser, spawn_handler(handler)))
}

/// Chrome emits CDP events chromiumoxide has no model for
fn is_unmodelled_event(message: &str) -> bool {
    message.contains("data did not match any variant of untagged enum Message")
        || message.contains("Failed to deserialize WS response")
}

/// Drive the CDP event stream until the connection closes
fn spawn_handler(mut handler: Handler) -> JoinHandle<()> {
    task::spawn(async move {
        while let Some(event) = handler.next().await {
            let Err(e) = event else { continue };
            let message = e.to_string();
            if is_unmodelled_event(&message) {
                trace!("Ignoring unmodelled CDP event: {}", message);
            } else {
                error!("Browser handler error: {:?}", e);
            }
        }
        debug!("Browser handler task finished");
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> LaunchSettings {
        LaunchSettings {
            headless: true,
            user_agent: None,
            window_width: 1920,
            window_height: 1080,
        }
    }

    #[test]
    fn sandbox_is_always_disabled() {
        let args = launch_args(&settings());
        assert!(args.iter().any(|a| a == "--no-sandbox"));
        assert!(args.iter().any(|a| a == "--disable-setuid-sandbox"));
        assert!(!args.iter().any(|a| a.starts_with("--user-agent")));
    }

    #[test]
    fn custom_user_agent_becomes_flag() {
        let args = launch_args(&LaunchSettings {
            user_agent: Some("JobBot/2.0".into()),
            ..settings()
        });
        assert_eq!(args.last().map(String::as_str), Some("--user-agent=JobBot/2.0"));
    }

    #[test]
    fn profile_dirs_are_unique() {
        assert_ne!(unique_profile_dir(), unique_profile_dir());
    }

    #[test]
    fn unknown_windows_vars_are_preserved() {
        assert_eq!(
            expand_windows_env_vars(r"%JOB_SCRAPER_SURELY_UNSET%\chrome.exe"),
            r"%JOB_SCRAPER_SURELY_UNSET%\chrome.exe"
        );
        assert_eq!(expand_windows_env_vars("a%%b"), "a%b");
    }

    #[test]
    fn home_relative_locations_expand() {
        if let Some(home) = dirs::home_dir() {
            assert_eq!(
                expand_location("~/Applications/Chromium.app"),
                Some(home.join("Applications/Chromium.app"))
            );
        }
        assert_eq!(
            expand_location("/usr/bin/chromium"),
            Some(PathBuf::from("/usr/bin/chromium"))
        );
    }

    #[test]
    fn unmodelled_events_are_recognised() {
        assert!(is_unmodelled_event(
            "data did not match any variant of untagged enum Message"
        ));
        assert!(!is_unmodelled_event("connection reset"));
    }

    #[test]
    fn profile_guard_removes_directory_unless_disarmed() {
        let root = tempfile::tempdir().unwrap();

        let dropped = root.path().join("dropped");
        drop(ProfileDirGuard::create(dropped.clone()).unwrap());
        assert!(!dropped.exists());

        let kept = root.path().join("kept");
        let path = ProfileDirGuard::create(kept.clone()).unwrap().disarm();
        assert_eq!(path, kept);
        assert!(kept.exists());
    }
}
