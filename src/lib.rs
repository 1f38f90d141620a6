//! Job posting scraper
//!
//! Renders a single job posting in Chromium via chromiumoxide, extracts a
//! structured record with selector fallback chains, and archives the page
//! markup, screenshot, PDF and JSON record.

pub mod artifacts;
pub mod browser;
pub mod browser_setup;
pub mod page_extractor;
mod orchestrator;
mod utils;

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::page_extractor::SelectorRules;
use crate::utils::constants::{
    DEFAULT_CONFIG_FILE, DEFAULT_NAVIGATION_TIMEOUT_MILLIS, DEFAULT_OUTPUT_DIR,
    DEFAULT_WAIT_MILLIS, DEFAULT_WINDOW_HEIGHT, DEFAULT_WINDOW_WIDTH,
};

/// Configuration for one scrape run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScraperOptions {
    /// Run browser in headless mode
    #[serde(default = "default_headless")]
    pub headless: bool,

    /// Fixed delay after the body appears, for client-side rendering.
    /// A heuristic: page structures are not known in advance.
    #[serde(default = "default_wait_millis")]
    pub wait_millis: u64,

    /// Upper bound on a single page load
    #[serde(default = "default_navigation_timeout_millis")]
    pub navigation_timeout_millis: u64,

    /// Artifact directory, created if absent
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    #[serde(default = "default_save")]
    pub save_html: bool,

    #[serde(default = "default_save")]
    pub save_screenshot: bool,

    #[serde(default = "default_save")]
    pub save_pdf: bool,

    #[serde(default)]
    pub custom_user_agent: Option<String>,

    /// Attach to a running browser's DevTools endpoint instead of launching one
    #[serde(default)]
    pub cdp_url: Option<String>,

    /// Window dimensions
    #[serde(default)]
    pub window: WindowConfig,

    /// Cookies set on the page before navigation, e.g. a login session
    #[serde(default)]
    pub cookies: Vec<CookieConfig>,

    /// Per-field selector fallback chains
    #[serde(default)]
    pub selectors: SelectorRules,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowConfig {
    #[serde(default = "default_window_width")]
    pub width: u32,

    #[serde(default = "default_window_height")]
    pub height: u32,
}

/// One cookie to install before the page loads
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CookieConfig {
    pub name: String,
    pub value: String,
    pub domain: String,
    #[serde(default)]
    pub path: Option<String>,
}

fn default_headless() -> bool {
    true
}

fn default_wait_millis() -> u64 {
    DEFAULT_WAIT_MILLIS
}

fn default_navigation_timeout_millis() -> u64 {
    DEFAULT_NAVIGATION_TIMEOUT_MILLIS
}

fn default_output_dir() -> PathBuf {
    PathBuf::from(DEFAULT_OUTPUT_DIR)
}

fn default_save() -> bool {
    true
}

fn default_window_width() -> u32 {
    DEFAULT_WINDOW_WIDTH
}

fn default_window_height() -> u32 {
    DEFAULT_WINDOW_HEIGHT
}

impl Default for ScraperOptions {
    fn default() -> Self {
        Self {
            headless: default_headless(),
            wait_millis: default_wait_millis(),
            navigation_timeout_millis: default_navigation_timeout_millis(),
            output_dir: default_output_dir(),
            save_html: default_save(),
            save_screenshot: default_save(),
            save_pdf: default_save(),
            custom_user_agent: None,
            cdp_url: None,
            window: WindowConfig::default(),
            cookies: Vec::new(),
            selectors: SelectorRules::default(),
        }
    }
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            width: default_window_width(),
            height: default_window_height(),
        }
    }
}

/// Load options from a YAML file
///
/// With `path` set the file must exist. Without it, `job-scraper.yaml` in the
/// working directory is used when present, defaults otherwise.
pub fn load_yaml_config(path: Option<&Path>) -> anyhow::Result<ScraperOptions> {
    let config_path = match path {
        Some(p) => p.to_path_buf(),
        None => {
            let candidate = PathBuf::from(DEFAULT_CONFIG_FILE);
            if !candidate.exists() {
                return Ok(ScraperOptions::default());
            }
            candidate
        }
    };

    let contents = fs::read_to_string(&config_path).map_err(|e| {
        anyhow::anyhow!("Failed to read config {}: {}", config_path.display(), e)
    })?;
    let options: ScraperOptions = serde_yaml::from_str(&contents).map_err(|e| {
        anyhow::anyhow!("Failed to parse config {}: {}", config_path.display(), e)
    })?;
    Ok(options)
}

pub use artifacts::{PersistOutcome, base_name, persist};
pub use browser::{BrowserSession, ChromiumLauncher, ChromiumSession, SessionLauncher};
pub use page_extractor::{ExtractedFields, JobMetadata, JobPosting};
pub use orchestrator::{JobScraper, ResultMetadata, ScraperResult};
pub use utils::{
    ArtifactFailure, ArtifactKind, ErrorKind, ScrapeError, SessionStage,
};

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_match_documented_values() {
        let options = ScraperOptions::default();
        assert!(options.headless);
        assert_eq!(options.wait_millis, 5_000);
        assert_eq!(options.output_dir, PathBuf::from("job-postings"));
        assert!(options.save_html && options.save_screenshot && options.save_pdf);
        assert!(options.custom_user_agent.is_none());
        assert_eq!(options.window, WindowConfig { width: 1920, height: 1080 });
        assert!(options.cookies.is_empty());
    }

    #[test]
    fn yaml_overrides_only_given_keys() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "headless: false\nwaitMillis: 250\nsavePdf: false\ncustomUserAgent: test-agent/1.0\nwindow:\n  width: 800\nselectors:\n  title: ['h2']"
        )
        .unwrap();

        let options = load_yaml_config(Some(file.path())).unwrap();
        assert!(!options.headless);
        assert_eq!(options.wait_millis, 250);
        assert!(!options.save_pdf);
        assert!(options.save_html);
        assert_eq!(options.custom_user_agent.as_deref(), Some("test-agent/1.0"));
        assert_eq!(options.window.width, 800);
        assert_eq!(options.window.height, 1080);
        assert_eq!(options.selectors.title, vec!["h2".to_string()]);
        assert_eq!(options.navigation_timeout_millis, 30_000);
    }

    #[test]
    fn yaml_cookies_load_with_optional_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "cookies:\n  - name: session\n    value: abc123\n    domain: jobs.example.com\n  - name: lang\n    value: en\n    domain: .example.com\n    path: /careers"
        )
        .unwrap();

        let options = load_yaml_config(Some(file.path())).unwrap();
        assert_eq!(
            options.cookies,
            vec![
                CookieConfig {
                    name: "session".into(),
                    value: "abc123".into(),
                    domain: "jobs.example.com".into(),
                    path: None,
                },
                CookieConfig {
                    name: "lang".into(),
                    value: "en".into(),
                    domain: ".example.com".into(),
                    path: Some("/careers".into()),
                },
            ]
        );
    }

    #[test]
    fn missing_explicit_config_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_yaml_config(Some(&dir.path().join("absent.yaml"))).is_err());
    }
}
