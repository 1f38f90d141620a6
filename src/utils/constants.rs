//! Shared configuration constants for the scrape pipeline
//!
//! Default values and limits used throughout the codebase to ensure
//! consistency and avoid magic numbers.

use std::time::Duration;

/// Maximum time to wait for `document.body` after navigation completes.
pub const READY_TIMEOUT: Duration = Duration::from_secs(10);

/// Default post-ready settle delay (client-side rendering allowance).
pub const DEFAULT_WAIT_MILLIS: u64 = 5_000;

/// Default bound on a single page load.
pub const DEFAULT_NAVIGATION_TIMEOUT_MILLIS: u64 = 30_000;

/// Default directory for artifacts and JSON records.
pub const DEFAULT_OUTPUT_DIR: &str = "job-postings";

/// Config file picked up from the working directory when no path is given.
pub const DEFAULT_CONFIG_FILE: &str = "job-scraper.yaml";

/// Default viewport, matches a common desktop resolution.
pub const DEFAULT_WINDOW_WIDTH: u32 = 1920;
pub const DEFAULT_WINDOW_HEIGHT: u32 = 1080;

/// A4 paper size in inches for PDF capture.
pub const A4_WIDTH_INCHES: f64 = 8.27;
pub const A4_HEIGHT_INCHES: f64 = 11.69;

/// Stem used for artifact names when the URL has neither path nor host.
pub const FALLBACK_STEM: &str = "page";

/// Suffixed names tried before giving up on claiming an artifact name.
pub const MAX_NAME_CLAIMS: u32 = 1_000;
