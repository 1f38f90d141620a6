//! Timeout validation utilities for browser operations

use std::time::Duration;

use super::errors::ScrapeError;

/// Maximum timeout for browser navigation operations (5 minutes)
/// Covers slow-loading sites, heavy SPAs, and network delays
pub const MAX_NAVIGATION_TIMEOUT_MS: u64 = 300_000; // 5 minutes

/// Maximum post-load settle delay (5 minutes)
pub const MAX_SETTLE_DELAY_MS: u64 = 300_000; // 5 minutes

/// Validate timeout for the navigation step
///
/// # Returns
/// * `Ok(Duration)` - Validated Duration object
/// * `Err(ScrapeError::InvalidInput)` - If timeout is zero or exceeds MAX_NAVIGATION_TIMEOUT_MS
///
/// # Example
/// ```rust,ignore
/// let timeout = validate_navigation_timeout(45_000)?;
/// ```
pub fn validate_navigation_timeout(timeout_ms: u64) -> Result<Duration, ScrapeError> {
    if timeout_ms == 0 {
        return Err(ScrapeError::InvalidInput(
            "Navigation timeout must be greater than 0ms".to_string(),
        ));
    }

    if timeout_ms > MAX_NAVIGATION_TIMEOUT_MS {
        return Err(ScrapeError::InvalidInput(format!(
            "Navigation timeout cannot exceed {}ms ({} minutes). Received: {}ms ({:.1} minutes)",
            MAX_NAVIGATION_TIMEOUT_MS,
            MAX_NAVIGATION_TIMEOUT_MS / 60_000,
            timeout_ms,
            timeout_ms as f64 / 60_000.0
        )));
    }

    Ok(Duration::from_millis(timeout_ms))
}

/// Validate the fixed settle delay applied after the page is ready
///
/// Zero is allowed and disables the delay.
pub fn validate_settle_delay(wait_ms: u64) -> Result<Duration, ScrapeError> {
    if wait_ms > MAX_SETTLE_DELAY_MS {
        return Err(ScrapeError::InvalidInput(format!(
            "Wait time cannot exceed {}ms ({} minutes). Received: {}ms ({:.1} minutes)",
            MAX_SETTLE_DELAY_MS,
            MAX_SETTLE_DELAY_MS / 60_000,
            wait_ms,
            wait_ms as f64 / 60_000.0
        )));
    }

    Ok(Duration::from_millis(wait_ms))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn navigation_timeout_bounds() {
        assert_eq!(
            validate_navigation_timeout(30_000).unwrap(),
            Duration::from_secs(30)
        );
        assert!(validate_navigation_timeout(0).is_err());
        assert!(validate_navigation_timeout(MAX_NAVIGATION_TIMEOUT_MS + 1).is_err());
    }

    #[test]
    fn settle_delay_allows_zero() {
        assert_eq!(validate_settle_delay(0).unwrap(), Duration::ZERO);
        assert!(validate_settle_delay(MAX_SETTLE_DELAY_MS).is_ok());
        assert!(validate_settle_delay(MAX_SETTLE_DELAY_MS + 1).is_err());
    }
}
