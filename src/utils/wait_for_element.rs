//! DOM readiness polling
//!
//! Client-rendered pages may not expose their content when the load event
//! fires, so readiness is polled rather than assumed.

use std::time::Duration;

use chromiumoxide::Page;
use chromiumoxide::element::Element;
use tokio::time::Instant;

use super::errors::{ScrapeError, SessionStage};

const FIRST_POLL: Duration = Duration::from_millis(100);
const MAX_POLL: Duration = Duration::from_secs(1);

/// Next poll interval: doubled, capped at one second
fn backoff(interval: Duration) -> Duration {
    (interval * 2).min(MAX_POLL)
}

/// Poll for `selector` until it matches or `timeout` elapses
///
/// Sleeps never overshoot the deadline, so the last attempt lands at
/// `timeout` rather than up to a full interval after it.
pub async fn wait_for_element(
    page: &Page,
    selector: &str,
    timeout: Duration,
) -> Result<Element, ScrapeError> {
    let deadline = Instant::now() + timeout;
    let mut interval = FIRST_POLL;

    loop {
        if let Ok(element) = page.find_element(selector).await {
            return Ok(element);
        }

        let now = Instant::now();
        if now >= deadline {
            return Err(ScrapeError::session(
                SessionStage::Ready,
                format!(
                    "'{}' did not appear within {}ms",
                    selector,
                    timeout.as_millis()
                ),
            ));
        }

        tokio::time::sleep(interval.min(deadline - now)).await;
        interval = backoff(interval);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_doubles_then_caps() {
        let schedule: Vec<u128> = std::iter::successors(Some(FIRST_POLL), |d| Some(backoff(*d)))
            .take(6)
            .map(|d| d.as_millis())
            .collect();
        assert_eq!(schedule, vec![100, 200, 400, 800, 1000, 1000]);
    }
}
