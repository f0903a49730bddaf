use crate::error::{Result, ScraperError};
use crate::identity::Identity;
use crate::types::{RawPayload, ShowtimesFetcher};
use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

const BASE_URL: &str = "https://in.bookmyshow.com";

/// Runs `op` on its own task under a hard wall-clock deadline.
///
/// Completion in time propagates the operation's result or failure
/// unchanged. Past the deadline this returns `ScraperError::Timeout`
/// immediately and drops the join handle: the task keeps running detached
/// until the underlying call returns on its own, and its output is
/// discarded. The fetch has no cancellation hook, so abandonment is the
/// modeled outcome rather than a leak; at most one abandoned task exists
/// per venue attempted.
pub async fn run_bounded<T, F>(op: F, deadline: Duration) -> Result<T>
where
    F: Future<Output = Result<T>> + Send + 'static,
    T: Send + 'static,
{
    let handle = tokio::spawn(op);
    match tokio::time::timeout(deadline, handle).await {
        Ok(Ok(result)) => result,
        Ok(Err(join_err)) => {
            warn!("fetch task failed before completing: {}", join_err);
            Err(ScraperError::Api {
                message: format!("fetch task failed: {join_err}"),
            })
        }
        Err(_elapsed) => Err(ScraperError::Timeout),
    }
}

/// Production fetcher for the showtimes-by-venue endpoint.
pub struct BmsApi {
    base_url: String,
}

impl Default for BmsApi {
    fn default() -> Self {
        Self::new()
    }
}

impl BmsApi {
    pub fn new() -> Self {
        Self {
            base_url: BASE_URL.to_string(),
        }
    }

    /// Point the fetcher at a different host, e.g. a local stub.
    pub fn with_base_url(base_url: &str) -> Self {
        Self {
            base_url: base_url.to_string(),
        }
    }
}

#[async_trait::async_trait]
impl ShowtimesFetcher for BmsApi {
    async fn fetch_showtimes(
        &self,
        venue_code: &str,
        date_code: &str,
        identity: &Identity,
    ) -> Result<RawPayload> {
        let url = format!(
            "{}/api/v2/mobile/showtimes/byvenue?venueCode={}&dateCode={}",
            self.base_url, venue_code, date_code
        );
        let response = identity
            .client
            .get(&url)
            .headers(identity.headers())
            .send()
            .await?;
        let text = response.text().await?;

        // An anti-bot interstitial comes back as HTML; anything that is not
        // a JSON object is treated as a block signal.
        if !text.trim_start().starts_with('{') {
            return Err(ScraperError::Blocked);
        }
        let payload: RawPayload =
            serde_json::from_str(&text).map_err(|_| ScraperError::Blocked)?;
        debug!("fetched showtimes payload for venue {}", venue_code);
        Ok(payload)
    }
}
