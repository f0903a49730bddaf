use crate::error::Result;
use crate::identity::Identity;
use serde::{Deserialize, Serialize};

/// Raw showtimes payload as returned by the upstream API
pub type RawPayload = serde_json::Value;

/// Fixed literal identifying the upstream in every emitted record
pub const SOURCE_TAG: &str = "BMS";

/// Sentinel for string attributes that are missing or blank upstream
pub const UNKNOWN: &str = "UNKNOWN";

/// City/state metadata attached to a venue code, supplied by the venue
/// roster file rather than the upstream API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VenueInfo {
    #[serde(rename = "City")]
    pub city: String,
    #[serde(rename = "State")]
    pub state: String,
}

/// One normalized show observation. Field names mirror the detailed output
/// artifact exactly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShowRecord {
    pub movie: String,
    pub venue: String,
    pub address: String,
    pub language: String,
    pub dimension: String,
    pub chain: String,
    pub time: String,
    pub audi: String,
    pub session_id: String,
    #[serde(rename = "totalSeats")]
    pub total_seats: u64,
    pub available: u64,
    pub sold: u64,
    pub gross: f64,
    pub city: String,
    pub state: String,
    pub source: String,
    pub date: String,
}

impl ShowRecord {
    /// Composite identity of one observed show; repeated observations with
    /// an equal key are duplicates.
    pub fn dedupe_key(&self) -> (String, String, String, String) {
        (
            self.venue.clone(),
            self.time.clone(),
            self.session_id.clone(),
            self.audi.clone(),
        )
    }
}

/// Seam between the orchestrator and the network. The production
/// implementation talks to the showtimes-by-venue endpoint; tests substitute
/// canned or failing fetchers.
#[async_trait::async_trait]
pub trait ShowtimesFetcher: Send + Sync {
    /// Fetch the raw showtimes document for one venue and date. Fails with
    /// `ScraperError::Blocked` when the response body is not JSON.
    async fn fetch_showtimes(
        &self,
        venue_code: &str,
        date_code: &str,
        identity: &Identity,
    ) -> Result<RawPayload>;
}
