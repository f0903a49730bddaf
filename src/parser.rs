use crate::types::{RawPayload, ShowRecord, UNKNOWN};
use serde_json::Value;
use tracing::debug;

/// Flattens one venue's raw showtimes document into normalized records for
/// the target date.
///
/// The upstream nests venue → events → child events (format, language) →
/// show times → seat categories. Entries for other dates are skipped;
/// missing numeric fields count as zero and missing or blank string
/// attributes become the `UNKNOWN` sentinel. A payload without the
/// venue/event structure yields an empty list, never an error. City, state,
/// source, and date are attached later by the orchestrator.
pub fn parse_payload(payload: &RawPayload, date_code: &str) -> Vec<ShowRecord> {
    let mut out = Vec::new();

    let show_details = match payload.get("ShowDetails").and_then(|v| v.as_array()) {
        Some(details) if !details.is_empty() => details,
        _ => return out,
    };
    let detail = &show_details[0];

    let venue = detail.get("Venues").cloned().unwrap_or(Value::Null);
    let venue_name = str_field(&venue, "VenueName").unwrap_or_default();
    let venue_add = str_field(&venue, "VenueAdd").unwrap_or_default();
    let chain = str_field(&venue, "VenueCompName").unwrap_or_else(|| "Unknown".to_string());

    for event in arr_field(detail, "Event") {
        let title = str_field(event, "EventTitle").unwrap_or_else(|| "Unknown".to_string());

        for child in arr_field(event, "ChildEvents") {
            let dimension = attr_or_unknown(child, "EventDimension");
            let language = attr_or_unknown(child, "EventLanguage");

            for show in arr_field(child, "ShowTimes") {
                if str_field(show, "ShowDateCode").as_deref() != Some(date_code) {
                    continue;
                }

                let mut total: u64 = 0;
                let mut avail: u64 = 0;
                let mut sold: u64 = 0;
                let mut gross: f64 = 0.0;
                for cat in arr_field(show, "Categories") {
                    let seats = num_field(cat, "MaxSeats");
                    let free = num_field(cat, "SeatsAvail").min(seats);
                    let price = float_field(cat, "CurPrice");
                    total += seats;
                    avail += free;
                    sold += seats - free;
                    gross += (seats - free) as f64 * price;
                }

                out.push(ShowRecord {
                    movie: title.clone(),
                    venue: venue_name.clone(),
                    address: venue_add.clone(),
                    language: language.clone(),
                    dimension: dimension.clone(),
                    chain: chain.clone(),
                    time: str_field(show, "ShowTime").unwrap_or_default(),
                    audi: attr_or_unknown(show, "Attributes"),
                    session_id: session_id(show),
                    total_seats: total,
                    available: avail,
                    sold,
                    gross: round2(gross),
                    city: String::new(),
                    state: String::new(),
                    source: String::new(),
                    date: String::new(),
                });
            }
        }
    }

    debug!("parsed {} show records for date {}", out.len(), date_code);
    out
}

pub fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

fn arr_field<'a>(value: &'a Value, key: &str) -> impl Iterator<Item = &'a Value> {
    value
        .get(key)
        .and_then(|v| v.as_array())
        .map(|a| a.iter())
        .unwrap_or_default()
}

fn str_field(value: &Value, key: &str) -> Option<String> {
    value
        .get(key)
        .and_then(|v| v.as_str())
        .map(|s| s.to_string())
}

/// Missing or blank-after-trim attributes collapse to the one sentinel.
fn attr_or_unknown(value: &Value, key: &str) -> String {
    match value.get(key).and_then(|v| v.as_str()) {
        Some(s) if !s.trim().is_empty() => s.trim().to_string(),
        _ => UNKNOWN.to_string(),
    }
}

/// The session id arrives as a number or a string depending on the venue.
fn session_id(show: &Value) -> String {
    match show.get("SessionId") {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => String::new(),
    }
}

/// Seat counts occasionally arrive as numeric strings; anything else is
/// treated as zero.
fn num_field(value: &Value, key: &str) -> u64 {
    match value.get(key) {
        Some(Value::Number(n)) => n.as_u64().unwrap_or(0),
        Some(Value::String(s)) => s.trim().parse().unwrap_or(0),
        _ => 0,
    }
}

fn float_field(value: &Value, key: &str) -> f64 {
    match value.get(key) {
        Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0),
        Some(Value::String(s)) => s.trim().parse().unwrap_or(0.0),
        _ => 0.0,
    }
}
