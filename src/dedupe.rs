use crate::types::ShowRecord;
use std::collections::HashSet;

/// Drops repeated observations of the same show, keeping the first one
/// encountered. Stable and pure: records with distinct keys keep their
/// relative order. The same show can be observed twice when the upstream
/// repeats a show-time entry across child events or a venue is listed
/// under two codes.
pub fn dedupe(records: Vec<ShowRecord>) -> Vec<ShowRecord> {
    let mut seen = HashSet::new();
    let mut out = Vec::with_capacity(records.len());
    for record in records {
        if seen.insert(record.dedupe_key()) {
            out.push(record);
        }
    }
    out
}
