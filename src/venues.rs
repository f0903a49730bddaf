use crate::error::{Result, ScraperError};
use crate::types::VenueInfo;
use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// Loads the venue roster: a JSON object mapping venue codes to their
/// city/state metadata. The codes are returned sorted so a run always walks
/// venues in the same order.
pub fn load_venues(path: &Path) -> Result<(Vec<String>, HashMap<String, VenueInfo>)> {
    let content = fs::read_to_string(path).map_err(|e| {
        ScraperError::Config(format!(
            "Failed to read venues file '{}': {e}",
            path.display()
        ))
    })?;
    let venues: HashMap<String, VenueInfo> = serde_json::from_str(&content)?;
    let mut codes: Vec<String> = venues.keys().cloned().collect();
    codes.sort();
    Ok((codes, venues))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loads_roster_in_sorted_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("venues.json");
        fs::write(
            &path,
            r#"{
                "PVRX": {"City": "Pune", "State": "Maharashtra"},
                "ABCD": {"City": "Mumbai", "State": "Maharashtra"}
            }"#,
        )
        .unwrap();
        let (codes, venues) = load_venues(&path).unwrap();
        assert_eq!(codes, vec!["ABCD", "PVRX"]);
        assert_eq!(venues["PVRX"].city, "Pune");
    }

    #[test]
    fn missing_roster_is_a_config_error() {
        let err = load_venues(Path::new("no-such-venues.json")).unwrap_err();
        assert!(matches!(err, ScraperError::Config(_)));
    }
}
