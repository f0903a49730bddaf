use anyhow::Result;
use bms_scraper::aggregate::MovieSummary;
use bms_scraper::config::Config;
use bms_scraper::error::ScraperError;
use bms_scraper::identity::Identity;
use bms_scraper::pipeline::Orchestrator;
use bms_scraper::types::{RawPayload, ShowRecord, ShowtimesFetcher};
use serde_json::{json, Value};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Duration;
use tempfile::tempdir;

const DATE: &str = "20260828";

/// How a scripted venue responds.
enum Behavior {
    Payload(Value),
    Blocked,
    /// Sleeps well past the hard deadline.
    Hang,
    Network,
}

struct ScriptedFetcher {
    venues: HashMap<String, Behavior>,
}

#[async_trait::async_trait]
impl ShowtimesFetcher for ScriptedFetcher {
    async fn fetch_showtimes(
        &self,
        venue_code: &str,
        _date_code: &str,
        _identity: &Identity,
    ) -> std::result::Result<RawPayload, ScraperError> {
        match self.venues.get(venue_code) {
            Some(Behavior::Payload(value)) => Ok(value.clone()),
            Some(Behavior::Blocked) => Err(ScraperError::Blocked),
            Some(Behavior::Hang) => {
                tokio::time::sleep(Duration::from_secs(60)).await;
                Ok(json!({}))
            }
            Some(Behavior::Network) | None => Err(ScraperError::Api {
                message: "connection reset".to_string(),
            }),
        }
    }
}

fn venue_payload(venue: &str, movie: &str, session: u64, seats: u64, avail: u64) -> Value {
    json!({
        "ShowDetails": [{
            "Venues": {
                "VenueName": venue,
                "VenueAdd": "12 MG Road",
                "VenueCompName": "Galaxy Cinemas"
            },
            "Event": [{
                "EventTitle": movie,
                "ChildEvents": [{
                    "EventDimension": "2D",
                    "EventLanguage": "Hindi",
                    "ShowTimes": [{
                        "ShowDateCode": DATE,
                        "ShowTime": "10:15 PM",
                        "Attributes": "AUDI 1",
                        "SessionId": session,
                        "Categories": [
                            {"MaxSeats": seats, "SeatsAvail": avail, "CurPrice": 200.0}
                        ]
                    }]
                }]
            }]
        }]
    })
}

/// Builds a config and venue roster rooted in a temp dir.
fn test_config(dir: &std::path::Path, codes: &[&str]) -> Result<Config> {
    let mut roster = serde_json::Map::new();
    for code in codes {
        roster.insert(
            code.to_string(),
            json!({"City": "Pune", "State": "Maharashtra"}),
        );
    }
    let venues_path = dir.join("venues.json");
    std::fs::write(&venues_path, serde_json::to_string_pretty(&roster)?)?;

    Ok(Config {
        shard: 1,
        api_timeout_secs: 1,
        hard_timeout_secs: 1,
        delay_min_ms: 0,
        delay_max_ms: 1,
        data_dir: dir.join("data").to_string_lossy().to_string(),
        venues_file: Some(venues_path.to_string_lossy().to_string()),
    })
}

fn read_artifacts(result: &bms_scraper::pipeline::RunResult) -> Result<(Vec<ShowRecord>, BTreeMap<String, MovieSummary>)> {
    let detailed: Vec<ShowRecord> =
        serde_json::from_str(&std::fs::read_to_string(&result.detailed_file)?)?;
    let summary: BTreeMap<String, MovieSummary> =
        serde_json::from_str(&std::fs::read_to_string(&result.summary_file)?)?;
    Ok((detailed, summary))
}

#[tokio::test]
async fn full_run_produces_both_artifacts() -> Result<()> {
    let dir = tempdir()?;
    let config = test_config(dir.path(), &["V001", "V002"])?;

    let fetcher = ScriptedFetcher {
        venues: HashMap::from([
            (
                "V001".to_string(),
                Behavior::Payload(venue_payload("Galaxy Grand", "Midnight Express", 1, 100, 2)),
            ),
            (
                "V002".to_string(),
                Behavior::Payload(venue_payload("Plaza", "Midnight Express", 2, 100, 60)),
            ),
        ]),
    };

    let result = Orchestrator::new(config, Arc::new(fetcher)).run(DATE).await?;
    assert_eq!(result.total_venues, 2);
    assert_eq!(result.fetched_venues, 2);
    assert_eq!(result.records, 2);
    assert_eq!(result.movies, 1);

    let (detailed, summary) = read_artifacts(&result)?;
    assert_eq!(detailed.len(), 2);

    // Records are tagged by the orchestrator, not the parser.
    let first = &detailed[0];
    assert_eq!(first.city, "Pune");
    assert_eq!(first.state, "Maharashtra");
    assert_eq!(first.source, "BMS");
    assert_eq!(first.date, DATE);
    assert_eq!(first.sold, 98);
    assert_eq!(first.gross, 19600.0);

    let movie = &summary["Midnight Express"];
    assert_eq!(movie.shows, 2);
    assert_eq!(movie.venues, 2);
    assert_eq!(movie.cities, 1);
    // 98% occupancy show is housefull, the 40% one neither.
    assert_eq!(movie.housefull, 1);
    assert_eq!(movie.fastfilling, 0);
    Ok(())
}

#[tokio::test]
async fn timed_out_venue_is_skipped_and_the_run_continues() -> Result<()> {
    let dir = tempdir()?;
    let config = test_config(dir.path(), &["V001", "V002"])?;

    let fetcher = ScriptedFetcher {
        venues: HashMap::from([
            ("V001".to_string(), Behavior::Hang),
            (
                "V002".to_string(),
                Behavior::Payload(venue_payload("Plaza", "Midnight Express", 2, 100, 60)),
            ),
        ]),
    };

    let result = Orchestrator::new(config, Arc::new(fetcher)).run(DATE).await?;
    assert_eq!(result.failed_venues, 1);
    assert_eq!(result.failures.get("timeout"), Some(&1));

    // The hung venue's data is absent; the healthy one's survives.
    let (detailed, summary) = read_artifacts(&result)?;
    assert_eq!(detailed.len(), 1);
    assert_eq!(detailed[0].venue, "Plaza");
    assert_eq!(summary["Midnight Express"].shows, 1);
    Ok(())
}

#[tokio::test]
async fn blocked_and_network_failures_are_tallied_separately() -> Result<()> {
    let dir = tempdir()?;
    let config = test_config(dir.path(), &["V001", "V002", "V003"])?;

    let fetcher = ScriptedFetcher {
        venues: HashMap::from([
            ("V001".to_string(), Behavior::Blocked),
            ("V002".to_string(), Behavior::Network),
            (
                "V003".to_string(),
                Behavior::Payload(venue_payload("Plaza", "Midnight Express", 9, 50, 25)),
            ),
        ]),
    };

    let result = Orchestrator::new(config, Arc::new(fetcher)).run(DATE).await?;
    assert_eq!(result.failed_venues, 2);
    assert_eq!(result.failures.get("blocked"), Some(&1));
    assert_eq!(result.failures.get("network"), Some(&1));
    assert_eq!(result.records, 1);
    Ok(())
}

#[tokio::test]
async fn all_venues_failing_still_writes_empty_artifacts() -> Result<()> {
    let dir = tempdir()?;
    let config = test_config(dir.path(), &["V001", "V002"])?;

    let fetcher = ScriptedFetcher {
        venues: HashMap::from([
            ("V001".to_string(), Behavior::Blocked),
            ("V002".to_string(), Behavior::Network),
        ]),
    };

    let result = Orchestrator::new(config, Arc::new(fetcher)).run(DATE).await?;
    assert_eq!(result.failed_venues, 2);
    assert_eq!(result.records, 0);
    assert_eq!(result.movies, 0);

    let (detailed, summary) = read_artifacts(&result)?;
    assert!(detailed.is_empty());
    assert!(summary.is_empty());
    Ok(())
}

#[tokio::test]
async fn duplicate_observations_collapse_to_one_record() -> Result<()> {
    let dir = tempdir()?;
    let config = test_config(dir.path(), &["V001", "V002"])?;

    // Two venue codes serving the same physical screen: identical venue
    // name, time, session, and auditorium.
    let payload = venue_payload("Galaxy Grand", "Midnight Express", 7, 100, 20);
    let fetcher = ScriptedFetcher {
        venues: HashMap::from([
            ("V001".to_string(), Behavior::Payload(payload.clone())),
            ("V002".to_string(), Behavior::Payload(payload)),
        ]),
    };

    let result = Orchestrator::new(config, Arc::new(fetcher)).run(DATE).await?;
    assert_eq!(result.records, 1);
    let (detailed, summary) = read_artifacts(&result)?;
    assert_eq!(detailed.len(), 1);
    assert_eq!(summary["Midnight Express"].shows, 1);
    Ok(())
}
