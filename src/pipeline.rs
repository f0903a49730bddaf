use crate::aggregate::{aggregate, MovieSummary};
use crate::config::Config;
use crate::dedupe::dedupe;
use crate::error::{FailureKind, Result};
use crate::fetch::run_bounded;
use crate::identity::WorkerContext;
use crate::parser::parse_payload;
use crate::types::{RawPayload, ShowRecord, ShowtimesFetcher, VenueInfo, SOURCE_TAG};
use crate::venues::load_venues;
use rand::Rng;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// Result of a complete collection run
#[derive(Debug, Serialize)]
pub struct RunResult {
    pub date_code: String,
    pub total_venues: usize,
    pub fetched_venues: usize,
    pub failed_venues: usize,
    pub records: usize,
    pub movies: usize,
    pub failures: BTreeMap<&'static str, usize>,
    pub detailed_file: String,
    pub summary_file: String,
}

/// Drives the per-venue loop: fetch under the hard deadline, parse, tag,
/// accumulate; on any fetch failure reset the worker's identity, record the
/// failure kind, and move on. No venue is retried within a run, and no
/// failure is fatal — both artifacts are written even if every venue fails.
pub struct Orchestrator {
    config: Config,
    fetcher: Arc<dyn ShowtimesFetcher>,
}

impl Orchestrator {
    pub fn new(config: Config, fetcher: Arc<dyn ShowtimesFetcher>) -> Self {
        Self { config, fetcher }
    }

    /// Runs the full pipeline for one date code and writes both artifacts.
    #[instrument(skip(self))]
    pub async fn run(&self, date_code: &str) -> Result<RunResult> {
        info!("run started for date {}", date_code);
        let (codes, venues) = load_venues(&self.config.venues_path())?;
        let (rows, failures) = self.collect(&codes, &venues, date_code).await;

        let detailed = dedupe(rows);
        let summary = aggregate(&detailed);
        let (detailed_file, summary_file) =
            self.write_artifacts(date_code, &detailed, &summary)?;

        let failed_venues: usize = failures.values().sum();
        let result = RunResult {
            date_code: date_code.to_string(),
            total_venues: codes.len(),
            fetched_venues: codes.len() - failed_venues,
            failed_venues,
            records: detailed.len(),
            movies: summary.len(),
            failures,
            detailed_file,
            summary_file,
        };
        info!(
            "run finished: {} shows across {} movies, {}/{} venues failed",
            result.records, result.movies, result.failed_venues, result.total_venues
        );
        Ok(result)
    }

    /// The accumulation loop. Returns every tagged record observed plus the
    /// per-kind failure tally.
    pub async fn collect(
        &self,
        codes: &[String],
        venues: &HashMap<String, VenueInfo>,
        date_code: &str,
    ) -> (Vec<ShowRecord>, BTreeMap<&'static str, usize>) {
        let mut ctx = WorkerContext::new(self.config.api_timeout());
        let mut rows: Vec<ShowRecord> = Vec::new();
        let mut failures: BTreeMap<&'static str, usize> = BTreeMap::new();

        for (i, code) in codes.iter().enumerate() {
            info!("[{}/{}] {}", i + 1, codes.len(), code);
            match self.fetch_venue(&mut ctx, code, date_code).await {
                Ok(payload) => {
                    let mut records = parse_payload(&payload, date_code);
                    for record in &mut records {
                        if let Some(venue_info) = venues.get(code) {
                            record.city = venue_info.city.clone();
                            record.state = venue_info.state.clone();
                        }
                        record.source = SOURCE_TAG.to_string();
                        record.date = date_code.to_string();
                    }
                    rows.extend(records);
                }
                Err(e) => {
                    let kind = FailureKind::from_error(&e);
                    ctx.reset_identity();
                    *failures.entry(kind.as_str()).or_insert(0) += 1;
                    warn!("{} | {}: {}", code, kind.as_str(), e);
                }
            }
            if i + 1 < codes.len() {
                self.jitter().await;
            }
        }

        (rows, failures)
    }

    /// One guarded fetch. The identity and fetcher handle are cloned into
    /// the spawned task so a timed-out fetch can run to completion detached
    /// without borrowing from the loop.
    async fn fetch_venue(
        &self,
        ctx: &mut WorkerContext,
        venue_code: &str,
        date_code: &str,
    ) -> Result<RawPayload> {
        let identity = ctx.identity().clone();
        let fetcher = Arc::clone(&self.fetcher);
        let venue = venue_code.to_string();
        let date = date_code.to_string();
        run_bounded(
            async move { fetcher.fetch_showtimes(&venue, &date, &identity).await },
            self.config.hard_timeout(),
        )
        .await
    }

    /// Randomized inter-venue delay to keep requests from bursting.
    async fn jitter(&self) {
        let ms = rand::thread_rng().gen_range(self.config.delay_min_ms..=self.config.delay_max_ms);
        tokio::time::sleep(std::time::Duration::from_millis(ms)).await;
    }

    fn write_artifacts(
        &self,
        date_code: &str,
        detailed: &[ShowRecord],
        summary: &BTreeMap<String, MovieSummary>,
    ) -> Result<(String, String)> {
        let run_dir = self.config.run_dir(date_code);
        fs::create_dir_all(&run_dir)?;

        let detailed_file = run_dir.join(format!("detailed{}.json", self.config.shard));
        fs::write(&detailed_file, serde_json::to_string_pretty(detailed)?)?;

        let summary_file = run_dir.join(format!("movie_summary{}.json", self.config.shard));
        fs::write(&summary_file, serde_json::to_string_pretty(summary)?)?;

        info!(
            "artifacts written: {} and {}",
            detailed_file.display(),
            summary_file.display()
        );
        Ok((
            path_string(&detailed_file),
            path_string(&summary_file),
        ))
    }
}

fn path_string(path: &Path) -> String {
    path.to_string_lossy().to_string()
}
