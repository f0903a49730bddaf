use crate::parser::round2;
use crate::types::ShowRecord;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

/// Percentage of seats sold, rounded to 2 decimals; zero-capacity buckets
/// report 0.0 rather than dividing by zero.
pub fn occupancy(sold: u64, total_seats: u64) -> f64 {
    if total_seats == 0 {
        0.0
    } else {
        round2(sold as f64 / total_seats as f64 * 100.0)
    }
}

const HOUSEFULL_THRESHOLD: f64 = 98.0;
const FASTFILLING_THRESHOLD: f64 = 50.0;

/// One rollup accumulator, reused unchanged at the movie level and for the
/// city/language/format sub-dimensions. Accumulation is commutative and
/// associative, so per-shard partial buckets can be merged after the fact.
#[derive(Debug, Default, Clone)]
pub struct Bucket {
    pub shows: u64,
    pub gross: f64,
    pub sold: u64,
    pub total_seats: u64,
    pub venues: HashSet<String>,
    pub fastfilling: u64,
    pub housefull: u64,
}

impl Bucket {
    /// Folds one show in. A show increments at most one of the two fill
    /// counters: housefull at >= 98% occupancy, fastfilling at [50, 98).
    pub fn fold(&mut self, record: &ShowRecord) {
        self.shows += 1;
        self.gross += record.gross;
        self.sold += record.sold;
        self.total_seats += record.total_seats;
        self.venues.insert(record.venue.clone());
        let occ = occupancy(record.sold, record.total_seats);
        if occ >= HOUSEFULL_THRESHOLD {
            self.housefull += 1;
        } else if occ >= FASTFILLING_THRESHOLD {
            self.fastfilling += 1;
        }
    }

    /// Combines two partial buckets, e.g. from parallel shards.
    pub fn merge(&mut self, other: Bucket) {
        self.shows += other.shows;
        self.gross += other.gross;
        self.sold += other.sold;
        self.total_seats += other.total_seats;
        self.venues.extend(other.venues);
        self.fastfilling += other.fastfilling;
        self.housefull += other.housefull;
    }

    fn finalize(&self) -> BucketStats {
        BucketStats {
            venues: self.venues.len() as u64,
            shows: self.shows,
            gross: round2(self.gross),
            sold: self.sold,
            total_seats: self.total_seats,
            fastfilling: self.fastfilling,
            housefull: self.housefull,
            occupancy: occupancy(self.sold, self.total_seats),
        }
    }
}

/// Finalized bucket: set memberships collapsed to counts, sums rounded.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BucketStats {
    pub venues: u64,
    pub shows: u64,
    pub gross: f64,
    pub sold: u64,
    #[serde(rename = "totalSeats")]
    pub total_seats: u64,
    pub fastfilling: u64,
    pub housefull: u64,
    pub occupancy: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CityDetail {
    pub city: String,
    pub state: String,
    #[serde(flatten)]
    pub stats: BucketStats,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LanguageDetail {
    pub language: String,
    #[serde(flatten)]
    pub stats: BucketStats,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormatDetail {
    pub dimension: String,
    #[serde(flatten)]
    pub stats: BucketStats,
}

/// Per-movie summary in the shape of the summary artifact.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MovieSummary {
    pub shows: u64,
    pub gross: f64,
    pub sold: u64,
    #[serde(rename = "totalSeats")]
    pub total_seats: u64,
    pub venues: u64,
    pub cities: u64,
    pub fastfilling: u64,
    pub housefull: u64,
    pub occupancy: f64,
    #[serde(rename = "City_details")]
    pub city_details: Vec<CityDetail>,
    #[serde(rename = "Language_details")]
    pub language_details: Vec<LanguageDetail>,
    #[serde(rename = "Format_details")]
    pub format_details: Vec<FormatDetail>,
}

#[derive(Debug, Default)]
struct MovieRollup {
    top: Bucket,
    cities: HashSet<String>,
    by_city: BTreeMap<(String, String), Bucket>,
    by_language: BTreeMap<String, Bucket>,
    by_format: BTreeMap<String, Bucket>,
}

impl MovieRollup {
    fn fold(&mut self, record: &ShowRecord) {
        self.top.fold(record);
        self.cities.insert(record.city.clone());
        self.by_city
            .entry((record.city.clone(), record.state.clone()))
            .or_default()
            .fold(record);
        self.by_language
            .entry(record.language.clone())
            .or_default()
            .fold(record);
        self.by_format
            .entry(record.dimension.clone())
            .or_default()
            .fold(record);
    }

    fn finalize(&self) -> MovieSummary {
        let top = self.top.finalize();
        MovieSummary {
            shows: top.shows,
            gross: top.gross,
            sold: top.sold,
            total_seats: top.total_seats,
            venues: top.venues,
            cities: self.cities.len() as u64,
            fastfilling: top.fastfilling,
            housefull: top.housefull,
            occupancy: top.occupancy,
            city_details: self
                .by_city
                .iter()
                .map(|((city, state), bucket)| CityDetail {
                    city: city.clone(),
                    state: state.clone(),
                    stats: bucket.finalize(),
                })
                .collect(),
            language_details: self
                .by_language
                .iter()
                .map(|(language, bucket)| LanguageDetail {
                    language: language.clone(),
                    stats: bucket.finalize(),
                })
                .collect(),
            format_details: self
                .by_format
                .iter()
                .map(|(dimension, bucket)| FormatDetail {
                    dimension: dimension.clone(),
                    stats: bucket.finalize(),
                })
                .collect(),
        }
    }
}

/// Rolls deduplicated records up into the per-movie summary mapping.
///
/// Each record feeds four buckets: the movie's top-level bucket and its
/// (city,state), language, and format sub-buckets. Folding is
/// order-independent; finalization is a pure transform, so the result is
/// invariant under reordering of the input.
pub fn aggregate(records: &[ShowRecord]) -> BTreeMap<String, MovieSummary> {
    let mut rollups: BTreeMap<String, MovieRollup> = BTreeMap::new();
    for record in records {
        rollups
            .entry(record.movie.clone())
            .or_default()
            .fold(record);
    }
    rollups
        .iter()
        .map(|(movie, rollup)| (movie.clone(), rollup.finalize()))
        .collect()
}
