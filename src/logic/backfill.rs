use crate::datasources::OpenMeteoClient;
use crate::models::Block;
use crate::store::WeatherCache;
use chrono::NaiveDate;
use futures::future::join_all;
use tracing::{debug, info, warn};

/// Fetches historical daily weather for every coordinate-bearing block and
/// applies the results to the cache in one batch.
pub struct BackfillService {
    client: OpenMeteoClient,
    blocks: Vec<Block>,
}

/// What happened to one block during a backfill cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockOutcome {
    /// Fetched and cached this many days.
    Fetched(usize),
    /// Cache already covers the requested range.
    UpToDate,
    /// Block has no coordinates, nothing to fetch.
    NoCoordinates,
    /// Fetch failed; the rest of the cycle proceeded without this block.
    Failed(String),
}

#[derive(Debug, Clone, Default)]
pub struct BackfillReport {
    pub outcomes: Vec<(String, BlockOutcome)>,
    /// Whether the on-disk snapshot matches memory after the cycle.
    pub persisted: bool,
}

impl BackfillReport {
    pub fn fetched_days(&self) -> usize {
        self.outcomes
            .iter()
            .map(|(_, outcome)| match outcome {
                BlockOutcome::Fetched(days) => *days,
                _ => 0,
            })
            .sum()
    }

    pub fn failed_count(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|(_, outcome)| matches!(outcome, BlockOutcome::Failed(_)))
            .count()
    }

    pub fn is_clean(&self) -> bool {
        self.failed_count() == 0 && self.persisted
    }
}

impl BackfillService {
    pub fn new(client: OpenMeteoClient, blocks: Vec<Block>) -> Self {
        Self { client, blocks }
    }

    /// Backfill the inclusive `start..=end` range for every block.
    ///
    /// One fetch per block, all in flight at once. Results are applied to
    /// the cache only after every fetch has settled, so a failing block
    /// never discards its siblings' data; the cache is then persisted once.
    ///
    /// With `incremental` set, each block's fetch starts after its last
    /// cached day instead of at `start`.
    pub async fn run(
        &self,
        cache: &mut WeatherCache,
        start: NaiveDate,
        end: NaiveDate,
        incremental: bool,
    ) -> BackfillReport {
        let mut report = BackfillReport::default();
        if end < start {
            report.persisted = !cache.is_dirty();
            return report;
        }

        let mut planned = Vec::new();
        for block in &self.blocks {
            let Some((latitude, longitude)) = block.coordinates() else {
                debug!("Skipping {} during backfill, no coordinates", block.name);
                report
                    .outcomes
                    .push((block.name.clone(), BlockOutcome::NoCoordinates));
                continue;
            };

            let fetch_start = if incremental {
                match cache.last_day(&block.name) {
                    Some(last) if last >= start => last.succ_opt().unwrap_or(last),
                    _ => start,
                }
            } else {
                start
            };

            if fetch_start > end {
                debug!("{} already cached through {}", block.name, end);
                report
                    .outcomes
                    .push((block.name.clone(), BlockOutcome::UpToDate));
                continue;
            }

            planned.push((block.name.clone(), latitude, longitude, fetch_start));
        }

        // Fetch all blocks concurrently; nothing touches the cache until
        // every request has settled
        let results = join_all(planned.into_iter().map(
            |(name, latitude, longitude, fetch_start)| async move {
                let result = self
                    .client
                    .fetch_daily_range(latitude, longitude, fetch_start, end)
                    .await;
                (name, result)
            },
        ))
        .await;

        for (name, result) in results {
            match result {
                Ok(observations) => {
                    let fetched = observations.len();
                    cache.upsert_many(&name, observations);
                    info!("Backfilled {} days for {}", fetched, name);
                    report.outcomes.push((name, BlockOutcome::Fetched(fetched)));
                }
                Err(e) => {
                    warn!("Backfill failed for {}: {}", name, e);
                    report.outcomes.push((name, BlockOutcome::Failed(e.to_string())));
                }
            }
        }

        if cache.is_dirty() {
            if let Err(e) = cache.persist() {
                warn!("Failed to persist weather cache: {}", e);
            }
        }
        report.persisted = !cache.is_dirty();
        report.outcomes.sort_by(|a, b| a.0.cmp(&b.0));
        report
    }
}
