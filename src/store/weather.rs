use crate::error::Result;
use crate::models::DailyObservation;
use chrono::NaiveDate;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// On-disk and in-memory shape of the cache: block name → day → observation.
/// Both levels are BTreeMaps so every persist writes keys in sorted order and
/// unchanged data serializes byte-identically run after run.
pub type WeatherSnapshot = BTreeMap<String, BTreeMap<NaiveDate, DailyObservation>>;

/// Durable store of daily weather observations keyed by (block, day).
///
/// Mutations mark the cache dirty and stay in memory until `persist` runs;
/// `replace_all` is the exception and persists immediately. Storage failures
/// never invalidate the in-memory state: for the running process, memory is
/// the source of truth.
pub struct WeatherCache {
    path: PathBuf,
    blocks: WeatherSnapshot,
    dirty: bool,
}

impl WeatherCache {
    /// Open the cache at `path`, loading the last persisted snapshot. A
    /// missing or malformed snapshot yields an empty cache, never an error.
    pub fn load(path: PathBuf) -> Self {
        let blocks = match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(blocks) => blocks,
                Err(e) => {
                    warn!("Malformed weather cache at {:?}, starting empty: {}", path, e);
                    WeatherSnapshot::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No weather cache at {:?}, starting empty", path);
                WeatherSnapshot::new()
            }
            Err(e) => {
                warn!("Failed to read weather cache at {:?}, starting empty: {}", path, e);
                WeatherSnapshot::new()
            }
        };

        Self {
            path,
            blocks,
            dirty: false,
        }
    }

    pub fn empty(path: PathBuf) -> Self {
        Self {
            path,
            blocks: WeatherSnapshot::new(),
            dirty: false,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Exact-day lookup. Absence is a normal outcome, not an error.
    pub fn get(&self, block: &str, day: NaiveDate) -> Option<&DailyObservation> {
        self.blocks.get(block)?.get(&day)
    }

    /// Insert or overwrite the observation at (block, observation.day).
    pub fn upsert_one(&mut self, block: &str, observation: DailyObservation) {
        self.blocks
            .entry(block.to_string())
            .or_default()
            .insert(observation.day, observation);
        self.dirty = true;
    }

    /// Bulk upsert; each observation is keyed by its own day, so one call may
    /// span non-contiguous days. Empty input is a no-op.
    pub fn upsert_many(&mut self, block: &str, observations: Vec<DailyObservation>) {
        if observations.is_empty() {
            return;
        }
        for observation in observations {
            self.upsert_one(block, observation);
        }
    }

    /// Discard everything, install `snapshot`, and persist immediately.
    /// Unlike the other mutators this is the restore path and must hit disk
    /// before returning.
    pub fn replace_all(&mut self, snapshot: WeatherSnapshot) -> Result<()> {
        self.blocks = snapshot;
        self.dirty = true;
        self.persist()
    }

    /// Serialize the full mapping to disk (sorted keys, pretty JSON, written
    /// via a temp file + rename). The in-memory state is untouched either
    /// way; on failure the cache simply stays dirty.
    pub fn persist(&mut self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let mut json = serde_json::to_string_pretty(&self.blocks)?;
        json.push('\n');

        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, &json)?;
        fs::rename(&tmp, &self.path)?;

        self.dirty = false;
        debug!(
            "Persisted {} observations across {} blocks to {:?}",
            self.observation_count(),
            self.blocks.len(),
            self.path
        );
        Ok(())
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Latest cached day for a block, if any. Backfill uses this to fetch
    /// only what is missing.
    pub fn last_day(&self, block: &str) -> Option<NaiveDate> {
        self.blocks
            .get(block)
            .and_then(|days| days.keys().next_back())
            .copied()
    }

    pub fn observation_count(&self) -> usize {
        self.blocks.values().map(|days| days.len()).sum()
    }

    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn obs(y: i32, m: u32, d: u32, min_c: f64, max_c: f64) -> DailyObservation {
        DailyObservation::new(day(y, m, d)).with_temps(min_c, max_c)
    }

    fn cache_in(dir: &TempDir) -> WeatherCache {
        WeatherCache::empty(dir.path().join("weather_cache.json"))
    }

    #[test]
    fn get_miss_is_none() {
        let dir = TempDir::new().unwrap();
        let cache = cache_in(&dir);
        assert!(cache.get("Home block", day(2024, 6, 1)).is_none());
    }

    #[test]
    fn upsert_then_get() {
        let dir = TempDir::new().unwrap();
        let mut cache = cache_in(&dir);

        let observation = obs(2024, 6, 1, 12.0, 25.0);
        cache.upsert_one("Home block", observation.clone());

        assert_eq!(cache.get("Home block", day(2024, 6, 1)), Some(&observation));
        assert!(cache.get("South slope", day(2024, 6, 1)).is_none());
        assert!(cache.is_dirty());
    }

    #[test]
    fn upsert_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let mut cache = cache_in(&dir);

        let observation = obs(2024, 6, 1, 12.0, 25.0);
        cache.upsert_one("Home block", observation.clone());
        cache.upsert_one("Home block", observation.clone());

        assert_eq!(cache.get("Home block", day(2024, 6, 1)), Some(&observation));
        assert_eq!(cache.observation_count(), 1);
    }

    #[test]
    fn upsert_overwrites_same_day() {
        let dir = TempDir::new().unwrap();
        let mut cache = cache_in(&dir);

        cache.upsert_one("Home block", obs(2024, 6, 1, 12.0, 25.0));
        cache.upsert_one("Home block", obs(2024, 6, 1, 11.0, 23.5));

        let stored = cache.get("Home block", day(2024, 6, 1)).unwrap();
        assert_eq!(stored.temp_max_c, Some(23.5));
        assert_eq!(cache.observation_count(), 1);
    }

    #[test]
    fn upsert_many_empty_is_noop() {
        let dir = TempDir::new().unwrap();
        let mut cache = cache_in(&dir);

        cache.upsert_many("Home block", Vec::new());
        assert!(!cache.is_dirty());
        assert_eq!(cache.observation_count(), 0);
    }

    #[test]
    fn upsert_many_spans_days() {
        let dir = TempDir::new().unwrap();
        let mut cache = cache_in(&dir);

        cache.upsert_many(
            "Home block",
            vec![
                obs(2024, 6, 1, 12.0, 25.0),
                obs(2024, 6, 3, 13.0, 26.0),
                obs(2024, 6, 7, 10.0, 21.0),
            ],
        );

        assert_eq!(cache.observation_count(), 3);
        assert!(cache.get("Home block", day(2024, 6, 2)).is_none());
        assert_eq!(cache.last_day("Home block"), Some(day(2024, 6, 7)));
    }

    #[test]
    fn persist_and_reload_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("weather_cache.json");

        let mut cache = WeatherCache::empty(path.clone());
        cache.upsert_one("Home block", obs(2024, 6, 1, 12.0, 25.0));
        cache.upsert_one("South slope", obs(2024, 6, 2, 14.0, 28.0));
        cache.persist().unwrap();
        assert!(!cache.is_dirty());

        let reloaded = WeatherCache::load(path);
        assert_eq!(reloaded.observation_count(), 2);
        assert_eq!(reloaded.block_count(), 2);
        assert_eq!(
            reloaded.get("Home block", day(2024, 6, 1)),
            Some(&obs(2024, 6, 1, 12.0, 25.0))
        );
    }

    #[test]
    fn repeated_persist_is_byte_identical() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("weather_cache.json");

        let mut cache = WeatherCache::empty(path.clone());
        cache.upsert_one("b", obs(2024, 6, 2, 14.0, 28.0));
        cache.upsert_one("a", obs(2024, 6, 1, 12.0, 25.0));

        cache.persist().unwrap();
        let first = fs::read(&path).unwrap();
        cache.persist().unwrap();
        let second = fs::read(&path).unwrap();

        assert_eq!(first, second);
    }

    #[test]
    fn load_missing_file_yields_empty_cache() {
        let dir = TempDir::new().unwrap();
        let cache = WeatherCache::load(dir.path().join("nonexistent.json"));
        assert_eq!(cache.observation_count(), 0);
        assert!(!cache.is_dirty());
    }

    #[test]
    fn load_malformed_file_yields_empty_cache() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("weather_cache.json");
        fs::write(&path, "{ not json").unwrap();

        let cache = WeatherCache::load(path);
        assert_eq!(cache.observation_count(), 0);
    }

    #[test]
    fn replace_all_installs_snapshot_and_persists() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("weather_cache.json");

        let mut cache = WeatherCache::empty(path.clone());
        cache.upsert_one("old block", obs(2023, 6, 1, 10.0, 20.0));
        cache.persist().unwrap();

        let mut snapshot = WeatherSnapshot::new();
        let mut days = BTreeMap::new();
        days.insert(day(2024, 6, 1), obs(2024, 6, 1, 12.0, 25.0));
        snapshot.insert("Home block".to_string(), days);

        cache.replace_all(snapshot).unwrap();
        assert!(!cache.is_dirty());
        assert!(cache.get("old block", day(2023, 6, 1)).is_none());

        // The restore hit the disk without a separate persist call
        let reloaded = WeatherCache::load(path);
        assert_eq!(reloaded.observation_count(), 1);
        assert!(reloaded.get("Home block", day(2024, 6, 1)).is_some());
    }

    #[test]
    fn last_day_per_block() {
        let dir = TempDir::new().unwrap();
        let mut cache = cache_in(&dir);

        assert_eq!(cache.last_day("Home block"), None);

        cache.upsert_one("Home block", obs(2024, 6, 5, 12.0, 25.0));
        cache.upsert_one("Home block", obs(2024, 6, 1, 12.0, 25.0));

        assert_eq!(cache.last_day("Home block"), Some(day(2024, 6, 5)));
        assert_eq!(cache.last_day("South slope"), None);
    }
}
