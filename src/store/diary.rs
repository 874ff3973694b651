use crate::models::{DiaryEntry, PhenologyStage};
use chrono::{Datelike, NaiveDate};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tracing::{debug, warn};

/// Diary entry as it sits on disk: phenology observations are free-form
/// "code: label" strings keyed by variety. Parsing into typed stages happens
/// once, here, when the store loads.
#[derive(Debug, Deserialize)]
struct RawDiaryEntry {
    date: NaiveDate,
    block: String,
    #[serde(default)]
    observations: BTreeMap<String, String>,
    #[serde(default)]
    notes: Option<String>,
}

/// Read-only view over the vineyard diary. Entries are written by the
/// record-keeping side of the house; this subsystem only scans them for
/// phenology milestones.
pub struct DiaryStore {
    entries: Vec<DiaryEntry>,
}

impl DiaryStore {
    /// Load the diary at `path`. A missing or malformed file yields an empty
    /// store; milestone detection then simply finds nothing.
    pub fn load(path: &Path) -> Self {
        let raw: Vec<RawDiaryEntry> = match fs::read_to_string(path) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(raw) => raw,
                Err(e) => {
                    warn!("Malformed diary at {:?}, treating as empty: {}", path, e);
                    Vec::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No diary at {:?}, treating as empty", path);
                Vec::new()
            }
            Err(e) => {
                warn!("Failed to read diary at {:?}, treating as empty: {}", path, e);
                Vec::new()
            }
        };

        Self::from_entries(raw.into_iter().map(into_entry).collect())
    }

    pub fn from_entries(mut entries: Vec<DiaryEntry>) -> Self {
        entries.sort_by_key(|entry| entry.date);
        Self { entries }
    }

    /// All entries, ascending by date.
    pub fn entries(&self) -> &[DiaryEntry] {
        &self.entries
    }

    pub fn entries_for_year(&self, year: i32) -> impl Iterator<Item = &DiaryEntry> {
        self.entries
            .iter()
            .filter(move |entry| entry.date.year() == year)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn into_entry(raw: RawDiaryEntry) -> DiaryEntry {
    let mut entry = DiaryEntry::new(raw.date, &raw.block);
    for (variety, stage) in &raw.observations {
        if PhenologyStage::parse(stage).is_none() {
            warn!(
                "Unparseable phenology stage '{}' for {} on {}, keeping observation without a stage",
                stage, variety, raw.date
            );
        }
        entry = entry.with_observation(variety, stage);
    }
    if let Some(notes) = raw.notes {
        entry = entry.with_notes(&notes);
    }
    entry
}
