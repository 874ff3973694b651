use super::phenology::PhenologyStage;
use chrono::NaiveDate;

/// One per-variety observation on a diary entry. `stage` is `None` when the
/// recorded stage string did not carry a parseable code; the observation is
/// kept for display but never matches a milestone threshold.
#[derive(Debug, Clone, PartialEq)]
pub struct VarietyObservation {
    pub variety: String,
    pub stage: Option<PhenologyStage>,
}

impl VarietyObservation {
    pub fn new(variety: &str, stage: Option<PhenologyStage>) -> Self {
        Self {
            variety: variety.to_string(),
            stage,
        }
    }
}

/// A diary entry as the aggregation engine sees it: a date, the block it was
/// logged on, and the growth stages observed per variety. Entries are
/// authored elsewhere and read-only here.
#[derive(Debug, Clone, PartialEq)]
pub struct DiaryEntry {
    pub date: NaiveDate,
    pub block: String,
    pub observations: Vec<VarietyObservation>,
    pub notes: Option<String>,
}

impl DiaryEntry {
    pub fn new(date: NaiveDate, block: &str) -> Self {
        Self {
            date,
            block: block.to_string(),
            observations: Vec::new(),
            notes: None,
        }
    }

    pub fn with_observation(mut self, variety: &str, stage: &str) -> Self {
        self.observations
            .push(VarietyObservation::new(variety, PhenologyStage::parse(stage)));
        self
    }

    pub fn with_notes(mut self, notes: &str) -> Self {
        self.notes = Some(notes.to_string());
        self
    }
}
