use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One calendar day's weather for one block. Any field may be missing when
/// the upstream source had no reading for it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyObservation {
    pub day: NaiveDate,
    pub temp_max_c: Option<f64>,
    pub temp_min_c: Option<f64>,
    pub sunshine_hours: Option<f64>,
    pub precipitation_mm: Option<f64>,
}

impl DailyObservation {
    pub fn new(day: NaiveDate) -> Self {
        Self {
            day,
            temp_max_c: None,
            temp_min_c: None,
            sunshine_hours: None,
            precipitation_mm: None,
        }
    }

    pub fn with_temps(mut self, min_c: f64, max_c: f64) -> Self {
        self.temp_min_c = Some(min_c);
        self.temp_max_c = Some(max_c);
        self
    }

    pub fn with_sunshine(mut self, hours: f64) -> Self {
        self.sunshine_hours = Some(hours);
        self
    }

    pub fn with_precipitation(mut self, mm: f64) -> Self {
        self.precipitation_mm = Some(mm);
        self
    }

    /// True when the upstream source reported nothing at all for this day.
    pub fn is_empty(&self) -> bool {
        self.temp_max_c.is_none()
            && self.temp_min_c.is_none()
            && self.sunshine_hours.is_none()
            && self.precipitation_mm.is_none()
    }
}
