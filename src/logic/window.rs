use crate::logic::milestones::first_day_at_or_above;
use crate::models::phenology::{BUDBREAK_CODE, HARVEST_CODE};
use crate::models::StartRule;
use crate::store::DiaryStore;
use chrono::NaiveDate;

/// Inclusive day range over which heat accumulates for one season.
/// `end` before `start` is a valid window with no days in it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccumulationWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl AccumulationWindow {
    pub fn is_empty(&self) -> bool {
        self.end < self.start
    }

    pub fn day_count(&self) -> usize {
        if self.is_empty() {
            0
        } else {
            (self.end - self.start).num_days() as usize + 1
        }
    }

    /// Every calendar day in the window, ascending. Empty windows yield
    /// nothing.
    pub fn days(&self) -> impl Iterator<Item = NaiveDate> {
        let end = self.end;
        self.start.iter_days().take_while(move |day| *day <= end)
    }
}

/// April 1 of the given year, the conventional accumulation start in the
/// northern hemisphere.
pub fn season_start(year: i32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, 4, 1).unwrap_or_default()
}

/// Resolve the accumulation window for a season.
///
/// The start is April 1, or under the budbreak rule the earlier of recorded
/// budbreak and April 1. The end is the recorded harvest day if there is
/// one, clamped so it never runs past `today`.
pub fn resolve_window(
    diary: &DiaryStore,
    year: i32,
    block: Option<&str>,
    variety: Option<&str>,
    start_rule: StartRule,
    today: NaiveDate,
) -> AccumulationWindow {
    let fixed_start = season_start(year);
    let start = match start_rule {
        StartRule::Fixed => fixed_start,
        StartRule::Budbreak => {
            match first_day_at_or_above(diary, year, block, variety, BUDBREAK_CODE) {
                Some(budbreak) => budbreak.min(fixed_start),
                None => fixed_start,
            }
        }
    };

    let harvest = first_day_at_or_above(diary, year, block, variety, HARVEST_CODE);
    let end = harvest.unwrap_or(today).min(today);

    AccumulationWindow { start, end }
}
