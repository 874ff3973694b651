use crate::models::phenology::{fold_name, BLOOM_CODE, BUDBREAK_CODE, HARVEST_CODE};
use crate::store::DiaryStore;
use chrono::NaiveDate;

/// First diary dates at which a season reached each headline stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeasonMilestones {
    pub budbreak: Option<NaiveDate>,
    pub bloom: Option<NaiveDate>,
    pub harvest: Option<NaiveDate>,
}

/// Find the first day in `year` with a recorded stage at or above
/// `stage_code`, optionally narrowed to one block and one variety.
/// Block and variety names match case- and accent-insensitively.
pub fn first_day_at_or_above(
    diary: &DiaryStore,
    year: i32,
    block: Option<&str>,
    variety: Option<&str>,
    stage_code: i32,
) -> Option<NaiveDate> {
    let block_key = block.map(fold_name);
    let variety_key = variety.map(fold_name);

    diary
        .entries_for_year(year)
        .filter(|entry| match &block_key {
            Some(key) => fold_name(&entry.block) == *key,
            None => true,
        })
        .find(|entry| {
            entry.observations.iter().any(|observation| {
                let variety_matches = match &variety_key {
                    Some(key) => fold_name(&observation.variety) == *key,
                    None => true,
                };
                variety_matches
                    && observation
                        .stage
                        .as_ref()
                        .is_some_and(|stage| stage.code >= stage_code)
            })
        })
        .map(|entry| entry.date)
}

/// Collect budbreak, bloom, and harvest dates for one season.
pub fn season_milestones(
    diary: &DiaryStore,
    year: i32,
    block: Option<&str>,
    variety: Option<&str>,
) -> SeasonMilestones {
    SeasonMilestones {
        budbreak: first_day_at_or_above(diary, year, block, variety, BUDBREAK_CODE),
        bloom: first_day_at_or_above(diary, year, block, variety, BLOOM_CODE),
        harvest: first_day_at_or_above(diary, year, block, variety, HARVEST_CODE),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DiaryEntry;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn diary(entries: Vec<DiaryEntry>) -> DiaryStore {
        DiaryStore::from_entries(entries)
    }

    #[test]
    fn finds_first_day_reaching_threshold() {
        let store = diary(vec![
            DiaryEntry::new(day(2024, 3, 25), "Home block")
                .with_observation("Chardonnay", "7: First leaf"),
            DiaryEntry::new(day(2024, 3, 20), "Home block")
                .with_observation("Chardonnay", "5: Budbreak"),
        ]);

        // Entries are scanned in date order regardless of insertion order
        assert_eq!(
            first_day_at_or_above(&store, 2024, None, None, BUDBREAK_CODE),
            Some(day(2024, 3, 20))
        );
    }

    #[test]
    fn threshold_is_at_or_above() {
        let store = diary(vec![DiaryEntry::new(day(2024, 4, 2), "Home block")
            .with_observation("Chardonnay", "9: Two leaves")]);

        assert_eq!(
            first_day_at_or_above(&store, 2024, None, None, BUDBREAK_CODE),
            Some(day(2024, 4, 2))
        );
        assert_eq!(
            first_day_at_or_above(&store, 2024, None, None, BLOOM_CODE),
            None
        );
    }

    #[test]
    fn other_years_do_not_leak() {
        let store = diary(vec![DiaryEntry::new(day(2023, 3, 18), "Home block")
            .with_observation("Chardonnay", "5: Budbreak")]);

        assert_eq!(
            first_day_at_or_above(&store, 2024, None, None, BUDBREAK_CODE),
            None
        );
    }

    #[test]
    fn block_filter_narrows_the_scan() {
        let store = diary(vec![
            DiaryEntry::new(day(2024, 3, 18), "South slope")
                .with_observation("Riesling", "5: Budbreak"),
            DiaryEntry::new(day(2024, 3, 24), "Home block")
                .with_observation("Riesling", "5: Budbreak"),
        ]);

        assert_eq!(
            first_day_at_or_above(&store, 2024, Some("Home block"), None, BUDBREAK_CODE),
            Some(day(2024, 3, 24))
        );
        assert_eq!(
            first_day_at_or_above(&store, 2024, None, None, BUDBREAK_CODE),
            Some(day(2024, 3, 18))
        );
    }

    #[test]
    fn names_match_across_case_and_accents() {
        let store = diary(vec![DiaryEntry::new(day(2024, 3, 21), "Côte Est")
            .with_observation("Grüner Veltliner", "5: Budbreak")]);

        assert_eq!(
            first_day_at_or_above(
                &store,
                2024,
                Some("cote est"),
                Some("GRUNER VELTLINER"),
                BUDBREAK_CODE
            ),
            Some(day(2024, 3, 21))
        );
    }

    #[test]
    fn stageless_observations_are_ignored() {
        let store = diary(vec![DiaryEntry::new(day(2024, 3, 21), "Home block")
            .with_observation("Chardonnay", "looking good")]);

        assert_eq!(
            first_day_at_or_above(&store, 2024, None, None, BUDBREAK_CODE),
            None
        );
    }

    #[test]
    fn season_summary_collects_all_three_milestones() {
        let store = diary(vec![
            DiaryEntry::new(day(2024, 3, 20), "Home block")
                .with_observation("Chardonnay", "5: Budbreak"),
            DiaryEntry::new(day(2024, 5, 28), "Home block")
                .with_observation("Chardonnay", "23: Full bloom"),
            DiaryEntry::new(day(2024, 9, 25), "Home block")
                .with_observation("Chardonnay", "40: Harvest"),
        ]);

        let milestones = season_milestones(&store, 2024, None, Some("Chardonnay"));
        assert_eq!(milestones.budbreak, Some(day(2024, 3, 20)));
        assert_eq!(milestones.bloom, Some(day(2024, 5, 28)));
        assert_eq!(milestones.harvest, Some(day(2024, 9, 25)));

        let other = season_milestones(&store, 2024, None, Some("Riesling"));
        assert_eq!(other.budbreak, None);
        assert_eq!(other.harvest, None);
    }
}
