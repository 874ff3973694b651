use crate::logic::heat::day_heat;
use crate::logic::window::resolve_window;
use crate::models::{Block, CumulativeHeatPoint, DailyHeatPoint, SeriesQuery};
use crate::store::{DiaryStore, WeatherCache};
use chrono::NaiveDate;
use std::collections::BTreeMap;

/// Assemble the daily heat series for one request.
///
/// The window comes from the diary and the start rule; every day in it gets
/// exactly one point. A day with no cached weather contributes zero rather
/// than a gap, so the series always covers the whole window.
///
/// When the query names no block, each day falls back to the block of a
/// diary entry dated that day, then to the first configured block. The
/// series follows wherever work was actually logged.
pub fn daily_series(
    cache: &WeatherCache,
    diary: &DiaryStore,
    blocks: &[Block],
    query: &SeriesQuery,
    today: NaiveDate,
) -> Vec<DailyHeatPoint> {
    let window = resolve_window(
        diary,
        query.year,
        query.block.as_deref(),
        query.variety.as_deref(),
        query.start_rule,
        today,
    );

    let explicit_block = query.block.as_deref().filter(|name| !name.is_empty());
    let first_block = blocks.first().map(|block| block.name.as_str());

    // First diary block seen per day, for the fallback chain
    let mut diary_block_by_day: BTreeMap<NaiveDate, &str> = BTreeMap::new();
    for entry in diary.entries() {
        diary_block_by_day
            .entry(entry.date)
            .or_insert(entry.block.as_str());
    }

    window
        .days()
        .map(|day| {
            let block = match explicit_block {
                Some(name) => Some(name),
                None => diary_block_by_day.get(&day).copied().or(first_block),
            };
            let value = block
                .and_then(|name| cache.get(name, day))
                .map(|observation| day_heat(observation, query.model))
                .unwrap_or(0.0);

            DailyHeatPoint { day, value }
        })
        .collect()
}

/// Running sum over a daily series, one output point per input point.
pub fn cumulative_series(daily: &[DailyHeatPoint]) -> Vec<CumulativeHeatPoint> {
    let mut running = 0.0;
    daily
        .iter()
        .map(|point| {
            running += point.value;
            CumulativeHeatPoint {
                day: point.day,
                value: running,
            }
        })
        .collect()
}
