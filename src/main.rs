mod cli;
mod config;
mod datasources;
mod error;
mod logic;
mod models;
mod store;

use anyhow::Result;
use chrono::{Datelike, Local, NaiveDate};
use clap::Parser;
use cli::{Cli, Commands};
use config::Config;
use datasources::OpenMeteoClient;
use logic::{milestones, series, window, BackfillService, BlockOutcome};
use models::{HeatModel, SeriesQuery, StartRule};
use std::path::PathBuf;
use store::{DiaryStore, WeatherCache, WeatherSnapshot};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    // Initialize logging
    let default_filter = match cli.verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .init();

    // The wall clock is consulted exactly once; every window and series
    // below takes today as a plain value.
    let today = Local::now().date_naive();

    match cli.command {
        Some(Commands::Init) => cmd_init(),
        Some(Commands::Check) => cmd_check(cli.config, cli.data_dir).await,
        Some(Commands::Backfill { year, from, to }) => {
            cmd_backfill(cli.config, cli.data_dir, year, from, to, today).await
        }
        Some(Commands::Series {
            year,
            block,
            variety,
            model,
            start_rule,
            cumulative,
        }) => cmd_series(
            cli.config,
            cli.data_dir,
            year,
            block,
            variety,
            model,
            start_rule,
            cumulative,
            today,
        ),
        Some(Commands::Season {
            year,
            block,
            variety,
        }) => cmd_season(cli.config, cli.data_dir, year, block, variety, today),
        Some(Commands::Restore { file }) => cmd_restore(cli.data_dir, file),
        None => cmd_overview(cli.config, cli.data_dir, today),
    }
}

fn cmd_init() -> Result<()> {
    let (config, _path) = Config::setup_interactive()?;
    println!(
        "Ready: {} with {} block(s)",
        config.vineyard.name,
        config.blocks.len()
    );
    Ok(())
}

async fn cmd_check(config_override: Option<PathBuf>, data_dir: Option<PathBuf>) -> Result<()> {
    let config = Config::load(config_override)?;
    println!(
        "Config OK: {} ({} blocks)",
        config.vineyard.name,
        config.blocks.len()
    );

    let cache = WeatherCache::load(Config::cache_path(data_dir.as_ref())?);
    println!(
        "Weather cache: {} observations across {} blocks ({})",
        cache.observation_count(),
        cache.block_count(),
        cache.path().display()
    );

    let diary_path = Config::diary_path(data_dir.as_ref())?;
    let diary = DiaryStore::load(&diary_path);
    println!("Diary: {} entries ({})", diary.len(), diary_path.display());

    match config.blocks.iter().find_map(|block| block.coordinates()) {
        Some((latitude, longitude)) => {
            let client = OpenMeteoClient::new(config.weather.clone());
            let reachable = client
                .test_connection(latitude, longitude)
                .await
                .unwrap_or(false);
            println!(
                "Open-Meteo: {}",
                if reachable { "OK" } else { "OFFLINE" }
            );
        }
        None => println!("Open-Meteo: skipped (no block has coordinates)"),
    }

    Ok(())
}

async fn cmd_backfill(
    config_override: Option<PathBuf>,
    data_dir: Option<PathBuf>,
    year: Option<i32>,
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
    today: NaiveDate,
) -> Result<()> {
    let config = Config::load(config_override)?;
    let year = year.unwrap_or_else(|| today.year());

    // Weather is fetched from the start of the calendar year so early
    // budbreak windows have data behind them
    let start = from.unwrap_or_else(|| year_start(year));
    let season_end = NaiveDate::from_ymd_opt(year, 12, 31).unwrap_or(today);
    let end = to.unwrap_or_else(|| season_end.min(today)).min(today);

    let mut cache = WeatherCache::load(Config::cache_path(data_dir.as_ref())?);
    let service = BackfillService::new(
        OpenMeteoClient::new(config.weather.clone()),
        config.blocks.clone(),
    );

    println!("Backfilling {} through {}", start, end);
    let report = service.run(&mut cache, start, end, from.is_none()).await;

    for (name, outcome) in &report.outcomes {
        match outcome {
            BlockOutcome::Fetched(days) => println!("  {}: {} days fetched", name, days),
            BlockOutcome::UpToDate => println!("  {}: up to date", name),
            BlockOutcome::NoCoordinates => println!("  {}: skipped, no coordinates", name),
            BlockOutcome::Failed(reason) => println!("  {}: FAILED ({})", name, reason),
        }
    }
    println!(
        "Done: {} days cached, {} block(s) failed",
        report.fetched_days(),
        report.failed_count()
    );
    if !report.persisted {
        println!("Warning: cache could not be written to disk; data is held in memory only");
    }
    if !report.is_clean() {
        std::process::exit(1);
    }

    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn cmd_series(
    config_override: Option<PathBuf>,
    data_dir: Option<PathBuf>,
    year: Option<i32>,
    block: Option<String>,
    variety: Option<String>,
    model: HeatModel,
    start_rule: Option<StartRule>,
    cumulative: bool,
    today: NaiveDate,
) -> Result<()> {
    let config = Config::load(config_override)?;
    let cache = WeatherCache::load(Config::cache_path(data_dir.as_ref())?);
    let diary = DiaryStore::load(&Config::diary_path(data_dir.as_ref())?);

    let year = year.unwrap_or_else(|| today.year());
    let start_rule = start_rule.unwrap_or(config.season.start_rule);

    let mut query = SeriesQuery::new(year, model, start_rule);
    if let Some(block) = block {
        query = query.with_block(&block);
    }
    if let Some(variety) = variety {
        query = query.with_variety(&variety);
    }

    let daily = series::daily_series(&cache, &diary, &config.blocks, &query, today);
    if daily.is_empty() {
        println!("No days in the {} accumulation window yet", year);
        return Ok(());
    }

    if cumulative {
        for point in series::cumulative_series(&daily) {
            println!("{}  {:>8.2}", point.day, point.value);
        }
    } else {
        for point in &daily {
            println!("{}  {:>8.2}", point.day, point.value);
        }
    }

    let total: f64 = daily.iter().map(|point| point.value).sum();
    println!(
        "Total {} heat for {}: {:.1} over {} days",
        query.model,
        year,
        total,
        daily.len()
    );

    Ok(())
}

fn cmd_season(
    config_override: Option<PathBuf>,
    data_dir: Option<PathBuf>,
    year: Option<i32>,
    block: Option<String>,
    variety: Option<String>,
    today: NaiveDate,
) -> Result<()> {
    let config = Config::load(config_override)?;
    let cache = WeatherCache::load(Config::cache_path(data_dir.as_ref())?);
    let diary = DiaryStore::load(&Config::diary_path(data_dir.as_ref())?);

    let year = year.unwrap_or_else(|| today.year());
    let milestones = milestones::season_milestones(&diary, year, block.as_deref(), variety.as_deref());

    println!("Season {}", year);
    println!("  Budbreak: {}", format_day(milestones.budbreak));
    println!("  Bloom:    {}", format_day(milestones.bloom));
    println!("  Harvest:  {}", format_day(milestones.harvest));

    let window = window::resolve_window(
        &diary,
        year,
        block.as_deref(),
        variety.as_deref(),
        config.season.start_rule,
        today,
    );
    println!(
        "  Window:   {} through {} ({} days)",
        window.start,
        window.end,
        window.day_count()
    );

    for model in [HeatModel::Classic, HeatModel::Effective] {
        let mut query = SeriesQuery::new(year, model, config.season.start_rule);
        if let Some(block) = &block {
            query = query.with_block(block);
        }
        if let Some(variety) = &variety {
            query = query.with_variety(variety);
        }
        let daily = series::daily_series(&cache, &diary, &config.blocks, &query, today);
        let total: f64 = daily.iter().map(|point| point.value).sum();
        println!("  Total {:<9} {:.1}", format!("{}:", model), total);
    }

    Ok(())
}

fn cmd_restore(data_dir: Option<PathBuf>, file: PathBuf) -> Result<()> {
    let contents = std::fs::read_to_string(&file)?;
    let snapshot: WeatherSnapshot = serde_json::from_str(&contents)?;
    let count: usize = snapshot.values().map(|days| days.len()).sum();

    // The current cache contents are irrelevant; replace_all discards them
    let mut cache = WeatherCache::empty(Config::cache_path(data_dir.as_ref())?);
    cache.replace_all(snapshot)?;
    println!("Restored {} observations from {}", count, file.display());

    Ok(())
}

fn cmd_overview(
    config_override: Option<PathBuf>,
    data_dir: Option<PathBuf>,
    today: NaiveDate,
) -> Result<()> {
    // First run lands here with no config; walk through setup instead of
    // erroring out
    let config = if Config::exists(config_override.as_ref()) {
        Config::load(config_override)?
    } else {
        Config::setup_interactive()?.0
    };

    let cache = WeatherCache::load(Config::cache_path(data_dir.as_ref())?);
    let diary = DiaryStore::load(&Config::diary_path(data_dir.as_ref())?);

    match &config.vineyard.region {
        Some(region) => println!("{} ({})", config.vineyard.name, region),
        None => println!("{}", config.vineyard.name),
    }
    for block in &config.blocks {
        match block.coordinates() {
            Some((latitude, longitude)) => {
                println!("  {} ({:.4}, {:.4})", block.name, latitude, longitude)
            }
            None => println!("  {} (no coordinates)", block.name),
        }
    }
    println!(
        "Cached weather: {} observations | Diary: {} entries",
        cache.observation_count(),
        diary.len()
    );

    let year = today.year();
    let milestones = milestones::season_milestones(&diary, year, None, None);
    println!(
        "{}: budbreak {}, bloom {}, harvest {}",
        year,
        format_day(milestones.budbreak),
        format_day(milestones.bloom),
        format_day(milestones.harvest)
    );

    let latest = diary.entries().iter().rev().find_map(|entry| {
        entry.observations.iter().find_map(|observation| {
            observation
                .stage
                .as_ref()
                .map(|stage| (entry, observation, stage))
        })
    });
    if let Some((entry, observation, stage)) = latest {
        println!(
            "Latest recorded stage: {} ({}, {} on {})",
            stage, observation.variety, entry.block, entry.date
        );
    }

    for model in [HeatModel::Classic, HeatModel::Effective] {
        let query = SeriesQuery::new(year, model, config.season.start_rule);
        let daily = series::daily_series(&cache, &diary, &config.blocks, &query, today);
        let total: f64 = daily.iter().map(|point| point.value).sum();
        println!("Accumulated {} heat: {:.1}", model, total);
    }

    println!();
    println!("Run `vineops backfill` to refresh weather, `vineops season` for details");

    Ok(())
}

fn year_start(year: i32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, 1, 1).unwrap_or_default()
}

fn format_day(day: Option<NaiveDate>) -> String {
    day.map(|d| d.to_string())
        .unwrap_or_else(|| "not recorded".to_string())
}
