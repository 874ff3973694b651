use crate::models::{HeatModel, StartRule};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "vineops", version, about = "Vineyard phenology and heat accumulation tracker")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Path to config.yaml
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Override data directory (weather cache and diary)
    #[arg(short, long)]
    pub data_dir: Option<PathBuf>,

    /// Increase log verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Re-run interactive setup
    Init,
    /// Validate config and test the weather connection
    Check,
    /// Fetch historical weather for all blocks with coordinates
    Backfill {
        /// Season year (defaults to the current year)
        #[arg(short, long)]
        year: Option<i32>,
        /// Refetch from this day instead of continuing after cached days
        #[arg(long)]
        from: Option<NaiveDate>,
        /// Stop fetching at this day (defaults to today)
        #[arg(long)]
        to: Option<NaiveDate>,
    },
    /// Print the daily heat series for a season
    Series {
        /// Season year (defaults to the current year)
        #[arg(short, long)]
        year: Option<i32>,
        /// Restrict lookups to one block
        #[arg(short, long)]
        block: Option<String>,
        /// Restrict milestone detection to one variety
        #[arg(long)]
        variety: Option<String>,
        /// Heat model: classic/gdd or effective/egdd
        #[arg(short, long, default_value = "classic", value_parser = parse_model)]
        model: HeatModel,
        /// Start rule: fixed or budbreak (defaults to the configured rule)
        #[arg(short, long, value_parser = parse_start_rule)]
        start_rule: Option<StartRule>,
        /// Print the running total instead of per-day values
        #[arg(long)]
        cumulative: bool,
    },
    /// Show milestone dates and season totals
    Season {
        /// Season year (defaults to the current year)
        #[arg(short, long)]
        year: Option<i32>,
        /// Restrict to one block
        #[arg(short, long)]
        block: Option<String>,
        /// Restrict to one variety
        #[arg(long)]
        variety: Option<String>,
    },
    /// Replace the weather cache from a snapshot file
    Restore {
        /// Snapshot in the cache's own JSON layout
        file: PathBuf,
    },
}

fn parse_model(raw: &str) -> Result<HeatModel, String> {
    HeatModel::from_str(raw)
        .ok_or_else(|| format!("unknown model '{}', expected classic or effective", raw))
}

fn parse_start_rule(raw: &str) -> Result<StartRule, String> {
    StartRule::from_str(raw)
        .ok_or_else(|| format!("unknown start rule '{}', expected fixed or budbreak", raw))
}
