mod config;
mod db;
mod error;
mod fetcher;
mod import;
mod model;
mod odds;
mod pipeline;
mod predict;
mod teams;
mod types;

use std::path::PathBuf;

use chrono::Local;
use clap::{Parser, Subcommand};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use crate::config::Config;
use crate::error::Result;
use crate::model::{probe_schema, LinearModel};
use crate::pipeline::{CycleSummary, Pipeline};

#[derive(Parser, Debug)]
#[command(name = "nba-predict")]
#[command(about = "NBA spread scraper, predictor and settler", long_about = None)]
struct Cli {
    /// Defaults to `run`
    #[command(subcommand)]
    mode: Option<Mode>,
}

#[derive(Subcommand, Debug, Clone)]
enum Mode {
    /// Scrape odds, predict new games and settle finished ones
    Run,
    /// Scrape and store odds only
    Scrape,
    /// Predict and settle from stored odds, without scraping
    Predict,
    /// Load a schedule export (JSON array of games)
    ImportSchedule { path: PathBuf },
    /// Load a team four-factors export (JSON array, one entry per team)
    ImportStats { path: PathBuf },
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();

    let cfg = match Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Config error: {e}");
            std::process::exit(1);
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&cfg.log_level))
        .init();

    if let Err(e) = run(cfg, cli.mode.unwrap_or(Mode::Run)).await {
        error!("Fatal error: {e}");
        std::process::exit(1);
    }
}

async fn run(cfg: Config, mode: Mode) -> Result<()> {
    let pool = db::connect(&cfg.db_path).await?;
    info!(db = %cfg.db_path, league_year = cfg.league_year, "Database ready");

    match mode {
        Mode::Run => {
            let model = load_model(&cfg)?;
            report(&Pipeline::new(cfg.pipeline(), pool)?.run_cycle(&model).await?);
        }
        Mode::Scrape => {
            report(&Pipeline::new(cfg.pipeline(), pool)?.scrape_only().await?);
        }
        Mode::Predict => {
            let model = load_model(&cfg)?;
            report(&Pipeline::new(cfg.pipeline(), pool)?.predict_only(&model).await?);
        }
        Mode::ImportSchedule { path } => {
            import::import_schedule(&pool, cfg.league_year, &path).await?;
        }
        Mode::ImportStats { path } => {
            let now = Local::now().naive_local();
            import::import_stats(&pool, cfg.league_year, &path, now).await?;
        }
    }
    Ok(())
}

fn report(summary: &CycleSummary) {
    let upserted = summary.ingest.as_ref().map_or(0, |s| s.upserted);
    let predicted = summary.predict.as_ref().map_or(0, |s| s.inserted);
    let graded = summary.settle.as_ref().map_or(0, |s| s.graded());
    info!(upserted, predicted, graded, "Cycle finished");
}

fn load_model(cfg: &Config) -> Result<LinearModel> {
    let model = LinearModel::load(&cfg.model_path)?;
    probe_schema(&model)?;
    info!(path = %cfg.model_path, "Model loaded");
    Ok(model)
}
