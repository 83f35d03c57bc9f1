use std::sync::OnceLock;
use std::time::Duration;

use clap::Parser;

use crate::board::{Board, SelectionHandler};
use crate::config::Config;
use crate::dataset::SalaryDataSet;
use crate::error::AppError;
use crate::ui::App;

mod aggregate;
mod board;
mod config;
mod country;
mod csv_reader;
mod dataset;
mod error;
mod filter;
mod ui;

// Filled once at startup, read by every recomputation afterwards.
static DATASET: OnceLock<SalaryDataSet> = OnceLock::new();

fn main() -> Result<(), AppError> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let config = Config::parse();

    let records = csv_reader::read_data(&config.source).map_err(|e| {
        log::error!("Refusing to start without data: {e}");
        e
    })?;
    let dataset = DATASET.get_or_init(|| SalaryDataSet::new(records));
    log::info!(
        "Serving {} records across {} work years",
        dataset.records().len(),
        dataset.year_options().len()
    );

    let board = Board::new(dataset, config.initial_selection());
    if config.snapshot {
        println!("{}", serde_json::to_string_pretty(&board.snapshot())?);
        return Ok(());
    }

    let mut app = App::new(board, usize::from(config.bins));
    ui::run(&mut app, Duration::from_millis(config.tick_rate_ms))
}
