mod app;
mod board;
mod clock;
mod config;
mod fids;
mod logging;
mod model;
mod net;
mod normalize;
mod runtime;
mod squawk;
mod status;
mod storage;
mod ui;
mod weather;

use anyhow::{anyhow, Result};
use std::sync::mpsc;

use app::App;
use board::Board;
use clock::today_utc;
use config::{parse_args, Config, OutputFormat};
use logging::init as init_logging;
use net::{build_client, fetch_cycle, spawn_fetcher, Endpoints};
use runtime::{init_terminal, restore_terminal, run_app};
use tracing::{debug, info, warn};

fn main() -> Result<()> {
    let config = parse_args()?;
    let _log_guard = init_logging(&config);
    debug!("config path: {}", config.config_path.display());

    if config.once {
        return run_once(&config);
    }

    let (tx, rx) = mpsc::channel();
    let (cmd_tx, cmd_rx) = mpsc::channel();
    spawn_fetcher(
        Endpoints::from_config(&config),
        config.airport.clone(),
        config.refresh,
        tx,
        cmd_rx,
    );

    let mut terminal = init_terminal()?;
    let res = run_app(
        &mut terminal,
        App::new(
            config.airport.clone(),
            config.operator(),
            config.refresh,
            config.config_path.clone(),
            cmd_tx,
        ),
        rx,
    );
    restore_terminal(&mut terminal)?;

    if let Err(err) = res {
        warn!("runtime error: {err}");
        eprintln!("{err}");
    }

    info!("airport-ops exited");
    Ok(())
}

fn run_once(config: &Config) -> Result<()> {
    let client = build_client(config.timeout).map_err(|err| anyhow!(err))?;
    let cycle = fetch_cycle(&client, &Endpoints::from_config(config), &config.airport);
    let board = Board::assemble(&cycle, &config.operator(), today_utc());
    match config.format {
        OutputFormat::Text => println!("{}", board.to_text()),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&board)?),
    }
    Ok(())
}
