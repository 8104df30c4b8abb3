use chrono::NaiveDate;
use std::path::PathBuf;
use std::sync::mpsc::Sender;
use std::time::{Duration, SystemTime};
use tracing::{debug, info, warn};

use crate::board::{Board, FetchCycle};
use crate::config::normalize_airport;
use crate::fids::OperatorFilter;
use crate::net::FetchCommand;
use crate::storage;

const AIRPORT_CODE_MAX: usize = 4;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Airport,
    Help,
}

pub struct App {
    pub airport: String,
    pub default_airport: String,
    pub operator: OperatorFilter,
    pub refresh: Duration,
    pub config_path: PathBuf,
    pub board: Option<Board>,
    pub last_update: Option<SystemTime>,
    pub fetching: bool,
    pub input_mode: InputMode,
    pub airport_edit: String,
    pub status: Option<(String, SystemTime)>,
    commands: Sender<FetchCommand>,
}

impl App {
    pub fn new(
        airport: String,
        operator: OperatorFilter,
        refresh: Duration,
        config_path: PathBuf,
        commands: Sender<FetchCommand>,
    ) -> Self {
        Self {
            default_airport: airport.clone(),
            airport,
            operator,
            refresh,
            config_path,
            board: None,
            last_update: None,
            fetching: true,
            input_mode: InputMode::Normal,
            airport_edit: String::new(),
            status: None,
            commands,
        }
    }

    /// Rebuilds the board from a fresh cycle. Cycles for a previously
    /// selected airport are dropped.
    pub fn apply_cycle(&mut self, cycle: FetchCycle, today: NaiveDate) {
        if cycle.airport != self.airport {
            debug!(
                "dropping cycle for {} (showing {})",
                cycle.airport, self.airport
            );
            return;
        }
        let board = Board::assemble(&cycle, &self.operator, today);
        debug!(
            "board {}: {} departures, {} arrivals",
            board.airport,
            board.departures.rows().len(),
            board.arrivals.rows().len()
        );
        self.board = Some(board);
        self.last_update = Some(SystemTime::now());
        self.fetching = false;
    }

    pub fn request_refresh(&mut self) {
        if self.commands.send(FetchCommand::Refresh).is_ok() {
            self.fetching = true;
        } else {
            self.flash("fetcher stopped");
        }
    }

    pub fn start_airport_edit(&mut self) {
        self.airport_edit = self.airport.clone();
        self.input_mode = InputMode::Airport;
    }

    pub fn push_airport_char(&mut self, ch: char) {
        if ch.is_ascii_alphanumeric() && self.airport_edit.len() < AIRPORT_CODE_MAX {
            self.airport_edit.push(ch.to_ascii_uppercase());
        }
    }

    pub fn backspace_airport(&mut self) {
        self.airport_edit.pop();
    }

    pub fn clear_airport_edit(&mut self) {
        self.airport_edit.clear();
    }

    pub fn cancel_airport_edit(&mut self) {
        self.airport_edit.clear();
        self.input_mode = InputMode::Normal;
    }

    pub fn apply_airport_edit(&mut self) {
        let code = normalize_airport(&self.airport_edit, &self.default_airport);
        self.airport_edit.clear();
        self.input_mode = InputMode::Normal;
        if code == self.airport {
            return;
        }
        info!("airport changed {} -> {}", self.airport, code);
        if self
            .commands
            .send(FetchCommand::SetAirport(code.clone()))
            .is_err()
        {
            self.flash("fetcher stopped");
            return;
        }
        self.airport = code;
        self.board = None;
        self.fetching = true;
    }

    pub fn save_airport(&mut self) {
        match storage::save_airport(&self.config_path, &self.airport) {
            Ok(()) => {
                info!("airport saved to {}", self.config_path.display());
                self.flash(&format!(
                    "saved {} to {}",
                    self.airport,
                    self.config_path.display()
                ));
            }
            Err(err) => {
                warn!("airport save failed: {err:#}");
                self.flash(&format!("save failed: {err}"));
            }
        }
    }

    pub fn open_help(&mut self) {
        self.input_mode = InputMode::Help;
    }

    pub fn close_help(&mut self) {
        self.input_mode = InputMode::Normal;
    }

    pub fn flash(&mut self, message: &str) {
        self.status = Some((message.to_string(), SystemTime::now()));
    }

    pub fn recent_status(&self, within: Duration) -> Option<&str> {
        let (message, at) = self.status.as_ref()?;
        let age = SystemTime::now().duration_since(*at).ok()?;
        (age <= within).then_some(message.as_str())
    }
}
