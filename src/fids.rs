use chrono::NaiveDate;
use serde::Serialize;
use std::collections::HashSet;
use tracing::debug;

use crate::clock::is_today_utc;
use crate::model::{Direction, FeedResult, RawFlightRecord};
use crate::normalize::{coalesce_display, format_time_hhmm, normalize_flight_number, MISSING_AIRPORT};
use crate::status::{classify_status, StatusClass};

/// Selects one airline's flights and names it in "no data" messages.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OperatorFilter {
    pub prefix: String,
    pub name: String,
}

impl OperatorFilter {
    pub fn new(prefix: impl Into<String>, name: impl Into<String>) -> Self {
        OperatorFilter {
            prefix: prefix.into(),
            name: name.into(),
        }
    }

    pub fn empty_message(&self, direction: Direction, home_airport: &str) -> String {
        match direction {
            Direction::Departure => format!("No {} departures today.", self.name),
            Direction::Arrival => {
                format!("No {} arrivals into {} today.", self.name, home_airport)
            }
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct DisplayRow {
    pub flight: String,
    pub counterpart_airport: String,
    pub time: String,
    pub status: String,
    pub status_class: StatusClass,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RowSet {
    Rows(Vec<DisplayRow>),
    Empty(String),
}

impl RowSet {
    pub fn rows(&self) -> &[DisplayRow] {
        match self {
            RowSet::Rows(rows) => rows,
            RowSet::Empty(_) => &[],
        }
    }

    pub fn message(&self) -> Option<&str> {
        match self {
            RowSet::Rows(_) => None,
            RowSet::Empty(message) => Some(message),
        }
    }
}

type DedupKey = (String, String, String, String);

pub fn build_rows(
    records: &FeedResult<Vec<RawFlightRecord>>,
    operator: &OperatorFilter,
    direction: Direction,
    home_airport: &str,
    today: NaiveDate,
) -> RowSet {
    let records = match records {
        Ok(records) => records,
        Err(message) => return RowSet::Empty(message.clone()),
    };

    let mut rows = Vec::new();
    let mut seen: HashSet<DedupKey> = HashSet::new();
    for record in records {
        let flight = normalize_flight_number(record.number.as_deref());
        if !flight.starts_with(operator.prefix.as_str()) {
            continue;
        }

        let (own, counterpart) = record.legs_for(direction);
        if !is_today_utc(own.reference_utc(), today) {
            continue;
        }

        let status = coalesce_display(record.status.as_deref(), "");
        if matches!(status.to_lowercase().as_str(), "landed" | "cancelled") {
            continue;
        }

        let airport = coalesce_display(counterpart.iata.as_deref(), MISSING_AIRPORT);
        let time = format_time_hhmm(own.display_timestamp());

        let key = (flight, airport, time, status);
        if seen.contains(&key) {
            continue;
        }
        seen.insert(key.clone());

        let (flight, counterpart_airport, time, status) = key;
        let status_class = classify_status(&status);
        rows.push(DisplayRow {
            flight,
            counterpart_airport,
            time,
            status,
            status_class,
        });
    }

    debug!(
        "{:?} rows for {}: {} of {} records",
        direction,
        home_airport,
        rows.len(),
        records.len()
    );

    if rows.is_empty() {
        RowSet::Empty(operator.empty_message(direction, home_airport))
    } else {
        RowSet::Rows(rows)
    }
}
