use chrono::{DateTime, NaiveDate, Utc};
use serde::{Serialize, Serializer};
use serde_json::Value;

use crate::fids::{build_rows, OperatorFilter, RowSet};
use crate::model::{Direction, FeedResult, RawFlightRecord, WeatherReport};
use crate::squawk::{filter_emergencies, EmergencySquawk};
use crate::weather::{metar_text, taf_text};

/// Raw payloads from one pass over the three providers.
#[derive(Clone, Debug)]
pub struct FetchCycle {
    pub airport: String,
    pub metar: WeatherReport,
    pub taf: WeatherReport,
    pub departures: FeedResult<Vec<RawFlightRecord>>,
    pub arrivals: FeedResult<Vec<RawFlightRecord>>,
    pub states: FeedResult<Vec<Value>>,
    pub fetched_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Serialize)]
pub struct Board {
    pub airport: String,
    pub metar: String,
    pub taf: String,
    pub departures: RowSet,
    pub arrivals: RowSet,
    #[serde(serialize_with = "serialize_squawks")]
    pub squawks: Result<Vec<EmergencySquawk>, String>,
    pub updated_at: DateTime<Utc>,
}

// Tagged like `RowSet`: `{"rows": [...]}` or `{"error": "..."}`.
fn serialize_squawks<S>(
    squawks: &Result<Vec<EmergencySquawk>, String>,
    serializer: S,
) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    #[derive(Serialize)]
    #[serde(rename_all = "lowercase")]
    enum Tagged<'a> {
        Rows(&'a [EmergencySquawk]),
        Error(&'a str),
    }

    match squawks {
        Ok(list) => Tagged::Rows(list),
        Err(message) => Tagged::Error(message),
    }
    .serialize(serializer)
}

/// One FIDS request feeds both boards, so a failure is reported on both.
pub fn split_fids(
    fids: FeedResult<(Vec<RawFlightRecord>, Vec<RawFlightRecord>)>,
) -> (
    FeedResult<Vec<RawFlightRecord>>,
    FeedResult<Vec<RawFlightRecord>>,
) {
    match fids {
        Ok((departures, arrivals)) => (Ok(departures), Ok(arrivals)),
        Err(message) => (Err(message.clone()), Err(message)),
    }
}

impl Board {
    pub fn assemble(cycle: &FetchCycle, operator: &OperatorFilter, today: NaiveDate) -> Self {
        Board {
            airport: cycle.airport.clone(),
            metar: metar_text(&cycle.metar),
            taf: taf_text(&cycle.taf),
            departures: build_rows(
                &cycle.departures,
                operator,
                Direction::Departure,
                &cycle.airport,
                today,
            ),
            arrivals: build_rows(
                &cycle.arrivals,
                operator,
                Direction::Arrival,
                &cycle.airport,
                today,
            ),
            squawks: filter_emergencies(&cycle.states),
            updated_at: cycle.fetched_at,
        }
    }

    /// Plain-text rendering for `--once`.
    pub fn to_text(&self) -> String {
        let mut out = Vec::new();
        out.push(format!(
            "Airport Operations Monitor  {}  (updated {})",
            self.airport,
            self.updated_at.format("%Y-%m-%d %H:%M:%SZ")
        ));
        out.push(String::new());
        out.push("METAR".to_string());
        out.push(self.metar.clone());
        out.push(String::new());
        out.push("TAF".to_string());
        out.push(self.taf.clone());
        out.push(String::new());
        out.push(format!("Departures ({})", self.airport));
        push_rows(&mut out, "TO", &self.departures);
        out.push(String::new());
        out.push(format!("Arrivals ({})", self.airport));
        push_rows(&mut out, "FROM", &self.arrivals);
        out.push(String::new());
        out.push("Emergency Squawks".to_string());
        match &self.squawks {
            Err(message) => out.push(message.clone()),
            Ok(list) if list.is_empty() => out.push("No emergencies detected.".to_string()),
            Ok(list) => {
                out.push(format!("{:<10} {:<6} {}", "CALLSIGN", "SQUAWK", "ICAO24"));
                for squawk in list {
                    out.push(format!(
                        "{:<10} {:<6} {}",
                        squawk.callsign, squawk.squawk_code, squawk.transponder_id
                    ));
                }
            }
        }
        out.join("\n")
    }
}

fn push_rows(out: &mut Vec<String>, counterpart_label: &str, rows: &RowSet) {
    if let Some(message) = rows.message() {
        out.push(message.to_string());
        return;
    }
    out.push(format!(
        "{:<8} {:<5} {:<5} {}",
        "FLIGHT", counterpart_label, "TIME", "STATUS"
    ));
    for row in rows.rows() {
        out.push(format!(
            "{:<8} {:<5} {:<5} {}",
            row.flight, row.counterpart_airport, row.time, row.status
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::{split_fids, Board, FetchCycle};
    use crate::fids::{OperatorFilter, RowSet};
    use crate::model::FidsResponse;
    use chrono::{NaiveDate, TimeZone, Utc};
    use serde_json::json;

    fn cycle() -> FetchCycle {
        let fids: FidsResponse = serde_json::from_str(
            r#"{
                "departures": [{
                    "number": "LS 871",
                    "status": "Expected",
                    "departure": { "scheduledTime": { "utc": "2024-05-01 09:05Z", "local": "2024-05-01 10:05+01:00" } },
                    "arrival": { "airport": { "iata": "PMI" } }
                }],
                "arrivals": []
            }"#,
        )
        .unwrap();
        FetchCycle {
            airport: "EGNM".to_string(),
            metar: Ok(Some("EGNM 010950Z 12004KT 9999 08/06 Q1013".to_string())),
            taf: Ok(None),
            departures: Ok(fids.departures),
            arrivals: Ok(fids.arrivals),
            states: Ok(vec![json!([
                "4ca7b1", "EXS12A", "United Kingdom", 0, 0, 0.0, 0.0, 0.0, false,
                0.0, 0.0, 0.0, null, 0.0, "7700", false, 0
            ])]),
            fetched_at: Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap(),
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, 1).unwrap()
    }

    #[test]
    fn assembles_every_section() {
        let board = Board::assemble(&cycle(), &OperatorFilter::new("LS", "Jet2"), today());
        assert!(board.metar.ends_with("Temp: 8°C"));
        assert_eq!(board.taf, "No TAF found.");
        assert_eq!(board.departures.rows().len(), 1);
        assert_eq!(
            board.arrivals.message(),
            Some("No Jet2 arrivals into EGNM today.")
        );
        assert_eq!(board.squawks.as_ref().unwrap().len(), 1);
    }

    #[test]
    fn fids_failure_fills_both_tables() {
        let mut cycle = cycle();
        let (departures, arrivals) = split_fids(Err("Error: HTTP 403 Forbidden".to_string()));
        cycle.departures = departures;
        cycle.arrivals = arrivals;
        cycle.states = Err("Error: timed out".to_string());
        let board = Board::assemble(&cycle, &OperatorFilter::new("LS", "Jet2"), today());
        assert_eq!(
            board.departures,
            RowSet::Empty("Error: HTTP 403 Forbidden".to_string())
        );
        assert_eq!(board.arrivals, board.departures);
        assert!(board.metar.contains("08/06"));
        assert_eq!(board.squawks, Err("Error: timed out".to_string()));
    }

    #[test]
    fn text_report_lists_rows_and_messages() {
        let board = Board::assemble(&cycle(), &OperatorFilter::new("LS", "Jet2"), today());
        let text = board.to_text();
        assert!(text.contains("LS871    PMI   1005  Expected"));
        assert!(text.contains("No Jet2 arrivals into EGNM today."));
        assert!(text.contains("EXS12A     7700   4ca7b1"));
    }

    #[test]
    fn board_serializes_to_json() {
        let board = Board::assemble(&cycle(), &OperatorFilter::new("LS", "Jet2"), today());
        let value = serde_json::to_value(&board).unwrap();
        assert_eq!(value["departures"]["rows"][0]["flight"], "LS871");
        assert_eq!(value["departures"]["rows"][0]["status_class"], "expected");
        assert_eq!(value["arrivals"]["empty"], "No Jet2 arrivals into EGNM today.");
        assert_eq!(value["squawks"]["rows"][0]["squawk_code"], "7700");
    }

    #[test]
    fn squawk_error_serializes_with_lowercase_tag() {
        let mut cycle = cycle();
        cycle.states = Err("Error: HTTP 503 Service Unavailable".to_string());
        let board = Board::assemble(&cycle, &OperatorFilter::new("LS", "Jet2"), today());
        let value = serde_json::to_value(&board).unwrap();
        assert_eq!(
            value["squawks"],
            json!({ "error": "Error: HTTP 503 Service Unavailable" })
        );
        assert!(value["squawks"].get("Err").is_none());
    }
}
