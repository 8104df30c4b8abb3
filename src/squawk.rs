use serde::Serialize;
use serde_json::Value;

use crate::model::FeedResult;
use crate::normalize::{coalesce_display, value_text};

pub const EMERGENCY_CODES: [&str; 3] = ["7700", "7600", "7500"];

const ICAO24_FIELD: usize = 0;
const CALLSIGN_FIELD: usize = 1;
const SQUAWK_FIELD: usize = 14;
const MIN_STATE_FIELDS: usize = 15;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct EmergencySquawk {
    pub callsign: String,
    pub squawk_code: String,
    pub transponder_id: String,
}

impl EmergencySquawk {
    pub fn meaning(&self) -> &'static str {
        match self.squawk_code.as_str() {
            "7700" => "general emergency",
            "7600" => "radio failure",
            "7500" => "unlawful interference",
            _ => "",
        }
    }
}

/// Picks state vectors squawking an emergency code, in feed order.
pub fn filter_emergencies(states: &FeedResult<Vec<Value>>) -> FeedResult<Vec<EmergencySquawk>> {
    let states = states.as_ref().map_err(|err| err.clone())?;
    Ok(states.iter().filter_map(emergency_from_state).collect())
}

fn emergency_from_state(state: &Value) -> Option<EmergencySquawk> {
    let fields = state.as_array()?;
    if fields.len() < MIN_STATE_FIELDS {
        return None;
    }
    let field = |idx: usize| value_text(&fields[idx]);

    let squawk_code = coalesce_display(field(SQUAWK_FIELD).as_deref(), "");
    if !EMERGENCY_CODES.contains(&squawk_code.as_str()) {
        return None;
    }
    Some(EmergencySquawk {
        callsign: coalesce_display(field(CALLSIGN_FIELD).as_deref(), ""),
        squawk_code,
        transponder_id: coalesce_display(field(ICAO24_FIELD).as_deref(), "N/A"),
    })
}
