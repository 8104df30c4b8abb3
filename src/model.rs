use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::normalize::value_text;

/// Upstream payloads either decode or collapse into a display-ready message.
pub type FeedResult<T> = Result<T, String>;

/// `Ok(None)` means the provider answered with zero reports.
pub type WeatherReport = Result<Option<String>, String>;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    Departure,
    Arrival,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct CheckWxResponse {
    #[serde(default, deserialize_with = "de_opt_u64_from_any")]
    pub results: Option<u64>,
    #[serde(default, deserialize_with = "de_vec_or_null")]
    pub data: Vec<CheckWxReport>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct CheckWxReport {
    #[serde(default, deserialize_with = "de_opt_string_from_any")]
    pub raw_text: Option<String>,
}

impl CheckWxResponse {
    pub fn first_raw_text(&self) -> Option<String> {
        if self.results.unwrap_or(0) == 0 {
            return None;
        }
        self.data.first().and_then(|report| report.raw_text.clone())
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct FidsResponse {
    #[serde(default, deserialize_with = "de_vec_lenient")]
    pub departures: Vec<RawFlightRecord>,
    #[serde(default, deserialize_with = "de_vec_lenient")]
    pub arrivals: Vec<RawFlightRecord>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct RawFlightRecord {
    #[serde(default, deserialize_with = "de_opt_string_from_any")]
    pub number: Option<String>,
    #[serde(default, deserialize_with = "de_opt_string_from_any")]
    pub status: Option<String>,
    #[serde(default, deserialize_with = "de_opt_lenient")]
    pub departure: Option<RawLeg>,
    #[serde(default, deserialize_with = "de_opt_lenient")]
    pub arrival: Option<RawLeg>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct RawLeg {
    #[serde(default, rename = "scheduledTime", deserialize_with = "de_opt_lenient")]
    pub scheduled_time: Option<RawLegTime>,
    #[serde(default, rename = "revisedTime", deserialize_with = "de_opt_lenient")]
    pub revised_time: Option<RawLegTime>,
    #[serde(default, deserialize_with = "de_opt_lenient")]
    pub airport: Option<RawAirport>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct RawLegTime {
    #[serde(default, deserialize_with = "de_opt_timestamp")]
    pub utc: Option<String>,
    #[serde(default, deserialize_with = "de_opt_timestamp")]
    pub local: Option<String>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct RawAirport {
    #[serde(default, deserialize_with = "de_opt_string_from_any")]
    pub iata: Option<String>,
}

/// One leg of a record with every optional level already resolved.
/// Timestamps keep blank-but-present text so that a blank scheduled time
/// is not silently replaced by the revised one.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FlightLeg {
    pub scheduled_utc: Option<String>,
    pub scheduled_local: Option<String>,
    pub revised_utc: Option<String>,
    pub revised_local: Option<String>,
    pub iata: Option<String>,
}

impl FlightLeg {
    fn from_raw(raw: Option<&RawLeg>) -> Self {
        let Some(raw) = raw else {
            return Self::default();
        };
        let scheduled = raw.scheduled_time.as_ref();
        let revised = raw.revised_time.as_ref();
        FlightLeg {
            scheduled_utc: scheduled.and_then(|t| t.utc.clone()),
            scheduled_local: scheduled.and_then(|t| t.local.clone()),
            revised_utc: revised.and_then(|t| t.utc.clone()),
            revised_local: revised.and_then(|t| t.local.clone()),
            iata: raw.airport.as_ref().and_then(|a| a.iata.clone()),
        }
    }

    /// Timestamp that decides whether the leg happens today.
    pub fn reference_utc(&self) -> Option<&str> {
        self.scheduled_utc
            .as_deref()
            .or(self.revised_utc.as_deref())
    }

    /// Local time wins over UTC, scheduled wins over revised.
    pub fn display_timestamp(&self) -> Option<&str> {
        self.scheduled_local
            .as_deref()
            .or(self.scheduled_utc.as_deref())
            .or(self.revised_local.as_deref())
            .or(self.revised_utc.as_deref())
    }
}

impl RawFlightRecord {
    pub fn departure_leg(&self) -> FlightLeg {
        FlightLeg::from_raw(self.departure.as_ref())
    }

    pub fn arrival_leg(&self) -> FlightLeg {
        FlightLeg::from_raw(self.arrival.as_ref())
    }

    /// Returns `(own_leg, counterpart_leg)` for the board being built.
    pub fn legs_for(&self, direction: Direction) -> (FlightLeg, FlightLeg) {
        match direction {
            Direction::Departure => (self.departure_leg(), self.arrival_leg()),
            Direction::Arrival => (self.arrival_leg(), self.departure_leg()),
        }
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct OpenSkyResponse {
    #[serde(default, deserialize_with = "de_vec_or_null")]
    pub states: Vec<Value>,
}

fn de_opt_string_from_any<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(value_text(&value).filter(|text| !text.trim().is_empty()))
}

// Timestamps only fall through when missing or empty.
fn de_opt_timestamp<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(value_text(&value).filter(|text| !text.is_empty()))
}

/// A nested object of the wrong shape decodes as absent.
fn de_opt_lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    if value.is_null() {
        return Ok(None);
    }
    Ok(serde_json::from_value(value).ok())
}

/// Keeps the entries that decode and drops the rest.
fn de_vec_lenient<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    match Value::deserialize(deserializer)? {
        Value::Array(items) => Ok(items
            .into_iter()
            .filter_map(|item| serde_json::from_value(item).ok())
            .collect()),
        _ => Ok(Vec::new()),
    }
}

fn de_vec_or_null<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

fn de_opt_u64_from_any<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Number(number) => {
            if let Some(value) = number.as_u64() {
                Ok(Some(value))
            } else if let Some(value) = number.as_f64() {
                Ok(Some(value.max(0.0) as u64))
            } else {
                Ok(None)
            }
        }
        Value::String(text) => Ok(text.trim().parse::<u64>().ok()),
        Value::Null => Ok(None),
        other => Err(serde::de::Error::custom(format!(
            "expected number or null, got {other}"
        ))),
    }
}
