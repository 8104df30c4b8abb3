use crate::model::WeatherReport;
use crate::normalize::extract_temperature_celsius;

const FREEZING_BELOW_C: i32 = 3;

/// METAR panel text, with a temperature line when one can be read.
pub fn metar_text(report: &WeatherReport) -> String {
    match report {
        Ok(Some(raw)) => annotate_temperature(raw, extract_temperature_celsius(Some(raw))),
        Ok(None) => "No METAR found.".to_string(),
        Err(message) => message.clone(),
    }
}

pub fn taf_text(report: &WeatherReport) -> String {
    match report {
        Ok(Some(raw)) => raw.clone(),
        Ok(None) => "No TAF found.".to_string(),
        Err(message) => message.clone(),
    }
}

pub fn annotate_temperature(raw: &str, temp_c: Option<i32>) -> String {
    match temp_c {
        Some(temp) => {
            let icon = if temp < FREEZING_BELOW_C { " 🥶" } else { "" };
            format!("{raw}\n\nTemp: {temp}°C{icon}")
        }
        None => raw.to_string(),
    }
}
