use serde_json::Value;

pub const MISSING_TIME: &str = "----";
pub const MISSING_AIRPORT: &str = "----";

/// Trimmed text, or `default` when the value is absent or blank.
pub fn coalesce_display(value: Option<&str>, default: &str) -> String {
    match value.map(str::trim) {
        Some(text) if !text.is_empty() => text.to_string(),
        _ => default.to_string(),
    }
}

pub fn normalize_flight_number(raw: Option<&str>) -> String {
    coalesce_display(raw, "").replace(' ', "")
}

/// Stringifies a loosely typed JSON scalar. `null` has no text.
pub fn value_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(true) => Some("True".to_string()),
        Value::Bool(false) => Some("False".to_string()),
        other => Some(other.to_string()),
    }
}

/// Reads the temperature group (`TT/DD`, `M` for minus) from a METAR.
///
/// Only the first token that looks like a temperature group is considered;
/// if it does not parse the report has no usable temperature.
pub fn extract_temperature_celsius(raw_report: Option<&str>) -> Option<i32> {
    let report = raw_report?;
    let token = report.split_whitespace().find(|token| {
        token.contains('/')
            && token.chars().count() >= 4
            && token
                .chars()
                .next()
                .is_some_and(|c| c.is_ascii_digit() || c.eq_ignore_ascii_case(&'m'))
    })?;
    let temp = token.split('/').next().unwrap_or_default();
    match temp.strip_prefix('M') {
        Some(magnitude) => magnitude.parse::<i32>().ok().map(|value| -value),
        None => temp.parse::<i32>().ok(),
    }
}

/// `HHMM` from a `date time` or `dateTtime` timestamp.
pub fn format_time_hhmm(raw: Option<&str>) -> String {
    let Some(text) = raw.map(str::trim).filter(|text| !text.is_empty()) else {
        return MISSING_TIME.to_string();
    };
    let time_part = if text.contains(' ') {
        text.split(' ').nth(1)
    } else if text.contains('T') {
        text.split('T').nth(1)
    } else {
        None
    };
    let Some(time_part) = time_part else {
        return MISSING_TIME.to_string();
    };
    let hhmm: String = time_part.chars().take(5).filter(|c| *c != ':').collect();
    if hhmm.is_empty() {
        MISSING_TIME.to_string()
    } else {
        hhmm
    }
}
