use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, Utc};

const OFFSET_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f%:z",
    "%Y-%m-%dT%H:%M%:z",
    "%Y-%m-%dT%H:%M:%S%.f%z",
    "%Y-%m-%dT%H:%M%z",
];

const NAIVE_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M"];

/// Current UTC calendar date. Only the outermost callers read the clock.
pub fn today_utc() -> NaiveDate {
    Utc::now().date_naive()
}

/// True when `raw` names an instant on `today` (UTC calendar date).
pub fn is_today_utc(raw: Option<&str>, today: NaiveDate) -> bool {
    parse_utc(raw).is_some_and(|instant| instant.date_naive() == today)
}

/// Parses the ISO-8601 variants the feeds emit. Offset-less values are UTC.
pub fn parse_utc(raw: Option<&str>) -> Option<DateTime<Utc>> {
    let text = canonical_timestamp(raw?)?;

    for format in OFFSET_FORMATS {
        if let Ok(parsed) = DateTime::<FixedOffset>::parse_from_str(&text, format) {
            return Some(parsed.with_timezone(&Utc));
        }
    }
    for format in NAIVE_FORMATS {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(&text, format) {
            return Some(parsed.and_utc());
        }
    }
    NaiveDate::parse_from_str(&text, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|midnight| midnight.and_utc())
}

fn canonical_timestamp(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    let mut text = if trimmed.contains(' ') && !trimmed.contains('T') {
        trimmed.replacen(' ', "T", 1)
    } else {
        trimmed.to_string()
    };
    if text.ends_with('Z') {
        text.pop();
        text.push_str("+00:00");
    }
    Some(text)
}
