use serde::Serialize;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusClass {
    #[default]
    None,
    Delayed,
    Expected,
    Departed,
}

/// Ordered substring check; the first matching category wins.
pub fn classify_status(raw: &str) -> StatusClass {
    let status = raw.trim().to_lowercase();
    if status.contains("divert") || status.contains("delay") {
        StatusClass::Delayed
    } else if status.contains("expected") {
        StatusClass::Expected
    } else if status.contains("departed") {
        StatusClass::Departed
    } else {
        StatusClass::None
    }
}
