use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Timestamp layout expected by the scan endpoint (local clock).
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Shift {
    #[serde(rename = "D")]
    Day,
    #[serde(rename = "N")]
    Night,
}

impl Shift {
    pub fn as_str(&self) -> &'static str {
        match self {
            Shift::Day => "D",
            Shift::Night => "N",
        }
    }
}

impl fmt::Display for Shift {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid shift {0:?}: expected D or N")]
pub struct InvalidShift(pub String);

impl FromStr for Shift {
    type Err = InvalidShift;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "D" => Ok(Shift::Day),
            "N" => Ok(Shift::Night),
            other => Err(InvalidShift(other.to_string())),
        }
    }
}

/// One decoded barcode, from the scanner or the manual entry field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanEvent {
    pub raw_text: String,
}

impl ScanEvent {
    pub fn new(raw_text: impl Into<String>) -> Self {
        Self {
            raw_text: raw_text.into(),
        }
    }
}

/// JSON body posted to the scan endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ScanPayload {
    pub fabricator: String,
    pub timestamp: String,
    pub shift: Shift,
    pub mattresses: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmissionOutcome {
    Success,
    /// Status 400: the fabricator scan already exists or a mattress is unknown.
    DuplicateOrNotFound,
    ServerError(u16),
    NetworkFailure(String),
    /// The request could not be put together; nothing was sent.
    RequestNotBuilt(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shift_parses_only_d_and_n() {
        assert_eq!("D".parse::<Shift>().unwrap(), Shift::Day);
        assert_eq!(" N ".parse::<Shift>().unwrap(), Shift::Night);
        assert!("d".parse::<Shift>().is_err());
        assert!("DAY".parse::<Shift>().is_err());
        assert!("".parse::<Shift>().is_err());
    }

    #[test]
    fn payload_serializes_shift_as_letter() {
        let payload = ScanPayload {
            fabricator: "FC1001".into(),
            timestamp: "2025-01-02 03:04:05".into(),
            shift: Shift::Night,
            mattresses: vec!["HORO55".into(), "LAMI2".into()],
        };
        let value = serde_json::to_value(&payload).unwrap();
        assert_eq!(value["fabricator"], "FC1001");
        assert_eq!(value["timestamp"], "2025-01-02 03:04:05");
        assert_eq!(value["shift"], "N");
        assert_eq!(value["mattresses"][1], "LAMI2");
    }
}
