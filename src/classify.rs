//! Barcode classification by prefix.

const FABRICATOR_PREFIX: &str = "FC";

// Longer prefixes first so "HORO…" is never reported as "HOR…".
const MATTRESS_PREFIXES: [&str; 5] = ["HORO", "HOR", "VERO", "VER", "LAMI"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    Fabricator(String),
    Mattress(String),
    Invalid,
}

/// Classify a decoded barcode. Surrounding whitespace is ignored; matching is
/// case-sensitive.
pub fn classify(raw_text: &str) -> Classification {
    let code = raw_text.trim();
    if code.starts_with(FABRICATOR_PREFIX) {
        return Classification::Fabricator(code.to_string());
    }
    if mattress_prefix(code).is_some() {
        return Classification::Mattress(code.to_string());
    }
    Classification::Invalid
}

/// The mattress prefix `code` carries, if any.
pub fn mattress_prefix(code: &str) -> Option<&'static str> {
    MATTRESS_PREFIXES
        .iter()
        .copied()
        .find(|prefix| code.starts_with(prefix))
}
