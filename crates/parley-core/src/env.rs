//! Lenient parsers for environment-style string values
//!
//! Loaders take a lookup closure instead of reading `std::env` directly so
//! tests can feed a map without touching process state.

/// Read every variable from the process environment
pub fn process_lookup(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Trimmed value, or `None` when missing or blank
pub fn non_empty(raw: Option<String>) -> Option<String> {
    raw.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

/// Parse an integer, clamping negatives to zero. Missing or unparsable
/// input yields `default`.
pub fn parse_non_negative_int(raw: Option<&str>, default: u32) -> u32 {
    let Some(raw) = raw else {
        return default;
    };
    match raw.trim().parse::<i64>() {
        Ok(parsed) => parsed.clamp(0, u32::MAX as i64) as u32,
        Err(_) => default,
    }
}

/// Parse a strictly positive float. Missing, unparsable, non-finite or
/// non-positive input yields `default`.
pub fn parse_positive_float(raw: Option<&str>, default: f64) -> f64 {
    let Some(raw) = raw else {
        return default;
    };
    match raw.trim().parse::<f64>() {
        Ok(parsed) if parsed.is_finite() && parsed > 0.0 => parsed,
        _ => default,
    }
}
