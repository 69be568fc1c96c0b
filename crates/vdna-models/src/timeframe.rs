//! Timeframe parsing for script segments.
//!
//! Script segments carry a free-form timeframe string produced by the
//! script writer. Two shapes are recognised:
//! - `M:SS-M:SS` (e.g. `0:15-0:45`), where the end offset is the second component
//! - `Ns-Ns` or `Ns` (e.g. `0s-15s`, `30s`), where the end offset is the trailing integer
//!
//! Anything else has no reliable end offset. Callers that need a duration use
//! [`span_end_or_fallback`], which substitutes [`FALLBACK_SPAN_SECS`].

use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

/// Seconds contributed by a segment whose timeframe cannot be parsed.
pub const FALLBACK_SPAN_SECS: u32 = 15;

static MINUTE_RANGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*\d+:[0-5]\d\s*-\s*(\d+):([0-5]\d)\s*$").unwrap()
});

static TRAILING_SECONDS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(\d+)\s*s\s*$").unwrap());

/// Timeframe parsing error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TimeframeError {
    #[error("Timeframe cannot be empty")]
    Empty,

    #[error("Unrecognised timeframe format '{0}'. Use M:SS-M:SS, Ns-Ns or Ns")]
    InvalidFormat(String),

    #[error("Timeframe value out of range: {0}")]
    OutOfRange(String),
}

/// Extract the end offset, in whole seconds, of a timeframe string.
///
/// # Examples
/// ```
/// use vdna_models::timeframe::parse_span_end_seconds;
/// assert_eq!(parse_span_end_seconds("0:15-0:45").unwrap(), 45);
/// assert_eq!(parse_span_end_seconds("1:00-1:30").unwrap(), 90);
/// assert_eq!(parse_span_end_seconds("0s-15s").unwrap(), 15);
/// assert_eq!(parse_span_end_seconds("30s").unwrap(), 30);
/// ```
pub fn parse_span_end_seconds(timeframe: &str) -> Result<u32, TimeframeError> {
    let trimmed = timeframe.trim();
    if trimmed.is_empty() {
        return Err(TimeframeError::Empty);
    }

    if let Some(caps) = MINUTE_RANGE.captures(trimmed) {
        let minutes = parse_component(&caps[1])?;
        let seconds = parse_component(&caps[2])?;
        return minutes
            .checked_mul(60)
            .and_then(|m| m.checked_add(seconds))
            .ok_or_else(|| TimeframeError::OutOfRange(trimmed.to_string()));
    }

    if let Some(caps) = TRAILING_SECONDS.captures(trimmed) {
        return parse_component(&caps[1]);
    }

    Err(TimeframeError::InvalidFormat(trimmed.to_string()))
}

/// End offset of a timeframe, or [`FALLBACK_SPAN_SECS`] when it cannot be parsed.
pub fn span_end_or_fallback(timeframe: &str) -> u32 {
    parse_span_end_seconds(timeframe).unwrap_or(FALLBACK_SPAN_SECS)
}

fn parse_component(digits: &str) -> Result<u32, TimeframeError> {
    digits
        .parse()
        .map_err(|_| TimeframeError::OutOfRange(digits.to_string()))
}
