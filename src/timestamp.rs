use crate::error::{EngineError, Result};

/// Extract the time tag from a log line: the substring from the first `[`
/// through the first `]`, inclusive. Returns `None` when either bracket is
/// missing or they are out of order.
pub fn extract_time_tag(line: &str) -> Option<&str> {
    let start = line.find('[')?;
    let end = line.find(']')?;
    if end < start {
        return None;
    }
    Some(&line[start..=end])
}

/// Parse a `[H:MM:SS(.fff)]` tag into milliseconds since 0:00:00.
///
/// Hours are any non-negative integer, minutes must be in `[0, 60]`, and
/// seconds a non-negative real strictly below 60. Fractional seconds are
/// rounded to the nearest millisecond.
pub fn parse_time_tag(tag: &str) -> Result<i64> {
    let malformed = || EngineError::MalformedTag(tag.to_string());

    let inner = tag
        .strip_prefix('[')
        .and_then(|t| t.strip_suffix(']'))
        .ok_or_else(malformed)?;

    let first_colon = inner.find(':').ok_or_else(malformed)?;
    let last_colon = inner.rfind(':').ok_or_else(malformed)?;
    if first_colon == last_colon {
        return Err(malformed());
    }

    let hours: u64 = inner[..first_colon].parse().map_err(|_| malformed())?;
    let minutes: u64 = inner[first_colon + 1..last_colon]
        .parse()
        .map_err(|_| malformed())?;
    if minutes > 60 {
        return Err(malformed());
    }
    let seconds: f64 = inner[last_colon + 1..].parse().map_err(|_| malformed())?;
    if !(0.0..60.0).contains(&seconds) {
        return Err(malformed());
    }

    let whole_ms = (hours * 3600 + minutes * 60) as i64 * 1000;
    Ok(whole_ms + (seconds * 1000.0).round() as i64)
}

/// Split a raw line into `(timestamp_ms, body)`, where the body is
/// everything after the first `]`. Any line without a well-formed tag is
/// rejected wholesale; there is no partial ingest.
pub fn parse_line(line: &str) -> Result<(i64, &str)> {
    match (line.find('['), line.find(']')) {
        (Some(start), Some(end)) if start < end => {
            let ts = parse_time_tag(&line[start..=end])?;
            Ok((ts, &line[end + 1..]))
        }
        _ => Err(EngineError::MalformedTag(line.chars().take(32).collect())),
    }
}
