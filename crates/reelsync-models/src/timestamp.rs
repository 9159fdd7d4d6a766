//! Timestamp parsing and formatting utilities.
//!
//! Manifests may write timestamps as plain seconds or as `HH:MM:SS(.mmm)`.
//! Output side formatting covers the SRT subtitle format and the
//! millisecond delays used by audio mixing.

/// Maximum reasonable source duration (24 hours in seconds).
pub const MAX_SOURCE_DURATION_SECS: f64 = 86400.0;

/// Parse a timestamp string to total seconds.
///
/// Supports formats:
/// - `HH:MM:SS` or `HH:MM:SS.mmm`
/// - `MM:SS` or `MM:SS.mmm`
/// - `SS` or `SS.mmm`
///
/// # Examples
/// ```
/// use reelsync_models::timestamp::parse_timestamp;
/// assert_eq!(parse_timestamp("01:30:00").unwrap(), 5400.0);
/// assert_eq!(parse_timestamp("05:30").unwrap(), 330.0);
/// assert_eq!(parse_timestamp("90").unwrap(), 90.0);
/// ```
pub fn parse_timestamp(ts: &str) -> Result<f64, TimestampError> {
    let ts = ts.trim();
    if ts.is_empty() {
        return Err(TimestampError::Empty);
    }

    const COMPONENTS: [&str; 3] = ["hours", "minutes", "seconds"];

    let parts: Vec<&str> = ts.split(':').collect();
    if parts.len() > 3 {
        return Err(TimestampError::InvalidFormat(ts.to_string()));
    }

    // Align the parts to the tail of HH:MM:SS so "05:30" reads as MM:SS.
    let offset = COMPONENTS.len() - parts.len();
    let mut total = 0.0;
    for (i, part) in parts.iter().enumerate() {
        let component = COMPONENTS[offset + i];
        let value: f64 = part
            .parse()
            .map_err(|_| TimestampError::InvalidValue(component, part.to_string()))?;
        if !value.is_finite() {
            return Err(TimestampError::InvalidValue(component, part.to_string()));
        }
        if value < 0.0 {
            return Err(TimestampError::Negative);
        }
        total = total * 60.0 + value;
    }

    if total > MAX_SOURCE_DURATION_SECS {
        return Err(TimestampError::ExceedsMaxDuration(MAX_SOURCE_DURATION_SECS));
    }

    Ok(total)
}

/// Format seconds into HH:MM:SS or HH:MM:SS.mmm string.
pub fn format_seconds(total_secs: f64) -> String {
    let total_ms = to_millis(total_secs);
    let (hours, mins, secs, ms) = split_millis(total_ms);

    if ms > 0 {
        format!("{:02}:{:02}:{:02}.{:03}", hours, mins, secs, ms)
    } else {
        format!("{:02}:{:02}:{:02}", hours, mins, secs)
    }
}

/// Format seconds as an SRT timestamp (`HH:MM:SS,mmm`).
///
/// # Examples
/// ```
/// use reelsync_models::timestamp::format_srt_timestamp;
/// assert_eq!(format_srt_timestamp(3.5), "00:00:03,500");
/// assert_eq!(format_srt_timestamp(3725.042), "01:02:05,042");
/// ```
pub fn format_srt_timestamp(total_secs: f64) -> String {
    let (hours, mins, secs, ms) = split_millis(to_millis(total_secs));
    format!("{:02}:{:02}:{:02},{:03}", hours, mins, secs, ms)
}

/// Round seconds to whole milliseconds, saturating negatives to zero.
pub fn to_millis(total_secs: f64) -> u64 {
    if !total_secs.is_finite() || total_secs <= 0.0 {
        return 0;
    }
    (total_secs * 1000.0).round() as u64
}

fn split_millis(total_ms: u64) -> (u64, u64, u64, u64) {
    let ms = total_ms % 1000;
    let total_secs = total_ms / 1000;
    (total_secs / 3600, (total_secs % 3600) / 60, total_secs % 60, ms)
}

/// Timestamp parsing error.
#[derive(Debug, Clone, PartialEq)]
pub enum TimestampError {
    /// Timestamp string is empty
    Empty,
    /// Timestamp contains negative values
    Negative,
    /// Invalid numeric value for a component
    InvalidValue(&'static str, String),
    /// Invalid timestamp format
    InvalidFormat(String),
    /// Timestamp exceeds maximum allowed duration
    ExceedsMaxDuration(f64),
}

impl std::fmt::Display for TimestampError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty => write!(f, "Timestamp cannot be empty"),
            Self::Negative => write!(f, "Timestamp cannot be negative"),
            Self::InvalidValue(component, value) => {
                write!(f, "Invalid {} value: {}", component, value)
            }
            Self::InvalidFormat(ts) => write!(
                f,
                "Invalid timestamp format '{}'. Use HH:MM:SS, HH:MM:SS.mmm, MM:SS, or SS",
                ts
            ),
            Self::ExceedsMaxDuration(max) => {
                write!(f, "Timestamp exceeds maximum allowed duration ({} hours)", max / 3600.0)
            }
        }
    }
}

impl std::error::Error for TimestampError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_timestamp_formats() {
        assert_eq!(parse_timestamp("00:00:00").unwrap(), 0.0);
        assert_eq!(parse_timestamp("01:30:45").unwrap(), 5445.0);
        assert_eq!(parse_timestamp("05:30").unwrap(), 330.0);
        assert_eq!(parse_timestamp("90").unwrap(), 90.0);
        assert!((parse_timestamp("00:00:30.500").unwrap() - 30.5).abs() < 0.001);
    }

    #[test]
    fn test_parse_timestamp_errors() {
        assert!(matches!(parse_timestamp(""), Err(TimestampError::Empty)));
        assert!(matches!(parse_timestamp("  "), Err(TimestampError::Empty)));
        assert!(matches!(parse_timestamp("abc"), Err(TimestampError::InvalidValue("seconds", _))));
        assert!(matches!(parse_timestamp("x:10"), Err(TimestampError::InvalidValue("minutes", _))));
        assert!(matches!(parse_timestamp("1:2:3:4"), Err(TimestampError::InvalidFormat(_))));
        assert!(matches!(parse_timestamp("-3"), Err(TimestampError::Negative)));
        assert!(matches!(
            parse_timestamp("25:00:00"),
            Err(TimestampError::ExceedsMaxDuration(_))
        ));
    }

    #[test]
    fn test_format_seconds() {
        assert_eq!(format_seconds(0.0), "00:00:00");
        assert_eq!(format_seconds(90.0), "00:01:30");
        assert_eq!(format_seconds(3661.25), "01:01:01.250");
    }

    #[test]
    fn test_srt_timestamp_rounds_to_millis() {
        assert_eq!(format_srt_timestamp(0.0), "00:00:00,000");
        assert_eq!(format_srt_timestamp(16.3), "00:00:16,300");
        assert_eq!(format_srt_timestamp(59.9996), "00:01:00,000");
        assert_eq!(format_srt_timestamp(-1.0), "00:00:00,000");
    }

    #[test]
    fn test_to_millis() {
        assert_eq!(to_millis(16.3), 16300);
        assert_eq!(to_millis(0.0004), 0);
        assert_eq!(to_millis(f64::NAN), 0);
    }
}
