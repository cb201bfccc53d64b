//! Duration text formats
//!
//! The remote shell parses its limits with Go's duration syntax, so limits
//! are rendered the way Go's `Duration.String()` does (`12h0m0s`, `1m30s`,
//! `0s`). The same unit syntax is accepted on the command line.

use std::time::Duration;

/// Render a duration in Go's `Duration.String()` format.
///
/// Precision is limited to milliseconds.
pub fn format_go_duration(duration: Duration) -> String {
    let total_ms = duration.as_millis();
    if total_ms == 0 {
        return "0s".to_string();
    }
    if total_ms < 1000 {
        return format!("{}ms", total_ms);
    }

    let secs = duration.as_secs();
    let hours = secs / 3600;
    let minutes = (secs % 3600) / 60;
    let mut seconds = format!("{}", secs % 60);
    let millis = duration.subsec_millis();
    if millis > 0 {
        let fraction = format!("{:03}", millis);
        seconds.push('.');
        seconds.push_str(fraction.trim_end_matches('0'));
    }

    if hours > 0 {
        format!("{}h{}m{}s", hours, minutes, seconds)
    } else if minutes > 0 {
        format!("{}m{}s", minutes, seconds)
    } else {
        format!("{}s", seconds)
    }
}

/// Parse a duration such as `90s`, `30m`, `1h30m` or `1.5h`.
///
/// A bare number is taken as seconds.
pub fn parse_duration(input: &str) -> Result<Duration, String> {
    let input = input.trim();
    if input.is_empty() {
        return Err("empty duration".to_string());
    }
    if let Ok(secs) = input.parse::<u64>() {
        return Ok(Duration::from_secs(secs));
    }

    let mut total = 0f64;
    let mut rest = input;
    while !rest.is_empty() {
        let number_len = rest
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .ok_or_else(|| format!("missing unit in duration '{}'", input))?;
        if number_len == 0 {
            return Err(format!("invalid duration '{}'", input));
        }
        let value: f64 = rest[..number_len]
            .parse()
            .map_err(|_| format!("invalid number in duration '{}'", input))?;
        rest = &rest[number_len..];

        let unit_len = rest
            .find(|c: char| c.is_ascii_digit() || c == '.')
            .unwrap_or(rest.len());
        let scale = match &rest[..unit_len] {
            "ms" => 0.001,
            "s" => 1.0,
            "m" => 60.0,
            "h" => 3600.0,
            "d" => 86400.0,
            unit => return Err(format!("unknown unit '{}' in duration '{}'", unit, input)),
        };
        rest = &rest[unit_len..];
        total += value * scale;
    }

    Duration::try_from_secs_f64(total).map_err(|_| format!("duration '{}' out of range", input))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_matches_go() {
        assert_eq!(format_go_duration(Duration::ZERO), "0s");
        assert_eq!(format_go_duration(Duration::from_secs(45)), "45s");
        assert_eq!(format_go_duration(Duration::from_secs(90)), "1m30s");
        assert_eq!(format_go_duration(Duration::from_secs(30 * 60)), "30m0s");
        assert_eq!(format_go_duration(Duration::from_secs(12 * 3600)), "12h0m0s");
        assert_eq!(format_go_duration(Duration::from_millis(1500)), "1.5s");
        assert_eq!(format_go_duration(Duration::from_millis(250)), "250ms");
    }

    #[test]
    fn test_parse_units() {
        assert_eq!(parse_duration("90").unwrap(), Duration::from_secs(90));
        assert_eq!(parse_duration("45s").unwrap(), Duration::from_secs(45));
        assert_eq!(parse_duration("30m").unwrap(), Duration::from_secs(1800));
        assert_eq!(parse_duration("1h30m").unwrap(), Duration::from_secs(5400));
        assert_eq!(parse_duration("1.5h").unwrap(), Duration::from_secs(5400));
        assert_eq!(parse_duration("0s").unwrap(), Duration::ZERO);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(parse_duration("").is_err());
        assert!(parse_duration("10x").is_err());
        assert!(parse_duration("h").is_err());
        assert!(parse_duration("5 minutes").is_err());
    }

    #[test]
    fn test_parse_rejects_overflow() {
        let err = parse_duration("6000000000000000h").unwrap_err();
        assert!(err.contains("out of range"), "{}", err);
        assert!(parse_duration("99999999999999999999999s").is_err());
    }

    #[test]
    fn test_parse_then_format() {
        let d = parse_duration("2h15m").unwrap();
        assert_eq!(format_go_duration(d), "2h15m0s");
    }
}
