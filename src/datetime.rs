//! Instant and duration parsing/formatting.
//!
//! Instants are parsed against the configuration's format-pattern list, first
//! match wins; patterns without a zone are interpreted in the configured
//! offset. Durations use the ISO-8601 `PnDTnHnMnS` textual form.

use chrono::{DateTime, Duration, FixedOffset, NaiveDate, NaiveDateTime, TimeZone, Utc};

/// The default format-pattern list. The first entry doubles as the default
/// output format.
pub fn default_formats() -> Vec<String> {
    vec![
        "%Y-%m-%dT%H:%M:%S%.f%:z".to_string(),
        "%Y-%m-%dT%H:%M:%S%.f".to_string(),
        "%Y-%m-%d %H:%M:%S%.f".to_string(),
        "%Y-%m-%d".to_string(),
    ]
}

/// Parses an instant against the format list, first match wins. Zone-less
/// patterns are localized in `zone`. Falls back to RFC 3339. Returns `None`
/// when nothing matches.
pub fn parse_instant(
    text: &str,
    formats: &[String],
    zone: FixedOffset,
) -> Option<DateTime<Utc>> {
    let text = text.trim();
    for format in formats {
        if let Ok(zoned) = DateTime::parse_from_str(text, format) {
            return Some(zoned.with_timezone(&Utc));
        }
        if let Ok(naive) = NaiveDateTime::parse_from_str(text, format) {
            return localize(naive, zone);
        }
        if let Ok(date) = NaiveDate::parse_from_str(text, format) {
            return localize(date.and_hms_opt(0, 0, 0)?, zone);
        }
    }
    DateTime::parse_from_rfc3339(text)
        .ok()
        .map(|zoned| zoned.with_timezone(&Utc))
}

fn localize(naive: NaiveDateTime, zone: FixedOffset) -> Option<DateTime<Utc>> {
    zone.from_local_datetime(&naive)
        .earliest()
        .map(|zoned| zoned.with_timezone(&Utc))
}

/// Formats an instant in the given zone with a chrono format pattern.
pub fn format_instant(instant: DateTime<Utc>, format: &str, zone: FixedOffset) -> String {
    instant.with_timezone(&zone).format(format).to_string()
}

/// Milliseconds since the epoch, saturating at the representable range.
pub fn instant_from_millis(millis: i64) -> DateTime<Utc> {
    Utc.timestamp_millis_opt(millis)
        .single()
        .unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
}

/// Parses an ISO-8601 duration (`PnDTnHnMnS`, optionally signed, seconds may
/// carry a fraction). Returns `None` on any malformed input.
pub fn parse_duration(text: &str) -> Option<Duration> {
    let text = text.trim();
    let (negative, rest) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text),
    };
    let rest = rest.strip_prefix(['P', 'p'])?;
    let (date_part, time_part) = match rest.split_once(['T', 't']) {
        Some((d, t)) => (d, Some(t)),
        None => (rest, None),
    };

    let mut millis: i64 = 0;
    let mut seen = false;

    let mut cursor = date_part;
    while !cursor.is_empty() {
        let (number, unit, rest) = next_component(cursor)?;
        let factor = match unit {
            'D' | 'd' => 86_400_000,
            _ => return None,
        };
        millis = millis.checked_add(number.checked_mul(factor)?)?;
        seen = true;
        cursor = rest;
    }

    if let Some(time_part) = time_part {
        if time_part.is_empty() {
            return None;
        }
        let mut cursor = time_part;
        while !cursor.is_empty() {
            let (number, unit, rest) = next_fractional_component(cursor)?;
            let scaled = match unit {
                'H' | 'h' => scale(number, 3_600_000)?,
                'M' | 'm' => scale(number, 60_000)?,
                'S' | 's' => scale(number, 1_000)?,
                _ => return None,
            };
            millis = millis.checked_add(scaled)?;
            seen = true;
            cursor = rest;
        }
    }

    if !seen {
        return None;
    }
    if negative {
        millis = -millis;
    }
    Some(Duration::milliseconds(millis))
}

fn next_component(text: &str) -> Option<(i64, char, &str)> {
    let digits: String = text.chars().take_while(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return None;
    }
    let rest = &text[digits.len()..];
    let unit = rest.chars().next()?;
    Some((digits.parse().ok()?, unit, &rest[unit.len_utf8()..]))
}

fn next_fractional_component(text: &str) -> Option<(f64, char, &str)> {
    let digits: String = text
        .chars()
        .take_while(|c| c.is_ascii_digit() || *c == '.')
        .collect();
    if digits.is_empty() || digits.matches('.').count() > 1 {
        return None;
    }
    let rest = &text[digits.len()..];
    let unit = rest.chars().next()?;
    Some((digits.parse().ok()?, unit, &rest[unit.len_utf8()..]))
}

fn scale(number: f64, factor: i64) -> Option<i64> {
    let scaled = number * factor as f64;
    if !scaled.is_finite() || scaled.abs() > i64::MAX as f64 / 2.0 {
        return None;
    }
    Some(scaled.round() as i64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_iso_date() {
        let instant = parse_instant(
            "2024-03-01",
            &default_formats(),
            FixedOffset::east_opt(0).unwrap(),
        )
        .unwrap();
        assert_eq!(instant.to_rfc3339(), "2024-03-01T00:00:00+00:00");
    }

    #[test]
    fn test_parse_zoned_date_time() {
        let instant = parse_instant(
            "2024-03-01T12:00:00+02:00",
            &default_formats(),
            FixedOffset::east_opt(0).unwrap(),
        )
        .unwrap();
        assert_eq!(instant.to_rfc3339(), "2024-03-01T10:00:00+00:00");
    }

    #[test]
    fn test_zone_offset_applies_to_local_patterns() {
        let zone = FixedOffset::east_opt(3600).unwrap();
        let instant = parse_instant("2024-03-01T00:00:00", &default_formats(), zone).unwrap();
        assert_eq!(instant.to_rfc3339(), "2024-02-29T23:00:00+00:00");
    }

    #[test]
    fn test_parse_duration_full() {
        let duration = parse_duration("P1DT2H3M4.5S").unwrap();
        assert_eq!(
            duration.num_milliseconds(),
            86_400_000 + 2 * 3_600_000 + 3 * 60_000 + 4_500
        );
    }

    #[test]
    fn test_parse_duration_negative() {
        assert_eq!(parse_duration("-PT1S").unwrap().num_milliseconds(), -1000);
    }

    #[test]
    fn test_parse_duration_rejects_garbage() {
        assert!(parse_duration("one hour").is_none());
        assert!(parse_duration("P").is_none());
        assert!(parse_duration("PT").is_none());
    }
}
