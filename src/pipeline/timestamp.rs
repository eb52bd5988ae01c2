//! Timestamp decoding for both sources: filename tokens for swath granules, CF
//! `units` strings for reanalysis time coordinates.

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, NaiveTime, Utc};

/// Parses the acquisition time embedded in a granule file name.
///
/// Looks for a `DDMONYYYY` token (`01JUL2023`, case-insensitive month), optionally
/// followed by an `HHMM` token (`..._01JUL2023_1015_...`). Tokens are split on
/// `_`, `-`, `.` and spaces. Returns `None` when no date token is found.
pub fn timestamp_from_filename(file_name: &str) -> Option<DateTime<Utc>> {
    let tokens: Vec<&str> = file_name
        .split(|c: char| c == '_' || c == '-' || c == '.' || c.is_whitespace())
        .filter(|t| !t.is_empty())
        .collect();

    tokens.iter().enumerate().find_map(|(i, token)| {
        let date = parse_date_token(token)?;
        let time = tokens
            .get(i + 1)
            .and_then(|next| parse_time_token(next))
            .unwrap_or(NaiveTime::MIN);
        Some(date.and_time(time).and_utc())
    })
}

fn parse_date_token(token: &str) -> Option<NaiveDate> {
    if token.len() != 9 || !token.is_ascii() {
        return None;
    }
    let (day, rest) = token.split_at(2);
    let (month, year) = rest.split_at(3);
    if !day.bytes().all(|b| b.is_ascii_digit()) || !year.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    // chrono's %b is case-insensitive.
    NaiveDate::parse_from_str(&format!("{day}{month}{year}"), "%d%b%Y").ok()
}

fn parse_time_token(token: &str) -> Option<NaiveTime> {
    if token.len() != 4 || !token.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    NaiveTime::parse_from_str(token, "%H%M").ok()
}

/// Unit of a CF time coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeUnit {
    Seconds,
    Minutes,
    Hours,
    Days,
}

impl TimeUnit {
    fn milliseconds(&self) -> f64 {
        match self {
            TimeUnit::Seconds => 1_000.0,
            TimeUnit::Minutes => 60_000.0,
            TimeUnit::Hours => 3_600_000.0,
            TimeUnit::Days => 86_400_000.0,
        }
    }
}

/// Decoded CF `units` attribute such as `minutes since 2023-07-01 00:30:00`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeUnits {
    pub unit: TimeUnit,
    pub epoch: DateTime<Utc>,
}

impl TimeUnits {
    /// Parses `<unit> since <date>[ T]<time>[Z| UTC]`. Returns `None` if the string
    /// does not follow that form.
    pub fn parse(units: &str) -> Option<Self> {
        let lower = units.trim().to_ascii_lowercase();
        let (unit, reference) = lower.split_once(" since ")?;
        let unit = match unit.trim() {
            "s" | "sec" | "secs" | "second" | "seconds" => TimeUnit::Seconds,
            "min" | "mins" | "minute" | "minutes" => TimeUnit::Minutes,
            "h" | "hr" | "hrs" | "hour" | "hours" => TimeUnit::Hours,
            "d" | "day" | "days" => TimeUnit::Days,
            _ => return None,
        };
        let epoch = parse_reference(reference)?;
        Some(TimeUnits { unit, epoch })
    }

    /// Converts a raw coordinate value to a UTC instant, `None` when out of range.
    pub fn to_utc(&self, value: f64) -> Option<DateTime<Utc>> {
        if !value.is_finite() {
            return None;
        }
        let millis = (value * self.unit.milliseconds()).round();
        if millis.abs() > i64::MAX as f64 {
            return None;
        }
        let offset = Duration::try_milliseconds(millis as i64)?;
        self.epoch.checked_add_signed(offset)
    }
}

fn parse_reference(reference: &str) -> Option<DateTime<Utc>> {
    let cleaned = reference
        .trim()
        .trim_end_matches("utc")
        .trim_end_matches('z')
        .trim()
        .replace('t', " ");

    const FORMATS: [&str; 3] = ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M"];
    for format in FORMATS {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(&cleaned, format) {
            return Some(parsed.and_utc());
        }
    }
    NaiveDate::parse_from_str(&cleaned, "%Y-%m-%d")
        .ok()
        .map(|date| date.and_time(NaiveTime::MIN).and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_filename_with_date_and_time() {
        let ts = timestamp_from_filename("3RIMG_01JUL2023_1015_L2B_AOD_V02R00.h5").unwrap();
        assert_eq!(ts, Utc.with_ymd_and_hms(2023, 7, 1, 10, 15, 0).unwrap());
    }

    #[test]
    fn test_filename_date_only_and_lowercase_month() {
        let ts = timestamp_from_filename("aod-15aug2023.h5").unwrap();
        assert_eq!(ts, Utc.with_ymd_and_hms(2023, 8, 15, 0, 0, 0).unwrap());

        // A token after the date that is not a valid time is ignored.
        let ts = timestamp_from_filename("3RIMG_02JUL2023_L2B.h5").unwrap();
        assert_eq!(ts, Utc.with_ymd_and_hms(2023, 7, 2, 0, 0, 0).unwrap());
    }

    #[test]
    fn test_filename_without_date() {
        assert!(timestamp_from_filename("granule_0001.h5").is_none());
        assert!(timestamp_from_filename("3RIMG_32JUL2023_1015.h5").is_none());
        assert!(timestamp_from_filename("3RIMG_01XYZ2023.h5").is_none());
    }

    #[test]
    fn test_cf_units() {
        let units = TimeUnits::parse("minutes since 2023-07-01 00:30:00").unwrap();
        assert_eq!(units.unit, TimeUnit::Minutes);
        assert_eq!(
            units.to_utc(60.0),
            Some(Utc.with_ymd_and_hms(2023, 7, 1, 1, 30, 0).unwrap())
        );

        let units = TimeUnits::parse("hours since 1900-01-01").unwrap();
        assert_eq!(
            units.to_utc(24.0),
            Some(Utc.with_ymd_and_hms(1900, 1, 2, 0, 0, 0).unwrap())
        );

        let units = TimeUnits::parse("seconds since 2023-07-01T00:00:00Z").unwrap();
        assert_eq!(
            units.to_utc(5400.0),
            Some(Utc.with_ymd_and_hms(2023, 7, 1, 1, 30, 0).unwrap())
        );

        let units = TimeUnits::parse("Days since 2000-01-01 00:00").unwrap();
        assert_eq!(units.unit, TimeUnit::Days);
        assert_eq!(units.to_utc(f64::NAN), None);
    }

    #[test]
    fn test_bad_cf_units() {
        assert!(TimeUnits::parse("fortnights since 2023-07-01").is_none());
        assert!(TimeUnits::parse("minutes").is_none());
        assert!(TimeUnits::parse("minutes since yesterday").is_none());
    }
}
