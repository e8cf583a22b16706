//! HTTP date formatting module
//!
//! Formats and parses header timestamps with a configurable strftime pattern
//! and time zone. Timestamps are carried as epoch milliseconds.

use chrono::format::{Fixed, Item, StrftimeItems};
use chrono::{DateTime, FixedOffset, LocalResult, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;

use crate::error::ConfigError;

/// RFC 7231 IMF-fixdate, the format browsers send back in `If-Modified-Since`
pub const DEFAULT_DATE_FORMAT: &str = "%a, %d %b %Y %H:%M:%S %Z";

/// Time zone paired with [`DEFAULT_DATE_FORMAT`]
pub const DEFAULT_TIME_ZONE: &str = "GMT";

/// Date pattern bound to a time zone
#[derive(Debug, Clone)]
pub struct HttpDateFormat {
    pattern: String,
    time_zone: Tz,
}

impl HttpDateFormat {
    /// Validate the pattern and resolve the time zone identifier
    ///
    /// # Examples
    /// ```
    /// use static_responder::http::date::HttpDateFormat;
    /// assert!(HttpDateFormat::new("%a, %d %b %Y %H:%M:%S %Z", "GMT").is_ok());
    /// assert!(HttpDateFormat::new("%a, %d %b %Y", "Mars/Olympus").is_err());
    /// ```
    pub fn new(pattern: &str, time_zone: &str) -> Result<Self, ConfigError> {
        if pattern.is_empty() || StrftimeItems::new(pattern).any(|item| matches!(item, Item::Error)) {
            return Err(ConfigError::InvalidDateFormat(pattern.to_string()));
        }

        let time_zone = time_zone
            .parse::<Tz>()
            .map_err(|_| ConfigError::InvalidTimeZone(time_zone.to_string()))?;

        Ok(Self {
            pattern: pattern.to_string(),
            time_zone,
        })
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Format an instant in the configured time zone
    pub fn format(&self, instant: DateTime<Utc>) -> String {
        instant
            .with_timezone(&self.time_zone)
            .format(&self.pattern)
            .to_string()
    }

    /// Format epoch milliseconds, sub-second precision is dropped by the pattern
    pub fn format_millis(&self, millis: i64) -> String {
        self.format(DateTime::from_timestamp_millis(millis).unwrap_or_default())
    }

    /// Parse a header value back into an instant
    ///
    /// Patterns carrying a numeric offset are honoured. Otherwise the value
    /// is read as wall-clock time in the configured zone, and a `%Z` zone
    /// name picks between the two instants of a repeated DST hour. A zone
    /// name the configured zone does not use is accepted only if it is one
    /// of the RFC 5322 names. Returns `None` for anything that does not match.
    pub fn parse(&self, value: &str) -> Option<DateTime<Utc>> {
        let value = value.trim();

        if let Ok(with_offset) = DateTime::parse_from_str(value, &self.pattern) {
            return Some(with_offset.with_timezone(&Utc));
        }

        let naive = NaiveDateTime::parse_from_str(value, &self.pattern).ok()?;
        let candidates = match self.time_zone.from_local_datetime(&naive) {
            LocalResult::Single(local) => vec![local],
            LocalResult::Ambiguous(earliest, latest) => vec![earliest, latest],
            LocalResult::None => Vec::new(),
        };

        let Some(name) = self.zone_name(value, &naive) else {
            return candidates.first().map(|local| local.with_timezone(&Utc));
        };

        if let Some(local) = candidates
            .iter()
            .find(|local| local.format("%Z").to_string().eq_ignore_ascii_case(name))
        {
            return Some(local.with_timezone(&Utc));
        }

        named_zone_offset(name)?
            .from_local_datetime(&naive)
            .single()
            .map(|instant| instant.with_timezone(&Utc))
    }

    /// Parse a header value into epoch milliseconds
    pub fn parse_millis(&self, value: &str) -> Option<i64> {
        self.parse(value).map(|instant| instant.timestamp_millis())
    }

    /// Zone name found in `value` where the pattern has `%Z`
    ///
    /// chrono skips zone names while parsing, so the name is cut out of the
    /// header by re-rendering the part of the pattern in front of it.
    fn zone_name<'a>(&self, value: &'a str, naive: &NaiveDateTime) -> Option<&'a str> {
        let items: Vec<Item<'_>> = StrftimeItems::new(&self.pattern).collect();
        let position = items
            .iter()
            .position(|item| matches!(item, Item::Fixed(Fixed::TimezoneName)))?;
        let prefix = naive
            .and_utc()
            .format_with_items(items[..position].iter())
            .to_string();

        let rest = value.get(prefix.len()..)?;
        if !value[..prefix.len()].eq_ignore_ascii_case(&prefix) {
            return None;
        }
        let end = rest.find(char::is_whitespace).unwrap_or(rest.len());
        Some(&rest[..end]).filter(|name| !name.is_empty())
    }
}

/// Zone names RFC 5322 allows in dates plus `UTC`, with their offsets in hours
const NAMED_ZONES: [(&str, i32); 11] = [
    ("UT", 0),
    ("UTC", 0),
    ("GMT", 0),
    ("EST", -5),
    ("EDT", -4),
    ("CST", -6),
    ("CDT", -5),
    ("MST", -7),
    ("MDT", -6),
    ("PST", -8),
    ("PDT", -7),
];

fn named_zone_offset(name: &str) -> Option<FixedOffset> {
    NAMED_ZONES
        .iter()
        .find(|(zone, _)| zone.eq_ignore_ascii_case(name))
        .and_then(|&(_, hours)| FixedOffset::east_opt(hours * 3600))
}

impl Default for HttpDateFormat {
    fn default() -> Self {
        Self {
            pattern: DEFAULT_DATE_FORMAT.to_string(),
            time_zone: Tz::GMT,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // 2023-11-14T22:13:20Z
    const INSTANT_MS: i64 = 1_700_000_000_000;

    #[test]
    fn test_format_default_pattern() {
        let format = HttpDateFormat::default();
        assert_eq!(
            format.format_millis(INSTANT_MS),
            "Tue, 14 Nov 2023 22:13:20 GMT"
        );
    }

    #[test]
    fn test_format_drops_millis() {
        let format = HttpDateFormat::default();
        assert_eq!(
            format.format_millis(INSTANT_MS + 999),
            format.format_millis(INSTANT_MS)
        );
    }

    #[test]
    fn test_parse_default_pattern() {
        let format = HttpDateFormat::default();
        assert_eq!(
            format.parse_millis("Tue, 14 Nov 2023 22:13:20 GMT"),
            Some(INSTANT_MS)
        );
    }

    #[test]
    fn test_parse_in_configured_zone() {
        let format = HttpDateFormat::new("%Y-%m-%d %H:%M:%S", "Asia/Tokyo").unwrap();
        assert_eq!(format.format_millis(INSTANT_MS), "2023-11-15 07:13:20");
        assert_eq!(format.parse_millis("2023-11-15 07:13:20"), Some(INSTANT_MS));
    }

    #[test]
    fn test_parse_with_offset() {
        let format = HttpDateFormat::new("%Y-%m-%dT%H:%M:%S%z", "UTC").unwrap();
        assert_eq!(
            format.parse_millis("2023-11-15T00:13:20+0200"),
            Some(INSTANT_MS)
        );
    }

    #[test]
    fn test_repeated_dst_hour_round_trips() {
        let format = HttpDateFormat::new(DEFAULT_DATE_FORMAT, "America/New_York").unwrap();

        // 2023-11-05T06:30:00Z, second pass through 01:30 local
        let standard = format.format_millis(1_699_165_800_000);
        assert_eq!(standard, "Sun, 05 Nov 2023 01:30:00 EST");
        assert_eq!(format.parse_millis(&standard), Some(1_699_165_800_000));

        // 2023-11-05T05:30:00Z, first pass through 01:30 local
        let daylight = format.format_millis(1_699_162_200_000);
        assert_eq!(daylight, "Sun, 05 Nov 2023 01:30:00 EDT");
        assert_eq!(format.parse_millis(&daylight), Some(1_699_162_200_000));
    }

    #[test]
    fn test_round_trip_across_dst_transitions() {
        // (zone, transition instants in epoch seconds)
        let cases = [
            ("America/New_York", [1_678_604_400_i64, 1_699_164_000]),
            ("Europe/Berlin", [1_679_792_400, 1_698_541_200]),
            ("Australia/Sydney", [1_680_364_800, 1_696_089_600]),
        ];

        for (zone, transitions) in cases {
            let format = HttpDateFormat::new(DEFAULT_DATE_FORMAT, zone).unwrap();
            for transition in transitions {
                for step in -12..=12 {
                    let millis = (transition + step * 900) * 1000;
                    let header = format.format_millis(millis);
                    assert_eq!(
                        format.parse_millis(&header),
                        Some(millis),
                        "{zone}: '{header}' did not round-trip"
                    );
                }
            }
        }
    }

    #[test]
    fn test_zone_name_in_header() {
        let format = HttpDateFormat::default();
        assert_eq!(
            format.parse_millis("Tue, 14 Nov 2023 17:13:20 EST"),
            Some(INSTANT_MS)
        );
        assert_eq!(
            format.parse_millis("Tue, 14 Nov 2023 14:13:20 PST"),
            Some(INSTANT_MS)
        );
        assert_eq!(
            format.parse_millis("Tue, 14 Nov 2023 22:13:20 gmt"),
            Some(INSTANT_MS)
        );

        let new_york = HttpDateFormat::new(DEFAULT_DATE_FORMAT, "America/New_York").unwrap();
        assert_eq!(
            new_york.parse_millis("Tue, 14 Nov 2023 22:13:20 GMT"),
            Some(INSTANT_MS)
        );
        assert_eq!(
            new_york.parse_millis("Tue, 14 Nov 2023 17:13:20 EST"),
            Some(INSTANT_MS)
        );
    }

    #[test]
    fn test_unknown_zone_name_rejected() {
        let format = HttpDateFormat::default();
        assert_eq!(format.parse("Tue, 14 Nov 2023 22:13:20 XYZ"), None);
        assert_eq!(format.parse("Tue, 14 Nov 2023 22:13:20 CEST"), None);
    }

    #[test]
    fn test_parse_garbage() {
        let format = HttpDateFormat::default();
        assert_eq!(format.parse("yesterday"), None);
        assert_eq!(format.parse(""), None);
    }

    #[test]
    fn test_invalid_configuration() {
        assert!(matches!(
            HttpDateFormat::new("%Y-%Q", "GMT"),
            Err(ConfigError::InvalidDateFormat(_))
        ));
        assert!(matches!(
            HttpDateFormat::new(DEFAULT_DATE_FORMAT, "Nowhere/City"),
            Err(ConfigError::InvalidTimeZone(_))
        ));
    }
}
