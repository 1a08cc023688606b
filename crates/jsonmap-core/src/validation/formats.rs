//! `format` keyword checks.
//!
//! Only the formats below are asserted; any other format name is treated as
//! an annotation and always passes.

use std::net::Ipv4Addr;

use regex::Regex;
use url::Url;

/// Pre-compiled matchers for the supported formats.
#[derive(Debug, Clone)]
pub(crate) struct FormatChecker {
    email: Regex,
    date: Regex,
    date_time: Regex,
    uuid: Regex,
}

impl FormatChecker {
    pub(crate) fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            // Pragmatic subset of RFC 5322: local@domain.tld, no quoted locals.
            email: Regex::new(
                r"^[A-Za-z0-9.!#$%&'*+/=?^_`{|}~-]+@[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?(?:\.[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?)+$",
            )?,
            date: Regex::new(r"^(\d{4})-(\d{2})-(\d{2})$")?,
            date_time: Regex::new(
                r"^(\d{4})-(\d{2})-(\d{2})[Tt ](\d{2}):(\d{2}):(\d{2})(?:\.\d+)?(?:[Zz]|[+-](\d{2}):(\d{2}))$",
            )?,
            uuid: Regex::new(
                r"^[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}$",
            )?,
        })
    }

    /// Returns `false` only for a known format the value does not satisfy.
    pub(crate) fn is_valid(&self, format: &str, value: &str) -> bool {
        match format {
            "email" => self.email.is_match(value),
            "uri" => Url::parse(value).is_ok(),
            "uuid" => self.uuid.is_match(value),
            "ipv4" => value.parse::<Ipv4Addr>().is_ok(),
            "date" => self
                .date
                .captures(value)
                .is_some_and(|c| valid_date(&c[1], &c[2], &c[3])),
            "date-time" => self.date_time.captures(value).is_some_and(|c| {
                valid_date(&c[1], &c[2], &c[3])
                    && in_range(&c[4], 0, 23)
                    && in_range(&c[5], 0, 59)
                    // 60 allows a leap second.
                    && in_range(&c[6], 0, 60)
                    && c.get(7).map_or(true, |h| in_range(h.as_str(), 0, 23))
                    && c.get(8).map_or(true, |m| in_range(m.as_str(), 0, 59))
            }),
            _ => true,
        }
    }
}

fn in_range(digits: &str, min: u32, max: u32) -> bool {
    digits.parse::<u32>().is_ok_and(|n| (min..=max).contains(&n))
}

fn valid_date(year: &str, month: &str, day: &str) -> bool {
    let (Ok(year), Ok(month), Ok(day)) = (year.parse::<u32>(), month.parse::<u32>(), day.parse::<u32>())
    else {
        return false;
    };
    let leap = (year % 4 == 0 && year % 100 != 0) || year % 400 == 0;
    let days_in_month = match month {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        4 | 6 | 9 | 11 => 30,
        2 if leap => 29,
        2 => 28,
        _ => return false,
    };
    (1..=days_in_month).contains(&day)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn checker() -> FormatChecker {
        FormatChecker::new().unwrap()
    }

    #[test]
    fn test_email() {
        let c = checker();
        assert!(c.is_valid("email", "email@gmail.com"));
        assert!(c.is_valid("email", "first.last+tag@sub.example.org"));
        assert!(!c.is_valid("email", "not-an-email"));
        assert!(!c.is_valid("email", "a@b"));
        assert!(!c.is_valid("email", "a b@example.com"));
    }

    #[test]
    fn test_date_and_date_time() {
        let c = checker();
        assert!(c.is_valid("date", "2024-02-29"));
        assert!(!c.is_valid("date", "2023-02-29"));
        assert!(!c.is_valid("date", "2024-13-01"));
        assert!(c.is_valid("date-time", "2024-05-01T12:30:00Z"));
        assert!(c.is_valid("date-time", "2024-05-01T12:30:00.123+02:00"));
        assert!(!c.is_valid("date-time", "2024-05-01T25:00:00Z"));
        assert!(!c.is_valid("date-time", "2024-05-01"));
    }

    #[test]
    fn test_uri_uuid_ipv4() {
        let c = checker();
        assert!(c.is_valid("uri", "https://example.com/a?b=c"));
        assert!(!c.is_valid("uri", "not a uri"));
        assert!(c.is_valid("uuid", "123e4567-e89b-12d3-a456-426614174000"));
        assert!(!c.is_valid("uuid", "123e4567"));
        assert!(c.is_valid("ipv4", "192.168.0.1"));
        assert!(!c.is_valid("ipv4", "256.0.0.1"));
    }

    #[test]
    fn test_unknown_format_passes() {
        assert!(checker().is_valid("hostname", "anything goes"));
    }
}
