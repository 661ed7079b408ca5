// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

//! Signed ISO-8601 durations restricted to days, hours, minutes and seconds.

use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use regex::Regex;

use crate::error::DurationError;

const SECS_PER_MINUTE: i64 = 60;
const SECS_PER_HOUR: i64 = 60 * SECS_PER_MINUTE;
const SECS_PER_DAY: i64 = 24 * SECS_PER_HOUR;

/// A signed span of whole seconds, written as `[-]P[nD][T[nH][nM][nS]]`.
///
/// Weeks, years, months and fractional seconds are not representable.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Duration {
    secs: i64,
}

impl Duration {
    /// The empty duration, written `PT0S`.
    pub const ZERO: Self = Self { secs: 0 };

    /// Creates a duration from a signed number of seconds.
    #[must_use]
    pub const fn from_secs(secs: i64) -> Self {
        Self { secs }
    }

    /// Creates a duration from minutes, saturating at the representable range.
    #[must_use]
    pub const fn from_minutes(minutes: i64) -> Self {
        Self::from_secs(minutes.saturating_mul(SECS_PER_MINUTE))
    }

    /// Total signed seconds.
    #[must_use]
    pub const fn as_secs(self) -> i64 {
        self.secs
    }

    /// Whether this duration points into the past.
    #[must_use]
    pub const fn is_negative(self) -> bool {
        self.secs < 0
    }

    /// Converts to the signed duration used for datetime arithmetic.
    #[must_use]
    pub const fn to_signed_duration(self) -> jiff::SignedDuration {
        jiff::SignedDuration::from_secs(self.secs)
    }
}

impl FromStr for Duration {
    type Err = DurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_duration(s)
    }
}

impl fmt::Display for Duration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.secs == 0 {
            return f.write_str("PT0S");
        }

        let sign = if self.secs < 0 { "-" } else { "" };
        let total = self.secs.unsigned_abs();
        let (days, rest) = (total / 86_400, total % 86_400);
        let (hours, rest) = (rest / 3_600, rest % 3_600);
        let (minutes, seconds) = (rest / 60, rest % 60);

        write!(f, "{sign}P")?;
        if days > 0 {
            write!(f, "{days}D")?;
        }
        if hours > 0 || minutes > 0 || seconds > 0 {
            f.write_str("T")?;
            if hours > 0 {
                write!(f, "{hours}H")?;
            }
            if minutes > 0 {
                write!(f, "{minutes}M")?;
            }
            if seconds > 0 {
                write!(f, "{seconds}S")?;
            }
        }
        Ok(())
    }
}

impl serde::Serialize for Duration {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> serde::Deserialize<'de> for Duration {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        parse_duration(&text).map_err(serde::de::Error::custom)
    }
}

/// Parses an ISO-8601 duration such as `-PT10M` or `P1DT2H`.
///
/// Designator letters are case-insensitive. A leading `+`, week designators,
/// fractional values and empty bodies (`P`, `PT`) are rejected.
///
/// # Errors
///
/// Returns [`DurationError`] if the text does not follow the grammar or the
/// total overflows.
pub fn parse_duration(text: &str) -> Result<Duration, DurationError> {
    const RE: &str = r"(?i)^(-)?P(?:([0-9]+)D)?(?:(T)(?:([0-9]+)H)?(?:([0-9]+)M)?(?:([0-9]+)S)?)?$";
    static REGEX: OnceLock<Regex> = OnceLock::new();
    let re = REGEX.get_or_init(|| Regex::new(RE).unwrap());

    let caps = re
        .captures(text)
        .ok_or_else(|| DurationError::Invalid(text.to_string()))?;

    let has_time_part = caps.get(3).is_some();
    let fields = [
        (caps.get(2), SECS_PER_DAY),
        (caps.get(4), SECS_PER_HOUR),
        (caps.get(5), SECS_PER_MINUTE),
        (caps.get(6), 1),
    ];

    let has_time_field = fields.iter().skip(1).any(|(m, _)| m.is_some());
    if fields.iter().all(|(m, _)| m.is_none()) || (has_time_part && !has_time_field) {
        return Err(DurationError::Empty(text.to_string()));
    }

    // The magnitude is unsigned so that `i64::MIN` seconds can be read back.
    let overflow = || DurationError::Overflow(text.to_string());
    let mut magnitude: u64 = 0;
    for (m, unit) in fields {
        let Some(m) = m else { continue };
        let n: u64 = m.as_str().parse().map_err(|_| overflow())?;
        let part = n.checked_mul(unit.unsigned_abs()).ok_or_else(overflow)?;
        magnitude = magnitude.checked_add(part).ok_or_else(overflow)?;
    }

    let secs = if caps.get(1).is_some() {
        0_i64.checked_sub_unsigned(magnitude)
    } else {
        i64::try_from(magnitude).ok()
    };
    secs.map(Duration::from_secs).ok_or_else(overflow)
}

/// Formats a duration in normalized form; zero is `PT0S`.
#[must_use]
pub fn format_duration(duration: Duration) -> String {
    duration.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_durations() {
        let success_cases = [
            ("-PT10M", -600),
            ("PT10M", 600),
            ("P1D", 86_400),
            ("P1DT2H", 93_600),
            ("PT1H30M15S", 5_415),
            ("-P2DT3H4M5S", -(2 * 86_400 + 3 * 3_600 + 4 * 60 + 5)),
            ("pt15m", 900),
            ("-p1dt1s", -86_401),
            ("PT0S", 0),
            ("P0D", 0),
            ("PT90M", 5_400),
        ];
        for (input, expected) in success_cases {
            assert_eq!(
                parse_duration(input),
                Ok(Duration::from_secs(expected)),
                "input: {input}"
            );
        }
    }

    #[test]
    fn rejects_malformed_durations() {
        let fail_cases = [
            "",
            "P",
            "PT",
            "-P",
            "P1DT",
            "+PT10M",
            "P1W",
            "PT1.5S",
            "PT10",
            "10M",
            "P1H",
            "PT1S1M",
            " PT1M",
            "PT1M ",
            "P1Y",
        ];
        for input in fail_cases {
            assert!(parse_duration(input).is_err(), "input: {input:?}");
        }
    }

    #[test]
    fn reports_empty_bodies_distinctly() {
        assert_eq!(
            parse_duration("PT"),
            Err(DurationError::Empty("PT".to_string()))
        );
        assert_eq!(
            parse_duration("P1W"),
            Err(DurationError::Invalid("P1W".to_string()))
        );
    }

    #[test]
    fn rejects_overflowing_durations() {
        let err = parse_duration("P99999999999999999D").unwrap_err();
        assert!(matches!(err, DurationError::Overflow(_)));

        let err = parse_duration("PT99999999999999999999S").unwrap_err();
        assert!(matches!(err, DurationError::Overflow(_)));

        let err = parse_duration("PT9223372036854775808S").unwrap_err();
        assert!(matches!(err, DurationError::Overflow(_)));
    }

    #[test]
    fn extreme_durations_survive_formatting() {
        for secs in [i64::MIN, i64::MIN + 1, i64::MAX] {
            let d = Duration::from_secs(secs);
            assert_eq!(parse_duration(&d.to_string()), Ok(d), "secs: {secs}");
        }
        assert_eq!(
            parse_duration("-PT9223372036854775808S"),
            Ok(Duration::from_secs(i64::MIN))
        );
    }

    #[test]
    fn from_minutes_saturates() {
        assert_eq!(Duration::from_minutes(i64::MAX), Duration::from_secs(i64::MAX));
        assert_eq!(Duration::from_minutes(i64::MIN), Duration::from_secs(i64::MIN));
        assert_eq!(Duration::from_minutes(-10).as_secs(), -600);
    }

    #[test]
    fn formats_normalized() {
        let cases = [
            (0, "PT0S"),
            (-600, "-PT10M"),
            (86_400, "P1D"),
            (93_600, "P1DT2H"),
            (5_400, "PT1H30M"),
            (-86_401, "-P1DT1S"),
            (59, "PT59S"),
        ];
        for (secs, expected) in cases {
            assert_eq!(format_duration(Duration::from_secs(secs)), expected);
        }
    }

    #[test]
    fn format_parse_is_stable() {
        for secs in [-93_784, -600, -1, 0, 1, 3_600, 172_800, 200_000] {
            let d = Duration::from_secs(secs);
            assert_eq!(parse_duration(&d.to_string()), Ok(d));
        }

        // Non-normalized inputs come back normalized.
        let d = parse_duration("PT90M").unwrap();
        assert_eq!(d.to_string(), "PT1H30M");
    }

    #[test]
    fn serializes_as_string() {
        let d = Duration::from_minutes(-10);
        assert_eq!(serde_json::to_string(&d).unwrap(), r#""-PT10M""#);
        let back: Duration = serde_json::from_str(r#""-pt10m""#).unwrap();
        assert_eq!(back, d);
        assert!(serde_json::from_str::<Duration>(r#""P1W""#).is_err());
    }
}
