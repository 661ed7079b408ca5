// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

//! Timestamps that may or may not carry a time zone.

use std::fmt;
use std::str::FromStr;

use jiff::civil::{Date, DateTime, Time};
use jiff::tz::{Offset, TimeZone};
use jiff::{SignedDuration, Timestamp, Zoned};

use crate::error::TimestampError;

const FORMAT_ISO_FLOATING: &str = "%Y-%m-%dT%H:%M:%S";
const FORMAT_ISO_ZONED: &str = "%Y-%m-%dT%H:%M:%S%:z";
const FORMAT_ICAL_DATE: &str = "%Y%m%d";
const FORMAT_ICAL_DATETIME: &str = "%Y%m%dT%H%M%S";

/// A timestamp that is either floating (naive) or anchored to a time zone.
///
/// Date-only input is read as midnight of that day.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LooseDateTime {
    /// Wall-clock time without zone information.
    Floating(DateTime),

    /// Time anchored to an IANA zone or a fixed offset.
    Zoned(Zoned),
}

impl LooseDateTime {
    /// Whether the timestamp carries zone information.
    #[must_use]
    pub const fn is_aware(&self) -> bool {
        matches!(self, Self::Zoned(_))
    }

    /// The wall-clock part, ignoring any zone.
    #[must_use]
    pub fn civil(&self) -> DateTime {
        match self {
            Self::Floating(dt) => *dt,
            Self::Zoned(zoned) => zoned.datetime(),
        }
    }

    /// Shifts the timestamp by a signed span.
    ///
    /// Zoned values move on the absolute timeline; floating values move on
    /// the wall clock.
    ///
    /// # Errors
    ///
    /// Returns an error if the result falls outside the supported range.
    pub fn checked_add(&self, span: SignedDuration) -> Result<Self, jiff::Error> {
        match self {
            Self::Floating(dt) => dt.checked_add(span).map(Self::Floating),
            Self::Zoned(zoned) => zoned.checked_add(span).map(Self::Zoned),
        }
    }

    /// Formats the value for an iCalendar property.
    ///
    /// Values in a named zone are written as local time with a `TZID`;
    /// UTC and fixed offsets are converted to UTC with a `Z` suffix.
    #[must_use]
    pub fn to_ical(&self) -> IcalDateTime {
        match self {
            Self::Floating(dt) => IcalDateTime {
                value: dt.strftime(FORMAT_ICAL_DATETIME).to_string(),
                tzid: None,
            },
            Self::Zoned(zoned) => match zoned.time_zone().iana_name() {
                Some(name) if !is_utc_name(name) => IcalDateTime {
                    value: zoned.strftime(FORMAT_ICAL_DATETIME).to_string(),
                    tzid: Some(name.to_string()),
                },
                _ => {
                    let utc = zoned.timestamp().to_zoned(TimeZone::UTC);
                    IcalDateTime {
                        value: format!("{}Z", utc.strftime(FORMAT_ICAL_DATETIME)),
                        tzid: None,
                    }
                }
            },
        }
    }

    /// Formats the value for an iCalendar property expressed in `zone`.
    ///
    /// Zoned values are moved to `zone` when it resolves and written as
    /// local time with `zone` as `TZID`, so a fixed offset such as `+02:00`
    /// becomes `TZID=+0200`. UTC keeps the `Z` suffix. Floating values keep
    /// their wall clock and take `zone` as `TZID`. Without a zone this is
    /// [`LooseDateTime::to_ical`].
    #[must_use]
    pub fn to_ical_in(&self, zone: Option<&str>) -> IcalDateTime {
        let Some(zone) = zone.map(str::trim).filter(|z| !z.is_empty()) else {
            return self.to_ical();
        };

        match self {
            Self::Floating(dt) => IcalDateTime {
                value: dt.strftime(FORMAT_ICAL_DATETIME).to_string(),
                tzid: Some(zone.to_string()),
            },
            Self::Zoned(zoned) => {
                let Some(tz) = resolve_zone(zone) else {
                    return self.to_ical();
                };
                let local = Self::Zoned(zoned.with_time_zone(tz));
                match zone_of(&local) {
                    Some(tzid) if !is_utc_name(&tzid) => IcalDateTime {
                        value: local.civil().strftime(FORMAT_ICAL_DATETIME).to_string(),
                        // Offsets drop the colon so the parameter needs no quoting.
                        tzid: Some(if tzid.starts_with(['+', '-']) {
                            tzid.replace(':', "")
                        } else {
                            tzid
                        }),
                    },
                    _ => local.to_ical(),
                }
            }
        }
    }
}

impl fmt::Display for LooseDateTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Floating(dt) => write!(f, "{}", dt.strftime(FORMAT_ISO_FLOATING)),
            Self::Zoned(zoned) => write!(f, "{}", zoned.strftime(FORMAT_ISO_ZONED)),
        }
    }
}

impl FromStr for LooseDateTime {
    type Err = TimestampError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_timestamp(s).ok_or_else(|| TimestampError(s.to_string()))
    }
}

impl From<DateTime> for LooseDateTime {
    fn from(dt: DateTime) -> Self {
        Self::Floating(dt)
    }
}

impl From<Zoned> for LooseDateTime {
    fn from(zoned: Zoned) -> Self {
        Self::Zoned(zoned)
    }
}

/// An iCalendar `DATE-TIME` value with its optional `TZID` parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IcalDateTime {
    /// Basic-format value, such as `20250421T134500` or `20250421T114500Z`.
    pub value: String,
    /// IANA zone the local value is expressed in.
    pub tzid: Option<String>,
}

/// Reads a timestamp in ISO-8601 extended or iCalendar basic format.
///
/// Accepted shapes include `2025-04-21`, `2025-04-21T13:45[:00[.123]]`,
/// the same with a `Z` or `±HH:MM` suffix, a bracketed zone annotation such
/// as `2025-04-21T13:45:00+02:00[Europe/Paris]`, and basic `20250421`,
/// `20250421T134500` or `20250421T134500Z`.
#[must_use]
pub fn parse_timestamp(text: &str) -> Option<LooseDateTime> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    if text.ends_with(']') {
        return text.parse::<Zoned>().ok().map(LooseDateTime::Zoned);
    }

    let (civil, offset) = split_offset(text)?;
    let dt = parse_civil(civil)?;
    match offset {
        None => Some(LooseDateTime::Floating(dt)),
        Some(offset) => dt
            .to_zoned(TimeZone::fixed(offset))
            .ok()
            .map(LooseDateTime::Zoned),
    }
}

/// Attaches a zone to a floating timestamp.
///
/// Timestamps that already carry zone information, a missing zone and an
/// unresolvable identifier all leave the input unchanged. Wall-clock times
/// that fall in a transition gap or fold are resolved with the compatible
/// strategy (gaps move forward, folds take the earlier instant).
#[must_use]
pub fn apply_timezone(dt: LooseDateTime, zone: Option<&str>) -> LooseDateTime {
    let LooseDateTime::Floating(civil) = dt else {
        return dt;
    };
    let Some(zone) = zone else {
        return dt;
    };
    let Some(tz) = resolve_zone(zone) else {
        tracing::debug!(zone, "unknown time zone, keeping timestamp floating");
        return dt;
    };

    match civil.to_zoned(tz) {
        Ok(zoned) => LooseDateTime::Zoned(zoned),
        Err(err) => {
            tracing::warn!(zone, %err, "failed to apply time zone");
            dt
        }
    }
}

/// Returns a stable identifier for the zone of an aware timestamp.
///
/// Named zones yield their IANA key, UTC yields `UTC` and other fixed
/// offsets yield `±HH:MM`. Floating timestamps yield `None`.
#[must_use]
pub fn zone_of(dt: &LooseDateTime) -> Option<String> {
    let LooseDateTime::Zoned(zoned) = dt else {
        return None;
    };

    match zoned.time_zone().iana_name() {
        Some(name) => Some(name.to_string()),
        None => Some(format_offset(zoned.offset())),
    }
}

/// Resolves a zone identifier: an IANA key, `UTC`, `Z`, or a fixed offset
/// like `+02:00` (optionally prefixed by `UTC`).
#[must_use]
pub fn resolve_zone(id: &str) -> Option<TimeZone> {
    let id = id.trim();
    if id.is_empty() {
        return None;
    }
    if id.eq_ignore_ascii_case("Z") || id.eq_ignore_ascii_case("UTC") {
        return Some(TimeZone::UTC);
    }

    let offset_text = id
        .strip_prefix("UTC")
        .or_else(|| id.strip_prefix("GMT"))
        .unwrap_or(id);
    if offset_text.starts_with(['+', '-']) {
        return parse_offset(offset_text).map(TimeZone::fixed);
    }

    TimeZone::get(id).ok()
}

/// Canonical spelling of a zone identifier: the IANA key for named zones,
/// `UTC`, or `±HH:MM` for fixed offsets. Unknown identifiers are returned
/// as given.
#[must_use]
pub fn canonical_zone(id: &str) -> String {
    resolve_zone(id)
        .and_then(|tz| zone_of(&LooseDateTime::Zoned(Timestamp::UNIX_EPOCH.to_zoned(tz))))
        .unwrap_or_else(|| id.to_string())
}

fn is_utc_name(name: &str) -> bool {
    matches!(name, "UTC" | "Etc/UTC" | "Etc/Universal" | "Universal" | "Zulu" | "Etc/Zulu")
}

/// Splits a trailing `Z` or numeric offset off the time part.
///
/// Returns `None` when a suffix is present but unreadable.
fn split_offset(text: &str) -> Option<(&str, Option<Offset>)> {
    if let Some(civil) = text.strip_suffix(['Z', 'z']) {
        return Some((civil, Some(Offset::UTC)));
    }

    let Some(t) = text.find(['T', 't', ' ']) else {
        return Some((text, None));
    };
    match text[t..].find(['+', '-']) {
        Some(i) => {
            let (civil, offset) = text.split_at(t + i);
            Some((civil, Some(parse_offset(offset)?)))
        }
        None => Some((text, None)),
    }
}

/// Parses `±HH`, `±HHMM`, `±HH:MM` or `±HH:MM:SS`.
fn parse_offset(text: &str) -> Option<Offset> {
    let (sign, rest) = match text.split_at_checked(1)? {
        ("+", rest) => (1, rest),
        ("-", rest) => (-1, rest),
        _ => return None,
    };

    let digits: String = rest.chars().filter(|c| *c != ':').collect();
    if !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    let (hours, minutes, seconds) = match digits.len() {
        2 => (&digits[..2], "0", "0"),
        4 => (&digits[..2], &digits[2..4], "0"),
        6 => (&digits[..2], &digits[2..4], &digits[4..6]),
        _ => return None,
    };

    let hours: i32 = hours.parse().ok()?;
    let minutes: i32 = minutes.parse().ok()?;
    let seconds: i32 = seconds.parse().ok()?;
    if minutes >= 60 || seconds >= 60 {
        return None;
    }
    Offset::from_seconds(sign * (hours * 3600 + minutes * 60 + seconds)).ok()
}

fn parse_civil(text: &str) -> Option<DateTime> {
    let basic = !text.contains('-');
    if basic {
        return match text.len() {
            8 => Date::strptime(FORMAT_ICAL_DATE, text)
                .ok()
                .map(|d| d.to_datetime(Time::midnight())),
            _ => DateTime::strptime(FORMAT_ICAL_DATETIME, &text.to_ascii_uppercase()).ok(),
        };
    }

    if text.len() == 10 {
        return text
            .parse::<Date>()
            .ok()
            .map(|d| d.to_datetime(Time::midnight()));
    }
    text.replacen(' ', "T", 1).parse::<DateTime>().ok()
}

fn format_offset(offset: Offset) -> String {
    let secs = offset.seconds();
    if secs == 0 {
        return "UTC".to_string();
    }

    let sign = if secs < 0 { '-' } else { '+' };
    let secs = secs.unsigned_abs();
    let (hours, minutes, seconds) = (secs / 3600, secs / 60 % 60, secs % 60);
    if seconds == 0 {
        format!("{sign}{hours:02}:{minutes:02}")
    } else {
        format!("{sign}{hours:02}:{minutes:02}:{seconds:02}")
    }
}
