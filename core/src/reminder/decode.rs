// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

use std::fmt;

use crate::datetime::{LooseDateTime, apply_timezone, parse_timestamp, zone_of};
use crate::duration::{Duration, parse_duration};
use crate::error::ReminderError;
use crate::reminder::{ReminderMode, Relation};

/// The value of a `TRIGGER` property.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TriggerValue {
    /// A typed absolute timestamp.
    DateTime(LooseDateTime),
    /// A typed signed offset.
    Duration(Duration),
    /// Text that has not been, or could not be, typed.
    Text(String),
}

impl TriggerValue {
    /// Types raw trigger text: a timestamp if it reads as one, else a
    /// duration, else opaque text.
    #[must_use]
    pub fn classify(raw: &str) -> Self {
        if let Some(dt) = parse_timestamp(raw) {
            Self::DateTime(dt)
        } else if let Ok(d) = parse_duration(raw.trim()) {
            Self::Duration(d)
        } else {
            Self::Text(raw.to_string())
        }
    }

    fn as_datetime(&self) -> Option<LooseDateTime> {
        match self {
            Self::DateTime(dt) => Some(dt.clone()),
            Self::Duration(_) => None,
            Self::Text(s) => parse_timestamp(s),
        }
    }

    fn as_duration(&self) -> Option<Duration> {
        match self {
            Self::DateTime(_) => None,
            Self::Duration(d) => Some(*d),
            Self::Text(s) => parse_duration(s.trim()).ok(),
        }
    }

    fn is_blank(&self) -> bool {
        matches!(self, Self::Text(s) if s.trim().is_empty())
    }
}

impl fmt::Display for TriggerValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DateTime(dt) => dt.fmt(f),
            Self::Duration(d) => d.fmt(f),
            Self::Text(s) => f.write_str(s),
        }
    }
}

/// A `TRIGGER` property as found on an alarm.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawTrigger {
    /// The property value; `None` when the alarm has no trigger.
    pub value: Option<TriggerValue>,
    /// The `RELATED` parameter.
    pub related: Option<String>,
    /// The `TZID` parameter.
    pub tzid: Option<String>,
}

/// Edges of the event an alarm belongs to.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TriggerContext {
    /// `DTSTART`, if known.
    pub start: Option<LooseDateTime>,
    /// `DTEND`, if known.
    pub end: Option<LooseDateTime>,
    /// Zone of `DTSTART`.
    pub start_timezone: Option<String>,
    /// Zone of `DTEND`.
    pub end_timezone: Option<String>,
}

impl TriggerContext {
    fn edge(&self, relation: Relation) -> (Option<&LooseDateTime>, Option<&str>) {
        match relation {
            Relation::Start => (self.start.as_ref(), self.start_timezone.as_deref()),
            Relation::End => (self.end.as_ref(), self.end_timezone.as_deref()),
        }
    }
}

/// The reminder fields recovered from a trigger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedTrigger {
    /// Absolute or relative.
    pub mode: ReminderMode,
    /// ISO-8601 firing instant, when it can be computed.
    pub fire_time: Option<String>,
    /// Offset, for relative triggers.
    pub offset: Option<Duration>,
    /// Edge, for relative triggers.
    pub relation: Option<Relation>,
    /// Zone of the fire time.
    pub timezone: Option<String>,
}

/// Decodes a trigger into reminder fields.
///
/// A timestamp yields an absolute reminder in the trigger's `TZID` (or the
/// value's own zone). A duration yields a relative reminder whose fire time
/// is computed from the related event edge, when known. Anything else is
/// kept verbatim as the fire time of an absolute reminder.
///
/// # Errors
///
/// Returns [`ReminderError::TriggerUnreadable`] when the trigger is absent
/// or empty.
pub fn decode_trigger(
    trigger: &RawTrigger,
    ctx: &TriggerContext,
) -> Result<DecodedTrigger, ReminderError> {
    let value = trigger
        .value
        .as_ref()
        .filter(|v| !v.is_blank())
        .ok_or(ReminderError::TriggerUnreadable)?;
    let tzid = trigger.tzid.as_deref().filter(|s| !s.trim().is_empty());

    if let Some(dt) = value.as_datetime() {
        let timezone = tzid.map(ToString::to_string).or_else(|| zone_of(&dt));
        let dt = apply_timezone(dt, timezone.as_deref());
        return Ok(DecodedTrigger {
            mode: ReminderMode::Absolute,
            fire_time: Some(dt.to_string()),
            offset: None,
            relation: None,
            timezone,
        });
    }

    if let Some(offset) = value.as_duration() {
        let relation = Relation::from_param(trigger.related.as_deref());
        let (reference, timezone) = ctx.edge(relation);
        let fire_time = reference.and_then(|r| {
            let r = apply_timezone(r.clone(), timezone);
            match r.checked_add(offset.to_signed_duration()) {
                Ok(at) => Some(at.to_string()),
                Err(err) => {
                    tracing::warn!(%offset, %err, "reminder fire time out of range");
                    None
                }
            }
        });
        return Ok(DecodedTrigger {
            mode: ReminderMode::Relative,
            fire_time,
            offset: Some(offset),
            relation: Some(relation),
            timezone: timezone.map(ToString::to_string),
        });
    }

    tracing::debug!(%value, "keeping unreadable trigger verbatim");
    Ok(DecodedTrigger {
        mode: ReminderMode::Absolute,
        fire_time: Some(value.to_string()),
        offset: None,
        relation: None,
        timezone: tzid.map(ToString::to_string),
    })
}
