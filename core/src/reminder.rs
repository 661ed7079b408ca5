// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

//! Alarm reminders in their JSON shape, and conversion to and from
//! iCalendar `TRIGGER` values.

mod decode;
mod encode;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

pub use crate::reminder::decode::{
    DecodedTrigger, RawTrigger, TriggerContext, TriggerValue, decode_trigger,
};
pub use crate::reminder::encode::{EncodedTrigger, encode_trigger};

use crate::duration::Duration;
use crate::error::ReminderError;

/// The kind of alarm (`ACTION` in iCalendar).
///
/// Unknown actions are kept verbatim so they survive a round trip.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum AlarmAction {
    /// Show a message.
    #[default]
    Display,
    /// Send an email.
    Email,
    /// Play a sound.
    Audio,
    /// Run a procedure (deprecated in RFC 5545).
    Procedure,
    /// Any other action, such as an `X-` name.
    Other(String),
}

impl AlarmAction {
    /// The iCalendar spelling of the action.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Display => "DISPLAY",
            Self::Email => "EMAIL",
            Self::Audio => "AUDIO",
            Self::Procedure => "PROCEDURE",
            Self::Other(s) => s,
        }
    }
}

impl From<String> for AlarmAction {
    fn from(s: String) -> Self {
        match s.to_ascii_uppercase().as_str() {
            "DISPLAY" => Self::Display,
            "EMAIL" => Self::Email,
            "AUDIO" => Self::Audio,
            "PROCEDURE" => Self::Procedure,
            _ => Self::Other(s),
        }
    }
}

impl From<AlarmAction> for String {
    fn from(action: AlarmAction) -> Self {
        match action {
            AlarmAction::Other(s) => s,
            known => known.as_str().to_string(),
        }
    }
}

impl FromStr for AlarmAction {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from(s.to_string()))
    }
}

impl fmt::Display for AlarmAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a reminder's firing instant is specified.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReminderMode {
    /// A fixed instant.
    Absolute,
    /// An offset from the event start or end.
    Relative,
}

/// The event edge a relative reminder is measured from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Relation {
    /// Measured from `DTSTART`.
    #[default]
    Start,
    /// Measured from `DTEND`.
    End,
}

impl Relation {
    /// Reads a `RELATED` parameter; anything but `END` means `START`.
    #[must_use]
    pub fn from_param(param: Option<&str>) -> Self {
        match param {
            Some(p) if p.trim().eq_ignore_ascii_case("END") => Self::End,
            _ => Self::Start,
        }
    }

    /// The iCalendar spelling of the relation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Start => "START",
            Self::End => "END",
        }
    }
}

impl fmt::Display for Relation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A reminder attached to an event.
///
/// When deserializing, the legacy shape with a single `trigger` field is
/// accepted, and a missing `mode` is inferred from the fields present.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "ReminderInput")]
pub struct Reminder {
    /// Alarm action.
    #[serde(rename = "type")]
    pub kind: AlarmAction,

    /// Absolute or relative.
    pub mode: ReminderMode,

    /// Offset from the related edge, for relative reminders.
    pub offset: Option<Duration>,

    /// Edge the offset is measured from, for relative reminders.
    pub relation: Option<Relation>,

    /// Firing instant as ISO-8601 text; computed for relative reminders
    /// when the event edge is known.
    pub fire_time: Option<String>,

    /// Zone the fire time is expressed in.
    pub timezone: Option<String>,

    /// Text shown when the alarm fires.
    pub description: Option<String>,
}

impl Reminder {
    /// Creates a relative reminder measured from the given edge.
    #[must_use]
    pub fn relative(kind: AlarmAction, offset: Duration, relation: Relation) -> Self {
        Self {
            kind,
            mode: ReminderMode::Relative,
            offset: Some(offset),
            relation: Some(relation),
            fire_time: None,
            timezone: None,
            description: None,
        }
    }

    /// Creates an absolute reminder.
    #[must_use]
    pub fn absolute(kind: AlarmAction, fire_time: String, timezone: Option<String>) -> Self {
        Self {
            kind,
            mode: ReminderMode::Absolute,
            offset: None,
            relation: None,
            fire_time: Some(fire_time),
            timezone,
            description: None,
        }
    }

    /// Builds a reminder from a decoded trigger.
    #[must_use]
    pub fn from_decoded(
        kind: AlarmAction,
        decoded: DecodedTrigger,
        description: Option<String>,
    ) -> Self {
        Self {
            kind,
            mode: decoded.mode,
            offset: decoded.offset,
            relation: decoded.relation,
            fire_time: decoded.fire_time,
            timezone: decoded.timezone,
            description,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ReminderInput {
    #[serde(rename = "type")]
    kind: AlarmAction,
    #[serde(default)]
    mode: Option<ReminderMode>,
    #[serde(default)]
    offset: Option<String>,
    #[serde(default)]
    relation: Option<String>,
    #[serde(default)]
    fire_time: Option<String>,
    #[serde(default)]
    timezone: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    trigger: Option<String>,
}

impl TryFrom<ReminderInput> for Reminder {
    type Error = ReminderError;

    fn try_from(input: ReminderInput) -> Result<Self, Self::Error> {
        let offset = non_empty(input.offset);
        let fire_time = non_empty(input.fire_time);
        let trigger = non_empty(input.trigger);

        let mode = match input.mode {
            Some(mode) => mode,
            None if offset.is_some() => ReminderMode::Relative,
            None if fire_time.is_some() || trigger.is_some() => ReminderMode::Absolute,
            None => return Err(ReminderError::MissingTiming),
        };

        let reminder = match mode {
            ReminderMode::Absolute => Self {
                kind: input.kind,
                mode,
                offset: None,
                relation: None,
                fire_time: fire_time.or(trigger),
                timezone: input.timezone,
                description: input.description,
            },
            ReminderMode::Relative => {
                let offset = offset.or(trigger).map(|s| s.parse()).transpose()?;
                Self {
                    kind: input.kind,
                    mode,
                    offset,
                    relation: Some(Relation::from_param(input.relation.as_deref())),
                    fire_time,
                    timezone: input.timezone,
                    description: input.description,
                }
            }
        };
        Ok(reminder)
    }
}

fn non_empty(s: Option<String>) -> Option<String> {
    s.filter(|s| !s.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn from_json(value: serde_json::Value) -> Result<Reminder, serde_json::Error> {
        serde_json::from_value(value)
    }

    #[test]
    fn infers_relative_mode_from_offset() {
        let r = from_json(json!({ "type": "DISPLAY", "offset": "-PT15M" })).unwrap();
        assert_eq!(r.mode, ReminderMode::Relative);
        assert_eq!(r.offset, Some(Duration::from_minutes(-15)));
        assert_eq!(r.relation, Some(Relation::Start));
    }

    #[test]
    fn infers_absolute_mode_from_fire_time() {
        let r = from_json(json!({
            "type": "EMAIL",
            "fire_time": "2025-04-21T13:45:00",
            "timezone": "Europe/Paris",
        }))
        .unwrap();
        assert_eq!(r.mode, ReminderMode::Absolute);
        assert_eq!(r.kind, AlarmAction::Email);
        assert_eq!(r.fire_time.as_deref(), Some("2025-04-21T13:45:00"));
        assert_eq!(r.offset, None);
        assert_eq!(r.relation, None);
    }

    #[test]
    fn normalizes_legacy_trigger() {
        let r = from_json(json!({ "type": "DISPLAY", "trigger": "2025-04-21T13:45:00" })).unwrap();
        assert_eq!(r.mode, ReminderMode::Absolute);
        assert_eq!(r.fire_time.as_deref(), Some("2025-04-21T13:45:00"));

        let r = from_json(json!({
            "type": "DISPLAY",
            "mode": "relative",
            "trigger": "-PT1H",
            "relation": "end",
        }))
        .unwrap();
        assert_eq!(r.offset, Some(Duration::from_secs(-3600)));
        assert_eq!(r.relation, Some(Relation::End));
    }

    #[test]
    fn absolute_mode_drops_relative_fields() {
        let r = from_json(json!({
            "type": "DISPLAY",
            "mode": "absolute",
            "fire_time": "2025-04-21T13:45:00",
            "offset": "-PT10M",
            "relation": "END",
        }))
        .unwrap();
        assert_eq!(r.offset, None);
        assert_eq!(r.relation, None);
    }

    #[test]
    fn rejects_bad_input() {
        assert!(from_json(json!({ "type": "DISPLAY" })).is_err());
        assert!(from_json(json!({ "type": "DISPLAY", "offset": "-P1W" })).is_err());
        assert!(from_json(json!({ "offset": "-PT10M" })).is_err());
    }

    #[test]
    fn keeps_unknown_actions() {
        let r = from_json(json!({ "type": "X-SPEAK", "offset": "PT0S" })).unwrap();
        assert_eq!(r.kind, AlarmAction::Other("X-SPEAK".to_string()));

        let value = serde_json::to_value(&r).unwrap();
        assert_eq!(value["type"], "X-SPEAK");
        assert_eq!(value["mode"], "relative");
        assert_eq!(value["offset"], "PT0S");
        assert_eq!(value["relation"], "START");
        assert_eq!(value["fire_time"], serde_json::Value::Null);
    }

    #[test]
    fn reads_relation_parameter() {
        assert_eq!(Relation::from_param(Some("END")), Relation::End);
        assert_eq!(Relation::from_param(Some("end")), Relation::End);
        assert_eq!(Relation::from_param(Some("START")), Relation::Start);
        assert_eq!(Relation::from_param(Some("MIDDLE")), Relation::Start);
        assert_eq!(Relation::from_param(None), Relation::Start);
    }
}
