// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

use std::error::Error;

use clap::{ArgMatches, Command, arg};
use davgate_core::{
    AlarmAction, EncodedTrigger, RawTrigger, Reminder, TriggerContext, TriggerValue,
    decode_trigger, encode_trigger, parse_timestamp,
};

use crate::arg::ResourceArgs;
use crate::util::{PayloadSource, print_json};

/// Decodes a raw `TRIGGER` value into reminder JSON.
#[derive(Debug, Clone)]
pub struct CmdReminderDecode {
    pub value: String,
    pub action: AlarmAction,
    pub related: Option<String>,
    pub tzid: Option<String>,
    pub start: Option<String>,
    pub end: Option<String>,
    pub start_timezone: Option<String>,
    pub end_timezone: Option<String>,
}

impl CmdReminderDecode {
    pub const NAME: &str = "decode";

    pub fn command() -> Command {
        Command::new(Self::NAME)
            .about("Decode a TRIGGER value into reminder JSON")
            .arg(
                arg!(value: <VALUE> "The TRIGGER value, a duration or a date-time")
                    .allow_hyphen_values(true),
            )
            .arg(arg!(--action <ACTION> "The alarm action").default_value("DISPLAY"))
            .arg(arg!(--related <RELATED> "The RELATED parameter, START or END"))
            .arg(arg!(--tzid <TZID> "The TZID parameter"))
            .arg(arg!(--start <START> "Start of the event, for relative triggers"))
            .arg(arg!(--end <END> "End of the event, for relative triggers"))
            .arg(arg!(--"start-tz" <ZONE> "Zone the start is expressed in"))
            .arg(arg!(--"end-tz" <ZONE> "Zone the end is expressed in"))
    }

    pub fn from(matches: &ArgMatches) -> Result<Self, Box<dyn Error>> {
        let get = |id: &str| matches.get_one::<String>(id).cloned();
        Ok(Self {
            value: get("value").ok_or("trigger value is required")?,
            action: get("action").map(AlarmAction::from).unwrap_or_default(),
            related: get("related"),
            tzid: get("tzid"),
            start: get("start"),
            end: get("end"),
            start_timezone: get("start-tz"),
            end_timezone: get("end-tz"),
        })
    }

    pub fn run(self) -> Result<(), Box<dyn Error>> {
        tracing::debug!(?self, "decoding trigger...");
        print_json(&self.decode()?)
    }

    pub fn decode(self) -> Result<Reminder, Box<dyn Error>> {
        let edge = |value: Option<&str>| match value {
            Some(text) => parse_timestamp(text)
                .map(Some)
                .ok_or_else(|| format!("Invalid date-time: {text}")),
            None => Ok(None),
        };

        let ctx = TriggerContext {
            start: edge(self.start.as_deref())?,
            end: edge(self.end.as_deref())?,
            start_timezone: self.start_timezone,
            end_timezone: self.end_timezone,
        };
        let raw = RawTrigger {
            value: Some(TriggerValue::classify(&self.value)),
            related: self.related,
            tzid: self.tzid,
        };

        let decoded = decode_trigger(&raw, &ctx)?;
        Ok(Reminder::from_decoded(self.action, decoded, None))
    }
}

/// Encodes reminder JSON into the `TRIGGER` property of an alarm.
#[derive(Debug, Clone)]
pub struct CmdReminderEncode {
    pub data: PayloadSource,
}

impl CmdReminderEncode {
    pub const NAME: &str = "encode";

    pub fn command() -> Command {
        Command::new(Self::NAME)
            .about("Encode reminder JSON into a TRIGGER property")
            .args(ResourceArgs::REMINDER.data())
    }

    pub fn from(matches: &ArgMatches) -> Self {
        Self {
            data: ResourceArgs::get_data(matches),
        }
    }

    pub async fn run(self) -> Result<(), Box<dyn Error>> {
        tracing::debug!(?self, "encoding reminder...");
        let reminder: Reminder = self.data.read().await?;
        let trigger = encode_trigger(&reminder)?;
        print_json(&trigger_json(trigger))
    }
}

fn trigger_json(trigger: EncodedTrigger) -> serde_json::Value {
    match trigger.value {
        TriggerValue::DateTime(dt) => {
            let ical = dt.to_ical();
            serde_json::json!({
                "value": ical.value,
                "value_type": "DATE-TIME",
                "tzid": ical.tzid,
                "timezone": trigger.timezone,
            })
        }
        value => serde_json::json!({
            "value": value.to_string(),
            "value_type": "DURATION",
            "related": trigger.related.map(|r| r.as_str()),
        }),
    }
}

#[cfg(test)]
mod tests {
    use davgate_core::{Duration, ReminderMode, Relation};

    use super::*;

    fn parse(args: &[&str]) -> CmdReminderDecode {
        let matches = Command::new("test")
            .subcommand(CmdReminderDecode::command())
            .try_get_matches_from(args)
            .unwrap();
        CmdReminderDecode::from(matches.subcommand_matches("decode").unwrap()).unwrap()
    }

    #[test]
    fn test_decode_relative_trigger() {
        let cmd = parse(&[
            "test",
            "decode",
            "-PT10M",
            "--start",
            "2025-04-21T14:00:00",
            "--start-tz",
            "Europe/Paris",
        ]);
        assert_eq!(cmd.value, "-PT10M");
        assert_eq!(cmd.action, AlarmAction::Display);

        let reminder = cmd.decode().unwrap();
        assert_eq!(reminder.mode, ReminderMode::Relative);
        assert_eq!(reminder.offset, Some(Duration::from_minutes(-10)));
        assert_eq!(reminder.relation, Some(Relation::Start));
        assert_eq!(
            reminder.fire_time.as_deref(),
            Some("2025-04-21T13:50:00+02:00")
        );
    }

    #[test]
    fn test_decode_absolute_trigger() {
        let cmd = parse(&[
            "test",
            "decode",
            "20250421T134500",
            "--tzid",
            "Europe/Paris",
            "--action",
            "email",
        ]);
        let reminder = cmd.decode().unwrap();
        assert_eq!(reminder.kind, AlarmAction::Email);
        assert_eq!(reminder.mode, ReminderMode::Absolute);
        assert_eq!(reminder.timezone.as_deref(), Some("Europe/Paris"));
        assert_eq!(
            reminder.fire_time.as_deref(),
            Some("2025-04-21T13:45:00+02:00")
        );
    }

    #[test]
    fn test_decode_rejects_bad_edge() {
        let cmd = parse(&["test", "decode", "PT0S", "--end", "soon"]);
        assert!(cmd.decode().is_err());
    }

    #[test]
    fn test_encode_json_shapes() {
        let relative = Reminder::relative(
            AlarmAction::Display,
            Duration::from_minutes(-15),
            Relation::End,
        );
        let json = trigger_json(encode_trigger(&relative).unwrap());
        assert_eq!(json["value"], "-PT15M");
        assert_eq!(json["related"], "END");

        let absolute = Reminder::absolute(
            AlarmAction::Display,
            "2025-04-21T13:45:00".to_string(),
            Some("Europe/Paris".to_string()),
        );
        let json = trigger_json(encode_trigger(&absolute).unwrap());
        assert_eq!(json["value"], "20250421T134500");
        assert_eq!(json["tzid"], "Europe/Paris");
    }
}
