// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

use davgate_dav::{CollectionKind, ETag, Href};
use ical::generator::Emitter;
use ical::parser::ical::component::{IcalAlarm, IcalCalendar, IcalEvent};
use ical::property::Property;
use jiff::Timestamp;
use jiff::civil::Date;
use serde::{Deserialize, Serialize};

use crate::datetime::{
    IcalDateTime, LooseDateTime, apply_timezone, canonical_zone, parse_timestamp, zone_of,
};
use crate::error::CodecError;
use crate::property;
use crate::reminder::{
    AlarmAction, EncodedTrigger, RawTrigger, Relation, Reminder, TriggerContext, TriggerValue,
    decode_trigger, encode_trigger,
};
use crate::store::Resource;

const PRODID: &str = concat!("-//davgate//davgate-core ", env!("CARGO_PKG_VERSION"), "//EN");

/// A calendar event, stored as a `VEVENT` inside a `VCALENDAR`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    /// Unique identifier.
    #[serde(default)]
    pub uid: String,

    /// Title.
    pub summary: String,

    /// Longer description.
    #[serde(default)]
    pub description: Option<String>,

    /// Where the event takes place.
    #[serde(default)]
    pub location: Option<String>,

    /// Where the event is stored on the server.
    #[serde(default)]
    pub url: Option<String>,

    /// Start as ISO-8601 local time (`YYYY-MM-DDTHH:MM:SS`), or a date for
    /// all-day events.
    pub start: String,

    /// End, in the same shape as `start`.
    #[serde(default)]
    pub end: Option<String>,

    /// Whether `start` and `end` are dates.
    #[serde(default)]
    pub all_day: bool,

    /// Creation time.
    #[serde(default)]
    pub created: Option<String>,

    /// Last modification time.
    #[serde(default)]
    pub last_modified: Option<String>,

    /// `CONFIRMED`, `TENTATIVE` or `CANCELLED`.
    #[serde(default)]
    pub status: Option<String>,

    /// Organizer email.
    #[serde(default)]
    pub organizer: Option<String>,

    /// Category names.
    #[serde(default)]
    pub categories: Vec<String>,

    /// Participants.
    #[serde(default)]
    pub attendees: Vec<Attendee>,

    /// Alarms.
    #[serde(default)]
    pub reminders: Vec<Reminder>,

    /// Recurrence rule (`RRULE` value).
    #[serde(default)]
    pub recurrence: Option<String>,

    /// Original start of an overridden occurrence.
    #[serde(default)]
    pub recurrence_id: Option<String>,

    /// Zone `start` is expressed in.
    #[serde(default)]
    pub start_timezone: Option<String>,

    /// Zone `end` is expressed in.
    #[serde(default)]
    pub end_timezone: Option<String>,

    /// Version tag the event was read at.
    #[serde(default)]
    pub etag: Option<ETag>,
}

/// A participant of an event.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attendee {
    /// Email address.
    pub email: String,
    /// Display name (`CN`).
    #[serde(default)]
    pub name: Option<String>,
    /// Role such as `REQ-PARTICIPANT` or `CHAIR`.
    #[serde(default)]
    pub role: Option<String>,
    /// Participation status such as `ACCEPTED`.
    #[serde(default)]
    pub status: Option<String>,
    /// Calendar user type such as `INDIVIDUAL`.
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
}

impl Event {
    /// Serializes to an iCalendar object.
    ///
    /// Reminders without a description get `Reminder for: <summary>`.
    ///
    /// # Errors
    ///
    /// Returns an error if a time field is not a timestamp or a reminder
    /// cannot be encoded.
    pub fn to_ical(&self) -> Result<String, CodecError> {
        let mut ev = IcalEvent::new();
        let props = &mut ev.properties;
        props.push(property::text("UID", &self.uid));
        props.push(property::raw(
            "DTSTAMP",
            Timestamp::now().strftime("%Y%m%dT%H%M%SZ").to_string(),
        ));
        props.push(property::text("SUMMARY", &self.summary));
        for (name, value) in [("DESCRIPTION", &self.description), ("LOCATION", &self.location)] {
            if let Some(value) = value.as_deref().filter(|v| !v.is_empty()) {
                props.push(property::text(name, value));
            }
        }

        props.push(self.time_prop("DTSTART", "start", &self.start, self.start_timezone.as_deref())?);
        if let Some(end) = &self.end {
            props.push(self.time_prop("DTEND", "end", end, self.end_timezone.as_deref())?);
        }
        for (name, value) in [("CREATED", &self.created), ("LAST-MODIFIED", &self.last_modified)] {
            if let Some(value) = value {
                match parse_timestamp(value) {
                    Some(dt) => props.push(ical_prop(name, dt.to_ical())),
                    None => tracing::warn!(name, %value, "skipping unreadable timestamp"),
                }
            }
        }

        if let Some(status) = self.status.as_deref().filter(|s| !s.is_empty()) {
            props.push(property::text("STATUS", status));
        }
        if let Some(organizer) = &self.organizer {
            props.push(property::raw("ORGANIZER", mailto(organizer)));
        }
        props.extend(property::text_list("CATEGORIES", &self.categories));
        props.extend(self.attendees.iter().map(attendee_prop));
        if let Some(rule) = &self.recurrence {
            props.push(property::raw("RRULE", rule.as_str()));
        }
        if let Some(id) = &self.recurrence_id {
            props.push(self.time_prop(
                "RECURRENCE-ID",
                "recurrence_id",
                id,
                self.start_timezone.as_deref(),
            )?);
        }

        for reminder in &self.reminders {
            let mut alarm = IcalAlarm::new();
            let description = match &reminder.description {
                Some(d) => d.clone(),
                None => format!("Reminder for: {}", self.summary),
            };
            alarm.properties.extend([
                property::raw("ACTION", reminder.kind.as_str()),
                trigger_prop(encode_trigger(reminder)?),
                property::text("DESCRIPTION", &description),
            ]);
            ev.alarms.push(alarm);
        }

        let mut cal = IcalCalendar::new();
        cal.properties.push(property::raw("VERSION", "2.0"));
        cal.properties.push(property::raw("PRODID", PRODID));
        cal.events.push(ev);
        Ok(cal.generate())
    }

    /// Parses the first `VEVENT` of an iCalendar object.
    ///
    /// # Errors
    ///
    /// Returns an error if the body is malformed, has no `VEVENT` or
    /// `DTSTART`, or an alarm trigger is missing.
    pub fn from_ical(data: &str) -> Result<Self, CodecError> {
        let cal = property::parse_calendar(data)?;
        let ev = cal
            .events
            .first()
            .ok_or(CodecError::MissingComponent("VEVENT"))?;
        let props = ev.properties.as_slice();

        let start = property::find(props, "DTSTART")
            .ok_or(CodecError::MissingProperty("DTSTART"))
            .and_then(|p| read_time("DTSTART", p))?;
        let end = property::find(props, "DTEND")
            .map(|p| read_time("DTEND", p))
            .transpose()?;

        let ctx = TriggerContext {
            start: Some(start.at.clone()),
            end: end.as_ref().map(|e| e.at.clone()),
            start_timezone: start.timezone.clone(),
            end_timezone: end.as_ref().and_then(|e| e.timezone.clone()),
        };
        let reminders = ev
            .alarms
            .iter()
            .map(|alarm| read_alarm(alarm, &ctx))
            .collect::<Result<Vec<_>, _>>()?;

        let attendees = property::find_all(props, "ATTENDEE")
            .map(|p| {
                let param = |name: &str| property::param(p, name).map(ToString::to_string);
                Attendee {
                    email: strip_mailto(property::value(p)).to_string(),
                    name: param("CN"),
                    role: param("ROLE"),
                    status: param("PARTSTAT"),
                    kind: param("CUTYPE"),
                }
            })
            .collect();

        let categories = property::find_all(props, "CATEGORIES")
            .flat_map(|p| property::split_text(property::value(p), ','))
            .filter(|c| !c.is_empty())
            .collect();

        let recurrence_id = property::find(props, "RECURRENCE-ID")
            .map(|p| read_time("RECURRENCE-ID", p))
            .transpose()?
            .map(|t| t.text);
        let stamp = |name: &str| property::find(props, name).map(|p| read_stamp(property::value(p)));

        Ok(Self {
            uid: property::find_text(props, "UID").unwrap_or_default(),
            summary: property::find_text(props, "SUMMARY").unwrap_or_default(),
            description: property::find_text(props, "DESCRIPTION"),
            location: property::find_text(props, "LOCATION"),
            url: None,
            all_day: start.all_day,
            start: start.text,
            end: end.as_ref().map(|e| e.text.clone()),
            created: stamp("CREATED"),
            last_modified: stamp("LAST-MODIFIED"),
            status: property::find_text(props, "STATUS"),
            organizer: property::find(props, "ORGANIZER")
                .map(|p| strip_mailto(property::value(p)).to_string()),
            categories,
            attendees,
            reminders,
            recurrence: property::find(props, "RRULE").map(|p| property::value(p).to_string()),
            recurrence_id,
            start_timezone: start.timezone,
            end_timezone: end.and_then(|e| e.timezone),
            etag: None,
        })
    }

    fn time_prop(
        &self,
        name: &str,
        field: &'static str,
        value: &str,
        timezone: Option<&str>,
    ) -> Result<Property, CodecError> {
        let invalid = || CodecError::InvalidField {
            field,
            value: value.to_string(),
        };

        if self.all_day {
            let date: Date = value.get(..10).and_then(|d| d.parse().ok()).ok_or_else(invalid)?;
            let prop = property::raw(name, date.strftime("%Y%m%d").to_string());
            return Ok(property::with_param(prop, "VALUE", "DATE"));
        }

        let dt = parse_timestamp(value).ok_or_else(invalid)?;
        let dt = apply_timezone(dt, timezone);
        Ok(ical_prop(name, dt.to_ical_in(timezone)))
    }
}

impl Resource for Event {
    const KIND: CollectionKind = CollectionKind::Calendar;
    const NAME: &'static str = "event";

    fn uid(&self) -> &str {
        &self.uid
    }

    fn set_uid(&mut self, uid: String) {
        self.uid = uid;
    }

    fn etag(&self) -> Option<&ETag> {
        self.etag.as_ref()
    }

    fn set_etag(&mut self, etag: Option<ETag>) {
        self.etag = etag;
    }

    fn set_href(&mut self, href: &Href) {
        self.url = Some(href.to_string());
    }

    fn to_dav(&self) -> Result<String, CodecError> {
        self.to_ical()
    }

    fn from_dav(data: &str) -> Result<Self, CodecError> {
        Self::from_ical(data)
    }
}

/// A `DTSTART`-like property read back into payload fields.
struct ReadTime {
    text: String,
    all_day: bool,
    timezone: Option<String>,
    at: LooseDateTime,
}

fn read_time(field: &'static str, prop: &Property) -> Result<ReadTime, CodecError> {
    let value = property::value(prop).trim();
    let invalid = || CodecError::InvalidField {
        field,
        value: value.to_string(),
    };

    let is_date = property::param(prop, "VALUE").is_some_and(|v| v.eq_ignore_ascii_case("DATE"))
        || (value.len() == 8 && value.chars().all(|c| c.is_ascii_digit()));
    if is_date {
        let date = Date::strptime("%Y%m%d", value).map_err(|_| invalid())?;
        return Ok(ReadTime {
            text: date.to_string(),
            all_day: true,
            timezone: None,
            at: LooseDateTime::Floating(date.to_datetime(jiff::civil::Time::midnight())),
        });
    }

    let dt = parse_timestamp(value).ok_or_else(invalid)?;
    let timezone = tzid(prop).or_else(|| zone_of(&dt));
    Ok(ReadTime {
        text: LooseDateTime::Floating(dt.civil()).to_string(),
        all_day: false,
        at: apply_timezone(dt, timezone.as_deref()),
        timezone,
    })
}

fn read_alarm(alarm: &IcalAlarm, ctx: &TriggerContext) -> Result<Reminder, CodecError> {
    let props = alarm.properties.as_slice();
    let trigger = property::find(props, "TRIGGER")
        .map(|p| RawTrigger {
            value: p.value.as_deref().map(TriggerValue::classify),
            related: property::param(p, "RELATED").map(ToString::to_string),
            tzid: tzid(p),
        })
        .unwrap_or_default();
    let decoded = decode_trigger(&trigger, ctx)?;

    let kind = property::find(props, "ACTION")
        .map_or(AlarmAction::Display, |p| AlarmAction::from(property::value(p).to_string()));
    Ok(Reminder::from_decoded(kind, decoded, property::find_text(props, "DESCRIPTION")))
}

fn tzid(prop: &Property) -> Option<String> {
    property::param(prop, "TZID")
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(canonical_zone)
}

fn read_stamp(value: &str) -> String {
    parse_timestamp(value).map_or_else(|| value.to_string(), |dt| dt.to_string())
}

fn ical_prop(name: &str, value: IcalDateTime) -> Property {
    let prop = property::raw(name, value.value);
    match value.tzid {
        Some(tzid) => property::with_param(prop, "TZID", tzid),
        None => prop,
    }
}

/// Absolute triggers are written in the zone the reminder resolved to, so
/// reading them back reports that zone rather than UTC.
fn trigger_prop(trigger: EncodedTrigger) -> Property {
    match trigger.value {
        TriggerValue::Duration(offset) => {
            let prop = property::raw("TRIGGER", offset.to_string());
            match trigger.related {
                Some(Relation::End) => property::with_param(prop, "RELATED", "END"),
                _ => prop,
            }
        }
        TriggerValue::DateTime(dt) => {
            let prop = ical_prop("TRIGGER", dt.to_ical_in(trigger.timezone.as_deref()));
            property::with_param(prop, "VALUE", "DATE-TIME")
        }
        TriggerValue::Text(text) => {
            let prop = property::raw("TRIGGER", text);
            match trigger.timezone {
                Some(tz) => property::with_param(prop, "TZID", tz),
                None => prop,
            }
        }
    }
}

fn attendee_prop(a: &Attendee) -> Property {
    let mut prop = property::raw("ATTENDEE", mailto(&a.email));
    for (param, value) in [
        ("CN", &a.name),
        ("ROLE", &a.role),
        ("PARTSTAT", &a.status),
        ("CUTYPE", &a.kind),
    ] {
        if let Some(value) = value {
            prop = property::with_param(prop, param, value.as_str());
        }
    }
    prop
}

fn mailto(email: &str) -> String {
    format!("mailto:{}", strip_mailto(email))
}

fn strip_mailto(value: &str) -> &str {
    match value.get(..7) {
        Some(prefix) if prefix.eq_ignore_ascii_case("mailto:") => &value[7..],
        _ => value,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::duration::Duration;
    use crate::reminder::ReminderMode;

    fn meeting() -> Event {
        Event {
            uid: "e-1".to_string(),
            summary: "Team Meeting".to_string(),
            location: Some("Room A, 2nd floor".to_string()),
            start: "2025-04-21T14:00:00".to_string(),
            end: Some("2025-04-21T15:00:00".to_string()),
            start_timezone: Some("Europe/Paris".to_string()),
            end_timezone: Some("Europe/Paris".to_string()),
            organizer: Some("boss@example.com".to_string()),
            categories: vec!["MEETING".to_string(), "WORK".to_string()],
            attendees: vec![Attendee {
                email: "john@example.com".to_string(),
                name: Some("John Doe".to_string()),
                role: Some("REQ-PARTICIPANT".to_string()),
                status: Some("ACCEPTED".to_string()),
                kind: Some("INDIVIDUAL".to_string()),
            }],
            reminders: vec![Reminder::relative(
                AlarmAction::Display,
                Duration::from_minutes(-10),
                Relation::Start,
            )],
            recurrence: Some("FREQ=WEEKLY;BYDAY=MO".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn writes_vevent_with_alarm() {
        let text = meeting().to_ical().unwrap();
        assert!(text.starts_with("BEGIN:VCALENDAR"));
        assert!(text.contains("DTSTART;TZID=Europe/Paris:20250421T140000"));
        assert!(text.contains("DTEND;TZID=Europe/Paris:20250421T150000"));
        assert!(text.contains("LOCATION:Room A\\, 2nd floor"));
        assert!(text.contains("ORGANIZER:mailto:boss@example.com"));
        assert!(text.contains("RRULE:FREQ=WEEKLY;BYDAY=MO"));
        assert!(text.contains("BEGIN:VALARM"));
        assert!(text.contains("ACTION:DISPLAY"));
        assert!(text.contains("TRIGGER:-PT10M"));
        assert!(text.contains("DESCRIPTION:Reminder for: Team Meeting"));
    }

    #[test]
    fn reads_back_relative_reminder_with_fire_time() {
        let event = Event::from_ical(&meeting().to_ical().unwrap()).unwrap();
        assert_eq!(event.start, "2025-04-21T14:00:00");
        assert_eq!(event.start_timezone.as_deref(), Some("Europe/Paris"));
        assert_eq!(event.location.as_deref(), Some("Room A, 2nd floor"));
        assert_eq!(event.categories, vec!["MEETING", "WORK"]);
        assert_eq!(event.attendees, meeting().attendees);
        assert_eq!(event.recurrence.as_deref(), Some("FREQ=WEEKLY;BYDAY=MO"));

        let r = &event.reminders[0];
        assert_eq!(r.mode, ReminderMode::Relative);
        assert_eq!(r.offset, Some(Duration::from_minutes(-10)));
        assert_eq!(r.relation, Some(Relation::Start));
        assert_eq!(r.fire_time.as_deref(), Some("2025-04-21T13:50:00+02:00"));
        assert_eq!(r.description.as_deref(), Some("Reminder for: Team Meeting"));
    }

    fn round_trip_absolute(fire_time: &str, timezone: Option<&str>) -> Reminder {
        let mut event = meeting();
        event.reminders = vec![Reminder::absolute(
            AlarmAction::Email,
            fire_time.to_string(),
            timezone.map(ToString::to_string),
        )];
        let back = Event::from_ical(&event.to_ical().unwrap()).unwrap();
        back.reminders.into_iter().next().unwrap()
    }

    #[test]
    fn absolute_reminder_keeps_its_zone() {
        let mut event = meeting();
        event.reminders = vec![Reminder::absolute(
            AlarmAction::Email,
            "2025-04-21T13:45:00".to_string(),
            Some("Europe/Paris".to_string()),
        )];
        let text = event.to_ical().unwrap();
        assert!(text.contains("TRIGGER;TZID=Europe/Paris;VALUE=DATE-TIME:20250421T134500"));

        let r = round_trip_absolute("2025-04-21T13:45:00", Some("Europe/Paris"));
        assert_eq!(r.kind, AlarmAction::Email);
        assert_eq!(r.mode, ReminderMode::Absolute);
        assert_eq!(r.fire_time.as_deref(), Some("2025-04-21T13:45:00+02:00"));
        assert_eq!(r.timezone.as_deref(), Some("Europe/Paris"));
    }

    #[test]
    fn utc_fire_time_is_written_in_the_reminder_zone() {
        let r = round_trip_absolute("2025-04-21T11:45:00Z", Some("Europe/Paris"));
        assert_eq!(r.mode, ReminderMode::Absolute);
        assert_eq!(r.fire_time.as_deref(), Some("2025-04-21T13:45:00+02:00"));
        assert_eq!(r.timezone.as_deref(), Some("Europe/Paris"));
    }

    #[test]
    fn fixed_offset_fire_time_keeps_its_offset() {
        let mut event = meeting();
        event.reminders = vec![Reminder::absolute(
            AlarmAction::Display,
            "2025-04-21T13:45:00+02:00".to_string(),
            None,
        )];
        let text = event.to_ical().unwrap();
        assert!(text.contains("TRIGGER;TZID=+0200;VALUE=DATE-TIME:20250421T134500"));

        let r = round_trip_absolute("2025-04-21T13:45:00+02:00", None);
        assert_eq!(r.fire_time.as_deref(), Some("2025-04-21T13:45:00+02:00"));
        assert_eq!(r.timezone.as_deref(), Some("+02:00"));
    }

    #[test]
    fn utc_fire_time_stays_utc() {
        let r = round_trip_absolute("2025-04-21T11:45:00Z", None);
        assert_eq!(r.fire_time.as_deref(), Some("2025-04-21T11:45:00+00:00"));
        assert_eq!(r.timezone.as_deref(), Some("UTC"));
    }

    #[test]
    fn writes_all_day_dates() {
        let event = Event {
            uid: "e-2".to_string(),
            summary: "Holiday".to_string(),
            start: "2025-05-01".to_string(),
            end: Some("2025-05-02".to_string()),
            all_day: true,
            ..Default::default()
        };
        let text = event.to_ical().unwrap();
        assert!(text.contains("DTSTART;VALUE=DATE:20250501"));

        let back = Event::from_ical(&text).unwrap();
        assert!(back.all_day);
        assert_eq!(back.start, "2025-05-01");
        assert_eq!(back.end.as_deref(), Some("2025-05-02"));
    }

    #[test]
    fn reads_utc_times() {
        let text = "BEGIN:VCALENDAR\nBEGIN:VEVENT\nUID:u\nSUMMARY:Call\nDTSTART:20250421T120000Z\nBEGIN:VALARM\nACTION:AUDIO\nTRIGGER;RELATED=END:PT0S\nEND:VALARM\nEND:VEVENT\nEND:VCALENDAR\n";
        let event = Event::from_ical(text).unwrap();
        assert_eq!(event.start, "2025-04-21T12:00:00");
        assert_eq!(event.start_timezone.as_deref(), Some("UTC"));
        // No DTEND, so an END-related reminder has no fire time.
        assert_eq!(event.reminders[0].relation, Some(Relation::End));
        assert_eq!(event.reminders[0].fire_time, None);
    }

    #[test]
    fn rejects_bad_events() {
        let mut event = meeting();
        event.start = "someday".to_string();
        assert!(matches!(
            event.to_ical(),
            Err(CodecError::InvalidField { field: "start", .. })
        ));

        let mut event = meeting();
        event.reminders[0].offset = None;
        assert!(matches!(event.to_ical(), Err(CodecError::Reminder(_))));

        let text = "BEGIN:VCALENDAR\nBEGIN:VEVENT\nUID:u\nDTSTART:20250421T120000\nBEGIN:VALARM\nACTION:DISPLAY\nEND:VALARM\nEND:VEVENT\nEND:VCALENDAR\n";
        assert!(matches!(
            Event::from_ical(text),
            Err(CodecError::Reminder(_))
        ));

        assert_eq!(
            Event::from_ical("BEGIN:VCALENDAR\nEND:VCALENDAR\n"),
            Err(CodecError::MissingComponent("VEVENT"))
        );
    }
}
