// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

use crate::datetime::{LooseDateTime, apply_timezone, parse_timestamp, zone_of};
use crate::error::ReminderError;
use crate::reminder::{RawTrigger, Reminder, ReminderMode, Relation, TriggerValue};

/// A trigger ready to be written onto an alarm.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedTrigger {
    /// Typed trigger value.
    pub value: TriggerValue,
    /// Edge for relative triggers.
    pub related: Option<Relation>,
    /// Zone for absolute triggers.
    pub timezone: Option<String>,
}

impl EncodedTrigger {
    /// Views the trigger as it would be read back from an alarm.
    #[must_use]
    pub fn into_raw(self) -> RawTrigger {
        RawTrigger {
            value: Some(self.value),
            related: self.related.map(|r| r.as_str().to_string()),
            tzid: self.timezone,
        }
    }
}

/// Encodes a reminder into a trigger value.
///
/// # Errors
///
/// Returns [`ReminderError::OffsetRequired`] for a relative reminder without
/// an offset, and [`ReminderError::FireTimeRequired`] or
/// [`ReminderError::InvalidFireTime`] for an absolute reminder whose fire
/// time is missing or not a timestamp.
pub fn encode_trigger(reminder: &Reminder) -> Result<EncodedTrigger, ReminderError> {
    match reminder.mode {
        ReminderMode::Relative => {
            let offset = reminder.offset.ok_or(ReminderError::OffsetRequired)?;
            Ok(EncodedTrigger {
                value: TriggerValue::Duration(offset),
                related: Some(reminder.relation.unwrap_or_default()),
                timezone: None,
            })
        }

        ReminderMode::Absolute => {
            let fire_time = reminder
                .fire_time
                .as_deref()
                .filter(|s| !s.trim().is_empty())
                .ok_or(ReminderError::FireTimeRequired)?;
            let dt = parse_timestamp(fire_time)
                .ok_or_else(|| ReminderError::InvalidFireTime(fire_time.to_string()))?;

            let timezone = reminder
                .timezone
                .clone()
                .filter(|s| !s.trim().is_empty())
                .or_else(|| zone_of(&dt));
            let dt = apply_timezone(dt, timezone.as_deref());
            let timezone = match (timezone, &dt) {
                (None, LooseDateTime::Zoned(_)) => zone_of(&dt),
                (timezone, _) => timezone,
            };

            Ok(EncodedTrigger {
                value: TriggerValue::DateTime(dt),
                related: None,
                timezone,
            })
        }
    }
}
