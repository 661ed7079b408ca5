// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

use std::path::PathBuf;

/// Errors from parsing an ISO-8601 duration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DurationError {
    /// The text does not follow `[-]P[nD][T[nH][nM][nS]]`.
    #[error("Invalid ISO-8601 duration: {0:?}")]
    Invalid(String),

    /// The duration has no components, such as `P` or `PT`.
    #[error("ISO-8601 duration has no components: {0:?}")]
    Empty(String),

    /// The duration does not fit in a signed 64-bit number of seconds.
    #[error("ISO-8601 duration out of range: {0:?}")]
    Overflow(String),
}

/// Errors from reading a textual timestamp.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid timestamp: {0:?}")]
pub struct TimestampError(pub String);

/// Errors from decoding or encoding reminders.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReminderError {
    /// The alarm carries no trigger, or an empty one.
    #[error("Reminder trigger is missing or unreadable")]
    TriggerUnreadable,

    /// A relative reminder without an offset.
    #[error("Relative reminders require offset to be set")]
    OffsetRequired,

    /// An absolute reminder without a fire time.
    #[error("Absolute reminders require fire_time to be set")]
    FireTimeRequired,

    /// An absolute reminder whose fire time is not a timestamp.
    #[error("Absolute reminders require fire_time to be a timestamp, got {0:?}")]
    InvalidFireTime(String),

    /// A reminder with neither mode, offset, fire time nor legacy trigger.
    #[error("Reminder requires a mode, an offset or a fire_time")]
    MissingTiming,

    /// The offset is not a valid duration.
    #[error(transparent)]
    Duration(#[from] DurationError),
}

/// Errors from converting between the JSON model and iCalendar/vCard text.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CodecError {
    /// The text could not be parsed as iCalendar or vCard.
    #[error("Malformed calendar data: {0}")]
    Malformed(String),

    /// The expected component is absent.
    #[error("Missing {0} component")]
    MissingComponent(&'static str),

    /// A required property is absent.
    #[error("Missing {0} property")]
    MissingProperty(&'static str),

    /// A field holds a value that cannot be represented.
    #[error("Invalid value for {field}: {value:?}")]
    InvalidField {
        /// Name of the offending field.
        field: &'static str,
        /// The rejected value.
        value: String,
    },

    /// An embedded reminder could not be converted.
    #[error(transparent)]
    Reminder(#[from] ReminderError),
}

/// Errors from appending to the audit log.
#[derive(Debug, thiserror::Error)]
pub enum AuditError {
    /// The entry could not be serialized.
    #[error("Failed to serialize audit entry: {0}")]
    Serialize(#[from] serde_json::Error),

    /// The log file could not be opened or written.
    #[error("Failed to write audit log {}: {source}", path.display())]
    Io {
        /// Location of the log.
        path: PathBuf,
        /// Underlying failure.
        #[source]
        source: std::io::Error,
    },
}

/// Errors from normalizing the configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The DAV base URL is missing.
    #[error("dav.base_url must be set")]
    MissingBaseUrl,

    /// A path could not be expanded.
    #[error("Failed to expand path {path:?}: {reason}")]
    Path {
        /// The path as written.
        path: String,
        /// Why expansion failed.
        reason: String,
    },
}
