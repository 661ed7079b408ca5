// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

//! Gateway core: reminder trigger normalization, payload codecs for
//! contacts and events, `ETag`-based optimistic updates and an audit trail.

#![warn(
    trivial_casts,
    trivial_numeric_casts,
    missing_copy_implementations,
    missing_debug_implementations,
    missing_docs,
    unsafe_code,
    unstable_features,
    unused_import_braces,
    unused_qualifications,
    clippy::dbg_macro,
    clippy::indexing_slicing,
    clippy::pedantic
)]
#![allow(clippy::module_name_repetitions, clippy::missing_panics_doc)]

mod audit;
mod config;
mod contact;
mod coordinator;
mod datetime;
mod duration;
mod error;
mod event;
mod gateway;
mod property;
mod reminder;
mod store;

pub use crate::audit::{AuditAction, AuditEntry, AuditRecorder, AuditSink, JsonlAuditLog, MemoryAuditLog};
pub use crate::config::{APP_NAME, Config};
pub use crate::contact::{Address, Contact, Email, Phone};
pub use crate::coordinator::{Coordinator, CoordinatorError, DeleteResult};
pub use crate::datetime::{
    IcalDateTime, LooseDateTime, apply_timezone, canonical_zone, parse_timestamp, resolve_zone,
    zone_of,
};
pub use crate::duration::{Duration, format_duration, parse_duration};
pub use crate::error::{
    AuditError, CodecError, ConfigError, DurationError, ReminderError, TimestampError,
};
pub use crate::event::{Attendee, Event};
pub use crate::gateway::{Gateway, GatewayError};
pub use crate::reminder::{
    AlarmAction, DecodedTrigger, EncodedTrigger, RawTrigger, Relation, Reminder, ReminderMode,
    TriggerContext, TriggerValue, decode_trigger, encode_trigger,
};
pub use crate::store::{DeleteOutcome, Resource, ResourceStore, WriteOutcome};

pub use davgate_dav as dav;
