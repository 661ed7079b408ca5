// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

use std::error::Error;

use clap::{ArgMatches, Command};
use davgate_core::dav::ETag;
use davgate_core::{Event, Gateway};

use crate::arg::ResourceArgs;
use crate::util::{PayloadSource, print_json, report};

const ARGS: ResourceArgs = ResourceArgs::EVENT;

#[derive(Debug, Clone)]
pub struct CmdEventGet {
    pub uid: String,
    pub calendar: Option<String>,
}

impl CmdEventGet {
    pub const NAME: &str = "get";

    pub fn command() -> Command {
        Command::new(Self::NAME)
            .alias("show")
            .about("Show an event with its current ETag")
            .arg(ARGS.uid())
            .arg(ARGS.collection())
    }

    pub fn from(matches: &ArgMatches) -> Result<Self, Box<dyn Error>> {
        Ok(Self {
            uid: ResourceArgs::get_uid(matches)?,
            calendar: ResourceArgs::get_collection(matches),
        })
    }

    pub async fn run(self, gateway: &Gateway) -> Result<(), Box<dyn Error>> {
        tracing::debug!(?self, "getting event...");
        let event = gateway
            .get_event(self.calendar.as_deref(), &self.uid)
            .await
            .map_err(report)?;
        print_json(&event)
    }
}

#[derive(Debug, Clone)]
pub struct CmdEventCreate {
    pub data: PayloadSource,
    pub calendar: Option<String>,
}

impl CmdEventCreate {
    pub const NAME: &str = "create";

    pub fn command() -> Command {
        Command::new(Self::NAME)
            .alias("new")
            .about("Create an event, refusing to overwrite an existing uid")
            .args(ARGS.data())
            .arg(ARGS.collection())
    }

    pub fn from(matches: &ArgMatches) -> Self {
        Self {
            data: ResourceArgs::get_data(matches),
            calendar: ResourceArgs::get_collection(matches),
        }
    }

    pub async fn run(self, gateway: &Gateway) -> Result<(), Box<dyn Error>> {
        tracing::debug!(?self, "creating event...");
        let event: Event = self.data.read().await?;
        let event = gateway
            .create_event(self.calendar.as_deref(), event)
            .await
            .map_err(report)?;
        print_json(&event)
    }
}

#[derive(Debug, Clone)]
pub struct CmdEventUpdate {
    pub uid: String,
    pub etag: Option<ETag>,
    pub data: PayloadSource,
    pub calendar: Option<String>,
}

impl CmdEventUpdate {
    pub const NAME: &str = "update";

    pub fn command() -> Command {
        Command::new(Self::NAME)
            .alias("edit")
            .about("Replace an event if it has not changed since it was read")
            .arg(ARGS.uid())
            .arg(ARGS.etag())
            .args(ARGS.data())
            .arg(ARGS.collection())
    }

    pub fn from(matches: &ArgMatches) -> Result<Self, Box<dyn Error>> {
        Ok(Self {
            uid: ResourceArgs::get_uid(matches)?,
            etag: ResourceArgs::get_etag(matches),
            data: ResourceArgs::get_data(matches),
            calendar: ResourceArgs::get_collection(matches),
        })
    }

    pub async fn run(self, gateway: &Gateway) -> Result<(), Box<dyn Error>> {
        tracing::debug!(?self, "updating event...");
        let mut event: Event = self.data.read().await?;
        event.uid = self.uid;
        if self.etag.is_some() {
            event.etag = self.etag;
        }

        let event = gateway
            .update_event(self.calendar.as_deref(), event)
            .await
            .map_err(report)?;
        print_json(&event)
    }
}

#[derive(Debug, Clone)]
pub struct CmdEventDelete {
    pub uid: String,
    pub etag: Option<ETag>,
    pub calendar: Option<String>,
}

impl CmdEventDelete {
    pub const NAME: &str = "delete";

    pub fn command() -> Command {
        Command::new(Self::NAME)
            .alias("rm")
            .about("Delete an event; deleting a missing event succeeds")
            .arg(ARGS.uid())
            .arg(ARGS.etag())
            .arg(ARGS.collection())
    }

    pub fn from(matches: &ArgMatches) -> Result<Self, Box<dyn Error>> {
        Ok(Self {
            uid: ResourceArgs::get_uid(matches)?,
            etag: ResourceArgs::get_etag(matches),
            calendar: ResourceArgs::get_collection(matches),
        })
    }

    pub async fn run(self, gateway: &Gateway) -> Result<(), Box<dyn Error>> {
        tracing::debug!(?self, "deleting event...");
        let result = gateway
            .delete_event(self.calendar.as_deref(), &self.uid, self.etag.as_ref())
            .await
            .map_err(report)?;
        print_json(&serde_json::json!({ "uid": self.uid, "result": result }))
    }
}
