// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

use std::error::Error;

use clap::{ArgMatches, Command};
use davgate_core::dav::ETag;
use davgate_core::{Contact, Gateway};

use crate::arg::ResourceArgs;
use crate::util::{PayloadSource, print_json, report};

const ARGS: ResourceArgs = ResourceArgs::CONTACT;

#[derive(Debug, Clone)]
pub struct CmdContactGet {
    pub uid: String,
    pub addressbook: Option<String>,
}

impl CmdContactGet {
    pub const NAME: &str = "get";

    pub fn command() -> Command {
        Command::new(Self::NAME)
            .alias("show")
            .about("Show a contact with its current ETag")
            .arg(ARGS.uid())
            .arg(ARGS.collection())
    }

    pub fn from(matches: &ArgMatches) -> Result<Self, Box<dyn Error>> {
        Ok(Self {
            uid: ResourceArgs::get_uid(matches)?,
            addressbook: ResourceArgs::get_collection(matches),
        })
    }

    pub async fn run(self, gateway: &Gateway) -> Result<(), Box<dyn Error>> {
        tracing::debug!(?self, "getting contact...");
        let contact = gateway
            .get_contact(self.addressbook.as_deref(), &self.uid)
            .await
            .map_err(report)?;
        print_json(&contact)
    }
}

#[derive(Debug, Clone)]
pub struct CmdContactCreate {
    pub data: PayloadSource,
    pub addressbook: Option<String>,
}

impl CmdContactCreate {
    pub const NAME: &str = "create";

    pub fn command() -> Command {
        Command::new(Self::NAME)
            .alias("new")
            .about("Create a contact, refusing to overwrite an existing uid")
            .args(ARGS.data())
            .arg(ARGS.collection())
    }

    pub fn from(matches: &ArgMatches) -> Self {
        Self {
            data: ResourceArgs::get_data(matches),
            addressbook: ResourceArgs::get_collection(matches),
        }
    }

    pub async fn run(self, gateway: &Gateway) -> Result<(), Box<dyn Error>> {
        tracing::debug!(?self, "creating contact...");
        let contact: Contact = self.data.read().await?;
        let contact = gateway
            .create_contact(self.addressbook.as_deref(), contact)
            .await
            .map_err(report)?;
        print_json(&contact)
    }
}

#[derive(Debug, Clone)]
pub struct CmdContactUpdate {
    pub uid: String,
    pub etag: Option<ETag>,
    pub data: PayloadSource,
    pub addressbook: Option<String>,
}

impl CmdContactUpdate {
    pub const NAME: &str = "update";

    pub fn command() -> Command {
        Command::new(Self::NAME)
            .alias("edit")
            .about("Replace a contact if it has not changed since it was read")
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
            addressbook: ResourceArgs::get_collection(matches),
        })
    }

    pub async fn run(self, gateway: &Gateway) -> Result<(), Box<dyn Error>> {
        tracing::debug!(?self, "updating contact...");
        let mut contact: Contact = self.data.read().await?;
        contact.uid = self.uid;
        if self.etag.is_some() {
            contact.etag = self.etag;
        }

        let contact = gateway
            .update_contact(self.addressbook.as_deref(), contact)
            .await
            .map_err(report)?;
        print_json(&contact)
    }
}

#[derive(Debug, Clone)]
pub struct CmdContactDelete {
    pub uid: String,
    pub etag: Option<ETag>,
    pub addressbook: Option<String>,
}

impl CmdContactDelete {
    pub const NAME: &str = "delete";

    pub fn command() -> Command {
        Command::new(Self::NAME)
            .alias("rm")
            .about("Delete a contact; deleting a missing contact succeeds")
            .arg(ARGS.uid())
            .arg(ARGS.etag())
            .arg(ARGS.collection())
    }

    pub fn from(matches: &ArgMatches) -> Result<Self, Box<dyn Error>> {
        Ok(Self {
            uid: ResourceArgs::get_uid(matches)?,
            etag: ResourceArgs::get_etag(matches),
            addressbook: ResourceArgs::get_collection(matches),
        })
    }

    pub async fn run(self, gateway: &Gateway) -> Result<(), Box<dyn Error>> {
        tracing::debug!(?self, "deleting contact...");
        let result = gateway
            .delete_contact(self.addressbook.as_deref(), &self.uid, self.etag.as_ref())
            .await
            .map_err(report)?;
        print_json(&serde_json::json!({ "uid": self.uid, "result": result }))
    }
}
