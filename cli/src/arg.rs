// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

use std::{error::Error, path::PathBuf};

use clap::{Arg, ArgMatches, ValueHint, arg, value_parser};
use davgate_core::dav::ETag;

use crate::util::PayloadSource;

/// Arguments shared by the contact and event commands.
#[derive(Debug, Clone, Copy)]
pub struct ResourceArgs {
    name: &'static str,
    collection: &'static str,
}

impl ResourceArgs {
    pub const CONTACT: Self = Self {
        name: "contact",
        collection: "addressbook",
    };

    pub const EVENT: Self = Self {
        name: "event",
        collection: "calendar",
    };

    pub const REMINDER: Self = Self {
        name: "reminder",
        collection: "calendar",
    };

    pub fn uid(self) -> Arg {
        let help = format!("The uid of the {}", self.name);
        arg!(uid: <UID>).help(help)
    }

    pub fn get_uid(matches: &ArgMatches) -> Result<String, Box<dyn Error>> {
        matches
            .get_one::<String>("uid")
            .cloned()
            .ok_or_else(|| "uid is required".into())
    }

    pub fn collection(self) -> Arg {
        let help = format!(
            "The {} holding the {}; defaults to the configured one",
            self.collection, self.name
        );
        Arg::new("collection")
            .long(self.collection)
            .value_name("NAME")
            .help(help)
    }

    pub fn get_collection(matches: &ArgMatches) -> Option<String> {
        matches.get_one("collection").cloned()
    }

    pub fn etag(self) -> Arg {
        let help = format!("The ETag the {} was read at", self.name);
        arg!(--etag <ETAG>).help(help)
    }

    pub fn get_etag(matches: &ArgMatches) -> Option<ETag> {
        matches.get_one::<String>("etag").cloned().map(ETag::new)
    }

    pub fn data(self) -> [Arg; 2] {
        [
            arg!(-d --data <JSON>)
                .help(format!("The {} as JSON; read from stdin when omitted", self.name))
                .conflicts_with("file"),
            arg!(-f --file <PATH>)
                .help(format!("Read the {} JSON from a file", self.name))
                .value_parser(value_parser!(PathBuf))
                .value_hint(ValueHint::FilePath),
        ]
    }

    pub fn get_data(matches: &ArgMatches) -> PayloadSource {
        if let Some(data) = matches.get_one::<String>("data") {
            PayloadSource::Inline(data.clone())
        } else if let Some(path) = matches.get_one::<PathBuf>("file") {
            PayloadSource::File(path.clone())
        } else {
            PayloadSource::Stdin
        }
    }
}
