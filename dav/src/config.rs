// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

use crate::types::CollectionKind;

/// DAV authentication method.
#[derive(Debug, Clone, Default, serde::Deserialize)]
#[serde(tag = "type")]
pub enum AuthMethod {
    /// No authentication.
    #[serde(rename = "none")]
    #[default]
    None,
    /// Basic authentication (username/password).
    #[serde(rename = "basic")]
    Basic {
        /// Username for authentication.
        username: String,
        /// Password for authentication.
        password: String,
    },
    /// Bearer token authentication (OAuth).
    #[serde(rename = "bearer")]
    Bearer {
        /// Bearer token.
        token: String,
    },
}

/// DAV server configuration.
#[derive(Debug, Clone, serde::Deserialize)]
pub struct DavConfig {
    /// Base URL of the DAV server.
    #[serde(default)]
    pub base_url: String,
    /// Address book home path (e.g., /remote.php/dav/addressbooks/users/alice/).
    #[serde(default)]
    pub addressbook_home: String,
    /// Calendar home path (e.g., /remote.php/dav/calendars/alice/).
    #[serde(default)]
    pub calendar_home: String,
    /// Address book used when a request does not name one.
    #[serde(default = "default_addressbook")]
    pub default_addressbook: String,
    /// Calendar used when a request does not name one.
    #[serde(default = "default_calendar")]
    pub default_calendar: String,
    /// Authentication method.
    #[serde(default)]
    pub auth: AuthMethod,
    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
    /// User agent string.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl DavConfig {
    /// Returns the home path and default collection for the given kind.
    #[must_use]
    pub fn collection(&self, kind: CollectionKind) -> (&str, &str) {
        match kind {
            CollectionKind::AddressBook => (&self.addressbook_home, &self.default_addressbook),
            CollectionKind::Calendar => (&self.calendar_home, &self.default_calendar),
        }
    }
}

const fn default_timeout() -> u64 {
    30
}

fn default_user_agent() -> String {
    concat!("davgate-dav/", env!("CARGO_PKG_VERSION")).to_string()
}

fn default_addressbook() -> String {
    "contacts".to_string()
}

fn default_calendar() -> String {
    "personal".to_string()
}

impl Default for DavConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            addressbook_home: String::new(),
            calendar_home: String::new(),
            default_addressbook: default_addressbook(),
            default_calendar: default_calendar(),
            auth: AuthMethod::default(),
            timeout_secs: default_timeout(),
            user_agent: default_user_agent(),
        }
    }
}
