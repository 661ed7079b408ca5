// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

use davgate_dav::{CollectionKind, ETag, Href};
use ical::generator::Emitter;
use ical::parser::vcard::component::VcardContact;
use ical::property::Property;
use serde::{Deserialize, Serialize};

use crate::error::CodecError;
use crate::property::{self, escape_text, split_text};
use crate::store::Resource;

/// A contact, stored as a vCard.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
    /// Unique identifier.
    #[serde(default)]
    pub uid: String,

    /// Display name (`FN`).
    pub full_name: String,

    /// Where the vCard is stored on the server.
    #[serde(default)]
    pub vcs_uri: Option<String>,

    /// Email addresses.
    #[serde(default)]
    pub emails: Vec<Email>,

    /// Phone numbers.
    #[serde(default)]
    pub phones: Vec<Phone>,

    /// Postal addresses.
    #[serde(default)]
    pub addresses: Vec<Address>,

    /// Birthday as `YYYY-MM-DD`.
    #[serde(default)]
    pub birthday: Option<String>,

    /// Free-form notes.
    #[serde(default)]
    pub notes: Option<String>,

    /// Groups the contact belongs to (`CATEGORIES`).
    #[serde(default)]
    pub groups: Vec<String>,

    /// Version tag the contact was read at.
    #[serde(default)]
    pub etag: Option<ETag>,
}

/// An email address with its type tag.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Email {
    /// Type such as `home` or `work`.
    #[serde(default)]
    pub tag: Option<String>,
    /// The address.
    #[serde(default)]
    pub email: Option<String>,
}

/// A phone number with its type tag.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Phone {
    /// Type such as `cell` or `work`.
    #[serde(default)]
    pub tag: Option<String>,
    /// The number.
    #[serde(default)]
    pub number: Option<String>,
}

/// A postal address with its type tag.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    /// Type such as `home` or `work`.
    #[serde(default)]
    pub tag: Option<String>,
    /// Street and number.
    #[serde(default)]
    pub street: Option<String>,
    /// City or locality.
    #[serde(default)]
    pub city: Option<String>,
    /// State or region.
    #[serde(default)]
    pub state: Option<String>,
    /// Postal code.
    #[serde(default)]
    pub postal_code: Option<String>,
    /// Country.
    #[serde(default)]
    pub country: Option<String>,
}

impl Contact {
    /// Serializes to vCard 3.0.
    #[must_use]
    pub fn to_vcard(&self) -> String {
        let mut card = VcardContact::new();
        let props = &mut card.properties;
        props.push(property::raw("VERSION", "3.0"));
        props.push(property::text("UID", &self.uid));
        props.push(property::text("FN", &self.full_name));
        props.push(property::raw("N", structured_name(&self.full_name)));

        for e in &self.emails {
            if let Some(email) = &e.email {
                props.push(tagged(property::text("EMAIL", email), e.tag.as_deref()));
            }
        }
        for p in &self.phones {
            if let Some(number) = &p.number {
                props.push(tagged(property::text("TEL", number), p.tag.as_deref()));
            }
        }
        for a in &self.addresses {
            let fields = [&a.street, &a.city, &a.state, &a.postal_code, &a.country]
                .map(|f| escape_text(f.as_deref().unwrap_or_default()));
            // ADR: post office box; extended address; street; city; region; code; country
            let value = format!(";;{}", fields.join(";"));
            props.push(tagged(property::raw("ADR", value), a.tag.as_deref()));
        }

        for (name, value) in [("BDAY", &self.birthday), ("NOTE", &self.notes)] {
            if let Some(value) = value.as_deref().filter(|v| !v.is_empty()) {
                props.push(property::text(name, value));
            }
        }
        props.extend(property::text_list("CATEGORIES", &self.groups));

        card.generate()
    }

    /// Parses the first vCard in a body.
    ///
    /// # Errors
    ///
    /// Returns an error if the body is malformed or holds no vCard.
    pub fn from_vcard(data: &str) -> Result<Self, CodecError> {
        let card = property::parse_vcard(data)?;
        let props = card.properties.as_slice();

        let emails = property::find_all(props, "EMAIL")
            .map(|p| Email {
                tag: type_tag(p),
                email: Some(property::text_value(p)),
            })
            .collect();

        let phones = property::find_all(props, "TEL")
            .map(|p| Phone {
                tag: type_tag(p),
                number: Some(property::text_value(p)),
            })
            .collect();

        let addresses = property::find_all(props, "ADR")
            .map(|p| {
                let parts = split_text(property::value(p), ';');
                let field = |i: usize| parts.get(i).filter(|s| !s.is_empty()).cloned();
                Address {
                    tag: type_tag(p),
                    street: field(2),
                    city: field(3),
                    state: field(4),
                    postal_code: field(5),
                    country: field(6),
                }
            })
            .collect();

        let groups = property::find_all(props, "CATEGORIES")
            .flat_map(|p| split_text(property::value(p), ','))
            .filter(|g| !g.is_empty())
            .collect();

        Ok(Self {
            uid: property::find_text(props, "UID").unwrap_or_default(),
            full_name: property::find_text(props, "FN").unwrap_or_default(),
            vcs_uri: None,
            emails,
            phones,
            addresses,
            birthday: property::find_text(props, "BDAY").map(|b| normalize_birthday(&b)),
            notes: property::find_text(props, "NOTE"),
            groups,
            etag: None,
        })
    }
}

impl Resource for Contact {
    const KIND: CollectionKind = CollectionKind::AddressBook;
    const NAME: &'static str = "contact";

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
        self.vcs_uri = Some(href.to_string());
    }

    fn to_dav(&self) -> Result<String, CodecError> {
        Ok(self.to_vcard())
    }

    fn from_dav(data: &str) -> Result<Self, CodecError> {
        Self::from_vcard(data)
    }
}

fn tagged(prop: Property, tag: Option<&str>) -> Property {
    match tag.filter(|t| !t.is_empty()) {
        Some(tag) => property::with_param(prop, "TYPE", tag),
        None => prop,
    }
}

/// The first meaningful `TYPE` value, lower-cased.
fn type_tag(prop: &Property) -> Option<String> {
    property::param_values(prop, "TYPE")
        .flat_map(|v| v.split(','))
        .map(str::trim)
        .find(|t| {
            let t = t.to_ascii_lowercase();
            !t.is_empty() && !matches!(t.as_str(), "internet" | "pref" | "voice")
        })
        .map(str::to_ascii_lowercase)
}

/// `N` value with the last word as family name.
fn structured_name(full_name: &str) -> String {
    let full_name = full_name.trim();
    match full_name.rsplit_once(' ') {
        Some((given, family)) => format!("{};{};;;", escape_text(family), escape_text(given.trim())),
        None => format!("{};;;;", escape_text(full_name)),
    }
}

/// Rewrites basic-format birthdays (`19900115`) as `1990-01-15`.
fn normalize_birthday(bday: &str) -> String {
    let bday = bday.trim();
    let date = bday.split_once('T').map_or(bday, |(d, _)| d);
    if date.len() == 8 && date.chars().all(|c| c.is_ascii_digit()) {
        format!("{}-{}-{}", &date[..4], &date[4..6], &date[6..])
    } else {
        date.to_string()
    }
}
