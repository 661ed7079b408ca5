// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

use std::fmt;
use std::ops::Deref;

/// Resource href (path).
///
/// A `Href` represents the path to a resource on a DAV server,
/// such as `/remote.php/dav/calendars/user/personal/event1.ics`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Href(String);

impl Href {
    /// Creates a new `Href` from a string.
    #[must_use]
    pub const fn new(href: String) -> Self {
        Self(href)
    }

    /// Returns the inner string value.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Deref for Href {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl AsRef<str> for Href {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Href {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for Href {
    fn from(href: String) -> Self {
        Self(href)
    }
}

impl From<&str> for Href {
    fn from(href: &str) -> Self {
        Self(href.to_string())
    }
}

/// Entity tag for optimistic concurrency.
///
/// An `ETag` is kept exactly as the server sent it (quotes included) so it
/// can be echoed back in `If-Match`. Equality between tags coming from
/// different sources should go through [`ETag::matches`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct ETag(String);

impl ETag {
    /// Creates a new `ETag` from a string.
    #[must_use]
    pub const fn new(etag: String) -> Self {
        Self(etag)
    }

    /// Returns the inner string value.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the opaque part of the tag, without the weak prefix and quotes.
    #[must_use]
    pub fn opaque(&self) -> &str {
        let tag = self.0.trim();
        let tag = tag.strip_prefix("W/").unwrap_or(tag);
        tag.strip_prefix('"')
            .and_then(|t| t.strip_suffix('"'))
            .unwrap_or(tag)
    }

    /// Whether two tags denote the same resource version.
    ///
    /// Clients frequently drop the quotes the server put around a tag, so
    /// only the opaque part is compared.
    #[must_use]
    pub fn matches(&self, other: &ETag) -> bool {
        self.opaque() == other.opaque()
    }

    /// Returns the tag in the quoted form expected by `If-Match`.
    #[must_use]
    pub fn to_header_value(&self) -> String {
        let tag = self.0.trim();
        if tag.starts_with('"') || tag.starts_with("W/") {
            tag.to_string()
        } else {
            format!("\"{tag}\"")
        }
    }
}

impl Deref for ETag {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl AsRef<str> for ETag {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ETag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for ETag {
    fn from(etag: String) -> Self {
        Self(etag)
    }
}

impl From<&str> for ETag {
    fn from(etag: &str) -> Self {
        Self(etag.to_string())
    }
}

/// The kind of DAV collection a resource lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CollectionKind {
    /// A `CardDAV` address book holding vCards.
    AddressBook,
    /// A `CalDAV` calendar holding iCalendar objects.
    Calendar,
}

impl CollectionKind {
    /// File extension used for resources in this collection.
    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            Self::AddressBook => "vcf",
            Self::Calendar => "ics",
        }
    }

    /// `Content-Type` used when writing resources into this collection.
    #[must_use]
    pub const fn content_type(self) -> &'static str {
        match self {
            Self::AddressBook => "text/vcard; charset=utf-8",
            Self::Calendar => "text/calendar; charset=utf-8",
        }
    }
}

/// A resource fetched from a DAV collection.
///
/// Holds the raw vCard or iCalendar text together with the `ETag` the server
/// reported for that exact representation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DavResource {
    /// The href of the resource.
    pub href: Href,
    /// The entity tag of the resource.
    pub etag: ETag,
    /// The raw resource body.
    pub data: String,
}

impl DavResource {
    /// Creates a new `DavResource`.
    #[must_use]
    pub const fn new(href: Href, etag: ETag, data: String) -> Self {
        Self { href, etag, data }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn etag_matches_ignores_quotes_and_weakness() {
        let cases = [
            ("\"1\"", "1", true),
            ("W/\"abc\"", "\"abc\"", true),
            ("\"etag-1\"", "\"etag-2\"", false),
            ("abc", "abc", true),
        ];
        for (a, b, expected) in cases {
            assert_eq!(
                ETag::from(a).matches(&ETag::from(b)),
                expected,
                "{a} vs {b}"
            );
        }
    }

    #[test]
    fn etag_header_value_is_quoted() {
        assert_eq!(ETag::from("1").to_header_value(), "\"1\"");
        assert_eq!(ETag::from("\"1\"").to_header_value(), "\"1\"");
        assert_eq!(ETag::from("W/\"1\"").to_header_value(), "W/\"1\"");
    }

    #[test]
    fn collection_kind_extension() {
        assert_eq!(CollectionKind::AddressBook.extension(), "vcf");
        assert_eq!(CollectionKind::Calendar.extension(), "ics");
    }
}
