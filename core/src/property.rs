// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

//! Helpers over [`ical`] properties shared by the event and contact codecs.
//!
//! Reading, unfolding and folding are done by the `ical` crate; this module
//! only builds properties and handles `TEXT` escaping, which the crate leaves
//! to its callers.

use ical::parser::ical::component::IcalCalendar;
use ical::parser::vcard::component::VcardContact;
use ical::property::Property;
use ical::{IcalParser, VcardParser};

use crate::error::CodecError;

/// Parses the first `VCALENDAR` of a body.
pub fn parse_calendar(data: &str) -> Result<IcalCalendar, CodecError> {
    match IcalParser::new(data.as_bytes()).next() {
        Some(Ok(cal)) => Ok(cal),
        Some(Err(err)) => Err(CodecError::Malformed(err.to_string())),
        None => Err(CodecError::MissingComponent("VCALENDAR")),
    }
}

/// Parses the first `VCARD` of a body.
pub fn parse_vcard(data: &str) -> Result<VcardContact, CodecError> {
    match VcardParser::new(data.as_bytes()).next() {
        Some(Ok(card)) => Ok(card),
        Some(Err(err)) => Err(CodecError::Malformed(err.to_string())),
        None => Err(CodecError::MissingComponent("VCARD")),
    }
}

/// A property with a raw, already escaped value.
pub fn raw(name: &str, value: impl Into<String>) -> Property {
    Property {
        name: name.to_string(),
        params: None,
        value: Some(value.into()),
    }
}

/// A property holding text that needs escaping.
pub fn text(name: &str, value: &str) -> Property {
    raw(name, escape_text(value))
}

/// A text list such as `CATEGORIES`, or `None` when the list is empty.
pub fn text_list(name: &str, values: &[String]) -> Option<Property> {
    if values.is_empty() {
        return None;
    }
    let values: Vec<_> = values.iter().map(|v| escape_text(v)).collect();
    Some(raw(name, values.join(",")))
}

/// Adds a parameter to a property.
pub fn with_param(mut prop: Property, name: &str, value: impl Into<String>) -> Property {
    prop.params
        .get_or_insert_with(Vec::new)
        .push((name.to_string(), vec![value.into()]));
    prop
}

/// Name without a vCard group prefix such as `item1.`.
fn bare_name(prop: &Property) -> &str {
    prop.name.rsplit('.').next().unwrap_or(&prop.name)
}

/// First property with the given name, matched case-insensitively.
pub fn find<'a>(props: &'a [Property], name: &str) -> Option<&'a Property> {
    props.iter().find(|p| bare_name(p).eq_ignore_ascii_case(name))
}

/// All properties with the given name.
pub fn find_all<'a>(props: &'a [Property], name: &'a str) -> impl Iterator<Item = &'a Property> + 'a {
    props
        .iter()
        .filter(move |p| bare_name(p).eq_ignore_ascii_case(name))
}

/// Unescaped text of the first property with the given name.
pub fn find_text(props: &[Property], name: &str) -> Option<String> {
    find(props, name).map(text_value)
}

/// Raw value of a property; empty when absent.
pub fn value(prop: &Property) -> &str {
    prop.value.as_deref().unwrap_or_default()
}

/// Value of a property with text escapes removed.
pub fn text_value(prop: &Property) -> String {
    unescape_text(value(prop))
}

/// All values of a parameter, matched case-insensitively.
pub fn param_values<'a>(prop: &'a Property, name: &'a str) -> impl Iterator<Item = &'a str> + 'a {
    prop.params
        .iter()
        .flatten()
        .filter(move |(k, _)| k.eq_ignore_ascii_case(name))
        .flat_map(|(_, values)| values.iter().map(|v| v.trim_matches('"')))
}

/// First value of a parameter.
pub fn param<'a>(prop: &'a Property, name: &'a str) -> Option<&'a str> {
    param_values(prop, name).next()
}

/// Escapes backslash, semicolon, comma and newline in a text value.
pub fn escape_text(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            ';' => out.push_str("\\;"),
            ',' => out.push_str("\\,"),
            '\n' => out.push_str("\\n"),
            '\r' => {}
            c => out.push(c),
        }
    }
    out
}

/// Reverses [`escape_text`].
pub fn unescape_text(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n' | 'N') => out.push('\n'),
            Some(c) => out.push(c),
            None => out.push('\\'),
        }
    }
    out
}

/// Splits a raw value on unescaped separators, unescaping each part.
pub fn split_text(s: &str, sep: char) -> Vec<String> {
    let mut parts = Vec::new();
    let mut start = 0;
    let mut escaped = false;
    for (i, c) in s.char_indices() {
        match c {
            _ if escaped => escaped = false,
            '\\' => escaped = true,
            c if c == sep => {
                parts.push(unescape_text(&s[start..i]));
                start = i + c.len_utf8();
            }
            _ => {}
        }
    }
    parts.push(unescape_text(&s[start..]));
    parts
}
