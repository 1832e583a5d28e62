// SPDX-FileCopyrightText: 2025 Alexandre Gomes Gaigalas <alganet@gmail.com>
//
// SPDX-License-Identifier: ISC

//! Per-field rules.
//!
//! Each rule describes one field: where it may appear, which parsing
//! discipline it uses, how a raw value becomes a [`FieldValue`], and the
//! checks to run once the value is known.

use crate::fields::{Discipline, FieldNotes, FieldValue, MessageView};

/// Grammar check for one raw value (or list element).
pub type Syntax = fn(&str) -> bool;

pub trait FieldRule: Send + Sync {
    /// Canonical field name as registered, e.g. `Cache-Control`.
    fn name(&self) -> &'static str;

    /// Other spellings routed to this rule.
    fn aliases(&self) -> &'static [&'static str] {
        &[]
    }

    fn discipline(&self) -> Discipline {
        Discipline::Singleton
    }

    fn valid_in_requests(&self) -> bool {
        true
    }

    fn valid_in_responses(&self) -> bool {
        true
    }

    fn deprecated(&self) -> bool {
        false
    }

    /// Grammar every raw value (or list element) should match. A mismatch is
    /// noted but `parse` is still attempted.
    fn syntax(&self) -> Option<Syntax> {
        None
    }

    /// Turn one raw value into a typed value. `None` discards it.
    ///
    /// Not called for structured or JSON fields.
    fn parse(&self, raw: &str, _notes: &mut FieldNotes<'_>) -> Option<FieldValue> {
        Some(FieldValue::Text(raw.to_string()))
    }

    /// Checks local to this field, run once its value is complete.
    fn evaluate(&self, _value: &FieldValue, _notes: &mut FieldNotes<'_>) {}

    /// Checks that depend on other finished fields of the message.
    fn post_check(&self, _value: &FieldValue, _msg: &MessageView<'_>, _notes: &mut FieldNotes<'_>) {
    }
}

pub mod accept_ch;
pub mod age;
pub mod authorization;
pub mod cache_control;
pub mod cache_status;
pub mod content_encoding;
pub mod content_length;
pub mod date;
pub mod etag;
pub mod expires;
pub mod host;
pub mod last_modified;
pub mod nel;
pub mod pragma;
pub mod priority;
pub mod set_cookie;
pub mod vary;

pub const RULES: &[&dyn FieldRule] = &[
    &accept_ch::AcceptCh,
    &age::Age,
    &authorization::Authorization,
    &cache_control::CacheControl,
    &cache_status::CacheStatus,
    &content_encoding::ContentEncoding,
    &content_length::ContentLength,
    &date::Date,
    &etag::ETag,
    &expires::Expires,
    &host::Host,
    &last_modified::LastModified,
    &nel::Nel,
    &pragma::Pragma,
    &priority::Priority,
    &set_cookie::SetCookie,
    &vary::Vary,
];

/// Shared parser for HTTP-date fields; a bad date is noted and discarded.
pub(crate) fn parse_date_field(raw: &str, notes: &mut FieldNotes<'_>) -> Option<FieldValue> {
    match crate::http_date::parse_http_date_to_epoch(raw) {
        Some(secs) => Some(FieldValue::Date(secs)),
        None => {
            notes.add(&BAD_DATE_SYNTAX, &[("value", &raw)]);
            None
        }
    }
}

pub static BAD_DATE_SYNTAX: crate::note::NoteKind = crate::note::NoteKind {
    id: "BAD_DATE_SYNTAX",
    category: crate::note::Category::General,
    level: crate::note::Level::Bad,
    summary: "The {field_name} field's value isn't a valid date.",
    detail: "HTTP dates must use the IMF-fixdate format, e.g. 'Sun, 06 Nov 1994 08:49:37 GMT'. '{value}' could not be parsed, so it has been ignored.",
};
