// SPDX-FileCopyrightText: 2025 Alexandre Gomes Gaigalas <alganet@gmail.com>
//
// SPDX-License-Identifier: ISC

//! Field processing framework.
//!
//! A [`section::FieldSection`] receives raw `(name, value)` lines, routes each
//! name to the [`crate::rules::FieldRule`] registered for it through the
//! [`finder::FieldFinder`], and drives every [`handler::FieldHandler`]
//! through two phases: `finish` (per-field parsing and checks) and, once
//! every field is finished, `post_check` (checks that read other fields).

pub mod finder;
pub mod handler;
pub mod section;
pub mod structured;

use crate::cache::CacheState;
use crate::note::{Category, Level, Note, NoteKind, NoteVars, Notes};
use std::fmt;

pub use finder::FieldFinder;
pub use handler::FieldHandler;
pub use section::FieldSection;
pub use structured::SfType;

/// Which kind of message a section belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    Request,
    Response,
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            MessageKind::Request => "request",
            MessageKind::Response => "response",
        })
    }
}

/// How a field's raw lines become a typed value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Discipline {
    /// One value; the first line wins and repeats are noted.
    Singleton,
    /// Comma-separated elements gathered from every line.
    List,
    /// Each line parsed on its own, without comma splitting.
    Broken,
    /// Structured Field of the given top-level type.
    Structured(SfType),
    /// Lines joined into a JSON array.
    Json,
}

/// Typed value of a finished field.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Null,
    Text(String),
    Integer(u64),
    /// Seconds since the Unix epoch.
    Date(i64),
    /// A `name[=value]` list member; `name` keeps its original case.
    Directive {
        name: String,
        value: Option<String>,
    },
    EntityTag {
        weak: bool,
        tag: String,
    },
    Cookie {
        name: String,
        value: String,
        attributes: Vec<(String, Option<String>)>,
    },
    List(Vec<FieldValue>),
    Structured(structured::StructuredValue),
    Json(serde_json::Value),
}

impl FieldValue {
    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }

    pub fn as_integer(&self) -> Option<u64> {
        match self {
            FieldValue::Integer(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<i64> {
        match self {
            FieldValue::Date(d) => Some(*d),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Members of a list value; empty for anything else.
    pub fn as_list(&self) -> &[FieldValue] {
        match self {
            FieldValue::List(items) => items,
            _ => &[],
        }
    }

    /// Lowercased text members of a list value.
    pub fn text_items(&self) -> Vec<String> {
        self.as_list()
            .iter()
            .filter_map(FieldValue::as_text)
            .map(str::to_ascii_lowercase)
            .collect()
    }
}

/// Read-only view of a message handed to `post_check`.
///
/// Only finished sections are reachable through it.
pub struct MessageView<'a> {
    pub kind: MessageKind,
    pub headers: &'a FieldSection,
    pub method: Option<&'a str>,
    pub status: Option<u16>,
    pub cache: Option<&'a CacheState>,
    /// Headers of the request this response answers.
    pub related: Option<&'a FieldSection>,
}

/// Note sink bound to one field; fills in `field_name` and the
/// `header-<name>` subject.
pub struct FieldNotes<'a> {
    notes: &'a mut Notes,
    subject: String,
    field_name: String,
}

impl<'a> FieldNotes<'a> {
    pub fn new(notes: &'a mut Notes, prefix: &str, norm_name: &str, wire_name: &str) -> Self {
        Self {
            notes,
            subject: format!("{}-{}", prefix, norm_name),
            field_name: wire_name.to_string(),
        }
    }

    pub fn field_name(&self) -> &str {
        &self.field_name
    }

    pub fn add(&mut self, kind: &'static NoteKind, vars: NoteVars<'_>) -> &mut Note {
        let name: &dyn fmt::Display = &self.field_name;
        let mut all: Vec<(&str, &dyn fmt::Display)> = Vec::with_capacity(vars.len() + 1);
        all.push(("field_name", name));
        all.extend_from_slice(vars);
        self.notes.add(self.subject.clone(), kind, &all)
    }
}

pub static FIELD_NAME_ENCODING: NoteKind = NoteKind {
    id: "FIELD_NAME_ENCODING",
    category: Category::General,
    level: Level::Bad,
    summary: "A field name in {message} contains non-ASCII characters.",
    detail: "Field names must be ASCII tokens. The name was decoded as ISO-8859-1 so that linting can continue: '{field_name}'.",
};

pub static FIELD_VALUE_ENCODING: NoteKind = NoteKind {
    id: "FIELD_VALUE_ENCODING",
    category: Category::General,
    level: Level::Warn,
    summary: "The {field_name} field in {message} contains non-ASCII characters.",
    detail: "Field values should be ASCII; other octets are treated as opaque data by most implementations. The value was decoded as ISO-8859-1.",
};

pub static FIELD_TOO_LARGE: NoteKind = NoteKind {
    id: "FIELD_TOO_LARGE",
    category: Category::Connection,
    level: Level::Warn,
    summary: "The {field_name} field in {message} is very large ({field_size} bytes).",
    detail: "Lines longer than {max_size} bytes may be refused or truncated by servers, intermediaries and clients.",
};

pub static FIELD_BLOCK_TOO_LARGE: NoteKind = NoteKind {
    id: "FIELD_BLOCK_TOO_LARGE",
    category: Category::Connection,
    level: Level::Warn,
    summary: "{message}'s header block is very large ({block_size} bytes).",
    detail: "Header blocks larger than {max_size} bytes are refused by some implementations and slow every message down.",
};

pub static FIELD_NAME_BAD_SYNTAX: NoteKind = NoteKind {
    id: "FIELD_NAME_BAD_SYNTAX",
    category: Category::General,
    level: Level::Bad,
    summary: "'{field_name}' is not a valid field name.",
    detail: "Field names must be tokens; they cannot contain spaces, separators or control characters.",
};

pub static FIELD_WRONG_MESSAGE: NoteKind = NoteKind {
    id: "FIELD_WRONG_MESSAGE",
    category: Category::General,
    level: Level::Warn,
    summary: "The {field_name} field has no meaning in a {message_type}.",
    detail: "{field_name} is only defined for other kinds of message, so recipients will ignore it here. Its value has not been used.",
};

pub static FIELD_DEPRECATED: NoteKind = NoteKind {
    id: "FIELD_DEPRECATED",
    category: Category::General,
    level: Level::Warn,
    summary: "The {field_name} field is deprecated.",
    detail: "{field_name} has been deprecated; implementations may ignore it. Consider removing it or replacing it with its successor.",
};

pub static FIELD_BAD_SYNTAX: NoteKind = NoteKind {
    id: "FIELD_BAD_SYNTAX",
    category: Category::General,
    level: Level::Bad,
    summary: "The {field_name} field's syntax isn't valid.",
    detail: "The value '{value}' does not match the grammar defined for {field_name}. Recipients may ignore or misinterpret it.",
};

pub static SINGLE_FIELD_REPEAT: NoteKind = NoteKind {
    id: "SINGLE_FIELD_REPEAT",
    category: Category::General,
    level: Level::Bad,
    summary: "Only one {field_name} field is allowed in {message}.",
    detail: "{field_name} appears {count} times but only allows a single value. The first one has been used; others were ignored.",
};

pub static STRUCTURED_FIELD_PARSE_ERROR: NoteKind = NoteKind {
    id: "STRUCTURED_FIELD_PARSE_ERROR",
    category: Category::General,
    level: Level::Bad,
    summary: "The {field_name} field isn't a valid Structured Field.",
    detail: "{field_name} is a Structured Field, but parsing failed: {error}. Near: {context}. The whole field is ignored by recipients.",
};

pub static STRUCTURED_FIELD_DUPLICATE_KEY: NoteKind = NoteKind {
    id: "STRUCTURED_FIELD_DUPLICATE_KEY",
    category: Category::General,
    level: Level::Warn,
    summary: "The {field_name} field repeats the '{key}' key.",
    detail: "Keys should appear only once in a dictionary or parameter list. The first value for '{key}' has been used.",
};

pub static JSON_PARSE_ERROR: NoteKind = NoteKind {
    id: "JSON_PARSE_ERROR",
    category: Category::General,
    level: Level::Bad,
    summary: "The {field_name} field's JSON isn't valid.",
    detail: "Parsing {field_name} as JSON failed: {error}. Its value has been ignored.",
};
