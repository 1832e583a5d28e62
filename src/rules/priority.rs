// SPDX-FileCopyrightText: 2025 Alexandre Gomes Gaigalas <alganet@gmail.com>
//
// SPDX-License-Identifier: ISC

use crate::fields::structured::{ListEntry, SfType, StructuredValue};
use crate::fields::{Discipline, FieldNotes, FieldValue};
use crate::note::{Category, Level, NoteKind};
use crate::rules::FieldRule;

/// Extensible priorities: `u` urgency (0-7) and `i` incremental flag.
pub struct Priority;

impl FieldRule for Priority {
    fn name(&self) -> &'static str {
        "Priority"
    }

    fn discipline(&self) -> Discipline {
        Discipline::Structured(SfType::Dictionary)
    }

    fn evaluate(&self, value: &FieldValue, notes: &mut FieldNotes<'_>) {
        let FieldValue::Structured(sv @ StructuredValue::Dictionary(_)) = value else {
            return;
        };
        if let Some(u) = sv.get("u") {
            let urgency = u.as_item().and_then(|i| i.value.as_integer());
            if !matches!(urgency, Some(0..=7)) {
                notes.add(&PRIORITY_URGENCY_BAD, &[("value", &describe(u))]);
            }
        }
        if let Some(i) = sv.get("i") {
            if i.as_item().and_then(|i| i.value.as_bool()).is_none() {
                notes.add(&PRIORITY_INCREMENTAL_BAD, &[("value", &describe(i))]);
            }
        }
    }
}

fn describe(entry: &ListEntry) -> String {
    match entry.as_item() {
        Some(item) => format!("{:?}", item.value),
        None => "an inner list".to_string(),
    }
}

pub static PRIORITY_URGENCY_BAD: NoteKind = NoteKind {
    id: "PRIORITY_URGENCY_BAD",
    category: Category::Connection,
    level: Level::Bad,
    summary: "The {field_name} urgency must be an integer from 0 to 7.",
    detail: "The 'u' parameter was {value}. Recipients ignore an out-of-range urgency and use the default of 3.",
};

pub static PRIORITY_INCREMENTAL_BAD: NoteKind = NoteKind {
    id: "PRIORITY_INCREMENTAL_BAD",
    category: Category::Connection,
    level: Level::Bad,
    summary: "The {field_name} incremental flag must be a boolean.",
    detail: "The 'i' parameter was {value}. Recipients ignore it and treat the response as non-incremental.",
};
