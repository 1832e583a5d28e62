// SPDX-FileCopyrightText: 2025 Alexandre Gomes Gaigalas <alganet@gmail.com>
//
// SPDX-License-Identifier: ISC

use crate::fields::{Discipline, FieldNotes, FieldValue, MessageView};
use crate::helpers::token::is_token;
use crate::note::{Category, Level, NoteKind};
use crate::rules::{FieldRule, Syntax};

/// Client hints a server asks for. When the response can be cached, every
/// hint it may vary on has to be listed in `Vary` too.
pub struct AcceptCh;

impl FieldRule for AcceptCh {
    fn name(&self) -> &'static str {
        "Accept-CH"
    }

    fn discipline(&self) -> Discipline {
        Discipline::List
    }

    fn valid_in_requests(&self) -> bool {
        false
    }

    fn syntax(&self) -> Option<Syntax> {
        Some(is_token)
    }

    fn post_check(&self, value: &FieldValue, msg: &MessageView<'_>, notes: &mut FieldNotes<'_>) {
        let Some(cache) = msg.cache else {
            return;
        };
        if !(cache.store_shared || cache.store_private) {
            return;
        }
        let vary = msg
            .headers
            .get("vary")
            .map(FieldValue::text_items)
            .unwrap_or_default();
        if vary.iter().any(|v| v == "*") {
            return;
        }
        let missing: Vec<String> = value
            .text_items()
            .into_iter()
            .filter(|hint| !vary.contains(hint))
            .collect();
        if missing.is_empty() {
            return;
        }
        let parent = notes.add(&ACCEPT_CH_VARY_INCOMPLETE, &[("count", &missing.len())]);
        for hint in &missing {
            parent.add_child(&ACCEPT_CH_VARY_MISSING, &[("hint", hint)]);
        }
    }
}

pub static ACCEPT_CH_VARY_INCOMPLETE: NoteKind = NoteKind {
    id: "ACCEPT_CH_VARY_INCOMPLETE",
    category: Category::ContentNegotiation,
    level: Level::Warn,
    summary: "{message} requests client hints that aren't listed in Vary.",
    detail: "{message} can be cached, and it asks for {count} client hint(s) in Accept-CH that Vary does not mention. Caches may serve a response tailored to one client's hints to another.",
};

pub static ACCEPT_CH_VARY_MISSING: NoteKind = NoteKind {
    id: "ACCEPT_CH_VARY_MISSING",
    category: Category::ContentNegotiation,
    level: Level::Warn,
    summary: "{hint} is missing from Vary.",
    detail: "Add {hint} to the Vary field if the content depends on it.",
};
