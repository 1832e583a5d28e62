// SPDX-FileCopyrightText: 2025 Alexandre Gomes Gaigalas <alganet@gmail.com>
//
// SPDX-License-Identifier: ISC

use crate::fields::structured::{param, BareItem, ListEntry, SfType, StructuredValue};
use crate::fields::{Discipline, FieldNotes, FieldValue};
use crate::note::{Category, Level, NoteKind};
use crate::rules::FieldRule;

const FWD_REASONS: &[&str] = &[
    "bypass",
    "method",
    "uri-miss",
    "vary-miss",
    "miss",
    "request",
    "stale",
    "partial",
];

/// One list member per cache that handled the response, closest to the
/// origin first.
pub struct CacheStatus;

impl FieldRule for CacheStatus {
    fn name(&self) -> &'static str {
        "Cache-Status"
    }

    fn aliases(&self) -> &'static [&'static str] {
        &["X-Cache-Status"]
    }

    fn discipline(&self) -> Discipline {
        Discipline::Structured(SfType::List)
    }

    fn valid_in_requests(&self) -> bool {
        false
    }

    fn evaluate(&self, value: &FieldValue, notes: &mut FieldNotes<'_>) {
        let FieldValue::Structured(StructuredValue::List(members)) = value else {
            return;
        };
        for member in members {
            let ListEntry::Item(item) = member else {
                notes.add(&CACHE_STATUS_BAD_MEMBER, &[]);
                continue;
            };
            let cache = match &item.value {
                BareItem::Token(s) | BareItem::String(s) => s.as_str(),
                _ => {
                    notes.add(&CACHE_STATUS_BAD_MEMBER, &[]);
                    continue;
                }
            };
            let hit = param(&item.params, "hit").and_then(BareItem::as_bool) == Some(true);
            match param(&item.params, "fwd") {
                Some(BareItem::Token(reason)) if FWD_REASONS.contains(&reason.as_str()) => {
                    if hit && reason != "stale" {
                        notes.add(&CACHE_STATUS_HIT_AND_FWD, &[("cache", &cache)]);
                    }
                }
                Some(other) => {
                    notes.add(
                        &CACHE_STATUS_BAD_FWD,
                        &[("cache", &cache), ("value", &format!("{:?}", other))],
                    );
                }
                None => {}
            }
            if let Some(ttl) = param(&item.params, "ttl") {
                if ttl.as_integer().is_none() {
                    notes.add(&CACHE_STATUS_BAD_TTL, &[("cache", &cache)]);
                }
            }
        }
    }
}

pub static CACHE_STATUS_BAD_MEMBER: NoteKind = NoteKind {
    id: "CACHE_STATUS_BAD_MEMBER",
    category: Category::Caching,
    level: Level::Bad,
    summary: "{field_name} members must identify a cache.",
    detail: "Each member of {field_name} is a token or string naming the cache that handled the response.",
};

pub static CACHE_STATUS_BAD_FWD: NoteKind = NoteKind {
    id: "CACHE_STATUS_BAD_FWD",
    category: Category::Caching,
    level: Level::Warn,
    summary: "{cache} gave an unknown forward reason in {field_name}.",
    detail: "The fwd parameter must be one of the registered reasons (bypass, method, uri-miss, vary-miss, miss, request, stale, partial); {value} is not one of them.",
};

pub static CACHE_STATUS_HIT_AND_FWD: NoteKind = NoteKind {
    id: "CACHE_STATUS_HIT_AND_FWD",
    category: Category::Caching,
    level: Level::Warn,
    summary: "{cache} claims both a hit and a forward in {field_name}.",
    detail: "A response served from cache shouldn't also be forwarded, except to revalidate a stale response (fwd=stale).",
};

pub static CACHE_STATUS_BAD_TTL: NoteKind = NoteKind {
    id: "CACHE_STATUS_BAD_TTL",
    category: Category::Caching,
    level: Level::Warn,
    summary: "{cache} gave a non-integer ttl in {field_name}.",
    detail: "The ttl parameter is the remaining freshness in whole seconds.",
};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::{MessageKind, STRUCTURED_FIELD_PARSE_ERROR};
    use crate::test_helpers::finished_section;
    use rstest::rstest;

    #[rstest]
    #[case("ExampleCache; hit", None)]
    #[case("OriginCache; fwd=uri-miss; stored, CDN; hit; ttl=30", None)]
    #[case("CDN; fwd=teapot", Some(&CACHE_STATUS_BAD_FWD))]
    #[case("CDN; hit; fwd=miss", Some(&CACHE_STATUS_HIT_AND_FWD))]
    #[case("CDN; hit; fwd=stale", None)]
    #[case("CDN; ttl=1.5", Some(&CACHE_STATUS_BAD_TTL))]
    #[case("42", Some(&CACHE_STATUS_BAD_MEMBER))]
    #[case("(a b)", Some(&CACHE_STATUS_BAD_MEMBER))]
    fn cache_status_members(#[case] raw: &str, #[case] expected: Option<&'static NoteKind>) {
        let (_section, notes) = finished_section(MessageKind::Response, &[("Cache-Status", raw)]);
        assert!(!notes.contains(&STRUCTURED_FIELD_PARSE_ERROR));
        match expected {
            Some(kind) => assert_eq!(notes.count(kind), 1),
            None => assert!(notes.is_empty(), "{:?}", notes.render()),
        }
    }

    #[test]
    fn legacy_name_is_an_alias() {
        let (section, notes) =
            finished_section(MessageKind::Response, &[("X-Cache-Status", "CDN; fwd=teapot")]);
        assert!(section.contains("x-cache-status"));
        let note = notes.find(&CACHE_STATUS_BAD_FWD).expect("fwd note");
        assert_eq!(note.subject(), "header-x-cache-status");
        assert_eq!(note.var("field_name"), Some("X-Cache-Status"));
    }
}
