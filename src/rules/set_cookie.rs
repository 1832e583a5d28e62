// SPDX-FileCopyrightText: 2025 Alexandre Gomes Gaigalas <alganet@gmail.com>
//
// SPDX-License-Identifier: ISC

use crate::fields::{Discipline, FieldNotes, FieldValue};
use crate::helpers::headers::trim_ows;
use crate::helpers::token::is_token;
use crate::note::{Category, Level, NoteKind};
use crate::rules::FieldRule;

/// Each line is one cookie: `name=value` followed by `;`-separated
/// attributes. Lines are never comma-split because `Expires` contains one.
pub struct SetCookie;

impl FieldRule for SetCookie {
    fn name(&self) -> &'static str {
        "Set-Cookie"
    }

    fn discipline(&self) -> Discipline {
        Discipline::Broken
    }

    fn valid_in_requests(&self) -> bool {
        false
    }

    fn parse(&self, raw: &str, notes: &mut FieldNotes<'_>) -> Option<FieldValue> {
        let mut parts = raw.split(';');
        let pair = parts.next().map(trim_ows).unwrap_or_default();
        let Some((name, value)) = pair.split_once('=') else {
            notes.add(&SET_COOKIE_NO_VALUE, &[("cookie", &raw)]);
            return None;
        };
        let name = trim_ows(name);
        if !is_token(name) {
            notes.add(&SET_COOKIE_BAD_NAME, &[("cookie_name", &name)]);
            return None;
        }
        let attributes = parts
            .map(trim_ows)
            .filter(|a| !a.is_empty())
            .map(|a| match a.split_once('=') {
                Some((k, v)) => (trim_ows(k).to_string(), Some(trim_ows(v).to_string())),
                None => (a.to_string(), None),
            })
            .collect();
        Some(FieldValue::Cookie {
            name: name.to_string(),
            value: trim_ows(value).to_string(),
            attributes,
        })
    }

    fn evaluate(&self, value: &FieldValue, notes: &mut FieldNotes<'_>) {
        for cookie in value.as_list() {
            let FieldValue::Cookie {
                name, attributes, ..
            } = cookie
            else {
                continue;
            };
            let attr = |wanted: &str| {
                attributes
                    .iter()
                    .find(|(k, _)| k.eq_ignore_ascii_case(wanted))
            };
            let secure = attr("secure").is_some();
            match attr("samesite") {
                Some((_, Some(v))) if v.eq_ignore_ascii_case("none") && !secure => {
                    notes.add(&SET_COOKIE_SAMESITE_NONE_INSECURE, &[("cookie_name", name)]);
                }
                Some((_, v)) => {
                    let v = v.as_deref().unwrap_or_default();
                    if !["strict", "lax", "none"]
                        .iter()
                        .any(|ok| v.eq_ignore_ascii_case(ok))
                    {
                        notes.add(
                            &SET_COOKIE_BAD_SAMESITE,
                            &[("cookie_name", name), ("value", &v)],
                        );
                    }
                }
                None => {}
            }
            if (name.starts_with("__Secure-") || name.starts_with("__Host-")) && !secure {
                notes.add(&SET_COOKIE_PREFIX_INSECURE, &[("cookie_name", name)]);
            }
        }
    }
}

pub static SET_COOKIE_NO_VALUE: NoteKind = NoteKind {
    id: "SET_COOKIE_NO_VALUE",
    category: Category::General,
    level: Level::Bad,
    summary: "{message} has a Set-Cookie without a name=value pair.",
    detail: "Browsers ignore cookies whose first part has no '='. The line '{cookie}' will be dropped.",
};

pub static SET_COOKIE_BAD_NAME: NoteKind = NoteKind {
    id: "SET_COOKIE_BAD_NAME",
    category: Category::General,
    level: Level::Bad,
    summary: "The cookie name '{cookie_name}' isn't valid.",
    detail: "Cookie names must be tokens. Browsers may reject or rename this cookie.",
};

pub static SET_COOKIE_SAMESITE_NONE_INSECURE: NoteKind = NoteKind {
    id: "SET_COOKIE_SAMESITE_NONE_INSECURE",
    category: Category::Security,
    level: Level::Bad,
    summary: "The {cookie_name} cookie uses SameSite=None without Secure.",
    detail: "Browsers reject SameSite=None cookies that aren't also marked Secure.",
};

pub static SET_COOKIE_BAD_SAMESITE: NoteKind = NoteKind {
    id: "SET_COOKIE_BAD_SAMESITE",
    category: Category::Security,
    level: Level::Warn,
    summary: "The {cookie_name} cookie has an unknown SameSite value.",
    detail: "SameSite must be Strict, Lax or None; '{value}' is not recognised and browsers apply their default policy.",
};

pub static SET_COOKIE_PREFIX_INSECURE: NoteKind = NoteKind {
    id: "SET_COOKIE_PREFIX_INSECURE",
    category: Category::Security,
    level: Level::Bad,
    summary: "The {cookie_name} cookie's prefix requires the Secure attribute.",
    detail: "Cookies named with the __Secure- or __Host- prefix are rejected by browsers unless they are marked Secure.",
};
