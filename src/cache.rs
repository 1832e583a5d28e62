// SPDX-FileCopyrightText: 2025 Alexandre Gomes Gaigalas <alganet@gmail.com>
//
// SPDX-License-Identifier: ISC

//! Response cacheability and freshness.
//!
//! Runs once per response, after its headers are finished. Each step of
//! the pipeline may stop the remaining ones; whatever state was reached is
//! kept.

use crate::fields::{FieldSection, FieldValue};
use crate::http_date::{relative_offset, relative_time};
use crate::note::{Category, Level, NoteKind, NoteVars, Notes};
use serde::Serialize;
use std::collections::HashMap;
use std::ops::ControlFlow;

const CACHEABLE_METHODS: &[&str] = &["GET"];

/// Status codes a cache may assign heuristic freshness to.
const HEURISTIC_STATUSES: &[u16] = &[200, 203, 206, 300, 301, 410];

/// Seconds of disagreement tolerated between `Date` and the observation time.
const MAX_CLOCK_SKEW: i64 = 5;

/// Largest `Age` taken at face value; anything above is read as this.
const MAX_AGE: i64 = 1 << 31;

/// Directives checked for case and repetition.
const KNOWN_DIRECTIVES: &[&str] = &[
    "max-age",
    "no-store",
    "s-maxage",
    "public",
    "private",
    "pre-check",
    "post-check",
    "stale-while-revalidate",
    "stale-if-error",
];

/// Outcome of the cache checks, in seconds where applicable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CacheState {
    pub store_shared: bool,
    pub store_private: bool,
    /// Current age: the larger of `Age` and the apparent age.
    pub age: i64,
    pub freshness_lifetime_shared: i64,
    pub freshness_lifetime_private: i64,
    pub freshness_left: i64,
    pub fresh: bool,
}

/// What the engine reads from a finished response.
pub struct CacheInput<'a> {
    pub headers: &'a FieldSection,
    pub status: Option<u16>,
    /// Method of the request this response answers, when known.
    pub method: Option<&'a str>,
    pub request_headers: Option<&'a FieldSection>,
    /// Seconds since the epoch at which the response was received.
    pub observed_at: Option<i64>,
}

/// Evaluate cacheability and freshness, appending notes as it goes.
pub fn check(input: &CacheInput<'_>, notes: &mut Notes) -> CacheState {
    if !input.headers.is_finished() {
        tracing::warn!("cache checks requested before headers were finished; skipping");
        return CacheState::default();
    }
    let mut engine = Engine {
        input,
        notes,
        cc: Directives::from_headers(input.headers),
        state: CacheState::default(),
    };
    let _ = engine.run();
    engine.state
}

/// First-seen value per lowercased directive name, plus the raw list.
struct Directives {
    raw: Vec<(String, Option<String>)>,
    first: HashMap<String, Option<String>>,
}

impl Directives {
    fn from_headers(headers: &FieldSection) -> Self {
        let raw: Vec<(String, Option<String>)> = headers
            .get("cache-control")
            .map(FieldValue::as_list)
            .unwrap_or_default()
            .iter()
            .filter_map(|d| match d {
                FieldValue::Directive { name, value } => Some((name.clone(), value.clone())),
                _ => None,
            })
            .collect();
        let mut first = HashMap::new();
        for (name, value) in &raw {
            first
                .entry(name.to_ascii_lowercase())
                .or_insert_with(|| value.clone());
        }
        Self { raw, first }
    }

    fn has(&self, name: &str) -> bool {
        self.first.contains_key(name)
    }

    fn value(&self, name: &str) -> Option<&str> {
        self.first.get(name).and_then(|v| v.as_deref())
    }

    fn seconds(&self, name: &str) -> Option<i64> {
        self.value(name).and_then(|v| v.parse::<i64>().ok())
    }
}

struct Engine<'a, 'n> {
    input: &'a CacheInput<'a>,
    notes: &'n mut Notes,
    cc: Directives,
    state: CacheState,
}

impl Engine<'_, '_> {
    fn run(&mut self) -> ControlFlow<()> {
        self.check_method()?;
        self.check_last_modified();
        self.check_cache_control()?;
        self.check_vary()?;
        self.check_freshness();
        ControlFlow::Continue(())
    }

    fn note(&mut self, subject: &str, kind: &'static NoteKind, vars: NoteVars<'_>) {
        self.notes.add(subject, kind, vars);
    }

    fn date(&self, name: &str) -> Option<i64> {
        self.input.headers.get(name).and_then(FieldValue::as_date)
    }

    fn has_value(&self, name: &str) -> bool {
        self.input.headers.get(name).is_some_and(|v| !v.is_null())
    }

    fn check_method(&mut self) -> ControlFlow<()> {
        let Some(method) = self.input.method else {
            return ControlFlow::Continue(());
        };
        if CACHEABLE_METHODS.contains(&method) {
            return ControlFlow::Continue(());
        }
        self.state.store_shared = false;
        self.state.store_private = false;
        self.note("method", &METHOD_UNCACHEABLE, &[("method", &method)]);
        ControlFlow::Break(())
    }

    fn check_last_modified(&mut self) {
        let Some(last_modified) = self.date("last-modified") else {
            return;
        };
        let Some(reference) = self.date("date").or(self.input.observed_at) else {
            return;
        };
        let subject = "header-last-modified header-date";
        if last_modified > reference {
            self.note(subject, &LM_FUTURE, &[]);
        } else {
            let since = relative_time(reference - last_modified);
            self.note(subject, &LM_PRESENT, &[("last_modified_string", &since)]);
        }
    }

    fn check_cache_control(&mut self) -> ControlFlow<()> {
        let subject = "header-cache-control";
        let mut counts: HashMap<String, usize> = HashMap::new();
        let mut miscapped: Vec<String> = Vec::new();
        for (name, _) in &self.cc.raw {
            let lower = name.to_ascii_lowercase();
            if !KNOWN_DIRECTIVES.contains(&lower.as_str()) {
                continue;
            }
            if *name != lower && !miscapped.contains(&lower) {
                miscapped.push(lower.clone());
            }
            *counts.entry(lower).or_default() += 1;
        }
        for directive in miscapped {
            self.note(subject, &CC_MISCAP, &[("cc", &directive)]);
        }
        let mut repeated: Vec<(String, usize)> =
            counts.into_iter().filter(|(_, n)| *n > 1).collect();
        repeated.sort();
        for (directive, count) in repeated {
            self.note(subject, &CC_DUP, &[("cc", &directive), ("count", &count)]);
        }

        let has_auth = self
            .input
            .request_headers
            .is_some_and(|h| h.contains("authorization"));
        if self.cc.has("no-store") {
            self.state.store_shared = false;
            self.state.store_private = false;
            self.note(subject, &NO_STORE, &[]);
            return ControlFlow::Break(());
        } else if self.cc.has("private") {
            self.state.store_shared = false;
            self.state.store_private = true;
            self.note(subject, &PRIVATE_CC, &[]);
            if self.cc.has("public") {
                self.note(subject, &PRIVATE_PUBLIC_CONFLICT, &[]);
            }
        } else if has_auth {
            if self.cc.has("public") {
                self.state.store_shared = true;
                self.state.store_private = true;
                self.note(subject, &PUBLIC_AUTH, &[]);
            } else {
                self.state.store_shared = false;
                self.state.store_private = true;
                self.note(subject, &PRIVATE_AUTH, &[]);
            }
        } else {
            self.state.store_shared = true;
            self.state.store_private = true;
            self.note("", &STOREABLE, &[]);
            if self.cc.has("public") {
                self.note(subject, &PUBLIC_REDUNDANT, &[]);
            }
        }

        if self.cc.has("no-cache") {
            if self.has_value("etag") || self.has_value("last-modified") {
                self.note(subject, &NO_CACHE, &[]);
            } else {
                self.note(subject, &NO_CACHE_NO_VALIDATOR, &[]);
            }
        }

        self.check_pre_post();
        ControlFlow::Continue(())
    }

    fn check_pre_post(&mut self) {
        let subject = "header-cache-control";
        let has_pre = self.cc.has("pre-check");
        let has_post = self.cc.has("post-check");
        if !has_pre && !has_post {
            return;
        }
        if !(has_pre && has_post) {
            self.note(subject, &CHECK_SINGLE, &[]);
            return;
        }
        let (Some(pre), Some(post)) = (self.cc.seconds("pre-check"), self.cc.seconds("post-check"))
        else {
            self.note(subject, &CHECK_NOT_INTEGER, &[]);
            return;
        };
        if pre == 0 && post == 0 {
            self.note(subject, &CHECK_ALL_ZERO, &[]);
        } else if post > pre {
            self.note(subject, &CHECK_POST_BIGGER, &[]);
        } else if post == 0 {
            self.note(subject, &CHECK_POST_ZERO, &[]);
        } else {
            self.note(subject, &CHECK_POST_PRE, &[("pre_check", &pre), ("post_check", &post)]);
        }
    }

    fn check_vary(&mut self) -> ControlFlow<()> {
        let vary = self
            .input
            .headers
            .get("vary")
            .map(FieldValue::text_items)
            .unwrap_or_default();
        let subject = "header-vary";
        if vary.iter().any(|v| v == "*") {
            self.state.store_shared = false;
            self.state.store_private = false;
            self.note(subject, &VARY_ASTERISK, &[]);
            return ControlFlow::Break(());
        }
        if vary.len() > 3 {
            self.note(subject, &VARY_COMPLEX, &[("vary_count", &vary.len())]);
        }
        if vary.iter().any(|v| v == "user-agent") {
            self.note(subject, &VARY_USER_AGENT, &[]);
        }
        if vary.iter().any(|v| v == "host") {
            self.note(subject, &VARY_HOST, &[]);
        }
        ControlFlow::Continue(())
    }

    fn check_freshness(&mut self) {
        let date = self.date("date");
        let observed_at = self.input.observed_at;
        let age = self
            .input
            .headers
            .get("age")
            .and_then(FieldValue::as_integer)
            .map_or(0, |a| i64::try_from(a).map_or(MAX_AGE, |a| a.min(MAX_AGE)));
        let apparent_age = match (observed_at, date) {
            (Some(now), Some(date)) => now.saturating_sub(date).max(0),
            _ => 0,
        };
        let current_age = apparent_age.max(age);
        self.state.age = current_age;
        if age >= 1 {
            let age_str = relative_time(age);
            self.note("header-age header-date", &CURRENT_AGE, &[("age", &age_str)]);
        }

        self.check_clock(date, age, current_age);

        let mut subjects = vec!["header-date"];
        let mut has_explicit = false;
        let mut has_cc_freshness = false;
        let mut shared: Option<i64> = None;
        let mut private: Option<i64> = None;
        if let Some(max_age) = self.cc.seconds("max-age") {
            shared = Some(max_age);
            private = Some(max_age);
            has_explicit = true;
            has_cc_freshness = true;
        }
        if let Some(s_maxage) = self.cc.seconds("s-maxage") {
            shared = Some(s_maxage);
            has_explicit = true;
            has_cc_freshness = true;
        }
        if has_cc_freshness {
            subjects.push("header-cache-control");
        }
        if self.input.headers.contains("expires") {
            has_explicit = true;
            subjects.push("header-expires");
            let reference = date.or(observed_at);
            let lifetime = match (self.date("expires"), reference) {
                (Some(expires), Some(reference)) => expires.saturating_sub(reference),
                _ => 0,
            };
            for slot in [&mut shared, &mut private] {
                if slot.unwrap_or(0) == 0 {
                    *slot = Some(lifetime);
                }
            }
        }
        let shared = shared.unwrap_or(0);
        let private = private.unwrap_or(0);
        let freshness_left = private.saturating_sub(current_age);
        let fresh = freshness_left > 0;
        self.state.freshness_lifetime_shared = shared;
        self.state.freshness_lifetime_private = private;
        self.state.freshness_left = freshness_left;
        self.state.fresh = fresh;

        let subject = subjects.join(" ");
        let lifetime_str = relative_time(private);
        let left_str = relative_time(freshness_left);
        let current_age_str = relative_time(current_age);
        let vars: NoteVars<'_> = &[
            ("freshness_lifetime", &lifetime_str),
            ("freshness_left", &left_str),
            ("current_age", &current_age_str),
        ];
        if has_explicit {
            if fresh {
                self.note(&subject, &FRESHNESS_FRESH, vars);
            } else if has_cc_freshness && age > private {
                self.note(&subject, &FRESHNESS_STALE_CACHE, vars);
            } else {
                self.note(&subject, &FRESHNESS_STALE_ALREADY, vars);
            }
        } else if self
            .input
            .status
            .is_some_and(|s| HEURISTIC_STATUSES.contains(&s))
        {
            self.note(&subject, &FRESHNESS_HEURISTIC, &[]);
        } else {
            self.note(&subject, &FRESHNESS_NONE, &[]);
        }

        let subject = "header-cache-control";
        if self.cc.has("must-revalidate") {
            if fresh {
                self.note(subject, &FRESH_MUST_REVALIDATE, &[]);
            } else if has_explicit {
                self.note(subject, &STALE_MUST_REVALIDATE, &[]);
            }
        } else if self.cc.has("proxy-revalidate") || self.cc.has("s-maxage") {
            if fresh {
                self.note(subject, &FRESH_PROXY_REVALIDATE, &[]);
            } else if has_explicit {
                self.note(subject, &STALE_PROXY_REVALIDATE, &[]);
            }
        } else if fresh {
            self.note(subject, &FRESH_SERVABLE, &[]);
        } else if has_explicit {
            self.note(subject, &STALE_SERVABLE, &[]);
        }
    }

    fn check_clock(&mut self, date: Option<i64>, age: i64, current_age: i64) {
        let subject = "header-date";
        let Some(date) = date else {
            self.note(subject, &DATE_CLOCKLESS, &[]);
            if self.input.headers.contains("expires") || self.input.headers.contains("last-modified")
            {
                self.note(subject, &DATE_CLOCKLESS_BAD_HDR, &[]);
            }
            return;
        };
        let Some(now) = self.input.observed_at else {
            return;
        };
        let skew = date.saturating_sub(now).saturating_add(age);
        if age > MAX_CLOCK_SKEW && current_age.saturating_sub(skew) < MAX_CLOCK_SKEW {
            self.note("header-date header-age", &AGE_PENALTY, &[]);
        } else if skew.unsigned_abs() > MAX_CLOCK_SKEW.unsigned_abs() {
            let offset = relative_offset(skew);
            self.note(subject, &DATE_INCORRECT, &[("clock_skew_string", &offset)]);
        } else {
            self.note(subject, &DATE_CORRECT, &[]);
        }
    }
}

pub static METHOD_UNCACHEABLE: NoteKind = NoteKind {
    id: "METHOD_UNCACHEABLE",
    category: Category::Caching,
    level: Level::Info,
    summary: "Responses to the {method} method can't be stored by caches.",
    detail: "Only responses to GET are considered for storage here, so no further cache checks were made.",
};

pub static LM_FUTURE: NoteKind = NoteKind {
    id: "LM_FUTURE",
    category: Category::Caching,
    level: Level::Bad,
    summary: "The Last-Modified time is in the future.",
    detail: "The Last-Modified header indicates that the response was last changed after it was sent, which is impossible. Caches may ignore it or miscompute heuristic freshness.",
};

pub static LM_PRESENT: NoteKind = NoteKind {
    id: "LM_PRESENT",
    category: Category::Caching,
    level: Level::Info,
    summary: "The resource last changed {last_modified_string} ago.",
    detail: "The Last-Modified header gives the time the resource last changed. Caches can use it to validate stored responses and to compute heuristic freshness.",
};

pub static CC_MISCAP: NoteKind = NoteKind {
    id: "CC_MISCAP",
    category: Category::Caching,
    level: Level::Warn,
    summary: "The {cc} Cache-Control directive appears to have incorrect capitalisation.",
    detail: "Cache-Control directive names are case-sensitive, so '{cc}' written with different capitals will be ignored by most caches.",
};

pub static CC_DUP: NoteKind = NoteKind {
    id: "CC_DUP",
    category: Category::Caching,
    level: Level::Warn,
    summary: "The {cc} Cache-Control directive appears {count} times.",
    detail: "Caches may use any of the values of a repeated directive, leading to unpredictable behaviour. The first one has been used here.",
};

pub static NO_STORE: NoteKind = NoteKind {
    id: "NO_STORE",
    category: Category::Caching,
    level: Level::Info,
    summary: "{message} can't be stored by a cache.",
    detail: "The Cache-Control: no-store directive prevents both shared and private caches from keeping a copy.",
};

pub static PRIVATE_CC: NoteKind = NoteKind {
    id: "PRIVATE_CC",
    category: Category::Caching,
    level: Level::Info,
    summary: "{message} only allows a private cache to store it.",
    detail: "Cache-Control: private allows browser caches to store the response but not shared caches such as proxies and CDNs.",
};

pub static PRIVATE_AUTH: NoteKind = NoteKind {
    id: "PRIVATE_AUTH",
    category: Category::Caching,
    level: Level::Info,
    summary: "{message} only allows a private cache to store it.",
    detail: "The request carried Authorization and the response doesn't mark itself public, so shared caches won't store it.",
};

pub static PUBLIC_AUTH: NoteKind = NoteKind {
    id: "PUBLIC_AUTH",
    category: Category::Caching,
    level: Level::Info,
    summary: "{message} allows all caches to store it.",
    detail: "The request carried Authorization, but Cache-Control: public explicitly allows shared caches to store the response anyway.",
};

pub static STOREABLE: NoteKind = NoteKind {
    id: "STOREABLE",
    category: Category::Caching,
    level: Level::Info,
    summary: "{message} allows all caches to store it.",
    detail: "Nothing in the request or response prevents shared or private caches from storing it.",
};

pub static PUBLIC_REDUNDANT: NoteKind = NoteKind {
    id: "PUBLIC_REDUNDANT",
    category: Category::Caching,
    level: Level::Info,
    summary: "Cache-Control: public is rarely necessary.",
    detail: "Responses to requests without Authorization are already storable by shared caches; public only changes that for authenticated requests.",
};

pub static PRIVATE_PUBLIC_CONFLICT: NoteKind = NoteKind {
    id: "PRIVATE_PUBLIC_CONFLICT",
    category: Category::Caching,
    level: Level::Warn,
    summary: "{message} is both public and private.",
    detail: "Cache-Control lists both public and private. Most caches will honour private, but the combination is contradictory and should be fixed.",
};

pub static NO_CACHE: NoteKind = NoteKind {
    id: "NO_CACHE",
    category: Category::Caching,
    level: Level::Info,
    summary: "{message} can't be served from cache without validation.",
    detail: "Cache-Control: no-cache lets caches store the response but requires them to check with the origin before each reuse.",
};

pub static NO_CACHE_NO_VALIDATOR: NoteKind = NoteKind {
    id: "NO_CACHE_NO_VALIDATOR",
    category: Category::Caching,
    level: Level::Info,
    summary: "{message} can't be served from cache.",
    detail: "Cache-Control: no-cache requires validation before reuse, but the response has neither ETag nor Last-Modified, so caches cannot validate it and will refetch it every time.",
};

pub static CHECK_SINGLE: NoteKind = NoteKind {
    id: "CHECK_SINGLE",
    category: Category::Caching,
    level: Level::Warn,
    summary: "Only one of the pre-check and post-check Cache-Control directives is present.",
    detail: "These extensions only take effect when both are present; a lone one is ignored.",
};

pub static CHECK_NOT_INTEGER: NoteKind = NoteKind {
    id: "CHECK_NOT_INTEGER",
    category: Category::Caching,
    level: Level::Warn,
    summary: "One of the pre-check/post-check Cache-Control directives has a non-integer value.",
    detail: "Both directives take a number of seconds; they have no effect otherwise.",
};

pub static CHECK_ALL_ZERO: NoteKind = NoteKind {
    id: "CHECK_ALL_ZERO",
    category: Category::Caching,
    level: Level::Warn,
    summary: "The pre-check and post-check Cache-Control directives are both '0'.",
    detail: "Setting both to zero has no effect; they are usually copied from examples and can be removed.",
};

pub static CHECK_POST_BIGGER: NoteKind = NoteKind {
    id: "CHECK_POST_BIGGER",
    category: Category::Caching,
    level: Level::Warn,
    summary: "The post-check Cache-Control directive's value is larger than pre-check's.",
    detail: "post-check must not exceed pre-check; clients treat it as equal to pre-check.",
};

pub static CHECK_POST_ZERO: NoteKind = NoteKind {
    id: "CHECK_POST_ZERO",
    category: Category::Caching,
    level: Level::Bad,
    summary: "The post-check Cache-Control directive's value is '0'.",
    detail: "A post-check of zero makes the client revalidate the response in the background on every use.",
};

pub static CHECK_POST_PRE: NoteKind = NoteKind {
    id: "CHECK_POST_PRE",
    category: Category::Caching,
    level: Level::Info,
    summary: "{message} may be refreshed in the background by clients.",
    detail: "After {post_check} seconds the client will refresh it in the background after use; after {pre_check} seconds it will be refreshed before use.",
};

pub static VARY_ASTERISK: NoteKind = NoteKind {
    id: "VARY_ASTERISK",
    category: Category::Caching,
    level: Level::Warn,
    summary: "Vary: * effectively makes {message} uncacheable.",
    detail: "'Vary: *' means the response depends on things outside the request, so no stored copy can ever be reused.",
};

pub static VARY_COMPLEX: NoteKind = NoteKind {
    id: "VARY_COMPLEX",
    category: Category::Caching,
    level: Level::Warn,
    summary: "This resource varies in {vary_count} ways.",
    detail: "Each extra field in Vary multiplies the number of stored variants and lowers the chance of a cache hit.",
};

pub static VARY_USER_AGENT: NoteKind = NoteKind {
    id: "VARY_USER_AGENT",
    category: Category::Caching,
    level: Level::Info,
    summary: "Vary: User-Agent can cause cache inefficiency.",
    detail: "There are many distinct User-Agent strings, so caches will store many copies of the same content.",
};

pub static VARY_HOST: NoteKind = NoteKind {
    id: "VARY_HOST",
    category: Category::Caching,
    level: Level::Warn,
    summary: "Vary: Host is not necessary.",
    detail: "The Host is already part of the cache key, so varying on it has no effect other than confusing some caches.",
};

pub static CURRENT_AGE: NoteKind = NoteKind {
    id: "CURRENT_AGE",
    category: Category::Caching,
    level: Level::Info,
    summary: "{message} has been cached for {age}.",
    detail: "The Age header shows how long the response has been held by caches between the origin and here.",
};

pub static DATE_CLOCKLESS: NoteKind = NoteKind {
    id: "DATE_CLOCKLESS",
    category: Category::Caching,
    level: Level::Warn,
    summary: "{message} doesn't have a Date header.",
    detail: "Without Date, caches can't reliably compute the response's age, and recipients can't tell when it was generated.",
};

pub static DATE_CLOCKLESS_BAD_HDR: NoteKind = NoteKind {
    id: "DATE_CLOCKLESS_BAD_HDR",
    category: Category::Caching,
    level: Level::Bad,
    summary: "Responses without a Date aren't allowed to have Expires or Last-Modified values.",
    detail: "A server without a reliable clock must not send Expires or Last-Modified, because their values would be meaningless.",
};

pub static AGE_PENALTY: NoteKind = NoteKind {
    id: "AGE_PENALTY",
    category: Category::Caching,
    level: Level::Warn,
    summary: "It appears that the Date header has been changed by an intermediary.",
    detail: "The Age is larger than the difference between Date and now would allow. An intermediary probably rewrote Date or Age, which makes the response look older or younger than it is.",
};

pub static DATE_INCORRECT: NoteKind = NoteKind {
    id: "DATE_INCORRECT",
    category: Category::Caching,
    level: Level::Warn,
    summary: "The server's clock is {clock_skew_string}.",
    detail: "The Date header disagrees with the time the response was received. Clock skew confuses cache freshness calculations; servers should synchronise their clocks.",
};

pub static DATE_CORRECT: NoteKind = NoteKind {
    id: "DATE_CORRECT",
    category: Category::Caching,
    level: Level::Good,
    summary: "The server's clock is correct.",
    detail: "The Date header matches the time the response was received.",
};

pub static FRESHNESS_FRESH: NoteKind = NoteKind {
    id: "FRESHNESS_FRESH",
    category: Category::Caching,
    level: Level::Good,
    summary: "{message} is fresh until {freshness_left} from now.",
    detail: "It has a freshness lifetime of {freshness_lifetime} and a current age of {current_age}, so caches can serve it without contacting the origin for {freshness_left} more.",
};

pub static FRESHNESS_STALE_CACHE: NoteKind = NoteKind {
    id: "FRESHNESS_STALE_CACHE",
    category: Category::Caching,
    level: Level::Warn,
    summary: "{message} has been served stale by a cache.",
    detail: "It has a freshness lifetime of {freshness_lifetime} but has been cached for {current_age}, so a cache served it after it went stale.",
};

pub static FRESHNESS_STALE_ALREADY: NoteKind = NoteKind {
    id: "FRESHNESS_STALE_ALREADY",
    category: Category::Caching,
    level: Level::Info,
    summary: "{message} is already stale.",
    detail: "Its freshness lifetime of {freshness_lifetime} is no longer than its current age of {current_age}, so caches must validate it before reuse.",
};

pub static FRESHNESS_HEURISTIC: NoteKind = NoteKind {
    id: "FRESHNESS_HEURISTIC",
    category: Category::Caching,
    level: Level::Warn,
    summary: "{message} allows a cache to assign its own freshness lifetime.",
    detail: "There is no explicit freshness information, but the status code allows caches to compute a heuristic lifetime, usually from Last-Modified. Explicit freshness gives more predictable results.",
};

pub static FRESHNESS_NONE: NoteKind = NoteKind {
    id: "FRESHNESS_NONE",
    category: Category::Caching,
    level: Level::Info,
    summary: "{message} can only be served by a cache under exceptional circumstances.",
    detail: "It has no explicit freshness and its status code doesn't allow heuristic freshness, so caches will only reuse it when disconnected from the origin.",
};

pub static FRESH_MUST_REVALIDATE: NoteKind = NoteKind {
    id: "FRESH_MUST_REVALIDATE",
    category: Category::Caching,
    level: Level::Info,
    summary: "{message} cannot be served stale by caches.",
    detail: "Cache-Control: must-revalidate forbids serving it once stale, even when the origin is unreachable.",
};

pub static STALE_MUST_REVALIDATE: NoteKind = NoteKind {
    id: "STALE_MUST_REVALIDATE",
    category: Category::Caching,
    level: Level::Info,
    summary: "{message} cannot be served by caches, because it is stale.",
    detail: "It is stale and Cache-Control: must-revalidate requires successful validation before reuse.",
};

pub static FRESH_PROXY_REVALIDATE: NoteKind = NoteKind {
    id: "FRESH_PROXY_REVALIDATE",
    category: Category::Caching,
    level: Level::Info,
    summary: "{message} cannot be served stale by shared caches.",
    detail: "proxy-revalidate (or s-maxage) forbids shared caches from serving it once stale; private caches may still do so.",
};

pub static STALE_PROXY_REVALIDATE: NoteKind = NoteKind {
    id: "STALE_PROXY_REVALIDATE",
    category: Category::Caching,
    level: Level::Info,
    summary: "{message} cannot be served by shared caches, because it is stale.",
    detail: "It is stale and proxy-revalidate (or s-maxage) requires shared caches to validate it before reuse.",
};

pub static FRESH_SERVABLE: NoteKind = NoteKind {
    id: "FRESH_SERVABLE",
    category: Category::Caching,
    level: Level::Info,
    summary: "{message} may still be served by caches once it becomes stale.",
    detail: "Nothing forbids serving it stale, so caches may do so when they can't reach the origin.",
};

pub static STALE_SERVABLE: NoteKind = NoteKind {
    id: "STALE_SERVABLE",
    category: Category::Caching,
    level: Level::Info,
    summary: "{message} might be served by caches, even though it is stale.",
    detail: "It is stale, but nothing forbids caches from serving it when they can't reach the origin.",
};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::MessageKind;
    use crate::test_helpers::{finished_section, http_date, T0};
    use rstest::rstest;

    fn run(
        response: &[(&str, &str)],
        request: Option<(&str, &[(&str, &str)])>,
        status: Option<u16>,
        observed_at: Option<i64>,
    ) -> (CacheState, Notes) {
        let (headers, mut notes) = finished_section(MessageKind::Response, response);
        let req = request.map(|(m, h)| (m, finished_section(MessageKind::Request, h).0));
        let input = CacheInput {
            headers: &headers,
            status,
            method: req.as_ref().map(|(m, _)| *m),
            request_headers: req.as_ref().map(|(_, h)| h),
            observed_at,
        };
        let state = check(&input, &mut notes);
        (state, notes)
    }

    #[rstest]
    #[case(&[("Cache-Control", "no-store")], &[], false, false)]
    #[case(&[("Cache-Control", "private")], &[], false, true)]
    #[case(&[], &[("Authorization", "Bearer x")], false, true)]
    #[case(&[("Cache-Control", "public")], &[("Authorization", "Bearer x")], true, true)]
    #[case(&[], &[], true, true)]
    #[case(&[("Vary", "*")], &[], false, false)]
    fn storability_truth_table(
        #[case] response: &[(&str, &str)],
        #[case] request: &[(&str, &str)],
        #[case] shared: bool,
        #[case] private: bool,
    ) {
        let (state, _notes) = run(response, Some(("GET", request)), Some(200), Some(T0));
        assert_eq!(state.store_shared, shared);
        assert_eq!(state.store_private, private);
    }

    #[test]
    fn uncacheable_method_stops_the_pipeline() {
        let (state, notes) = run(
            &[("Cache-Control", "max-age=60")],
            Some(("POST", &[])),
            Some(200),
            Some(T0),
        );
        assert!(!state.store_shared && !state.store_private);
        assert!(notes.contains(&METHOD_UNCACHEABLE));
        assert!(!notes.contains(&FRESHNESS_FRESH));
    }

    #[test]
    fn no_store_stops_before_freshness() {
        let (_state, notes) = run(&[("Cache-Control", "no-store, max-age=60")], None, Some(200), None);
        assert!(notes.contains(&NO_STORE));
        assert!(!notes.contains(&FRESHNESS_FRESH));
        assert!(!notes.contains(&DATE_CLOCKLESS));
    }

    #[rstest]
    #[case(30, true, 30)]
    #[case(90, false, -30)]
    #[case(60, false, 0)]
    fn freshness_arithmetic(#[case] elapsed: i64, #[case] fresh: bool, #[case] left: i64) {
        let date = http_date(T0);
        let (state, notes) = run(
            &[("Date", &date), ("Cache-Control", "max-age=60")],
            None,
            Some(200),
            Some(T0 + elapsed),
        );
        assert_eq!(state.fresh, fresh);
        assert_eq!(state.freshness_left, left);
        assert_eq!(state.age, elapsed);
        assert_eq!(notes.contains(&FRESHNESS_FRESH), fresh);
        assert_eq!(notes.contains(&FRESHNESS_STALE_ALREADY), !fresh);
        assert_eq!(notes.contains(&FRESH_SERVABLE), fresh);
        assert_eq!(notes.contains(&STALE_SERVABLE), !fresh);
    }

    #[test]
    fn s_maxage_overrides_shared_only() {
        let date = http_date(T0);
        let (state, notes) = run(
            &[("Date", &date), ("Cache-Control", "max-age=60, s-maxage=600")],
            None,
            Some(200),
            Some(T0),
        );
        assert_eq!(state.freshness_lifetime_shared, 600);
        assert_eq!(state.freshness_lifetime_private, 60);
        assert!(notes.contains(&FRESH_PROXY_REVALIDATE));
    }

    #[test]
    fn expires_backfills_lifetimes() {
        let date = http_date(T0);
        let expires = http_date(T0 + 3600);
        let (state, notes) = run(
            &[("Date", &date), ("Expires", &expires), ("Cache-Control", "s-maxage=10")],
            None,
            Some(200),
            Some(T0),
        );
        assert_eq!(state.freshness_lifetime_shared, 10);
        assert_eq!(state.freshness_lifetime_private, 3600);
        let note = notes.find(&FRESHNESS_FRESH).expect("fresh note");
        assert_eq!(
            note.subject(),
            "header-date header-cache-control header-expires"
        );
    }

    #[test]
    fn malformed_expires_means_stale() {
        let date = http_date(T0);
        let (state, notes) = run(&[("Date", &date), ("Expires", "0")], None, Some(200), Some(T0));
        assert!(!state.fresh);
        assert_eq!(state.freshness_lifetime_private, 0);
        assert!(notes.contains(&FRESHNESS_STALE_ALREADY));
        assert!(!notes.contains(&FRESHNESS_HEURISTIC));
    }

    #[test]
    fn cached_past_lifetime_is_stale_by_cache() {
        let date = http_date(T0);
        let (_state, notes) = run(
            &[("Date", &date), ("Age", "120"), ("Cache-Control", "max-age=60, must-revalidate")],
            None,
            Some(200),
            Some(T0 + 120),
        );
        assert!(notes.contains(&FRESHNESS_STALE_CACHE));
        assert!(notes.contains(&STALE_MUST_REVALIDATE));
        let note = notes.find(&CURRENT_AGE).expect("age note");
        assert_eq!(note.var("age"), Some("2 min"));
    }

    #[rstest]
    #[case(Some(200), &FRESHNESS_HEURISTIC)]
    #[case(Some(410), &FRESHNESS_HEURISTIC)]
    #[case(Some(404), &FRESHNESS_NONE)]
    #[case(None, &FRESHNESS_NONE)]
    fn heuristic_statuses(#[case] status: Option<u16>, #[case] expected: &'static NoteKind) {
        let (_state, notes) = run(&[], None, status, None);
        assert!(notes.contains(expected));
    }

    #[rstest]
    #[case(0, 0, Some(&DATE_CORRECT), None)]
    #[case(30, 0, Some(&DATE_INCORRECT), Some("30 sec ahead"))]
    #[case(-30, 0, Some(&DATE_INCORRECT), Some("30 sec behind"))]
    #[case(3, 0, Some(&DATE_CORRECT), None)]
    #[case(0, 100, Some(&AGE_PENALTY), None)]
    #[case(-100, 100, Some(&DATE_CORRECT), None)]
    #[case(0, u64::MAX, Some(&AGE_PENALTY), None)]
    #[case(10, i64::MAX as u64, Some(&AGE_PENALTY), None)]
    fn clock_skew(
        #[case] date_offset: i64,
        #[case] age: u64,
        #[case] expected: Option<&'static NoteKind>,
        #[case] skew_string: Option<&str>,
    ) {
        let date = http_date(T0 + date_offset);
        let age = age.to_string();
        let (_state, notes) = run(&[("Date", &date), ("Age", &age)], None, Some(200), Some(T0));
        if let Some(kind) = expected {
            let note = notes.find(kind).expect("clock note");
            assert_eq!(note.var("clock_skew_string"), skew_string);
        }
    }

    #[rstest]
    #[case(&[], false)]
    #[case(&[("Expires", "Thu, 01 Dec 1994 16:00:00 GMT")], true)]
    #[case(&[("Last-Modified", "Thu, 01 Dec 1994 16:00:00 GMT")], true)]
    fn missing_date(#[case] response: &[(&str, &str)], #[case] bad_hdr: bool) {
        let (_state, notes) = run(response, None, Some(200), Some(T0));
        assert_eq!(notes.count(&DATE_CLOCKLESS), 1);
        assert_eq!(notes.contains(&DATE_CLOCKLESS_BAD_HDR), bad_hdr);
    }

    #[test]
    fn oversized_age_is_capped() {
        let date = http_date(T0);
        let expires = http_date(T0 - 100);
        let (state, notes) = run(
            &[("Date", &date), ("Expires", &expires), ("Age", "18446744073709551615")],
            None,
            Some(200),
            Some(T0),
        );
        assert_eq!(state.age, MAX_AGE);
        assert_eq!(state.freshness_left, -100 - MAX_AGE);
        assert!(!state.fresh);
        assert!(notes.contains(&FRESHNESS_STALE_ALREADY));
    }

    #[rstest]
    #[case("max-age=0")]
    #[case("s-maxage=0")]
    fn expires_fills_zero_lifetimes(#[case] cc: &str) {
        let date = http_date(T0);
        let expires = http_date(T0 + 600);
        let (state, notes) = run(
            &[("Date", &date), ("Expires", &expires), ("Cache-Control", cc)],
            None,
            Some(200),
            Some(T0),
        );
        assert_eq!(state.freshness_lifetime_shared, 600);
        assert_eq!(state.freshness_lifetime_private, 600);
        assert!(state.fresh);
        assert!(notes.contains(&FRESHNESS_FRESH));
    }

    #[test]
    fn current_age_note_shows_the_age_header() {
        let date = http_date(T0);
        let (state, notes) = run(
            &[("Date", &date), ("Age", "60"), ("Cache-Control", "max-age=3600")],
            None,
            Some(200),
            Some(T0 + 600),
        );
        assert_eq!(state.age, 600);
        let note = notes.find(&CURRENT_AGE).expect("age note");
        assert_eq!(note.var("age"), Some("1 min"));
    }

    #[test]
    fn unknown_observation_time_skips_clock_checks() {
        let date = http_date(T0);
        let (state, notes) = run(&[("Date", &date), ("Cache-Control", "max-age=60")], None, Some(200), None);
        assert!(!notes.contains(&DATE_CORRECT));
        assert!(!notes.contains(&DATE_INCORRECT));
        assert_eq!(state.age, 0);
        assert!(state.fresh);
    }

    #[rstest]
    #[case("pre-check=10", Some(&CHECK_SINGLE))]
    #[case("pre-check=10, post-check=x", Some(&CHECK_NOT_INTEGER))]
    #[case("pre-check=0, post-check=0", Some(&CHECK_ALL_ZERO))]
    #[case("pre-check=10, post-check=20", Some(&CHECK_POST_BIGGER))]
    #[case("pre-check=10, post-check=0", Some(&CHECK_POST_ZERO))]
    #[case("pre-check=10, post-check=5", Some(&CHECK_POST_PRE))]
    #[case("max-age=10", None)]
    fn pre_and_post_check(#[case] cc: &str, #[case] expected: Option<&'static NoteKind>) {
        let (_state, notes) = run(&[("Cache-Control", cc)], None, Some(200), None);
        let found: Vec<&str> = notes
            .iter()
            .map(|n| n.id())
            .filter(|id| id.starts_with("CHECK_"))
            .collect();
        match expected {
            Some(kind) => assert_eq!(found.first(), Some(&kind.id)),
            None => assert!(found.is_empty()),
        }
    }

    #[test]
    fn post_check_above_pre_check_only_warns() {
        let (_state, notes) = run(
            &[("Cache-Control", "pre-check=10, post-check=20")],
            None,
            Some(200),
            None,
        );
        assert_eq!(notes.count(&CHECK_POST_BIGGER), 1);
        assert!(!notes.contains(&CHECK_POST_PRE));
    }

    #[test]
    fn directive_case_and_repetition_are_flagged() {
        let (_state, notes) = run(
            &[("Cache-Control", "Max-Age=60, max-age=30, no-cache")],
            None,
            Some(200),
            None,
        );
        assert_eq!(notes.find(&CC_MISCAP).and_then(|n| n.var("cc")), Some("max-age"));
        assert_eq!(notes.find(&CC_DUP).and_then(|n| n.var("count")), Some("2"));
        assert!(notes.contains(&NO_CACHE_NO_VALIDATOR));
    }

    #[test]
    fn first_directive_value_wins() {
        let date = http_date(T0);
        let (state, _notes) = run(
            &[("Date", &date), ("Cache-Control", "max-age=60, max-age=5")],
            None,
            Some(200),
            Some(T0),
        );
        assert_eq!(state.freshness_lifetime_private, 60);
    }

    #[rstest]
    #[case("Accept, Accept-Encoding, Origin, Cookie", Some(&VARY_COMPLEX))]
    #[case("User-Agent", Some(&VARY_USER_AGENT))]
    #[case("Host", Some(&VARY_HOST))]
    #[case("*", Some(&VARY_ASTERISK))]
    #[case("Accept-Encoding", None)]
    fn vary_checks(#[case] vary: &str, #[case] expected: Option<&'static NoteKind>) {
        let (_state, notes) = run(&[("Vary", vary)], None, Some(200), None);
        let vary_notes: Vec<&str> = notes
            .iter()
            .filter(|n| n.subject() == "header-vary")
            .map(|n| n.id())
            .collect();
        assert_eq!(vary_notes, expected.map(|k| k.id).into_iter().collect::<Vec<_>>());
    }

    #[rstest]
    #[case(-10, &LM_FUTURE)]
    #[case(3600, &LM_PRESENT)]
    fn last_modified_timing(#[case] age_of_resource: i64, #[case] expected: &'static NoteKind) {
        let date = http_date(T0);
        let lm = http_date(T0 - age_of_resource);
        let (_state, notes) = run(
            &[("Date", &date), ("Last-Modified", &lm)],
            None,
            Some(200),
            None,
        );
        assert!(notes.contains(expected));
    }

    #[test]
    fn no_cache_with_validator_is_weaker() {
        let (_state, notes) = run(
            &[("Cache-Control", "no-cache"), ("ETag", "\"v1\"")],
            None,
            Some(200),
            None,
        );
        assert!(notes.contains(&NO_CACHE));
        assert!(!notes.contains(&NO_CACHE_NO_VALIDATOR));
    }

    #[rstest]
    #[case("private, public", true)]
    #[case("private", false)]
    fn private_public_conflict(#[case] cc: &str, #[case] conflict: bool) {
        let (_state, notes) = run(&[("Cache-Control", cc)], None, Some(200), None);
        assert_eq!(notes.contains(&PRIVATE_PUBLIC_CONFLICT), conflict);
    }
}
