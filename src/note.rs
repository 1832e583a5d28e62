// SPDX-FileCopyrightText: 2025 Alexandre Gomes Gaigalas <alganet@gmail.com>
//
// SPDX-License-Identifier: ISC

//! Diagnostic notes produced while linting a message.
//!
//! A [`NoteKind`] is static data (category, level and text templates). A
//! [`Note`] binds a kind to a subject and the variables used to fill its
//! templates. [`Notes`] is the append-only collection owned by one message.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// What part of HTTP a note is about.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    General,
    Security,
    ContentNegotiation,
    Caching,
    Validation,
    Connection,
    Range,
}

/// Severity of a note.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Good,
    Info,
    Warn,
    Bad,
}

/// Static description of one kind of finding.
///
/// `summary` and `detail` may reference variables as `{name}`.
#[derive(Debug)]
pub struct NoteKind {
    pub id: &'static str,
    pub category: Category,
    pub level: Level,
    pub summary: &'static str,
    pub detail: &'static str,
}

/// Variables passed when adding a note, e.g. `&[("age", &age)]`.
pub type NoteVars<'a> = &'a [(&'a str, &'a dyn fmt::Display)];

/// One finding about a message.
#[derive(Debug, Clone)]
pub struct Note {
    kind: &'static NoteKind,
    subject: String,
    vars: BTreeMap<String, String>,
    children: Vec<Note>,
}

impl PartialEq for Note {
    fn eq(&self, other: &Self) -> bool {
        self.kind.id == other.kind.id && self.subject == other.subject && self.vars == other.vars
    }
}

impl Eq for Note {}

impl Note {
    fn new(kind: &'static NoteKind, subject: String, vars: BTreeMap<String, String>) -> Self {
        Self {
            kind,
            subject,
            vars,
            children: Vec::new(),
        }
    }

    pub fn kind(&self) -> &'static NoteKind {
        self.kind
    }

    pub fn id(&self) -> &'static str {
        self.kind.id
    }

    pub fn category(&self) -> Category {
        self.kind.category
    }

    pub fn level(&self) -> Level {
        self.kind.level
    }

    /// Space-separated subject tokens, e.g. `"header-date header-age"`.
    pub fn subject(&self) -> &str {
        &self.subject
    }

    pub fn var(&self, name: &str) -> Option<&str> {
        self.vars.get(name).map(String::as_str)
    }

    pub fn children(&self) -> &[Note] {
        &self.children
    }

    /// Attach a drill-down note. The child shares the parent's subject and
    /// sees the parent's variables unless it overrides them.
    pub fn add_child(&mut self, kind: &'static NoteKind, vars: NoteVars<'_>) -> &mut Note {
        let mut merged = self.vars.clone();
        merge_vars(&mut merged, vars);
        self.children
            .push(Note::new(kind, self.subject.clone(), merged));
        let last = self.children.len() - 1;
        &mut self.children[last]
    }

    pub fn summary(&self) -> String {
        fill_template(self.kind.summary, &self.vars)
    }

    pub fn detail(&self) -> String {
        fill_template(self.kind.detail, &self.vars)
    }

    pub fn render(&self) -> RenderedNote {
        RenderedNote {
            id: self.kind.id.to_string(),
            category: self.kind.category,
            level: self.kind.level,
            subject: self.subject.clone(),
            summary: self.summary(),
            detail: self.detail(),
            children: self.children.iter().map(Note::render).collect(),
        }
    }
}

/// Serializable view of a note with its templates filled in.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct RenderedNote {
    pub id: String,
    pub category: Category,
    pub level: Level,
    pub subject: String,
    pub summary: String,
    pub detail: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<RenderedNote>,
}

/// Ordered, append-only notes for one message.
#[derive(Debug, Clone, Default)]
pub struct Notes {
    items: Vec<Note>,
    defaults: BTreeMap<String, String>,
}

impl Notes {
    /// Create a collection whose notes all see `defaults` (e.g. the
    /// `message` display label) unless they set the variable themselves.
    pub fn new<I, K, V>(defaults: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            items: Vec::new(),
            defaults: defaults
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    pub fn add(
        &mut self,
        subject: impl Into<String>,
        kind: &'static NoteKind,
        vars: NoteVars<'_>,
    ) -> &mut Note {
        let mut merged = self.defaults.clone();
        merge_vars(&mut merged, vars);
        self.items.push(Note::new(kind, subject.into(), merged));
        let last = self.items.len() - 1;
        &mut self.items[last]
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Note> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn contains(&self, kind: &NoteKind) -> bool {
        self.items.iter().any(|n| n.kind.id == kind.id)
    }

    pub fn count(&self, kind: &NoteKind) -> usize {
        self.items.iter().filter(|n| n.kind.id == kind.id).count()
    }

    pub fn find(&self, kind: &NoteKind) -> Option<&Note> {
        self.items.iter().find(|n| n.kind.id == kind.id)
    }

    pub fn render(&self) -> Vec<RenderedNote> {
        self.items.iter().map(Note::render).collect()
    }
}

impl<'a> IntoIterator for &'a Notes {
    type Item = &'a Note;
    type IntoIter = std::slice::Iter<'a, Note>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

fn merge_vars(into: &mut BTreeMap<String, String>, vars: NoteVars<'_>) {
    for (k, v) in vars {
        into.insert((*k).to_string(), v.to_string());
    }
}

/// Replace `{name}` placeholders with values from `vars`. Unknown
/// placeholders are kept as written.
fn fill_template(template: &str, vars: &BTreeMap<String, String>) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        match after.find('}') {
            Some(close) => {
                let name = &after[..close];
                match vars.get(name) {
                    Some(v) => out.push_str(v),
                    None => {
                        out.push('{');
                        out.push_str(name);
                        out.push('}');
                    }
                }
                rest = &after[close + 1..];
            }
            None => {
                out.push_str(&rest[open..]);
                rest = "";
            }
        }
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    static TEST_NOTE: NoteKind = NoteKind {
        id: "TEST_NOTE",
        category: Category::General,
        level: Level::Info,
        summary: "{message} has {count} things.",
        detail: "Counted {count} things in {where}.",
    };

    static TEST_CHILD: NoteKind = NoteKind {
        id: "TEST_CHILD",
        category: Category::General,
        level: Level::Warn,
        summary: "{message}: item {item}.",
        detail: "",
    };

    #[rstest]
    #[case("plain", "plain")]
    #[case("{count} left", "3 left")]
    #[case("{unknown} stays", "{unknown} stays")]
    #[case("dangling {brace", "dangling {brace")]
    #[case("{count}{count}", "33")]
    fn fills_templates(#[case] template: &str, #[case] expected: &str) {
        let mut vars = BTreeMap::new();
        vars.insert("count".to_string(), "3".to_string());
        assert_eq!(fill_template(template, &vars), expected);
    }

    #[test]
    fn defaults_are_merged_into_every_note() {
        let mut notes = Notes::new([("message", "This response")]);
        notes.add("header-age", &TEST_NOTE, &[("count", &2)]);
        let n = notes.iter().next().expect("one note");
        assert_eq!(n.summary(), "This response has 2 things.");
        assert_eq!(n.detail(), "Counted 2 things in {where}.");
        assert_eq!(n.subject(), "header-age");
        assert_eq!(n.level(), Level::Info);
    }

    #[test]
    fn note_vars_override_defaults() {
        let mut notes = Notes::new([("message", "This response")]);
        notes.add("", &TEST_NOTE, &[("message", &"That request"), ("count", &1)]);
        assert_eq!(
            notes.find(&TEST_NOTE).map(Note::summary).as_deref(),
            Some("That request has 1 things.")
        );
    }

    #[test]
    fn equality_uses_kind_subject_and_vars() {
        let mut a = Notes::default();
        let mut b = Notes::default();
        a.add("header-x", &TEST_NOTE, &[("count", &1)]);
        b.add("header-x", &TEST_NOTE, &[("count", &1)]);
        b.add("header-y", &TEST_NOTE, &[("count", &1)]);
        b.add("header-x", &TEST_NOTE, &[("count", &2)]);
        let items: Vec<&Note> = b.iter().collect();
        assert_eq!(a.iter().next(), Some(items[0]));
        assert_ne!(items[0], items[1]);
        assert_ne!(items[0], items[2]);
    }

    #[test]
    fn children_inherit_subject_and_vars() {
        let mut notes = Notes::new([("message", "This response")]);
        let parent = notes.add("header-vary", &TEST_NOTE, &[("count", &2)]);
        parent.add_child(&TEST_CHILD, &[("item", &"a")]);
        parent.add_child(&TEST_CHILD, &[("item", &"b")]);

        let rendered = notes.render();
        assert_eq!(rendered.len(), 1);
        assert_eq!(rendered[0].children.len(), 2);
        assert_eq!(rendered[0].children[1].summary, "This response: item b.");
        assert_eq!(rendered[0].children[0].subject, "header-vary");
        assert_eq!(notes.count(&TEST_CHILD), 0);
    }
}
