// SPDX-FileCopyrightText: 2025 Alexandre Gomes Gaigalas <alganet@gmail.com>
//
// SPDX-License-Identifier: ISC

//! Maps field names to the rule that handles them.

use super::Discipline;
use crate::rules::{FieldRule, RULES};
use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

/// Accepts any value in any message and checks nothing.
pub struct UnknownField;

impl FieldRule for UnknownField {
    fn name(&self) -> &'static str {
        "Unknown"
    }

    fn discipline(&self) -> Discipline {
        Discipline::Broken
    }
}

static UNKNOWN_FIELD: UnknownField = UnknownField;

static SHARED: OnceLock<Arc<FieldFinder>> = OnceLock::new();

/// Registry of field rules, keyed by lowercased name.
pub struct FieldFinder {
    aliases: HashMap<String, String>,
    by_name: HashMap<String, &'static dyn FieldRule>,
}

impl FieldFinder {
    pub fn new(rules: &[&'static dyn FieldRule]) -> Self {
        let mut aliases = HashMap::new();
        let mut by_name = HashMap::new();
        for &rule in rules {
            let canonical = rule.name().to_ascii_lowercase();
            for alias in rule.aliases() {
                aliases.insert(alias.to_ascii_lowercase(), canonical.clone());
            }
            if by_name.insert(canonical, rule).is_some() {
                tracing::warn!(field = rule.name(), "field rule registered twice; keeping the last");
            }
        }
        Self { aliases, by_name }
    }

    /// The registry built from [`RULES`], created once.
    pub fn shared() -> Arc<FieldFinder> {
        SHARED.get_or_init(|| Arc::new(FieldFinder::new(RULES))).clone()
    }

    /// Rule for a lowercased field name, or the permissive unknown-field rule.
    pub fn find(&self, norm_name: &str) -> &'static dyn FieldRule {
        let name = self
            .aliases
            .get(norm_name)
            .map(String::as_str)
            .unwrap_or(norm_name);
        match self.by_name.get(name) {
            Some(rule) => *rule,
            None => &UNKNOWN_FIELD,
        }
    }

    pub fn is_known(&self, norm_name: &str) -> bool {
        self.aliases.contains_key(norm_name) || self.by_name.contains_key(norm_name)
    }
}

impl Default for FieldFinder {
    fn default() -> Self {
        Self::new(RULES)
    }
}
