// SPDX-FileCopyrightText: 2025 Alexandre Gomes Gaigalas <alganet@gmail.com>
//
// SPDX-License-Identifier: ISC

use crate::fields::Discipline;
use crate::helpers::token::is_token;
use crate::rules::{FieldRule, Syntax};

/// Members are kept as written; consumers compare them lowercased.
pub struct Vary;

impl FieldRule for Vary {
    fn name(&self) -> &'static str {
        "Vary"
    }

    fn discipline(&self) -> Discipline {
        Discipline::List
    }

    fn valid_in_requests(&self) -> bool {
        false
    }

    fn syntax(&self) -> Option<Syntax> {
        Some(|s| s == "*" || is_token(s))
    }
}
