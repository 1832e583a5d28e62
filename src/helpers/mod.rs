// SPDX-FileCopyrightText: 2025 Alexandre Gomes Gaigalas <alganet@gmail.com>
//
// SPDX-License-Identifier: ISC

//! Helper utilities shared across field rules and the lint engines.
//!
//! This module groups reusable helpers for validating HTTP common structures.

pub mod headers;
pub mod token;
