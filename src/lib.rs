// SPDX-FileCopyrightText: 2025 Alexandre Gomes Gaigalas <alganet@gmail.com>
//
// SPDX-License-Identifier: ISC

//! HTTP message linter core.
//!
//! This library turns parsed HTTP requests and responses into ordered lists
//! of diagnostic notes: per-field checks, cache freshness analysis and
//! streaming content decoding, plus the capture loading and exchange
//! linting used by the binary.

pub mod cache;
pub mod capture;
pub mod config;
pub mod content;
pub mod fields;
pub mod helpers;
pub mod http_date;
pub mod http_transaction;
pub mod lint;
pub mod message;
pub mod note;
pub mod rules;
mod serde_helpers;

#[cfg(test)]
mod test_helpers;
