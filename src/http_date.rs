// SPDX-FileCopyrightText: 2025 Alexandre Gomes Gaigalas <alganet@gmail.com>
//
// SPDX-License-Identifier: ISC

//! Small helpers to parse HTTP-date values and describe time spans.
//!
//! All arithmetic in the lint engines is whole seconds since the Unix epoch.

use chrono::{DateTime, Utc};

/// Parse an HTTP-date string (IMF-fixdate and the obsolete forms) into a
/// `chrono::DateTime<Utc>`. Returns an `anyhow::Error` when parsing fails.
pub fn parse_http_date_to_datetime(s: &str) -> anyhow::Result<DateTime<Utc>> {
    let st =
        httpdate::parse_http_date(s).map_err(|e| anyhow::anyhow!("httpdate parse error: {}", e))?;
    Ok(DateTime::<Utc>::from(st))
}

/// Parse an HTTP-date into whole seconds since the epoch.
pub fn parse_http_date_to_epoch(s: &str) -> Option<i64> {
    parse_http_date_to_datetime(s).ok().map(|dt| dt.timestamp())
}

/// Describe a span of seconds for humans, e.g. `1 hr 2 min`.
///
/// Sign is ignored; at most two units are shown.
pub fn relative_time(secs: i64) -> String {
    const UNITS: [(u64, &str); 5] = [
        (365 * 24 * 60 * 60, "year"),
        (24 * 60 * 60, "day"),
        (60 * 60, "hr"),
        (60, "min"),
        (1, "sec"),
    ];
    let mut remaining = secs.unsigned_abs();
    if remaining == 0 {
        return "0 sec".to_string();
    }
    let mut parts = Vec::new();
    for (size, name) in UNITS {
        if remaining >= size {
            let n = remaining / size;
            remaining %= size;
            let plural = if n != 1 && (name == "year" || name == "day") {
                "s"
            } else {
                ""
            };
            parts.push(format!("{} {}{}", n, name, plural));
            if parts.len() == 2 {
                break;
            }
        }
    }
    parts.join(" ")
}

/// Describe a signed clock offset, e.g. `30 sec ahead`.
pub fn relative_offset(secs: i64) -> String {
    match secs {
        0 => "exactly on time".to_string(),
        s if s > 0 => format!("{} ahead", relative_time(s)),
        s => format!("{} behind", relative_time(s)),
    }
}
