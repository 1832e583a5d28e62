// SPDX-FileCopyrightText: 2026 Alexandre Gomes Gaigalas <alganet@gmail.com>
//
// SPDX-License-Identifier: ISC

#![allow(dead_code)]

use std::io::Write;
use std::path::PathBuf;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;

/// Unique path in the temp dir with the given extension.
pub fn temp_path(tag: &str, ext: &str) -> PathBuf {
    std::env::temp_dir().join(format!("lint_core_{}_{}.{}", tag, uuid::Uuid::new_v4(), ext))
}

/// Write `lines` as a JSONL capture file and return its path.
pub fn write_captures(tag: &str, lines: &[serde_json::Value]) -> anyhow::Result<PathBuf> {
    let path = temp_path(tag, "jsonl");
    let mut file = std::fs::File::create(&path)?;
    for line in lines {
        writeln!(file, "{}", serde_json::to_string(line)?)?;
    }
    Ok(path)
}

pub fn gzip(data: &[u8]) -> anyhow::Result<Vec<u8>> {
    let mut enc = flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::default());
    enc.write_all(data)?;
    Ok(enc.finish()?)
}

pub fn b64(data: &[u8]) -> String {
    STANDARD.encode(data)
}

/// IMF-fixdate for epoch seconds.
pub fn http_date(secs: u64) -> String {
    httpdate::fmt_http_date(std::time::UNIX_EPOCH + std::time::Duration::from_secs(secs))
}
