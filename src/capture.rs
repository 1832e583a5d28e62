// SPDX-FileCopyrightText: 2025 Alexandre Gomes Gaigalas <alganet@gmail.com>
//
// SPDX-License-Identifier: ISC

//! Reading captured exchanges from JSONL files.

use crate::http_transaction::HttpExchange;
use anyhow::Context;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Load exchanges from a JSONL file.
///
/// Reads the file line-by-line and deserializes each line as an
/// [`HttpExchange`]. Blank lines are ignored and malformed lines are skipped
/// with a warning. A missing file yields no exchanges.
pub fn load_exchanges<P: AsRef<Path>>(path: P) -> anyhow::Result<Vec<HttpExchange>> {
    let path = path.as_ref();
    if !path.exists() {
        tracing::warn!(path = %path.display(), "capture file not found");
        return Ok(Vec::new());
    }

    let file = File::open(path)
        .with_context(|| format!("Failed to open capture file '{}'", path.display()))?;
    read_exchanges(BufReader::new(file))
}

/// Parse exchanges from any line-oriented reader.
pub fn read_exchanges<R: BufRead>(reader: R) -> anyhow::Result<Vec<HttpExchange>> {
    let mut exchanges = Vec::new();
    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        let line_num = idx + 1;
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<HttpExchange>(&line) {
            Ok(exchange) => exchanges.push(exchange),
            Err(e) => {
                tracing::warn!(line = line_num, error = %e, "failed to parse capture record, skipping");
            }
        }
    }
    Ok(exchanges)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use uuid::Uuid;

    fn temp_path(tag: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(format!("lint_core_{}_{}.jsonl", tag, Uuid::new_v4()))
    }

    #[test]
    fn load_exchanges_skips_malformed_lines() -> anyhow::Result<()> {
        let tmp = temp_path("malformed");
        let content = r#"{"id":"1","request":{"method":"GET","uri":"/"}}
invalid json line

{"id":"2","request":{"method":"POST","uri":"/post"},"response":{"status":201}}
{"id":"3","request":{"method":"GET"}}
"#;
        fs::write(&tmp, content)?;

        let exchanges = load_exchanges(&tmp)?;
        assert_eq!(exchanges.len(), 2);
        assert_eq!(exchanges[0].id.as_deref(), Some("1"));
        assert_eq!(exchanges[1].id.as_deref(), Some("2"));
        assert_eq!(
            exchanges[1].response.as_ref().map(|r| r.status.as_str()),
            Some("201")
        );

        let _ = fs::remove_file(&tmp);
        Ok(())
    }

    #[test]
    fn load_exchanges_empty_file_returns_empty() -> anyhow::Result<()> {
        let tmp = temp_path("empty");
        fs::write(&tmp, "")?;
        assert!(load_exchanges(&tmp)?.is_empty());
        let _ = fs::remove_file(&tmp);
        Ok(())
    }

    #[test]
    fn load_exchanges_nonexistent_file_returns_empty() -> anyhow::Result<()> {
        assert!(load_exchanges(temp_path("missing"))?.is_empty());
        Ok(())
    }

    #[test]
    fn read_exchanges_from_memory() -> anyhow::Result<()> {
        let data = b"{\"request\":{\"method\":\"GET\",\"uri\":\"/a\"}}\n";
        let exchanges = read_exchanges(&data[..])?;
        assert_eq!(exchanges[0].request.uri, "/a");
        Ok(())
    }
}
