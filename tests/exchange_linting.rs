// SPDX-FileCopyrightText: 2025 Alexandre Gomes Gaigalas <alganet@gmail.com>
//
// SPDX-License-Identifier: ISC

//! End-to-end linting of captured exchanges.

mod common;

use lint_http_core::capture::load_exchanges;
use lint_http_core::config::LintConfig;
use lint_http_core::lint::lint_exchange;
use rstest::rstest;
use serde_json::json;

const T0: u64 = 1_445_412_480;

fn ids(notes: &[lint_http_core::note::RenderedNote]) -> Vec<String> {
    notes.iter().map(|n| n.id.clone()).collect()
}

#[rstest]
#[case(1)]
#[case(5)]
#[case(10)]
#[case(4096)]
fn gzip_capture_is_linted_end_to_end(#[case] chunk_size: usize) -> anyhow::Result<()> {
    let body = b"<html><body>hello, cache</body></html>\n".repeat(40);
    let wire = common::gzip(&body)?;
    let record = json!({
        "id": "gz",
        "observed_at": "2015-10-21T07:28:30Z",
        "request": {
            "method": "GET",
            "uri": "/index.html",
            "headers": [["Host", "example.com"], ["Accept-Encoding", "gzip"]]
        },
        "response": {
            "status": 200,
            "reason": "OK",
            "headers": [
                ["Date", common::http_date(T0)],
                ["Last-Modified", common::http_date(T0 - 86_400)],
                ["Content-Encoding", "gzip"],
                ["Content-Length", wire.len().to_string()],
                ["Cache-Control", "public, max-age=600"],
                ["Vary", "Accept-Encoding"]
            ],
            "body": common::b64(&wire)
        }
    });
    let path = common::write_captures("gzip", &[record])?;
    let exchanges = load_exchanges(&path)?;
    assert_eq!(exchanges.len(), 1);

    let report = lint_exchange(&exchanges[0], &LintConfig::default(), chunk_size);
    let resp = report.response.expect("response report");
    let content = resp.content.expect("content summary");
    assert!(content.decode_ok);
    assert_eq!(content.content_len, body.len());
    assert_eq!(content.wire_len, wire.len());

    let found = ids(&resp.notes);
    for expected in ["CL_CORRECT", "STOREABLE", "PUBLIC_REDUNDANT", "LM_PRESENT", "FRESHNESS_FRESH"] {
        assert!(found.iter().any(|id| id == expected), "missing {} in {:?}", expected, found);
    }
    let cache = report.cache.expect("cache state");
    assert_eq!(cache.age, 30);
    assert_eq!(cache.freshness_left, 570);

    let _ = std::fs::remove_file(&path);
    Ok(())
}

#[test]
fn truncated_gzip_is_one_note_and_linting_continues() -> anyhow::Result<()> {
    // Valid header, then a deflate block of the reserved type.
    let mut broken = common::gzip(b"")?[..10].to_vec();
    broken.extend_from_slice(&[0x07; 40]);
    let record = json!({
        "request": {"method": "GET", "uri": "/"},
        "response": {
            "status": "200",
            "headers": [["Content-Encoding", "gzip"], ["ETag", "\"v1\""]],
            "body": common::b64(&broken)
        }
    });
    let path = common::write_captures("broken", &[record])?;
    let exchanges = load_exchanges(&path)?;
    let report = lint_exchange(&exchanges[0], &LintConfig::default(), 64);
    let resp = report.response.expect("response report");
    let found = ids(&resp.notes);
    assert_eq!(found.iter().filter(|id| *id == "BAD_ZLIB").count(), 1);
    assert!(!resp.content.expect("content").decode_ok);
    assert!(report.cache.is_some());

    let _ = std::fs::remove_file(&path);
    Ok(())
}

#[test]
fn malformed_capture_lines_are_skipped() -> anyhow::Result<()> {
    let path = common::temp_path("mixed", "jsonl");
    std::fs::write(
        &path,
        "{\"request\":{\"method\":\"GET\",\"uri\":\"/a\"}}\nnot json\n{\"request\":{\"method\":\"GET\",\"uri\":\"/b\"}}\n",
    )?;
    let exchanges = load_exchanges(&path)?;
    let uris: Vec<&str> = exchanges.iter().map(|e| e.request.uri.as_str()).collect();
    assert_eq!(uris, vec!["/a", "/b"]);
    let _ = std::fs::remove_file(&path);
    Ok(())
}

#[test]
fn authorization_makes_response_private() -> anyhow::Result<()> {
    let record = json!({
        "request": {
            "method": "GET",
            "uri": "/account",
            "headers": [["Host", "example.com"], ["Authorization", "Bearer abc"]]
        },
        "response": {"status": 200, "headers": [["Cache-Control", "max-age=60"]]}
    });
    let path = common::write_captures("auth", &[record])?;
    let exchanges = load_exchanges(&path)?;
    let report = lint_exchange(&exchanges[0], &LintConfig::default(), 4096);
    let cache = report.cache.expect("cache state");
    assert!(!cache.store_shared);
    assert!(cache.store_private);
    let found = ids(&report.response.expect("response").notes);
    assert!(found.iter().any(|id| id == "PRIVATE_AUTH"));
    let _ = std::fs::remove_file(&path);
    Ok(())
}
