// SPDX-FileCopyrightText: 2025 Alexandre Gomes Gaigalas <alganet@gmail.com>
//
// SPDX-License-Identifier: ISC

use clap::Parser;
use std::io::Write;
use std::path::PathBuf;

use lint_http_core::{capture, config, lint};
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "lint-http-core")]
struct Args {
    /// Path to a JSONL file of captured exchanges
    #[arg(long)]
    captures: PathBuf,

    /// Optional config TOML path (limits and labels)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Bytes of content fed to the linter at a time
    #[arg(long, default_value_t = 4096)]
    chunk_size: usize,
}

fn load_config(path: Option<&PathBuf>) -> config::LintConfig {
    match path {
        Some(p) => config::LintConfig::load_from_path(p).unwrap_or_else(|e| {
            warn!(path = %p.display(), error = %e, "failed to load config, using defaults");
            config::LintConfig::default()
        }),
        None => config::LintConfig::default(),
    }
}

/// Lint every exchange in the capture file, writing one JSON report per line.
fn run<W: Write>(args: &Args, out: &mut W) -> anyhow::Result<usize> {
    let cfg = load_config(args.config.as_ref());
    let exchanges = capture::load_exchanges(&args.captures)?;
    for exchange in &exchanges {
        let report = lint::lint_exchange(exchange, &cfg, args.chunk_size);
        writeln!(out, "{}", serde_json::to_string(&report)?)?;
    }
    Ok(exchanges.len())
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();
    let args = Args::parse();

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    let count = run(&args, &mut out)?;
    info!(count, "linted exchanges");
    Ok(())
}
