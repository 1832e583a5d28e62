// SPDX-FileCopyrightText: 2025 Alexandre Gomes Gaigalas <alganet@gmail.com>
//
// SPDX-License-Identifier: ISC

//! Configuration loading and validation.

use serde::Deserialize;

/// Resource ceilings. None of them abort linting; exceeding one only
/// produces a note (or stops sampling).
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct Limits {
    /// Decoded content bytes kept as samples per message.
    #[serde(default = "default_max_sample_size")]
    pub max_sample_size: usize,

    /// Size of one header line (name + value) before it is flagged.
    #[serde(default = "default_max_field_size")]
    pub max_field_size: usize,

    /// Size of a whole header block before it is flagged.
    #[serde(default = "default_max_header_block_size")]
    pub max_header_block_size: usize,

    /// Length of a request-target before it is flagged.
    #[serde(default = "default_max_uri_length")]
    pub max_uri_length: usize,
}

fn default_max_sample_size() -> usize {
    8 * 1024
}

fn default_max_field_size() -> usize {
    4 * 1024
}

fn default_max_header_block_size() -> usize {
    20 * 1024
}

fn default_max_uri_length() -> usize {
    8000
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_sample_size: default_max_sample_size(),
            max_field_size: default_max_field_size(),
            max_header_block_size: default_max_header_block_size(),
            max_uri_length: default_max_uri_length(),
        }
    }
}

/// Display labels merged into every note as `{message}`.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct Labels {
    #[serde(default = "default_request_label")]
    pub request: String,

    #[serde(default = "default_response_label")]
    pub response: String,
}

fn default_request_label() -> String {
    "This request".to_string()
}

fn default_response_label() -> String {
    "This response".to_string()
}

impl Default for Labels {
    fn default() -> Self {
        Self {
            request: default_request_label(),
            response: default_response_label(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Default, PartialEq, Eq)]
pub struct LintConfig {
    #[serde(default)]
    pub limits: Limits,

    #[serde(default)]
    pub labels: Labels,
}

impl LintConfig {
    /// Load configuration from a TOML file and validate it.
    /// TOML format:
    ///
    /// [limits]
    /// max_sample_size = 8192
    /// max_field_size = 4096
    ///
    /// [labels]
    /// response = "This response"
    pub fn load_from_path<P: AsRef<std::path::Path>>(path: P) -> anyhow::Result<Self> {
        let path_ref = path.as_ref();
        let s = std::fs::read_to_string(path_ref).map_err(|e| {
            anyhow::anyhow!("failed to read config '{}': {}", path_ref.display(), e)
        })?;
        let cfg: Self = toml::from_str(&s)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Reject limits of zero and empty labels.
    pub fn validate(&self) -> anyhow::Result<()> {
        let limits = [
            ("max_sample_size", self.limits.max_sample_size),
            ("max_field_size", self.limits.max_field_size),
            ("max_header_block_size", self.limits.max_header_block_size),
            ("max_uri_length", self.limits.max_uri_length),
        ];
        for (key, value) in limits {
            if value == 0 {
                return Err(anyhow::anyhow!(
                    "Invalid limit '{}': must be greater than zero",
                    key
                ));
            }
        }
        for (key, value) in [
            ("request", &self.labels.request),
            ("response", &self.labels.response),
        ] {
            if value.trim().is_empty() {
                return Err(anyhow::anyhow!("Invalid label '{}': cannot be empty", key));
            }
        }
        Ok(())
    }
}
