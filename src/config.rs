//! Loading `CheckerOptions` from `kestrel.json`.
//!
//! The file is JSON with comments allowed:
//!
//! ```json
//! {
//!   // Narrowing along control flow.
//!   "checkerOptions": { "smartCasts": true, "maxInstantiationDepth": 32 }
//! }
//! ```
//!
//! Missing keys take their defaults; unknown keys are an error.

use std::path::Path;

use anyhow::{Context, Result};
use kestrel_checker::CheckerOptions;
use serde::Deserialize;
use tracing::debug;

/// Top-level shape of a configuration file.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct KestrelConfig {
    pub checker_options: CheckerOptions,
}

pub fn parse_config(source: &str) -> Result<KestrelConfig> {
    let stripped = strip_comments(source);
    serde_json::from_str(&stripped).context("failed to parse kestrel config JSON")
}

/// Checker options from configuration text.
pub fn load_options_from_str(source: &str) -> Result<CheckerOptions> {
    Ok(parse_config(source)?.checker_options)
}

/// Checker options from a configuration file.
pub fn load_options(path: &Path) -> Result<CheckerOptions> {
    let source = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config: {}", path.display()))?;
    let options = load_options_from_str(&source)
        .with_context(|| format!("failed to load config: {}", path.display()))?;
    debug!(path = %path.display(), ?options, "loaded checker options");
    Ok(options)
}

/// Blank out `//` and `/* */` comments outside string literals. Newlines are
/// kept so serde's line numbers still point into the original text.
fn strip_comments(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();
    let mut in_string = false;

    while let Some(ch) = chars.next() {
        if in_string {
            out.push(ch);
            match ch {
                '\\' => {
                    if let Some(escaped) = chars.next() {
                        out.push(escaped);
                    }
                }
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match (ch, chars.peek().copied()) {
            ('"', _) => {
                in_string = true;
                out.push(ch);
            }
            ('/', Some('/')) => {
                for skipped in chars.by_ref() {
                    if skipped == '\n' {
                        out.push('\n');
                        break;
                    }
                }
            }
            ('/', Some('*')) => {
                chars.next();
                let mut prev = '\0';
                for skipped in chars.by_ref() {
                    if prev == '*' && skipped == '/' {
                        break;
                    }
                    if skipped == '\n' {
                        out.push('\n');
                    }
                    prev = skipped;
                }
            }
            _ => out.push(ch),
        }
    }
    out
}
