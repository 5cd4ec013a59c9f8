//! `.env` parsing and rendering.
//!
//! Lines are `[export ]KEY=VALUE`; blank lines and `#` comments are
//! ignored. Surrounding matching quotes are stripped — single quotes keep
//! the value literal, double quotes get backslash escapes unescaped.

use crate::core::bundle::ProjectBundle;
use crate::error::{EnvError, Result, StoreError};

/// Parse `.env` content into key/value pairs, in file order.
pub fn parse_env(content: &str) -> Result<Vec<(String, String)>> {
    let mut out = Vec::new();
    for (idx, raw) in content.lines().enumerate() {
        let line_num = idx + 1;
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let line = line.strip_prefix("export ").unwrap_or(line);

        let (key, value) = line
            .split_once('=')
            .ok_or(EnvError::InvalidLine(line_num))?;
        let key = key.trim();
        if key.is_empty() {
            return Err(EnvError::EmptyKey(line_num).into());
        }
        out.push((key.to_string(), unquote(value.trim())));
    }
    Ok(out)
}

/// Strip one layer of matching surrounding quotes.
fn unquote(value: &str) -> String {
    if value.len() < 2 {
        return value.to_string();
    }
    let bytes = value.as_bytes();
    let quote = bytes[0];
    if bytes[bytes.len() - 1] != quote {
        return value.to_string();
    }
    let inner = &value[1..value.len() - 1];
    match quote {
        b'\'' => inner.to_string(),
        b'"' => unescape(inner),
        _ => value.to_string(),
    }
}

/// Unescape `\n \r \t \\ \"` inside a double-quoted value.
fn unescape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('t') => out.push('\t'),
            Some('\\') => out.push('\\'),
            Some('"') => out.push('"'),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}

/// Render a bundle as `.env` text, one `KEY=VALUE` line per secret,
/// sorted by key.
///
/// Values containing whitespace or `#` are JSON-string-escaped so the
/// output survives a round trip through [`parse_env`].
pub fn render_env(bundle: &ProjectBundle) -> String {
    let mut sorted: Vec<_> = bundle.secrets.iter().collect();
    sorted.sort_by(|a, b| a.key.cmp(&b.key));

    let mut out = String::new();
    for secret in sorted {
        let needs_quoting = secret
            .value
            .chars()
            .any(|c| matches!(c, ' ' | '\t' | '\n' | '\r' | '#'));
        if needs_quoting {
            // serde_json produces a double-quoted, escaped string.
            let encoded = serde_json::to_string(&secret.value).unwrap_or_default();
            out.push_str(&format!("{}={}\n", secret.key, encoded));
        } else {
            out.push_str(&format!("{}={}\n", secret.key, secret.value));
        }
    }
    out
}

/// Render the full bundle as indented JSON.
pub fn render_json(bundle: &ProjectBundle) -> Result<String> {
    serde_json::to_string_pretty(bundle).map_err(|e| StoreError::Encode(e).into())
}
