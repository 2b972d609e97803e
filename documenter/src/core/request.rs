//! Port message envelope and the `createFile` request it carries.

use std::borrow::Cow;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Name of the only port the shim subscribes to.
pub const CREATE_FILE_PORT: &str = "createFile";

/// A request to persist `content` under `name`, relative to the base directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRequest {
    pub name: String,
    pub content: String,
}

impl FileRequest {
    pub fn new(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            content: content.into(),
        }
    }
}

/// One outbound message from the application, framed as a single JSON line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortMessage {
    pub port: String,
    #[serde(default)]
    pub payload: Value,
}

impl PortMessage {
    pub fn create_file(request: &FileRequest) -> Result<Self> {
        let payload = serde_json::to_value(request).context("encode createFile payload")?;
        Ok(Self {
            port: CREATE_FILE_PORT.to_string(),
            payload,
        })
    }
}

/// What the host should do with a decoded message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Routed {
    CreateFile(FileRequest),
    /// A port nobody subscribes to.
    Unsubscribed(String),
}

/// Parse one line of application output.
///
/// Returns `Ok(None)` for blank lines. Lone UTF-16 surrogate escapes, which
/// JavaScript's `JSON.stringify` emits for unpaired surrogates, decode as
/// U+FFFD.
pub fn parse_line(line: &str) -> Result<Option<PortMessage>> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    let cleaned = replace_lone_surrogates(trimmed);
    let message: PortMessage = serde_json::from_str(&cleaned).context("parse port message")?;
    Ok(Some(message))
}

/// Route a message to its subscriber, decoding the `createFile` payload.
pub fn route(message: PortMessage) -> Result<Routed> {
    if message.port != CREATE_FILE_PORT {
        return Ok(Routed::Unsubscribed(message.port));
    }
    let request: FileRequest =
        serde_json::from_value(message.payload).context("decode createFile payload")?;
    Ok(Routed::CreateFile(request))
}

/// Rewrite `\uXXXX` escapes naming an unpaired surrogate to `\ufffd`.
///
/// Paired surrogates and escaped backslashes (`\\ud800`) are left alone.
pub fn replace_lone_surrogates(json: &str) -> Cow<'_, str> {
    if !json.contains("\\u") {
        return Cow::Borrowed(json);
    }
    let bytes = json.as_bytes();
    let mut out = String::with_capacity(json.len());
    let mut changed = false;
    let mut copied = 0;
    let mut idx = 0;
    while idx < bytes.len() {
        if bytes[idx] != b'\\' {
            idx += 1;
            continue;
        }
        let Some(unit) = escape_unit(bytes, idx) else {
            // Skip the escaped character, whatever it is.
            idx += 2;
            continue;
        };
        match unit {
            0xD800..=0xDBFF => match escape_unit(bytes, idx + 6) {
                Some(0xDC00..=0xDFFF) => idx += 12,
                _ => {
                    out.push_str(&json[copied..idx]);
                    out.push_str("\\ufffd");
                    idx += 6;
                    copied = idx;
                    changed = true;
                }
            },
            0xDC00..=0xDFFF => {
                out.push_str(&json[copied..idx]);
                out.push_str("\\ufffd");
                idx += 6;
                copied = idx;
                changed = true;
            }
            _ => idx += 6,
        }
    }
    if !changed {
        return Cow::Borrowed(json);
    }
    out.push_str(&json[copied..]);
    Cow::Owned(out)
}

/// Code unit of a `\uXXXX` escape starting at `at`, if there is one.
fn escape_unit(bytes: &[u8], at: usize) -> Option<u16> {
    let escape = bytes.get(at..at + 6)?;
    if escape[0] != b'\\' || escape[1] != b'u' {
        return None;
    }
    let hex = std::str::from_utf8(&escape[2..]).ok()?;
    u16::from_str_radix(hex, 16).ok()
}
