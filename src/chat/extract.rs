//! Structured hand-off payload extraction from assistant replies.
//!
//! A reply is only scanned when it contains both `{` and the literal
//! `"species"`. Candidate regions are found with a bracket-depth scan that
//! skips braces inside JSON string literals. Only the first top-level region
//! is decoded, and it must be an object with a `species` key. Anything else
//! leaves the reply untouched.

use std::ops::Range;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::ParseError;

/// Marker that must appear in a reply before it is scanned.
pub const PAYLOAD_MARKER: &str = "\"species\"";

/// Decoded hand-off data. Shape is untrusted; every accessor validates.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExtractedPayload(Map<String, Value>);

impl ExtractedPayload {
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// String value for `key`, as sent. Blank strings count as absent.
    pub fn text(&self, key: &str) -> Option<&str> {
        self.0
            .get(key)
            .and_then(Value::as_str)
            .filter(|s| !s.trim().is_empty())
    }

    pub fn flag(&self, key: &str) -> Option<bool> {
        self.0.get(key).and_then(Value::as_bool)
    }

    pub fn species(&self) -> Option<&str> {
        self.text("species")
    }

    pub fn can_keep_temporarily(&self) -> Option<bool> {
        self.flag("can_keep_temporarily")
    }

    pub fn to_value(&self) -> Value {
        Value::Object(self.0.clone())
    }
}

/// Outcome of scanning one reply.
#[derive(Debug, Clone, PartialEq)]
pub struct Extraction {
    /// Text to show in the transcript.
    pub display: String,
    pub payload: Option<ExtractedPayload>,
}

/// Split a reply into display text and an optional payload.
///
/// Decode failures are logged at debug level and the raw reply is shown.
pub fn extract(response: &str) -> Extraction {
    match try_extract(response) {
        Ok((display, payload)) => Extraction {
            display,
            payload: Some(payload),
        },
        Err(ParseError::NoMarker) => Extraction {
            display: response.to_string(),
            payload: None,
        },
        Err(e) => {
            tracing::debug!("Reply looked like a payload but was kept as text: {}", e);
            Extraction {
                display: response.to_string(),
                payload: None,
            }
        }
    }
}

/// Strict form of [`extract`]: returns why no payload was found.
pub fn try_extract(response: &str) -> Result<(String, ExtractedPayload), ParseError> {
    if !response.contains('{') || !response.contains(PAYLOAD_MARKER) {
        return Err(ParseError::NoMarker);
    }

    let region = balanced_regions(response)
        .into_iter()
        .next()
        .ok_or(ParseError::Unbalanced)?;

    match serde_json::from_str::<Value>(&response[region.clone()])? {
        Value::Object(map) if map.contains_key("species") => {
            let display = format!("{}{}", &response[..region.start], &response[region.end..]);
            Ok((display.trim().to_string(), ExtractedPayload(map)))
        }
        _ => Err(ParseError::MissingSpecies),
    }
}

/// Byte ranges of every top-level balanced `{...}` region, in order.
///
/// Quotes only matter inside a region, so apostrophes and quoted words in the
/// surrounding prose do not affect the scan. An unclosed region ends the scan.
pub fn balanced_regions(text: &str) -> Vec<Range<usize>> {
    let mut regions = Vec::new();
    let mut depth = 0usize;
    let mut start = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, ch) in text.char_indices() {
        if depth > 0 && in_string {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == '"' {
                in_string = false;
            }
            continue;
        }
        match ch {
            '"' if depth > 0 => in_string = true,
            '{' => {
                if depth == 0 {
                    start = i;
                }
                depth += 1;
            }
            '}' if depth > 0 => {
                depth -= 1;
                if depth == 0 {
                    regions.push(start..i + 1);
                }
            }
            _ => {}
        }
    }
    regions
}
