//! crates/study_assistant_core/src/parsing.rs
//!
//! Turns raw model output into typed values: strips markdown code fences and
//! makes one attempt at closing a reply that was cut off mid-structure.

use regex::Regex;
use serde::de::DeserializeOwned;
use std::sync::OnceLock;

use crate::ports::{PortError, PortResult};

fn fence_pattern() -> &'static Regex {
    static FENCE: OnceLock<Regex> = OnceLock::new();
    FENCE.get_or_init(|| Regex::new(r"```(?:json|JSON)?\n?").expect("fence pattern is valid"))
}

/// Removes ```json fences anywhere in the text and trims it.
pub fn strip_code_fences(text: &str) -> String {
    fence_pattern().replace_all(text, "").trim().to_string()
}

/// Closes a truncated JSON document.
///
/// Terminates an open string and appends the missing `}` / `]` in nesting order.
/// Returns `None` when nothing is open or the brackets already mismatch.
pub fn close_truncated(text: &str) -> Option<String> {
    let mut open: Vec<char> = Vec::new();
    let mut in_string = false;
    let mut escaped = false;

    for c in text.chars() {
        if in_string {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '{' => open.push('}'),
            '[' => open.push(']'),
            '}' | ']' => {
                if open.pop() != Some(c) {
                    return None;
                }
            }
            _ => {}
        }
    }

    if !in_string && open.is_empty() {
        return None;
    }

    let mut repaired = text.trim_end().to_string();
    if in_string {
        if escaped {
            repaired.pop();
        }
        repaired.push('"');
    } else {
        while repaired.ends_with(',') {
            repaired.pop();
            repaired.truncate(repaired.trim_end().len());
        }
        if repaired.ends_with(':') {
            repaired.push_str("null");
        }
    }
    repaired.extend(open.iter().rev());
    Some(repaired)
}

/// Parses model output into `T`, with one repair attempt on failure.
pub fn parse_model_output<T: DeserializeOwned>(raw: &str) -> PortResult<T> {
    let cleaned = strip_code_fences(raw);
    if cleaned.is_empty() {
        return Err(PortError::Malformed("empty model output".to_string()));
    }

    let first_error = match serde_json::from_str::<T>(&cleaned) {
        Ok(value) => return Ok(value),
        Err(e) => e,
    };

    let repaired = close_truncated(&cleaned)
        .ok_or_else(|| PortError::Malformed(first_error.to_string()))?;
    serde_json::from_str::<T>(&repaired).map_err(|e| {
        PortError::Malformed(format!("{} (after repair: {})", first_error, e))
    })
}
