//! Shared utility functions for JSON handling and fail-soft logging.
//!
//! ## JSON Extraction Helpers
//!
//! Provides ergonomic helpers for extracting values from `serde_json::Value`:
//! - `json_string` - Extract strings
//! - `strip_json_comments` - Accept JSONC input (`deno.jsonc`)

use std::fmt::Display;

// =============================================================================
// JSON Value Extraction Helpers
// =============================================================================

/// Extract string from JSON value by key.
///
/// Replaces verbose `v.get("key")?.as_str()?.to_string()` patterns.
#[inline]
pub fn json_string(value: &serde_json::Value, key: &str) -> Option<String> {
    value.get(key)?.as_str().map(String::from)
}

/// Remove `//` line comments and `/* */` block comments outside of strings.
pub fn strip_json_comments(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();
    let mut in_string = false;
    let mut escaped = false;

    while let Some(c) = chars.next() {
        if in_string {
            out.push(c);
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
            continue;
        }

        match (c, chars.peek()) {
            ('"', _) => {
                in_string = true;
                out.push(c);
            }
            ('/', Some('/')) => {
                for next in chars.by_ref() {
                    if next == '\n' {
                        out.push('\n');
                        break;
                    }
                }
            }
            ('/', Some('*')) => {
                chars.next();
                let mut prev = '\0';
                for next in chars.by_ref() {
                    if prev == '*' && next == '/' {
                        break;
                    }
                    prev = next;
                }
            }
            _ => out.push(c),
        }
    }

    out
}

// =============================================================================
// Fail-soft Logging
// =============================================================================

/// Convert a Result to an Option, logging the error at debug level.
///
/// # Example
/// ```ignore
/// let names: Vec<_> = entries
///     .filter_map(|r| log_filter_error(r, "reading entry"))
///     .collect();
/// ```
pub fn log_filter_error<T, E: Display>(result: Result<T, E>, context: &str) -> Option<T> {
    match result {
        Ok(v) => Some(v),
        Err(e) => {
            tracing::debug!("{}: {}", context, e);
            None
        }
    }
}

/// Like log_filter_error but logs at warn level for more important operations.
pub fn log_filter_warn<T, E: Display>(result: Result<T, E>, context: &str) -> Option<T> {
    match result {
        Ok(v) => Some(v),
        Err(e) => {
            tracing::warn!("{}: {}", context, e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_json_string() {
        let v = json!({"version": "1.2.3", "n": 4});
        assert_eq!(json_string(&v, "version").as_deref(), Some("1.2.3"));
        assert_eq!(json_string(&v, "n"), None);
        assert_eq!(json_string(&v, "missing"), None);
    }

    #[test]
    fn test_strip_json_comments() {
        let input = r#"{
  // line comment
  "name": "a//b", /* block */
  "version": "0.1.0"
}"#;
        let stripped = strip_json_comments(input);
        let v: serde_json::Value = serde_json::from_str(&stripped).unwrap();
        assert_eq!(v["name"], "a//b");
        assert_eq!(v["version"], "0.1.0");
    }

    #[test]
    fn test_log_filter_helpers() {
        let ok: Result<u8, String> = Ok(1);
        let err: Result<u8, String> = Err("bad".to_string());
        assert_eq!(log_filter_error(ok, "ctx"), Some(1));
        assert_eq!(log_filter_warn(err, "ctx"), None);
    }
}
