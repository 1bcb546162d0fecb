//! Message extraction from failure bodies.
//!
//! The EMS API normally answers a failed call with a single JSON object
//! carrying a `message` field. Some endpoints instead emit several JSON
//! objects back to back with no separator, which no JSON parser accepts as a
//! whole. [`JsonFragments`] splits such text into its top-level fragments so
//! each one can be parsed on its own.

use serde_json::Value;

/// Iterator over the top-level JSON object/array fragments of a string.
///
/// Tracks bracket depth and string state (including backslash escapes).
/// Whitespace and stray characters between fragments are skipped, unmatched
/// closing brackets are ignored, and an unterminated trailing fragment is
/// yielded as-is.
pub struct JsonFragments<'a> {
    text: &'a str,
    pos: usize,
}

impl<'a> JsonFragments<'a> {
    pub fn new(text: &'a str) -> Self {
        Self { text, pos: 0 }
    }
}

impl<'a> Iterator for JsonFragments<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<&'a str> {
        let rest = &self.text[self.pos..];
        let mut start = None;
        let mut depth = 0usize;
        let mut in_string = false;
        let mut escaped = false;

        for (i, c) in rest.char_indices() {
            if start.is_none() {
                if c == '{' || c == '[' {
                    start = Some(i);
                    depth = 1;
                }
                continue;
            }

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
                '{' | '[' => depth += 1,
                '}' | ']' => {
                    depth -= 1;
                    if depth == 0 {
                        let begin = start.unwrap_or(0);
                        let end = i + c.len_utf8();
                        self.pos += end;
                        return Some(&rest[begin..end]);
                    }
                }
                _ => {}
            }
        }

        self.pos = self.text.len();
        start.map(|begin| &rest[begin..])
    }
}

/// Derive a human-readable message from a non-debug failure body.
///
/// Tries, in order: the `message` field of the body parsed as one JSON value,
/// then the first `appMessage` found in the body's concatenated fragments.
/// Returns `None` when neither yields a string.
pub fn failure_message(body: &str) -> Option<String> {
    match serde_json::from_str::<Value>(body) {
        Ok(json) => string_field(&json, "message"),
        Err(_) => JsonFragments::new(body)
            .filter_map(|fragment| serde_json::from_str::<Value>(fragment).ok())
            .find_map(|json| string_field(&json, "appMessage")),
    }
}

fn string_field(json: &Value, field: &str) -> Option<String> {
    json.get(field)
        .and_then(|v| v.as_str())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}
