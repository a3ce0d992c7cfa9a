//! Input sanitization for decoded bodies and query parameters.
//!
//! # Responsibilities
//! - Drop keys that read as query operators (`$where`, `a.b`, `price[$gt]`)
//! - Neutralize markup in string values
//!
//! # Design Decisions
//! - Pure and recursive; non-string leaves pass through untouched
//! - Key order of surviving entries is preserved
//! - Idempotent: sanitizing twice equals sanitizing once

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::http::query::QueryParams;
use crate::http::request::RequestContext;
use crate::pipeline::{Flow, Stage};

/// True when `key` could be interpreted as an operator or a nested path.
pub fn is_operator_key(key: &str) -> bool {
    key.starts_with('$')
        || key.contains('.')
        || key.split('[').skip(1).any(|segment| segment.starts_with('$'))
}

/// Escape markup so the text cannot open a tag.
pub fn sanitize_text(text: &str) -> String {
    text.replace('<', "&lt;")
}

/// Recursively sanitize a JSON value.
pub fn sanitize_value(value: Value) -> Value {
    match value {
        Value::String(s) => Value::String(sanitize_text(&s)),
        Value::Array(items) => Value::Array(items.into_iter().map(sanitize_value).collect()),
        Value::Object(map) => Value::Object(
            map.into_iter()
                .filter(|(key, _)| !is_operator_key(key))
                .map(|(key, value)| (key, sanitize_value(value)))
                .collect::<Map<String, Value>>(),
        ),
        other => other,
    }
}

/// Sanitize query keys and values.
pub fn sanitize_query(mut query: QueryParams) -> QueryParams {
    query.retain(|key, values| {
        if is_operator_key(key) {
            return false;
        }
        for value in values.iter_mut() {
            if value.contains('<') {
                *value = sanitize_text(value);
            }
        }
        true
    });
    query
}

/// Pipeline stage sanitizing `ctx.body` and `ctx.query`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Sanitizer;

#[async_trait]
impl Stage for Sanitizer {
    fn name(&self) -> &'static str {
        "sanitizer"
    }

    async fn process(&self, ctx: &mut RequestContext) -> Flow {
        let body = std::mem::take(&mut ctx.body);
        ctx.body = sanitize_value(body);
        let query = std::mem::take(&mut ctx.query);
        ctx.query = sanitize_query(query);
        Flow::Continue
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_operator_keys_removed_recursively() {
        let input = json!({
            "email": {"$gt": ""},
            "password": "pass1234",
            "$where": "sleep(1000)",
            "profile.role": "admin",
            "nested": [{"ok": 1, "$ne": null}],
        });
        let out = sanitize_value(input);
        assert_eq!(
            out,
            json!({
                "email": {},
                "password": "pass1234",
                "nested": [{"ok": 1}],
            })
        );
    }

    #[test]
    fn test_markup_escaped_in_strings_only() {
        let input = json!({"name": "<script>alert(1)</script>", "price": 497, "tags": ["<b>", true]});
        let out = sanitize_value(input);
        assert_eq!(
            out,
            json!({"name": "&lt;script>alert(1)&lt;/script>", "price": 497, "tags": ["&lt;b>", true]})
        );
    }

    #[test]
    fn test_key_order_preserved() {
        let out = sanitize_value(json!({"z": 1, "$x": 2, "a": 3, "m": 4}));
        let keys: Vec<_> = out.as_object().unwrap().keys().cloned().collect();
        assert_eq!(keys, ["z", "a", "m"]);
    }

    #[test]
    fn test_idempotent() {
        let input = json!({"a": "<i>x</i>", "b": {"$c": 1, "d": [">", "<"]}, "e": null});
        let once = sanitize_value(input);
        let twice = sanitize_value(once.clone());
        assert_eq!(once, twice);
    }

    #[test]
    fn test_query_bracket_operators_dropped() {
        let q = QueryParams::parse("price[$gte]=100&price[lte]=500&name=<b>x&$where=1");
        let out = sanitize_query(q);
        let keys: Vec<_> = out.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, ["price[lte]", "name"]);
        assert_eq!(out.last("name"), Some("&lt;b>x"));
    }

    #[test]
    fn test_is_operator_key() {
        assert!(is_operator_key("$gt"));
        assert!(is_operator_key("a.b"));
        assert!(is_operator_key("duration[$lt]"));
        assert!(!is_operator_key("duration[lt]"));
        assert!(!is_operator_key("price$"));
    }
}
