//! Ordered, multi-valued query parameters.
//!
//! # Design Decisions
//! - Keys keep first-appearance order; values keep arrival order
//! - A key seen once is a single value, a repeated key is a sequence
//! - Serializes the same way: string for one value, array for many

use serde::ser::{Serialize, SerializeMap, Serializer};

/// Query string parameters grouped by key.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams {
    entries: Vec<(String, Vec<String>)>,
}

impl QueryParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse an `application/x-www-form-urlencoded` query string.
    pub fn parse(query: &str) -> Self {
        let mut params = Self::new();
        for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
            params.append(key.into_owned(), value.into_owned());
        }
        params
    }

    /// Add a value, creating the key if needed.
    pub fn append(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, values)) => values.push(value.into()),
            None => self.entries.push((key, vec![value.into()])),
        }
    }

    /// Replace all values of `key`, keeping its position if present.
    pub fn set(&mut self, key: &str, values: Vec<String>) {
        match self.entries.iter_mut().find(|(k, _)| k == key) {
            Some((_, existing)) => *existing = values,
            None => self.entries.push((key.to_string(), values)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&[String]> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_slice())
    }

    /// The last value supplied for `key`.
    pub fn last(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(|v| v.last()).map(String::as_str)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn retain<F>(&mut self, mut keep: F)
    where
        F: FnMut(&str, &mut Vec<String>) -> bool,
    {
        self.entries.retain_mut(|(k, v)| keep(k.as_str(), v));
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (&str, &mut Vec<String>)> {
        self.entries.iter_mut().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Serialize for QueryParams {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, values) in &self.entries {
            match values.as_slice() {
                [single] => map.serialize_entry(key, single)?,
                many => map.serialize_entry(key, many)?,
            }
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_groups_repeated_keys() {
        let q = QueryParams::parse("sort=price&duration=5&sort=name&duration=9&page=2");
        let keys: Vec<_> = q.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, ["sort", "duration", "page"]);
        assert_eq!(q.get("sort").unwrap(), ["price", "name"]);
        assert_eq!(q.last("duration"), Some("9"));
    }

    #[test]
    fn test_parse_decodes_percent_and_plus() {
        let q = QueryParams::parse("name=The+Forest%20Hiker&price%5Bgte%5D=100");
        assert_eq!(q.last("name"), Some("The Forest Hiker"));
        assert_eq!(q.last("price[gte]"), Some("100"));
    }

    #[test]
    fn test_serializes_single_as_string() {
        let q = QueryParams::parse("a=1&b=2&b=3");
        assert_eq!(serde_json::to_value(&q).unwrap(), json!({"a": "1", "b": ["2", "3"]}));
    }
}
