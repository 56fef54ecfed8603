use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Caller-supplied query parameters.
///
/// Keys are kept sorted so the query string and cache key are stable for
/// the same parameter set regardless of insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QueryParams(BTreeMap<String, String>);

impl QueryParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl ToString) {
        self.0.insert(key.into(), value.to_string());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Returns `self` overlaid with `other`; keys in `other` win.
    pub fn merged(&self, other: &QueryParams) -> QueryParams {
        let mut merged = self.clone();
        merged
            .0
            .extend(other.0.iter().map(|(k, v)| (k.clone(), v.clone())));
        merged
    }

    /// `?a=1&b=two%20words`, or an empty string when there are no parameters.
    pub fn to_query_string(&self) -> String {
        if self.0.is_empty() {
            return String::new();
        }

        let pairs = self
            .0
            .iter()
            .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
            .collect::<Vec<_>>();
        format!("?{}", pairs.join("&"))
    }

    /// Storage key for a resource fetched with these parameters.
    pub fn cache_key(&self, resource: &str) -> String {
        let encoded = serde_json::to_string(&self.0).unwrap_or_else(|_| String::from("{}"));
        format!("{resource}_{encoded}")
    }
}

impl<K: Into<String>, V: ToString> FromIterator<(K, V)> for QueryParams {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut params = Self::new();
        for (key, value) in iter {
            params.insert(key, value);
        }
        params
    }
}
