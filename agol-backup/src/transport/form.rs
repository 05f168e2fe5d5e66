//! Request parameter records.
//!
//! ArcGIS REST endpoints take flat key/value forms. [`FormParams`] keeps the
//! insertion order so request bodies are stable and easy to assert on in tests.

/// A single form value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormValue {
    /// Plain string value
    Text(String),
    /// List value, encoded comma-separated (e.g. `layers=0,1,2`)
    List(Vec<String>),
}

impl FormValue {
    /// Encode the value as it appears on the wire.
    pub fn encode(&self) -> String {
        match self {
            FormValue::Text(s) => s.clone(),
            FormValue::List(items) => items.join(","),
        }
    }
}

impl From<&str> for FormValue {
    fn from(s: &str) -> Self {
        FormValue::Text(s.to_string())
    }
}

impl From<String> for FormValue {
    fn from(s: String) -> Self {
        FormValue::Text(s)
    }
}

impl From<bool> for FormValue {
    fn from(b: bool) -> Self {
        FormValue::Text(if b { "true" } else { "false" }.to_string())
    }
}

impl From<&[u32]> for FormValue {
    fn from(ids: &[u32]) -> Self {
        FormValue::List(ids.iter().map(|id| id.to_string()).collect())
    }
}

/// Ordered, immutable-once-built set of form parameters.
///
/// # Example
///
/// ```
/// use agol_backup::transport::FormParams;
///
/// let params = FormParams::new().with("f", "json").with("token", "abc");
/// assert_eq!(params.get_text("f"), Some("json"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormParams {
    entries: Vec<(String, FormValue)>,
}

impl FormParams {
    /// Create an empty parameter set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parameters every JSON call carries: `f=json` and the session token.
    pub fn json_with_token(token: &str) -> Self {
        Self::new().with("f", "json").with("token", token)
    }

    /// Add a parameter, replacing any earlier value for the same key.
    pub fn with(mut self, key: &str, value: impl Into<FormValue>) -> Self {
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key.to_string(), value)),
        }
        self
    }

    /// Look up a parameter.
    pub fn get(&self, key: &str) -> Option<&FormValue> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// Look up a text parameter.
    pub fn get_text(&self, key: &str) -> Option<&str> {
        match self.get(key) {
            Some(FormValue::Text(s)) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Flatten into encoded `(key, value)` pairs for the HTTP layer.
    pub fn encoded_pairs(&self) -> Vec<(String, String)> {
        self.entries
            .iter()
            .map(|(k, v)| (k.clone(), v.encode()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preserves_insertion_order() {
        let params = FormParams::new()
            .with("f", "json")
            .with("replicaName", "Parcels_replica")
            .with("async", true);

        let keys: Vec<String> = params.encoded_pairs().into_iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["f", "replicaName", "async"]);
    }

    #[test]
    fn test_with_replaces_existing_key() {
        let params = FormParams::new().with("token", "old").with("token", "new");
        assert_eq!(params.len(), 1);
        assert_eq!(params.get_text("token"), Some("new"));
    }

    #[test]
    fn test_list_encodes_comma_separated() {
        let ids: &[u32] = &[0, 3, 7];
        let params = FormParams::new().with("layers", ids);
        assert_eq!(
            params.encoded_pairs(),
            vec![("layers".to_string(), "0,3,7".to_string())]
        );
    }

    #[test]
    fn test_bool_encoding() {
        assert_eq!(FormValue::from(true).encode(), "true");
        assert_eq!(FormValue::from(false).encode(), "false");
    }

    #[test]
    fn test_get_text_on_list_is_none() {
        let ids: &[u32] = &[1];
        let params = FormParams::new().with("layers", ids);
        assert!(params.get_text("layers").is_none());
        assert!(params.get("layers").is_some());
    }
}
