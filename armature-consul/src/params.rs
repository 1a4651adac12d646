//! Ordered query-parameter multimap.

use url::form_urlencoded;

/// Query parameters, kept in insertion order.
///
/// `set` replaces the values of an existing key in place so the key keeps
/// its original position; `add` appends another value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Params {
    entries: Vec<(String, Vec<String>)>,
}

impl Params {
    /// Create an empty parameter set.
    pub fn new() -> Self {
        Self::default()
    }

    fn position(&self, key: &str) -> Option<usize> {
        self.entries.iter().position(|(k, _)| k == key)
    }

    /// Set a parameter, replacing any existing values.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.position(&key) {
            Some(idx) => self.entries[idx].1 = vec![value],
            None => self.entries.push((key, vec![value])),
        }
    }

    /// Add a value to a parameter, keeping existing values.
    pub fn add(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.position(&key) {
            Some(idx) => self.entries[idx].1.push(value),
            None => self.entries.push((key, vec![value])),
        }
    }

    /// Remove a parameter. Returns `true` if it was present.
    pub fn remove(&mut self, key: &str) -> bool {
        match self.position(key) {
            Some(idx) => {
                self.entries.remove(idx);
                true
            }
            None => false,
        }
    }

    /// Get the first value of a parameter.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.position(key)
            .and_then(|idx| self.entries[idx].1.first())
            .map(String::as_str)
    }

    /// Get all values of a parameter.
    pub fn get_all(&self, key: &str) -> &[String] {
        match self.position(key) {
            Some(idx) => &self.entries[idx].1,
            None => &[],
        }
    }

    /// Number of distinct keys.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check whether there are no parameters.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over `(key, value)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .flat_map(|(k, vs)| vs.iter().map(move |v| (k.as_str(), v.as_str())))
    }

    /// Render as a URL-encoded query string, without the leading `?`.
    pub fn encode(&self) -> String {
        let mut serializer = form_urlencoded::Serializer::new(String::new());
        for (k, v) in self.iter() {
            serializer.append_pair(k, v);
        }
        serializer.finish()
    }
}
