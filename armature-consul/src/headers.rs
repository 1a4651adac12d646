//! Case-insensitive header map.

use std::fmt;

/// HTTP header map with case-insensitive names.
///
/// Names keep the casing they were first inserted with. A name may carry
/// several values; [`Headers::line`] folds them into one comma-separated
/// string.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Headers {
    entries: Vec<(String, Vec<String>)>,
}

impl Headers {
    /// Create an empty header map.
    pub fn new() -> Self {
        Self::default()
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.entries
            .iter()
            .position(|(n, _)| n.eq_ignore_ascii_case(name))
    }

    /// Set a header, replacing every existing value under the same name.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.position(&name) {
            Some(idx) => self.entries[idx].1 = vec![value],
            None => self.entries.push((name, vec![value])),
        }
    }

    /// Append a value to a header, keeping existing values.
    pub fn append(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.position(&name) {
            Some(idx) => self.entries[idx].1.push(value),
            None => self.entries.push((name, vec![value])),
        }
    }

    /// Remove a header. Returns `true` if it was present.
    pub fn remove(&mut self, name: &str) -> bool {
        match self.position(name) {
            Some(idx) => {
                self.entries.remove(idx);
                true
            }
            None => false,
        }
    }

    /// Get the first value of a header.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.position(name)
            .and_then(|idx| self.entries[idx].1.first())
            .map(String::as_str)
    }

    /// Get all values of a header.
    pub fn get_all(&self, name: &str) -> &[String] {
        match self.position(name) {
            Some(idx) => &self.entries[idx].1,
            None => &[],
        }
    }

    /// Get all values of a header joined by `", "`.
    ///
    /// Returns an empty string when the header is absent.
    pub fn line(&self, name: &str) -> String {
        self.get_all(name).join(", ")
    }

    /// Check whether a header is present.
    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    /// Number of distinct header names.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check whether the map is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over `(name, value)` pairs, one pair per value.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .flat_map(|(n, vs)| vs.iter().map(move |v| (n.as_str(), v.as_str())))
    }
}

impl fmt::Debug for Headers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for (name, values) in &self.entries {
            // Never print tokens in debug output.
            if name.eq_ignore_ascii_case(crate::request::HEADER_TOKEN) {
                map.entry(name, &"<redacted>");
            } else {
                map.entry(name, values);
            }
        }
        map.finish()
    }
}

impl From<&http::HeaderMap> for Headers {
    fn from(map: &http::HeaderMap) -> Self {
        let mut headers = Headers::new();
        for (name, value) in map {
            // Non-visible-ASCII values are kept lossily rather than dropped.
            let value = match value.to_str() {
                Ok(v) => v.to_string(),
                Err(_) => String::from_utf8_lossy(value.as_bytes()).into_owned(),
            };
            headers.append(name.as_str(), value);
        }
        headers
    }
}

impl<K, V> FromIterator<(K, V)> for Headers
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut headers = Headers::new();
        for (k, v) in iter {
            headers.append(k, v);
        }
        headers
    }
}
