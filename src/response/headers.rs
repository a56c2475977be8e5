use smallvec::SmallVec;

/// One header name and its ordered values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderEntry {
    name: String,
    values: SmallVec<[String; 1]>,
}

impl HeaderEntry {
    /// Name as it was first set (original spelling).
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Values in the order they were added.
    #[must_use]
    pub fn values(&self) -> &[String] {
        &self.values
    }
}

/// Response header multimap.
///
/// Names are matched case-insensitively (and ignoring surrounding whitespace),
/// insertion order of headers and of values under one name is preserved.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderMultimap {
    entries: Vec<HeaderEntry>,
}

fn same_name(a: &str, b: &str) -> bool {
    a.trim().eq_ignore_ascii_case(b.trim())
}

impl HeaderMultimap {
    /// Create an empty multimap.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.entries.iter().position(|e| same_name(&e.name, name))
    }

    /// Set a header value.
    ///
    /// With `append == false` any previous values are replaced and the name takes
    /// the new spelling; with `append == true` the value is added after existing
    /// ones.
    pub fn set(&mut self, name: &str, value: impl Into<String>, append: bool) {
        let value = value.into();
        match self.position(name) {
            Some(idx) if append => self.entries[idx].values.push(value),
            Some(idx) => {
                let entry = &mut self.entries[idx];
                entry.name = name.trim().to_string();
                entry.values.clear();
                entry.values.push(value);
            }
            None => {
                let mut values = SmallVec::new();
                values.push(value);
                self.entries.push(HeaderEntry {
                    name: name.trim().to_string(),
                    values,
                });
            }
        }
    }

    /// Whether any value is set under `name`.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    /// Entry for `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&HeaderEntry> {
        self.position(name).map(|idx| &self.entries[idx])
    }

    /// Values for `name`, joined with `", "`.
    #[must_use]
    pub fn get_joined(&self, name: &str) -> Option<String> {
        self.get(name).map(|e| e.values.join(", "))
    }

    /// Remove all values under `name`.
    pub fn remove(&mut self, name: &str) {
        self.entries.retain(|e| !same_name(&e.name, name));
    }

    /// Remove every header.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Number of distinct header names.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no header is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &HeaderEntry> {
        self.entries.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_replaces_and_append_adds() {
        let mut headers = HeaderMultimap::new();
        headers.set("X-Trace", "a", false);
        headers.set("x-trace", "b", true);
        assert_eq!(headers.get("X-TRACE").map(HeaderEntry::values), Some(&["a".to_string(), "b".to_string()][..]));

        headers.set(" X-Trace ", "c", false);
        assert_eq!(headers.get_joined("x-trace").as_deref(), Some("c"));
        assert_eq!(headers.len(), 1);
    }

    #[test]
    fn test_remove_and_order() {
        let mut headers = HeaderMultimap::new();
        headers.set("A", "1", false);
        headers.set("B", "2", false);
        headers.set("C", "3", false);
        headers.remove("b");
        let names: Vec<&str> = headers.iter().map(HeaderEntry::name).collect();
        assert_eq!(names, vec!["A", "C"]);
        headers.clear();
        assert!(headers.is_empty());
    }
}
