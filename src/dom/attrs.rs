//! Ordered element attributes.
//!
//! Names are stored lowercase and compared case-insensitively. Values are
//! opaque decoded strings; escaping happens only at serialization time.

use smallvec::SmallVec;

/// Ordered attribute list of one element.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Attrs {
    items: SmallVec<[(String, String); 4]>,
}

impl Attrs {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    fn position(&self, name: &str) -> Option<usize> {
        self.items
            .iter()
            .position(|(k, _)| k.eq_ignore_ascii_case(name))
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.position(name).map(|i| self.items[i].1.as_str())
    }

    pub fn has(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    /// Set a value, keeping the position of an existing attribute.
    pub fn set(&mut self, name: &str, value: impl Into<String>) {
        let value = value.into();
        match self.position(name) {
            Some(i) => self.items[i].1 = value,
            None => self.items.push((name.to_ascii_lowercase(), value)),
        }
    }

    pub fn remove(&mut self, name: &str) -> Option<String> {
        self.position(name).map(|i| self.items.remove(i).1)
    }

    /// Rename `from` to `to` in place. An existing `to` is replaced.
    ///
    /// Returns false when `from` is absent.
    pub fn rename(&mut self, from: &str, to: &str) -> bool {
        if from.eq_ignore_ascii_case(to) {
            return self.has(from);
        }
        if !self.has(from) {
            return false;
        }
        if let Some(j) = self.position(to) {
            self.items.remove(j);
        }
        match self.position(from) {
            Some(i) => {
                self.items[i].0 = to.to_ascii_lowercase();
                true
            }
            None => false,
        }
    }

    /// Set `name` right after `anchor`; appends when `anchor` is absent.
    ///
    /// An existing `name` keeps its position.
    pub fn set_after(&mut self, anchor: &str, name: &str, value: impl Into<String>) {
        if self.has(name) {
            self.set(name, value);
            return;
        }
        let item = (name.to_ascii_lowercase(), value.into());
        match self.position(anchor) {
            Some(i) => self.items.insert(i + 1, item),
            None => self.items.push(item),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.items.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.items.iter().map(|(k, _)| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    // =========================================================================
    // class helpers
    // =========================================================================

    pub fn has_class(&self, class: &str) -> bool {
        self.get("class")
            .is_some_and(|v| v.split_ascii_whitespace().any(|c| c == class))
    }

    pub fn add_class(&mut self, class: &str) {
        if self.has_class(class) {
            return;
        }
        let value = match self.get("class").map(str::trim) {
            Some(existing) if !existing.is_empty() => format!("{existing} {class}"),
            _ => class.to_string(),
        };
        self.set("class", value);
    }

    pub fn remove_class(&mut self, class: &str) {
        let Some(existing) = self.get("class") else {
            return;
        };
        let kept: Vec<&str> = existing
            .split_ascii_whitespace()
            .filter(|c| *c != class)
            .collect();
        if kept.is_empty() {
            self.remove("class");
        } else {
            let joined = kept.join(" ");
            self.set("class", joined);
        }
    }
}

impl<K: AsRef<str>, V: Into<String>> FromIterator<(K, V)> for Attrs {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut attrs = Self::new();
        for (k, v) in iter {
            attrs.set(k.as_ref(), v);
        }
        attrs
    }
}

impl<const N: usize> From<[(&str, &str); N]> for Attrs {
    fn from(items: [(&str, &str); N]) -> Self {
        items.into_iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_case_insensitive_names() {
        let mut attrs = Attrs::new();
        attrs.set("SRC", "a.jpg");
        assert_eq!(attrs.get("src"), Some("a.jpg"));
        assert_eq!(attrs.names().next(), Some("src"));
    }

    #[test]
    fn test_set_keeps_position() {
        let mut attrs = Attrs::from([("a", "1"), ("b", "2")]);
        attrs.set("a", "3");
        assert_eq!(attrs.iter().collect::<Vec<_>>(), vec![("a", "3"), ("b", "2")]);
    }

    #[test]
    fn test_rename_in_place() {
        let mut attrs = Attrs::from([("src", "a.jpg"), ("width", "10")]);
        assert!(attrs.rename("src", "data-src"));
        assert_eq!(
            attrs.iter().collect::<Vec<_>>(),
            vec![("data-src", "a.jpg"), ("width", "10")]
        );
        assert!(!attrs.rename("missing", "x"));
    }

    #[test]
    fn test_rename_replaces_target() {
        let mut attrs = Attrs::from([("data-src", "old"), ("src", "new")]);
        assert!(attrs.rename("src", "data-src"));
        assert_eq!(attrs.iter().collect::<Vec<_>>(), vec![("data-src", "new")]);
    }

    #[test]
    fn test_set_after() {
        let mut attrs = Attrs::from([("data-src", "a.jpg"), ("width", "10")]);
        attrs.set_after("data-src", "src", "placeholder");
        assert_eq!(
            attrs.names().collect::<Vec<_>>(),
            vec!["data-src", "src", "width"]
        );
    }

    #[test]
    fn test_classes() {
        let mut attrs = Attrs::new();
        attrs.add_class("a");
        attrs.add_class("b");
        attrs.add_class("a");
        assert_eq!(attrs.get("class"), Some("a b"));
        assert!(attrs.has_class("b"));
        attrs.remove_class("a");
        assert_eq!(attrs.get("class"), Some("b"));
        attrs.remove_class("b");
        assert!(!attrs.has("class"));
    }
}
