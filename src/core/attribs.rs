//! Ordered collection of [`Attrib`]s

use super::attrib::Attrib;
use super::writer::ValueWriter;
use std::fmt;

/// Ordered list of fields with conventionally unique keys.
///
/// Lookups scan linearly and return the first match; field counts on a
/// logger are small.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Attribs(Vec<Attrib>);

impl Attribs {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self(Vec::with_capacity(capacity))
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Attrib> {
        self.0.iter()
    }

    pub fn push(&mut self, attrib: Attrib) {
        self.0.push(attrib);
    }

    /// First attrib with `key`.
    pub fn get(&self, key: &str) -> Option<&Attrib> {
        self.0.iter().find(|a| a.key() == key)
    }

    pub fn has(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Merge where `self` wins.
    ///
    /// The result holds every entry of `self` in order, followed by the
    /// entries of `incoming` whose key `self` does not already define.
    pub fn append_unique(&self, incoming: &Attribs) -> Attribs {
        let mut merged = Attribs::with_capacity(self.len() + incoming.len());
        merged.0.extend(self.0.iter().cloned());
        merged.merge_unique(incoming);
        merged
    }

    /// In-place form of [`Attribs::append_unique`].
    pub fn merge_unique(&mut self, incoming: &Attribs) {
        for attrib in incoming.iter() {
            if !self.has(attrib.key()) {
                self.0.push(attrib.clone());
            }
        }
    }

    /// Remove all entries, keeping the allocation.
    pub fn clear(&mut self) {
        self.0.clear();
    }

    pub fn into_vec(self) -> Vec<Attrib> {
        self.0
    }

    /// Write every attrib through `w` in order.
    pub fn log<W: ValueWriter + ?Sized>(&self, w: &mut W) {
        for attrib in &self.0 {
            attrib.log(w);
        }
    }
}

impl From<Vec<Attrib>> for Attribs {
    fn from(attribs: Vec<Attrib>) -> Self {
        Self(attribs)
    }
}

impl FromIterator<Attrib> for Attribs {
    fn from_iter<I: IntoIterator<Item = Attrib>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl Extend<Attrib> for Attribs {
    fn extend<I: IntoIterator<Item = Attrib>>(&mut self, iter: I) {
        self.0.extend(iter);
    }
}

impl IntoIterator for Attribs {
    type Item = Attrib;
    type IntoIter = std::vec::IntoIter<Attrib>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a Attribs {
    type Item = &'a Attrib;
    type IntoIter = std::slice::Iter<'a, Attrib>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl fmt::Display for Attribs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, attrib) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{}", attrib)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attribs(pairs: &[(&str, i64)]) -> Attribs {
        pairs.iter().map(|(k, v)| Attrib::int(*k, *v)).collect()
    }

    #[test]
    fn test_get_returns_first_match() {
        let mut list = attribs(&[("a", 1), ("b", 2)]);
        list.push(Attrib::int("a", 3));

        assert_eq!(list.len(), 3);
        assert_eq!(list.get("a").and_then(Attrib::as_int), Some(1));
        assert!(list.has("b"));
        assert!(!list.has("c"));
        assert!(list.get("c").is_none());
    }

    #[test]
    fn test_append_unique_recorder_wins() {
        let child = attribs(&[("service", 1), ("req", 2)]);
        let parent = attribs(&[("req", 99), ("host", 3)]);

        let merged = child.append_unique(&parent);
        let keys: Vec<&str> = merged.iter().map(Attrib::key).collect();
        assert_eq!(keys, vec!["service", "req", "host"]);
        assert_eq!(merged.get("req").and_then(Attrib::as_int), Some(2));

        // Inputs are untouched
        assert_eq!(child.len(), 2);
        assert_eq!(parent.get("req").and_then(Attrib::as_int), Some(99));
    }

    #[test]
    fn test_append_unique_with_empty_sides() {
        let list = attribs(&[("a", 1)]);
        assert_eq!(list.append_unique(&Attribs::new()), list);
        assert_eq!(Attribs::new().append_unique(&list), list);
    }

    #[test]
    fn test_display() {
        let mut list = attribs(&[("id", 7)]);
        list.push(Attrib::string("user", "alice"));
        assert_eq!(list.to_string(), r#"id=7 user="alice""#);
    }

    #[test]
    fn test_clear_keeps_capacity() {
        let mut list = attribs(&[("a", 1), ("b", 2)]);
        list.clear();
        assert!(list.is_empty());
        assert!(list.0.capacity() >= 2);
    }
}
