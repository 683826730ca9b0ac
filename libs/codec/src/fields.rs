//! Ordered field collections
//!
//! A [`Fields`] value is the unit every serializer works on: an
//! insertion-ordered map from [`Offset`] to a JSON-compatible value. Offsets
//! are either integer positions or string keys, mirroring a list that may
//! also carry named entries.

use indexmap::IndexMap;
use serde::{Serialize, Serializer};
use serde_json::Value;
use std::fmt;

/// Position of a value inside a [`Fields`] collection
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Offset {
    /// Integer position
    Index(i64),
    /// Named entry
    Key(String),
}

impl Offset {
    /// Integer position, if this offset is one
    pub fn as_index(&self) -> Option<i64> {
        match self {
            Offset::Index(index) => Some(*index),
            Offset::Key(_) => None,
        }
    }
}

impl fmt::Display for Offset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Offset::Index(index) => write!(f, "{}", index),
            Offset::Key(key) => f.write_str(key),
        }
    }
}

impl From<i64> for Offset {
    fn from(index: i64) -> Self {
        Offset::Index(index)
    }
}

impl From<usize> for Offset {
    fn from(index: usize) -> Self {
        Offset::Index(index as i64)
    }
}

impl From<&str> for Offset {
    fn from(key: &str) -> Self {
        Offset::Key(key.to_string())
    }
}

impl From<String> for Offset {
    fn from(key: String) -> Self {
        Offset::Key(key)
    }
}

impl Serialize for Offset {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Insertion-ordered collection of event fields
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Fields {
    entries: IndexMap<Offset, Value>,
}

impl Fields {
    /// Create an empty collection
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `value` at `offset`, or append it after the highest integer
    /// offset when no offset is given. Re-using an offset replaces the value
    /// in place and keeps its original position.
    pub fn insert(&mut self, offset: Option<Offset>, value: impl Into<Value>) {
        let offset = offset.unwrap_or_else(|| Offset::Index(self.next_index()));
        self.entries.insert(offset, value.into());
    }

    /// Append `value` after the highest integer offset
    pub fn push(&mut self, value: impl Into<Value>) {
        self.insert(None, value);
    }

    /// Value stored at `offset`
    pub fn get(&self, offset: &Offset) -> Option<&Value> {
        self.entries.get(offset)
    }

    /// Value stored under a string key
    pub fn get_key(&self, key: &str) -> Option<&Value> {
        self.entries.get(&Offset::Key(key.to_string()))
    }

    /// Remove the entry at `offset`, keeping the order of the others
    pub fn remove(&mut self, offset: &Offset) -> Option<Value> {
        self.entries.shift_remove(offset)
    }

    /// Remove every entry
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate entries in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&Offset, &Value)> {
        self.entries.iter()
    }

    /// Iterate values in insertion order
    pub fn values(&self) -> impl Iterator<Item = &Value> {
        self.entries.values()
    }

    /// Whether the offsets are exactly `0, 1, .., n - 1` in order, i.e. the
    /// collection reads as a plain list rather than a map
    pub fn is_list(&self) -> bool {
        self.entries
            .keys()
            .enumerate()
            .all(|(position, offset)| offset.as_index() == Some(position as i64))
    }

    /// Next integer offset used by [`Fields::push`]
    fn next_index(&self) -> i64 {
        self.entries
            .keys()
            .filter_map(Offset::as_index)
            .max()
            .map(|max| max.saturating_add(1).max(0))
            .unwrap_or(0)
    }
}

impl<K: Into<Offset>, V: Into<Value>> FromIterator<(K, V)> for Fields {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut fields = Fields::new();
        for (offset, value) in iter {
            fields.insert(Some(offset.into()), value);
        }
        fields
    }
}

impl<K: Into<Offset>, V: Into<Value>> Extend<(K, V)> for Fields {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (offset, value) in iter {
            self.insert(Some(offset.into()), value);
        }
    }
}

impl IntoIterator for Fields {
    type Item = (Offset, Value);
    type IntoIter = indexmap::map::IntoIter<Offset, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl<'a> IntoIterator for &'a Fields {
    type Item = (&'a Offset, &'a Value);
    type IntoIter = indexmap::map::Iter<'a, Offset, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
