use indexmap::IndexMap;
use serde::Serialize;

pub use indexmap::map::{IntoIter, Iter};

/// An insertion-ordered map with unique string keys.
///
/// Inserting an existing key replaces its value in place, the way repeated form fields
/// overwrite each other.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ParamMap<V> {
    map: IndexMap<String, V>,
}

impl<V> Default for ParamMap<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> ParamMap<V> {
    pub fn new() -> Self {
        Self {
            map: IndexMap::new(),
        }
    }

    pub fn with_capacity(size: usize) -> Self {
        Self {
            map: IndexMap::with_capacity(size),
        }
    }

    /// Returns the replaced value, if the key was already present
    pub fn insert(&mut self, key: impl Into<String>, value: V) -> Option<V> {
        self.map.insert(key.into(), value)
    }

    pub fn get(&self, key: &str) -> Option<&V> {
        self.map.get(key)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut V> {
        self.map.get_mut(key)
    }

    pub(crate) fn get_or_insert_with(&mut self, key: &str, f: impl FnOnce() -> V) -> &mut V {
        self.map.entry(key.to_string()).or_insert_with(f)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.map.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.map.keys().map(String::as_str)
    }

    pub fn values(&self) -> impl Iterator<Item = &V> {
        self.map.values()
    }

    pub fn iter(&self) -> Iter<'_, String, V> {
        self.map.iter()
    }
}

impl<K: Into<String>, V> FromIterator<(K, V)> for ParamMap<V> {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self {
            map: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

impl<'a, V> IntoIterator for &'a ParamMap<V> {
    type Item = (&'a String, &'a V);
    type IntoIter = Iter<'a, String, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.map.iter()
    }
}

impl<V> IntoIterator for ParamMap<V> {
    type Item = (String, V);
    type IntoIter = IntoIter<String, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.map.into_iter()
    }
}
