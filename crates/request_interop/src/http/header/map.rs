use serde::Serialize;
use unicase::UniCase;

use crate::http::params::{self, ParamMap};

use super::HeaderName;

/// Request headers: lowercase names to non-empty values
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct HeaderMap {
    map: ParamMap<String>,
}

impl HeaderMap {
    pub fn new() -> Self {
        Self {
            map: ParamMap::new(),
        }
    }

    pub fn with_capacity(size: usize) -> Self {
        Self {
            map: ParamMap::with_capacity(size),
        }
    }

    /// Values are validated by the factory before they get here
    pub(crate) fn insert(&mut self, name: HeaderName, value: String) -> Option<String> {
        self.map.insert(name.0, value)
    }

    /// Adds a value, combining it with an existing one as a comma separated list
    pub(crate) fn append(&mut self, name: HeaderName, value: String) {
        let slot = self.map.get_or_insert_with(&name.0, String::new);
        if !slot.is_empty() {
            slot.push_str(", ");
        }
        slot.push_str(&value);
    }

    /// Looks a header up by name, ignoring ASCII case
    pub fn get(&self, name: &str) -> Option<&str> {
        if let Some(value) = self.map.get(name) {
            return Some(value);
        }
        let needle = UniCase::ascii(name);
        self.map
            .iter()
            .find(|(k, _)| UniCase::ascii(k.as_str()) == needle)
            .map(|(_, v)| v.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn iter(&self) -> params::Iter<'_, String, String> {
        self.map.iter()
    }
}
