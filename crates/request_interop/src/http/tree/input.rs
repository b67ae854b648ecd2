use request_interop_api::{ConstructionError, RawValue};
use serde::Serialize;

use crate::http::params::ParamMap;

use super::Walker;

/// A node of the decoded request body
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum InputValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    Map(ParamMap<InputValue>),
}

impl InputValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&ParamMap<InputValue>> {
        match self {
            Self::Map(map) => Some(map),
            _ => None,
        }
    }

    pub fn get(&self, key: &str) -> Option<&InputValue> {
        self.as_map()?.get(key)
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    pub(crate) fn from_raw(walker: &mut Walker, raw: RawValue) -> Result<Self, ConstructionError> {
        Ok(match raw {
            RawValue::Null => Self::Null,
            RawValue::Bool(b) => Self::Bool(b),
            RawValue::Int(i) => Self::Int(i),
            RawValue::Float(f) => Self::Float(f),
            RawValue::String(s) => Self::String(s),
            container => Self::Map(Self::map_from_raw(walker, container)?),
        })
    }

    pub(crate) fn map_from_raw(
        walker: &mut Walker,
        raw: RawValue,
    ) -> Result<ParamMap<Self>, ConstructionError> {
        let entries = walker.entries(raw)?;
        let mut map = ParamMap::with_capacity(entries.len());
        for (key, value) in entries {
            let value = walker.descend(&key, |w| Self::from_raw(w, value))?;
            map.insert(key, value);
        }
        Ok(map)
    }

    pub(crate) fn children(&self) -> Option<&ParamMap<Self>> {
        self.as_map()
    }
}
