//! Normalization of raw, loosely typed input trees into the precisely shaped values a
//! [`crate::Request`] holds.

mod files;
mod input;
mod query;

pub use files::{FileEntry, FileField, FileGroup, FileItem};
pub use input::InputValue;
pub use query::{QueryValue, parse_query};

use request_interop_api::{ConstructionError, ConstructionErrorKind, Field, FieldPath, RawValue};

use crate::http::params::ParamMap;

/// Tracks where in a raw tree normalization currently is, so errors can point at the
/// offending key, and bounds how deep and how large the tree may be.
pub(crate) struct Walker {
    field: Field,
    path: FieldPath,
    max_depth: usize,
    fields: usize,
    max_fields: usize,
}

impl Walker {
    pub fn new(field: Field, max_depth: usize) -> Self {
        Self {
            field,
            path: FieldPath::new(),
            max_depth,
            fields: 0,
            max_fields: usize::MAX,
        }
    }

    /// Bounds how many keys the whole tree may hold, at any depth
    pub fn max_fields(mut self, max_fields: usize) -> Self {
        self.max_fields = max_fields;
        self
    }

    pub fn error(&self, kind: ConstructionErrorKind) -> ConstructionError {
        let err = ConstructionError::new(kind, self.field).at(&self.path);
        log::debug!("rejected request input: {err}");
        err
    }

    /// An error below the current position, at `extra` keys further down
    pub fn error_at<S: Into<String>>(
        &self,
        kind: ConstructionErrorKind,
        extra: impl IntoIterator<Item = S>,
    ) -> ConstructionError {
        let mut path = self.path.clone();
        for key in extra {
            path.push(key);
        }
        let err = ConstructionError::new(kind, self.field).at(&path);
        log::debug!("rejected request input: {err}");
        err
    }

    pub fn unexpected(&self, expected: &'static str, found: &RawValue) -> ConstructionError {
        self.error(ConstructionErrorKind::UnexpectedType {
            expected,
            found: found.type_name(),
        })
    }

    /// Runs `f` one level further down, under `key`
    pub fn descend<T>(
        &mut self,
        key: &str,
        f: impl FnOnce(&mut Self) -> Result<T, ConstructionError>,
    ) -> Result<T, ConstructionError> {
        self.path.push(key);
        self.fields += 1;
        let result = if self.path.depth() > self.max_depth {
            Err(self.error(ConstructionErrorKind::TooDeep {
                limit: self.max_depth,
            }))
        } else if self.fields > self.max_fields {
            Err(self.error(ConstructionErrorKind::TooManyFields {
                limit: self.max_fields,
            }))
        } else {
            f(self)
        };
        self.path.pop();
        result
    }

    /// The keyed entries of a list or map
    pub fn entries(&self, raw: RawValue) -> Result<Vec<(String, RawValue)>, ConstructionError> {
        raw.into_entries()
            .map_err(|scalar| self.unexpected("map", &scalar))
    }

    /// The entries of a top-level input, where an omitted or null input is empty
    pub fn top_level(
        &self,
        raw: Option<RawValue>,
    ) -> Result<Vec<(String, RawValue)>, ConstructionError> {
        match raw {
            None | Some(RawValue::Null) => Ok(Vec::new()),
            Some(raw) => self.entries(raw),
        }
    }

    /// A flat map of non-empty keys to strings, such as cookies or server variables
    pub fn string_map(
        &mut self,
        raw: Option<RawValue>,
    ) -> Result<ParamMap<String>, ConstructionError> {
        let entries = self.top_level(raw)?;
        let mut map = ParamMap::with_capacity(entries.len());
        for (key, value) in entries {
            if key.is_empty() {
                return Err(self.error(ConstructionErrorKind::EmptyKey));
            }
            let value = self.descend(&key, |w| match value {
                RawValue::String(s) => Ok(s),
                other => Err(w.unexpected("string", &other)),
            })?;
            map.insert(key, value);
        }
        Ok(map)
    }

    /// Checks the nesting of an already built tree
    pub fn check_depth<V>(
        &mut self,
        map: &ParamMap<V>,
        children: impl Fn(&V) -> Option<&ParamMap<V>> + Copy,
    ) -> Result<(), ConstructionError> {
        for (key, value) in map {
            self.descend(key, |w| match children(value) {
                Some(nested) => w.check_depth(nested, children),
                None => Ok(()),
            })?;
        }
        Ok(())
    }
}
