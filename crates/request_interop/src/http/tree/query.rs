use memchr::memchr;
use request_interop_api::{ConstructionError, RawValue};
use serde::Serialize;

use crate::http::{params::ParamMap, url::form_decode};

use super::Walker;

/// A node of the decoded query string: always text, or a nested group of fields
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum QueryValue {
    String(String),
    Map(ParamMap<QueryValue>),
}

impl QueryValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            Self::Map(_) => None,
        }
    }

    pub fn as_map(&self) -> Option<&ParamMap<QueryValue>> {
        match self {
            Self::String(_) => None,
            Self::Map(map) => Some(map),
        }
    }

    pub fn get(&self, key: &str) -> Option<&QueryValue> {
        self.as_map()?.get(key)
    }

    pub(crate) fn from_raw(walker: &mut Walker, raw: RawValue) -> Result<Self, ConstructionError> {
        match raw {
            RawValue::String(s) => Ok(Self::String(s)),
            container if container.is_container() => {
                Ok(Self::Map(Self::map_from_raw(walker, container)?))
            }
            other => Err(walker.unexpected("string or map", &other)),
        }
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

impl From<QueryValue> for RawValue {
    fn from(value: QueryValue) -> Self {
        match value {
            QueryValue::String(s) => RawValue::String(s),
            QueryValue::Map(map) => map.into(),
        }
    }
}

/// Lets a decoded query string feed [`crate::RequestParts::query`]
impl From<ParamMap<QueryValue>> for RawValue {
    fn from(map: ParamMap<QueryValue>) -> Self {
        RawValue::Map(map.into_iter().map(|(k, v)| (k, v.into())).collect())
    }
}

/// Splits a field name like `a[b][]` into `["a", "b", ""]`.
///
/// Returns `None` when the name has no base. Text after the last complete bracket pair is
/// ignored, and a name with an unclosed bracket is taken literally.
fn split_key(key: &str) -> Option<Vec<&str>> {
    let Some(open) = memchr(b'[', key.as_bytes()) else {
        return (!key.is_empty()).then(|| vec![key]);
    };
    if open == 0 {
        return None;
    }
    let mut segments = vec![&key[..open]];
    let mut rest = &key[open..];
    while let Some(inner) = rest.strip_prefix('[') {
        let Some(close) = memchr(b']', inner.as_bytes()) else {
            if segments.len() == 1 {
                return Some(vec![key]);
            }
            break;
        };
        segments.push(&inner[..close]);
        rest = &inner[close + 1..];
    }
    Some(segments)
}

/// A group of fields while a query string is being decoded
struct Group {
    fields: ParamMap<Slot>,
    /// The index a `name[]` field gets next, or `None` once no integer is left
    next_index: Option<u64>,
}

enum Slot {
    Value(String),
    Group(Group),
}

impl Group {
    fn new() -> Self {
        Self {
            fields: ParamMap::new(),
            next_index: Some(0),
        }
    }

    /// Returns whether the field was stored
    fn insert(&mut self, segments: &[&str], value: String) -> bool {
        let Some((first, rest)) = segments.split_first() else {
            return false;
        };
        let key = if first.is_empty() {
            match self.next_index {
                Some(index) => index.to_string(),
                None => return false,
            }
        } else {
            first.to_string()
        };
        if let Some(index) = integer_key(&key) {
            if self.next_index.is_some_and(|next| index >= next) {
                self.next_index = index.checked_add(1);
            }
        }

        if rest.is_empty() {
            self.fields.insert(key, Slot::Value(value));
            return true;
        }
        let slot = self.fields.get_or_insert_with(&key, || Slot::Group(Group::new()));
        if let Slot::Value(_) = slot {
            // A later `a[b]=` overrides an earlier `a=`
            *slot = Slot::Group(Group::new());
        }
        match slot {
            Slot::Group(group) => group.insert(rest, value),
            Slot::Value(_) => false,
        }
    }

    fn into_map(self) -> ParamMap<QueryValue> {
        self.fields
            .into_iter()
            .map(|(key, slot)| {
                let value = match slot {
                    Slot::Value(value) => QueryValue::String(value),
                    Slot::Group(group) => QueryValue::Map(group.into_map()),
                };
                (key, value)
            })
            .collect()
    }
}

/// Keys written as plain decimal integers; `05` and `+5` stay text keys
fn integer_key(key: &str) -> Option<u64> {
    let canonical = !key.is_empty()
        && key.bytes().all(|b| b.is_ascii_digit())
        && (key == "0" || !key.starts_with('0'));
    if canonical { key.parse().ok() } else { None }
}

/// Decodes an `application/x-www-form-urlencoded` string, honoring bracketed field names:
/// `a[b]=1&a[c][]=2&a[c][]=3` becomes `{a: {b: 1, c: {0: 2, 1: 3}}}`.
///
/// Decoding is lenient the way browsers and servers are: empty pairs and nameless fields are
/// skipped, fields nesting deeper than `max_depth` are dropped, and decoding stops after
/// `max_fields` fields.
pub fn parse_query(query: &str, max_depth: usize, max_fields: usize) -> ParamMap<QueryValue> {
    let mut root = Group::new();
    for (n, pair) in query.split('&').filter(|p| !p.is_empty()).enumerate() {
        if n == max_fields {
            log::warn!("query has more than {max_fields} fields, ignoring the rest");
            break;
        }
        let (raw_key, raw_value) = pair.split_once('=').unwrap_or((pair, ""));
        let key = form_decode(raw_key);
        let Some(segments) = split_key(&key) else {
            log::debug!("skipping query field without a name: {raw_key:?}");
            continue;
        };
        if segments.len() > max_depth {
            log::debug!("skipping query field nested deeper than {max_depth}: {raw_key:?}");
            continue;
        }
        if !root.insert(&segments, form_decode(raw_value).into_owned()) {
            log::debug!("skipping query field with no index left: {raw_key:?}");
        }
    }
    root.into_map()
}
