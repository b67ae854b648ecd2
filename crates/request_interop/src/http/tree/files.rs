use request_interop_api::{ConstructionError, ConstructionErrorKind, RawValue, UploadStatus};
use serde::Serialize;

use crate::http::params::ParamMap;

use super::Walker;

/// The descriptor of one uploaded file, as the transport reported it
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileItem {
    pub tmp_name: String,
    pub error: UploadStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_path: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub media_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
}

/// One key of a [`FileGroup`]: a value per file, nested the same way the form field names nest
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum FileField<T> {
    Leaf(T),
    List(ParamMap<FileField<T>>),
}

impl<T> FileField<T> {
    /// The leaf at `keys`, if this tree has one there
    pub fn at(&self, keys: &[String]) -> Option<&T> {
        match (self, keys.split_first()) {
            (Self::Leaf(leaf), None) => Some(leaf),
            (Self::List(list), Some((first, rest))) => list.get(first)?.at(rest),
            _ => None,
        }
    }

    fn same_shape<U>(&self, other: &FileField<U>) -> bool {
        match (self, other) {
            (Self::Leaf(_), FileField::Leaf(_)) => true,
            (Self::List(a), FileField::List(b)) => {
                a.len() == b.len()
                    && a.iter().all(|(key, value)| {
                        b.get(key).is_some_and(|other| value.same_shape(other))
                    })
            }
            _ => false,
        }
    }

    fn leaves<'a>(&'a self, keys: &mut Vec<String>, out: &mut Vec<(Vec<String>, &'a T)>) {
        match self {
            Self::Leaf(leaf) => out.push((keys.clone(), leaf)),
            Self::List(list) => {
                for (key, value) in list {
                    keys.push(key.to_string());
                    value.leaves(keys, out);
                    keys.pop();
                }
            }
        }
    }

    fn from_raw(
        walker: &mut Walker,
        raw: RawValue,
        leaf: fn(&Walker, RawValue) -> Result<T, ConstructionError>,
    ) -> Result<Self, ConstructionError> {
        if !raw.is_container() {
            return leaf(walker, raw).map(Self::Leaf);
        }
        let entries = walker.entries(raw)?;
        let mut list = ParamMap::with_capacity(entries.len());
        for (key, value) in entries {
            let value = walker.descend(&key, |w| Self::from_raw(w, value, leaf))?;
            list.insert(key, value);
        }
        Ok(Self::List(list))
    }
}

/// Several files uploaded under one field name (`photos[]`, `docs[a][b]`): every key holds a
/// tree of values, and all trees have the shape of `tmp_name`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileGroup {
    pub tmp_name: FileField<String>,
    pub error: FileField<UploadStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<FileField<Option<String>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_path: Option<FileField<Option<String>>>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub media_type: Option<FileField<Option<String>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<FileField<u64>>,
}

impl FileGroup {
    /// Every file in the group, with the keys leading to it
    pub fn items(&self) -> Vec<(Vec<String>, FileItem)> {
        let mut tmp_names = Vec::new();
        self.tmp_name.leaves(&mut Vec::new(), &mut tmp_names);
        tmp_names
            .into_iter()
            .filter_map(|(keys, tmp_name)| {
                let text = |field: &Option<FileField<Option<String>>>| {
                    field.as_ref().and_then(|f| f.at(&keys)).cloned().flatten()
                };
                let item = FileItem {
                    tmp_name: tmp_name.clone(),
                    error: *self.error.at(&keys)?,
                    name: text(&self.name),
                    full_path: text(&self.full_path),
                    media_type: text(&self.media_type),
                    size: self.size.as_ref().and_then(|f| f.at(&keys)).copied(),
                };
                Some((keys, item))
            })
            .collect()
    }
}

/// One entry of the files tree
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum FileEntry {
    Item(FileItem),
    Group(FileGroup),
}

impl FileEntry {
    /// Flattens the entry into its files, with the keys leading to each one
    pub fn items(&self) -> Vec<(Vec<String>, FileItem)> {
        match self {
            Self::Item(item) => vec![(Vec::new(), item.clone())],
            Self::Group(group) => group.items(),
        }
    }

    pub(crate) fn map_from_raw(
        walker: &mut Walker,
        raw: Option<RawValue>,
    ) -> Result<ParamMap<Self>, ConstructionError> {
        let entries = walker.top_level(raw)?;
        let mut map = ParamMap::with_capacity(entries.len());
        for (key, value) in entries {
            if key.is_empty() {
                return Err(walker.error(ConstructionErrorKind::EmptyKey));
            }
            let value = walker.descend(&key, |w| Self::from_raw(w, value))?;
            map.insert(key, value);
        }
        Ok(map)
    }

    fn from_raw(walker: &mut Walker, raw: RawValue) -> Result<Self, ConstructionError> {
        let mut slots = Slots::default();
        for (key, value) in walker.entries(raw)? {
            let slot = match key.as_str() {
                "tmp_name" => &mut slots.tmp_name,
                "error" => &mut slots.error,
                "name" => &mut slots.name,
                "full_path" => &mut slots.full_path,
                "type" => &mut slots.media_type,
                "size" => &mut slots.size,
                _ => return Err(walker.error(ConstructionErrorKind::UnexpectedKey(key.clone()))),
            };
            *slot = Some(value);
        }

        let tmp_name = slots
            .tmp_name
            .take()
            .ok_or_else(|| walker.error(ConstructionErrorKind::MissingKey("tmp_name")))?;
        let error = slots
            .error
            .take()
            .ok_or_else(|| walker.error(ConstructionErrorKind::MissingKey("error")))?;

        if tmp_name.is_container() {
            Self::group_from_raw(walker, tmp_name, error, slots)
        } else {
            Self::item_from_raw(walker, tmp_name, error, slots)
        }
    }

    fn item_from_raw(
        walker: &mut Walker,
        tmp_name: RawValue,
        error: RawValue,
        slots: Slots,
    ) -> Result<Self, ConstructionError> {
        fn scalar<T>(
            walker: &mut Walker,
            key: &'static str,
            raw: Option<RawValue>,
            leaf: fn(&Walker, RawValue) -> Result<T, ConstructionError>,
        ) -> Result<Option<T>, ConstructionError> {
            raw.map(|raw| walker.descend(key, |w| leaf(w, raw))).transpose()
        }

        let tmp_name = walker.descend("tmp_name", |w| tmp_name_leaf(w, tmp_name))?;
        let error = walker.descend("error", |w| error_leaf(w, error))?;
        if tmp_name.is_empty() && error.is_ok() {
            return Err(walker.error(ConstructionErrorKind::EmptyTmpName));
        }
        Ok(Self::Item(FileItem {
            tmp_name,
            error,
            name: scalar(walker, "name", slots.name, text_leaf)?.flatten(),
            full_path: scalar(walker, "full_path", slots.full_path, text_leaf)?.flatten(),
            media_type: scalar(walker, "type", slots.media_type, text_leaf)?.flatten(),
            size: scalar(walker, "size", slots.size, size_leaf)?,
        }))
    }

    fn group_from_raw(
        walker: &mut Walker,
        tmp_name: RawValue,
        error: RawValue,
        slots: Slots,
    ) -> Result<Self, ConstructionError> {
        fn tree<T>(
            walker: &mut Walker,
            key: &'static str,
            raw: RawValue,
            leaf: fn(&Walker, RawValue) -> Result<T, ConstructionError>,
        ) -> Result<FileField<T>, ConstructionError> {
            walker.descend(key, |w| FileField::from_raw(w, raw, leaf))
        }

        fn optional_tree<T>(
            walker: &mut Walker,
            key: &'static str,
            raw: Option<RawValue>,
            leaf: fn(&Walker, RawValue) -> Result<T, ConstructionError>,
            tmp_name: &FileField<String>,
        ) -> Result<Option<FileField<T>>, ConstructionError> {
            let Some(raw) = raw else {
                return Ok(None);
            };
            let field = tree(walker, key, raw, leaf)?;
            if !field.same_shape(tmp_name) {
                return Err(walker.error(ConstructionErrorKind::ShapeMismatch(key)));
            }
            Ok(Some(field))
        }

        let tmp_name = tree(walker, "tmp_name", tmp_name, tmp_name_leaf)?;
        let error = optional_tree(walker, "error", Some(error), error_leaf, &tmp_name)?
            .ok_or_else(|| walker.error(ConstructionErrorKind::MissingKey("error")))?;
        let group = FileGroup {
            name: optional_tree(walker, "name", slots.name, text_leaf, &tmp_name)?,
            full_path: optional_tree(walker, "full_path", slots.full_path, text_leaf, &tmp_name)?,
            media_type: optional_tree(walker, "type", slots.media_type, text_leaf, &tmp_name)?,
            size: optional_tree(walker, "size", slots.size, size_leaf, &tmp_name)?,
            tmp_name,
            error,
        };

        for (keys, item) in group.items() {
            if item.tmp_name.is_empty() && item.error.is_ok() {
                let path = std::iter::once("tmp_name".to_string()).chain(keys);
                return Err(walker.error_at(ConstructionErrorKind::EmptyTmpName, path));
            }
        }
        Ok(Self::Group(group))
    }
}

#[derive(Default)]
struct Slots {
    tmp_name: Option<RawValue>,
    error: Option<RawValue>,
    name: Option<RawValue>,
    full_path: Option<RawValue>,
    media_type: Option<RawValue>,
    size: Option<RawValue>,
}

fn tmp_name_leaf(walker: &Walker, raw: RawValue) -> Result<String, ConstructionError> {
    match raw {
        RawValue::String(s) => Ok(s),
        other => Err(walker.unexpected("string", &other)),
    }
}

fn error_leaf(walker: &Walker, raw: RawValue) -> Result<UploadStatus, ConstructionError> {
    match raw {
        RawValue::Int(code) => UploadStatus::from_code(code)
            .ok_or_else(|| walker.error(ConstructionErrorKind::InvalidUploadStatus(code))),
        other => Err(walker.unexpected("int", &other)),
    }
}

/// Transports report missing text as an empty string
fn text_leaf(walker: &Walker, raw: RawValue) -> Result<Option<String>, ConstructionError> {
    match raw {
        RawValue::Null => Ok(None),
        RawValue::String(s) if s.is_empty() => Ok(None),
        RawValue::String(s) => Ok(Some(s)),
        other => Err(walker.unexpected("string", &other)),
    }
}

fn size_leaf(walker: &Walker, raw: RawValue) -> Result<u64, ConstructionError> {
    match raw {
        RawValue::Int(size) => {
            u64::try_from(size).map_err(|_| walker.error(ConstructionErrorKind::InvalidSize(size)))
        }
        other => Err(walker.unexpected("int", &other)),
    }
}
