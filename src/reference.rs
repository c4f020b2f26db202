//! Reference cells and their resolution against a document.
//!
//! A `RefOr<T>` is either an inline value or a `$ref` string. Resolution is
//! read-only and walks the document on every call, so edits between calls can
//! never leave a stale answer behind.

use serde::de::{DeserializeOwned, Error as _};
use serde::ser::SerializeMap as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::components::{Category, Component};
use crate::document::Document;
use crate::error::Error;

/// Prefix shared by every in-document component anchor.
pub const ANCHOR_PREFIX: &str = "#/components/";

/// Either an inline value or a pointer to a value stored elsewhere.
#[derive(Debug, Clone, PartialEq)]
pub enum RefOr<T> {
    /// A `$ref` string: an anchor (`#/components/...`) or a relative file path.
    Reference(String),
    /// An inline value.
    Value(T),
}

/// What a reference string points at, once parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReferenceTarget {
    /// `#/components/<category>/<name>` inside the document.
    Anchor {
        /// Component category named by the pointer.
        category: Category,
        /// Unescaped entry name.
        name: String,
    },
    /// A locator this crate never fetches (URLs, fragments into other files).
    External {
        /// The reference string as written.
        locator: String,
    },
    /// A file relative to the document root.
    File {
        /// Normalized path: no leading `./`, `.` and `..` collapsed.
        path: String,
    },
}

impl<T> RefOr<T> {
    /// The reference string, if this is a reference.
    pub fn as_reference(&self) -> Option<&str> {
        return match self {
            Self::Reference(reference) => Some(reference),
            Self::Value(_) => None,
        };
    }

    /// The inline value, if this is a value.
    pub const fn as_value(&self) -> Option<&T> {
        return match self {
            Self::Reference(_) => None,
            Self::Value(value) => Some(value),
        };
    }

    /// Mutable inline value, if this is a value.
    pub const fn as_value_mut(&mut self) -> Option<&mut T> {
        return match self {
            Self::Reference(_) => None,
            Self::Value(value) => Some(value),
        };
    }

    /// Whether this cell is a reference.
    pub const fn is_reference(&self) -> bool {
        return matches!(self, Self::Reference(_));
    }

    /// Build a reference cell.
    pub fn reference(target: impl Into<String>) -> Self {
        return Self::Reference(target.into());
    }
}

impl<T: Component> RefOr<T> {
    /// Resolve against `document`, treating file references as relative to
    /// the document root.
    ///
    /// Returns `Ok(None)` for dangling, malformed, external, or mistyped
    /// references.
    ///
    /// # Errors
    ///
    /// Returns `Error::CyclicReference` if the chain revisits a reference.
    pub fn resolve<'a>(&'a self, document: &'a Document) -> Result<Option<&'a T>, Error> {
        return self.resolve_from(document, "");
    }

    /// Resolve against `document`, treating file references as relative to
    /// the directory of `base_file` (the file this cell was read from).
    ///
    /// # Errors
    ///
    /// Returns `Error::CyclicReference` if the chain revisits a reference.
    pub fn resolve_from<'a>(
        &'a self,
        document: &'a Document,
        base_file: &str,
    ) -> Result<Option<&'a T>, Error> {
        let mut visited = Vec::new();
        return resolve_chain(self, document, base_file, &mut visited);
    }
}

impl<T> From<T> for RefOr<T> {
    fn from(value: T) -> Self {
        return Self::Value(value);
    }
}

impl<T: Serialize> Serialize for RefOr<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        return match self {
            Self::Reference(reference) => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry("$ref", reference)?;
                map.end()
            },
            Self::Value(value) => value.serialize(serializer),
        };
    }
}

impl<'de, T: DeserializeOwned> Deserialize<'de> for RefOr<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = serde_json::Value::deserialize(deserializer)?;
        if let Some(reference) = sole_reference(&value) {
            return Ok(Self::Reference(reference.to_string()));
        }
        return serde_json::from_value(value).map(Self::Value).map_err(D::Error::custom);
    }
}

impl std::fmt::Display for ReferenceTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        return match self {
            Self::Anchor { category, name } => {
                let escaped = name.replace('~', "~0").replace('/', "~1");
                write!(f, "{ANCHOR_PREFIX}{}/{escaped}", category.dir_name())
            },
            Self::External { locator } => f.write_str(locator),
            Self::File { path } => f.write_str(path),
        };
    }
}

/// Join a reference onto the directory of `base_file` and normalize.
/// An empty `base_file` means the document root.
pub fn join_relative(base_file: &str, reference: &str) -> String {
    let dir = base_file.rsplit_once('/').map_or("", |(dir, _)| return dir);
    if dir.is_empty() {
        return normalize_path(reference);
    }
    return normalize_path(&format!("{dir}/{reference}"));
}

/// Collapse `./`, `.` and `..` segments of a slash-separated path without
/// touching the filesystem. Leading `..` is kept when there is nothing left
/// to pop.
pub fn normalize_path(path: &str) -> String {
    let mut segments: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {},
            ".." => {
                let can_pop = segments.last().is_some_and(|last| return *last != "..");
                if can_pop {
                    segments.pop();
                } else {
                    segments.push(segment);
                }
            },
            other => segments.push(other),
        }
    }
    return segments.join("/");
}

/// Classify a reference string written in the document root.
///
/// # Errors
///
/// Returns `Error::MalformedReference` for in-document pointers that are not
/// `#/components/<category>/<name>` with a known category and a name.
pub fn parse_reference(reference: &str) -> Result<ReferenceTarget, Error> {
    return parse_reference_from(reference, "");
}

/// Classify a reference string written in `base_file`.
///
/// # Errors
///
/// Returns `Error::MalformedReference` for unsupported in-document pointers.
pub fn parse_reference_from(reference: &str, base_file: &str) -> Result<ReferenceTarget, Error> {
    let malformed = || return Error::MalformedReference { reference: reference.to_string() };

    if reference.starts_with('#') {
        let pointer = reference.strip_prefix(ANCHOR_PREFIX).ok_or_else(malformed)?;
        let (category, name) = pointer.split_once('/').ok_or_else(malformed)?;
        let category = Category::from_dir_name(category).ok_or_else(malformed)?;
        if name.is_empty() || name.contains('/') {
            return Err(malformed());
        }
        let name = name.replace("~1", "/").replace("~0", "~");
        return Ok(ReferenceTarget::Anchor { category, name });
    }

    if reference.is_empty() {
        return Err(malformed());
    }

    if reference.contains("://") || reference.contains('#') {
        return Ok(ReferenceTarget::External { locator: reference.to_string() });
    }

    return Ok(ReferenceTarget::File { path: join_relative(base_file, reference) });
}

/// Follow one cell, recursing through references until a value or a dead end.
///
/// # Errors
///
/// Returns `Error::CyclicReference` if a reference repeats within the chain.
fn resolve_chain<'a, T: Component>(
    cell: &'a RefOr<T>,
    document: &'a Document,
    base_file: &str,
    visited: &mut Vec<String>,
) -> Result<Option<&'a T>, Error> {
    let reference = match cell {
        RefOr::Reference(reference) => reference,
        RefOr::Value(value) => return Ok(Some(value)),
    };

    let Ok(target) = parse_reference_from(reference, base_file) else {
        return Ok(None);
    };

    let key = target.to_string();
    if visited.contains(&key) {
        visited.push(key);
        return Err(Error::CyclicReference { chain: visited.clone() });
    }
    visited.push(key);

    let (next, next_base) = match target {
        ReferenceTarget::Anchor { category, name } => {
            if category != T::CATEGORY {
                return Ok(None);
            }
            let Some(components) = document.components.as_ref() else {
                return Ok(None);
            };
            (T::entries(components).get(&name), String::new())
        },
        ReferenceTarget::External { .. } => return Ok(None),
        ReferenceTarget::File { path } => {
            let Some(files) = document.component_files.as_ref() else {
                return Ok(None);
            };
            if files.category_of(&path) != Some(T::CATEGORY) {
                return Ok(None);
            }
            (T::file_entry(files, &path), path)
        },
    };

    let Some(next) = next else {
        return Ok(None);
    };
    return resolve_chain(next, document, &next_base, visited);
}

/// The reference string of a map whose only key is a string `$ref`.
fn sole_reference(value: &serde_json::Value) -> Option<&str> {
    let object = value.as_object()?;
    if object.len() != 1 {
        return None;
    }
    return object.get("$ref")?.as_str();
}
