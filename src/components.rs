//! Component stores: one ordered map of reference cells per category.
//!
//! The same `Components` type backs two stores. The one embedded in the
//! document is keyed by component name and addressed with `#/components/...`
//! anchors. The one inside `ComponentFiles` is keyed by file path and
//! addressed with relative file references.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::path_group::PathGroup;
use crate::reference::{RefOr, normalize_path};
use crate::spec::{
    Callback, Example, Extensions, Header, Link, Parameter, PathItem, RequestBody, Response,
    Schema, SecurityScheme,
};

/// The reusable object categories an OpenAPI document can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    /// `callbacks`
    Callbacks,
    /// `examples`
    Examples,
    /// `headers`
    Headers,
    /// `links`
    Links,
    /// `parameters`
    Parameters,
    /// `pathItems`
    PathItems,
    /// `requestBodies`
    RequestBodies,
    /// `responses`
    Responses,
    /// `schemas`
    Schemas,
    /// `securitySchemes`
    SecuritySchemes,
}

/// Embedded or file-backed component entries, one map per category.
#[allow(clippy::arbitrary_source_item_ordering, reason = "field order is the encoded key order")]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Components {
    /// Schemas.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub schemas: IndexMap<String, RefOr<Schema>>,
    /// Responses.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub responses: IndexMap<String, RefOr<Response>>,
    /// Parameters.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub parameters: IndexMap<String, RefOr<Parameter>>,
    /// Examples.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub examples: IndexMap<String, RefOr<Example>>,
    /// Request bodies.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub request_bodies: IndexMap<String, RefOr<RequestBody>>,
    /// Headers.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub headers: IndexMap<String, RefOr<Header>>,
    /// Security schemes.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub security_schemes: IndexMap<String, RefOr<SecurityScheme>>,
    /// Links.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub links: IndexMap<String, RefOr<Link>>,
    /// Callbacks.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub callbacks: IndexMap<String, RefOr<Callback>>,
    /// Path items.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub path_items: IndexMap<String, RefOr<PathItem>>,
    /// Unknown keys.
    #[serde(flatten)]
    pub extensions: Extensions,
}

/// Content that lives in separate files. Never part of the encoded document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ComponentFiles {
    /// `components/<category>/**` entries keyed by full normalized file path.
    pub components: Components,
    /// Directory layout of `paths/**`.
    pub paths: PathGroup,
}

/// An entity kind that can be stored in a component category.
/// Gives typed access to its category map, so lookups never cast.
pub trait Component: Sized {
    /// The category this kind lives in.
    const CATEGORY: Category;

    /// This kind's map inside a store.
    fn entries(components: &Components) -> &IndexMap<String, RefOr<Self>>;

    /// Mutable access to this kind's map inside a store.
    fn entries_mut(components: &mut Components) -> &mut IndexMap<String, RefOr<Self>>;

    /// Look up a file-backed entry by normalized file path.
    fn file_entry<'a>(files: &'a ComponentFiles, key: &str) -> Option<&'a RefOr<Self>> {
        return Self::entries(&files.components).get(key);
    }
}

impl Category {
    /// Order in which file references probe the file-backed store.
    pub const PROBE_ORDER: [Self; 10] = [
        Self::Schemas,
        Self::Responses,
        Self::Parameters,
        Self::Examples,
        Self::RequestBodies,
        Self::Headers,
        Self::SecuritySchemes,
        Self::Links,
        Self::Callbacks,
        Self::PathItems,
    ];

    /// Directory name under `components/` and key under `#/components/`.
    pub const fn dir_name(self) -> &'static str {
        return match self {
            Self::Callbacks => "callbacks",
            Self::Examples => "examples",
            Self::Headers => "headers",
            Self::Links => "links",
            Self::Parameters => "parameters",
            Self::PathItems => "pathItems",
            Self::RequestBodies => "requestBodies",
            Self::Responses => "responses",
            Self::Schemas => "schemas",
            Self::SecuritySchemes => "securitySchemes",
        };
    }

    /// Parse a directory or pointer segment into a category.
    pub fn from_dir_name(name: &str) -> Option<Self> {
        return Self::PROBE_ORDER.into_iter().find(|category| return category.dir_name() == name);
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        return f.write_str(self.dir_name());
    }
}

impl Components {
    /// The first category (in probe order) with an entry under `key`.
    pub fn category_of(&self, key: &str) -> Option<Category> {
        return Category::PROBE_ORDER.into_iter().find(|category| return self.contains(*category, key));
    }

    /// Whether a category has an entry under `key`.
    pub fn contains(&self, category: Category, key: &str) -> bool {
        return match category {
            Category::Callbacks => self.callbacks.contains_key(key),
            Category::Examples => self.examples.contains_key(key),
            Category::Headers => self.headers.contains_key(key),
            Category::Links => self.links.contains_key(key),
            Category::Parameters => self.parameters.contains_key(key),
            Category::PathItems => self.path_items.contains_key(key),
            Category::RequestBodies => self.request_bodies.contains_key(key),
            Category::Responses => self.responses.contains_key(key),
            Category::Schemas => self.schemas.contains_key(key),
            Category::SecuritySchemes => self.security_schemes.contains_key(key),
        };
    }

    /// Whether every category is empty.
    pub fn is_empty(&self) -> bool {
        return self.len() == 0;
    }

    /// Entry keys of one category, in order.
    pub fn keys(&self, category: Category) -> Vec<&str> {
        /// Collect the keys of one map.
        fn keys_of<T>(map: &IndexMap<String, RefOr<T>>) -> Vec<&str> {
            return map.keys().map(String::as_str).collect();
        }
        return match category {
            Category::Callbacks => keys_of(&self.callbacks),
            Category::Examples => keys_of(&self.examples),
            Category::Headers => keys_of(&self.headers),
            Category::Links => keys_of(&self.links),
            Category::Parameters => keys_of(&self.parameters),
            Category::PathItems => keys_of(&self.path_items),
            Category::RequestBodies => keys_of(&self.request_bodies),
            Category::Responses => keys_of(&self.responses),
            Category::Schemas => keys_of(&self.schemas),
            Category::SecuritySchemes => keys_of(&self.security_schemes),
        };
    }

    /// Total number of entries across all categories.
    pub fn len(&self) -> usize {
        return Category::PROBE_ORDER
            .into_iter()
            .map(|category| return self.keys(category).len())
            .fold(0_usize, usize::saturating_add);
    }

    /// Remove one entry, preserving the order of the rest.
    /// Returns whether an entry was removed.
    pub fn remove(&mut self, category: Category, key: &str) -> bool {
        return match category {
            Category::Callbacks => self.callbacks.shift_remove(key).is_some(),
            Category::Examples => self.examples.shift_remove(key).is_some(),
            Category::Headers => self.headers.shift_remove(key).is_some(),
            Category::Links => self.links.shift_remove(key).is_some(),
            Category::Parameters => self.parameters.shift_remove(key).is_some(),
            Category::PathItems => self.path_items.shift_remove(key).is_some(),
            Category::RequestBodies => self.request_bodies.shift_remove(key).is_some(),
            Category::Responses => self.responses.shift_remove(key).is_some(),
            Category::Schemas => self.schemas.shift_remove(key).is_some(),
            Category::SecuritySchemes => self.security_schemes.shift_remove(key).is_some(),
        };
    }
}

impl ComponentFiles {
    /// The category whose file-backed entries contain `reference`.
    /// Path items are found either in the `pathItems` store or in the path tree.
    pub fn category_of(&self, reference: &str) -> Option<Category> {
        let key = normalize_path(reference);
        if let Some(category) = self.components.category_of(&key) {
            return Some(category);
        }
        return self.paths.item_lookup(&key).map(|_| return Category::PathItems);
    }
}

impl Component for Callback {
    const CATEGORY: Category = Category::Callbacks;

    fn entries(components: &Components) -> &IndexMap<String, RefOr<Self>> {
        return &components.callbacks;
    }

    fn entries_mut(components: &mut Components) -> &mut IndexMap<String, RefOr<Self>> {
        return &mut components.callbacks;
    }
}

impl Component for Example {
    const CATEGORY: Category = Category::Examples;

    fn entries(components: &Components) -> &IndexMap<String, RefOr<Self>> {
        return &components.examples;
    }

    fn entries_mut(components: &mut Components) -> &mut IndexMap<String, RefOr<Self>> {
        return &mut components.examples;
    }
}

impl Component for Header {
    const CATEGORY: Category = Category::Headers;

    fn entries(components: &Components) -> &IndexMap<String, RefOr<Self>> {
        return &components.headers;
    }

    fn entries_mut(components: &mut Components) -> &mut IndexMap<String, RefOr<Self>> {
        return &mut components.headers;
    }
}

impl Component for Link {
    const CATEGORY: Category = Category::Links;

    fn entries(components: &Components) -> &IndexMap<String, RefOr<Self>> {
        return &components.links;
    }

    fn entries_mut(components: &mut Components) -> &mut IndexMap<String, RefOr<Self>> {
        return &mut components.links;
    }
}

impl Component for Parameter {
    const CATEGORY: Category = Category::Parameters;

    fn entries(components: &Components) -> &IndexMap<String, RefOr<Self>> {
        return &components.parameters;
    }

    fn entries_mut(components: &mut Components) -> &mut IndexMap<String, RefOr<Self>> {
        return &mut components.parameters;
    }
}

impl Component for PathItem {
    const CATEGORY: Category = Category::PathItems;

    fn entries(components: &Components) -> &IndexMap<String, RefOr<Self>> {
        return &components.path_items;
    }

    fn entries_mut(components: &mut Components) -> &mut IndexMap<String, RefOr<Self>> {
        return &mut components.path_items;
    }

    fn file_entry<'a>(files: &'a ComponentFiles, key: &str) -> Option<&'a RefOr<Self>> {
        return files.components.path_items.get(key).or_else(|| return files.paths.item_lookup(key));
    }
}

impl Component for RequestBody {
    const CATEGORY: Category = Category::RequestBodies;

    fn entries(components: &Components) -> &IndexMap<String, RefOr<Self>> {
        return &components.request_bodies;
    }

    fn entries_mut(components: &mut Components) -> &mut IndexMap<String, RefOr<Self>> {
        return &mut components.request_bodies;
    }
}

impl Component for Response {
    const CATEGORY: Category = Category::Responses;

    fn entries(components: &Components) -> &IndexMap<String, RefOr<Self>> {
        return &components.responses;
    }

    fn entries_mut(components: &mut Components) -> &mut IndexMap<String, RefOr<Self>> {
        return &mut components.responses;
    }
}

impl Component for Schema {
    const CATEGORY: Category = Category::Schemas;

    fn entries(components: &Components) -> &IndexMap<String, RefOr<Self>> {
        return &components.schemas;
    }

    fn entries_mut(components: &mut Components) -> &mut IndexMap<String, RefOr<Self>> {
        return &mut components.schemas;
    }
}

impl Component for SecurityScheme {
    const CATEGORY: Category = Category::SecuritySchemes;

    fn entries(components: &Components) -> &IndexMap<String, RefOr<Self>> {
        return &components.security_schemes;
    }

    fn entries_mut(components: &mut Components) -> &mut IndexMap<String, RefOr<Self>> {
        return &mut components.security_schemes;
    }
}
