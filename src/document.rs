//! The document root and its multi-file bookkeeping.

use std::collections::HashMap;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::codec::Format;
use crate::components::{ComponentFiles, Components};
use crate::ledger::HashLedger;
use crate::reference::{RefOr, normalize_path};
use crate::spec::{Extensions, ExternalDocs, Info, PathItem, SecurityRequirement, Server, Tag};

/// OpenAPI version written into new documents.
pub const DEFAULT_OPENAPI_VERSION: &str = "3.1.0";

/// Title given to new documents.
pub const DEFAULT_TITLE: &str = "Untitled API";

/// API version given to new documents.
pub const DEFAULT_VERSION: &str = "1.0.0";

/// Main file name given to new documents.
pub const DEFAULT_MAIN_FILE: &str = "openapi.yaml";

/// An OpenAPI document plus the state needed to write it back as a tree.
///
/// Only the serde fields form the encoded document. The skipped fields record
/// where content came from so a save can reproduce the original layout.
#[allow(clippy::arbitrary_source_item_ordering, reason = "field order is the encoded key order")]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    /// OpenAPI version string. Empty for Swagger 2 documents.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub openapi: String,
    /// API metadata.
    #[serde(default)]
    pub info: Info,
    /// Default `$schema` for schemas in this document.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub json_schema_dialect: Option<String>,
    /// Servers.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub servers: Vec<Server>,
    /// Route table, in canonical order after assembly.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub paths: IndexMap<String, RefOr<PathItem>>,
    /// Webhooks.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub webhooks: IndexMap<String, RefOr<PathItem>>,
    /// Components reachable through `#/components/...` anchors.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub components: Option<Components>,
    /// Global security requirements.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub security: Vec<SecurityRequirement>,
    /// Tags.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<Tag>,
    /// External documentation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_docs: Option<ExternalDocs>,
    /// Unknown keys.
    #[serde(flatten)]
    pub extensions: Extensions,

    /// File-backed components and the path group tree.
    #[serde(skip)]
    pub component_files: Option<ComponentFiles>,
    /// Directories with no content outside the path tree.
    #[serde(skip)]
    pub empty_dirs: Vec<String>,
    /// Hashes of every decoded file as loaded, keyed by file path.
    #[serde(skip)]
    pub hashes: HashLedger,
    /// Name of the main file relative to the root.
    #[serde(skip)]
    pub main_file: String,
    /// Format used for files created by edits.
    #[serde(skip)]
    pub new_file_format: Format,
    /// Files carried through untouched, keyed by path.
    #[serde(skip)]
    pub other_files: IndexMap<String, Vec<u8>>,
    /// Loaded from one file. Such a document is always written back as one
    /// file, so edits keep path items inline.
    #[serde(skip)]
    pub single_file: bool,
}

impl Document {
    /// An empty document with default metadata.
    pub fn new() -> Self {
        return Self {
            openapi: DEFAULT_OPENAPI_VERSION.to_string(),
            info: Info {
                title: DEFAULT_TITLE.to_string(),
                version: DEFAULT_VERSION.to_string(),
                ..Info::default()
            },
            main_file: DEFAULT_MAIN_FILE.to_string(),
            ..Self::default()
        };
    }

    /// Mutable access to the file-backed store, creating it if absent.
    pub fn files_mut(&mut self) -> &mut ComponentFiles {
        return self.component_files.get_or_insert_with(ComponentFiles::default);
    }

    /// The first document path whose reference targets `file`.
    pub fn path_for_file(&self, file: &str) -> Option<&str> {
        let key = normalize_path(file);
        return self
            .paths
            .iter()
            .find(|(_, cell)| {
                return cell.as_reference().is_some_and(|reference| return normalize_path(reference) == key);
            })
            .map(|(path, _)| return path.as_str());
    }

    /// Rebuild `paths` in canonical order.
    ///
    /// Inline values come first, then anchor references, then references to
    /// files directly in `paths/`, then references into nested groups in tree
    /// order, then anything left over. Each tier keeps its input order, so
    /// running this twice gives the same result.
    pub fn sort_document_paths(&mut self) {
        let input = std::mem::take(&mut self.paths);
        let mut inline = Vec::new();
        let mut anchors = Vec::new();
        let mut external: Vec<(String, String, RefOr<PathItem>)> = Vec::new();
        for (path, cell) in input {
            match cell.as_reference() {
                None => inline.push((path, cell)),
                Some(reference) if reference.starts_with('#') => anchors.push((path, cell)),
                Some(reference) => {
                    let key = normalize_path(reference);
                    external.push((key, path, cell));
                },
            }
        }

        let tree = self.component_files.as_ref().map(|files| return &files.paths);
        let mut direct = Vec::new();
        let mut pending: Vec<Option<(String, String, RefOr<PathItem>)>> = Vec::new();
        for entry in external {
            if tree.is_some_and(|root| return root.items.contains_key(&entry.0)) {
                direct.push((entry.1, entry.2));
            } else {
                pending.push(Some(entry));
            }
        }

        let mut by_key: HashMap<String, Vec<usize>> = HashMap::new();
        for (index, entry) in pending.iter().enumerate() {
            if let Some((key, _, _)) = entry {
                by_key.entry(key.clone()).or_default().push(index);
            }
        }
        let mut nested = Vec::new();
        if let Some(root) = tree {
            for walked in root.walk_items().into_iter().filter(|walked| return !walked.group.is_empty()) {
                for index in by_key.remove(walked.key).unwrap_or_default() {
                    if let Some((_, path, cell)) = pending.get_mut(index).and_then(Option::take) {
                        nested.push((path, cell));
                    }
                }
            }
        }

        let leftover = pending.into_iter().flatten().map(|(_, path, cell)| return (path, cell));
        self.paths = inline
            .into_iter()
            .chain(anchors)
            .chain(direct)
            .chain(nested)
            .chain(leftover)
            .collect();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Ordered document path names.
    fn path_names(document: &Document) -> Vec<&str> {
        return document.paths.keys().map(String::as_str).collect();
    }

    /// A document whose tree holds one direct and two nested files.
    fn tree_document() -> Document {
        let mut document = Document::new();
        let files = document.files_mut();
        files.paths.item_update("paths/z/deep.yaml", Some(RefOr::Value(PathItem::default())));
        files.paths.item_update("paths/a/inner.yaml", Some(RefOr::Value(PathItem::default())));
        files.paths.item_update("paths/top.yaml", Some(RefOr::Value(PathItem::default())));

        document.paths.insert("/dangling".to_string(), RefOr::reference("./paths/missing.yaml"));
        document.paths.insert("/deep".to_string(), RefOr::reference("./paths/z/deep.yaml"));
        document.paths.insert("/inner".to_string(), RefOr::reference("./paths/a/inner.yaml"));
        document.paths.insert("/top".to_string(), RefOr::reference("./paths/top.yaml"));
        document.paths.insert("/anchor".to_string(), RefOr::reference("#/components/pathItems/Shared"));
        document.paths.insert("/inline".to_string(), RefOr::Value(PathItem::default()));
        return document;
    }

    #[test]
    fn new_has_default_metadata() {
        let document = Document::new();
        assert_eq!(document.openapi, "3.1.0");
        assert_eq!(document.info.title, "Untitled API");
        assert_eq!(document.info.version, "1.0.0");
        assert_eq!(document.main_file, "openapi.yaml");
        assert!(document.paths.is_empty());
    }

    #[test]
    fn sort_orders_tiers() {
        let mut document = tree_document();
        document.sort_document_paths();
        assert_eq!(path_names(&document), ["/inline", "/anchor", "/top", "/deep", "/inner", "/dangling"]);
    }

    #[test]
    fn sort_is_a_fixpoint() {
        let mut document = tree_document();
        document.sort_document_paths();
        let first: Vec<String> = document.paths.keys().cloned().collect();
        document.sort_document_paths();
        assert_eq!(path_names(&document), first);
    }

    #[test]
    fn sort_without_tree_keeps_references_in_order() {
        let mut document = Document::new();
        document.paths.insert("/b".to_string(), RefOr::reference("./paths/b.yaml"));
        document.paths.insert("/a".to_string(), RefOr::reference("./paths/a.yaml"));
        document.paths.insert("/inline".to_string(), RefOr::Value(PathItem::default()));
        document.sort_document_paths();
        assert_eq!(path_names(&document), ["/inline", "/b", "/a"]);
    }

    #[test]
    fn path_for_file_normalizes() {
        let document = tree_document();
        assert_eq!(document.path_for_file("paths/top.yaml"), Some("/top"));
        assert_eq!(document.path_for_file("./paths/a/inner.yaml"), Some("/inner"));
        assert_eq!(document.path_for_file("paths/none.yaml"), None);
    }

    #[test]
    fn encoding_skips_bookkeeping() {
        let mut document = Document::new();
        document.other_files.insert("README.md".to_string(), b"hi".to_vec());
        document.empty_dirs.push("docs".to_string());
        let encoded = serde_json::to_value(&document).unwrap();
        assert_eq!(
            encoded,
            serde_json::json!({
                "openapi": "3.1.0",
                "info": {"title": "Untitled API", "version": "1.0.0"},
            })
        );
    }

    #[test]
    fn swagger_keys_survive_as_extensions() {
        let document: Document = serde_json::from_value(serde_json::json!({
            "swagger": "2.0",
            "info": {"title": "Legacy", "version": "1"},
            "definitions": {"Pet": {"type": "object"}},
        }))
        .unwrap();
        assert!(document.openapi.is_empty());
        assert_eq!(document.extensions.get("swagger"), Some(&serde_json::json!("2.0")));
        assert!(document.extensions.contains_key("definitions"));
    }
}
