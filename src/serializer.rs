//! Directory serialization: turn a `Document` back into a file tree.
//!
//! Each file-backed entity is hashed in its canonical form and compared with
//! the ledger entry recorded at load time. Unchanged entities whose original
//! file still exists are written back byte for byte; everything else is
//! freshly encoded. The whole tree is built in memory before it is returned.

use serde::Serialize;
use tracing::{info, trace};

use crate::codec::{Codecs, Format};
use crate::components::{Component, Components};
use crate::document::{DEFAULT_MAIN_FILE, Document};
use crate::error::Error;
use crate::hasher::hash_entity;
use crate::ledger::HashLedger;
use crate::path_group::PathGroup;
use crate::spec::{
    Callback, Example, Header, Link, Parameter, PathItem, RequestBody, Response, Schema,
    SecurityScheme,
};
use crate::tree::{FileNode, FileTree, join};

/// Writes documents out as file trees or single files.
#[derive(Debug, Default)]
pub struct Serializer {
    /// Codecs used to encode every file.
    codecs: Codecs,
}

/// Per-call encoding state.
struct Emitter<'a> {
    /// Codecs to encode with.
    codecs: &'a Codecs,
    /// Number of files freshly encoded.
    encoded: usize,
    /// Format for keys without a known extension.
    fallback: Format,
    /// Hashes recorded at load time.
    hashes: &'a HashLedger,
    /// Number of files written back from the original bytes.
    reused: usize,
}

impl Serializer {
    /// A serializer with the built-in codecs.
    pub fn new() -> Self {
        return Self::default();
    }

    /// A serializer with host-provided codecs.
    pub const fn with_codecs(codecs: Codecs) -> Self {
        return Self { codecs };
    }

    /// Serialize as a directory when the document has file-backed content,
    /// otherwise as a single file. A document loaded from one file is always
    /// written as one file. `previous` is what is currently on disk.
    ///
    /// # Errors
    ///
    /// Returns `Error::Encode` if any entity fails to encode; nothing is
    /// returned in that case.
    pub fn serialize(&self, document: &Document, previous: Option<&FileNode>) -> Result<FileNode, Error> {
        if document.component_files.is_some() && !document.single_file {
            let tree = self.serialize_directory(document, previous.and_then(FileNode::as_directory))?;
            return Ok(FileNode::Directory(tree));
        }
        let bytes = self.serialize_file(document, previous.and_then(FileNode::regular_file_contents))?;
        return Ok(FileNode::File(bytes));
    }

    /// Build the full directory tree for a document.
    ///
    /// # Errors
    ///
    /// Returns `Error::Encode` if any entity fails to encode.
    pub fn serialize_directory(&self, document: &Document, previous: Option<&FileTree>) -> Result<FileTree, Error> {
        let mut emitter = self.emitter(document);
        let mut tree = FileTree::new();
        let original = |path: &str| return previous.and_then(|tree| return tree.get_file(path));

        let main = main_file(document);
        place(&mut tree, main, emitter.emit(main, document, original(main))?)?;

        if let Some(files) = &document.component_files {
            emitter.write_components(&files.components, previous, &mut tree)?;
            emitter.write_group(&files.paths, "paths", previous, &mut tree)?;
        }
        for (path, bytes) in &document.other_files {
            place(&mut tree, path, bytes.clone())?;
        }
        for dir in &document.empty_dirs {
            tree.ensure_directory(dir).ok_or_else(|| return outside_root(dir))?;
        }

        info!(
            main_file = main,
            reused = emitter.reused,
            encoded = emitter.encoded,
            passthrough = document.other_files.len(),
            "serialized document tree"
        );
        return Ok(tree);
    }

    /// Encode a document as one file.
    ///
    /// # Errors
    ///
    /// Returns `Error::Encode` if the document fails to encode.
    pub fn serialize_file(&self, document: &Document, previous: Option<&[u8]>) -> Result<Vec<u8>, Error> {
        let mut emitter = self.emitter(document);
        let main = main_file(document);
        let bytes = emitter.emit(main, document, previous)?;
        info!(file = main, reused = emitter.reused, "serialized single-file document");
        return Ok(bytes);
    }

    /// Fresh per-call state.
    const fn emitter<'a>(&'a self, document: &'a Document) -> Emitter<'a> {
        return Emitter {
            codecs: &self.codecs,
            encoded: 0,
            fallback: document.new_file_format,
            hashes: &document.hashes,
            reused: 0,
        };
    }
}

impl Emitter<'_> {
    /// Bytes for one file: the original when unchanged, else a fresh encoding.
    fn emit<T: Serialize>(&mut self, path: &str, value: &T, original: Option<&[u8]>) -> Result<Vec<u8>, Error> {
        let hash = hash_entity(path, value)?;
        if let (true, Some(original)) = (self.hashes.matches(path, &hash), original) {
            trace!(path, "unchanged, reusing original bytes");
            self.reused = self.reused.saturating_add(1);
            return Ok(original.to_vec());
        }
        let format = Format::for_path(path).unwrap_or(self.fallback);
        self.encoded = self.encoded.saturating_add(1);
        return self.codecs.encode(format, path, value);
    }

    /// Write one category's file-backed entries.
    fn write_category<T: Component + Serialize>(
        &mut self,
        components: &Components,
        previous: Option<&FileTree>,
        tree: &mut FileTree,
    ) -> Result<(), Error> {
        for (key, cell) in T::entries(components) {
            let path = component_file_path(T::CATEGORY.dir_name(), key, self.fallback);
            let original = previous.and_then(|prev| return prev.get_file(&path));
            let bytes = self.emit(&path, cell, original)?;
            place(tree, &path, bytes)?;
        }
        return Ok(());
    }

    /// Write every file-backed component, category by category.
    fn write_components(
        &mut self,
        components: &Components,
        previous: Option<&FileTree>,
        tree: &mut FileTree,
    ) -> Result<(), Error> {
        self.write_category::<Schema>(components, previous, tree)?;
        self.write_category::<Response>(components, previous, tree)?;
        self.write_category::<Parameter>(components, previous, tree)?;
        self.write_category::<Example>(components, previous, tree)?;
        self.write_category::<RequestBody>(components, previous, tree)?;
        self.write_category::<Header>(components, previous, tree)?;
        self.write_category::<SecurityScheme>(components, previous, tree)?;
        self.write_category::<Link>(components, previous, tree)?;
        self.write_category::<Callback>(components, previous, tree)?;
        self.write_category::<PathItem>(components, previous, tree)?;
        return Ok(());
    }

    /// Write one path group's items and its subgroups' directories.
    fn write_group(
        &mut self,
        group: &PathGroup,
        dir: &str,
        previous: Option<&FileTree>,
        tree: &mut FileTree,
    ) -> Result<(), Error> {
        for (key, cell) in &group.items {
            let original = previous.and_then(|prev| return prev.get_file(key));
            let bytes = self.emit(key, cell, original)?;
            place(tree, key, bytes)?;
        }
        for (name, child) in &group.groups {
            let child_dir = join(dir, name);
            tree.ensure_directory(&child_dir).ok_or_else(|| return outside_root(&child_dir))?;
            self.write_group(child, &child_dir, previous, tree)?;
        }
        return Ok(());
    }
}

/// File path for a component entry. Keys are normally file paths already;
/// a bare name is placed in its category directory.
fn component_file_path(dir_name: &str, key: &str, fallback: Format) -> String {
    if Format::for_path(key).is_some() {
        return key.to_string();
    }
    return format!("components/{dir_name}/{key}.{}", fallback.extension());
}

/// Put a file into the output tree.
///
/// # Errors
///
/// Returns `Error::Encode` if the path climbs out of the document root.
fn place(tree: &mut FileTree, path: &str, bytes: Vec<u8>) -> Result<(), Error> {
    if tree.insert_file(path, bytes) {
        return Ok(());
    }
    return Err(outside_root(path));
}

/// Error for an output path outside the document root.
fn outside_root(path: &str) -> Error {
    return Error::Encode { path: path.to_string(), reason: "path leaves the document directory".to_string() };
}

/// The document's main file name, or the default for new documents.
fn main_file(document: &Document) -> &str {
    if document.main_file.is_empty() {
        return DEFAULT_MAIN_FILE;
    }
    return &document.main_file;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assembler::Assembler;
    use crate::reference::RefOr;
    use crate::types::HttpMethod;

    /// Main file with one file-backed path.
    const MAIN: &[u8] = b"openapi: 3.1.0\ninfo:\n  title: Pets   # comment kept on round trip\n  version: '1'\npaths:\n  /users:\n    $ref: ./paths/users.yaml\n";

    /// A hand-formatted path item file.
    const USERS: &[u8] = b"get:\n  summary: \"List users\"\n  responses:\n    200: {description: ok}\n";

    /// A tree covering every kind of content.
    fn sample_tree() -> FileTree {
        let mut tree = FileTree::new();
        tree.insert_file("openapi.yaml", MAIN.to_vec());
        tree.insert_file("paths/users.yaml", USERS.to_vec());
        tree.insert_file("components/schemas/User.json", b"{ \"type\":\"object\" }".to_vec());
        tree.insert_file("notes.txt", b"keep me".to_vec());
        tree.ensure_directory("paths/empty/deeper");
        tree.ensure_directory("assets");
        return tree;
    }

    #[test]
    fn unedited_round_trip_is_byte_identical() {
        let tree = sample_tree();
        let document = Assembler::default().assemble_directory(&tree).unwrap();
        let written = Serializer::new().serialize_directory(&document, Some(&tree)).unwrap();
        assert_eq!(written, tree);
    }

    #[test]
    fn edited_file_is_reencoded() {
        let tree = sample_tree();
        let mut document = Assembler::default().assemble_directory(&tree).unwrap();
        let files = document.component_files.as_mut().unwrap();
        let users = files.paths.get_mut::<&str>(&[]).unwrap().items.get_mut("paths/users.yaml").unwrap();
        users.as_value_mut().unwrap().operation_mut(HttpMethod::Get).as_mut().unwrap().summary =
            Some("Changed".to_string());

        let written = Serializer::new().serialize_directory(&document, Some(&tree)).unwrap();
        let users = std::str::from_utf8(written.get_file("paths/users.yaml").unwrap()).unwrap();
        assert!(users.contains("Changed"));
        assert_eq!(written.get_file("openapi.yaml"), Some(MAIN));
        assert_eq!(written.get_file("components/schemas/User.json"), tree.get_file("components/schemas/User.json"));
    }

    #[test]
    fn missing_original_is_reencoded() {
        let tree = sample_tree();
        let document = Assembler::default().assemble_directory(&tree).unwrap();
        let written = Serializer::new().serialize_directory(&document, None).unwrap();
        let main = std::str::from_utf8(written.get_file("openapi.yaml").unwrap()).unwrap();
        assert!(!main.contains("comment"));
        assert!(main.contains("./paths/users.yaml"));
    }

    #[test]
    fn removed_entries_are_not_written() {
        let tree = sample_tree();
        let mut document = Assembler::default().assemble_directory(&tree).unwrap();
        document.paths.clear();
        document.component_files.as_mut().unwrap().paths.item_update("paths/users.yaml", None);

        let written = Serializer::new().serialize_directory(&document, Some(&tree)).unwrap();
        assert!(written.get_file("paths/users.yaml").is_none());
        assert!(written.get_directory("paths/empty/deeper").is_some());
        assert!(written.get_directory("assets").is_some());
    }

    #[test]
    fn bare_component_names_get_a_file() {
        let mut document = Document::new();
        document
            .files_mut()
            .components
            .schemas
            .insert("Pet".to_string(), RefOr::Value(Schema(serde_json::json!({"type": "string"}))));
        let written = Serializer::new().serialize(&document, None).unwrap();
        let tree = written.as_directory().unwrap();
        assert_eq!(tree.get_file("components/schemas/Pet.yaml"), Some(&b"type: string\n"[..]));
        assert!(tree.get_file("openapi.yaml").is_some());
    }

    #[test]
    fn single_file_round_trip() {
        let source = b"{\"openapi\":\"3.1.0\",\"info\":{\"title\":\"T\",\"version\":\"1\"}}";
        let document = Assembler::default().assemble_file("api.json", source).unwrap();
        let serializer = Serializer::new();

        assert_eq!(serializer.serialize_file(&document, Some(source)).unwrap(), source);

        let mut edited = document;
        edited.info.title = "Renamed".to_string();
        let written = serializer.serialize(&edited, Some(&FileNode::File(source.to_vec()))).unwrap();
        let text = String::from_utf8(written.regular_file_contents().unwrap().to_vec()).unwrap();
        assert!(text.contains("\"title\": \"Renamed\""));
    }

    #[test]
    fn single_file_documents_stay_single_files() {
        let source = b"openapi: 3.1.0\ninfo:\n  title: T\n  version: '1'\n";
        let mut document = Assembler::default().assemble_file("api.yaml", source).unwrap();
        document.files_mut();

        let written = Serializer::new().serialize(&document, Some(&FileNode::File(source.to_vec()))).unwrap();
        assert_eq!(written.regular_file_contents(), Some(&source[..]));
    }

    #[test]
    fn keys_outside_the_root_fail_the_save() {
        let mut document = Document::new();
        document.other_files.insert("../escape.txt".to_string(), b"x".to_vec());
        let result = Serializer::new().serialize_directory(&document, None);
        assert!(matches!(result, Err(Error::Encode { path, .. }) if path == "../escape.txt"));
    }
}
