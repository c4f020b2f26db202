//! Directory assembly: turn a file tree into a `Document`.
//!
//! Files are classified by where they sit. `paths/**` files become path items
//! in the path group tree, `components/<category>/**` files become file-backed
//! components, the first canonical main file becomes the document root, and
//! everything else is carried through as opaque bytes. Every decoded file gets
//! an entry in the hash ledger so a later save can tell whether it changed.

use indexmap::IndexMap;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, info, warn};

use crate::codec::{Codecs, Format};
use crate::components::{Category, Component, ComponentFiles};
use crate::config::Config;
use crate::document::Document;
use crate::error::Error;
use crate::hasher::hash_entity;
use crate::ledger::HashLedger;
use crate::path_group::PathGroup;
use crate::reference::RefOr;
use crate::spec::{
    Callback, Example, Header, Link, Parameter, PathItem, RequestBody, Response, Schema,
    SecurityScheme,
};
use crate::tree::{FileNode, FileTree, join};

/// Main file names, checked in this order at the top of a directory.
pub const MAIN_FILE_NAMES: [&str; 6] = [
    "openapi.yaml",
    "openapi.yml",
    "openapi.json",
    "swagger.yaml",
    "swagger.yml",
    "swagger.json",
];

/// Builds documents from file trees.
#[derive(Debug, Default)]
pub struct Assembler {
    /// Codecs used to decode every file.
    codecs: Codecs,
    /// Format and exclude settings.
    config: Config,
}

/// State gathered while walking a directory.
#[derive(Debug, Default)]
struct Gathered {
    /// Directories with no content outside the path tree.
    empty_dirs: Vec<String>,
    /// File-backed components and path items.
    files: ComponentFiles,
    /// Hashes of decoded files.
    hashes: HashLedger,
    /// Passthrough files.
    other_files: IndexMap<String, Vec<u8>>,
}

impl Assembler {
    /// An assembler with the built-in codecs.
    pub fn new(config: Config) -> Self {
        return Self { codecs: Codecs::default(), config };
    }

    /// An assembler with host-provided codecs.
    pub const fn with_codecs(config: Config, codecs: Codecs) -> Self {
        return Self { codecs, config };
    }

    /// Assemble a directory tree, or decode a single file as a document.
    /// A bare file has no name, so JSON is tried before YAML.
    ///
    /// # Errors
    ///
    /// Returns `Error::MissingMainFile` if a directory has no main file,
    /// or `Error::Decode` if the main file does not decode.
    pub fn assemble(&self, node: &FileNode) -> Result<Document, Error> {
        return match node {
            FileNode::Directory(tree) => self.assemble_directory(tree),
            FileNode::File(bytes) => self.decode_single(None, Format::Json, bytes),
        };
    }

    /// Assemble a directory tree.
    ///
    /// # Errors
    ///
    /// Returns `Error::MissingMainFile` if no main file is found at the top,
    /// or `Error::Decode` if the main file does not decode.
    pub fn assemble_directory(&self, tree: &FileTree) -> Result<Document, Error> {
        let main_name = MAIN_FILE_NAMES
            .into_iter()
            .find(|name| return tree.files().contains_key(*name))
            .ok_or_else(|| {
                return Error::MissingMainFile {
                    searched: MAIN_FILE_NAMES.iter().map(|name| return (*name).to_string()).collect(),
                };
            })?;

        let mut gathered = Gathered::default();
        self.walk(tree, "", main_name, &mut gathered);

        let main_bytes = tree.files().get(main_name).map_or(&[][..], Vec::as_slice);
        let preferred = Format::for_path(main_name).unwrap_or_default();
        let (mut document, _): (Document, Format) =
            self.codecs.decode_any(preferred, main_name, main_bytes)?;

        gathered.files.paths.sort_by_path_order(&document.paths);
        document.component_files = Some(gathered.files);
        document.other_files = gathered.other_files;
        document.empty_dirs = gathered.empty_dirs;
        document.main_file = main_name.to_string();
        document.new_file_format = self.config.format;
        document.sort_document_paths();

        gathered.hashes.record(main_name, hash_entity(main_name, &document)?);
        document.hashes = gathered.hashes;

        info!(
            main_file = main_name,
            paths = document.paths.len(),
            path_files = document.component_files.as_ref().map_or(0, |files| return files.paths.item_count()),
            components = document.component_files.as_ref().map_or(0, |files| return files.components.len()),
            other_files = document.other_files.len(),
            "assembled document"
        );
        return Ok(document);
    }

    /// Decode one named file as a document.
    /// The name's extension picks the format tried first.
    ///
    /// # Errors
    ///
    /// Returns `Error::Decode` if the bytes decode in neither format.
    pub fn assemble_file(&self, name: &str, bytes: &[u8]) -> Result<Document, Error> {
        let preferred = Format::for_path(name).unwrap_or(Format::Json);
        return self.decode_single(Some(name), preferred, bytes);
    }

    /// Classify one file below the root and store it.
    fn classify(&self, path: &str, bytes: &[u8], gathered: &mut Gathered) {
        let stored = match Format::for_path(path) {
            Some(_) if self.config.is_excluded(path) => {
                debug!(path, "excluded by config");
                false
            },
            Some(format) => self.decode_known(path, format, bytes, gathered),
            None => false,
        };
        if !stored {
            debug!(path, "passthrough");
            gathered.other_files.insert(path.to_string(), bytes.to_vec());
        }
    }

    /// Decode a file if its location names a known entity kind.
    /// Returns false when the file should be passed through instead.
    fn decode_known(&self, path: &str, format: Format, bytes: &[u8], gathered: &mut Gathered) -> bool {
        let components: Vec<&str> = path.split('/').collect();
        let result = match components.as_slice() {
            ["paths", _, ..] => self.decode_path_item(path, format, bytes, gathered),
            ["components", category, _, ..] => match Category::from_dir_name(category) {
                Some(category) => self.decode_category(category, path, format, bytes, gathered),
                None => return false,
            },
            _ => return false,
        };
        return match result {
            Ok(()) => true,
            Err(err) => {
                warn!(path, %err, "file does not decode, keeping it as passthrough");
                false
            },
        };
    }

    /// Decode a file under `components/<category>/`.
    fn decode_category(
        &self,
        category: Category,
        path: &str,
        format: Format,
        bytes: &[u8],
        gathered: &mut Gathered,
    ) -> Result<(), Error> {
        return match category {
            Category::Callbacks => self.decode_component::<Callback>(path, format, bytes, gathered),
            Category::Examples => self.decode_component::<Example>(path, format, bytes, gathered),
            Category::Headers => self.decode_component::<Header>(path, format, bytes, gathered),
            Category::Links => self.decode_component::<Link>(path, format, bytes, gathered),
            Category::Parameters => self.decode_component::<Parameter>(path, format, bytes, gathered),
            Category::PathItems => self.decode_component::<PathItem>(path, format, bytes, gathered),
            Category::RequestBodies => {
                self.decode_component::<RequestBody>(path, format, bytes, gathered)
            },
            Category::Responses => self.decode_component::<Response>(path, format, bytes, gathered),
            Category::Schemas => self.decode_component::<Schema>(path, format, bytes, gathered),
            Category::SecuritySchemes => {
                self.decode_component::<SecurityScheme>(path, format, bytes, gathered)
            },
        };
    }

    /// Decode a component file into its category map, keyed by file path.
    fn decode_component<T: Component + DeserializeOwned + Serialize>(
        &self,
        path: &str,
        format: Format,
        bytes: &[u8],
        gathered: &mut Gathered,
    ) -> Result<(), Error> {
        let (cell, _): (RefOr<T>, Format) = self.codecs.decode_any(format, path, bytes)?;
        gathered.hashes.record(path, hash_entity(path, &cell)?);
        T::entries_mut(&mut gathered.files.components).insert(path.to_string(), cell);
        debug!(path, category = %T::CATEGORY, "component file");
        return Ok(());
    }

    /// Decode a `paths/**` file into the path group tree.
    fn decode_path_item(
        &self,
        path: &str,
        format: Format,
        bytes: &[u8],
        gathered: &mut Gathered,
    ) -> Result<(), Error> {
        let (cell, _): (RefOr<PathItem>, Format) = self.codecs.decode_any(format, path, bytes)?;
        gathered.hashes.record(path, hash_entity(path, &cell)?);
        gathered.files.paths.item_update(path, Some(cell));
        debug!(path, "path item file");
        return Ok(());
    }

    /// Decode a document that is a single file.
    /// An unnamed file is named `openapi.<ext>` after the format that decoded it.
    fn decode_single(&self, name: Option<&str>, preferred: Format, bytes: &[u8]) -> Result<Document, Error> {
        let label = name.unwrap_or("<input>");
        let (mut document, format): (Document, Format) = self.codecs.decode_any(preferred, label, bytes)?;
        document.main_file = name.map_or_else(|| return format!("openapi.{}", format.extension()), str::to_string);
        document.new_file_format = format;
        document.single_file = true;
        let hash = hash_entity(&document.main_file, &document)?;
        document.hashes.record(document.main_file.clone(), hash);
        info!(file = %document.main_file, paths = document.paths.len(), "decoded single-file document");
        return Ok(document);
    }

    /// Record an empty directory, as a path group when it lies under `paths/`.
    fn register_empty(dir: &str, gathered: &mut Gathered) {
        let group: Vec<&str> = dir.strip_prefix("paths/").map_or_else(Vec::new, |rest| {
            return rest.split('/').collect();
        });
        if group.is_empty() {
            gathered.empty_dirs.push(dir.to_string());
            return;
        }
        if gathered.files.paths.get(&group).is_ok() {
            return;
        }
        match gathered.files.paths.set_group(&group, Some(PathGroup::default())) {
            Ok(()) => debug!(dir, "empty path group"),
            Err(err) => {
                warn!(dir, %err, "empty group not registered");
                gathered.empty_dirs.push(dir.to_string());
            },
        }
    }

    /// Walk a directory: its files first, then its subdirectories.
    fn walk(&self, dir: &FileTree, prefix: &str, main_name: &str, gathered: &mut Gathered) {
        if dir.is_empty() && !prefix.is_empty() {
            Self::register_empty(prefix, gathered);
            return;
        }
        for (name, bytes) in dir.files() {
            if prefix.is_empty() {
                if name != main_name {
                    debug!(path = %name, "top-level passthrough");
                    gathered.other_files.insert(name.clone(), bytes.clone());
                }
                continue;
            }
            self.classify(&join(prefix, name), bytes, gathered);
        }
        for (name, child) in dir.directories() {
            self.walk(child, &join(prefix, name), main_name, gathered);
        }
    }
}
