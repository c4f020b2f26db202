//! Filesystem adapter: read and write `FileTree`s, load and save documents.
//!
//! Writes never patch a tree in place. The new tree is staged in a temporary
//! directory next to the target and swapped in with renames, so a failure
//! before the swap leaves the previous tree untouched.

use std::io::Write as _;
use std::path::Path;

use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::assembler::Assembler;
use crate::config::Config;
use crate::document::Document;
use crate::error::Error;
use crate::serializer::Serializer;
use crate::tree::{FileNode, FileTree};

/// Prefix of the staging directory created next to a target.
const STAGING_PREFIX: &str = ".oasdir-staging-";

/// Prefix of the directory the previous tree is parked in during a swap.
const PREVIOUS_PREFIX: &str = ".oasdir-previous-";

/// Load a document from a directory or a single file.
/// Without an explicit config, a directory's `.oasdir.toml` is used.
///
/// # Errors
///
/// Returns `Error::Io` or `Error::Walk` if reading fails,
/// `Error::TomlDe` for a malformed config file,
/// or any assembly error.
pub fn load(path: &Path, config: Option<Config>) -> Result<Document, Error> {
    if path.is_dir() {
        let config = match config {
            Some(config) => config,
            None => Config::load(path)?,
        };
        let tree = read_tree(path)?;
        let document = Assembler::new(config).assemble_directory(&tree)?;
        info!(path = %path.display(), "loaded document directory");
        return Ok(document);
    }
    let bytes = std::fs::read(path)?;
    let name = path.file_name().map_or_else(String::new, |name| return name.to_string_lossy().into_owned());
    let document = Assembler::new(config.unwrap_or_default()).assemble_file(&name, &bytes)?;
    info!(path = %path.display(), "loaded document file");
    return Ok(document);
}

/// Read a directory into a `FileTree`. Empty directories are kept;
/// symlinks are skipped, and a later `write_tree` over the same directory
/// refuses to run while they are there.
///
/// # Errors
///
/// Returns `Error::Walk` if the directory cannot be walked,
/// or `Error::Io` if a file cannot be read.
pub fn read_tree(root: &Path) -> Result<FileTree, Error> {
    let mut tree = FileTree::new();
    for entry in WalkDir::new(root).min_depth(1).sort_by_file_name() {
        let entry = entry?;
        let Ok(relative) = entry.path().strip_prefix(root) else {
            continue;
        };
        let relative = relative_key(relative);
        let file_type = entry.file_type();
        if file_type.is_dir() {
            tree.ensure_directory(&relative);
        } else if file_type.is_file() {
            tree.insert_file(&relative, std::fs::read(entry.path())?);
        } else {
            warn!(path = %relative, "skipping symlink or special file");
        }
    }
    return Ok(tree);
}

/// Serialize a document against what is on disk and write the result.
///
/// # Errors
///
/// Returns any serialization error (nothing is written in that case),
/// or `Error::Io` if reading the previous state or writing fails.
pub fn save(path: &Path, document: &Document) -> Result<(), Error> {
    let previous = if path.is_dir() {
        Some(FileNode::Directory(read_tree(path)?))
    } else if path.is_file() {
        Some(FileNode::File(std::fs::read(path)?))
    } else {
        None
    };
    match Serializer::new().serialize(document, previous.as_ref())? {
        FileNode::Directory(tree) => write_tree(path, &tree)?,
        FileNode::File(bytes) => write_file(path, &bytes)?,
    }
    info!(path = %path.display(), "saved document");
    return Ok(());
}

/// Write bytes to a file through a persisted temporary file.
///
/// # Errors
///
/// Returns `Error::TargetMismatch` if `target` is a directory,
/// or `Error::Io` if the temporary file cannot be written or renamed.
pub fn write_file(target: &Path, bytes: &[u8]) -> Result<(), Error> {
    if target.is_dir() {
        return Err(Error::TargetMismatch {
            path: target.display().to_string(),
            reason: "a directory exists there and the document is a single file".to_string(),
        });
    }
    let parent = parent_dir(target);
    std::fs::create_dir_all(parent)?;
    let mut staged = tempfile::NamedTempFile::new_in(parent)?;
    staged.write_all(bytes)?;
    staged.as_file().sync_all()?;
    staged.persist(target).map_err(|err| return Error::Io(err.error))?;
    return Ok(());
}

/// Replace the directory at `target` with `tree`.
///
/// # Errors
///
/// Returns `Error::TargetMismatch` if `target` is a regular file,
/// `Error::UnsupportedEntry` if the existing directory holds a symlink or
/// other entry a `FileTree` cannot carry,
/// or `Error::Io` if staging or the swap fails. The previous tree is
/// restored if the new one cannot be moved into place.
pub fn write_tree(target: &Path, tree: &FileTree) -> Result<(), Error> {
    if target.is_file() {
        return Err(Error::TargetMismatch {
            path: target.display().to_string(),
            reason: "a file exists there and the document is a directory".to_string(),
        });
    }
    if target.is_dir() {
        ensure_representable(target)?;
    }
    let parent = parent_dir(target);
    std::fs::create_dir_all(parent)?;

    let staging = tempfile::Builder::new().prefix(STAGING_PREFIX).tempdir_in(parent)?;
    materialize(staging.path(), tree)?;

    if !target.exists() {
        std::fs::rename(staging.path(), target)?;
        return Ok(());
    }

    let parked = tempfile::Builder::new().prefix(PREVIOUS_PREFIX).tempdir_in(parent)?;
    let previous = parked.path().join("tree");
    std::fs::rename(target, &previous)?;
    if let Err(err) = std::fs::rename(staging.path(), target) {
        warn!(path = %target.display(), %err, "swap failed, restoring previous tree");
        std::fs::rename(&previous, target)?;
        return Err(Error::Io(err));
    }
    debug!(path = %target.display(), "swapped in new tree");
    return Ok(());
}

/// Fail on the first entry below `root` that is neither a directory nor a
/// regular file. Replacing `root` would silently drop it.
///
/// # Errors
///
/// Returns `Error::UnsupportedEntry` naming the entry,
/// or `Error::Walk` if the directory cannot be walked.
fn ensure_representable(root: &Path) -> Result<(), Error> {
    for entry in WalkDir::new(root).min_depth(1) {
        let entry = entry?;
        let file_type = entry.file_type();
        if file_type.is_dir() || file_type.is_file() {
            continue;
        }
        let path = entry
            .path()
            .strip_prefix(root)
            .map_or_else(|_| return entry.path().display().to_string(), relative_key);
        return Err(Error::UnsupportedEntry { path });
    }
    return Ok(());
}

/// Write every directory and file of `tree` below `dir`.
///
/// # Errors
///
/// Returns `Error::Io` on the first failed write.
fn materialize(dir: &Path, tree: &FileTree) -> Result<(), Error> {
    for (name, bytes) in tree.files() {
        std::fs::write(dir.join(name), bytes)?;
    }
    for (name, child) in tree.directories() {
        let child_dir = dir.join(name);
        std::fs::create_dir_all(&child_dir)?;
        materialize(&child_dir, child)?;
    }
    return Ok(());
}

/// The directory containing `target`, or `.` for a bare name.
fn parent_dir(target: &Path) -> &Path {
    return target
        .parent()
        .filter(|parent| return !parent.as_os_str().is_empty())
        .unwrap_or_else(|| return Path::new("."));
}

/// A relative filesystem path as a slash-separated tree key.
fn relative_key(relative: &Path) -> String {
    return relative
        .components()
        .map(|component| return component.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/");
}
