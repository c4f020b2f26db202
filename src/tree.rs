//! In-memory file trees: the only I/O surface the assembler and serializer see.

use std::collections::BTreeMap;

/// Input to assembly: a directory tree or a single file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileNode {
    /// A directory and its children.
    Directory(FileTree),
    /// Regular file contents.
    File(Vec<u8>),
}

/// A directory. A name is either a subdirectory or a file, never both.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileTree {
    /// Subdirectories by name.
    directories: BTreeMap<String, FileTree>,
    /// Regular files by name.
    files: BTreeMap<String, Vec<u8>>,
}

impl FileNode {
    /// The directory, if this is one.
    pub const fn as_directory(&self) -> Option<&FileTree> {
        return match self {
            Self::Directory(tree) => Some(tree),
            Self::File(_) => None,
        };
    }

    /// Whether this node is a directory.
    pub const fn is_directory(&self) -> bool {
        return matches!(self, Self::Directory(_));
    }

    /// File contents, if this is a regular file.
    pub fn regular_file_contents(&self) -> Option<&[u8]> {
        return match self {
            Self::Directory(_) => None,
            Self::File(bytes) => Some(bytes),
        };
    }
}

impl FileTree {
    /// An empty directory.
    pub fn new() -> Self {
        return Self::default();
    }

    /// Get or create a child directory. A file with the same name is replaced.
    pub fn add_directory(&mut self, name: &str) -> &mut Self {
        self.files.remove(name);
        return self.directories.entry(name.to_string()).or_default();
    }

    /// Add or replace a child file. A directory with the same name is replaced.
    pub fn add_file(&mut self, name: &str, bytes: Vec<u8>) {
        self.directories.remove(name);
        self.files.insert(name.to_string(), bytes);
    }

    /// Subdirectories by name.
    pub const fn directories(&self) -> &BTreeMap<String, Self> {
        return &self.directories;
    }

    /// Walk to `path`, creating directories as needed.
    /// Returns `None` without creating anything if `path` contains `..`.
    pub fn ensure_directory(&mut self, path: &str) -> Option<&mut Self> {
        let components = contained(path)?;
        let mut node = self;
        for component in components {
            node = node.add_directory(component);
        }
        return Some(node);
    }

    /// Every regular file below this directory as `(path, contents)`, depth-first in name order.
    pub fn file_paths(&self) -> Vec<(String, &[u8])> {
        let mut found = Vec::new();
        self.collect_files("", &mut found);
        return found;
    }

    /// Regular files by name.
    pub const fn files(&self) -> &BTreeMap<String, Vec<u8>> {
        return &self.files;
    }

    /// The directory at a slash-separated path. The empty path is this directory.
    pub fn get_directory(&self, path: &str) -> Option<&Self> {
        let mut node = self;
        for component in split(path) {
            node = node.directories.get(component)?;
        }
        return Some(node);
    }

    /// Contents of the regular file at a slash-separated path.
    pub fn get_file(&self, path: &str) -> Option<&[u8]> {
        let mut components = split(path);
        let name = components.pop()?;
        let mut node = self;
        for component in components {
            node = node.directories.get(component)?;
        }
        return node.files.get(name).map(Vec::as_slice);
    }

    /// Write a file at a slash-separated path, creating parent directories.
    /// Returns `false` and writes nothing for an empty path or one containing `..`.
    pub fn insert_file(&mut self, path: &str, bytes: Vec<u8>) -> bool {
        let Some(mut components) = contained(path) else {
            return false;
        };
        let Some(name) = components.pop() else {
            return false;
        };
        let mut node = self;
        for component in components {
            node = node.add_directory(component);
        }
        node.add_file(name, bytes);
        return true;
    }

    /// Whether this directory has no children.
    pub fn is_empty(&self) -> bool {
        return self.directories.is_empty() && self.files.is_empty();
    }

    /// Recursive worker for `file_paths`.
    fn collect_files<'a>(&'a self, prefix: &str, out: &mut Vec<(String, &'a [u8])>) {
        for (name, bytes) in &self.files {
            out.push((join(prefix, name), bytes));
        }
        for (name, tree) in &self.directories {
            tree.collect_files(&join(prefix, name), out);
        }
    }
}

/// Join a directory prefix and a name.
pub fn join(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        return name.to_string();
    }
    return format!("{prefix}/{name}");
}

/// Components of a path that stays inside the tree, or `None` if it climbs out.
fn contained(path: &str) -> Option<Vec<&str>> {
    let components = split(path);
    if components.contains(&"..") {
        return None;
    }
    return Some(components);
}

/// Non-empty components of a slash-separated path.
fn split(path: &str) -> Vec<&str> {
    return path
        .split('/')
        .filter(|component| return !component.is_empty() && *component != ".")
        .collect();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_creates_parents() {
        let mut tree = FileTree::new();
        tree.insert_file("paths/v1/users.yaml", b"get: {}\n".to_vec());

        assert!(tree.get_directory("paths/v1").is_some());
        assert_eq!(tree.get_file("./paths/v1/users.yaml"), Some(&b"get: {}\n"[..]));
        assert_eq!(tree.get_file("paths/v1"), None);
    }

    #[test]
    fn file_paths_list_files_before_subdirectories() {
        let mut tree = FileTree::new();
        tree.insert_file("b.yaml", b"b".to_vec());
        tree.insert_file("a/z.yaml", b"z".to_vec());
        tree.ensure_directory("empty/inner");

        let paths: Vec<String> = tree.file_paths().into_iter().map(|(path, _)| return path).collect();
        assert_eq!(paths, ["b.yaml", "a/z.yaml"]);
        assert!(tree.get_directory("empty/inner").unwrap().is_empty());
    }

    #[test]
    fn parent_components_are_refused() {
        let mut tree = FileTree::new();
        assert!(!tree.insert_file("paths/../../escape.yaml", b"x".to_vec()));
        assert!(tree.ensure_directory("../outside").is_none());
        assert!(tree.is_empty());

        assert!(tree.insert_file("./paths/a.yaml", b"a".to_vec()));
        assert!(tree.ensure_directory("paths/v1").is_some());
    }

    #[test]
    fn names_are_either_file_or_directory() {
        let mut tree = FileTree::new();
        tree.insert_file("docs/readme.md", b"x".to_vec());
        tree.add_directory("docs");
        assert!(tree.get_file("docs/readme.md").is_some());

        tree.add_file("docs", b"flat".to_vec());
        assert!(tree.get_directory("docs").is_none());
        assert_eq!(tree.get_file("docs"), Some(&b"flat"[..]));
    }
}
