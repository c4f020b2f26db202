//! Structural edits that keep the route table and the file layout in step.
//!
//! Every mutator updates `document.paths`, the path group tree, and the hash
//! ledger together. A file that moves or disappears loses its ledger entry, so
//! the next save encodes it fresh instead of reusing stale bytes.

use std::collections::HashSet;

use indexmap::IndexMap;
use tracing::debug;

use crate::codec::Format;
use crate::components::Category;
use crate::document::Document;
use crate::error::Error;
use crate::path_group::PathGroup;
use crate::reference::{RefOr, ReferenceTarget, normalize_path, parse_reference};
use crate::spec::PathItem;
use crate::types::HttpMethod;

/// Directory holding file-backed path items.
const PATHS_DIR: &str = "paths";

/// Directory holding file-backed path item components.
const COMPONENT_PATH_ITEMS_DIR: &str = "components/pathItems/";

/// Base name for the file backing `/`.
const ROOT_FILE_STEM: &str = "root";

/// Where a path's item lives after resolving its reference one step.
enum Slot {
    /// `#/components/pathItems/<name>`.
    Anchor(String),
    /// A file-backed component under `components/pathItems/`.
    ComponentFile(String),
    /// Inline in `document.paths`.
    Inline,
    /// An item in the path group tree.
    TreeFile(String),
}

/// Create an empty group under `parent`. Creating an existing group is a no-op.
///
/// # Errors
///
/// Returns `Error::InvalidGroup` if `name` or a parent component is not a
/// plain directory name, or if the document is a single file.
pub fn add_group<S: AsRef<str>>(document: &mut Document, parent: &[S], name: &str) -> Result<(), Error> {
    if document.single_file {
        return Err(single_file_group());
    }
    check_group(parent)?;
    check_group_name(name)?;
    let mut components: Vec<String> = parent.iter().map(|component| return component.as_ref().to_string()).collect();
    components.push(name.to_string());

    let tree = &mut document.files_mut().paths;
    if tree.get(&components).is_ok() {
        return Ok(());
    }
    tree.set_group(&components, Some(PathGroup::default()))?;
    debug!(group = %components.join("/"), "added group");
    return Ok(());
}

/// Add a file-backed path under a group.
/// Returns the file path the item was stored at.
///
/// A single-file document keeps the item inline and returns its main file.
///
/// # Errors
///
/// Returns `Error::DuplicatePath` if the path already exists,
/// `Error::InvalidGroup` if a group component is not a plain directory name
/// (or any group is given for a single-file document),
/// or `Error::FileExists` if the file it would be stored in is taken.
pub fn add_path<S: AsRef<str>>(
    document: &mut Document,
    path: &str,
    group: &[S],
    item: PathItem,
) -> Result<String, Error> {
    let path = normalize_route(path);
    if document.paths.contains_key(&path) {
        return Err(Error::DuplicatePath { path });
    }
    if document.single_file {
        if !group.is_empty() {
            return Err(single_file_group());
        }
        document.paths.insert(path.clone(), RefOr::Value(item));
        debug!(path, "added inline path");
        return Ok(document.main_file.clone());
    }
    let key = group_file_path(group, &path, document.new_file_format)?;
    let tree = &mut document.files_mut().paths;
    if tree.contains_key(&key) {
        return Err(Error::FileExists { path: key });
    }
    tree.item_update(&key, Some(RefOr::Value(item)));
    document.paths.insert(path.clone(), RefOr::reference(key.clone()));
    debug!(path, file = key, "added path");
    return Ok(key);
}

/// Remove a group and every document path backed by a file inside it.
/// Returns the removed document paths.
///
/// # Errors
///
/// Returns `Error::InvalidGroup` for the root group,
/// or `Error::GroupNotFound` if the group does not exist.
pub fn delete_group<S: AsRef<str>>(document: &mut Document, components: &[S]) -> Result<Vec<String>, Error> {
    if components.is_empty() {
        return Err(Error::InvalidGroup { reason: "the root group cannot be deleted".to_string() });
    }
    let Some(files) = document.component_files.as_mut() else {
        let components = components.iter().map(|component| return component.as_ref().to_string()).collect();
        return Err(Error::GroupNotFound { components });
    };
    let keys: HashSet<String> = files
        .paths
        .get(components)?
        .walk_items()
        .into_iter()
        .map(|walked| return walked.key.to_string())
        .collect();
    files.paths.set_group(components, None)?;

    for key in &keys {
        document.hashes.forget(key);
    }
    let mut removed = Vec::new();
    document.paths.retain(|path, cell| {
        let backed = cell
            .as_reference()
            .is_some_and(|reference| return keys.contains(&normalize_path(reference)));
        if backed {
            removed.push(path.clone());
        }
        return !backed;
    });
    debug!(files = keys.len(), paths = removed.len(), "deleted group");
    return Ok(removed);
}

/// Clear one operation of a path. When no operation is left the path is
/// removed, together with its file in the path tree.
///
/// # Errors
///
/// Returns `Error::PathNotFound` if the path does not exist,
/// `Error::UnresolvedReference` if its item cannot be found,
/// or `Error::CyclicReference` if its reference chain loops.
pub fn delete_operation(document: &mut Document, path: &str, method: HttpMethod) -> Result<(), Error> {
    let cell = document.paths.get(path).ok_or_else(|| return Error::PathNotFound { path: path.to_string() })?;
    let slot = slot_of(cell)?;
    let mut item = cell
        .resolve(document)?
        .cloned()
        .ok_or_else(|| return Error::UnresolvedReference { reference: cell.as_reference().unwrap_or_default().to_string() })?;
    item.set_operation(method, None);

    if item.has_operations() {
        write_back(document, path, slot, item);
        debug!(path, %method, "deleted operation");
        return Ok(());
    }

    document.paths.shift_remove(path);
    if let Slot::TreeFile(key) = slot {
        let still_used = document
            .paths
            .values()
            .any(|other| return other.as_reference().is_some_and(|reference| return normalize_path(reference) == key));
        if !still_used {
            document.files_mut().paths.item_update(&key, None);
            document.hashes.forget(&key);
        }
    }
    debug!(path, %method, "deleted last operation, removed path");
    return Ok(());
}

/// Move a path into a group. An inline path is written to a new file there;
/// a file-backed path has its file moved. Returns the new file path.
///
/// # Errors
///
/// Returns `Error::PathNotFound` if the path does not exist,
/// `Error::InvalidMove` if it is not inline or a path tree file, or the
/// document is a single file,
/// `Error::InvalidGroup` if a group component is not a plain directory name,
/// or `Error::FileExists` if the destination file is taken.
pub fn move_path_to_group<S: AsRef<str>>(document: &mut Document, path: &str, group: &[S]) -> Result<String, Error> {
    let cell = document.paths.get(path).ok_or_else(|| return Error::PathNotFound { path: path.to_string() })?;
    if document.single_file {
        return Err(Error::InvalidMove {
            path: path.to_string(),
            reason: "a single-file document keeps every path inline".to_string(),
        });
    }
    let slot = slot_of(cell)?;
    let key = group_file_path(group, path, document.new_file_format)?;

    match slot {
        Slot::Inline => {
            let item = cell.as_value().cloned().unwrap_or_default();
            let tree = &mut document.files_mut().paths;
            if tree.contains_key(&key) {
                return Err(Error::FileExists { path: key });
            }
            tree.item_update(&key, Some(RefOr::Value(item)));
        },
        Slot::TreeFile(old_key) => {
            if old_key == key {
                return Ok(key);
            }
            let tree = &mut document.files_mut().paths;
            if tree.contains_key(&key) {
                return Err(Error::FileExists { path: key });
            }
            let moved = tree
                .item_update(&old_key, None)
                .ok_or_else(|| return Error::UnresolvedReference { reference: old_key.clone() })?;
            tree.item_update(&key, Some(moved));
            document.hashes.forget(&old_key);
            retarget(&mut document.paths, &old_key, &key);
        },
        Slot::Anchor(_) | Slot::ComponentFile(_) => {
            return Err(Error::InvalidMove {
                path: path.to_string(),
                reason: "only inline paths and files under paths/ can move between groups".to_string(),
            });
        },
    }
    document.paths.insert(path.to_string(), RefOr::reference(key.clone()));
    debug!(path, file = key, "moved path to group");
    return Ok(key);
}

/// Reorder a file-backed path among the items of its group. The document
/// route table is reordered to match, so the order survives a reload.
///
/// # Errors
///
/// Returns `Error::PathNotFound` if the path does not exist,
/// or `Error::InvalidMove` if it is not a path tree file.
pub fn move_path_within_group(document: &mut Document, path: &str, index: usize) -> Result<(), Error> {
    let cell = document.paths.get(path).ok_or_else(|| return Error::PathNotFound { path: path.to_string() })?;
    let Slot::TreeFile(key) = slot_of(cell)? else {
        return Err(Error::InvalidMove { path: path.to_string(), reason: "path is not backed by a file under paths/".to_string() });
    };
    let tree = &mut document.files_mut().paths;
    let group_components = tree
        .walk_items()
        .into_iter()
        .find(|walked| return walked.key == key)
        .map(|walked| return walked.group)
        .ok_or_else(|| return Error::UnresolvedReference { reference: key.clone() })?;
    let group = tree.get_mut(&group_components)?;
    group.move_item(&key, index);
    let order: Vec<String> = group.items.keys().cloned().collect();

    document.paths = reorder_within(std::mem::take(&mut document.paths), &order);
    debug!(path, index, "moved path within group");
    return Ok(());
}

/// Reject anything but a plain directory name.
///
/// # Errors
///
/// Returns `Error::InvalidGroup` for an empty name, `.`, `..`, or a name with `/` or `\`.
fn check_group_name(name: &str) -> Result<(), Error> {
    if name.is_empty() || name.contains(['/', '\\']) || name == "." || name == ".." {
        return Err(Error::InvalidGroup { reason: format!("`{name}` is not a directory name") });
    }
    return Ok(());
}

/// Check every component of a group path.
///
/// # Errors
///
/// Returns `Error::InvalidGroup` for the first component that is not a plain directory name.
fn check_group<S: AsRef<str>>(group: &[S]) -> Result<(), Error> {
    for component in group {
        check_group_name(component.as_ref())?;
    }
    return Ok(());
}

/// File path for a route stored under a group: `paths/<group>/<route>.<ext>`.
///
/// # Errors
///
/// Returns `Error::InvalidGroup` if a group component is not a plain directory
/// name, or the result would not stay under `paths/`.
fn group_file_path<S: AsRef<str>>(group: &[S], route: &str, format: Format) -> Result<String, Error> {
    check_group(group)?;
    let trimmed = route.trim_start_matches('/');
    let stem = if trimmed.is_empty() { ROOT_FILE_STEM.to_string() } else { trimmed.replace(['/', '\\'], "_") };
    let mut components = vec![PATHS_DIR.to_string()];
    components.extend(group.iter().map(|component| return component.as_ref().to_string()));
    components.push(format!("{stem}.{}", format.extension()));
    let key = components.join("/");
    if normalize_path(&key) != key || !key.starts_with("paths/") {
        return Err(Error::InvalidGroup { reason: format!("`{key}` is not a file under paths/") });
    }
    return Ok(key);
}

/// Error for group edits on a single-file document.
fn single_file_group() -> Error {
    return Error::InvalidGroup { reason: "a single-file document has no path groups".to_string() };
}

/// Ensure a route starts with `/`.
fn normalize_route(path: &str) -> String {
    if path.starts_with('/') {
        return path.to_string();
    }
    return format!("/{path}");
}

/// Rebuild `paths` so entries backed by `order`'s files appear in that order,
/// occupying the same slots they held before.
fn reorder_within(paths: IndexMap<String, RefOr<PathItem>>, order: &[String]) -> IndexMap<String, RefOr<PathItem>> {
    let file_of = |cell: &RefOr<PathItem>| return cell.as_reference().map(normalize_path);
    let members: HashSet<&str> = order.iter().map(String::as_str).collect();

    let mut moved: Vec<(String, RefOr<PathItem>)> = Vec::new();
    for key in order {
        for (path, cell) in &paths {
            if file_of(cell).as_deref() == Some(key.as_str()) {
                moved.push((path.clone(), cell.clone()));
            }
        }
    }

    let mut replacements = moved.into_iter();
    return paths
        .into_iter()
        .map(|(path, cell)| {
            let is_member = file_of(&cell).is_some_and(|key| return members.contains(key.as_str()));
            if is_member {
                return replacements.next().unwrap_or((path, cell));
            }
            return (path, cell);
        })
        .collect();
}

/// Point every route referencing `from` at `to`.
fn retarget(paths: &mut IndexMap<String, RefOr<PathItem>>, from: &str, to: &str) {
    for cell in paths.values_mut() {
        if cell.as_reference().is_some_and(|reference| return normalize_path(reference) == from) {
            *cell = RefOr::reference(to);
        }
    }
}

/// Classify where a route's item is stored.
fn slot_of(cell: &RefOr<PathItem>) -> Result<Slot, Error> {
    let Some(reference) = cell.as_reference() else {
        return Ok(Slot::Inline);
    };
    return match parse_reference(reference)? {
        ReferenceTarget::Anchor { category: Category::PathItems, name } => Ok(Slot::Anchor(name)),
        ReferenceTarget::File { path } if path.starts_with(COMPONENT_PATH_ITEMS_DIR) => {
            Ok(Slot::ComponentFile(path))
        },
        ReferenceTarget::File { path } => Ok(Slot::TreeFile(path)),
        ReferenceTarget::Anchor { .. } | ReferenceTarget::External { .. } => {
            Err(Error::UnresolvedReference { reference: reference.to_string() })
        },
    };
}

/// Store an edited item back where it came from.
fn write_back(document: &mut Document, path: &str, slot: Slot, item: PathItem) {
    match slot {
        Slot::Anchor(name) => {
            document
                .components
                .get_or_insert_with(Default::default)
                .path_items
                .insert(name, RefOr::Value(item));
        },
        Slot::ComponentFile(key) => {
            document.files_mut().components.path_items.insert(key, RefOr::Value(item));
        },
        Slot::Inline => {
            document.paths.insert(path.to_string(), RefOr::Value(item));
        },
        Slot::TreeFile(key) => {
            document.files_mut().paths.item_update(&key, Some(RefOr::Value(item)));
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spec::Operation;

    /// A path item with the given operations.
    fn item_with(methods: &[HttpMethod]) -> PathItem {
        let mut item = PathItem::default();
        for method in methods {
            item.set_operation(*method, Some(Operation::default()));
        }
        return item;
    }

    /// Route names in order.
    fn routes(document: &Document) -> Vec<&str> {
        return document.paths.keys().map(String::as_str).collect();
    }

    #[test]
    fn add_then_delete_last_operation_leaves_no_file() {
        let mut document = Document::new();
        let key = add_path(&mut document, "users/{id}/posts", &["v1"], item_with(&[HttpMethod::Get])).unwrap();
        assert_eq!(key, "paths/v1/users_{id}_posts.yaml");
        assert_eq!(document.paths.get("/users/{id}/posts"), Some(&RefOr::reference("paths/v1/users_{id}_posts.yaml")));

        delete_operation(&mut document, "/users/{id}/posts", HttpMethod::Get).unwrap();
        assert!(document.paths.is_empty());
        assert!(!document.component_files.as_ref().unwrap().paths.contains_key(&key));
    }

    #[test]
    fn add_rejects_duplicates() {
        let mut document = Document::new();
        add_path::<&str>(&mut document, "/a", &[], PathItem::default()).unwrap();
        assert!(matches!(add_path::<&str>(&mut document, "/a", &[], PathItem::default()), Err(Error::DuplicatePath { .. })));

        document.paths.clear();
        assert!(matches!(add_path::<&str>(&mut document, "/a", &[], PathItem::default()), Err(Error::FileExists { .. })));
    }

    #[test]
    fn delete_one_of_two_operations_writes_back() {
        let mut document = Document::new();
        let key = add_path::<&str>(&mut document, "/pets", &[], item_with(&[HttpMethod::Get, HttpMethod::Post])).unwrap();
        document.paths.insert("/inline".to_string(), RefOr::Value(item_with(&[HttpMethod::Get, HttpMethod::Put])));

        delete_operation(&mut document, "/pets", HttpMethod::Get).unwrap();
        delete_operation(&mut document, "/inline", HttpMethod::Put).unwrap();

        let files = document.component_files.as_ref().unwrap();
        let stored = files.paths.item_lookup(&key).unwrap().as_value().unwrap();
        assert!(stored.get.is_none() && stored.post.is_some());
        assert!(document.paths.get("/inline").unwrap().as_value().unwrap().put.is_none());
        assert!(matches!(delete_operation(&mut document, "/nope", HttpMethod::Get), Err(Error::PathNotFound { .. })));
    }

    #[test]
    fn anchored_item_is_updated_in_components() {
        let mut document = Document::new();
        document
            .components
            .get_or_insert_with(Default::default)
            .path_items
            .insert("Shared".to_string(), RefOr::Value(item_with(&[HttpMethod::Get, HttpMethod::Head])));
        document.paths.insert("/shared".to_string(), RefOr::reference("#/components/pathItems/Shared"));

        delete_operation(&mut document, "/shared", HttpMethod::Head).unwrap();
        let shared = document.components.as_ref().unwrap().path_items.get("Shared").unwrap();
        assert!(shared.as_value().unwrap().head.is_none());
        assert!(matches!(move_path_to_group(&mut document, "/shared", &["g"]), Err(Error::InvalidMove { .. })));
    }

    #[test]
    fn move_inline_path_materializes_file() {
        let mut document = Document::new();
        document.paths.insert("/users/{id}".to_string(), RefOr::Value(item_with(&[HttpMethod::Get])));

        let key = move_path_to_group(&mut document, "/users/{id}", &["admin"]).unwrap();
        assert_eq!(key, "paths/admin/users_{id}.yaml");
        assert!(document.paths.get("/users/{id}").unwrap().is_reference());
        let tree = &document.component_files.as_ref().unwrap().paths;
        assert!(tree.get(&["admin"]).unwrap().items.contains_key(&key));
    }

    #[test]
    fn move_file_path_relocates_entry() {
        let mut document = Document::new();
        let old = add_path::<&str>(&mut document, "/pets", &[], item_with(&[HttpMethod::Get])).unwrap();
        document.hashes.record(old.clone(), crate::hasher::hash_bytes(b"pets"));

        let new = move_path_to_group(&mut document, "/pets", &["animals"]).unwrap();
        let tree = &document.component_files.as_ref().unwrap().paths;
        assert!(!tree.contains_key(&old));
        assert!(tree.contains_key(&new));
        assert!(document.hashes.get(&old).is_none());
        assert_eq!(document.paths.get("/pets"), Some(&RefOr::reference(new)));
        assert!(matches!(move_path_to_group::<&str>(&mut document, "/missing", &[]), Err(Error::PathNotFound { .. })));
    }

    #[test]
    fn groups_add_and_delete() {
        let mut document = Document::new();
        add_group::<&str>(&mut document, &[], "v1").unwrap();
        add_group(&mut document, &["v1"], "admin").unwrap();
        add_group(&mut document, &["v1"], "admin").unwrap();
        add_path(&mut document, "/users", &["v1", "admin"], item_with(&[HttpMethod::Get])).unwrap();
        add_path::<&str>(&mut document, "/health", &[], item_with(&[HttpMethod::Get])).unwrap();

        assert!(add_group::<&str>(&mut document, &[], "a/b").is_err());

        let removed = delete_group(&mut document, &["v1"]).unwrap();
        assert_eq!(removed, ["/users"]);
        assert_eq!(routes(&document), ["/health"]);
        assert!(document.component_files.as_ref().unwrap().paths.get(&["v1"]).is_err());
        assert!(matches!(delete_group::<&str>(&mut document, &[]), Err(Error::InvalidGroup { .. })));
    }

    #[test]
    fn reorder_within_group_updates_routes() {
        let mut document = Document::new();
        document.paths.insert("/inline".to_string(), RefOr::Value(PathItem::default()));
        for route in ["/a", "/b", "/c"] {
            add_path::<&str>(&mut document, route, &[], item_with(&[HttpMethod::Get])).unwrap();
        }

        move_path_within_group(&mut document, "/c", 0).unwrap();
        assert_eq!(routes(&document), ["/inline", "/c", "/a", "/b"]);
        let tree = &document.component_files.as_ref().unwrap().paths;
        let keys: Vec<&str> = tree.items.keys().map(String::as_str).collect();
        assert_eq!(keys, ["paths/c.yaml", "paths/a.yaml", "paths/b.yaml"]);

        assert!(matches!(move_path_within_group(&mut document, "/inline", 0), Err(Error::InvalidMove { .. })));
    }

    #[test]
    fn group_components_must_be_plain_names() {
        let mut document = Document::new();
        let groups: [&[&str]; 4] = [&["..", ".."], &["v1", "."], &["a/b"], &[""]];
        for group in groups {
            let result = add_path(&mut document, "/escape", group, item_with(&[HttpMethod::Get]));
            assert!(matches!(result, Err(Error::InvalidGroup { .. })), "{group:?}");
        }
        document.paths.insert("/inline".to_string(), RefOr::Value(item_with(&[HttpMethod::Get])));
        let moved = move_path_to_group(&mut document, "/inline", &["..", "outside"]);
        assert!(matches!(moved, Err(Error::InvalidGroup { .. })));
        assert!(add_group(&mut document, &[".."], "x").is_err());

        assert!(document.paths.get("/inline").unwrap().as_value().is_some());
        assert!(document.component_files.as_ref().is_none_or(|files| return files.paths.is_empty()));
    }

    #[test]
    fn single_file_documents_keep_paths_inline() {
        let mut document = Document::new();
        document.single_file = true;
        document.main_file = "api.yaml".to_string();

        let stored = add_path::<&str>(&mut document, "/users", &[], item_with(&[HttpMethod::Get])).unwrap();
        assert_eq!(stored, "api.yaml");
        assert!(document.paths.get("/users").unwrap().as_value().is_some());

        assert!(matches!(add_path(&mut document, "/orders", &["v1"], PathItem::default()), Err(Error::InvalidGroup { .. })));
        assert!(matches!(move_path_to_group(&mut document, "/users", &["v1"]), Err(Error::InvalidMove { .. })));
        assert!(matches!(add_group::<&str>(&mut document, &[], "v1"), Err(Error::InvalidGroup { .. })));
        assert!(matches!(delete_group(&mut document, &["v1"]), Err(Error::GroupNotFound { .. })));
        assert!(document.component_files.is_none());
    }
}
