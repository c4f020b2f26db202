//! Path group tree: the on-disk directory layout of file-backed path items.
//!
//! Each node holds the path item files of one directory under `paths/` plus
//! its subdirectories. Item keys are full normalized file paths relative to
//! the document root (`paths/v1/users.yaml`); the directory part of a key,
//! after stripping the known prefixes, names the group that owns it.
//!
//! Document paths can be reordered, grouped, or deleted independently of the
//! directory layout, so this tree is the single record of which file backs
//! which path.

use std::collections::{HashMap, HashSet};

use indexmap::IndexMap;

use crate::error::Error;
use crate::reference::{RefOr, normalize_path};
use crate::spec::PathItem;

/// Prefixes stripped, in this order, before routing a key to its group.
const ROUTING_PREFIXES: [&str; 3] = ["components/", "pathItems/", "paths/"];

/// Rank given to entries no document path refers to; sorts them last.
const UNRANKED: usize = usize::MAX;

/// One directory of the path tree.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PathGroup {
    /// Subdirectories by name.
    pub groups: IndexMap<String, PathGroup>,
    /// Path item files directly in this directory, keyed by full file path.
    pub items: IndexMap<String, RefOr<PathItem>>,
}

/// A path item file found while walking the tree.
#[derive(Debug, Clone)]
pub struct WalkedItem<'a> {
    /// The stored cell.
    pub cell: &'a RefOr<PathItem>,
    /// Group components from the root to the owning group.
    pub group: Vec<String>,
    /// Full normalized file path.
    pub key: &'a str,
}

impl PathGroup {
    /// Whether `reference` names a stored item.
    pub fn contains_key(&self, reference: &str) -> bool {
        return self.item_lookup(reference).is_some();
    }

    /// A pruned copy keeping only items whose document path is in `visible`.
    /// Groups that end up empty are kept; callers decide whether to hide them.
    pub fn filtered_by(
        &self,
        visible: &HashSet<String>,
        document_paths: &IndexMap<String, RefOr<PathItem>>,
    ) -> Self {
        let mut owners: HashMap<String, Vec<&str>> = HashMap::new();
        for (path, cell) in document_paths {
            if let Some(reference) = cell.as_reference() {
                owners.entry(normalize_path(reference)).or_default().push(path);
            }
        }
        return self.filtered_with(visible, &owners);
    }

    /// Walk one group per component.
    ///
    /// # Errors
    ///
    /// Returns `Error::GroupNotFound` if an intermediate group is missing.
    pub fn get<S: AsRef<str>>(&self, components: &[S]) -> Result<&Self, Error> {
        let mut node = self;
        for (depth, component) in components.iter().enumerate() {
            node = node.groups.get(component.as_ref()).ok_or_else(|| {
                return missing_group(components, depth);
            })?;
        }
        return Ok(node);
    }

    /// Mutable variant of `get`.
    ///
    /// # Errors
    ///
    /// Returns `Error::GroupNotFound` if an intermediate group is missing.
    pub fn get_mut<S: AsRef<str>>(&mut self, components: &[S]) -> Result<&mut Self, Error> {
        let mut node = self;
        for (depth, component) in components.iter().enumerate() {
            node = node.groups.get_mut(component.as_ref()).ok_or_else(|| {
                return missing_group(components, depth);
            })?;
        }
        return Ok(node);
    }

    /// Whether this node has no items and no subgroups.
    pub fn is_empty(&self) -> bool {
        return self.items.is_empty() && self.groups.is_empty();
    }

    /// Number of items in this group and every subgroup.
    pub fn item_count(&self) -> usize {
        return self
            .groups
            .values()
            .map(Self::item_count)
            .fold(self.items.len(), usize::saturating_add);
    }

    /// Find the item a reference points at.
    pub fn item_lookup(&self, reference: &str) -> Option<&RefOr<PathItem>> {
        let (key, groups) = route(reference);
        return self.get(&groups).ok()?.items.get(&key);
    }

    /// Insert, replace, or (with `None`) remove the item a reference points at.
    /// Inserting creates missing groups; removing from a missing group is a
    /// no-op. Replacing keeps the item's position. Returns the previous cell.
    pub fn item_update(
        &mut self,
        reference: &str,
        cell: Option<RefOr<PathItem>>,
    ) -> Option<RefOr<PathItem>> {
        let (key, groups) = route(reference);
        let Some(cell) = cell else {
            return self.get_mut(&groups).ok()?.items.shift_remove(&key);
        };
        return self.ensure_group(&groups).items.insert(key, cell);
    }

    /// Move one subgroup to `target`, clamped to the last position.
    /// No-op if the group is absent.
    pub fn move_group(&mut self, name: &str, target: usize) {
        let Some(from) = self.groups.get_index_of(name) else {
            return;
        };
        let last = self.groups.len().saturating_sub(1);
        self.groups.move_index(from, target.min(last));
    }

    /// Move one item of this group to `target`, clamped to the last position.
    /// No-op if the item is absent.
    pub fn move_item(&mut self, key: &str, target: usize) {
        let Some(from) = self.items.get_index_of(key) else {
            return;
        };
        let last = self.items.len().saturating_sub(1);
        self.items.move_index(from, target.min(last));
    }

    /// Insert (`Some`) or remove (`None`) the group at `components`.
    /// Inserting creates missing intermediate groups and replaces an existing
    /// group in place; removing under a missing parent is a no-op.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidGroup` for an empty component list.
    pub fn set_group<S: AsRef<str>>(
        &mut self,
        components: &[S],
        node: Option<Self>,
    ) -> Result<(), Error> {
        let Some((name, parents)) = components.split_last() else {
            return Err(Error::InvalidGroup { reason: "the root group cannot be replaced".to_string() });
        };
        let name = name.as_ref();
        match node {
            None => {
                if let Ok(parent) = self.get_mut(parents) {
                    parent.groups.shift_remove(name);
                }
            },
            Some(node) => {
                self.ensure_group(parents).groups.insert(name.to_string(), node);
            },
        }
        return Ok(());
    }

    /// Re-derive item and group order from the order of `document_paths`.
    ///
    /// Items sort by the position of the first document path referencing
    /// them; groups by the earliest position of any item below them. The sort
    /// is stable and unreferenced entries go last.
    pub fn sort_by_path_order(&mut self, document_paths: &IndexMap<String, RefOr<PathItem>>) {
        let mut positions: HashMap<String, usize> = HashMap::new();
        for (index, cell) in document_paths.values().enumerate() {
            if let Some(reference) = cell.as_reference() {
                positions.entry(normalize_path(reference)).or_insert(index);
            }
        }
        self.sort_with(&positions);
    }

    /// Every item, depth-first: a group's own items before its subgroups.
    pub fn walk_items(&self) -> Vec<WalkedItem<'_>> {
        let mut walked = Vec::new();
        self.collect_items(&mut Vec::new(), &mut walked);
        return walked;
    }

    /// Recursive worker for `walk_items`.
    fn collect_items<'a>(&'a self, prefix: &mut Vec<String>, out: &mut Vec<WalkedItem<'a>>) {
        for (key, cell) in &self.items {
            out.push(WalkedItem { cell, group: prefix.clone(), key });
        }
        for (name, group) in &self.groups {
            prefix.push(name.clone());
            group.collect_items(prefix, out);
            prefix.pop();
        }
    }

    /// Walk to `components`, creating missing groups.
    fn ensure_group<S: AsRef<str>>(&mut self, components: &[S]) -> &mut Self {
        let mut node = self;
        for component in components {
            node = node.groups.entry(component.as_ref().to_string()).or_default();
        }
        return node;
    }

    /// Recursive worker for `filtered_by`.
    fn filtered_with(&self, visible: &HashSet<String>, owners: &HashMap<String, Vec<&str>>) -> Self {
        let items = self
            .items
            .iter()
            .filter(|(key, _)| {
                return owners
                    .get(key.as_str())
                    .is_some_and(|paths| return paths.iter().any(|path| return visible.contains(*path)));
            })
            .map(|(key, cell)| return (key.clone(), cell.clone()))
            .collect();
        let groups = self
            .groups
            .iter()
            .map(|(name, group)| return (name.clone(), group.filtered_with(visible, owners)))
            .collect();
        return Self { groups, items };
    }

    /// Recursive worker for `sort_by_path_order`. Returns the best rank in the subtree.
    fn sort_with(&mut self, positions: &HashMap<String, usize>) -> usize {
        let rank_of = |key: &str| return positions.get(key).copied().unwrap_or(UNRANKED);

        self.items.sort_by(|a, _, b, _| return rank_of(a.as_str()).cmp(&rank_of(b.as_str())));
        let mut best = self.items.keys().map(|key| return rank_of(key.as_str())).min().unwrap_or(UNRANKED);

        let mut group_ranks: HashMap<String, usize> = HashMap::new();
        for (name, group) in &mut self.groups {
            let rank = group.sort_with(positions);
            best = best.min(rank);
            group_ranks.insert(name.clone(), rank);
        }
        let group_rank = |name: &str| return group_ranks.get(name).copied().unwrap_or(UNRANKED);
        self.groups.sort_by(|a, _, b, _| return group_rank(a.as_str()).cmp(&group_rank(b.as_str())));

        return best;
    }
}

/// Build the `GroupNotFound` error for a walk that failed at `depth`.
fn missing_group<S: AsRef<str>>(components: &[S], depth: usize) -> Error {
    let walked = components
        .iter()
        .take(depth.saturating_add(1))
        .map(|component| return component.as_ref().to_string())
        .collect();
    return Error::GroupNotFound { components: walked };
}

/// Split a reference into its item key and the group components that own it.
fn route(reference: &str) -> (String, Vec<String>) {
    let key = normalize_path(reference);
    let mut rest = key.as_str();
    for prefix in ROUTING_PREFIXES {
        if let Some(stripped) = rest.strip_prefix(prefix) {
            rest = stripped;
        }
    }
    let mut groups: Vec<String> = rest.split('/').map(str::to_string).collect();
    groups.pop();
    return (key, groups);
}
