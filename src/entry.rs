//! Scan-result tree.
//!
//! Each [`Location`] owns one [`EntryTree`]: an arena of [`FileEntry`] nodes
//! where children are stored as indices and the parent link is a plain
//! [`EntryId`], so the tree never owns itself cyclically. Nodes are always
//! appended after their parent, which makes reverse arena order a valid
//! post-order walk for bottom-up aggregation.

use crate::model::Location;
use humansize::{BINARY, format_size};
use std::fmt::Write as _;
use std::ops::Index;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EntryId(usize);

/// Tri-state checkbox value. `Mixed` only ever appears on nodes with children.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection {
    On,
    Off,
    Mixed,
}

impl Selection {
    pub fn checkbox(self) -> &'static str {
        match self {
            Self::On => "[x]",
            Self::Off => "[ ]",
            Self::Mixed => "[-]",
        }
    }
}

#[derive(Debug, Clone)]
pub struct FileEntry {
    pub name: String,
    pub path: Option<PathBuf>,
    pub detail: Option<String>,
    size: u64,
    selected_size: u64,
    selection: Selection,
    children: Vec<EntryId>,
    parent: Option<EntryId>,
}

impl FileEntry {
    /// A measured file or directory on disk.
    pub fn leaf(name: impl Into<String>, path: PathBuf, size: u64) -> Self {
        Self {
            name: name.into(),
            path: Some(path),
            detail: None,
            size,
            selected_size: 0,
            selection: Selection::Off,
            children: Vec::new(),
            parent: None,
        }
    }

    /// A grouping node whose size comes from its children. `path` is set only
    /// when the group is backed by one real directory.
    pub fn group(name: impl Into<String>, path: Option<PathBuf>) -> Self {
        Self {
            name: name.into(),
            path,
            detail: None,
            size: 0,
            selected_size: 0,
            selection: Selection::Off,
            children: Vec::new(),
            parent: None,
        }
    }

    #[must_use]
    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn selected_size(&self) -> u64 {
        self.selected_size
    }

    pub fn selection(&self) -> Selection {
        self.selection
    }

    #[cfg(test)]
    pub fn children(&self) -> &[EntryId] {
        &self.children
    }

    pub fn parent(&self) -> Option<EntryId> {
        self.parent
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }
}

/// One path the deletion pipeline should remove.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeletionTarget {
    pub location: Location,
    pub name: String,
    pub path: PathBuf,
    pub size: u64,
}

#[derive(Debug, Clone)]
pub struct EntryTree {
    location: Location,
    nodes: Vec<FileEntry>,
    skipped: usize,
}

impl EntryTree {
    pub fn new(location: Location) -> Self {
        Self {
            location,
            nodes: vec![FileEntry::group(location.name(), None)],
            skipped: 0,
        }
    }

    pub fn location(&self) -> Location {
        self.location
    }

    pub fn root(&self) -> EntryId {
        EntryId(0)
    }

    pub fn get(&self, id: EntryId) -> Option<&FileEntry> {
        self.nodes.get(id.0)
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes[0].children.is_empty()
    }

    #[cfg(test)]
    pub fn iter(&self) -> impl Iterator<Item = (EntryId, &FileEntry)> {
        self.nodes.iter().enumerate().map(|(i, e)| (EntryId(i), e))
    }

    pub fn children(&self, id: EntryId) -> &[EntryId] {
        &self[id].children
    }

    pub fn total_size(&self) -> u64 {
        self[self.root()].size
    }

    pub fn selected_size(&self) -> u64 {
        self[self.root()].selected_size
    }

    pub fn leaf_count(&self) -> usize {
        self.nodes.iter().skip(1).filter(|e| e.is_leaf()).count()
    }

    /// Subpaths that could not be read while sizing this tree.
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    pub fn add_skipped(&mut self, count: usize) {
        self.skipped += count;
    }

    /// Appends `entry` as the last child of `parent`. Sizes and selection of
    /// the ancestors are stale until [`Self::recalculate_selection`] runs.
    pub fn add_child(&mut self, parent: EntryId, mut entry: FileEntry) -> EntryId {
        let id = EntryId(self.nodes.len());
        entry.parent = Some(parent);
        entry.children.clear();
        self.nodes.push(entry);
        self.nodes[parent.0].children.push(id);
        id
    }

    /// Drops every descendant of `id` and compacts the arena. Ids of nodes
    /// outside the removed subtree are remapped, so callers must not hold on
    /// to ids across this call. Emptying the root also clears the skipped
    /// count.
    pub fn remove_all(&mut self, id: EntryId) {
        if id == self.root() {
            self.skipped = 0;
        }
        if self[id].children.is_empty() {
            return;
        }
        let mut removed = vec![false; self.nodes.len()];
        let mut stack: Vec<EntryId> = self.nodes[id.0].children.drain(..).collect();
        while let Some(child) = stack.pop() {
            removed[child.0] = true;
            stack.extend(self.nodes[child.0].children.iter().copied());
        }

        let mut remap = vec![None; self.nodes.len()];
        let mut next = 0;
        for (old, gone) in removed.iter().enumerate() {
            if !gone {
                remap[old] = Some(EntryId(next));
                next += 1;
            }
        }

        let nodes = std::mem::take(&mut self.nodes);
        self.nodes = nodes
            .into_iter()
            .zip(removed)
            .filter(|(_, gone)| !gone)
            .map(|(mut entry, _)| {
                entry.parent = entry.parent.and_then(|p| remap[p.0]);
                entry.children = entry.children.iter().filter_map(|c| remap[c.0]).collect();
                entry
            })
            .collect();
        if let Some(emptied) = remap[id.0] {
            let entry = &mut self.nodes[emptied.0];
            entry.size = 0;
            entry.selected_size = 0;
        }
        self.recalculate_selection();
    }

    pub fn select_with_children(&mut self, id: EntryId) {
        self.set_with_children(id, Selection::On);
        self.recalculate_ancestors(id);
    }

    pub fn deselect_with_children(&mut self, id: EntryId) {
        self.set_with_children(id, Selection::Off);
        self.recalculate_ancestors(id);
    }

    /// Fully selected nodes become deselected; anything else becomes fully
    /// selected.
    pub fn toggle(&mut self, id: EntryId) {
        match self[id].selection {
            Selection::On => self.deselect_with_children(id),
            Selection::Off | Selection::Mixed => self.select_with_children(id),
        }
    }

    /// Refreshes size, selected size and tri-state for every node, bottom-up.
    pub fn recalculate_selection(&mut self) {
        for index in (0..self.nodes.len()).rev() {
            self.recalculate_node(EntryId(index));
        }
    }

    /// Collects what a deletion of the current selection has to remove. A
    /// fully selected node backed by a path is removed in one operation; a
    /// mixed node is never removed whole, only its selected descendants are.
    pub fn deletion_targets(&self) -> Vec<DeletionTarget> {
        let mut targets = Vec::new();
        let mut stack = vec![self.root()];
        while let Some(id) = stack.pop() {
            let entry = &self[id];
            match (entry.selection, entry.path.as_ref()) {
                (Selection::Off, _) => {}
                (Selection::On, Some(path)) if id != self.root() => {
                    targets.push(DeletionTarget {
                        location: self.location,
                        name: entry.name.clone(),
                        path: path.clone(),
                        size: entry.size,
                    });
                }
                _ => stack.extend(entry.children.iter().rev().copied()),
            }
        }
        targets
    }

    pub fn debug_representation(&self) -> String {
        let mut out = String::new();
        let mut stack = vec![(self.root(), 0usize)];
        while let Some((id, depth)) = stack.pop() {
            let entry = &self[id];
            let _ = write!(
                out,
                "{:indent$}{} {} ({}",
                "",
                entry.selection.checkbox(),
                entry.name,
                format_size(entry.size, BINARY),
                indent = depth * 2
            );
            if entry.selection == Selection::Mixed {
                let _ = write!(out, ", {} selected", format_size(entry.selected_size, BINARY));
            }
            out.push(')');
            if let Some(path) = &entry.path {
                let _ = write!(out, " {}", path.display());
            }
            out.push('\n');
            for child in entry.children.iter().rev() {
                stack.push((*child, depth + 1));
            }
        }
        out
    }

    fn set_with_children(&mut self, id: EntryId, selection: Selection) {
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            let entry = &mut self.nodes[current.0];
            entry.selection = selection;
            stack.extend(entry.children.iter().copied());
        }
        // Descendant sizes must be settled before the ancestors are walked.
        let mut subtree = vec![id];
        let mut i = 0;
        while i < subtree.len() {
            subtree.extend(self.nodes[subtree[i].0].children.iter().copied());
            i += 1;
        }
        for current in subtree.into_iter().rev() {
            self.recalculate_node(current);
        }
    }

    fn recalculate_ancestors(&mut self, id: EntryId) {
        let mut current = self[id].parent;
        while let Some(parent) = current {
            self.recalculate_node(parent);
            current = self[parent].parent;
        }
    }

    fn recalculate_node(&mut self, id: EntryId) {
        let entry = &self.nodes[id.0];
        if entry.children.is_empty() {
            let selected_size = if entry.selection == Selection::On {
                entry.size
            } else {
                0
            };
            self.nodes[id.0].selected_size = selected_size;
            if self.nodes[id.0].selection == Selection::Mixed {
                self.nodes[id.0].selection = Selection::Off;
            }
            return;
        }

        let mut size = 0;
        let mut selected_size = 0;
        let mut all_on = true;
        let mut all_off = true;
        for child in &entry.children {
            let child = &self.nodes[child.0];
            size += child.size;
            selected_size += child.selected_size;
            all_on &= child.selection == Selection::On;
            all_off &= child.selection == Selection::Off;
        }
        let selection = if all_on {
            Selection::On
        } else if all_off {
            Selection::Off
        } else {
            Selection::Mixed
        };

        let entry = &mut self.nodes[id.0];
        entry.size = size;
        entry.selected_size = selected_size;
        entry.selection = selection;
    }
}

impl Index<EntryId> for EntryTree {
    type Output = FileEntry;

    fn index(&self, id: EntryId) -> &Self::Output {
        &self.nodes[id.0]
    }
}
