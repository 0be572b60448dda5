//! Folder/file hierarchy with inherited permissions
//!
//! Effective permissions are never copied. Each node records the node whose
//! own grants apply to it (itself, or the nearest ancestor that stops
//! inheriting), so a lookup is one index away.

use std::collections::{BTreeSet, HashMap, HashSet};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::constants::Id;
use crate::error::Result;
use crate::wire::{parse_tree, Creator, FolderRecord};

/// Explicit grant lists carried by a folder or file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grants {
    #[serde(rename = "permitted_branches", default, with = "crate::wire::ids")]
    pub branches: BTreeSet<Id>,
    #[serde(rename = "permitted_departments", default, with = "crate::wire::ids")]
    pub departments: BTreeSet<Id>,
    #[serde(rename = "permitted_employees", default, with = "crate::wire::ids")]
    pub employees: BTreeSet<Id>,
}

impl Grants {
    /// No list restricts access
    pub fn is_public(&self) -> bool {
        self.branches.is_empty() && self.departments.is_empty() && self.employees.is_empty()
    }

    pub fn access_level(&self) -> AccessLevel {
        if !self.branches.is_empty() {
            AccessLevel::SpecificBranches
        } else if !self.departments.is_empty() {
            AccessLevel::SpecificDepartments
        } else if !self.employees.is_empty() {
            AccessLevel::SpecificEmployees
        } else {
            AccessLevel::AllEmployees
        }
    }
}

/// Display classification; the first non-empty list decides
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessLevel {
    SpecificBranches,
    SpecificDepartments,
    SpecificEmployees,
    AllEmployees,
}

impl AccessLevel {
    pub fn label(&self) -> &'static str {
        match self {
            AccessLevel::SpecificBranches => "Specific Branches",
            AccessLevel::SpecificDepartments => "Specific Departments",
            AccessLevel::SpecificEmployees => "Specific Employees",
            AccessLevel::AllEmployees => "All Employees",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum NodeRef {
    Folder(Id),
    File(Id),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FolderNode {
    pub id: Id,
    pub name: String,
    pub parent_id: Option<Id>,
    pub inherits_parent_permissions: bool,
    pub own_grants: Grants,
    pub created_by: Option<Creator>,
    pub children: Vec<Id>,
    pub files: Vec<Id>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileNode {
    pub id: Id,
    pub folder_id: Id,
    pub name: String,
    pub inherits_parent_permissions: bool,
    pub own_grants: Grants,
    pub created_by: Option<Creator>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Source {
    Folder(usize),
    File(usize),
}

#[derive(Debug, Clone, Default)]
struct Links {
    parent: Option<usize>,
    children: Vec<usize>,
    files: Vec<usize>,
}

/// Resolved sources for every node
#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct Resolution {
    folders: Vec<usize>,
    files: Vec<Source>,
    cyclic: Vec<bool>,
}

/// Immutable tree built from one fetch response
#[derive(Debug, Clone, Default)]
pub struct PermissionTree {
    folders: Vec<FolderNode>,
    folder_index: HashMap<Id, usize>,
    files: Vec<FileNode>,
    file_index: HashMap<Id, usize>,
    file_folder: Vec<usize>,
    links: Vec<Links>,
    roots: Vec<usize>,
    resolved: Resolution,
}

impl PermissionTree {
    /// Decode a tree-fetch body and build the tree
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(Self::build(parse_tree(json)?))
    }

    /// Build from nested records, flat records with `parent` ids, or a mix.
    /// A nesting position overrides a record's own `parent` field.
    pub fn build(records: Vec<FolderRecord>) -> Self {
        let mut t = PermissionTree::default();
        let mut pending_files = Vec::new();
        let mut stack: Vec<(FolderRecord, Option<Id>)> =
            records.into_iter().rev().map(|r| (r, None)).collect();

        while let Some((mut rec, nested_parent)) = stack.pop() {
            // descendants of a duplicate still hang off the first folder with that id
            let children = std::mem::take(&mut rec.children);
            for child in children.into_iter().rev() {
                stack.push((child, Some(rec.id)));
            }
            for file in std::mem::take(&mut rec.files) {
                pending_files.push((file, rec.id));
            }
            if t.folder_index.contains_key(&rec.id) {
                warn!(folder = rec.id, "duplicate folder id, keeping first");
                continue;
            }
            let own_grants = rec.grants();
            t.folder_index.insert(rec.id, t.folders.len());
            t.folders.push(FolderNode {
                id: rec.id,
                name: rec.name,
                parent_id: nested_parent.or(rec.parent),
                inherits_parent_permissions: rec.inherits_parent_permissions,
                own_grants,
                created_by: rec.created_by,
                children: Vec::new(),
                files: Vec::new(),
            });
        }

        t.links = vec![Links::default(); t.folders.len()];
        for i in 0..t.folders.len() {
            let Some(pid) = t.folders[i].parent_id else {
                t.roots.push(i);
                continue;
            };
            match t.folder_index.get(&pid) {
                Some(&p) => {
                    t.links[i].parent = Some(p);
                    t.links[p].children.push(i);
                    let id = t.folders[i].id;
                    t.folders[p].children.push(id);
                }
                None => {
                    warn!(folder = t.folders[i].id, parent = pid, "parent not loaded, treating as root");
                    t.roots.push(i);
                }
            }
        }

        for (rec, folder_id) in pending_files {
            if t.file_index.contains_key(&rec.id) {
                warn!(file = rec.id, "duplicate file id, keeping first");
                continue;
            }
            let Some(&fi) = t.folder_index.get(&folder_id) else {
                continue;
            };
            let idx = t.files.len();
            let own_grants = rec.grants();
            t.file_index.insert(rec.id, idx);
            t.file_folder.push(fi);
            t.links[fi].files.push(idx);
            t.folders[fi].files.push(rec.id);
            t.files.push(FileNode {
                id: rec.id,
                folder_id,
                name: rec.name,
                inherits_parent_permissions: rec.inherits_parent_permissions,
                own_grants,
                created_by: rec.created_by,
            });
        }

        t.resolved = t.resolve();
        debug!(folders = t.folders.len(), files = t.files.len(), roots = t.roots.len(), "permission tree built");
        t
    }

    /// Recompute effective permissions. The result never changes for the same tree.
    pub fn recompute(&mut self) {
        self.resolved = self.resolve();
    }

    fn resolve(&self) -> Resolution {
        let n = self.folders.len();
        let mut source = vec![usize::MAX; n];
        let mut visited = vec![false; n];
        let mut cyclic = vec![false; n];

        for &r in &self.roots {
            visited[r] = true;
            source[r] = r;
            self.propagate(r, &mut source, &mut visited, &cyclic);
        }

        // Anything left over hangs off a parent cycle
        for start in 0..n {
            if visited[start] {
                continue;
            }
            let members = self.cycle_from(start);
            if members.is_empty() {
                continue;
            }
            warn!(
                folders = ?members.iter().map(|&i| self.folders[i].id).collect::<Vec<_>>(),
                "cycle in folder parents, members fall back to own grants"
            );
            for &m in &members {
                cyclic[m] = true;
                visited[m] = true;
                source[m] = m;
            }
            for &m in &members {
                self.propagate(m, &mut source, &mut visited, &cyclic);
            }
        }

        let files = self
            .files
            .iter()
            .enumerate()
            .map(|(i, f)| {
                if f.inherits_parent_permissions {
                    Source::Folder(source[self.file_folder[i]])
                } else {
                    Source::File(i)
                }
            })
            .collect();

        Resolution { folders: source, files, cyclic }
    }

    fn propagate(&self, start: usize, source: &mut [usize], visited: &mut [bool], cyclic: &[bool]) {
        let mut stack = vec![start];
        while let Some(i) = stack.pop() {
            for &c in &self.links[i].children {
                if visited[c] || cyclic[c] {
                    continue;
                }
                visited[c] = true;
                source[c] = if self.folders[c].inherits_parent_permissions { source[i] } else { c };
                stack.push(c);
            }
        }
    }

    /// Nodes of the cycle reached by walking parents from `start`
    fn cycle_from(&self, start: usize) -> Vec<usize> {
        let mut path = Vec::new();
        let mut on_path = HashSet::new();
        let mut cur = start;
        loop {
            if !on_path.insert(cur) {
                let pos = path.iter().position(|&p| p == cur).unwrap_or(0);
                return path.split_off(pos);
            }
            path.push(cur);
            match self.links[cur].parent {
                Some(p) => cur = p,
                None => return Vec::new(),
            }
        }
    }

    pub fn folder(&self, id: Id) -> Option<&FolderNode> {
        self.folder_index.get(&id).map(|&i| &self.folders[i])
    }

    pub fn file(&self, id: Id) -> Option<&FileNode> {
        self.file_index.get(&id).map(|&i| &self.files[i])
    }

    pub fn folders(&self) -> impl Iterator<Item = &FolderNode> {
        self.folders.iter()
    }

    pub fn files(&self) -> impl Iterator<Item = &FileNode> {
        self.files.iter()
    }

    pub fn roots(&self) -> impl Iterator<Item = &FolderNode> {
        self.roots.iter().map(|&i| &self.folders[i])
    }

    pub fn folder_count(&self) -> usize {
        self.folders.len()
    }

    pub fn file_count(&self) -> usize {
        self.files.len()
    }

    pub fn children(&self, id: Id) -> Vec<&FolderNode> {
        match self.folder_index.get(&id) {
            Some(&i) => self.links[i].children.iter().map(|&c| &self.folders[c]).collect(),
            None => Vec::new(),
        }
    }

    pub fn files_in(&self, id: Id) -> Vec<&FileNode> {
        match self.folder_index.get(&id) {
            Some(&i) => self.links[i].files.iter().map(|&f| &self.files[f]).collect(),
            None => Vec::new(),
        }
    }

    /// Breadcrumb from the topmost ancestor down to `id`.
    /// Stops at the first repeated folder when parents loop.
    pub fn path(&self, id: Id) -> Vec<&FolderNode> {
        let mut out = Vec::new();
        let mut seen = HashSet::new();
        let mut cur = self.folder_index.get(&id).copied();
        while let Some(i) = cur {
            if !seen.insert(i) {
                break;
            }
            out.push(&self.folders[i]);
            cur = self.links[i].parent;
        }
        out.reverse();
        out
    }

    /// Folder caught in a parent cycle in the payload
    pub fn is_cyclic(&self, id: Id) -> bool {
        self.folder_index
            .get(&id)
            .map_or(false, |&i| self.resolved.cyclic[i])
    }

    fn source_of(&self, node: NodeRef) -> Option<Source> {
        match node {
            NodeRef::Folder(id) => self
                .folder_index
                .get(&id)
                .map(|&i| Source::Folder(self.resolved.folders[i])),
            NodeRef::File(id) => self.file_index.get(&id).map(|&i| self.resolved.files[i]),
        }
    }

    /// Effective grants for a node; `None` when the node is not in this tree
    pub fn effective(&self, node: NodeRef) -> Option<&Grants> {
        self.source_of(node).map(|s| match s {
            Source::Folder(i) => &self.folders[i].own_grants,
            Source::File(i) => &self.files[i].own_grants,
        })
    }

    /// The node whose own grants are `node`'s effective grants
    pub fn effective_source(&self, node: NodeRef) -> Option<NodeRef> {
        self.source_of(node).map(|s| match s {
            Source::Folder(i) => NodeRef::Folder(self.folders[i].id),
            Source::File(i) => NodeRef::File(self.files[i].id),
        })
    }

    pub fn access_level(&self, node: NodeRef) -> Option<AccessLevel> {
        self.effective(node).map(Grants::access_level)
    }

    /// Creator of a folder or file
    pub fn created_by(&self, node: NodeRef) -> Option<&Creator> {
        match node {
            NodeRef::Folder(id) => self.folder(id)?.created_by.as_ref(),
            NodeRef::File(id) => self.file(id)?.created_by.as_ref(),
        }
    }

    pub fn contains(&self, node: NodeRef) -> bool {
        match node {
            NodeRef::Folder(id) => self.folder_index.contains_key(&id),
            NodeRef::File(id) => self.file_index.contains_key(&id),
        }
    }

    /// Case-insensitive name search. Each matching folder is followed by its
    /// matching files, in payload order. A blank query matches nothing.
    pub fn search(&self, query: &str) -> Vec<NodeRef> {
        let q = query.trim().to_lowercase();
        if q.is_empty() {
            return Vec::new();
        }
        let mut out = Vec::new();
        for (i, folder) in self.folders.iter().enumerate() {
            if folder.name.to_lowercase().contains(&q) {
                out.push(NodeRef::Folder(folder.id));
            }
            for &f in &self.links[i].files {
                if self.files[f].name.to_lowercase().contains(&q) {
                    out.push(NodeRef::File(self.files[f].id));
                }
            }
        }
        out
    }
}
