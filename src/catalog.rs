//! Branch, department and branch-department reference data

use std::collections::{BTreeMap, BTreeSet, HashMap};

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::constants::Id;
use crate::scope::{in_scope, ManagerScope};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Branch {
    #[serde(with = "crate::wire::id")]
    pub id: Id,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Department {
    #[serde(with = "crate::wire::id")]
    pub id: Id,
    pub name: String,
}

/// Join record between a branch and a department. Grants reference these ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BranchDepartment {
    #[serde(with = "crate::wire::id")]
    pub id: Id,
    #[serde(rename = "branch", alias = "branch_id", with = "crate::wire::id")]
    pub branch_id: Id,
    #[serde(rename = "department", alias = "department_id", with = "crate::wire::id")]
    pub department_id: Id,
}

/// Indexed, read-only view over the link catalog.
///
/// Holds at most one link per (branch, department) pair.
#[derive(Debug, Clone, Default)]
pub struct LinkCatalog {
    branches: BTreeMap<Id, Branch>,
    departments: BTreeMap<Id, Department>,
    links: BTreeMap<Id, BranchDepartment>,
    by_pair: HashMap<(Id, Id), Id>,
    by_branch: BTreeMap<Id, BTreeSet<Id>>,
    by_department: BTreeMap<Id, BTreeSet<Id>>,
}

impl LinkCatalog {
    pub fn new(
        branches: Vec<Branch>,
        departments: Vec<Department>,
        links: Vec<BranchDepartment>,
    ) -> Self {
        let mut c = LinkCatalog {
            branches: branches.into_iter().map(|b| (b.id, b)).collect(),
            departments: departments.into_iter().map(|d| (d.id, d)).collect(),
            ..Default::default()
        };
        for link in links {
            c.insert_link(link);
        }
        c
    }

    /// Catalog with links only, for when branch/department names are not loaded
    pub fn from_links(links: Vec<BranchDepartment>) -> Self {
        Self::new(Vec::new(), Vec::new(), links)
    }

    fn insert_link(&mut self, link: BranchDepartment) {
        let pair = (link.branch_id, link.department_id);
        if let Some(existing) = self.by_pair.get(&pair) {
            warn!(
                link = link.id,
                existing = *existing,
                branch = link.branch_id,
                department = link.department_id,
                "duplicate branch-department pair, keeping first"
            );
            return;
        }
        if self.links.contains_key(&link.id) {
            warn!(link = link.id, "duplicate link id, keeping first");
            return;
        }
        self.by_pair.insert(pair, link.id);
        self.by_branch.entry(link.branch_id).or_default().insert(link.id);
        self.by_department.entry(link.department_id).or_default().insert(link.id);
        self.links.insert(link.id, link);
    }

    #[inline]
    pub fn link(&self, id: Id) -> Option<&BranchDepartment> {
        self.links.get(&id)
    }

    #[inline]
    pub fn link_for(&self, branch: Id, department: Id) -> Option<Id> {
        self.by_pair.get(&(branch, department)).copied()
    }

    pub fn branch(&self, id: Id) -> Option<&Branch> {
        self.branches.get(&id)
    }

    pub fn department(&self, id: Id) -> Option<&Department> {
        self.departments.get(&id)
    }

    pub fn branches(&self) -> impl Iterator<Item = &Branch> {
        self.branches.values()
    }

    pub fn departments(&self) -> impl Iterator<Item = &Department> {
        self.departments.values()
    }

    pub fn links(&self) -> impl Iterator<Item = &BranchDepartment> {
        self.links.values()
    }

    pub fn link_count(&self) -> usize {
        self.links.len()
    }

    /// Links whose branch is `branch`
    pub fn links_for_branch(&self, branch: Id) -> impl Iterator<Item = &BranchDepartment> {
        self.by_branch
            .get(&branch)
            .into_iter()
            .flatten()
            .filter_map(|id| self.links.get(id))
    }

    /// Links whose department is `department`
    pub fn links_for_department(&self, department: Id) -> impl Iterator<Item = &BranchDepartment> {
        self.by_department
            .get(&department)
            .into_iter()
            .flatten()
            .filter_map(|id| self.links.get(id))
    }

    /// Departments that have a link to at least one of `branches`
    pub fn departments_reachable_from<'a, I>(
        &self,
        branches: I,
        scope: Option<&ManagerScope>,
    ) -> BTreeSet<Id>
    where
        I: IntoIterator<Item = &'a Id>,
    {
        branches
            .into_iter()
            .flat_map(|b| self.links_for_branch(*b))
            .filter(|l| in_scope(scope, l.id))
            .map(|l| l.department_id)
            .collect()
    }

    /// Branches selectable under `scope`. Without a scope, every known branch.
    pub fn branches_in_scope(&self, scope: Option<&ManagerScope>) -> BTreeSet<Id> {
        match scope {
            None => self.branches.keys().chain(self.by_branch.keys()).copied().collect(),
            Some(s) => s
                .links()
                .iter()
                .filter_map(|id| self.links.get(id))
                .map(|l| l.branch_id)
                .collect(),
        }
    }
}
