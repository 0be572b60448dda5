//! Branch × department selection kept in sync with a link-id value
//!
//! The parent owns the value (a list of branch-department link ids). The
//! selector owns the two dimension sets the user edits. Each edit emits
//! `expand(branches, departments)`; each incoming value is collapsed back into
//! dimension sets, except when it is the value this selector emitted last.
//! Collapsing our own echo would drop a branch that currently has no selected
//! department, so that case keeps the local picks untouched.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use tracing::{debug, trace};

use crate::catalog::LinkCatalog;
use crate::constants::Id;
use crate::resolver::{collapse, expand};
use crate::scope::{resolve_picks, ManagerScope, Pick};

/// Callback invoked with the link ids after every user edit
pub type Listener = Box<dyn FnMut(&[Id]) + Send>;

pub struct DualSelector {
    catalog: Arc<LinkCatalog>,
    scope: Option<ManagerScope>,
    allow_multiple: bool,
    branches: BTreeSet<Id>,
    departments: BTreeSet<Id>,
    links: BTreeSet<Id>,
    last_emitted: Option<BTreeSet<Id>>,
    last_value: Option<Vec<Id>>,
    listener: Option<Listener>,
}

impl fmt::Debug for DualSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DualSelector")
            .field("allow_multiple", &self.allow_multiple)
            .field("branches", &self.branches)
            .field("departments", &self.departments)
            .field("links", &self.links)
            .field("last_emitted", &self.last_emitted)
            .finish_non_exhaustive()
    }
}

impl DualSelector {
    pub fn new(catalog: Arc<LinkCatalog>, allow_multiple: bool) -> Self {
        DualSelector {
            catalog,
            scope: None,
            allow_multiple,
            branches: BTreeSet::new(),
            departments: BTreeSet::new(),
            links: BTreeSet::new(),
            last_emitted: None,
            last_value: None,
            listener: None,
        }
    }

    /// Restrict selectable links to a manager's scope
    pub fn with_scope(mut self, scope: ManagerScope) -> Self {
        self.scope = Some(scope);
        self
    }

    pub fn on_change<F>(mut self, f: F) -> Self
    where
        F: FnMut(&[Id]) + Send + 'static,
    {
        self.listener = Some(Box::new(f));
        self
    }

    pub fn allow_multiple(&self) -> bool {
        self.allow_multiple
    }

    pub fn selected_branches(&self) -> &BTreeSet<Id> {
        &self.branches
    }

    pub fn selected_departments(&self) -> &BTreeSet<Id> {
        &self.departments
    }

    pub fn selected_links(&self) -> &BTreeSet<Id> {
        &self.links
    }

    pub fn last_emitted(&self) -> Option<&BTreeSet<Id>> {
        self.last_emitted.as_ref()
    }

    /// Accept the parent's value. Call on mount and whenever it changes.
    ///
    /// Returns `true` when local picks were rebuilt from `value`, `false` when
    /// `value` is the echo of our last emission.
    pub fn sync(&mut self, value: &[Id]) -> bool {
        self.last_value = Some(value.to_vec());
        if self.is_echo(value) {
            trace!(?value, "value echoes last emission, keeping local picks");
            return false;
        }
        // the parent moved on; our last emission no longer describes its value
        self.last_emitted = None;
        self.derive_from(value);
        true
    }

    /// Replace the reference data, e.g. when the catalog fetch lands after the
    /// value did.
    ///
    /// A parent value we did not emit is re-derived without emitting. When the
    /// parent holds our own emission, local picks are kept and the links are
    /// emitted again if the new catalog changes them.
    pub fn set_catalog(&mut self, catalog: Arc<LinkCatalog>) {
        self.catalog = catalog;
        match self.last_value.clone() {
            Some(value) if !self.is_echo(&value) => self.derive_from(&value),
            _ => {
                let links = self.expand_current();
                if self.last_emitted.as_ref().map_or(false, |e| *e != links) {
                    debug!(links = links.len(), "catalog changed emitted links");
                    self.emit();
                } else {
                    self.links = links;
                }
            }
        }
    }

    /// Replace the selected branches and emit the resulting links.
    ///
    /// Departments no longer reachable from any selected branch are dropped.
    pub fn set_branches(&mut self, ids: &[Id]) -> Vec<Id> {
        let branches = self.normalize(ids);
        let departments = if branches.is_empty() {
            BTreeSet::new()
        } else {
            let reachable = self
                .catalog
                .departments_reachable_from(&branches, self.scope.as_ref());
            self.departments.intersection(&reachable).copied().collect()
        };
        self.branches = branches;
        self.departments = departments;
        self.emit()
    }

    /// Replace the selected departments and emit the resulting links
    pub fn set_departments(&mut self, ids: &[Id]) -> Vec<Id> {
        self.departments = self.normalize(ids);
        self.emit()
    }

    pub fn toggle_branch(&mut self, id: Id) -> Vec<Id> {
        let next = toggled(&self.branches, id);
        self.set_branches(&next)
    }

    pub fn toggle_department(&mut self, id: Id) -> Vec<Id> {
        let next = toggled(&self.departments, id);
        self.set_departments(&next)
    }

    /// Clear both dimensions; emits an empty value
    pub fn clear(&mut self) -> Vec<Id> {
        self.set_branches(&[])
    }

    /// Branch picks that may include the "all branches" option.
    /// In single-select mode `Pick::All` is ignored.
    pub fn set_branch_picks(&mut self, picks: &[Pick]) -> Vec<Id> {
        let ids = resolve_picks(&self.single_safe(picks), self.available_branches());
        self.set_branches(&ids)
    }

    /// Department picks that may include the "all departments" option.
    /// In single-select mode `Pick::All` is ignored.
    pub fn set_department_picks(&mut self, picks: &[Pick]) -> Vec<Id> {
        let ids = resolve_picks(&self.single_safe(picks), self.available_departments());
        self.set_departments(&ids)
    }

    /// Branch options offered to the user
    pub fn available_branches(&self) -> Vec<Id> {
        self.catalog
            .branches_in_scope(self.scope.as_ref())
            .into_iter()
            .collect()
    }

    /// Department options offered for the currently selected branches
    pub fn available_departments(&self) -> Vec<Id> {
        self.catalog
            .departments_reachable_from(&self.branches, self.scope.as_ref())
            .into_iter()
            .collect()
    }

    fn is_echo(&self, value: &[Id]) -> bool {
        match &self.last_emitted {
            Some(emitted) => {
                let incoming: BTreeSet<Id> = value.iter().copied().collect();
                *emitted == incoming
            }
            None => false,
        }
    }

    fn derive_from(&mut self, value: &[Id]) {
        if self.allow_multiple {
            let dims = collapse(&self.catalog, value);
            self.branches = dims.branches;
            self.departments = dims.departments;
        } else {
            // last resolvable link wins
            let last = value.iter().rev().find_map(|id| self.catalog.link(*id));
            self.branches = last.map(|l| l.branch_id).into_iter().collect();
            self.departments = last.map(|l| l.department_id).into_iter().collect();
        }
        self.links = self.expand_current();
        debug!(
            branches = self.branches.len(),
            departments = self.departments.len(),
            links = self.links.len(),
            "selection rebuilt from value"
        );
    }

    fn normalize(&self, ids: &[Id]) -> BTreeSet<Id> {
        if self.allow_multiple {
            ids.iter().copied().collect()
        } else {
            ids.last().copied().into_iter().collect()
        }
    }

    fn single_safe(&self, picks: &[Pick]) -> Vec<Pick> {
        if self.allow_multiple {
            picks.to_vec()
        } else {
            picks.iter().copied().filter(|p| *p != Pick::All).collect()
        }
    }

    fn expand_current(&self) -> BTreeSet<Id> {
        expand(&self.catalog, &self.branches, &self.departments, self.scope.as_ref())
    }

    fn emit(&mut self) -> Vec<Id> {
        self.links = self.expand_current();
        self.last_emitted = Some(self.links.clone());
        let out: Vec<Id> = self.links.iter().copied().collect();
        if let Some(listener) = self.listener.as_mut() {
            listener(&out);
        }
        out
    }
}

/// Current picks with `id` removed if present, else appended last
fn toggled(current: &BTreeSet<Id>, id: Id) -> Vec<Id> {
    let mut next: Vec<Id> = current.iter().copied().filter(|x| *x != id).collect();
    if !current.contains(&id) {
        next.push(id);
    }
    next
}
