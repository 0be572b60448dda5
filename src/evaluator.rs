//! Access decisions for a principal on a tree node

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::catalog::LinkCatalog;
use crate::config::AccessConfig;
use crate::constants::{Id, ALL, DEFAULT_ADMIN_ROLE, DELETE, READ, WRITE};
use crate::scope::{in_scope, ManagerScope};
use crate::tree::{Grants, NodeRef, PermissionTree};
use crate::wire::Creator;

/// One branch-department pair an employee belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Membership {
    #[serde(rename = "branch", alias = "branch_id", with = "crate::wire::id")]
    pub branch_id: Id,
    #[serde(rename = "department", alias = "department_id", with = "crate::wire::id")]
    pub department_id: Id,
}

/// The caller being checked
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    #[serde(with = "crate::wire::id")]
    pub employee_id: Id,
    #[serde(default)]
    pub roles: Vec<String>,
    #[serde(default)]
    pub memberships: Vec<Membership>,
}

impl Principal {
    pub fn new(employee_id: Id) -> Self {
        Principal { employee_id, ..Default::default() }
    }

    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.roles.push(role.into());
        self
    }

    pub fn with_membership(mut self, branch_id: Id, department_id: Id) -> Self {
        self.memberships.push(Membership { branch_id, department_id });
        self
    }

    /// Add memberships from branch-department link ids. Links missing from
    /// the catalog are skipped.
    pub fn with_links(mut self, catalog: &LinkCatalog, links: &[Id]) -> Self {
        self.memberships.extend(links.iter().filter_map(|id| catalog.link(*id)).map(|l| Membership {
            branch_id: l.branch_id,
            department_id: l.department_id,
        }));
        self
    }
}

/// Role names that mark an administrator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminPolicy {
    roles: BTreeSet<String>,
}

impl Default for AdminPolicy {
    fn default() -> Self {
        AdminPolicy::new([DEFAULT_ADMIN_ROLE])
    }
}

impl AdminPolicy {
    pub fn new<I, S>(roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        AdminPolicy { roles: roles.into_iter().map(Into::into).collect() }
    }

    pub fn from_config(config: &AccessConfig) -> Self {
        AdminPolicy::new(config.admin_roles.iter().cloned())
    }

    #[inline]
    pub fn is_admin_role(&self, role: &str) -> bool {
        self.roles.contains(role)
    }

    pub fn is_admin(&self, principal: &Principal) -> bool {
        principal.roles.iter().any(|r| self.is_admin_role(r))
    }

    pub fn is_admin_creator(&self, creator: &Creator) -> bool {
        creator.role.as_deref().map_or(false, |r| self.is_admin_role(r))
    }
}

#[derive(Debug, Clone, Default)]
pub struct AccessEvaluator {
    policy: AdminPolicy,
}

impl AccessEvaluator {
    pub fn new(policy: AdminPolicy) -> Self {
        AccessEvaluator { policy }
    }

    pub fn policy(&self) -> &AdminPolicy {
        &self.policy
    }

    pub fn is_admin(&self, principal: &Principal) -> bool {
        self.policy.is_admin(principal)
    }

    /// Read eligibility against a set of effective grants
    pub fn can_access(&self, principal: &Principal, grants: &Grants) -> bool {
        if self.is_admin(principal) || grants.is_public() {
            return true;
        }
        grants.employees.contains(&principal.employee_id)
            || principal.memberships.iter().any(|m| {
                grants.branches.contains(&m.branch_id) || grants.departments.contains(&m.department_id)
            })
    }

    /// Capability mask (`READ | WRITE | DELETE`) on a node. Nodes missing from
    /// the tree yield 0.
    ///
    /// Non-administrators never get WRITE or DELETE on a node an
    /// administrator created, whatever the grants say.
    pub fn capabilities(&self, principal: &Principal, tree: &PermissionTree, node: NodeRef) -> u64 {
        let Some(grants) = tree.effective(node) else {
            return 0;
        };
        let caps = if self.is_admin(principal) {
            ALL
        } else if !self.can_access(principal, grants) {
            0
        } else if tree.created_by(node).map_or(false, |c| self.policy.is_admin_creator(c)) {
            READ
        } else {
            ALL
        };
        trace!(employee = principal.employee_id, ?node, caps, "capabilities resolved");
        caps
    }

    pub fn can_read(&self, principal: &Principal, tree: &PermissionTree, node: NodeRef) -> bool {
        self.capabilities(principal, tree, node) & READ == READ
    }

    pub fn can_modify(&self, principal: &Principal, tree: &PermissionTree, node: NodeRef) -> bool {
        self.capabilities(principal, tree, node) & WRITE == WRITE
    }

    pub fn can_delete(&self, principal: &Principal, tree: &PermissionTree, node: NodeRef) -> bool {
        self.capabilities(principal, tree, node) & DELETE == DELETE
    }

    /// Folder ids the principal may read, in tree order
    pub fn readable_folders(&self, principal: &Principal, tree: &PermissionTree) -> Vec<Id> {
        tree.folders()
            .filter(|f| self.can_read(principal, tree, NodeRef::Folder(f.id)))
            .map(|f| f.id)
            .collect()
    }

    /// Whether the principal may put these links into a grant. Administrators
    /// and callers without a scope are unrestricted.
    pub fn can_assign_links(&self, principal: &Principal, scope: Option<&ManagerScope>, links: &[Id]) -> bool {
        self.is_admin(principal) || links.iter().all(|l| in_scope(scope, *l))
    }
}
