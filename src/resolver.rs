//! Translation between dimension id-sets and branch-department link ids
//!
//! `collapse` is not the inverse of `expand`: collapsing a link set and
//! expanding it again can produce extra links that exist between the
//! collapsed branches and departments but were never chosen. Link ids stay the
//! stored truth; the two dimension sets are only a view over them.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::catalog::LinkCatalog;
use crate::constants::Id;
use crate::scope::{in_scope, ManagerScope};

/// Branch and department ids referenced by a set of links
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimensions {
    #[serde(with = "crate::wire::ids")]
    pub branches: BTreeSet<Id>,
    #[serde(with = "crate::wire::ids")]
    pub departments: BTreeSet<Id>,
}

/// Every link joining a branch in `branches` with a department in
/// `departments`, restricted to `scope` when one is given.
pub fn expand(
    catalog: &LinkCatalog,
    branches: &BTreeSet<Id>,
    departments: &BTreeSet<Id>,
    scope: Option<&ManagerScope>,
) -> BTreeSet<Id> {
    if branches.is_empty() || departments.is_empty() {
        return BTreeSet::new();
    }
    branches
        .iter()
        .flat_map(|b| catalog.links_for_branch(*b))
        .filter(|l| departments.contains(&l.department_id) && in_scope(scope, l.id))
        .map(|l| l.id)
        .collect()
}

/// Union of the branches and departments the given links point at.
/// Ids missing from the catalog are skipped.
pub fn collapse<'a, I>(catalog: &LinkCatalog, links: I) -> Dimensions
where
    I: IntoIterator<Item = &'a Id>,
{
    let mut dims = Dimensions::default();
    for link in links.into_iter().filter_map(|id| catalog.link(*id)) {
        dims.branches.insert(link.branch_id);
        dims.departments.insert(link.department_id);
    }
    dims
}
