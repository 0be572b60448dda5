//! Manager scope and sentinel picks

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::constants::Id;

/// Branch-department links a manager is allowed to see and assign.
///
/// Read-only once built. Handed to the resolver, the selector and the
/// evaluator by reference.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManagerScope {
    #[serde(with = "crate::wire::ids")]
    links: BTreeSet<Id>,
}

impl ManagerScope {
    pub fn new<I: IntoIterator<Item = Id>>(links: I) -> Self {
        ManagerScope { links: links.into_iter().collect() }
    }

    #[inline]
    pub fn allows(&self, link: Id) -> bool {
        self.links.contains(&link)
    }

    pub fn links(&self) -> &BTreeSet<Id> {
        &self.links
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }
}

/// Scope check that treats "no scope" as unrestricted
#[inline]
pub(crate) fn in_scope(scope: Option<&ManagerScope>, link: Id) -> bool {
    scope.map_or(true, |s| s.allows(link))
}

/// A dropdown pick: either a real id or the "all" pseudo-option
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Pick {
    All,
    Id(Id),
}

/// Resolve picks against the ids currently available.
///
/// `All` expands to the whole universe; real ids outside the universe are
/// dropped. Order of first appearance is kept so callers can still apply a
/// last-wins tie-break.
pub fn resolve_picks<I>(picks: &[Pick], universe: I) -> Vec<Id>
where
    I: IntoIterator<Item = Id>,
{
    let universe: Vec<Id> = universe.into_iter().collect();
    let known: BTreeSet<Id> = universe.iter().copied().collect();
    let mut seen = BTreeSet::new();
    let mut out = Vec::new();
    for pick in picks {
        match *pick {
            Pick::All => {
                for &id in &universe {
                    if seen.insert(id) {
                        out.push(id);
                    }
                }
            }
            Pick::Id(id) => {
                if known.contains(&id) && seen.insert(id) {
                    out.push(id);
                }
            }
        }
    }
    out
}
