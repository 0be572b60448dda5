//! Committed fetch results with a stale-response guard
//!
//! Every fetch takes a ticket before it starts. A result is applied only if
//! its ticket is newer than the one already committed, so a slow response
//! can never overwrite a newer tree. Readers hold an `Arc` to whatever was
//! current when they looked; commits swap the reference.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use tracing::debug;

use crate::catalog::LinkCatalog;
use crate::error::Result;
use crate::tree::PermissionTree;

pub type TreeStore = Snapshot<PermissionTree>;
pub type CatalogStore = Snapshot<LinkCatalog>;

/// Generation issued when a fetch starts
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct FetchTicket(u64);

impl FetchTicket {
    pub fn generation(&self) -> u64 {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Commit {
    Applied(u64),
    Stale { ticket: u64, committed: u64 },
}

impl Commit {
    pub fn is_applied(&self) -> bool {
        matches!(self, Commit::Applied(_))
    }
}

struct Slot<T> {
    generation: u64,
    value: Option<Arc<T>>,
}

pub struct Snapshot<T> {
    issued: AtomicU64,
    slot: RwLock<Slot<T>>,
}

impl<T> Default for Snapshot<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Snapshot<T> {
    pub fn new() -> Self {
        Snapshot {
            issued: AtomicU64::new(0),
            slot: RwLock::new(Slot { generation: 0, value: None }),
        }
    }

    /// Start a fetch
    pub fn begin(&self) -> FetchTicket {
        FetchTicket(self.issued.fetch_add(1, Ordering::SeqCst) + 1)
    }

    /// Generation of the committed value (0 before the first commit)
    pub fn generation(&self) -> u64 {
        self.slot.read().unwrap_or_else(|p| p.into_inner()).generation
    }

    pub fn current(&self) -> Option<Arc<T>> {
        self.slot.read().unwrap_or_else(|p| p.into_inner()).value.clone()
    }

    pub fn is_stale(&self, ticket: FetchTicket) -> bool {
        ticket.0 <= self.generation()
    }

    /// Apply `value` unless a newer fetch already committed
    pub fn commit(&self, ticket: FetchTicket, value: T) -> Commit {
        let mut slot = self.slot.write().unwrap_or_else(|p| p.into_inner());
        if ticket.0 <= slot.generation {
            debug!(ticket = ticket.0, committed = slot.generation, "discarding stale fetch result");
            return Commit::Stale { ticket: ticket.0, committed: slot.generation };
        }
        slot.generation = ticket.0;
        slot.value = Some(Arc::new(value));
        Commit::Applied(ticket.0)
    }

    /// Like `commit`, but skips `build` entirely when the ticket is already stale
    pub fn commit_with<F>(&self, ticket: FetchTicket, build: F) -> Result<Commit>
    where
        F: FnOnce() -> Result<T>,
    {
        if self.is_stale(ticket) {
            let committed = self.generation();
            debug!(ticket = ticket.0, committed, "fetch superseded before build");
            return Ok(Commit::Stale { ticket: ticket.0, committed });
        }
        let value = build()?;
        Ok(self.commit(ticket, value))
    }
}

impl TreeStore {
    /// Build and commit a tree-fetch body
    pub fn commit_json(&self, ticket: FetchTicket, json: &str) -> Result<Commit> {
        self.commit_with(ticket, || PermissionTree::from_json(json))
    }
}

impl CatalogStore {
    /// Build and commit a link-catalog body
    pub fn commit_json(&self, ticket: FetchTicket, json: &str) -> Result<Commit> {
        self.commit_with(ticket, || crate::wire::parse_catalog(json))
    }
}
