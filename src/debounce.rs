//! Debounced search input
//!
//! Clock-injected so callers on any event loop can drive it: push input as
//! it arrives, poll on their timer tick.

use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::config::AccessConfig;
use crate::tree::{NodeRef, PermissionTree};

/// Holds the latest input until it has been quiet for `window`
#[derive(Debug, Clone)]
pub struct Debouncer<T> {
    window: Duration,
    pending: Option<(T, Instant)>,
}

impl<T> Debouncer<T> {
    pub fn new(window: Duration) -> Self {
        Debouncer { window, pending: None }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Replace any pending value and restart the window
    pub fn push(&mut self, value: T, now: Instant) {
        self.pending = Some((value, now));
    }

    /// Take the pending value once its window has elapsed
    pub fn poll(&mut self, now: Instant) -> Option<T> {
        match &self.pending {
            Some((_, at)) if now.saturating_duration_since(*at) >= self.window => {
                self.pending.take().map(|(v, _)| v)
            }
            _ => None,
        }
    }

    /// When the pending value becomes due
    pub fn deadline(&self) -> Option<Instant> {
        self.pending.as_ref().map(|(_, at)| *at + self.window)
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn cancel(&mut self) -> Option<T> {
        self.pending.take().map(|(v, _)| v)
    }
}

/// Search box over a permission tree; results are recomputed only when the
/// debounce fires.
#[derive(Debug, Clone)]
pub struct TreeSearch {
    tree: Arc<PermissionTree>,
    input: Debouncer<String>,
    query: String,
    results: Vec<NodeRef>,
}

impl TreeSearch {
    pub fn new(tree: Arc<PermissionTree>, window: Duration) -> Self {
        TreeSearch {
            tree,
            input: Debouncer::new(window),
            query: String::new(),
            results: Vec::new(),
        }
    }

    pub fn from_config(tree: Arc<PermissionTree>, config: &AccessConfig) -> Self {
        Self::new(tree, config.debounce())
    }

    pub fn input(&mut self, query: impl Into<String>, now: Instant) {
        self.input.push(query.into(), now);
    }

    /// Returns fresh results when a pending query became due
    pub fn poll(&mut self, now: Instant) -> Option<&[NodeRef]> {
        let query = self.input.poll(now)?;
        self.results = self.tree.search(&query);
        self.query = query;
        Some(&self.results)
    }

    /// Swap in a newly fetched tree and rerun the applied query against it
    pub fn set_tree(&mut self, tree: Arc<PermissionTree>) {
        self.tree = tree;
        self.results = self.tree.search(&self.query);
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn results(&self) -> &[NodeRef] {
        &self.results
    }
}
