//! Capability bits and defaults

pub type Id = u64;

// Capability bits returned by the evaluator
pub const READ: u64 = 1;
pub const WRITE: u64 = 1 << 1;
pub const DELETE: u64 = 1 << 2;
pub const ALL: u64 = READ | WRITE | DELETE;

pub const DEFAULT_ADMIN_ROLE: &str = "admin";
pub const DEFAULT_DEBOUNCE_MS: u64 = 300;
pub const DEFAULT_BIND: &str = "127.0.0.1:3000";
pub const DEFAULT_LOG_FILTER: &str = "portal_access=info,tower_http=info";

const CAPS: &[(&str, u64)] = &[("read", READ), ("write", WRITE), ("delete", DELETE)];

/// Convert a capability mask to a list of capability names
pub fn caps_to_names(mask: u64) -> Vec<&'static str> {
    CAPS.iter()
        .filter(|(_, b)| mask & b == *b)
        .map(|(n, _)| *n)
        .collect()
}

/// Convert a list of capability names to a mask
pub fn names_to_caps(names: &[&str]) -> u64 {
    names
        .iter()
        .filter_map(|n| CAPS.iter().find(|(k, _)| k == n).map(|(_, v)| v))
        .fold(0, |a, b| a | b)
}
