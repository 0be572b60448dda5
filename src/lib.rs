//! portal-access - folder access control and branch/department grant selection
//!
//! - `catalog` / `resolver`: branch-department links and the translation
//!   between link ids and the two dimension sets
//! - `selector`: editable branch/department picks synced with a link-id value
//! - `tree`: folder hierarchy with inherited effective permissions
//! - `evaluator`: read/write/delete decisions for a principal
//! - `store` / `debounce`: fetch snapshots with a stale guard, search debouncing

pub mod catalog;
pub mod config;
pub mod constants;
pub mod debounce;
pub mod error;
pub mod evaluator;
pub mod resolver;
pub mod scope;
pub mod selector;
#[cfg(feature = "server")]
pub mod server;
pub mod store;
pub mod tree;
pub mod wire;

pub use catalog::{Branch, BranchDepartment, Department, LinkCatalog};
pub use config::{AccessConfig, ServerConfig};
pub use constants::*;
pub use debounce::{Debouncer, TreeSearch};
pub use error::{AccessError, Result};
pub use evaluator::{AccessEvaluator, AdminPolicy, Membership, Principal};
pub use resolver::{collapse, expand, Dimensions};
pub use scope::{resolve_picks, ManagerScope, Pick};
pub use selector::DualSelector;
pub use store::{CatalogStore, Commit, FetchTicket, Snapshot, TreeStore};
pub use tree::{AccessLevel, FileNode, FolderNode, Grants, NodeRef, PermissionTree};
pub use wire::{parse_catalog, parse_id, parse_tree, CatalogPayload, Creator, FileRecord, FolderRecord, GrantMutation};
