//! HTTP surface for the access core
//!
//! The portal backend (or a gateway in front of it) pushes the latest tree
//! and link catalog; callers then ask for effective permissions and access
//! decisions.

use std::collections::BTreeSet;
use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::catalog::LinkCatalog;
use crate::config::AccessConfig;
use crate::constants::{caps_to_names, Id, READ};
use crate::evaluator::{AccessEvaluator, AdminPolicy, Principal};
use crate::resolver::{collapse, expand, Dimensions};
use crate::scope::ManagerScope;
use crate::store::{CatalogStore, Commit, TreeStore};
use crate::tree::{AccessLevel, Grants, NodeRef};
use crate::wire::parse_id;

// ============================================================================
// State
// ============================================================================

pub struct AppState {
    pub config: AccessConfig,
    pub evaluator: AccessEvaluator,
    pub tree: TreeStore,
    pub catalog: CatalogStore,
}

impl AppState {
    pub fn new(config: AccessConfig) -> Self {
        let evaluator = AccessEvaluator::new(AdminPolicy::from_config(&config));
        AppState { config, evaluator, tree: TreeStore::new(), catalog: CatalogStore::new() }
    }

    fn link_catalog(&self) -> Arc<LinkCatalog> {
        self.catalog.current().unwrap_or_default()
    }
}

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    fn ok(data: T) -> Self {
        Self { success: true, data: Some(data), error: None }
    }

    fn err(msg: impl Into<String>) -> Self {
        Self { success: false, data: None, error: Some(msg.into()) }
    }
}

type Reply<T> = (StatusCode, Json<ApiResponse<T>>);

fn ok<T>(data: T) -> Reply<T> {
    (StatusCode::OK, Json(ApiResponse::ok(data)))
}

fn fail<T>(status: StatusCode, msg: impl Into<String>) -> Reply<T> {
    (status, Json(ApiResponse::err(msg)))
}

#[derive(Debug, Serialize)]
pub struct HealthRes {
    pub status: &'static str,
    pub version: &'static str,
    pub tree_generation: u64,
    pub catalog_generation: u64,
}

#[derive(Debug, Serialize)]
pub struct LoadRes {
    pub applied: bool,
    pub generation: u64,
}

#[derive(Debug, Serialize)]
pub struct EffectiveRes {
    pub effective: Grants,
    pub access_level: AccessLevel,
    pub label: &'static str,
    /// Folder the grants come from, when inherited
    pub inherited_from: Option<String>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    Folder,
    File,
}

#[derive(Debug, Deserialize)]
pub struct CheckReq {
    pub principal: Principal,
    /// Branch-department link ids the employee belongs to
    #[serde(default, with = "crate::wire::ids")]
    pub membership_links: BTreeSet<Id>,
    pub kind: NodeKind,
    #[serde(with = "crate::wire::id")]
    pub id: Id,
}

#[derive(Debug, Serialize)]
pub struct CheckRes {
    pub allowed: bool,
    pub capabilities: u64,
    pub capability_names: Vec<&'static str>,
}

#[derive(Debug, Deserialize)]
pub struct ExpandReq {
    #[serde(default, with = "crate::wire::ids")]
    pub branches: BTreeSet<Id>,
    #[serde(default, with = "crate::wire::ids")]
    pub departments: BTreeSet<Id>,
    #[serde(default)]
    pub scope: Option<ManagerScope>,
}

#[derive(Debug, Serialize)]
pub struct LinksRes {
    #[serde(with = "crate::wire::ids")]
    pub links: BTreeSet<Id>,
}

#[derive(Debug, Deserialize)]
pub struct CollapseReq {
    #[serde(default, with = "crate::wire::ids")]
    pub links: BTreeSet<Id>,
}

// ============================================================================
// Handlers
// ============================================================================

pub async fn get_health(State(state): State<Arc<AppState>>) -> Json<HealthRes> {
    Json(HealthRes {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        tree_generation: state.tree.generation(),
        catalog_generation: state.catalog.generation(),
    })
}

fn load_reply(r: crate::error::Result<Commit>) -> Reply<LoadRes> {
    match r {
        Ok(Commit::Applied(generation)) => ok(LoadRes { applied: true, generation }),
        Ok(Commit::Stale { committed, .. }) => ok(LoadRes { applied: false, generation: committed }),
        Err(e) => fail(StatusCode::BAD_REQUEST, e.to_string()),
    }
}

pub async fn put_tree(State(state): State<Arc<AppState>>, body: String) -> Reply<LoadRes> {
    let ticket = state.tree.begin();
    let reply = load_reply(state.tree.commit_json(ticket, &body));
    if let Some(tree) = state.tree.current() {
        info!(folders = tree.folder_count(), files = tree.file_count(), "tree loaded");
    }
    reply
}

pub async fn put_catalog(State(state): State<Arc<AppState>>, body: String) -> Reply<LoadRes> {
    let ticket = state.catalog.begin();
    load_reply(state.catalog.commit_json(ticket, &body))
}

fn effective_reply(state: &AppState, node: NodeRef) -> Reply<EffectiveRes> {
    let Some(tree) = state.tree.current() else {
        return fail(StatusCode::SERVICE_UNAVAILABLE, "tree not loaded");
    };
    let (Some(effective), Some(source)) = (tree.effective(node), tree.effective_source(node)) else {
        return fail(StatusCode::NOT_FOUND, format!("{:?} not found", node));
    };
    let inherited_from = match source {
        s if s == node => None,
        NodeRef::Folder(id) | NodeRef::File(id) => Some(id.to_string()),
    };
    let access_level = effective.access_level();
    ok(EffectiveRes { effective: effective.clone(), access_level, label: access_level.label(), inherited_from })
}

pub async fn get_folder_effective(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Reply<EffectiveRes> {
    match parse_id(&id) {
        Ok(id) => effective_reply(&state, NodeRef::Folder(id)),
        Err(e) => fail(StatusCode::BAD_REQUEST, e.to_string()),
    }
}

pub async fn get_file_effective(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Reply<EffectiveRes> {
    match parse_id(&id) {
        Ok(id) => effective_reply(&state, NodeRef::File(id)),
        Err(e) => fail(StatusCode::BAD_REQUEST, e.to_string()),
    }
}

pub async fn post_check(State(state): State<Arc<AppState>>, Json(req): Json<CheckReq>) -> Reply<CheckRes> {
    let Some(tree) = state.tree.current() else {
        return fail(StatusCode::SERVICE_UNAVAILABLE, "tree not loaded");
    };
    let links: Vec<Id> = req.membership_links.iter().copied().collect();
    let principal = req.principal.with_links(&state.link_catalog(), &links);
    let node = match req.kind {
        NodeKind::Folder => NodeRef::Folder(req.id),
        NodeKind::File => NodeRef::File(req.id),
    };
    let caps = state.evaluator.capabilities(&principal, &tree, node);
    ok(CheckRes { allowed: caps & READ == READ, capabilities: caps, capability_names: caps_to_names(caps) })
}

pub async fn post_expand(State(state): State<Arc<AppState>>, Json(req): Json<ExpandReq>) -> Reply<LinksRes> {
    let links = expand(&state.link_catalog(), &req.branches, &req.departments, req.scope.as_ref());
    ok(LinksRes { links })
}

pub async fn post_collapse(State(state): State<Arc<AppState>>, Json(req): Json<CollapseReq>) -> Reply<Dimensions> {
    ok(collapse(&state.link_catalog(), &req.links))
}

// ============================================================================
// Router
// ============================================================================

pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(get_health))
        .route("/tree", put(put_tree))
        .route("/catalog", put(put_catalog))
        .route("/folders/:id/effective", get(get_folder_effective))
        .route("/files/:id/effective", get(get_file_effective))
        .route("/check", post(post_check))
        .route("/expand", post(post_expand))
        .route("/collapse", post(post_collapse))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
