//! HTTP handler tests
//!
//! Run with: cargo test --features server

#![cfg(feature = "server")]

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use portal_access::server::*;
use portal_access::*;
use serde_json::json;

const TREE: &str = r#"[{
    "id": "1", "name": "Company", "inherits_parent_permissions": false,
    "children": [{
        "id": "2", "name": "HR", "inherits_parent_permissions": false,
        "permitted_departments": ["10"],
        "created_by": {"id": "900", "role": "admin"},
        "children": [{"id": "3", "name": "Policies", "inherits_parent_permissions": true}],
        "files": [{"id": "20", "name": "handbook.pdf", "inherits_parent_permissions": false,
                   "permitted_employees": ["42"]}]
    }]
}]"#;

const CATALOG: &str = r#"{
    "branches": [{"id": "1", "name": "Head Office"}, {"id": "2", "name": "North"}],
    "departments": [{"id": "10", "name": "HR"}],
    "branch_departments": [
        {"id": "100", "branch": "1", "department": "10"},
        {"id": "101", "branch": "2", "department": "10"}
    ]
}"#;

async fn loaded() -> Arc<AppState> {
    let state = Arc::new(AppState::new(AccessConfig::default()));
    let (status, _) = put_tree(State(state.clone()), TREE.to_string()).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = put_catalog(State(state.clone()), CATALOG.to_string()).await;
    assert_eq!(status, StatusCode::OK);
    state
}

#[tokio::test]
async fn health_reports_generations() {
    let state = loaded().await;
    let Json(h) = get_health(State(state)).await;
    assert_eq!(h.status, "ok");
    assert_eq!(h.tree_generation, 1);
    assert_eq!(h.catalog_generation, 1);
}

#[tokio::test]
async fn effective_before_load_is_unavailable() {
    let state = Arc::new(AppState::new(AccessConfig::default()));
    let (status, Json(res)) = get_folder_effective(State(state), Path("1".into())).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert!(!res.success);
}

#[tokio::test]
async fn effective_reports_inheritance_source() {
    let state = loaded().await;
    let (status, Json(res)) = get_folder_effective(State(state.clone()), Path("3".into())).await;
    assert_eq!(status, StatusCode::OK);
    let data = res.data.unwrap();
    assert_eq!(data.access_level, AccessLevel::SpecificDepartments);
    assert_eq!(data.label, "Specific Departments");
    assert_eq!(data.inherited_from.as_deref(), Some("2"));

    let (_, Json(res)) = get_file_effective(State(state), Path("20".into())).await;
    let data = res.data.unwrap();
    assert_eq!(data.label, "Specific Employees");
    assert!(data.inherited_from.is_none());
}

#[tokio::test]
async fn effective_rejects_bad_and_unknown_ids() {
    let state = loaded().await;
    let (status, _) = get_folder_effective(State(state.clone()), Path("abc".into())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (status, _) = get_folder_effective(State(state), Path("404".into())).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn bad_tree_body_is_rejected() {
    let state = loaded().await;
    let (status, Json(res)) = put_tree(State(state.clone()), "[{".to_string()).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(res.error.is_some());
    assert!(state.tree.current().is_some());
}

#[tokio::test]
async fn check_uses_membership_links() {
    let state = loaded().await;
    let req: CheckReq = serde_json::from_value(json!({
        "principal": {"employee_id": "7", "roles": ["employee"]},
        "membership_links": ["101"],
        "kind": "folder",
        "id": "3"
    }))
    .unwrap();
    let (status, Json(res)) = post_check(State(state), Json(req)).await;
    assert_eq!(status, StatusCode::OK);
    let data = res.data.unwrap();
    assert!(data.allowed);
    assert_eq!(data.capabilities, ALL);
    assert_eq!(data.capability_names, vec!["read", "write", "delete"]);
}

#[tokio::test]
async fn check_admin_created_folder_is_read_only() {
    let state = loaded().await;
    let req: CheckReq = serde_json::from_value(json!({
        "principal": {"employee_id": "7"},
        "membership_links": ["100"],
        "kind": "folder",
        "id": "2"
    }))
    .unwrap();
    let (_, Json(res)) = post_check(State(state), Json(req)).await;
    assert_eq!(res.data.unwrap().capability_names, vec!["read"]);
}

#[tokio::test]
async fn expand_and_collapse() {
    let state = loaded().await;
    let req: ExpandReq = serde_json::from_value(json!({
        "branches": ["1", "2"],
        "departments": ["10"],
        "scope": {"links": ["101"]}
    }))
    .unwrap();
    let (_, Json(res)) = post_expand(State(state.clone()), Json(req)).await;
    assert_eq!(res.data.unwrap().links.into_iter().collect::<Vec<_>>(), vec![101]);

    let req: CollapseReq = serde_json::from_value(json!({"links": ["100", "101"]})).unwrap();
    let (_, Json(res)) = post_collapse(State(state), Json(req)).await;
    let dims = res.data.unwrap();
    assert_eq!(dims.branches.into_iter().collect::<Vec<_>>(), vec![1, 2]);
    assert_eq!(dims.departments.into_iter().collect::<Vec<_>>(), vec![10]);
}
