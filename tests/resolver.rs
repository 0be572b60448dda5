//! Composite key resolver and link catalog tests

use std::collections::BTreeSet;

use portal_access::*;

fn set(ids: &[Id]) -> BTreeSet<Id> {
    ids.iter().copied().collect()
}

fn link(id: Id, branch_id: Id, department_id: Id) -> BranchDepartment {
    BranchDepartment { id, branch_id, department_id }
}

/// Branches 1..3, departments 10, 11, 17
/// Links: (1,10)=100 (2,10)=101 (1,11)=102 (3,17)=103
fn catalog() -> LinkCatalog {
    LinkCatalog::new(
        vec![
            Branch { id: 1, name: "Head Office".into() },
            Branch { id: 2, name: "North".into() },
            Branch { id: 3, name: "South".into() },
        ],
        vec![
            Department { id: 10, name: "Finance".into() },
            Department { id: 11, name: "Legal".into() },
            Department { id: 17, name: "HR".into() },
        ],
        vec![link(100, 1, 10), link(101, 2, 10), link(102, 1, 11), link(103, 3, 17)],
    )
}

// ============================================================================
// expand
// ============================================================================

#[test]
fn expand_is_empty_when_either_side_is_empty() {
    let c = catalog();
    assert!(expand(&c, &set(&[]), &set(&[10]), None).is_empty());
    assert!(expand(&c, &set(&[1]), &set(&[]), None).is_empty());
}

#[test]
fn expand_two_branches_one_department() {
    let c = catalog();
    assert_eq!(expand(&c, &set(&[1, 2]), &set(&[10]), None), set(&[100, 101]));
}

#[test]
fn expand_only_returns_existing_pairs() {
    let c = catalog();
    // (2,11) and (3,10) have no link
    assert_eq!(expand(&c, &set(&[1, 2, 3]), &set(&[10, 11]), None), set(&[100, 101, 102]));
}

#[test]
fn expand_respects_manager_scope() {
    let c = catalog();
    let scope = ManagerScope::new([100, 103]);
    assert_eq!(expand(&c, &set(&[1, 2]), &set(&[10, 11]), Some(&scope)), set(&[100]));
}

#[test]
fn expand_ignores_unknown_ids() {
    let c = catalog();
    assert_eq!(expand(&c, &set(&[1, 99]), &set(&[10, 98]), None), set(&[100]));
}

// ============================================================================
// collapse
// ============================================================================

#[test]
fn collapse_unions_referenced_dimensions() {
    let c = catalog();
    let dims = collapse(&c, &set(&[100, 103]));
    assert_eq!(dims.branches, set(&[1, 3]));
    assert_eq!(dims.departments, set(&[10, 17]));
}

#[test]
fn collapse_ignores_unknown_links() {
    let c = catalog();
    assert_eq!(collapse(&c, &set(&[999])), Dimensions::default());
}

#[test]
fn expand_of_collapse_never_loses_links() {
    let c = catalog();
    let all: Vec<Id> = c.links().map(|l| l.id).collect();
    for mask in 0u32..(1 << all.len()) {
        let chosen: BTreeSet<Id> = all
            .iter()
            .enumerate()
            .filter(|(i, _)| mask & (1 << i) != 0)
            .map(|(_, id)| *id)
            .collect();
        let dims = collapse(&c, &chosen);
        let back = expand(&c, &dims.branches, &dims.departments, None);
        assert!(back.is_superset(&chosen), "lost links for {:?}", chosen);
    }
}

#[test]
fn collapse_then_expand_can_add_unchosen_links() {
    let c = catalog();
    // (2,10) and (1,11) chosen; (1,10) exists between them too
    let dims = collapse(&c, &set(&[101, 102]));
    assert_eq!(expand(&c, &dims.branches, &dims.departments, None), set(&[100, 101, 102]));
}

// ============================================================================
// Catalog
// ============================================================================

#[test]
fn duplicate_pair_keeps_first_link() {
    let c = LinkCatalog::from_links(vec![link(100, 1, 10), link(200, 1, 10)]);
    assert_eq!(c.link_for(1, 10), Some(100));
    assert!(c.link(200).is_none());
    assert_eq!(c.link_count(), 1);
}

#[test]
fn reachable_departments_follow_links() {
    let c = catalog();
    assert_eq!(c.departments_reachable_from(&set(&[1]), None), set(&[10, 11]));
    assert_eq!(c.departments_reachable_from(&set(&[2, 3]), None), set(&[10, 17]));
    let scope = ManagerScope::new([102]);
    assert_eq!(c.departments_reachable_from(&set(&[1]), Some(&scope)), set(&[11]));
}

#[test]
fn branches_in_scope() {
    let c = catalog();
    assert_eq!(c.branches_in_scope(None), set(&[1, 2, 3]));
    assert_eq!(c.branches_in_scope(Some(&ManagerScope::new([101, 103]))), set(&[2, 3]));
}

#[test]
fn catalog_payload_accepts_string_ids_and_aliases() {
    let json = r#"{
        "branches": [{"id": "1", "name": "Head Office"}],
        "departments": [{"id": 10, "name": "Finance"}],
        "branch_departments": [
            {"id": "100", "branch": "1", "department": "10"},
            {"id": "101", "branch_id": 2, "department_id": "10"}
        ]
    }"#;
    let c = parse_catalog(json).unwrap();
    assert_eq!(c.link_for(1, 10), Some(100));
    assert_eq!(c.link_for(2, 10), Some(101));
    assert_eq!(c.branch(1).map(|b| b.name.as_str()), Some("Head Office"));
    assert_eq!(c.department(10).map(|d| d.name.as_str()), Some("Finance"));
}

// ============================================================================
// Sentinel picks
// ============================================================================

#[test]
fn all_pick_expands_to_universe() {
    assert_eq!(resolve_picks(&[Pick::All], [1, 2, 3]), vec![1, 2, 3]);
}

#[test]
fn picks_drop_unknown_and_duplicates() {
    let picks = [Pick::Id(2), Pick::Id(9), Pick::Id(2), Pick::Id(1)];
    assert_eq!(resolve_picks(&picks, [1, 2, 3]), vec![2, 1]);
    assert_eq!(resolve_picks(&[Pick::Id(3), Pick::All], [1, 2, 3]), vec![3, 1, 2]);
}
