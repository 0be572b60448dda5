//! Wire contracts with the portal backend
//!
//! The backend string-encodes ids. Decoders accept `"12"` and `12`, encoders
//! always write strings.

use std::collections::BTreeSet;

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize, Serializer};

use crate::catalog::{Branch, BranchDepartment, Department, LinkCatalog};
use crate::constants::Id;
use crate::error::{AccessError, Result};
use crate::selector::DualSelector;
use crate::tree::Grants;

/// Parse a string-encoded id
pub fn parse_id(s: &str) -> Result<Id> {
    s.trim().parse().map_err(|_| AccessError::InvalidId(s.to_string()))
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Num(u64),
    Str(String),
}

impl RawId {
    fn into_id<E: de::Error>(self) -> std::result::Result<Option<Id>, E> {
        match self {
            RawId::Num(n) => Ok(Some(n)),
            RawId::Str(s) if s.trim().is_empty() => Ok(None),
            RawId::Str(s) => parse_id(&s).map(Some).map_err(E::custom),
        }
    }
}

/// `#[serde(with)]` adapter for a required id
pub mod id {
    use super::*;

    pub fn serialize<S: Serializer>(id: &Id, s: S) -> std::result::Result<S::Ok, S::Error> {
        s.collect_str(id)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<Id, D::Error> {
        RawId::deserialize(d)?
            .into_id()?
            .ok_or_else(|| de::Error::custom("empty id"))
    }
}

/// `#[serde(with)]` adapter for a nullable id; `""` and `null` both mean none
pub mod opt_id {
    use super::*;

    pub fn serialize<S: Serializer>(id: &Option<Id>, s: S) -> std::result::Result<S::Ok, S::Error> {
        match id {
            Some(id) => s.collect_str(id),
            None => s.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<Option<Id>, D::Error> {
        match Option::<RawId>::deserialize(d)? {
            Some(raw) => raw.into_id(),
            None => Ok(None),
        }
    }
}

/// `#[serde(with)]` adapter for an id list; `null` decodes as empty
pub mod ids {
    use super::*;
    use serde::ser::SerializeSeq;

    pub fn serialize<S: Serializer>(ids: &BTreeSet<Id>, s: S) -> std::result::Result<S::Ok, S::Error> {
        let mut seq = s.serialize_seq(Some(ids.len()))?;
        for id in ids {
            seq.serialize_element(&id.to_string())?;
        }
        seq.end()
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<BTreeSet<Id>, D::Error> {
        let raw = Option::<Vec<RawId>>::deserialize(d)?.unwrap_or_default();
        let mut out = BTreeSet::new();
        for r in raw {
            if let Some(id) = r.into_id()? {
                out.insert(id);
            }
        }
        Ok(out)
    }
}

fn default_inherits() -> bool {
    true
}

/// Who created a folder or file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Creator {
    #[serde(with = "id")]
    pub id: Id,
    #[serde(default)]
    pub role: Option<String>,
}

/// Folder as returned by the tree fetch, nested or flat
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FolderRecord {
    #[serde(with = "id")]
    pub id: Id,
    pub name: String,
    #[serde(default, with = "opt_id")]
    pub parent: Option<Id>,
    #[serde(default = "default_inherits")]
    pub inherits_parent_permissions: bool,
    #[serde(default, with = "ids")]
    pub permitted_branches: BTreeSet<Id>,
    #[serde(default, with = "ids")]
    pub permitted_departments: BTreeSet<Id>,
    #[serde(default, with = "ids")]
    pub permitted_employees: BTreeSet<Id>,
    #[serde(default)]
    pub created_by: Option<Creator>,
    #[serde(default)]
    pub children: Vec<FolderRecord>,
    #[serde(default)]
    pub files: Vec<FileRecord>,
}

/// File nested under its folder's `files`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileRecord {
    #[serde(with = "id")]
    pub id: Id,
    pub name: String,
    #[serde(default = "default_inherits")]
    pub inherits_parent_permissions: bool,
    #[serde(default, with = "ids")]
    pub permitted_branches: BTreeSet<Id>,
    #[serde(default, with = "ids")]
    pub permitted_departments: BTreeSet<Id>,
    #[serde(default, with = "ids")]
    pub permitted_employees: BTreeSet<Id>,
    #[serde(default)]
    pub created_by: Option<Creator>,
}

impl FolderRecord {
    pub fn grants(&self) -> Grants {
        Grants {
            branches: self.permitted_branches.clone(),
            departments: self.permitted_departments.clone(),
            employees: self.permitted_employees.clone(),
        }
    }
}

impl FileRecord {
    pub fn grants(&self) -> Grants {
        Grants {
            branches: self.permitted_branches.clone(),
            departments: self.permitted_departments.clone(),
            employees: self.permitted_employees.clone(),
        }
    }
}

/// Decode a tree-fetch response body
pub fn parse_tree(json: &str) -> Result<Vec<FolderRecord>> {
    Ok(serde_json::from_str(json)?)
}

/// Link-catalog fetch response
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogPayload {
    #[serde(default)]
    pub branches: Vec<Branch>,
    #[serde(default)]
    pub departments: Vec<Department>,
    #[serde(default, alias = "links")]
    pub branch_departments: Vec<BranchDepartment>,
}

impl CatalogPayload {
    pub fn into_catalog(self) -> LinkCatalog {
        LinkCatalog::new(self.branches, self.departments, self.branch_departments)
    }
}

/// Decode a link-catalog response body
pub fn parse_catalog(json: &str) -> Result<LinkCatalog> {
    let payload: CatalogPayload = serde_json::from_str(json)?;
    Ok(payload.into_catalog())
}

/// Create/update body for a folder or file grant change
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GrantMutation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "opt_id")]
    pub parent: Option<Id>,
    pub inherits_parent_permissions: bool,
    #[serde(default, with = "ids")]
    pub permitted_branches: BTreeSet<Id>,
    #[serde(default, with = "ids")]
    pub permitted_departments: BTreeSet<Id>,
    #[serde(default, with = "ids")]
    pub permitted_employees: BTreeSet<Id>,
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty", with = "ids")]
    pub permitted_branch_departments: BTreeSet<Id>,
}

impl GrantMutation {
    /// Mutation that switches a node to inherit from its parent
    pub fn inheriting() -> Self {
        GrantMutation { inherits_parent_permissions: true, ..Default::default() }
    }

    /// Mutation carrying explicit grants
    pub fn explicit(grants: &Grants) -> Self {
        GrantMutation {
            inherits_parent_permissions: false,
            permitted_branches: grants.branches.clone(),
            permitted_departments: grants.departments.clone(),
            permitted_employees: grants.employees.clone(),
            ..Default::default()
        }
    }

    /// Explicit grants taken from a selector's current picks.
    ///
    /// The selected link ids are sent alongside so the backend can store the
    /// composite grant exactly as chosen.
    pub fn from_selector<I>(selector: &DualSelector, employees: I) -> Self
    where
        I: IntoIterator<Item = Id>,
    {
        GrantMutation {
            inherits_parent_permissions: false,
            permitted_branches: selector.selected_branches().clone(),
            permitted_departments: selector.selected_departments().clone(),
            permitted_employees: employees.into_iter().collect(),
            permitted_branch_departments: selector.selected_links().clone(),
            ..Default::default()
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_parent(mut self, parent: Id) -> Self {
        self.parent = Some(parent);
        self
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}
