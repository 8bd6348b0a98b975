//! Serializable policy definitions, as handed over by the policy store.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::registry::RequiredRight;
use super::request::{Action, Method};

/// Everything needed to build a policy set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PolicyDocument {
    #[serde(default)]
    pub settings: PolicySettings,
    #[serde(default)]
    pub rights: Vec<RightDef>,
    /// Shared rules that principals refer to by name.
    #[serde(default)]
    pub permissions: Vec<PermissionDef>,
    #[serde(default)]
    pub principals: Vec<PrincipalDef>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PolicySettings {
    /// Declared mask width in bits. Derived from the rights when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<usize>,
    /// Reject rules that grant or revoke unknown rights at load time.
    #[serde(default)]
    pub strict_rights: bool,
    /// Overrides for the method to right table.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub methods: BTreeMap<Method, RequiredRight>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RightDef {
    pub name: String,
    /// Hex encoded mask, e.g. `0x01`.
    pub mask: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PermissionDef {
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<Action>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub object: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub parameters: BTreeMap<String, Vec<String>>,
    #[serde(default)]
    pub granted: Vec<String>,
    #[serde(default)]
    pub revoked: Vec<String>,
}

/// A rule in a principal's list: either the name of a shared rule or an
/// inline definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PermissionRef {
    Named(String),
    Inline(PermissionDef),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PrincipalDef {
    pub name: String,
    /// Evaluated in this order.
    pub permissions: Vec<PermissionRef>,
}
