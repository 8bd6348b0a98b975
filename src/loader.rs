use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, info};

use crate::error::PolicyError;
use crate::types::{
    Permission, PermissionDef, PermissionRef, PolicyDocument, Principal, PrincipalDef, Right,
    RightsRegistry,
};

/// A compiled policy: one registry and the principals bound to it.
#[derive(Debug, Clone, Default)]
pub struct PolicySet {
    rights: Arc<RightsRegistry>,
    principals: HashMap<String, Principal>,
}

impl PolicySet {
    pub fn new(
        rights: Arc<RightsRegistry>,
        principals: impl IntoIterator<Item = Principal>,
    ) -> Result<Self, PolicyError> {
        let mut table = HashMap::new();
        for principal in principals {
            let name = principal.name().to_string();
            if table.insert(name.clone(), principal).is_some() {
                return Err(PolicyError::DuplicateName {
                    kind: "principal".to_string(),
                    name,
                });
            }
        }
        Ok(Self {
            rights,
            principals: table,
        })
    }

    pub fn principal(&self, name: &str) -> Option<&Principal> {
        self.principals.get(name)
    }

    pub fn principals(&self) -> impl Iterator<Item = &Principal> {
        self.principals.values()
    }

    pub fn rights(&self) -> &RightsRegistry {
        &self.rights
    }
}

/// Parse a JSON policy document and compile it.
///
/// Example:
/// ```rust
/// use accessmask_core::compile_policy_str;
/// let text = r#"{
///     "rights": [{ "name": "READ", "mask": "0x1" }],
///     "principals": [{ "name": "reader", "permissions": [{ "granted": ["READ"] }] }]
/// }"#;
/// let set = compile_policy_str(text).unwrap();
/// assert!(set.principal("reader").is_some());
/// ```
pub fn compile_policy_str(text: &str) -> Result<PolicySet, PolicyError> {
    let document: PolicyDocument = serde_json::from_str(text)?;
    compile_policy(&document)
}

/// Decode every mask, compile every pattern and resolve every rule
/// reference in `document`.
pub fn compile_policy(document: &PolicyDocument) -> Result<PolicySet, PolicyError> {
    let width = document.settings.width;
    let rights = document
        .rights
        .iter()
        .map(|def| Right::from_encoded(&def.name, &def.mask, width))
        .collect::<Result<Vec<_>, _>>()?;
    let registry = Arc::new(RightsRegistry::new(rights, width)?);

    let mut shared: HashMap<&str, Permission> = HashMap::new();
    for def in &document.permissions {
        if def.name.is_empty() {
            return Err(PolicyError::ConfigError(
                "shared permissions must be named".to_string(),
            ));
        }
        if shared.insert(&def.name, compile_permission(def)?).is_some() {
            return Err(PolicyError::DuplicateName {
                kind: "permission".to_string(),
                name: def.name.clone(),
            });
        }
    }

    let principals = document
        .principals
        .iter()
        .map(|def| compile_principal(def, &shared, &registry, document))
        .collect::<Result<Vec<_>, _>>()?;

    info!(
        event = "Load",
        phase = "Compiled",
        rights = registry.len(),
        width = registry.width(),
        permissions = shared.len(),
        principals = principals.len()
    );

    PolicySet::new(registry, principals)
}

/// Build a rule from its definition, compiling every pattern it declares.
pub fn compile_permission(def: &PermissionDef) -> Result<Permission, PolicyError> {
    let mut permission = Permission::new(&def.name);
    if let Some(action) = &def.action {
        permission = permission.with_action(action.clone());
    }
    if let Some(object) = &def.object {
        permission = permission.with_object_pattern(object)?;
    }
    if let Some(resource) = &def.resource {
        permission = permission.with_resource_filter(resource)?;
    }
    for (key, sources) in &def.parameters {
        for source in sources {
            permission = permission.with_parameter_pattern(key, source)?;
        }
    }
    for right in &def.granted {
        permission = permission.grant(right);
    }
    for right in &def.revoked {
        permission = permission.revoke(right);
    }
    Ok(permission)
}

fn compile_principal(
    def: &PrincipalDef,
    shared: &HashMap<&str, Permission>,
    registry: &Arc<RightsRegistry>,
    document: &PolicyDocument,
) -> Result<Principal, PolicyError> {
    let permissions = def
        .permissions
        .iter()
        .map(|reference| match reference {
            PermissionRef::Named(name) => {
                shared
                    .get(name.as_str())
                    .cloned()
                    .ok_or_else(|| PolicyError::UnknownPermission {
                        principal: def.name.clone(),
                        permission: name.clone(),
                    })
            }
            PermissionRef::Inline(inline) => compile_permission(inline),
        })
        .collect::<Result<Vec<_>, _>>()?;

    debug!(
        event = "Load",
        phase = "Principal",
        principal = def.name.as_str(),
        rules = permissions.len()
    );

    let principal = if document.settings.strict_rights {
        Principal::strict(&def.name, Arc::clone(registry), permissions)?
    } else {
        Principal::new(&def.name, Arc::clone(registry), permissions)
    };
    Ok(principal.with_method_rights(document.settings.methods.clone()))
}
