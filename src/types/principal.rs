//! Principals: an ordered rule list bound to a rights registry.

use std::collections::BTreeMap;
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::sync::Arc;

use once_cell::sync::Lazy;
use tracing::{debug, trace, warn};

use crate::error::PolicyError;

use super::mask::RightsMask;
use super::permission::Permission;
use super::probe::Probe;
use super::registry::{RequiredRight, RightsRegistry};
use super::request::{Method, RequestDescriptor};

/// The right each method needs unless a policy overrides it.
pub static DEFAULT_METHOD_RIGHTS: Lazy<BTreeMap<Method, RequiredRight>> = Lazy::new(|| {
    BTreeMap::from([
        (Method::Get, RequiredRight::from("READ")),
        (Method::Head, RequiredRight::from("READ")),
        (Method::Options, RequiredRight::from("READ")),
        (Method::Post, RequiredRight::from("CREATE")),
        (Method::Put, RequiredRight::from("UPDATE")),
        (Method::Patch, RequiredRight::from("UPDATE")),
        (Method::Delete, RequiredRight::from("DELETE")),
    ])
});

/// A rule with its right names already resolved against the registry.
///
/// `None` means at least one name in that list is not a known right.
#[derive(Debug, Clone)]
struct CompiledRule {
    permission: Permission,
    grants: Option<RightsMask>,
    revokes: Option<RightsMask>,
}

impl CompiledRule {
    fn new(principal: &str, permission: Permission, registry: &RightsRegistry) -> Self {
        let compiled = |names: &[String]| match resolve(names, registry) {
            Ok(mask) => Some(mask),
            Err(unknown) => {
                warn!(
                    event = "Load",
                    phase = "Resolve",
                    principal = principal,
                    permission = permission.name(),
                    right = unknown,
                    "unknown right, evaluations matching this rule will be denied"
                );
                None
            }
        };
        let grants = compiled(permission.granted());
        let revokes = compiled(permission.revoked());
        Self {
            permission,
            grants,
            revokes,
        }
    }
}

/// OR together the masks of `names`, or return the first unknown name.
fn resolve<'a>(names: &'a [String], registry: &RightsRegistry) -> Result<RightsMask, &'a str> {
    let mut mask = RightsMask::empty();
    for name in names {
        let right = registry.for_name(name).ok_or(name.as_str())?;
        mask.grant(right.mask());
    }
    Ok(mask)
}

/// One role or user class: the rules that apply to it, in policy order.
#[derive(Debug, Clone)]
pub struct Principal {
    name: String,
    rights: Arc<RightsRegistry>,
    rules: Vec<CompiledRule>,
    method_rights: BTreeMap<Method, RequiredRight>,
}

impl Display for Principal {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "Principal({}, {} rules)", self.name, self.rules.len())
    }
}

impl Principal {
    /// Build a principal. Rules naming unknown rights are kept and fail
    /// safe at evaluation time.
    pub fn new(
        name: impl Into<String>,
        rights: Arc<RightsRegistry>,
        permissions: impl IntoIterator<Item = Permission>,
    ) -> Self {
        let name = name.into();
        let rules = permissions
            .into_iter()
            .map(|p| CompiledRule::new(&name, p, &rights))
            .collect();
        Self::assemble(name, rights, rules)
    }

    /// Like [`Principal::new`], but an unknown right name is a load error.
    pub fn strict(
        name: impl Into<String>,
        rights: Arc<RightsRegistry>,
        permissions: impl IntoIterator<Item = Permission>,
    ) -> Result<Self, PolicyError> {
        let permissions: Vec<Permission> = permissions.into_iter().collect();
        for permission in &permissions {
            for names in [permission.granted(), permission.revoked()] {
                resolve(names, &rights).map_err(|unknown| PolicyError::UnknownRight {
                    permission: permission.name().to_string(),
                    right: unknown.to_string(),
                })?;
            }
        }
        Ok(Self::new(name, rights, permissions))
    }

    fn assemble(name: String, rights: Arc<RightsRegistry>, rules: Vec<CompiledRule>) -> Self {
        Self {
            name,
            rights,
            rules,
            method_rights: DEFAULT_METHOD_RIGHTS.clone(),
        }
    }

    /// Replace entries of the method table.
    pub fn with_method_rights(
        mut self,
        overrides: impl IntoIterator<Item = (Method, RequiredRight)>,
    ) -> Self {
        self.method_rights.extend(overrides);
        self
    }

    /// Fold every implied rule into a mask, in declared order.
    ///
    /// Each matching rule grants then revokes before the next rule is
    /// considered, so a later rule may restore bits an earlier one removed.
    /// A matching rule that names an unknown right empties the mask.
    pub fn accumulate_mask(&self, probe: &Probe<'_>) -> RightsMask {
        let mut mask = RightsMask::empty();
        for rule in &self.rules {
            let reason = match rule.permission.match_reason(probe) {
                Ok(reason) => reason,
                Err(mismatch) => {
                    trace!(
                        event = "Evaluate",
                        phase = "Match",
                        principal = self.name.as_str(),
                        permission = rule.permission.name(),
                        mismatch = mismatch.as_ref()
                    );
                    continue;
                }
            };

            let (Some(grants), Some(revokes)) = (&rule.grants, &rule.revokes) else {
                warn!(
                    event = "Evaluate",
                    phase = "Accumulate",
                    principal = self.name.as_str(),
                    permission = rule.permission.name(),
                    "rule references an unknown right, denying"
                );
                return RightsMask::empty();
            };

            mask.grant(grants);
            mask.revoke(revokes);
            debug!(
                event = "Evaluate",
                phase = "Accumulate",
                principal = self.name.as_str(),
                permission = rule.permission.name(),
                reason = reason.as_ref(),
                mask = %mask
            );
        }
        mask
    }

    /// Authorize a request against the right its method requires.
    pub fn is_authorized(&self, request: &RequestDescriptor) -> bool {
        let mask = self.accumulate_mask(&Probe::from_request(request));
        let allowed = self.method_granted(request.method, &mask);
        debug!(
            event = "Request",
            phase = "Result",
            principal = self.name.as_str(),
            request = %request,
            allowed = allowed
        );
        allowed
    }

    /// Authorize by rule name only; constraints of the rules are not checked.
    pub fn is_permission_authorized(
        &self,
        permission: &str,
        request: &RequestDescriptor,
    ) -> bool {
        let mask = self.accumulate_mask(&Probe::named(permission));
        let allowed = self.method_granted(request.method, &mask);
        debug!(
            event = "Request",
            phase = "Result",
            principal = self.name.as_str(),
            permission = permission,
            method = request.method.as_ref(),
            allowed = allowed
        );
        allowed
    }

    /// Authorize an explicit right for an object and resource, without an
    /// action or parameters.
    pub fn is_right_authorized(
        &self,
        right: &str,
        object: Option<&str>,
        resource: Option<&str>,
    ) -> bool {
        let mask = self.accumulate_mask(&Probe::anonymous(object, resource));
        let allowed = self.rights.is_granted(&RequiredRight::from(right), &mask);
        debug!(
            event = "Request",
            phase = "Result",
            principal = self.name.as_str(),
            right = right,
            object = object,
            resource = resource,
            allowed = allowed
        );
        allowed
    }

    /// Names of every right the probe ends up holding, sorted.
    pub fn granted_rights(&self, probe: &Probe<'_>) -> Vec<String> {
        self.rights
            .for_mask(&self.accumulate_mask(probe))
            .into_iter()
            .map(|right| right.name().to_string())
            .collect()
    }

    fn method_granted(&self, method: Method, mask: &RightsMask) -> bool {
        match self.method_rights.get(&method) {
            Some(required) => self.rights.is_granted(required, mask),
            None => {
                warn!(
                    event = "Request",
                    phase = "Resolve",
                    principal = self.name.as_str(),
                    method = method.as_ref(),
                    "no right configured for method, denying"
                );
                false
            }
        }
    }

    pub fn required_right(&self, method: Method) -> Option<&RequiredRight> {
        self.method_rights.get(&method)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn rights(&self) -> &RightsRegistry {
        &self.rights
    }

    pub fn permissions(&self) -> impl Iterator<Item = &Permission> {
        self.rules.iter().map(|rule| &rule.permission)
    }
}
