use std::sync::{Arc, RwLock};

use tracing::{debug, info, warn};

use crate::error::PolicyError;
use crate::loader::{self, PolicySet};
use crate::types::{Decision, PolicyDocument, Principal, RequestDescriptor, RightsMask};

/// A compiled policy set and the generation it was loaded as.
#[derive(Debug)]
struct PolicySnapshot {
    set: PolicySet,
    generation: u64,
}

/// The main engine handle. Cloneable and thread-safe.
///
/// Evaluations hold the lock only long enough to clone the current
/// snapshot, so a reload never blocks behind running evaluations and an
/// evaluation always sees one consistent policy set.
#[derive(Clone)]
pub struct PolicyEngine {
    inner: Arc<RwLock<Arc<PolicySnapshot>>>,
}

impl PolicyEngine {
    pub fn new_from_str(policy_text: &str) -> Result<Self, PolicyError> {
        Ok(Self::from_policy_set(loader::compile_policy_str(policy_text)?))
    }

    pub fn from_document(document: &PolicyDocument) -> Result<Self, PolicyError> {
        Ok(Self::from_policy_set(loader::compile_policy(document)?))
    }

    pub fn from_policy_set(set: PolicySet) -> Self {
        PolicyEngine {
            inner: Arc::new(RwLock::new(Arc::new(PolicySnapshot { set, generation: 1 }))),
        }
    }

    /// Compile `policy_text` and swap it in. On error the current set stays.
    pub fn reload_from_str(&self, policy_text: &str) -> Result<(), PolicyError> {
        let set = loader::compile_policy_str(policy_text).inspect_err(|e| {
            warn!(event = "Reload", phase = "Compile", error = %e);
        })?;
        self.replace(set)
    }

    pub fn reload_from_document(&self, document: &PolicyDocument) -> Result<(), PolicyError> {
        let set = loader::compile_policy(document).inspect_err(|e| {
            warn!(event = "Reload", phase = "Compile", error = %e);
        })?;
        self.replace(set)
    }

    fn replace(&self, set: PolicySet) -> Result<(), PolicyError> {
        let mut guard = self.inner.write()?;
        let generation = guard.generation + 1;
        *guard = Arc::new(PolicySnapshot { set, generation });
        info!(event = "Reload", phase = "Swapped", generation = generation);
        Ok(())
    }

    fn snapshot(&self) -> Result<Arc<PolicySnapshot>, PolicyError> {
        Ok(Arc::clone(&*self.inner.read()?))
    }

    fn decide(
        &self,
        principal: &str,
        query: impl FnOnce(&Principal) -> bool,
    ) -> Result<Decision, PolicyError> {
        let snapshot = self.snapshot()?;
        let found = snapshot
            .set
            .principal(principal)
            .ok_or_else(|| PolicyError::UnknownPrincipal(principal.to_string()))?;
        let decision = Decision::from_allowed(query(found), principal, snapshot.generation);
        debug!(event = "Request", phase = "Decision", decision = %decision);
        Ok(decision)
    }

    /// Decide a request for `principal`, requiring the right its method maps to.
    pub fn evaluate(
        &self,
        principal: &str,
        request: &RequestDescriptor,
    ) -> Result<Decision, PolicyError> {
        debug!(
            event = "Request",
            phase = "Evaluation",
            principal = principal,
            request = %request
        );
        self.decide(principal, |p| p.is_authorized(request))
    }

    /// Decide a request by permission name only.
    pub fn evaluate_permission(
        &self,
        principal: &str,
        permission: &str,
        request: &RequestDescriptor,
    ) -> Result<Decision, PolicyError> {
        debug!(
            event = "Request",
            phase = "Evaluation",
            principal = principal,
            permission = permission,
            method = request.method.as_ref()
        );
        self.decide(principal, |p| p.is_permission_authorized(permission, request))
    }

    /// Decide an explicit right for an object and resource.
    pub fn evaluate_right(
        &self,
        principal: &str,
        right: &str,
        object: Option<&str>,
        resource: Option<&str>,
    ) -> Result<Decision, PolicyError> {
        debug!(
            event = "Request",
            phase = "Evaluation",
            principal = principal,
            right = right,
            object = object,
            resource = resource
        );
        self.decide(principal, |p| p.is_right_authorized(right, object, resource))
    }

    /// Names of the rights fully covered by `mask`, sorted.
    pub fn rights_for_mask(&self, mask: &RightsMask) -> Result<Vec<String>, PolicyError> {
        let snapshot = self.snapshot()?;
        Ok(snapshot
            .set
            .rights()
            .for_mask(mask)
            .into_iter()
            .map(|right| right.name().to_string())
            .collect())
    }

    /// Names of every principal in the current set, sorted.
    pub fn principal_names(&self) -> Result<Vec<String>, PolicyError> {
        let snapshot = self.snapshot()?;
        let mut names: Vec<String> = snapshot
            .set
            .principals()
            .map(|p| p.name().to_string())
            .collect();
        names.sort();
        Ok(names)
    }

    /// Starts at 1 and increases with every successful reload.
    pub fn generation(&self) -> Result<u64, PolicyError> {
        Ok(self.snapshot()?.generation)
    }
}

#[cfg(test)]
mod tests;
