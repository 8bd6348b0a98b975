//! Permission rules: when they apply, and which rights they grant or revoke.

use std::collections::BTreeMap;
use std::fmt::{Display, Formatter, Result as FmtResult};

use strum_macros::AsRefStr;

use crate::error::PolicyError;
use crate::policy_match::{action_match, named_shortcut, object_match, parameters_match};
use crate::traits::Implies;

use super::pattern::Pattern;
use super::probe::Probe;
use super::request::Action;

/// Why a rule applied to a probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, AsRefStr)]
pub enum MatchReason {
    /// The probe asked for this rule by name.
    Named,
    /// Every constraint of the rule was satisfied.
    Constraints,
}

/// The first check a probe failed.
#[derive(Debug, Clone, PartialEq, Eq, AsRefStr)]
pub enum Mismatch {
    Action,
    ObjectAbsent,
    Object,
    ResourceAbsent,
    Resource,
    ParametersAbsent,
    ParameterMissing(String),
    ParameterValue(String),
}

/// A policy rule.
///
/// Patterns are compiled when the rule is built, so a rule that exists is
/// always evaluable.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Permission {
    name: String,
    action: Option<Action>,
    object_pattern: Option<Pattern>,
    resource_filter: Option<Pattern>,
    parameter_patterns: BTreeMap<String, Vec<Pattern>>,
    granted: Vec<String>,
    revoked: Vec<String>,
}

impl Display for Permission {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        let name = if self.name.is_empty() {
            "<anonymous>"
        } else {
            self.name.as_str()
        };
        write!(f, "Permission({name}")?;
        if let Some(action) = &self.action {
            write!(f, " action={action}")?;
        }
        if let Some(object) = &self.object_pattern {
            write!(f, " object={object}")?;
        }
        if let Some(resource) = &self.resource_filter {
            write!(f, " resource={resource}")?;
        }
        write!(f, ")")
    }
}

impl Permission {
    /// An empty rule. An empty name disables the named shortcut.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_action(mut self, action: impl Into<Action>) -> Self {
        self.action = Some(action.into());
        self
    }

    pub fn with_object_pattern(mut self, source: &str) -> Result<Self, PolicyError> {
        self.object_pattern = Some(self.compile(source)?);
        Ok(self)
    }

    pub fn with_resource_filter(mut self, source: &str) -> Result<Self, PolicyError> {
        self.resource_filter = Some(self.compile(source)?);
        Ok(self)
    }

    /// Add one alternative pattern for `key`.
    pub fn with_parameter_pattern(
        mut self,
        key: impl Into<String>,
        source: &str,
    ) -> Result<Self, PolicyError> {
        let pattern = self.compile(source)?;
        self.parameter_patterns
            .entry(key.into())
            .or_default()
            .push(pattern);
        Ok(self)
    }

    pub fn grant(mut self, right: impl Into<String>) -> Self {
        self.granted.push(right.into());
        self
    }

    pub fn revoke(mut self, right: impl Into<String>) -> Self {
        self.revoked.push(right.into());
        self
    }

    fn compile(&self, source: &str) -> Result<Pattern, PolicyError> {
        Pattern::new(source).map_err(|e| PolicyError::PatternError {
            permission: self.name.clone(),
            pattern: source.to_string(),
            reason: e.to_string(),
        })
    }

    /// Run the implication checks and report which one decided.
    pub fn match_reason(&self, probe: &Probe<'_>) -> Result<MatchReason, Mismatch> {
        if named_shortcut(&self.name, probe.name) {
            return Ok(MatchReason::Named);
        }
        action_match(self.action.as_ref(), probe.action)?;
        object_match(
            self.object_pattern.as_ref(),
            self.resource_filter.as_ref(),
            probe.object,
            probe.resource,
        )?;
        parameters_match(&self.parameter_patterns, probe.parameters)?;
        Ok(MatchReason::Constraints)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn action(&self) -> Option<&Action> {
        self.action.as_ref()
    }

    pub fn object_pattern(&self) -> Option<&Pattern> {
        self.object_pattern.as_ref()
    }

    pub fn resource_filter(&self) -> Option<&Pattern> {
        self.resource_filter.as_ref()
    }

    pub fn parameter_patterns(&self) -> &BTreeMap<String, Vec<Pattern>> {
        &self.parameter_patterns
    }

    pub fn granted(&self) -> &[String] {
        &self.granted
    }

    pub fn revoked(&self) -> &[String] {
        &self.revoked
    }
}

impl Implies for Permission {
    fn implies(&self, probe: &Probe<'_>) -> bool {
        self.match_reason(probe).is_ok()
    }
}
