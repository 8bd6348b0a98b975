//! Authorization decisions returned by the engine.

use std::fmt::{Display, Formatter, Result as FmtResult};

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Allow or deny, with the principal evaluated and the policy generation
/// the decision was made against.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, ToSchema)]
pub enum Decision {
    Allow { principal: String, generation: u64 },
    Deny { principal: String, generation: u64 },
}

impl Display for Decision {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            Decision::Allow {
                principal,
                generation,
            } => write!(f, "Allow(principal={principal}; generation={generation})"),
            Decision::Deny {
                principal,
                generation,
            } => write!(f, "Deny(principal={principal}; generation={generation})"),
        }
    }
}

impl Decision {
    pub fn from_allowed(allowed: bool, principal: impl Into<String>, generation: u64) -> Self {
        let principal = principal.into();
        if allowed {
            Decision::Allow {
                principal,
                generation,
            }
        } else {
            Decision::Deny {
                principal,
                generation,
            }
        }
    }

    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allow { .. })
    }

    pub fn generation(&self) -> u64 {
        match self {
            Decision::Allow { generation, .. } | Decision::Deny { generation, .. } => *generation,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_allowed() {
        assert!(Decision::from_allowed(true, "nurse", 1).is_allowed());
        assert!(!Decision::from_allowed(false, "nurse", 1).is_allowed());
    }

    #[test]
    fn test_decision_display() {
        assert_eq!(
            Decision::from_allowed(true, "nurse", 3).to_string(),
            "Allow(principal=nurse; generation=3)"
        );
        assert_eq!(
            Decision::from_allowed(false, "clerk", 4).to_string(),
            "Deny(principal=clerk; generation=4)"
        );
    }

    #[test]
    fn test_decision_serialization() {
        let decision = Decision::from_allowed(true, "nurse", 2);
        insta::assert_json_snapshot!(decision, @r#"
        {
          "Allow": {
            "principal": "nurse",
            "generation": 2
          }
        }
        "#);
        let back: Decision =
            serde_json::from_value(serde_json::to_value(&decision).unwrap()).unwrap();
        assert_eq!(back, decision);
        assert_eq!(back.generation(), 2);
    }
}
