//! Lookup table of rights plus bitmask coverage tests.

use std::collections::HashMap;
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::error::PolicyError;

use super::mask::RightsMask;
use super::right::Right;

/// The right a request needs before it may proceed.
///
/// `Unrestricted` is written `*` in policy documents and asks for every bit
/// of the registry's declared width.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum RequiredRight {
    Unrestricted,
    Named(String),
}

impl Display for RequiredRight {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            RequiredRight::Unrestricted => write!(f, "*"),
            RequiredRight::Named(name) => write!(f, "{name}"),
        }
    }
}

impl FromStr for RequiredRight {
    type Err = PolicyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "" => Err(PolicyError::ConfigError(
                "required right must not be empty".to_string(),
            )),
            "*" => Ok(RequiredRight::Unrestricted),
            name => Ok(RequiredRight::Named(name.to_string())),
        }
    }
}

impl TryFrom<String> for RequiredRight {
    type Error = PolicyError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<RequiredRight> for String {
    fn from(right: RequiredRight) -> Self {
        right.to_string()
    }
}

impl From<&str> for RequiredRight {
    fn from(name: &str) -> Self {
        if name == "*" {
            RequiredRight::Unrestricted
        } else {
            RequiredRight::Named(name.to_string())
        }
    }
}

/// Widest mask a registry accepts, in bits.
pub const MAX_MASK_WIDTH: usize = 65_536;

/// All rights known to a policy, keyed by name.
#[derive(Debug, Clone, Default)]
pub struct RightsRegistry {
    rights: HashMap<String, Right>,
    width: usize,
    full: RightsMask,
}

impl RightsRegistry {
    /// Build a registry. `width` defaults to the widest declared right.
    pub fn new(
        rights: impl IntoIterator<Item = Right>,
        width: Option<usize>,
    ) -> Result<Self, PolicyError> {
        if let Some(width) = width
            && width > MAX_MASK_WIDTH
        {
            return Err(PolicyError::ConfigError(format!(
                "declared width of {width} bits exceeds the maximum of {MAX_MASK_WIDTH}"
            )));
        }

        let mut table = HashMap::new();
        for right in rights {
            if let Some(width) = width
                && right.mask().bit_len() > width
            {
                return Err(PolicyError::ConfigError(format!(
                    "right '{}' does not fit the declared width of {width} bits",
                    right.name()
                )));
            }
            if table.contains_key(right.name()) {
                return Err(PolicyError::DuplicateName {
                    kind: "right".to_string(),
                    name: right.name().to_string(),
                });
            }
            table.insert(right.name().to_string(), right);
        }

        let width = width.unwrap_or_else(|| {
            table
                .values()
                .map(|r| r.mask().bit_len())
                .max()
                .unwrap_or(0)
        });
        if width > MAX_MASK_WIDTH {
            return Err(PolicyError::ConfigError(format!(
                "rights need {width} bits, more than the maximum of {MAX_MASK_WIDTH}"
            )));
        }

        Ok(Self {
            rights: table,
            width,
            full: RightsMask::full(width),
        })
    }

    pub fn for_name(&self, name: &str) -> Option<&Right> {
        self.rights.get(name)
    }

    /// Every right whose bits are all present in `mask`, sorted by name.
    pub fn for_mask(&self, mask: &RightsMask) -> Vec<&Right> {
        self.rights
            .values()
            .filter(|right| mask.contains(right.mask()))
            .sorted_by(|a, b| a.name().cmp(b.name()))
            .collect()
    }

    /// Whether `auth` carries every bit of `target`.
    pub fn is_mask_granted(&self, target: &RightsMask, auth: &RightsMask) -> bool {
        auth.contains(target)
    }

    /// Unknown right names are never granted. A registry of width 0 has no
    /// full-access sentinel, so `Unrestricted` is never granted either.
    pub fn is_granted(&self, target: &RequiredRight, auth: &RightsMask) -> bool {
        match target {
            RequiredRight::Unrestricted => self.width > 0 && auth.contains(&self.full),
            RequiredRight::Named(name) => self.is_granted_name(name, auth),
        }
    }

    pub fn is_granted_name(&self, name: &str, auth: &RightsMask) -> bool {
        self.for_name(name)
            .is_some_and(|right| self.is_mask_granted(right.mask(), auth))
    }

    pub fn is_revoked(&self, target: &RequiredRight, auth: &RightsMask) -> bool {
        !self.is_granted(target, auth)
    }

    /// Declared width in bits.
    pub fn width(&self) -> usize {
        self.width
    }

    /// The full-access sentinel: every bit below [`RightsRegistry::width`].
    pub fn full_mask(&self) -> &RightsMask {
        &self.full
    }

    pub fn len(&self) -> usize {
        self.rights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rights.is_empty()
    }

    pub fn names(&self) -> Vec<&str> {
        self.rights.keys().map(String::as_str).sorted().collect()
    }
}
