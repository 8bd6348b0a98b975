//! Named capabilities and their bit encodings.

use std::fmt::{Display, Formatter, Result as FmtResult};

use serde::{Deserialize, Serialize};

use crate::error::PolicyError;

use super::mask::RightsMask;

/// A named capability, e.g. `READ` with mask `0x1`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Right {
    name: String,
    mask: RightsMask,
}

impl Display for Right {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}({})", self.name, self.mask)
    }
}

impl Right {
    pub fn new(name: impl Into<String>, mask: RightsMask) -> Self {
        Self {
            name: name.into(),
            mask,
        }
    }

    /// Build a right from its stored encoding, see [`Right::decode`].
    pub fn from_encoded(
        name: impl Into<String>,
        encoded: &str,
        width: Option<usize>,
    ) -> Result<Self, PolicyError> {
        let name = name.into();
        let mask = Self::decode(encoded, width).map_err(|e| match e {
            PolicyError::ConfigError(msg) => {
                PolicyError::ConfigError(format!("right '{name}': {msg}"))
            }
            other => other,
        })?;
        Ok(Self { name, mask })
    }

    /// Decode a stored mask, rejecting any bit at or above `width` when a
    /// width is declared.
    pub fn decode(encoded: &str, width: Option<usize>) -> Result<RightsMask, PolicyError> {
        let mask = RightsMask::decode(encoded)?;
        if let Some(width) = width
            && mask.bit_len() > width
        {
            return Err(PolicyError::ConfigError(format!(
                "mask '{encoded}' needs {} bits but the declared width is {width}",
                mask.bit_len()
            )));
        }
        Ok(mask)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn mask(&self) -> &RightsMask {
        &self.mask
    }
}
