//! Arbitrary-width authorization bitmask.
//!
//! Canonical string form is lowercase hexadecimal with a `0x` prefix, e.g.
//! `0x1`, `0x8000000000000000f`. Parsing also accepts uppercase digits, a
//! missing or uppercase prefix, and `_` separators.

use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::PolicyError;

const WORD_BITS: usize = u64::BITS as usize;
const DIGITS_PER_WORD: usize = WORD_BITS / 4;

/// A set of right bits of unbounded width.
///
/// Stored as little-endian `u64` words with no trailing zero words, so two
/// masks with the same bits always compare equal regardless of how they were
/// built.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RightsMask {
    words: Vec<u64>,
}

impl RightsMask {
    /// A mask with no bits set.
    pub fn empty() -> Self {
        Self::default()
    }

    /// A mask with exactly one bit set.
    pub fn with_bit(bit: usize) -> Self {
        let mut words = vec![0u64; bit / WORD_BITS + 1];
        words[bit / WORD_BITS] = 1 << (bit % WORD_BITS);
        Self { words }
    }

    pub fn from_u64(value: u64) -> Self {
        let mut mask = Self { words: vec![value] };
        mask.normalize();
        mask
    }

    /// A mask with every bit below `width` set.
    pub fn full(width: usize) -> Self {
        let mut words = vec![u64::MAX; width / WORD_BITS];
        let rem = width % WORD_BITS;
        if rem > 0 {
            words.push((1u64 << rem) - 1);
        }
        Self { words }
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Number of bits needed to hold this mask, i.e. highest set bit + 1.
    pub fn bit_len(&self) -> usize {
        match self.words.last() {
            Some(top) => {
                (self.words.len() - 1) * WORD_BITS + (WORD_BITS - top.leading_zeros() as usize)
            }
            None => 0,
        }
    }

    /// Whether every bit set in `other` is also set in `self`.
    pub fn contains(&self, other: &RightsMask) -> bool {
        other.words.iter().enumerate().all(|(i, want)| {
            let have = self.words.get(i).copied().unwrap_or(0);
            want & have == *want
        })
    }

    /// OR the bits of `other` into `self`.
    pub fn grant(&mut self, other: &RightsMask) {
        if other.words.len() > self.words.len() {
            self.words.resize(other.words.len(), 0);
        }
        for (word, add) in self.words.iter_mut().zip(&other.words) {
            *word |= add;
        }
    }

    /// Clear the bits of `other` from `self`.
    pub fn revoke(&mut self, other: &RightsMask) {
        for (word, remove) in self.words.iter_mut().zip(&other.words) {
            *word &= !remove;
        }
        self.normalize();
    }

    /// Indices of the set bits, lowest first.
    pub fn bits(&self) -> impl Iterator<Item = usize> + '_ {
        self.words.iter().enumerate().flat_map(|(i, word)| {
            (0..WORD_BITS)
                .filter(move |b| word & (1u64 << b) != 0)
                .map(move |b| i * WORD_BITS + b)
        })
    }

    /// Render as minimal lowercase `0x` hex.
    pub fn encode(&self) -> String {
        let mut words = self.words.iter().rev();
        let Some(top) = words.next() else {
            return "0x0".to_string();
        };
        let mut out = format!("0x{top:x}");
        for word in words {
            out.push_str(&format!("{word:016x}"));
        }
        out
    }

    /// Parse the hex form produced by [`RightsMask::encode`].
    pub fn decode(encoded: &str) -> Result<Self, PolicyError> {
        let trimmed = encoded.trim();
        let body = trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
            .unwrap_or(trimmed);

        let digits: Vec<char> = body.chars().filter(|c| *c != '_').collect();
        if digits.is_empty() {
            return Err(PolicyError::ConfigError(format!(
                "empty mask encoding '{encoded}' (expected hexadecimal, e.g. 0x1f)"
            )));
        }

        let mut words = vec![0u64; digits.len().div_ceil(DIGITS_PER_WORD)];
        for (pos, c) in digits.iter().rev().enumerate() {
            let nibble = c.to_digit(16).ok_or_else(|| {
                PolicyError::ConfigError(format!(
                    "invalid symbol '{c}' in mask encoding '{encoded}'"
                ))
            })?;
            words[pos / DIGITS_PER_WORD] |= u64::from(nibble) << ((pos % DIGITS_PER_WORD) * 4);
        }

        let mut mask = Self { words };
        mask.normalize();
        Ok(mask)
    }

    fn normalize(&mut self) {
        while self.words.last() == Some(&0) {
            self.words.pop();
        }
    }
}

impl Display for RightsMask {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.encode())
    }
}

impl FromStr for RightsMask {
    type Err = PolicyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::decode(s)
    }
}

impl TryFrom<String> for RightsMask {
    type Error = PolicyError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::decode(&value)
    }
}

impl From<RightsMask> for String {
    fn from(mask: RightsMask) -> Self {
        mask.encode()
    }
}
