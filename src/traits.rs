use crate::types::Probe;

/// Anything that can decide whether it covers a request probe.
pub trait Implies {
    /// Whether this rule applies to `probe`. Never fails: a probe missing a
    /// field the rule constrains is simply not implied.
    fn implies(&self, probe: &Probe<'_>) -> bool;
}
