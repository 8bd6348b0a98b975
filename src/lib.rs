pub use engine::PolicyEngine;
pub use error::PolicyError;
pub use loader::{PolicySet, compile_permission, compile_policy, compile_policy_str};
pub use traits::Implies;
pub use types::*;

mod engine;
mod error;
mod loader;
mod policy_match;
mod traits;
mod types;
