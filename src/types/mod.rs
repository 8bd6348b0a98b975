//! Data model types for rights, rules, principals and requests.
//!
//! Canonical string forms:
//! - Mask: lowercase hex with `0x` prefix, e.g. `0x1f`
//! - Required right: a right name, or `*` for unrestricted access
//! - Method: uppercase, e.g. `GET`

mod decision;
mod document;
mod mask;
mod pattern;
mod permission;
mod principal;
mod probe;
mod registry;
mod request;
mod right;

pub use decision::Decision;
pub use document::{PermissionDef, PermissionRef, PolicyDocument, PolicySettings, PrincipalDef, RightDef};
pub use mask::RightsMask;
pub use pattern::Pattern;
pub use permission::{MatchReason, Mismatch, Permission};
pub use principal::{DEFAULT_METHOD_RIGHTS, Principal};
pub use probe::Probe;
pub use registry::{MAX_MASK_WIDTH, RequiredRight, RightsRegistry};
pub use request::{Action, Method, Parameters, RequestDescriptor};
pub use right::Right;
