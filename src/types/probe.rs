//! Per-call request views tested against permission rules.

use super::request::{Action, Parameters, RequestDescriptor};

/// A borrowed, permission-shaped view of one request.
///
/// Probes only live for a single authorization call. Each constructor fills
/// exactly the fields its query needs and leaves the rest absent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Probe<'a> {
    pub name: Option<&'a str>,
    pub action: Option<&'a Action>,
    pub object: Option<&'a str>,
    pub resource: Option<&'a str>,
    pub parameters: Option<&'a Parameters>,
}

impl<'a> Probe<'a> {
    /// Action, object, resource and parameters of a request. No name.
    pub fn from_request(request: &'a RequestDescriptor) -> Self {
        Self {
            name: None,
            action: request.action.as_ref(),
            object: request.object.as_deref(),
            resource: request.resource.as_deref(),
            parameters: Some(&request.parameters),
        }
    }

    /// Only a name, so only the named-permission shortcut can match.
    pub fn named(name: &'a str) -> Self {
        Self {
            name: Some(name),
            ..Self::default()
        }
    }

    /// Only an object and resource; no action, no parameters.
    pub fn anonymous(object: Option<&'a str>, resource: Option<&'a str>) -> Self {
        Self {
            object,
            resource,
            ..Self::default()
        }
    }
}
