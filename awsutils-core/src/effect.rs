//! Effect - A single side effect to be performed against a Provider
//!
//! Effects are plain values; nothing happens until an Interpreter runs them.

use crate::resource::{Resource, ResourceId, State};

#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Read a data source
    Read { resource: Resource },
    Create(Resource),
    /// Update in place
    Update {
        from: State,
        to: Resource,
        changed_attributes: Vec<String>,
    },
    /// Delete then create, because a force-new attribute changed
    Replace {
        from: State,
        to: Resource,
        changed_attributes: Vec<String>,
    },
    Delete(State),
}

impl Effect {
    pub fn resource_id(&self) -> &ResourceId {
        match self {
            Effect::Read { resource } => &resource.id,
            Effect::Create(resource) => &resource.id,
            Effect::Update { to, .. } | Effect::Replace { to, .. } => &to.id,
            Effect::Delete(state) => &state.id,
        }
    }

    /// Verb used in logs and plan output
    pub fn action(&self) -> &'static str {
        match self {
            Effect::Read { .. } => "read",
            Effect::Create(_) => "create",
            Effect::Update { .. } => "update",
            Effect::Replace { .. } => "replace",
            Effect::Delete(_) => "delete",
        }
    }

    /// Whether this Effect changes remote infrastructure
    pub fn is_mutating(&self) -> bool {
        !matches!(self, Effect::Read { .. })
    }
}
