//! Differ - Compare desired state with current state to generate a Plan
//!
//! Compares the desired resources with the states recorded for them and
//! generates the Effects (Plan) needed to converge. Schemas decide which
//! attributes are compared, how sets compare, and which changes force
//! replacement.

use std::collections::HashMap;

use crate::effect::Effect;
use crate::plan::Plan;
use crate::resource::{Resource, ResourceId, State, Value};
use crate::schema::ResourceSchema;

/// Result of a diff operation
#[derive(Debug, Clone, PartialEq)]
pub enum Diff {
    /// Resource does not exist -> needs creation
    Create(Resource),
    /// Resource exists with differences -> needs update
    Update {
        from: State,
        to: Resource,
        changed_attributes: Vec<String>,
    },
    /// A force-new attribute changed -> delete and recreate
    Replace {
        from: State,
        to: Resource,
        changed_attributes: Vec<String>,
    },
    /// Resource exists with no differences -> no action needed
    NoChange(ResourceId),
}

impl Diff {
    /// Returns whether this Diff involves a change
    pub fn is_change(&self) -> bool {
        !matches!(self, Diff::NoChange(_))
    }
}

/// Compare desired state with current state to compute a Diff
pub fn diff(desired: &Resource, current: &State, schema: &ResourceSchema) -> Diff {
    let mut desired = desired.clone();
    desired.attributes = schema.with_defaults(&desired.attributes);

    if !current.exists {
        return Diff::Create(desired);
    }

    let changed = find_changed_attributes(&desired.attributes, &current.attributes, schema);

    if changed.is_empty() {
        Diff::NoChange(desired.id.clone())
    } else if schema.force_new_changes(&changed).is_empty() {
        Diff::Update {
            from: current.clone(),
            to: desired,
            changed_attributes: changed,
        }
    } else {
        Diff::Replace {
            from: current.clone(),
            to: desired,
            changed_attributes: changed,
        }
    }
}

/// Find changed attributes between desired and current state.
///
/// Computed attributes are ignored; an attribute recorded in the state but
/// no longer desired counts as changed.
fn find_changed_attributes(
    desired: &HashMap<String, Value>,
    current: &HashMap<String, Value>,
    schema: &ResourceSchema,
) -> Vec<String> {
    let mut changed = Vec::new();

    for attr in schema.sorted_attributes() {
        if attr.computed {
            continue;
        }
        let equal = match (desired.get(&attr.name), current.get(&attr.name)) {
            (None, None) => true,
            (Some(d), Some(c)) => attr.attr_type.values_equal(d, c),
            _ => false,
        };
        if !equal {
            changed.push(attr.name.clone());
        }
    }

    changed
}

/// Compute Diff for multiple resources and generate a Plan
///
/// Recorded states with no desired counterpart are planned for deletion,
/// in reverse order of recording.
pub fn create_plan(
    desired: &[Resource],
    current_states: &[State],
    schemas: &HashMap<String, ResourceSchema>,
) -> Plan {
    let mut plan = Plan::new();
    let by_id: HashMap<&ResourceId, &State> = current_states.iter().map(|s| (&s.id, s)).collect();

    for resource in desired {
        if resource.is_data_source() {
            plan.add(Effect::Read {
                resource: resource.clone(),
            });
            continue;
        }

        let current = by_id
            .get(&resource.id)
            .map(|s| (*s).clone())
            .unwrap_or_else(|| State::not_found(resource.id.clone()));

        let fallback;
        let schema = match schemas.get(&resource.id.resource_type) {
            Some(schema) => schema,
            None => {
                fallback = ResourceSchema::new(resource.id.resource_type.clone());
                &fallback
            }
        };

        match diff(resource, &current, schema) {
            Diff::Create(r) => plan.add(Effect::Create(r)),
            Diff::Update {
                from,
                to,
                changed_attributes,
            } => plan.add(Effect::Update {
                from,
                to,
                changed_attributes,
            }),
            Diff::Replace {
                from,
                to,
                changed_attributes,
            } => plan.add(Effect::Replace {
                from,
                to,
                changed_attributes,
            }),
            Diff::NoChange(_) => {}
        }
    }

    for state in current_states.iter().rev() {
        if state.exists && !desired.iter().any(|r| r.id == state.id) {
            plan.add(Effect::Delete(state.clone()));
        }
    }

    plan
}
