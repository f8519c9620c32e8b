//! Shared pieces of the organization member-enrollment resources

use std::collections::HashMap;

use awsutils_core::resource::{Resource, State, Value};
use awsutils_core::schema::{AttributeSchema, AttributeType, types};

use crate::flex;

pub const MEMBER_ACCOUNTS: &str = "member_accounts";

pub fn member_accounts_schema(service: &str) -> AttributeSchema {
    AttributeSchema::new(MEMBER_ACCOUNTS, types::string_set())
        .required()
        .with_description(format!(
            "A list of AWS Organization member accounts to associate with the {} Administrator account.",
            service
        ))
}

pub fn id_schema() -> AttributeSchema {
    AttributeSchema::new("id", AttributeType::String)
        .computed()
        .with_description("The ID of this resource.")
}

pub fn member_accounts(attributes: &HashMap<String, Value>) -> Vec<String> {
    flex::string_set(attributes.get(MEMBER_ACCOUNTS))
}

/// State of a freshly created settings resource, under a random id
pub fn created_state(resource: &Resource) -> State {
    let id = uuid::Uuid::new_v4().to_string();
    State::existing(resource.id.clone(), resource.attributes.clone())
        .with_identifier(id.clone())
        .with_attribute("id", id)
}

/// State after an update: desired attributes under the prior identifier
pub fn updated_state(from: &State, to: &Resource) -> State {
    let mut state = State::existing(to.id.clone(), to.attributes.clone());
    state.identifier = from.identifier.clone();
    if let Some(id) = from.get("id") {
        state.attributes.insert("id".to_string(), id.clone());
    }
    state
}
