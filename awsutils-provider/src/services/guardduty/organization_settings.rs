//! awsutils_guardduty_organization_settings
//!
//! Enrolls existing organization accounts as GuardDuty members. Auto-enable
//! on the administrator account only covers accounts that join later.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use awsutils_core::provider::{ProviderError, ProviderResult, ResourceType};
use awsutils_core::resource::{Resource, State, Value};
use awsutils_core::schema::{AttributeSchema, ResourceSchema, types};

use super::api::GuardDutyApi;
use crate::flex::MembershipChange;
use crate::provider::ResourceHandler;
use crate::services::{check_unprocessed, members};

pub const TYPE_NAME: &str = "awsutils_guardduty_organization_settings";

pub struct GuardDutyOrganizationSettings {
    guardduty: Arc<dyn GuardDutyApi>,
}

impl GuardDutyOrganizationSettings {
    pub fn new(guardduty: Arc<dyn GuardDutyApi>) -> Self {
        Self { guardduty }
    }

    async fn add_members(&self, detector_id: &str, accounts: &[String]) -> ProviderResult<()> {
        if accounts.is_empty() {
            return Ok(());
        }
        let context = "error designating GuardDuty administrator account members";
        let unprocessed = self
            .guardduty
            .create_members(detector_id, accounts)
            .await
            .map_err(|e| e.context(context))?;
        check_unprocessed(context, &unprocessed)
    }

    async fn remove_members(&self, detector_id: &str, accounts: &[String]) -> ProviderResult<()> {
        if accounts.is_empty() {
            return Ok(());
        }

        let context = "error disassociating GuardDuty administrator account members";
        let unprocessed = self
            .guardduty
            .disassociate_members(detector_id, accounts)
            .await
            .map_err(|e| e.context(context))?;
        check_unprocessed(context, &unprocessed)?;

        let context = "error removing GuardDuty administrator account members";
        let unprocessed = self
            .guardduty
            .delete_members(detector_id, accounts)
            .await
            .map_err(|e| e.context(context))?;
        check_unprocessed(context, &unprocessed)
    }
}

fn detector_id(attrs: &HashMap<String, Value>) -> ProviderResult<&str> {
    attrs
        .get("detector_id")
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ProviderError::new("detector_id is required"))
}

impl ResourceType for GuardDutyOrganizationSettings {
    fn name(&self) -> &'static str {
        TYPE_NAME
    }

    fn schema(&self) -> ResourceSchema {
        ResourceSchema::new(TYPE_NAME)
            .with_description(
                "Enables a list of existing accounts as GuardDuty member accounts in an AWS Organization.",
            )
            .attribute(members::id_schema())
            .attribute(members::member_accounts_schema("GuardDuty"))
            .attribute(
                AttributeSchema::new("detector_id", types::non_empty_string())
                    .required()
                    .force_new()
                    .with_description("The detector ID of the GuardDuty administrator account."),
            )
    }
}

#[async_trait]
impl ResourceHandler for GuardDutyOrganizationSettings {
    async fn create(&self, resource: &Resource) -> ProviderResult<State> {
        let detector_id = detector_id(&resource.attributes)?;
        let accounts = members::member_accounts(&resource.attributes);

        self.add_members(detector_id, &accounts).await?;
        Ok(members::created_state(resource))
    }

    async fn read(&self, current: &State) -> ProviderResult<State> {
        Ok(current.clone())
    }

    async fn update(&self, from: &State, to: &Resource) -> ProviderResult<State> {
        let detector_id = detector_id(&to.attributes)?;
        let change = MembershipChange::compute(
            &members::member_accounts(&from.attributes),
            &members::member_accounts(&to.attributes),
        );

        self.add_members(detector_id, &change.to_add)
            .await
            .map_err(|e| e.context("error setting GuardDuty organization members"))?;
        self.remove_members(detector_id, &change.to_remove)
            .await
            .map_err(|e| e.context("error removing GuardDuty organization members"))?;

        Ok(members::updated_state(from, to))
    }

    async fn delete(&self, current: &State) -> ProviderResult<()> {
        let detector_id = detector_id(&current.attributes)?;
        self.remove_members(detector_id, &members::member_accounts(&current.attributes))
            .await
            .map_err(|e| e.context("error removing GuardDuty organization members"))
    }
}
