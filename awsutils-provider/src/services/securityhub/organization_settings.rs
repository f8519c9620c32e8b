//! awsutils_security_hub_organization_settings

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use awsutils_core::provider::{ProviderResult, ResourceType};
use awsutils_core::resource::{Resource, State, Value};
use awsutils_core::schema::{AttributeSchema, AttributeType, ResourceSchema};

use super::api::SecurityHubApi;
use crate::flex::MembershipChange;
use crate::provider::ResourceHandler;
use crate::services::{check_unprocessed, members};

pub const TYPE_NAME: &str = "awsutils_security_hub_organization_settings";

const AUTO_ENABLE: &str = "auto_enable_new_accounts";

pub struct SecurityHubOrganizationSettings {
    securityhub: Arc<dyn SecurityHubApi>,
}

impl SecurityHubOrganizationSettings {
    pub fn new(securityhub: Arc<dyn SecurityHubApi>) -> Self {
        Self { securityhub }
    }

    async fn add_members(&self, accounts: &[String]) -> ProviderResult<()> {
        if accounts.is_empty() {
            return Ok(());
        }
        let context = "error designating security hub administrator account members";
        let unprocessed = self
            .securityhub
            .create_members(accounts)
            .await
            .map_err(|e| e.context(context))?;
        check_unprocessed(context, &unprocessed)
    }

    async fn remove_members(&self, accounts: &[String]) -> ProviderResult<()> {
        if accounts.is_empty() {
            return Ok(());
        }

        self.securityhub
            .disassociate_members(accounts)
            .await
            .map_err(|e| {
                e.context("error disassociating security hub administrator account members")
            })?;

        let context = "error removing security hub administrator account members";
        let unprocessed = self
            .securityhub
            .delete_members(accounts)
            .await
            .map_err(|e| e.context(context))?;
        check_unprocessed(context, &unprocessed)
    }

    async fn refresh(&self, current: &State) -> ProviderResult<State> {
        let auto_enable = self
            .securityhub
            .organization_auto_enable()
            .await
            .map_err(|e| e.context("error reading security hub organization settings"))?;
        Ok(current.clone().with_attribute(AUTO_ENABLE, auto_enable))
    }
}

fn auto_enable(attributes: &HashMap<String, Value>) -> bool {
    attributes
        .get(AUTO_ENABLE)
        .and_then(Value::as_bool)
        .unwrap_or(true)
}

impl ResourceType for SecurityHubOrganizationSettings {
    fn name(&self) -> &'static str {
        TYPE_NAME
    }

    fn schema(&self) -> ResourceSchema {
        ResourceSchema::new(TYPE_NAME)
            .with_description(
                "Enables a list of existing accounts as Security Hub member accounts in an AWS Organization.",
            )
            .attribute(members::id_schema())
            .attribute(members::member_accounts_schema("Security Hub"))
            .attribute(
                AttributeSchema::new(AUTO_ENABLE, AttributeType::Bool)
                    .with_default(true)
                    .with_description(
                        "Whether to automatically enable Security Hub for new accounts in the organization.",
                    ),
            )
    }
}

#[async_trait]
impl ResourceHandler for SecurityHubOrganizationSettings {
    async fn create(&self, resource: &Resource) -> ProviderResult<State> {
        self.add_members(&members::member_accounts(&resource.attributes))
            .await?;

        self.securityhub
            .update_organization_configuration(auto_enable(&resource.attributes))
            .await
            .map_err(|e| e.context("error updating security hub administrator account settings"))?;

        self.refresh(&members::created_state(resource)).await
    }

    async fn read(&self, current: &State) -> ProviderResult<State> {
        self.refresh(current).await
    }

    async fn update(&self, from: &State, to: &Resource) -> ProviderResult<State> {
        let desired = auto_enable(&to.attributes);
        if auto_enable(&from.attributes) != desired {
            self.securityhub
                .update_organization_configuration(desired)
                .await
                .map_err(|e| e.context("error updating security hub organization settings"))?;
        }

        let change = MembershipChange::compute(
            &members::member_accounts(&from.attributes),
            &members::member_accounts(&to.attributes),
        );
        self.add_members(&change.to_add)
            .await
            .map_err(|e| e.context("error setting security hub organization members"))?;
        self.remove_members(&change.to_remove)
            .await
            .map_err(|e| e.context("error removing security hub organization members"))?;

        self.refresh(&members::updated_state(from, to)).await
    }

    async fn delete(&self, _current: &State) -> ProviderResult<()> {
        log::info!("Removing security hub organization settings from state");
        Ok(())
    }
}
