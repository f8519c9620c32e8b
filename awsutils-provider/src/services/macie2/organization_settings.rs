//! awsutils_macie2_organization_settings

use std::sync::Arc;

use async_trait::async_trait;
use awsutils_core::provider::{ProviderResult, ResourceType};
use awsutils_core::resource::{Resource, State};
use awsutils_core::schema::ResourceSchema;

use super::api::Macie2Api;
use crate::flex::MembershipChange;
use crate::provider::ResourceHandler;
use crate::services::members;

pub const TYPE_NAME: &str = "awsutils_macie2_organization_settings";

pub struct Macie2OrganizationSettings {
    macie2: Arc<dyn Macie2Api>,
}

impl Macie2OrganizationSettings {
    pub fn new(macie2: Arc<dyn Macie2Api>) -> Self {
        Self { macie2 }
    }

    async fn add_members(&self, accounts: &[String]) -> ProviderResult<()> {
        for account_id in accounts {
            self.macie2.create_member(account_id).await.map_err(|e| {
                e.context("error designating Macie2 administrator account members")
            })?;
        }
        Ok(())
    }

    async fn remove_members(&self, accounts: &[String]) -> ProviderResult<()> {
        for account_id in accounts {
            self.macie2.disassociate_member(account_id).await.map_err(|e| {
                e.context("error disassociating Macie2 administrator account member")
            })?;
            self.macie2.delete_member(account_id).await.map_err(|e| {
                e.context("error removing Macie2 administrator account members")
            })?;
        }
        Ok(())
    }
}

impl ResourceType for Macie2OrganizationSettings {
    fn name(&self) -> &'static str {
        TYPE_NAME
    }

    fn schema(&self) -> ResourceSchema {
        ResourceSchema::new(TYPE_NAME)
            .with_description(
                "Enables a list of existing accounts as Macie2 member accounts in an AWS Organization.",
            )
            .attribute(members::id_schema())
            .attribute(members::member_accounts_schema("Macie2"))
    }
}

#[async_trait]
impl ResourceHandler for Macie2OrganizationSettings {
    async fn create(&self, resource: &Resource) -> ProviderResult<State> {
        self.add_members(&members::member_accounts(&resource.attributes))
            .await?;
        Ok(members::created_state(resource))
    }

    async fn read(&self, current: &State) -> ProviderResult<State> {
        Ok(current.clone())
    }

    async fn update(&self, from: &State, to: &Resource) -> ProviderResult<State> {
        let change = MembershipChange::compute(
            &members::member_accounts(&from.attributes),
            &members::member_accounts(&to.attributes),
        );

        self.add_members(&change.to_add)
            .await
            .map_err(|e| e.context("error setting Macie2 organization members"))?;
        self.remove_members(&change.to_remove)
            .await
            .map_err(|e| e.context("error removing Macie2 organization members"))?;

        Ok(members::updated_state(from, to))
    }

    async fn delete(&self, current: &State) -> ProviderResult<()> {
        self.remove_members(&members::member_accounts(&current.attributes))
            .await
            .map_err(|e| e.context("error removing Macie2 organization members"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeMacie2;
    use awsutils_core::resource::{ResourceId, Value};

    fn resource(accounts: &[&str]) -> Resource {
        Resource::new(TYPE_NAME, "org")
            .with_attribute("member_accounts", Value::string_list(accounts.iter().copied()))
    }

    fn state(accounts: &[&str]) -> State {
        State::existing(ResourceId::new(TYPE_NAME, "org"), resource(accounts).attributes)
            .with_identifier("id-1")
    }

    #[tokio::test]
    async fn members_created_one_at_a_time() {
        let fake = FakeMacie2::default();
        let handler = Macie2OrganizationSettings::new(Arc::new(fake.clone()));

        handler.create(&resource(&["111", "222", "111"])).await.unwrap();
        assert_eq!(fake.calls(), vec!["CreateMember 111", "CreateMember 222"]);
    }

    #[tokio::test]
    async fn removal_disassociates_before_deleting() {
        let fake = FakeMacie2::default();
        let handler = Macie2OrganizationSettings::new(Arc::new(fake.clone()));

        handler
            .update(&state(&["111", "222"]), &resource(&["222"]))
            .await
            .unwrap();
        assert_eq!(fake.calls(), vec!["DisassociateMember 111", "DeleteMember 111"]);
    }

    #[tokio::test]
    async fn first_failure_stops_enrollment() {
        let fake = FakeMacie2::default().failing_for("222");
        let handler = Macie2OrganizationSettings::new(Arc::new(fake.clone()));

        let err = handler
            .update(&state(&[]), &resource(&["111", "222", "333"]))
            .await
            .unwrap_err();
        assert!(err.message.starts_with("error setting Macie2 organization members"));
        assert_eq!(fake.calls(), vec!["CreateMember 111", "CreateMember 222"]);
    }

    #[tokio::test]
    async fn delete_removes_every_member() {
        let fake = FakeMacie2::default();
        let handler = Macie2OrganizationSettings::new(Arc::new(fake.clone()));

        handler.delete(&state(&["111"])).await.unwrap();
        assert_eq!(fake.calls(), vec!["DisassociateMember 111", "DeleteMember 111"]);
    }
}
