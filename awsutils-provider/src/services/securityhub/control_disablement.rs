//! awsutils_security_hub_control_disablement

use std::sync::Arc;

use async_trait::async_trait;
use awsutils_core::provider::{ProviderError, ProviderResult, ResourceType};
use awsutils_core::resource::{Resource, State};
use awsutils_core::schema::{AttributeSchema, AttributeType, ResourceSchema};

use super::api::{ControlStatus, SecurityHubApi, find_standards_control};
use crate::provider::ResourceHandler;
use crate::validation;

pub const TYPE_NAME: &str = "awsutils_security_hub_control_disablement";

pub struct ControlDisablement {
    securityhub: Arc<dyn SecurityHubApi>,
}

impl ControlDisablement {
    pub fn new(securityhub: Arc<dyn SecurityHubApi>) -> Self {
        Self { securityhub }
    }

    /// `None` leaves any reason on the control untouched; `Some("")` clears it
    async fn disable(&self, control_arn: &str, reason: Option<&str>) -> ProviderResult<()> {
        self.securityhub
            .update_standards_control(control_arn, ControlStatus::Disabled, reason)
            .await
            .map_err(|e| e.context(format!("error disabling security hub control {}", control_arn)))
    }

    async fn refresh(&self, current: &State, is_new: bool) -> ProviderResult<State> {
        let control_arn = control_arn(current)?;

        let control = find_standards_control(self.securityhub.as_ref(), control_arn)
            .await
            .and_then(|found| {
                found.ok_or_else(|| {
                    ProviderError::new(format!("{} is not a valid control arn", control_arn))
                        .with_code("NotFound")
                })
            })
            .map_err(|e| e.context(format!("error reading security hub control {}", control_arn)))?;

        if !is_new && !control.is_disabled() {
            log::warn!(
                "Security Hub Control ({}) no longer disabled, removing from state",
                control_arn
            );
            return Ok(State::not_found(current.id.clone()));
        }

        Ok(current
            .clone()
            .with_attribute("reason", control.disabled_reason.unwrap_or_default()))
    }
}

fn control_arn(state: &State) -> ProviderResult<&str> {
    state
        .identifier
        .as_deref()
        .or_else(|| state.get_str("control_arn"))
        .ok_or_else(|| ProviderError::new("control_arn is required"))
}

impl ResourceType for ControlDisablement {
    fn name(&self) -> &'static str {
        TYPE_NAME
    }

    fn schema(&self) -> ResourceSchema {
        ResourceSchema::new(TYPE_NAME)
            .with_description("Disables a Security Hub standards control.")
            .attribute(AttributeSchema::new("id", AttributeType::String).computed())
            .attribute(
                AttributeSchema::new("control_arn", validation::arn())
                    .required()
                    .force_new()
                    .with_description("The ARN of the standards control to disable."),
            )
            .attribute(
                AttributeSchema::new("reason", AttributeType::String)
                    .with_default("")
                    .with_description("Why the control is disabled."),
            )
    }
}

#[async_trait]
impl ResourceHandler for ControlDisablement {
    async fn create(&self, resource: &Resource) -> ProviderResult<State> {
        let control_arn = resource
            .get_str("control_arn")
            .filter(|s| !s.is_empty())
            .ok_or_else(|| ProviderError::new("control_arn is required"))?;
        self.disable(control_arn, resource.get_str("reason")).await?;

        let state = State::existing(resource.id.clone(), resource.attributes.clone())
            .with_identifier(control_arn)
            .with_attribute("id", control_arn);
        self.refresh(&state, true).await
    }

    async fn read(&self, current: &State) -> ProviderResult<State> {
        self.refresh(current, false).await
    }

    async fn update(&self, from: &State, to: &Resource) -> ProviderResult<State> {
        let control_arn = control_arn(from)?.to_string();
        let old_reason = from.get_str("reason").unwrap_or_default();
        let new_reason = to.get_str("reason").unwrap_or_default();

        if old_reason != new_reason {
            self.disable(&control_arn, Some(new_reason)).await?;
        }

        let state = State::existing(to.id.clone(), to.attributes.clone())
            .with_identifier(control_arn.clone())
            .with_attribute("id", control_arn);
        self.refresh(&state, false).await
    }

    async fn delete(&self, current: &State) -> ProviderResult<()> {
        let control_arn = control_arn(current)?;
        self.securityhub
            .update_standards_control(control_arn, ControlStatus::Enabled, None)
            .await
            .map_err(|e| e.context(format!("error updating security hub control {}", control_arn)))
    }
}
