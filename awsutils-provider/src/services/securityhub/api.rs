//! Security Hub API seam and finders

use std::fmt;

use async_trait::async_trait;
use aws_sdk_securityhub::types::AccountDetails;
use awsutils_core::provider::{ProviderError, ProviderResult};

use crate::error::api_error;
use crate::services::UnprocessedAccount;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlStatus {
    Enabled,
    Disabled,
}

impl fmt::Display for ControlStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ControlStatus::Enabled => "ENABLED",
            ControlStatus::Disabled => "DISABLED",
        })
    }
}

/// A control of an enabled standard
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StandardsControl {
    pub arn: String,
    pub status: String,
    pub disabled_reason: Option<String>,
}

impl StandardsControl {
    pub fn is_disabled(&self) -> bool {
        self.status == ControlStatus::Disabled.to_string()
    }
}

#[async_trait]
pub trait SecurityHubApi: Send + Sync {
    async fn update_standards_control(
        &self,
        control_arn: &str,
        status: ControlStatus,
        disabled_reason: Option<&str>,
    ) -> ProviderResult<()>;

    /// Subscription ARNs of every enabled standard
    async fn enabled_standards_subscriptions(&self) -> ProviderResult<Vec<String>>;

    async fn describe_standards_controls(
        &self,
        subscription_arn: &str,
    ) -> ProviderResult<Vec<StandardsControl>>;

    async fn create_members(
        &self,
        account_ids: &[String],
    ) -> ProviderResult<Vec<UnprocessedAccount>>;

    async fn disassociate_members(&self, account_ids: &[String]) -> ProviderResult<()>;

    async fn delete_members(
        &self,
        account_ids: &[String],
    ) -> ProviderResult<Vec<UnprocessedAccount>>;

    /// Whether new organization accounts are enabled automatically
    async fn organization_auto_enable(&self) -> ProviderResult<bool>;

    async fn update_organization_configuration(&self, auto_enable: bool) -> ProviderResult<()>;
}

/// Find a control across every enabled standard.
pub async fn find_standards_control(
    api: &dyn SecurityHubApi,
    control_arn: &str,
) -> ProviderResult<Option<StandardsControl>> {
    for subscription in api.enabled_standards_subscriptions().await? {
        let controls = api.describe_standards_controls(&subscription).await?;
        if let Some(control) = controls.into_iter().find(|c| c.arn == control_arn) {
            return Ok(Some(control));
        }
    }
    Ok(None)
}

#[derive(Debug, Clone)]
pub struct SdkSecurityHub {
    client: aws_sdk_securityhub::Client,
}

impl SdkSecurityHub {
    pub fn new(client: aws_sdk_securityhub::Client) -> Self {
        Self { client }
    }
}

fn unprocessed(results: &[aws_sdk_securityhub::types::Result]) -> Vec<UnprocessedAccount> {
    results
        .iter()
        .map(|r| UnprocessedAccount {
            account_id: r.account_id().unwrap_or_default().to_string(),
            reason: r.processing_result().unwrap_or_default().to_string(),
        })
        .collect()
}

#[async_trait]
impl SecurityHubApi for SdkSecurityHub {
    async fn update_standards_control(
        &self,
        control_arn: &str,
        status: ControlStatus,
        disabled_reason: Option<&str>,
    ) -> ProviderResult<()> {
        let status = match status {
            ControlStatus::Enabled => aws_sdk_securityhub::types::ControlStatus::Enabled,
            ControlStatus::Disabled => aws_sdk_securityhub::types::ControlStatus::Disabled,
        };
        self.client
            .update_standards_control()
            .standards_control_arn(control_arn)
            .control_status(status)
            .set_disabled_reason(disabled_reason.map(str::to_string))
            .send()
            .await
            .map_err(|e| api_error("UpdateStandardsControl", e))?;
        Ok(())
    }

    async fn enabled_standards_subscriptions(&self) -> ProviderResult<Vec<String>> {
        let mut arns = Vec::new();
        let mut next_token = None;

        loop {
            let output = self
                .client
                .get_enabled_standards()
                .set_next_token(next_token)
                .send()
                .await
                .map_err(|e| api_error("GetEnabledStandards", e))?;

            for subscription in output.standards_subscriptions() {
                if let Some(arn) = subscription.standards_subscription_arn() {
                    arns.push(arn.to_string());
                }
            }

            next_token = output.next_token().map(str::to_string);
            if next_token.is_none() {
                break;
            }
        }

        Ok(arns)
    }

    async fn describe_standards_controls(
        &self,
        subscription_arn: &str,
    ) -> ProviderResult<Vec<StandardsControl>> {
        let mut controls = Vec::new();
        let mut next_token = None;

        loop {
            let output = self
                .client
                .describe_standards_controls()
                .standards_subscription_arn(subscription_arn)
                .set_next_token(next_token)
                .send()
                .await
                .map_err(|e| api_error("DescribeStandardsControls", e))?;

            controls.extend(output.controls().iter().map(|c| StandardsControl {
                arn: c.standards_control_arn().unwrap_or_default().to_string(),
                status: c
                    .control_status()
                    .map(|s| s.as_str().to_string())
                    .unwrap_or_default(),
                disabled_reason: c.disabled_reason().map(str::to_string),
            }));

            next_token = output.next_token().map(str::to_string);
            if next_token.is_none() {
                break;
            }
        }

        Ok(controls)
    }

    async fn create_members(
        &self,
        account_ids: &[String],
    ) -> ProviderResult<Vec<UnprocessedAccount>> {
        let details = account_ids
            .iter()
            .map(|id| {
                AccountDetails::builder()
                    .account_id(id)
                    .build()
                    .map_err(|e| ProviderError::new(e.to_string()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let output = self
            .client
            .create_members()
            .set_account_details(Some(details))
            .send()
            .await
            .map_err(|e| api_error("CreateMembers", e))?;
        Ok(unprocessed(output.unprocessed_accounts()))
    }

    async fn disassociate_members(&self, account_ids: &[String]) -> ProviderResult<()> {
        self.client
            .disassociate_members()
            .set_account_ids(Some(account_ids.to_vec()))
            .send()
            .await
            .map_err(|e| api_error("DisassociateMembers", e))?;
        Ok(())
    }

    async fn delete_members(
        &self,
        account_ids: &[String],
    ) -> ProviderResult<Vec<UnprocessedAccount>> {
        let output = self
            .client
            .delete_members()
            .set_account_ids(Some(account_ids.to_vec()))
            .send()
            .await
            .map_err(|e| api_error("DeleteMembers", e))?;
        Ok(unprocessed(output.unprocessed_accounts()))
    }

    async fn organization_auto_enable(&self) -> ProviderResult<bool> {
        let output = self
            .client
            .describe_organization_configuration()
            .send()
            .await
            .map_err(|e| api_error("DescribeOrganizationConfiguration", e))?;
        Ok(output.auto_enable().unwrap_or(false))
    }

    async fn update_organization_configuration(&self, auto_enable: bool) -> ProviderResult<()> {
        self.client
            .update_organization_configuration()
            .auto_enable(auto_enable)
            .send()
            .await
            .map_err(|e| api_error("UpdateOrganizationConfiguration", e))?;
        Ok(())
    }
}
