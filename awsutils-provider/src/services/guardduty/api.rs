//! GuardDuty API seam

use async_trait::async_trait;
use aws_sdk_guardduty::types::AccountDetail;
use awsutils_core::provider::{ProviderError, ProviderResult};

use crate::error::api_error;
use crate::services::{MEMBER_EMAIL, UnprocessedAccount};

/// Batch membership calls against one detector.
///
/// Each returns the accounts the service did not process.
#[async_trait]
pub trait GuardDutyApi: Send + Sync {
    async fn create_members(
        &self,
        detector_id: &str,
        account_ids: &[String],
    ) -> ProviderResult<Vec<UnprocessedAccount>>;

    async fn disassociate_members(
        &self,
        detector_id: &str,
        account_ids: &[String],
    ) -> ProviderResult<Vec<UnprocessedAccount>>;

    async fn delete_members(
        &self,
        detector_id: &str,
        account_ids: &[String],
    ) -> ProviderResult<Vec<UnprocessedAccount>>;
}

#[derive(Debug, Clone)]
pub struct SdkGuardDuty {
    client: aws_sdk_guardduty::Client,
}

impl SdkGuardDuty {
    pub fn new(client: aws_sdk_guardduty::Client) -> Self {
        Self { client }
    }
}

fn unprocessed(
    accounts: &[aws_sdk_guardduty::types::UnprocessedAccount],
) -> Vec<UnprocessedAccount> {
    accounts
        .iter()
        .map(|a| UnprocessedAccount {
            account_id: a.account_id().unwrap_or_default().to_string(),
            reason: a.result().unwrap_or_default().to_string(),
        })
        .collect()
}

#[async_trait]
impl GuardDutyApi for SdkGuardDuty {
    async fn create_members(
        &self,
        detector_id: &str,
        account_ids: &[String],
    ) -> ProviderResult<Vec<UnprocessedAccount>> {
        let details = account_ids
            .iter()
            .map(|id| {
                AccountDetail::builder()
                    .account_id(id)
                    .email(MEMBER_EMAIL)
                    .build()
                    .map_err(|e| ProviderError::new(e.to_string()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let output = self
            .client
            .create_members()
            .detector_id(detector_id)
            .set_account_details(Some(details))
            .send()
            .await
            .map_err(|e| api_error("CreateMembers", e))?;
        Ok(unprocessed(output.unprocessed_accounts()))
    }

    async fn disassociate_members(
        &self,
        detector_id: &str,
        account_ids: &[String],
    ) -> ProviderResult<Vec<UnprocessedAccount>> {
        let output = self
            .client
            .disassociate_members()
            .detector_id(detector_id)
            .set_account_ids(Some(account_ids.to_vec()))
            .send()
            .await
            .map_err(|e| api_error("DisassociateMembers", e))?;
        Ok(unprocessed(output.unprocessed_accounts()))
    }

    async fn delete_members(
        &self,
        detector_id: &str,
        account_ids: &[String],
    ) -> ProviderResult<Vec<UnprocessedAccount>> {
        let output = self
            .client
            .delete_members()
            .detector_id(detector_id)
            .set_account_ids(Some(account_ids.to_vec()))
            .send()
            .await
            .map_err(|e| api_error("DeleteMembers", e))?;
        Ok(unprocessed(output.unprocessed_accounts()))
    }
}
