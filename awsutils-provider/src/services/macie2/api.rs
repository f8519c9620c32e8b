//! Macie2 API seam
//!
//! Macie2 has no batch membership calls; every operation is per account.

use async_trait::async_trait;
use aws_sdk_macie2::types::AccountDetail;
use awsutils_core::provider::{ProviderError, ProviderResult};

use crate::error::api_error;
use crate::services::MEMBER_EMAIL;

#[async_trait]
pub trait Macie2Api: Send + Sync {
    async fn create_member(&self, account_id: &str) -> ProviderResult<()>;

    async fn disassociate_member(&self, account_id: &str) -> ProviderResult<()>;

    async fn delete_member(&self, account_id: &str) -> ProviderResult<()>;
}

#[derive(Debug, Clone)]
pub struct SdkMacie2 {
    client: aws_sdk_macie2::Client,
}

impl SdkMacie2 {
    pub fn new(client: aws_sdk_macie2::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Macie2Api for SdkMacie2 {
    async fn create_member(&self, account_id: &str) -> ProviderResult<()> {
        let account = AccountDetail::builder()
            .account_id(account_id)
            .email(MEMBER_EMAIL)
            .build()
            .map_err(|e| ProviderError::new(e.to_string()))?;

        self.client
            .create_member()
            .account(account)
            .send()
            .await
            .map_err(|e| api_error("CreateMember", e))?;
        Ok(())
    }

    async fn disassociate_member(&self, account_id: &str) -> ProviderResult<()> {
        self.client
            .disassociate_member()
            .id(account_id)
            .send()
            .await
            .map_err(|e| api_error("DisassociateMember", e))?;
        Ok(())
    }

    async fn delete_member(&self, account_id: &str) -> ProviderResult<()> {
        self.client
            .delete_member()
            .id(account_id)
            .send()
            .await
            .map_err(|e| api_error("DeleteMember", e))?;
        Ok(())
    }
}
