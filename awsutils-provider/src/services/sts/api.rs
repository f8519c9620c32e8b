//! STS API seam

use async_trait::async_trait;
use awsutils_core::provider::ProviderResult;

use crate::error::api_error;

/// Identity the configured credentials resolve to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub account_id: String,
    pub arn: String,
    pub user_id: String,
}

#[async_trait]
pub trait StsApi: Send + Sync {
    async fn caller_identity(&self) -> ProviderResult<Identity>;
}

#[derive(Debug, Clone)]
pub struct SdkSts {
    client: aws_sdk_sts::Client,
}

impl SdkSts {
    pub fn new(client: aws_sdk_sts::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl StsApi for SdkSts {
    async fn caller_identity(&self) -> ProviderResult<Identity> {
        let output = self
            .client
            .get_caller_identity()
            .send()
            .await
            .map_err(|e| api_error("GetCallerIdentity", e))?;

        Ok(Identity {
            account_id: output.account().unwrap_or_default().to_string(),
            arn: output.arn().unwrap_or_default().to_string(),
            user_id: output.user_id().unwrap_or_default().to_string(),
        })
    }
}
