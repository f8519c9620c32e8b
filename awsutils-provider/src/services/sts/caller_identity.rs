//! awsutils_caller_identity data source
//!
//! Like the caller identity of the official provider, plus `eks_role_arn`:
//! the IAM role behind an assumed-role session, in the form EKS aws-auth
//! mappings expect.

use std::sync::Arc;

use async_trait::async_trait;
use awsutils_core::provider::{ProviderResult, ResourceKind, ResourceType};
use awsutils_core::resource::{Resource, State};
use awsutils_core::schema::{AttributeSchema, AttributeType, ResourceSchema};

use super::api::StsApi;
use crate::provider::DataSourceHandler;

pub const TYPE_NAME: &str = "awsutils_caller_identity";

pub struct CallerIdentity {
    sts: Arc<dyn StsApi>,
}

impl CallerIdentity {
    pub fn new(sts: Arc<dyn StsApi>) -> Self {
        Self { sts }
    }
}

/// Convert an assumed-role session ARN into the ARN of its IAM role.
///
/// `arn:aws:sts::123456789012:assumed-role/Admin/session` becomes
/// `arn:aws:iam::123456789012:role/Admin`. Anything else is returned as is.
pub fn eks_role_arn(arn: &str) -> String {
    let colon: Vec<&str> = arn.split(':').collect();
    let slash: Vec<&str> = arn.split('/').collect();
    if colon.len() != 6 || slash.len() != 3 {
        return arn.to_string();
    }

    let partition = colon[1];
    let account_id = colon[4];
    let role_name = slash[1];
    format!("arn:{}:iam::{}:role/{}", partition, account_id, role_name)
}

impl ResourceType for CallerIdentity {
    fn name(&self) -> &'static str {
        TYPE_NAME
    }

    fn kind(&self) -> ResourceKind {
        ResourceKind::DataSource
    }

    fn schema(&self) -> ResourceSchema {
        let computed = |name: &str| AttributeSchema::new(name, AttributeType::String).computed();
        ResourceSchema::new(TYPE_NAME)
            .with_description("Effective account, user and ARN of the provider credentials.")
            .attribute(computed("account_id"))
            .attribute(computed("arn"))
            .attribute(computed("eks_role_arn"))
            .attribute(computed("user_id"))
    }
}

#[async_trait]
impl DataSourceHandler for CallerIdentity {
    async fn read(&self, resource: &Resource) -> ProviderResult<State> {
        let identity = self
            .sts
            .caller_identity()
            .await
            .map_err(|e| e.context("getting Caller Identity"))?;

        log::debug!("received caller identity: {}", identity.arn);

        let mut state = State::existing(resource.id.clone(), resource.attributes.clone())
            .with_identifier(identity.account_id.clone())
            .with_attribute("account_id", identity.account_id)
            .with_attribute("user_id", identity.user_id);

        if identity.arn.starts_with("arn:aws:sts") {
            state = state.with_attribute("eks_role_arn", eks_role_arn(&identity.arn));
        }
        Ok(state.with_attribute("arn", identity.arn))
    }
}
