//! IAM API seam

use async_trait::async_trait;
use aws_sdk_iam::types::LoginProfile as SdkLoginProfile;
use awsutils_core::provider::{ProviderError, ProviderResult};

use crate::error::api_error;

pub const NO_SUCH_ENTITY: &str = "NoSuchEntity";
pub const ENTITY_TEMPORARILY_UNMODIFIABLE: &str = "EntityTemporarilyUnmodifiable";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginProfile {
    pub user_name: String,
    pub password_reset_required: bool,
}

impl From<&SdkLoginProfile> for LoginProfile {
    fn from(profile: &SdkLoginProfile) -> Self {
        Self {
            user_name: profile.user_name().to_string(),
            password_reset_required: profile.password_reset_required(),
        }
    }
}

#[async_trait]
pub trait IamApi: Send + Sync {
    async fn create_login_profile(
        &self,
        user_name: &str,
        password: &str,
        password_reset_required: bool,
    ) -> ProviderResult<LoginProfile>;

    /// Fails with code `NoSuchEntity` when the user has no login profile
    async fn get_login_profile(&self, user_name: &str) -> ProviderResult<LoginProfile>;

    async fn delete_login_profile(&self, user_name: &str) -> ProviderResult<()>;
}

#[derive(Debug, Clone)]
pub struct SdkIam {
    client: aws_sdk_iam::Client,
}

impl SdkIam {
    pub fn new(client: aws_sdk_iam::Client) -> Self {
        Self { client }
    }
}

fn empty_response(op: &str, user_name: &str) -> ProviderError {
    ProviderError::new(format!("{}: empty response for user {}", op, user_name))
}

#[async_trait]
impl IamApi for SdkIam {
    async fn create_login_profile(
        &self,
        user_name: &str,
        password: &str,
        password_reset_required: bool,
    ) -> ProviderResult<LoginProfile> {
        let output = self
            .client
            .create_login_profile()
            .user_name(user_name)
            .password(password)
            .password_reset_required(password_reset_required)
            .send()
            .await
            .map_err(|e| api_error("CreateLoginProfile", e))?;

        output
            .login_profile()
            .map(LoginProfile::from)
            .ok_or_else(|| empty_response("CreateLoginProfile", user_name))
    }

    async fn get_login_profile(&self, user_name: &str) -> ProviderResult<LoginProfile> {
        let output = self
            .client
            .get_login_profile()
            .user_name(user_name)
            .send()
            .await
            .map_err(|e| api_error("GetLoginProfile", e))?;

        output
            .login_profile()
            .map(LoginProfile::from)
            .ok_or_else(|| empty_response("GetLoginProfile", user_name))
    }

    async fn delete_login_profile(&self, user_name: &str) -> ProviderResult<()> {
        self.client
            .delete_login_profile()
            .user_name(user_name)
            .send()
            .await
            .map_err(|e| api_error("DeleteLoginProfile", e))?;
        Ok(())
    }
}
