//! awsutils_iam_user_login_profile
//!
//! Creates an IAM login profile with either a caller-supplied password or a
//! generated one encrypted to a PGP key. Every input is force-new.

use std::sync::Arc;

use async_trait::async_trait;
use awsutils_core::provider::{ProviderError, ProviderResult, ResourceType};
use awsutils_core::resource::{Resource, State};
use awsutils_core::retry::{RetryPolicy, on_code, retry_until};
use awsutils_core::schema::{AttributeSchema, AttributeType, ResourceSchema, types};

use super::api::{ENTITY_TEMPORARILY_UNMODIFIABLE, IamApi, NO_SUCH_ENTITY};
use crate::encryption::{KeyResolver, encrypt_value};
use crate::password::generate_password;
use crate::provider::ResourceHandler;
use crate::validation;

pub const TYPE_NAME: &str = "awsutils_iam_user_login_profile";

const DEFAULT_PASSWORD_LENGTH: i64 = 20;

pub struct UserLoginProfile {
    iam: Arc<dyn IamApi>,
    keys: Arc<dyn KeyResolver>,
}

impl UserLoginProfile {
    pub fn new(iam: Arc<dyn IamApi>, keys: Arc<dyn KeyResolver>) -> Self {
        Self { iam, keys }
    }

    /// Password to set, plus the fingerprint and ciphertext when generated
    async fn password_for(
        &self,
        user: &str,
        resource: &Resource,
    ) -> ProviderResult<(String, Option<(String, String)>)> {
        let password = resource.get_str("password");
        let pgp_key = resource.get_str("pgp_key").map(str::trim).filter(|k| !k.is_empty());

        match (password, pgp_key) {
            (Some(_), Some(_)) => Err(ProviderError::new("Cannot provide password and PGP key")),
            (Some(password), None) => Ok((password.to_string(), None)),
            (None, Some(pgp_key)) => {
                let key = self.keys.resolve(pgp_key).await.map_err(|e| {
                    ProviderError::new(format!(
                        "error retrieving GPG Key during IAM User Login Profile ({}) creation: {}",
                        user, e
                    ))
                })?;

                let length = resource
                    .get_int("password_length")
                    .unwrap_or(DEFAULT_PASSWORD_LENGTH);
                let password = generate_password(usize::try_from(length).unwrap_or_default())
                    .map_err(|e| ProviderError::new(e.to_string()))?;

                let encrypted = encrypt_value(&key, &password, "Password").map_err(|e| {
                    ProviderError::new(format!(
                        "error encrypting password during IAM User Login Profile ({}) creation: {}",
                        user, e
                    ))
                })?;
                Ok((password, Some((encrypted.key_fingerprint, encrypted.ciphertext))))
            }
            (None, None) => Err(ProviderError::new(
                "one of password or pgp_key must be set",
            )),
        }
    }

    async fn refresh(&self, current: &State, is_new: bool) -> ProviderResult<State> {
        let user = user_name(current)?;

        let result = if is_new {
            retry_until(RetryPolicy::propagation(), on_code(NO_SUCH_ENTITY), || {
                self.iam.get_login_profile(user)
            })
            .await
        } else {
            self.iam.get_login_profile(user).await
        };

        let profile = match result {
            Ok(profile) => profile,
            Err(e) if !is_new && e.is_code(NO_SUCH_ENTITY) => {
                log::warn!(
                    "IAM User Login Profile ({}) not found, removing from state",
                    user
                );
                return Ok(State::not_found(current.id.clone()));
            }
            Err(e) => {
                return Err(e.context(format!("error reading IAM User Login Profile ({})", user)));
            }
        };

        Ok(current.clone().with_attribute("user", profile.user_name))
    }
}

fn user_name(state: &State) -> ProviderResult<&str> {
    state
        .identifier
        .as_deref()
        .or_else(|| state.get_str("user"))
        .ok_or_else(|| ProviderError::new("user is required"))
}

impl ResourceType for UserLoginProfile {
    fn name(&self) -> &'static str {
        TYPE_NAME
    }

    fn schema(&self) -> ResourceSchema {
        ResourceSchema::new(TYPE_NAME)
            .with_description(
                "Manages an IAM User Login Profile. The password is either given directly or \
                 generated and encrypted to a PGP key, which may come from Keybase.",
            )
            .attribute(AttributeSchema::new("id", AttributeType::String).computed())
            .attribute(
                AttributeSchema::new("user", types::non_empty_string())
                    .required()
                    .force_new(),
            )
            .attribute(AttributeSchema::new("pgp_key", AttributeType::String).force_new())
            .attribute(
                AttributeSchema::new("password", AttributeType::String)
                    .sensitive()
                    .force_new()
                    .conflicts_with("pgp_key"),
            )
            .attribute(
                AttributeSchema::new("password_reset_required", AttributeType::Bool)
                    .with_default(true)
                    .force_new(),
            )
            .attribute(
                AttributeSchema::new("password_length", validation::password_length())
                    .with_default(DEFAULT_PASSWORD_LENGTH)
                    .force_new(),
            )
            .attribute(AttributeSchema::new("key_fingerprint", AttributeType::String).computed())
            .attribute(AttributeSchema::new("encrypted_password", AttributeType::String).computed())
    }
}

#[async_trait]
impl ResourceHandler for UserLoginProfile {
    async fn create(&self, resource: &Resource) -> ProviderResult<State> {
        let user = resource
            .get_str("user")
            .ok_or_else(|| ProviderError::new("user is required"))?;
        let reset_required = resource.get_bool("password_reset_required").unwrap_or(true);

        let (password, encrypted) = self.password_for(user, resource).await?;

        log::debug!("creating IAM User Login Profile for {}", user);
        let profile = self
            .iam
            .create_login_profile(user, &password, reset_required)
            .await
            .map_err(|e| {
                e.context(format!("Error creating IAM User Login Profile for {:?}", user))
            })?;

        let mut state = State::existing(resource.id.clone(), resource.attributes.clone())
            .with_identifier(profile.user_name.clone())
            .with_attribute("id", profile.user_name);
        if let Some((fingerprint, ciphertext)) = encrypted {
            state = state
                .with_attribute("key_fingerprint", fingerprint)
                .with_attribute("encrypted_password", ciphertext);
        }
        self.refresh(&state, true).await
    }

    async fn read(&self, current: &State) -> ProviderResult<State> {
        self.refresh(current, false).await
    }

    async fn delete(&self, current: &State) -> ProviderResult<()> {
        let user = user_name(current)?;
        log::debug!("deleting IAM User Login Profile ({})", user);

        let retryable = on_code(ENTITY_TEMPORARILY_UNMODIFIABLE);
        let result = retry_until(RetryPolicy::propagation(), retryable, || {
            self.iam.delete_login_profile(user)
        })
        .await;

        match result {
            Err(e) if e.is_code(NO_SUCH_ENTITY) => Ok(()),
            other => other.map_err(|e| {
                e.context(format!("error deleting IAM User Login Profile ({})", user))
            }),
        }
    }
}
