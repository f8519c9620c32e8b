//! Error types
//!
//! Configuration problems are detected before any API call and reported
//! together. API failures are mapped into `ProviderError`, keeping the
//! service error code so handlers can treat "not found" codes as absence.

use std::fmt;

use aws_sdk_sts::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use awsutils_core::provider::ProviderError;
use awsutils_core::schema::TypeError;

/// Provider configuration error
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid provider configuration: {0}")]
    Schema(#[from] TypeError),

    #[error("{attribute}: {message}")]
    InvalidAttribute { attribute: String, message: String },

    #[error("failed to assign endpoint ({alias}): unknown service")]
    UnknownEndpointAlias { alias: String },

    #[error("invalid AWS Region: {0}")]
    InvalidRegion(String),

    #[error("error reading custom CA bundle ({path}): {source}")]
    CaBundle {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("error configuring credentials: {0}")]
    Credentials(String),

    #[error("AWS account ID not allowed: {0}")]
    AccountNotAllowed(String),

    #[error("AWS account ID not found for provider; account ID restrictions cannot be verified")]
    AccountUnknown,
}

impl ConfigError {
    pub fn invalid(attribute: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidAttribute {
            attribute: attribute.into(),
            message: message.into(),
        }
    }
}

/// Every configuration error found while decoding, in discovery order
#[derive(Debug)]
pub struct ConfigErrors(pub Vec<ConfigError>);

impl ConfigErrors {
    pub fn errors(&self) -> &[ConfigError] {
        &self.0
    }
}

impl fmt::Display for ConfigErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.as_slice() {
            [single] => write!(f, "{}", single),
            errors => {
                write!(f, "{} configuration errors:", errors.len())?;
                for e in errors {
                    write!(f, "\n  - {}", e)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ConfigErrors {}

impl From<ConfigError> for ConfigErrors {
    fn from(e: ConfigError) -> Self {
        Self(vec![e])
    }
}

impl From<ConfigErrors> for ProviderError {
    fn from(e: ConfigErrors) -> Self {
        ProviderError::new(e.to_string()).with_cause(e)
    }
}

impl From<ConfigError> for ProviderError {
    fn from(e: ConfigError) -> Self {
        ProviderError::new(e.to_string()).with_cause(e)
    }
}

pub type ConfigResult<T> = Result<T, ConfigErrors>;

/// Map an SDK failure into a `ProviderError` with context, keeping the
/// service error code when the service returned one.
pub(crate) fn api_error<E, R>(context: impl fmt::Display, err: SdkError<E, R>) -> ProviderError
where
    E: ProvideErrorMetadata + std::error::Error + Send + Sync + 'static,
    R: fmt::Debug + Send + Sync + 'static,
{
    let code = err.as_service_error().and_then(|e| e.code()).map(str::to_string);
    let mut error = ProviderError::new(format!("{}: {}", context, DisplayErrorContext(&err)));
    if let Some(code) = code {
        error = error.with_code(code);
    }
    error.with_cause(err)
}
