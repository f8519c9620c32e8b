//! awsutils AWS Provider
//!
//! Utility resources that fill gaps in the main AWS provider: default VPC
//! teardown, organization member enrollment for GuardDuty, Macie2 and
//! Security Hub, Security Hub control disablement and IAM login profiles,
//! plus caller identity and Client VPN export data sources.

pub mod config;
pub mod conns;
pub mod encryption;
pub mod endpoints;
pub mod error;
pub mod flex;
pub mod names;
pub mod password;
pub mod provider;
pub mod services;
pub mod validation;

#[cfg(test)]
mod testing;

use std::collections::HashMap;

use awsutils_core::resource::Value;

pub use config::{PROVIDER_NAME, ProviderConfig};
pub use conns::AwsClient;
pub use endpoints::{Endpoints, Environment, ProcessEnvironment};
pub use error::{ConfigError, ConfigErrors, ConfigResult};
pub use provider::AwsUtilsProvider;

/// Decode provider attributes, connect to AWS and register every handler
pub async fn configure(
    attributes: &HashMap<String, Value>,
    env: &impl Environment,
) -> ConfigResult<AwsUtilsProvider> {
    let config = ProviderConfig::from_attributes(attributes, env)?;
    let client = AwsClient::build(&config).await?;
    Ok(AwsUtilsProvider::from_client(&client))
}

#[cfg(test)]
mod tests {
    use super::*;
    use awsutils_core::provider::{Provider, ResourceKind};

    #[test]
    fn registers_every_type() {
        let provider = AwsUtilsProvider::unconfigured();
        let types = provider.resource_types();
        let names: Vec<_> = types.iter().map(|t| (t.name(), t.kind())).collect();

        assert_eq!(
            names,
            vec![
                ("awsutils_caller_identity", ResourceKind::DataSource),
                ("awsutils_default_vpc_deletion", ResourceKind::Resource),
                ("awsutils_ec2_client_vpn_export_client_config", ResourceKind::DataSource),
                ("awsutils_guardduty_organization_settings", ResourceKind::Resource),
                ("awsutils_iam_user_login_profile", ResourceKind::Resource),
                ("awsutils_macie2_organization_settings", ResourceKind::Resource),
                ("awsutils_security_hub_control_disablement", ResourceKind::Resource),
                ("awsutils_security_hub_organization_settings", ResourceKind::Resource),
            ]
        );
    }

    #[tokio::test]
    async fn invalid_configuration_fails_before_connecting() {
        let mut attributes = HashMap::new();
        attributes.insert("region".to_string(), Value::from("nowhere"));
        attributes.insert("max_retries".to_string(), Value::from("many"));

        let err = configure(&attributes, &HashMap::<String, String>::new())
            .await
            .unwrap_err();
        assert!(!err.errors().is_empty());
    }
}
