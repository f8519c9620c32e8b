//! awsutils_ec2_client_vpn_export_client_config data source

use std::sync::Arc;

use async_trait::async_trait;
use awsutils_core::provider::{ProviderError, ProviderResult, ResourceKind, ResourceType};
use awsutils_core::resource::{Resource, State};
use awsutils_core::schema::{AttributeSchema, AttributeType, ResourceSchema, types};

use super::api::Ec2Api;
use crate::provider::DataSourceHandler;

pub const TYPE_NAME: &str = "awsutils_ec2_client_vpn_export_client_config";

pub struct ClientVpnExportClientConfig {
    ec2: Arc<dyn Ec2Api>,
}

impl ClientVpnExportClientConfig {
    pub fn new(ec2: Arc<dyn Ec2Api>) -> Self {
        Self { ec2 }
    }
}

impl ResourceType for ClientVpnExportClientConfig {
    fn name(&self) -> &'static str {
        TYPE_NAME
    }

    fn kind(&self) -> ResourceKind {
        ResourceKind::DataSource
    }

    fn schema(&self) -> ResourceSchema {
        ResourceSchema::new(TYPE_NAME)
            .with_description("Exports the client configuration of a Client VPN endpoint.")
            .attribute(
                AttributeSchema::new("id", types::non_empty_string())
                    .required()
                    .with_description("ID of the Client VPN endpoint."),
            )
            .attribute(
                AttributeSchema::new("client_configuration", AttributeType::String)
                    .computed()
                    .with_description(
                        "The contents of the Client VPN endpoint configuration file.",
                    ),
            )
    }
}

#[async_trait]
impl DataSourceHandler for ClientVpnExportClientConfig {
    async fn read(&self, resource: &Resource) -> ProviderResult<State> {
        let endpoint_id = resource
            .get_str("id")
            .ok_or_else(|| ProviderError::new("id is required"))?;

        let configuration = self
            .ec2
            .export_client_vpn_client_configuration(endpoint_id)
            .await
            .map_err(|e| {
                e.context(format!(
                    "error exporting client configuration of Client VPN endpoint ({})",
                    endpoint_id
                ))
            })?;

        Ok(State::existing(resource.id.clone(), resource.attributes.clone())
            .with_identifier(endpoint_id)
            .with_attribute("client_configuration", configuration.unwrap_or_default()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeEc2;

    #[tokio::test]
    async fn exports_configuration() {
        let ec2 =
            FakeEc2::default().with_client_vpn_configuration("client\nremote cvpn.example 443\n");
        let handler = ClientVpnExportClientConfig::new(Arc::new(ec2.clone()));

        let state = handler
            .read(&Resource::new(TYPE_NAME, "vpn").with_attribute("id", "cvpn-endpoint-0123"))
            .await
            .unwrap();

        assert_eq!(state.identifier.as_deref(), Some("cvpn-endpoint-0123"));
        assert_eq!(
            state.get_str("client_configuration"),
            Some("client\nremote cvpn.example 443\n")
        );
        assert_eq!(ec2.calls(), vec!["ExportClientVpnClientConfiguration cvpn-endpoint-0123"]);
    }

    #[test]
    fn id_is_required() {
        let schema = ClientVpnExportClientConfig::new(Arc::new(FakeEc2::default())).schema();
        assert!(schema.validate(&Default::default()).is_err());
    }
}
