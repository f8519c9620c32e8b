//! Provider registry
//!
//! `AwsUtilsProvider` owns one handler per resource and data-source type and
//! dispatches lifecycle calls to them by type name.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use awsutils_core::provider::{
    BoxFuture, Provider, ProviderError, ProviderResult, ResourceKind, ResourceType,
};
use awsutils_core::resource::{Resource, ResourceId, State};
use awsutils_core::schema::ResourceSchema;

use crate::config::PROVIDER_NAME;
use crate::conns::{AwsClient, Services, TransportSettings};
use crate::encryption::{KeyResolver, KeybaseResolver};
use crate::services::ec2::client_vpn_export::ClientVpnExportClientConfig;
use crate::services::ec2::default_vpc_deletion::DefaultVpcDeletion;
use crate::services::guardduty::organization_settings::GuardDutyOrganizationSettings;
use crate::services::iam::login_profile::UserLoginProfile;
use crate::services::macie2::organization_settings::Macie2OrganizationSettings;
use crate::services::securityhub::control_disablement::ControlDisablement;
use crate::services::securityhub::organization_settings::SecurityHubOrganizationSettings;
use crate::services::sts::caller_identity::CallerIdentity;

/// Lifecycle of a managed resource type
#[async_trait]
pub trait ResourceHandler: ResourceType {
    async fn create(&self, resource: &Resource) -> ProviderResult<State>;

    async fn read(&self, current: &State) -> ProviderResult<State>;

    /// Types whose inputs are all force-new never reach this.
    async fn update(&self, from: &State, _to: &Resource) -> ProviderResult<State> {
        Err(ProviderError::new(format!(
            "{} does not support in-place updates",
            self.name()
        ))
        .for_resource(from.id.clone()))
    }

    async fn delete(&self, current: &State) -> ProviderResult<()>;
}

/// A read-only data source type
#[async_trait]
pub trait DataSourceHandler: ResourceType {
    async fn read(&self, resource: &Resource) -> ProviderResult<State>;
}

struct Described {
    name: &'static str,
    kind: ResourceKind,
    schema: ResourceSchema,
}

impl ResourceType for Described {
    fn name(&self) -> &'static str {
        self.name
    }

    fn kind(&self) -> ResourceKind {
        self.kind
    }

    fn schema(&self) -> ResourceSchema {
        self.schema.clone()
    }
}

/// The awsutils provider
pub struct AwsUtilsProvider {
    resources: HashMap<&'static str, Arc<dyn ResourceHandler>>,
    data_sources: HashMap<&'static str, Arc<dyn DataSourceHandler>>,
}

impl AwsUtilsProvider {
    pub fn new() -> Self {
        Self {
            resources: HashMap::new(),
            data_sources: HashMap::new(),
        }
    }

    /// Register every handler over a connected client
    pub fn from_client(client: &AwsClient) -> Self {
        Self::from_services(&client.services, client.transport.clone())
    }

    /// Every handler with schemas available but no usable AWS connection
    pub fn unconfigured() -> Self {
        Self::from_services(&Services::unconfigured(), TransportSettings::default())
    }

    pub fn from_services(services: &Services, transport: TransportSettings) -> Self {
        let keys: Arc<dyn KeyResolver> = Arc::new(KeybaseResolver::new(transport));

        Self::new()
            .with_resource(DefaultVpcDeletion::new(services.ec2.clone()))
            .with_resource(GuardDutyOrganizationSettings::new(services.guardduty.clone()))
            .with_resource(Macie2OrganizationSettings::new(services.macie2.clone()))
            .with_resource(SecurityHubOrganizationSettings::new(services.securityhub.clone()))
            .with_resource(ControlDisablement::new(services.securityhub.clone()))
            .with_resource(UserLoginProfile::new(services.iam.clone(), keys))
            .with_data_source(CallerIdentity::new(services.sts.clone()))
            .with_data_source(ClientVpnExportClientConfig::new(services.ec2.clone()))
    }

    pub fn with_resource(mut self, handler: impl ResourceHandler + 'static) -> Self {
        self.resources.insert(handler.name(), Arc::new(handler));
        self
    }

    pub fn with_data_source(mut self, handler: impl DataSourceHandler + 'static) -> Self {
        self.data_sources.insert(handler.name(), Arc::new(handler));
        self
    }

    /// Schema of a resource or data-source type
    pub fn schema_for(&self, type_name: &str) -> Option<ResourceSchema> {
        self.resources
            .get(type_name)
            .map(|h| h.schema())
            .or_else(|| self.data_sources.get(type_name).map(|h| h.schema()))
    }

    fn resource(&self, id: &ResourceId) -> ProviderResult<&Arc<dyn ResourceHandler>> {
        self.resources.get(id.resource_type.as_str()).ok_or_else(|| {
            ProviderError::new(format!("Unknown resource type: {}", id.resource_type))
                .for_resource(id.clone())
        })
    }

    fn data_source(&self, id: &ResourceId) -> ProviderResult<&Arc<dyn DataSourceHandler>> {
        self.data_sources.get(id.resource_type.as_str()).ok_or_else(|| {
            ProviderError::new(format!("Unknown data source type: {}", id.resource_type))
                .for_resource(id.clone())
        })
    }
}

impl std::fmt::Debug for AwsUtilsProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut resources: Vec<_> = self.resources.keys().collect();
        resources.sort();
        let mut data_sources: Vec<_> = self.data_sources.keys().collect();
        data_sources.sort();
        f.debug_struct("AwsUtilsProvider")
            .field("resources", &resources)
            .field("data_sources", &data_sources)
            .finish()
    }
}

impl Default for AwsUtilsProvider {
    fn default() -> Self {
        Self::new()
    }
}

/// Validate attributes and fill in schema defaults
fn prepare(schema: &ResourceSchema, resource: &Resource) -> ProviderResult<Resource> {
    if let Err(errors) = schema.validate(&resource.attributes) {
        let messages: Vec<String> = errors.iter().map(ToString::to_string).collect();
        return Err(
            ProviderError::new(format!("invalid configuration: {}", messages.join("; ")))
                .for_resource(resource.id.clone()),
        );
    }
    let mut prepared = resource.clone();
    prepared.attributes = schema.with_defaults(&resource.attributes);
    Ok(prepared)
}

fn bind(err: ProviderError, id: &ResourceId) -> ProviderError {
    if err.resource_id.is_some() {
        err
    } else {
        err.for_resource(id.clone())
    }
}

impl Provider for AwsUtilsProvider {
    fn name(&self) -> &'static str {
        PROVIDER_NAME
    }

    fn resource_types(&self) -> Vec<Box<dyn ResourceType>> {
        let mut types: Vec<Box<dyn ResourceType>> = self
            .resources
            .values()
            .map(|h| {
                Box::new(Described {
                    name: h.name(),
                    kind: ResourceKind::Resource,
                    schema: h.schema(),
                }) as Box<dyn ResourceType>
            })
            .chain(self.data_sources.values().map(|h| {
                Box::new(Described {
                    name: h.name(),
                    kind: ResourceKind::DataSource,
                    schema: h.schema(),
                }) as Box<dyn ResourceType>
            }))
            .collect();
        types.sort_by_key(|t| t.name());
        types
    }

    fn read(&self, current: &State) -> BoxFuture<'_, ProviderResult<State>> {
        let current = current.clone();
        Box::pin(async move {
            let handler = self.resource(&current.id)?;
            handler.read(&current).await.map_err(|e| bind(e, &current.id))
        })
    }

    fn create(&self, resource: &Resource) -> BoxFuture<'_, ProviderResult<State>> {
        let resource = resource.clone();
        Box::pin(async move {
            let handler = self.resource(&resource.id)?;
            let resource = prepare(&handler.schema(), &resource)?;
            handler.create(&resource).await.map_err(|e| bind(e, &resource.id))
        })
    }

    fn update(&self, from: &State, to: &Resource) -> BoxFuture<'_, ProviderResult<State>> {
        let from = from.clone();
        let to = to.clone();
        Box::pin(async move {
            let handler = self.resource(&to.id)?;
            let to = prepare(&handler.schema(), &to)?;
            handler.update(&from, &to).await.map_err(|e| bind(e, &to.id))
        })
    }

    fn delete(&self, current: &State) -> BoxFuture<'_, ProviderResult<()>> {
        let current = current.clone();
        Box::pin(async move {
            let handler = self.resource(&current.id)?;
            handler.delete(&current).await.map_err(|e| bind(e, &current.id))
        })
    }

    fn read_data(&self, resource: &Resource) -> BoxFuture<'_, ProviderResult<State>> {
        let resource = resource.clone();
        Box::pin(async move {
            let handler = self.data_source(&resource.id)?;
            let resource = prepare(&handler.schema(), &resource)?;
            handler.read(&resource).await.map_err(|e| bind(e, &resource.id))
        })
    }
}
