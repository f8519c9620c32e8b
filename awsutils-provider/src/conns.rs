//! AWS client construction
//!
//! Turns a decoded [`ProviderConfig`] into an [`AwsClient`]: one shared SDK
//! configuration with the resolved credentials, a client per service with
//! its endpoint override applied, and the caller's account and partition.

use std::sync::Arc;
use std::time::SystemTime;

use aws_config::environment::EnvironmentVariableCredentialsProvider;
use aws_config::imds::client::EndpointMode;
use aws_config::imds::credentials::ImdsCredentialsProvider;
use aws_config::meta::credentials::CredentialsProviderChain;
use aws_config::profile::ProfileFileCredentialsProvider;
use aws_config::retry::RetryConfig;
use aws_config::{BehaviorVersion, Region, SdkConfig};
use aws_credential_types::Credentials;
use aws_credential_types::provider::SharedCredentialsProvider;

use crate::config::{
    AssumeRole, AssumeRoleWithWebIdentity, DefaultTags, IgnoreTags, MetadataEndpointMode,
    PROVIDER_NAME, ProviderConfig,
};
use crate::endpoints::Endpoints;
use crate::error::{ConfigError, ConfigErrors, ConfigResult};
use crate::services::ec2::api::{Ec2Api, SdkEc2};
use crate::services::guardduty::api::{GuardDutyApi, SdkGuardDuty};
use crate::services::iam::api::{IamApi, SdkIam};
use crate::services::macie2::api::{Macie2Api, SdkMacie2};
use crate::services::securityhub::api::{SdkSecurityHub, SecurityHubApi};
use crate::services::sts::api::{SdkSts, StsApi};
use crate::validation;

/// Service seams shared by every handler
#[derive(Clone)]
pub struct Services {
    pub ec2: Arc<dyn Ec2Api>,
    pub iam: Arc<dyn IamApi>,
    pub sts: Arc<dyn StsApi>,
    pub securityhub: Arc<dyn SecurityHubApi>,
    pub guardduty: Arc<dyn GuardDutyApi>,
    pub macie2: Arc<dyn Macie2Api>,
}

impl Services {
    /// SDK-backed services with no region or credentials. Any call fails.
    pub fn unconfigured() -> Self {
        let sdk_config = SdkConfig::builder()
            .behavior_version(BehaviorVersion::latest())
            .build();
        Self::from_sdk_config(&sdk_config, &Endpoints::new())
    }

    /// Build SDK-backed services, applying endpoint overrides per service
    pub fn from_sdk_config(sdk_config: &SdkConfig, endpoints: &Endpoints) -> Self {
        let endpoint = |key: &str| endpoints.get(key).cloned();

        let ec2 = aws_sdk_ec2::config::Builder::from(sdk_config)
            .set_endpoint_url(endpoint("ec2"))
            .build();
        let iam = aws_sdk_iam::config::Builder::from(sdk_config)
            .set_endpoint_url(endpoint("iam"))
            .build();
        let sts = aws_sdk_sts::config::Builder::from(sdk_config)
            .set_endpoint_url(endpoint("sts"))
            .build();
        let securityhub = aws_sdk_securityhub::config::Builder::from(sdk_config)
            .set_endpoint_url(endpoint("securityhub"))
            .build();
        let guardduty = aws_sdk_guardduty::config::Builder::from(sdk_config)
            .set_endpoint_url(endpoint("guardduty"))
            .build();
        let macie2 = aws_sdk_macie2::config::Builder::from(sdk_config)
            .set_endpoint_url(endpoint("macie2"))
            .build();

        Self {
            ec2: Arc::new(SdkEc2::new(aws_sdk_ec2::Client::from_conf(ec2))),
            iam: Arc::new(SdkIam::new(aws_sdk_iam::Client::from_conf(iam))),
            sts: Arc::new(SdkSts::new(aws_sdk_sts::Client::from_conf(sts))),
            securityhub: Arc::new(SdkSecurityHub::new(aws_sdk_securityhub::Client::from_conf(
                securityhub,
            ))),
            guardduty: Arc::new(SdkGuardDuty::new(aws_sdk_guardduty::Client::from_conf(
                guardduty,
            ))),
            macie2: Arc::new(SdkMacie2::new(aws_sdk_macie2::Client::from_conf(macie2))),
        }
    }
}

/// TLS and proxy settings for HTTP clients the provider builds itself
#[derive(Debug, Clone, Default)]
pub struct TransportSettings {
    pub ca_certificates: Vec<reqwest::Certificate>,
    pub http_proxy: Option<url::Url>,
    pub insecure: bool,
}

impl TransportSettings {
    /// Read the CA bundle and parse the proxy address
    pub fn from_config(config: &ProviderConfig) -> ConfigResult<Self> {
        let mut errors = Vec::new();
        let mut settings = TransportSettings {
            insecure: config.insecure,
            ..Default::default()
        };

        if let Some(path) = &config.custom_ca_bundle {
            match std::fs::read(path) {
                Ok(pem) => match reqwest::Certificate::from_pem_bundle(&pem) {
                    Ok(certs) => settings.ca_certificates = certs,
                    Err(e) => errors.push(ConfigError::invalid("custom_ca_bundle", e.to_string())),
                },
                Err(source) => errors.push(ConfigError::CaBundle {
                    path: path.clone(),
                    source,
                }),
            }
        }

        if let Some(proxy) = &config.http_proxy {
            match url::Url::parse(proxy) {
                Ok(url) => settings.http_proxy = Some(url),
                Err(e) => errors.push(ConfigError::invalid(
                    "http_proxy",
                    format!("{:?} is not a valid URL: {}", proxy, e),
                )),
            }
        }

        if errors.is_empty() {
            Ok(settings)
        } else {
            Err(ConfigErrors(errors))
        }
    }

    /// An HTTP client honouring these settings
    pub fn http_client(&self) -> reqwest::Result<reqwest::Client> {
        let mut builder = reqwest::Client::builder()
            .user_agent(concat!("awsutils/", env!("CARGO_PKG_VERSION")))
            .danger_accept_invalid_certs(self.insecure);
        for cert in &self.ca_certificates {
            builder = builder.add_root_certificate(cert.clone());
        }
        if let Some(proxy) = &self.http_proxy {
            builder = builder.proxy(reqwest::Proxy::all(proxy.as_str())?);
        }
        builder.build()
    }
}

/// Everything a handler needs to talk to AWS
#[derive(Clone)]
pub struct AwsClient {
    pub region: Option<String>,
    pub partition: String,
    pub account_id: Option<String>,
    pub endpoints: Endpoints,
    pub default_tags: Option<DefaultTags>,
    pub ignore_tags: Option<IgnoreTags>,
    pub s3_use_path_style: bool,
    pub transport: TransportSettings,
    pub services: Services,
}

impl std::fmt::Debug for AwsClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AwsClient")
            .field("region", &self.region)
            .field("partition", &self.partition)
            .field("account_id", &self.account_id)
            .field("endpoints", &self.endpoints)
            .finish_non_exhaustive()
    }
}

impl AwsClient {
    /// Load credentials, assume any configured role and connect every service
    pub async fn build(config: &ProviderConfig) -> ConfigResult<Self> {
        let transport = TransportSettings::from_config(config)?;
        let sdk_config = load_sdk_config(config).await?;
        let sdk_config = assume_roles(config, sdk_config).await?;
        let services = Services::from_sdk_config(&sdk_config, &config.endpoints);

        let region = sdk_config.region().map(|r| r.to_string());
        let mut client = Self::connect(config, services).await?;
        client.region = region.or(client.region);
        if client.account_id.is_none() {
            client.partition = partition_for_region(client.region.as_deref()).to_string();
        }
        client.transport = transport;

        log::info!(
            "AWS client configured (region: {}, partition: {})",
            client.region.as_deref().unwrap_or("<unset>"),
            client.partition
        );
        Ok(client)
    }

    /// Finish construction over already-built services: determine the
    /// account and enforce the allowed/forbidden account lists.
    pub async fn connect(config: &ProviderConfig, services: Services) -> ConfigResult<Self> {
        let mut account_id = None;
        let mut partition = partition_for_region(config.region.as_deref()).to_string();

        let validate_credentials = !config.skip_credentials_validation;
        let request_account_id = !config.skip_requesting_account_id;

        // One GetCallerIdentity serves both checks.
        if validate_credentials || request_account_id {
            let identity = services
                .sts
                .caller_identity()
                .await
                .map_err(|e| ConfigError::Credentials(e.to_string()))?;
            if let Ok(arn) = validation::parse_arn(&identity.arn) {
                partition = arn.partition.to_string();
            }
            if request_account_id {
                account_id = Some(identity.account_id).filter(|id| !id.is_empty());
            }
        }

        check_account(
            account_id.as_deref(),
            &config.allowed_account_ids,
            &config.forbidden_account_ids,
        )?;

        Ok(Self {
            region: config.region.clone(),
            partition,
            account_id,
            endpoints: config.endpoints.clone(),
            default_tags: config.default_tags.clone(),
            ignore_tags: config.ignore_tags.clone(),
            s3_use_path_style: config.s3_use_path_style,
            transport: TransportSettings {
                insecure: config.insecure,
                ..Default::default()
            },
            services,
        })
    }
}

/// Enforce account restrictions.
///
/// With a restriction configured, an unknown account is rejected.
pub fn check_account(
    account_id: Option<&str>,
    allowed: &[String],
    forbidden: &[String],
) -> Result<(), ConfigError> {
    if allowed.is_empty() && forbidden.is_empty() {
        return Ok(());
    }

    let Some(account_id) = account_id else {
        return Err(ConfigError::AccountUnknown);
    };

    if !allowed.is_empty() && !allowed.iter().any(|a| a == account_id) {
        return Err(ConfigError::AccountNotAllowed(account_id.to_string()));
    }
    if forbidden.iter().any(|f| f == account_id) {
        return Err(ConfigError::AccountNotAllowed(account_id.to_string()));
    }
    Ok(())
}

/// Partition a region belongs to
pub fn partition_for_region(region: Option<&str>) -> &'static str {
    match region {
        Some(r) if r.starts_with("cn-") => "aws-cn",
        Some(r) if r.starts_with("us-gov-") => "aws-us-gov",
        Some(r) if r.starts_with("us-iso-") => "aws-iso",
        Some(r) if r.starts_with("us-isob-") => "aws-iso-b",
        _ => "aws",
    }
}

fn static_credentials(config: &ProviderConfig) -> Option<Credentials> {
    match (&config.access_key, &config.secret_key) {
        (Some(access_key), Some(secret_key)) => Some(Credentials::new(
            access_key,
            secret_key,
            config.token.clone(),
            None,
            PROVIDER_NAME,
        )),
        _ => None,
    }
}

#[allow(deprecated)]
fn profile_provider(config: &ProviderConfig) -> ProfileFileCredentialsProvider {
    use aws_config::profile::profile_file::{ProfileFileKind, ProfileFiles};

    let mut files = ProfileFiles::builder()
        .include_default_config_file(config.shared_config_files.is_empty())
        .include_default_credentials_file(config.shared_credentials_files.is_empty());
    for path in &config.shared_config_files {
        files = files.with_file(ProfileFileKind::Config, path);
    }
    for path in &config.shared_credentials_files {
        files = files.with_file(ProfileFileKind::Credentials, path);
    }

    let mut builder = ProfileFileCredentialsProvider::builder().profile_files(files.build());
    if let Some(profile) = &config.profile {
        builder = builder.profile_name(profile);
    }
    builder.build()
}

fn imds_provider(config: &ProviderConfig) -> ConfigResult<ImdsCredentialsProvider> {
    let mut client = aws_config::imds::Client::builder();
    if let Some(endpoint) = &config.ec2_metadata_service_endpoint {
        client = client
            .endpoint(endpoint)
            .map_err(|e| ConfigError::invalid("ec2_metadata_service_endpoint", e.to_string()))?;
    }
    if let Some(mode) = config.ec2_metadata_service_endpoint_mode {
        client = client.endpoint_mode(match mode {
            MetadataEndpointMode::IPv4 => EndpointMode::IpV4,
            MetadataEndpointMode::IPv6 => EndpointMode::IpV6,
        });
    }
    Ok(ImdsCredentialsProvider::builder()
        .imds_client(client.build())
        .build())
}

fn credentials_provider(config: &ProviderConfig) -> ConfigResult<SharedCredentialsProvider> {
    if let Some(credentials) = static_credentials(config) {
        log::debug!("using static credentials from provider configuration");
        return Ok(SharedCredentialsProvider::new(credentials));
    }

    let mut chain = CredentialsProviderChain::first_try(
        "Environment",
        EnvironmentVariableCredentialsProvider::new(),
    )
    .or_else("Profile", profile_provider(config));

    if config.metadata_api.is_disabled() {
        log::debug!("instance metadata credentials disabled");
    } else {
        chain = chain.or_else("Ec2InstanceMetadata", imds_provider(config)?);
    }

    Ok(SharedCredentialsProvider::new(chain))
}

async fn load_sdk_config(config: &ProviderConfig) -> ConfigResult<SdkConfig> {
    let mut loader = aws_config::defaults(BehaviorVersion::latest())
        .credentials_provider(credentials_provider(config)?)
        .retry_config(
            RetryConfig::standard().with_max_attempts(config.max_retries.saturating_add(1)),
        )
        .use_dual_stack(config.use_dualstack_endpoint)
        .use_fips(config.use_fips_endpoint);
    if let Some(region) = &config.region {
        loader = loader.region(Region::new(region.clone()));
    }
    if let Some(profile) = &config.profile {
        loader = loader.profile_name(profile);
    }
    Ok(loader.load().await)
}

fn sts_client(config: &ProviderConfig, sdk_config: &SdkConfig) -> aws_sdk_sts::Client {
    let mut builder = aws_sdk_sts::config::Builder::from(sdk_config)
        .set_endpoint_url(config.endpoints.get("sts").cloned());
    if let Some(region) = &config.sts_region {
        builder = builder.region(Region::new(region.clone()));
    }
    aws_sdk_sts::Client::from_conf(builder.build())
}

fn session_name(configured: &Option<String>) -> String {
    configured
        .clone()
        .unwrap_or_else(|| format!("{}-{}", PROVIDER_NAME, uuid::Uuid::new_v4().simple()))
}

fn duration_seconds(duration: Option<std::time::Duration>) -> Option<i32> {
    duration.and_then(|d| i32::try_from(d.as_secs()).ok())
}

fn policy_descriptors(arns: &[String]) -> Option<Vec<aws_sdk_sts::types::PolicyDescriptorType>> {
    if arns.is_empty() {
        return None;
    }
    Some(
        arns.iter()
            .map(|arn| aws_sdk_sts::types::PolicyDescriptorType::builder().arn(arn).build())
            .collect(),
    )
}

fn session_credentials(
    credentials: Option<&aws_sdk_sts::types::Credentials>,
    role_arn: &str,
) -> ConfigResult<SharedCredentialsProvider> {
    let credentials = credentials.ok_or_else(|| {
        ConfigError::Credentials(format!("no credentials returned assuming role {}", role_arn))
    })?;
    let expiry = SystemTime::try_from(*credentials.expiration()).ok();
    Ok(SharedCredentialsProvider::new(Credentials::new(
        credentials.access_key_id(),
        credentials.secret_access_key(),
        Some(credentials.session_token().to_string()),
        expiry,
        PROVIDER_NAME,
    )))
}

async fn assume_role_with_web_identity(
    config: &ProviderConfig,
    sdk_config: SdkConfig,
    role: &AssumeRoleWithWebIdentity,
) -> ConfigResult<SdkConfig> {
    let Some(role_arn) = &role.role_arn else {
        return Ok(sdk_config);
    };

    let token = match (&role.web_identity_token, &role.web_identity_token_file) {
        (Some(token), _) => token.clone(),
        (None, Some(path)) => tokio::fs::read_to_string(path).await.map_err(|e| {
            ConfigError::Credentials(format!(
                "error reading web identity token file ({}): {}",
                path, e
            ))
        })?,
        (None, None) => {
            return Err(ConfigError::Credentials(
                "assume_role_with_web_identity requires a token or token file".to_string(),
            )
            .into());
        }
    };

    log::debug!("assuming role {} with web identity", role_arn);
    let output = sts_client(config, &sdk_config)
        .assume_role_with_web_identity()
        .role_arn(role_arn)
        .role_session_name(session_name(&role.session_name))
        .web_identity_token(token.trim())
        .set_duration_seconds(duration_seconds(role.duration))
        .set_policy(role.policy.clone())
        .set_policy_arns(policy_descriptors(&role.policy_arns))
        .send()
        .await
        .map_err(|e| {
            ConfigError::Credentials(format!(
                "error assuming role {} with web identity: {}",
                role_arn,
                aws_sdk_sts::error::DisplayErrorContext(&e)
            ))
        })?;

    let credentials = session_credentials(output.credentials(), role_arn)?;
    Ok(sdk_config.to_builder().credentials_provider(credentials).build())
}

async fn assume_role(
    config: &ProviderConfig,
    sdk_config: SdkConfig,
    role: &AssumeRole,
) -> ConfigResult<SdkConfig> {
    let Some(role_arn) = &role.role_arn else {
        return Ok(sdk_config);
    };

    let tags = role
        .tags
        .iter()
        .map(|(key, value)| {
            aws_sdk_sts::types::Tag::builder()
                .key(key)
                .value(value)
                .build()
                .map_err(|e| ConfigError::invalid("assume_role.tags", e.to_string()))
        })
        .collect::<Result<Vec<_>, _>>()?;

    log::debug!("assuming role {}", role_arn);
    let output = sts_client(config, &sdk_config)
        .assume_role()
        .role_arn(role_arn)
        .role_session_name(session_name(&role.session_name))
        .set_duration_seconds(duration_seconds(role.duration))
        .set_external_id(role.external_id.clone())
        .set_policy(role.policy.clone())
        .set_policy_arns(policy_descriptors(&role.policy_arns))
        .set_tags(Some(tags).filter(|t| !t.is_empty()))
        .set_transitive_tag_keys(
            Some(role.transitive_tag_keys.clone()).filter(|k| !k.is_empty()),
        )
        .send()
        .await
        .map_err(|e| {
            ConfigError::Credentials(format!(
                "error assuming role {}: {}",
                role_arn,
                aws_sdk_sts::error::DisplayErrorContext(&e)
            ))
        })?;

    let credentials = session_credentials(output.credentials(), role_arn)?;
    Ok(sdk_config.to_builder().credentials_provider(credentials).build())
}

/// Web identity first, then a regular role assumption on top of it
async fn assume_roles(config: &ProviderConfig, sdk_config: SdkConfig) -> ConfigResult<SdkConfig> {
    let mut sdk_config = sdk_config;
    if let Some(role) = &config.assume_role_with_web_identity {
        sdk_config = assume_role_with_web_identity(config, sdk_config, role).await?;
    }
    if let Some(role) = &config.assume_role {
        sdk_config = assume_role(config, sdk_config, role).await?;
    }
    Ok(sdk_config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeSts, fake_services};

    fn ids(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn no_restrictions_accepts_anything() {
        assert!(check_account(None, &[], &[]).is_ok());
        assert!(check_account(Some("123456789012"), &[], &[]).is_ok());
    }

    #[test]
    fn allowed_list_enforced() {
        let allowed = ids(&["111111111111"]);
        assert!(check_account(Some("111111111111"), &allowed, &[]).is_ok());
        assert!(matches!(
            check_account(Some("222222222222"), &allowed, &[]),
            Err(ConfigError::AccountNotAllowed(id)) if id == "222222222222"
        ));
    }

    #[test]
    fn forbidden_list_enforced() {
        let forbidden = ids(&["222222222222"]);
        assert!(check_account(Some("111111111111"), &[], &forbidden).is_ok());
        assert!(check_account(Some("222222222222"), &[], &forbidden).is_err());
    }

    #[test]
    fn unknown_account_fails_closed() {
        let allowed = ids(&["111111111111"]);
        assert!(matches!(
            check_account(None, &allowed, &[]),
            Err(ConfigError::AccountUnknown)
        ));
        assert!(check_account(None, &[], &allowed).is_err());
    }

    #[test]
    fn partitions_from_region() {
        assert_eq!(partition_for_region(Some("us-east-1")), "aws");
        assert_eq!(partition_for_region(Some("cn-north-1")), "aws-cn");
        assert_eq!(partition_for_region(Some("us-gov-west-1")), "aws-us-gov");
        assert_eq!(partition_for_region(None), "aws");
    }

    #[tokio::test]
    async fn connect_records_account_and_partition() {
        let sts = FakeSts::new("123456789012", "arn:aws-cn:iam::123456789012:user/ci");
        let config = ProviderConfig {
            region: Some("cn-north-1".to_string()),
            allowed_account_ids: ids(&["123456789012"]),
            ..Default::default()
        };

        let client = AwsClient::connect(&config, fake_services(sts.clone()))
            .await
            .unwrap();

        assert_eq!(client.account_id.as_deref(), Some("123456789012"));
        assert_eq!(client.partition, "aws-cn");
        assert_eq!(sts.calls(), 1);
    }

    #[tokio::test]
    async fn connect_rejects_forbidden_account() {
        let sts = FakeSts::new("123456789012", "arn:aws:iam::123456789012:user/ci");
        let config = ProviderConfig {
            forbidden_account_ids: ids(&["123456789012"]),
            ..Default::default()
        };

        let err = AwsClient::connect(&config, fake_services(sts)).await.unwrap_err();
        assert!(err.to_string().contains("not allowed"));
    }

    #[tokio::test]
    async fn skipping_account_lookup_with_restrictions_fails_closed() {
        let sts = FakeSts::new("123456789012", "arn:aws:iam::123456789012:user/ci");
        let config = ProviderConfig {
            skip_requesting_account_id: true,
            allowed_account_ids: ids(&["123456789012"]),
            ..Default::default()
        };

        let err = AwsClient::connect(&config, fake_services(sts.clone()))
            .await
            .unwrap_err();
        assert!(matches!(err.errors(), [ConfigError::AccountUnknown]));
        assert_eq!(sts.calls(), 1);
    }

    #[tokio::test]
    async fn skipping_validation_still_looks_up_account() {
        let sts = FakeSts::new("123456789012", "arn:aws:iam::123456789012:user/ci");
        let config = ProviderConfig {
            skip_credentials_validation: true,
            allowed_account_ids: ids(&["123456789012"]),
            ..Default::default()
        };

        let client = AwsClient::connect(&config, fake_services(sts.clone()))
            .await
            .unwrap();
        assert_eq!(client.account_id.as_deref(), Some("123456789012"));
        assert_eq!(sts.calls(), 1);
    }

    #[tokio::test]
    async fn skipping_both_lookups_makes_no_calls() {
        let sts = FakeSts::new("123456789012", "arn:aws:iam::123456789012:user/ci");
        let config = ProviderConfig {
            skip_credentials_validation: true,
            skip_requesting_account_id: true,
            region: Some("us-gov-west-1".to_string()),
            ..Default::default()
        };

        let client = AwsClient::connect(&config, fake_services(sts.clone()))
            .await
            .unwrap();
        assert_eq!(client.account_id, None);
        assert_eq!(client.partition, "aws-us-gov");
        assert_eq!(sts.calls(), 0);
    }

    #[tokio::test]
    async fn caller_identity_failure_is_a_credentials_error() {
        let sts = FakeSts::failing("ExpiredToken");
        let err = AwsClient::connect(&ProviderConfig::default(), fake_services(sts))
            .await
            .unwrap_err();
        assert!(matches!(err.errors(), [ConfigError::Credentials(_)]));
    }

    #[test]
    fn transport_settings_validated() {
        let config = ProviderConfig {
            custom_ca_bundle: Some("/nonexistent/ca.pem".to_string()),
            http_proxy: Some("not a url".to_string()),
            ..Default::default()
        };
        let err = TransportSettings::from_config(&config).unwrap_err();
        assert_eq!(err.errors().len(), 2);
        assert!(matches!(err.errors()[0], ConfigError::CaBundle { .. }));

        let config = ProviderConfig {
            http_proxy: Some("http://proxy.internal:3128".to_string()),
            insecure: true,
            ..Default::default()
        };
        let settings = TransportSettings::from_config(&config).unwrap();
        assert_eq!(
            settings.http_proxy.as_ref().map(|u| u.host_str()),
            Some(Some("proxy.internal"))
        );
        assert!(settings.insecure);
        assert!(settings.http_client().is_ok());
    }

    #[test]
    fn static_keys_need_both_halves() {
        let config = ProviderConfig {
            access_key: Some("AKIDEXAMPLE".to_string()),
            ..Default::default()
        };
        assert!(static_credentials(&config).is_none());

        let config = ProviderConfig {
            access_key: Some("AKIDEXAMPLE".to_string()),
            secret_key: Some("secret".to_string()),
            token: Some("session".to_string()),
            ..Default::default()
        };
        let creds = static_credentials(&config).unwrap();
        assert_eq!(creds.access_key_id(), "AKIDEXAMPLE");
        assert_eq!(creds.session_token(), Some("session"));
    }

    #[test]
    fn default_session_name_is_unique() {
        let a = session_name(&None);
        let b = session_name(&None);
        assert!(a.starts_with("awsutils-"));
        assert_ne!(a, b);
        assert_eq!(session_name(&Some("ci".to_string())), "ci");
    }
}
