//! Provider configuration
//!
//! The provider block arrives as an untyped attribute map. It is validated
//! against [`provider_schema`] and decoded into a [`ProviderConfig`];
//! every problem found on the way is reported together.

use std::collections::{BTreeMap, HashMap};
use std::time::Duration;

use awsutils_core::resource::Value;
use awsutils_core::schema::{
    AttributeSchema, AttributeType, ResourceSchema, TypeError, blocks_of, types,
};

use crate::endpoints::{self, Endpoints, Environment};
use crate::error::{ConfigError, ConfigErrors, ConfigResult};
use crate::flex;
use crate::validation;

pub const PROVIDER_NAME: &str = "awsutils";

/// Used when `max_retries` is not configured
pub const DEFAULT_MAX_RETRIES: u32 = 25;

/// Whether the instance metadata service may be used for credentials
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MetadataApi {
    #[default]
    Default,
    Enabled,
    Disabled,
}

impl MetadataApi {
    pub fn is_disabled(self) -> bool {
        self == MetadataApi::Disabled
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetadataEndpointMode {
    IPv4,
    IPv6,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AssumeRole {
    pub role_arn: Option<String>,
    pub duration: Option<Duration>,
    pub external_id: Option<String>,
    pub policy: Option<String>,
    pub policy_arns: Vec<String>,
    pub session_name: Option<String>,
    pub tags: BTreeMap<String, String>,
    pub transitive_tag_keys: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AssumeRoleWithWebIdentity {
    pub role_arn: Option<String>,
    pub duration: Option<Duration>,
    pub policy: Option<String>,
    pub policy_arns: Vec<String>,
    pub session_name: Option<String>,
    pub web_identity_token: Option<String>,
    pub web_identity_token_file: Option<String>,
}

/// Tags applied to every taggable resource
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DefaultTags {
    pub tags: BTreeMap<String, String>,
}

/// Tag keys to leave alone when comparing tags
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IgnoreTags {
    pub keys: Vec<String>,
    pub key_prefixes: Vec<String>,
}

/// Typed provider configuration
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderConfig {
    pub access_key: Option<String>,
    pub secret_key: Option<String>,
    pub token: Option<String>,
    pub profile: Option<String>,
    pub shared_config_files: Vec<String>,
    pub shared_credentials_files: Vec<String>,

    pub region: Option<String>,
    pub sts_region: Option<String>,
    pub endpoints: Endpoints,
    pub use_dualstack_endpoint: bool,
    pub use_fips_endpoint: bool,

    pub allowed_account_ids: Vec<String>,
    pub forbidden_account_ids: Vec<String>,

    pub max_retries: u32,
    pub s3_use_path_style: bool,

    pub assume_role: Option<AssumeRole>,
    pub assume_role_with_web_identity: Option<AssumeRoleWithWebIdentity>,

    pub default_tags: Option<DefaultTags>,
    pub ignore_tags: Option<IgnoreTags>,

    pub ec2_metadata_service_endpoint: Option<String>,
    pub ec2_metadata_service_endpoint_mode: Option<MetadataEndpointMode>,
    pub metadata_api: MetadataApi,

    pub custom_ca_bundle: Option<String>,
    pub http_proxy: Option<String>,
    pub insecure: bool,

    pub skip_credentials_validation: bool,
    pub skip_get_ec2_platforms: bool,
    pub skip_region_validation: bool,
    pub skip_requesting_account_id: bool,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            access_key: None,
            secret_key: None,
            token: None,
            profile: None,
            shared_config_files: Vec::new(),
            shared_credentials_files: Vec::new(),
            region: None,
            sts_region: None,
            endpoints: Endpoints::new(),
            use_dualstack_endpoint: false,
            use_fips_endpoint: false,
            allowed_account_ids: Vec::new(),
            forbidden_account_ids: Vec::new(),
            max_retries: DEFAULT_MAX_RETRIES,
            s3_use_path_style: false,
            assume_role: None,
            assume_role_with_web_identity: None,
            default_tags: None,
            ignore_tags: None,
            ec2_metadata_service_endpoint: None,
            ec2_metadata_service_endpoint_mode: None,
            metadata_api: MetadataApi::Default,
            custom_ca_bundle: None,
            http_proxy: None,
            insecure: false,
            skip_credentials_validation: false,
            skip_get_ec2_platforms: false,
            skip_region_validation: false,
            skip_requesting_account_id: false,
        }
    }
}

fn optional(name: &str, attr_type: AttributeType, description: &str) -> AttributeSchema {
    AttributeSchema::new(name, attr_type).with_description(description)
}

fn assume_role_block() -> AttributeType {
    AttributeType::Block {
        attributes: vec![
            optional(
                "duration",
                validation::role_duration(),
                "The duration, between 15 minutes and 12 hours, of the role session.",
            )
            .conflicts_with("duration_seconds"),
            optional(
                "duration_seconds",
                validation::role_duration_seconds(),
                "The duration, in seconds, of the role session.",
            )
            .deprecated("Use assume_role.duration instead")
            .conflicts_with("duration"),
            optional(
                "external_id",
                validation::external_id(),
                "A unique identifier that might be required when you assume a role in another account.",
            ),
            optional(
                "policy",
                types::json_string(),
                "IAM Policy JSON further restricting permissions for the IAM Role being assumed.",
            ),
            optional(
                "policy_arns",
                validation::arn_set(),
                "ARNs of IAM Policies further restricting permissions for the IAM Role being assumed.",
            ),
            optional(
                "role_arn",
                validation::arn(),
                "ARN of an IAM Role to assume prior to making API calls.",
            ),
            optional(
                "session_name",
                validation::session_name(),
                "An identifier for the assumed role session.",
            ),
            optional("tags", types::string_map(), "Assume role session tags."),
            optional(
                "transitive_tag_keys",
                types::string_set(),
                "Assume role session tag keys to pass to any subsequent sessions.",
            ),
        ],
        max_items: Some(1),
    }
}

fn web_identity_block() -> AttributeType {
    AttributeType::Block {
        attributes: vec![
            optional(
                "duration",
                validation::role_duration(),
                "The duration, between 15 minutes and 12 hours, of the role session.",
            ),
            optional(
                "policy",
                types::json_string(),
                "IAM Policy JSON further restricting permissions.",
            ),
            optional(
                "policy_arns",
                validation::arn_set(),
                "ARNs of IAM Policies further restricting permissions.",
            ),
            optional("role_arn", validation::arn(), "ARN of an IAM Role to assume."),
            optional(
                "session_name",
                validation::session_name(),
                "An identifier for the assumed role session.",
            ),
            optional(
                "web_identity_token",
                validation::web_identity_token(),
                "The OAuth 2.0 or OpenID Connect token.",
            ),
            optional(
                "web_identity_token_file",
                AttributeType::String,
                "File containing the OAuth 2.0 or OpenID Connect token.",
            ),
        ],
        max_items: Some(1),
    }
}

/// Schema of the provider block
pub fn provider_schema() -> ResourceSchema {
    ResourceSchema::new(PROVIDER_NAME)
        .with_description("AWS utilities not supported by the official provider")
        .attribute(
            optional("access_key", AttributeType::String, "The access key for API operations.")
                .sensitive(),
        )
        .attribute(
            optional("secret_key", AttributeType::String, "The secret key for API operations.")
                .sensitive(),
        )
        .attribute(
            optional("token", AttributeType::String, "Session token for temporary credentials.")
                .sensitive(),
        )
        .attribute(optional("profile", AttributeType::String, "The profile for API operations."))
        .attribute(optional(
            "shared_config_files",
            types::string_list(),
            "List of paths to shared config files.",
        ))
        .attribute(
            optional(
                "shared_credentials_file",
                AttributeType::String,
                "The path to the shared credentials file.",
            )
            .deprecated("Use shared_credentials_files instead.")
            .conflicts_with("shared_credentials_files"),
        )
        .attribute(
            optional(
                "shared_credentials_files",
                types::string_list(),
                "List of paths to shared credentials files.",
            )
            .conflicts_with("shared_credentials_file"),
        )
        .attribute(optional(
            "region",
            AttributeType::String,
            "The region where AWS operations will take place.",
        ))
        .attribute(optional(
            "sts_region",
            AttributeType::String,
            "The region where AWS STS operations will take place.",
        ))
        .attribute(optional(
            "endpoints",
            AttributeType::List(Box::new(types::string_map())),
            "Service endpoint URL overrides, keyed by service name.",
        ))
        .attribute(optional(
            "use_dualstack_endpoint",
            AttributeType::Bool,
            "Resolve an endpoint with DualStack capability.",
        ))
        .attribute(optional(
            "use_fips_endpoint",
            AttributeType::Bool,
            "Resolve an endpoint with FIPS capability.",
        ))
        .attribute(
            optional(
                "allowed_account_ids",
                types::string_set(),
                "Account ids the provider may operate in.",
            )
            .conflicts_with("forbidden_account_ids"),
        )
        .attribute(
            optional(
                "forbidden_account_ids",
                types::string_set(),
                "Account ids the provider must not operate in.",
            )
            .conflicts_with("allowed_account_ids"),
        )
        .attribute(optional(
            "max_retries",
            AttributeType::Int,
            "The maximum number of times an AWS API request is retried.",
        ))
        .attribute(optional(
            "s3_use_path_style",
            AttributeType::Bool,
            "Use path-style S3 addressing.",
        ))
        .attribute(
            optional("s3_force_path_style", AttributeType::Bool, "Use path-style S3 addressing.")
                .deprecated("Use s3_use_path_style instead."),
        )
        .attribute(optional(
            "assume_role",
            assume_role_block(),
            "Role to assume before making API calls.",
        ))
        .attribute(optional(
            "assume_role_with_web_identity",
            web_identity_block(),
            "Role to assume with a web identity token before making API calls.",
        ))
        .attribute(optional(
            "default_tags",
            AttributeType::Block {
                attributes: vec![optional(
                    "tags",
                    types::string_map(),
                    "Resource tags to default across all resources.",
                )],
                max_items: Some(1),
            },
            "Configuration block with settings to default resource tags across all resources.",
        ))
        .attribute(optional(
            "ignore_tags",
            AttributeType::Block {
                attributes: vec![
                    optional("keys", types::string_set(), "Resource tag keys to ignore."),
                    optional(
                        "key_prefixes",
                        types::string_set(),
                        "Resource tag key prefixes to ignore.",
                    ),
                ],
                max_items: Some(1),
            },
            "Configuration block with settings to ignore resource tags across all resources.",
        ))
        .attribute(optional(
            "ec2_metadata_service_endpoint",
            AttributeType::String,
            "Address of the EC2 metadata service endpoint.",
        ))
        .attribute(optional(
            "ec2_metadata_service_endpoint_mode",
            validation::metadata_endpoint_mode(),
            "Protocol to use with the EC2 metadata service endpoint.",
        ))
        .attribute(optional(
            "skip_metadata_api_check",
            validation::nullable_bool(),
            "Skip the AWS Metadata API check.",
        ))
        .attribute(optional(
            "custom_ca_bundle",
            AttributeType::String,
            "File containing custom root and intermediate certificates.",
        ))
        .attribute(optional(
            "http_proxy",
            AttributeType::String,
            "The address of an HTTP proxy to use.",
        ))
        .attribute(optional(
            "insecure",
            AttributeType::Bool,
            "Explicitly allow the provider to perform insecure SSL requests.",
        ))
        .attribute(optional(
            "skip_credentials_validation",
            AttributeType::Bool,
            "Skip the credentials validation via STS API.",
        ))
        .attribute(optional(
            "skip_get_ec2_platforms",
            AttributeType::Bool,
            "Skip getting the supported EC2 platforms.",
        ))
        .attribute(optional(
            "skip_region_validation",
            AttributeType::Bool,
            "Skip static validation of region name.",
        ))
        .attribute(optional(
            "skip_requesting_account_id",
            AttributeType::Bool,
            "Skip requesting the account ID.",
        ))
}

fn string(attrs: &HashMap<String, Value>, key: &str) -> Option<String> {
    attrs
        .get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn flag(attrs: &HashMap<String, Value>, key: &str) -> bool {
    attrs.get(key).and_then(Value::as_bool).unwrap_or(false)
}

fn string_list(attrs: &HashMap<String, Value>, key: &str) -> Vec<String> {
    attrs
        .get(key)
        .and_then(Value::as_list)
        .unwrap_or_default()
        .iter()
        .filter_map(Value::as_str)
        .map(str::to_string)
        .collect()
}

fn string_map(attrs: &HashMap<String, Value>, key: &str) -> BTreeMap<String, String> {
    attrs
        .get(key)
        .and_then(Value::as_map)
        .map(|m| {
            m.iter()
                .filter_map(|(k, v)| v.as_str().map(|v| (k.clone(), v.to_string())))
                .collect()
        })
        .unwrap_or_default()
}

fn first_block<'a>(
    attrs: &'a HashMap<String, Value>,
    key: &str,
) -> Option<&'a HashMap<String, Value>> {
    attrs
        .get(key)
        .and_then(blocks_of)
        .and_then(|blocks| blocks.into_iter().next())
}

fn decode_duration(block: &HashMap<String, Value>) -> Option<Duration> {
    if let Some(duration) = string(block, "duration") {
        return validation::parse_role_duration(&duration).ok();
    }
    block
        .get("duration_seconds")
        .and_then(Value::as_int)
        .and_then(|secs| u64::try_from(secs).ok())
        .filter(|secs| *secs != 0)
        .map(Duration::from_secs)
}

fn decode_assume_role(block: &HashMap<String, Value>) -> AssumeRole {
    AssumeRole {
        role_arn: string(block, "role_arn"),
        duration: decode_duration(block),
        external_id: string(block, "external_id"),
        policy: string(block, "policy"),
        policy_arns: flex::string_set(block.get("policy_arns")),
        session_name: string(block, "session_name"),
        tags: string_map(block, "tags"),
        transitive_tag_keys: flex::string_set(block.get("transitive_tag_keys")),
    }
}

fn decode_web_identity(block: &HashMap<String, Value>) -> AssumeRoleWithWebIdentity {
    AssumeRoleWithWebIdentity {
        role_arn: string(block, "role_arn"),
        duration: decode_duration(block),
        policy: string(block, "policy"),
        policy_arns: flex::string_set(block.get("policy_arns")),
        session_name: string(block, "session_name"),
        web_identity_token: string(block, "web_identity_token"),
        web_identity_token_file: string(block, "web_identity_token_file"),
    }
}

fn decode_endpoint_blocks(attrs: &HashMap<String, Value>) -> Vec<HashMap<String, String>> {
    attrs
        .get("endpoints")
        .and_then(Value::as_list)
        .unwrap_or_default()
        .iter()
        .filter_map(Value::as_map)
        .map(|m| {
            m.iter()
                .filter_map(|(k, v)| v.as_str().map(|v| (k.clone(), v.to_string())))
                .collect()
        })
        .collect()
}

/// Nullable booleans may arrive as JSON booleans; carry them as strings.
fn normalize(attributes: &HashMap<String, Value>) -> HashMap<String, Value> {
    let mut attrs = attributes.clone();
    if let Some(Value::Bool(b)) = attrs.get("skip_metadata_api_check") {
        let s = b.to_string();
        attrs.insert("skip_metadata_api_check".to_string(), Value::String(s));
    }
    attrs
}

impl ProviderConfig {
    /// Validate and decode provider attributes.
    ///
    /// Endpoint overrides are resolved against `env` as part of decoding.
    pub fn from_attributes(
        attributes: &HashMap<String, Value>,
        env: &impl Environment,
    ) -> ConfigResult<Self> {
        let attrs = normalize(attributes);

        if let Err(errors) = provider_schema().validate(&attrs) {
            return Err(ConfigErrors(errors.into_iter().map(ConfigError::from).collect()));
        }

        let mut errors = Vec::new();
        let mut config = ProviderConfig {
            access_key: string(&attrs, "access_key"),
            secret_key: string(&attrs, "secret_key"),
            token: string(&attrs, "token"),
            profile: string(&attrs, "profile"),
            shared_config_files: string_list(&attrs, "shared_config_files"),
            region: string(&attrs, "region"),
            sts_region: string(&attrs, "sts_region"),
            use_dualstack_endpoint: flag(&attrs, "use_dualstack_endpoint"),
            use_fips_endpoint: flag(&attrs, "use_fips_endpoint"),
            allowed_account_ids: flex::string_set(attrs.get("allowed_account_ids")),
            forbidden_account_ids: flex::string_set(attrs.get("forbidden_account_ids")),
            s3_use_path_style: flag(&attrs, "s3_use_path_style")
                || flag(&attrs, "s3_force_path_style"),
            ec2_metadata_service_endpoint: string(&attrs, "ec2_metadata_service_endpoint"),
            custom_ca_bundle: string(&attrs, "custom_ca_bundle"),
            http_proxy: string(&attrs, "http_proxy"),
            insecure: flag(&attrs, "insecure"),
            skip_credentials_validation: flag(&attrs, "skip_credentials_validation"),
            skip_get_ec2_platforms: flag(&attrs, "skip_get_ec2_platforms"),
            skip_region_validation: flag(&attrs, "skip_region_validation"),
            skip_requesting_account_id: flag(&attrs, "skip_requesting_account_id"),
            ..ProviderConfig::default()
        };

        if let Some(file) = string(&attrs, "shared_credentials_file") {
            config.shared_credentials_files = vec![file];
        }
        let files = string_list(&attrs, "shared_credentials_files");
        if !files.is_empty() {
            config.shared_credentials_files = files;
        }

        if let Some(n) = attrs.get("max_retries").and_then(Value::as_int) {
            match u32::try_from(n) {
                Ok(n) => config.max_retries = n,
                Err(_) => errors.push(ConfigError::invalid(
                    "max_retries",
                    format!("must be between 0 and {}, got {}", u32::MAX, n),
                )),
            }
        }

        config.ec2_metadata_service_endpoint_mode =
            match string(&attrs, "ec2_metadata_service_endpoint_mode").as_deref() {
                Some("IPv6") => Some(MetadataEndpointMode::IPv6),
                Some(_) => Some(MetadataEndpointMode::IPv4),
                None => None,
            };

        config.metadata_api = match attrs.get("skip_metadata_api_check").and_then(Value::as_bool) {
            Some(true) => MetadataApi::Disabled,
            Some(false) => MetadataApi::Enabled,
            None => MetadataApi::Default,
        };

        if let Some(block) = first_block(&attrs, "assume_role") {
            let role = decode_assume_role(block);
            log::info!(
                "assume_role configuration set: (ARN: {:?}, SessionID: {:?}, ExternalID: {:?})",
                role.role_arn.as_deref().unwrap_or_default(),
                role.session_name.as_deref().unwrap_or_default(),
                role.external_id.as_deref().unwrap_or_default()
            );
            config.assume_role = Some(role);
        }

        if let Some(block) = first_block(&attrs, "assume_role_with_web_identity") {
            let role = decode_web_identity(block);
            if role.web_identity_token.is_some() == role.web_identity_token_file.is_some() {
                errors.push(ConfigError::Schema(TypeError::ExactlyOneOf {
                    names: vec![
                        "assume_role_with_web_identity.0.web_identity_token".to_string(),
                        "assume_role_with_web_identity.0.web_identity_token_file".to_string(),
                    ],
                }));
            }
            log::info!(
                "assume_role_with_web_identity configuration set: (ARN: {:?}, SessionID: {:?})",
                role.role_arn.as_deref().unwrap_or_default(),
                role.session_name.as_deref().unwrap_or_default()
            );
            config.assume_role_with_web_identity = Some(role);
        }

        if let Some(block) = first_block(&attrs, "default_tags") {
            config.default_tags = Some(DefaultTags {
                tags: string_map(block, "tags"),
            });
        }

        if let Some(block) = first_block(&attrs, "ignore_tags") {
            config.ignore_tags = Some(IgnoreTags {
                keys: flex::string_set(block.get("keys")),
                key_prefixes: flex::string_set(block.get("key_prefixes")),
            });
        }

        if !config.skip_region_validation {
            for region in [&config.region, &config.sts_region].into_iter().flatten() {
                if validation::validate_region(region).is_err() {
                    errors.push(ConfigError::InvalidRegion(region.clone()));
                }
            }
        }

        match endpoints::resolve_endpoints(&decode_endpoint_blocks(&attrs), env) {
            Ok(resolved) => config.endpoints = resolved,
            Err(e) => errors.push(e),
        }

        if errors.is_empty() {
            Ok(config)
        } else {
            Err(ConfigErrors(errors))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use awsutils_core::resource::attributes_from_json;
    use serde_json::json;

    fn decode(json: serde_json::Value) -> ConfigResult<ProviderConfig> {
        decode_with_env(json, &[])
    }

    fn decode_with_env(
        json: serde_json::Value,
        env: &[(&str, &str)],
    ) -> ConfigResult<ProviderConfig> {
        let attrs = attributes_from_json(json.as_object().unwrap());
        let env: HashMap<String, String> = env
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ProviderConfig::from_attributes(&attrs, &env)
    }

    #[test]
    fn empty_config_uses_defaults() {
        let config = decode(json!({})).unwrap();
        assert_eq!(config, ProviderConfig::default());
        assert_eq!(config.max_retries, 25);
    }

    #[test]
    fn max_retries_override() {
        assert_eq!(decode(json!({"max_retries": 3})).unwrap().max_retries, 3);
        assert_eq!(decode(json!({"max_retries": 0})).unwrap().max_retries, 0);
        assert!(decode(json!({"max_retries": -1})).is_err());
    }

    #[test]
    fn path_style_is_either_flag() {
        assert!(decode(json!({"s3_force_path_style": true})).unwrap().s3_use_path_style);
        assert!(decode(json!({"s3_use_path_style": true})).unwrap().s3_use_path_style);
        assert!(
            !decode(json!({"s3_use_path_style": false, "s3_force_path_style": false}))
                .unwrap()
                .s3_use_path_style
        );
    }

    #[test]
    fn credentials_file_list() {
        let config = decode(json!({"shared_credentials_file": "/tmp/creds"})).unwrap();
        assert_eq!(config.shared_credentials_files, vec!["/tmp/creds"]);

        let config = decode(json!({"shared_credentials_files": ["/a", "/b"]})).unwrap();
        assert_eq!(config.shared_credentials_files, vec!["/a", "/b"]);

        let err = decode(json!({
            "shared_credentials_file": "/tmp/creds",
            "shared_credentials_files": ["/a"]
        }))
        .unwrap_err();
        assert!(err.to_string().contains("conflicts with"));
    }

    #[test]
    fn account_lists_conflict() {
        let err = decode(json!({
            "allowed_account_ids": ["111111111111"],
            "forbidden_account_ids": ["222222222222"]
        }))
        .unwrap_err();
        assert_eq!(err.errors().len(), 1);
        assert!(err.to_string().contains("conflicts with"));
    }

    #[test]
    fn assume_role_decoded() {
        let config = decode(json!({
            "assume_role": [{
                "role_arn": "arn:aws:iam::123456789012:role/admin",
                "session_name": "ci",
                "duration": "1h",
                "tags": {"team": "platform"},
                "policy_arns": ["arn:aws:iam::aws:policy/ReadOnlyAccess"]
            }]
        }))
        .unwrap();

        let role = config.assume_role.unwrap();
        assert_eq!(role.role_arn.as_deref(), Some("arn:aws:iam::123456789012:role/admin"));
        assert_eq!(role.duration, Some(Duration::from_secs(3600)));
        assert_eq!(role.tags["team"], "platform");
        assert_eq!(role.policy_arns.len(), 1);
    }

    #[test]
    fn deprecated_duration_seconds_used_alone() {
        let config = decode(json!({"assume_role": {"duration_seconds": 900}})).unwrap();
        assert_eq!(
            config.assume_role.unwrap().duration,
            Some(Duration::from_secs(900))
        );
    }

    #[test]
    fn duration_conflicts_with_duration_seconds() {
        let err = decode(json!({
            "assume_role": [{"duration": "1h", "duration_seconds": 3600}]
        }))
        .unwrap_err();
        assert!(err.to_string().contains("conflicts with"));
    }

    #[test]
    fn web_identity_requires_exactly_one_token_source() {
        assert!(decode(json!({
            "assume_role_with_web_identity": [{"web_identity_token": "token"}]
        }))
        .is_ok());

        let neither = decode(json!({
            "assume_role_with_web_identity": [{"role_arn": "arn:aws:iam::123456789012:role/x"}]
        }))
        .unwrap_err();
        assert!(neither.to_string().contains("Exactly one of"));

        let both = decode(json!({
            "assume_role_with_web_identity": [{
                "web_identity_token": "token",
                "web_identity_token_file": "/var/run/token"
            }]
        }))
        .unwrap_err();
        assert!(both.to_string().contains("Exactly one of"));
    }

    #[test]
    fn nullable_bool_metadata_check() {
        assert_eq!(decode(json!({})).unwrap().metadata_api, MetadataApi::Default);
        assert_eq!(
            decode(json!({"skip_metadata_api_check": "true"})).unwrap().metadata_api,
            MetadataApi::Disabled
        );
        assert_eq!(
            decode(json!({"skip_metadata_api_check": false})).unwrap().metadata_api,
            MetadataApi::Enabled
        );
        assert_eq!(
            decode(json!({"skip_metadata_api_check": ""})).unwrap().metadata_api,
            MetadataApi::Default
        );
        assert!(decode(json!({"skip_metadata_api_check": "maybe"})).is_err());
    }

    #[test]
    fn region_validation_can_be_skipped() {
        assert!(decode(json!({"region": "us-east-1"})).is_ok());
        assert!(decode(json!({"region": "moon-base"})).is_err());
        assert!(decode(json!({"region": "moon-base", "skip_region_validation": true})).is_ok());
    }

    #[test]
    fn endpoints_resolved_during_decode() {
        let config = decode_with_env(
            json!({"endpoints": [{"sts": "https://sts.config.test"}]}),
            &[("TF_AWS_IAM_ENDPOINT", "https://iam.env.test")],
        )
        .unwrap();
        assert_eq!(config.endpoints["sts"], "https://sts.config.test");
        assert_eq!(config.endpoints["iam"], "https://iam.env.test");

        let err = decode(json!({"endpoints": [{"bogus": "https://x.test"}]})).unwrap_err();
        assert!(err.to_string().contains("failed to assign endpoint (bogus)"));
    }

    #[test]
    fn errors_are_collected() {
        let err = decode(json!({
            "region": "nowhere",
            "max_retries": -5,
            "endpoints": [{"bogus": "https://x.test"}]
        }))
        .unwrap_err();
        assert_eq!(err.errors().len(), 3);
    }

    #[test]
    fn schema_errors_reported_before_decoding() {
        let err = decode(json!({"max_retries": "lots", "unknown_knob": true})).unwrap_err();
        assert_eq!(err.errors().len(), 2);
    }
}
