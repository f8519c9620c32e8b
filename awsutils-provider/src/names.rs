//! Service names
//!
//! Table of the services whose endpoints can be overridden, in the fixed
//! order used when resolving endpoint blocks. Within an entry, the canonical
//! key is enumerated before its legacy aliases, so when a block sets both
//! `transcribe` and `transcribeservice`, `transcribe` wins.

/// A service whose endpoint can be overridden
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Service {
    /// Canonical key, also the endpoint block attribute name
    pub key: &'static str,
    /// Historical names accepted in endpoint blocks
    pub aliases: &'static [&'static str],
    /// Primary environment variable for an endpoint override
    pub env_var: &'static str,
    /// Older environment variable, honoured with a warning
    pub deprecated_env_var: &'static str,
    /// Human readable name
    pub name: &'static str,
}

const fn entry(
    key: &'static str,
    aliases: &'static [&'static str],
    env_var: &'static str,
    deprecated_env_var: &'static str,
    name: &'static str,
) -> Service {
    Service {
        key,
        aliases,
        env_var,
        deprecated_env_var,
        name,
    }
}

pub const SERVICES: &[Service] = &[
    entry(
        "accessanalyzer",
        &[],
        "TF_AWS_ACCESSANALYZER_ENDPOINT",
        "AWS_ACCESSANALYZER_ENDPOINT",
        "IAM Access Analyzer",
    ),
    entry("acm", &[], "TF_AWS_ACM_ENDPOINT", "AWS_ACM_ENDPOINT", "ACM"),
    entry("amplify", &[], "TF_AWS_AMPLIFY_ENDPOINT", "AWS_AMPLIFY_ENDPOINT", "Amplify"),
    entry(
        "apigateway",
        &[],
        "TF_AWS_APIGATEWAY_ENDPOINT",
        "AWS_APIGATEWAY_ENDPOINT",
        "API Gateway",
    ),
    entry("budgets", &[], "TF_AWS_BUDGETS_ENDPOINT", "AWS_BUDGETS_ENDPOINT", "Budgets"),
    entry(
        "cloudformation",
        &[],
        "TF_AWS_CLOUDFORMATION_ENDPOINT",
        "AWS_CLOUDFORMATION_ENDPOINT",
        "CloudFormation",
    ),
    entry(
        "cloudhsmv2",
        &["cloudhsm"],
        "TF_AWS_CLOUDHSMV2_ENDPOINT",
        "AWS_CLOUDHSMV2_ENDPOINT",
        "CloudHSM",
    ),
    entry("cloudwatch", &[], "TF_AWS_CLOUDWATCH_ENDPOINT", "AWS_CLOUDWATCH_ENDPOINT", "CloudWatch"),
    entry("codebuild", &[], "TF_AWS_CODEBUILD_ENDPOINT", "AWS_CODEBUILD_ENDPOINT", "CodeBuild"),
    entry("dynamodb", &[], "TF_AWS_DYNAMODB_ENDPOINT", "AWS_DYNAMODB_ENDPOINT", "DynamoDB"),
    entry("ec2", &[], "TF_AWS_EC2_ENDPOINT", "AWS_EC2_ENDPOINT", "EC2"),
    entry("ecr", &[], "TF_AWS_ECR_ENDPOINT", "AWS_ECR_ENDPOINT", "ECR"),
    entry("eks", &[], "TF_AWS_EKS_ENDPOINT", "AWS_EKS_ENDPOINT", "EKS"),
    entry(
        "globalaccelerator",
        &[],
        "TF_AWS_GLOBALACCELERATOR_ENDPOINT",
        "AWS_GLOBALACCELERATOR_ENDPOINT",
        "Global Accelerator",
    ),
    entry("guardduty", &[], "TF_AWS_GUARDDUTY_ENDPOINT", "AWS_GUARDDUTY_ENDPOINT", "GuardDuty"),
    entry("iam", &[], "TF_AWS_IAM_ENDPOINT", "AWS_IAM_ENDPOINT", "IAM"),
    entry("kinesis", &[], "TF_AWS_KINESIS_ENDPOINT", "AWS_KINESIS_ENDPOINT", "Kinesis"),
    entry(
        "kinesisanalytics",
        &[],
        "TF_AWS_KINESISANALYTICS_ENDPOINT",
        "AWS_KINESISANALYTICS_ENDPOINT",
        "Kinesis Analytics",
    ),
    entry("kms", &[], "TF_AWS_KMS_ENDPOINT", "AWS_KMS_ENDPOINT", "KMS"),
    entry("lambda", &[], "TF_AWS_LAMBDA_ENDPOINT", "AWS_LAMBDA_ENDPOINT", "Lambda"),
    entry("macie2", &[], "TF_AWS_MACIE2_ENDPOINT", "AWS_MACIE2_ENDPOINT", "Macie"),
    entry(
        "organizations",
        &[],
        "TF_AWS_ORGANIZATIONS_ENDPOINT",
        "AWS_ORGANIZATIONS_ENDPOINT",
        "Organizations",
    ),
    entry("s3", &[], "TF_AWS_S3_ENDPOINT", "AWS_S3_ENDPOINT", "S3"),
    entry(
        "secretsmanager",
        &[],
        "TF_AWS_SECRETSMANAGER_ENDPOINT",
        "AWS_SECRETSMANAGER_ENDPOINT",
        "Secrets Manager",
    ),
    entry(
        "securityhub",
        &[],
        "TF_AWS_SECURITYHUB_ENDPOINT",
        "AWS_SECURITYHUB_ENDPOINT",
        "Security Hub",
    ),
    entry("sfn", &["stepfunctions"], "TF_AWS_SFN_ENDPOINT", "AWS_SFN_ENDPOINT", "Step Functions"),
    entry("sns", &[], "TF_AWS_SNS_ENDPOINT", "AWS_SNS_ENDPOINT", "SNS"),
    entry("sqs", &[], "TF_AWS_SQS_ENDPOINT", "AWS_SQS_ENDPOINT", "SQS"),
    entry("ssm", &[], "TF_AWS_SSM_ENDPOINT", "AWS_SSM_ENDPOINT", "Systems Manager"),
    entry("sts", &[], "TF_AWS_STS_ENDPOINT", "AWS_STS_ENDPOINT", "STS"),
    entry(
        "transcribe",
        &["transcribeservice"],
        "TF_AWS_TRANSCRIBE_ENDPOINT",
        "AWS_TRANSCRIBE_ENDPOINT",
        "Transcribe",
    ),
    entry("transfer", &[], "TF_AWS_TRANSFER_ENDPOINT", "AWS_TRANSFER_ENDPOINT", "Transfer Family"),
];

/// Every accepted endpoint block key, in resolution order
pub fn aliases() -> impl Iterator<Item = &'static str> {
    SERVICES
        .iter()
        .flat_map(|s| std::iter::once(s.key).chain(s.aliases.iter().copied()))
}

/// Look up the service an endpoint block key belongs to
pub fn service_for_alias(alias: &str) -> Option<&'static Service> {
    SERVICES
        .iter()
        .find(|s| s.key == alias || s.aliases.contains(&alias))
}

pub fn service(key: &str) -> Option<&'static Service> {
    SERVICES.iter().find(|s| s.key == key)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn aliases_are_unique() {
        let mut seen = HashSet::new();
        for alias in aliases() {
            assert!(seen.insert(alias), "duplicate alias {}", alias);
        }
    }

    #[test]
    fn canonical_key_enumerated_before_legacy_alias() {
        let order: Vec<_> = aliases().collect();
        let pos = |k: &str| order.iter().position(|a| *a == k).unwrap();
        assert!(pos("transcribe") < pos("transcribeservice"));
        assert!(pos("sfn") < pos("stepfunctions"));
    }

    #[test]
    fn alias_resolves_to_canonical_service() {
        assert_eq!(service_for_alias("transcribeservice").unwrap().key, "transcribe");
        assert_eq!(service_for_alias("cloudhsm").unwrap().key, "cloudhsmv2");
        assert!(service_for_alias("nonexistent").is_none());
    }

    #[test]
    fn env_vars_follow_naming_convention() {
        for s in SERVICES {
            assert_eq!(s.env_var, format!("TF_AWS_{}_ENDPOINT", s.key.to_uppercase()));
            assert_eq!(s.deprecated_env_var, format!("AWS_{}_ENDPOINT", s.key.to_uppercase()));
        }
    }
}
