//! Attribute validators
//!
//! String-level checks for ARNs, regions, assume-role knobs and the like,
//! plus `AttributeType` constructors wrapping them for use in schemas.

use std::sync::LazyLock;
use std::time::Duration;

use awsutils_core::resource::Value;
use awsutils_core::schema::AttributeType;
use regex::Regex;

const ACCOUNT_ID_PATTERN: &str = r"^(aws|\d{12})$";
const PARTITION_PATTERN: &str = r"^aws(-[a-z]+)*$";
const REGION_PATTERN: &str = r"^[a-z]{2}(-[a-z]+)+-\d$";

static ACCOUNT_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(ACCOUNT_ID_PATTERN).expect("Invalid account id regex"));
static PARTITION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(PARTITION_PATTERN).expect("Invalid partition regex"));
static REGION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(REGION_PATTERN).expect("Invalid region regex"));
static SESSION_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[\w+=,.@\-]*$").expect("Invalid session name regex"));
static EXTERNAL_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[\w+=,.@:/\-]*$").expect("Invalid external id regex"));

pub const MIN_ROLE_DURATION: Duration = Duration::from_secs(15 * 60);
pub const MAX_ROLE_DURATION: Duration = Duration::from_secs(12 * 60 * 60);

/// Components of an ARN
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Arn<'a> {
    pub partition: &'a str,
    pub service: &'a str,
    pub region: &'a str,
    pub account_id: &'a str,
    pub resource: &'a str,
}

pub fn parse_arn(value: &str) -> Result<Arn<'_>, String> {
    let mut sections = value.splitn(6, ':');
    if sections.next() != Some("arn") {
        return Err("arn: invalid prefix".to_string());
    }
    match (
        sections.next(),
        sections.next(),
        sections.next(),
        sections.next(),
        sections.next(),
    ) {
        (Some(partition), Some(service), Some(region), Some(account_id), Some(resource)) => {
            Ok(Arn {
                partition,
                service,
                region,
                account_id,
                resource,
            })
        }
        _ => Err("arn: not enough sections".to_string()),
    }
}

/// An empty string is accepted; optional attributes use it for "unset".
pub fn validate_arn(value: &str) -> Result<(), String> {
    if value.is_empty() {
        return Ok(());
    }

    let arn = parse_arn(value).map_err(|e| format!("{:?} is an invalid ARN: {}", value, e))?;

    if arn.partition.is_empty() {
        return Err(format!("{:?} is an invalid ARN: missing partition value", value));
    }
    if !PARTITION.is_match(arn.partition) {
        return Err(format!(
            "{:?} is an invalid ARN: invalid partition value (expecting to match regular expression: {})",
            value, PARTITION_PATTERN
        ));
    }
    if !arn.region.is_empty() && !REGION.is_match(arn.region) {
        return Err(format!(
            "{:?} is an invalid ARN: invalid region value (expecting to match regular expression: {})",
            value, REGION_PATTERN
        ));
    }
    if !arn.account_id.is_empty() && !ACCOUNT_ID.is_match(arn.account_id) {
        return Err(format!(
            "{:?} is an invalid ARN: invalid account ID value (expecting to match regular expression: {})",
            value, ACCOUNT_ID_PATTERN
        ));
    }
    if arn.resource.is_empty() {
        return Err(format!("{:?} is an invalid ARN: missing resource value", value));
    }

    Ok(())
}

pub fn validate_region(value: &str) -> Result<(), String> {
    if REGION.is_match(value) {
        Ok(())
    } else {
        Err(format!(
            "{:?} is not a valid AWS Region (expecting to match regular expression: {})",
            value, REGION_PATTERN
        ))
    }
}

pub fn validate_session_name(value: &str) -> Result<(), String> {
    let len = value.chars().count();
    if !(2..=64).contains(&len) {
        return Err(format!(
            "session name must be between 2 and 64 characters, got {}",
            len
        ));
    }
    if !SESSION_NAME.is_match(value) {
        return Err("session name must only contain [\\w+=,.@-]".to_string());
    }
    Ok(())
}

pub fn validate_external_id(value: &str) -> Result<(), String> {
    let len = value.chars().count();
    if !(2..=1224).contains(&len) {
        return Err(format!(
            "external id must be between 2 and 1224 characters, got {}",
            len
        ));
    }
    if !EXTERNAL_ID.is_match(value) {
        return Err("external id must only contain [\\w+=,.@:/-]".to_string());
    }
    Ok(())
}

/// Parse a role session duration such as `15m`, `1h` or `1h30m`
pub fn parse_role_duration(value: &str) -> Result<Duration, String> {
    humantime::parse_duration(value).map_err(|e| format!("cannot parse {:?}: {}", value, e))
}

pub fn validate_role_duration(value: &str) -> Result<(), String> {
    let duration = parse_role_duration(value)?;
    if duration < MIN_ROLE_DURATION || duration > MAX_ROLE_DURATION {
        return Err("duration must be between 15 minutes (15m) and 12 hours (12h)".to_string());
    }
    Ok(())
}

fn string_check(value: &Value, check: fn(&str) -> Result<(), String>) -> Result<(), String> {
    match value.as_str() {
        Some(s) => check(s),
        None => Err("Expected string".to_string()),
    }
}

fn int_between(value: &Value, min: i64, max: i64) -> Result<(), String> {
    match value.as_int() {
        Some(n) if (min..=max).contains(&n) => Ok(()),
        Some(n) => Err(format!("expected to be in the range ({} - {}), got {}", min, max, n)),
        None => Err("Expected integer".to_string()),
    }
}

fn len_between(value: &Value, min: usize, max: usize) -> Result<(), String> {
    match value.as_str() {
        Some(s) if (min..=max).contains(&s.chars().count()) => Ok(()),
        Some(s) => Err(format!(
            "expected length to be in the range ({} - {}), got {}",
            min,
            max,
            s.chars().count()
        )),
        None => Err("Expected string".to_string()),
    }
}

fn custom(
    name: &str,
    base: AttributeType,
    validate: fn(&Value) -> Result<(), String>,
) -> AttributeType {
    AttributeType::Custom {
        name: name.to_string(),
        base: Box::new(base),
        validate,
    }
}

pub fn arn() -> AttributeType {
    custom("Arn", AttributeType::String, |v| string_check(v, validate_arn))
}

pub fn arn_set() -> AttributeType {
    AttributeType::Set(Box::new(arn()))
}

pub fn session_name() -> AttributeType {
    custom("SessionName", AttributeType::String, |v| {
        string_check(v, validate_session_name)
    })
}

pub fn external_id() -> AttributeType {
    custom("ExternalId", AttributeType::String, |v| {
        string_check(v, validate_external_id)
    })
}

pub fn role_duration() -> AttributeType {
    custom("Duration", AttributeType::String, |v| {
        string_check(v, validate_role_duration)
    })
}

pub fn role_duration_seconds() -> AttributeType {
    custom("DurationSeconds", AttributeType::Int, |v| int_between(v, 900, 43200))
}

pub fn web_identity_token() -> AttributeType {
    custom("WebIdentityToken", AttributeType::String, |v| len_between(v, 4, 20000))
}

pub fn password_length() -> AttributeType {
    custom("PasswordLength", AttributeType::Int, |v| int_between(v, 8, 128))
}

/// Tri-state boolean carried as a string: "true", "false" or "" (unset)
pub fn nullable_bool() -> AttributeType {
    custom("NullableBool", AttributeType::String, |v| match v.as_str() {
        Some("" | "true" | "false") => Ok(()),
        Some(other) => Err(format!("expected \"true\", \"false\" or empty, got {:?}", other)),
        None => Err("Expected string".to_string()),
    })
}

pub fn metadata_endpoint_mode() -> AttributeType {
    AttributeType::Enum(vec!["IPv4".to_string(), "IPv6".to_string()])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_arns() {
        for arn in [
            "arn:aws:securityhub:us-east-1:123456789012:control/cis-aws-foundations-benchmark/v/1.2.0/1.1",
            "arn:aws:iam::123456789012:role/admin",
            "arn:aws-us-gov:iam::aws:policy/ReadOnlyAccess",
            "arn:aws:s3:::bucket/key",
            "",
        ] {
            assert!(validate_arn(arn).is_ok(), "{} should be valid", arn);
        }
    }

    #[test]
    fn invalid_arns() {
        let cases = [
            ("not-an-arn", "invalid prefix"),
            ("arn:aws:iam", "not enough sections"),
            ("arn::iam::123456789012:role/x", "missing partition"),
            ("arn:gcp:iam::123456789012:role/x", "invalid partition"),
            ("arn:aws:ec2:mars:123456789012:vpc/x", "invalid region"),
            ("arn:aws:iam::1234:role/x", "invalid account ID"),
            ("arn:aws:iam::123456789012:", "missing resource"),
        ];
        for (arn, expected) in cases {
            let err = validate_arn(arn).unwrap_err();
            assert!(err.contains(expected), "{}: {}", arn, err);
        }
    }

    #[test]
    fn regions() {
        assert!(validate_region("us-east-1").is_ok());
        assert!(validate_region("us-gov-west-1").is_ok());
        assert!(validate_region("ap-northeast-1").is_ok());
        assert!(validate_region("us-east").is_err());
        assert!(validate_region("US-EAST-1").is_err());
    }

    #[test]
    fn session_names() {
        assert!(validate_session_name("terraform@ci").is_ok());
        assert!(validate_session_name("a").is_err());
        assert!(validate_session_name(&"a".repeat(65)).is_err());
        assert!(validate_session_name("has space").is_err());
    }

    #[test]
    fn role_durations() {
        assert!(validate_role_duration("15m").is_ok());
        assert!(validate_role_duration("1h30m").is_ok());
        assert!(validate_role_duration("12h").is_ok());
        assert!(validate_role_duration("14m").is_err());
        assert!(validate_role_duration("13h").is_err());
        assert!(validate_role_duration("soon").is_err());
        assert_eq!(parse_role_duration("1h").unwrap(), Duration::from_secs(3600));
    }

    #[test]
    fn attribute_types_use_validators() {
        assert!(password_length().validate(&Value::Int(20)).is_ok());
        assert!(password_length().validate(&Value::Int(7)).is_err());
        assert!(password_length().validate(&Value::Int(129)).is_err());
        assert!(role_duration_seconds().validate(&Value::Int(899)).is_err());
        assert!(web_identity_token().validate(&Value::from("abc")).is_err());
        assert!(arn().validate(&Value::from("arn:aws:iam::123456789012:role/x")).is_ok());
        assert!(arn().validate(&Value::Int(1)).is_err());
    }

    #[test]
    fn nullable_bool_accepts_three_states() {
        for v in ["", "true", "false"] {
            assert!(nullable_bool().validate(&Value::from(v)).is_ok());
        }
        assert!(nullable_bool().validate(&Value::from("yes")).is_err());
    }
}
