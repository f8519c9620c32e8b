//! Per-service API seams and resource handlers

pub mod ec2;
pub mod guardduty;
pub mod iam;
pub mod macie2;
pub mod members;
pub mod securityhub;
pub mod sts;

use std::fmt;

use awsutils_core::provider::ProviderError;

/// Invitation address for member accounts that join through the organization
/// and so never receive the email.
pub const MEMBER_EMAIL: &str = "notused2join@awsorganization.com";

/// An account a batch membership call did not process
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnprocessedAccount {
    pub account_id: String,
    pub reason: String,
}

impl fmt::Display for UnprocessedAccount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.account_id, self.reason)
    }
}

/// A batch call with unprocessed accounts counts as a failure
pub(crate) fn check_unprocessed(
    context: impl fmt::Display,
    unprocessed: &[UnprocessedAccount],
) -> Result<(), ProviderError> {
    if unprocessed.is_empty() {
        return Ok(());
    }
    let accounts: Vec<String> = unprocessed.iter().map(ToString::to_string).collect();
    Err(ProviderError::new(format!(
        "{}: unprocessed accounts: [{}]",
        context,
        accounts.join(", ")
    )))
}
