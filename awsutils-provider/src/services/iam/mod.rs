//! IAM: user login profiles

pub mod api;
pub mod login_profile;
