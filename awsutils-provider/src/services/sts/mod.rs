pub mod api;
pub mod caller_identity;
