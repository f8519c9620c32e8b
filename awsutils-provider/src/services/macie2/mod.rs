pub mod api;
pub mod organization_settings;
