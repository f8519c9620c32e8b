pub mod api;
pub mod control_disablement;
pub mod organization_settings;
