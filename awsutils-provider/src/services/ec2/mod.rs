//! EC2: default VPC teardown and Client VPN configuration export

pub mod api;
pub mod client_vpn_export;
pub mod default_vpc_deletion;
