//! awsutils_default_vpc_deletion
//!
//! Tears down the region's default VPC: internet gateway, subnets, then the
//! VPC itself. The resource only records that the teardown happened.

use std::sync::Arc;

use async_trait::async_trait;
use awsutils_core::provider::{ProviderResult, ResourceType};
use awsutils_core::resource::{Resource, State};
use awsutils_core::schema::{AttributeSchema, AttributeType, ResourceSchema};

use super::api::Ec2Api;
use crate::provider::ResourceHandler;

pub const TYPE_NAME: &str = "awsutils_default_vpc_deletion";

/// Identifier recorded when the region has no default VPC
pub const NO_DEFAULT_VPC_FOUND: &str = "no-default-vpc-found";

pub struct DefaultVpcDeletion {
    ec2: Arc<dyn Ec2Api>,
}

impl DefaultVpcDeletion {
    pub fn new(ec2: Arc<dyn Ec2Api>) -> Self {
        Self { ec2 }
    }

    async fn delete_default_vpc(&self, vpc_id: &str) -> ProviderResult<()> {
        let igw = self
            .ec2
            .find_internet_gateway_for_vpc(vpc_id)
            .await
            .map_err(|e| {
                e.context(format!(
                    "error while looking for EC2 Internet Gateway for VPC ({})",
                    vpc_id
                ))
            })?;

        if let Some(igw_id) = igw {
            log::debug!("detaching internet gateway {} from {}", igw_id, vpc_id);
            self.ec2
                .detach_internet_gateway(&igw_id, vpc_id)
                .await
                .map_err(|e| {
                    e.context(format!("error while detaching EC2 Internet Gateway ({})", igw_id))
                })?;

            log::debug!("deleting internet gateway {}", igw_id);
            self.ec2.delete_internet_gateway(&igw_id).await.map_err(|e| {
                e.context(format!("error while deleting EC2 Internet Gateway ({})", igw_id))
            })?;
        }

        let subnets = self.ec2.find_subnets_for_vpc(vpc_id).await.map_err(|e| {
            e.context(format!("error while looking for EC2 Subnets for VPC ({})", vpc_id))
        })?;

        for subnet_id in &subnets {
            log::debug!("deleting subnet {}", subnet_id);
            self.ec2.delete_subnet(subnet_id).await.map_err(|e| {
                e.context(format!("error while deleting EC2 Subnet ({})", subnet_id))
            })?;
        }

        log::debug!("deleting VPC {}", vpc_id);
        self.ec2
            .delete_vpc(vpc_id)
            .await
            .map_err(|e| e.context(format!("error while deleting EC2 VPC ({})", vpc_id)))
    }

    async fn refresh(&self, current: &State, is_new: bool) -> ProviderResult<State> {
        let default_vpc = self
            .ec2
            .find_default_vpc()
            .await
            .map_err(|e| e.context("error while looking for default VPC"))?;

        if !is_new && let Some(vpc_id) = default_vpc {
            log::warn!("default VPC ({}) exists again, removing from state", vpc_id);
            return Ok(State::not_found(current.id.clone()));
        }
        Ok(current.clone())
    }
}

impl ResourceType for DefaultVpcDeletion {
    fn name(&self) -> &'static str {
        TYPE_NAME
    }

    fn schema(&self) -> ResourceSchema {
        ResourceSchema::new(TYPE_NAME)
            .with_description(
                "Deletes the default VPC along with its internet gateway and subnets.",
            )
            .attribute(AttributeSchema::new("id", AttributeType::String).computed())
    }
}

#[async_trait]
impl ResourceHandler for DefaultVpcDeletion {
    async fn create(&self, resource: &Resource) -> ProviderResult<State> {
        let default_vpc = self
            .ec2
            .find_default_vpc()
            .await
            .map_err(|e| e.context("error while looking for default VPC"))?;

        let identifier = match default_vpc {
            Some(vpc_id) => {
                self.delete_default_vpc(&vpc_id).await?;
                vpc_id
            }
            None => NO_DEFAULT_VPC_FOUND.to_string(),
        };

        let state = State::existing(resource.id.clone(), Default::default())
            .with_identifier(identifier.clone())
            .with_attribute("id", identifier);
        self.refresh(&state, true).await
    }

    async fn read(&self, current: &State) -> ProviderResult<State> {
        self.refresh(current, false).await
    }

    async fn delete(&self, _current: &State) -> ProviderResult<()> {
        log::info!("Removing default VPC deletion state");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeEc2;

    fn resource() -> Resource {
        Resource::new(TYPE_NAME, "default")
    }

    #[tokio::test]
    async fn no_default_vpc_records_sentinel_without_teardown() {
        let ec2 = FakeEc2::default();
        let handler = DefaultVpcDeletion::new(Arc::new(ec2.clone()));

        let state = handler.create(&resource()).await.unwrap();
        assert_eq!(state.identifier.as_deref(), Some(NO_DEFAULT_VPC_FOUND));

        let first = handler.read(&state).await.unwrap();
        let second = handler.read(&first).await.unwrap();
        assert!(second.exists);
        assert_eq!(second.identifier.as_deref(), Some(NO_DEFAULT_VPC_FOUND));

        assert_eq!(ec2.calls(), vec!["DescribeVpcs"; 4]);
    }

    #[tokio::test]
    async fn tears_down_in_order() {
        let ec2 = FakeEc2::with_default_vpc("vpc-1")
            .with_internet_gateway("igw-1")
            .with_subnets(&["subnet-a", "subnet-b"]);
        let handler = DefaultVpcDeletion::new(Arc::new(ec2.clone()));

        let state = handler.create(&resource()).await.unwrap();
        assert_eq!(state.identifier.as_deref(), Some("vpc-1"));
        assert_eq!(state.get_str("id"), Some("vpc-1"));
        assert_eq!(
            ec2.calls(),
            vec![
                "DescribeVpcs",
                "DescribeInternetGateways vpc-1",
                "DetachInternetGateway igw-1 vpc-1",
                "DeleteInternetGateway igw-1",
                "DescribeSubnets vpc-1",
                "DeleteSubnet subnet-a",
                "DeleteSubnet subnet-b",
                "DeleteVpc vpc-1",
                "DescribeVpcs",
            ]
        );
    }

    #[tokio::test]
    async fn missing_gateway_is_skipped() {
        let ec2 = FakeEc2::with_default_vpc("vpc-1");
        let handler = DefaultVpcDeletion::new(Arc::new(ec2.clone()));

        handler.create(&resource()).await.unwrap();
        assert!(!ec2.calls().iter().any(|c| c.starts_with("DetachInternetGateway")));
    }

    #[tokio::test]
    async fn failing_step_aborts_with_context() {
        let ec2 = FakeEc2::with_default_vpc("vpc-1")
            .with_internet_gateway("igw-1")
            .with_subnets(&["subnet-a", "subnet-b"])
            .failing_on("DeleteSubnet");
        let handler = DefaultVpcDeletion::new(Arc::new(ec2.clone()));

        let err = handler.create(&resource()).await.unwrap_err();
        assert!(err.message.starts_with("error while deleting EC2 Subnet (subnet-a)"));
        assert!(!ec2.calls().iter().any(|c| c.starts_with("DeleteVpc")));
    }

    #[tokio::test]
    async fn detach_failure_names_gateway() {
        let ec2 = FakeEc2::with_default_vpc("vpc-1")
            .with_internet_gateway("igw-1")
            .failing_on("DetachInternetGateway");
        let handler = DefaultVpcDeletion::new(Arc::new(ec2));

        let err = handler.create(&resource()).await.unwrap_err();
        assert!(err.message.starts_with("error while detaching EC2 Internet Gateway (igw-1)"));
    }

    #[tokio::test]
    async fn reappearing_default_vpc_clears_state() {
        let state = State::existing(
            awsutils_core::resource::ResourceId::new(TYPE_NAME, "default"),
            Default::default(),
        )
        .with_identifier("vpc-1");
        let handler = DefaultVpcDeletion::new(Arc::new(FakeEc2::with_default_vpc("vpc-2")));

        let refreshed = handler.read(&state).await.unwrap();
        assert!(!refreshed.exists);
    }

    #[tokio::test]
    async fn delete_makes_no_calls() {
        let ec2 = FakeEc2::with_default_vpc("vpc-1");
        let handler = DefaultVpcDeletion::new(Arc::new(ec2.clone()));
        let state = State::existing(
            awsutils_core::resource::ResourceId::new(TYPE_NAME, "default"),
            Default::default(),
        );

        handler.delete(&state).await.unwrap();
        assert!(ec2.calls().is_empty());
    }
}
