//! EC2 API seam and finders

use async_trait::async_trait;
use aws_sdk_ec2::types::Filter;
use awsutils_core::provider::ProviderResult;

use crate::error::api_error;

#[async_trait]
pub trait Ec2Api: Send + Sync {
    /// Id of the region's default VPC, if one exists
    async fn find_default_vpc(&self) -> ProviderResult<Option<String>>;

    /// Id of the internet gateway attached to `vpc_id`, if any
    async fn find_internet_gateway_for_vpc(&self, vpc_id: &str) -> ProviderResult<Option<String>>;

    async fn detach_internet_gateway(&self, igw_id: &str, vpc_id: &str) -> ProviderResult<()>;

    async fn delete_internet_gateway(&self, igw_id: &str) -> ProviderResult<()>;

    /// Ids of every subnet in `vpc_id`
    async fn find_subnets_for_vpc(&self, vpc_id: &str) -> ProviderResult<Vec<String>>;

    async fn delete_subnet(&self, subnet_id: &str) -> ProviderResult<()>;

    async fn delete_vpc(&self, vpc_id: &str) -> ProviderResult<()>;

    /// OpenVPN client configuration of a Client VPN endpoint
    async fn export_client_vpn_client_configuration(
        &self,
        endpoint_id: &str,
    ) -> ProviderResult<Option<String>>;
}

fn filter(name: &str, value: &str) -> Filter {
    Filter::builder().name(name).values(value).build()
}

/// EC2 seam backed by the AWS SDK
#[derive(Debug, Clone)]
pub struct SdkEc2 {
    client: aws_sdk_ec2::Client,
}

impl SdkEc2 {
    pub fn new(client: aws_sdk_ec2::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Ec2Api for SdkEc2 {
    async fn find_default_vpc(&self) -> ProviderResult<Option<String>> {
        let output = self
            .client
            .describe_vpcs()
            .filters(filter("isDefault", "true"))
            .send()
            .await
            .map_err(|e| api_error("DescribeVpcs", e))?;

        Ok(output
            .vpcs()
            .iter()
            .find_map(|vpc| vpc.vpc_id())
            .map(str::to_string))
    }

    async fn find_internet_gateway_for_vpc(&self, vpc_id: &str) -> ProviderResult<Option<String>> {
        let output = self
            .client
            .describe_internet_gateways()
            .filters(filter("attachment.vpc-id", vpc_id))
            .send()
            .await
            .map_err(|e| api_error("DescribeInternetGateways", e))?;

        Ok(output
            .internet_gateways()
            .iter()
            .find_map(|igw| igw.internet_gateway_id())
            .map(str::to_string))
    }

    async fn detach_internet_gateway(&self, igw_id: &str, vpc_id: &str) -> ProviderResult<()> {
        self.client
            .detach_internet_gateway()
            .internet_gateway_id(igw_id)
            .vpc_id(vpc_id)
            .send()
            .await
            .map_err(|e| api_error("DetachInternetGateway", e))?;
        Ok(())
    }

    async fn delete_internet_gateway(&self, igw_id: &str) -> ProviderResult<()> {
        self.client
            .delete_internet_gateway()
            .internet_gateway_id(igw_id)
            .send()
            .await
            .map_err(|e| api_error("DeleteInternetGateway", e))?;
        Ok(())
    }

    async fn find_subnets_for_vpc(&self, vpc_id: &str) -> ProviderResult<Vec<String>> {
        let mut subnets = Vec::new();
        let mut next_token = None;

        loop {
            let output = self
                .client
                .describe_subnets()
                .filters(filter("vpc-id", vpc_id))
                .set_next_token(next_token)
                .send()
                .await
                .map_err(|e| api_error("DescribeSubnets", e))?;

            subnets.extend(
                output
                    .subnets()
                    .iter()
                    .filter_map(|s| s.subnet_id())
                    .map(str::to_string),
            );

            next_token = output.next_token().map(str::to_string);
            if next_token.is_none() {
                break;
            }
        }

        Ok(subnets)
    }

    async fn delete_subnet(&self, subnet_id: &str) -> ProviderResult<()> {
        self.client
            .delete_subnet()
            .subnet_id(subnet_id)
            .send()
            .await
            .map_err(|e| api_error("DeleteSubnet", e))?;
        Ok(())
    }

    async fn delete_vpc(&self, vpc_id: &str) -> ProviderResult<()> {
        self.client
            .delete_vpc()
            .vpc_id(vpc_id)
            .send()
            .await
            .map_err(|e| api_error("DeleteVpc", e))?;
        Ok(())
    }

    async fn export_client_vpn_client_configuration(
        &self,
        endpoint_id: &str,
    ) -> ProviderResult<Option<String>> {
        let output = self
            .client
            .export_client_vpn_client_configuration()
            .client_vpn_endpoint_id(endpoint_id)
            .send()
            .await
            .map_err(|e| api_error("ExportClientVpnClientConfiguration", e))?;
        Ok(output.client_configuration().map(str::to_string))
    }
}
