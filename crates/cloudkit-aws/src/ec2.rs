//! EC2 instances

use crate::error::{AwsError, Result};
use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_ec2::config::Region;
use aws_sdk_ec2::types::Instance;
use cloudkit_core::{
    CancellationToken, Harvest, Host, PaginatedCollector, ProgressReporter, ResourceCollector,
    ResourceKind, ALL_REGIONS, PAGE_SIZE,
};

fn client_for(config: &SdkConfig, region: &str) -> aws_sdk_ec2::Client {
    let conf = aws_sdk_ec2::config::Builder::from(config)
        .region(Region::new(region.to_string()))
        .build();
    aws_sdk_ec2::Client::from_conf(conf)
}

async fn describe_regions(config: &SdkConfig) -> Result<Vec<String>> {
    let output = aws_sdk_ec2::Client::new(config)
        .describe_regions()
        .send()
        .await
        .map_err(|e| AwsError::from_sdk("DescribeRegions", e))?;
    Ok(output
        .regions()
        .iter()
        .filter_map(|r| r.region_name().map(str::to_string))
        .collect())
}

fn name_tag(instance: &Instance) -> String {
    instance
        .tags()
        .iter()
        .find(|t| t.key() == Some("Name"))
        .and_then(|t| t.value())
        .unwrap_or_default()
        .to_string()
}

fn to_host(instance: &Instance, region: &str) -> Host {
    Host::new(
        instance.instance_id().unwrap_or_default(),
        name_tag(instance),
        instance.public_ip_address().map(str::to_string),
        instance.private_ip_address().map(str::to_string),
        region,
    )
}

/// Every instance in one region, keeping what was read before a failed page
async fn region_instances(config: &SdkConfig, region: &str) -> Vec<Host> {
    let client = client_for(config, region);
    let mut pages = client
        .describe_instances()
        .max_results(PAGE_SIZE as i32)
        .into_paginator()
        .send();

    let mut hosts = Vec::new();
    while let Some(page) = pages.next().await {
        match page {
            Ok(output) => {
                for reservation in output.reservations() {
                    hosts.extend(reservation.instances().iter().map(|i| to_host(i, region)));
                }
            }
            Err(e) => {
                tracing::warn!("{}", AwsError::from_sdk(&format!("DescribeInstances {}", region), e));
                break;
            }
        }
    }
    hosts
}

/// Compute collector
pub struct Ec2Collector<'a> {
    config: &'a SdkConfig,
    region: &'a str,
}

impl<'a> Ec2Collector<'a> {
    pub fn new(config: &'a SdkConfig, region: &'a str) -> Self {
        Self { config, region }
    }
}

#[async_trait]
impl ResourceCollector for Ec2Collector<'_> {
    fn kind(&self) -> ResourceKind {
        ResourceKind::Compute
    }

    async fn collect(&self, cancel: &CancellationToken) -> cloudkit_core::Result<Harvest> {
        tracing::info!("Start enumerating EC2 ...");
        let regions = if self.region == ALL_REGIONS {
            describe_regions(self.config)
                .await
                .inspect_err(|_| tracing::error!("Describe regions failed."))?
        } else {
            vec![self.region.to_string()]
        };

        let config = self.config;
        let hosts = PaginatedCollector::new(regions)
            .with_cancel(cancel.clone())
            .walk_regions(&mut ProgressReporter::stdout(), |region| async move {
                region_instances(config, &region).await
            })
            .await;
        Ok(Harvest::Hosts(hosts))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aws_sdk_ec2::types::Tag;

    #[test]
    fn test_to_host() {
        let instance = Instance::builder()
            .instance_id("i-0abc")
            .public_ip_address("54.1.2.3")
            .private_ip_address("10.0.0.5")
            .tags(Tag::builder().key("env").value("prod").build())
            .tags(Tag::builder().key("Name").value("web-1").build())
            .build();

        let host = to_host(&instance, "us-west-2");
        assert_eq!(host.instance_id, "i-0abc");
        assert_eq!(host.name, "web-1");
        assert!(host.is_public);
        assert_eq!(host.private_ipv4.as_deref(), Some("10.0.0.5"));
        assert_eq!(host.region, "us-west-2");
    }

    #[test]
    fn test_to_host_private_only() {
        let instance = Instance::builder()
            .instance_id("i-0def")
            .private_ip_address("10.0.0.6")
            .build();

        let host = to_host(&instance, "eu-west-1");
        assert!(!host.is_public);
        assert_eq!(host.name, "");
    }
}
