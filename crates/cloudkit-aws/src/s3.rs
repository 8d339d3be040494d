//! S3 buckets and objects

use crate::error::{AwsError, Result};
use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_s3::config::Region;
use cloudkit_core::{
    BucketTotal, CancellationToken, Harvest, ObjectEntry, ResourceCollector, ResourceKind, Storage,
    ALL_REGIONS,
};

/// Location of buckets whose `LocationConstraint` is empty
const US_EAST_1: &str = "us-east-1";

fn client_for(config: &SdkConfig, region: &str) -> aws_sdk_s3::Client {
    let region = if region.is_empty() || region == ALL_REGIONS {
        US_EAST_1
    } else {
        region
    };
    let conf = aws_sdk_s3::config::Builder::from(config)
        .region(Region::new(region.to_string()))
        .build();
    aws_sdk_s3::Client::from_conf(conf)
}

/// Map a `LocationConstraint` to a region name
fn bucket_region(constraint: Option<&str>) -> String {
    match constraint {
        None | Some("") => US_EAST_1.to_string(),
        Some("EU") => "eu-west-1".to_string(),
        Some(region) => region.to_string(),
    }
}

pub async fn list_buckets(config: &SdkConfig) -> Result<Vec<Storage>> {
    let client = client_for(config, US_EAST_1);
    let output = client
        .list_buckets()
        .send()
        .await
        .map_err(|e| AwsError::from_sdk("ListBuckets", e))?;

    let mut buckets = Vec::new();
    for bucket in output.buckets() {
        let Some(name) = bucket.name() else {
            continue;
        };
        let region = match client.get_bucket_location().bucket(name).send().await {
            Ok(location) => bucket_region(location.location_constraint().map(|c| c.as_str())),
            Err(e) => {
                tracing::debug!("{}", AwsError::from_sdk("GetBucketLocation", e));
                String::new()
            }
        };
        buckets.push(Storage {
            bucket_name: name.to_string(),
            region,
        });
    }
    Ok(buckets)
}

/// Visit every page of a bucket listing
async fn walk_objects<F>(config: &SdkConfig, bucket: &Storage, mut visit: F) -> Result<()>
where
    F: FnMut(&[aws_sdk_s3::types::Object]) + Send,
{
    let client = client_for(config, &bucket.region);
    let mut pages = client
        .list_objects_v2()
        .bucket(&bucket.bucket_name)
        .into_paginator()
        .send();

    while let Some(page) = pages.next().await {
        let output = page.map_err(|e| AwsError::from_sdk("ListObjectsV2", e))?;
        visit(output.contents());
    }
    Ok(())
}

pub async fn list_objects(config: &SdkConfig, bucket: &Storage) -> Result<Vec<ObjectEntry>> {
    let mut objects = Vec::new();
    walk_objects(config, bucket, |page| {
        objects.extend(page.iter().map(|o| ObjectEntry {
            bucket: bucket.bucket_name.clone(),
            key: o.key().unwrap_or_default().to_string(),
            size: o.size().unwrap_or_default().max(0) as u64,
        }));
    })
    .await?;
    Ok(objects)
}

pub async fn total_objects(config: &SdkConfig, bucket: &Storage) -> Result<BucketTotal> {
    let mut total = BucketTotal {
        bucket: bucket.bucket_name.clone(),
        region: bucket.region.clone(),
        ..Default::default()
    };
    walk_objects(config, bucket, |page| {
        total.object_count += page.len() as u64;
        total.total_size += page
            .iter()
            .map(|o| o.size().unwrap_or_default().max(0) as u64)
            .sum::<u64>();
    })
    .await?;
    Ok(total)
}

/// Storage collector
pub struct S3Collector<'a> {
    config: &'a SdkConfig,
}

impl<'a> S3Collector<'a> {
    pub fn new(config: &'a SdkConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl ResourceCollector for S3Collector<'_> {
    fn kind(&self) -> ResourceKind {
        ResourceKind::Storage
    }

    async fn collect(&self, cancel: &CancellationToken) -> cloudkit_core::Result<Harvest> {
        if cancel.is_cancelled() {
            return Ok(Harvest::Storages(Vec::new()));
        }
        tracing::info!("List S3 buckets ...");
        let buckets = list_buckets(self.config)
            .await
            .inspect_err(|_| tracing::error!("List buckets failed."))?;
        Ok(Harvest::Storages(buckets))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bucket_region() {
        assert_eq!(bucket_region(None), "us-east-1");
        assert_eq!(bucket_region(Some("")), "us-east-1");
        assert_eq!(bucket_region(Some("EU")), "eu-west-1");
        assert_eq!(bucket_region(Some("ap-northeast-1")), "ap-northeast-1");
    }
}
