//! OSS buckets and objects

use crate::client::{base_region, AcsClient};
use crate::error::Result;
use async_trait::async_trait;
use cloudkit_core::{
    BucketTotal, CancellationToken, Harvest, ObjectEntry, ResourceCollector, ResourceKind, Storage,
};
use serde::Deserialize;

const MAX_KEYS: &str = "1000";

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
struct ListAllMyBucketsResult {
    buckets: BucketSet,
    is_truncated: bool,
    next_marker: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
struct BucketSet {
    bucket: Vec<BucketInfo>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
struct BucketInfo {
    name: String,
    location: String,
}

impl From<BucketInfo> for Storage {
    fn from(b: BucketInfo) -> Self {
        Storage {
            region: b.location.trim_start_matches("oss-").to_string(),
            bucket_name: b.name,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
struct ListBucketResult {
    is_truncated: bool,
    next_continuation_token: String,
    contents: Vec<ObjectContent>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
struct ObjectContent {
    key: String,
    size: u64,
}

/// Every bucket visible to the account, following `NextMarker`
pub async fn list_buckets(client: &AcsClient, region: &str) -> Result<Vec<Storage>> {
    let region = base_region(region);
    let mut buckets = Vec::new();
    let mut marker = String::new();

    loop {
        let mut query = vec![("max-keys".to_string(), MAX_KEYS.to_string())];
        if !marker.is_empty() {
            query.push(("marker".to_string(), marker.clone()));
        }
        let result: ListAllMyBucketsResult = client.oss_get(region, None, &query).await?;
        buckets.extend(result.buckets.bucket.into_iter().map(Storage::from));

        if !result.is_truncated || result.next_marker.is_empty() {
            break;
        }
        marker = result.next_marker;
    }
    Ok(buckets)
}

/// Walk every object of a bucket with ListObjectsV2, calling `visit` per page
async fn walk_objects<F>(client: &AcsClient, bucket: &Storage, mut visit: F) -> Result<()>
where
    F: FnMut(Vec<ObjectContent>) + Send,
{
    let region = base_region(&bucket.region);
    let mut token = String::new();

    loop {
        let mut query = vec![
            ("list-type".to_string(), "2".to_string()),
            ("max-keys".to_string(), MAX_KEYS.to_string()),
        ];
        if !token.is_empty() {
            query.push(("continuation-token".to_string(), token.clone()));
        }
        let result: ListBucketResult = client
            .oss_get(region, Some(&bucket.bucket_name), &query)
            .await?;
        visit(result.contents);

        if !result.is_truncated || result.next_continuation_token.is_empty() {
            break;
        }
        token = result.next_continuation_token;
    }
    Ok(())
}

pub async fn list_objects(client: &AcsClient, bucket: &Storage) -> Result<Vec<ObjectEntry>> {
    let mut objects = Vec::new();
    walk_objects(client, bucket, |page| {
        objects.extend(page.into_iter().map(|o| ObjectEntry {
            bucket: bucket.bucket_name.clone(),
            key: o.key,
            size: o.size,
        }));
    })
    .await?;
    Ok(objects)
}

pub async fn total_objects(client: &AcsClient, bucket: &Storage) -> Result<BucketTotal> {
    let mut total = BucketTotal {
        bucket: bucket.bucket_name.clone(),
        region: bucket.region.clone(),
        ..Default::default()
    };
    walk_objects(client, bucket, |page| {
        total.object_count += page.len() as u64;
        total.total_size += page.iter().map(|o| o.size).sum::<u64>();
    })
    .await?;
    Ok(total)
}

/// Storage collector
pub struct OssCollector<'a> {
    client: &'a AcsClient,
    region: &'a str,
}

impl<'a> OssCollector<'a> {
    pub fn new(client: &'a AcsClient, region: &'a str) -> Self {
        Self { client, region }
    }
}

#[async_trait]
impl ResourceCollector for OssCollector<'_> {
    fn kind(&self) -> ResourceKind {
        ResourceKind::Storage
    }

    async fn collect(&self, cancel: &CancellationToken) -> cloudkit_core::Result<Harvest> {
        if cancel.is_cancelled() {
            return Ok(Harvest::Storages(Vec::new()));
        }
        tracing::info!("List OSS buckets ...");
        let buckets = list_buckets(self.client, self.region)
            .await
            .inspect_err(|_| tracing::error!("List buckets failed."))?;
        Ok(Harvest::Storages(buckets))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_list_buckets() {
        let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
<ListAllMyBucketsResult>
  <Owner>
    <ID>512**</ID>
    <DisplayName>512**</DisplayName>
  </Owner>
  <Buckets>
    <Bucket>
      <CreationDate>2014-02-17T18:12:43.000Z</CreationDate>
      <Location>oss-cn-shanghai</Location>
      <Name>app-base-oss</Name>
      <StorageClass>Standard</StorageClass>
    </Bucket>
    <Bucket>
      <CreationDate>2014-02-25T11:21:04.000Z</CreationDate>
      <Location>oss-cn-hangzhou</Location>
      <Name>mybucket</Name>
      <StorageClass>IA</StorageClass>
    </Bucket>
  </Buckets>
  <IsTruncated>true</IsTruncated>
  <NextMarker>mybucket</NextMarker>
</ListAllMyBucketsResult>"#;

        let result: ListAllMyBucketsResult = quick_xml::de::from_str(xml).unwrap();
        assert!(result.is_truncated);
        assert_eq!(result.next_marker, "mybucket");

        let buckets: Vec<Storage> = result.buckets.bucket.into_iter().map(Storage::from).collect();
        assert_eq!(buckets[0].bucket_name, "app-base-oss");
        assert_eq!(buckets[0].region, "cn-shanghai");
        assert_eq!(buckets[1].region, "cn-hangzhou");
    }

    #[test]
    fn test_parse_list_objects() {
        let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
<ListBucketResult>
  <Name>examplebucket</Name>
  <Prefix></Prefix>
  <MaxKeys>1000</MaxKeys>
  <IsTruncated>false</IsTruncated>
  <Contents>
    <Key>backup/db.sql</Key>
    <Size>2048</Size>
  </Contents>
  <Contents>
    <Key>index.html</Key>
    <Size>512</Size>
  </Contents>
  <KeyCount>2</KeyCount>
</ListBucketResult>"#;

        let result: ListBucketResult = quick_xml::de::from_str(xml).unwrap();
        assert!(!result.is_truncated);
        assert_eq!(result.contents.len(), 2);
        assert_eq!(result.contents[0].key, "backup/db.sql");
        assert_eq!(result.contents.iter().map(|o| o.size).sum::<u64>(), 2560);
    }
}
