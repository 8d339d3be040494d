//! RDS instances

use crate::client::{AcsClient, RpcRequest};
use crate::error::{AlibabaError, Result};
use async_trait::async_trait;
use cloudkit_core::{
    CancellationToken, Database, Harvest, Page, PageSource, PaginatedCollector, PaginationCursor,
    ProgressReporter, ResourceCollector, ResourceKind, ALL_REGIONS,
};
use serde::Deserialize;

const RDS_ENDPOINT: &str = "rds.aliyuncs.com";
const RDS_VERSION: &str = "2014-08-15";

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct DescribeRegionsResponse {
    #[serde(rename = "Regions")]
    regions: RdsRegionSet,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RdsRegionSet {
    #[serde(rename = "RDSRegion")]
    rds_region: Vec<RdsRegion>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RdsRegion {
    #[serde(rename = "RegionId")]
    region_id: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct DescribeDbInstancesResponse {
    #[serde(rename = "TotalRecordCount")]
    total_record_count: u64,
    #[serde(rename = "Items")]
    items: DbInstanceSet,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct DbInstanceSet {
    #[serde(rename = "DBInstance")]
    db_instance: Vec<DbInstance>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct DbInstance {
    #[serde(rename = "DBInstanceId")]
    id: String,
    #[serde(rename = "Engine")]
    engine: String,
    #[serde(rename = "EngineVersion")]
    engine_version: String,
    #[serde(rename = "RegionId")]
    region_id: String,
    #[serde(rename = "DBInstanceNetType")]
    net_type: String,
    #[serde(rename = "ConnectionString")]
    connection_string: String,
}

impl From<DbInstance> for Database {
    fn from(db: DbInstance) -> Self {
        Database {
            instance_id: db.id,
            engine: db.engine,
            engine_version: db.engine_version,
            region: db.region_id,
            net_type: db.net_type,
            address: db.connection_string,
        }
    }
}

/// Region ids that offer RDS; the API lists one entry per zone
async fn describe_regions(client: &AcsClient) -> Result<Vec<String>> {
    let request = RpcRequest::new(RDS_ENDPOINT, RDS_VERSION, "DescribeRegions");
    let response: DescribeRegionsResponse = client.call(&request).await?;
    Ok(dedup_regions(response))
}

fn dedup_regions(response: DescribeRegionsResponse) -> Vec<String> {
    let mut regions: Vec<String> = Vec::new();
    for r in response.regions.rds_region {
        if !regions.contains(&r.region_id) {
            regions.push(r.region_id);
        }
    }
    regions
}

struct DbInstancePages<'a> {
    client: &'a AcsClient,
}

#[async_trait]
impl PageSource for DbInstancePages<'_> {
    type Item = Database;
    type Error = AlibabaError;

    async fn fetch_page(&self, cursor: &PaginationCursor) -> Result<Page<Database>> {
        let request = RpcRequest::new(RDS_ENDPOINT, RDS_VERSION, "DescribeDBInstances")
            .param("RegionId", &cursor.region)
            .param("PageNumber", cursor.page_number)
            .param("PageSize", cursor.page_size);
        let response: DescribeDbInstancesResponse = self.client.call(&request).await?;
        Ok(Page::new(
            response
                .items
                .db_instance
                .into_iter()
                .map(Database::from)
                .collect(),
            response.total_record_count,
        ))
    }
}

/// Database collector
pub struct RdsCollector<'a> {
    client: &'a AcsClient,
    region: &'a str,
}

impl<'a> RdsCollector<'a> {
    pub fn new(client: &'a AcsClient, region: &'a str) -> Self {
        Self { client, region }
    }
}

#[async_trait]
impl ResourceCollector for RdsCollector<'_> {
    fn kind(&self) -> ResourceKind {
        ResourceKind::Database
    }

    async fn collect(&self, cancel: &CancellationToken) -> cloudkit_core::Result<Harvest> {
        tracing::info!("Start enumerating RDS ...");
        let regions = if self.region == ALL_REGIONS {
            describe_regions(self.client)
                .await
                .inspect_err(|_| tracing::error!("Describe regions failed."))?
        } else {
            vec![self.region.to_string()]
        };

        let collector = PaginatedCollector::new(regions).with_cancel(cancel.clone());
        let databases = collector
            .collect(
                &DbInstancePages {
                    client: self.client,
                },
                &mut ProgressReporter::stdout(),
            )
            .await;
        Ok(Harvest::Databases(databases))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_regions_deduplicated() {
        let response: DescribeRegionsResponse = serde_json::from_str(
            r#"{"Regions":{"RDSRegion":[
                {"RegionId":"cn-hangzhou","ZoneId":"cn-hangzhou-a"},
                {"RegionId":"cn-hangzhou","ZoneId":"cn-hangzhou-b"},
                {"RegionId":"cn-beijing","ZoneId":"cn-beijing-a"}
            ]}}"#,
        )
        .unwrap();
        assert_eq!(dedup_regions(response), vec!["cn-hangzhou", "cn-beijing"]);
    }

    #[test]
    fn test_parse_db_instances() {
        let response: DescribeDbInstancesResponse = serde_json::from_str(
            r#"{"TotalRecordCount":1,"PageNumber":1,"Items":{"DBInstance":[
                {"DBInstanceId":"rm-uf6wjk5x","Engine":"MySQL","EngineVersion":"8.0",
                 "RegionId":"cn-shanghai","DBInstanceNetType":"Intranet"}
            ]}}"#,
        )
        .unwrap();
        assert_eq!(response.total_record_count, 1);

        let db = Database::from(response.items.db_instance.into_iter().next().unwrap());
        assert_eq!(db.instance_id, "rm-uf6wjk5x");
        assert_eq!(db.engine, "MySQL");
        assert_eq!(db.net_type, "Intranet");
        assert!(db.address.is_empty());
    }
}
