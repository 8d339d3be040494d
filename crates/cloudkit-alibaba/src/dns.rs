//! Alibaba Cloud DNS domains

use crate::client::{AcsClient, RpcRequest};
use crate::error::{AlibabaError, Result};
use async_trait::async_trait;
use cloudkit_core::{
    drain_scope, CancellationToken, Domain, Harvest, Page, PageSource, PaginationCursor,
    ResourceCollector, ResourceKind,
};
use serde::Deserialize;

const DNS_ENDPOINT: &str = "alidns.aliyuncs.com";
const DNS_VERSION: &str = "2015-01-09";

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
struct DescribeDomainsResponse {
    total_count: u64,
    domains: DomainSet,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
struct DomainSet {
    domain: Vec<DomainItem>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
struct DomainItem {
    domain_name: String,
    record_count: u64,
}

struct DomainPages<'a> {
    client: &'a AcsClient,
}

#[async_trait]
impl PageSource for DomainPages<'_> {
    type Item = Domain;
    type Error = AlibabaError;

    async fn fetch_page(&self, cursor: &PaginationCursor) -> Result<Page<Domain>> {
        let request = RpcRequest::new(DNS_ENDPOINT, DNS_VERSION, "DescribeDomains")
            .param("PageNumber", cursor.page_number)
            .param("PageSize", cursor.page_size);
        let response: DescribeDomainsResponse = self.client.call(&request).await?;
        let domains = response
            .domains
            .domain
            .into_iter()
            .map(|d| Domain {
                domain_name: d.domain_name,
                record_count: d.record_count,
            })
            .collect();
        Ok(Page::new(domains, response.total_count))
    }
}

/// DNS collector
pub struct DnsCollector<'a> {
    client: &'a AcsClient,
}

impl<'a> DnsCollector<'a> {
    pub fn new(client: &'a AcsClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ResourceCollector for DnsCollector<'_> {
    fn kind(&self) -> ResourceKind {
        ResourceKind::Dns
    }

    async fn collect(&self, cancel: &CancellationToken) -> cloudkit_core::Result<Harvest> {
        if cancel.is_cancelled() {
            return Ok(Harvest::Domains(Vec::new()));
        }
        tracing::info!("List DNS domains ...");
        let domains = drain_scope(&DomainPages { client: self.client }, "global")
            .await
            .inspect_err(|_| tracing::error!("Describe domains failed."))?;
        Ok(Harvest::Domains(domains))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_domains() {
        let response: DescribeDomainsResponse = serde_json::from_str(
            r#"{"TotalCount":2,"PageNumber":1,"PageSize":100,"Domains":{"Domain":[
                {"DomainName":"example.com","RecordCount":12,"DomainId":"00efd71a"},
                {"DomainName":"example.net"}
            ]}}"#,
        )
        .unwrap();

        assert_eq!(response.total_count, 2);
        assert_eq!(response.domains.domain[0].record_count, 12);
        assert_eq!(response.domains.domain[1].record_count, 0);
    }
}
