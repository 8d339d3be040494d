//! Security Center alerts

use crate::client::{AcsClient, RpcRequest};
use crate::error::{AlibabaError, Result};
use async_trait::async_trait;
use cloudkit_core::{drain_scope, CloudError, Page, PageSource, PaginationCursor, SecurityEvent};
use serde::Deserialize;

const SAS_ENDPOINT: &str = "tds.aliyuncs.com";
const SAS_VERSION: &str = "2018-12-03";

/// Marks the events as false positives
const WHITELIST_OPERATION: &str = "mark_mis_info";

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
struct DescribeSuspEventsResponse {
    total_count: u64,
    susp_events: Vec<SuspEvent>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
struct SuspEvent {
    id: u64,
    alarm_event_name_display: String,
    instance_name: String,
    internet_ip: String,
    intranet_ip: String,
    level: String,
    last_time: String,
}

impl From<SuspEvent> for SecurityEvent {
    fn from(e: SuspEvent) -> Self {
        let ip = if e.internet_ip.is_empty() {
            e.intranet_ip
        } else {
            e.internet_ip
        };
        SecurityEvent {
            id: e.id.to_string(),
            name: e.alarm_event_name_display,
            affected_asset: e.instance_name,
            ip,
            level: e.level,
            last_time: e.last_time,
        }
    }
}

struct SuspEventPages<'a> {
    client: &'a AcsClient,
}

#[async_trait]
impl PageSource for SuspEventPages<'_> {
    type Item = SecurityEvent;
    type Error = AlibabaError;

    async fn fetch_page(&self, cursor: &PaginationCursor) -> Result<Page<SecurityEvent>> {
        let request = RpcRequest::new(SAS_ENDPOINT, SAS_VERSION, "DescribeSuspEvents")
            .param("CurrentPage", cursor.page_number)
            .param("PageSize", cursor.page_size)
            .param("Lang", "en");
        let response: DescribeSuspEventsResponse = self.client.call(&request).await?;
        Ok(Page::new(
            response
                .susp_events
                .into_iter()
                .map(SecurityEvent::from)
                .collect(),
            response.total_count,
        ))
    }
}

pub async fn dump_events(client: &AcsClient) -> Result<Vec<SecurityEvent>> {
    tracing::info!("Dump security events ...");
    drain_scope(&SuspEventPages { client }, "global").await
}

pub async fn whitelist_events(client: &AcsClient, event_ids: &[String]) -> Result<()> {
    if event_ids.is_empty() {
        return Err(CloudError::InvalidArgument("no event id given".to_string()).into());
    }

    let request = event_ids.iter().enumerate().fold(
        RpcRequest::new(SAS_ENDPOINT, SAS_VERSION, "HandleSecurityEvents")
            .param("OperationCode", WHITELIST_OPERATION),
        |request, (i, id)| request.param(format!("SecurityEventIds.{}", i + 1), id),
    );
    client.call::<serde_json::Value>(&request).await?;
    tracing::info!("Marked {} event(s) as false positive", event_ids.len());
    Ok(())
}
