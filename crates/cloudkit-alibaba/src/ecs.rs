//! ECS instances and Cloud Assistant command execution

use crate::client::{base_region, regional_endpoint, AcsClient, RpcRequest};
use crate::error::{AlibabaError, Result};
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use cloudkit_core::{
    drain_scope, CancellationToken, CloudError, Harvest, Host, Page, PageSource,
    PaginatedCollector, PaginationCursor, ProgressReporter, ResourceCollector, ResourceKind,
    ALL_REGIONS,
};
use serde::Deserialize;
use std::time::Duration;

const ECS_VERSION: &str = "2014-05-26";
const RESOURCE_MANAGER_ENDPOINT: &str = "resourcemanager.aliyuncs.com";
const RESOURCE_MANAGER_VERSION: &str = "2020-03-31";

const COMMAND_TIMEOUT_SECS: u64 = 60;
const POLL_INTERVAL: Duration = Duration::from_secs(2);
const MAX_POLLS: u32 = 45;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
struct DescribeInstancesResponse {
    total_count: u64,
    instances: InstanceSet,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
struct InstanceSet {
    instance: Vec<Instance>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
struct Instance {
    instance_id: String,
    instance_name: String,
    public_ip_address: IpAddressSet,
    eip_address: EipAddress,
    network_interfaces: NetworkInterfaceSet,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
struct IpAddressSet {
    ip_address: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
struct EipAddress {
    ip_address: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
struct NetworkInterfaceSet {
    network_interface: Vec<NetworkInterface>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
struct NetworkInterface {
    primary_ip_address: String,
    private_ip_sets: PrivateIpSets,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
struct PrivateIpSets {
    private_ip_set: Vec<PrivateIpSet>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
struct PrivateIpSet {
    private_ip_address: String,
}

impl Instance {
    fn into_host(self, region: &str) -> Host {
        let public = self
            .public_ip_address
            .ip_address
            .into_iter()
            .next()
            .filter(|ip| !ip.is_empty())
            .or_else(|| Some(self.eip_address.ip_address).filter(|ip| !ip.is_empty()));

        let interfaces = &self.network_interfaces.network_interface;
        let private = interfaces
            .first()
            .and_then(|nic| nic.private_ip_sets.private_ip_set.first())
            .map(|set| set.private_ip_address.clone())
            .filter(|ip| !ip.is_empty())
            .or_else(|| {
                interfaces
                    .iter()
                    .rev()
                    .map(|nic| nic.primary_ip_address.clone())
                    .find(|ip| !ip.is_empty())
            });

        Host::new(self.instance_id, self.instance_name, public, private, region)
    }
}

/// `DescribeInstances` addressed by region, resource group and page
pub struct InstancePages<'a> {
    client: &'a AcsClient,
}

impl<'a> InstancePages<'a> {
    pub fn new(client: &'a AcsClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl PageSource for InstancePages<'_> {
    type Item = Host;
    type Error = AlibabaError;

    async fn fetch_page(&self, cursor: &PaginationCursor) -> Result<Page<Host>> {
        let request = RpcRequest::new(
            regional_endpoint("ecs", &cursor.region),
            ECS_VERSION,
            "DescribeInstances",
        )
        .param("RegionId", &cursor.region)
        .param("PageNumber", cursor.page_number)
        .param("PageSize", cursor.page_size)
        .param_opt("ResourceGroupId", cursor.scope.as_deref());

        let response: DescribeInstancesResponse = self.client.call(&request).await?;
        let hosts = response
            .instances
            .instance
            .into_iter()
            .map(|i| i.into_host(&cursor.region))
            .collect();
        Ok(Page::new(hosts, response.total_count))
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
struct DescribeRegionsResponse {
    regions: RegionSet,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
struct RegionSet {
    region: Vec<RegionItem>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
struct RegionItem {
    region_id: String,
}

async fn describe_regions(client: &AcsClient, base: &str) -> Result<Vec<String>> {
    let request = RpcRequest::new(regional_endpoint("ecs", base), ECS_VERSION, "DescribeRegions");
    let response: DescribeRegionsResponse = client.call(&request).await?;
    Ok(response
        .regions
        .region
        .into_iter()
        .map(|r| r.region_id)
        .collect())
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
struct ListResourceGroupsResponse {
    total_count: u64,
    resource_groups: ResourceGroupSet,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
struct ResourceGroupSet {
    resource_group: Vec<ResourceGroup>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
struct ResourceGroup {
    id: String,
}

struct ResourceGroupPages<'a> {
    client: &'a AcsClient,
}

#[async_trait]
impl PageSource for ResourceGroupPages<'_> {
    type Item = String;
    type Error = AlibabaError;

    async fn fetch_page(&self, cursor: &PaginationCursor) -> Result<Page<String>> {
        let request = RpcRequest::new(
            RESOURCE_MANAGER_ENDPOINT,
            RESOURCE_MANAGER_VERSION,
            "ListResourceGroups",
        )
        .param("PageNumber", cursor.page_number)
        .param("PageSize", cursor.page_size);

        let response: ListResourceGroupsResponse = self.client.call(&request).await?;
        let ids = response
            .resource_groups
            .resource_group
            .into_iter()
            .map(|g| g.id)
            .collect();
        Ok(Page::new(ids, response.total_count))
    }
}

/// Resource groups to filter by; a single unfiltered scope when none can be listed
async fn resource_group_scopes(client: &AcsClient) -> Vec<Option<String>> {
    match drain_scope(&ResourceGroupPages { client }, "global").await {
        Ok(groups) if !groups.is_empty() => groups.into_iter().map(Some).collect(),
        Ok(_) => vec![None],
        Err(e) => {
            tracing::debug!("ListResourceGroups failed, listing without filter: {}", e);
            vec![None]
        }
    }
}

/// Compute collector
pub struct EcsCollector<'a> {
    client: &'a AcsClient,
    region: &'a str,
}

impl<'a> EcsCollector<'a> {
    pub fn new(client: &'a AcsClient, region: &'a str) -> Self {
        Self { client, region }
    }

    async fn instances(&self, cancel: &CancellationToken) -> Result<Vec<Host>> {
        tracing::info!("Start enumerating ECS ...");
        let base = base_region(self.region);

        let vpcs = RpcRequest::new(regional_endpoint("ecs", base), ECS_VERSION, "DescribeVpcs")
            .param("RegionId", base);
        if let Err(e) = self.client.call::<serde_json::Value>(&vpcs).await {
            tracing::error!("Describe vpcs failed.");
            return Err(CloudError::PermissionDenied(format!("DescribeVpcs: {}", e)).into());
        }

        let regions = if self.region == ALL_REGIONS {
            describe_regions(self.client, base).await.inspect_err(|_| {
                tracing::error!("Describe regions failed.");
            })?
        } else {
            vec![self.region.to_string()]
        };

        let scopes = resource_group_scopes(self.client).await;
        let collector = PaginatedCollector::new(regions)
            .with_scopes(scopes)
            .with_cancel(cancel.clone());
        let mut progress = ProgressReporter::stdout();
        Ok(collector
            .collect(&InstancePages::new(self.client), &mut progress)
            .await)
    }
}

#[async_trait]
impl ResourceCollector for EcsCollector<'_> {
    fn kind(&self) -> ResourceKind {
        ResourceKind::Compute
    }

    async fn collect(&self, cancel: &CancellationToken) -> cloudkit_core::Result<Harvest> {
        Ok(Harvest::Hosts(self.instances(cancel).await?))
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
struct RunCommandResponse {
    invoke_id: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
struct DescribeInvocationResultsResponse {
    invocation: Invocation,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
struct Invocation {
    invocation_results: InvocationResultSet,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
struct InvocationResultSet {
    invocation_result: Vec<InvocationResult>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
struct InvocationResult {
    invoke_record_status: String,
    output: String,
    exit_code: i64,
    error_info: String,
}

impl InvocationResult {
    fn is_finished(&self) -> bool {
        matches!(
            self.invoke_record_status.as_str(),
            "Finished" | "Failed" | "Stopped" | "Terminated"
        )
    }
}

/// Run a shell command through Cloud Assistant and wait for its output
pub async fn run_command(
    client: &AcsClient,
    region: &str,
    instance_id: &str,
    command: &str,
) -> Result<String> {
    if region.is_empty() || region == ALL_REGIONS {
        return Err(CloudError::InvalidArgument(
            "exec-command needs a concrete region".to_string(),
        )
        .into());
    }

    let endpoint = regional_endpoint("ecs", region);
    let run = RpcRequest::new(&endpoint, ECS_VERSION, "RunCommand")
        .param("RegionId", region)
        .param("Type", "RunShellScript")
        .param("CommandContent", STANDARD.encode(command))
        .param("ContentEncoding", "Base64")
        .param("InstanceId.1", instance_id)
        .param("Timeout", COMMAND_TIMEOUT_SECS);
    let response: RunCommandResponse = client.call(&run).await?;
    tracing::info!("Command invoked on {} ({})", instance_id, response.invoke_id);

    let describe = RpcRequest::new(&endpoint, ECS_VERSION, "DescribeInvocationResults")
        .param("RegionId", region)
        .param("InvokeId", &response.invoke_id)
        .param("InstanceId", instance_id);

    for _ in 0..MAX_POLLS {
        tokio::time::sleep(POLL_INTERVAL).await;
        let results: DescribeInvocationResultsResponse = client.call(&describe).await?;
        let Some(result) = results
            .invocation
            .invocation_results
            .invocation_result
            .into_iter()
            .next()
        else {
            continue;
        };
        if !result.is_finished() {
            continue;
        }
        if result.invoke_record_status != "Finished" {
            tracing::warn!(
                "Command ended with {} (exit code {}): {}",
                result.invoke_record_status,
                result.exit_code,
                result.error_info
            );
        }
        return decode_output(&result.output);
    }

    Err(AlibabaError::Timeout(format!(
        "invocation {} did not finish",
        response.invoke_id
    )))
}

fn decode_output(output: &str) -> Result<String> {
    let bytes = STANDARD.decode(output.trim())?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}
