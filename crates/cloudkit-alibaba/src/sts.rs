//! Caller identity via STS

use crate::client::{AcsClient, RpcRequest};
use crate::error::Result;
use cloudkit_core::CallerIdentity;
use serde::Deserialize;

const STS_ENDPOINT: &str = "sts.aliyuncs.com";
const STS_VERSION: &str = "2015-04-01";

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
struct GetCallerIdentityResponse {
    account_id: String,
    arn: String,
}

pub async fn get_caller_identity(client: &AcsClient) -> Result<CallerIdentity> {
    let request = RpcRequest::new(STS_ENDPOINT, STS_VERSION, "GetCallerIdentity");
    let response: GetCallerIdentityResponse = client.call(&request).await?;
    Ok(CallerIdentity::from_arn(response.arn, response.account_id))
}
