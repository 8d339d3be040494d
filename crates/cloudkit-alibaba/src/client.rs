//! Signed HTTP client for Alibaba Cloud OpenAPI and OSS

use crate::error::{AlibabaError, Result};
use crate::sign::{
    self, Acs3Signer, Oss4Signer, OSS_UNSIGNED_PAYLOAD, acs_date, canonical_query, oss_date,
    sha256_hex,
};
use chrono::Utc;
use cloudkit_core::{keys, Options};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Region used for calls that need one when the user asked for `all`
pub const DEFAULT_REGION: &str = "cn-hangzhou";

/// AccessKey pair plus optional STS token
#[derive(Clone)]
pub struct AlibabaCredentials {
    pub access_key_id: String,
    pub access_key_secret: String,
    pub security_token: Option<String>,
}

impl AlibabaCredentials {
    /// Fails with `MissingCredentialKey` before any request is made
    pub fn from_options(options: &Options) -> cloudkit_core::Result<Self> {
        Ok(Self {
            access_key_id: options.require(keys::ACCESS_KEY)?.to_string(),
            access_key_secret: options.require(keys::SECRET_KEY)?.to_string(),
            security_token: options.get(keys::SECURITY_TOKEN).map(str::to_string),
        })
    }
}

impl std::fmt::Debug for AlibabaCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AlibabaCredentials")
            .field("access_key_id", &self.access_key_id)
            .field("access_key_secret", &"***")
            .field("security_token", &self.security_token.as_ref().map(|_| "***"))
            .finish()
    }
}

/// One RPC-style API call
#[derive(Debug, Clone)]
pub struct RpcRequest {
    endpoint: String,
    version: &'static str,
    action: &'static str,
    params: Vec<(String, String)>,
}

impl RpcRequest {
    pub fn new(endpoint: impl Into<String>, version: &'static str, action: &'static str) -> Self {
        Self {
            endpoint: endpoint.into(),
            version,
            action,
            params: Vec::new(),
        }
    }

    pub fn param(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.params.push((key.into(), value.to_string()));
        self
    }

    /// Add the parameter only when a value is present
    pub fn param_opt(self, key: impl Into<String>, value: Option<&str>) -> Self {
        match value {
            Some(v) if !v.is_empty() => self.param(key, v),
            _ => self,
        }
    }

    pub fn action(&self) -> &str {
        self.action
    }
}

/// Error body shared by RPC APIs (JSON) and OSS (XML)
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
struct ErrorBody {
    code: String,
    message: String,
    request_id: String,
}

impl ErrorBody {
    fn into_error(self) -> AlibabaError {
        AlibabaError::Api {
            code: self.code,
            message: self.message,
            request_id: self.request_id,
        }
    }
}

/// Alibaba Cloud API client
#[derive(Clone)]
pub struct AcsClient {
    http: reqwest::Client,
    creds: Arc<AlibabaCredentials>,
}

impl AcsClient {
    pub fn new(creds: AlibabaCredentials) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            http,
            creds: Arc::new(creds),
        })
    }

    pub fn credentials(&self) -> &AlibabaCredentials {
        &self.creds
    }

    /// Call an RPC-style API and decode its JSON response
    pub async fn call<T: DeserializeOwned>(&self, request: &RpcRequest) -> Result<T> {
        let now = Utc::now();
        let mut headers = BTreeMap::new();
        headers.insert("host".to_string(), request.endpoint.clone());
        headers.insert("x-acs-action".to_string(), request.action.to_string());
        headers.insert("x-acs-version".to_string(), request.version.to_string());
        headers.insert("x-acs-date".to_string(), acs_date(now));
        headers.insert(
            "x-acs-signature-nonce".to_string(),
            uuid::Uuid::new_v4().to_string(),
        );
        headers.insert("x-acs-content-sha256".to_string(), sha256_hex(b""));
        if let Some(token) = &self.creds.security_token {
            headers.insert("x-acs-security-token".to_string(), token.clone());
        }

        let authorization = Acs3Signer {
            access_key_id: &self.creds.access_key_id,
            access_key_secret: &self.creds.access_key_secret,
        }
        .authorization("POST", &request.params, &headers, b"");

        let url = rpc_url(&request.endpoint, &request.params);
        tracing::debug!("{} {}", request.action, url);

        let mut builder = self
            .http
            .post(&url)
            .header("Authorization", authorization)
            .header("Accept", "application/json");
        for (name, value) in headers.iter().filter(|(k, _)| *k != "host") {
            builder = builder.header(name.as_str(), value.as_str());
        }

        let response = builder.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(match serde_json::from_str::<ErrorBody>(&body) {
                Ok(e) if !e.code.is_empty() => e.into_error(),
                _ => AlibabaError::InvalidResponse(format!("HTTP {}: {}", status, body)),
            });
        }

        Ok(serde_json::from_str(&body)?)
    }

    /// GET an OSS service or bucket resource and decode its XML response
    pub async fn oss_get<T: DeserializeOwned>(
        &self,
        region: &str,
        bucket: Option<&str>,
        query: &[(String, String)],
    ) -> Result<T> {
        let now = Utc::now();
        let host = oss_host(region, bucket);
        let resource = match bucket {
            Some(b) => format!("/{}/", b),
            None => "/".to_string(),
        };

        let mut headers = BTreeMap::new();
        headers.insert("x-oss-date".to_string(), oss_date(now));
        headers.insert(
            "x-oss-content-sha256".to_string(),
            OSS_UNSIGNED_PAYLOAD.to_string(),
        );
        if let Some(token) = &self.creds.security_token {
            headers.insert("x-oss-security-token".to_string(), token.clone());
        }

        let authorization = Oss4Signer {
            access_key_id: &self.creds.access_key_id,
            access_key_secret: &self.creds.access_key_secret,
            region,
        }
        .authorization("GET", &resource, query, &headers, now);

        let url = if query.is_empty() {
            format!("https://{}/", host)
        } else {
            format!("https://{}/?{}", host, sign::oss_canonical_query(query))
        };
        tracing::debug!("OSS GET {}", url);

        let mut builder = self.http.get(&url).header("Authorization", authorization);
        for (name, value) in &headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        let response = builder.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(match quick_xml::de::from_str::<ErrorBody>(&body) {
                Ok(e) if !e.code.is_empty() => e.into_error(),
                _ => AlibabaError::InvalidResponse(format!("HTTP {}: {}", status, body)),
            });
        }

        Ok(quick_xml::de::from_str(&body)?)
    }
}

fn rpc_url(endpoint: &str, params: &[(String, String)]) -> String {
    if params.is_empty() {
        format!("https://{}/", endpoint)
    } else {
        format!("https://{}/?{}", endpoint, canonical_query(params))
    }
}

fn oss_host(region: &str, bucket: Option<&str>) -> String {
    match bucket {
        Some(b) => format!("{}.oss-{}.aliyuncs.com", b, region),
        None => format!("oss-{}.aliyuncs.com", region),
    }
}

/// `ecs.cn-hangzhou.aliyuncs.com` style regional endpoint
pub fn regional_endpoint(product: &str, region: &str) -> String {
    format!("{}.{}.aliyuncs.com", product, region)
}

/// Turn `all` into the region used for global calls
pub fn base_region(region: &str) -> &str {
    if region == cloudkit_core::ALL_REGIONS || region.is_empty() {
        DEFAULT_REGION
    } else {
        region
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cloudkit_core::CloudError;

    #[test]
    fn test_credentials_fail_fast() {
        let options = Options::new().with(keys::SECRET_KEY, "sk");
        match AlibabaCredentials::from_options(&options) {
            Err(CloudError::MissingCredentialKey(key)) => assert_eq!(key, "access_key"),
            other => panic!("unexpected: {:?}", other.map(|_| ())),
        }

        let options = Options::new().with(keys::ACCESS_KEY, "ak");
        assert!(matches!(
            AlibabaCredentials::from_options(&options),
            Err(CloudError::MissingCredentialKey(_))
        ));
    }

    #[test]
    fn test_credentials_debug_hides_secret() {
        let creds = AlibabaCredentials::from_options(
            &Options::new()
                .with(keys::ACCESS_KEY, "LTAI-visible")
                .with(keys::SECRET_KEY, "hidden-secret"),
        )
        .unwrap();
        let debug = format!("{:?}", creds);
        assert!(debug.contains("LTAI-visible"));
        assert!(!debug.contains("hidden-secret"));
        assert!(creds.security_token.is_none());
    }

    #[test]
    fn test_request_builder() {
        let request = RpcRequest::new("ecs.cn-hangzhou.aliyuncs.com", "2014-05-26", "DescribeInstances")
            .param("RegionId", "cn-hangzhou")
            .param("PageSize", 100)
            .param_opt("ResourceGroupId", None)
            .param_opt("Tag", Some(""));

        assert_eq!(request.action(), "DescribeInstances");
        assert_eq!(
            rpc_url(&request.endpoint, &request.params),
            "https://ecs.cn-hangzhou.aliyuncs.com/?PageSize=100&RegionId=cn-hangzhou"
        );
    }

    #[test]
    fn test_error_body_json_and_xml() {
        let json = r#"{"RequestId":"R1","Code":"Forbidden.RAM","Message":"denied"}"#;
        let err = serde_json::from_str::<ErrorBody>(json).unwrap().into_error();
        assert!(err.is_permission_denied());

        let xml = "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<Error><Code>NoSuchBucket</Code><Message>missing</Message><RequestId>R2</RequestId></Error>";
        let body: ErrorBody = quick_xml::de::from_str(xml).unwrap();
        assert_eq!(body.code, "NoSuchBucket");
        assert_eq!(body.request_id, "R2");
    }

    #[test]
    fn test_endpoints() {
        assert_eq!(oss_host("cn-beijing", None), "oss-cn-beijing.aliyuncs.com");
        assert_eq!(
            oss_host("cn-beijing", Some("logs")),
            "logs.oss-cn-beijing.aliyuncs.com"
        );
        assert_eq!(regional_endpoint("rds", "cn-shanghai"), "rds.cn-shanghai.aliyuncs.com");
        assert_eq!(base_region("all"), "cn-hangzhou");
        assert_eq!(base_region("ap-southeast-1"), "ap-southeast-1");
    }
}
