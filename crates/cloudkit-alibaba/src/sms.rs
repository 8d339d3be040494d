//! SMS signatures, templates and today's send volume

use crate::client::{AcsClient, RpcRequest};
use crate::error::Result;
use async_trait::async_trait;
use chrono::Local;
use cloudkit_core::{
    CancellationToken, Harvest, ResourceCollector, ResourceKind, SmsInfo, SmsSign, SmsTemplate,
};
use serde::Deserialize;

const SMS_ENDPOINT: &str = "dysmsapi.aliyuncs.com";
const SMS_VERSION: &str = "2017-05-25";

fn sms(action: &'static str) -> RpcRequest {
    RpcRequest::new(SMS_ENDPOINT, SMS_VERSION, action)
}

/// Human-readable audit status, `None` for states we do not know
fn audit_status(status: &str) -> Option<&'static str> {
    match status {
        "AUDIT_STATE_INIT" => Some("Under review"),
        "AUDIT_STATE_PASS" => Some("Approved"),
        "AUDIT_STATE_NOT_PASS" => Some("Rejected"),
        "AUDIT_STATE_CANCEL" => Some("Cancelled"),
        _ => None,
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
struct QuerySmsSignListResponse {
    sms_sign_list: Vec<SignItem>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
struct SignItem {
    sign_name: String,
    business_type: String,
    audit_status: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
struct QuerySmsTemplateListResponse {
    sms_template_list: Vec<TemplateItem>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
struct TemplateItem {
    template_name: String,
    audit_status: String,
    template_content: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
struct QuerySendStatisticsResponse {
    data: SendStatistics,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
struct SendStatistics {
    target_list: Vec<SendTarget>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
struct SendTarget {
    total_count: u64,
}

fn signs_from(response: QuerySmsSignListResponse) -> Vec<SmsSign> {
    response
        .sms_sign_list
        .into_iter()
        .map(|s| SmsSign {
            status: audit_status(&s.audit_status).unwrap_or_default().to_string(),
            name: s.sign_name,
            kind: s.business_type,
        })
        .collect()
}

fn templates_from(response: QuerySmsTemplateListResponse) -> Vec<SmsTemplate> {
    response
        .sms_template_list
        .into_iter()
        .filter_map(|t| {
            let status = audit_status(&t.audit_status)?;
            Some(SmsTemplate {
                name: t.template_name,
                status: status.to_string(),
                content: t.template_content,
            })
        })
        .collect()
}

async fn list_signs(client: &AcsClient) -> Result<Vec<SmsSign>> {
    let request = sms("QuerySmsSignList").param("PageIndex", 1).param("PageSize", 50);
    Ok(signs_from(client.call(&request).await?))
}

async fn list_templates(client: &AcsClient) -> Result<Vec<SmsTemplate>> {
    let request = sms("QuerySmsTemplateList")
        .param("PageIndex", 1)
        .param("PageSize", 50);
    Ok(templates_from(client.call(&request).await?))
}

/// Messages sent today, domestic and international
async fn daily_size(client: &AcsClient) -> Result<u64> {
    let today = Local::now().format("%Y%m%d").to_string();
    let request = sms("QuerySendStatistics")
        .param("IsGlobe", 1)
        .param("StartDate", &today)
        .param("EndDate", &today)
        .param("PageIndex", 1)
        .param("PageSize", 10);
    let response: QuerySendStatisticsResponse = client.call(&request).await?;
    Ok(response.data.target_list.iter().map(|t| t.total_count).sum())
}

/// Messaging collector
pub struct SmsCollector<'a> {
    client: &'a AcsClient,
}

impl<'a> SmsCollector<'a> {
    pub fn new(client: &'a AcsClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ResourceCollector for SmsCollector<'_> {
    fn kind(&self) -> ResourceKind {
        ResourceKind::Messaging
    }

    async fn collect(&self, cancel: &CancellationToken) -> cloudkit_core::Result<Harvest> {
        if cancel.is_cancelled() {
            return Ok(Harvest::Sms(SmsInfo::default()));
        }
        tracing::info!("List SMS resource ...");

        let signs = list_signs(self.client)
            .await
            .inspect_err(|_| tracing::error!("List SMS failed."))?;
        let templates = list_templates(self.client).await.unwrap_or_else(|e| {
            tracing::debug!("QuerySmsTemplateList failed: {}", e);
            Vec::new()
        });
        let daily_size = daily_size(self.client).await.unwrap_or_else(|e| {
            tracing::debug!("QuerySendStatistics failed: {}", e);
            0
        });

        Ok(Harvest::Sms(SmsInfo {
            signs,
            templates,
            daily_size,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signs_keep_unknown_status_blank() {
        let response: QuerySmsSignListResponse = serde_json::from_str(
            r#"{"Code":"OK","SmsSignList":[
                {"SignName":"Acme","AuditStatus":"AUDIT_STATE_PASS","BusinessType":"验证码类型"},
                {"SignName":"Beta","AuditStatus":"AUDIT_SATE_UNKNOWN","BusinessType":"通用类型"}
            ]}"#,
        )
        .unwrap();
        let signs = signs_from(response);

        assert_eq!(signs.len(), 2);
        assert_eq!(signs[0].status, "Approved");
        assert_eq!(signs[1].status, "");
    }

    #[test]
    fn test_templates_skip_unknown_status() {
        let response: QuerySmsTemplateListResponse = serde_json::from_str(
            r#"{"SmsTemplateList":[
                {"TemplateName":"login","AuditStatus":"AUDIT_STATE_INIT","TemplateContent":"code ${code}"},
                {"TemplateName":"legacy","AuditStatus":"AUDIT_STATE_EXPIRED","TemplateContent":"x"}
            ]}"#,
        )
        .unwrap();
        let templates = templates_from(response);

        assert_eq!(templates.len(), 1);
        assert_eq!(templates[0].name, "login");
        assert_eq!(templates[0].status, "Under review");
    }

    #[test]
    fn test_send_statistics_sum() {
        let response: QuerySendStatisticsResponse = serde_json::from_str(
            r#"{"Code":"OK","Data":{"TotalSize":2,"TargetList":[
                {"TotalCount":40,"RespondedSuccessCount":39},
                {"TotalCount":2}
            ]}}"#,
        )
        .unwrap();
        let total: u64 = response.data.target_list.iter().map(|t| t.total_count).sum();
        assert_eq!(total, 42);
    }
}
