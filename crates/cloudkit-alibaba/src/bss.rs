//! Account balance from the billing service

use crate::client::{AcsClient, RpcRequest};
use crate::error::{AlibabaError, Result};
use async_trait::async_trait;
use cloudkit_core::{AccountBalance, CancellationToken, Harvest, ResourceCollector, ResourceKind};
use serde::Deserialize;

const BSS_ENDPOINT: &str = "business.aliyuncs.com";
const BSS_VERSION: &str = "2017-12-14";

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
struct QueryAccountBalanceResponse {
    code: String,
    message: String,
    request_id: String,
    success: bool,
    data: BalanceData,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
struct BalanceData {
    available_amount: String,
    available_cash_amount: String,
    credit_amount: String,
    currency: String,
}

impl QueryAccountBalanceResponse {
    /// The billing API reports failures in the body with HTTP 200
    fn into_balance(self) -> Result<AccountBalance> {
        if !self.success {
            return Err(AlibabaError::Api {
                code: self.code,
                message: self.message,
                request_id: self.request_id,
            });
        }
        Ok(AccountBalance {
            available_amount: self.data.available_amount,
            available_cash_amount: self.data.available_cash_amount,
            credit_amount: self.data.credit_amount,
            currency: self.data.currency,
        })
    }
}

pub async fn query_account_balance(client: &AcsClient) -> Result<AccountBalance> {
    let request = RpcRequest::new(BSS_ENDPOINT, BSS_VERSION, "QueryAccountBalance");
    let response: QueryAccountBalanceResponse = client.call(&request).await?;
    response.into_balance()
}

/// Balance collector
pub struct BalanceCollector<'a> {
    client: &'a AcsClient,
}

impl<'a> BalanceCollector<'a> {
    pub fn new(client: &'a AcsClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ResourceCollector for BalanceCollector<'_> {
    fn kind(&self) -> ResourceKind {
        ResourceKind::Balance
    }

    async fn collect(&self, _cancel: &CancellationToken) -> cloudkit_core::Result<Harvest> {
        let balance = query_account_balance(self.client)
            .await
            .inspect_err(|_| tracing::error!("Query account balance failed."))?;
        tracing::info!(
            "Available balance: {} {}",
            balance.available_amount,
            balance.currency
        );
        Ok(Harvest::Balance(balance))
    }
}
