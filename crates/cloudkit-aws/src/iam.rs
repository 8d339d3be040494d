//! IAM users and roles

use crate::error::{AwsError, Result};
use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_iam::primitives::{DateTime, DateTimeFormat};
use cloudkit_core::{
    CancellationToken, Harvest, LoginProfile, ResourceCollector, ResourceKind, User,
};

const ADMIN_POLICY_ARN: &str = "arn:aws:iam::aws:policy/AdministratorAccess";

fn format_time(time: Option<&DateTime>) -> String {
    time.and_then(|t| t.fmt(DateTimeFormat::DateTime).ok())
        .unwrap_or_default()
}

async fn login_enabled(client: &aws_sdk_iam::Client, user_name: &str) -> bool {
    match client.get_login_profile().user_name(user_name).send().await {
        Ok(_) => true,
        Err(e) => {
            let e = AwsError::from_sdk("GetLoginProfile", e);
            if !e.is_not_found() {
                tracing::debug!("{}", e);
            }
            false
        }
    }
}

pub async fn list_users(config: &SdkConfig) -> Result<Vec<User>> {
    let client = aws_sdk_iam::Client::new(config);
    let mut pages = client.list_users().into_paginator().send();

    let mut users = Vec::new();
    while let Some(page) = pages.next().await {
        let output = page.map_err(|e| AwsError::from_sdk("ListUsers", e))?;
        for u in output.users() {
            users.push(User {
                user_name: u.user_name().to_string(),
                user_id: u.user_id().to_string(),
                enable_login: login_enabled(&client, u.user_name()).await,
                last_login: format_time(u.password_last_used()),
                create_time: format_time(Some(u.create_date())),
            });
        }
    }
    Ok(users)
}

/// Identity collector
pub struct IamCollector<'a> {
    config: &'a SdkConfig,
}

impl<'a> IamCollector<'a> {
    pub fn new(config: &'a SdkConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl ResourceCollector for IamCollector<'_> {
    fn kind(&self) -> ResourceKind {
        ResourceKind::Identity
    }

    async fn collect(&self, cancel: &CancellationToken) -> cloudkit_core::Result<Harvest> {
        if cancel.is_cancelled() {
            return Ok(Harvest::Users(Vec::new()));
        }
        tracing::info!("List IAM users ...");
        let users = list_users(self.config)
            .await
            .inspect_err(|_| tracing::error!("List users failed."))?;
        Ok(Harvest::Users(users))
    }
}

fn console_url(account_id: &str) -> String {
    format!("https://{}.signin.aws.amazon.com/console", account_id)
}

fn trust_policy(account_id: &str) -> String {
    serde_json::json!({
        "Version": "2012-10-17",
        "Statement": [{
            "Effect": "Allow",
            "Principal": { "AWS": format!("arn:aws:iam::{}:root", account_id) },
            "Action": "sts:AssumeRole"
        }]
    })
    .to_string()
}

/// Create a console user with `AdministratorAccess`
pub async fn add_user(
    config: &SdkConfig,
    account_id: &str,
    user_name: &str,
    password: &str,
) -> Result<LoginProfile> {
    let client = aws_sdk_iam::Client::new(config);
    client
        .create_user()
        .user_name(user_name)
        .send()
        .await
        .map_err(|e| AwsError::from_sdk("CreateUser", e))?;
    client
        .create_login_profile()
        .user_name(user_name)
        .password(password)
        .password_reset_required(false)
        .send()
        .await
        .map_err(|e| AwsError::from_sdk("CreateLoginProfile", e))?;
    client
        .attach_user_policy()
        .user_name(user_name)
        .policy_arn(ADMIN_POLICY_ARN)
        .send()
        .await
        .map_err(|e| AwsError::from_sdk("AttachUserPolicy", e))?;

    Ok(LoginProfile {
        user_name: user_name.to_string(),
        password: password.to_string(),
        login_url: console_url(account_id),
    })
}

/// Ignore `NoSuchEntity` so deletion can resume after a partial run
fn tolerate_missing<T>(result: Result<T>) -> Result<()> {
    match result {
        Ok(_) => Ok(()),
        Err(e) if e.is_not_found() => {
            tracing::debug!("Skipped: {}", e);
            Ok(())
        }
        Err(e) => Err(e),
    }
}

pub async fn delete_user(config: &SdkConfig, user_name: &str) -> Result<()> {
    let client = aws_sdk_iam::Client::new(config);
    tolerate_missing(
        client
            .delete_login_profile()
            .user_name(user_name)
            .send()
            .await
            .map_err(|e| AwsError::from_sdk("DeleteLoginProfile", e)),
    )?;
    tolerate_missing(
        client
            .detach_user_policy()
            .user_name(user_name)
            .policy_arn(ADMIN_POLICY_ARN)
            .send()
            .await
            .map_err(|e| AwsError::from_sdk("DetachUserPolicy", e)),
    )?;
    client
        .delete_user()
        .user_name(user_name)
        .send()
        .await
        .map_err(|e| AwsError::from_sdk("DeleteUser", e))?;
    Ok(())
}

/// Create a role assumable from `account_id` with `AdministratorAccess`
pub async fn add_role(config: &SdkConfig, role_name: &str, account_id: &str) -> Result<()> {
    if account_id.is_empty() {
        return Err(cloudkit_core::CloudError::InvalidArgument(
            "trusted account id is empty".to_string(),
        )
        .into());
    }

    let client = aws_sdk_iam::Client::new(config);
    client
        .create_role()
        .role_name(role_name)
        .assume_role_policy_document(trust_policy(account_id))
        .send()
        .await
        .map_err(|e| AwsError::from_sdk("CreateRole", e))?;
    client
        .attach_role_policy()
        .role_name(role_name)
        .policy_arn(ADMIN_POLICY_ARN)
        .send()
        .await
        .map_err(|e| AwsError::from_sdk("AttachRolePolicy", e))?;
    Ok(())
}

pub async fn delete_role(config: &SdkConfig, role_name: &str) -> Result<()> {
    let client = aws_sdk_iam::Client::new(config);
    tolerate_missing(
        client
            .detach_role_policy()
            .role_name(role_name)
            .policy_arn(ADMIN_POLICY_ARN)
            .send()
            .await
            .map_err(|e| AwsError::from_sdk("DetachRolePolicy", e)),
    )?;
    client
        .delete_role()
        .role_name(role_name)
        .send()
        .await
        .map_err(|e| AwsError::from_sdk("DeleteRole", e))?;
    Ok(())
}
