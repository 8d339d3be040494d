//! RAM users and roles

use crate::client::{AcsClient, RpcRequest};
use crate::error::{AlibabaError, Result};
use async_trait::async_trait;
use cloudkit_core::{
    CancellationToken, Harvest, LoginProfile, ResourceCollector, ResourceKind, User,
};
use serde::Deserialize;

const RAM_ENDPOINT: &str = "ram.aliyuncs.com";
const RAM_VERSION: &str = "2015-05-01";
const ADMIN_POLICY: &str = "AdministratorAccess";

fn ram(action: &'static str) -> RpcRequest {
    RpcRequest::new(RAM_ENDPOINT, RAM_VERSION, action)
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
struct ListUsersResponse {
    users: UserSet,
    is_truncated: bool,
    marker: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
struct UserSet {
    user: Vec<RamUser>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
struct RamUser {
    user_name: String,
    user_id: String,
    create_date: String,
    last_login_date: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
struct GetUserResponse {
    user: RamUser,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
struct GetAccountAliasResponse {
    account_alias: String,
}

async fn list_ram_users(client: &AcsClient) -> Result<Vec<RamUser>> {
    let mut users = Vec::new();
    let mut marker = String::new();
    loop {
        let request = ram("ListUsers")
            .param("MaxItems", 100)
            .param_opt("Marker", Some(marker.as_str()));
        let response: ListUsersResponse = client.call(&request).await?;
        users.extend(response.users.user);

        if !response.is_truncated || response.marker.is_empty() {
            break;
        }
        marker = response.marker;
    }
    Ok(users)
}

/// Whether the user can sign in to the console
async fn login_enabled(client: &AcsClient, user_name: &str) -> bool {
    let request = ram("GetLoginProfile").param("UserName", user_name);
    match client.call::<serde_json::Value>(&request).await {
        Ok(_) => true,
        Err(e) if e.is_not_found() => false,
        Err(e) => {
            tracing::debug!("GetLoginProfile {} failed: {}", user_name, e);
            false
        }
    }
}

async fn last_login(client: &AcsClient, user_name: &str) -> String {
    let request = ram("GetUser").param("UserName", user_name);
    match client.call::<GetUserResponse>(&request).await {
        Ok(response) => response.user.last_login_date,
        Err(e) => {
            tracing::debug!("GetUser {} failed: {}", user_name, e);
            String::new()
        }
    }
}

pub async fn list_users(client: &AcsClient) -> Result<Vec<User>> {
    let mut users = Vec::new();
    for u in list_ram_users(client).await? {
        users.push(User {
            enable_login: login_enabled(client, &u.user_name).await,
            last_login: last_login(client, &u.user_name).await,
            user_name: u.user_name,
            user_id: u.user_id,
            create_time: u.create_date,
        });
    }
    Ok(users)
}

/// Identity collector
pub struct RamCollector<'a> {
    client: &'a AcsClient,
}

impl<'a> RamCollector<'a> {
    pub fn new(client: &'a AcsClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ResourceCollector for RamCollector<'_> {
    fn kind(&self) -> ResourceKind {
        ResourceKind::Identity
    }

    async fn collect(&self, cancel: &CancellationToken) -> cloudkit_core::Result<Harvest> {
        if cancel.is_cancelled() {
            return Ok(Harvest::Users(Vec::new()));
        }
        tracing::info!("List RAM users ...");
        let users = list_users(self.client)
            .await
            .inspect_err(|_| tracing::error!("List users failed."))?;
        Ok(Harvest::Users(users))
    }
}

/// `https://signin.aliyun.com/<alias>.onaliyun.com/login.htm`
fn login_url(alias: &str) -> String {
    format!("https://signin.aliyun.com/{}.onaliyun.com/login.htm", alias)
}

/// Policy letting the root of `account_id` assume the role
fn trust_policy(account_id: &str) -> String {
    serde_json::json!({
        "Statement": [{
            "Action": "sts:AssumeRole",
            "Effect": "Allow",
            "Principal": { "RAM": [format!("acs:ram::{}:root", account_id)] }
        }],
        "Version": "1"
    })
    .to_string()
}

/// Create a console user with `AdministratorAccess`
pub async fn add_user(client: &AcsClient, user_name: &str, password: &str) -> Result<LoginProfile> {
    client
        .call::<serde_json::Value>(&ram("CreateUser").param("UserName", user_name))
        .await?;
    client
        .call::<serde_json::Value>(
            &ram("CreateLoginProfile")
                .param("UserName", user_name)
                .param("Password", password)
                .param("PasswordResetRequired", false),
        )
        .await?;
    client
        .call::<serde_json::Value>(
            &ram("AttachPolicyToUser")
                .param("PolicyType", "System")
                .param("PolicyName", ADMIN_POLICY)
                .param("UserName", user_name),
        )
        .await?;

    let alias: GetAccountAliasResponse = client.call(&ram("GetAccountAlias")).await?;
    Ok(LoginProfile {
        user_name: user_name.to_string(),
        password: password.to_string(),
        login_url: login_url(&alias.account_alias),
    })
}

/// Ignore "does not exist" so deletion can resume after a partial run
fn tolerate_missing(result: Result<serde_json::Value>) -> Result<()> {
    match result {
        Ok(_) => Ok(()),
        Err(e) if e.is_not_found() => {
            tracing::debug!("Skipped: {}", e);
            Ok(())
        }
        Err(e) => Err(e),
    }
}

pub async fn delete_user(client: &AcsClient, user_name: &str) -> Result<()> {
    tolerate_missing(
        client
            .call(&ram("DeleteLoginProfile").param("UserName", user_name))
            .await,
    )?;
    tolerate_missing(
        client
            .call(
                &ram("DetachPolicyFromUser")
                    .param("PolicyType", "System")
                    .param("PolicyName", ADMIN_POLICY)
                    .param("UserName", user_name),
            )
            .await,
    )?;
    client
        .call::<serde_json::Value>(&ram("DeleteUser").param("UserName", user_name))
        .await?;
    Ok(())
}

/// Create a role assumable from `account_id` with `AdministratorAccess`
pub async fn add_role(client: &AcsClient, role_name: &str, account_id: &str) -> Result<()> {
    if account_id.is_empty() {
        return Err(AlibabaError::CloudError(
            cloudkit_core::CloudError::InvalidArgument("trusted account id is empty".to_string()),
        ));
    }
    client
        .call::<serde_json::Value>(
            &ram("CreateRole")
                .param("RoleName", role_name)
                .param("AssumeRolePolicyDocument", trust_policy(account_id)),
        )
        .await?;
    client
        .call::<serde_json::Value>(
            &ram("AttachPolicyToRole")
                .param("PolicyType", "System")
                .param("PolicyName", ADMIN_POLICY)
                .param("RoleName", role_name),
        )
        .await?;
    Ok(())
}

pub async fn delete_role(client: &AcsClient, role_name: &str) -> Result<()> {
    tolerate_missing(
        client
            .call(
                &ram("DetachPolicyFromRole")
                    .param("PolicyType", "System")
                    .param("PolicyName", ADMIN_POLICY)
                    .param("RoleName", role_name),
            )
            .await,
    )?;
    client
        .call::<serde_json::Value>(&ram("DeleteRole").param("RoleName", role_name))
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_list_users() {
        let body = r#"{
            "RequestId": "4B450CA1-36E8-4AA2-8461-86B42BF4CC4E",
            "IsTruncated": true,
            "Marker": "EXAMPLE",
            "Users": { "User": [
                { "UserName": "zhangq****", "UserId": "122748924538****",
                  "DisplayName": "zhangq****", "CreateDate": "2015-01-23T12:33:18Z" }
            ] }
        }"#;
        let response: ListUsersResponse = serde_json::from_str(body).unwrap();
        assert!(response.is_truncated);
        assert_eq!(response.marker, "EXAMPLE");
        assert_eq!(response.users.user[0].create_date, "2015-01-23T12:33:18Z");
        assert!(response.users.user[0].last_login_date.is_empty());
    }

    #[test]
    fn test_trust_policy() {
        let policy: serde_json::Value = serde_json::from_str(&trust_policy("1234567890")).unwrap();
        assert_eq!(
            policy["Statement"][0]["Principal"]["RAM"][0],
            "acs:ram::1234567890:root"
        );
        assert_eq!(policy["Statement"][0]["Action"], "sts:AssumeRole");
    }

    #[test]
    fn test_login_url() {
        assert_eq!(
            login_url("example"),
            "https://signin.aliyun.com/example.onaliyun.com/login.htm"
        );
    }

    #[test]
    fn test_tolerate_missing() {
        let missing = AlibabaError::Api {
            code: "EntityNotExist.User.LoginProfile".into(),
            message: String::new(),
            request_id: String::new(),
        };
        assert!(tolerate_missing(Err(missing)).is_ok());

        let denied = AlibabaError::Api {
            code: "NoPermission".into(),
            message: String::new(),
            request_id: String::new(),
        };
        assert!(tolerate_missing(Err(denied)).is_err());
    }
}
