//! Alibaba Cloud provider implementation

use crate::bss::BalanceCollector;
use crate::client::{AcsClient, AlibabaCredentials};
use crate::dns::DnsCollector;
use crate::ecs::{self, EcsCollector};
use crate::oss::{self, OssCollector};
use crate::ram::{self, RamCollector};
use crate::rds::RdsCollector;
use crate::sas;
use crate::sms::SmsCollector;
use crate::sts;
use async_trait::async_trait;
use cloudkit_core::{
    BucketAdmin, BucketTotal, CallerIdentity, CancellationToken, CloudProvider, CommandRunner,
    CredentialStore, EventAdmin, IdentityAdmin, LoginProfile, ObjectEntry, Options,
    ResourceCollector, ResourceKind, Result, SecurityEvent, Storage,
};

/// Alibaba Cloud provider
pub struct AlibabaProvider {
    client: AcsClient,
    region: String,
    identity: CallerIdentity,
}

impl AlibabaProvider {
    /// Resolve the caller and remember the credential in `store`.
    ///
    /// Missing `access_key` / `secret_key` fail before any request is sent.
    pub async fn new(options: &Options, store: &mut CredentialStore) -> Result<Self> {
        let creds = AlibabaCredentials::from_options(options)?;
        let client = AcsClient::new(creds)?;

        let identity = sts::get_caller_identity(&client).await?;
        tracing::info!("Current user: {}", identity.user_name);
        store.insert_or_update(&identity.user_name, options);

        Ok(Self {
            client,
            region: options.region().to_string(),
            identity,
        })
    }

    pub fn region(&self) -> &str {
        &self.region
    }
}

#[async_trait]
impl CloudProvider for AlibabaProvider {
    fn name(&self) -> &str {
        "alibaba"
    }

    fn display_name(&self) -> &str {
        "Alibaba Cloud"
    }

    fn identity(&self) -> &CallerIdentity {
        &self.identity
    }

    fn collector(&self, kind: ResourceKind) -> Option<Box<dyn ResourceCollector + '_>> {
        let client = &self.client;
        let region = self.region.as_str();
        let collector: Box<dyn ResourceCollector + '_> = match kind {
            ResourceKind::Compute => Box::new(EcsCollector::new(client, region)),
            ResourceKind::Storage => Box::new(OssCollector::new(client, region)),
            ResourceKind::Identity => Box::new(RamCollector::new(client)),
            ResourceKind::Database => Box::new(RdsCollector::new(client, region)),
            ResourceKind::Dns => Box::new(DnsCollector::new(client)),
            ResourceKind::Messaging => Box::new(SmsCollector::new(client)),
            ResourceKind::Balance => Box::new(BalanceCollector::new(client)),
        };
        Some(collector)
    }

    fn identity_admin(&self) -> Option<&dyn IdentityAdmin> {
        Some(self)
    }

    fn bucket_admin(&self) -> Option<&dyn BucketAdmin> {
        Some(self)
    }

    fn event_admin(&self) -> Option<&dyn EventAdmin> {
        Some(self)
    }

    fn command_runner(&self) -> Option<&dyn CommandRunner> {
        Some(self)
    }
}

#[async_trait]
impl IdentityAdmin for AlibabaProvider {
    async fn add_user(&self, user_name: &str, password: &str) -> Result<LoginProfile> {
        Ok(ram::add_user(&self.client, user_name, password).await?)
    }

    async fn delete_user(&self, user_name: &str) -> Result<()> {
        Ok(ram::delete_user(&self.client, user_name).await?)
    }

    async fn add_role(&self, role_name: &str, trusted_account: &str) -> Result<()> {
        Ok(ram::add_role(&self.client, role_name, trusted_account).await?)
    }

    async fn delete_role(&self, role_name: &str) -> Result<()> {
        Ok(ram::delete_role(&self.client, role_name).await?)
    }
}

#[async_trait]
impl BucketAdmin for AlibabaProvider {
    async fn list_objects(&self, bucket: &Storage) -> Result<Vec<ObjectEntry>> {
        Ok(oss::list_objects(&self.client, bucket).await?)
    }

    async fn total_objects(&self, bucket: &Storage) -> Result<BucketTotal> {
        Ok(oss::total_objects(&self.client, bucket).await?)
    }
}

#[async_trait]
impl EventAdmin for AlibabaProvider {
    async fn dump_events(&self, cancel: &CancellationToken) -> Result<Vec<SecurityEvent>> {
        if cancel.is_cancelled() {
            return Ok(Vec::new());
        }
        Ok(sas::dump_events(&self.client).await?)
    }

    async fn whitelist_events(&self, event_ids: &[String]) -> Result<()> {
        Ok(sas::whitelist_events(&self.client, event_ids).await?)
    }
}

#[async_trait]
impl CommandRunner for AlibabaProvider {
    async fn run_command(&self, instance_id: &str, command: &str) -> Result<String> {
        Ok(ecs::run_command(&self.client, &self.region, instance_id, command).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cloudkit_core::{keys, CloudError};

    #[tokio::test]
    async fn test_missing_access_key_fails_fast() {
        let mut store = CredentialStore::new();
        let options = Options::new()
            .with(keys::PROVIDER, "alibaba")
            .with(keys::SECRET_KEY, "sk");

        let result = AlibabaProvider::new(&options, &mut store).await;
        match result {
            Err(CloudError::MissingCredentialKey(key)) => assert_eq!(key, keys::ACCESS_KEY),
            Err(e) => panic!("unexpected error: {}", e),
            Ok(_) => panic!("provider created without access key"),
        }
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_missing_secret_key_fails_fast() {
        let mut store = CredentialStore::new();
        let options = Options::new().with(keys::ACCESS_KEY, "LTAI5t");

        assert!(matches!(
            AlibabaProvider::new(&options, &mut store).await,
            Err(CloudError::MissingCredentialKey(_))
        ));
    }
}
