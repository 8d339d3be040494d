//! AWS provider implementation

use crate::ec2::Ec2Collector;
use crate::error::AwsError;
use crate::iam::{self, IamCollector};
use crate::s3::{self, S3Collector};
use async_trait::async_trait;
use aws_config::{BehaviorVersion, SdkConfig};
use aws_sdk_sts::config::{Credentials, Region};
use cloudkit_core::{
    keys, BucketAdmin, BucketTotal, CallerIdentity, CloudProvider, CredentialStore,
    IdentityAdmin, LoginProfile, ObjectEntry, Options, ResourceCollector, ResourceKind, Result,
    Storage, ALL_REGIONS,
};

/// Region used for global calls when the user asked for `all`
const DEFAULT_REGION: &str = "us-east-1";

/// AWS provider
pub struct AwsProvider {
    config: SdkConfig,
    region: String,
    identity: CallerIdentity,
}

impl AwsProvider {
    /// Resolve the caller and remember the credential in `store`.
    ///
    /// Missing `access_key` / `secret_key` fail before any request is sent.
    pub async fn new(options: &Options, store: &mut CredentialStore) -> Result<Self> {
        let access_key = options.require(keys::ACCESS_KEY)?;
        let secret_key = options.require(keys::SECRET_KEY)?;
        let token = options.get(keys::SECURITY_TOKEN).map(str::to_string);
        let region = options.region().to_string();

        let credentials = Credentials::new(access_key, secret_key, token, None, "cloudkit");
        let config = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(base_region(&region).to_string()))
            .credentials_provider(credentials)
            .load()
            .await;

        let output = aws_sdk_sts::Client::new(&config)
            .get_caller_identity()
            .send()
            .await
            .map_err(|e| AwsError::from_sdk("GetCallerIdentity", e))?;
        let identity = CallerIdentity::from_arn(
            output.arn().unwrap_or_default(),
            output.account().unwrap_or_default(),
        );
        tracing::info!("Current user: {}", identity.user_name);
        store.insert_or_update(&identity.user_name, options);

        Ok(Self {
            config,
            region,
            identity,
        })
    }
}

fn base_region(region: &str) -> &str {
    if region.is_empty() || region == ALL_REGIONS {
        DEFAULT_REGION
    } else {
        region
    }
}

#[async_trait]
impl CloudProvider for AwsProvider {
    fn name(&self) -> &str {
        "aws"
    }

    fn display_name(&self) -> &str {
        "Amazon Web Services"
    }

    fn identity(&self) -> &CallerIdentity {
        &self.identity
    }

    fn collector(&self, kind: ResourceKind) -> Option<Box<dyn ResourceCollector + '_>> {
        let collector: Box<dyn ResourceCollector + '_> = match kind {
            ResourceKind::Compute => Box::new(Ec2Collector::new(&self.config, &self.region)),
            ResourceKind::Storage => Box::new(S3Collector::new(&self.config)),
            ResourceKind::Identity => Box::new(IamCollector::new(&self.config)),
            _ => return None,
        };
        Some(collector)
    }

    fn identity_admin(&self) -> Option<&dyn IdentityAdmin> {
        Some(self)
    }

    fn bucket_admin(&self) -> Option<&dyn BucketAdmin> {
        Some(self)
    }
}

#[async_trait]
impl IdentityAdmin for AwsProvider {
    async fn add_user(&self, user_name: &str, password: &str) -> Result<LoginProfile> {
        Ok(iam::add_user(&self.config, &self.identity.account_id, user_name, password).await?)
    }

    async fn delete_user(&self, user_name: &str) -> Result<()> {
        Ok(iam::delete_user(&self.config, user_name).await?)
    }

    async fn add_role(&self, role_name: &str, trusted_account: &str) -> Result<()> {
        Ok(iam::add_role(&self.config, role_name, trusted_account).await?)
    }

    async fn delete_role(&self, role_name: &str) -> Result<()> {
        Ok(iam::delete_role(&self.config, role_name).await?)
    }
}

#[async_trait]
impl BucketAdmin for AwsProvider {
    async fn list_objects(&self, bucket: &Storage) -> Result<Vec<ObjectEntry>> {
        Ok(s3::list_objects(&self.config, bucket).await?)
    }

    async fn total_objects(&self, bucket: &Storage) -> Result<BucketTotal> {
        Ok(s3::total_objects(&self.config, bucket).await?)
    }
}
