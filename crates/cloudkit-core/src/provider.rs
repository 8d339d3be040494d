//! Cloud provider trait definition

use crate::error::Result;
use crate::resource::{
    BucketTotal, Harvest, ObjectEntry, ResourceBundle, ResourceKind, SecurityEvent, Storage,
};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

/// Cloud provider abstraction trait
///
/// Each vendor (Alibaba Cloud, AWS) implements this trait. Inventory is
/// exposed as a registry of [`ResourceCollector`]s keyed by
/// [`ResourceKind`]; administrative actions are optional capabilities that a
/// provider may or may not offer.
#[async_trait]
pub trait CloudProvider: Send + Sync {
    /// Returns the provider name (e.g., "alibaba", "aws")
    fn name(&self) -> &str;

    /// Returns the provider display name for UI
    fn display_name(&self) -> &str;

    /// Identity resolved when the provider was created
    fn identity(&self) -> &CallerIdentity;

    /// Collector for a resource kind, if the provider supports it
    fn collector(&self, kind: ResourceKind) -> Option<Box<dyn ResourceCollector + '_>>;

    fn identity_admin(&self) -> Option<&dyn IdentityAdmin> {
        None
    }

    fn bucket_admin(&self) -> Option<&dyn BucketAdmin> {
        None
    }

    fn event_admin(&self) -> Option<&dyn EventAdmin> {
        None
    }

    fn command_runner(&self) -> Option<&dyn CommandRunner> {
        None
    }

    /// Resource kinds this provider can enumerate
    fn supported_kinds(&self) -> Vec<ResourceKind> {
        ResourceKind::ALL
            .into_iter()
            .filter(|kind| self.collector(*kind).is_some())
            .collect()
    }

    /// Run the requested collectors and merge their output.
    ///
    /// A failing collector is logged and skipped; the bundle always carries
    /// whatever the other collectors found.
    async fn resources(&self, kinds: &[ResourceKind], cancel: &CancellationToken) -> ResourceBundle {
        let mut bundle = ResourceBundle::new(self.name());
        for kind in kinds {
            if cancel.is_cancelled() {
                break;
            }
            let Some(collector) = self.collector(*kind) else {
                tracing::debug!("{} has no {} collector", self.name(), kind);
                continue;
            };
            match collector.collect(cancel).await {
                Ok(harvest) => {
                    tracing::debug!("{} {}: {} found", self.name(), kind, harvest.len());
                    bundle.absorb(harvest);
                }
                Err(e) => tracing::warn!("{} {} enumeration failed: {}", self.name(), kind, e),
            }
        }
        bundle
    }
}

/// Enumerates one kind of resource
#[async_trait]
pub trait ResourceCollector: Send + Sync {
    fn kind(&self) -> ResourceKind;

    async fn collect(&self, cancel: &CancellationToken) -> Result<Harvest>;
}

/// User and role management
#[async_trait]
pub trait IdentityAdmin: Send + Sync {
    /// Create a console user with administrator access
    async fn add_user(&self, user_name: &str, password: &str) -> Result<LoginProfile>;

    async fn delete_user(&self, user_name: &str) -> Result<()>;

    /// Create an administrator role assumable from `trusted_account`
    async fn add_role(&self, role_name: &str, trusted_account: &str) -> Result<()>;

    async fn delete_role(&self, role_name: &str) -> Result<()>;
}

/// Object listing for storage buckets
#[async_trait]
pub trait BucketAdmin: Send + Sync {
    async fn list_objects(&self, bucket: &Storage) -> Result<Vec<ObjectEntry>>;

    async fn total_objects(&self, bucket: &Storage) -> Result<BucketTotal>;
}

/// Security event log access
#[async_trait]
pub trait EventAdmin: Send + Sync {
    async fn dump_events(&self, cancel: &CancellationToken) -> Result<Vec<SecurityEvent>>;

    /// Mark events as false positives
    async fn whitelist_events(&self, event_ids: &[String]) -> Result<()>;
}

/// Remote command execution on compute instances
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run a shell command and return its output
    async fn run_command(&self, instance_id: &str, command: &str) -> Result<String>;
}

/// Who the credentials belong to
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CallerIdentity {
    pub user_name: String,
    pub account_id: String,
    pub arn: String,
}

impl CallerIdentity {
    pub fn from_arn(arn: impl Into<String>, account_id: impl Into<String>) -> Self {
        let arn = arn.into();
        Self {
            user_name: user_name_from_arn(&arn),
            account_id: account_id.into(),
            arn,
        }
    }
}

/// Console login details for a newly created user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginProfile {
    pub user_name: String,
    pub password: String,
    pub login_url: String,
}

/// `root` for root ARNs, otherwise the path segment after the first `/`
pub fn user_name_from_arn(arn: &str) -> String {
    if arn.ends_with("root") {
        return "root".to_string();
    }
    arn.split('/').nth(1).unwrap_or_default().to_string()
}

/// Buckets addressed by a `list`/`total` argument.
///
/// `all` enumerates every bucket through the provider's storage collector;
/// anything else names a single bucket in `default_region`.
pub async fn target_buckets(
    provider: &dyn CloudProvider,
    name: &str,
    default_region: &str,
    cancel: &CancellationToken,
) -> Result<Vec<Storage>> {
    if name != "all" {
        return Ok(vec![Storage {
            bucket_name: name.to_string(),
            region: default_region.to_string(),
        }]);
    }

    let Some(collector) = provider.collector(ResourceKind::Storage) else {
        return Err(crate::CloudError::unsupported(provider.name(), "bucket listing"));
    };
    match collector.collect(cancel).await? {
        Harvest::Storages(buckets) => Ok(buckets),
        _ => Ok(Vec::new()),
    }
}
