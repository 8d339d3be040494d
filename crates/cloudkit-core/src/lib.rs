//! cloudkit core
//!
//! Provider-neutral building blocks for multi-cloud asset inventory:
//!
//! - **Credential cache**: accounts deduplicated by identity fingerprint,
//!   persisted between runs
//! - **Paginated collection**: region → scope → page walks with cooperative
//!   cancellation and partial results
//! - **Progress**: a single updating line per region
//! - **Rendering**: aligned tables on screen and in timestamped log files
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────┐
//! │                  cloudkit CLI                    │
//! │      (cloudlist / bucket / user / event)         │
//! └─────────────────┬───────────────────────────────┘
//!                   │
//! ┌─────────────────▼───────────────────────────────┐
//! │                cloudkit-core                     │
//! │  ┌──────────────────────────────────────────┐   │
//! │  │  trait CloudProvider / ResourceCollector  │   │
//! │  └──────────────────────────────────────────┘   │
//! │  ┌──────────────┐ ┌─────────────┐ ┌──────────┐  │
//! │  │ Credentials  │ │  Paginator  │ │  Render  │  │
//! │  └──────────────┘ └─────────────┘ └──────────┘  │
//! └───────┬─────────────────┬───────────────────────┘
//!         │                 │
//! ┌───────▼───────┐ ┌───────▼───────┐
//! │    alibaba    │ │      aws      │
//! │   provider    │ │   provider    │
//! └───────────────┘ └───────────────┘
//! ```

pub mod cache;
pub mod credential;
pub mod error;
pub mod options;
pub mod paginate;
pub mod progress;
pub mod provider;
pub mod render;
pub mod resource;

// Re-exports
pub use cache::CredentialCache;
pub use credential::{fingerprint, truncate, Credential, CredentialStore};
pub use error::{CloudError, Result};
pub use options::{keys, parse_metadata, Options, ProviderKind, ALL_REGIONS};
pub use paginate::{
    drain_scope, Page, PageSource, PaginatedCollector, PaginationCursor, ScopePages,
    PAGE_SIZE,
};
pub use progress::ProgressReporter;
pub use provider::{
    target_buckets, user_name_from_arn, BucketAdmin, CallerIdentity, CloudProvider,
    CommandRunner, EventAdmin, IdentityAdmin, LoginProfile, ResourceCollector,
};
pub use resource::{
    AccountBalance, BucketTotal, Database, Domain, Harvest, Host, ObjectEntry, ResourceBundle,
    ResourceKind, SecurityEvent, SmsInfo, SmsSign, SmsTemplate, Storage, User,
};
pub use tokio_util::sync::CancellationToken;
