pub mod bucket;
pub mod cloudlist;
pub mod creds;
pub mod event;
pub mod exec;
pub mod user;

use cloudkit_core::{CloudError, CloudProvider};

/// プロバイダが未対応の操作
pub(crate) fn unsupported(provider: &dyn CloudProvider, action: &str) -> anyhow::Error {
    CloudError::unsupported(provider.display_name(), action).into()
}
