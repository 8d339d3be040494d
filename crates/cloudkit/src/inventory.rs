//! オプション組み立てとプロバイダ接続

use crate::AuthArgs;
use anyhow::Context;
use cloudkit_core::{keys, CloudError, CloudProvider, CredentialStore, Options, ProviderKind};

/// CLI 引数（またはキャッシュ済みクレデンシャル）から Options を組み立てる
pub fn build_options(
    auth: &AuthArgs,
    store: &CredentialStore,
    metadata: Option<String>,
) -> anyhow::Result<Options> {
    let mut options = match &auth.cred {
        Some(fp) => {
            let cred = store.get(fp).with_context(|| {
                format!(
                    "クレデンシャル '{}' が見つかりません（cloudkit creds list で確認）",
                    fp
                )
            })?;
            let mut options = cred.options()?;
            if let Some(region) = &auth.region {
                options.set(keys::REGION, region);
            }
            options
        }
        None => {
            let mut options = Options::new();
            let fields = [
                (keys::PROVIDER, &auth.provider),
                (keys::ACCESS_KEY, &auth.access_key),
                (keys::SECRET_KEY, &auth.secret_key),
                (keys::SECURITY_TOKEN, &auth.security_token),
                (keys::REGION, &auth.region),
            ];
            for (key, value) in fields {
                if let Some(value) = value {
                    options.set(key, value);
                }
            }
            options
        }
    };

    if let Some(metadata) = metadata {
        options.set(keys::METADATA, metadata);
    }
    Ok(options)
}

/// プロバイダに接続し、呼び出し元の ID を解決する
///
/// 成功したクレデンシャルは `store` に登録される。
#[cfg_attr(
    not(any(feature = "alibaba", feature = "aws")),
    allow(unused_variables)
)]
pub async fn connect(
    options: &Options,
    store: &mut CredentialStore,
) -> anyhow::Result<Box<dyn CloudProvider>> {
    let kind = options.provider()?;
    tracing::debug!("Connecting to {} (region: {})", kind, options.region());

    let provider: Box<dyn CloudProvider> = match kind {
        #[cfg(feature = "alibaba")]
        ProviderKind::Alibaba => {
            Box::new(cloudkit_alibaba::AlibabaProvider::new(options, store).await?)
        }
        #[cfg(feature = "aws")]
        ProviderKind::Aws => Box::new(cloudkit_aws::AwsProvider::new(options, store).await?),
        #[allow(unreachable_patterns)]
        other => return Err(CloudError::UnsupportedProvider(other.to_string()).into()),
    };
    Ok(provider)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn auth() -> AuthArgs {
        AuthArgs {
            provider: Some("alibaba".to_string()),
            access_key: Some("LTAI000".to_string()),
            secret_key: Some("secret".to_string()),
            security_token: None,
            region: None,
            cred: None,
        }
    }

    #[test]
    fn test_build_options_from_flags() {
        let store = CredentialStore::new();
        let options =
            build_options(&auth(), &store, Some("add alice pw".to_string())).unwrap();

        assert_eq!(options.get(keys::ACCESS_KEY), Some("LTAI000"));
        assert_eq!(options.get(keys::SECURITY_TOKEN), None);
        assert_eq!(options.region(), "all");
        let (cmd, args) = options.metadata();
        assert_eq!(cmd, "add");
        assert_eq!(args, vec!["alice", "pw"]);
    }

    #[test]
    fn test_build_options_from_cached_credential() {
        let mut store = CredentialStore::new();
        let cached = Options::new()
            .with(keys::PROVIDER, "alibaba")
            .with(keys::ACCESS_KEY, "LTAI000")
            .with(keys::SECRET_KEY, "secret")
            .with(keys::REGION, "cn-hangzhou");
        store.insert_or_update("alice", &cached);
        let fp = store.iter().next().unwrap().fingerprint.clone();

        let args = AuthArgs {
            provider: None,
            access_key: None,
            secret_key: None,
            security_token: None,
            region: Some("cn-beijing".to_string()),
            cred: Some(fp),
        };
        let options = build_options(&args, &store, None).unwrap();

        assert_eq!(options.get(keys::SECRET_KEY), Some("secret"));
        assert_eq!(options.region(), "cn-beijing");
    }

    #[test]
    fn test_build_options_unknown_fingerprint() {
        let store = CredentialStore::new();
        let args = AuthArgs {
            cred: Some("deadbeef".to_string()),
            ..auth()
        };
        assert!(build_options(&args, &store, None).is_err());
    }

    #[tokio::test]
    async fn test_connect_without_provider() {
        let mut store = CredentialStore::new();
        let result = connect(&Options::new(), &mut store).await;
        assert!(result.is_err());
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_connect_unknown_provider_leaves_store_untouched() {
        let mut store = CredentialStore::new();
        let options = Options::new()
            .with(keys::PROVIDER, "gcp")
            .with(keys::ACCESS_KEY, "key");
        let err = connect(&options, &mut store).await.err().unwrap();
        assert!(err.to_string().contains("gcp"));
        assert!(store.is_empty());
    }
}
