//! In-memory credential registry
//!
//! Credentials are keyed by a fingerprint of the account identity so that
//! re-running against the same account updates the cached entry instead of
//! adding a duplicate.

use crate::error::Result;
use crate::options::{keys, Options, ProviderKind};
use md5::{Digest, Md5};
use serde::{Deserialize, Serialize};

const DISPLAY_USER_MAX: usize = 20;
const DISPLAY_KEY_MAX: usize = 35;

/// A cached credential
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    /// MD5 of identity key + provider tag
    pub fingerprint: String,

    /// Resolved user name, truncated for display
    pub display_user: String,

    /// Identity key, truncated for display
    pub display_key: String,

    pub provider: ProviderKind,

    /// Serialized option map used to create the provider
    pub raw_config: String,

    pub note: Option<String>,
}

impl Credential {
    /// Decode the stored option map
    pub fn options(&self) -> Result<Options> {
        Ok(serde_json::from_str(&self.raw_config)?)
    }
}

/// Registry of known credentials, at most one entry per fingerprint
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CredentialStore {
    creds: Vec<Credential>,
}

impl CredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_credentials(creds: Vec<Credential>) -> Self {
        let mut store = Self::new();
        for cred in creds {
            if store.select(&cred.fingerprint).is_none() {
                store.creds.push(cred);
            }
        }
        store
    }

    /// Insert a new credential or replace the config of an existing one.
    ///
    /// Display fields of an existing entry are left untouched. Failures are
    /// logged and the store is left unchanged.
    pub fn insert_or_update(&mut self, display_user: &str, config: &Options) {
        let provider = match config.provider() {
            Ok(p) => p,
            Err(e) => {
                tracing::error!("Skipping credential cache insert: {}", e);
                return;
            }
        };
        let identity = config.get(provider.identity_key()).unwrap_or_default();
        let provider_tag = config.get(keys::PROVIDER).unwrap_or_default();
        let fp = fingerprint(identity, provider_tag);

        let raw_config = match serde_json::to_string(config) {
            Ok(s) => s,
            Err(e) => {
                tracing::error!("Failed to serialize credential config: {}", e);
                return;
            }
        };

        if let Some(existing) = self.creds.iter_mut().find(|c| c.fingerprint == fp) {
            existing.raw_config = raw_config;
            tracing::debug!("Updated cached credential {}", fp);
            return;
        }

        self.creds.push(Credential {
            fingerprint: fp.clone(),
            display_user: truncate(display_user, DISPLAY_USER_MAX),
            display_key: truncate(identity, DISPLAY_KEY_MAX),
            provider,
            raw_config,
            note: None,
        });
        tracing::debug!("Cached new credential {}", fp);
    }

    /// Serialized config for a fingerprint
    pub fn select(&self, fingerprint: &str) -> Option<&str> {
        self.get(fingerprint).map(|c| c.raw_config.as_str())
    }

    pub fn get(&self, fingerprint: &str) -> Option<&Credential> {
        self.creds.iter().find(|c| c.fingerprint == fingerprint)
    }

    /// Set the note on a credential; no-op if absent
    pub fn annotate(&mut self, fingerprint: &str, note: impl Into<String>) {
        if let Some(cred) = self.creds.iter_mut().find(|c| c.fingerprint == fingerprint) {
            cred.note = Some(note.into());
        }
    }

    /// Remove a credential; no-op if absent
    pub fn delete(&mut self, fingerprint: &str) {
        if let Some(index) = self.creds.iter().position(|c| c.fingerprint == fingerprint) {
            self.creds.remove(index);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Credential> {
        self.creds.iter()
    }

    pub fn len(&self) -> usize {
        self.creds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.creds.is_empty()
    }
}

/// Lowercase hex MD5 of `identity + provider`
pub fn fingerprint(identity: &str, provider: &str) -> String {
    let digest = Md5::digest(format!("{}{}", identity, provider).as_bytes());
    format!("{:x}", digest)
}

/// Cut `s` to `n` characters, appending `...` when anything was removed
pub fn truncate(s: &str, n: usize) -> String {
    match s.char_indices().nth(n) {
        Some((idx, _)) => format!("{}...", &s[..idx]),
        None => s.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alibaba(access_key: &str, region: &str) -> Options {
        Options::new()
            .with(keys::PROVIDER, "alibaba")
            .with(keys::ACCESS_KEY, access_key)
            .with(keys::SECRET_KEY, "secret")
            .with(keys::REGION, region)
    }

    #[test]
    fn test_insert_new_credential() {
        let mut store = CredentialStore::new();
        store.insert_or_update("alice", &alibaba("LTAI000", "all"));

        assert_eq!(store.len(), 1);
        let cred = store.iter().next().unwrap();
        assert_eq!(cred.fingerprint, fingerprint("LTAI000", "alibaba"));
        assert_eq!(cred.display_user, "alice");
        assert_eq!(cred.display_key, "LTAI000");
        assert_eq!(cred.provider, ProviderKind::Alibaba);
        assert_eq!(cred.note, None);
    }

    #[test]
    fn test_same_fingerprint_keeps_single_entry() {
        let mut store = CredentialStore::new();
        store.insert_or_update("first-user", &alibaba("LTAI000", "cn-hangzhou"));
        store.insert_or_update("second-user", &alibaba("LTAI000", "cn-beijing"));
        store.insert_or_update("third-user", &alibaba("LTAI000", "cn-shanghai"));

        assert_eq!(store.len(), 1);
        let cred = store.iter().next().unwrap();
        assert_eq!(cred.display_user, "first-user");
        let options = cred.options().unwrap();
        assert_eq!(options.region(), "cn-shanghai");
    }

    #[test]
    fn test_provider_is_part_of_fingerprint() {
        let mut store = CredentialStore::new();
        store.insert_or_update("a", &alibaba("KEY", "all"));
        store.insert_or_update(
            "b",
            &Options::new()
                .with(keys::PROVIDER, "aws")
                .with(keys::ACCESS_KEY, "KEY"),
        );
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_display_fields_truncated() {
        let mut store = CredentialStore::new();
        let long_key = "K".repeat(40);
        store.insert_or_update("a-very-long-user-name-indeed", &alibaba(&long_key, "all"));

        let cred = store.iter().next().unwrap();
        assert_eq!(cred.display_user, "a-very-long-user-nam...");
        assert_eq!(cred.display_key, format!("{}...", "K".repeat(35)));
    }

    #[test]
    fn test_unknown_provider_is_skipped() {
        let mut store = CredentialStore::new();
        store.insert_or_update(
            "x",
            &Options::new()
                .with(keys::PROVIDER, "gcp")
                .with(keys::ACCESS_KEY, "k"),
        );
        assert!(store.is_empty());
    }

    #[test]
    fn test_select_annotate_delete() {
        let mut store = CredentialStore::new();
        store.insert_or_update("alice", &alibaba("AK1", "all"));
        store.insert_or_update("bob", &alibaba("AK2", "all"));
        let fp = fingerprint("AK1", "alibaba");

        assert!(store.select(&fp).unwrap().contains("AK1"));
        assert_eq!(store.select("missing"), None);

        store.annotate(&fp, "prod account");
        store.annotate("missing", "ignored");
        assert_eq!(store.get(&fp).unwrap().note.as_deref(), Some("prod account"));

        store.delete("missing");
        assert_eq!(store.len(), 2);
        store.delete(&fp);
        assert_eq!(store.len(), 1);
        assert_eq!(store.select(&fp), None);
    }

    #[test]
    fn test_from_credentials_drops_duplicates() {
        let mut store = CredentialStore::new();
        store.insert_or_update("alice", &alibaba("AK1", "all"));
        let cred = store.iter().next().unwrap().clone();

        let rebuilt = CredentialStore::from_credentials(vec![cred.clone(), cred]);
        assert_eq!(rebuilt.len(), 1);
    }

    #[test]
    fn test_truncate() {
        let cases = [
            ("", 0, ""),
            ("", 3, ""),
            ("abc", 0, "..."),
            ("abc", 2, "ab..."),
            ("abc", 3, "abc"),
            ("abc", 10, "abc"),
            ("東京リージョン", 2, "東京..."),
        ];
        for (s, n, expected) in cases {
            assert_eq!(truncate(s, n), expected, "truncate({:?}, {})", s, n);
        }
    }

    #[test]
    fn test_truncate_prefix_property() {
        let s = "LTAI5tAbCdEfGhIjKlMnOpQr";
        for n in 0..=s.len() + 2 {
            let out = truncate(s, n);
            if s.len() <= n {
                assert_eq!(out, s);
            } else {
                assert_eq!(out, format!("{}...", &s[..n]));
            }
        }
    }
}
