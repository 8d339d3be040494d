//! Provider configuration passed in from the CLI
//!
//! Options are a flat string map, the same shape that is serialized into the
//! credential cache. Well-known keys live in [`keys`].

use crate::error::{CloudError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Well-known option keys
pub mod keys {
    pub const PROVIDER: &str = "provider";
    pub const ACCESS_KEY: &str = "access_key";
    pub const SECRET_KEY: &str = "secret_key";
    pub const SECURITY_TOKEN: &str = "security_token";
    pub const REGION: &str = "region";
    pub const METADATA: &str = "metadata";
}

/// Region value that expands to every region the provider offers
pub const ALL_REGIONS: &str = "all";

/// Supported cloud vendors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
    Alibaba,
    Aws,
}

impl ProviderKind {
    pub const ALL: [ProviderKind; 2] = [ProviderKind::Alibaba, ProviderKind::Aws];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::Alibaba => "alibaba",
            ProviderKind::Aws => "aws",
        }
    }

    /// Option key whose value identifies the account for fingerprinting
    pub fn identity_key(&self) -> &'static str {
        match self {
            ProviderKind::Alibaba | ProviderKind::Aws => keys::ACCESS_KEY,
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderKind {
    type Err = CloudError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "alibaba" | "aliyun" => Ok(ProviderKind::Alibaba),
            "aws" => Ok(ProviderKind::Aws),
            other => Err(CloudError::UnsupportedProvider(other.to_string())),
        }
    }
}

/// Flat string configuration for one provider invocation
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Options(BTreeMap<String, String>);

impl Options {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(key, value);
        self
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    /// Get a value, treating empty strings as absent
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .get(key)
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }

    /// Get a value that must be present
    pub fn require(&self, key: &str) -> Result<&str> {
        self.get(key)
            .ok_or_else(|| CloudError::MissingCredentialKey(key.to_string()))
    }

    pub fn provider(&self) -> Result<ProviderKind> {
        self.require(keys::PROVIDER)?.parse()
    }

    /// Region, defaulting to [`ALL_REGIONS`]
    pub fn region(&self) -> &str {
        self.get(keys::REGION).unwrap_or(ALL_REGIONS)
    }

    /// Metadata split on whitespace into `(command, args)`
    pub fn metadata(&self) -> (String, Vec<String>) {
        parse_metadata(self.get(keys::METADATA).unwrap_or_default())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &String)> {
        self.0.iter()
    }
}

impl FromIterator<(String, String)> for Options {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Split free-form metadata into a command word and its arguments
pub fn parse_metadata(s: &str) -> (String, Vec<String>) {
    let mut items = s.split_whitespace().map(str::to_string);
    let cmd = items.next().unwrap_or_default();
    (cmd, items.collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_require_missing_key() {
        let options = Options::new().with(keys::SECRET_KEY, "secret");
        let err = options.require(keys::ACCESS_KEY).unwrap_err();
        assert!(matches!(err, CloudError::MissingCredentialKey(ref k) if k == "access_key"));
    }

    #[test]
    fn test_empty_value_is_absent() {
        let options = Options::new().with(keys::REGION, "");
        assert_eq!(options.get(keys::REGION), None);
        assert_eq!(options.region(), ALL_REGIONS);
    }

    #[test]
    fn test_provider_parse() {
        assert_eq!("aliyun".parse::<ProviderKind>().unwrap(), ProviderKind::Alibaba);
        assert_eq!("AWS".parse::<ProviderKind>().unwrap(), ProviderKind::Aws);
        assert!(matches!(
            "gcp".parse::<ProviderKind>(),
            Err(CloudError::UnsupportedProvider(_))
        ));
    }

    #[test]
    fn test_parse_metadata() {
        let (cmd, args) = parse_metadata("add  alice  P@ssw0rd");
        assert_eq!(cmd, "add");
        assert_eq!(args, vec!["alice", "P@ssw0rd"]);

        let (cmd, args) = parse_metadata("");
        assert!(cmd.is_empty());
        assert!(args.is_empty());
    }
}
