//! Provider-neutral resource model

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Category of cloud asset a collector can enumerate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    /// Compute instances
    Compute,
    /// Object storage buckets
    Storage,
    /// IAM / RAM users
    Identity,
    /// Managed database instances
    Database,
    /// DNS domains
    Dns,
    /// SMS signatures, templates and volume
    Messaging,
    /// Account balance
    Balance,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 7] = [
        ResourceKind::Compute,
        ResourceKind::Storage,
        ResourceKind::Identity,
        ResourceKind::Database,
        ResourceKind::Dns,
        ResourceKind::Messaging,
        ResourceKind::Balance,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::Compute => "compute",
            ResourceKind::Storage => "storage",
            ResourceKind::Identity => "identity",
            ResourceKind::Database => "database",
            ResourceKind::Dns => "dns",
            ResourceKind::Messaging => "messaging",
            ResourceKind::Balance => "balance",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResourceKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "compute" | "host" => Ok(ResourceKind::Compute),
            "storage" | "bucket" => Ok(ResourceKind::Storage),
            "identity" | "account" | "user" => Ok(ResourceKind::Identity),
            "database" => Ok(ResourceKind::Database),
            "dns" | "domain" => Ok(ResourceKind::Dns),
            "messaging" | "sms" => Ok(ResourceKind::Messaging),
            "balance" => Ok(ResourceKind::Balance),
            other => Err(format!("unknown resource kind: {}", other)),
        }
    }
}

/// Compute instance
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Host {
    pub instance_id: String,
    pub name: String,
    pub public_ipv4: Option<String>,
    pub private_ipv4: Option<String>,
    pub is_public: bool,
    pub region: String,
}

impl Host {
    /// Build a host, deriving `is_public` from the public address
    pub fn new(
        instance_id: impl Into<String>,
        name: impl Into<String>,
        public_ipv4: Option<String>,
        private_ipv4: Option<String>,
        region: impl Into<String>,
    ) -> Self {
        let public_ipv4 = public_ipv4.filter(|ip| !ip.is_empty());
        let private_ipv4 = private_ipv4.filter(|ip| !ip.is_empty());
        Self {
            instance_id: instance_id.into(),
            name: name.into(),
            is_public: public_ipv4.is_some(),
            public_ipv4,
            private_ipv4,
            region: region.into(),
        }
    }
}

/// Object storage bucket
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Storage {
    pub bucket_name: String,
    pub region: String,
}

/// IAM / RAM user
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub user_name: String,
    pub user_id: String,
    pub enable_login: bool,
    pub last_login: String,
    pub create_time: String,
}

/// Managed database instance
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Database {
    pub instance_id: String,
    pub engine: String,
    pub engine_version: String,
    pub region: String,
    pub net_type: String,
    pub address: String,
}

/// DNS domain
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Domain {
    pub domain_name: String,
    pub record_count: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SmsSign {
    pub name: String,
    pub kind: String,
    pub status: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SmsTemplate {
    pub name: String,
    pub status: String,
    pub content: String,
}

/// SMS configuration of an account
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SmsInfo {
    pub signs: Vec<SmsSign>,
    pub templates: Vec<SmsTemplate>,
    /// Messages sent today
    pub daily_size: u64,
}

impl SmsInfo {
    pub fn is_empty(&self) -> bool {
        self.signs.is_empty() && self.templates.is_empty() && self.daily_size == 0
    }
}

/// Funds left on the account
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountBalance {
    pub available_amount: String,
    pub available_cash_amount: String,
    pub credit_amount: String,
    pub currency: String,
}

/// Security alert raised by the provider's threat detection service
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecurityEvent {
    pub id: String,
    pub name: String,
    pub affected_asset: String,
    pub ip: String,
    pub level: String,
    pub last_time: String,
}

/// Object found while listing a bucket
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectEntry {
    pub bucket: String,
    pub key: String,
    pub size: u64,
}

/// Object count and size of a bucket
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BucketTotal {
    pub bucket: String,
    pub region: String,
    pub object_count: u64,
    pub total_size: u64,
}

/// Output of a single collector run
#[derive(Debug, Clone)]
pub enum Harvest {
    Hosts(Vec<Host>),
    Storages(Vec<Storage>),
    Users(Vec<User>),
    Databases(Vec<Database>),
    Domains(Vec<Domain>),
    Sms(SmsInfo),
    Balance(AccountBalance),
}

impl Harvest {
    pub fn len(&self) -> usize {
        match self {
            Harvest::Hosts(v) => v.len(),
            Harvest::Storages(v) => v.len(),
            Harvest::Users(v) => v.len(),
            Harvest::Databases(v) => v.len(),
            Harvest::Domains(v) => v.len(),
            Harvest::Sms(s) => s.signs.len() + s.templates.len(),
            Harvest::Balance(_) => 1,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Everything enumerated from one provider in one run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResourceBundle {
    pub provider: String,
    pub hosts: Vec<Host>,
    pub storages: Vec<Storage>,
    pub users: Vec<User>,
    pub databases: Vec<Database>,
    pub domains: Vec<Domain>,
    pub sms: SmsInfo,
    pub balance: Option<AccountBalance>,
}

impl ResourceBundle {
    pub fn new(provider: impl Into<String>) -> Self {
        Self {
            provider: provider.into(),
            ..Default::default()
        }
    }

    /// Append a collector's output to the matching sequence
    pub fn absorb(&mut self, harvest: Harvest) {
        match harvest {
            Harvest::Hosts(v) => self.hosts.extend(v),
            Harvest::Storages(v) => self.storages.extend(v),
            Harvest::Users(v) => self.users.extend(v),
            Harvest::Databases(v) => self.databases.extend(v),
            Harvest::Domains(v) => self.domains.extend(v),
            Harvest::Sms(s) => {
                self.sms.signs.extend(s.signs);
                self.sms.templates.extend(s.templates);
                self.sms.daily_size += s.daily_size;
            }
            Harvest::Balance(b) => self.balance = Some(b),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.hosts.is_empty()
            && self.storages.is_empty()
            && self.users.is_empty()
            && self.databases.is_empty()
            && self.domains.is_empty()
            && self.sms.is_empty()
            && self.balance.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_host_public_flag() {
        let public = Host::new("i-1", "web", Some("203.0.113.1".into()), None, "cn-1");
        assert!(public.is_public);

        let private = Host::new("i-2", "db", Some(String::new()), Some("10.0.0.2".into()), "cn-1");
        assert!(!private.is_public);
        assert_eq!(private.public_ipv4, None);
        assert_eq!(private.private_ipv4.as_deref(), Some("10.0.0.2"));
    }

    #[test]
    fn test_kind_aliases() {
        assert_eq!("host".parse::<ResourceKind>().unwrap(), ResourceKind::Compute);
        assert_eq!("bucket".parse::<ResourceKind>().unwrap(), ResourceKind::Storage);
        assert_eq!("account".parse::<ResourceKind>().unwrap(), ResourceKind::Identity);
        assert_eq!("SMS".parse::<ResourceKind>().unwrap(), ResourceKind::Messaging);
        assert_eq!("balance".parse::<ResourceKind>().unwrap(), ResourceKind::Balance);
        assert!("quota".parse::<ResourceKind>().is_err());
    }

    #[test]
    fn test_bundle_absorb() {
        let mut bundle = ResourceBundle::new("alibaba");
        assert!(bundle.is_empty());

        bundle.absorb(Harvest::Hosts(vec![Host::default()]));
        bundle.absorb(Harvest::Hosts(vec![Host::default(), Host::default()]));
        bundle.absorb(Harvest::Sms(SmsInfo {
            daily_size: 7,
            ..Default::default()
        }));

        assert_eq!(bundle.hosts.len(), 3);
        assert_eq!(bundle.sms.daily_size, 7);
        assert!(!bundle.is_empty());
    }

    #[test]
    fn test_bundle_balance_only() {
        let mut bundle = ResourceBundle::new("alibaba");
        bundle.absorb(Harvest::Balance(AccountBalance {
            available_amount: "12.50".into(),
            currency: "CNY".into(),
            ..Default::default()
        }));
        assert!(!bundle.is_empty());
        assert_eq!(bundle.balance.unwrap().available_amount, "12.50");
    }
}
