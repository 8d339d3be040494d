//! Alibaba Cloud provider for cloudkit
//!
//! Talks to the Alibaba Cloud OpenAPI gateway directly over HTTPS with
//! `ACS3-HMAC-SHA256` signed requests, and to OSS with `OSS4-HMAC-SHA256`.
//!
//! # Features
//!
//! - ECS instances across regions and resource groups
//! - OSS buckets, object listing and totals
//! - RAM users, console user and role management
//! - RDS instances, Alibaba Cloud DNS domains, SMS configuration
//! - Security Center event dump and whitelisting
//! - Shell command execution through Cloud Assistant
//! - Account balance from the billing service
//!
//! # Example
//!
//! ```ignore
//! use cloudkit_alibaba::AlibabaProvider;
//! use cloudkit_core::{CloudProvider, CredentialStore, Options, ResourceKind};
//!
//! let mut store = CredentialStore::new();
//! let provider = AlibabaProvider::new(&options, &mut store).await?;
//! let bundle = provider.resources(&ResourceKind::ALL, &cancel).await;
//! ```

pub mod bss;
pub mod client;
pub mod dns;
pub mod ecs;
pub mod error;
pub mod oss;
pub mod provider;
pub mod ram;
pub mod rds;
pub mod sas;
pub mod sign;
pub mod sms;
pub mod sts;

pub use client::{AcsClient, AlibabaCredentials, RpcRequest};
pub use error::{AlibabaError, Result};
pub use provider::AlibabaProvider;
