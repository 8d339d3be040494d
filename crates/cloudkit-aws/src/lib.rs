//! AWS provider for cloudkit
//!
//! Built on the official `aws-sdk-*` crates. Credentials come from the
//! cloudkit options only; the ambient AWS profile chain is not consulted.
//!
//! # Features
//!
//! - EC2 instances across regions
//! - S3 buckets with their location, object listing and totals
//! - IAM users, console user and role management

pub mod ec2;
pub mod error;
pub mod iam;
pub mod provider;
pub mod s3;

pub use error::{AwsError, Result};
pub use provider::AwsProvider;
