//! Request signing
//!
//! RPC-style APIs are signed with `ACS3-HMAC-SHA256`; OSS requests with
//! `OSS4-HMAC-SHA256`. Both hash a canonical form of the request and sign
//! it with the AccessKey secret.

use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;

type HmacSha256 = Hmac<Sha256>;

pub const ACS3_ALGORITHM: &str = "ACS3-HMAC-SHA256";
pub const OSS4_ALGORITHM: &str = "OSS4-HMAC-SHA256";
pub const OSS_UNSIGNED_PAYLOAD: &str = "UNSIGNED-PAYLOAD";

/// RFC 3986 encoding (space → `%20`, `*` → `%2A`, `~` kept)
pub fn percent_encode(s: &str) -> String {
    urlencoding::encode(s).into_owned()
}

pub fn sha256_hex(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

pub fn hmac_sha256(key: &[u8], data: &[u8]) -> Vec<u8> {
    let mut mac = HmacSha256::new_from_slice(key).expect("HMAC accepts keys of any length");
    mac.update(data);
    mac.finalize().into_bytes().to_vec()
}

/// Sorted `k=v&k=v` with both sides percent-encoded; empty values keep `k=`
pub fn canonical_query(params: &[(String, String)]) -> String {
    let mut encoded: Vec<(String, String)> = params
        .iter()
        .map(|(k, v)| (percent_encode(k), percent_encode(v)))
        .collect();
    encoded.sort();
    encoded
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join("&")
}

/// Signs RPC-style requests for the Alibaba Cloud OpenAPI gateway
pub struct Acs3Signer<'a> {
    pub access_key_id: &'a str,
    pub access_key_secret: &'a str,
}

impl Acs3Signer<'_> {
    /// `Authorization` header for a request.
    ///
    /// `headers` must already contain `host` and every `x-acs-*` header that
    /// will be sent; names are expected in lowercase.
    pub fn authorization(
        &self,
        method: &str,
        query: &[(String, String)],
        headers: &BTreeMap<String, String>,
        payload: &[u8],
    ) -> String {
        let signed: Vec<&String> = headers
            .keys()
            .filter(|k| *k == "host" || *k == "content-type" || k.starts_with("x-acs-"))
            .collect();
        let canonical_headers: String = signed
            .iter()
            .map(|k| format!("{}:{}\n", k, headers[*k].trim()))
            .collect();
        let signed_headers = signed
            .iter()
            .map(|k| k.as_str())
            .collect::<Vec<_>>()
            .join(";");

        let canonical_request = format!(
            "{}\n/\n{}\n{}\n{}\n{}",
            method,
            canonical_query(query),
            canonical_headers,
            signed_headers,
            sha256_hex(payload)
        );
        let string_to_sign = format!(
            "{}\n{}",
            ACS3_ALGORITHM,
            sha256_hex(canonical_request.as_bytes())
        );
        let signature = hex::encode(hmac_sha256(
            self.access_key_secret.as_bytes(),
            string_to_sign.as_bytes(),
        ));

        format!(
            "{} Credential={},SignedHeaders={},Signature={}",
            ACS3_ALGORITHM, self.access_key_id, signed_headers, signature
        )
    }
}

/// `x-acs-date` value
pub fn acs_date(now: DateTime<Utc>) -> String {
    now.format("%Y-%m-%dT%H:%M:%SZ").to_string()
}

/// Signs OSS REST requests
pub struct Oss4Signer<'a> {
    pub access_key_id: &'a str,
    pub access_key_secret: &'a str,
    /// Region without the `oss-` prefix, e.g. `cn-hangzhou`
    pub region: &'a str,
}

impl Oss4Signer<'_> {
    /// `Authorization` header for an OSS request.
    ///
    /// `resource` is `/` for service-level calls or `/<bucket>/` for bucket
    /// calls. `headers` must contain `x-oss-date` and
    /// `x-oss-content-sha256`.
    pub fn authorization(
        &self,
        method: &str,
        resource: &str,
        query: &[(String, String)],
        headers: &BTreeMap<String, String>,
        now: DateTime<Utc>,
    ) -> String {
        let date = now.format("%Y%m%d").to_string();
        let timestamp = oss_date(now);
        let scope = format!("{}/{}/oss/aliyun_v4_request", date, self.region);

        let canonical_headers: String = headers
            .iter()
            .filter(|(k, _)| {
                k.starts_with("x-oss-") || *k == "content-type" || *k == "content-md5"
            })
            .map(|(k, v)| format!("{}:{}\n", k, v.trim()))
            .collect();
        let payload_hash = headers
            .get("x-oss-content-sha256")
            .map(String::as_str)
            .unwrap_or(OSS_UNSIGNED_PAYLOAD);

        let canonical_request = format!(
            "{}\n{}\n{}\n{}\n\n{}",
            method,
            percent_encode(resource).replace("%2F", "/"),
            oss_canonical_query(query),
            canonical_headers,
            payload_hash
        );
        let string_to_sign = format!(
            "{}\n{}\n{}\n{}",
            OSS4_ALGORITHM,
            timestamp,
            scope,
            sha256_hex(canonical_request.as_bytes())
        );

        let date_key = hmac_sha256(
            format!("aliyun_v4{}", self.access_key_secret).as_bytes(),
            date.as_bytes(),
        );
        let region_key = hmac_sha256(&date_key, self.region.as_bytes());
        let service_key = hmac_sha256(&region_key, b"oss");
        let signing_key = hmac_sha256(&service_key, b"aliyun_v4_request");
        let signature = hex::encode(hmac_sha256(&signing_key, string_to_sign.as_bytes()));

        format!(
            "{} Credential={}/{},Signature={}",
            OSS4_ALGORITHM, self.access_key_id, scope, signature
        )
    }
}

/// OSS sorts encoded pairs and omits `=` for valueless parameters
pub(crate) fn oss_canonical_query(params: &[(String, String)]) -> String {
    let mut encoded: Vec<(String, String)> = params
        .iter()
        .map(|(k, v)| (percent_encode(k), percent_encode(v)))
        .collect();
    encoded.sort();
    encoded
        .iter()
        .map(|(k, v)| {
            if v.is_empty() {
                k.clone()
            } else {
                format!("{}={}", k, v)
            }
        })
        .collect::<Vec<_>>()
        .join("&")
}

/// `x-oss-date` value
pub fn oss_date(now: DateTime<Utc>) -> String {
    now.format("%Y%m%dT%H%M%SZ").to_string()
}
