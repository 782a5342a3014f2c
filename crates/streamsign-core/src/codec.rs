//! Canonical policy encoding.
//!
//! The canonical form is the exact byte sequence that gets signed:
//!
//! ```text
//! {"Statement":{"Resource":"<uri>","Condition":{["DateGreaterThan":<ms>,]"DateLessThan":<ms>[,"IpAddress":"<ip>"]}}}
//! ```
//!
//! Keys inside `Condition` are emitted in lexicographic order and the JSON is
//! compact. Issuer and verifier must agree on this byte-for-byte, so the
//! field order of the wire structs below is part of the format.
//!
//! Policies travel in query strings as URL-safe Base64 without line breaks.

use base64::{
    alphabet,
    engine::{general_purpose::URL_SAFE, DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig},
    Engine,
};
use serde::{Deserialize, Serialize};

use crate::error::{SigningError, SigningResult};
use crate::policy::{timestamp_from_millis, Policy};

/// URL-safe decoder that accepts input with or without `=` padding.
const URL_SAFE_LENIENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

#[derive(Debug, Serialize, Deserialize)]
struct PolicyDocument {
    #[serde(rename = "Statement")]
    statement: Statement,
}

#[derive(Debug, Serialize, Deserialize)]
struct Statement {
    #[serde(rename = "Resource")]
    resource: String,
    #[serde(rename = "Condition")]
    condition: Condition,
}

// Declaration order is the serialized order: keep lexicographic.
#[derive(Debug, Serialize, Deserialize)]
struct Condition {
    #[serde(
        rename = "DateGreaterThan",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    date_greater_than: Option<i64>,
    #[serde(rename = "DateLessThan")]
    date_less_than: i64,
    #[serde(rename = "IpAddress", default, skip_serializing_if = "Option::is_none")]
    ip_address: Option<String>,
}

/// Render `policy` into its canonical JSON form.
pub fn to_canonical_form(policy: &Policy) -> SigningResult<String> {
    let document = PolicyDocument {
        statement: Statement {
            resource: policy.resource().to_string(),
            condition: Condition {
                date_greater_than: policy.available_from().map(|at| at.timestamp_millis()),
                date_less_than: policy.expires_at().timestamp_millis(),
                ip_address: policy.client_ip().map(str::to_string),
            },
        },
    };
    serde_json::to_string(&document)
        .map_err(|e| SigningError::malformed(format!("failed to serialize policy: {}", e)))
}

/// Parse a policy from JSON.
///
/// `Resource` and `DateLessThan` are required; `DateGreaterThan` and
/// `IpAddress` are optional. Whitespace and key order in the input are not
/// significant.
pub fn from_canonical_form(json: &str) -> SigningResult<Policy> {
    let document: PolicyDocument = serde_json::from_str(json)
        .map_err(|e| SigningError::malformed(format!("invalid policy JSON: {}", e)))?;
    let Statement {
        resource,
        condition,
    } = document.statement;

    let expires_at = timestamp_from_millis(condition.date_less_than)?;
    let mut policy = Policy::new(resource, expires_at)
        .map_err(|e| SigningError::malformed(e.to_string()))?;

    if let Some(millis) = condition.date_greater_than {
        policy = policy.with_available_from(timestamp_from_millis(millis)?);
    }
    if let Some(ip) = condition.ip_address {
        policy = policy.with_client_ip(ip);
    }
    Ok(policy)
}

/// Encode bytes as URL-safe Base64 (no line breaks).
pub fn to_base64(bytes: impl AsRef<[u8]>) -> String {
    URL_SAFE.encode(bytes)
}

/// Decode URL-safe Base64, with or without padding.
pub fn from_base64(encoded: &str) -> SigningResult<Vec<u8>> {
    Ok(URL_SAFE_LENIENT.decode(encoded)?)
}

/// Decode URL-safe Base64 into UTF-8 text.
pub fn from_base64_string(encoded: &str) -> SigningResult<String> {
    String::from_utf8(from_base64(encoded)?).map_err(|e| SigningError::Base64 {
        reason: format!("decoded value is not UTF-8: {}", e),
    })
}

/// Canonical form of `policy`, Base64 encoded for a query string.
pub fn encode_policy(policy: &Policy) -> SigningResult<String> {
    Ok(to_base64(to_canonical_form(policy)?))
}

/// Decode a policy from its Base64 query string value.
pub fn decode_policy(encoded: &str) -> SigningResult<Policy> {
    let json = from_base64_string(encoded)?;
    from_canonical_form(&json)
}
