//! Policy signatures.
//!
//! A signature is computed over the canonical form of a policy with a named
//! shared key. The default algorithm encrypts the canonical form with
//! AES-CBC under a fixed IV (see [`crate::cipher`]). `hmac-sha256` is an
//! opt-in replacement that accepts keys of any length.
//!
//! Signatures cover the exact canonical bytes produced by
//! [`crate::codec::to_canonical_form`]. URLs signed over a different JSON
//! layout (for example `Condition` before `Resource`, or `\/` escaped
//! slashes) do not verify, even with the right key.
//!
//! Verification recomputes the signature and compares the Base64 text in
//! constant time.

use std::fmt;
use std::str::FromStr;

use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use subtle::ConstantTimeEq;

use crate::cipher;
use crate::codec::{to_base64, to_canonical_form};
use crate::error::{SigningError, SigningResult};
use crate::policy::Policy;

type HmacSha256 = Hmac<Sha256>;

/// Algorithm used to turn a canonical policy into a signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SignatureAlgorithm {
    /// Base64 of the AES-CBC encrypted canonical policy.
    #[default]
    AesCbc,
    /// Base64 of HMAC-SHA256 over the canonical policy.
    HmacSha256,
}

impl SignatureAlgorithm {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AesCbc => "aes-cbc",
            Self::HmacSha256 => "hmac-sha256",
        }
    }

    /// Sign `policy` with `key`.
    pub fn sign(&self, policy: &Policy, key: &str) -> SigningResult<String> {
        let canonical = to_canonical_form(policy)?;
        let raw = match self {
            Self::AesCbc => cipher::encrypt(canonical.as_bytes(), key)?,
            Self::HmacSha256 => {
                let mut mac = HmacSha256::new_from_slice(key.as_bytes())
                    .map_err(|_| SigningError::InvalidKeyLength { len: key.len() })?;
                mac.update(canonical.as_bytes());
                mac.finalize().into_bytes().to_vec()
            }
        };
        Ok(to_base64(raw))
    }

    /// Whether `signature` is the signature of `policy` under `key`.
    ///
    /// Signing failures (unusable key, encoding errors) count as a mismatch.
    pub fn matches(&self, policy: &Policy, signature: &str, key: &str) -> bool {
        match self.sign(policy, key) {
            Ok(expected) => expected.as_bytes().ct_eq(signature.as_bytes()).into(),
            Err(e) => {
                tracing::warn!(
                    algorithm = self.as_str(),
                    error = %e,
                    "unable to sign policy for verification"
                );
                false
            }
        }
    }
}

impl fmt::Display for SignatureAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SignatureAlgorithm {
    type Err = SigningError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "aes-cbc" | "aes" => Ok(Self::AesCbc),
            "hmac-sha256" | "hmac" => Ok(Self::HmacSha256),
            other => Err(SigningError::config(format!(
                "unknown signature algorithm '{}' (expected aes-cbc or hmac-sha256)",
                other
            ))),
        }
    }
}

/// Sign `policy` with the default algorithm.
pub fn sign(policy: &Policy, key: &str) -> SigningResult<String> {
    SignatureAlgorithm::default().sign(policy, key)
}

/// Verify `signature` with the default algorithm.
pub fn matches(policy: &Policy, signature: &str, key: &str) -> bool {
    SignatureAlgorithm::default().matches(policy, signature, key)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    const KEY: &str = "0123456789abcdef";

    fn policy() -> Policy {
        Policy::new("http://mh-allinone/", Utc::now() + Duration::hours(2)).unwrap()
    }

    #[test]
    fn test_signature_is_deterministic() {
        let p = policy();
        assert_eq!(sign(&p, KEY).unwrap(), sign(&p, KEY).unwrap());
    }

    #[test]
    fn test_signature_matches_policy() {
        let p = policy();
        let signature = sign(&p, KEY).unwrap();
        assert!(matches(&p, &signature, KEY));
    }

    #[test]
    fn test_other_key_does_not_match() {
        let p = policy();
        let signature = sign(&p, KEY).unwrap();
        assert!(!matches(&p, &signature, "fedcba9876543210"));
    }

    #[test]
    fn test_tampered_policy_does_not_match() {
        let p = policy();
        let signature = sign(&p, KEY).unwrap();

        let other_resource = Policy::new("http://other.com", p.expires_at()).unwrap();
        assert!(!matches(&other_resource, &signature, KEY));

        let with_ip = p.clone().with_client_ip("10.0.0.1");
        assert!(!matches(&with_ip, &signature, KEY));

        let later = Policy::new(p.resource(), p.expires_at() + Duration::milliseconds(1)).unwrap();
        assert!(!matches(&later, &signature, KEY));
    }

    #[test]
    fn test_other_json_layout_does_not_verify() {
        let p = Policy::new("http://mh-allinone/", Utc::now() + Duration::hours(2)).unwrap();
        let legacy = format!(
            r#"{{"Statement":{{"Condition":{{"DateLessThan":{}}},"Resource":"http:\/\/mh-allinone\/"}}}}"#,
            p.expires_at().timestamp_millis()
        );
        let legacy_signature = to_base64(cipher::encrypt(legacy.as_bytes(), KEY).unwrap());

        // Same policy once decoded, different signed bytes.
        assert_eq!(crate::codec::from_canonical_form(&legacy).unwrap(), p);
        assert!(!matches(&p, &legacy_signature, KEY));
    }

    #[test]
    fn test_bad_key_degrades_to_mismatch() {
        let p = policy();
        let signature = sign(&p, KEY).unwrap();
        assert!(sign(&p, "short").is_err());
        assert!(!matches(&p, &signature, "short"));
    }

    #[test]
    fn test_hmac_signatures() {
        let p = policy();
        let hmac = SignatureAlgorithm::HmacSha256;
        let signature = hmac.sign(&p, "any length secret").unwrap();
        assert!(hmac.matches(&p, &signature, "any length secret"));
        assert!(!hmac.matches(&p, &signature, "another secret"));

        // Signatures are not interchangeable across algorithms.
        let aes_signature = sign(&p, KEY).unwrap();
        assert!(!hmac.matches(&p, &aes_signature, KEY));
    }

    #[test]
    fn test_algorithm_parsing() {
        assert_eq!(
            "AES-CBC".parse::<SignatureAlgorithm>().unwrap(),
            SignatureAlgorithm::AesCbc
        );
        assert_eq!(
            "hmac-sha256".parse::<SignatureAlgorithm>().unwrap(),
            SignatureAlgorithm::HmacSha256
        );
        assert!("rot13".parse::<SignatureAlgorithm>().is_err());
        assert_eq!(SignatureAlgorithm::HmacSha256.to_string(), "hmac-sha256");
    }
}
