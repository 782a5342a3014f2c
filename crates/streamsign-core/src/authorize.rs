//! Signed request authorization.
//!
//! Turns `(query string, client IP, requested resource)` into a terminal
//! [`Status`] using a key registry. Checks run in a fixed order and stop at
//! the first failure:
//!
//! 1. Whitelisted resource → `Ok` without a signature (only if configured)
//! 2. `policy`, `keyId` and `signature` each present exactly once, else `BadRequest`
//! 3. Key id known and non-blank, else `Forbidden`
//! 4. Policy decodes and the signature matches, else `Forbidden`
//! 5. Client IP matches the policy (if it names one), else `Forbidden`
//! 6. Resource matches the policy exactly, else `Forbidden`
//! 7. Not expired, else `Gone`
//! 8. Already available, else `Gone`
//!
//! A decode failure and a signature mismatch produce the same reason, so a
//! caller cannot tell which one happened.

use std::panic::{catch_unwind, AssertUnwindSafe};

use chrono::{DateTime, Utc};

use crate::codec::decode_policy;
use crate::config::AuthorizerConfig;
use crate::error::SigningResult;
use crate::keys::KeyRegistry;
use crate::request::{parse_query_string, SignedRequest};
use crate::status::Status;
use crate::whitelist::Whitelist;

pub const REASON_UNKNOWN_KEY: &str = "unknown key identifier";
pub const REASON_SIGNATURE_MISMATCH: &str = "signature does not match policy";
pub const REASON_CLIENT_IP_MISMATCH: &str = "client IP mismatch";
pub const REASON_RESOURCE_MISMATCH: &str = "resource mismatch";
pub const REASON_EXPIRED: &str = "policy expired";
pub const REASON_NOT_YET_ACTIVE: &str = "policy not yet active";
pub const REASON_SERVER_ERROR: &str = "unable to verify due to a server error";

/// Authorizes signed requests against a read-only key registry.
///
/// Stateless apart from the registry and configuration; share one instance
/// across all requests.
#[derive(Debug, Clone)]
pub struct Authorizer<R> {
    registry: R,
    config: AuthorizerConfig,
    whitelist: Whitelist,
}

impl<R: KeyRegistry> Authorizer<R> {
    /// Create an authorizer, validating `config`.
    pub fn new(registry: R, config: AuthorizerConfig) -> SigningResult<Self> {
        config.validate()?;
        let whitelist = Whitelist::new(&config.whitelist)?;
        Ok(Self {
            registry,
            config,
            whitelist,
        })
    }

    /// Authorizer with the default configuration.
    pub fn with_defaults(registry: R) -> Self {
        Self {
            registry,
            config: AuthorizerConfig::default(),
            whitelist: Whitelist::default(),
        }
    }

    pub fn config(&self) -> &AuthorizerConfig {
        &self.config
    }

    pub fn registry(&self) -> &R {
        &self.registry
    }

    /// Authorize a request at the current time.
    pub fn authorize(&self, query: &str, client_ip: &str, resource: &str) -> SignedRequest {
        self.authorize_at(query, client_ip, resource, Utc::now())
    }

    /// Authorize a request as of `now`.
    ///
    /// Never panics: a failure to evaluate yields `Forbidden`.
    pub fn authorize_at(
        &self,
        query: &str,
        client_ip: &str,
        resource: &str,
        now: DateTime<Utc>,
    ) -> SignedRequest {
        tracing::debug!(client_ip, resource, "authorizing signed request");

        let request = catch_unwind(AssertUnwindSafe(|| {
            self.evaluate(query, client_ip, resource, now)
        }))
        .unwrap_or_else(|_| {
            tracing::error!(resource, "signed request evaluation panicked");
            let mut request = SignedRequest::new();
            request.reject(Status::Forbidden, REASON_SERVER_ERROR);
            request
        });

        match request.status() {
            Status::Ok => tracing::trace!(resource, "resource is allowed to be viewed"),
            status => tracing::warn!(
                status = %status,
                reason = request.rejection_reason().unwrap_or_default(),
                resource,
                "signed request rejected"
            ),
        }
        request
    }

    fn evaluate(
        &self,
        query: &str,
        client_ip: &str,
        resource: &str,
        now: DateTime<Utc>,
    ) -> SignedRequest {
        let mut request = SignedRequest::new();

        if self.whitelist.is_whitelisted(resource) {
            tracing::debug!(resource, "resource is whitelisted, no signature required");
            request.accept();
            return request;
        }

        if !request.populate(&parse_query_string(query), &self.config.parameters) {
            return request;
        }
        let key_id = request.key_id().unwrap_or_default().to_string();
        let encoded_policy = request.encoded_policy().unwrap_or_default().to_string();
        let signature = request.signature().unwrap_or_default().to_string();

        let key = match self.registry.lookup(&key_id) {
            Some(key) if !key.trim().is_empty() => key,
            _ => {
                request.reject(
                    Status::Forbidden,
                    format!("{} '{}'", REASON_UNKNOWN_KEY, key_id),
                );
                return request;
            }
        };

        let policy = match decode_policy(&encoded_policy) {
            Ok(policy) => policy,
            Err(e) if e.is_client_error() => {
                tracing::debug!(error = %e, "policy could not be decoded");
                request.reject(Status::Forbidden, REASON_SIGNATURE_MISMATCH);
                return request;
            }
            Err(e) => {
                tracing::warn!(error = %e, "unexpected error while decoding policy");
                request.reject(Status::Forbidden, REASON_SIGNATURE_MISMATCH);
                return request;
            }
        };
        request.set_policy(policy.clone());

        if !self.config.algorithm.matches(&policy, &signature, key) {
            request.reject(Status::Forbidden, REASON_SIGNATURE_MISMATCH);
            return request;
        }

        if let Some(expected_ip) = policy.client_ip() {
            if !self.config.ip_match.matches(expected_ip, client_ip) {
                request.reject(Status::Forbidden, REASON_CLIENT_IP_MISMATCH);
                return request;
            }
        }

        if policy.resource() != resource {
            request.reject(Status::Forbidden, REASON_RESOURCE_MISMATCH);
            return request;
        }

        // One `now` for both window checks.
        if policy.is_expired_at(now) {
            request.reject(Status::Gone, REASON_EXPIRED);
            return request;
        }
        if policy.is_pending_at(now) {
            request.reject(Status::Gone, REASON_NOT_YET_ACTIVE);
            return request;
        }

        request.accept();
        request
    }
}

/// Authorize with the default configuration at the current time.
pub fn authorize<R: KeyRegistry>(
    query: &str,
    client_ip: &str,
    resource: &str,
    registry: &R,
) -> SignedRequest {
    Authorizer::with_defaults(registry).authorize(query, client_ip, resource)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{encode_policy, to_base64};
    use crate::issue::issue_signed_query_string;
    use crate::keys::StaticKeyRegistry;
    use crate::policy::Policy;
    use crate::signature::sign;
    use chrono::Duration;

    const KEY_ID: &str = "default";
    const KEY: &str = "0123456789abcdef";
    const CLIENT_IP: &str = "10.0.0.1";
    const RESOURCE: &str = "http://mh-allinone/";

    fn registry() -> StaticKeyRegistry {
        StaticKeyRegistry::new().with_key(KEY_ID, KEY)
    }

    fn valid_policy() -> Policy {
        Policy::new(RESOURCE, Utc::now() + Duration::hours(2)).unwrap()
    }

    /// Panics inside `lookup`, standing in for any unexpected failure.
    struct ExplodingRegistry;

    impl KeyRegistry for ExplodingRegistry {
        fn lookup(&self, _key_id: &str) -> Option<&str> {
            panic!("registry backend unavailable")
        }
    }

    #[test]
    fn test_matching_request_is_ok() {
        let policy = valid_policy();
        let query = issue_signed_query_string(&policy, KEY_ID, KEY).unwrap();
        let request = authorize(&query, CLIENT_IP, RESOURCE, &registry());
        assert_eq!(request.status(), Status::Ok);
        assert_eq!(request.rejection_reason(), None);
        assert_eq!(request.policy(), Some(&policy));
    }

    #[test]
    fn test_unknown_and_blank_keys_are_forbidden() {
        let policy = valid_policy();
        let query = issue_signed_query_string(&policy, "WrongId", KEY).unwrap();
        let request = authorize(&query, CLIENT_IP, RESOURCE, &registry());
        assert_eq!(request.status(), Status::Forbidden);
        assert_eq!(
            request.rejection_reason(),
            Some("unknown key identifier 'WrongId'")
        );

        let blank = StaticKeyRegistry::new().with_key(KEY_ID, "  ");
        let query = issue_signed_query_string(&policy, KEY_ID, KEY).unwrap();
        assert_eq!(
            authorize(&query, CLIENT_IP, RESOURCE, &blank).status(),
            Status::Forbidden
        );
    }

    #[test]
    fn test_undecodable_policy_is_indistinguishable_from_bad_signature() {
        let signature = sign(&valid_policy(), KEY).unwrap();
        let garbage = format!(
            "policy={}&keyId={}&signature={}",
            to_base64("{policy:'value'}"),
            KEY_ID,
            signature
        );
        let decode_failure = authorize(&garbage, CLIENT_IP, RESOURCE, &registry());
        assert_eq!(decode_failure.status(), Status::Forbidden);
        assert!(decode_failure.policy().is_none());

        let other = Policy::new("http://other.com", valid_policy().expires_at()).unwrap();
        let mismatch = format!(
            "policy={}&keyId={}&signature={}",
            encode_policy(&other).unwrap(),
            KEY_ID,
            signature
        );
        let bad_signature = authorize(&mismatch, CLIENT_IP, RESOURCE, &registry());
        assert_eq!(bad_signature.status(), Status::Forbidden);
        assert_eq!(
            decode_failure.rejection_reason(),
            bad_signature.rejection_reason()
        );
    }

    #[test]
    fn test_single_now_for_time_window() {
        let now = Utc::now();
        let policy = Policy::new(RESOURCE, now + Duration::hours(1))
            .unwrap()
            .with_available_from(now);
        let query = issue_signed_query_string(&policy, KEY_ID, KEY).unwrap();
        let authorizer = Authorizer::with_defaults(registry());

        let at_start =
            authorizer.authorize_at(&query, CLIENT_IP, RESOURCE, policy.available_from().unwrap());
        assert_eq!(at_start.status(), Status::Ok);

        let at_expiry =
            authorizer.authorize_at(&query, CLIENT_IP, RESOURCE, policy.expires_at());
        assert_eq!(at_expiry.status(), Status::Gone);
        assert_eq!(at_expiry.rejection_reason(), Some(REASON_EXPIRED));

        let before_start = authorizer.authorize_at(
            &query,
            CLIENT_IP,
            RESOURCE,
            policy.available_from().unwrap() - Duration::milliseconds(1),
        );
        assert_eq!(before_start.status(), Status::Gone);
        assert_eq!(before_start.rejection_reason(), Some(REASON_NOT_YET_ACTIVE));
    }

    #[test]
    fn test_panics_degrade_to_forbidden() {
        let query = issue_signed_query_string(&valid_policy(), KEY_ID, KEY).unwrap();
        let authorizer = Authorizer::with_defaults(ExplodingRegistry);
        let request = authorizer.authorize(&query, CLIENT_IP, RESOURCE);
        assert_eq!(request.status(), Status::Forbidden);
        assert_eq!(request.rejection_reason(), Some(REASON_SERVER_ERROR));
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let config = AuthorizerConfig::default().with_whitelist(["("]);
        assert!(Authorizer::new(registry(), config).is_err());
    }
}
