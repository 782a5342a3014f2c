//! Signed request parsing.
//!
//! A signed request carries three query parameters: the Base64 policy, the
//! identifier of the signing key, and the signature. Each must appear exactly
//! once; anything else is a bad request.

use std::fmt;

use serde::{Deserialize, Serialize};
use url::form_urlencoded;

use crate::policy::Policy;
use crate::status::Status;

/// Default query parameter carrying the encoded policy.
pub const POLICY_PARAM: &str = "policy";
/// Default query parameter carrying the key identifier.
pub const KEY_ID_PARAM: &str = "keyId";
/// Default query parameter carrying the signature.
pub const SIGNATURE_PARAM: &str = "signature";

/// Names of the three recognized query parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParameterNames {
    pub policy: String,
    pub key_id: String,
    pub signature: String,
}

impl Default for ParameterNames {
    fn default() -> Self {
        Self {
            policy: POLICY_PARAM.to_string(),
            key_id: KEY_ID_PARAM.to_string(),
            signature: SIGNATURE_PARAM.to_string(),
        }
    }
}

impl ParameterNames {
    /// Names must be non-empty and distinct.
    pub fn validate(&self) -> Result<(), String> {
        let names = [&self.policy, &self.key_id, &self.signature];
        if names.iter().any(|n| n.trim().is_empty()) {
            return Err("query parameter names must not be empty".to_string());
        }
        if self.policy == self.key_id
            || self.policy == self.signature
            || self.key_id == self.signature
        {
            return Err(format!(
                "query parameter names must be distinct: {}, {}, {}",
                self.policy, self.key_id, self.signature
            ));
        }
        Ok(())
    }
}

/// Split a query string into decoded `(name, value)` pairs, in order.
///
/// A leading `?` is ignored. Repeated names are kept.
pub fn parse_query_string(query: &str) -> Vec<(String, String)> {
    let query = query.strip_prefix('?').unwrap_or(query);
    form_urlencoded::parse(query.as_bytes())
        .map(|(name, value)| (name.into_owned(), value.into_owned()))
        .collect()
}

/// One inbound authorization attempt.
///
/// Built fresh per request and filled in as the pipeline runs.
#[derive(Clone, Default)]
pub struct SignedRequest {
    encoded_policy: Option<String>,
    key_id: Option<String>,
    signature: Option<String>,
    policy: Option<Policy>,
    status: Status,
    rejection_reason: Option<String>,
}

impl SignedRequest {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a request from already extracted parameter values.
    pub fn from_parts(
        encoded_policy: impl Into<String>,
        key_id: impl Into<String>,
        signature: impl Into<String>,
    ) -> Self {
        Self {
            encoded_policy: Some(encoded_policy.into()),
            key_id: Some(key_id.into()),
            signature: Some(signature.into()),
            ..Self::default()
        }
    }

    pub fn encoded_policy(&self) -> Option<&str> {
        self.encoded_policy.as_deref()
    }

    pub fn key_id(&self) -> Option<&str> {
        self.key_id.as_deref()
    }

    pub fn signature(&self) -> Option<&str> {
        self.signature.as_deref()
    }

    /// The decoded policy, once the pipeline got that far.
    pub fn policy(&self) -> Option<&Policy> {
        self.policy.as_ref()
    }

    pub fn status(&self) -> Status {
        self.status
    }

    /// Human-readable reason, set whenever the status is not `Ok`.
    pub fn rejection_reason(&self) -> Option<&str> {
        self.rejection_reason.as_deref()
    }

    /// Fill the three fields from parsed query parameters.
    ///
    /// Returns `true` only if each parameter was present exactly once with a
    /// non-blank value. Otherwise the request is marked `BadRequest`.
    pub fn populate(&mut self, params: &[(String, String)], names: &ParameterNames) -> bool {
        // Occurrences are counted per name; a blank value still counts.
        let mut seen = [false; 3];
        for (name, value) in params {
            let (idx, slot) = if *name == names.policy {
                (0, &mut self.encoded_policy)
            } else if *name == names.key_id {
                (1, &mut self.key_id)
            } else if *name == names.signature {
                (2, &mut self.signature)
            } else {
                continue;
            };

            if seen[idx] {
                self.reject(
                    Status::BadRequest,
                    format!(
                        "missing or duplicated query parameter: '{}' appears more than once",
                        name
                    ),
                );
                return false;
            }
            seen[idx] = true;
            *slot = Some(value.clone());
        }

        let missing: Vec<&str> = [
            (&self.encoded_policy, names.policy.as_str()),
            (&self.key_id, names.key_id.as_str()),
            (&self.signature, names.signature.as_str()),
        ]
        .into_iter()
        .filter(|(slot, _)| !is_set(slot))
        .map(|(_, name)| name)
        .collect();

        if !missing.is_empty() {
            self.reject(
                Status::BadRequest,
                format!(
                    "missing or duplicated query parameter: '{}' is missing",
                    missing.join("', '")
                ),
            );
            return false;
        }
        true
    }

    /// Render the three parameters as a query string (without leading `?`).
    pub fn to_query_string(&self, names: &ParameterNames) -> String {
        form_urlencoded::Serializer::new(String::new())
            .append_pair(&names.policy, self.encoded_policy().unwrap_or_default())
            .append_pair(&names.key_id, self.key_id().unwrap_or_default())
            .append_pair(&names.signature, self.signature().unwrap_or_default())
            .finish()
    }

    pub(crate) fn set_policy(&mut self, policy: Policy) {
        self.policy = Some(policy);
    }

    pub(crate) fn reject(&mut self, status: Status, reason: impl Into<String>) {
        self.status = status;
        self.rejection_reason = Some(reason.into());
    }

    pub(crate) fn accept(&mut self) {
        self.status = Status::Ok;
        self.rejection_reason = None;
    }
}

// Signatures are credentials; keep them out of logs.
impl fmt::Debug for SignedRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignedRequest")
            .field("encoded_policy", &self.encoded_policy)
            .field("key_id", &self.key_id)
            .field("signature", &self.signature.as_ref().map(|_| "<redacted>"))
            .field("policy", &self.policy)
            .field("status", &self.status)
            .field("rejection_reason", &self.rejection_reason)
            .finish()
    }
}

fn is_set(slot: &Option<String>) -> bool {
    slot.as_deref().is_some_and(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names() -> ParameterNames {
        ParameterNames::default()
    }

    fn populate(query: &str) -> (bool, SignedRequest) {
        let mut request = SignedRequest::new();
        let ok = request.populate(&parse_query_string(query), &names());
        (ok, request)
    }

    #[test]
    fn test_query_string_parsing() {
        let params =
            parse_query_string("?policy={policy:'value'}&signature=randomString&keyId=default");
        assert_eq!(
            params,
            vec![
                ("policy".to_string(), "{policy:'value'}".to_string()),
                ("signature".to_string(), "randomString".to_string()),
                ("keyId".to_string(), "default".to_string()),
            ]
        );
    }

    #[test]
    fn test_query_string_is_url_decoded() {
        let params = parse_query_string("policy=a%3D%3D&keyId=my%20key");
        assert_eq!(params[0].1, "a==");
        assert_eq!(params[1].1, "my key");
    }

    #[test]
    fn test_populate_all_present() {
        let (ok, request) = populate("policy=p&keyId=k&signature=s&other=1");
        assert!(ok);
        assert_eq!(request.encoded_policy(), Some("p"));
        assert_eq!(request.key_id(), Some("k"));
        assert_eq!(request.signature(), Some("s"));
        assert_eq!(request.rejection_reason(), None);
    }

    #[test]
    fn test_duplicate_parameters_are_bad_requests() {
        for query in [
            "keyId=org1&keyId=org2",
            "policy=policy1&policy=policy2",
            "signature=signature1&signature=signature1",
            "policy=p&keyId=k&signature=s&policy=p",
            "policy=&policy=p&keyId=k&signature=s",
            "policy=p&keyId=k&signature=s&keyId=",
        ] {
            let (ok, request) = populate(query);
            assert!(!ok, "{}", query);
            assert_eq!(request.status(), Status::BadRequest, "{}", query);
            assert!(request
                .rejection_reason()
                .unwrap()
                .contains("appears more than once"));
        }
    }

    #[test]
    fn test_missing_parameters_are_bad_requests() {
        for (query, missing) in [
            ("policy=policy&signature=signature", "keyId"),
            ("keyId=organization&signature=signature", "policy"),
            ("keyId=organization&policy=policy", "signature"),
            ("policy=&keyId=k&signature=s", "policy"),
        ] {
            let (ok, request) = populate(query);
            assert!(!ok, "{}", query);
            assert_eq!(request.status(), Status::BadRequest);
            assert!(request.rejection_reason().unwrap().contains(missing));
        }
    }

    #[test]
    fn test_custom_parameter_names() {
        let names = ParameterNames {
            key_id: "organization".to_string(),
            ..ParameterNames::default()
        };
        let mut request = SignedRequest::new();
        assert!(request.populate(
            &parse_query_string("policy=p&organization=mh_default_org&signature=s"),
            &names
        ));
        assert_eq!(request.key_id(), Some("mh_default_org"));
    }

    #[test]
    fn test_parameter_names_validation() {
        assert!(names().validate().is_ok());
        let clash = ParameterNames {
            signature: "policy".to_string(),
            ..ParameterNames::default()
        };
        assert!(clash.validate().is_err());
        let empty = ParameterNames {
            key_id: " ".to_string(),
            ..ParameterNames::default()
        };
        assert!(empty.validate().is_err());
    }

    #[test]
    fn test_to_query_string_round_trips() {
        let request = SignedRequest::from_parts("eyJ9==", "default", "c2ln-_==");
        let query = request.to_query_string(&names());
        assert_eq!(query, "policy=eyJ9%3D%3D&keyId=default&signature=c2ln-_%3D%3D");

        let (ok, parsed) = populate(&query);
        assert!(ok);
        assert_eq!(parsed.encoded_policy(), Some("eyJ9=="));
        assert_eq!(parsed.signature(), Some("c2ln-_=="));
    }

    #[test]
    fn test_debug_redacts_signature() {
        let request = SignedRequest::from_parts("p", "k", "secret-signature");
        let debug = format!("{:?}", request);
        assert!(!debug.contains("secret-signature"));
        assert!(debug.contains("<redacted>"));
    }
}
