//! Issuing signed query strings.

use crate::codec::encode_policy;
use crate::config::AuthorizerConfig;
use crate::error::SigningResult;
use crate::policy::Policy;
use crate::request::{ParameterNames, SignedRequest};
use crate::signature::SignatureAlgorithm;

/// Issues signed query strings that an [`Authorizer`](crate::Authorizer)
/// with the same algorithm and parameter names accepts.
#[derive(Debug, Clone, Default)]
pub struct Signer {
    algorithm: SignatureAlgorithm,
    parameters: ParameterNames,
}

impl Signer {
    pub fn new(algorithm: SignatureAlgorithm, parameters: ParameterNames) -> Self {
        Self {
            algorithm,
            parameters,
        }
    }

    /// Signer matching an authorizer configuration.
    pub fn from_config(config: &AuthorizerConfig) -> Self {
        Self::new(config.algorithm, config.parameters.clone())
    }

    /// Encode and sign `policy` into a request.
    pub fn sign_request(
        &self,
        policy: &Policy,
        key_id: &str,
        key: &str,
    ) -> SigningResult<SignedRequest> {
        let encoded_policy = encode_policy(policy)?;
        let signature = self.algorithm.sign(policy, key)?;
        Ok(SignedRequest::from_parts(encoded_policy, key_id, signature))
    }

    /// Query string (without leading `?`) granting `policy`.
    pub fn signed_query_string(
        &self,
        policy: &Policy,
        key_id: &str,
        key: &str,
    ) -> SigningResult<String> {
        Ok(self
            .sign_request(policy, key_id, key)?
            .to_query_string(&self.parameters))
    }
}

/// Query string granting `policy`, signed with the default algorithm and
/// parameter names.
pub fn issue_signed_query_string(
    policy: &Policy,
    key_id: &str,
    key: &str,
) -> SigningResult<String> {
    Signer::default().signed_query_string(policy, key_id, key)
}
