//! Signed-URL authorization engine for streamed media resources.
//!
//! A resource URL carries three query parameters: a Base64 encoded access
//! policy, the id of a shared key, and a signature over the policy. The
//! engine decodes the policy, verifies the signature with the named key and
//! checks the policy against the live request, yielding a [`Status`]:
//!
//! - `Ok` - access granted
//! - `BadRequest` - parameters missing or duplicated
//! - `Forbidden` - unknown key, bad signature, client IP or resource mismatch
//! - `Gone` - valid signature, but outside the policy's time window
//!
//! # Quick Start
//!
//! ```
//! use chrono::{Duration, Utc};
//! use streamsign_core::{issue_signed_query_string, Authorizer, Policy, StaticKeyRegistry, Status};
//!
//! # fn example() -> streamsign_core::SigningResult<()> {
//! let keys = StaticKeyRegistry::new().with_key("default", "0123456789abcdef");
//!
//! // Issuer side
//! let policy = Policy::new("http://mh/1", Utc::now() + Duration::hours(1))?;
//! let query = issue_signed_query_string(&policy, "default", "0123456789abcdef")?;
//!
//! // Verifier side
//! let authorizer = Authorizer::with_defaults(&keys);
//! let request = authorizer.authorize(&query, "10.0.0.1", "http://mh/1");
//! assert_eq!(request.status(), Status::Ok);
//! # Ok(())
//! # }
//! # example().unwrap();
//! ```
//!
//! # Canonical Policy
//!
//! ```text
//! {"Statement":{"Resource":"<uri>","Condition":{"DateGreaterThan":<ms>,"DateLessThan":<ms>,"IpAddress":"<ip>"}}}
//! ```
//!
//! `DateGreaterThan` and `IpAddress` are optional. See [`codec`].

pub mod authorize;
pub mod cipher;
pub mod codec;
pub mod config;
pub mod error;
pub mod issue;
pub mod keys;
pub mod policy;
pub mod request;
pub mod signature;
pub mod status;
pub mod whitelist;

// Re-export main types
pub use authorize::{authorize, Authorizer};
pub use config::{AuthorizerConfig, IpMatch};
pub use error::{SigningError, SigningResult};
pub use issue::{issue_signed_query_string, Signer};
pub use keys::{KeyRegistry, StaticKeyRegistry};
pub use policy::Policy;
pub use request::{
    parse_query_string, ParameterNames, SignedRequest, KEY_ID_PARAM, POLICY_PARAM,
    SIGNATURE_PARAM,
};
pub use signature::SignatureAlgorithm;
pub use status::Status;
pub use whitelist::Whitelist;
