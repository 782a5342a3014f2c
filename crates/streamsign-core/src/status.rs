//! Terminal authorization outcomes.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Result of authorizing one request.
///
/// Defaults to [`Status::Forbidden`]: a request is only allowed once the
/// pipeline has run to completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Status {
    /// The request may access the resource.
    Ok,
    /// Query parameters were missing or duplicated.
    BadRequest,
    /// Unknown key, invalid signature, or a client/resource mismatch.
    #[default]
    Forbidden,
    /// Valid signature, but outside the policy's time window.
    Gone,
}

impl Status {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Ok)
    }

    /// HTTP status code for transports that speak HTTP.
    pub fn http_status(&self) -> u16 {
        match self {
            Self::Ok => 200,
            Self::BadRequest => 400,
            Self::Forbidden => 403,
            Self::Gone => 410,
        }
    }

    /// Message passed to a host's connection rejection call.
    ///
    /// Every non-`Ok` status rejects; `Gone` is not a soft failure.
    pub fn rejection_message(&self) -> Option<&'static str> {
        match self {
            Self::Ok => None,
            Self::BadRequest => Some("The request was rejected because it was a bad request."),
            Self::Forbidden => Some("Forbidden"),
            Self::Gone => Some("The resource is currently not available."),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ok => "Ok",
            Self::BadRequest => "BadRequest",
            Self::Forbidden => "Forbidden",
            Self::Gone => "Gone",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
