//! Access policy model.
//!
//! A [`Policy`] is the signed grant: which resource may be streamed, until
//! when, optionally from when, and optionally by which client address.
//!
//! Timestamps travel as epoch milliseconds, so they are truncated to
//! millisecond precision on construction. A decoded policy therefore compares
//! equal to the policy it was encoded from.

use chrono::{DateTime, Utc};

use crate::error::{SigningError, SigningResult};

/// A signed access grant for one resource.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Policy {
    resource: String,
    expires_at: DateTime<Utc>,
    available_from: Option<DateTime<Utc>>,
    client_ip: Option<String>,
}

impl Policy {
    /// Create a policy for `resource` that expires at `expires_at`.
    ///
    /// Fails if `resource` is empty.
    pub fn new(resource: impl Into<String>, expires_at: DateTime<Utc>) -> SigningResult<Self> {
        let resource = resource.into();
        if resource.is_empty() {
            return Err(SigningError::InvalidPolicy {
                reason: "resource must not be empty".to_string(),
            });
        }
        Ok(Self {
            resource,
            expires_at: truncate_to_millis(expires_at),
            available_from: None,
            client_ip: None,
        })
    }

    /// Restrict the grant to start at `available_from`.
    pub fn with_available_from(mut self, available_from: DateTime<Utc>) -> Self {
        self.available_from = Some(truncate_to_millis(available_from));
        self
    }

    /// Restrict the grant to a single client address.
    ///
    /// A blank address leaves the policy unrestricted.
    pub fn with_client_ip(mut self, client_ip: impl Into<String>) -> Self {
        let client_ip = client_ip.into();
        self.client_ip = if client_ip.trim().is_empty() {
            None
        } else {
            Some(client_ip)
        };
        self
    }

    /// The exact resource identifier (URL or stream name) this grant covers.
    pub fn resource(&self) -> &str {
        &self.resource
    }

    /// Instant at and after which the grant is no longer valid.
    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    pub fn available_from(&self) -> Option<DateTime<Utc>> {
        self.available_from
    }

    pub fn client_ip(&self) -> Option<&str> {
        self.client_ip.as_deref()
    }

    /// Whether the grant has expired at `now`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    /// Whether the grant has not started yet at `now`.
    pub fn is_pending_at(&self, now: DateTime<Utc>) -> bool {
        self.available_from.is_some_and(|from| now < from)
    }
}

/// Convert epoch milliseconds into a UTC timestamp.
pub(crate) fn timestamp_from_millis(millis: i64) -> SigningResult<DateTime<Utc>> {
    DateTime::from_timestamp_millis(millis)
        .ok_or_else(|| SigningError::malformed(format!("timestamp out of range: {}", millis)))
}

fn truncate_to_millis(at: DateTime<Utc>) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(at.timestamp_millis()).unwrap_or(at)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn expiry() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2015, 3, 1, 0, 46, 17).unwrap()
    }

    #[test]
    fn test_new_requires_resource() {
        let err = Policy::new("", expiry()).unwrap_err();
        assert!(matches!(err, SigningError::InvalidPolicy { .. }));
    }

    #[test]
    fn test_optional_fields_default_to_absent() {
        let policy = Policy::new("http://mh-allinone/", expiry()).unwrap();
        assert_eq!(policy.resource(), "http://mh-allinone/");
        assert_eq!(policy.expires_at(), expiry());
        assert_eq!(policy.available_from(), None);
        assert_eq!(policy.client_ip(), None);
    }

    #[test]
    fn test_blank_client_ip_is_absent() {
        let policy = Policy::new("rtmp://host/stream", expiry())
            .unwrap()
            .with_client_ip("  ");
        assert_eq!(policy.client_ip(), None);
    }

    #[test]
    fn test_timestamps_truncated_to_millis() {
        let at = expiry() + Duration::nanoseconds(1_234_567);
        let policy = Policy::new("stream", at).unwrap();
        assert_eq!(policy.expires_at().timestamp_millis(), at.timestamp_millis());
        assert_eq!(policy.expires_at().timestamp_subsec_nanos(), 1_000_000);
    }

    #[test]
    fn test_expiry_is_inclusive() {
        let policy = Policy::new("stream", expiry()).unwrap();
        assert!(!policy.is_expired_at(expiry() - Duration::milliseconds(1)));
        assert!(policy.is_expired_at(expiry()));
    }

    #[test]
    fn test_pending_until_available() {
        let from = expiry() - Duration::hours(1);
        let policy = Policy::new("stream", expiry())
            .unwrap()
            .with_available_from(from);
        assert!(policy.is_pending_at(from - Duration::milliseconds(1)));
        assert!(!policy.is_pending_at(from));
    }

    #[test]
    fn test_timestamp_out_of_range() {
        assert!(timestamp_from_millis(i64::MAX).is_err());
        assert_eq!(
            timestamp_from_millis(1_425_170_777_000).unwrap(),
            expiry()
        );
    }
}
