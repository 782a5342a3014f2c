//! Authorizer configuration.
//!
//! Loaded from YAML, from the environment, or built in code:
//!
//! ```yaml
//! algorithm: aes-cbc        # or hmac-sha256
//! ip_match: exact           # exact | normalized | ignore
//! parameters:
//!   policy: policy
//!   key_id: keyId
//!   signature: signature
//! whitelist:
//!   - "vod/public/.*"
//! ```
//!
//! | Environment Variable | Description |
//! |---------------------|-------------|
//! | `STREAMSIGN_ALGORITHM` | Signature algorithm |
//! | `STREAMSIGN_IP_MATCH` | Client IP comparison mode |
//! | `STREAMSIGN_WHITELIST` | Comma separated resource patterns |
//! | `STREAMSIGN_PARAM_POLICY` | Query parameter carrying the policy |
//! | `STREAMSIGN_PARAM_KEY_ID` | Query parameter carrying the key id |
//! | `STREAMSIGN_PARAM_SIGNATURE` | Query parameter carrying the signature |

use std::fmt;
use std::net::IpAddr;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{SigningError, SigningResult};
use crate::request::ParameterNames;
use crate::signature::SignatureAlgorithm;
use crate::whitelist::Whitelist;

pub const ENV_ALGORITHM: &str = "STREAMSIGN_ALGORITHM";
pub const ENV_IP_MATCH: &str = "STREAMSIGN_IP_MATCH";
pub const ENV_WHITELIST: &str = "STREAMSIGN_WHITELIST";
pub const ENV_PARAM_POLICY: &str = "STREAMSIGN_PARAM_POLICY";
pub const ENV_PARAM_KEY_ID: &str = "STREAMSIGN_PARAM_KEY_ID";
pub const ENV_PARAM_SIGNATURE: &str = "STREAMSIGN_PARAM_SIGNATURE";

/// How a policy's client address is compared with the requesting address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IpMatch {
    /// Case-insensitive string comparison.
    #[default]
    Exact,
    /// Compare parsed addresses, so `::1` equals `0:0:0:0:0:0:0:1` and
    /// `::ffff:10.0.0.1` equals `10.0.0.1`. Falls back to `Exact` for
    /// values that do not parse.
    Normalized,
    /// Never enforce the policy's client address.
    Ignore,
}

impl IpMatch {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Exact => "exact",
            Self::Normalized => "normalized",
            Self::Ignore => "ignore",
        }
    }

    /// Whether `actual` satisfies the policy address `expected`.
    pub fn matches(&self, expected: &str, actual: &str) -> bool {
        match self {
            Self::Exact => expected.eq_ignore_ascii_case(actual),
            Self::Normalized => match (parse_ip(expected), parse_ip(actual)) {
                (Some(a), Some(b)) => a == b,
                _ => expected.trim().eq_ignore_ascii_case(actual.trim()),
            },
            Self::Ignore => true,
        }
    }
}

fn parse_ip(value: &str) -> Option<IpAddr> {
    match value.trim().parse::<IpAddr>().ok()? {
        IpAddr::V6(v6) => Some(
            v6.to_ipv4_mapped()
                .map(IpAddr::V4)
                .unwrap_or(IpAddr::V6(v6)),
        ),
        v4 => Some(v4),
    }
}

impl fmt::Display for IpMatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IpMatch {
    type Err = SigningError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "exact" => Ok(Self::Exact),
            "normalized" => Ok(Self::Normalized),
            "ignore" => Ok(Self::Ignore),
            other => Err(SigningError::config(format!(
                "unknown ip match mode '{}' (expected exact, normalized or ignore)",
                other
            ))),
        }
    }
}

/// Settings for an [`Authorizer`](crate::authorize::Authorizer).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AuthorizerConfig {
    /// Query parameter names.
    pub parameters: ParameterNames,

    /// Signature algorithm.
    pub algorithm: SignatureAlgorithm,

    /// Client IP comparison mode.
    pub ip_match: IpMatch,

    /// Resource patterns that bypass signature checks entirely.
    pub whitelist: Vec<String>,
}

impl AuthorizerConfig {
    /// Parse YAML configuration.
    pub fn from_yaml_str(content: &str) -> SigningResult<Self> {
        let config: Self = serde_yaml::from_str(content)
            .map_err(|e| SigningError::config(format!("invalid authorizer config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Read a YAML configuration file.
    pub fn from_path(path: impl AsRef<Path>) -> SigningResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| SigningError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_yaml_str(&content)
    }

    /// Default configuration with environment overrides applied.
    pub fn from_env() -> SigningResult<Self> {
        Self::default().with_env_overrides()
    }

    /// Apply `STREAMSIGN_*` environment overrides on top of `self`.
    pub fn with_env_overrides(self) -> SigningResult<Self> {
        self.with_overrides(|name| std::env::var(name).ok())
    }

    fn with_overrides(mut self, var: impl Fn(&str) -> Option<String>) -> SigningResult<Self> {
        if let Some(v) = var(ENV_ALGORITHM) {
            self.algorithm = v.parse()?;
        }
        if let Some(v) = var(ENV_IP_MATCH) {
            self.ip_match = v.parse()?;
        }
        if let Some(v) = var(ENV_WHITELIST) {
            self.whitelist = v
                .split(',')
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .map(String::from)
                .collect();
        }
        if let Some(v) = var(ENV_PARAM_POLICY) {
            self.parameters.policy = v;
        }
        if let Some(v) = var(ENV_PARAM_KEY_ID) {
            self.parameters.key_id = v;
        }
        if let Some(v) = var(ENV_PARAM_SIGNATURE) {
            self.parameters.signature = v;
        }
        self.validate()?;
        Ok(self)
    }

    /// Check parameter names and compile the whitelist.
    pub fn validate(&self) -> SigningResult<()> {
        self.parameters.validate().map_err(SigningError::config)?;
        Whitelist::new(&self.whitelist)?;
        Ok(())
    }

    pub fn with_algorithm(mut self, algorithm: SignatureAlgorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    pub fn with_ip_match(mut self, ip_match: IpMatch) -> Self {
        self.ip_match = ip_match;
        self
    }

    pub fn with_parameters(mut self, parameters: ParameterNames) -> Self {
        self.parameters = parameters;
        self
    }

    pub fn with_whitelist<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.whitelist = patterns.into_iter().map(Into::into).collect();
        self
    }
}
