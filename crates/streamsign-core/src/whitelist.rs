//! Resources that may be streamed without a signature.

use regex::Regex;

use crate::error::{SigningError, SigningResult};

/// Compiled set of resource patterns.
///
/// A resource is whitelisted when it matches a pattern in full, not merely
/// contains a match.
#[derive(Debug, Clone, Default)]
pub struct Whitelist {
    patterns: Vec<Regex>,
}

impl Whitelist {
    pub fn new<I, S>(patterns: I) -> SigningResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let patterns = patterns
            .into_iter()
            .map(|p| {
                let p = p.as_ref();
                Regex::new(&format!("^(?:{})$", p)).map_err(|e| {
                    SigningError::config(format!("invalid whitelist pattern '{}': {}", p, e))
                })
            })
            .collect::<SigningResult<Vec<_>>>()?;
        Ok(Self { patterns })
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    pub fn is_whitelisted(&self, resource: &str) -> bool {
        self.patterns.iter().any(|p| p.is_match(resource))
    }
}
