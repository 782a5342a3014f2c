//! Shared key registry.
//!
//! The engine only needs `lookup(key_id) -> key`. Where the keys come from is
//! the host's concern; [`StaticKeyRegistry`] covers the common case of a
//! properties file (`keyId=secret` per line) loaded once at startup.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::path::Path;

use crate::error::{SigningError, SigningResult};

/// Read-only mapping from key identifier to shared secret.
pub trait KeyRegistry {
    fn lookup(&self, key_id: &str) -> Option<&str>;
}

impl KeyRegistry for HashMap<String, String> {
    fn lookup(&self, key_id: &str) -> Option<&str> {
        self.get(key_id).map(String::as_str)
    }
}

impl KeyRegistry for BTreeMap<String, String> {
    fn lookup(&self, key_id: &str) -> Option<&str> {
        self.get(key_id).map(String::as_str)
    }
}

impl<R: KeyRegistry + ?Sized> KeyRegistry for &R {
    fn lookup(&self, key_id: &str) -> Option<&str> {
        (**self).lookup(key_id)
    }
}

/// Immutable key registry built once and shared by reference.
#[derive(Clone, Default)]
pub struct StaticKeyRegistry {
    keys: BTreeMap<String, String>,
}

impl StaticKeyRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a key, replacing any previous key with the same id.
    pub fn with_key(mut self, key_id: impl Into<String>, key: impl Into<String>) -> Self {
        self.keys.insert(key_id.into(), key.into());
        self
    }

    /// Parse a Java-style properties document.
    ///
    /// Each non-comment line is `id=key`, `id: key` or `id key`; the id ends
    /// at the first `=`, `:` or whitespace. A line holding only an id maps it
    /// to an empty key. Lines starting with `#` or `!` are comments. Lines
    /// with an empty id are skipped so one bad line never drops the file.
    pub fn from_properties_str(content: &str) -> SigningResult<Self> {
        let mut keys = BTreeMap::new();
        for (idx, raw) in content.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') || line.starts_with('!') {
                continue;
            }
            let (key_id, key) = split_property(line);
            if key_id.is_empty() {
                tracing::warn!(line = idx + 1, "skipping key file line with an empty key id");
                continue;
            }
            if keys.insert(key_id.to_string(), key.to_string()).is_some() {
                tracing::warn!(key_id, line = idx + 1, "duplicate key id, last one wins");
            }
        }
        Ok(Self { keys })
    }

    /// Read and parse a properties file.
    pub fn from_properties_path(path: impl AsRef<Path>) -> SigningResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| SigningError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let registry = Self::from_properties_str(&content)?;
        tracing::debug!(path = %path.display(), keys = registry.len(), "loaded signing keys");
        Ok(registry)
    }

    /// Load a properties file, falling back to an empty registry.
    ///
    /// With an empty registry every signed request is rejected as
    /// `Forbidden`, so a missing key file fails closed.
    pub fn load_or_empty(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match Self::from_properties_path(path) {
            Ok(registry) => registry,
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "unable to load signing keys, all signed urls will be rejected"
                );
                Self::new()
            }
        }
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Key identifiers, sorted.
    pub fn key_ids(&self) -> impl Iterator<Item = &str> {
        self.keys.keys().map(String::as_str)
    }
}

/// Split a trimmed properties line into `(id, value)`.
fn split_property(line: &str) -> (&str, &str) {
    let Some(sep) = line.find(|c: char| c == '=' || c == ':' || c.is_whitespace()) else {
        return (line, "");
    };
    let (key_id, rest) = line.split_at(sep);
    let rest = rest.trim_start();
    let value = rest
        .strip_prefix('=')
        .or_else(|| rest.strip_prefix(':'))
        .unwrap_or(rest);
    (key_id, value.trim())
}

impl KeyRegistry for StaticKeyRegistry {
    fn lookup(&self, key_id: &str) -> Option<&str> {
        self.keys.get(key_id).map(String::as_str)
    }
}

impl fmt::Debug for StaticKeyRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StaticKeyRegistry")
            .field("key_ids", &self.keys.keys().collect::<Vec<_>>())
            .finish()
    }
}
