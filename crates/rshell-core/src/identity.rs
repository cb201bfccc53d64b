//! Authentication identities
//!
//! A fresh key pair is generated for every invocation and its public half is
//! injected into the remote task. Local private keys are offered afterwards
//! as fallbacks. Nothing here writes key material to disk.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use russh_keys::key::KeyPair;
use russh_keys::PublicKeyBase64;
use thiserror::Error;

/// Files larger than this are never treated as private keys
pub const MAX_KEY_FILE_SIZE: u64 = 2 * 1024 * 1024;

/// Identity loading and generation errors
#[derive(Debug, Error)]
pub enum IdentityError {
    /// Key generation failed
    #[error("Failed to generate key pair")]
    Generation,

    /// Public half of a key could not be derived
    #[error("Failed to derive public key: {0}")]
    PublicKey(String),

    /// A key file could not be read or parsed
    #[error("Failed to load key from {path}: {message}")]
    Load { path: PathBuf, message: String },
}

/// Where an identity came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdentitySource {
    /// Generated for this invocation
    Generated,
    /// Loaded from a local key file
    File(PathBuf),
}

impl fmt::Display for IdentitySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IdentitySource::Generated => write!(f, "generated"),
            IdentitySource::File(path) => write!(f, "{}", path.display()),
        }
    }
}

/// A private key usable for public-key authentication
#[derive(Clone)]
pub struct Identity {
    key: Arc<KeyPair>,
    source: IdentitySource,
}

impl Identity {
    /// Wrap a key pair
    pub fn new(key: KeyPair, source: IdentitySource) -> Self {
        Self {
            key: Arc::new(key),
            source,
        }
    }

    /// The key pair, shared for handing to the transport
    pub fn key(&self) -> Arc<KeyPair> {
        Arc::clone(&self.key)
    }

    /// Where this identity came from
    pub fn source(&self) -> &IdentitySource {
        &self.source
    }

    /// Public key in OpenSSH `authorized_keys` form (`<algorithm> <base64>`)
    pub fn authorized_key(&self) -> Result<String, IdentityError> {
        let public = self
            .key
            .clone_public_key()
            .map_err(|e| IdentityError::PublicKey(e.to_string()))?;
        Ok(format!("{} {}", public.name(), public.public_key_base64()))
    }
}

impl fmt::Debug for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Identity")
            .field("source", &self.source)
            .finish_non_exhaustive()
    }
}

/// Generate a fresh identity and its authorized-key line
pub fn generate_identity() -> Result<(Identity, String), IdentityError> {
    let key = KeyPair::generate_ed25519().ok_or(IdentityError::Generation)?;
    let identity = Identity::new(key, IdentitySource::Generated);
    let authorized_key = identity.authorized_key()?;
    Ok((identity, authorized_key))
}

/// Load a single private key file
pub fn load_identity(path: &Path) -> Result<Identity, IdentityError> {
    let key = russh_keys::load_secret_key(path, None).map_err(|e| IdentityError::Load {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    Ok(Identity::new(key, IdentitySource::File(path.to_path_buf())))
}

/// Load every unencrypted private key found directly inside `dir`.
///
/// Oversized, unreadable and unparseable files are skipped. A missing
/// directory yields no identities.
pub fn load_local_identities(dir: &Path) -> Vec<Identity> {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            tracing::debug!("Not scanning {:?} for keys: {}", dir, e);
            return Vec::new();
        }
    };

    let mut paths: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok())
        .filter(|entry| {
            entry
                .metadata()
                .map(|m| m.is_file() && m.len() <= MAX_KEY_FILE_SIZE)
                .unwrap_or(false)
        })
        .map(|entry| entry.path())
        .collect();
    paths.sort();

    let mut identities = Vec::new();
    for path in paths {
        match load_identity(&path) {
            Ok(identity) => {
                tracing::info!("Loaded key {:?}", path);
                identities.push(identity);
            }
            Err(e) => tracing::trace!("Skipping {:?}: {}", path, e),
        }
    }
    identities
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_identity_has_authorized_key() {
        let (identity, authorized_key) = generate_identity().unwrap();
        assert_eq!(identity.source(), &IdentitySource::Generated);
        assert!(authorized_key.starts_with("ssh-ed25519 "));
        assert!(!authorized_key.ends_with('\n'));
    }

    #[test]
    fn test_generated_identities_differ() {
        let (_, first) = generate_identity().unwrap();
        let (_, second) = generate_identity().unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn test_missing_key_dir_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let identities = load_local_identities(&dir.path().join("nope"));
        assert!(identities.is_empty());
    }

    #[test]
    fn test_non_key_files_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("known_hosts"), "example.com ssh-ed25519 AAAA\n").unwrap();
        std::fs::write(dir.path().join("config"), "Host *\n").unwrap();
        std::fs::create_dir(dir.path().join("sockets")).unwrap();

        assert!(load_local_identities(dir.path()).is_empty());
    }

    #[test]
    fn test_load_identity_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("id_bogus");
        std::fs::write(&path, "not a key").unwrap();

        match load_identity(&path) {
            Err(IdentityError::Load { path: reported, .. }) => assert_eq!(reported, path),
            other => panic!("unexpected result: {:?}", other.map(|_| ())),
        }
    }
}
