//! Schema caching with fingerprint support.
//!
//! A loaded [`Schema`] can be written to a binary snapshot and read back
//! without decoding any XML. Two workflows are supported:
//!
//! 1. **Build → deploy**: a build step loads the declaration files and
//!    saves a cache; deployed tools load the cache without verification
//!    (no declaration files available).
//!
//! 2. **Local declarations**: compute a fingerprint from the declaration
//!    files, verify the cache against it on load, and rebuild it when the
//!    files changed.
//!
//! # File Format
//!
//! Cache files use the `.cimx` extension by convention:
//!
//! ```text
//! ┌────────────────────────────────────────┐
//! │ Header (13 or 45 bytes)                │
//! │   magic: [u8; 4]        "CIMX"         │
//! │   version: u32          Schema version │
//! │   has_fingerprint: u8   0 or 1         │
//! │   fingerprint: [u8; 32] (if present)   │
//! ├────────────────────────────────────────┤
//! │ Payload (postcard-encoded Schema)      │
//! └────────────────────────────────────────┘
//! ```
//!
//! # Examples
//!
//! ```ignore
//! // Build step
//! let schema = load_schema_dir("schema/")?;
//! save_cache(&schema, "schema.cimx", None)?;
//!
//! // Deployed tool
//! let schema = load_cache("schema.cimx")?;
//!
//! // Or, with the declarations at hand
//! let schema = load_schema_cached("schema/", "schema.cimx")?;
//! ```

use std::fs;
use std::io;
use std::path::Path;

use cimxml_core::Schema;
use sha2::{Digest, Sha256};

use crate::loader::{self, LoaderError};

/// Current schema version. Bump on any breaking change to serialized format.
pub const SCHEMA_VERSION: u32 = 1;

/// Magic bytes identifying a cimxml cache file.
const MAGIC: [u8; 4] = *b"CIMX";

/// magic(4) + version(4) + has_fingerprint(1).
const HEADER_LEN: usize = 9;

const FINGERPRINT_LEN: usize = 32;

/// Cache error.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    /// File does not start with expected magic bytes.
    #[error("invalid magic bytes (expected CIMX)")]
    InvalidMagic,
    /// Schema version mismatch.
    #[error("version mismatch: expected {expected}, found {found}")]
    VersionMismatch {
        /// Expected version.
        expected: u32,
        /// Found version.
        found: u32,
    },
    /// Fingerprint does not match expected value.
    #[error("fingerprint mismatch")]
    FingerprintMismatch,
    /// Header is truncated.
    #[error("truncated header")]
    TruncatedHeader,
    /// Postcard serialization failed.
    #[error("postcard serialization failed: {0}")]
    SerializationFailed(#[source] postcard::Error),
    /// Postcard deserialization failed.
    #[error("postcard deserialization failed: {0}")]
    DeserializationFailed(#[source] postcard::Error),
    /// Rebuilding the schema from its declaration files failed.
    #[error(transparent)]
    Load(#[from] LoaderError),
    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// Compute a fingerprint from declaration file contents.
///
/// The fingerprint includes the schema version to ensure cache invalidation
/// when the format changes. Files are sorted by name for determinism.
///
/// # Arguments
///
/// * `files` - Pairs of `(filename, content)` for all declaration files
pub fn compute_fingerprint<S: AsRef<str>>(files: &[(S, &[u8])]) -> [u8; 32] {
    let mut sorted: Vec<_> = files.iter().collect();
    sorted.sort_by_key(|(name, _)| name.as_ref());

    let mut hasher = Sha256::new();
    hasher.update(SCHEMA_VERSION.to_le_bytes());
    for (name, content) in sorted {
        hasher.update(name.as_ref().as_bytes());
        hasher.update(content);
    }

    hasher.finalize().into()
}

/// Serialize a schema to cache bytes.
///
/// # Errors
///
/// Returns [`CacheError::SerializationFailed`] if postcard rejects the
/// schema.
pub fn serialize_schema(
    schema: &Schema,
    fingerprint: Option<[u8; 32]>,
) -> Result<Vec<u8>, CacheError> {
    let payload = postcard::to_allocvec(schema).map_err(CacheError::SerializationFailed)?;

    let mut bytes = Vec::with_capacity(HEADER_LEN + FINGERPRINT_LEN + payload.len());
    bytes.extend_from_slice(&MAGIC);
    bytes.extend_from_slice(&SCHEMA_VERSION.to_le_bytes());
    if let Some(fp) = fingerprint {
        bytes.push(1);
        bytes.extend_from_slice(&fp);
    } else {
        bytes.push(0);
    }
    bytes.extend_from_slice(&payload);
    Ok(bytes)
}

/// Check magic and version, returning the stored fingerprint and the
/// payload offset.
fn read_header(bytes: &[u8]) -> Result<(Option<[u8; 32]>, usize), CacheError> {
    if bytes.len() < HEADER_LEN {
        return Err(CacheError::TruncatedHeader);
    }
    if bytes[0..4] != MAGIC {
        return Err(CacheError::InvalidMagic);
    }

    let version = u32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]);
    if version != SCHEMA_VERSION {
        return Err(CacheError::VersionMismatch {
            expected: SCHEMA_VERSION,
            found: version,
        });
    }

    if bytes[8] == 0 {
        return Ok((None, HEADER_LEN));
    }
    let end = HEADER_LEN + FINGERPRINT_LEN;
    let mut fp = [0u8; FINGERPRINT_LEN];
    fp.copy_from_slice(bytes.get(HEADER_LEN..end).ok_or(CacheError::TruncatedHeader)?);
    Ok((Some(fp), end))
}

/// Deserialize a schema from cache bytes.
///
/// # Arguments
///
/// * `bytes` - Cache file contents
/// * `expected_fingerprint` - If `Some`, verify the fingerprint matches; if `None`, skip verification
///
/// # Errors
///
/// Returns an error if:
/// - Magic bytes don't match
/// - Schema version doesn't match
/// - Fingerprint doesn't match (when verification requested)
/// - Postcard deserialization fails
pub fn deserialize_schema(
    bytes: &[u8],
    expected_fingerprint: Option<&[u8; 32]>,
) -> Result<Schema, CacheError> {
    let (stored, payload_start) = read_header(bytes)?;
    if let Some(expected) = expected_fingerprint {
        if stored.as_ref() != Some(expected) {
            return Err(CacheError::FingerprintMismatch);
        }
    }
    postcard::from_bytes(&bytes[payload_start..]).map_err(CacheError::DeserializationFailed)
}

/// Get the fingerprint from cache bytes without deserializing the payload.
///
/// Returns `None` if the cache has no embedded fingerprint.
///
/// # Errors
///
/// Returns an error if the header is invalid.
pub fn get_fingerprint(bytes: &[u8]) -> Result<Option<[u8; 32]>, CacheError> {
    read_header(bytes).map(|(fp, _)| fp)
}

// === File-based convenience API ===

/// Save a schema to a cache file.
///
/// # Errors
///
/// Returns an error if serialization fails or the file cannot be written.
pub fn save_cache<P: AsRef<Path>>(
    schema: &Schema,
    path: P,
    fingerprint: Option<[u8; 32]>,
) -> Result<(), CacheError> {
    let bytes = serialize_schema(schema, fingerprint)?;
    fs::write(path, bytes)?;
    Ok(())
}

/// Load a schema from a cache file without fingerprint verification.
///
/// # Errors
///
/// Returns an error if the file cannot be read or the cache is invalid.
pub fn load_cache<P: AsRef<Path>>(path: P) -> Result<Schema, CacheError> {
    let bytes = fs::read(path)?;
    deserialize_schema(&bytes, None)
}

/// Load a schema from a cache file with fingerprint verification.
///
/// # Errors
///
/// Returns an error if the file cannot be read, the cache is invalid,
/// or the fingerprint doesn't match.
pub fn load_cache_verified<P: AsRef<Path>>(
    path: P,
    expected_fingerprint: &[u8; 32],
) -> Result<Schema, CacheError> {
    let bytes = fs::read(path)?;
    deserialize_schema(&bytes, Some(expected_fingerprint))
}

/// Check if a cache file exists and has a matching fingerprint.
pub fn is_cache_valid<P: AsRef<Path>>(path: P, expected_fingerprint: &[u8; 32]) -> bool {
    let Ok(bytes) = fs::read(path) else {
        return false;
    };

    match get_fingerprint(&bytes) {
        Ok(Some(fp)) => fp == *expected_fingerprint,
        _ => false,
    }
}

/// Load the declaration files in `dir` through a cache at `cache_path`.
///
/// The fingerprint is computed over the file names and contents. A valid
/// cache is loaded as is; otherwise the schema is rebuilt from the files
/// and the cache rewritten.
///
/// # Errors
///
/// Returns an error if the files cannot be read or loaded, or the new
/// cache cannot be written.
pub fn load_schema_cached<D: AsRef<Path>, C: AsRef<Path>>(
    dir: D,
    cache_path: C,
) -> Result<Schema, CacheError> {
    let cache_path = cache_path.as_ref();
    let files = loader::schema_files(dir)?;
    let sources = loader::read_sources(&files)?;

    let named: Vec<(String, &[u8])> = sources
        .iter()
        .map(|(path, content)| {
            let name = path
                .file_name()
                .map_or_else(String::new, |n| n.to_string_lossy().into_owned());
            (name, content.as_bytes())
        })
        .collect();
    let fingerprint = compute_fingerprint(&named);

    if is_cache_valid(cache_path, &fingerprint) {
        match load_cache_verified(cache_path, &fingerprint) {
            Ok(schema) => {
                tracing::debug!(path = %cache_path.display(), "cache: hit");
                return Ok(schema);
            }
            Err(e) => {
                tracing::warn!(path = %cache_path.display(), error = %e, "cache: unreadable, rebuilding");
            }
        }
    }

    tracing::debug!(path = %cache_path.display(), files = files.len(), "cache: rebuilding");
    let schema = loader::load_schema_sources(&sources)?;
    save_cache(&schema, cache_path, Some(fingerprint))?;
    Ok(schema)
}
