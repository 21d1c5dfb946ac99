//! Cross-pass description cache with SHA-256 change detection.
//!
//! The cache is the only component allowed to retain state across passes.
//! It maps a declaration's fully-qualified name to the content hash of its
//! containing file and the description record produced last pass:
//! - matching file hash → the cached record is reused without re-extraction;
//! - value-equal fresh record → no re-emission for that declaration.
//!
//! # Cache Versioning
//!
//! Persisted caches carry version metadata and are discarded when:
//! - the cache format changes
//! - the enumgen major version changes (extraction logic may differ)

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::warn;

use crate::error::{EnumgenError, EnumgenResult, IoResultExt};
use crate::extract::EnumToGenerate;

/// Maximum cache file size (50MB) - prevents unbounded cache growth
const MAX_CACHE_SIZE_BYTES: usize = 50_000_000;

/// Current cache format version. Increment when cache format changes.
const CACHE_VERSION: u32 = 1;

/// Enumgen version for cache compatibility checking.
const ENUMGEN_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Cached state of one opted-in declaration.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct CachedEnum {
    /// SHA-256 hash of the containing file when the record was extracted
    pub file_hash: String,
    /// The description record produced last pass
    pub record: EnumToGenerate,
}

/// Cache metadata for version checking.
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct CacheMetadata {
    /// Cache format version
    pub cache_version: u32,
    /// Enumgen version that created this cache
    pub enumgen_version: String,
    /// Timestamp when cache was created
    #[serde(default)]
    pub created_at: u64,
}

impl CacheMetadata {
    /// Create metadata for current environment.
    pub fn current() -> Self {
        let created_at = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);

        Self {
            cache_version: CACHE_VERSION,
            enumgen_version: ENUMGEN_VERSION.to_string(),
            created_at,
        }
    }

    /// Check if this cache is compatible with the current version.
    pub fn is_compatible(&self) -> bool {
        if self.cache_version != CACHE_VERSION {
            return false;
        }

        let current_major = ENUMGEN_VERSION.split('.').next().unwrap_or("0");
        let cached_major = self.enumgen_version.split('.').next().unwrap_or("0");

        current_major == cached_major
    }
}

/// Re-emission decision for one declaration in the current pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmitDecision {
    /// Declaration not seen before: emit
    New,
    /// Record differs from the previous pass: re-emit
    Changed,
    /// Record value-equal to the previous pass: skip emission
    Unchanged,
}

/// The full cache model, stored as `.enumgen/cache.json` when persisted.
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct EnumgenCache {
    /// Cache metadata for version checking
    #[serde(default)]
    pub metadata: CacheMetadata,
    /// Maps declared qualified name to its cached state.
    pub enums: HashMap<String, CachedEnum>,
}

impl EnumgenCache {
    /// Cached record for a declaration whose containing file is unchanged.
    ///
    /// A hit means extraction can be skipped entirely this pass.
    pub fn lookup_unchanged(&self, qualified_name: &str, file_hash: &str) -> Option<&EnumToGenerate> {
        self.enums
            .get(qualified_name)
            .filter(|cached| cached.file_hash == file_hash)
            .map(|cached| &cached.record)
    }

    /// Classify a freshly produced record against the previous pass.
    pub fn decide(&self, record: &EnumToGenerate) -> EmitDecision {
        match self.enums.get(&record.declared_qualified_name) {
            None => EmitDecision::New,
            Some(cached) if cached.record == *record => EmitDecision::Unchanged,
            Some(_) => EmitDecision::Changed,
        }
    }
}

/// Load the cache from `.enumgen/cache.json`.
///
/// Returns `None` if:
/// - File doesn't exist
/// - File is corrupted
/// - Cache version is incompatible with the current enumgen version
pub fn load_cache(root: &Path) -> Option<EnumgenCache> {
    let path = root.join(".enumgen/cache.json");
    if !path.exists() {
        return None;
    }

    let text = fs::read_to_string(&path).ok()?;
    let cache: EnumgenCache = serde_json::from_str(&text).ok()?;

    if !cache.metadata.is_compatible() {
        warn!(
            cached_version = cache.metadata.cache_version,
            cached_enumgen = %cache.metadata.enumgen_version,
            "cache version mismatch, rebuilding"
        );
        let _ = fs::remove_file(&path);
        return None;
    }

    Some(cache)
}

/// Save the current cache state to disk.
///
/// Uses the atomic write pattern (temp file + rename) so an interrupted
/// process never leaves a partially written cache behind. Caches above the
/// size limit are discarded rather than written.
pub fn save_cache(root: &Path, cache: &EnumgenCache) -> EnumgenResult<()> {
    let dir = root.join(".enumgen");
    if !dir.exists() {
        fs::create_dir_all(&dir).with_path(&dir)?;
    }

    let path = dir.join("cache.json");
    let json = serde_json::to_string_pretty(cache)
        .map_err(|e| EnumgenError::cache(format!("cache serialization failed: {e}")))?;

    if json.len() > MAX_CACHE_SIZE_BYTES {
        warn!(
            limit_mb = MAX_CACHE_SIZE_BYTES / 1_000_000,
            "cache exceeds size limit, clearing old cache"
        );
        let _ = fs::remove_file(&path);
        return Ok(());
    }

    // Temp filename combines PID with nanosecond timestamp for uniqueness.
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    let temp_path = dir.join(format!("cache.json.{}.{}.tmp", std::process::id(), nanos));

    fs::write(&temp_path, &json).with_path(&temp_path)?;

    if let Err(e) = fs::rename(&temp_path, &path) {
        let _ = fs::remove_file(&temp_path);
        return Err(EnumgenError::io(&path, e));
    }

    Ok(())
}
