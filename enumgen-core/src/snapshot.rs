//! Per-pass program snapshot: parallel, deterministic source discovery and parsing.
//!
//! A snapshot is the read-only input to one pipeline pass. Construction follows
//! the read-once pattern: each file is read exactly once, hashed in memory
//! (SHA-256, for change detection against the description cache), and parsed
//! with `syn`. A file that fails to parse contributes no declarations and a
//! warning, never an error — speculative analysis environments routinely hand
//! us incomplete sources.

use anyhow::{Context, Result};
use rayon::prelude::*;
use sha2::{Digest, Sha256};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;
use walkdir::WalkDir;

use crate::bootstrap;

/// Directories to exclude by default (standard Rust project conventions).
const EXCLUDED_DIRS: &[&str] = &["target", ".git", "node_modules", ".cargo"];

/// Maximum file size to parse (10 MB).
/// Larger files are kept in the snapshot but never parsed.
const MAX_FILE_SIZE: usize = 10_000_000;

/// One source file inside a snapshot.
#[derive(Debug, Clone)]
pub struct SourceFile {
    /// Path of the file (display identity for diagnostics and cache keys)
    pub path: PathBuf,
    /// SHA-256 content hash, the cache's change-detection key
    pub hash: String,
    /// Parsed AST, `None` when the file could not be parsed
    pub ast: Option<syn::File>,
    /// Whether this file was injected by the bootstrapper rather than read from disk
    pub synthetic: bool,
}

/// Immutable whole-program input for a single pipeline pass.
#[derive(Debug, Clone, Default)]
pub struct ProgramSnapshot {
    /// Root the snapshot was loaded from (empty for in-memory snapshots)
    pub root: PathBuf,
    /// All source files, user files first, injected declarations last
    pub files: Vec<SourceFile>,
}

impl ProgramSnapshot {
    /// Load a snapshot from all `.rs` files under `root`.
    ///
    /// Marker declarations are injected unconditionally so user sources may
    /// reference them without an external dependency.
    pub fn load(root: &Path) -> Result<Self> {
        Self::load_with_excludes(root, &[])
    }

    /// Load a snapshot with additional excluded directory names.
    pub fn load_with_excludes(root: &Path, excludes: &[&str]) -> Result<Self> {
        let files = gather_rs_files_with_excludes(root, excludes)?;

        // Read and hash in parallel; parsing stays on this thread because
        // syn ASTs are not Send.
        let mut read: Vec<(PathBuf, String, String)> = files
            .par_iter()
            .filter_map(|path| read_and_hash(path))
            .collect();
        // WalkDir order depends on the filesystem; sort for deterministic passes.
        read.sort_by(|a, b| a.0.cmp(&b.0));

        let sources = read
            .into_iter()
            .map(|(path, content, hash)| {
                if content.len() > MAX_FILE_SIZE {
                    warn!(file = %path.display(), size = content.len(), "file exceeds size limit, not parsed");
                    SourceFile {
                        path,
                        hash,
                        ast: None,
                        synthetic: false,
                    }
                } else {
                    parse_with_hash(path, &content, hash, false)
                }
            })
            .collect();

        let mut snapshot = Self {
            root: root.to_path_buf(),
            files: sources,
        };
        bootstrap::inject_markers(&mut snapshot);
        Ok(snapshot)
    }

    /// Build a snapshot from in-memory sources (host-supplied program text).
    ///
    /// Used by tests and by embedding hosts that own their file I/O.
    pub fn from_sources<I, P, S>(sources: I) -> Self
    where
        I: IntoIterator<Item = (P, S)>,
        P: Into<PathBuf>,
        S: AsRef<str>,
    {
        let files = sources
            .into_iter()
            .map(|(path, content)| parse_source(path.into(), content.as_ref(), false))
            .collect();

        let mut snapshot = Self {
            root: PathBuf::new(),
            files,
        };
        bootstrap::inject_markers(&mut snapshot);
        snapshot
    }

    /// Append a synthetic (injected) source file.
    pub fn push_synthetic(&mut self, path: impl Into<PathBuf>, content: &str) {
        self.files.push(parse_source(path.into(), content, true));
    }

    /// Number of files in the snapshot, synthetic files included.
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// True when the snapshot holds no files at all.
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

/// Compute SHA-256 hash from bytes (in-memory, no I/O).
#[inline]
pub fn hash_bytes(bytes: &[u8]) -> String {
    let mut sha = Sha256::new();
    sha.update(bytes);
    format!("{:x}", sha.finalize())
}

/// Hash and parse one source, warning on parse failure.
fn parse_source(path: PathBuf, content: &str, synthetic: bool) -> SourceFile {
    let hash = hash_bytes(content.as_bytes());
    parse_with_hash(path, content, hash, synthetic)
}

/// Parse one source whose hash is already known.
fn parse_with_hash(path: PathBuf, content: &str, hash: String, synthetic: bool) -> SourceFile {
    let ast = match syn::parse_file(content) {
        Ok(ast) => Some(ast),
        Err(e) => {
            warn!(file = %path.display(), error = %e, "source parse failed, skipping file");
            None
        }
    };
    SourceFile {
        path,
        hash,
        ast,
        synthetic,
    }
}

/// Read and hash one file from disk (the parallel stage; read-once pattern).
///
/// Returns `None` only when the file cannot be read at all. The returned
/// tuple must stay `Send`: it crosses rayon worker threads.
fn read_and_hash(path: &PathBuf) -> Option<(PathBuf, String, String)> {
    let content = match fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) => {
            warn!(file = %path.display(), error = %e, "read failed, skipping file");
            return None;
        }
    };

    let hash = hash_bytes(content.as_bytes());
    Some((path.clone(), content, hash))
}

/// Checks if a directory entry should be pruned (excluded from traversal).
#[inline]
fn is_excluded_dir(entry: &walkdir::DirEntry, excludes: &HashSet<&str>) -> bool {
    entry.file_type().is_dir()
        && entry
            .file_name()
            .to_str()
            .is_some_and(|name| excludes.contains(name))
}

/// Gathers all .rs files recursively starting from the root path.
///
/// Uses early directory pruning (`filter_entry`) so excluded subtrees are
/// skipped in O(1), then parallelizes the per-entry extension check.
pub fn gather_rs_files(root: &Path) -> Result<Vec<PathBuf>> {
    gather_rs_files_with_excludes(root, &[])
}

/// Gathers all .rs files with custom exclusion patterns combined with defaults.
pub fn gather_rs_files_with_excludes(root: &Path, excludes: &[&str]) -> Result<Vec<PathBuf>> {
    let all_excludes: HashSet<&str> = EXCLUDED_DIRS
        .iter()
        .copied()
        .chain(excludes.iter().copied())
        .collect();

    WalkDir::new(root)
        .into_iter()
        .filter_entry(|e| !is_excluded_dir(e, &all_excludes))
        .par_bridge()
        .filter_map(|entry| match entry {
            Ok(e) => {
                let path = e.path();
                if path.is_file() && path.extension().is_some_and(|ext| ext == "rs") {
                    Some(Ok(path.to_path_buf()))
                } else {
                    None
                }
            }
            Err(e) => Some(Err(e.into())),
        })
        .collect::<Result<Vec<_>>>()
        .context(format!("Failed to gather .rs files from {}", root.display()))
}
