//! enumgen-core: incremental enum-extension extraction pipeline for Rust sources.
//!
//! This library scans a program's source text for enum declarations that have
//! opted into augmentation via a marker attribute, reduces each one to a
//! normalized, value-comparable description record, and dispatches records to
//! an external emitter — re-emitting only for declarations whose description
//! actually changed since the previous pass.
//!
//! # Features
//!
//! - **Syntax-only candidate filtering**: cheap enough to run on every item on every pass
//! - **Semantic marker resolution**: opt-in confirmed by fully-qualified identity, never by spelling
//! - **Pure value records**: extraction is a fold; equal inputs give bit-for-bit-equal records
//! - **Incremental caching**: SHA-256 change detection plus record equality gate re-emission
//! - **Cooperative cancellation**: a pass can be abandoned cleanly between candidates
//!
//! # Quick Start
//!
//! Use the [`prelude`] module for convenient imports:
//!
//! ```rust,ignore
//! use enumgen_core::prelude::*;
//!
//! let result = Enumgen::new("/path/to/project")
//!     .with_cache(true)
//!     .run()?;
//!
//! for unit in &result.units {
//!     println!("generate: {}", unit.name);
//! }
//! ```
//!
//! # Module Organization
//!
//! - [`snapshot`]: Per-pass program snapshot (parallel read-once hash + parse)
//! - [`bootstrap`]: Marker declarations injected into every snapshot
//! - [`filter`]: Syntax-only candidate filtering
//! - [`symbols`]: Per-pass symbol table and marker identity resolution
//! - [`extract`]: Description records and metadata extraction
//! - [`cache`]: Cross-pass description cache with SHA-256 change detection
//! - [`pipeline`]: Pass orchestration, emit decisions, emitter dispatch
//! - [`builder`]: Fluent run API for project directories
//! - [`error`]: Typed error handling

pub mod bootstrap;
pub mod builder;
pub mod cache;
pub mod config;
pub mod error;
pub mod extract;
pub mod filter;
pub mod logging;
pub mod pipeline;
pub mod prelude;
pub mod report;
pub mod snapshot;
pub mod symbols;

// ============================================================================
// Explicit Re-exports (avoiding glob imports for clear API surface)
// ============================================================================

// Error types
pub use error::{EnumgenError, EnumgenResult, IoResultExt};

// Builder API
pub use builder::{Enumgen, GenerationResult};

// Cache types
pub use cache::{load_cache, save_cache, CacheMetadata, CachedEnum, EmitDecision, EnumgenCache};

// Configuration
pub use config::{load_config, EnumgenConfig, OutputConfig};

// Extraction
pub use extract::{extract_enum, EnumMember, EnumToGenerate, ExtractSkip, DEFAULT_UNDERLYING_TYPE};

// Filtering
pub use filter::{collect_candidates, dedup_candidates, is_candidate, Candidate};

// Logging
pub use logging::init_structured_logging;

// Orchestration
pub use pipeline::{
    CancellationToken, Diagnostic, Emitter, OutputUnit, PassOutput, Pipeline, OUTPUT_UNIT_SUFFIX,
};

// Reporting
pub use report::{print_json, print_plain};

// Snapshot loading
pub use snapshot::{gather_rs_files, gather_rs_files_with_excludes, ProgramSnapshot, SourceFile};

// Semantic resolution
pub use symbols::{
    resolve_candidates, MarkerIdentity, SymbolTable, FLAGS_MARKER, OPT_IN_MARKER,
};

// Bootstrapping
pub use bootstrap::{inject_markers, MARKER_FILE, MARKER_SOURCE};

#[cfg(test)]
mod tests;
