//! Prelude module for convenient imports.
//!
//! Import commonly used types with a single line:
//!
//! ```rust,ignore
//! use enumgen_core::prelude::*;
//! ```

// Core pipeline types
pub use crate::error::{EnumgenError, EnumgenResult};
pub use crate::extract::{EnumMember, EnumToGenerate};
pub use crate::pipeline::{
    CancellationToken, Diagnostic, Emitter, OutputUnit, PassOutput, Pipeline,
};

// Snapshot loading
pub use crate::snapshot::{gather_rs_files, ProgramSnapshot, SourceFile};

// Semantic resolution
pub use crate::symbols::{MarkerIdentity, SymbolTable};

// Caching
pub use crate::cache::{load_cache, save_cache, EmitDecision, EnumgenCache};

// Configuration
pub use crate::config::{load_config, EnumgenConfig};

// Builder API
pub use crate::builder::{Enumgen, GenerationResult};
