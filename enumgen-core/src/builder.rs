//! Builder pattern API for running the pipeline over a project directory.
//!
//! Provides a fluent interface wiring snapshot loading, cache persistence,
//! and configuration together:
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

use std::path::PathBuf;

use anyhow::{Context, Result};

use crate::cache::{load_cache, save_cache};
use crate::config::{load_config, OutputConfig};
use crate::pipeline::{Diagnostic, OutputUnit, Pipeline};
use crate::snapshot::ProgramSnapshot;

/// Builder for configuring one generation run.
#[derive(Debug, Clone)]
pub struct Enumgen {
    /// Root path of the project to analyze
    root: PathBuf,

    /// Whether to use the persisted description cache
    use_cache: bool,

    /// Report without persisting anything (no cache write)
    dry_run: bool,

    /// Custom excluded directories
    excluded_dirs: Vec<String>,

    /// Enum name patterns to drop even when opted in
    ignored_patterns: Vec<String>,
}

impl Enumgen {
    /// Create a new run builder for the given path.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            use_cache: true,
            dry_run: false,
            excluded_dirs: Vec::new(),
            ignored_patterns: Vec::new(),
        }
    }

    /// Enable or disable the persisted cache.
    pub fn with_cache(mut self, enabled: bool) -> Self {
        self.use_cache = enabled;
        self
    }

    /// Report what would be emitted without persisting the cache.
    ///
    /// A dry run must leave the next real run identical to one that never
    /// happened, so the cache on disk is not touched.
    pub fn dry_run(mut self, enabled: bool) -> Self {
        self.dry_run = enabled;
        self
    }

    /// Add directories to exclude from scanning.
    pub fn exclude_dirs(mut self, dirs: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.excluded_dirs.extend(dirs.into_iter().map(Into::into));
        self
    }

    /// Add patterns for declarations to ignore.
    pub fn ignore_patterns(mut self, patterns: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.ignored_patterns
            .extend(patterns.into_iter().map(Into::into));
        self
    }

    /// Run one pass and return the units needing emission.
    pub fn run(&self) -> Result<GenerationResult> {
        // enumgen.toml supplements the builder's settings.
        let mut use_cache = self.use_cache;
        let mut ignored = self.ignored_patterns.clone();
        let mut output_config = OutputConfig::default();
        if let Some(cfg) = load_config(&self.root)? {
            if let Some(enabled) = cfg.cache {
                use_cache = use_cache && enabled;
            }
            if let Some(patterns) = cfg.ignore {
                ignored.extend(patterns);
            }
            if let Some(out) = cfg.output {
                output_config = out;
            }
        }

        let excludes: Vec<&str> = self.excluded_dirs.iter().map(String::as_str).collect();
        let snapshot = ProgramSnapshot::load_with_excludes(&self.root, &excludes)
            .context("Failed to load program snapshot")?;

        let cached = if use_cache {
            load_cache(&self.root)
        } else {
            None
        };

        let mut pipeline = Pipeline::with_cache(cached.unwrap_or_default());
        let mut output = pipeline.supply(&snapshot);

        // Units suppressed by ignore patterns were never dispatched, so they
        // must not be remembered as emitted: a later run without the pattern
        // has to produce them again.
        let mut cache = pipeline.into_cache();
        for unit in &output.units {
            if is_ignored(&ignored, &unit.record.declared_qualified_name) {
                cache.enums.remove(&unit.record.declared_qualified_name);
            }
        }
        output
            .units
            .retain(|unit| !is_ignored(&ignored, &unit.record.declared_qualified_name));

        // Best-effort cache save (don't fail the run if the write fails).
        if use_cache && !self.dry_run && !output.cancelled {
            if let Err(e) = save_cache(&self.root, &cache) {
                tracing::warn!(error = %e, "cache save failed");
            }
        }

        Ok(GenerationResult {
            root: self.root.clone(),
            units: output.units,
            diagnostics: output.diagnostics,
            total_opted_in: output.total_opted_in,
            unchanged: output.unchanged,
            output: output_config,
        })
    }
}

/// Check if a declaration name matches any ignored pattern.
///
/// Supports `prefix*`, `*suffix`, and substring patterns.
fn is_ignored(patterns: &[String], name: &str) -> bool {
    for pattern in patterns {
        if pattern.ends_with('*') {
            let prefix = &pattern[..pattern.len() - 1];
            if name.starts_with(prefix) {
                return true;
            }
        } else if let Some(suffix) = pattern.strip_prefix('*') {
            if name.ends_with(suffix) {
                return true;
            }
        } else if name == pattern || name.contains(pattern) {
            return true;
        }
    }
    false
}

/// Result of one generation run.
#[derive(Debug)]
pub struct GenerationResult {
    /// Root path that was analyzed
    pub root: PathBuf,

    /// Units needing (re-)emission
    pub units: Vec<OutputUnit>,

    /// Per-candidate skips
    pub diagnostics: Vec<Diagnostic>,

    /// Distinct opted-in declarations seen
    pub total_opted_in: usize,

    /// Declarations unchanged since the previous run
    pub unchanged: usize,

    /// Output settings from enumgen.toml (defaults when absent)
    pub output: OutputConfig,
}

impl GenerationResult {
    /// Check if this run produced anything to emit.
    pub fn has_output(&self) -> bool {
        !self.units.is_empty()
    }

    /// Names of all units needing emission.
    pub fn unit_names(&self) -> Vec<&str> {
        self.units.iter().map(|u| u.name.as_str()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn create_test_project(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "enumgen_builder_test_{}_{}",
            name,
            std::process::id()
        ));
        if dir.exists() {
            fs::remove_dir_all(&dir).ok();
        }
        fs::create_dir_all(dir.join("src")).expect("Failed to create test directory");

        fs::write(
            dir.join("src/lib.rs"),
            "#[enumgen::enum_extensions]\npub enum Color { Red, Green, Blue }\n",
        )
        .expect("Failed to write lib.rs");

        dir
    }

    #[test]
    fn test_builder_basic_run() {
        let dir = create_test_project("basic");

        let result = Enumgen::new(&dir).with_cache(false).run().unwrap();
        assert_eq!(result.unit_names(), vec!["ColorExtensions_EnumExtensions"]);
        assert_eq!(result.total_opted_in, 1);

        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_builder_cached_rerun_is_quiet() {
        let dir = create_test_project("cached");

        let first = Enumgen::new(&dir).run().unwrap();
        assert!(first.has_output());

        let second = Enumgen::new(&dir).run().unwrap();
        assert!(!second.has_output());
        assert_eq!(second.unchanged, 1);

        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_builder_ignore_patterns() {
        let dir = create_test_project("ignored");

        let result = Enumgen::new(&dir)
            .with_cache(false)
            .ignore_patterns(["Color"])
            .run()
            .unwrap();
        assert!(!result.has_output());

        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_ignored_unit_not_cached_as_emitted() {
        let dir = create_test_project("ignore_then_allow");

        // Suppressed by pattern: nothing emitted, and the declaration must
        // not be remembered as already dispatched.
        let first = Enumgen::new(&dir).ignore_patterns(["Color"]).run().unwrap();
        assert!(!first.has_output());

        // Same sources, pattern lifted: the unit has to come out now.
        let second = Enumgen::new(&dir).run().unwrap();
        assert_eq!(second.unit_names(), vec!["ColorExtensions_EnumExtensions"]);

        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_dry_run_leaves_cache_untouched() {
        let dir = create_test_project("dry_run");

        let first = Enumgen::new(&dir).dry_run(true).run().unwrap();
        assert!(first.has_output());
        assert!(!dir.join(".enumgen/cache.json").exists());

        // The dry run must not have made the real run quieter.
        let second = Enumgen::new(&dir).run().unwrap();
        assert!(second.has_output());

        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_config_output_settings_surfaced() {
        let dir = create_test_project("config_output");
        fs::write(
            dir.join("enumgen.toml"),
            "[output]\ndir = \"out/enums\"\nformat = \"json\"\n",
        )
        .unwrap();

        let result = Enumgen::new(&dir).with_cache(false).run().unwrap();
        assert_eq!(result.output.dir.as_deref(), Some("out/enums"));
        assert_eq!(result.output.format.as_deref(), Some("json"));

        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_config_disables_cache() {
        let dir = create_test_project("config_cache");
        fs::write(dir.join("enumgen.toml"), "cache = false\n").unwrap();

        Enumgen::new(&dir).run().unwrap();
        assert!(!dir.join(".enumgen/cache.json").exists());

        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_is_ignored_patterns() {
        let patterns = vec!["Internal*".to_string(), "*Private".to_string()];
        assert!(is_ignored(&patterns, "InternalState"));
        assert!(is_ignored(&patterns, "ColorPrivate"));
        assert!(!is_ignored(&patterns, "Color"));
    }
}
