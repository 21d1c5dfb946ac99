//! Pass orchestration.
//!
//! One pass combines the snapshot's symbol table with the deduplicated
//! candidate list, extracts one description record per distinct candidate,
//! consults the description cache for re-emission decisions, and dispatches
//! each record that needs (re-)emission to the external emitter. The pass is
//! stateless except for the cache, and cooperatively cancellable between
//! candidates: an abandoned pass discards partial records and leaves the
//! previous pass's cache intact.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::warn;

use crate::cache::{CacheMetadata, CachedEnum, EmitDecision, EnumgenCache};
use crate::extract::{extract_enum, EnumToGenerate};
use crate::filter::{collect_candidates, dedup_candidates, Candidate};
use crate::snapshot::ProgramSnapshot;
use crate::symbols::{resolve_candidates, SymbolTable};

/// Suffix appended to every output unit name.
pub const OUTPUT_UNIT_SUFFIX: &str = "_EnumExtensions";

/// Consumer of description records; the template-rendering side lives here.
///
/// The pipeline only names units and hands records over; what the emitter
/// turns them into is its own contract.
pub trait Emitter {
    fn emit(&mut self, unit: &OutputUnit) -> anyhow::Result<()>;
}

/// One named output unit carrying a description record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputUnit {
    /// Deterministic unit name: `<output_name>_EnumExtensions`
    pub name: String,
    pub record: EnumToGenerate,
}

impl OutputUnit {
    /// Name a unit from its record.
    pub fn for_record(record: EnumToGenerate) -> Self {
        Self {
            name: format!("{}{}", record.output_name, OUTPUT_UNIT_SUFFIX),
            record,
        }
    }
}

/// Non-fatal per-candidate skip surfaced to the caller.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub file: String,
    pub message: String,
}

/// Result of one pipeline pass.
#[derive(Debug, Default)]
pub struct PassOutput {
    /// Units needing (re-)emission this pass, in candidate order
    pub units: Vec<OutputUnit>,
    /// Per-candidate skips (unresolvable declared symbols)
    pub diagnostics: Vec<Diagnostic>,
    /// Distinct opted-in declarations seen this pass
    pub total_opted_in: usize,
    /// Declarations whose records were value-equal to the previous pass
    pub unchanged: usize,
    /// True when the pass was abandoned by cancellation
    pub cancelled: bool,
}

/// Cooperative cancellation flag, checked between candidates.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation of the current and any future pass on this token.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// The extraction pipeline, re-entrant per pass.
///
/// Only the embedded [`EnumgenCache`] survives across passes; the host
/// guarantees passes for the same program are not concurrent.
#[derive(Debug, Default)]
pub struct Pipeline {
    cache: EnumgenCache,
    token: CancellationToken,
}

impl Pipeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from a previously persisted cache.
    pub fn with_cache(cache: EnumgenCache) -> Self {
        Self {
            cache,
            token: CancellationToken::new(),
        }
    }

    /// Token the surrounding environment may cancel the pass through.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.token.clone()
    }

    /// Current cache state, for persistence after a pass.
    pub fn cache(&self) -> &EnumgenCache {
        &self.cache
    }

    /// Consume the pipeline, yielding its cache.
    pub fn into_cache(self) -> EnumgenCache {
        self.cache
    }

    /// Run one full pass over a snapshot, returning the units needing emission.
    ///
    /// An empty candidate list is a valid, common state producing zero units
    /// and no error.
    pub fn supply(&mut self, snapshot: &ProgramSnapshot) -> PassOutput {
        let table = SymbolTable::build(snapshot);
        let candidates = dedup_candidates(collect_candidates(snapshot));
        let resolved = resolve_candidates(&table, candidates);
        self.process(snapshot, &table, resolved)
    }

    /// Run one pass and dispatch every resulting unit to the emitter.
    pub fn run(
        &mut self,
        snapshot: &ProgramSnapshot,
        emitter: &mut dyn Emitter,
    ) -> anyhow::Result<PassOutput> {
        let output = self.supply(snapshot);
        if !output.cancelled {
            for unit in &output.units {
                emitter.emit(unit)?;
            }
        }
        output
            .diagnostics
            .iter()
            .for_each(|d| warn!(file = %d.file, detail = %d.message, "candidate skipped"));
        Ok(output)
    }

    /// Core of a pass: extraction, coalescing, and emit decisions.
    ///
    /// The new cache is built on the side and committed only when the pass
    /// completes; cancellation leaves the previous pass's cache valid.
    fn process(
        &mut self,
        snapshot: &ProgramSnapshot,
        table: &SymbolTable,
        resolved: Vec<Candidate>,
    ) -> PassOutput {
        let mut output = PassOutput {
            total_opted_in: resolved.len(),
            ..PassOutput::default()
        };
        let mut new_enums = HashMap::with_capacity(resolved.len());
        let mut seen_records: HashSet<EnumToGenerate> = HashSet::with_capacity(resolved.len());

        for candidate in &resolved {
            if self.token.is_cancelled() {
                return PassOutput {
                    cancelled: true,
                    ..PassOutput::default()
                };
            }

            let Some(file) = snapshot.files.get(candidate.file) else {
                output.diagnostics.push(Diagnostic {
                    file: format!("<file {}>", candidate.file),
                    message: "candidate does not belong to this snapshot".to_string(),
                });
                continue;
            };

            let Some(qualified_name) = table.resolve_candidate(candidate) else {
                output.diagnostics.push(Diagnostic {
                    file: file.path.display().to_string(),
                    message: format!(
                        "could not resolve declared symbol for enum `{}`",
                        candidate.item.ident
                    ),
                });
                continue;
            };

            // Unchanged file: reuse last pass's record without re-extraction.
            let record = match self.cache.lookup_unchanged(&qualified_name, &file.hash) {
                Some(cached) => cached.clone(),
                None => match extract_enum(candidate, table) {
                    Ok(record) => record,
                    Err(skip) => {
                        output.diagnostics.push(Diagnostic {
                            file: file.path.display().to_string(),
                            message: skip.message,
                        });
                        continue;
                    }
                },
            };

            // Declarations producing an identical record are coalesced.
            if !seen_records.insert(record.clone()) {
                continue;
            }

            let decision = self.cache.decide(&record);
            new_enums.insert(
                qualified_name,
                CachedEnum {
                    file_hash: file.hash.clone(),
                    record: record.clone(),
                },
            );

            match decision {
                EmitDecision::Unchanged => output.unchanged += 1,
                EmitDecision::New | EmitDecision::Changed => {
                    output.units.push(OutputUnit::for_record(record));
                }
            }
        }

        // Declarations absent from this pass drop out of the cache here.
        self.cache = EnumgenCache {
            metadata: CacheMetadata::current(),
            enums: new_enums,
        };
        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Emitter capturing dispatched unit names.
    #[derive(Default)]
    struct RecordingEmitter {
        names: Vec<String>,
    }

    impl Emitter for RecordingEmitter {
        fn emit(&mut self, unit: &OutputUnit) -> anyhow::Result<()> {
            self.names.push(unit.name.clone());
            Ok(())
        }
    }

    fn snapshot_of(content: &str) -> ProgramSnapshot {
        ProgramSnapshot::from_sources([("lib.rs", content)])
    }

    #[test]
    fn test_zero_candidates_zero_units_no_error() {
        let mut pipeline = Pipeline::new();
        let output = pipeline.supply(&snapshot_of("enum Plain { A }\nfn main() {}"));
        assert!(output.units.is_empty());
        assert!(output.diagnostics.is_empty());
        assert_eq!(output.total_opted_in, 0);
    }

    #[test]
    fn test_first_pass_emits_named_unit() {
        let mut pipeline = Pipeline::new();
        let mut emitter = RecordingEmitter::default();
        let snapshot = snapshot_of("#[enumgen::enum_extensions]\npub enum Color { Red, Green }");

        let output = pipeline.run(&snapshot, &mut emitter).unwrap();
        assert_eq!(output.units.len(), 1);
        assert_eq!(emitter.names, vec!["ColorExtensions_EnumExtensions"]);
    }

    #[test]
    fn test_second_pass_unchanged_skips_emission() {
        let source = "#[enumgen::enum_extensions]\npub enum Color { Red, Green }";
        let mut pipeline = Pipeline::new();

        let first = pipeline.supply(&snapshot_of(source));
        assert_eq!(first.units.len(), 1);
        assert_eq!(first.unchanged, 0);

        let second = pipeline.supply(&snapshot_of(source));
        assert!(second.units.is_empty());
        assert_eq!(second.unchanged, 1);
    }

    #[test]
    fn test_unrelated_edit_does_not_reemit() {
        let mut pipeline = Pipeline::new();
        pipeline.supply(&ProgramSnapshot::from_sources([
            ("a.rs", "#[enumgen::enum_extensions]\npub enum Color { Red }"),
            ("b.rs", "fn helper() {}"),
        ]));

        // Edit only the unrelated file.
        let second = pipeline.supply(&ProgramSnapshot::from_sources([
            ("a.rs", "#[enumgen::enum_extensions]\npub enum Color { Red }"),
            ("b.rs", "fn helper() { let _x = 1; }"),
        ]));
        assert!(second.units.is_empty());
        assert_eq!(second.unchanged, 1);
    }

    #[test]
    fn test_changed_declaration_reemits() {
        let mut pipeline = Pipeline::new();
        pipeline.supply(&snapshot_of("#[enumgen::enum_extensions]\nenum Color { Red }"));

        let second = pipeline.supply(&snapshot_of(
            "#[enumgen::enum_extensions]\nenum Color { Red, Green }",
        ));
        assert_eq!(second.units.len(), 1);
        assert_eq!(second.unchanged, 0);
    }

    #[test]
    fn test_removed_declaration_drops_from_cache() {
        let mut pipeline = Pipeline::new();
        pipeline.supply(&snapshot_of("#[enumgen::enum_extensions]\nenum Color { Red }"));
        assert_eq!(pipeline.cache().enums.len(), 1);

        pipeline.supply(&snapshot_of("fn main() {}"));
        assert!(pipeline.cache().enums.is_empty());

        // Re-adding the declaration emits again.
        let third = pipeline.supply(&snapshot_of("#[enumgen::enum_extensions]\nenum Color { Red }"));
        assert_eq!(third.units.len(), 1);
    }

    #[test]
    fn test_identical_records_coalesced() {
        // Same declaration text in two files with a name override forcing
        // identical records (same qualified name via same module layout).
        let source = "#[enumgen::enum_extensions]\nenum Color { Red }";
        let mut pipeline = Pipeline::new();
        let output = pipeline.supply(&ProgramSnapshot::from_sources([
            ("a.rs", source),
            ("b.rs", source),
        ]));
        assert_eq!(output.total_opted_in, 2);
        assert_eq!(output.units.len(), 1);
    }

    #[test]
    fn test_cancellation_discards_pass_and_keeps_cache() {
        let source = "#[enumgen::enum_extensions]\nenum Color { Red }";
        let mut pipeline = Pipeline::new();
        pipeline.supply(&snapshot_of(source));
        let cached_before = pipeline.cache().enums.clone();

        pipeline.cancellation_token().cancel();
        let output = pipeline.supply(&snapshot_of(
            "#[enumgen::enum_extensions]\nenum Color { Red, Green }",
        ));
        assert!(output.cancelled);
        assert!(output.units.is_empty());
        assert_eq!(pipeline.cache().enums, cached_before);
    }

    #[test]
    fn test_cancelled_run_dispatches_nothing() {
        let mut pipeline = Pipeline::new();
        pipeline.cancellation_token().cancel();
        let mut emitter = RecordingEmitter::default();
        let output = pipeline
            .run(
                &snapshot_of("#[enumgen::enum_extensions]\nenum Color { Red }"),
                &mut emitter,
            )
            .unwrap();
        assert!(output.cancelled);
        assert!(emitter.names.is_empty());
    }

    #[test]
    fn test_failing_candidate_diagnostic_does_not_affect_siblings() {
        let snapshot = ProgramSnapshot::from_sources([
            ("a.rs", "#[enumgen::enum_extensions]\nenum Good { A }"),
            ("b.rs", "#[enumgen::enum_extensions]\nenum AlsoGood { B }"),
        ]);
        let table = SymbolTable::build(&snapshot);
        let mut resolved = resolve_candidates(&table, dedup_candidates(collect_candidates(&snapshot)));
        // Corrupt one candidate's file index to simulate an
        // analysis-environment inconsistency.
        resolved[0].file = 99;

        let mut pipeline = Pipeline::new();
        let output = pipeline.process(&snapshot, &table, resolved);
        assert_eq!(output.diagnostics.len(), 1);
        assert_eq!(output.units.len(), 1);
        assert_eq!(output.units[0].record.declared_qualified_name, "AlsoGood");
    }

    #[test]
    fn test_output_unit_name_uses_override() {
        let mut pipeline = Pipeline::new();
        let output = pipeline.supply(&snapshot_of(
            "#[enumgen::enum_extensions(extension_class_name = \"Foo\")]\nenum Color { Red }",
        ));
        assert_eq!(output.units[0].name, "Foo_EnumExtensions");
    }
}
