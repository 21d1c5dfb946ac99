//! Per-pass symbol table and semantic resolution.
//!
//! Marker recognition works by comparing a resolved attribute path against a
//! fixed set of well-known fully-qualified identities, checked by value
//! equality. An attribute written with a single-segment path resolves through
//! the file's `use` imports; a fully-qualified path matches directly. Anything
//! that resolves to neither identity is unresolvable and silently skipped —
//! an unresolvable decoration must never abort a pass.

use std::collections::HashMap;
use syn::{visit::Visit, ItemUse, UseTree};

use crate::filter::Candidate;
use crate::snapshot::ProgramSnapshot;

/// Fully-qualified identity of the opt-in marker.
pub const OPT_IN_MARKER: &str = "enumgen::enum_extensions";

/// Fully-qualified identity of the bit-flags marker.
pub const FLAGS_MARKER: &str = "enumgen::flags";

/// Leading path segments that never name a module dependency.
const PATH_KEYWORDS: &[&str] = &["self", "super", "crate"];

/// The recognized marker identities.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerIdentity {
    /// Opt-in marker requesting extension generation
    EnumExtensions,
    /// Bit-flags marker
    Flags,
}

impl MarkerIdentity {
    /// Match a fully-qualified path against the recognized identities.
    pub fn from_qualified(path: &str) -> Option<Self> {
        match path {
            OPT_IN_MARKER => Some(Self::EnumExtensions),
            FLAGS_MARKER => Some(Self::Flags),
            _ => None,
        }
    }

    /// The identity's fully-qualified form.
    pub fn qualified(&self) -> &'static str {
        match self {
            Self::EnumExtensions => OPT_IN_MARKER,
            Self::Flags => FLAGS_MARKER,
        }
    }
}

/// Immutable per-pass symbol table.
///
/// Holds one import map per snapshot file: local name as written in source to
/// fully-qualified path. Built once per pass and shared read-only by every
/// candidate's resolution.
#[derive(Debug, Default)]
pub struct SymbolTable {
    imports: Vec<HashMap<String, String>>,
}

/// Visitor gathering all `use` declarations of one file into an import map.
struct ImportCollector {
    map: HashMap<String, String>,
}

impl<'ast> Visit<'ast> for ImportCollector {
    fn visit_item_use(&mut self, item: &'ast ItemUse) {
        flatten_use_tree(&mut Vec::new(), &item.tree, &mut self.map);
    }
}

/// Flatten a use tree into (local name, qualified path) entries.
///
/// Leading `self`/`super`/`crate` segments are dropped so that
/// `use crate::enumgen::enum_extensions;` resolves like the plain form.
fn flatten_use_tree(prefix: &mut Vec<String>, tree: &UseTree, map: &mut HashMap<String, String>) {
    match tree {
        UseTree::Path(p) => {
            let seg = p.ident.to_string();
            let skip = prefix.is_empty() && PATH_KEYWORDS.contains(&seg.as_str());
            if !skip {
                prefix.push(seg);
            }
            flatten_use_tree(prefix, &p.tree, map);
            if !skip {
                prefix.pop();
            }
        }
        UseTree::Name(n) => {
            let name = n.ident.to_string();
            let qualified = qualify(prefix, &name);
            map.insert(name, qualified);
        }
        UseTree::Rename(r) => {
            let qualified = qualify(prefix, &r.ident.to_string());
            map.insert(r.rename.to_string(), qualified);
        }
        UseTree::Group(g) => {
            for item in &g.items {
                flatten_use_tree(prefix, item, map);
            }
        }
        UseTree::Glob(_) => {
            // A glob over the marker module brings both marker names into scope.
            // Any other glob resolves to nothing.
            if prefix.len() == 1 && prefix[0] == "enumgen" {
                map.insert("enum_extensions".to_string(), OPT_IN_MARKER.to_string());
                map.insert("flags".to_string(), FLAGS_MARKER.to_string());
            }
        }
    }
}

fn qualify(prefix: &[String], name: &str) -> String {
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{}::{}", prefix.join("::"), name)
    }
}

impl SymbolTable {
    /// Build the symbol table for one snapshot.
    pub fn build(snapshot: &ProgramSnapshot) -> Self {
        let imports = snapshot
            .files
            .iter()
            .map(|file| {
                let mut collector = ImportCollector {
                    map: HashMap::new(),
                };
                if let Some(ast) = &file.ast {
                    collector.visit_file(ast);
                }
                collector.map
            })
            .collect();
        Self { imports }
    }

    /// Number of files this table was built from.
    pub fn file_count(&self) -> usize {
        self.imports.len()
    }

    /// Resolve an attribute path to a recognized marker identity.
    ///
    /// Returns `None` for unresolvable or unrelated attributes; callers skip
    /// those without error.
    pub fn resolve_attribute(&self, file: usize, path: &syn::Path) -> Option<MarkerIdentity> {
        let imports = self.imports.get(file)?;

        let mut segments: Vec<String> = path
            .segments
            .iter()
            .map(|s| s.ident.to_string())
            .collect();
        while segments
            .first()
            .is_some_and(|s| PATH_KEYWORDS.contains(&s.as_str()))
        {
            segments.remove(0);
        }

        match segments.len() {
            0 => None,
            1 => imports
                .get(&segments[0])
                .and_then(|q| MarkerIdentity::from_qualified(q)),
            _ => MarkerIdentity::from_qualified(&segments.join("::")),
        }
    }

    /// Resolve a candidate's own declared symbol to its fully-qualified name.
    ///
    /// Fails only when the candidate does not belong to the snapshot this
    /// table was built from — an analysis-environment inconsistency the
    /// orchestrator reports as a per-candidate diagnostic.
    pub fn resolve_candidate(&self, candidate: &Candidate) -> Option<String> {
        if candidate.file >= self.imports.len() {
            return None;
        }
        let name = candidate.item.ident.to_string();
        if candidate.module_path.is_empty() {
            Some(name)
        } else {
            Some(format!("{}::{}", candidate.module_path.join("::"), name))
        }
    }

    /// Confirm a syntactic candidate is genuinely opted in.
    ///
    /// True iff any of its attributes resolves to the opt-in marker identity.
    pub fn is_opted_in(&self, candidate: &Candidate) -> bool {
        candidate
            .item
            .attrs
            .iter()
            .any(|attr| self.resolve_attribute(candidate.file, attr.path()) == Some(MarkerIdentity::EnumExtensions))
    }
}

/// Keep only candidates whose decorations confirm opt-in, preserving order.
pub fn resolve_candidates(table: &SymbolTable, candidates: Vec<Candidate>) -> Vec<Candidate> {
    candidates
        .into_iter()
        .filter(|c| table.is_opted_in(c))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::collect_candidates;

    fn table_and_candidates(content: &str) -> (SymbolTable, Vec<Candidate>) {
        let snapshot = ProgramSnapshot::from_sources([("lib.rs", content)]);
        let table = SymbolTable::build(&snapshot);
        let candidates = collect_candidates(&snapshot);
        (table, candidates)
    }

    #[test]
    fn test_fully_qualified_marker_resolves() {
        let (table, candidates) =
            table_and_candidates("#[enumgen::enum_extensions]\nenum E { A }");
        assert_eq!(candidates.len(), 1);
        assert!(table.is_opted_in(&candidates[0]));
    }

    #[test]
    fn test_crate_prefixed_marker_resolves() {
        let (table, candidates) =
            table_and_candidates("#[crate::enumgen::enum_extensions]\nenum E { A }");
        assert!(table.is_opted_in(&candidates[0]));
    }

    #[test]
    fn test_imported_marker_resolves() {
        let (table, candidates) = table_and_candidates(
            "use enumgen::enum_extensions;\n#[enum_extensions]\nenum E { A }",
        );
        assert!(table.is_opted_in(&candidates[0]));
    }

    #[test]
    fn test_renamed_import_resolves() {
        let (table, candidates) = table_and_candidates(
            "use enumgen::enum_extensions as gen_ext;\n#[gen_ext]\nenum E { A }",
        );
        assert!(table.is_opted_in(&candidates[0]));
    }

    #[test]
    fn test_glob_import_resolves() {
        let (table, candidates) =
            table_and_candidates("use enumgen::*;\n#[enum_extensions]\nenum E { A }");
        assert!(table.is_opted_in(&candidates[0]));
    }

    #[test]
    fn test_unrelated_attributes_resolve_to_nothing() {
        let (table, candidates) =
            table_and_candidates("#[derive(Debug)]\n#[repr(u8)]\nenum E { A }");
        assert_eq!(candidates.len(), 1);
        assert!(!table.is_opted_in(&candidates[0]));
        assert!(resolve_candidates(&table, candidates).is_empty());
    }

    #[test]
    fn test_textually_similar_attribute_not_confused() {
        // Same leaf name, different qualified identity: must not opt in.
        let (table, candidates) = table_and_candidates(
            "use other::enum_extensions;\n#[enum_extensions]\nenum E { A }",
        );
        assert!(!table.is_opted_in(&candidates[0]));
    }

    #[test]
    fn test_flags_marker_identity() {
        let (table, candidates) = table_and_candidates(
            "#[enumgen::enum_extensions]\n#[enumgen::flags]\nenum E { A }",
        );
        let c = &candidates[0];
        let identities: Vec<_> = c
            .item
            .attrs
            .iter()
            .filter_map(|a| table.resolve_attribute(c.file, a.path()))
            .collect();
        assert_eq!(
            identities,
            vec![MarkerIdentity::EnumExtensions, MarkerIdentity::Flags]
        );
    }

    #[test]
    fn test_resolve_candidate_qualified_name() {
        let (table, candidates) = table_and_candidates(
            "mod colors {\n#[enumgen::enum_extensions]\nenum Color { Red }\n}",
        );
        assert_eq!(
            table.resolve_candidate(&candidates[0]).as_deref(),
            Some("colors::Color")
        );
    }

    #[test]
    fn test_resolve_candidate_snapshot_mismatch() {
        let (_, candidates) = table_and_candidates("#[enumgen::enum_extensions]\nenum E { A }");
        // Table built from a different (empty) snapshot: resolution must fail,
        // not panic.
        let other = SymbolTable::default();
        assert!(other.resolve_candidate(&candidates[0]).is_none());
    }

    #[test]
    fn test_marker_identity_round_trip() {
        assert_eq!(
            MarkerIdentity::from_qualified(OPT_IN_MARKER),
            Some(MarkerIdentity::EnumExtensions)
        );
        assert_eq!(
            MarkerIdentity::from_qualified(MarkerIdentity::Flags.qualified()),
            Some(MarkerIdentity::Flags)
        );
        assert_eq!(MarkerIdentity::from_qualified("serde::Serialize"), None);
    }
}
