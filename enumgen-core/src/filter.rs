//! Syntactic candidate filtering.
//!
//! The filter runs on every item of every file in a pass, so it must stay
//! cheap: a candidate is any enum declaration carrying at least one attribute,
//! decided without symbol resolution. False positives (enums whose attributes
//! turn out to be unrelated) are expected and discarded by the resolver;
//! false negatives are not tolerated for well-formed decorated enums.

use syn::{visit::Visit, Item, ItemEnum, ItemMod};

use crate::snapshot::ProgramSnapshot;

/// Syntax-only candidate predicate: enum declaration with at least one attribute.
pub fn is_candidate(item: &Item) -> bool {
    matches!(item, Item::Enum(e) if !e.attrs.is_empty())
}

/// A syntactic candidate: one decorated enum declaration found in a snapshot.
#[derive(Debug, Clone)]
pub struct Candidate {
    /// Index of the containing file in the snapshot
    pub file: usize,
    /// Enclosing module path, outermost first (empty at crate root)
    pub module_path: Vec<String>,
    /// The declaration itself
    pub item: ItemEnum,
    /// Source position of the enum's name (line, column)
    pub location: (usize, usize),
}

impl Candidate {
    /// Identity of the underlying syntax node, used to deduplicate candidates
    /// discovered through multiple traversal paths.
    pub fn identity(&self) -> (usize, usize, usize) {
        (self.file, self.location.0, self.location.1)
    }
}

/// AST visitor that collects all syntactic candidates in one file.
struct CandidateCollector {
    file: usize,
    current_mod: Vec<String>,
    results: Vec<Candidate>,
}

impl CandidateCollector {
    fn new(file: usize) -> Self {
        Self {
            file,
            current_mod: Vec::new(),
            results: Vec::with_capacity(8),
        }
    }
}

impl<'ast> Visit<'ast> for CandidateCollector {
    fn visit_item(&mut self, item: &'ast Item) {
        match item {
            Item::Enum(e) if is_candidate(item) => {
                let start = e.ident.span().start();
                self.results.push(Candidate {
                    file: self.file,
                    module_path: self.current_mod.clone(),
                    item: e.clone(),
                    location: (start.line, start.column),
                });
            }

            Item::Mod(ItemMod {
                ident,
                content: Some((_, items)),
                ..
            }) => {
                self.current_mod.push(ident.to_string());
                for i in items {
                    self.visit_item(i);
                }
                self.current_mod.pop();
                return;
            }

            _ => {}
        }

        syn::visit::visit_item(self, item);
    }
}

/// Collect all syntactic candidates across a snapshot, in file then source order.
///
/// Files without an AST (parse failures, oversized files) contribute nothing.
pub fn collect_candidates(snapshot: &ProgramSnapshot) -> Vec<Candidate> {
    let mut all = Vec::new();
    for (idx, file) in snapshot.files.iter().enumerate() {
        if let Some(ast) = &file.ast {
            let mut collector = CandidateCollector::new(idx);
            collector.visit_file(ast);
            all.append(&mut collector.results);
        }
    }
    all
}

/// Drop repeated discoveries of the same syntax node, keeping first occurrences.
pub fn dedup_candidates(candidates: Vec<Candidate>) -> Vec<Candidate> {
    let mut seen = std::collections::HashSet::new();
    candidates
        .into_iter()
        .filter(|c| seen.insert(c.identity()))
        .collect()
}
