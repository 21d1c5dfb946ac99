//! File-writing emitter with a minimal extension-module renderer.
//!
//! The pipeline's contract ends at [`OutputUnit`]; this module is the external
//! collaborator that turns a description record into source text. The renderer
//! fast-paths enumerations whose values are exactly 0..N-1 in declaration
//! order, which is why record member order must match source order.

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

use enumgen_core::{Emitter, EnumToGenerate, OutputUnit};

/// Writes each output unit as `<unit name>.rs` under a target directory.
pub struct FileEmitter {
    out_dir: PathBuf,
}

impl FileEmitter {
    pub fn new(out_dir: &Path) -> Result<Self> {
        fs::create_dir_all(out_dir)
            .with_context(|| format!("Failed to create output directory {}", out_dir.display()))?;
        Ok(Self {
            out_dir: out_dir.to_path_buf(),
        })
    }
}

impl Emitter for FileEmitter {
    fn emit(&mut self, unit: &OutputUnit) -> Result<()> {
        let path = self.out_dir.join(format!("{}.rs", unit.name));
        fs::write(&path, render(&unit.record))
            .with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(())
    }
}

/// True when member values are exactly 0..N-1 in declaration order.
fn is_contiguous(record: &EnumToGenerate) -> bool {
    !record.members.is_empty()
        && record
            .members
            .iter()
            .enumerate()
            .all(|(i, m)| m.value == i as i64)
}

/// Render one extension module from a description record.
pub fn render(record: &EnumToGenerate) -> String {
    let vis = if record.is_public { "pub" } else { "pub(crate)" };
    let ty = &record.underlying_type;
    let count = record.members.len();

    let mut body = String::new();
    body.push_str(&format!(
        "/// Generated helpers for `{}`.\n{vis} mod {} {{\n",
        record.declared_qualified_name, record.output_name
    ));
    body.push_str(&format!("    pub const MEMBER_COUNT: usize = {count};\n\n"));

    let names: Vec<String> = record
        .members
        .iter()
        .map(|m| format!("\"{}\"", m.name))
        .collect();
    body.push_str(&format!(
        "    const NAMES: [&str; {count}] = [{}];\n\n",
        names.join(", ")
    ));

    // name <- value
    body.push_str(&format!(
        "    pub fn to_name_fast(value: {ty}) -> Option<&'static str> {{\n"
    ));
    if is_contiguous(record) {
        body.push_str("        NAMES.get(value as usize).copied()\n");
    } else {
        body.push_str("        match value {\n");
        // Members may share a value; one arm per value, first member wins.
        let mut seen = std::collections::HashSet::new();
        for m in &record.members {
            if !seen.insert(m.value) {
                continue;
            }
            body.push_str(&format!("            {} => Some(NAMES[{}]),\n", m.value, index_of(record, &m.name)));
        }
        body.push_str("            _ => None,\n        }\n");
    }
    body.push_str("    }\n\n");

    // value <- name
    body.push_str(&format!(
        "    pub fn from_name(name: &str) -> Option<{ty}> {{\n        match name {{\n"
    ));
    for m in &record.members {
        body.push_str(&format!("            \"{}\" => Some({}),\n", m.name, m.value));
    }
    body.push_str("            _ => None,\n        }\n    }\n\n");

    body.push_str(&format!(
        "    pub fn is_defined(value: {ty}) -> bool {{\n        to_name_fast(value).is_some()\n    }}\n"
    ));

    if record.has_flags {
        body.push_str(&format!(
            "\n    pub fn has_flag(value: {ty}, flag: {ty}) -> bool {{\n        flag != 0 && value & flag == flag\n    }}\n"
        ));
    }

    body.push_str("}\n");

    let mut out = String::from("// Generated by enumgen. Do not edit.\n");
    if record.output_namespace.is_empty() {
        out.push_str(&body);
    } else {
        // Nest the extension module inside its namespace path.
        let segments: Vec<&str> = record.output_namespace.split("::").collect();
        for seg in &segments {
            out.push_str(&format!("{vis} mod {seg} {{\n"));
        }
        out.push_str(&body);
        for _ in &segments {
            out.push_str("}\n");
        }
    }
    out
}

fn index_of(record: &EnumToGenerate, name: &str) -> usize {
    record
        .members
        .iter()
        .position(|m| m.name == name)
        .unwrap_or(0)
}
