//! Cross-module integration tests for the full pipeline.

use crate::pipeline::{Emitter, OutputUnit, Pipeline};
use crate::snapshot::ProgramSnapshot;

#[derive(Default)]
struct CollectingEmitter {
    units: Vec<OutputUnit>,
}

impl Emitter for CollectingEmitter {
    fn emit(&mut self, unit: &OutputUnit) -> anyhow::Result<()> {
        self.units.push(unit.clone());
        Ok(())
    }
}

fn mixed_project(edit_marker: &str) -> ProgramSnapshot {
    ProgramSnapshot::from_sources([
        (
            "src/colors.rs",
            "use enumgen::enum_extensions;\n\
             #[enum_extensions]\n\
             #[repr(u8)]\n\
             pub enum Color { Red, Green, Blue }\n"
                .to_string(),
        ),
        (
            "src/perms.rs",
            "#[enumgen::enum_extensions(extension_class_name = \"Perms\")]\n\
             #[enumgen::flags]\n\
             pub enum Permission { None = 0, Read = 1, Write = 2, Execute = 4 }\n"
                .to_string(),
        ),
        (
            "src/plain.rs",
            "#[derive(Debug)]\npub enum NotOptedIn { A, B }\npub enum Bare { C }\n".to_string(),
        ),
        ("src/broken.rs", "enum { this does not parse".to_string()),
        ("src/util.rs", format!("fn helper() {{}} // {edit_marker}\n")),
    ])
}

#[test]
fn test_full_pipeline_first_pass() {
    let mut pipeline = Pipeline::new();
    let mut emitter = CollectingEmitter::default();

    let output = pipeline.run(&mixed_project("v1"), &mut emitter).unwrap();
    assert_eq!(output.total_opted_in, 2);
    assert!(output.diagnostics.is_empty());

    let names: Vec<&str> = emitter.units.iter().map(|u| u.name.as_str()).collect();
    assert_eq!(
        names,
        vec!["ColorExtensions_EnumExtensions", "Perms_EnumExtensions"]
    );

    let color = &emitter.units[0].record;
    assert_eq!(color.underlying_type, "u8");
    assert!(!color.has_flags);
    assert_eq!(color.members.len(), 3);
    assert_eq!(color.members[2].value, 2);

    let perms = &emitter.units[1].record;
    assert!(perms.has_flags);
    assert!(perms.is_public);
    assert_eq!(
        perms.members.iter().map(|m| m.value).collect::<Vec<_>>(),
        vec![0, 1, 2, 4]
    );
}

#[test]
fn test_unrelated_edit_second_pass_is_quiet() {
    let mut pipeline = Pipeline::new();
    pipeline.supply(&mixed_project("v1"));

    // Only util.rs changes; both records must come back bit-for-bit equal
    // and the cache must classify the pass as "no re-emission needed".
    let second = pipeline.supply(&mixed_project("v2"));
    assert!(second.units.is_empty());
    assert_eq!(second.unchanged, 2);
    assert_eq!(second.total_opted_in, 2);
}

#[test]
fn test_edit_to_one_enum_reemits_only_it() {
    let mut pipeline = Pipeline::new();
    pipeline.supply(&mixed_project("v1"));

    let edited = ProgramSnapshot::from_sources([
        (
            "src/colors.rs",
            "use enumgen::enum_extensions;\n\
             #[enum_extensions]\n\
             #[repr(u8)]\n\
             pub enum Color { Red, Green, Blue, Alpha }\n",
        ),
        (
            "src/perms.rs",
            "#[enumgen::enum_extensions(extension_class_name = \"Perms\")]\n\
             #[enumgen::flags]\n\
             pub enum Permission { None = 0, Read = 1, Write = 2, Execute = 4 }\n",
        ),
    ]);

    let output = pipeline.supply(&edited);
    assert_eq!(output.units.len(), 1);
    assert_eq!(output.units[0].name, "ColorExtensions_EnumExtensions");
    assert_eq!(output.unchanged, 1);
}
