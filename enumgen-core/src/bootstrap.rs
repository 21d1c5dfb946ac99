//! Marker bootstrapping.
//!
//! The opt-in and bit-flags markers are injected into every snapshot as a
//! synthetic source file before analysis, unconditionally, so user code may
//! reference them without depending on an external crate. The injected text
//! only has to parse; recognition happens by fully-qualified identity in the
//! symbol table, never by inspecting these stubs.

use crate::snapshot::ProgramSnapshot;

/// Display path of the injected declarations file.
pub const MARKER_FILE: &str = "<enumgen markers>";

/// Source text of the injected marker declarations.
pub const MARKER_SOURCE: &str = r#"//! Marker declarations injected by enumgen before each analysis pass.

pub mod enumgen {
    /// Opt-in marker for extension generation.
    ///
    /// Named options: `extension_class_name`, `extension_class_namespace`.
    #[allow(unused_macros)]
    macro_rules! enum_extensions {
        ($($args:tt)*) => {};
    }

    /// Marks an enumeration whose values combine as independent bits.
    #[allow(unused_macros)]
    macro_rules! flags {
        () => {};
    }
}
"#;

/// Append the marker declarations to a snapshot.
///
/// Called by every snapshot constructor; idempotent per snapshot because
/// constructors run it exactly once, after user files are in place.
pub fn inject_markers(snapshot: &mut ProgramSnapshot) {
    snapshot.push_synthetic(MARKER_FILE, MARKER_SOURCE);
}
