//! Result reporting - plaintext and JSON.

use serde_json::json;

use crate::builder::GenerationResult;

/// Prints a generation result in plain text format.
pub fn print_plain(result: &GenerationResult) {
    if result.units.is_empty() {
        println!(
            "Nothing to generate ({} enum(s) up to date).",
            result.unchanged
        );
    } else {
        println!("GENERATED UNITS ({}):", result.units.len());
        for unit in &result.units {
            println!("- {}", unit.name);
        }
    }
    for d in &result.diagnostics {
        eprintln!("[SKIP] {}: {}", d.file, d.message);
    }
}

/// Prints a generation result in JSON format.
///
/// Falls back to a minimal line if serialization fails.
pub fn print_json(result: &GenerationResult) {
    let value = json!({
        "units": result.unit_names(),
        "opted_in": result.total_opted_in,
        "unchanged": result.unchanged,
        "diagnostics": result.diagnostics.iter()
            .map(|d| json!({ "file": d.file, "message": d.message }))
            .collect::<Vec<_>>(),
    });
    match serde_json::to_string_pretty(&value) {
        Ok(json) => println!("{}", json),
        Err(e) => {
            eprintln!("[WARN] JSON serialization failed: {}", e);
            println!("{{\"units\": {:?}}}", result.unit_names());
        }
    }
}
