//! Build script for stopbit-sim
//!
//! Validates the bundled scenarios in `scenarios/` at compile time so a
//! broken example never ships.

use std::fs;
use std::path::Path;

/// Top-level tables a scenario may contain
const KNOWN_SECTIONS: [&str; 5] = ["link", "send", "fault", "reset", "expect"];

fn main() {
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-changed=scenarios");

    let dir = Path::new("scenarios");
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(_) => return,
    };

    let mut errors = Vec::new();
    for entry in entries.flatten() {
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some("toml") {
            continue;
        }
        println!("cargo:rerun-if-changed={}", path.display());
        validate_scenario(&path, &mut errors);
    }

    if !errors.is_empty() {
        panic!(
            "\n\
            ╔══════════════════════════════════════════════════════════════════╗\n\
            ║  ERROR: Invalid bundled scenario                                 ║\n\
            ╠══════════════════════════════════════════════════════════════════╣\n\
            {}\n\
            ╚══════════════════════════════════════════════════════════════════╝\n",
            errors
                .iter()
                .map(|e| format!("║  • {:<62} ║", e))
                .collect::<Vec<_>>()
                .join("\n")
        );
    }
}

/// Check syntax, known sections and the link width of one scenario
fn validate_scenario(path: &Path, errors: &mut Vec<String>) {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) => {
            errors.push(format!("{}: {}", name, e));
            return;
        }
    };

    let table: toml::Table = match toml::from_str(&content) {
        Ok(table) => table,
        Err(e) => {
            let first = e.to_string().lines().next().unwrap_or_default().to_string();
            errors.push(format!("{}: {}", name, first));
            return;
        }
    };

    for key in table.keys() {
        if !KNOWN_SECTIONS.contains(&key.as_str()) {
            errors.push(format!("{}: unknown section [{}]", name, key));
        }
    }

    if let Some(toml::Value::Integer(bits)) = table
        .get("link")
        .and_then(|l| l.as_table())
        .and_then(|l| l.get("data_bits"))
    {
        if !(5..=9).contains(bits) {
            errors.push(format!("{}: data_bits must be 5-9", name));
        }
    }
}
