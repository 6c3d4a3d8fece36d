//! Heuristic candidate locations for the installation root.

use crate::core::path::ROOT_DIR_NAME;
use crate::di::RegistryProbe;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

const REGISTRY_HIVES: &[&str] = &["HKCU", "HKLM"];
/// Key paths that may record the install location, 64- and 32-bit views.
const REGISTRY_KEY_PATHS: &[&str] = &[
    r"SOFTWARE\Epsilon",
    r"SOFTWARE\WOW6432Node\Epsilon",
    r"SOFTWARE\Archipel",
    r"SOFTWARE\WOW6432Node\Archipel",
];
const REGISTRY_VALUES: &[&str] = &["InstallPath", "Path", "GamePath"];

/// Every `(key, value)` pair the registry probe queries, in query order.
pub fn registry_queries() -> Vec<(String, &'static str)> {
    REGISTRY_HIVES
        .iter()
        .flat_map(|hive| {
            REGISTRY_KEY_PATHS
                .iter()
                .map(move |path| format!(r"{}\{}", hive, path))
        })
        .flat_map(|key| REGISTRY_VALUES.iter().map(move |value| (key.clone(), *value)))
        .collect()
}

/// Well-known folders an installation is commonly placed under.
///
/// Order: executable folder, working directory, Documents, Program Files,
/// local app data.
pub fn default_base_dirs() -> Vec<PathBuf> {
    let mut bases = Vec::new();

    if let Some(exe_dir) = std::env::current_exe()
        .ok()
        .and_then(|p| p.parent().map(Path::to_path_buf))
    {
        bases.push(exe_dir);
    }
    if let Ok(cwd) = std::env::current_dir() {
        bases.push(cwd);
    }
    if let Some(documents) = dirs::document_dir() {
        bases.push(documents);
    }
    if let Some(program_files) = std::env::var_os("ProgramFiles") {
        bases.push(PathBuf::from(program_files));
    }
    if let Some(local) = dirs::data_local_dir() {
        bases.push(local);
    }

    bases
}

/// Candidate roots in trial order, deduplicated case-insensitively.
///
/// Each base joined with `Epsilon_retail_` comes first, then registry
/// entries, then children of each base named like a root.
pub fn heuristic_candidates(bases: &[PathBuf], registry: &dyn RegistryProbe) -> Vec<PathBuf> {
    let mut seen = HashSet::new();
    let mut ordered = Vec::new();
    let mut push = |path: PathBuf| {
        let key = path.to_string_lossy().to_lowercase();
        if seen.insert(key) {
            ordered.push(path);
        }
    };

    for base in bases {
        push(base.join(ROOT_DIR_NAME));
    }
    for path in registry.candidates() {
        push(path);
    }
    for base in bases {
        for child in root_named_children(base) {
            push(child);
        }
    }

    ordered
}

fn root_named_children(base: &Path) -> Vec<PathBuf> {
    let Ok(entries) = fs::read_dir(base) else {
        return Vec::new();
    };

    let mut children: Vec<PathBuf> = entries
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().map(|t| t.is_dir()).unwrap_or(false))
        .filter(|e| e.file_name().to_string_lossy().eq_ignore_ascii_case(ROOT_DIR_NAME))
        .map(|e| e.path())
        .collect();
    children.sort();
    children
}

/// Registry probe for platforms without a registry.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoRegistryProbe;

impl RegistryProbe for NoRegistryProbe {
    fn candidates(&self) -> Vec<PathBuf> {
        Vec::new()
    }
}

/// Reads install locations through `reg query`.
#[derive(Debug, Default, Clone, Copy)]
pub struct RegQueryProbe;

impl RegistryProbe for RegQueryProbe {
    fn candidates(&self) -> Vec<PathBuf> {
        let mut found = Vec::new();
        for (key, value) in registry_queries() {
            let output = Command::new("reg")
                .args(["query", key.as_str(), "/v", value])
                .output();
            match output {
                Ok(out) if out.status.success() => {
                    let stdout = String::from_utf8_lossy(&out.stdout);
                    if let Some(path) = parse_reg_value(&stdout, value) {
                        found.push(PathBuf::from(path));
                    }
                }
                Ok(_) => {}
                Err(e) => {
                    tracing::debug!("reg query {} failed: {}", key, e);
                    return found;
                }
            }
        }
        found
    }
}

/// Platform default probe.
pub fn default_registry_probe() -> Box<dyn RegistryProbe> {
    if cfg!(windows) {
        Box::new(RegQueryProbe)
    } else {
        Box::new(NoRegistryProbe)
    }
}

/// Extract the data of `value` from `reg query` output.
///
/// Lines look like `    InstallPath    REG_SZ    C:\Games\Epsilon_retail_`.
fn parse_reg_value(output: &str, value: &str) -> Option<String> {
    output.lines().find_map(|line| {
        let line = line.trim();
        let rest = line.strip_prefix(value)?;
        let rest = rest.trim_start();
        let (kind, data) = rest.split_once(char::is_whitespace)?;
        if kind != "REG_SZ" && kind != "REG_EXPAND_SZ" {
            return None;
        }
        let data = data.trim();
        (!data.is_empty()).then(|| data.to_string())
    })
}
