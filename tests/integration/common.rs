//! Common utilities for integration tests

use archipel_installer::hash::blob_digest;
use assert_cmd::Command;
use std::fs;
use std::io::{Cursor, Write};
use std::path::Path;
use walkdir::WalkDir;
use zip::write::FileOptions;
use zip::ZipWriter;

pub const ARCHIVE_TOP: &str = "patches_archipel-main";

pub fn installer_command(home: &Path) -> Command {
    let mut cmd = Command::cargo_bin("archipel-installer").unwrap();
    cmd.env("ARCHIPEL_INSTALLER_HOME", home);
    cmd
}

/// Write the published bundle files under `dir`.
pub fn write_bundle(dir: &Path, files: &[(&str, &[u8])]) {
    for (name, content) in files {
        let path = dir.join(name);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }
}

fn bundle_files(dir: &Path) -> Vec<(String, std::path::PathBuf)> {
    WalkDir::new(dir)
        .sort_by_file_name()
        .into_iter()
        .map(|e| e.unwrap())
        .filter(|e| e.file_type().is_file())
        .map(|e| {
            let relative = e
                .path()
                .strip_prefix(dir)
                .unwrap()
                .to_string_lossy()
                .replace('\\', "/");
            (relative, e.into_path())
        })
        .collect()
}

/// Git tree listing of a repository whose `Patches/Archipel` is `dir`.
pub fn tree_json(dir: &Path) -> serde_json::Value {
    let mut tree = vec![
        serde_json::json!({"path": "README.md", "type": "blob", "sha": "0000", "size": 6}),
        serde_json::json!({"path": "Patches", "type": "tree", "sha": "t0"}),
        serde_json::json!({"path": "Patches/Archipel", "type": "tree", "sha": "t1"}),
    ];
    for (relative, path) in bundle_files(dir) {
        tree.push(serde_json::json!({
            "path": format!("Patches/Archipel/{}", relative),
            "type": "blob",
            "sha": blob_digest(&path).unwrap(),
            "size": fs::metadata(&path).unwrap().len(),
        }));
    }
    serde_json::json!({"sha": "main", "tree": tree, "truncated": false})
}

/// Zip archive of a repository whose `Patches/Archipel` is `dir`.
pub fn archive_bytes(dir: &Path) -> Vec<u8> {
    let mut cursor = Cursor::new(Vec::new());
    {
        let mut zip = ZipWriter::new(&mut cursor);
        zip.start_file(format!("{}/README.md", ARCHIVE_TOP), FileOptions::default())
            .unwrap();
        zip.write_all(b"readme").unwrap();
        for (relative, path) in bundle_files(dir) {
            zip.start_file(
                format!("{}/Patches/Archipel/{}", ARCHIVE_TOP, relative),
                FileOptions::default(),
            )
            .unwrap();
            zip.write_all(&fs::read(path).unwrap()).unwrap();
        }
        zip.finish().unwrap();
    }
    cursor.into_inner()
}
