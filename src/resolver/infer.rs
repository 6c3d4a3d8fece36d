//! Validation of a candidate path and inference of the installation root.

use crate::core::path::{
    ensure_dir, has_bundle_layout, name_matches, patches_dir, BUNDLE_DIR_NAME, PATCHES_DIR_NAME,
    ROOT_DIR_NAME,
};
use crate::core::{InstallerError, InstallerResult};
use std::path::{Component, Path, PathBuf};
use walkdir::WalkDir;

const MAX_ANCESTORS: usize = 4;
const MAX_SEARCH_DEPTH: usize = 3;

/// Absolute, normalized form of `path`, trimmed of whitespace and quotes.
pub fn absolutize(path: &Path) -> Option<PathBuf> {
    let raw = path.to_string_lossy();
    let trimmed = raw.trim().trim_matches('"');
    if trimmed.is_empty() {
        return None;
    }

    let path = PathBuf::from(trimmed);
    let absolute = if path.is_absolute() {
        path
    } else {
        std::env::current_dir().ok()?.join(path)
    };
    Some(normalize(&absolute))
}

/// Resolve `.` and `..` lexically, without touching the filesystem.
///
/// `..` never climbs above the root.
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if out.file_name().is_some() {
                    out.pop();
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

fn is_root_signal(dir: &Path) -> bool {
    name_matches(dir, ROOT_DIR_NAME) || has_bundle_layout(dir)
}

/// Infer the installation root from a path the user or a heuristic gave.
///
/// Tried in order: the path is the root by name; it is the bundle folder
/// (root two levels up) or the `Patches` folder (root one level up); it
/// contains `Patches/Archipel`; one of its first four ancestors is a root;
/// a folder at most three levels below it is a root.
pub fn infer_root(selected: &Path) -> Option<PathBuf> {
    let full = absolutize(selected)?;
    if !full.is_dir() {
        return None;
    }

    if name_matches(&full, ROOT_DIR_NAME) {
        return Some(full);
    }

    if name_matches(&full, BUNDLE_DIR_NAME) {
        if let Some(root) = full.parent().and_then(Path::parent) {
            if root.is_dir() {
                return Some(root.to_path_buf());
            }
        }
    }

    if name_matches(&full, PATCHES_DIR_NAME) {
        if let Some(root) = full.parent() {
            if root.is_dir() {
                return Some(root.to_path_buf());
            }
        }
    }

    if has_bundle_layout(&full) {
        return Some(full);
    }

    if let Some(ancestor) = full
        .ancestors()
        .skip(1)
        .take(MAX_ANCESTORS)
        .find(|a| is_root_signal(a))
    {
        return Some(ancestor.to_path_buf());
    }

    WalkDir::new(&full)
        .min_depth(1)
        .max_depth(MAX_SEARCH_DEPTH)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_dir())
        .find(|e| is_root_signal(e.path()))
        .map(|e| e.into_path())
}

/// Validate a candidate and return the installation root it points to.
///
/// `Ok(None)` means the candidate is not an installation; the caller decides
/// whether that is fatal. A root whose folder name is not `Epsilon_retail_`
/// must already contain `Patches/Archipel`. Once accepted, `<root>/Patches`
/// is created if missing; failing to do so is a permission error.
pub fn validate_candidate(candidate: &Path) -> InstallerResult<Option<PathBuf>> {
    let Some(full) = absolutize(candidate) else {
        return Ok(None);
    };
    if !full.is_dir() {
        return Ok(None);
    }

    let Some(root) = infer_root(&full) else {
        return Ok(None);
    };

    if !name_matches(&root, ROOT_DIR_NAME) && !has_bundle_layout(&root) {
        return Ok(None);
    }

    let patches = patches_dir(&root);
    ensure_dir(&patches).map_err(|e| {
        InstallerError::locked_with(
            format!("Cannot access or create the Patches folder in {}", root.display()),
            e,
        )
    })?;

    Ok(Some(root))
}
