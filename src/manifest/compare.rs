use crate::manifest::types::{Manifest, ManifestEntry};

/// Outcome of comparing the local manifest against the remote one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Comparison {
    pub equivalent: bool,
    /// Remote entries that carry neither a digest nor a size. They match
    /// any local file with the same path, so they are reported.
    pub unverifiable: Vec<String>,
}

/// Compare a local manifest with a remote manifest.
///
/// They are equivalent when both hold the same number of entries and every
/// remote entry has a local entry at the same path that matches by digest
/// and, when the remote size is known, by size. The digest rule prefers the
/// remote blob digest; without one the whole-file digests are compared.
pub fn compare(local: &Manifest, remote: &Manifest) -> Comparison {
    let unverifiable = remote
        .iter()
        .filter(|e| e.blob().is_none() && e.file().is_none() && e.size.is_none())
        .map(|e| e.relative_path.clone())
        .collect();

    let equivalent = local.len() == remote.len()
        && remote.iter().all(|remote_entry| {
            local
                .get(&remote_entry.relative_path)
                .is_some_and(|local_entry| entry_matches(local_entry, remote_entry))
        });

    Comparison {
        equivalent,
        unverifiable,
    }
}

/// Shorthand for `compare(local, remote).equivalent`.
pub fn are_equivalent(local: &Manifest, remote: &Manifest) -> bool {
    compare(local, remote).equivalent
}

fn entry_matches(local: &ManifestEntry, remote: &ManifestEntry) -> bool {
    let digest_matches = match remote.blob() {
        Some(remote_blob) => local
            .blob()
            .is_some_and(|l| l.eq_ignore_ascii_case(remote_blob)),
        None => match (local.file(), remote.file()) {
            (Some(l), Some(r)) => l.eq_ignore_ascii_case(r),
            (None, None) => true,
            _ => false,
        },
    };

    let size_matches = match remote.size {
        Some(size) => local.size == Some(size),
        None => true,
    };

    digest_matches && size_matches
}
