//! Manifest data model

use std::collections::BTreeMap;

/// One tracked file of a bundle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestEntry {
    /// Path relative to the bundle root, `/`-separated.
    pub relative_path: String,
    /// git blob id, when the source provides one.
    pub blob_digest: Option<String>,
    /// SHA-256 of the content, when the source provides one.
    pub file_digest: Option<String>,
    /// Byte size. `None` means unknown and is never compared.
    pub size: Option<u64>,
}

impl ManifestEntry {
    pub fn new(relative_path: impl Into<String>) -> Self {
        Self {
            relative_path: relative_path.into(),
            blob_digest: None,
            file_digest: None,
            size: None,
        }
    }

    pub fn with_blob_digest(mut self, digest: impl Into<String>) -> Self {
        self.blob_digest = Some(digest.into());
        self
    }

    pub fn with_file_digest(mut self, digest: impl Into<String>) -> Self {
        self.file_digest = Some(digest.into());
        self
    }

    pub fn with_size(mut self, size: u64) -> Self {
        self.size = Some(size);
        self
    }

    /// Blob digest if present and non-blank.
    pub fn blob(&self) -> Option<&str> {
        non_blank(self.blob_digest.as_deref())
    }

    /// Whole-file digest if present and non-blank.
    pub fn file(&self) -> Option<&str> {
        non_blank(self.file_digest.as_deref())
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

/// Set of entries keyed by relative path, compared case-insensitively.
///
/// Built fresh for every run and never persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Manifest {
    entries: BTreeMap<String, ManifestEntry>,
}

impl Manifest {
    pub fn new() -> Self {
        Self::default()
    }

    fn key(path: &str) -> String {
        path.replace('\\', "/").to_lowercase()
    }

    /// Insert an entry, replacing any entry whose path differs only by case.
    pub fn insert(&mut self, entry: ManifestEntry) {
        self.entries.insert(Self::key(&entry.relative_path), entry);
    }

    pub fn get(&self, relative_path: &str) -> Option<&ManifestEntry> {
        self.entries.get(&Self::key(relative_path))
    }

    pub fn contains(&self, relative_path: &str) -> bool {
        self.get(relative_path).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in case-insensitive path order.
    pub fn iter(&self) -> impl Iterator<Item = &ManifestEntry> {
        self.entries.values()
    }
}

impl FromIterator<ManifestEntry> for Manifest {
    fn from_iter<I: IntoIterator<Item = ManifestEntry>>(iter: I) -> Self {
        let mut manifest = Manifest::new();
        for entry in iter {
            manifest.insert(entry);
        }
        manifest
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keys_are_case_insensitive() {
        let mut manifest = Manifest::new();
        manifest.insert(ManifestEntry::new("Data/Map.bin").with_size(1));
        manifest.insert(ManifestEntry::new("data/map.BIN").with_size(2));

        assert_eq!(manifest.len(), 1);
        assert_eq!(manifest.get("DATA/MAP.bin").unwrap().size, Some(2));
    }

    #[test]
    fn test_backslashes_normalized_in_lookup() {
        let manifest: Manifest = vec![ManifestEntry::new("a/b.txt")].into_iter().collect();
        assert!(manifest.contains("a\\b.txt"));
    }

    #[test]
    fn test_blank_digests_are_absent() {
        let entry = ManifestEntry::new("x").with_blob_digest("  ");
        assert_eq!(entry.blob(), None);
        assert_eq!(entry.file(), None);
    }
}
