//! GitHub git-tree API type definitions

use serde::Deserialize;

/// Response of `GET /repos/{owner}/{repo}/git/trees/{ref}?recursive=1`
#[derive(Debug, Clone, Deserialize)]
pub struct TreeResponse {
    pub tree: Vec<TreeEntry>,
    #[serde(default)]
    pub truncated: bool,
}

/// One entry of a git tree listing
#[derive(Debug, Clone, Deserialize)]
pub struct TreeEntry {
    pub path: Option<String>,
    /// `blob` for files, `tree` for directories
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub sha: Option<String>,
    /// Kept loose: absent for trees and occasionally not a number
    pub size: Option<serde_json::Value>,
}

impl TreeEntry {
    pub fn is_file(&self) -> bool {
        self.kind
            .as_deref()
            .is_some_and(|k| k.eq_ignore_ascii_case("blob"))
    }

    pub fn size_bytes(&self) -> Option<u64> {
        self.size.as_ref().and_then(|v| v.as_u64())
    }
}
