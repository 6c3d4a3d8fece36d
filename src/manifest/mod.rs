//! Content manifests: building the local one, comparing it with the remote
//! one, and checking an extracted bundle before install.

pub mod builder;
pub mod compare;
pub mod integrity;
pub mod types;

pub use builder::{build_local_manifest, build_local_manifest_with, scan_local_bundle};
pub use compare::{are_equivalent, compare, Comparison};
pub use integrity::validate_extracted_bundle;
pub use types::{Manifest, ManifestEntry};
