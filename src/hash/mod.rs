//! Content hashing for manifests.
//!
//! Two digests are supported:
//! - the whole-file digest, SHA-256 over the raw bytes;
//! - the blob digest, SHA-1 over `"blob <len>\0" || bytes`, which is the
//!   object id git assigns to a file. It can be compared directly against
//!   the `sha` of a git tree entry without downloading the remote file.
//!
//! Both stream the file through a fixed-size buffer.

use crate::core::InstallerResult;
use sha1::Sha1;
use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

const BUFFER_SIZE: usize = 81920;

/// Which digest a manifest entry carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DigestKind {
    /// git blob object id (SHA-1)
    #[default]
    Blob,
    /// SHA-256 of the file content
    WholeFile,
}

/// Lowercase hex SHA-256 of the file content.
pub fn whole_file_digest(path: &Path) -> InstallerResult<String> {
    let file = File::open(path)?;
    let mut hasher = Sha256::new();
    feed(&mut hasher, file)?;
    Ok(hex::encode(hasher.finalize()))
}

/// Lowercase hex git blob id of the file.
///
/// The length in the header is taken from the file metadata before any byte
/// is read.
pub fn blob_digest(path: &Path) -> InstallerResult<String> {
    let file = File::open(path)?;
    let length = file.metadata()?.len();

    let mut hasher = Sha1::new();
    hasher.update(blob_header(length));
    feed(&mut hasher, file)?;
    Ok(hex::encode(hasher.finalize()))
}

/// Digest of the requested kind.
pub fn digest(path: &Path, kind: DigestKind) -> InstallerResult<String> {
    match kind {
        DigestKind::Blob => blob_digest(path),
        DigestKind::WholeFile => whole_file_digest(path),
    }
}

fn blob_header(length: u64) -> Vec<u8> {
    format!("blob {}\0", length).into_bytes()
}

fn feed<D: Digest>(hasher: &mut D, file: File) -> InstallerResult<()> {
    let mut reader = BufReader::with_capacity(BUFFER_SIZE, file);
    let mut buffer = vec![0u8; BUFFER_SIZE];
    loop {
        let read = reader.read(&mut buffer)?;
        if read == 0 {
            break;
        }
        hasher.update(&buffer[..read]);
    }
    Ok(())
}
