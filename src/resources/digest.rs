//! Streaming file digests used to verify downloaded resources.
use std::fmt::Write as _;
use std::io::Read as _;
use std::path::Path;

use sha2::Digest;

/// Size of each read when hashing a file.
const CHUNK_SIZE: usize = 4096;

/// Supported digest algorithms.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Algorithm {
    /// MD5, 32 hex characters.
    Md5,
    /// SHA-256, 64 hex characters.
    Sha256,
}

impl Algorithm {
    /// Upper-case name used in messages.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Md5 => "MD5",
            Self::Sha256 => "SHA256",
        }
    }

    /// Hash the file at `path`, returning lower-case hex.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened or read.
    pub fn file_digest(self, path: &Path) -> std::io::Result<String> {
        match self {
            Self::Md5 => hash_file::<md5::Md5>(path),
            Self::Sha256 => hash_file::<sha2::Sha256>(path),
        }
    }
}

/// Hash `path` in fixed-size chunks so large archives are never held in
/// memory.
fn hash_file<D: Digest>(path: &Path) -> std::io::Result<String> {
    let mut file = std::fs::File::open(path)?;
    let mut hasher = D::new();
    let mut buf = [0u8; CHUNK_SIZE];
    loop {
        let n = file.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(buf.get(..n).unwrap_or_default());
    }
    let mut hex = String::with_capacity(64);
    for b in hasher.finalize() {
        // write! to a String is infallible; unwrap_or(()) makes that explicit.
        write!(hex, "{b:02x}").unwrap_or(());
    }
    Ok(hex)
}

/// Compare two hex digests, ignoring case.
#[must_use]
pub fn digests_match(expected: &str, actual: &str) -> bool {
    expected.trim().eq_ignore_ascii_case(actual.trim())
}
