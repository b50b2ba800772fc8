//! Module-file engine: serialization of module interfaces to `.mod`
//! artifacts and rehydration of those artifacts into symbol scopes.
//!
//! The on-disk format is ASCII text with LF newlines. Line 1 is the magic
//! prefix followed by 16 lowercase hex digits of the FNV-1a-64 checksum of
//! the body; the body is canonical lowercase Fortran declarations.

pub mod errors;
pub mod parser;
pub mod reader;
pub mod writer;

pub use reader::{ModFileReader, ModParser, NameResolver, ParseOptions, ParseOutcome};
pub use writer::{ModFileWriter, WriteOutcome};

use std::path::{Path, PathBuf};

/// The extension used for module files.
pub const EXTENSION: &str = ".mod";
/// The initial characters of a file that identify it as a mod file.
pub const MAGIC: &str = "!mod$ v1 sum:";
/// Number of hex digits in the checksum.
pub const CHECKSUM_DIGITS: usize = 16;

/// FNV-1a 64-bit hash, rendered as 16 lowercase hex digits.
pub fn checksum(bytes: &[u8]) -> String {
    let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
    for &byte in bytes {
        hash ^= byte as u64;
        hash = hash.wrapping_mul(0x0000_0100_0000_01b3);
    }
    format!("{:016x}", hash)
}

/// The header line (without trailing newline) for a mod-file body.
pub fn header(contents: &str) -> String {
    format!("{}{}", MAGIC, checksum(contents.as_bytes()))
}

/// Path of the mod file for `name` in `dir`; `ancestor` present means
/// submodule. Directory `.` is rendered without a leading `./` prefix.
pub fn mod_file_path(dir: &Path, name: &str, ancestor: Option<&str>) -> PathBuf {
    let mut file_name = String::new();
    if let Some(ancestor) = ancestor {
        file_name.push_str(&ancestor.to_lowercase());
        file_name.push('-');
    }
    file_name.push_str(&name.to_lowercase());
    file_name.push_str(EXTENSION);
    if dir == Path::new(".") {
        PathBuf::from(file_name)
    } else {
        dir.join(file_name)
    }
}

#[cfg(test)]
#[path = "../tests/t_modfile.rs"]
mod tests;
