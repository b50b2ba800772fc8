use std::path::PathBuf;

use thiserror::Error;

/// Hard failures of the mod-file engine. These are rendered into
/// diagnostics at the reporting boundary; none of them aborts the pass.
#[derive(Debug, Error)]
pub enum ModFileError {
    #[error("Error writing {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Module file for '{name}' has invalid checksum: {path}")]
    InvalidChecksum { name: String, path: PathBuf },

    #[error("Module file for '{name}' is corrupt: {path}")]
    Corrupt { name: String, path: PathBuf },
}
