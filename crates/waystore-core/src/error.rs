//! Error types for waystore

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("invalid storage config: {0}")]
    ConfigInvalid(String),

    #[error("artifact not found: {}", path.display())]
    ArtifactMissing { path: PathBuf },

    #[error("artifact corrupt: {} ({detail})", path.display())]
    ArtifactCorrupt { path: PathBuf, detail: String },

    #[error("only {max} metrics are supported at the same time, artifact declares {declared}")]
    LayoutOverflow { declared: u64, max: u64 },

    #[error("{side} canary of block corrupted ({block})")]
    CanaryCorruption { block: &'static str, side: &'static str },

    #[error(
        "connectivity checksum {checksum_b} in {} does not equal checksum {checksum_a} in {}",
        file_b.display(),
        file_a.display()
    )]
    ChecksumMismatch {
        file_a: PathBuf,
        checksum_a: u32,
        file_b: PathBuf,
        checksum_b: u32,
    },

    #[error("shared memory error: {0}")]
    SharedMemory(String),

    #[error("monitor error: {0}")]
    Monitor(String),

    #[error("io error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, Error>;
