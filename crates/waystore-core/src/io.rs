//! Artifact container reader
//!
//! Every artifact starts with an 8-byte fingerprint (magic + format
//! version); the payload is a fixed per-artifact sequence of scalars and
//! length-prefixed vectors of packed `#[repr(C)]` elements. The layout
//! populator reads only counts and skips element payloads; the data
//! populator streams the payloads straight into shared memory.

use crate::error::{Error, Result};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

/// Magic bytes of the artifact container format
pub const FINGERPRINT_MAGIC: [u8; 4] = *b"WAYS";
/// Current container format version
pub const FINGERPRINT_VERSION: u32 = 1;

/// Leading fingerprint of every artifact file
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fingerprint {
    pub magic: [u8; 4],
    pub version: u32,
}

impl Fingerprint {
    /// Size of the encoded fingerprint in bytes
    pub const SIZE: u64 = 8;

    /// The fingerprint this build writes and accepts
    pub fn current() -> Self {
        Self {
            magic: FINGERPRINT_MAGIC,
            version: FINGERPRINT_VERSION,
        }
    }
}

/// Sequential reader over one artifact file
#[derive(Debug)]
pub struct FileReader {
    file: BufReader<File>,
    path: PathBuf,
}

impl FileReader {
    /// Open `path` and verify its fingerprint
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|source| {
            if source.kind() == std::io::ErrorKind::NotFound {
                Error::ArtifactMissing {
                    path: path.to_path_buf(),
                }
            } else {
                Error::Io {
                    path: path.to_path_buf(),
                    source,
                }
            }
        })?;
        let mut reader = Self {
            file: BufReader::new(file),
            path: path.to_path_buf(),
        };

        let mut magic = [0u8; 4];
        reader.read_bytes(&mut magic)?;
        let version = reader.read_u32()?;
        if magic != FINGERPRINT_MAGIC {
            return Err(Error::ArtifactCorrupt {
                path: reader.path,
                detail: format!("bad magic {magic:02x?}"),
            });
        }
        if version != FINGERPRINT_VERSION {
            return Err(Error::ArtifactCorrupt {
                path: reader.path,
                detail: format!(
                    "version mismatch: expected {FINGERPRINT_VERSION}, got {version}"
                ),
            });
        }
        Ok(reader)
    }

    /// Path of the underlying file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Payload size in bytes, excluding the fingerprint
    pub fn size(&self) -> Result<u64> {
        let len = self
            .file
            .get_ref()
            .metadata()
            .map_err(|source| Error::Io {
                path: self.path.clone(),
                source,
            })?
            .len();
        Ok(len.saturating_sub(Fingerprint::SIZE))
    }

    /// Read raw bytes
    pub fn read_bytes(&mut self, out: &mut [u8]) -> Result<()> {
        self.file.read_exact(out).map_err(|source| {
            if source.kind() == std::io::ErrorKind::UnexpectedEof {
                Error::ArtifactCorrupt {
                    path: self.path.clone(),
                    detail: "unexpected end of file".to_string(),
                }
            } else {
                Error::Io {
                    path: self.path.clone(),
                    source,
                }
            }
        })
    }

    /// Read one little-endian u32
    pub fn read_u32(&mut self) -> Result<u32> {
        let mut buf = [0u8; 4];
        self.read_bytes(&mut buf)?;
        Ok(u32::from_le_bytes(buf))
    }

    /// Read one little-endian u64 element count
    pub fn read_element_count(&mut self) -> Result<u64> {
        let mut buf = [0u8; 8];
        self.read_bytes(&mut buf)?;
        Ok(u64::from_le_bytes(buf))
    }

    /// Skip `count` packed elements of type `T`
    pub fn skip<T>(&mut self, count: u64) -> Result<()> {
        let bytes = count * std::mem::size_of::<T>() as u64;
        self.file
            .seek_relative(bytes as i64)
            .map_err(|source| Error::Io {
                path: self.path.clone(),
                source,
            })
    }

    /// Read a vector's element count and skip over its payload
    pub fn read_vector_size<T>(&mut self) -> Result<u64> {
        let count = self.read_element_count()?;
        self.skip::<T>(count)?;
        Ok(count)
    }

    /// Read `out.len()` packed elements of type `T` into `out`
    pub fn read_into_slice<T: Copy>(&mut self, out: &mut [T]) -> Result<()> {
        // SAFETY: T is plain old data; the byte view covers exactly the slice.
        let bytes = unsafe {
            std::slice::from_raw_parts_mut(
                out.as_mut_ptr() as *mut u8,
                std::mem::size_of_val(out),
            )
        };
        self.read_bytes(bytes)
    }

    /// Read a vector's element count, which must equal `out.len()`, then its
    /// payload into `out`
    pub fn read_vector_into<T: Copy>(&mut self, out: &mut [T]) -> Result<()> {
        let count = self.read_element_count()?;
        if count != out.len() as u64 {
            return Err(Error::ArtifactCorrupt {
                path: self.path.clone(),
                detail: format!(
                    "vector length changed between passes: expected {}, got {count}",
                    out.len()
                ),
            });
        }
        self.read_into_slice(out)
    }
}
