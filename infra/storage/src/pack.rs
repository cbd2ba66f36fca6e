//! Read-only pack archives.
//!
//! A pack is a flat file index followed by file blobs:
//!
//! ```text
//! [MAGIC "LPCK"][VERSION u32][COUNT u32]
//! COUNT x [PATH_LEN u32][PATH][OFFSET u64][STORED_LEN u64][LEN u64][FLAGS u32]
//! [BLOBS...]
//! ```
//!
//! Offsets are relative to the first byte of the pack, so a pack can live inside a larger
//! file. Packs appended to an executable end with a `[PACK_LEN u64][MAGIC]` footer that
//! locates the pack start. All integers are little-endian.

use crate::error::{StorageError, StorageErrorExt};
use crate::security;
use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub const PACK_MAGIC: [u8; 4] = *b"LPCK";
pub const PACK_FORMAT_VERSION: u32 = 1;

const HEADER_LEN: u64 = 12;
const FOOTER_LEN: u64 = 12;
const ENTRY_FIXED_LEN: usize = 4 + 8 + 8 + 8 + 4;
const FLAG_COMPRESSED: u32 = 1 << 0;
const MAX_PATH_LEN: u32 = 4096;
const MAX_ENTRIES: u32 = 1 << 20;

#[derive(Debug, Clone, Copy, Default, Eq, PartialEq)]
pub enum Compression {
    #[default]
    None,
    Lz4,
}

impl Compression {
    #[must_use]
    fn compress(self, data: &[u8]) -> Vec<u8> {
        match self {
            Self::None => data.to_vec(),
            Self::Lz4 => lz4_flex::compress_prepend_size(data),
        }
    }

    const fn flags(self) -> u32 {
        match self {
            Self::None => 0,
            Self::Lz4 => FLAG_COMPRESSED,
        }
    }
}

/// Location of one file inside a mounted pack.
#[derive(Debug, Clone)]
pub(crate) struct PackEntry {
    source: Arc<PathBuf>,
    offset: u64,
    stored_len: u64,
    len: u64,
    compressed: bool,
}

impl PackEntry {
    pub(crate) fn source(&self) -> &Path {
        &self.source
    }

    pub(crate) const fn len(&self) -> u64 {
        self.len
    }

    pub(crate) fn read(&self) -> Result<Vec<u8>, StorageError> {
        let mut file = File::open(self.source.as_path())
            .context(format!("Failed to reopen pack {}", self.source.display()))?;
        file.seek(SeekFrom::Start(self.offset)).context("Pack seek failed")?;

        let mut buf = Vec::with_capacity(to_usize(self.stored_len)?);
        file.take(self.stored_len).read_to_end(&mut buf).context("Pack read failed")?;
        if buf.len() as u64 != self.stored_len {
            return Err(invalid(self.source(), "Pack entry is truncated"));
        }

        let data = if self.compressed {
            lz4_flex::decompress_size_prepended(&buf)
                .context("Lz4 pack entry decompression failed")?
        } else {
            buf
        };

        if data.len() as u64 != self.len() {
            return Err(invalid(self.source(), "Pack entry length does not match its index"));
        }
        Ok(data)
    }
}

/// Reads the index of the pack stored in `path`, starting at byte `offset`.
///
/// With `offset == 0` and no magic at the start of the file, the footer at the end of the
/// file is consulted, which is how packs embedded in executables are found.
pub(crate) fn read_index(
    path: &Path,
    offset: u64,
) -> Result<Vec<(String, PackEntry)>, StorageError> {
    let mut file = match File::open(path) {
        Ok(file) => file,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            return Err(StorageError::not_found(path.display()));
        },
        Err(err) => {
            return Err(StorageError::Io {
                source: err,
                context: Some(format!("Failed to open pack {}", path.display()).into()),
            });
        },
    };

    let file_len = file.metadata().context("Failed to stat pack")?.len();
    let start = locate_pack(&mut file, offset)
        .ok_or_else(|| invalid(path, "no pack header or footer found"))?;
    file.seek(SeekFrom::Start(start + 4)).context("Pack seek failed")?;

    let version = read_u32(&mut file).map_err(|_| invalid(path, "truncated header"))?;
    if version != PACK_FORMAT_VERSION {
        return Err(invalid(path, format!("unsupported pack version {version}")));
    }
    let count = read_u32(&mut file).map_err(|_| invalid(path, "truncated header"))?;
    if count > MAX_ENTRIES {
        return Err(invalid(path, format!("entry count {count} is out of range")));
    }

    let source = Arc::new(path.to_path_buf());
    let mut entries = Vec::with_capacity(to_usize(u64::from(count))?);

    for _ in 0..count {
        let path_len = read_u32(&mut file).map_err(|_| invalid(path, "truncated index"))?;
        if path_len > MAX_PATH_LEN {
            return Err(invalid(path, "entry path is too long"));
        }
        let mut raw = vec![0u8; to_usize(u64::from(path_len))?];
        file.read_exact(&mut raw).map_err(|_| invalid(path, "truncated index"))?;
        let name = String::from_utf8(raw).map_err(|_| invalid(path, "entry path is not UTF-8"))?;

        let rel_offset = read_u64(&mut file).map_err(|_| invalid(path, "truncated index"))?;
        let stored_len = read_u64(&mut file).map_err(|_| invalid(path, "truncated index"))?;
        let len = read_u64(&mut file).map_err(|_| invalid(path, "truncated index"))?;
        let flags = read_u32(&mut file).map_err(|_| invalid(path, "truncated index"))?;

        let compressed = flags & FLAG_COMPRESSED != 0;
        let end = start.checked_add(rel_offset).and_then(|o| o.checked_add(stored_len));
        if end.is_none_or(|end| end > file_len) {
            return Err(invalid(path, format!("entry '{name}' lies outside the pack")));
        }
        if !plausible_len(len, stored_len, compressed) {
            return Err(invalid(path, format!("entry '{name}' has an impossible length")));
        }

        let entry = PackEntry {
            source: Arc::clone(&source),
            offset: start + rel_offset,
            stored_len,
            len,
            compressed,
        };
        entries.push((security::pack_key(&name)?, entry));
    }

    Ok(entries)
}

/// LZ4 expands at most ~255x; uncompressed entries are stored as-is.
fn plausible_len(len: u64, stored_len: u64, compressed: bool) -> bool {
    if compressed {
        len <= u64::from(u32::MAX) && len <= stored_len.saturating_mul(255)
    } else {
        len == stored_len
    }
}

fn locate_pack(file: &mut File, offset: u64) -> Option<u64> {
    if has_magic_at(file, offset) {
        return Some(offset);
    }
    if offset != 0 {
        return None;
    }

    let file_len = file.seek(SeekFrom::End(0)).ok()?;
    if file_len < HEADER_LEN + FOOTER_LEN {
        return None;
    }
    file.seek(SeekFrom::Start(file_len - FOOTER_LEN)).ok()?;
    let pack_len = read_u64(file).ok()?;
    let mut magic = [0u8; 4];
    file.read_exact(&mut magic).ok()?;
    if magic != PACK_MAGIC {
        return None;
    }

    let start = file_len.checked_sub(FOOTER_LEN)?.checked_sub(pack_len)?;
    has_magic_at(file, start).then_some(start)
}

fn has_magic_at(file: &mut File, offset: u64) -> bool {
    let mut magic = [0u8; 4];
    file.seek(SeekFrom::Start(offset)).is_ok()
        && file.read_exact(&mut magic).is_ok()
        && magic == PACK_MAGIC
}

/// Assembles a pack from in-memory files.
///
/// # Example
///
/// ```rust
/// use lattice_storage::{Compression, PackBuilder};
///
/// let bytes = PackBuilder::new()
///     .compression(Compression::Lz4)
///     .file("project.binary", b"ECFG".to_vec())
///     .to_bytes()
///     .unwrap();
/// assert_eq!(&bytes[..4], b"LPCK");
/// ```
#[derive(Debug, Default)]
pub struct PackBuilder {
    compression: Compression,
    files: Vec<(String, Vec<u8>)>,
}

impl PackBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use = "Sets compression for every entry added to the pack"]
    pub fn compression(mut self, compression: Compression) -> Self {
        self.compression = compression;
        self
    }

    /// Adds a file; `path` is relative to the pack root (a `res://` prefix is accepted).
    #[must_use = "The pack is not written until you call .write() or .to_bytes()"]
    pub fn file(mut self, path: impl AsRef<str>, data: impl Into<Vec<u8>>) -> Self {
        let path = path.as_ref();
        let path = path.strip_prefix("res://").unwrap_or(path);
        self.files.push((path.to_owned(), data.into()));
        self
    }

    /// Serializes the pack.
    ///
    /// # Errors
    /// Returns [`StorageError::PathTraversalAttempt`] if an entry path escapes the pack root.
    pub fn to_bytes(&self) -> Result<Vec<u8>, StorageError> {
        let mut names = Vec::with_capacity(self.files.len());
        for (name, _) in &self.files {
            names.push(security::pack_key(name)?);
        }
        let blobs: Vec<Vec<u8>> =
            self.files.iter().map(|(_, data)| self.compression.compress(data)).collect();

        let index_len: usize = names.iter().map(|n| n.len() + ENTRY_FIXED_LEN).sum();
        let mut offset = HEADER_LEN + index_len as u64;

        let payload: usize = blobs.iter().map(Vec::len).sum();
        let mut out = Vec::with_capacity(to_usize(offset)? + payload);
        out.extend_from_slice(&PACK_MAGIC);
        out.extend_from_slice(&PACK_FORMAT_VERSION.to_le_bytes());
        out.extend_from_slice(&len_u32(names.len())?.to_le_bytes());

        for ((name, blob), (_, data)) in names.iter().zip(&blobs).zip(&self.files) {
            out.extend_from_slice(&len_u32(name.len())?.to_le_bytes());
            out.extend_from_slice(name.as_bytes());
            out.extend_from_slice(&offset.to_le_bytes());
            out.extend_from_slice(&(blob.len() as u64).to_le_bytes());
            out.extend_from_slice(&(data.len() as u64).to_le_bytes());
            out.extend_from_slice(&self.compression.flags().to_le_bytes());
            offset += blob.len() as u64;
        }
        for blob in &blobs {
            out.extend_from_slice(blob);
        }

        Ok(out)
    }

    /// Writes the pack as a standalone file.
    ///
    /// # Errors
    /// Returns [`StorageError::Io`] if the destination cannot be written.
    pub fn write(&self, path: impl AsRef<Path>) -> Result<(), StorageError> {
        let path = path.as_ref();
        let bytes = self.to_bytes()?;
        std::fs::write(path, bytes).context(format!("Failed to write pack {}", path.display()))
    }

    /// Appends the pack and a locating footer to an existing file (usually an executable).
    ///
    /// # Errors
    /// Returns [`StorageError::Io`] if the host file cannot be opened for appending.
    pub fn append_to(&self, path: impl AsRef<Path>) -> Result<(), StorageError> {
        let path = path.as_ref();
        let bytes = self.to_bytes()?;
        let mut file = OpenOptions::new()
            .append(true)
            .open(path)
            .context(format!("Failed to open pack host {}", path.display()))?;
        file.write_all(&bytes).context("Pack append failed")?;
        file.write_all(&(bytes.len() as u64).to_le_bytes()).context("Pack footer failed")?;
        file.write_all(&PACK_MAGIC).context("Pack footer failed")?;
        file.sync_all().context("Hardware sync failed")?;
        Ok(())
    }
}

fn read_u32(reader: &mut impl Read) -> std::io::Result<u32> {
    let mut buf = [0u8; 4];
    reader.read_exact(&mut buf)?;
    Ok(u32::from_le_bytes(buf))
}

fn read_u64(reader: &mut impl Read) -> std::io::Result<u64> {
    let mut buf = [0u8; 8];
    reader.read_exact(&mut buf)?;
    Ok(u64::from_le_bytes(buf))
}

fn to_usize(value: u64) -> Result<usize, StorageError> {
    usize::try_from(value).map_err(|_| StorageError::InvalidPack {
        message: format!("length {value} does not fit in memory").into(),
        context: None,
    })
}

fn len_u32(len: usize) -> Result<u32, StorageError> {
    u32::try_from(len).map_err(|_| StorageError::InvalidPack {
        message: format!("length {len} exceeds the pack format limit").into(),
        context: None,
    })
}

fn invalid(path: &Path, message: impl Into<std::borrow::Cow<'static, str>>) -> StorageError {
    StorageError::InvalidPack {
        message: message.into(),
        context: Some(path.display().to_string().into()),
    }
}
