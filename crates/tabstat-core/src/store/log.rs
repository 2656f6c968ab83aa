//! Log-structured document collection.
//!
//! Stores documents in an append-only log file with an in-memory index.
//! Rewriting a document appends a new record and moves the index entry; the
//! collection keeps the position of the document in scan order.
//!
//! ## Files
//!
//! - `documents.log` - Append-only log
//!
//! ## Record Format
//!
//! ```text
//! [Marker: 1 byte]      1 = store
//! [ID: 8 bytes LE]
//! [Len: 4 bytes LE]
//! [CRC32: 4 bytes LE]   over the JSON bytes
//! [JSON body: Len bytes]
//! ```

use indexmap::IndexMap;
use parking_lot::RwLock;
use std::fs::{File, OpenOptions};
use std::io::{BufReader, BufWriter, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use super::DocumentStore;
use crate::document::{Body, Document, DocumentId};
use crate::error::{Error, Result};
use crate::util::json::merge_into;

pub(crate) const LOG_FILE: &str = "documents.log";
const MARKER_STORE: u8 = 1;

/// Simple CRC32 implementation (IEEE 802.3 polynomial).
#[inline]
#[allow(clippy::cast_possible_truncation)] // Table index always 0-255
fn crc32_hash(data: &[u8]) -> u32 {
    const CRC32_TABLE: [u32; 256] = {
        let mut table = [0u32; 256];
        let mut i = 0;
        while i < 256 {
            let mut crc = i as u32;
            let mut j = 0;
            while j < 8 {
                if crc & 1 != 0 {
                    crc = (crc >> 1) ^ 0xEDB8_8320;
                } else {
                    crc >>= 1;
                }
                j += 1;
            }
            table[i] = crc;
            i += 1;
        }
        table
    };

    let mut crc = 0xFFFF_FFFF_u32;
    for &byte in data {
        let idx = ((crc ^ u32::from(byte)) & 0xFF) as usize;
        crc = (crc >> 8) ^ CRC32_TABLE[idx];
    }
    !crc
}

/// Collection persisted as an append-only log.
#[allow(clippy::module_name_repetitions)]
pub struct LogCollection {
    name: String,
    /// Directory holding the log
    path: PathBuf,
    /// In-memory index: ID -> offset of the length field, insertion ordered
    index: RwLock<IndexMap<u64, u64>>,
    /// Log writer (append-only)
    wal: RwLock<BufWriter<File>>,
    /// Independent file handle for reading, protected for seeking
    reader: RwLock<File>,
    next_id: AtomicU64,
}

impl LogCollection {
    /// Opens the collection stored in `path`, creating it if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory or log cannot be opened, or the log
    /// contains an unknown record marker.
    pub fn open<P: AsRef<Path>>(name: impl Into<String>, path: P) -> Result<Self> {
        let name = name.into();
        let path = path.as_ref().to_path_buf();
        std::fs::create_dir_all(&path)?;
        let log_path = path.join(LOG_FILE);

        let writer_file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_path)?;
        let wal = BufWriter::new(writer_file);

        let reader = File::open(&log_path)?;
        let log_len = reader.metadata()?.len();
        let index = Self::replay(&log_path, log_len)?;
        let next_id = index.keys().copied().max().map_or(1, |max| max + 1);

        tracing::debug!(collection = %name, documents = index.len(), "opened log collection");

        Ok(Self {
            name,
            path,
            index: RwLock::new(index),
            wal: RwLock::new(wal),
            reader: RwLock::new(reader),
            next_id: AtomicU64::new(next_id),
        })
    }

    /// Directory holding this collection's files.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Replays the log, rebuilding the index.
    ///
    /// A record cut short at the end of the file (interrupted write) ends the
    /// replay; everything before it is kept.
    fn replay(log_path: &Path, end_pos: u64) -> Result<IndexMap<u64, u64>> {
        let mut index = IndexMap::new();
        let file = File::open(log_path)?;
        let mut reader = BufReader::new(file);
        let mut pos = 0u64;

        while pos < end_pos {
            let mut header = [0u8; 9];
            if reader.read_exact(&mut header).is_err() {
                break;
            }
            let marker = header[0];
            let mut id_bytes = [0u8; 8];
            id_bytes.copy_from_slice(&header[1..9]);
            let id = u64::from_le_bytes(id_bytes);
            pos += 9;

            match marker {
                MARKER_STORE => {
                    let len_offset = pos;
                    let mut len_bytes = [0u8; 4];
                    if reader.read_exact(&mut len_bytes).is_err() {
                        break;
                    }
                    let body_len = u64::from(u32::from_le_bytes(len_bytes));
                    // crc + body
                    let skip = 4 + body_len;
                    if pos + 4 + skip > end_pos {
                        tracing::warn!(
                            log = %log_path.display(),
                            offset = pos,
                            "truncated record at end of log, ignoring"
                        );
                        break;
                    }
                    let skip = i64::try_from(skip)
                        .map_err(|_| Error::Storage("record too large".to_string()))?;
                    reader.seek(SeekFrom::Current(skip))?;
                    pos += 4 + 4 + body_len;
                    index.insert(id, len_offset);
                }
                other => {
                    return Err(Error::Storage(format!(
                        "unknown record marker {other} at offset {}",
                        pos - 9
                    )));
                }
            }
        }

        Ok(index)
    }

    fn append(&self, id: u64, body: &Body) -> Result<()> {
        let bytes = serde_json::to_vec(body)?;
        let len = u32::try_from(bytes.len())
            .map_err(|_| Error::Storage("document too large".to_string()))?;

        let mut wal = self.wal.write();
        let mut index = self.index.write();

        wal.flush()?;
        let pos = wal.get_ref().metadata()?.len();

        wal.write_all(&[MARKER_STORE])?;
        wal.write_all(&id.to_le_bytes())?;
        wal.write_all(&len.to_le_bytes())?;
        wal.write_all(&crc32_hash(&bytes).to_le_bytes())?;
        wal.write_all(&bytes)?;

        // Flush so the reader handle sees the record
        wal.flush()?;

        // IndexMap::insert keeps the position of an existing key
        index.insert(id, pos + 9);
        Ok(())
    }

    fn read_at(reader: &mut File, offset: u64) -> Result<Body> {
        reader.seek(SeekFrom::Start(offset))?;

        let mut len_bytes = [0u8; 4];
        reader.read_exact(&mut len_bytes)?;
        let len = u32::from_le_bytes(len_bytes) as usize;

        let mut crc_bytes = [0u8; 4];
        reader.read_exact(&mut crc_bytes)?;
        let stored_crc = u32::from_le_bytes(crc_bytes);

        let mut bytes = vec![0u8; len];
        reader.read_exact(&mut bytes)?;

        if crc32_hash(&bytes) != stored_crc {
            return Err(Error::Storage(format!("CRC mismatch at offset {offset}")));
        }

        Ok(serde_json::from_slice(&bytes)?)
    }

    fn retrieve(&self, id: u64) -> Result<Option<Body>> {
        let Some(offset) = self.index.read().get(&id).copied() else {
            return Ok(None);
        };
        let mut reader = self.reader.write();
        Self::read_at(&mut reader, offset).map(Some)
    }

    /// Flushes buffered writes to the operating system.
    ///
    /// # Errors
    ///
    /// Returns an error if the flush fails.
    pub fn flush(&self) -> Result<()> {
        self.wal.write().flush().map_err(Error::from)
    }
}

impl DocumentStore for LogCollection {
    fn name(&self) -> &str {
        &self.name
    }

    fn scan(&self) -> Result<Vec<Document>> {
        let entries: Vec<(u64, u64)> = self.index.read().iter().map(|(&k, &v)| (k, v)).collect();
        let mut reader = self.reader.write();
        entries
            .into_iter()
            .map(|(id, offset)| {
                Self::read_at(&mut reader, offset).map(|body| Document::new(DocumentId(id), body))
            })
            .collect()
    }

    fn insert(&self, body: Body) -> Result<DocumentId> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.append(id, &body)?;
        Ok(DocumentId(id))
    }

    fn upsert_by_key(&self, id: DocumentId, patch: Body) -> Result<()> {
        let mut body = self.retrieve(id.0)?.unwrap_or_default();
        merge_into(&mut body, patch);
        self.append(id.0, &body)?;
        self.next_id.fetch_max(id.0 + 1, Ordering::Relaxed);
        Ok(())
    }

    fn count(&self) -> Result<usize> {
        Ok(self.index.read().len())
    }

    fn clear(&self) -> Result<()> {
        let mut wal = self.wal.write();
        let mut index = self.index.write();

        wal.flush()?;
        wal.get_ref().set_len(0)?;
        index.clear();
        Ok(())
    }
}

impl std::fmt::Debug for LogCollection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LogCollection")
            .field("name", &self.name)
            .field("path", &self.path)
            .field("documents", &self.index.read().len())
            .finish_non_exhaustive()
    }
}

