use std::future::Future;
use std::io::SeekFrom;
use std::ops::Range;
use std::path::{Path, PathBuf};
use std::pin::Pin;

use tokio::io::{AsyncReadExt, AsyncSeekExt};

use crate::TransferError;

/// Future returned by [`ChunkSource::read_range`].
pub type ReadFuture<'a> = Pin<Box<dyn Future<Output = Result<Vec<u8>, TransferError>> + Send + 'a>>;

// ---------------------------------------------------------------------------
// ChunkPlan
// ---------------------------------------------------------------------------

/// One chunk of the source: a 1-based part number and its byte range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkSpan {
    pub part_number: u32,
    /// Inclusive start offset.
    pub start: u64,
    /// Exclusive end offset.
    pub end: u64,
}

impl ChunkSpan {
    pub fn len(&self) -> u64 {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    pub fn range(&self) -> Range<u64> {
        self.start..self.end
    }
}

/// Splits a source of known size into fixed-size chunks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkPlan {
    file_size: u64,
    chunk_size: u64,
    total_chunks: u32,
}

impl ChunkPlan {
    /// Plans `file_size` bytes in chunks of `chunk_size`.
    ///
    /// Fails on a zero chunk size or when the part count would not fit
    /// the service's 32-bit part numbers.
    pub fn new(file_size: u64, chunk_size: u64) -> Result<Self, TransferError> {
        if chunk_size == 0 {
            return Err(TransferError::InvalidChunkSize);
        }
        let chunks = file_size.div_ceil(chunk_size);
        let total_chunks =
            u32::try_from(chunks).map_err(|_| TransferError::TooManyChunks(chunks))?;
        Ok(Self {
            file_size,
            chunk_size,
            total_chunks,
        })
    }

    pub fn file_size(&self) -> u64 {
        self.file_size
    }

    pub fn chunk_size(&self) -> u64 {
        self.chunk_size
    }

    /// `ceil(file_size / chunk_size)`; zero for an empty source.
    pub fn total_chunks(&self) -> u32 {
        self.total_chunks
    }

    /// Byte range of `part_number`, or `None` outside `1..=total_chunks`.
    pub fn span(&self, part_number: u32) -> Option<ChunkSpan> {
        if part_number == 0 || part_number > self.total_chunks {
            return None;
        }
        let start = u64::from(part_number - 1) * self.chunk_size;
        let end = (start + self.chunk_size).min(self.file_size);
        Some(ChunkSpan {
            part_number,
            start,
            end,
        })
    }

    /// Spans from `first` (1-based) through the last chunk.
    pub fn spans_from(&self, first: u32) -> impl Iterator<Item = ChunkSpan> + '_ {
        (first.max(1)..=self.total_chunks).filter_map(|n| self.span(n))
    }
}

// ---------------------------------------------------------------------------
// ChunkSource
// ---------------------------------------------------------------------------

/// Byte-addressable content with a size known up front.
pub trait ChunkSource: Send + Sync {
    /// Display name, used as the asset title by default.
    fn name(&self) -> &str;

    /// Total size in bytes.
    fn len(&self) -> u64;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Reads exactly the bytes of `range` into memory.
    fn read_range(&self, range: Range<u64>) -> ReadFuture<'_>;
}

fn check_range(range: &Range<u64>, len: u64) -> Result<(), TransferError> {
    if range.start > range.end || range.end > len {
        return Err(TransferError::ChunkOutOfRange {
            start: range.start,
            end: range.end,
            len,
        });
    }
    Ok(())
}

/// A file on disk. Each read opens, seeks and reads exactly one range.
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
    name: String,
    size: u64,
}

impl FileSource {
    /// Stats `path` and captures its current size.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, TransferError> {
        let path = path.as_ref().to_path_buf();
        let meta = tokio::fs::metadata(&path).await?;
        if !meta.is_file() {
            return Err(TransferError::Io(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("not a regular file: {}", path.display()),
            )));
        }
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.to_string_lossy().into_owned());
        Ok(Self {
            path,
            name,
            size: meta.len(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ChunkSource for FileSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn len(&self) -> u64 {
        self.size
    }

    fn read_range(&self, range: Range<u64>) -> ReadFuture<'_> {
        Box::pin(async move {
            check_range(&range, self.size)?;
            let mut file = tokio::fs::File::open(&self.path).await?;
            file.seek(SeekFrom::Start(range.start)).await?;
            let mut buf = vec![0u8; (range.end - range.start) as usize];
            file.read_exact(&mut buf).await?;
            Ok(buf)
        })
    }
}

/// In-memory content.
#[derive(Debug, Clone)]
pub struct MemorySource {
    name: String,
    data: Vec<u8>,
}

impl MemorySource {
    pub fn new(name: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            data,
        }
    }
}

impl ChunkSource for MemorySource {
    fn name(&self) -> &str {
        &self.name
    }

    fn len(&self) -> u64 {
        self.data.len() as u64
    }

    fn read_range(&self, range: Range<u64>) -> ReadFuture<'_> {
        Box::pin(async move {
            check_range(&range, self.len())?;
            Ok(self.data[range.start as usize..range.end as usize].to_vec())
        })
    }
}
