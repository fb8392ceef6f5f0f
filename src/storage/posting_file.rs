use std::fs::File;
use std::io::{Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use crc32fast::Hasher;
use memmap2::{Mmap, MmapOptions};
use serde::{Serialize, Deserialize};
use crate::compression::codec::PostingCodec;
use crate::core::error::{Error, ErrorKind, Result};
use crate::index::posting::{Posting, PostingLayout, PostingPointer};

const FLUSH_THRESHOLD: usize = 1024 * 1024;

/// Posting file header, written last at byte 0
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PostingFileHeader {
    pub version: u32,
    pub entry_count: u64,
    pub posting_count: u64,
    pub checksum: u32,     // CRC32 of every byte after the header
}

impl PostingFileHeader {
    pub const VERSION: u32 = 1;
    pub const SIZE: usize = 24; // Fixed header size
}

// [ HEADER ] <- byte 0
// [ ENTRY 0: gap/vbyte postings ] <- pointer.offset
// [ ENTRY 1 ]
// ...
/// Append-only writer of posting lists (direct or inverted file)
pub struct PostingFileWriter {
    pub path: PathBuf,
    pub structure: &'static str,
    pub layout: PostingLayout,
    buffer: Vec<u8>,
    file: File,
    hasher: Hasher,
    offset: u64,
    entry_count: u64,
    posting_count: u64,
}

impl PostingFileWriter {
    pub fn create(path: &Path, structure: &'static str, layout: PostingLayout) -> Result<Self> {
        let mut file = File::create(path).map_err(|e| Error::io_context(structure, path, e))?;
        file.write_all(&[0u8; PostingFileHeader::SIZE])
            .map_err(|e| Error::io_context(structure, path, e))?;

        Ok(PostingFileWriter {
            path: path.to_path_buf(),
            structure,
            layout,
            buffer: Vec::with_capacity(FLUSH_THRESHOLD + 64 * 1024),
            file,
            hasher: Hasher::new(),
            offset: PostingFileHeader::SIZE as u64,
            entry_count: 0,
            posting_count: 0,
        })
    }

    /// Append one posting list, returning where it landed
    pub fn write_postings(&mut self, postings: &[Posting]) -> Result<PostingPointer> {
        let before = self.buffer.len();
        PostingCodec::encode(postings, &self.layout, &mut self.buffer)
            .map_err(|e| e.within(self.structure))?;

        let pointer = PostingPointer::new(self.offset, postings.len() as u32);
        self.offset += (self.buffer.len() - before) as u64;
        self.entry_count += 1;
        self.posting_count += postings.len() as u64;

        if self.buffer.len() > FLUSH_THRESHOLD {
            self.flush()?;
        }
        Ok(pointer)
    }

    pub fn entry_count(&self) -> u64 {
        self.entry_count
    }

    pub fn posting_count(&self) -> u64 {
        self.posting_count
    }

    fn flush(&mut self) -> Result<()> {
        if !self.buffer.is_empty() {
            self.hasher.update(&self.buffer);
            self.file.write_all(&self.buffer)
                .map_err(|e| Error::io_context(self.structure, &self.path, e))?;
            self.buffer.clear();
        }
        Ok(())
    }

    pub fn finish(mut self) -> Result<PostingFileHeader> {
        self.flush()?;

        let header = PostingFileHeader {
            version: PostingFileHeader::VERSION,
            entry_count: self.entry_count,
            posting_count: self.posting_count,
            checksum: self.hasher.clone().finalize(),
        };
        let header_data = bincode::serialize(&header)?;

        let path = self.path.clone();
        let structure = self.structure;
        let io = |e| Error::io_context(structure, &path, e);
        self.file.seek(SeekFrom::Start(0)).map_err(io)?;
        self.file.write_all(&header_data).map_err(io)?;
        self.file.sync_all().map_err(io)?;

        Ok(header)
    }
}

/// Memory-mapped reader of a finished posting file
pub struct PostingFileReader {
    pub path: PathBuf,
    pub structure: &'static str,
    pub header: PostingFileHeader,
    pub layout: PostingLayout,
    mmap: Mmap,
}

impl PostingFileReader {
    pub fn open(path: &Path, structure: &'static str, layout: PostingLayout) -> Result<Self> {
        let file = File::open(path).map_err(|e| Error::io_context(structure, path, e))?;
        let len = file.metadata().map_err(|e| Error::io_context(structure, path, e))?.len() as usize;
        if len < PostingFileHeader::SIZE {
            return Err(Error::new(
                ErrorKind::Corrupt,
                format!("{} at {}: {} bytes is shorter than the header", structure, path.display(), len),
            ));
        }

        let mmap = unsafe { MmapOptions::new().len(len).map(&file) }
            .map_err(|e| Error::io_context(structure, path, e))?;
        let header: PostingFileHeader = bincode::deserialize(&mmap[..PostingFileHeader::SIZE])?;

        if header.version != PostingFileHeader::VERSION {
            return Err(Error::new(
                ErrorKind::Corrupt,
                format!("{} at {}: unsupported version {}", structure, path.display(), header.version),
            ));
        }

        let mut hasher = Hasher::new();
        hasher.update(&mmap[PostingFileHeader::SIZE..]);
        if hasher.finalize() != header.checksum {
            return Err(Error::new(
                ErrorKind::Corrupt,
                format!("{} at {}: checksum mismatch", structure, path.display()),
            ));
        }

        Ok(PostingFileReader {
            path: path.to_path_buf(),
            structure,
            header,
            layout,
            mmap,
        })
    }

    pub fn read_postings(&self, pointer: &PostingPointer) -> Result<Vec<Posting>> {
        let start = pointer.offset as usize;
        if start < PostingFileHeader::SIZE || start > self.mmap.len() {
            return Err(Error::new(
                ErrorKind::InvalidArgument,
                format!("{} pointer offset {} outside file of {} bytes", self.structure, start, self.mmap.len()),
            ));
        }

        let (postings, _) = PostingCodec::decode(&self.mmap[start..], pointer.count, &self.layout)
            .map_err(|e| e.within(self.structure))?;
        Ok(postings)
    }
}
