use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom, Write};
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use crc32fast::Hasher;
use serde::{Serialize, Deserialize};
use serde::de::DeserializeOwned;
use crate::core::error::{Error, ErrorKind, Result};

const FLUSH_THRESHOLD: usize = 1024 * 1024;
const MAX_RECORD_LEN: usize = 64 * 1024 * 1024;

/// Record file header, written last at byte 0
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RecordFileHeader {
    pub version: u32,
    pub record_count: u64,
    pub checksum: u32,     // CRC32 of every byte after the header
}

impl RecordFileHeader {
    pub const VERSION: u32 = 1;
    pub const SIZE: usize = 16; // Fixed header size
}

// [ HEADER (version, record_count, checksum) ] <- byte 0
// [ len | RECORD 0 ]
// [ len | RECORD 1 ]
// ...
/// Append-only file of length-prefixed bincode records
pub struct RecordFileWriter<T> {
    pub path: PathBuf,
    pub structure: &'static str,
    buffer: Vec<u8>,
    file: File,
    hasher: Hasher,
    record_count: u64,
    _record: PhantomData<T>,
}

impl<T: Serialize> RecordFileWriter<T> {
    pub fn create(path: &Path, structure: &'static str) -> Result<Self> {
        let mut file = File::create(path).map_err(|e| Error::io_context(structure, path, e))?;
        // Placeholder, patched by finish()
        file.write_all(&[0u8; RecordFileHeader::SIZE])
            .map_err(|e| Error::io_context(structure, path, e))?;

        Ok(RecordFileWriter {
            path: path.to_path_buf(),
            structure,
            buffer: Vec::with_capacity(64 * 1024),
            file,
            hasher: Hasher::new(),
            record_count: 0,
            _record: PhantomData,
        })
    }

    pub fn write(&mut self, record: &T) -> Result<()> {
        let data = bincode::serialize(record)?;
        let len = data.len() as u32;
        self.buffer.extend_from_slice(&len.to_le_bytes());
        self.buffer.extend_from_slice(&data);
        self.record_count += 1;

        if self.buffer.len() > FLUSH_THRESHOLD {
            self.flush()?;
        }
        Ok(())
    }

    pub fn record_count(&self) -> u64 {
        self.record_count
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

    /// Flush, write the header and sync; returns the number of records
    pub fn finish(mut self) -> Result<u64> {
        self.flush()?;

        let header = RecordFileHeader {
            version: RecordFileHeader::VERSION,
            record_count: self.record_count,
            checksum: self.hasher.clone().finalize(),
        };
        let header_data = bincode::serialize(&header)?;

        let path = self.path.clone();
        let structure = self.structure;
        let io = |e| Error::io_context(structure, &path, e);
        self.file.seek(SeekFrom::Start(0)).map_err(io)?;
        self.file.write_all(&header_data).map_err(io)?;
        self.file.sync_all().map_err(io)?;

        Ok(self.record_count)
    }
}

/// Streaming reader; the checksum is verified once the last record is read
pub struct RecordFileReader<T> {
    pub path: PathBuf,
    pub structure: &'static str,
    pub header: RecordFileHeader,
    reader: BufReader<File>,
    hasher: Hasher,
    read: u64,
    failed: bool,
    _record: PhantomData<T>,
}

impl<T: DeserializeOwned> RecordFileReader<T> {
    pub fn open(path: &Path, structure: &'static str) -> Result<Self> {
        let file = File::open(path).map_err(|e| Error::io_context(structure, path, e))?;
        let mut reader = BufReader::new(file);

        let mut header_buf = [0u8; RecordFileHeader::SIZE];
        reader.read_exact(&mut header_buf).map_err(|e| Error::io_context(structure, path, e))?;
        let header: RecordFileHeader = bincode::deserialize(&header_buf)?;

        if header.version != RecordFileHeader::VERSION {
            return Err(Error::new(
                ErrorKind::Corrupt,
                format!("{} at {}: unsupported version {}", structure, path.display(), header.version),
            ));
        }

        Ok(RecordFileReader {
            path: path.to_path_buf(),
            structure,
            header,
            reader,
            hasher: Hasher::new(),
            read: 0,
            failed: false,
            _record: PhantomData,
        })
    }

    pub fn len(&self) -> u64 {
        self.header.record_count
    }

    pub fn is_empty(&self) -> bool {
        self.header.record_count == 0
    }

    /// Records not yet read
    pub fn remaining(&self) -> u64 {
        self.header.record_count - self.read
    }

    /// Read every remaining record into memory
    pub fn read_all(self) -> Result<Vec<T>> {
        self.collect()
    }

    fn read_record(&mut self) -> Result<T> {
        let io = |e| Error::io_context(self.structure, &self.path, e);

        let mut len_buf = [0u8; 4];
        self.reader.read_exact(&mut len_buf).map_err(io)?;
        let len = u32::from_le_bytes(len_buf) as usize;
        if len > MAX_RECORD_LEN {
            return Err(Error::new(
                ErrorKind::Corrupt,
                format!("{} at {}: record of {} bytes", self.structure, self.path.display(), len),
            ));
        }

        let mut data = vec![0u8; len];
        self.reader.read_exact(&mut data).map_err(|e| Error::io_context(self.structure, &self.path, e))?;
        self.hasher.update(&len_buf);
        self.hasher.update(&data);
        self.read += 1;

        let record = bincode::deserialize(&data)?;

        if self.read == self.header.record_count {
            let checksum = self.hasher.clone().finalize();
            if checksum != self.header.checksum {
                return Err(Error::new(
                    ErrorKind::Corrupt,
                    format!("{} at {}: checksum mismatch", self.structure, self.path.display()),
                ));
            }
        }

        Ok(record)
    }
}

impl<T: DeserializeOwned> Iterator for RecordFileReader<T> {
    type Item = Result<T>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.read >= self.header.record_count {
            return None;
        }

        let result = self.read_record();
        if result.is_err() {
            self.failed = true;
        }
        Some(result)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = (self.header.record_count - self.read) as usize;
        (remaining, Some(remaining))
    }
}
