use serde::{Serialize, Deserialize};
use crate::core::error::{Error, ErrorKind, Result};
use crate::core::types::DocId;
use crate::index::posting::PostingPointer;
use crate::storage::layout::IndexLayout;
use crate::storage::record_file::{RecordFileReader, RecordFileWriter};

/// Per-document statistics, one record per docid in order
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentEntry {
    pub length: u32,            // indexed tokens
    pub distinct_terms: u32,
    pub pointer: Option<PostingPointer>,    // direct-file entry, None when empty
}

impl DocumentEntry {
    pub fn empty() -> Self {
        DocumentEntry::default()
    }

    pub fn is_empty(&self) -> bool {
        self.length == 0
    }
}

pub struct DocumentIndexWriter {
    writer: RecordFileWriter<DocumentEntry>,
}

impl DocumentIndexWriter {
    pub fn create(layout: &IndexLayout) -> Result<Self> {
        Ok(DocumentIndexWriter {
            writer: RecordFileWriter::create(&layout.document_index_path(), "document index")?,
        })
    }

    /// Append the entry of the next docid; returns that docid
    pub fn add(&mut self, entry: &DocumentEntry) -> Result<DocId> {
        let docid = DocId(self.writer.record_count() as u32);
        self.writer.write(entry)?;
        Ok(docid)
    }

    pub fn documents(&self) -> u32 {
        self.writer.record_count() as u32
    }

    pub fn finish(self) -> Result<u32> {
        Ok(self.writer.finish()? as u32)
    }
}

/// Document index loaded in memory, addressed by docid
#[derive(Debug, Clone, Default)]
pub struct DocumentIndex {
    pub entries: Vec<DocumentEntry>,
}

impl DocumentIndex {
    pub fn open(layout: &IndexLayout) -> Result<Self> {
        let reader: RecordFileReader<DocumentEntry> =
            RecordFileReader::open(&layout.document_index_path(), "document index")?;
        Ok(DocumentIndex {
            entries: reader.read_all()?,
        })
    }

    pub fn get(&self, docid: DocId) -> Result<&DocumentEntry> {
        self.entries.get(docid.value() as usize).ok_or_else(|| {
            Error::new(ErrorKind::NotFound, format!("document {} not in the document index", docid))
        })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Documents with a direct-file entry, in docid order
    pub fn with_postings(&self) -> impl Iterator<Item = (DocId, PostingPointer)> + '_ {
        self.entries.iter().enumerate().filter_map(|(i, entry)| {
            entry.pointer.map(|pointer| (DocId(i as u32), pointer))
        })
    }

    pub fn total_length(&self) -> u64 {
        self.entries.iter().map(|e| e.length as u64).sum()
    }
}
