use std::collections::{BTreeMap, HashMap};
use crate::collection::document::DOCNO;
use crate::core::error::{Error, ErrorKind, Result};
use crate::core::types::DocId;
use crate::storage::layout::IndexLayout;
use crate::storage::record_file::{RecordFileReader, RecordFileWriter};

type MetaRecord = BTreeMap<String, String>;

/// Writes the configured metadata keys of each document, in docid order
pub struct MetaIndexWriter {
    keys: Vec<String>,
    writer: RecordFileWriter<MetaRecord>,
}

impl MetaIndexWriter {
    pub fn create(layout: &IndexLayout, keys: &[String]) -> Result<Self> {
        Ok(MetaIndexWriter {
            keys: keys.to_vec(),
            writer: RecordFileWriter::create(&layout.meta_path(), "meta index")?,
        })
    }

    /// Missing keys are stored as empty strings so every record has every key
    pub fn write(&mut self, properties: &BTreeMap<String, String>) -> Result<()> {
        let record: MetaRecord = self.keys.iter()
            .map(|key| (key.clone(), properties.get(key).cloned().unwrap_or_default()))
            .collect();
        self.writer.write(&record)
    }

    pub fn finish(self) -> Result<u64> {
        self.writer.finish()
    }
}

/// Metadata loaded in memory with a docno -> docid lookup
#[derive(Debug, Clone, Default)]
pub struct MetaIndex {
    records: Vec<MetaRecord>,
    by_docno: HashMap<String, DocId>,
}

impl MetaIndex {
    pub fn open(layout: &IndexLayout) -> Result<Self> {
        let reader: RecordFileReader<MetaRecord> = RecordFileReader::open(&layout.meta_path(), "meta index")?;
        let records = reader.read_all()?;

        let mut by_docno = HashMap::new();
        for (i, record) in records.iter().enumerate() {
            if let Some(docno) = record.get(DOCNO).filter(|d| !d.is_empty()) {
                by_docno.insert(docno.clone(), DocId(i as u32));
            }
        }

        Ok(MetaIndex { records, by_docno })
    }

    pub fn get(&self, docid: DocId) -> Result<&BTreeMap<String, String>> {
        self.records.get(docid.value() as usize).ok_or_else(|| {
            Error::new(ErrorKind::NotFound, format!("document {} not in the meta index", docid))
        })
    }

    pub fn docid(&self, docno: &str) -> Option<DocId> {
        self.by_docno.get(docno).copied()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
