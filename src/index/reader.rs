use std::collections::BTreeMap;
use std::fs::File;
use fst::Map;
use memmap2::Mmap;
use crate::core::error::{Error, ErrorKind, Result};
use crate::core::types::DocId;
use crate::index::document_index::{DocumentEntry, DocumentIndex};
use crate::index::lexicon::{open_lexicon, LexiconEntry, LexiconRecord};
use crate::index::meta_index::MetaIndex;
use crate::index::posting::Posting;
use crate::index::properties::IndexProperties;
use crate::storage::layout::IndexLayout;
use crate::storage::posting_file::PostingFileReader;

/// Read-only view over a built index
pub struct Index {
    pub layout: IndexLayout,
    pub properties: IndexProperties,
    pub documents: DocumentIndex,
    pub meta: MetaIndex,
    lexicon: Vec<LexiconRecord>,
    terms: Option<Map<Mmap>>,    // term -> lexicon ordinal, once optimised
    direct: PostingFileReader,
    inverted: Option<PostingFileReader>,
}

impl Index {
    pub fn open(layout: &IndexLayout) -> Result<Self> {
        let properties = IndexProperties::load(layout)?;
        let posting_layout = properties.posting_layout;

        let fst_path = layout.lexicon_fst_path();
        let terms = if fst_path.exists() {
            let file = File::open(&fst_path).map_err(|e| Error::io_context("lexicon fst", &fst_path, e))?;
            let mmap = unsafe { Mmap::map(&file) }.map_err(|e| Error::io_context("lexicon fst", &fst_path, e))?;
            Some(Map::new(mmap)?)
        } else {
            None
        };

        let inverted = if properties.inverted_built {
            Some(PostingFileReader::open(&layout.inverted_path(), "inverted index", posting_layout)?)
        } else {
            None
        };

        Ok(Index {
            layout: layout.clone(),
            documents: DocumentIndex::open(layout)?,
            meta: MetaIndex::open(layout)?,
            lexicon: open_lexicon(layout)?.read_all()?,
            terms,
            direct: PostingFileReader::open(&layout.direct_path(), "direct index", posting_layout)?,
            inverted,
            properties,
        })
    }

    pub fn lexicon_entry(&self, term: &str) -> Option<&LexiconEntry> {
        let ordinal = match &self.terms {
            Some(map) => map.get(term)? as usize,
            None => self.lexicon.binary_search_by(|r| r.term.as_str().cmp(term)).ok()?,
        };
        self.lexicon.get(ordinal).map(|r| &r.entry)
    }

    /// Every term in lexical order
    pub fn lexicon_entries(&self) -> impl Iterator<Item = (&str, &LexiconEntry)> {
        self.lexicon.iter().map(|r| (r.term.as_str(), &r.entry))
    }

    pub fn num_terms(&self) -> usize {
        self.lexicon.len()
    }

    pub fn num_documents(&self) -> usize {
        self.documents.len()
    }

    pub fn document_entry(&self, docid: DocId) -> Result<&DocumentEntry> {
        self.documents.get(docid)
    }

    /// Postings of one document, entity = term id; empty for empty documents
    pub fn direct_postings(&self, docid: DocId) -> Result<Vec<Posting>> {
        match self.documents.get(docid)?.pointer {
            Some(pointer) => self.direct.read_postings(&pointer),
            None => Ok(Vec::new()),
        }
    }

    /// Postings of one term, entity = docid
    pub fn inverted_postings(&self, term: &str) -> Result<Vec<Posting>> {
        let inverted = self.inverted.as_ref().ok_or_else(|| {
            Error::new(ErrorKind::InvalidState, format!("index '{}' has no inverted file", self.layout.prefix))
        })?;
        let entry = self.lexicon_entry(term).ok_or_else(|| {
            Error::new(ErrorKind::NotFound, format!("term '{}' not in the lexicon", term))
        })?;
        let pointer = entry.pointer.ok_or_else(|| {
            Error::new(ErrorKind::InvalidState, format!("term '{}' has no inverted pointer", term))
        })?;
        inverted.read_postings(&pointer)
    }

    pub fn metadata(&self, docid: DocId) -> Result<&BTreeMap<String, String>> {
        self.meta.get(docid)
    }

    pub fn docid(&self, docno: &str) -> Option<DocId> {
        self.meta.docid(docno)
    }
}
