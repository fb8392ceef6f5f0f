use std::collections::HashMap;
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::PathBuf;
use fst::MapBuilder;
use serde::{Serialize, Deserialize};
use tracing::{debug, info};
use crate::core::error::{Error, ErrorKind, Result};
use crate::core::types::TermId;
use crate::index::accumulator::{DocumentPostings, TermOccurrence};
use crate::index::lexicon_merge::merge_sorted_runs;
use crate::index::posting::{PostingLayout, PostingPointer};
use crate::storage::layout::IndexLayout;
use crate::storage::record_file::{RecordFileReader, RecordFileWriter};

/// Term statistics accumulated over the collection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LexiconEntry {
    pub term_id: TermId,
    pub doc_freq: u32,          // documents containing the term
    pub term_freq: u64,         // total occurrences
    pub block_freq: u64,        // total block occurrences, 0 without blocks
    pub field_freqs: Vec<u64>,  // per-field occurrences, empty without fields
    pub pointer: Option<PostingPointer>,    // set once the inverted file is written
}

impl LexiconEntry {
    pub fn new(term_id: TermId, field_count: usize) -> Self {
        LexiconEntry {
            term_id,
            doc_freq: 0,
            term_freq: 0,
            block_freq: 0,
            field_freqs: vec![0; field_count],
            pointer: None,
        }
    }

    /// Fold in one document's occurrence of the term
    pub fn add_occurrence(&mut self, occurrence: &TermOccurrence) {
        self.doc_freq += 1;
        self.term_freq += occurrence.tf as u64;
        self.block_freq += occurrence.blocks.len() as u64;
        for (total, tf) in self.field_freqs.iter_mut().zip(&occurrence.field_tfs) {
            *total += *tf as u64;
        }
        debug_assert!(self.doc_freq as u64 <= self.term_freq);
    }

    /// Fold in statistics of the same term gathered elsewhere (run or shard)
    pub fn merge_stats(&mut self, other: &LexiconEntry) -> Result<()> {
        if self.field_freqs.len() != other.field_freqs.len() {
            return Err(Error::new(
                ErrorKind::InvalidInput,
                format!("cannot merge lexicon entries with {} and {} fields", self.field_freqs.len(), other.field_freqs.len()),
            ));
        }
        self.doc_freq += other.doc_freq;
        self.term_freq += other.term_freq;
        self.block_freq += other.block_freq;
        for (total, freq) in self.field_freqs.iter_mut().zip(&other.field_freqs) {
            *total += *freq;
        }
        Ok(())
    }
}

/// One lexicon file record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LexiconRecord {
    pub term: String,
    pub entry: LexiconEntry,
}

/// Lexicon file streamed in lexical term order
pub type LexiconStream = RecordFileReader<LexiconRecord>;

pub fn open_lexicon(layout: &IndexLayout) -> Result<LexiconStream> {
    RecordFileReader::open(&layout.lexicon_path(), "lexicon")
}

/// Term -> id map; ids are dense and handed out in first-seen order
#[derive(Debug, Clone, Default)]
pub struct TermIds {
    ids: HashMap<String, TermId>,
}

impl TermIds {
    pub fn new() -> Self {
        TermIds {
            ids: HashMap::new(),
        }
    }

    pub fn get(&self, term: &str) -> Option<TermId> {
        self.ids.get(term).copied()
    }

    pub fn get_or_assign(&mut self, term: &str) -> TermId {
        if let Some(id) = self.ids.get(term) {
            return *id;
        }
        let id = TermId(self.ids.len() as u32);
        self.ids.insert(term.to_string(), id);
        id
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

/// Global term dictionary built during the direct pass.
///
/// Term ids live in memory for the whole run; statistics are spilled as
/// lexically sorted runs every `flush_interval` documents and merged by
/// `finished_direct_index_build`.
pub struct LexiconBuilder {
    pub layout: IndexLayout,
    pub posting_layout: PostingLayout,
    term_ids: TermIds,
    pending: HashMap<String, LexiconEntry>,
    runs: Vec<PathBuf>,
    documents_since_flush: usize,
    flush_interval: usize,
}

impl LexiconBuilder {
    pub fn new(layout: IndexLayout, posting_layout: PostingLayout, flush_interval: usize) -> Self {
        LexiconBuilder {
            layout,
            posting_layout,
            term_ids: TermIds::new(),
            pending: HashMap::new(),
            runs: Vec::new(),
            documents_since_flush: 0,
            flush_interval: flush_interval.max(1),
        }
    }

    pub fn term_ids(&self) -> &TermIds {
        &self.term_ids
    }

    pub fn unique_terms(&self) -> usize {
        self.term_ids.len()
    }

    /// Resolve ids for every term of the document, creating missing ones
    pub fn assign_term_ids(&mut self, document: &DocumentPostings) {
        for (term, _) in document.terms() {
            self.term_ids.get_or_assign(term);
        }
    }

    /// Merge one document's statistics: tf totals, +1 document frequency per term
    pub fn add_document_terms(&mut self, document: &DocumentPostings) -> Result<()> {
        let field_count = self.posting_layout.field_count;
        for (term, occurrence) in document.terms() {
            let term_id = self.term_ids.get_or_assign(term);
            match self.pending.get_mut(term) {
                Some(entry) => entry.add_occurrence(occurrence),
                None => {
                    let mut entry = LexiconEntry::new(term_id, field_count);
                    entry.add_occurrence(occurrence);
                    self.pending.insert(term.to_string(), entry);
                }
            }
        }

        self.documents_since_flush += 1;
        if self.documents_since_flush >= self.flush_interval {
            self.flush_run()?;
        }
        Ok(())
    }

    /// Spill pending statistics as a sorted run
    fn flush_run(&mut self) -> Result<()> {
        self.documents_since_flush = 0;
        if self.pending.is_empty() {
            return Ok(());
        }

        let path = self.layout.lexicon_run_path(self.runs.len());
        let mut records: Vec<(String, LexiconEntry)> = self.pending.drain().collect();
        records.sort_unstable_by(|a, b| a.0.cmp(&b.0));

        let mut writer = RecordFileWriter::create(&path, "lexicon run")?;
        for (term, entry) in records {
            writer.write(&LexiconRecord { term, entry })?;
        }
        let count = writer.finish()?;
        debug!(structure = "lexicon", run = self.runs.len(), terms = count, "flushed lexicon run");

        self.runs.push(path);
        Ok(())
    }

    /// Merge all runs into the lexically sorted lexicon file; returns the unique term count
    pub fn finished_direct_index_build(mut self) -> Result<u32> {
        self.flush_run()?;

        let mut inputs = Vec::with_capacity(self.runs.len());
        for path in &self.runs {
            inputs.push(RecordFileReader::open(path, "lexicon run")?);
        }

        let lexicon_path = self.layout.lexicon_path();
        let mut writer = RecordFileWriter::create(&lexicon_path, "lexicon")?;
        let terms = merge_sorted_runs(inputs, &mut writer)?;
        writer.finish()?;

        for path in &self.runs {
            fs::remove_file(path).map_err(|e| Error::io_context("lexicon run", path, e))?;
        }

        if terms != self.term_ids.len() as u64 {
            return Err(Error::new(
                ErrorKind::Internal,
                format!("lexicon has {} terms but {} term ids were assigned", terms, self.term_ids.len()),
            ));
        }

        info!(structure = "lexicon", terms, runs = self.runs.len(), "lexicon finished");
        Ok(terms as u32)
    }

    /// Compact the finished lexicon for lookups: writes the term -> ordinal FST.
    ///
    /// Fails if the lexicon is not strictly sorted or, when `require_pointers`,
    /// if any entry still lacks its inverted-file pointer.
    pub fn optimise(layout: &IndexLayout, require_pointers: bool) -> Result<u64> {
        let fst_path = layout.lexicon_fst_path();
        let file = File::create(&fst_path).map_err(|e| Error::io_context("lexicon fst", &fst_path, e))?;
        let mut builder = MapBuilder::new(BufWriter::new(file))?;

        let mut previous: Option<String> = None;
        let mut ordinal = 0u64;
        for record in open_lexicon(layout)? {
            let record = record?;
            if previous.as_deref().is_some_and(|p| p >= record.term.as_str()) {
                return Err(Error::new(
                    ErrorKind::Corrupt,
                    format!("lexicon not sorted at term '{}'", record.term),
                ));
            }
            if require_pointers && record.entry.pointer.is_none() {
                return Err(Error::new(
                    ErrorKind::InvalidState,
                    format!("lexicon term '{}' has no inverted pointer", record.term),
                ));
            }
            builder.insert(record.term.as_bytes(), ordinal)?;
            previous = Some(record.term);
            ordinal += 1;
        }
        builder.finish()?;

        debug!(structure = "lexicon", terms = ordinal, "lexicon optimised");
        Ok(ordinal)
    }
}
