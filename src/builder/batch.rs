use std::collections::HashMap;
use crate::core::error::{Error, ErrorKind, Result};
use crate::core::stats::BatchTotals;
use crate::core::types::{DocId, TermId};
use crate::index::lexicon::LexiconRecord;
use crate::index::posting::{Posting, PostingLayout};

/// Postings collected for one term slot, struct-of-arrays
#[derive(Debug, Clone, Default)]
pub struct TermPostings {
    pub docids: Vec<u32>,
    pub tfs: Vec<u32>,
    pub field_tfs: Vec<u32>,     // field_count values per posting
    pub block_counts: Vec<u32>,
    pub blocks: Vec<u32>,        // concatenated block ids
}

impl TermPostings {
    fn with_capacity(layout: &PostingLayout, doc_freq: u32, block_freq: u64) -> Self {
        let postings = doc_freq as usize;
        let (block_counts, blocks) = if layout.blocks {
            (postings, block_freq as usize)
        } else {
            (0, 0)
        };
        TermPostings {
            docids: Vec::with_capacity(postings),
            tfs: Vec::with_capacity(postings),
            field_tfs: Vec::with_capacity(postings * layout.field_count),
            block_counts: Vec::with_capacity(block_counts),
            blocks: Vec::with_capacity(blocks),
        }
    }

    pub fn len(&self) -> usize {
        self.docids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.docids.is_empty()
    }
}

/// Terms selected for one inversion pass plus their posting arena.
///
/// Records stay in lexicon order; the arena is sized from the lexicon
/// statistics so collecting never reallocates.
pub struct TermBatch {
    pub layout: PostingLayout,
    pub records: Vec<LexiconRecord>,
    slots: HashMap<TermId, usize>,
    arena: Vec<TermPostings>,
    pointers: u64,
}

impl TermBatch {
    pub fn new(layout: PostingLayout) -> Self {
        TermBatch {
            layout,
            records: Vec::new(),
            slots: HashMap::new(),
            arena: Vec::new(),
            pointers: 0,
        }
    }

    /// Append the next lexicon entry to the batch
    pub fn push(&mut self, record: LexiconRecord) {
        let slot = self.records.len();
        self.slots.insert(record.entry.term_id, slot);
        self.arena.push(TermPostings::with_capacity(&self.layout, record.entry.doc_freq, record.entry.block_freq));
        self.pointers += record.entry.doc_freq as u64;
        self.records.push(record);
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Sum of document frequencies of the selected terms
    pub fn pointers(&self) -> u64 {
        self.pointers
    }

    pub fn slot(&self, term_id: TermId) -> Option<usize> {
        self.slots.get(&term_id).copied()
    }

    /// Add a direct posting of `docid` to the term slot; docids must arrive ascending
    pub fn add_posting(&mut self, slot: usize, docid: DocId, posting: &Posting) {
        let postings = &mut self.arena[slot];
        debug_assert!(postings.docids.last().is_none_or(|&last| last < docid.value()));
        postings.docids.push(docid.value());
        postings.tfs.push(posting.tf);
        postings.field_tfs.extend_from_slice(&posting.field_tfs);
        if self.layout.blocks {
            postings.block_counts.push(posting.block_count());
            postings.blocks.extend_from_slice(&posting.blocks);
        }
    }

    pub fn collected(&self, slot: usize) -> &TermPostings {
        &self.arena[slot]
    }

    /// Every slot must hold exactly `doc_freq` postings
    pub fn verify(&self) -> Result<()> {
        for (record, postings) in self.records.iter().zip(&self.arena) {
            if postings.len() != record.entry.doc_freq as usize {
                return Err(Error::new(
                    ErrorKind::Internal,
                    format!(
                        "term '{}' (id {}): collected {} postings, lexicon doc_freq is {}",
                        record.term, record.entry.term_id, postings.len(), record.entry.doc_freq
                    ),
                ));
            }
        }
        Ok(())
    }

    /// Rebuild the posting list of a slot (entity = docid)
    pub fn postings(&self, slot: usize) -> Vec<Posting> {
        let collected = &self.arena[slot];
        let fields = self.layout.field_count;
        let mut block_start = 0;
        let mut postings = Vec::with_capacity(collected.len());
        for i in 0..collected.len() {
            let blocks = match collected.block_counts.get(i) {
                Some(&count) => {
                    let end = block_start + count as usize;
                    let ids = collected.blocks[block_start..end].to_vec();
                    block_start = end;
                    ids
                }
                None => Vec::new(),
            };
            postings.push(Posting {
                id: collected.docids[i],
                tf: collected.tfs[i],
                field_tfs: collected.field_tfs[i * fields..(i + 1) * fields].to_vec(),
                blocks,
            });
        }
        postings
    }

    pub fn totals(&self) -> BatchTotals {
        BatchTotals {
            terms: self.records.len() as u64,
            pointers: self.arena.iter().map(|p| p.len() as u64).sum(),
            tokens: self.arena.iter().flat_map(|p| &p.tfs).map(|&tf| tf as u64).sum(),
        }
    }
}
