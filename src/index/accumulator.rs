use std::collections::HashMap;
use crate::core::error::{Error, ErrorKind, Result};
use crate::core::types::FieldSet;
use crate::index::lexicon::TermIds;
use crate::index::posting::{Posting, PostingLayout};

/// Which statistics a document accumulator keeps, from the two index flags
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostingMode {
    Basic,
    Fields { field_count: usize },
    Blocks,
    BlockFields { field_count: usize },
}

impl PostingMode {
    pub fn new(field_count: usize, blocks: bool) -> Self {
        match (field_count, blocks) {
            (0, false) => PostingMode::Basic,
            (0, true) => PostingMode::Blocks,
            (field_count, false) => PostingMode::Fields { field_count },
            (field_count, true) => PostingMode::BlockFields { field_count },
        }
    }

    pub fn from_layout(layout: &PostingLayout) -> Self {
        PostingMode::new(layout.field_count, layout.blocks)
    }

    pub fn layout(&self) -> PostingLayout {
        match *self {
            PostingMode::Basic => PostingLayout::new(0, false),
            PostingMode::Fields { field_count } => PostingLayout::new(field_count, false),
            PostingMode::Blocks => PostingLayout::new(0, true),
            PostingMode::BlockFields { field_count } => PostingLayout::new(field_count, true),
        }
    }

    pub fn field_count(&self) -> usize {
        self.layout().field_count
    }
}

/// Statistics of one term within the current document
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TermOccurrence {
    pub tf: u32,
    pub field_tfs: Vec<u32>,
    pub blocks: Vec<u32>,     // distinct, ascending
}

impl TermOccurrence {
    fn new(mode: PostingMode) -> Self {
        TermOccurrence {
            tf: 0,
            field_tfs: vec![0; mode.field_count()],
            blocks: Vec::new(),
        }
    }

    fn add_fields(&mut self, fields: FieldSet) {
        for index in fields.iter() {
            if let Some(tf) = self.field_tfs.get_mut(index) {
                *tf += 1;
            }
        }
    }

    fn add_block(&mut self, block: u32) {
        // block ids arrive non-decreasing within a document
        match self.blocks.last() {
            Some(&last) if last == block => {}
            Some(&last) if last > block => {
                if let Err(pos) = self.blocks.binary_search(&block) {
                    self.blocks.insert(pos, block);
                }
            }
            _ => self.blocks.push(block),
        }
    }
}

/// Term -> posting map of the document being indexed
#[derive(Debug, Clone)]
pub struct DocumentPostings {
    pub mode: PostingMode,
    slots: HashMap<String, usize>,
    terms: Vec<(String, TermOccurrence)>,   // first-occurrence order
    length: u32,
}

impl DocumentPostings {
    pub fn new(mode: PostingMode) -> Self {
        DocumentPostings {
            mode,
            slots: HashMap::new(),
            terms: Vec::new(),
            length: 0,
        }
    }

    /// Add one occurrence of `term`; a filtered (`None`) term is ignored.
    ///
    /// `fields` is only read by field-carrying modes and `block` only by
    /// block-carrying modes.
    pub fn insert(&mut self, term: Option<&str>, fields: FieldSet, block: u32) {
        let Some(term) = term else {
            return;
        };
        self.length += 1;

        let mode = self.mode;
        let slot = match self.slots.get(term) {
            Some(&slot) => slot,
            None => {
                let slot = self.terms.len();
                self.slots.insert(term.to_string(), slot);
                self.terms.push((term.to_string(), TermOccurrence::new(mode)));
                slot
            }
        };
        let occurrence = &mut self.terms[slot].1;
        occurrence.tf += 1;

        match mode {
            PostingMode::Basic => {}
            PostingMode::Fields { .. } => occurrence.add_fields(fields),
            PostingMode::Blocks => occurrence.add_block(block),
            PostingMode::BlockFields { .. } => {
                occurrence.add_fields(fields);
                occurrence.add_block(block);
            }
        }
    }

    /// Plain insert for modes without fields or blocks
    pub fn insert_term(&mut self, term: &str) {
        self.insert(Some(term), FieldSet::empty(), 0);
    }

    /// Count a token towards the document length without indexing it
    pub fn count_token(&mut self) {
        self.length += 1;
    }

    pub fn length(&self) -> u32 {
        self.length
    }

    pub fn distinct_terms(&self) -> u32 {
        self.terms.len() as u32
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    pub fn get(&self, term: &str) -> Option<&TermOccurrence> {
        self.slots.get(term).map(|&slot| &self.terms[slot].1)
    }

    /// Terms in the order they first occurred
    pub fn terms(&self) -> impl Iterator<Item = (&str, &TermOccurrence)> {
        self.terms.iter().map(|(term, occurrence)| (term.as_str(), occurrence))
    }

    /// Direct-file postings (entity = term id), sorted by term id
    pub fn postings(&self, term_ids: &TermIds) -> Result<Vec<Posting>> {
        let mut postings = Vec::with_capacity(self.terms.len());
        for (term, occurrence) in &self.terms {
            let term_id = term_ids.get(term).ok_or_else(|| {
                Error::new(ErrorKind::InvalidState, format!("term '{}' has no term id yet", term))
            })?;
            postings.push(Posting {
                id: term_id.value(),
                tf: occurrence.tf,
                field_tfs: occurrence.field_tfs.clone(),
                blocks: occurrence.blocks.clone(),
            });
        }
        postings.sort_unstable_by_key(|p| p.id);
        Ok(postings)
    }

    /// Forget the current document, keeping allocations
    pub fn reset(&mut self) {
        self.slots.clear();
        self.terms.clear();
        self.length = 0;
    }
}
