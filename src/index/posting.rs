use serde::{Serialize, Deserialize};

/// Shape of the postings stored in an index: which optional statistics ride along
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostingLayout {
    pub field_count: usize,
    pub blocks: bool,
}

impl PostingLayout {
    pub fn new(field_count: usize, blocks: bool) -> Self {
        PostingLayout { field_count, blocks }
    }

    pub fn has_fields(&self) -> bool {
        self.field_count > 0
    }
}

/// One (document, term) association.
///
/// `id` is the term id in direct postings and the docid in inverted postings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Posting {
    pub id: u32,
    pub tf: u32,
    pub field_tfs: Vec<u32>,   // one entry per field, empty without fields
    pub blocks: Vec<u32>,      // distinct block ids, ascending; empty without blocks
}

impl Posting {
    pub fn new(id: u32, tf: u32) -> Self {
        Posting {
            id,
            tf,
            field_tfs: Vec::new(),
            blocks: Vec::new(),
        }
    }

    pub fn block_count(&self) -> u32 {
        self.blocks.len() as u32
    }
}

/// Locator of one posting list inside a posting file
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PostingPointer {
    pub offset: u64,    // byte offset of the entry from the start of the file
    pub count: u32,     // number of postings in the entry
}

impl PostingPointer {
    pub fn new(offset: u64, count: u32) -> Self {
        PostingPointer { offset, count }
    }
}
