pub mod core;
pub mod storage;
pub mod analysis;
pub mod collection;
pub mod compression;
pub mod index;
pub mod builder;

pub use crate::builder::indexer::{IndexReport, Indexer, ShardReport};
pub use crate::core::config::IndexerConfig;
pub use crate::core::error::{Error, ErrorKind, Result};
pub use crate::index::reader::Index;

/*
┌────────────────────────────────────────────────────────────────────────────────────────────┐
│                              INVERTA BUILD ARCHITECTURE                                     │
└────────────────────────────────────────────────────────────────────────────────────────────┘

┌──────────────────────────────────── PHASE 1: DIRECT ────────────────────────────────────────┐
│                                                                                              │
│  trait Collection ──► trait Document ──► next_term() ──► TermPipeline ──► BlockAssigner      │
│   (InMemory, JsonLines)   fields(), properties()        (lowercase,        FieldMapper       │
│                                                          stopwords, stem)       │            │
│                                                                                 ▼            │
│  ┌────────────────────────────────────────────────────────────────────────────────────┐    │
│  │                         struct DirectIndexBuilder                                   │    │
│  │  DocumentPostings (PostingMode: Basic | Fields | Blocks | BlockFields)              │    │
│  │    │  assign_term_ids ──► postings(term ids) ──► PostingFileWriter  <prefix>.direct.bf │
│  │    │  add_document_terms ──► LexiconBuilder ──► sorted runs ──► <prefix>.lexicon.lex │    │
│  │    │  DocumentEntry ──► DocumentIndexWriter ──────────────────► <prefix>.document.idx│    │
│  │    └  properties ──► MetaIndexWriter ─────────────────────────► <prefix>.meta.idx    │    │
│  │  stops on: collection end | max_documents_per_shard | boundary docno                 │    │
│  └────────────────────────────────────────────────────────────────────────────────────┘    │
│                                   IndexProperties ──► <prefix>.properties.json               │
└──────────────────────────────────────────────────────────────────────────────────────────────┘

┌─────────────────────────────────── PHASE 2: INVERTED ───────────────────────────────────────┐
│                                                                                              │
│  ┌────────────────────────────────────────────────────────────────────────────────────┐    │
│  │                        struct InvertedIndexBuilder                                  │    │
│  │  loop:                                                                              │    │
│  │    LexiconScanner::select(lexicon stream) ──► TermBatch (slot map + arena)          │    │
│  │      TermCountScanner | PointerCountScanner | MemoryScanner | ScannerRegistry      │    │
│  │    scan direct file via document index ──► arena (docids ascending)                 │    │
│  │    verify collected == doc_freq ──► PostingFileWriter  <prefix>.inverted.bf.tmp     │    │
│  │    pointers ──► <prefix>.lexicon.offsets          BatchTotals folded into report    │    │
│  │  finalize: lexicon + offsets ──► lexicon.lex.tmp; rename both .tmp files in place   │    │
│  │            optimise ──► <prefix>.lexicon.fst                                        │    │
│  └────────────────────────────────────────────────────────────────────────────────────┘    │
└──────────────────────────────────────────────────────────────────────────────────────────────┘

┌──────────────────────────────────────── STORAGE ────────────────────────────────────────────┐
│  IndexLayout (dir + prefix)   RecordFileWriter/Reader<T> (bincode + CRC32 header)           │
│  PostingFileWriter/Reader (gap + VByte, mmap)   FileLock (flock)   Index (read side)        │
│  Indexer: phase 1 per shard (prefix, prefix_1, ...) ──► rayon ──► phase 2 per shard         │
└──────────────────────────────────────────────────────────────────────────────────────────────┘
*/
