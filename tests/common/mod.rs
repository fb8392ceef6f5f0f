#![allow(dead_code)]

use std::collections::HashMap;
use std::path::Path;
use inverta::builder::indexer::{IndexReport, Indexer};
use inverta::collection::memory::InMemoryCollection;
use inverta::core::config::{IndexerConfig, ScanningStrategy};
use inverta::index::posting::Posting;
use inverta::index::reader::Index;
use inverta::storage::layout::IndexLayout;

/// Raw terms, one batch per call of the scanner, no term pipeline
pub fn config(dir: &Path) -> IndexerConfig {
    IndexerConfig {
        index_dir: dir.to_path_buf(),
        pipeline: Vec::new(),
        scanning: ScanningStrategy::Terms { terms: 1_000 },
        ..IndexerConfig::default()
    }
}

pub fn build(config: &IndexerConfig, texts: &[&str]) -> (IndexReport, Index) {
    let mut collection = InMemoryCollection::from_texts(texts);
    let report = Indexer::new(config.clone()).unwrap().index(&mut collection).unwrap();
    let layout = IndexLayout::new(&config.index_dir, &config.prefix).unwrap();
    (report, Index::open(&layout).unwrap())
}

pub fn term_names(index: &Index) -> HashMap<u32, String> {
    index.lexicon_entries()
        .map(|(term, entry)| (entry.term_id.value(), term.to_string()))
        .collect()
}

/// term -> (docid, tf) pairs from the inverted file
pub fn inverted_pairs(index: &Index) -> HashMap<String, Vec<(u32, u32)>> {
    index.lexicon_entries()
        .map(|(term, _)| {
            let pairs = index.inverted_postings(term).unwrap().iter().map(|p| (p.id, p.tf)).collect();
            (term.to_string(), pairs)
        })
        .collect()
}

pub fn ids_and_tfs(postings: &[Posting]) -> Vec<(u32, u32)> {
    postings.iter().map(|p| (p.id, p.tf)).collect()
}

/// Print builder logs when a test runs with --nocapture
pub fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}
