mod common;

use inverta::builder::batch::TermBatch;
use inverta::builder::indexer::Indexer;
use inverta::builder::scanning::{LexiconScanner, ScannerRegistry};
use inverta::collection::memory::InMemoryCollection;
use inverta::core::config::{IndexerConfig, ScanningStrategy};
use inverta::core::error::{ErrorKind, Result};
use inverta::index::lexicon::LexiconRecord;
use inverta::index::posting::PostingLayout;
use inverta::index::reader::Index;
use inverta::storage::layout::IndexLayout;

/// Takes `threshold` terms on the first call, then selects nothing
/// (an empty batch, or `None` when `claims_exhausted`)
struct FirstBatchOnly {
    threshold: u64,
    calls: u32,
    claims_exhausted: bool,
}

impl LexiconScanner for FirstBatchOnly {
    fn select(
        &mut self,
        lexicon: &mut dyn Iterator<Item = Result<LexiconRecord>>,
        layout: &PostingLayout,
    ) -> Result<Option<TermBatch>> {
        self.calls += 1;
        if self.calls > 1 && self.claims_exhausted {
            return Ok(None);
        }
        let mut batch = TermBatch::new(*layout);
        if self.calls == 1 {
            for record in lexicon.take(self.threshold as usize) {
                batch.push(record?);
            }
        }
        Ok(Some(batch))
    }

    fn name(&self) -> &str {
        "first-batch-only"
    }
}

fn build(dir: &std::path::Path, scanner: &str, threshold: u64) -> (inverta::IndexReport, Index) {
    common::init_logging();
    let mut registry = ScannerRegistry::with_builtins();
    registry.register("first", |threshold| {
        Box::new(FirstBatchOnly { threshold, calls: 0, claims_exhausted: false })
    });
    registry.register("first-then-none", |threshold| {
        Box::new(FirstBatchOnly { threshold, calls: 0, claims_exhausted: true })
    });

    let config = IndexerConfig {
        scanning: ScanningStrategy::Custom { name: scanner.to_string(), threshold },
        ..common::config(dir)
    };
    let mut collection = InMemoryCollection::from_texts(&["a b", "c d", "b e"]);
    let report = Indexer::new(config.clone()).unwrap()
        .with_registry(registry)
        .index(&mut collection)
        .unwrap();
    let index = Index::open(&IndexLayout::new(dir, &config.prefix).unwrap()).unwrap();
    (report, index)
}

#[test]
fn test_empty_batch_is_reported_and_stops_the_loop() {
    let dir = tempfile::tempdir().unwrap();
    let (report, index) = build(dir.path(), "first", 2);

    assert_eq!(report.inverted.batches, 1);
    assert_eq!(report.inverted.premature_exhaustions, 1);
    assert_eq!(report.inverted.totals.terms, 2);
    assert!(!index.properties.inverted_built);

    // nothing read the inverted file, so it is not opened
    assert_eq!(index.inverted_postings("a").unwrap_err().kind, ErrorKind::InvalidState);
    let pointered: Vec<_> = index.lexicon_entries().filter(|(_, e)| e.pointer.is_some()).map(|(t, _)| t).collect();
    assert_eq!(pointered, vec!["a", "b"]);
    assert_eq!(index.properties.num_terms, 5);
}

#[test]
fn test_empty_batch_after_last_term_is_not_premature() {
    let dir = tempfile::tempdir().unwrap();
    let (report, index) = build(dir.path(), "first", 100);

    assert_eq!(report.inverted.batches, 1);
    assert_eq!(report.inverted.premature_exhaustions, 0);
    assert!(index.properties.inverted_built);
    assert_eq!(index.inverted_postings("b").unwrap().len(), 2);
}

#[test]
fn test_none_before_last_term_is_premature() {
    let dir = tempfile::tempdir().unwrap();
    let (report, index) = build(dir.path(), "first-then-none", 1);

    assert_eq!(report.inverted.batches, 1);
    assert_eq!(report.inverted.premature_exhaustions, 1);
    assert!(!index.properties.inverted_built);
    assert_eq!(index.properties.num_terms, 5);

    // the lexicon still resolves every term, only "a" carries a pointer
    assert_eq!(index.lexicon_entries().count(), 5);
    assert!(index.lexicon_entry("a").unwrap().pointer.is_some());
    assert!(index.lexicon_entry("e").unwrap().pointer.is_none());
}

#[test]
fn test_none_after_last_term_is_not_premature() {
    let dir = tempfile::tempdir().unwrap();
    let (report, index) = build(dir.path(), "first-then-none", 100);

    assert_eq!(report.inverted.premature_exhaustions, 0);
    assert!(index.properties.inverted_built);
    assert_eq!(index.inverted_postings("e").unwrap().len(), 1);
}
