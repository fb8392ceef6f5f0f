mod common;

use inverta::builder::indexer::Indexer;
use inverta::collection::memory::InMemoryCollection;
use inverta::core::config::IndexerConfig;
use inverta::core::stats::StopReason;
use inverta::core::types::{DocId, TermId};
use inverta::index::lexicon_merge::{load_lexicon, merge_lexicons};
use inverta::index::reader::Index;
use inverta::storage::layout::IndexLayout;

const TEXTS: &[&str] = &["a b", "b c", "c d", "d e", "e a"];

#[test]
fn test_document_cap_splits_collection() {
    let dir = tempfile::tempdir().unwrap();
    let config = IndexerConfig {
        max_documents_per_shard: 2,
        ..common::config(dir.path())
    };
    let mut collection = InMemoryCollection::from_texts(TEXTS);
    let shards = Indexer::new(config).unwrap().index_shards(&mut collection).unwrap();

    let prefixes: Vec<_> = shards.iter().map(|s| s.prefix.as_str()).collect();
    assert_eq!(prefixes, vec!["data", "data_1", "data_2"]);
    let documents: Vec<_> = shards.iter().map(|s| s.direct.documents).collect();
    assert_eq!(documents, vec![2, 2, 1]);
    assert_eq!(shards[0].direct.stop_reason, StopReason::DocumentCap);
    assert_eq!(shards[2].direct.stop_reason, StopReason::Exhausted);
    assert!(shards.iter().all(|s| !s.inverted.skipped));

    let base = IndexLayout::new(dir.path(), "data").unwrap();
    let second = Index::open(&base.shard(1)).unwrap();
    assert_eq!(second.docid("d2"), Some(DocId(0)));
    assert_eq!(second.inverted_postings("d").unwrap()[0].id, 0);
}

#[test]
fn test_cap_on_last_document_leaves_no_empty_shard() {
    let dir = tempfile::tempdir().unwrap();
    let config = IndexerConfig {
        max_documents_per_shard: 2,
        ..common::config(dir.path())
    };
    let mut collection = InMemoryCollection::from_texts(&TEXTS[..4]);
    let shards = Indexer::new(config).unwrap().index_shards(&mut collection).unwrap();

    assert_eq!(shards.len(), 2);
    let base = IndexLayout::new(dir.path(), "data").unwrap();
    assert!(!base.shard(2).exists());
    assert!(!base.shard(2).direct_path().exists());
}

#[test]
fn test_boundary_document_closes_shard() {
    let dir = tempfile::tempdir().unwrap();
    let config = IndexerConfig {
        boundary_documents: vec!["d1".to_string()],
        ..common::config(dir.path())
    };
    let mut collection = InMemoryCollection::from_texts(TEXTS);
    let shards = Indexer::new(config).unwrap().index_shards(&mut collection).unwrap();

    assert_eq!(shards.len(), 2);
    assert_eq!(shards[0].direct.documents, 2);
    assert_eq!(shards[0].direct.stop_reason, StopReason::Boundary("d1".to_string()));
    assert_eq!(shards[1].direct.documents, 3);
}

#[test]
fn test_single_index_stops_at_cap() {
    let dir = tempfile::tempdir().unwrap();
    let config = IndexerConfig {
        max_documents_per_shard: 3,
        ..common::config(dir.path())
    };
    let mut collection = InMemoryCollection::from_texts(TEXTS);
    let report = Indexer::new(config).unwrap().index(&mut collection).unwrap();

    assert_eq!(report.direct.documents, 3);
    assert!(report.direct.stop_reason.is_resumable());
    assert_eq!(collection.remaining(), 2);
}

#[test]
fn test_shard_lexicons_merge() {
    let dir = tempfile::tempdir().unwrap();
    let config = IndexerConfig {
        max_documents_per_shard: 3,
        ..common::config(dir.path())
    };
    let mut collection = InMemoryCollection::from_texts(TEXTS);
    Indexer::new(config).unwrap().index_shards(&mut collection).unwrap();

    let base = IndexLayout::new(dir.path(), "data").unwrap();
    let merged = IndexLayout::new(dir.path(), "merged").unwrap();
    let map = merge_lexicons(&base, &base.shard(1), &merged).unwrap();

    let lexicon = load_lexicon(&merged).unwrap();
    let terms: Vec<_> = lexicon.iter().map(|r| (r.term.as_str(), r.entry.doc_freq, r.entry.term_freq)).collect();
    assert_eq!(terms, vec![("a", 2, 2), ("b", 2, 2), ("c", 2, 2), ("d", 2, 2), ("e", 2, 2)]);
    assert!(lexicon.iter().all(|r| r.entry.pointer.is_none()));

    // shard 1 saw "d" first, then "e" (a new term for the merged lexicon)
    assert_eq!(map.map(TermId(0)).unwrap(), TermId(3));
    assert_eq!(map.map(TermId(1)).unwrap(), TermId(4));
}
