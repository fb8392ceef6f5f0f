mod common;

use std::collections::HashMap;
use std::fs;
use proptest::prelude::*;
use inverta::core::config::{IndexerConfig, ScanningStrategy};
use inverta::core::types::DocId;
use inverta::index::reader::Index;
use inverta::storage::layout::IndexLayout;

const COLLECTION: &[&str] = &[
    "apple banana apple cherry",
    "banana banana date",
    "",
    "elder fig apple grape grape grape",
    "cherry",
    "fig fig fig fig banana",
    "",
    "honeydew apple",
];

/// Every structural property of a finished index
fn check_invariants(index: &Index) {
    let names = common::term_names(index);

    // conservation: document lengths, lexicon tf and inverted tf all agree
    let lengths: u64 = (0..index.num_documents())
        .map(|d| index.document_entry(DocId(d as u32)).unwrap().length as u64)
        .sum();
    let lexicon_tf: u64 = index.lexicon_entries().map(|(_, e)| e.term_freq).sum();
    let inverted_tf: u64 = common::inverted_pairs(index).values()
        .flat_map(|pairs| pairs.iter().map(|&(_, tf)| tf as u64))
        .sum();
    assert_eq!(lengths, lexicon_tf);
    assert_eq!(lexicon_tf, inverted_tf);

    // document frequency seen three ways
    let mut direct_df: HashMap<String, u32> = HashMap::new();
    for d in 0..index.num_documents() {
        let postings = index.direct_postings(DocId(d as u32)).unwrap();
        let ids: Vec<u32> = postings.iter().map(|p| p.id).collect();
        assert!(ids.windows(2).all(|w| w[0] < w[1]), "direct postings sorted by term id");
        for posting in &postings {
            *direct_df.entry(names[&posting.id].clone()).or_default() += 1;
        }
        let entry = index.document_entry(DocId(d as u32)).unwrap();
        assert_eq!(entry.distinct_terms as usize, postings.len());
        if entry.length == 0 {
            assert!(postings.is_empty());
        }
    }

    for (term, entry) in index.lexicon_entries() {
        let inverted = index.inverted_postings(term).unwrap();
        assert_eq!(entry.doc_freq as usize, inverted.len(), "term {}", term);
        assert_eq!(direct_df.get(term).copied().unwrap_or(0), entry.doc_freq, "term {}", term);
        assert!(entry.doc_freq as u64 <= entry.term_freq);

        let docids: Vec<u32> = inverted.iter().map(|p| p.id).collect();
        assert!(docids.windows(2).all(|w| w[0] < w[1]), "inverted docids strictly increasing");
        for docid in docids {
            assert!(!index.document_entry(DocId(docid)).unwrap().is_empty(), "empty documents have no postings");
        }
    }
}

fn with_strategy(dir: &std::path::Path, prefix: &str, scanning: ScanningStrategy) -> IndexerConfig {
    IndexerConfig {
        prefix: prefix.to_string(),
        scanning,
        ..common::config(dir)
    }
}

#[test]
fn test_invariants_hold_for_fixed_collection() {
    let dir = tempfile::tempdir().unwrap();
    let (report, index) = common::build(&common::config(dir.path()), COLLECTION);
    assert_eq!(report.direct.empty_documents, 2);
    check_invariants(&index);
}

#[test]
fn test_strategies_produce_identical_postings() {
    let dir = tempfile::tempdir().unwrap();
    let strategies = [
        ("single", ScanningStrategy::Terms { terms: u64::MAX }),
        ("one_term", ScanningStrategy::Terms { terms: 1 }),
        ("pointers", ScanningStrategy::Pointers { pointers: 3 }),
        ("memory", ScanningStrategy::Memory { heap_fraction: 1.0, processes: 1, budget_bytes: Some(400) }),
        ("memory_os", ScanningStrategy::default()),
    ];

    let mut inverted_files = Vec::new();
    let mut batches = Vec::new();
    for (prefix, scanning) in strategies {
        let config = with_strategy(dir.path(), prefix, scanning);
        let (report, index) = common::build(&config, COLLECTION);
        check_invariants(&index);
        batches.push(report.inverted.batches);
        inverted_files.push(fs::read(IndexLayout::new(dir.path(), prefix).unwrap().inverted_path()).unwrap());
    }

    assert!(inverted_files.windows(2).all(|w| w[0] == w[1]));
    assert_eq!(batches[0], 1);
    assert_eq!(batches[1], 8);     // one per unique term
    assert!(batches[2] > 1);
    assert!(batches[3] > 1);
}

#[test]
fn test_token_cap_truncates_documents() {
    let dir = tempfile::tempdir().unwrap();
    let config = IndexerConfig {
        max_tokens_per_document: 2,
        ..common::config(dir.path())
    };
    let (report, index) = common::build(&config, &["a b c d", "e"]);

    assert_eq!(report.direct.truncated_documents, 1);
    assert_eq!(index.document_entry(DocId(0)).unwrap().length, 2);
    assert!(index.lexicon_entry("c").is_none());
    check_invariants(&index);
}

fn collections() -> impl Strategy<Value = Vec<Vec<u8>>> {
    prop::collection::vec(prop::collection::vec(0u8..12, 0..15), 1..12)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn test_random_collections_keep_invariants(docs in collections(), terms in 1u64..5) {
        let texts: Vec<String> = docs.iter()
            .map(|doc| doc.iter().map(|t| format!("t{}", t)).collect::<Vec<_>>().join(" "))
            .collect();
        let texts: Vec<&str> = texts.iter().map(String::as_str).collect();

        let dir = tempfile::tempdir().unwrap();
        let batched = with_strategy(dir.path(), "batched", ScanningStrategy::Terms { terms });
        let whole = with_strategy(dir.path(), "whole", ScanningStrategy::Pointers { pointers: u64::MAX });
        let (report, index) = common::build(&batched, &texts);
        let (_, reference) = common::build(&whole, &texts);

        let total: usize = docs.iter().map(Vec::len).sum();
        prop_assert_eq!(report.direct.tokens as usize, total);
        prop_assert_eq!(report.inverted.skipped, total == 0);
        if total > 0 {
            check_invariants(&index);
            prop_assert_eq!(common::inverted_pairs(&index), common::inverted_pairs(&reference));
        }
    }
}
