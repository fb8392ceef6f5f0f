mod common;

use inverta::core::types::DocId;
use inverta::index::posting::Posting;

#[test]
fn test_three_document_collection() {
    let dir = tempfile::tempdir().unwrap();
    let config = common::config(dir.path());
    let (report, index) = common::build(&config, &["a b a", "b c", ""]);

    assert_eq!(report.direct.documents, 3);
    assert_eq!(report.direct.empty_documents, 1);
    assert_eq!(report.direct.tokens, 5);
    assert_eq!(report.direct.pointers, 4);
    assert_eq!(report.direct.unique_terms, 3);
    assert_eq!(report.inverted.batches, 1);
    assert_eq!(report.inverted.totals.pointers, 4);
    assert_eq!(report.inverted.totals.tokens, 5);

    // lexicon: term, id (first seen), df, tf
    let lexicon: Vec<_> = index.lexicon_entries()
        .map(|(term, e)| (term, e.term_id.value(), e.doc_freq, e.term_freq))
        .collect();
    assert_eq!(lexicon, vec![("a", 0, 1, 2), ("b", 1, 2, 2), ("c", 2, 1, 1)]);

    let lengths: Vec<_> = (0..3)
        .map(|d| {
            let entry = index.document_entry(DocId(d)).unwrap();
            (entry.length, entry.distinct_terms)
        })
        .collect();
    assert_eq!(lengths, vec![(3, 2), (2, 2), (0, 0)]);

    assert_eq!(index.direct_postings(DocId(0)).unwrap(), vec![Posting::new(0, 2), Posting::new(1, 1)]);
    assert_eq!(index.direct_postings(DocId(1)).unwrap(), vec![Posting::new(1, 1), Posting::new(2, 1)]);
    assert!(index.direct_postings(DocId(2)).unwrap().is_empty());
    assert!(index.document_entry(DocId(2)).unwrap().pointer.is_none());

    assert_eq!(index.inverted_postings("a").unwrap(), vec![Posting::new(0, 2)]);
    assert_eq!(index.inverted_postings("b").unwrap(), vec![Posting::new(0, 1), Posting::new(1, 1)]);
    assert_eq!(index.inverted_postings("c").unwrap(), vec![Posting::new(1, 1)]);

    assert!(index.properties.inverted_built);
    assert_eq!(index.properties.num_documents, 3);
    assert_eq!(index.properties.num_tokens, 5);
    assert_eq!(index.properties.num_pointers, 4);
    assert_eq!(index.properties.num_terms, 3);

    assert_eq!(index.docid("d2"), Some(DocId(2)));
    assert_eq!(index.metadata(DocId(1)).unwrap().get("docno").map(String::as_str), Some("d1"));
    assert!(index.lexicon_entry("zzz").is_none());
}

#[test]
fn test_default_pipeline_normalizes_terms() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = common::config(dir.path());
    config.pipeline = inverta::core::config::IndexerConfig::default().pipeline;
    let (report, index) = common::build(&config, &["The Running dogs", "the dog RUNS"]);

    // "the" is a stopword; the rest stem to "run" and "dog"
    assert_eq!(report.direct.tokens, 4);
    let terms: Vec<_> = index.lexicon_entries().map(|(t, e)| (t, e.doc_freq, e.term_freq)).collect();
    assert_eq!(terms, vec![("dog", 2, 2), ("run", 2, 2)]);
}
