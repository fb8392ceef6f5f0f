use std::collections::HashSet;
use crate::analysis::filter::TermFilter;

pub struct StopWordFilter {
    pub stop_words: HashSet<String>,
}

impl StopWordFilter {
    pub fn new(stop_words: Vec<String>) -> Self {
        StopWordFilter {
            stop_words: stop_words.into_iter().collect(),
        }
    }

    pub fn english() -> Self {
        let words = vec![
            "a", "an", "and", "are", "as", "at", "be", "by", "for",
            "from", "has", "he", "in", "is", "it", "its", "of", "on",
            "that", "the", "to", "was", "will", "with"
        ].into_iter().map(String::from).collect();

        StopWordFilter::new(words)
    }
}

impl TermFilter for StopWordFilter {
    fn apply(&self, term: String) -> Option<String> {
        if self.stop_words.contains(&term) {
            None
        } else {
            Some(term)
        }
    }

    fn name(&self) -> &str {
        "stopwords"
    }
}
