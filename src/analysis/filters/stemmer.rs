use rust_stemmers::{Algorithm, Stemmer};
use crate::analysis::filter::TermFilter;

pub struct StemmerFilter {
    stemmer: Stemmer,
}

impl StemmerFilter {
    pub fn new(algorithm: Algorithm) -> Self {
        StemmerFilter {
            stemmer: Stemmer::create(algorithm),
        }
    }
}

impl TermFilter for StemmerFilter {
    fn apply(&self, term: String) -> Option<String> {
        let stemmed = self.stemmer.stem(&term).into_owned();
        if stemmed.is_empty() {
            None
        } else {
            Some(stemmed)
        }
    }

    fn name(&self) -> &str {
        "stemmer"
    }
}
