use rust_stemmers::Algorithm;
use crate::analysis::filter::TermFilter;
use crate::analysis::filters::lowercase::LowercaseFilter;
use crate::analysis::filters::stemmer::StemmerFilter;
use crate::analysis::filters::stopword::StopWordFilter;
use crate::core::error::{Error, ErrorKind, Result};

/// Normalizes a raw token; `None` means the token was filtered out
pub trait TermPipeline: Send + Sync {
    fn process(&self, term: &str) -> Option<String>;
}

/// Chain of term filters applied in order
pub struct Pipeline {
    pub filters: Vec<Box<dyn TermFilter>>,
}

impl Pipeline {
    pub fn new() -> Self {
        Pipeline {
            filters: Vec::new(),
        }
    }

    pub fn add_filter(mut self, filter: Box<dyn TermFilter>) -> Self {
        self.filters.push(filter);
        self
    }

    /// Build from stage names: "lowercase", "stopwords", "stemmer" or "stemmer:<language>"
    pub fn from_names(names: &[String]) -> Result<Self> {
        let mut pipeline = Pipeline::new();
        for name in names {
            let filter: Box<dyn TermFilter> = match name.split_once(':') {
                None if name == "lowercase" => Box::new(LowercaseFilter),
                None if name == "stopwords" => Box::new(StopWordFilter::english()),
                None if name == "stemmer" => Box::new(StemmerFilter::new(Algorithm::English)),
                Some(("stemmer", language)) => Box::new(StemmerFilter::new(stemmer_algorithm(language)?)),
                _ => {
                    return Err(Error::new(
                        ErrorKind::InvalidArgument,
                        format!("unknown term pipeline stage '{}'", name),
                    ));
                }
            };
            pipeline = pipeline.add_filter(filter);
        }
        Ok(pipeline)
    }

    pub fn stage_names(&self) -> Vec<&str> {
        self.filters.iter().map(|f| f.name()).collect()
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Pipeline::new()
    }
}

impl TermPipeline for Pipeline {
    fn process(&self, term: &str) -> Option<String> {
        if term.is_empty() {
            return None;
        }
        let mut current = term.to_string();
        for filter in &self.filters {
            current = filter.apply(current)?;
        }
        Some(current)
    }
}

fn stemmer_algorithm(language: &str) -> Result<Algorithm> {
    let algorithm = match language {
        "english" => Algorithm::English,
        "french" => Algorithm::French,
        "german" => Algorithm::German,
        "spanish" => Algorithm::Spanish,
        "italian" => Algorithm::Italian,
        "portuguese" => Algorithm::Portuguese,
        "dutch" => Algorithm::Dutch,
        "russian" => Algorithm::Russian,
        "swedish" => Algorithm::Swedish,
        "norwegian" => Algorithm::Norwegian,
        "danish" => Algorithm::Danish,
        "finnish" => Algorithm::Finnish,
        _ => {
            return Err(Error::new(
                ErrorKind::InvalidArgument,
                format!("no stemmer for language '{}'", language),
            ));
        }
    };
    Ok(algorithm)
}
