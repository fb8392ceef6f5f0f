use std::collections::BTreeMap;
use crate::core::error::Result;

/// Property holding the external document identifier
pub const DOCNO: &str = "docno";

/// Single-pass source of raw terms for one document
pub trait Document {
    /// Next raw token, `None` once the document is exhausted
    fn next_term(&mut self) -> Option<String>;

    /// Field tags active for the most recently returned term
    fn fields(&self) -> &[String];

    fn properties(&self) -> &BTreeMap<String, String>;

    fn docno(&self) -> Option<&str> {
        self.properties().get(DOCNO).map(String::as_str)
    }
}

/// Stream of documents fed to the direct index builder
pub trait Collection {
    fn next_document(&mut self) -> Result<Option<Box<dyn Document + '_>>>;
}
