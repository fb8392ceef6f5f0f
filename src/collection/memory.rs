use std::collections::BTreeMap;
use crate::collection::document::{Collection, Document, DOCNO};
use crate::core::error::Result;

/// A pre-tokenized document held in memory
#[derive(Debug, Clone, Default)]
pub struct RawDocument {
    pub properties: BTreeMap<String, String>,
    pub tokens: Vec<(String, Vec<String>)>,    // (raw term, field tags)
}

impl RawDocument {
    pub fn new(docno: &str) -> Self {
        let mut properties = BTreeMap::new();
        properties.insert(DOCNO.to_string(), docno.to_string());
        RawDocument {
            properties,
            tokens: Vec::new(),
        }
    }

    /// Untagged whitespace-separated terms
    pub fn from_text(docno: &str, text: &str) -> Self {
        let mut doc = RawDocument::new(docno);
        for term in text.split_whitespace() {
            doc.tokens.push((term.to_string(), Vec::new()));
        }
        doc
    }

    /// Append whitespace-separated terms tagged with one field
    pub fn with_field(mut self, field: &str, text: &str) -> Self {
        for term in text.split_whitespace() {
            self.tokens.push((term.to_string(), vec![field.to_string()]));
        }
        self
    }
}

/// Collection over in-memory documents, in order
pub struct InMemoryCollection {
    pub documents: Vec<RawDocument>,
    position: usize,
}

impl InMemoryCollection {
    pub fn new(documents: Vec<RawDocument>) -> Self {
        InMemoryCollection {
            documents,
            position: 0,
        }
    }

    /// One document per text, docnos "d0", "d1", ...
    pub fn from_texts(texts: &[&str]) -> Self {
        let documents = texts.iter()
            .enumerate()
            .map(|(i, text)| RawDocument::from_text(&format!("d{}", i), text))
            .collect();
        InMemoryCollection::new(documents)
    }

    pub fn remaining(&self) -> usize {
        self.documents.len() - self.position
    }
}

struct InMemoryDocument<'a> {
    raw: &'a RawDocument,
    next: usize,
    current_fields: &'a [String],
}

impl<'a> Document for InMemoryDocument<'a> {
    fn next_term(&mut self) -> Option<String> {
        let (term, fields) = self.raw.tokens.get(self.next)?;
        self.next += 1;
        self.current_fields = fields;
        Some(term.clone())
    }

    fn fields(&self) -> &[String] {
        self.current_fields
    }

    fn properties(&self) -> &BTreeMap<String, String> {
        &self.raw.properties
    }
}

impl Collection for InMemoryCollection {
    fn next_document(&mut self) -> Result<Option<Box<dyn Document + '_>>> {
        let Some(raw) = self.documents.get(self.position) else {
            return Ok(None);
        };
        self.position += 1;
        Ok(Some(Box::new(InMemoryDocument {
            raw,
            next: 0,
            current_fields: &[],
        })))
    }
}
