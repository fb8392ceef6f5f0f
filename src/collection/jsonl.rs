use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use serde_json::Value;
use crate::analysis::tokenizer::StandardTokenizer;
use crate::collection::document::{Collection, Document, DOCNO};
use crate::core::error::{Error, ErrorKind, Result};

/// One JSON object per line.
///
/// `docno` becomes the external identifier, every other string member is a
/// text field whose tokens are tagged with the member name, and remaining
/// scalar members are kept as document properties.
pub struct JsonLinesCollection<R> {
    reader: R,
    source: PathBuf,        // named in read errors; "-" for a bare reader
    tokenizer: StandardTokenizer,
    line_number: usize,
    line: String,
}

impl JsonLinesCollection<BufReader<File>> {
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|e| Error::io_context("collection", path, e))?;
        let mut collection = JsonLinesCollection::new(BufReader::new(file));
        collection.source = path.to_path_buf();
        Ok(collection)
    }
}

impl<R: BufRead> JsonLinesCollection<R> {
    pub fn new(reader: R) -> Self {
        JsonLinesCollection {
            reader,
            source: PathBuf::from("-"),
            tokenizer: StandardTokenizer::default(),
            line_number: 0,
            line: String::new(),
        }
    }

    fn parse_line(&self) -> Result<JsonDocument> {
        let value: Value = serde_json::from_str(&self.line)
            .map_err(|e| Error::new(ErrorKind::Parse, format!("collection line {}: {}", self.line_number, e)))?;
        let Value::Object(members) = value else {
            return Err(Error::new(
                ErrorKind::InvalidInput,
                format!("collection line {} is not a JSON object", self.line_number),
            ));
        };

        let mut properties = BTreeMap::new();
        let mut tokens = Vec::new();
        for (name, member) in members {
            match member {
                Value::String(text) if name != DOCNO => {
                    for term in self.tokenizer.tokenize(&text) {
                        tokens.push((term, name.clone()));
                    }
                }
                Value::String(text) => {
                    properties.insert(name, text);
                }
                Value::Null | Value::Array(_) | Value::Object(_) => {}
                scalar => {
                    properties.insert(name, scalar.to_string());
                }
            }
        }

        Ok(JsonDocument {
            properties,
            tokens: tokens.into_iter(),
            current_fields: Vec::new(),
        })
    }
}

struct JsonDocument {
    properties: BTreeMap<String, String>,
    tokens: std::vec::IntoIter<(String, String)>,
    current_fields: Vec<String>,
}

impl Document for JsonDocument {
    fn next_term(&mut self) -> Option<String> {
        let (term, field) = self.tokens.next()?;
        self.current_fields.clear();
        self.current_fields.push(field);
        Some(term)
    }

    fn fields(&self) -> &[String] {
        &self.current_fields
    }

    fn properties(&self) -> &BTreeMap<String, String> {
        &self.properties
    }
}

impl<R: BufRead> Collection for JsonLinesCollection<R> {
    fn next_document(&mut self) -> Result<Option<Box<dyn Document + '_>>> {
        loop {
            self.line.clear();
            let read = self.reader.read_line(&mut self.line).map_err(|e| {
                Error::io_context("collection", &self.source, e).within(&format!("line {}", self.line_number + 1))
            })?;
            if read == 0 {
                return Ok(None);
            }
            self.line_number += 1;
            if self.line.trim().is_empty() {
                continue;
            }
            return Ok(Some(Box::new(self.parse_line()?)));
        }
    }
}
