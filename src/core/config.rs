use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use serde::{Serialize, Deserialize};
use crate::core::error::{Error, ErrorKind, Result};
use crate::core::types::FieldSet;

/// Name of the catch-all pseudo-field applied to untagged terms
pub const ELSE_FIELD: &str = "ELSE";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexerConfig {
    pub index_dir: PathBuf,
    pub prefix: String,

    pub max_tokens_per_document: usize,     // 0 = no cap
    pub max_documents_per_shard: usize,     // 0 = no cap
    pub boundary_documents: Vec<String>,    // docnos that close a shard

    pub fields: Vec<String>,                // empty = no field statistics
    pub blocks: Option<BlockConfig>,        // None = no block ids

    pub scanning: ScanningStrategy,
    pub lexicon_flush_interval: usize,      // docs between lexicon spills
    pub meta_keys: Vec<String>,
    pub pipeline: Vec<String>,
}

impl Default for IndexerConfig {
    fn default() -> Self {
        IndexerConfig {
            index_dir: PathBuf::from("./index"),
            prefix: "data".to_string(),

            max_tokens_per_document: 0,
            max_documents_per_shard: 0,
            boundary_documents: Vec::new(),

            fields: Vec::new(),
            blocks: None,

            scanning: ScanningStrategy::default(),
            lexicon_flush_interval: 100_000,
            meta_keys: vec!["docno".to_string()],
            pipeline: vec![
                "lowercase".to_string(),
                "stopwords".to_string(),
                "stemmer".to_string(),
            ],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum BlockConfig {
    /// Every `size` indexed tokens open a new block, at most `max_blocks` per document
    Fixed { size: usize, max_blocks: usize },
    /// Marker terms open a new block
    Delimited {
        terms: Vec<String>,
        index_delimiters: bool,
        count_delimiters: bool,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "strategy", rename_all = "snake_case")]
pub enum ScanningStrategy {
    Terms { terms: u64 },
    Pointers { pointers: u64 },
    Memory {
        heap_fraction: f64,
        processes: usize,
        budget_bytes: Option<u64>,  // overrides the OS reading when set
    },
    Custom { name: String, threshold: u64 },
}

impl Default for ScanningStrategy {
    fn default() -> Self {
        ScanningStrategy::Memory {
            heap_fraction: 0.5,
            processes: 1,
            budget_bytes: None,
        }
    }
}

impl IndexerConfig {
    pub fn new(index_dir: impl Into<PathBuf>) -> Self {
        IndexerConfig {
            index_dir: index_dir.into(),
            ..IndexerConfig::default()
        }
    }

    /// Load a JSON configuration file; missing keys take their defaults
    pub fn from_file(path: &Path) -> Result<Self> {
        let data = fs::read_to_string(path)
            .map_err(|e| Error::io_context("configuration", path, e))?;
        let config: IndexerConfig = serde_json::from_str(&data)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.prefix.is_empty() {
            return Err(Error::new(ErrorKind::InvalidArgument, "index prefix must not be empty".to_string()));
        }
        if self.fields.len() > FieldSet::MAX_FIELDS {
            return Err(Error::new(
                ErrorKind::InvalidArgument,
                format!("{} fields configured, at most {} supported", self.fields.len(), FieldSet::MAX_FIELDS),
            ));
        }
        let distinct: HashSet<&String> = self.fields.iter().collect();
        if distinct.len() != self.fields.len() {
            return Err(Error::new(ErrorKind::InvalidArgument, "duplicate field names".to_string()));
        }
        match &self.blocks {
            Some(BlockConfig::Fixed { size, max_blocks }) if *size == 0 || *max_blocks == 0 => {
                return Err(Error::new(
                    ErrorKind::InvalidArgument,
                    "block size and max blocks must be positive".to_string(),
                ));
            }
            Some(BlockConfig::Delimited { terms, .. }) if terms.is_empty() => {
                return Err(Error::new(ErrorKind::InvalidArgument, "no block delimiter terms".to_string()));
            }
            _ => {}
        }
        match &self.scanning {
            ScanningStrategy::Terms { terms: 0 } | ScanningStrategy::Pointers { pointers: 0 } => {
                return Err(Error::new(ErrorKind::InvalidArgument, "scanning threshold must be positive".to_string()));
            }
            ScanningStrategy::Memory { heap_fraction, processes, .. }
                if *processes == 0 || !(*heap_fraction > 0.0 && *heap_fraction <= 1.0) =>
            {
                return Err(Error::new(
                    ErrorKind::InvalidArgument,
                    "memory scanning needs 0 < heap_fraction <= 1 and processes >= 1".to_string(),
                ));
            }
            _ => {}
        }
        if self.lexicon_flush_interval == 0 {
            return Err(Error::new(ErrorKind::InvalidArgument, "lexicon flush interval must be positive".to_string()));
        }
        Ok(())
    }

    pub fn field_count(&self) -> usize {
        self.fields.len()
    }

    /// Index of the ELSE pseudo-field, if configured
    pub fn else_field(&self) -> Option<usize> {
        self.fields.iter().position(|f| f == ELSE_FIELD)
    }

    pub fn blocks_enabled(&self) -> bool {
        self.blocks.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(IndexerConfig::default().validate().is_ok());
    }

    #[test]
    fn test_partial_json_takes_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("indexer.json");
        fs::write(
            &path,
            r#"{
                "prefix": "shard",
                "fields": ["TITLE", "ELSE"],
                "blocks": {"mode": "fixed", "size": 1, "max_blocks": 100000},
                "scanning": {"strategy": "pointers", "pointers": 20000000}
            }"#,
        ).unwrap();

        let config = IndexerConfig::from_file(&path).unwrap();
        assert_eq!(config.prefix, "shard");
        assert_eq!(config.else_field(), Some(1));
        assert_eq!(config.blocks, Some(BlockConfig::Fixed { size: 1, max_blocks: 100_000 }));
        assert_eq!(config.scanning, ScanningStrategy::Pointers { pointers: 20_000_000 });
        assert_eq!(config.meta_keys, vec!["docno".to_string()]);
    }

    #[test]
    fn test_rejects_zero_threshold() {
        let config = IndexerConfig {
            scanning: ScanningStrategy::Terms { terms: 0 },
            ..IndexerConfig::default()
        };
        let err = config.validate().unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidArgument);
    }

    #[test]
    fn test_rejects_duplicate_fields() {
        let config = IndexerConfig {
            fields: vec!["TITLE".to_string(), "TITLE".to_string()],
            ..IndexerConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
