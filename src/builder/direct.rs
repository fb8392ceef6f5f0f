use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use chrono::Utc;
use tracing::{debug, error, info};
use crate::analysis::pipeline::{Pipeline, TermPipeline};
use crate::collection::document::{Collection, Document};
use crate::core::config::{BlockConfig, IndexerConfig};
use crate::core::error::{Error, ErrorKind, Result};
use crate::core::stats::{DirectBuildReport, StopReason};
use crate::core::types::FieldSet;
use crate::index::accumulator::{DocumentPostings, PostingMode};
use crate::index::document_index::{DocumentEntry, DocumentIndexWriter};
use crate::index::lexicon::LexiconBuilder;
use crate::index::meta_index::MetaIndexWriter;
use crate::index::posting::PostingLayout;
use crate::index::properties::IndexProperties;
use crate::storage::file_lock::FileLock;
use crate::storage::layout::IndexLayout;
use crate::storage::posting_file::PostingFileWriter;

/// What to do with one post-pipeline token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenAction {
    Index(u32),     // index in this block
    Count,          // counts towards the length only
    Skip,
}

/// Hands out block ids within one document
#[derive(Debug, Clone)]
pub struct BlockAssigner {
    config: Option<BlockConfig>,
    delimiters: HashSet<String>,
    block: u32,
    position: usize,
}

impl BlockAssigner {
    pub fn new(config: Option<BlockConfig>) -> Self {
        let delimiters = match &config {
            Some(BlockConfig::Delimited { terms, .. }) => terms.iter().cloned().collect(),
            _ => HashSet::new(),
        };
        BlockAssigner {
            config,
            delimiters,
            block: 0,
            position: 0,
        }
    }

    pub fn start_document(&mut self) {
        self.block = 0;
        self.position = 0;
    }

    pub fn next(&mut self, term: &str) -> TokenAction {
        match &self.config {
            None => TokenAction::Index(0),
            Some(BlockConfig::Fixed { size, max_blocks }) => {
                // last block absorbs the tail once max_blocks is reached
                let block = (self.position / size).min(max_blocks - 1) as u32;
                self.position += 1;
                TokenAction::Index(block)
            }
            Some(BlockConfig::Delimited { index_delimiters, count_delimiters, .. }) => {
                if !self.delimiters.contains(term) {
                    return TokenAction::Index(self.block);
                }
                let action = if *index_delimiters {
                    TokenAction::Index(self.block)
                } else if *count_delimiters {
                    TokenAction::Count
                } else {
                    TokenAction::Skip
                };
                self.block += 1;
                action
            }
        }
    }
}

/// Maps a token's field tags to configured field indexes
#[derive(Debug, Clone)]
pub struct FieldMapper {
    indexes: HashMap<String, usize>,
    else_field: Option<usize>,
}

impl FieldMapper {
    pub fn new(config: &IndexerConfig) -> Self {
        FieldMapper {
            indexes: config.fields.iter().enumerate().map(|(i, f)| (f.clone(), i)).collect(),
            else_field: config.else_field(),
        }
    }

    /// Unknown tags are ignored; a token left without fields goes to ELSE
    pub fn map(&self, tags: &[String]) -> FieldSet {
        let mut fields = FieldSet::empty();
        for tag in tags {
            if let Some(&index) = self.indexes.get(tag) {
                fields.insert(index);
            }
        }
        if fields.is_empty() {
            if let Some(index) = self.else_field {
                fields.insert(index);
            }
        }
        fields
    }
}

/// Phase 1: consumes a collection and writes the direct index, lexicon,
/// document index, metadata and properties.
pub struct DirectIndexBuilder {
    pub layout: IndexLayout,
    pub config: IndexerConfig,
    pub pipeline: Arc<dyn TermPipeline>,
    pub posting_layout: PostingLayout,
}

struct DirectWriters {
    direct: PostingFileWriter,
    lexicon: LexiconBuilder,
    documents: DocumentIndexWriter,
    meta: MetaIndexWriter,
}

impl DirectIndexBuilder {
    pub fn new(layout: IndexLayout, config: &IndexerConfig) -> Result<Self> {
        let pipeline = Pipeline::from_names(&config.pipeline)?;
        Self::with_pipeline(layout, config, Arc::new(pipeline))
    }

    pub fn with_pipeline(layout: IndexLayout, config: &IndexerConfig, pipeline: Arc<dyn TermPipeline>) -> Result<Self> {
        config.validate()?;
        Ok(DirectIndexBuilder {
            layout,
            posting_layout: PostingLayout::new(config.field_count(), config.blocks_enabled()),
            config: config.clone(),
            pipeline,
        })
    }

    /// Index documents until the collection ends or a shard limit is hit
    pub fn build(&self, collection: &mut dyn Collection) -> Result<DirectBuildReport> {
        let _lock = FileLock::acquire(&self.layout)?;
        info!(phase = "direct", prefix = %self.layout.prefix, "direct index build started");

        let mut writers = DirectWriters {
            direct: PostingFileWriter::create(&self.layout.direct_path(), "direct index", self.posting_layout)?,
            lexicon: LexiconBuilder::new(self.layout.clone(), self.posting_layout, self.config.lexicon_flush_interval),
            documents: DocumentIndexWriter::create(&self.layout)?,
            meta: MetaIndexWriter::create(&self.layout, &self.config.meta_keys)?,
        };

        let mut report = DirectBuildReport {
            documents: 0,
            empty_documents: 0,
            tokens: 0,
            pointers: 0,
            unique_terms: 0,
            truncated_documents: 0,
            stop_reason: StopReason::Exhausted,
        };
        let boundaries: HashSet<&str> = self.config.boundary_documents.iter().map(String::as_str).collect();
        let fields = FieldMapper::new(&self.config);
        let mut blocks = BlockAssigner::new(self.config.blocks.clone());
        let mut postings = DocumentPostings::new(PostingMode::from_layout(&self.posting_layout));

        while let Some(mut document) = collection.next_document()? {
            let docid = writers.documents.documents();
            let docno = document.docno().map(str::to_string);

            postings.reset();
            blocks.start_document();
            let truncated = self.accumulate(document.as_mut(), &mut postings, &mut blocks, &fields);

            let result = self.index_document(&mut writers, &postings, document.as_ref());
            if let Err(e) = result {
                let ident = docno.clone().unwrap_or_else(|| format!("docid {}", docid));
                error!(phase = "direct", docno = %ident, error = %e, "failed to index document");
                return Err(Error::new(ErrorKind::Indexing, format!("document {}: {}", ident, e)));
            }

            report.documents += 1;
            report.tokens += postings.length() as u64;
            report.pointers += postings.distinct_terms() as u64;
            if postings.is_empty() {
                report.empty_documents += 1;
            }
            if truncated {
                report.truncated_documents += 1;
                debug!(phase = "direct", docid, cap = self.config.max_tokens_per_document, "document truncated");
            }

            if let Some(docno) = docno.filter(|d| boundaries.contains(d.as_str())) {
                report.stop_reason = StopReason::Boundary(docno);
                break;
            }
            let cap = self.config.max_documents_per_shard;
            if cap > 0 && report.documents as usize >= cap {
                report.stop_reason = StopReason::DocumentCap;
                break;
            }
        }

        writers.direct.finish()?;
        writers.documents.finish()?;
        writers.meta.finish()?;
        report.unique_terms = writers.lexicon.finished_direct_index_build()?;

        let properties = IndexProperties {
            version: IndexProperties::VERSION,
            built_at: Utc::now(),
            num_documents: report.documents,
            num_terms: report.unique_terms,
            num_tokens: report.tokens,
            num_pointers: report.pointers,
            fields: self.config.fields.clone(),
            blocks: self.config.blocks.clone(),
            posting_layout: self.posting_layout,
            pipeline: self.config.pipeline.clone(),
            stop_reason: report.stop_reason.clone(),
            inverted_built: false,
        };
        properties.save(&self.layout)?;

        info!(
            phase = "direct",
            prefix = %self.layout.prefix,
            documents = report.documents,
            terms = report.unique_terms,
            tokens = report.tokens,
            stop = ?report.stop_reason,
            "direct index build finished"
        );
        Ok(report)
    }

    /// Feed the document's terms to the accumulator; true if the token cap cut it short
    fn accumulate(
        &self,
        document: &mut dyn Document,
        postings: &mut DocumentPostings,
        blocks: &mut BlockAssigner,
        fields: &FieldMapper,
    ) -> bool {
        let cap = self.config.max_tokens_per_document;
        let mut raw_tokens = 0usize;
        let mut truncated = false;

        while let Some(raw) = document.next_term() {
            raw_tokens += 1;
            if cap > 0 && raw_tokens > cap {
                // drain the rest unindexed
                truncated = true;
                continue;
            }
            let Some(term) = self.pipeline.process(&raw) else {
                continue;
            };
            match blocks.next(&term) {
                TokenAction::Index(block) => postings.insert(Some(&term), fields.map(document.fields()), block),
                TokenAction::Count => postings.count_token(),
                TokenAction::Skip => {}
            }
        }
        truncated
    }

    fn index_document(&self, writers: &mut DirectWriters, postings: &DocumentPostings, document: &dyn Document) -> Result<()> {
        let entry = if postings.is_empty() {
            DocumentEntry {
                length: postings.length(),
                distinct_terms: 0,
                pointer: None,
            }
        } else {
            writers.lexicon.assign_term_ids(postings);
            let list = postings.postings(writers.lexicon.term_ids())?;
            let pointer = writers.direct.write_postings(&list)?;
            writers.lexicon.add_document_terms(postings)?;
            DocumentEntry {
                length: postings.length(),
                distinct_terms: postings.distinct_terms(),
                pointer: Some(pointer),
            }
        };
        writers.documents.add(&entry)?;
        writers.meta.write(document.properties())
    }
}
