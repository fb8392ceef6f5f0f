use std::fs;
use tracing::{debug, info, warn};
use crate::builder::batch::TermBatch;
use crate::builder::scanning::{LexiconScanner, ScannerRegistry};
use crate::core::config::IndexerConfig;
use crate::core::error::{Error, ErrorKind, Result};
use crate::core::stats::{BatchTotals, InvertedBuildReport};
use crate::core::types::TermId;
use crate::index::document_index::DocumentIndex;
use crate::index::lexicon::{open_lexicon, LexiconBuilder, LexiconRecord};
use crate::index::posting::PostingPointer;
use crate::index::properties::IndexProperties;
use crate::storage::file_lock::FileLock;
use crate::storage::layout::IndexLayout;
use crate::storage::posting_file::{PostingFileReader, PostingFileWriter};
use crate::storage::record_file::{RecordFileReader, RecordFileWriter};

type OffsetRecord = (TermId, PostingPointer);

/// Phase 2: inverts the direct index in lexicon-ordered batches of terms.
///
/// Works on any index with phase-1 outputs, so a failed inversion can be
/// rerun from `open` without re-reading the collection.
pub struct InvertedIndexBuilder {
    pub layout: IndexLayout,
    scanner: Box<dyn LexiconScanner>,
}

impl InvertedIndexBuilder {
    pub fn open(layout: IndexLayout, config: &IndexerConfig) -> Result<Self> {
        Self::with_registry(layout, config, &ScannerRegistry::with_builtins())
    }

    pub fn with_registry(layout: IndexLayout, config: &IndexerConfig, registry: &ScannerRegistry) -> Result<Self> {
        let scanner = registry.from_strategy(&config.scanning)?;
        Self::with_scanner(layout, scanner)
    }

    pub fn with_scanner(layout: IndexLayout, scanner: Box<dyn LexiconScanner>) -> Result<Self> {
        if !layout.exists() {
            return Err(Error::new(
                ErrorKind::NotFound,
                format!("no direct index '{}' in {}", layout.prefix, layout.dir.display()),
            ));
        }
        Ok(InvertedIndexBuilder { layout, scanner })
    }

    pub fn build(&mut self) -> Result<InvertedBuildReport> {
        let _lock = FileLock::acquire(&self.layout)?;
        let mut properties = IndexProperties::load(&self.layout)?;
        let mut report = InvertedBuildReport::default();

        if properties.num_documents == 0 || properties.num_terms == 0 {
            warn!(
                phase = "inverted",
                prefix = %self.layout.prefix,
                documents = properties.num_documents,
                terms = properties.num_terms,
                "nothing to invert, skipping inverted index"
            );
            report.skipped = true;
            return Ok(report);
        }
        info!(phase = "inverted", prefix = %self.layout.prefix, scanner = self.scanner.name(), "inverted index build started");

        let layout = properties.posting_layout;
        let documents = DocumentIndex::open(&self.layout)?;
        let direct = PostingFileReader::open(&self.layout.direct_path(), "direct index", layout)?;
        // the live inverted file and lexicon stay untouched until the swap
        let mut inverted = PostingFileWriter::create(&self.layout.inverted_tmp_path(), "inverted index", layout)?;
        let mut offsets = RecordFileWriter::<OffsetRecord>::create(&self.layout.offsets_path(), "lexicon offsets")?;
        let mut lexicon = open_lexicon(&self.layout)?;

        loop {
            let batch_index = report.batches;
            let selected = self.scanner.select(&mut lexicon, &layout)?;
            let Some(mut batch) = selected.filter(|b| !b.is_empty()) else {
                if lexicon.remaining() > 0 {
                    warn!(
                        phase = "inverted",
                        batch = batch_index,
                        remaining = lexicon.remaining(),
                        scanner = self.scanner.name(),
                        "scanner selected no terms before the lexicon was exhausted"
                    );
                    report.premature_exhaustions += 1;
                }
                break;
            };

            let totals = run_batch(&direct, &documents, &mut batch, &mut inverted, &mut offsets)
                .map_err(|e| e.within(&format!("inverted batch {}", batch_index)))?;

            debug!(phase = "inverted", batch = batch_index, terms = totals.terms, pointers = totals.pointers, "batch inverted");
            report.totals = report.totals.fold(totals);
            report.peak_batch_pointers = report.peak_batch_pointers.max(totals.pointers);
            report.batches += 1;
        }

        inverted.finish()?;
        offsets.finish()?;
        drop(lexicon);
        drop(direct);

        let complete = report.premature_exhaustions == 0;
        write_patched_lexicon(&self.layout)?;

        // readers must not trust the old flag while the files are swapped
        if properties.inverted_built {
            properties.inverted_built = false;
            properties.save(&self.layout)?;
        }
        swap_in(&self.layout)?;
        LexiconBuilder::optimise(&self.layout, complete)?;

        if complete {
            properties.num_terms = report.totals.terms as u32;
            properties.num_pointers = report.totals.pointers;
        }
        properties.inverted_built = complete;
        properties.save(&self.layout)?;

        info!(
            phase = "inverted",
            prefix = %self.layout.prefix,
            batches = report.batches,
            terms = report.totals.terms,
            pointers = report.totals.pointers,
            peak_batch_pointers = report.peak_batch_pointers,
            "inverted index build finished"
        );
        Ok(report)
    }
}

fn run_batch(
    direct: &PostingFileReader,
    documents: &DocumentIndex,
    batch: &mut TermBatch,
    inverted: &mut PostingFileWriter,
    offsets: &mut RecordFileWriter<OffsetRecord>,
) -> Result<BatchTotals> {
    let totals = invert_batch(direct, documents, batch)?;
    flush_batch(batch, inverted, offsets)?;
    Ok(totals)
}

/// One pass over the direct file collecting postings of the batch terms
fn invert_batch(direct: &PostingFileReader, documents: &DocumentIndex, batch: &mut TermBatch) -> Result<BatchTotals> {
    for (docid, pointer) in documents.with_postings() {
        for posting in direct.read_postings(&pointer)? {
            if let Some(slot) = batch.slot(TermId(posting.id)) {
                batch.add_posting(slot, docid, &posting);
            }
        }
    }
    batch.verify()?;
    Ok(batch.totals())
}

/// Write each term's postings in batch order and note where they went
fn flush_batch(
    batch: &TermBatch,
    inverted: &mut PostingFileWriter,
    offsets: &mut RecordFileWriter<OffsetRecord>,
) -> Result<()> {
    for (slot, record) in batch.records.iter().enumerate() {
        let pointer = inverted.write_postings(&batch.postings(slot))?;
        offsets.write(&(record.entry.term_id, pointer))?;
    }
    Ok(())
}

/// Rewrite the lexicon with inverted pointers into its tmp file
fn write_patched_lexicon(layout: &IndexLayout) -> Result<()> {
    let offsets_path = layout.offsets_path();
    let lexicon = open_lexicon(layout)?;
    let mut offsets = RecordFileReader::<OffsetRecord>::open(&offsets_path, "lexicon offsets")?;
    let mut writer = RecordFileWriter::<LexiconRecord>::create(&layout.lexicon_tmp_path(), "lexicon")?;

    // offsets follow lexicon order; terms past a premature stop have none
    let mut next_offset = offsets.next().transpose()?;
    for record in lexicon {
        let mut record = record?;
        record.entry.pointer = match next_offset {
            Some((term_id, pointer)) if term_id == record.entry.term_id => {
                next_offset = offsets.next().transpose()?;
                Some(pointer)
            }
            _ => None,
        };
        writer.write(&record)?;
    }
    if let Some((term_id, _)) = next_offset {
        return Err(Error::new(
            ErrorKind::Internal,
            format!("offset for term id {} has no lexicon entry", term_id),
        ));
    }
    writer.finish()?;
    Ok(())
}

/// Rename the new inverted file and lexicon over the live ones
fn swap_in(layout: &IndexLayout) -> Result<()> {
    let renames = [
        ("inverted index", layout.inverted_tmp_path(), layout.inverted_path()),
        ("lexicon", layout.lexicon_tmp_path(), layout.lexicon_path()),
    ];
    for (structure, from, to) in &renames {
        fs::rename(from, to).map_err(|e| Error::io_context(structure, to, e))?;
    }
    let offsets_path = layout.offsets_path();
    fs::remove_file(&offsets_path).map_err(|e| Error::io_context("lexicon offsets", &offsets_path, e))?;
    Ok(())
}
