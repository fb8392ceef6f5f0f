use std::collections::HashMap;
use tracing::{debug, warn};
use crate::builder::batch::TermBatch;
use crate::core::config::ScanningStrategy;
use crate::core::error::{Error, ErrorKind, Result};
use crate::index::lexicon::{LexiconEntry, LexiconRecord};
use crate::index::posting::PostingLayout;

/// Fixed cost of one term slot in the batch arena: five Vec headers + map entry
pub const TERM_OVERHEAD_BYTES: u64 = 5 * 24 + 32;

const FALLBACK_MEMORY_BYTES: u64 = 1 << 30;

/// Chooses how many lexicon entries the next inversion pass takes.
///
/// Returns `None` once the lexicon is exhausted. Built-in scanners always
/// take the entry that crosses their threshold, so a non-empty lexicon
/// yields at least one term per call.
pub trait LexiconScanner: Send {
    fn select(
        &mut self,
        lexicon: &mut dyn Iterator<Item = Result<LexiconRecord>>,
        layout: &PostingLayout,
    ) -> Result<Option<TermBatch>>;

    fn name(&self) -> &str;
}

/// Take entries while `full` says the batch has room
fn select_until(
    lexicon: &mut dyn Iterator<Item = Result<LexiconRecord>>,
    layout: &PostingLayout,
    mut full: impl FnMut(&TermBatch, &LexiconEntry) -> bool,
) -> Result<Option<TermBatch>> {
    let mut batch = TermBatch::new(*layout);
    while let Some(record) = lexicon.next() {
        let record = record?;
        let stop = full(&batch, &record.entry);
        batch.push(record);
        if stop {
            break;
        }
    }
    if batch.is_empty() {
        return Ok(None);
    }
    Ok(Some(batch))
}

/// At most `terms` terms per batch
pub struct TermCountScanner {
    pub terms: u64,
}

impl LexiconScanner for TermCountScanner {
    fn select(
        &mut self,
        lexicon: &mut dyn Iterator<Item = Result<LexiconRecord>>,
        layout: &PostingLayout,
    ) -> Result<Option<TermBatch>> {
        let limit = self.terms.max(1);
        select_until(lexicon, layout, |batch, _| batch.len() as u64 + 1 >= limit)
    }

    fn name(&self) -> &str {
        "terms"
    }
}

/// Terms until the summed document frequency reaches `pointers`
pub struct PointerCountScanner {
    pub pointers: u64,
}

impl LexiconScanner for PointerCountScanner {
    fn select(
        &mut self,
        lexicon: &mut dyn Iterator<Item = Result<LexiconRecord>>,
        layout: &PostingLayout,
    ) -> Result<Option<TermBatch>> {
        let limit = self.pointers;
        select_until(lexicon, layout, |batch, entry| batch.pointers() + entry.doc_freq as u64 >= limit)
    }

    fn name(&self) -> &str {
        "pointers"
    }
}

/// Terms until the estimated arena size reaches `budget` bytes
pub struct MemoryScanner {
    pub budget: u64,
}

impl MemoryScanner {
    /// `heap_fraction` of the memory budget, shared between `processes` builders
    pub fn from_fraction(heap_fraction: f64, processes: usize, budget_bytes: Option<u64>) -> Self {
        let available = budget_bytes.unwrap_or_else(available_memory);
        let budget = (available as f64 * heap_fraction) as u64 / processes.max(1) as u64;
        debug!(available, heap_fraction, processes, budget, "memory scanner budget");
        MemoryScanner { budget }
    }

    /// Estimated arena bytes for one term
    pub fn estimate(entry: &LexiconEntry, layout: &PostingLayout) -> u64 {
        let postings = entry.doc_freq as u64;
        let mut per_term = postings * (4 + 4 + 4 * layout.field_count as u64);
        if layout.blocks {
            // block count per posting plus every block id
            per_term += postings * 4 + entry.block_freq * 4;
        }
        TERM_OVERHEAD_BYTES + per_term
    }
}

impl LexiconScanner for MemoryScanner {
    fn select(
        &mut self,
        lexicon: &mut dyn Iterator<Item = Result<LexiconRecord>>,
        layout: &PostingLayout,
    ) -> Result<Option<TermBatch>> {
        let budget = self.budget;
        let mut used = 0u64;
        select_until(lexicon, layout, |_, entry| {
            used += MemoryScanner::estimate(entry, layout);
            used >= budget
        })
    }

    fn name(&self) -> &str {
        "memory"
    }
}

/// Free physical memory as reported by the OS
pub fn available_memory() -> u64 {
    #[cfg(target_os = "linux")]
    let pages = unsafe { libc::sysconf(libc::_SC_AVPHYS_PAGES) };
    #[cfg(not(target_os = "linux"))]
    let pages = unsafe { libc::sysconf(libc::_SC_PHYS_PAGES) };
    let page_size = unsafe { libc::sysconf(libc::_SC_PAGESIZE) };

    if pages <= 0 || page_size <= 0 {
        warn!(fallback = FALLBACK_MEMORY_BYTES, "could not read available memory");
        return FALLBACK_MEMORY_BYTES;
    }
    pages as u64 * page_size as u64
}

pub type ScannerFactory = fn(u64) -> Box<dyn LexiconScanner>;

/// Named scanner factories; the built-ins are "terms", "pointers" and "memory"
#[derive(Clone)]
pub struct ScannerRegistry {
    factories: HashMap<String, ScannerFactory>,
}

impl ScannerRegistry {
    pub fn new() -> Self {
        ScannerRegistry {
            factories: HashMap::new(),
        }
    }

    pub fn with_builtins() -> Self {
        let mut registry = ScannerRegistry::new();
        registry.register("terms", |terms| Box::new(TermCountScanner { terms }));
        registry.register("pointers", |pointers| Box::new(PointerCountScanner { pointers }));
        registry.register("memory", |budget| Box::new(MemoryScanner { budget }));
        registry
    }

    pub fn register(&mut self, name: &str, factory: ScannerFactory) {
        self.factories.insert(name.to_string(), factory);
    }

    pub fn create(&self, name: &str, threshold: u64) -> Result<Box<dyn LexiconScanner>> {
        let factory = self.factories.get(name).ok_or_else(|| {
            Error::new(ErrorKind::NotFound, format!("no lexicon scanner registered as '{}'", name))
        })?;
        Ok(factory(threshold))
    }

    pub fn from_strategy(&self, strategy: &ScanningStrategy) -> Result<Box<dyn LexiconScanner>> {
        match strategy {
            ScanningStrategy::Terms { terms } => self.create("terms", *terms),
            ScanningStrategy::Pointers { pointers } => self.create("pointers", *pointers),
            ScanningStrategy::Memory { heap_fraction, processes, budget_bytes } => {
                let scanner = MemoryScanner::from_fraction(*heap_fraction, *processes, *budget_bytes);
                self.create("memory", scanner.budget)
            }
            ScanningStrategy::Custom { name, threshold } => self.create(name, *threshold),
        }
    }
}

impl Default for ScannerRegistry {
    fn default() -> Self {
        ScannerRegistry::with_builtins()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::TermId;

    fn lexicon(doc_freqs: &[u32]) -> Vec<Result<LexiconRecord>> {
        doc_freqs.iter().enumerate().map(|(i, &df)| {
            let mut entry = LexiconEntry::new(TermId(i as u32), 0);
            entry.doc_freq = df;
            entry.term_freq = df as u64;
            Ok(LexiconRecord { term: format!("t{:03}", i), entry })
        }).collect()
    }

    fn batch_sizes(scanner: &mut dyn LexiconScanner, doc_freqs: &[u32]) -> Vec<usize> {
        let mut stream = lexicon(doc_freqs).into_iter();
        let layout = PostingLayout::default();
        let mut sizes = Vec::new();
        while let Some(batch) = scanner.select(&mut stream, &layout).unwrap() {
            sizes.push(batch.len());
        }
        sizes
    }

    #[test]
    fn test_term_count_batches() {
        let mut scanner = TermCountScanner { terms: 2 };
        assert_eq!(batch_sizes(&mut scanner, &[1, 1, 1, 1, 1]), vec![2, 2, 1]);
    }

    #[test]
    fn test_pointer_count_includes_crossing_term() {
        let mut scanner = PointerCountScanner { pointers: 3 };
        assert_eq!(batch_sizes(&mut scanner, &[5, 1, 1, 1]), vec![1, 3]);
        assert_eq!(batch_sizes(&mut scanner, &[2, 5, 1, 1, 1]), vec![2, 3]);
    }

    #[test]
    fn test_selection_leaves_rest_of_stream() {
        let mut stream = lexicon(&[1, 1, 1]).into_iter();
        let batch = TermCountScanner { terms: 2 }.select(&mut stream, &PostingLayout::default()).unwrap().unwrap();
        assert_eq!(batch.len(), 2);
        assert_eq!(stream.next().unwrap().unwrap().term, "t002");
    }

    #[test]
    fn test_read_error_aborts_selection() {
        let mut records = lexicon(&[1]);
        records.push(Err(Error::new(ErrorKind::Corrupt, "lexicon record".to_string())));
        let mut stream = records.into_iter();
        let err = TermCountScanner { terms: 10 }.select(&mut stream, &PostingLayout::default()).err().unwrap();
        assert_eq!(err.kind, ErrorKind::Corrupt);
    }

    #[test]
    fn test_tiny_thresholds_still_progress() {
        assert_eq!(batch_sizes(&mut TermCountScanner { terms: 0 }, &[1, 1]), vec![1, 1]);
        assert_eq!(batch_sizes(&mut PointerCountScanner { pointers: 0 }, &[4, 4]), vec![1, 1]);
        assert_eq!(batch_sizes(&mut MemoryScanner { budget: 1 }, &[4, 4]), vec![1, 1]);
    }

    #[test]
    fn test_memory_estimate_grows_with_layout() {
        let mut entry = LexiconEntry::new(TermId(0), 2);
        entry.doc_freq = 10;
        entry.block_freq = 30;
        let basic = MemoryScanner::estimate(&entry, &PostingLayout::default());
        let fields = MemoryScanner::estimate(&entry, &PostingLayout::new(2, false));
        let blocks = MemoryScanner::estimate(&entry, &PostingLayout::new(2, true));
        assert_eq!(basic, TERM_OVERHEAD_BYTES + 80);
        assert_eq!(fields, basic + 80);
        assert_eq!(blocks, fields + 40 + 120);
    }

    #[test]
    fn test_budget_is_split_between_processes() {
        let scanner = MemoryScanner::from_fraction(0.5, 4, Some(8000));
        assert_eq!(scanner.budget, 1000);
        assert!(available_memory() > 0);
    }

    #[test]
    fn test_registry_resolves_strategies() {
        let registry = ScannerRegistry::with_builtins();
        let scanner = registry.from_strategy(&ScanningStrategy::Pointers { pointers: 10 }).unwrap();
        assert_eq!(scanner.name(), "pointers");

        let custom = ScanningStrategy::Custom { name: "terms".to_string(), threshold: 3 };
        assert_eq!(registry.from_strategy(&custom).unwrap().name(), "terms");

        let missing = ScanningStrategy::Custom { name: "zipf".to_string(), threshold: 3 };
        assert_eq!(registry.from_strategy(&missing).err().unwrap().kind, ErrorKind::NotFound);
    }
}
