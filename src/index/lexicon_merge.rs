use std::cmp::Reverse;
use std::collections::BinaryHeap;
use tracing::info;
use crate::core::error::{Error, ErrorKind, Result};
use crate::core::types::TermId;
use crate::index::lexicon::{open_lexicon, LexiconRecord, LexiconStream};
use crate::index::posting::Posting;
use crate::storage::layout::IndexLayout;
use crate::storage::record_file::{RecordFileReader, RecordFileWriter};

/// K-way merge of lexically sorted runs sharing one term id space.
///
/// Entries for the same term are summed. Returns the number of merged terms.
pub fn merge_sorted_runs(
    mut inputs: Vec<RecordFileReader<LexiconRecord>>,
    out: &mut RecordFileWriter<LexiconRecord>,
) -> Result<u64> {
    let mut heads: Vec<Option<LexiconRecord>> = Vec::with_capacity(inputs.len());
    let mut heap = BinaryHeap::new();
    for (run, input) in inputs.iter_mut().enumerate() {
        let head = input.next().transpose()?;
        if let Some(record) = &head {
            heap.push(Reverse((record.term.clone(), run)));
        }
        heads.push(head);
    }

    let mut current: Option<LexiconRecord> = None;
    let mut written = 0u64;
    while let Some(Reverse((_, run))) = heap.pop() {
        let Some(record) = heads[run].take() else {
            continue;
        };
        if let Some(next) = inputs[run].next().transpose()? {
            heap.push(Reverse((next.term.clone(), run)));
            heads[run] = Some(next);
        }

        match current.as_mut() {
            Some(acc) if acc.term == record.term => {
                if acc.entry.term_id != record.entry.term_id {
                    return Err(Error::new(
                        ErrorKind::Internal,
                        format!(
                            "term '{}' has ids {} and {} across lexicon runs",
                            record.term, acc.entry.term_id, record.entry.term_id
                        ),
                    ));
                }
                acc.entry.merge_stats(&record.entry)?;
            }
            _ => {
                if let Some(done) = current.replace(record) {
                    out.write(&done)?;
                    written += 1;
                }
            }
        }
    }
    if let Some(done) = current {
        out.write(&done)?;
        written += 1;
    }
    Ok(written)
}

/// Old -> new term ids for the second lexicon of a merge
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TermIdMap {
    pub new_ids: Vec<Option<TermId>>,  // indexed by old id
}

impl TermIdMap {
    pub fn map(&self, old: TermId) -> Result<TermId> {
        self.new_ids.get(old.value() as usize).copied().flatten().ok_or_else(|| {
            Error::new(ErrorKind::NotFound, format!("term id {} not in the merged lexicon", old))
        })
    }

    /// Rewrite direct-file postings (entity = term id) into the merged id space
    pub fn remap_postings(&self, postings: &mut [Posting]) -> Result<()> {
        for posting in postings.iter_mut() {
            posting.id = self.map(TermId(posting.id))?.value();
        }
        postings.sort_unstable_by_key(|p| p.id);
        Ok(())
    }
}

/// Merge two finished lexicons into `out`.
///
/// Terms of `a` keep their ids; terms only in `b` get fresh ids after `a`'s,
/// in lexical order. Pointers are dropped since postings must be rebuilt.
pub fn merge_lexicons(a: &IndexLayout, b: &IndexLayout, out: &IndexLayout) -> Result<TermIdMap> {
    let mut left = open_lexicon(a)?;
    let mut right = open_lexicon(b)?;
    let mut next_id = left.len() as u32;
    let mut map = TermIdMap {
        new_ids: vec![None; right.len() as usize],
    };

    let mut writer = RecordFileWriter::create(&out.lexicon_path(), "lexicon")?;
    let mut l = left.next().transpose()?;
    let mut r = right.next().transpose()?;
    loop {
        let record = match (l.take(), r.take()) {
            (None, None) => break,
            (Some(x), None) => {
                l = left.next().transpose()?;
                x
            }
            (None, Some(y)) => {
                r = right.next().transpose()?;
                fresh_id(&mut map, y, &mut next_id)?
            }
            (Some(x), Some(y)) if x.term < y.term => {
                r = Some(y);
                l = left.next().transpose()?;
                x
            }
            (Some(x), Some(y)) if x.term > y.term => {
                l = Some(x);
                r = right.next().transpose()?;
                fresh_id(&mut map, y, &mut next_id)?
            }
            (Some(mut x), Some(y)) => {
                record_mapping(&mut map, y.entry.term_id, x.entry.term_id)?;
                x.entry.merge_stats(&y.entry)?;
                l = left.next().transpose()?;
                r = right.next().transpose()?;
                x
            }
        };

        let mut record = record;
        record.entry.pointer = None;
        writer.write(&record)?;
    }
    let terms = writer.finish()?;

    info!(structure = "lexicon", left = %a.prefix, right = %b.prefix, terms, "lexicons merged");
    Ok(map)
}

fn fresh_id(map: &mut TermIdMap, mut record: LexiconRecord, next_id: &mut u32) -> Result<LexiconRecord> {
    let id = TermId(*next_id);
    *next_id += 1;
    record_mapping(map, record.entry.term_id, id)?;
    record.entry.term_id = id;
    Ok(record)
}

fn record_mapping(map: &mut TermIdMap, old: TermId, new: TermId) -> Result<()> {
    let slot = map.new_ids.get_mut(old.value() as usize).ok_or_else(|| {
        Error::new(ErrorKind::Corrupt, format!("term id {} outside a dense lexicon", old))
    })?;
    *slot = Some(new);
    Ok(())
}

/// Read a whole lexicon into memory, for small indices and tests
pub fn load_lexicon(layout: &IndexLayout) -> Result<Vec<LexiconRecord>> {
    let stream: LexiconStream = open_lexicon(layout)?;
    stream.read_all()
}
