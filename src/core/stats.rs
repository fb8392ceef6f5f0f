use serde::{Serialize, Deserialize};

/// Why a direct-index run stopped consuming the collection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum StopReason {
    Exhausted,
    DocumentCap,
    Boundary(String),
}

impl StopReason {
    /// More documents may follow in the collection
    pub fn is_resumable(&self) -> bool {
        !matches!(self, StopReason::Exhausted)
    }
}

/// Outcome of one direct-index (phase 1) run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DirectBuildReport {
    pub documents: u32,
    pub empty_documents: u32,
    pub tokens: u64,
    pub pointers: u64,          // sum of distinct terms over documents
    pub unique_terms: u32,
    pub truncated_documents: u32,
    pub stop_reason: StopReason,
}

/// Totals of one inversion batch, folded by the batch loop
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchTotals {
    pub terms: u64,
    pub pointers: u64,
    pub tokens: u64,
}

impl BatchTotals {
    pub fn fold(self, other: BatchTotals) -> BatchTotals {
        BatchTotals {
            terms: self.terms + other.terms,
            pointers: self.pointers + other.pointers,
            tokens: self.tokens + other.tokens,
        }
    }
}

/// Outcome of one inverted-index (phase 2) run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InvertedBuildReport {
    pub skipped: bool,                  // precondition failed, no inverted file written
    pub batches: u32,
    pub totals: BatchTotals,
    pub premature_exhaustions: u32,     // batches that selected nothing before the lexicon ended
    pub peak_batch_pointers: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fold_sums_every_counter() {
        let a = BatchTotals { terms: 2, pointers: 5, tokens: 9 };
        let b = BatchTotals { terms: 1, pointers: 1, tokens: 3 };
        assert_eq!(a.fold(b), BatchTotals { terms: 3, pointers: 6, tokens: 12 });
    }

    #[test]
    fn test_only_exhaustion_is_final() {
        assert!(!StopReason::Exhausted.is_resumable());
        assert!(StopReason::DocumentCap.is_resumable());
        assert!(StopReason::Boundary("d9".to_string()).is_resumable());
    }
}
