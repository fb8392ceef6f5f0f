use serde::{Serialize, Deserialize};
use std::fmt;

/// Dense document identifier, assigned in arrival order starting at 0
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DocId(pub u32);

impl DocId {
    pub fn new(id: u32) -> Self {
        DocId(id)
    }

    pub fn value(&self) -> u32 {
        self.0
    }
}

impl From<u32> for DocId {
    fn from(id: u32) -> Self {
        DocId(id)
    }
}

impl fmt::Display for DocId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Dense term identifier, assigned in first-seen order during the direct pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TermId(pub u32);

impl TermId {
    pub fn value(&self) -> u32 {
        self.0
    }
}

impl From<u32> for TermId {
    fn from(id: u32) -> Self {
        TermId(id)
    }
}

impl fmt::Display for TermId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Set of field indexes active for a token (bit i = field i)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct FieldSet(pub u64);

impl FieldSet {
    pub const MAX_FIELDS: usize = 64;

    pub fn empty() -> Self {
        FieldSet(0)
    }

    pub fn single(index: usize) -> Self {
        FieldSet(1u64 << index)
    }

    pub fn insert(&mut self, index: usize) {
        self.0 |= 1u64 << index;
    }

    pub fn contains(&self, index: usize) -> bool {
        index < Self::MAX_FIELDS && self.0 & (1u64 << index) != 0
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        (0..Self::MAX_FIELDS).filter(move |i| self.contains(*i))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_set_membership() {
        let mut set = FieldSet::empty();
        assert!(set.is_empty());
        set.insert(0);
        set.insert(3);
        assert!(set.contains(0));
        assert!(!set.contains(1));
        assert_eq!(set.iter().collect::<Vec<_>>(), vec![0, 3]);
        assert!(!set.contains(200));
    }
}
