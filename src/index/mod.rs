pub mod posting;
pub mod accumulator;
pub mod lexicon;
pub mod lexicon_merge;
pub mod document_index;
pub mod meta_index;
pub mod properties;
pub mod reader;
