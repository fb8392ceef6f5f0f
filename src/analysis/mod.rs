pub mod filter;
pub mod filters;
pub mod pipeline;
pub mod tokenizer;
