pub mod batch;
pub mod scanning;
pub mod direct;
pub mod inverted;
pub mod indexer;
