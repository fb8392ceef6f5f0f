use std::sync::Arc;
use rayon::prelude::*;
use serde::{Serialize, Deserialize};
use tracing::info;
use crate::analysis::pipeline::{Pipeline, TermPipeline};
use crate::builder::direct::DirectIndexBuilder;
use crate::builder::inverted::InvertedIndexBuilder;
use crate::builder::scanning::ScannerRegistry;
use crate::collection::document::Collection;
use crate::core::config::{IndexerConfig, ScanningStrategy};
use crate::core::error::{Error, ErrorKind, Result};
use crate::core::stats::{DirectBuildReport, InvertedBuildReport};
use crate::storage::layout::IndexLayout;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexReport {
    pub direct: DirectBuildReport,
    pub inverted: InvertedBuildReport,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShardReport {
    pub prefix: String,
    pub direct: DirectBuildReport,
    pub inverted: InvertedBuildReport,
}

/// Runs both phases: direct index then inversion
pub struct Indexer {
    pub config: IndexerConfig,
    pub threads: usize,     // shard inversion workers
    pipeline: Arc<dyn TermPipeline>,
    registry: ScannerRegistry,
}

impl Indexer {
    pub fn new(config: IndexerConfig) -> Result<Self> {
        config.validate()?;
        let pipeline = Pipeline::from_names(&config.pipeline)?;
        Ok(Indexer {
            config,
            threads: num_cpus::get(),
            pipeline: Arc::new(pipeline),
            registry: ScannerRegistry::with_builtins(),
        })
    }

    pub fn with_pipeline(mut self, pipeline: Arc<dyn TermPipeline>) -> Self {
        self.pipeline = pipeline;
        self
    }

    pub fn with_registry(mut self, registry: ScannerRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn layout(&self) -> Result<IndexLayout> {
        IndexLayout::new(&self.config.index_dir, &self.config.prefix)
    }

    /// Build one index from the collection. Shard limits in the config
    /// still stop phase 1 early; use `index_shards` to consume everything.
    pub fn index(&self, collection: &mut dyn Collection) -> Result<IndexReport> {
        let layout = self.layout()?;
        let direct = DirectIndexBuilder::with_pipeline(layout.clone(), &self.config, self.pipeline.clone())?
            .build(collection)?;
        let inverted = InvertedIndexBuilder::with_registry(layout, &self.config, &self.registry)?.build()?;
        Ok(IndexReport { direct, inverted })
    }

    /// Split the collection into shards `prefix`, `prefix_1`, ... then
    /// invert them in parallel
    pub fn index_shards(&self, collection: &mut dyn Collection) -> Result<Vec<ShardReport>> {
        let base = self.layout()?;
        let mut shards = Vec::new();

        loop {
            let layout = base.shard(shards.len());
            let direct = DirectIndexBuilder::with_pipeline(layout.clone(), &self.config, self.pipeline.clone())?
                .build(collection)?;

            // a limit hit on the last document leaves an empty trailing run
            if direct.documents == 0 && !shards.is_empty() {
                layout.remove()?;
                break;
            }
            let resumable = direct.stop_reason.is_resumable();
            shards.push((layout, direct));
            if !resumable {
                break;
            }
        }
        info!(phase = "direct", shards = shards.len(), "collection split into shards");

        let config = self.shard_config(shards.len());
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.threads.clamp(1, shards.len()))
            .build()
            .map_err(|e| Error::new(ErrorKind::Internal, format!("cannot start inversion workers: {}", e)))?;

        let inverted: Vec<InvertedBuildReport> = pool.install(|| {
            shards.par_iter()
                .map(|(layout, _)| {
                    InvertedIndexBuilder::with_registry(layout.clone(), &config, &self.registry)?.build()
                })
                .collect::<Result<Vec<_>>>()
        })?;

        Ok(shards.into_iter()
            .zip(inverted)
            .map(|((layout, direct), inverted)| ShardReport {
                prefix: layout.prefix,
                direct,
                inverted,
            })
            .collect())
    }

    /// Memory budgets are shared by all concurrently inverted shards
    fn shard_config(&self, shards: usize) -> IndexerConfig {
        let mut config = self.config.clone();
        if let ScanningStrategy::Memory { processes, .. } = &mut config.scanning {
            *processes = (*processes).max(shards);
        }
        config
    }
}
