use std::fs;
use std::io::Write;
use chrono::{DateTime, Utc};
use serde::{Serialize, Deserialize};
use tempfile::NamedTempFile;
use crate::core::config::BlockConfig;
use crate::core::error::{Error, Result};
use crate::core::stats::StopReason;
use crate::index::posting::PostingLayout;
use crate::storage::layout::IndexLayout;

/// Index-wide statistics and build flags, stored as `properties.json`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexProperties {
    pub version: u32,
    pub built_at: DateTime<Utc>,
    pub num_documents: u32,
    pub num_terms: u32,
    pub num_tokens: u64,
    pub num_pointers: u64,
    pub fields: Vec<String>,
    pub blocks: Option<BlockConfig>,
    pub posting_layout: PostingLayout,
    pub pipeline: Vec<String>,
    pub stop_reason: StopReason,
    pub inverted_built: bool,
}

impl IndexProperties {
    pub const VERSION: u32 = 1;

    pub fn load(layout: &IndexLayout) -> Result<Self> {
        let path = layout.properties_path();
        let data = fs::read_to_string(&path).map_err(|e| Error::io_context("properties", &path, e))?;
        Ok(serde_json::from_str(&data)?)
    }

    /// Write-new then rename, so readers never see a partial file
    pub fn save(&self, layout: &IndexLayout) -> Result<()> {
        let path = layout.properties_path();
        let io = |e| Error::io_context("properties", &path, e);

        let mut tmp = NamedTempFile::new_in(layout.dir()).map_err(io)?;
        let data = serde_json::to_vec_pretty(self)?;
        tmp.write_all(&data).map_err(io)?;
        tmp.as_file().sync_all().map_err(io)?;
        tmp.persist(&path).map_err(|e| io(e.error))?;
        Ok(())
    }

    pub fn field_count(&self) -> usize {
        self.posting_layout.field_count
    }
}
