use std::path::{Path, PathBuf};
use std::fs;
use crate::core::error::{Error, Result};

/// Directory + prefix naming every structure of one index
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexLayout {
    pub dir: PathBuf,       // Index directory
    pub prefix: String,     // e.g. "data" -> data.direct.bf, data.lexicon.lex, ...
}

impl IndexLayout {
    pub fn new(dir: impl Into<PathBuf>, prefix: &str) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|e| Error::io_context("index directory", &dir, e))?;

        Ok(IndexLayout {
            dir,
            prefix: prefix.to_string(),
        })
    }

    /// Layout of the n-th shard sharing this directory (n = 0 is this layout)
    pub fn shard(&self, n: usize) -> IndexLayout {
        let prefix = if n == 0 {
            self.prefix.clone()
        } else {
            format!("{}_{}", self.prefix, n)
        };
        IndexLayout {
            dir: self.dir.clone(),
            prefix,
        }
    }

    pub fn structure_path(&self, structure: &str) -> PathBuf {
        self.dir.join(format!("{}.{}", self.prefix, structure))
    }

    pub fn direct_path(&self) -> PathBuf {
        self.structure_path("direct.bf")
    }

    pub fn inverted_path(&self) -> PathBuf {
        self.structure_path("inverted.bf")
    }

    /// Phase-2 output until it is renamed over `inverted_path`
    pub fn inverted_tmp_path(&self) -> PathBuf {
        self.structure_path("inverted.bf.tmp")
    }

    pub fn lexicon_path(&self) -> PathBuf {
        self.structure_path("lexicon.lex")
    }

    pub fn lexicon_tmp_path(&self) -> PathBuf {
        self.structure_path("lexicon.lex.tmp")
    }

    pub fn lexicon_fst_path(&self) -> PathBuf {
        self.structure_path("lexicon.fst")
    }

    pub fn lexicon_run_path(&self, run: usize) -> PathBuf {
        self.structure_path(&format!("lexicon.run{:04}", run))
    }

    pub fn offsets_path(&self) -> PathBuf {
        self.structure_path("lexicon.offsets")
    }

    pub fn document_index_path(&self) -> PathBuf {
        self.structure_path("document.idx")
    }

    pub fn meta_path(&self) -> PathBuf {
        self.structure_path("meta.idx")
    }

    pub fn properties_path(&self) -> PathBuf {
        self.structure_path("properties.json")
    }

    pub fn lock_path(&self) -> PathBuf {
        self.dir.join(format!(".{}.lock", self.prefix))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Phase-1 outputs are present
    pub fn exists(&self) -> bool {
        self.properties_path().exists()
    }

    /// Delete every structure of this index that exists
    pub fn remove(&self) -> Result<()> {
        let paths = [
            self.direct_path(),
            self.inverted_path(),
            self.inverted_tmp_path(),
            self.lexicon_path(),
            self.lexicon_tmp_path(),
            self.lexicon_fst_path(),
            self.offsets_path(),
            self.document_index_path(),
            self.meta_path(),
            self.properties_path(),
        ];
        for path in paths.iter().filter(|p| p.exists()) {
            fs::remove_file(path).map_err(|e| Error::io_context("index structure", path, e))?;
        }
        Ok(())
    }
}
