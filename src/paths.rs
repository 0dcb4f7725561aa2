//! Dataset and store locations relative to the project root.

use std::path::{Path, PathBuf};

use crate::config::{AppConfig, PathsConfig};

pub const RAW_STATEMENTS_FILE: &str = "fact_checking_with_verdict.parquet";
pub const SCORED_STATEMENTS_FILE: &str = "processed_fact_checking_with_scores.parquet";
pub const PARTY_AVERAGES_FILE: &str = "average_by_party.parquet";
pub const AUTHOR_AVERAGES_FILE: &str = "average_by_author.parquet";

#[derive(Debug, Clone)]
pub struct ProjectPaths {
    root: PathBuf,
    datasets_dir: PathBuf,
}

impl ProjectPaths {
    pub fn new(root: impl Into<PathBuf>, datasets_dir: impl AsRef<Path>) -> Self {
        let root = root.into();
        let datasets_dir = root.join(datasets_dir);
        Self { root, datasets_dir }
    }

    pub fn from_config(config: &PathsConfig) -> Self {
        let root = if config.root.is_empty() {
            PathBuf::from(".")
        } else {
            PathBuf::from(&config.root)
        };
        Self::new(root, &config.datasets_dir)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn datasets_dir(&self) -> &Path {
        &self.datasets_dir
    }

    pub fn dataset(&self, file_name: &str) -> PathBuf {
        self.datasets_dir.join(file_name)
    }

    pub fn raw_statements(&self) -> PathBuf {
        self.dataset(RAW_STATEMENTS_FILE)
    }

    pub fn scored_statements(&self) -> PathBuf {
        self.dataset(SCORED_STATEMENTS_FILE)
    }

    pub fn party_averages(&self) -> PathBuf {
        self.dataset(PARTY_AVERAGES_FILE)
    }

    pub fn author_averages(&self) -> PathBuf {
        self.dataset(AUTHOR_AVERAGES_FILE)
    }

    /// Resolve a configured path; absolute paths pass through unchanged.
    pub fn resolve(&self, path: &str) -> PathBuf {
        let p = Path::new(path);
        if p.is_absolute() {
            p.to_path_buf()
        } else {
            self.root.join(p)
        }
    }

    pub fn database(&self, config: &AppConfig) -> PathBuf {
        self.resolve(&config.storage.database_path)
    }

    pub fn charts_dir(&self, config: &AppConfig) -> PathBuf {
        self.resolve(&config.analysis.output_dir)
    }
}
