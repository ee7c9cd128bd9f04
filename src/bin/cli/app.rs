use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use lexqa_lib::assistant::AssistantContext;
use lexqa_lib::config::Config;
use lexqa_lib::embedding::{self, Embedder};
use lexqa_lib::rag::VectorIndex;

/// Command-line overrides applied on top of the configuration file
#[derive(Debug, Default)]
pub struct Overrides {
    pub source_dir: Option<PathBuf>,
    pub index_path: Option<PathBuf>,
    pub top_k: Option<usize>,
}

/// Shared application state for CLI commands
pub struct App {
    pub config: Config,
}

impl App {
    /// Load the configuration (explicit path, `lexqa.toml`, or defaults)
    /// and apply overrides.
    pub fn new(config_path: Option<&Path>, overrides: Overrides) -> Result<Self> {
        let mut config = Config::load(config_path).context("Failed to load configuration")?;

        if let Some(dir) = overrides.source_dir {
            config.paths.source_dir = dir;
        }
        if let Some(path) = overrides.index_path {
            config.paths.index_path = path;
        }
        if let Some(k) = overrides.top_k {
            config.retrieval.top_k = k;
        }
        config.validate().context("Invalid configuration")?;

        log::debug!("Using configuration: {:?}", config);
        Ok(Self { config })
    }

    /// Build the configured embedding provider
    pub fn embedder(&self) -> Result<Box<dyn Embedder>> {
        embedding::from_config(&self.config.embedding).with_context(|| {
            format!(
                "Failed to initialize embedding model '{}'",
                self.config.embedding.model
            )
        })
    }

    /// Open the persisted index without checking which model built it
    pub fn index(&self) -> Result<VectorIndex> {
        VectorIndex::load(&self.config.paths.index_path)
            .context("Failed to open index (run `lexqa ingest` first?)")
    }

    /// Load everything a question-answering turn needs
    pub fn assistant(&self) -> Result<AssistantContext> {
        AssistantContext::from_config(&self.config).context("Failed to start assistant")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_overrides_replace_file_values() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("lexqa.toml");
        std::fs::write(&path, "[retrieval]\ntop_k = 5\n").unwrap();

        let app = App::new(
            Some(&path),
            Overrides {
                source_dir: Some(PathBuf::from("pdfs")),
                index_path: None,
                top_k: Some(7),
            },
        )
        .unwrap();

        assert_eq!(app.config.paths.source_dir, PathBuf::from("pdfs"));
        assert_eq!(app.config.retrieval.top_k, 7);
    }

    #[test]
    fn test_zero_top_k_is_rejected() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("lexqa.toml");
        std::fs::write(&path, "").unwrap();

        let result = App::new(
            Some(&path),
            Overrides {
                top_k: Some(0),
                ..Default::default()
            },
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_missing_index_is_reported() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("lexqa.toml");
        std::fs::write(&path, "").unwrap();

        let app = App::new(
            Some(&path),
            Overrides {
                index_path: Some(temp.path().join("absent.sqlite")),
                ..Default::default()
            },
        )
        .unwrap();
        match app.index() {
            Err(err) => assert!(format!("{:#}", err).contains("Vector index not found")),
            Ok(_) => panic!("expected a missing index"),
        }
    }
}
