//! Seed files
//!
//! A seed is a JSON or TOML document `{ "entities": [...] }` describing the
//! starting contents of a session store. Seeds are only ever read.

use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::application::EntityStore;
use crate::domain::rules::validate_graph;
use crate::domain::Entity;
use crate::infrastructure::traits::FileSystem;
use crate::infrastructure::{InfraError, InfraResult};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeedDocument {
    #[serde(default)]
    pub entities: Vec<Entity>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeedFormat {
    Json,
    Toml,
}

impl SeedFormat {
    /// `.toml` files are TOML, anything else is read as JSON.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("toml") => SeedFormat::Toml,
            _ => SeedFormat::Json,
        }
    }
}

/// Reads seed documents through the [`FileSystem`] port.
pub struct SeedLoader {
    fs: Arc<dyn FileSystem>,
}

impl SeedLoader {
    pub fn new(fs: Arc<dyn FileSystem>) -> Self {
        Self { fs }
    }

    pub fn parse(content: &str, format: SeedFormat, path: &Path) -> InfraResult<SeedDocument> {
        match format {
            SeedFormat::Json => {
                serde_json::from_str(content).map_err(|e| InfraError::seed(path, e.to_string()))
            }
            SeedFormat::Toml => {
                toml::from_str(content).map_err(|e| InfraError::seed(path, e.to_string()))
            }
        }
    }

    /// Read and parse a seed file without checking the ownership graph.
    #[instrument(level = "debug", skip(self), fields(path = %path.display()))]
    pub fn read(&self, path: &Path) -> InfraResult<SeedDocument> {
        if !self.fs.is_file(path) {
            return Err(InfraError::io(
                format!("seed file not found: {}", path.display()),
                std::io::Error::new(std::io::ErrorKind::NotFound, "file does not exist"),
            ));
        }
        let content = self
            .fs
            .read_to_string(path)
            .map_err(|e| InfraError::io(format!("read seed file {}", path.display()), e))?;
        let document = Self::parse(&content, SeedFormat::from_path(path), path)?;
        debug!("read: {} entities", document.entities.len());
        Ok(document)
    }

    /// Read a seed file and check it as a whole graph: unique ids, parent
    /// references, no cycles. Entity order in the file does not matter.
    pub fn check(&self, path: &Path) -> InfraResult<Vec<Entity>> {
        let document = self.read(path)?;
        let entities: Vec<Arc<Entity>> = document.entities.into_iter().map(Arc::new).collect();
        validate_graph(&entities)?;
        Ok(entities
            .into_iter()
            .map(|e| Arc::try_unwrap(e).unwrap_or_else(|shared| shared.as_ref().clone()))
            .collect())
    }

    /// Build a session store from a seed file.
    pub fn load(&self, path: &Path) -> InfraResult<EntityStore> {
        let document = self.read(path)?;
        Ok(EntityStore::from_entities(document.entities)?)
    }
}
