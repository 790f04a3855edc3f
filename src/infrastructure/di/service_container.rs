//! Service container for dependency injection
//!
//! Wires up the session store and services with their dependencies.

use std::path::Path;
use std::sync::Arc;

use crate::application::{EntityStore, OwnershipService};
use crate::config::Settings;
use crate::infrastructure::seed::SeedLoader;
use crate::infrastructure::traits::{FileSystem, RealFileSystem};
use crate::infrastructure::InfraResult;

/// Container holding the services of one session.
pub struct ServiceContainer {
    /// Application settings
    pub settings: Arc<Settings>,

    /// Filesystem abstraction
    pub fs: Arc<dyn FileSystem>,

    /// Session store shared by all services
    pub store: Arc<EntityStore>,

    pub ownership: OwnershipService,
}

impl ServiceContainer {
    /// Create a container with an empty store and real implementations.
    pub fn new(settings: Settings) -> Self {
        Self::with_deps(settings, Arc::new(RealFileSystem), EntityStore::new())
    }

    /// Create a container whose store is loaded from a seed file.
    pub fn from_seed(settings: Settings, fs: Arc<dyn FileSystem>, seed: &Path) -> InfraResult<Self> {
        let store = SeedLoader::new(Arc::clone(&fs)).load(seed)?;
        Ok(Self::with_deps(settings, fs, store))
    }

    /// Create a container with custom dependencies (for testing).
    pub fn with_deps(settings: Settings, fs: Arc<dyn FileSystem>, store: EntityStore) -> Self {
        let settings = Arc::new(settings);
        let store = Arc::new(store);
        let ownership = OwnershipService::new(Arc::clone(&store), settings.root_name.clone());

        Self {
            settings,
            fs,
            store,
            ownership,
        }
    }

    pub fn seed_loader(&self) -> SeedLoader {
        SeedLoader::new(Arc::clone(&self.fs))
    }
}
