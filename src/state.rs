// State management for docscribe

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};

use crate::config::AppConfig;
use crate::database::DatabaseManager;
use crate::storage::Uploads;
use crate::transcription::TranscriptionService;

/// Shared context handed to every request handler
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: AppConfig,
    database: DatabaseManager,
    uploads: Uploads,
    exports_dir: PathBuf,
    transcription: TranscriptionService,
}

impl AppState {
    pub fn new(config: AppConfig, database: DatabaseManager, uploads: Uploads, transcription: TranscriptionService) -> Self {
        let exports_dir = config.exports_dir();
        Self {
            inner: Arc::new(AppStateInner {
                config,
                database,
                uploads,
                exports_dir,
                transcription,
            }),
        }
    }

    /// Create the data directories, open the database and pick a provider
    pub fn initialize(config: AppConfig) -> Result<Self> {
        std::fs::create_dir_all(&config.data_dir)
            .with_context(|| format!("Failed to create data directory {}", config.data_dir.display()))?;
        std::fs::create_dir_all(config.exports_dir())
            .context("Failed to create exports directory")?;

        let database = DatabaseManager::new(config.db_path())?;
        let uploads = Uploads::open_in(&config.data_dir)?;
        let transcription = TranscriptionService::from_config(&config)
            .context("Failed to initialize transcription provider")?;

        log::info!("Data directory: {}", config.data_dir.display());
        Ok(Self::new(config, database, uploads, transcription))
    }

    pub fn config(&self) -> &AppConfig {
        &self.inner.config
    }

    pub fn db(&self) -> &DatabaseManager {
        &self.inner.database
    }

    pub fn uploads(&self) -> &Uploads {
        &self.inner.uploads
    }

    pub fn exports_dir(&self) -> &Path {
        &self.inner.exports_dir
    }

    pub fn transcription(&self) -> &TranscriptionService {
        &self.inner.transcription
    }
}
