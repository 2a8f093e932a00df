// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Central service layer — initialises every backend subsystem once and hands
// the request handlers cheap clones of them.
//
// The job registry is shared between the executor (writer) and the
// certification coordinator (reader); the ledger store is shared between the
// coordinator and the ledger endpoints.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::info;

use wipewerk_cert::{CertificationCoordinator, CoordinatorSettings};
use wipewerk_core::AppConfig;
use wipewerk_core::error::{Result, WipewerkError};
use wipewerk_ledger::LedgerStore;
use wipewerk_wipe::{DeviceInventory, JobRegistry, WipeExecutor, executor::ExecutorConfig};

use super::data_dir;

/// Shared application services, passed to every handler as router state.
///
/// All fields are Arc-backed, so cloning is cheap.
#[derive(Clone)]
pub struct AppServices {
    executor: WipeExecutor,
    inventory: DeviceInventory,
    coordinator: Arc<CertificationCoordinator>,
    ledger: Arc<LedgerStore>,
    data_dir: PathBuf,
    config: Arc<AppConfig>,
}

impl AppServices {
    /// Initialise from the default data directory and its `config.json`.
    pub fn init() -> Result<Self> {
        let dir = data_dir::data_dir()?;
        let config = AppConfig::load_or_create(&dir)?;
        Self::open(dir, config)
    }

    /// Initialise all services rooted at `data_dir`.
    ///
    /// Opens (or creates) the ledger and the certificates directory.  No wipe
    /// jobs survive a restart.
    pub fn open(data_dir: PathBuf, config: AppConfig) -> Result<Self> {
        info!(path = %data_dir.display(), "initialising app services");
        std::fs::create_dir_all(&data_dir)?;

        let ledger = Arc::new(LedgerStore::open(data_dir.join(&config.ledger_file))?);
        let registry = JobRegistry::new();
        let inventory = DeviceInventory::from_config(&config);
        let executor = WipeExecutor::new(registry.clone(), ExecutorConfig::from(&config));
        let coordinator = CertificationCoordinator::new(
            Arc::clone(&ledger),
            registry,
            inventory.clone(),
            CoordinatorSettings::from_config(&config, &data_dir),
        )?;

        info!("app services initialised");
        Ok(Self {
            executor,
            inventory,
            coordinator: Arc::new(coordinator),
            ledger,
            data_dir,
            config: Arc::new(config),
        })
    }

    pub fn executor(&self) -> &WipeExecutor {
        &self.executor
    }

    pub fn registry(&self) -> &JobRegistry {
        self.executor.registry()
    }

    pub fn inventory(&self) -> &DeviceInventory {
        &self.inventory
    }

    pub fn coordinator(&self) -> &CertificationCoordinator {
        &self.coordinator
    }

    pub fn ledger(&self) -> &LedgerStore {
        &self.ledger
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Where ledger exports are written.
    pub fn exports_dir(&self) -> PathBuf {
        self.data_dir.join(&self.config.exports_dir)
    }

    /// Run synchronous ledger or document work on tokio's blocking pool.
    ///
    /// The ledger store holds a std mutex across whole-file reads and
    /// writes, so handlers must not call it on an async worker.
    pub async fn blocking<T, F>(&self, work: F) -> Result<T>
    where
        F: FnOnce(&AppServices) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let svc = self.clone();
        tokio::task::spawn_blocking(move || work(&svc))
            .await
            .map_err(|e| WipewerkError::Io(std::io::Error::other(e)))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_creates_ledger_and_certificate_dir() {
        let dir = tempfile::tempdir().unwrap();
        let svc = AppServices::open(dir.path().join("data"), AppConfig::default()).unwrap();

        assert!(svc.data_dir().join("ledger.json").is_file());
        assert!(svc.data_dir().join("certificates").is_dir());
        assert_eq!(svc.ledger().stats().unwrap().total_blocks, 1);
        assert_eq!(svc.exports_dir(), svc.data_dir().join("exports"));
        assert!(svc.registry().is_empty());
    }

    #[tokio::test]
    async fn blocking_work_runs_off_the_async_workers() {
        let dir = tempfile::tempdir().unwrap();
        let svc = AppServices::open(dir.path().to_path_buf(), AppConfig::default()).unwrap();

        let stats = svc.blocking(|s| s.ledger().stats()).await.unwrap();
        assert_eq!(stats.total_blocks, 1);

        let failed: Result<()> = svc
            .blocking(|_| Err(WipewerkError::NotFound("x".into())))
            .await;
        assert!(matches!(failed, Err(WipewerkError::NotFound(_))));

        let panicked: Result<()> = svc.blocking(|_| panic!("worker died")).await;
        assert!(matches!(panicked, Err(WipewerkError::Io(_))));
    }

    #[test]
    fn reopening_keeps_the_ledger() {
        let dir = tempfile::tempdir().unwrap();
        let first = AppServices::open(dir.path().to_path_buf(), AppConfig::default()).unwrap();
        let genesis = first.ledger().snapshot().unwrap().blocks[0].block_hash.clone();
        drop(first);

        let second = AppServices::open(dir.path().to_path_buf(), AppConfig::default()).unwrap();
        assert_eq!(second.ledger().snapshot().unwrap().blocks[0].block_hash, genesis);
    }
}
