//! Usage ledger stores
//!
//! `InMemoryUsageStore` keeps the ledger for the process lifetime only.
//! `JsonFileUsageStore` writes the ledger as pretty JSON through a temporary
//! file and a rename, so a crash mid-write leaves the previous ledger intact.

use std::path::PathBuf;

use async_trait::async_trait;
use shared::{component_debug, Component};
use tokio::fs;
use tokio::sync::Mutex;

use crate::core::usage::UsageLedger;
use crate::error::{OrchestratorError, OrchestratorResult};
use crate::traits::UsageStore;

/// Store that forgets everything on restart
#[derive(Default)]
pub struct InMemoryUsageStore {
    ledger: Mutex<UsageLedger>,
}

impl InMemoryUsageStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UsageStore for InMemoryUsageStore {
    async fn load(&self) -> OrchestratorResult<UsageLedger> {
        Ok(self.ledger.lock().await.clone())
    }

    async fn save(&self, ledger: &UsageLedger) -> OrchestratorResult<()> {
        *self.ledger.lock().await = ledger.clone();
        Ok(())
    }
}

/// Store backed by a JSON file
pub struct JsonFileUsageStore {
    path: PathBuf,
}

impl JsonFileUsageStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "usage.json".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

#[async_trait]
impl UsageStore for JsonFileUsageStore {
    async fn load(&self) -> OrchestratorResult<UsageLedger> {
        let content = match fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                component_debug!(Component::Usage, "📂 No usage file at {}, starting empty", self.path.display());
                return Ok(UsageLedger::default());
            }
            Err(e) => return Err(e.into()),
        };

        serde_json::from_str(&content).map_err(|e| OrchestratorError::StoreError {
            message: format!("corrupt usage file {}: {}", self.path.display(), e),
        })
    }

    async fn save(&self, ledger: &UsageLedger) -> OrchestratorResult<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await?;
        }

        let content = serde_json::to_string_pretty(ledger)?;
        let temp = self.temp_path();
        fs::write(&temp, content).await?;
        fs::rename(&temp, &self.path).await?;
        Ok(())
    }
}
