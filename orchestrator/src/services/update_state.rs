//! Auto-update state stores
//!
//! The state is a small JSON document. `RepoUpdateStateStore` keeps it in
//! the campaign repository next to the site, so scheduled runs on fresh
//! machines share it. `JsonFileUpdateStateStore` keeps it on local disk.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use shared::{component_debug, Component};
use tokio::fs;
use tokio::sync::Mutex;

use crate::core::auto_update::AutoUpdateState;
use crate::error::{OrchestratorError, OrchestratorResult};
use crate::traits::{Publisher, UpdateStateStore};

pub const STATE_FILE: &str = "update_state.json";

const STATE_COMMIT_MESSAGE: &str = "Update auto-updater state";

fn parse_state(text: &str, origin: &str) -> OrchestratorResult<AutoUpdateState> {
    serde_json::from_str(text).map_err(|e| OrchestratorError::StoreError {
        message: format!("corrupt auto-update state {origin}: {e}"),
    })
}

#[derive(Default)]
pub struct InMemoryUpdateStateStore {
    state: Mutex<AutoUpdateState>,
}

impl InMemoryUpdateStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_state(state: AutoUpdateState) -> Self {
        Self {
            state: Mutex::new(state),
        }
    }
}

#[async_trait]
impl UpdateStateStore for InMemoryUpdateStateStore {
    async fn load(&self) -> OrchestratorResult<AutoUpdateState> {
        Ok(self.state.lock().await.clone())
    }

    async fn save(&self, state: &AutoUpdateState) -> OrchestratorResult<()> {
        *self.state.lock().await = state.clone();
        Ok(())
    }
}

pub struct JsonFileUpdateStateStore {
    path: PathBuf,
}

impl JsonFileUpdateStateStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl UpdateStateStore for JsonFileUpdateStateStore {
    async fn load(&self) -> OrchestratorResult<AutoUpdateState> {
        match fs::read_to_string(&self.path).await {
            Ok(text) => parse_state(&text, &self.path.display().to_string()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                component_debug!(Component::AutoUpdate, "📂 No state at {}, starting empty", self.path.display());
                Ok(AutoUpdateState::default())
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn save(&self, state: &AutoUpdateState) -> OrchestratorResult<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await?;
        }

        let mut temp = self.path.clone().into_os_string();
        temp.push(".tmp");
        fs::write(&temp, serde_json::to_string_pretty(state)?).await?;
        fs::rename(&temp, &self.path).await?;
        Ok(())
    }
}

/// State kept as `update_state.json` in a repository
pub struct RepoUpdateStateStore {
    publisher: Arc<dyn Publisher>,
    repo: String,
}

impl RepoUpdateStateStore {
    pub fn new(publisher: Arc<dyn Publisher>, repo: impl Into<String>) -> Self {
        Self {
            publisher,
            repo: repo.into(),
        }
    }
}

#[async_trait]
impl UpdateStateStore for RepoUpdateStateStore {
    async fn load(&self) -> OrchestratorResult<AutoUpdateState> {
        match self.publisher.fetch(&self.repo, STATE_FILE).await? {
            Some(text) => parse_state(&text, &format!("{}/{}", self.repo, STATE_FILE)),
            None => Ok(AutoUpdateState::default()),
        }
    }

    async fn save(&self, state: &AutoUpdateState) -> OrchestratorResult<()> {
        let content = serde_json::to_string_pretty(state)?;
        self.publisher
            .publish(&self.repo, STATE_FILE, &content, STATE_COMMIT_MESSAGE)
            .await?;
        Ok(())
    }
}
