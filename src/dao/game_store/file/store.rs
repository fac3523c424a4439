use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
    sync::Arc,
};

use futures::future::BoxFuture;
use tokio::fs;
use tracing::debug;

use crate::dao::{game_store::GameStore, models::LobbyEntity, storage::StorageResult};

use super::error::{FileDaoError, FileResult};

/// Stores the lobby snapshot as pretty-printed JSON at a fixed path.
#[derive(Clone)]
pub struct FileGameStore {
    path: Arc<PathBuf>,
}

impl FileGameStore {
    /// Make sure the parent directory exists and return a store writing to `path`.
    pub async fn open(path: PathBuf) -> FileResult<Self> {
        let store = Self {
            path: Arc::new(path),
        };
        let directory = store.directory();
        fs::create_dir_all(&directory)
            .await
            .map_err(|source| FileDaoError::Directory {
                path: directory.clone(),
                source,
            })?;
        debug!(path = %store.path.display(), "file store ready");
        Ok(store)
    }

    fn directory(&self) -> PathBuf {
        self.path
            .parent()
            .filter(|parent| !parent.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."))
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self.path.as_os_str().to_owned();
        name.push(".tmp");
        PathBuf::from(name)
    }

    async fn write(&self, lobby: &LobbyEntity) -> FileResult<()> {
        let bytes =
            serde_json::to_vec_pretty(lobby).map_err(|source| FileDaoError::Encode { source })?;
        let temp = self.temp_path();
        fs::write(&temp, bytes)
            .await
            .map_err(|source| FileDaoError::Write {
                path: temp.clone(),
                source,
            })?;
        fs::rename(&temp, self.path.as_ref())
            .await
            .map_err(|source| FileDaoError::Write {
                path: self.path.to_path_buf(),
                source,
            })
    }

    async fn read(&self) -> FileResult<Option<LobbyEntity>> {
        let bytes = match fs::read(self.path.as_ref()).await {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(FileDaoError::Read {
                    path: self.path.to_path_buf(),
                    source,
                });
            }
        };
        serde_json::from_slice(&bytes)
            .map(Some)
            .map_err(|source| FileDaoError::Decode {
                path: self.path.to_path_buf(),
                source,
            })
    }
}

impl GameStore for FileGameStore {
    fn save_lobby(&self, lobby: LobbyEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.write(&lobby).await.map_err(Into::into) })
    }

    fn load_lobby(&self) -> BoxFuture<'static, StorageResult<Option<LobbyEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.read().await.map_err(Into::into) })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            let directory = store.directory();
            let metadata = fs::metadata(&directory)
                .await
                .map_err(|source| FileDaoError::Directory {
                    path: directory.clone(),
                    source,
                })?;
            if metadata.permissions().readonly() {
                return Err(FileDaoError::Directory {
                    path: directory,
                    source: std::io::Error::from(ErrorKind::PermissionDenied),
                }
                .into());
            }
            Ok(())
        })
    }
}
