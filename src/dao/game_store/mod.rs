pub mod file;
pub mod memory;

use std::sync::Arc;

use futures::future::BoxFuture;

use crate::{
    config::StoreConfig,
    dao::{models::LobbyEntity, storage::StorageResult},
};

pub use self::{file::FileGameStore, memory::MemoryGameStore};

/// Abstraction over the persistence layer for lobby snapshots.
pub trait GameStore: Send + Sync {
    /// Replace the stored snapshot.
    fn save_lobby(&self, lobby: LobbyEntity) -> BoxFuture<'static, StorageResult<()>>;
    /// Latest stored snapshot, if one was ever saved.
    fn load_lobby(&self) -> BoxFuture<'static, StorageResult<Option<LobbyEntity>>>;
    /// Cheap probe used by the storage supervisor.
    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>>;
}

/// Open the backend selected in the configuration.
pub async fn open(config: &StoreConfig) -> StorageResult<Arc<dyn GameStore>> {
    match config {
        StoreConfig::Memory => Ok(Arc::new(MemoryGameStore::new())),
        StoreConfig::File(path) => {
            let store = FileGameStore::open(path.clone()).await?;
            Ok(Arc::new(store))
        }
    }
}
