use std::{
    sync::{Arc, Mutex},
    time::SystemTime,
};

use dashmap::DashMap;
use futures::future::BoxFuture;
use uuid::Uuid;

use crate::dao::{
    game_store::GameStore,
    models::{CommunicationEntity, GameEntity, LobbyEntity, PlayerEntity},
    storage::StorageResult,
};

type CommunicationKey = (Uuid, Uuid, u32);

/// Process-local store, one table per entity. Nothing survives a restart.
#[derive(Clone, Default)]
pub struct MemoryGameStore {
    games: Arc<DashMap<Uuid, GameEntity>>,
    players: Arc<DashMap<Uuid, PlayerEntity>>,
    communications: Arc<DashMap<CommunicationKey, CommunicationEntity>>,
    saved_at: Arc<Mutex<Option<SystemTime>>>,
}

impl MemoryGameStore {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn replace(&self, lobby: LobbyEntity) {
        let game_id = lobby.game.as_ref().map(|game| game.id);
        self.games.retain(|id, _| Some(*id) == game_id);
        if let Some(game) = lobby.game {
            self.games.insert(game.id, game);
        }

        self.players.clear();
        for player in lobby.players {
            self.players.insert(player.id, player);
        }

        self.communications.clear();
        for row in lobby.communications {
            self.communications
                .insert((row.receiver, row.teller, row.round), row);
        }

        if let Ok(mut saved_at) = self.saved_at.lock() {
            *saved_at = Some(lobby.saved_at);
        }
    }

    fn snapshot(&self) -> Option<LobbyEntity> {
        let saved_at = self.saved_at.lock().ok().and_then(|guard| *guard)?;

        let game = self
            .games
            .iter()
            .map(|entry| entry.value().clone())
            .max_by_key(|game| game.created_at);

        let mut players: Vec<PlayerEntity> = self
            .players
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        players.sort_by_key(|player| player.registered_at);

        let mut communications: Vec<CommunicationEntity> = self
            .communications
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        communications.sort_by_key(|row| row.recorded_at);

        Some(LobbyEntity {
            game,
            players,
            communications,
            saved_at,
        })
    }
}

impl GameStore for MemoryGameStore {
    fn save_lobby(&self, lobby: LobbyEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            store.replace(lobby);
            Ok(())
        })
    }

    fn load_lobby(&self) -> BoxFuture<'static, StorageResult<Option<LobbyEntity>>> {
        let store = self.clone();
        Box::pin(async move { Ok(store.snapshot()) })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(async { Ok(()) })
    }
}
