use axum::extract::FromRef;

use crate::music_store::MusicStore;
use crate::user::UserManager;
use std::sync::Arc;
use std::time::Instant;

use super::ServerConfig;

pub type GuardedMusicStore = Arc<dyn MusicStore>;
pub type GuardedUserManager = Arc<UserManager>;

#[derive(Clone)]
pub struct ServerState {
    pub config: ServerConfig,
    pub start_time: Instant,
    pub music_store: GuardedMusicStore,
    pub user_manager: GuardedUserManager,
    pub hash: String,
}

impl ServerState {
    pub fn new(
        config: ServerConfig,
        music_store: GuardedMusicStore,
        user_manager: GuardedUserManager,
    ) -> ServerState {
        ServerState {
            config,
            start_time: Instant::now(),
            music_store,
            user_manager,
            hash: env!("CARGO_PKG_VERSION").to_owned(),
        }
    }
}

impl FromRef<ServerState> for GuardedMusicStore {
    fn from_ref(input: &ServerState) -> Self {
        input.music_store.clone()
    }
}

impl FromRef<ServerState> for GuardedUserManager {
    fn from_ref(input: &ServerState) -> Self {
        input.user_manager.clone()
    }
}

impl FromRef<ServerState> for ServerConfig {
    fn from_ref(input: &ServerState) -> Self {
        input.config.clone()
    }
}
