use std::sync::Arc;
use tracing::info;

use crate::{
    config::Config,
    error::Result,
    services::{
        AuthService, BoardService, CollectionStore, DurableStorage, FileStorage, IdentityResolver,
        InMemoryProfileStore, MarkerService, MemoryStorage, ModService, ProfileService,
        ProfileStore, RemoteProfileStore, SeedData,
    },
};

/// Shared application state.
///
/// One instance stands for one browser profile: a single durable store and a
/// single voted-set namespace.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,

    pub auth_service: AuthService,

    pub board_service: BoardService,

    pub mod_service: ModService,

    pub marker_service: MarkerService,

    pub profile_service: ProfileService,
}

impl AppState {
    /// Builds the backends named by `config` and wires the services.
    pub fn from_config(config: Config) -> Result<Self> {
        let storage: Arc<dyn DurableStorage> = if config.uses_memory_storage() {
            info!("Using in-memory storage");
            Arc::new(MemoryStorage::new())
        } else {
            info!("Using file storage at {}", config.data_dir.display());
            Arc::new(FileStorage::new(&config.data_dir)?)
        };

        let profiles: Arc<dyn ProfileStore> = if config.profile_store == "remote" {
            info!("Using remote profile store");
            Arc::new(RemoteProfileStore::from_config(&config)?)
        } else {
            Arc::new(InMemoryProfileStore::new())
        };

        let seed = SeedData::load(config.seed_dir.as_deref())?;

        Ok(Self::assemble(config, storage, profiles, seed))
    }

    pub fn assemble(
        config: Config,
        storage: Arc<dyn DurableStorage>,
        profiles: Arc<dyn ProfileStore>,
        seed: SeedData,
    ) -> Self {
        let store = CollectionStore::new(storage);
        let resolver = IdentityResolver::new(profiles.clone());
        let limits = config.content_limits();

        Self {
            auth_service: AuthService::new(&config),
            board_service: BoardService::new(store.clone(), seed.posts, resolver.clone(), limits),
            mod_service: ModService::new(seed.mods, seed.weapons, resolver),
            marker_service: MarkerService::new(store),
            profile_service: ProfileService::new(profiles, limits.min_nickname_length),
            config,
        }
    }
}
