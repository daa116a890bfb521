pub mod auth;
pub mod board;
pub mod gunsmith;
pub mod identity;
pub mod markers;
pub mod profile;
pub mod seed;
pub mod storage;
pub mod votes;

// Re-export the service types wired into AppState
pub use auth::AuthService;
pub use board::BoardService;
pub use gunsmith::ModService;
pub use identity::IdentityResolver;
pub use markers::MarkerService;
pub use profile::{InMemoryProfileStore, ProfileService, ProfileStore, RemoteProfileStore};
pub use seed::SeedData;
pub use storage::{CollectionStore, DurableStorage, FileStorage, MemoryStorage};
