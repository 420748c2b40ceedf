//! Selected-city and favorites state for SkyCast.
//!
//! [`CityStore`] is the single source of truth for which city is selected and
//! which cities are favorited. Changes are published to subscribers and
//! written through a [`StateStorage`] backend.

pub mod persist;
pub mod state;
pub mod store;

pub use persist::{FileStorage, MemoryStorage, StateStorage, StorageError, SNAPSHOT_VERSION, STORAGE_KEY};
pub use state::{normalize, AppState, FavoriteEntry, Snapshot};
pub use store::CityStore;
