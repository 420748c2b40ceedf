use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identity form of a city name: trimmed and lower-cased.
///
/// All favorite lookups compare normalized names, so "  Paris" and "paris"
/// are the same favorite.
pub fn normalize(name: &str) -> String {
    name.trim().to_lowercase()
}

/// A saved city
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FavoriteEntry {
    /// Display name as first added
    pub name: String,
    /// Normalized name, unique across favorites
    #[serde(default)]
    pub key: String,
    #[serde(default = "Utc::now", with = "chrono::serde::ts_milliseconds")]
    pub added_at: DateTime<Utc>,
}

impl FavoriteEntry {
    pub fn new(name: &str, added_at: DateTime<Utc>) -> Self {
        Self {
            name: name.trim().to_string(),
            key: normalize(name),
            added_at,
        }
    }
}

/// The persisted subset of store state
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub city: String,
    /// Most recently added first
    #[serde(default)]
    pub favorites: Vec<FavoriteEntry>,
}

/// Everything subscribers can observe.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AppState {
    /// Trimmed; empty means no city selected
    pub city: String,
    pub favorites: Vec<FavoriteEntry>,
    /// A geolocation lookup is in flight. Never persisted.
    pub locating: bool,
}

impl AppState {
    pub fn from_snapshot(snapshot: Snapshot) -> Self {
        Self {
            city: snapshot.city,
            favorites: snapshot.favorites,
            locating: false,
        }
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            city: self.city.clone(),
            favorites: self.favorites.clone(),
        }
    }

    pub fn has_city(&self) -> bool {
        !self.city.is_empty()
    }

    pub fn is_favorite(&self, name: &str) -> bool {
        let key = normalize(name);
        self.favorites.iter().any(|f| f.key == key)
    }
}
