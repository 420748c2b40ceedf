//! The city store: selected city, favorites, subscriptions and persistence.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use skycast_weather::location::{locate_once, DEFAULT_LOCATION_TIMEOUT};
use skycast_weather::{LocationProvider, NoLocation, ReverseGeocoder};
use tokio::sync::watch;

use crate::persist::StateStorage;
use crate::state::{normalize, AppState, FavoriteEntry, Snapshot};

/// Shared state container for the selected city and favorites.
///
/// Construct one per session and pass it around behind an `Arc`. Every
/// mutation is applied synchronously, written to storage, then published to
/// subscribers. Operations never fail; storage errors are logged.
pub struct CityStore {
    state: watch::Sender<AppState>,
    storage: Arc<dyn StateStorage>,
    location: Arc<dyn LocationProvider>,
    geocoder: Option<Arc<dyn ReverseGeocoder>>,
    location_timeout: Duration,
}

impl CityStore {
    /// Create a store seeded from whatever `storage` holds.
    ///
    /// Falls back to no city and no favorites when nothing usable is stored.
    pub fn new(storage: Arc<dyn StateStorage>) -> Self {
        let snapshot = storage.load().unwrap_or_default();
        tracing::info!(
            "City store loaded: city={:?}, {} favorites",
            snapshot.city,
            snapshot.favorites.len()
        );

        let (state, _) = watch::channel(AppState::from_snapshot(snapshot));
        Self {
            state,
            storage,
            location: Arc::new(NoLocation),
            geocoder: None,
            location_timeout: DEFAULT_LOCATION_TIMEOUT,
        }
    }

    /// Enable [`Self::init_city_from_geolocation`].
    pub fn with_geolocation(
        mut self,
        location: Arc<dyn LocationProvider>,
        geocoder: Arc<dyn ReverseGeocoder>,
    ) -> Self {
        self.location = location;
        self.geocoder = Some(geocoder);
        self
    }

    pub fn with_location_timeout(mut self, timeout: Duration) -> Self {
        self.location_timeout = timeout;
        self
    }

    /// Receiver that observes every published change.
    pub fn subscribe(&self) -> watch::Receiver<AppState> {
        self.state.subscribe()
    }

    /// Copy of the current state
    pub fn state(&self) -> AppState {
        self.state.borrow().clone()
    }

    pub fn city(&self) -> String {
        self.state.borrow().city.clone()
    }

    pub fn favorites(&self) -> Vec<FavoriteEntry> {
        self.state.borrow().favorites.clone()
    }

    pub fn is_locating(&self) -> bool {
        self.state.borrow().locating
    }

    pub fn snapshot(&self) -> Snapshot {
        self.state.borrow().snapshot()
    }

    /// Select a city. The value is trimmed; empty clears the selection.
    pub fn set_city(&self, value: Option<&str>) {
        let city = value.unwrap_or_default().trim().to_string();
        tracing::debug!("Setting city to {:?}", city);
        self.mutate(|state| {
            state.city = city;
            true
        });
    }

    pub fn delete_city(&self) {
        self.set_city(Some(""));
    }

    /// Save a city as favorite. Blank names and existing favorites are left alone.
    pub fn add_favorite(&self, name: &str) {
        if name.trim().is_empty() {
            return;
        }
        self.mutate(|state| insert_favorite(state, name));
    }

    pub fn remove_favorite(&self, name: &str) {
        let key = normalize(name);
        self.mutate(|state| {
            let before = state.favorites.len();
            state.favorites.retain(|f| f.key != key);
            state.favorites.len() != before
        });
    }

    /// Flip the favorite state of `name`.
    ///
    /// Returns `true` when the city is a favorite afterwards. A blank name
    /// returns `false` and changes nothing.
    pub fn toggle_favorite(&self, name: &str) -> bool {
        if name.trim().is_empty() {
            return false;
        }
        let key = normalize(name);
        let mut now_favorite = false;

        self.mutate(|state| {
            if let Some(pos) = state.favorites.iter().position(|f| f.key == key) {
                state.favorites.remove(pos);
            } else {
                insert_favorite(state, name);
                now_favorite = true;
            }
            true
        });

        now_favorite
    }

    pub fn is_favorite(&self, name: &str) -> bool {
        self.state.borrow().is_favorite(name)
    }

    pub fn clear_favorites(&self) {
        self.mutate(|state| {
            let had_any = !state.favorites.is_empty();
            state.favorites.clear();
            had_any
        });
    }

    /// Fill in the city from the device position when none is selected.
    ///
    /// Makes a single position request with a bounded wait, reverse-geocodes
    /// the result and selects that place. Denial, timeout or lookup failure
    /// leave the state as it was. A city selected while the lookup is in
    /// flight is never overwritten.
    pub async fn init_city_from_geolocation(&self) {
        if self.state.borrow().has_city() {
            tracing::debug!("City already selected, skipping geolocation");
            return;
        }
        let Some(geocoder) = self.geocoder.clone() else {
            tracing::debug!("No geocoder configured, skipping geolocation");
            return;
        };
        if !self.location.is_available() {
            tracing::debug!("Location capability unavailable");
            return;
        }

        self.set_locating(true);

        let place = match locate_once(self.location.as_ref(), self.location_timeout).await {
            Ok(coords) => {
                tracing::info!("Got location: {}, {}", coords.lat, coords.lon);
                match geocoder.reverse_geocode(coords).await {
                    Ok(name) => Some(name),
                    Err(e) => {
                        tracing::warn!("Reverse geocoding failed: {}", e);
                        None
                    }
                }
            }
            Err(e) => {
                tracing::info!("No position available: {}", e);
                None
            }
        };

        let place = place.map(|p| p.trim().to_string()).filter(|p| !p.is_empty());
        self.state.send_modify(|state| {
            state.locating = false;
            if let Some(place) = place {
                if state.city.is_empty() {
                    tracing::info!("City set from geolocation: {}", place);
                    state.city = place;
                    self.persist(&state.snapshot());
                }
            }
        });
    }

    /// Run [`Self::init_city_from_geolocation`] on the tokio runtime without waiting.
    pub fn spawn_init_city_from_geolocation(self: &Arc<Self>) -> tokio::task::JoinHandle<()> {
        let store = Arc::clone(self);
        tokio::spawn(async move { store.init_city_from_geolocation().await })
    }

    fn set_locating(&self, locating: bool) {
        self.state.send_if_modified(|state| {
            let changed = state.locating != locating;
            state.locating = locating;
            changed
        });
    }

    /// Apply `f`; when it reports a change, persist and then publish.
    fn mutate(&self, f: impl FnOnce(&mut AppState) -> bool) {
        self.state.send_if_modified(|state| {
            let changed = f(state);
            if changed {
                self.persist(&state.snapshot());
            }
            changed
        });
    }

    fn persist(&self, snapshot: &Snapshot) {
        if let Err(e) = self.storage.save(snapshot) {
            tracing::warn!("Failed to persist city store: {}", e);
        }
    }
}

/// Prepend `name` unless its key is already present. Returns whether it was added.
fn insert_favorite(state: &mut AppState, name: &str) -> bool {
    let entry = FavoriteEntry::new(name, Utc::now());
    if entry.key.is_empty() || state.favorites.iter().any(|f| f.key == entry.key) {
        return false;
    }
    state.favorites.insert(0, entry);
    true
}
