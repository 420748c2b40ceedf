//! One-shot device position lookup.
//!
//! Platforms expose position very differently, so the lookup sits behind
//! [`LocationProvider`]. [`locate_once`] makes a single attempt with a bounded
//! wait; there is no retry and no stream of updates.

use std::time::Duration;

use async_trait::async_trait;

use crate::error::LocationError;
use crate::types::Coordinates;

/// How long a position request may take before it counts as no result
pub const DEFAULT_LOCATION_TIMEOUT: Duration = Duration::from_secs(5);

#[async_trait]
pub trait LocationProvider: Send + Sync {
    /// Whether the platform offers a position capability at all.
    fn is_available(&self) -> bool;

    async fn current_position(&self) -> Result<Coordinates, LocationError>;
}

/// Position taken from configuration
#[derive(Debug, Clone, Copy)]
pub struct FixedLocation {
    coords: Coordinates,
}

impl FixedLocation {
    pub fn new(coords: Coordinates) -> Self {
        Self { coords }
    }
}

#[async_trait]
impl LocationProvider for FixedLocation {
    fn is_available(&self) -> bool {
        true
    }

    async fn current_position(&self) -> Result<Coordinates, LocationError> {
        Ok(self.coords)
    }
}

/// No position capability on this platform
#[derive(Debug, Clone, Copy, Default)]
pub struct NoLocation;

#[async_trait]
impl LocationProvider for NoLocation {
    fn is_available(&self) -> bool {
        false
    }

    async fn current_position(&self) -> Result<Coordinates, LocationError> {
        Err(LocationError::ServiceUnavailable)
    }
}

/// Request the current position once, giving up after `wait`.
pub async fn locate_once(
    provider: &dyn LocationProvider,
    wait: Duration,
) -> Result<Coordinates, LocationError> {
    if !provider.is_available() {
        return Err(LocationError::ServiceUnavailable);
    }

    match tokio::time::timeout(wait, provider.current_position()).await {
        Ok(result) => result,
        Err(_) => {
            tracing::debug!("Location request exceeded {:?}", wait);
            Err(LocationError::Timeout)
        }
    }
}
