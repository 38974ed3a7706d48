use crate::core::geo::{LatLng, LatLngBounds};
use crate::{MarkerError, Result};
use serde::{Deserialize, Serialize};

/// The visible map region: a center coordinate plus an angular span on each axis.
///
/// Owned by the hosting layer; the engine only reads it when clustering and
/// proposes replacements through [`ViewportRegion::fit_to_bounds`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewportRegion {
    /// Center of the visible region
    pub center: LatLng,
    /// Latitude span in degrees (always > 0)
    pub lat_delta: f64,
    /// Longitude span in degrees (always > 0)
    pub lng_delta: f64,
}

impl ViewportRegion {
    /// Creates a region, rejecting non-finite values and non-positive spans
    pub fn new(center: LatLng, lat_delta: f64, lng_delta: f64) -> Result<Self> {
        let region = Self {
            center,
            lat_delta,
            lng_delta,
        };
        region.validate()?;
        Ok(region)
    }

    /// Convenience constructor from raw numbers
    pub fn from_coords(lat: f64, lng: f64, lat_delta: f64, lng_delta: f64) -> Result<Self> {
        Self::new(LatLng::new(lat, lng), lat_delta, lng_delta)
    }

    /// Checks the host invariant: finite center, finite and positive spans
    pub fn validate(&self) -> Result<()> {
        if !self.center.is_finite() {
            return Err(MarkerError::InvalidViewport(format!(
                "center ({}, {}) is not finite",
                self.center.lat, self.center.lng
            )));
        }
        if !(self.lat_delta.is_finite() && self.lat_delta > 0.0) {
            return Err(MarkerError::InvalidViewport(format!(
                "latitude span {} must be positive",
                self.lat_delta
            )));
        }
        if !(self.lng_delta.is_finite() && self.lng_delta > 0.0) {
            return Err(MarkerError::InvalidViewport(format!(
                "longitude span {} must be positive",
                self.lng_delta
            )));
        }
        Ok(())
    }

    pub fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }

    /// Span as a (lat, lng) pair
    pub fn span(&self) -> LatLng {
        LatLng::new(self.lat_delta, self.lng_delta)
    }

    /// Geographic bounds covered by this region
    pub fn bounds(&self) -> LatLngBounds {
        let half_lat = self.lat_delta / 2.0;
        let half_lng = self.lng_delta / 2.0;
        LatLngBounds::from_coords(
            self.center.lat - half_lat,
            self.center.lng - half_lng,
            self.center.lat + half_lat,
            self.center.lng + half_lng,
        )
    }

    /// Returns the region zoomed around its center; `factor > 1` zooms out
    pub fn scaled_by(&self, factor: f64) -> Result<Self> {
        Self::new(self.center, self.lat_delta * factor, self.lng_delta * factor)
    }

    /// True when either span grew past `previous * ratio` (strictly)
    pub fn grew_beyond(&self, previous: &ViewportRegion, ratio: f64) -> bool {
        self.lat_delta > previous.lat_delta * ratio || self.lng_delta > previous.lng_delta * ratio
    }

    /// Region centered on `bounds`, spans padded by `padding` and floored at `min_delta`
    pub fn fit_to_bounds(bounds: &LatLngBounds, padding: f64, min_delta: f64) -> Self {
        let span = bounds.span();
        Self {
            center: bounds.center(),
            lat_delta: (span.lat * padding).max(min_delta),
            lng_delta: (span.lng * padding).max(min_delta),
        }
    }
}
