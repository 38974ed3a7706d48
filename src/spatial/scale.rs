use crate::core::{config::ClusteringConfig, geo::LatLng, viewport::ViewportRegion};

/// Linear pixel-per-degree scale for the current viewport and surface width,
/// plus the zoom-adaptive clustering threshold derived from it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PixelScale {
    pub pixels_per_degree_lat: f64,
    pub pixels_per_degree_lng: f64,
    /// Pixel distance under which two points are nearby
    pub threshold: f64,
}

impl PixelScale {
    /// Estimates the scale. Both axes are measured against the surface width,
    /// which assumes the latitude span is of the same order as the longitude span.
    pub fn estimate(
        surface_width: f64,
        region: &ViewportRegion,
        config: &ClusteringConfig,
    ) -> Self {
        debug_assert!(region.is_valid(), "degenerate viewport: {:?}", region);
        debug_assert!(
            surface_width.is_finite() && surface_width > 0.0,
            "degenerate surface width: {}",
            surface_width
        );

        Self {
            pixels_per_degree_lat: surface_width / region.lat_delta,
            pixels_per_degree_lng: surface_width / region.lng_delta,
            threshold: Self::threshold_for(region, config),
        }
    }

    /// `base * min(mean_span * multiplier, max_factor)`
    pub fn threshold_for(region: &ViewportRegion, config: &ClusteringConfig) -> f64 {
        let zoom_factor = (region.lat_delta + region.lng_delta) / 2.0;
        let factor = (zoom_factor * config.zoom_multiplier).min(config.max_threshold_factor);
        config.base_threshold * factor
    }

    /// Position in pixel space, relative to (0, 0) degrees
    pub fn to_pixels(&self, coord: &LatLng) -> (f64, f64) {
        (
            coord.lat * self.pixels_per_degree_lat,
            coord.lng * self.pixels_per_degree_lng,
        )
    }

    pub fn pixel_distance(&self, a: &LatLng, b: &LatLng) -> f64 {
        let dy = (a.lat - b.lat) * self.pixels_per_degree_lat;
        let dx = (a.lng - b.lng) * self.pixels_per_degree_lng;
        (dx * dx + dy * dy).sqrt()
    }

    pub fn is_nearby(&self, a: &LatLng, b: &LatLng) -> bool {
        self.pixel_distance(a, b) < self.threshold
    }
}
