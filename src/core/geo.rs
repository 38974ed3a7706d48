use serde::{Deserialize, Serialize};

/// Represents a geographical coordinate with latitude and longitude
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    /// Creates a new LatLng coordinate
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// True when both components are finite numbers
    pub fn is_finite(&self) -> bool {
        self.lat.is_finite() && self.lng.is_finite()
    }

    /// Exactly (0, 0) is the "no location" sentinel hosts use for unset coordinates
    pub fn is_sentinel(&self) -> bool {
        self.lat == 0.0 && self.lng == 0.0
    }

    /// Whether this coordinate can take part in clustering
    pub fn is_usable(&self) -> bool {
        self.is_finite() && !self.is_sentinel()
    }

    /// Arithmetic mean of a set of coordinates, `None` when empty
    pub fn mean<'a, I>(coords: I) -> Option<LatLng>
    where
        I: IntoIterator<Item = &'a LatLng>,
    {
        let (sum_lat, sum_lng, count) = coords
            .into_iter()
            .fold((0.0, 0.0, 0usize), |(lat, lng, n), c| {
                (lat + c.lat, lng + c.lng, n + 1)
            });

        if count == 0 {
            None
        } else {
            Some(LatLng::new(sum_lat / count as f64, sum_lng / count as f64))
        }
    }
}

impl Default for LatLng {
    fn default() -> Self {
        Self::new(0.0, 0.0)
    }
}

/// Represents a bounding box of geographical coordinates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLngBounds {
    pub south_west: LatLng,
    pub north_east: LatLng,
}

impl LatLngBounds {
    pub fn new(south_west: LatLng, north_east: LatLng) -> Self {
        Self {
            south_west,
            north_east,
        }
    }

    /// Creates bounds from individual coordinates
    pub fn from_coords(south: f64, west: f64, north: f64, east: f64) -> Self {
        Self::new(LatLng::new(south, west), LatLng::new(north, east))
    }

    /// Smallest bounds containing every coordinate, `None` when empty
    pub fn from_points<'a, I>(coords: I) -> Option<LatLngBounds>
    where
        I: IntoIterator<Item = &'a LatLng>,
    {
        let mut iter = coords.into_iter();
        let first = *iter.next()?;
        let mut bounds = LatLngBounds::new(first, first);
        for coord in iter {
            bounds.extend(coord);
        }
        Some(bounds)
    }

    /// Checks if the bounds contain a point
    pub fn contains(&self, point: &LatLng) -> bool {
        point.lat >= self.south_west.lat
            && point.lat <= self.north_east.lat
            && point.lng >= self.south_west.lng
            && point.lng <= self.north_east.lng
    }

    /// Extends the bounds to include a point
    pub fn extend(&mut self, point: &LatLng) {
        self.south_west.lat = self.south_west.lat.min(point.lat);
        self.south_west.lng = self.south_west.lng.min(point.lng);
        self.north_east.lat = self.north_east.lat.max(point.lat);
        self.north_east.lng = self.north_east.lng.max(point.lng);
    }

    /// Gets the center point of the bounds
    pub fn center(&self) -> LatLng {
        LatLng::new(
            (self.south_west.lat + self.north_east.lat) / 2.0,
            (self.south_west.lng + self.north_east.lng) / 2.0,
        )
    }

    /// Gets the span of the bounds
    pub fn span(&self) -> LatLng {
        LatLng::new(
            self.north_east.lat - self.south_west.lat,
            self.north_east.lng - self.south_west.lng,
        )
    }
}
