use crate::core::geo::LatLng;
use crate::Result;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Callback attached to a single point, run when its marker is pressed
pub type PressHandler = Arc<dyn Fn(&MapPoint) + Send + Sync>;

/// A geographic point shown as a marker
#[derive(Clone, Serialize, Deserialize)]
pub struct MapPoint {
    /// Stable identifier, if the host has one
    #[serde(default)]
    pub id: Option<String>,
    #[serde(flatten)]
    pub position: LatLng,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(skip)]
    on_press: Option<PressHandler>,
}

/// Identity of a point inside a build: its id, or its exact coordinate bits
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PointKey {
    Id(String),
    Coord(u64, u64),
}

impl MapPoint {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self {
            id: None,
            position: LatLng::new(lat, lng),
            title: String::new(),
            description: String::new(),
            on_press: None,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_press_handler<F>(mut self, handler: F) -> Self
    where
        F: Fn(&MapPoint) + Send + Sync + 'static,
    {
        self.on_press = Some(Arc::new(handler));
        self
    }

    pub fn lat(&self) -> f64 {
        self.position.lat
    }

    pub fn lng(&self) -> f64 {
        self.position.lng
    }

    /// Finite and not the (0, 0) sentinel
    pub fn has_location(&self) -> bool {
        self.position.is_usable()
    }

    pub fn key(&self) -> PointKey {
        match &self.id {
            Some(id) => PointKey::Id(id.clone()),
            None => PointKey::Coord(self.position.lat.to_bits(), self.position.lng.to_bits()),
        }
    }

    /// Runs the attached press handler; returns whether one was attached
    pub fn press(&self) -> bool {
        match &self.on_press {
            Some(handler) => {
                handler(self);
                true
            }
            None => false,
        }
    }
}

impl fmt::Debug for MapPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MapPoint")
            .field("id", &self.id)
            .field("position", &self.position)
            .field("title", &self.title)
            .field("description", &self.description)
            .field("on_press", &self.on_press.is_some())
            .finish()
    }
}

/// Parses a JSON array of points as fetched by the host
pub fn points_from_json(json: &str) -> Result<Vec<MapPoint>> {
    Ok(serde_json::from_str(json)?)
}

/// Splits out the points that can be clustered, in input order.
/// Returns the usable points and the number dropped.
pub fn filter_located(points: &[MapPoint]) -> (Vec<MapPoint>, usize) {
    let located: Vec<MapPoint> = points.iter().filter(|p| p.has_location()).cloned().collect();
    let dropped = points.len() - located.len();
    if dropped > 0 {
        log::trace!("dropped {} points without a usable location", dropped);
    }
    (located, dropped)
}
