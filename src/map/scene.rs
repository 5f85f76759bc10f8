use super::{MapError, MapWidget};
use crate::dashboard::{LonLat, Marker, Viewport};

use serde::Serialize;

/// A map widget that records what it was told to draw, serialized for the
/// browser-side map.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MapScene {
    #[serde(skip)]
    initialized: bool,
    pub markers: Vec<Marker>,
    pub route: Vec<LonLat>,
    pub viewport: Option<Viewport>,
}

impl MapScene {
    pub fn new() -> Self {
        Self::default()
    }

    fn ensure_ready(&self) -> Result<(), MapError> {
        if self.initialized {
            Ok(())
        } else {
            Err(MapError::NotReady)
        }
    }
}

impl MapWidget for MapScene {
    fn is_available(&self) -> bool {
        true
    }

    fn initialize(&mut self) -> Result<(), MapError> {
        self.initialized = true;
        Ok(())
    }

    fn set_markers(&mut self, markers: &[Marker]) -> Result<(), MapError> {
        self.ensure_ready()?;
        self.markers = markers.to_vec();
        Ok(())
    }

    fn set_route(&mut self, route: &[LonLat]) -> Result<(), MapError> {
        self.ensure_ready()?;
        self.route = route.to_vec();
        Ok(())
    }

    fn set_viewport(&mut self, viewport: Viewport) -> Result<(), MapError> {
        self.ensure_ready()?;
        self.viewport = Some(viewport);
        Ok(())
    }
}
