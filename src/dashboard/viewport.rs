//! Map viewport orchestration: auto-fit versus explicit override, status
//! focus on the dashboard map, and trip-route centering.

use super::filter::StatusFilter;
use super::geo::{centroid, fit_viewport, Container, LonLat, Viewport, MAX_ZOOM, MIN_ZOOM, SINGLE_POINT_ZOOM};
use super::severity::{classify, Severity};
use crate::provider::{Driver, TripEvent};

use serde::Serialize;

/// Zoom used when focusing the map on a status group.
pub const STATUS_FOCUS_ZOOM: i32 = 12;
/// Zoom used for the whole-trip overview.
pub const TRIP_OVERVIEW_ZOOM: i32 = 12;

/// A point marker handed to the map widget.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Marker {
    pub id: String,
    pub position: LonLat,
    pub severity: Severity,
    pub color: &'static str,
    pub title: String,
    pub detail: String,
}

impl Marker {
    /// Marker for a driver's last known position, if it has one.
    pub fn for_driver(driver: &Driver) -> Option<Self> {
        let severity = Severity::from_status(&driver.status);
        Some(Self {
            id: driver.driver_id.clone(),
            position: driver.position()?,
            severity,
            color: severity.color(),
            title: driver.driver_name.clone(),
            detail: format!("{} ({}) - {}", driver.car_license_no, driver.vehicle_type, driver.available),
        })
    }

    /// Marker for a trip event, colored by its classified severity.
    pub fn for_event(event: &TripEvent) -> Option<Self> {
        let severity = classify(&event.event_status);
        Some(Self {
            id: event.event_id.clone(),
            position: event.position()?,
            severity,
            color: severity.color(),
            title: event.event_status.clone(),
            detail: event.created.clone(),
        })
    }
}

/// Decides on each data change whether to fit the map to the data or to keep
/// an externally supplied center/zoom.
#[derive(Debug, Clone)]
pub struct ViewportController {
    container: Container,
    fallback: Viewport,
    pinned: Option<Viewport>,
}

impl ViewportController {
    pub fn new(container: Container, fallback: Viewport) -> Self {
        Self {
            container,
            fallback,
            pinned: None,
        }
    }

    /// Recompute the viewport for a fresh set of marker positions.
    pub fn on_data_change(&mut self, points: &[LonLat]) -> Viewport {
        match self.pinned {
            Some(vp) => vp,
            None => fit_viewport(points, self.container, self.fallback),
        }
    }

    /// Pin an explicit center/zoom; later data changes keep it.
    pub fn set_override(&mut self, viewport: Viewport) -> Viewport {
        let pinned = Viewport::new(viewport.center, viewport.zoom.clamp(MIN_ZOOM, MAX_ZOOM));
        self.pinned = Some(pinned);
        pinned
    }

    /// Return to auto-fit on the next data change.
    pub fn clear_override(&mut self) {
        self.pinned = None;
    }

    pub fn is_auto(&self) -> bool {
        self.pinned.is_none()
    }
}

/// Status toggle on the dashboard map.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatusFocus {
    active: StatusFilter,
}

impl StatusFocus {
    pub fn active(&self) -> StatusFilter {
        self.active
    }

    /// Clicking the active status reverts to `All`; any other status selects it.
    /// The map then centers on the mean position of matching drivers at a fixed
    /// close-in zoom, or on `overall` when none have a position.
    pub fn center_map_on_status(
        &mut self,
        status: StatusFilter,
        drivers: &[Driver],
        overall: Viewport,
    ) -> Viewport {
        self.active = if self.active == status {
            StatusFilter::All
        } else {
            status
        };

        let positions: Vec<LonLat> = drivers
            .iter()
            .filter(|d| self.active.matches(d))
            .filter_map(Driver::position)
            .collect();

        match centroid(&positions) {
            Some(center) => Viewport::new(center, STATUS_FOCUS_ZOOM),
            None => overall,
        }
    }
}

/// Map state for a single trip: event markers, route and selection.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TripMap {
    pub markers: Vec<Marker>,
    pub route: Vec<LonLat>,
    pub overview: Viewport,
    pub viewport: Viewport,
    pub selected_event: Option<String>,
}

impl TripMap {
    /// Build the trip map. Events without coordinates are left off the map.
    pub fn from_events(events: &[TripEvent], default: Viewport) -> Self {
        let markers: Vec<Marker> = events.iter().filter_map(Marker::for_event).collect();
        let route: Vec<LonLat> = events.iter().filter_map(TripEvent::position).collect();

        let overview = match centroid(&route) {
            Some(center) => Viewport::new(center, TRIP_OVERVIEW_ZOOM),
            None => default,
        };

        Self {
            markers,
            route,
            overview,
            viewport: overview,
            selected_event: None,
        }
    }

    /// Toggle selection of an event. Selecting moves the map onto the event;
    /// selecting it again returns to the trip overview.
    pub fn select_event(&mut self, event: &TripEvent) -> Viewport {
        if self.selected_event.as_deref() == Some(event.event_id.as_str()) {
            self.selected_event = None;
            self.viewport = self.overview;
            return self.viewport;
        }

        self.selected_event = Some(event.event_id.clone());
        match event.position() {
            Some(position) => self.viewport = Viewport::new(position, SINGLE_POINT_ZOOM),
            None => tracing::warn!("TripMap: event {} has no coordinates", event.event_id),
        }
        self.viewport
    }
}
