//! Geo utilities for fitting a set of points into a map viewport.

use serde::{Deserialize, Serialize};

/// Zoom used when a single point is shown.
pub const SINGLE_POINT_ZOOM: i32 = 15;
pub const MIN_ZOOM: i32 = 3;
pub const MAX_ZOOM: i32 = 20;

const METERS_PER_DEGREE_LAT: f64 = 111_320.0;
/// Web-Mercator ground resolution at zoom 0 on the equator.
const BASE_METERS_PER_PIXEL: f64 = 156_543.033_92;

/// A longitude/latitude pair in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LonLat {
    pub lon: f64,
    pub lat: f64,
}

impl LonLat {
    pub fn new(lon: f64, lat: f64) -> Self {
        Self { lon, lat }
    }
}

/// A map center plus zoom level.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub center: LonLat,
    pub zoom: i32,
}

impl Viewport {
    pub fn new(center: LonLat, zoom: i32) -> Self {
        Self { center, zoom }
    }
}

/// Pixel geometry of the map container.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Container {
    pub width_px: f64,
    pub height_px: f64,
    pub padding_px: f64,
}

/// Compute a center and zoom that fit all points inside the container.
///
/// The center is the middle of the bounding box, not the centroid of the points.
/// Empty input returns `fallback` unchanged; a non-finite zoom falls back to
/// `fallback.zoom`.
pub fn fit_viewport(points: &[LonLat], container: Container, fallback: Viewport) -> Viewport {
    let first = match points.first() {
        Some(p) => *p,
        None => return fallback,
    };

    if points.len() == 1 {
        return Viewport::new(first, SINGLE_POINT_ZOOM);
    }

    let (mut min_lon, mut max_lon, mut min_lat, mut max_lat) =
        (first.lon, first.lon, first.lat, first.lat);
    for p in &points[1..] {
        min_lon = min_lon.min(p.lon);
        max_lon = max_lon.max(p.lon);
        min_lat = min_lat.min(p.lat);
        max_lat = max_lat.max(p.lat);
    }

    let center = LonLat::new((min_lon + max_lon) / 2.0, (min_lat + max_lat) / 2.0);
    let cos_lat = center.lat.to_radians().cos();

    let span_x = (max_lon - min_lon) * METERS_PER_DEGREE_LAT * cos_lat;
    let span_y = (max_lat - min_lat) * METERS_PER_DEGREE_LAT;

    let inner_w = container.width_px - 2.0 * container.padding_px;
    let inner_h = container.height_px - 2.0 * container.padding_px;

    let required = (span_x / inner_w).max(span_y / inner_h);
    let raw_zoom = (BASE_METERS_PER_PIXEL * cos_lat / required).log2().floor();

    // Coincident points give an infinite zoom; degenerate containers give NaN.
    let zoom = if raw_zoom.is_finite() {
        (raw_zoom as i32).clamp(MIN_ZOOM, MAX_ZOOM)
    } else {
        fallback.zoom
    };

    Viewport::new(center, zoom)
}

/// Arithmetic mean of the points, or `None` when there are none.
pub fn centroid(points: &[LonLat]) -> Option<LonLat> {
    if points.is_empty() {
        return None;
    }

    let n = points.len() as f64;
    let (sum_lon, sum_lat) = points
        .iter()
        .fold((0.0, 0.0), |(lon, lat), p| (lon + p.lon, lat + p.lat));

    Some(LonLat::new(sum_lon / n, sum_lat / n))
}
