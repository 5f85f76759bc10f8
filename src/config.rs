//! Configuration module for fleetwatch.
//!
//! Loads configuration from environment variables with sensible defaults.

use crate::dashboard::{Container, LonLat, Viewport};

use std::env;
use std::str::FromStr;
use std::time::Duration;

/// Server configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// HTTP port for the web server (default: 8080)
    pub http_port: u16,
    /// Path to the SQLite database file (default: "fleetwatch.db")
    pub db_path: String,
    /// Base URL of the fleet backend REST API
    pub api_url: String,
    /// Directory of browser assets served at the root (default: "static")
    pub static_dir: String,
    pub poll_interval: Duration,
    pub request_timeout: Duration,
    /// Pixel size of the dashboard map, used for auto-fit
    pub map_container: Container,
    /// Center and zoom used when there is nothing to show
    pub default_view: Viewport,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            http_port: 8080,
            db_path: "fleetwatch.db".to_string(),
            api_url: "http://localhost:3001".to_string(),
            static_dir: "static".to_string(),
            poll_interval: Duration::from_secs(10),
            request_timeout: Duration::from_secs(10),
            map_container: Container {
                width_px: 1024.0,
                height_px: 768.0,
                padding_px: 40.0,
            },
            default_view: Viewport::new(LonLat::new(100.523186, 13.736717), 9),
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables.
    ///
    /// Environment variables:
    /// - `FLEETWATCH_HTTP_PORT`: HTTP port (default: 8080)
    /// - `FLEETWATCH_DB_PATH`: Database file path (default: "fleetwatch.db")
    /// - `FLEETWATCH_API_URL`: Fleet backend base URL (default: "http://localhost:3001")
    /// - `FLEETWATCH_STATIC_DIR`: Browser asset directory (default: "static")
    /// - `FLEETWATCH_POLL_INTERVAL_SECS`: Summary poll interval (default: 10)
    /// - `FLEETWATCH_REQUEST_TIMEOUT_SECS`: Backend request timeout (default: 10)
    /// - `FLEETWATCH_MAP_WIDTH` / `FLEETWATCH_MAP_HEIGHT` / `FLEETWATCH_MAP_PADDING`: map size in pixels
    /// - `FLEETWATCH_DEFAULT_LON` / `FLEETWATCH_DEFAULT_LAT` / `FLEETWATCH_DEFAULT_ZOOM`: fallback view
    pub fn load() -> Self {
        let mut cfg = Self::default();

        if let Some(port) = parse_var("FLEETWATCH_HTTP_PORT") {
            cfg.http_port = port;
        }

        if let Ok(db_path) = env::var("FLEETWATCH_DB_PATH") {
            cfg.db_path = db_path;
        }

        if let Ok(api_url) = env::var("FLEETWATCH_API_URL") {
            cfg.api_url = api_url;
        }

        if let Ok(static_dir) = env::var("FLEETWATCH_STATIC_DIR") {
            cfg.static_dir = static_dir;
        }

        if let Some(secs) = parse_var::<u64>("FLEETWATCH_POLL_INTERVAL_SECS").filter(|s| *s > 0) {
            cfg.poll_interval = Duration::from_secs(secs);
        }

        if let Some(secs) = parse_var::<u64>("FLEETWATCH_REQUEST_TIMEOUT_SECS").filter(|s| *s > 0) {
            cfg.request_timeout = Duration::from_secs(secs);
        }

        if let Some(w) = parse_var("FLEETWATCH_MAP_WIDTH") {
            cfg.map_container.width_px = w;
        }
        if let Some(h) = parse_var("FLEETWATCH_MAP_HEIGHT") {
            cfg.map_container.height_px = h;
        }
        if let Some(p) = parse_var("FLEETWATCH_MAP_PADDING") {
            cfg.map_container.padding_px = p;
        }

        if let Some(lon) = parse_var("FLEETWATCH_DEFAULT_LON") {
            cfg.default_view.center.lon = lon;
        }
        if let Some(lat) = parse_var("FLEETWATCH_DEFAULT_LAT") {
            cfg.default_view.center.lat = lat;
        }
        if let Some(zoom) = parse_var("FLEETWATCH_DEFAULT_ZOOM") {
            cfg.default_view.zoom = zoom;
        }

        cfg
    }
}

fn parse_var<T: FromStr>(name: &str) -> Option<T> {
    let raw = env::var(name).ok()?;
    match raw.parse() {
        Ok(v) => Some(v),
        Err(_) => {
            tracing::warn!("Config: Ignoring invalid value for {}: {}", name, raw);
            None
        }
    }
}
