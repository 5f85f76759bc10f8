//! Web server module.

mod handlers;

pub use handlers::*;

use crate::config::ServerConfig;
use crate::dashboard::{DriverFilter, StatusFocus, ViewportController};
use crate::db::Store;
use crate::poller::SummaryPoller;
use crate::provider::ApiClient;
use crate::session::Session;

use axum::{
    extract::{DefaultBodyLimit, Request, State},
    http::StatusCode,
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::Mutex;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

/// Interactive dashboard state: the driver-list filter, the map status
/// toggle and the auto-fit controller.
pub struct DashboardState {
    pub filter: DriverFilter,
    pub focus: StatusFocus,
    pub viewport: ViewportController,
}

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: ServerConfig,
    pub store: Arc<Store>,
    pub session: Arc<Session>,
    pub client: Arc<ApiClient>,
    pub poller: Arc<SummaryPoller<ApiClient>>,
    pub dashboard: Arc<Mutex<DashboardState>>,
}

/// Web server for fleetwatch.
pub struct Server {
    state: AppState,
}

impl Server {
    pub fn new(
        config: ServerConfig,
        store: Arc<Store>,
        session: Arc<Session>,
        client: Arc<ApiClient>,
        poller: Arc<SummaryPoller<ApiClient>>,
    ) -> Self {
        let dashboard = DashboardState {
            filter: DriverFilter::default(),
            focus: StatusFocus::default(),
            viewport: ViewportController::new(config.map_container, config.default_view),
        };

        Self {
            state: AppState {
                config,
                store,
                session,
                client,
                poller,
                dashboard: Arc::new(Mutex::new(dashboard)),
            },
        }
    }

    /// Build the router with all routes.
    pub(crate) fn routes(&self) -> Router {
        let cors = CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any);

        let public = Router::new()
            .route("/api/login", post(handlers::handle_login))
            .route("/api/register", post(handlers::handle_register))
            .route("/api/session", get(handlers::handle_get_session))
            .route("/api/theme", get(handlers::handle_get_theme).put(handlers::handle_set_theme));

        // Everything below needs a signed-in session
        let protected = Router::new()
            .route("/api/logout", post(handlers::handle_logout))
            .route("/api/dashboard", get(handlers::handle_dashboard))
            .route("/api/filters", get(handlers::handle_get_filters))
            .route("/api/filters/vehicle-types/{vehicle_type}", post(handlers::handle_toggle_vehicle_type))
            .route("/api/filters/status/{status}", post(handlers::handle_toggle_status))
            .route("/api/filters/search", put(handlers::handle_set_search))
            .route("/api/map/status/{status}", post(handlers::handle_map_status))
            .route(
                "/api/map/viewport",
                put(handlers::handle_set_viewport).delete(handlers::handle_clear_viewport),
            )
            .route("/api/statistics", get(handlers::handle_statistics))
            .route("/api/statistics/{driver_id}", get(handlers::handle_driver_statistics))
            .route("/api/trips/{driver_id}", get(handlers::handle_current_trip))
            .route("/api/trips/{driver_id}/{trip_id}", get(handlers::handle_trip))
            .route(
                "/api/devices",
                get(handlers::handle_get_devices).post(handlers::handle_create_device),
            )
            .route("/api/devices/availability", get(handlers::handle_device_availability))
            .route(
                "/api/devices/{id}",
                get(handlers::handle_get_device)
                    .put(handlers::handle_update_device)
                    .delete(handlers::handle_delete_device),
            )
            .route_layer(middleware::from_fn_with_state(self.state.clone(), require_session));

        public
            .merge(protected)
            .fallback_service(ServeDir::new(&self.state.config.static_dir))
            .layer(cors)
            .layer(TraceLayer::new_for_http())
            .layer(DefaultBodyLimit::max(1024 * 1024)) // 1MB
            .with_state(self.state.clone())
    }

    /// Start the server on the configured port.
    pub async fn start(&self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let addr = SocketAddr::from(([0, 0, 0, 0], self.state.config.http_port));
        let router = self.routes();

        tracing::info!("Web server listening on {}", addr);

        let listener = tokio::net::TcpListener::bind(addr).await?;
        axum::serve(listener, router).await?;

        Ok(())
    }
}

/// Reject requests without a signed-in session.
async fn require_session(State(state): State<AppState>, request: Request, next: Next) -> Response {
    if !state.session.is_logged_in() {
        return (StatusCode::UNAUTHORIZED, "Not logged in").into_response();
    }
    next.run(request).await
}
