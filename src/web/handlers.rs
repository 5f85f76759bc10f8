//! HTTP request handlers.

use super::AppState;
use crate::config::ServerConfig;
use crate::dashboard::{
    aggregate, apply_ranking_filter, driver_events_chart, format_seconds, in_date_range,
    statistics_chart, toggle_in, ChartSeries, FilterSnapshot, GraphGroup, GraphRow, GraphSelection, LonLat,
    Marker, RankingEntry, SortField, SortOrder, StatusFilter, Viewport, ALL, DEFAULT_VEHICLE_TYPES,
    DRIVER_EVENT_FILTERS,
};
use crate::db::{filter_devices, DbError, DeviceForm, DeviceSort, UniqueField};
use crate::map::{wait_until_ready, MapError, MapScene, MapWidget, ReadyPolicy};
use crate::poller::PollStatus;
use crate::provider::{
    DailyTripLog, Driver, DriverCurrentTrip, DriverInfo, DriverSummary, LoginCredentials,
    ProviderError, RegistrationData, StatisticsSummary, SummaryDriverData,
};
use crate::session::Theme;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

// ============================================================================
// Error mapping
// ============================================================================

fn db_error_response(e: DbError) -> Response {
    let status = match &e {
        DbError::NotFound => StatusCode::NOT_FOUND,
        DbError::Validation(_) => StatusCode::BAD_REQUEST,
        DbError::Duplicate(_) => StatusCode::CONFLICT,
        DbError::Sqlite(_) | DbError::Migration(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, e.to_string()).into_response()
}

fn provider_error_response(e: ProviderError) -> Response {
    let status = match &e {
        ProviderError::Unauthorized | ProviderError::MissingToken => StatusCode::UNAUTHORIZED,
        ProviderError::Rejected(_) => StatusCode::BAD_REQUEST,
        ProviderError::Status { status: 404, .. } => StatusCode::NOT_FOUND,
        ProviderError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
        ProviderError::Status { .. } | ProviderError::Network(_) | ProviderError::Decode(_) => {
            StatusCode::BAD_GATEWAY
        }
        ProviderError::Session(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, e.to_string()).into_response()
}

fn map_error_response(e: MapError) -> Response {
    (StatusCode::SERVICE_UNAVAILABLE, e.to_string()).into_response()
}

/// Split a comma-separated query value, dropping blanks.
fn split_list(raw: Option<&str>) -> Option<Vec<String>> {
    raw.map(|s| {
        s.split(',')
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string)
            .collect()
    })
}

async fn build_scene(markers: &[Marker], route: &[LonLat], viewport: Viewport) -> Result<MapScene, MapError> {
    let mut scene = MapScene::new();
    wait_until_ready(&mut scene, ReadyPolicy::default()).await?;
    scene.set_markers(markers)?;
    scene.set_route(route)?;
    scene.set_viewport(viewport)?;
    Ok(scene)
}

// ============================================================================
// Session
// ============================================================================

pub async fn handle_login(
    State(state): State<AppState>,
    Json(credentials): Json<LoginCredentials>,
) -> impl IntoResponse {
    match state.client.login(&credentials).await {
        Ok(user) => {
            let poller = state.poller.clone();
            tokio::spawn(async move {
                poller.refresh().await;
            });
            Json(user).into_response()
        }
        Err(ProviderError::Rejected(message)) => (StatusCode::UNAUTHORIZED, message).into_response(),
        Err(e) => provider_error_response(e),
    }
}

pub async fn handle_register(
    State(state): State<AppState>,
    Json(data): Json<RegistrationData>,
) -> impl IntoResponse {
    match state.client.register(&data).await {
        Ok(user) => (StatusCode::CREATED, Json(user)).into_response(),
        Err(e) => provider_error_response(e),
    }
}

pub async fn handle_logout(State(state): State<AppState>) -> impl IntoResponse {
    if let Err(e) = state.session.logout() {
        return db_error_response(e);
    }

    let mut dash = state.dashboard.lock().await;
    dash.filter = Default::default();
    dash.focus = Default::default();
    dash.viewport.clear_override();

    StatusCode::NO_CONTENT.into_response()
}

pub async fn handle_get_session(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.session.state())
}

#[derive(Debug, Serialize)]
pub struct ThemeResponse {
    pub theme: Theme,
}

#[derive(Debug, Deserialize)]
pub struct ThemeRequest {
    /// Omitted means toggle.
    #[serde(default)]
    pub theme: Option<Theme>,
}

pub async fn handle_get_theme(State(state): State<AppState>) -> impl IntoResponse {
    Json(ThemeResponse {
        theme: state.session.theme(),
    })
}

pub async fn handle_set_theme(
    State(state): State<AppState>,
    Json(req): Json<ThemeRequest>,
) -> impl IntoResponse {
    let result = match req.theme {
        Some(theme) => state.session.set_theme(theme).map(|_| theme),
        None => state.session.toggle_theme(),
    };

    match result {
        Ok(theme) => Json(ThemeResponse { theme }).into_response(),
        Err(e) => db_error_response(e),
    }
}

// ============================================================================
// Dashboard
// ============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusCounts {
    pub online: u32,
    pub offline: u32,
    pub warning: u32,
    pub critical: u32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardView {
    pub counts: StatusCounts,
    pub drivers: Vec<Driver>,
    pub filters: FilterSnapshot,
    pub status_focus: StatusFilter,
    pub auto_fit: bool,
    pub map: MapScene,
    pub poll: PollStatus,
}

fn empty_summary(config: &ServerConfig) -> SummaryDriverData {
    SummaryDriverData {
        no_online: 0,
        no_offline: 0,
        no_warning: 0,
        no_critical: 0,
        overall_longitude: config.default_view.center.lon,
        overall_latitude: config.default_view.center.lat,
        driver_list: Vec::new(),
    }
}

/// Drivers passing the list filter, and markers for those also matching the
/// map status focus.
fn dashboard_selection(
    drivers: &[Driver],
    filter: &crate::dashboard::DriverFilter,
    focus: StatusFilter,
) -> (Vec<Driver>, Vec<Marker>) {
    let visible: Vec<Driver> = filter.apply(drivers).into_iter().cloned().collect();
    let markers = visible
        .iter()
        .filter(|d| focus.matches(d))
        .filter_map(Marker::for_driver)
        .collect();
    (visible, markers)
}

pub async fn handle_dashboard(State(state): State<AppState>) -> impl IntoResponse {
    let summary = match state.poller.latest() {
        Some(s) => Some(s),
        None => {
            state.poller.refresh().await;
            state.poller.latest()
        }
    };

    let poll = state.poller.status();
    let summary = match summary {
        Some(s) => s,
        None if poll.has_error => {
            let message = poll.last_error.clone().unwrap_or_default();
            return (StatusCode::BAD_GATEWAY, message).into_response();
        }
        None => Arc::new(empty_summary(&state.config)),
    };

    let (drivers, markers, viewport, filters, status_focus, auto_fit) = {
        let mut dash = state.dashboard.lock().await;
        let (drivers, markers) = dashboard_selection(&summary.driver_list, &dash.filter, dash.focus.active());
        let positions: Vec<LonLat> = markers.iter().map(|m| m.position).collect();
        let viewport = dash.viewport.on_data_change(&positions);
        (
            drivers,
            markers,
            viewport,
            dash.filter.snapshot(),
            dash.focus.active(),
            dash.viewport.is_auto(),
        )
    };

    let map = match build_scene(&markers, &[], viewport).await {
        Ok(scene) => scene,
        Err(e) => return map_error_response(e),
    };

    Json(DashboardView {
        counts: StatusCounts {
            online: summary.no_online,
            offline: summary.no_offline,
            warning: summary.no_warning,
            critical: summary.no_critical,
        },
        drivers,
        filters,
        status_focus,
        auto_fit,
        map,
        poll,
    })
    .into_response()
}

// ============================================================================
// Filters
// ============================================================================

pub async fn handle_get_filters(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.dashboard.lock().await.filter.snapshot())
}

pub async fn handle_toggle_vehicle_type(
    State(state): State<AppState>,
    Path(vehicle_type): Path<String>,
) -> impl IntoResponse {
    let mut dash = state.dashboard.lock().await;
    dash.filter.toggle_vehicle_type(&vehicle_type);
    Json(dash.filter.snapshot())
}

pub async fn handle_toggle_status(
    State(state): State<AppState>,
    Path(status): Path<String>,
) -> impl IntoResponse {
    let status: StatusFilter = match status.parse() {
        Ok(s) => s,
        Err(e) => return (StatusCode::BAD_REQUEST, format!("{}", e)).into_response(),
    };

    let mut dash = state.dashboard.lock().await;
    dash.filter.toggle_status(status);
    Json(dash.filter.snapshot()).into_response()
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchRequest {
    #[serde(default)]
    pub search_term: String,
}

pub async fn handle_set_search(
    State(state): State<AppState>,
    Json(req): Json<SearchRequest>,
) -> impl IntoResponse {
    let mut dash = state.dashboard.lock().await;
    dash.filter.set_search_term(&req.search_term);
    Json(dash.filter.snapshot())
}

// ============================================================================
// Map
// ============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MapFocusView {
    pub active: StatusFilter,
    pub viewport: Viewport,
    pub markers: Vec<Marker>,
}

pub async fn handle_map_status(
    State(state): State<AppState>,
    Path(status): Path<String>,
) -> impl IntoResponse {
    let status: StatusFilter = match status.parse() {
        Ok(s) => s,
        Err(e) => return (StatusCode::BAD_REQUEST, format!("{}", e)).into_response(),
    };

    let summary = state
        .poller
        .latest()
        .unwrap_or_else(|| Arc::new(empty_summary(&state.config)));
    let overall = Viewport::new(summary.overall_center(), state.config.default_view.zoom);

    let (active, viewport, markers) = {
        let mut dash = state.dashboard.lock().await;
        let focused = dash.focus.center_map_on_status(status, &summary.driver_list, overall);
        let active = dash.focus.active();
        let markers: Vec<Marker> = summary
            .driver_list
            .iter()
            .filter(|d| active.matches(d))
            .filter_map(Marker::for_driver)
            .collect();

        // Leaving a status focus hands the map back to auto-fit.
        let viewport = if active == StatusFilter::All {
            dash.viewport.clear_override();
            let positions: Vec<LonLat> = markers.iter().map(|m| m.position).collect();
            dash.viewport.on_data_change(&positions)
        } else {
            dash.viewport.set_override(focused)
        };
        (active, viewport, markers)
    };

    Json(MapFocusView {
        active,
        viewport,
        markers,
    })
    .into_response()
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewportState {
    pub auto_fit: bool,
    pub viewport: Viewport,
}

pub async fn handle_set_viewport(
    State(state): State<AppState>,
    Json(viewport): Json<Viewport>,
) -> impl IntoResponse {
    let mut dash = state.dashboard.lock().await;
    let viewport = dash.viewport.set_override(viewport);
    Json(ViewportState {
        auto_fit: false,
        viewport,
    })
}

pub async fn handle_clear_viewport(State(state): State<AppState>) -> impl IntoResponse {
    let summary = state.poller.latest();
    let mut dash = state.dashboard.lock().await;
    dash.viewport.clear_override();

    let drivers = summary.as_deref().map(|s| s.driver_list.as_slice()).unwrap_or(&[]);
    let (_, markers) = dashboard_selection(drivers, &dash.filter, dash.focus.active());
    let positions: Vec<LonLat> = markers.iter().map(|m| m.position).collect();
    let viewport = dash.viewport.on_data_change(&positions);

    Json(ViewportState {
        auto_fit: true,
        viewport,
    })
}

// ============================================================================
// Statistics
// ============================================================================

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatisticsQuery {
    #[serde(default)]
    pub date_from: Option<String>,
    #[serde(default)]
    pub date_to: Option<String>,
    /// Comma-separated; missing or containing `All` selects every type
    #[serde(default)]
    pub vehicle_types: Option<String>,
    #[serde(default)]
    pub search: String,
    #[serde(default)]
    pub sort_field: SortField,
    #[serde(default)]
    pub sort_order: SortOrder,
    #[serde(default)]
    pub group: GraphGroup,
    /// Comma-separated series labels; missing shows the whole group
    #[serde(default)]
    pub visible: Option<String>,
    /// Series label to toggle; one from the other group switches group
    #[serde(default)]
    pub toggle: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatisticsView {
    pub start_date: String,
    pub end_date: String,
    pub min_date: String,
    pub max_date: String,
    pub summary: StatisticsSummary,
    pub vehicle_types: Vec<String>,
    pub ranking: Vec<RankingEntry>,
    pub graph: Vec<GraphRow>,
    pub selection: GraphSelection,
    pub chart: ChartSeries,
}

pub async fn handle_statistics(
    State(state): State<AppState>,
    Query(q): Query<StatisticsQuery>,
) -> impl IntoResponse {
    let mut selection = GraphSelection::for_group(q.group);
    if let Some(visible) = split_list(q.visible.as_deref()) {
        selection.visible = visible;
    }
    if let Some(label) = q.toggle.as_deref() {
        match GraphGroup::of(label) {
            Some(group) => selection.select(label, group),
            None => return (StatusCode::BAD_REQUEST, format!("unknown series: {}", label)).into_response(),
        }
    }

    let date_from = q.date_from.as_deref();
    let date_to = q.date_to.as_deref();

    let model = match state.client.fetch_statistics(date_from, date_to).await {
        Ok(m) => m,
        Err(e) => return provider_error_response(e),
    };

    let vehicle_types = match split_list(q.vehicle_types.as_deref()) {
        Some(list) if !list.iter().any(|v| v == ALL) => list,
        _ => DEFAULT_VEHICLE_TYPES.iter().map(|s| s.to_string()).collect(),
    };

    let entries: Vec<RankingEntry> = model.ranking_table.iter().map(RankingEntry::from).collect();
    let ranking = apply_ranking_filter(&entries, &q.search, q.sort_field, q.sort_order);

    let graph = aggregate(&model.daily_data, date_from, date_to, &vehicle_types);

    let chart = statistics_chart(&graph, &selection);

    Json(StatisticsView {
        start_date: model.start_date,
        end_date: model.end_date,
        min_date: model.min_date,
        max_date: model.max_date,
        summary: model.summary,
        vehicle_types,
        ranking,
        graph,
        selection,
        chart,
    })
    .into_response()
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DriverStatisticsQuery {
    #[serde(default)]
    pub date_from: Option<String>,
    #[serde(default)]
    pub date_to: Option<String>,
    #[serde(default)]
    pub visible: Option<String>,
    #[serde(default)]
    pub toggle: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DriverStatisticsView {
    pub driver_info: DriverInfo,
    pub summary: DriverSummary,
    pub total_time_display: String,
    pub time_per_trip_display: String,
    pub min_date: Option<String>,
    pub max_date: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub visible: Vec<String>,
    pub chart: ChartSeries,
    pub daily_trip_log: Vec<DailyTripLog>,
}

pub async fn handle_driver_statistics(
    State(state): State<AppState>,
    Path(driver_id): Path<String>,
    Query(q): Query<DriverStatisticsQuery>,
) -> impl IntoResponse {
    let mut visible = split_list(q.visible.as_deref())
        .unwrap_or_else(|| DRIVER_EVENT_FILTERS.iter().map(|s| s.to_string()).collect());
    if let Some(label) = q.toggle.as_deref() {
        if !DRIVER_EVENT_FILTERS.contains(&label) {
            return (StatusCode::BAD_REQUEST, format!("unknown series: {}", label)).into_response();
        }
        toggle_in(&mut visible, label);
    }

    let date_from = q.date_from.as_deref();
    let date_to = q.date_to.as_deref();

    let mut model = match state
        .client
        .fetch_driver_statistics(&driver_id, date_from, date_to)
        .await
    {
        Ok(m) => m,
        Err(e) => return provider_error_response(e),
    };

    model.daily_data.retain(|date, _| in_date_range(date, date_from, date_to));

    let chart = driver_events_chart(&model.daily_data, &visible);

    Json(DriverStatisticsView {
        total_time_display: format_seconds(Some(model.summary.total_time)),
        time_per_trip_display: format_seconds(Some(model.summary.time_per_trip)),
        driver_info: model.driver_info,
        summary: model.summary,
        min_date: model.min_date,
        max_date: model.max_date,
        start_date: model.start_date,
        end_date: model.end_date,
        visible,
        chart,
        daily_trip_log: model.daily_trip_log,
    })
    .into_response()
}

// ============================================================================
// Trips
// ============================================================================

#[derive(Debug, Default, Deserialize)]
pub struct TripQuery {
    /// Event to center the map on
    #[serde(default)]
    pub event: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TripView {
    pub trip: DriverCurrentTrip,
    pub map: MapScene,
    pub overview: Viewport,
    pub selected_event: Option<String>,
    pub max_summary_count: u32,
}

pub async fn handle_current_trip(
    State(state): State<AppState>,
    Path(driver_id): Path<String>,
    Query(q): Query<TripQuery>,
) -> impl IntoResponse {
    trip_view(&state, &driver_id, None, q.event.as_deref()).await
}

pub async fn handle_trip(
    State(state): State<AppState>,
    Path((driver_id, trip_id)): Path<(String, String)>,
    Query(q): Query<TripQuery>,
) -> impl IntoResponse {
    trip_view(&state, &driver_id, Some(&trip_id), q.event.as_deref()).await
}

async fn trip_view(
    state: &AppState,
    driver_id: &str,
    trip_id: Option<&str>,
    selected: Option<&str>,
) -> Response {
    let mut trip = match state.client.fetch_driver_trip(driver_id, trip_id).await {
        Ok(t) => t,
        Err(e) => return provider_error_response(e),
    };

    // ISO timestamps: lexical order is chronological
    trip.trip_event_data_list.sort_by(|a, b| a.created.cmp(&b.created));

    let mut trip_map = crate::dashboard::TripMap::from_events(&trip.trip_event_data_list, state.config.default_view);

    if let Some(event_id) = selected {
        match trip.trip_event_data_list.iter().find(|e| e.event_id == event_id) {
            Some(event) => {
                trip_map.select_event(event);
            }
            None => {
                return (StatusCode::NOT_FOUND, format!("Event {} not found", event_id)).into_response();
            }
        }
    }

    let map = match build_scene(&trip_map.markers, &trip_map.route, trip_map.viewport).await {
        Ok(scene) => scene,
        Err(e) => return map_error_response(e),
    };

    Json(TripView {
        max_summary_count: trip.trip_event_summary_data.max_count(),
        overview: trip_map.overview,
        selected_event: trip_map.selected_event,
        trip,
        map,
    })
    .into_response()
}

// ============================================================================
// API: Devices
// ============================================================================

#[derive(Debug, Default, Deserialize)]
pub struct DeviceQuery {
    #[serde(default)]
    pub search: String,
    #[serde(default)]
    pub sort: DeviceSort,
}

pub async fn handle_get_devices(
    State(state): State<AppState>,
    Query(q): Query<DeviceQuery>,
) -> impl IntoResponse {
    match state.store.get_devices() {
        Ok(devices) => Json(filter_devices(&devices, &q.search, q.sort)).into_response(),
        Err(e) => db_error_response(e),
    }
}

pub async fn handle_create_device(
    State(state): State<AppState>,
    Json(form): Json<DeviceForm>,
) -> impl IntoResponse {
    match state.store.add_device(&form) {
        Ok(device) => (StatusCode::CREATED, Json(device)).into_response(),
        Err(e) => db_error_response(e),
    }
}

pub async fn handle_get_device(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    match state.store.get_device(&id) {
        Ok(device) => Json(device).into_response(),
        Err(e) => db_error_response(e),
    }
}

pub async fn handle_update_device(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(form): Json<DeviceForm>,
) -> impl IntoResponse {
    match state.store.update_device(&id, &form) {
        Ok(device) => Json(device).into_response(),
        Err(e) => db_error_response(e),
    }
}

pub async fn handle_delete_device(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    match state.store.delete_device(&id) {
        Ok(_) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => db_error_response(e),
    }
}

#[derive(Debug, Deserialize)]
pub struct AvailabilityQuery {
    pub field: UniqueField,
    pub value: String,
    /// Device being edited, which may keep its own values
    #[serde(default)]
    pub exclude: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AvailabilityView {
    pub field: &'static str,
    pub value: String,
    pub available: bool,
}

pub async fn handle_device_availability(
    State(state): State<AppState>,
    Query(q): Query<AvailabilityQuery>,
) -> impl IntoResponse {
    match state.store.is_value_taken(q.field, q.value.trim(), q.exclude.as_deref()) {
        Ok(taken) => Json(AvailabilityView {
            field: q.field.label(),
            value: q.value,
            available: !taken,
        })
        .into_response(),
        Err(e) => db_error_response(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Store;
    use crate::poller::SummaryPoller;
    use crate::provider::ApiClient;
    use crate::session::Session;
    use crate::web::Server;

    use axum::{routing::get, routing::post, Router};
    use serde_json::{json, Value};
    use tempfile::NamedTempFile;

    async fn spawn(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{}", addr)
    }

    fn driver_json(id: &str, vehicle: &str, available: &str, status: &str, lon: f64, lat: f64) -> Value {
        json!({
            "driverId": id, "driverName": format!("Driver {}", id), "vehicleType": vehicle,
            "carLicenseNo": format!("AD-{}", id), "updated": "2025-07-28T08:00:00Z",
            "available": available, "status": status,
            "currentLongitude": lon, "currentLatitude": lat
        })
    }

    fn backend() -> Router {
        Router::new()
            .route(
                "/userlogin",
                post(|| async {
                    Json(json!({
                        "token": "tok-1", "userId": "u-1",
                        "username": "ops", "userEmail": "ops@example.com"
                    }))
                }),
            )
            .route(
                "/summary-dashboard-data",
                get(|| async {
                    Json(json!({
                        "noOnline": 2, "noOffline": 1, "noWarning": 1, "noCritical": 1,
                        "overallLongitude": 100.52, "overallLatitude": 13.73,
                        "driverList": [
                            driver_json("1", "Bus", "Online", "Critical", 100.0, 13.0),
                            driver_json("2", "Cargo", "Online", "Warning", 102.0, 15.0),
                            driver_json("3", "Taxi", "Offline", "Normal", 101.0, 14.0)
                        ]
                    }))
                }),
            )
            .route(
                "/statistics",
                get(|| async {
                    Json(json!({
                        "startDate": "2025-01-01", "endDate": "2025-01-02",
                        "summary": {"allVehicles": 3, "allTrips": 10, "totalKilometers": 120.0},
                        "rankingTable": [
                            {"driverId": "1", "driverName": "A", "vehicleType": "Bus", "carLicenseNo": "AD-1",
                             "driverRanking": 1, "warningDuration": 2, "criticalDuration": 9, "quantity": 1},
                            {"driverId": "2", "driverName": "B", "vehicleType": "Cargo", "carLicenseNo": "AD-2",
                             "driverRanking": 2, "warningDuration": 7, "criticalDuration": 1, "quantity": 1}
                        ],
                        "dailyData": {
                            "2025-01-02": {"warning": {"Bus": 1, "Cargo": 4}},
                            "2025-01-01": {"warning": {"Bus": 5, "Cargo": 10}}
                        }
                    }))
                }),
            )
            .route(
                "/driver-trip-data/{id}",
                get(|| async {
                    Json(json!({
                        "driverId": "1", "driverName": "A", "carLicenseNo": "AD-1",
                        "vehicleType": "Bus", "status": "Critical",
                        "tripEventDataList": [
                            {"eventId": "e2", "created": "2025-07-28T09:00:00Z", "eventStatus": "Sleep",
                             "longitude": 100.6, "latitude": 13.8},
                            {"eventId": "e1", "created": "2025-07-28T08:00:00Z", "eventStatus": "Yawning duration",
                             "longitude": 100.4, "latitude": 13.6},
                            {"eventId": "e3", "created": "2025-07-28T10:00:00Z", "eventStatus": "Start Device",
                             "longitude": null, "latitude": null}
                        ],
                        "tripEventSummaryData": {"yawningCount": 1, "eyeCount": 0, "microSleepCount": 0,
                                                 "sleepCount": 3, "distractionCount": 0}
                    }))
                }),
            )
    }

    async fn start_app() -> (String, NamedTempFile) {
        let backend_url = spawn(backend()).await;
        let tmp = NamedTempFile::new().unwrap();

        let config = ServerConfig {
            api_url: backend_url,
            db_path: tmp.path().to_string_lossy().to_string(),
            ..Default::default()
        };

        let store = Arc::new(Store::new(&config.db_path).unwrap());
        let session = Arc::new(Session::new(store.clone()));
        let client = Arc::new(ApiClient::new(&config.api_url, config.request_timeout, session.clone()).unwrap());
        let poller = Arc::new(SummaryPoller::new(client.clone(), config.poll_interval));
        let server = Server::new(config, store, session, client, poller);

        (spawn(server.routes()).await, tmp)
    }

    async fn login(http: &reqwest::Client, app: &str) {
        let resp = http
            .post(format!("{}/api/login", app))
            .json(&json!({"email": "ops@example.com", "password": "secret"}))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);
    }

    #[tokio::test]
    async fn test_protected_routes_need_session() {
        let (app, _tmp) = start_app().await;
        let http = reqwest::Client::new();

        let resp = http.get(format!("{}/api/dashboard", app)).send().await.unwrap();
        assert_eq!(resp.status(), 401);

        let resp = http.get(format!("{}/api/theme", app)).send().await.unwrap();
        assert_eq!(resp.status(), 200);
    }

    #[tokio::test]
    async fn test_dashboard_filters_and_focus() {
        let (app, _tmp) = start_app().await;
        let http = reqwest::Client::new();
        login(&http, &app).await;

        let view: Value = http.get(format!("{}/api/dashboard", app)).send().await.unwrap().json().await.unwrap();
        assert_eq!(view["drivers"].as_array().unwrap().len(), 3);
        assert_eq!(view["counts"]["critical"], 1);
        assert_eq!(view["map"]["markers"].as_array().unwrap().len(), 3);

        http.post(format!("{}/api/filters/status/Online", app)).send().await.unwrap();
        let view: Value = http.get(format!("{}/api/dashboard", app)).send().await.unwrap().json().await.unwrap();
        assert_eq!(view["drivers"].as_array().unwrap().len(), 2);

        let resp = http.post(format!("{}/api/filters/status/Bogus", app)).send().await.unwrap();
        assert_eq!(resp.status(), 400);

        let focus: Value = http.post(format!("{}/api/map/status/Critical", app)).send().await.unwrap().json().await.unwrap();
        assert_eq!(focus["active"], "Critical");
        assert_eq!(focus["viewport"]["zoom"], 12);
        assert_eq!(focus["viewport"]["center"]["lon"], 100.0);

        let view: Value = http.get(format!("{}/api/dashboard", app)).send().await.unwrap().json().await.unwrap();
        assert_eq!(view["autoFit"], false);

        let focus: Value = http.post(format!("{}/api/map/status/Critical", app)).send().await.unwrap().json().await.unwrap();
        assert_eq!(focus["active"], "All");
        assert_eq!(focus["markers"].as_array().unwrap().len(), 3);

        let view: Value = http.get(format!("{}/api/dashboard", app)).send().await.unwrap().json().await.unwrap();
        assert_eq!(view["autoFit"], true);
        assert_eq!(view["statusFocus"], "All");
    }

    #[tokio::test]
    async fn test_statistics_view() {
        let (app, _tmp) = start_app().await;
        let http = reqwest::Client::new();
        login(&http, &app).await;

        let view: Value = http
            .get(format!("{}/api/statistics?vehicleTypes=Bus,Cargo&sortField=critical&sortOrder=highToLow", app))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();

        assert_eq!(view["graph"][0]["date"], "01/01");
        assert_eq!(view["graph"][0]["warning"], 15.0);
        assert_eq!(view["graph"][1]["warning"], 5.0);
        assert_eq!(view["ranking"][0]["id"], "1");
        assert_eq!(view["ranking"][0]["durationDisplay"], "9 times/hour");
        assert_eq!(view["chart"]["yAxisLabel"], "Total Events per 10 KM");
    }

    #[tokio::test]
    async fn test_statistics_series_toggle() {
        let (app, _tmp) = start_app().await;
        let http = reqwest::Client::new();
        login(&http, &app).await;

        let view: Value = http
            .get(format!("{}/api/statistics?group=event&toggle=Warning", app))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(view["selection"]["group"], "event");
        assert_eq!(view["selection"]["visible"].as_array().unwrap().len(), 4);
        assert_eq!(view["chart"]["datasets"][0]["hidden"], true);

        let view: Value = http
            .get(format!("{}/api/statistics?group=event&toggle=Max%20Speed", app))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(view["selection"]["group"], "speed");
        assert_eq!(view["selection"]["visible"], json!(["Max Speed"]));
        assert_eq!(view["chart"]["yAxisLabel"], "Speed (Km/h)");

        let resp = http
            .get(format!("{}/api/statistics?toggle=Bogus", app))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 400);

        let resp = http
            .get(format!("{}/api/statistics/1?toggle=Bogus", app))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 400);
    }

    #[tokio::test]
    async fn test_trip_view_orders_events_and_selects() {
        let (app, _tmp) = start_app().await;
        let http = reqwest::Client::new();
        login(&http, &app).await;

        let view: Value = http.get(format!("{}/api/trips/1", app)).send().await.unwrap().json().await.unwrap();
        let events = view["trip"]["tripEventDataList"].as_array().unwrap();
        assert_eq!(events[0]["eventId"], "e1");
        assert_eq!(view["map"]["route"].as_array().unwrap().len(), 2);
        assert_eq!(view["map"]["markers"][1]["severity"], "Critical");
        assert_eq!(view["maxSummaryCount"], 3);

        let view: Value = http.get(format!("{}/api/trips/1?event=e2", app)).send().await.unwrap().json().await.unwrap();
        assert_eq!(view["selectedEvent"], "e2");
        assert_eq!(view["map"]["viewport"]["zoom"], 15);

        let resp = http.get(format!("{}/api/trips/1?event=nope", app)).send().await.unwrap();
        assert_eq!(resp.status(), 404);
    }

    #[tokio::test]
    async fn test_device_crud() {
        let (app, _tmp) = start_app().await;
        let http = reqwest::Client::new();
        login(&http, &app).await;

        let form = json!({
            "name": "Somchai", "licensePlateId": "AD-1234", "phone": "0960051716",
            "carType": "BUS", "deviceId": "DFM-A001"
        });

        let resp = http.post(format!("{}/api/devices", app)).json(&form).send().await.unwrap();
        assert_eq!(resp.status(), 201);
        let device: Value = resp.json().await.unwrap();
        assert_eq!(device["id"], "B001");

        let resp = http.post(format!("{}/api/devices", app)).json(&form).send().await.unwrap();
        assert_eq!(resp.status(), 409);

        let mut bad = form.clone();
        bad["phone"] = json!("096-005");
        bad["deviceId"] = json!("DFM-A002");
        bad["licensePlateId"] = json!("AD-9999");
        let resp = http.post(format!("{}/api/devices", app)).json(&bad).send().await.unwrap();
        assert_eq!(resp.status(), 400);

        let avail: Value = http
            .get(format!("{}/api/devices/availability?field=licensePlateId&value=ad-1234", app))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(avail["available"], false);

        let resp = http.delete(format!("{}/api/devices/B001", app)).send().await.unwrap();
        assert_eq!(resp.status(), 204);
        let resp = http.get(format!("{}/api/devices/B001", app)).send().await.unwrap();
        assert_eq!(resp.status(), 404);
    }

    #[test]
    fn test_split_list() {
        assert_eq!(split_list(None), None);
        assert_eq!(
            split_list(Some("Bus, Cargo,,")),
            Some(vec!["Bus".to_string(), "Cargo".to_string()])
        );
    }
}
