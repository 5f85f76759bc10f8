//! JSON shapes returned by the fleet backend.

use crate::dashboard::{DailyData, LonLat, RankingEntry};
use crate::session::User;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A tracked driver/vehicle as reported by the summary endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Driver {
    pub driver_id: String,
    pub driver_name: String,
    pub vehicle_type: String,
    pub car_license_no: String,
    #[serde(default)]
    pub updated: String,
    /// "Online" or "Offline"
    pub available: String,
    /// "Normal", "Warning" or "Critical"
    pub status: String,
    #[serde(default)]
    pub current_longitude: Option<f64>,
    #[serde(default)]
    pub current_latitude: Option<f64>,
}

impl Driver {
    pub fn position(&self) -> Option<LonLat> {
        Some(LonLat::new(self.current_longitude?, self.current_latitude?))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryDriverData {
    pub no_online: u32,
    pub no_offline: u32,
    pub no_warning: u32,
    pub no_critical: u32,
    pub overall_longitude: f64,
    pub overall_latitude: f64,
    #[serde(default)]
    pub driver_list: Vec<Driver>,
}

impl SummaryDriverData {
    pub fn overall_center(&self) -> LonLat {
        LonLat::new(self.overall_longitude, self.overall_latitude)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TripEvent {
    pub event_id: String,
    pub created: String,
    #[serde(default)]
    pub diff_time: String,
    #[serde(default)]
    pub distance: f64,
    pub event_status: String,
    #[serde(default)]
    pub longitude: Option<f64>,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub event_images: Option<Vec<String>>,
}

impl TripEvent {
    pub fn position(&self) -> Option<LonLat> {
        Some(LonLat::new(self.longitude?, self.latitude?))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TripEventSummary {
    pub yawning_count: u32,
    pub eye_count: u32,
    pub micro_sleep_count: u32,
    pub sleep_count: u32,
    pub distraction_count: u32,
}

impl TripEventSummary {
    /// Largest count, at least 1, for scaling bar widths.
    pub fn max_count(&self) -> u32 {
        [
            self.yawning_count,
            self.eye_count,
            self.micro_sleep_count,
            self.sleep_count,
            self.distraction_count,
            1,
        ]
        .into_iter()
        .max()
        .unwrap_or(1)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DriverCurrentTrip {
    pub driver_id: String,
    pub driver_name: String,
    pub car_license_no: String,
    #[serde(default)]
    pub telephone: String,
    pub vehicle_type: String,
    pub status: String,
    #[serde(default)]
    pub current_trip_id: String,
    #[serde(default)]
    pub max_speed: f64,
    #[serde(default)]
    pub avg_speed: f64,
    #[serde(default)]
    pub no_speeding_detected: u32,
    #[serde(default)]
    pub trip_event_data_list: Vec<TripEvent>,
    #[serde(default)]
    pub trip_event_summary_data: TripEventSummary,
    #[serde(default)]
    pub updated: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatisticsSummary {
    pub all_vehicles: u32,
    pub all_trips: u32,
    pub total_kilometers: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RankDriverData {
    pub driver_id: String,
    pub driver_name: String,
    pub vehicle_type: String,
    pub car_license_no: String,
    #[serde(default)]
    pub driver_ranking: i64,
    #[serde(default)]
    pub warning_duration: f64,
    #[serde(default)]
    pub critical_duration: f64,
    #[serde(default)]
    pub quantity: f64,
}

impl From<&RankDriverData> for RankingEntry {
    fn from(r: &RankDriverData) -> Self {
        RankingEntry {
            rank: r.driver_ranking,
            id: r.driver_id.clone(),
            license_plate_no: r.car_license_no.clone(),
            name: r.driver_name.clone(),
            vehicles: r.vehicle_type.clone(),
            warning_duration: r.warning_duration,
            critical_duration: r.critical_duration,
            duration_display: String::new(),
            quantity: r.quantity,
        }
    }
}

/// Fleet-wide statistics for a date range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatisticModel {
    #[serde(default)]
    pub start_date: String,
    #[serde(default)]
    pub end_date: String,
    #[serde(default)]
    pub min_date: String,
    #[serde(default)]
    pub max_date: String,
    #[serde(default)]
    pub summary: StatisticsSummary,
    #[serde(default)]
    pub ranking_table: Vec<RankDriverData>,
    #[serde(default)]
    pub daily_data: DailyData,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DriverInfo {
    pub name: String,
    pub license_plate_no: String,
    pub vehicle_type: String,
    #[serde(default)]
    pub avatar_url: String,
    pub driver_id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DriverSummary {
    pub total_distance: f64,
    pub avg_speed: f64,
    pub max_speed: f64,
    /// Seconds
    pub total_time: f64,
    /// Seconds
    pub time_per_trip: f64,
    pub speeding_detected: u32,
}

/// One day of fatigue/distraction counts for a single driver.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DriverDailyEvents {
    pub yawning: f64,
    pub eye: f64,
    pub microsleep: f64,
    pub sleep: f64,
    pub distraction: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyTripLog {
    pub date: String,
    pub trip_id: String,
    /// Seconds since midnight
    pub start_time: f64,
    pub distance: f64,
    /// Seconds
    pub duration: f64,
    pub avg_speed: f64,
}

/// Statistics for one driver.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatisticDriverModel {
    pub driver_info: DriverInfo,
    #[serde(default)]
    pub summary: DriverSummary,
    #[serde(default)]
    pub daily_data: BTreeMap<String, DriverDailyEvents>,
    pub min_date: Option<String>,
    pub max_date: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    #[serde(default)]
    pub daily_trip_log: Vec<DailyTripLog>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginCredentials {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistrationData {
    pub email: String,
    pub username: String,
    pub password: String,
}

/// Flat login response from the backend.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct LoginResponse {
    pub token: Option<String>,
    pub user_id: String,
    pub username: String,
    pub user_email: String,
}

impl LoginResponse {
    pub fn user(&self) -> User {
        User {
            user_id: self.user_id.clone(),
            email: self.user_email.clone(),
            username: self.username.clone(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RegisteredUser {
    pub user_id: String,
    pub email: String,
    pub username: String,
    pub token: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct RegisterResponse {
    pub user: RegisteredUser,
}

/// Error body the backend may attach to failures.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ErrorBody {
    pub message: Option<String>,
}
