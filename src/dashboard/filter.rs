//! Driver-list filter state: vehicle-type multi-select, status single-select
//! and free-text search.

use crate::provider::Driver;

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::str::FromStr;
use thiserror::Error;

/// Sentinel label meaning "no restriction".
pub const ALL: &str = "All";

/// Vehicle-type selection. `Only` is never empty.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum VehicleSelection {
    #[default]
    All,
    Only(BTreeSet<String>),
}

impl VehicleSelection {
    pub fn matches(&self, vehicle_type: &str) -> bool {
        match self {
            VehicleSelection::All => true,
            VehicleSelection::Only(set) => set.contains(vehicle_type),
        }
    }

    /// Labels for display: `["All"]` or the selected types in sorted order.
    pub fn labels(&self) -> Vec<String> {
        match self {
            VehicleSelection::All => vec![ALL.to_string()],
            VehicleSelection::Only(set) => set.iter().cloned().collect(),
        }
    }
}

/// Named status buttons on the driver list and the map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum StatusFilter {
    #[default]
    All,
    Online,
    Offline,
    Warning,
    Critical,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown status filter: {0}")]
pub struct UnknownStatus(pub String);

impl FromStr for StatusFilter {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "All" => Ok(StatusFilter::All),
            "Online" => Ok(StatusFilter::Online),
            "Offline" => Ok(StatusFilter::Offline),
            "Warning" => Ok(StatusFilter::Warning),
            "Critical" => Ok(StatusFilter::Critical),
            other => Err(UnknownStatus(other.to_string())),
        }
    }
}

impl StatusFilter {
    /// Online/Offline test availability; Warning/Critical test the severity
    /// status regardless of availability.
    pub fn matches(&self, driver: &Driver) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Online => driver.available == "Online",
            StatusFilter::Offline => driver.available == "Offline",
            StatusFilter::Warning => driver.status == "Warning",
            StatusFilter::Critical => driver.status == "Critical",
        }
    }
}

/// Case-insensitive substring search over driver id, plate and name.
/// A blank term matches every driver.
pub fn matches_search(driver: &Driver, term: &str) -> bool {
    let needle = term.trim().to_lowercase();
    if needle.is_empty() {
        return true;
    }

    driver.driver_id.to_lowercase().contains(&needle)
        || driver.car_license_no.to_lowercase().contains(&needle)
        || driver.driver_name.to_lowercase().contains(&needle)
}

/// Filter state for the driver list.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DriverFilter {
    pub vehicle_types: VehicleSelection,
    pub status: StatusFilter,
    pub search_term: String,
}

/// Serializable view of a `DriverFilter`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterSnapshot {
    pub vehicle_types: Vec<String>,
    pub status: StatusFilter,
    pub search_term: String,
}

impl DriverFilter {
    pub fn toggle_vehicle_type(&mut self, vehicle_type: &str) {
        if vehicle_type == ALL {
            self.vehicle_types = VehicleSelection::All;
            return;
        }

        self.vehicle_types = match std::mem::take(&mut self.vehicle_types) {
            VehicleSelection::All => {
                VehicleSelection::Only(BTreeSet::from([vehicle_type.to_string()]))
            }
            VehicleSelection::Only(mut set) => {
                if !set.remove(vehicle_type) {
                    set.insert(vehicle_type.to_string());
                }
                if set.is_empty() {
                    VehicleSelection::All
                } else {
                    VehicleSelection::Only(set)
                }
            }
        };
    }

    /// Single-select: always replaces the current status.
    pub fn toggle_status(&mut self, status: StatusFilter) {
        self.status = status;
    }

    pub fn set_search_term(&mut self, text: &str) {
        self.search_term = text.to_string();
    }

    pub fn matches(&self, driver: &Driver) -> bool {
        self.vehicle_types.matches(&driver.vehicle_type)
            && self.status.matches(driver)
            && matches_search(driver, &self.search_term)
    }

    pub fn apply<'a>(&self, drivers: &'a [Driver]) -> Vec<&'a Driver> {
        drivers.iter().filter(|d| self.matches(d)).collect()
    }

    pub fn snapshot(&self) -> FilterSnapshot {
        FilterSnapshot {
            vehicle_types: self.vehicle_types.labels(),
            status: self.status,
            search_term: self.search_term.clone(),
        }
    }
}
