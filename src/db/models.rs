//! Device roster model types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Vehicle class a tracking device is installed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CarType {
    Bus,
    Cargo,
    Taxi,
}

impl CarType {
    pub fn as_str(&self) -> &'static str {
        match self {
            CarType::Bus => "BUS",
            CarType::Cargo => "CARGO",
            CarType::Taxi => "TAXI",
        }
    }

    /// First letter of the type, used as the device id prefix.
    pub fn id_prefix(&self) -> char {
        match self {
            CarType::Bus => 'B',
            CarType::Cargo => 'C',
            CarType::Taxi => 'T',
        }
    }
}

impl fmt::Display for CarType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Error, Debug, PartialEq, Eq)]
#[error("unknown car type: {0}")]
pub struct UnknownCarType(pub String);

impl FromStr for CarType {
    type Err = UnknownCarType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "BUS" => Ok(CarType::Bus),
            "CARGO" => Ok(CarType::Cargo),
            "TAXI" => Ok(CarType::Taxi),
            other => Err(UnknownCarType(other.to_string())),
        }
    }
}

/// A tracking device registered to a driver and vehicle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Device {
    pub id: String,
    pub name: String,
    pub license_plate_id: String,
    pub phone: String,
    pub car_type: CarType,
    pub device_id: String,
    pub date: DateTime<Utc>,
}

/// Fields supplied when creating or editing a device.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceForm {
    pub name: String,
    pub license_plate_id: String,
    pub phone: String,
    pub car_type: CarType,
    pub device_id: String,
}

impl DeviceForm {
    /// Copy with surrounding whitespace removed from every text field.
    pub fn trimmed(&self) -> Self {
        Self {
            name: self.name.trim().to_string(),
            license_plate_id: self.license_plate_id.trim().to_string(),
            phone: self.phone.trim().to_string(),
            car_type: self.car_type,
            device_id: self.device_id.trim().to_string(),
        }
    }
}

/// Fields that must be unique across the roster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum UniqueField {
    DeviceId,
    LicensePlateId,
}

impl UniqueField {
    pub fn column(&self) -> &'static str {
        match self {
            UniqueField::DeviceId => "device_id",
            UniqueField::LicensePlateId => "license_plate_id",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            UniqueField::DeviceId => "deviceId",
            UniqueField::LicensePlateId => "licensePlateId",
        }
    }
}

/// Device list ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DeviceSort {
    /// Newest registration first
    #[default]
    HighToLow,
    LowToHigh,
    DeviceIdAsc,
    DeviceIdDesc,
}
