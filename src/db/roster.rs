//! Device roster rules: id generation, form validation, search and ordering.

use super::models::{CarType, Device, DeviceForm, DeviceSort};
use super::DbError;

use regex::Regex;
use std::sync::OnceLock;

/// Next id for a car type: its prefix plus one past the highest existing
/// number with that prefix, zero-padded to three digits.
pub fn next_device_id<'a, I>(existing_ids: I, car_type: CarType) -> String
where
    I: IntoIterator<Item = &'a str>,
{
    let prefix = car_type.id_prefix();
    let last = existing_ids
        .into_iter()
        .filter_map(|id| id.strip_prefix(prefix))
        .filter_map(|rest| rest.parse::<u32>().ok())
        .max()
        .unwrap_or(0);

    format!("{}{:03}", prefix, last + 1)
}

fn phone_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[0-9]+$").expect("valid phone regex"))
}

/// Check required fields and the digits-only phone number.
pub fn validate_form(form: &DeviceForm) -> Result<(), DbError> {
    let required = [
        ("name", &form.name),
        ("deviceId", &form.device_id),
        ("licensePlateId", &form.license_plate_id),
        ("phone", &form.phone),
    ];

    for (field, value) in required {
        if value.trim().is_empty() {
            return Err(DbError::Validation(format!("{} is required", field)));
        }
    }

    if !phone_pattern().is_match(&form.phone) {
        return Err(DbError::Validation("phone must contain digits only".to_string()));
    }

    Ok(())
}

/// Search by name or license plate (case-insensitive), then order.
pub fn filter_devices(devices: &[Device], search: &str, sort: DeviceSort) -> Vec<Device> {
    let needle = search.trim().to_lowercase();

    let mut out: Vec<Device> = devices
        .iter()
        .filter(|d| {
            needle.is_empty()
                || d.name.to_lowercase().contains(&needle)
                || d.license_plate_id.to_lowercase().contains(&needle)
        })
        .cloned()
        .collect();

    match sort {
        DeviceSort::HighToLow => out.sort_by(|a, b| b.date.cmp(&a.date)),
        DeviceSort::LowToHigh => out.sort_by(|a, b| a.date.cmp(&b.date)),
        DeviceSort::DeviceIdAsc => out.sort_by(|a, b| a.device_id.cmp(&b.device_id)),
        DeviceSort::DeviceIdDesc => out.sort_by(|a, b| b.device_id.cmp(&a.device_id)),
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn sample_roster() -> Vec<Device> {
        let mk = |id: &str, name: &str, plate: &str, car_type, device_id: &str, day| Device {
            id: id.to_string(),
            name: name.to_string(),
            license_plate_id: plate.to_string(),
            phone: "0960051716".to_string(),
            car_type,
            device_id: device_id.to_string(),
            date: Utc.with_ymd_and_hms(2025, 7, day, 0, 0, 0).unwrap(),
        };

        vec![
            mk("B001", "David John", "AD-1234", CarType::Bus, "DFM-A001", 28),
            mk("C001", "Maria Onichan", "AD-1235", CarType::Cargo, "DFM-A002", 26),
            mk("C002", "Nguyen Si Thien", "AD-1236", CarType::Cargo, "DFM-A003", 25),
            mk("B002", "Mosskhun", "AD-1237", CarType::Bus, "DFM-A004", 29),
        ]
    }

    fn form(phone: &str) -> DeviceForm {
        DeviceForm {
            name: "Somchai".to_string(),
            license_plate_id: "AD-9999".to_string(),
            phone: phone.to_string(),
            car_type: CarType::Taxi,
            device_id: "DFM-A010".to_string(),
        }
    }

    #[test]
    fn test_next_device_id() {
        assert_eq!(next_device_id(["B001", "B002"], CarType::Bus), "B003");
        assert_eq!(next_device_id(["B001", "C007"], CarType::Cargo), "C008");
        assert_eq!(next_device_id(["B001"], CarType::Taxi), "T001");
        assert_eq!(next_device_id(Vec::<&str>::new(), CarType::Bus), "B001");
        // Gaps don't get reused and junk suffixes are ignored
        assert_eq!(next_device_id(["B001", "B009", "Bxyz"], CarType::Bus), "B010");
    }

    #[test]
    fn test_validate_form() {
        assert!(validate_form(&form("0960051716")).is_ok());
        assert!(matches!(validate_form(&form("096-005")), Err(DbError::Validation(_))));
        assert!(matches!(validate_form(&form("")), Err(DbError::Validation(_))));

        let mut blank_name = form("0960051716");
        blank_name.name = "  ".to_string();
        assert!(validate_form(&blank_name).is_err());
    }

    #[test]
    fn test_search_license_plate() {
        let found = filter_devices(&sample_roster(), "ad-1235", DeviceSort::HighToLow);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].license_plate_id, "AD-1235");

        let found = filter_devices(&sample_roster(), "AD-1235", DeviceSort::HighToLow);
        assert_eq!(found.len(), 1);
    }

    #[test]
    fn test_sort_orders() {
        let roster = sample_roster();

        let ids: Vec<_> = filter_devices(&roster, "", DeviceSort::HighToLow)
            .into_iter()
            .map(|d| d.id)
            .collect();
        assert_eq!(ids, vec!["B002", "B001", "C001", "C002"]);

        let ids: Vec<_> = filter_devices(&roster, "", DeviceSort::DeviceIdDesc)
            .into_iter()
            .map(|d| d.device_id)
            .collect();
        assert_eq!(ids, vec!["DFM-A004", "DFM-A003", "DFM-A002", "DFM-A001"]);
    }
}
