//! Time-series aggregation of daily per-vehicle-type event counts.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Vehicle types selected when no explicit selection is given.
pub const DEFAULT_VEHICLE_TYPES: &[&str] = &["Bus", "Cargo", "Taxi"];

/// Counts keyed by vehicle type, e.g. `{"Bus": 5, "Cargo": 10}`.
pub type VehicleCounts = HashMap<String, f64>;

/// All per-vehicle-type metrics recorded for one calendar day.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyStatistic {
    #[serde(default)]
    pub warning: VehicleCounts,
    #[serde(default)]
    pub critical: VehicleCounts,
    #[serde(default)]
    pub distraction: VehicleCounts,
    #[serde(default)]
    pub speeding: VehicleCounts,
    #[serde(default)]
    pub harsh_braking: VehicleCounts,
    #[serde(default)]
    pub avg_speed: VehicleCounts,
    #[serde(default)]
    pub max_speed: VehicleCounts,
}

/// Day-keyed statistics. ISO date keys sort chronologically.
pub type DailyData = BTreeMap<String, DailyStatistic>;

/// One plot-ready row per included day.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphRow {
    /// `DD/MM` label
    pub date: String,
    pub warning: f64,
    pub critical: f64,
    pub distraction: f64,
    pub speeding_detected: f64,
    pub harsh_braking: f64,
    pub avg_speed: f64,
    pub max_speed: f64,
}

/// Whether an ISO date falls inside the inclusive, optionally open-ended range.
pub fn in_date_range(date: &str, from: Option<&str>, to: Option<&str>) -> bool {
    let after_from = from.map_or(true, |f| f.is_empty() || date >= f);
    let before_to = to.map_or(true, |t| t.is_empty() || date <= t);
    after_from && before_to
}

/// Sum the counts for the selected vehicle types. Missing types count as zero.
pub fn sum_selected(counts: &VehicleCounts, selected: &[String]) -> f64 {
    selected
        .iter()
        .map(|vehicle| counts.get(vehicle).copied().unwrap_or(0.0))
        .sum()
}

/// Format an ISO date key as a zero-padded `DD/MM` label.
///
/// Keys that are not `YYYY-MM-DD` dates are returned as-is.
pub fn day_month_label(date: &str) -> String {
    match NaiveDate::parse_from_str(date, "%Y-%m-%d") {
        Ok(d) => format!("{:02}/{:02}", d.day(), d.month()),
        Err(_) => date.to_string(),
    }
}

/// Filter daily data by date range and reshape into per-day rows summed over the
/// selected vehicle types.
pub fn aggregate(
    daily_data: &DailyData,
    date_from: Option<&str>,
    date_to: Option<&str>,
    selected_vehicle_types: &[String],
) -> Vec<GraphRow> {
    daily_data
        .iter()
        .filter(|(date, _)| in_date_range(date, date_from, date_to))
        .map(|(date, stat)| GraphRow {
            date: day_month_label(date),
            warning: sum_selected(&stat.warning, selected_vehicle_types),
            critical: sum_selected(&stat.critical, selected_vehicle_types),
            distraction: sum_selected(&stat.distraction, selected_vehicle_types),
            speeding_detected: sum_selected(&stat.speeding, selected_vehicle_types),
            harsh_braking: sum_selected(&stat.harsh_braking, selected_vehicle_types),
            avg_speed: sum_selected(&stat.avg_speed, selected_vehicle_types),
            max_speed: sum_selected(&stat.max_speed, selected_vehicle_types),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn counts(pairs: &[(&str, f64)]) -> VehicleCounts {
        pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    fn types(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn sample() -> DailyData {
        let mut data = DailyData::new();
        data.insert(
            "2025-01-01".to_string(),
            DailyStatistic {
                warning: counts(&[("Bus", 2.0), ("Cargo", 3.0)]),
                ..Default::default()
            },
        );
        data.insert(
            "2025-01-02".to_string(),
            DailyStatistic {
                warning: counts(&[("Bus", 1.0)]),
                ..Default::default()
            },
        );
        data
    }

    #[test]
    fn test_bus_only_scenario() {
        let rows = aggregate(&sample(), None, None, &types(&["Bus"]));
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].date, "01/01");
        assert_eq!(rows[0].warning, 2.0);
        assert_eq!(rows[1].date, "02/01");
        assert_eq!(rows[1].warning, 1.0);
    }

    #[test]
    fn test_inclusive_bounds() {
        let mut data = sample();
        data.insert("2025-01-03".to_string(), DailyStatistic::default());

        let rows = aggregate(&data, Some("2025-01-02"), Some("2025-01-03"), &types(&["Bus"]));
        let labels: Vec<_> = rows.iter().map(|r| r.date.as_str()).collect();
        assert_eq!(labels, vec!["02/01", "03/01"]);

        let rows = aggregate(&data, None, Some("2025-01-01"), &types(&["Bus"]));
        assert_eq!(rows.len(), 1);

        // Empty strings behave as unbounded
        let rows = aggregate(&data, Some(""), Some(""), &types(&["Bus"]));
        assert_eq!(rows.len(), 3);
    }

    #[test]
    fn test_empty_selection_sums_to_zero() {
        let rows = aggregate(&sample(), None, None, &[]);
        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|r| r.warning == 0.0 && r.critical == 0.0));
    }

    #[test]
    fn test_totals_preserved_without_bounds() {
        let mut data = sample();
        data.insert(
            "2024-12-31".to_string(),
            DailyStatistic {
                critical: counts(&[("Taxi", 4.0), ("Bus", 1.0)]),
                speeding: counts(&[("Cargo", 7.0)]),
                ..Default::default()
            },
        );

        let all_types = types(&["Bus", "Cargo", "Taxi"]);
        let rows = aggregate(&data, None, None, &all_types);

        let summed: f64 = rows.iter().map(|r| r.warning + r.critical + r.speeding_detected).sum();
        let expected: f64 = data
            .values()
            .flat_map(|s| s.warning.values().chain(s.critical.values()).chain(s.speeding.values()))
            .sum();
        assert_eq!(summed, expected);

        // Ascending date order
        assert_eq!(rows[0].date, "31/12");
    }

    #[test]
    fn test_idempotent() {
        let data = sample();
        let selected = types(&["Bus", "Cargo"]);
        assert_eq!(
            aggregate(&data, Some("2025-01-01"), None, &selected),
            aggregate(&data, Some("2025-01-01"), None, &selected)
        );
    }

    #[test]
    fn test_deserialize_missing_categories() {
        let json = r#"{"2025-03-09": {"warning": {"Bus": 4}}}"#;
        let data: DailyData = serde_json::from_str(json).unwrap();
        let rows = aggregate(&data, None, None, &types(&["Bus"]));
        assert_eq!(rows[0].date, "09/03");
        assert_eq!(rows[0].warning, 4.0);
        assert_eq!(rows[0].max_speed, 0.0);
    }
}
