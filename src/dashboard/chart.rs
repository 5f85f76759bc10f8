//! Line-series datasets for the chart widget.

use super::aggregate::GraphRow;
use crate::provider::DriverDailyEvents;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const EVENT_FILTERS: &[&str] = &["Warning", "Distraction", "Critical", "Speeding Detected", "Harsh Braking"];
pub const SPEED_FILTERS: &[&str] = &["Avg. Speed", "Max Speed"];
pub const DRIVER_EVENT_FILTERS: &[&str] = &["Yawning", "Eye", "Micro-Sleep", "Sleep", "Distraction"];

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Dataset {
    pub label: String,
    pub color: &'static str,
    pub data: Vec<f64>,
    pub hidden: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartSeries {
    pub labels: Vec<String>,
    pub datasets: Vec<Dataset>,
    pub y_axis_label: String,
}

/// Add `item` if absent, remove it if present.
pub fn toggle_in(list: &mut Vec<String>, item: &str) {
    match list.iter().position(|x| x == item) {
        Some(idx) => {
            list.remove(idx);
        }
        None => list.push(item.to_string()),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum GraphGroup {
    #[default]
    Event,
    Speed,
}

impl GraphGroup {
    /// Group owning a series label, if any.
    pub fn of(label: &str) -> Option<Self> {
        if EVENT_FILTERS.contains(&label) {
            Some(GraphGroup::Event)
        } else if SPEED_FILTERS.contains(&label) {
            Some(GraphGroup::Speed)
        } else {
            None
        }
    }
}

/// Which fleet-statistics series are visible. Only one group is shown at a time.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphSelection {
    pub group: GraphGroup,
    pub visible: Vec<String>,
}

impl Default for GraphSelection {
    fn default() -> Self {
        Self::for_group(GraphGroup::Event)
    }
}

impl GraphSelection {
    /// Every series of the group visible.
    pub fn for_group(group: GraphGroup) -> Self {
        let filters = match group {
            GraphGroup::Event => EVENT_FILTERS,
            GraphGroup::Speed => SPEED_FILTERS,
        };
        Self {
            group,
            visible: filters.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Switching group clears the selection before toggling.
    pub fn select(&mut self, filter: &str, group: GraphGroup) {
        if self.group != group {
            self.group = group;
            self.visible.clear();
        }
        toggle_in(&mut self.visible, filter);
    }

    fn y_axis_label(&self) -> &'static str {
        match self.group {
            GraphGroup::Event => "Total Events per 10 KM",
            GraphGroup::Speed => "Speed (Km/h)",
        }
    }
}

fn dataset(label: &str, color: &'static str, data: Vec<f64>, visible: &[String]) -> Dataset {
    Dataset {
        label: label.to_string(),
        color,
        data,
        hidden: !visible.iter().any(|v| v == label),
    }
}

/// Fleet statistics chart built from aggregated rows.
pub fn statistics_chart(rows: &[GraphRow], selection: &GraphSelection) -> ChartSeries {
    let column = |f: fn(&GraphRow) -> f64| rows.iter().map(f).collect::<Vec<_>>();
    let visible = &selection.visible;

    ChartSeries {
        labels: rows.iter().map(|r| r.date.clone()).collect(),
        datasets: vec![
            dataset("Warning", "#facc15", column(|r| r.warning), visible),
            dataset("Distraction", "#fb923c", column(|r| r.distraction), visible),
            dataset("Critical", "#f87171", column(|r| r.critical), visible),
            dataset("Speeding Detected", "#60a5fa", column(|r| r.speeding_detected), visible),
            dataset("Harsh Braking", "#f472b6", column(|r| r.harsh_braking), visible),
            dataset("Avg. Speed", "#34d399", column(|r| r.avg_speed), visible),
            dataset("Max Speed", "#a78bfa", column(|r| r.max_speed), visible),
        ],
        y_axis_label: selection.y_axis_label().to_string(),
    }
}

/// Short `Mon D` label for a driver chart axis, e.g. `Jul 5`.
pub fn short_date_label(date: &str) -> String {
    match NaiveDate::parse_from_str(date, "%Y-%m-%d") {
        Ok(d) => d.format("%b %-d").to_string(),
        Err(_) => date.to_string(),
    }
}

/// Per-driver fatigue/distraction chart, one point per day in date order.
pub fn driver_events_chart(
    daily: &BTreeMap<String, DriverDailyEvents>,
    visible: &[String],
) -> ChartSeries {
    let column = |f: fn(&DriverDailyEvents) -> f64| daily.values().map(f).collect::<Vec<_>>();

    ChartSeries {
        labels: daily.keys().map(|d| short_date_label(d)).collect(),
        datasets: vec![
            dataset("Yawning", "#FFC107", column(|d| d.yawning), visible),
            dataset("Eye", "#DC3545", column(|d| d.eye), visible),
            dataset("Micro-Sleep", "#17A2B8", column(|d| d.microsleep), visible),
            dataset("Sleep", "#17B83A", column(|d| d.sleep), visible),
            dataset("Distraction", "#6F42C1", column(|d| d.distraction), visible),
        ],
        y_axis_label: "Event Count".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(date: &str, warning: f64, avg_speed: f64) -> GraphRow {
        GraphRow {
            date: date.to_string(),
            warning,
            avg_speed,
            ..Default::default()
        }
    }

    #[test]
    fn test_toggle_in() {
        let mut list = vec!["Bus".to_string()];
        toggle_in(&mut list, "Cargo");
        assert_eq!(list, vec!["Bus", "Cargo"]);
        toggle_in(&mut list, "Bus");
        assert_eq!(list, vec!["Cargo"]);
    }

    #[test]
    fn test_group_switch_clears_selection() {
        let mut sel = GraphSelection::default();
        assert_eq!(sel.visible.len(), EVENT_FILTERS.len());

        sel.select("Warning", GraphGroup::Event);
        assert!(!sel.visible.contains(&"Warning".to_string()));

        sel.select("Max Speed", GraphGroup::Speed);
        assert_eq!(sel.group, GraphGroup::Speed);
        assert_eq!(sel.visible, vec!["Max Speed"]);
    }

    #[test]
    fn test_group_of_label() {
        assert_eq!(GraphGroup::of("Harsh Braking"), Some(GraphGroup::Event));
        assert_eq!(GraphGroup::of("Avg. Speed"), Some(GraphGroup::Speed));
        assert_eq!(GraphGroup::of("Yawning"), None);
    }

    #[test]
    fn test_statistics_chart_visibility() {
        let rows = vec![row("01/01", 2.0, 40.0), row("02/01", 1.0, 45.0)];
        let chart = statistics_chart(&rows, &GraphSelection::for_group(GraphGroup::Speed));

        assert_eq!(chart.labels, vec!["01/01", "02/01"]);
        assert_eq!(chart.y_axis_label, "Speed (Km/h)");

        let warning = chart.datasets.iter().find(|d| d.label == "Warning").unwrap();
        assert!(warning.hidden);
        assert_eq!(warning.data, vec![2.0, 1.0]);

        let avg = chart.datasets.iter().find(|d| d.label == "Avg. Speed").unwrap();
        assert!(!avg.hidden);
        assert_eq!(avg.data, vec![40.0, 45.0]);
    }

    #[test]
    fn test_driver_events_chart() {
        let mut daily = BTreeMap::new();
        daily.insert(
            "2025-07-05".to_string(),
            DriverDailyEvents { yawning: 3.0, eye: 1.0, microsleep: 0.0, sleep: 0.0, distraction: 2.0 },
        );
        daily.insert("2025-07-04".to_string(), DriverDailyEvents::default());

        let visible = vec!["Yawning".to_string()];
        let chart = driver_events_chart(&daily, &visible);
        assert_eq!(chart.labels, vec!["Jul 4", "Jul 5"]);
        assert_eq!(chart.datasets[0].data, vec![0.0, 3.0]);
        assert!(!chart.datasets[0].hidden);
        assert!(chart.datasets[4].hidden);
    }
}
