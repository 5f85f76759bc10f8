//! Driver ranking: search, stable sort and display formatting.

use serde::{Deserialize, Serialize};

/// One row of the driver ranking table.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RankingEntry {
    pub rank: i64,
    pub id: String,
    pub license_plate_no: String,
    pub name: String,
    pub vehicles: String,
    pub warning_duration: f64,
    pub critical_duration: f64,
    pub duration_display: String,
    pub quantity: f64,
}

/// Numeric field the ranking is sorted on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortField {
    #[default]
    Warning,
    Critical,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortOrder {
    #[default]
    HighToLow,
    LowToHigh,
}

impl RankingEntry {
    pub fn duration(&self, field: SortField) -> f64 {
        match field {
            SortField::Warning => self.warning_duration,
            SortField::Critical => self.critical_duration,
        }
    }

    fn matches(&self, needle: &str) -> bool {
        self.id.to_lowercase().contains(needle)
            || self.license_plate_no.to_lowercase().contains(needle)
            || self.name.to_lowercase().contains(needle)
    }
}

/// Filter by search text, sort by the chosen duration and regenerate the display
/// string from that same field.
///
/// The input slice is left untouched. Ties keep their input order.
pub fn apply_ranking_filter(
    entries: &[RankingEntry],
    search_text: &str,
    sort_field: SortField,
    sort_order: SortOrder,
) -> Vec<RankingEntry> {
    let needle = search_text.trim().to_lowercase();

    let mut ranked: Vec<RankingEntry> = entries
        .iter()
        .filter(|e| needle.is_empty() || e.matches(&needle))
        .cloned()
        .collect();

    // sort_by is stable
    ranked.sort_by(|a, b| {
        let (va, vb) = (a.duration(sort_field), b.duration(sort_field));
        match sort_order {
            SortOrder::HighToLow => vb.total_cmp(&va),
            SortOrder::LowToHigh => va.total_cmp(&vb),
        }
    });

    for entry in &mut ranked {
        entry.duration_display = format!("{} times/hour", entry.duration(sort_field));
    }

    ranked
}

/// Render a number of seconds as `"X hr Y min"`, omitting the hour part when zero.
pub fn format_seconds(total_seconds: Option<f64>) -> String {
    let secs = match total_seconds {
        Some(s) if !s.is_nan() => s,
        _ => return "N/A".to_string(),
    };

    if secs < 0.0 {
        return "0 min".to_string();
    }

    let hours = (secs / 3600.0).floor() as u64;
    let minutes = ((secs % 3600.0) / 60.0).floor() as u64;

    if hours > 0 {
        format!("{} hr {} min", hours, minutes)
    } else {
        format!("{} min", minutes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(id: &str, plate: &str, name: &str, warning: f64, critical: f64) -> RankingEntry {
        RankingEntry {
            rank: 0,
            id: id.to_string(),
            license_plate_no: plate.to_string(),
            name: name.to_string(),
            vehicles: "Bus".to_string(),
            warning_duration: warning,
            critical_duration: critical,
            duration_display: String::new(),
            quantity: 0.0,
        }
    }

    fn roster() -> Vec<RankingEntry> {
        vec![
            entry("D001", "AD-1234", "David John", 3.0, 1.0),
            entry("D002", "AD-1235", "Maria Onichan", 5.0, 0.5),
            entry("D003", "AD-1236", "Nguyen Si Thien", 3.0, 4.0),
            entry("D004", "AD-1237", "Mosskhun", 1.5, 2.0),
        ]
    }

    #[test]
    fn test_high_to_low_order() {
        let ranked = apply_ranking_filter(&roster(), "", SortField::Warning, SortOrder::HighToLow);
        for pair in ranked.windows(2) {
            assert!(pair[0].warning_duration >= pair[1].warning_duration);
        }
        assert_eq!(ranked[0].id, "D002");
    }

    #[test]
    fn test_stable_ties() {
        let ranked = apply_ranking_filter(&roster(), "", SortField::Warning, SortOrder::HighToLow);
        let ids: Vec<_> = ranked.iter().map(|e| e.id.as_str()).collect();
        // D001 and D003 tie at 3.0 and keep input order
        assert_eq!(ids, vec!["D002", "D001", "D003", "D004"]);

        let ranked = apply_ranking_filter(&roster(), "", SortField::Warning, SortOrder::LowToHigh);
        let ids: Vec<_> = ranked.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["D004", "D001", "D003", "D002"]);
    }

    #[test]
    fn test_display_follows_sort_field() {
        let ranked = apply_ranking_filter(&roster(), "", SortField::Critical, SortOrder::HighToLow);
        assert_eq!(ranked[0].id, "D003");
        assert_eq!(ranked[0].duration_display, "4 times/hour");

        let last = ranked.last().unwrap();
        assert_eq!(last.duration_display, "0.5 times/hour");
    }

    #[test]
    fn test_search_case_insensitive() {
        let ranked = apply_ranking_filter(&roster(), "  maria ", SortField::Warning, SortOrder::HighToLow);
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].id, "D002");

        let ranked = apply_ranking_filter(&roster(), "ad-123", SortField::Warning, SortOrder::HighToLow);
        assert_eq!(ranked.len(), 4);

        let ranked = apply_ranking_filter(&roster(), "d004", SortField::Warning, SortOrder::HighToLow);
        assert_eq!(ranked[0].name, "Mosskhun");
    }

    #[test]
    fn test_blank_search_is_noop_and_input_untouched() {
        let input = roster();
        let ranked = apply_ranking_filter(&input, "   ", SortField::Warning, SortOrder::HighToLow);
        assert_eq!(ranked.len(), 4);
        assert_eq!(input, roster());
    }

    #[test]
    fn test_format_seconds() {
        assert_eq!(format_seconds(None), "N/A");
        assert_eq!(format_seconds(Some(f64::NAN)), "N/A");
        assert_eq!(format_seconds(Some(-5.0)), "0 min");
        assert_eq!(format_seconds(Some(59.0)), "0 min");
        assert_eq!(format_seconds(Some(1500.0)), "25 min");
        assert_eq!(format_seconds(Some(3600.0)), "1 hr 0 min");
        assert_eq!(format_seconds(Some(9000.0)), "2 hr 30 min");
    }
}
