use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;

use super::aggregate::{
    AgeHistogram, CategoryCounts, DEFAULT_AGE_BINS, DEFAULT_MIN_LOCALITY_COUNT, age_histogram,
    count_by,
};
use super::filter::{FilterSelection, filtered_indices, region_indices};
use super::model::{Column, SurveyDataset};

/// Tunables of the four aggregates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ChartSettings {
    pub age_bins: usize,
    pub min_locality_count: usize,
}

impl Default for ChartSettings {
    fn default() -> Self {
        Self {
            age_bins: DEFAULT_AGE_BINS,
            min_locality_count: DEFAULT_MIN_LOCALITY_COUNT,
        }
    }
}

/// The four chart payloads, always produced together.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DashboardPayload {
    pub age: AgeHistogram,
    pub region: CategoryCounts,
    pub locality: CategoryCounts,
    pub variety: CategoryCounts,
    /// Records passing the nationality / gender / project filters.
    pub matched_records: usize,
}

/// Recompute every chart for the given selection.
///
/// Nationality, gender and project gate the age, region and variety charts.
/// The locality chart starts from the full dataset and is scoped only by
/// `selection.region`, then thresholded.
pub fn compute_payloads(
    dataset: &SurveyDataset,
    selection: &FilterSelection,
    settings: &ChartSettings,
) -> DashboardPayload {
    let filtered = filtered_indices(dataset, selection);
    let rows = || filtered.iter().map(|&i| &dataset.records[i]);

    let in_region = region_indices(dataset, selection.region.as_deref());
    let locality = count_by(in_region.iter().map(|&i| &dataset.records[i]), Column::Locality)
        .with_min_support(settings.min_locality_count);

    log::debug!(
        "Recomputed charts: {} of {} records match, {} in region {:?}",
        filtered.len(),
        dataset.len(),
        in_region.len(),
        selection.region
    );

    DashboardPayload {
        age: age_histogram(rows(), settings.age_bins),
        region: count_by(rows(), Column::Region),
        locality,
        variety: count_by(rows(), Column::Variety),
        matched_records: filtered.len(),
    }
}

/// Write the selection and its four payloads as pretty JSON.
pub fn export_json(
    path: &Path,
    selection: &FilterSelection,
    payload: &DashboardPayload,
) -> Result<()> {
    #[derive(Serialize)]
    struct Export<'a> {
        selection: &'a FilterSelection,
        charts: &'a DashboardPayload,
    }

    let text = serde_json::to_string_pretty(&Export {
        selection,
        charts: payload,
    })
    .context("serializing chart data")?;
    std::fs::write(path, text).with_context(|| format!("writing {}", path.display()))?;
    log::info!("Exported chart data to {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use super::*;
    use crate::data::model::SurveyRecord;

    fn rec(gender: &str, region: &str, locality: &str, variety: &str) -> SurveyRecord {
        SurveyRecord {
            nationality: "senegalaise".into(),
            gender: gender.into(),
            project: "p1".into(),
            region: region.into(),
            locality: locality.into(),
            variety: variety.into(),
            age: Some(35.0),
        }
    }

    /// 15 rows in "north" (10 in "a", 5 in "b") and 5 rows in "south" ("c").
    fn north_south() -> SurveyDataset {
        let mut recs = Vec::new();
        recs.extend((0..10).map(|i| rec(if i < 6 { "male" } else { "female" }, "north", "a", "riz")));
        recs.extend((0..5).map(|_| rec("female", "north", "b", "mil")));
        recs.extend((0..5).map(|_| rec("male", "south", "c", "mais")));
        SurveyDataset::from_records(recs)
    }

    fn genders(vals: &[&str]) -> BTreeSet<String> {
        vals.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn region_scoped_locality_drops_small_counts() {
        let ds = north_south();
        let sel = FilterSelection {
            region: Some("north".into()),
            ..Default::default()
        };
        let p = compute_payloads(&ds, &sel, &ChartSettings::default());
        assert_eq!(p.locality.entries.len(), 1);
        assert_eq!(p.locality.get("a"), Some(10));
    }

    #[test]
    fn locality_threshold_holds_without_region() {
        let ds = north_south();
        let p = compute_payloads(&ds, &FilterSelection::default(), &ChartSettings::default());
        assert!(p.locality.entries.iter().all(|e| e.count >= 10));
        assert_eq!(p.locality.get("a"), Some(10));
        assert_eq!(p.locality.get("b"), None);
        assert_eq!(p.locality.get("c"), None);
    }

    #[test]
    fn gender_selection_gates_region_and_variety_but_not_locality() {
        let ds = north_south();
        let sel = FilterSelection {
            genders: genders(&["male"]),
            ..Default::default()
        };
        let p = compute_payloads(&ds, &sel, &ChartSettings::default());

        assert_eq!(p.matched_records, 11);
        assert_eq!(p.region.get("north"), Some(6));
        assert_eq!(p.region.get("south"), Some(5));
        assert_eq!(p.variety.get("riz"), Some(6));
        assert_eq!(p.variety.get("mil"), None);
        assert_eq!(p.age.series.len(), 1);
        assert_eq!(p.age.series[0].gender, "male");
        // Locality still sees all 10 "a" rows, female ones included.
        assert_eq!(p.locality.get("a"), Some(10));
    }

    #[test]
    fn empty_result_is_well_formed() {
        let ds = north_south();
        let sel = FilterSelection {
            nationalities: genders(&["gambienne"]),
            region: Some("east".into()),
            ..Default::default()
        };
        let p = compute_payloads(&ds, &sel, &ChartSettings::default());
        assert_eq!(p.matched_records, 0);
        assert!(p.age.is_empty());
        assert!(p.region.is_empty());
        assert!(p.locality.is_empty());
        assert!(p.variety.is_empty());
    }

    #[test]
    fn recomputation_is_idempotent() {
        let ds = north_south();
        let sel = FilterSelection {
            genders: genders(&["female", "male"]),
            region: Some("south".into()),
            ..Default::default()
        };
        let settings = ChartSettings {
            age_bins: 20,
            min_locality_count: 5,
        };
        let first = compute_payloads(&ds, &sel, &settings);
        let second = compute_payloads(&ds, &sel, &settings);
        assert_eq!(first, second);
        assert_eq!(first.locality.get("c"), Some(5));
    }

    #[test]
    fn export_writes_selection_and_charts() {
        let ds = north_south();
        let sel = FilterSelection {
            region: Some("north".into()),
            ..Default::default()
        };
        let p = compute_payloads(&ds, &sel, &ChartSettings::default());

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("charts.json");
        export_json(&path, &sel, &p).unwrap();

        let json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(json["selection"]["region"], "north");
        assert_eq!(json["charts"]["locality"]["entries"][0]["label"], "a");
        assert_eq!(json["charts"]["locality"]["entries"][0]["count"], 10);
        assert_eq!(json["charts"]["age"]["bins"].as_array().unwrap().len(), 20);
    }
}
