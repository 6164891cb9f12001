use std::collections::BTreeSet;

use serde::Serialize;

use super::model::{Column, SurveyDataset, SurveyRecord};

// ---------------------------------------------------------------------------
// Filter selection: what the dropdowns currently hold
// ---------------------------------------------------------------------------

/// Current dropdown state. Built per interaction, never stored in the dataset.
///
/// The three multi-select fields combine with OR inside a field and AND across
/// fields; an empty set means "no constraint". `region` only scopes the
/// locality chart.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FilterSelection {
    pub nationalities: BTreeSet<String>,
    pub genders: BTreeSet<String>,
    pub projects: BTreeSet<String>,
    pub region: Option<String>,
}

impl FilterSelection {
    /// The multi-select set backing `column`, if that column has one.
    pub fn values(&self, column: Column) -> Option<&BTreeSet<String>> {
        match column {
            Column::Nationality => Some(&self.nationalities),
            Column::Gender => Some(&self.genders),
            Column::Project => Some(&self.projects),
            _ => None,
        }
    }

    pub fn values_mut(&mut self, column: Column) -> Option<&mut BTreeSet<String>> {
        match column {
            Column::Nationality => Some(&mut self.nationalities),
            Column::Gender => Some(&mut self.genders),
            Column::Project => Some(&mut self.projects),
            _ => None,
        }
    }

    /// Whether a record passes the nationality / gender / project predicates.
    pub fn matches(&self, rec: &SurveyRecord) -> bool {
        [
            (&self.nationalities, &rec.nationality),
            (&self.genders, &rec.gender),
            (&self.projects, &rec.project),
        ]
        .iter()
        .all(|(selected, value)| selected.is_empty() || selected.contains(value.as_str()))
    }

    /// One-line summary for the status bar, e.g. `Gender: female | Region: north`.
    pub fn describe(&self) -> String {
        let mut parts: Vec<String> = MULTI_SELECT_COLUMNS
            .iter()
            .filter_map(|&col| {
                let selected = self.values(col)?;
                (!selected.is_empty()).then(|| {
                    let vals: Vec<&str> = selected.iter().map(String::as_str).collect();
                    format!("{col}: {}", vals.join(", "))
                })
            })
            .collect();
        if let Some(region) = &self.region {
            parts.push(format!("Region: {region}"));
        }
        if parts.is_empty() {
            "No filters".to_string()
        } else {
            parts.join(" | ")
        }
    }
}

/// Columns offered as multi-select filters, in panel order.
pub const MULTI_SELECT_COLUMNS: [Column; 3] = [Column::Nationality, Column::Gender, Column::Project];

/// Return indices of records that pass the nationality / gender / project filters.
pub fn filtered_indices(dataset: &SurveyDataset, selection: &FilterSelection) -> Vec<usize> {
    dataset
        .records
        .iter()
        .enumerate()
        .filter(|(_, rec)| selection.matches(rec))
        .map(|(i, _)| i)
        .collect()
}

/// Return indices of records in `region`, or every index when no region is chosen.
/// Independent of the other three filters.
pub fn region_indices(dataset: &SurveyDataset, region: Option<&str>) -> Vec<usize> {
    dataset
        .records
        .iter()
        .enumerate()
        .filter(|(_, rec)| region.map_or(true, |r| rec.region == r))
        .map(|(i, _)| i)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(nationality: &str, gender: &str, project: &str, region: &str) -> SurveyRecord {
        SurveyRecord {
            nationality: nationality.into(),
            gender: gender.into(),
            project: project.into(),
            region: region.into(),
            locality: "l".into(),
            variety: "riz".into(),
            age: None,
        }
    }

    fn dataset() -> SurveyDataset {
        SurveyDataset::from_records(vec![
            rec("senegalaise", "male", "p1", "thies"),
            rec("senegalaise", "female", "p2", "kolda"),
            rec("malienne", "male", "p2", "kolda"),
            rec("etranger", "female", "p1", "thies"),
        ])
    }

    fn set(vals: &[&str]) -> BTreeSet<String> {
        vals.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn describe_lists_active_filters_in_panel_order() {
        assert_eq!(FilterSelection::default().describe(), "No filters");
        let sel = FilterSelection {
            projects: set(&["p2"]),
            genders: set(&["male", "female"]),
            region: Some("north".into()),
            ..Default::default()
        };
        assert_eq!(sel.describe(), "Gender: female, male | Project: p2 | Region: north");
    }

    #[test]
    fn empty_selection_is_identity() {
        let ds = dataset();
        let all = filtered_indices(&ds, &FilterSelection::default());
        assert_eq!(all, vec![0, 1, 2, 3]);
    }

    #[test]
    fn or_within_field_and_across_fields() {
        let ds = dataset();
        let sel = FilterSelection {
            nationalities: set(&["senegalaise", "malienne"]),
            genders: set(&["male"]),
            ..Default::default()
        };
        assert_eq!(filtered_indices(&ds, &sel), vec![0, 2]);

        let sel = FilterSelection {
            projects: set(&["p2"]),
            genders: set(&["female"]),
            ..Default::default()
        };
        assert_eq!(filtered_indices(&ds, &sel), vec![1]);
    }

    #[test]
    fn unmatched_selection_yields_nothing() {
        let ds = dataset();
        let sel = FilterSelection {
            nationalities: set(&["gambienne"]),
            ..Default::default()
        };
        assert!(filtered_indices(&ds, &sel).is_empty());
    }

    #[test]
    fn region_filter_ignores_other_fields() {
        let ds = dataset();
        assert_eq!(region_indices(&ds, Some("kolda")), vec![1, 2]);
        assert_eq!(region_indices(&ds, None).len(), 4);
        assert!(region_indices(&ds, Some("dakar")).is_empty());
    }
}
