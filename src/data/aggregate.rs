use std::collections::BTreeMap;

use serde::Serialize;

use super::model::{Column, SurveyRecord};

/// Default number of equal-width age bins.
pub const DEFAULT_AGE_BINS: usize = 20;

/// Default minimum number of records a locality needs to be charted.
pub const DEFAULT_MIN_LOCALITY_COUNT: usize = 10;

// ---------------------------------------------------------------------------
// Age histogram
// ---------------------------------------------------------------------------

/// Half-open age interval `[start, end)`; the last bin also includes `end`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AgeBin {
    pub start: f64,
    pub end: f64,
}

impl AgeBin {
    pub fn width(&self) -> f64 {
        self.end - self.start
    }
}

/// Per-bin counts for one gender value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenderSeries {
    pub gender: String,
    pub counts: Vec<usize>,
}

impl GenderSeries {
    pub fn total(&self) -> usize {
        self.counts.iter().sum()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AgeHistogram {
    pub bins: Vec<AgeBin>,
    /// `male`, then `female`, then any other gender value alphabetically.
    pub series: Vec<GenderSeries>,
}

impl AgeHistogram {
    pub fn is_empty(&self) -> bool {
        self.bins.is_empty()
    }
}

fn gender_rank(gender: &str) -> u8 {
    match gender {
        "male" => 0,
        "female" => 1,
        _ => 2,
    }
}

/// Bucket ages into `bin_count` equal-width bins over the observed range,
/// one series per gender. Records without an age are skipped.
pub fn age_histogram<'a>(
    records: impl IntoIterator<Item = &'a SurveyRecord>,
    bin_count: usize,
) -> AgeHistogram {
    let bin_count = bin_count.max(1);
    let ages: Vec<(f64, &str)> = records
        .into_iter()
        .filter_map(|r| r.age.map(|a| (a, r.gender.as_str())))
        .collect();
    if ages.is_empty() {
        return AgeHistogram::default();
    }

    let (mut lo, mut hi) = ages
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &(a, _)| {
            (lo.min(a), hi.max(a))
        });
    if hi - lo < f64::EPSILON {
        lo -= 0.5;
        hi += 0.5;
    }
    let width = (hi - lo) / bin_count as f64;

    let bins = (0..bin_count)
        .map(|i| AgeBin {
            start: lo + i as f64 * width,
            end: if i + 1 == bin_count {
                hi
            } else {
                lo + (i + 1) as f64 * width
            },
        })
        .collect();

    let mut per_gender: BTreeMap<&str, Vec<usize>> = BTreeMap::new();
    for (age, gender) in ages {
        let idx = (((age - lo) / width).floor() as usize).min(bin_count - 1);
        per_gender.entry(gender).or_insert_with(|| vec![0; bin_count])[idx] += 1;
    }

    let mut series: Vec<GenderSeries> = per_gender
        .into_iter()
        .map(|(gender, counts)| GenderSeries {
            gender: gender.to_string(),
            counts,
        })
        .collect();
    // Stable sort keeps the alphabetical order inside the "other" rank.
    series.sort_by_key(|s| gender_rank(&s.gender));

    AgeHistogram { bins, series }
}

// ---------------------------------------------------------------------------
// Category counts
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryCount {
    pub label: String,
    pub count: usize,
}

/// Counts per category, highest first; ties ordered by label.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CategoryCounts {
    pub entries: Vec<CategoryCount>,
}

impl CategoryCounts {
    pub fn total(&self) -> usize {
        self.entries.iter().map(|e| e.count).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, label: &str) -> Option<usize> {
        self.entries
            .iter()
            .find(|e| e.label == label)
            .map(|e| e.count)
    }

    /// Drop categories seen fewer than `min_count` times.
    pub fn with_min_support(mut self, min_count: usize) -> Self {
        self.entries.retain(|e| e.count >= min_count);
        self
    }
}

/// Group records by a categorical column and count them.
pub fn count_by<'a>(
    records: impl IntoIterator<Item = &'a SurveyRecord>,
    column: Column,
) -> CategoryCounts {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for rec in records {
        if let Some(v) = rec.text(column) {
            *counts.entry(v).or_default() += 1;
        }
    }

    let mut entries: Vec<CategoryCount> = counts
        .into_iter()
        .map(|(label, count)| CategoryCount {
            label: label.to_string(),
            count,
        })
        .collect();
    entries.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.label.cmp(&b.label)));

    CategoryCounts { entries }
}
