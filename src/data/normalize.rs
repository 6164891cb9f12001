use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use regex::Regex;
use unicode_normalization::UnicodeNormalization;

use super::model::{Column, RawTable, SurveyDataset, SurveyRecord};

/// Raised when the source table lacks one of the required columns.
/// Fatal: the dashboard is not shown on a partial table.
#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    #[error("missing required column '{0}'")]
    MissingColumn(Column),
}

// Leftmost-first alternation: the longer " et autres" must win over " et".
static VARIETY_SEPARATORS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r",| et autres| et autre| et").expect("valid separator pattern"));

// ---------------------------------------------------------------------------
// Text folding
// ---------------------------------------------------------------------------

/// Lowercase, NFKD, drop everything outside ASCII, trim.
pub fn fold_text(s: &str) -> String {
    let folded: String = s.to_lowercase().nfkd().filter(char::is_ascii).collect();
    folded.trim().to_string()
}

/// Rewrite the known spellings of a nationality to one key.
pub fn canonical_nationality(folded: String) -> String {
    match folded.as_str() {
        "etrangere" => "etranger".to_string(),
        _ => folded,
    }
}

/// Rewrite the known spellings of a gender to `male` / `female`.
/// Anything unlisted passes through as its own category.
pub fn canonical_gender(folded: String) -> String {
    match folded.as_str() {
        "homme" | "masculin" | "m" => "male".to_string(),
        "femme" | "feminin" => "female".to_string(),
        _ => folded,
    }
}

/// Split a folded variety cell into its trimmed, non-empty tokens.
pub fn split_varieties(folded: &str) -> Vec<String> {
    VARIETY_SEPARATORS
        .split(folded)
        .map(str::trim)
        .filter(|tok| !tok.is_empty())
        .map(str::to_string)
        .collect()
}

// ---------------------------------------------------------------------------
// Schema resolution
// ---------------------------------------------------------------------------

/// Map every required column to its header position.
pub fn resolve_columns(headers: &[String]) -> Result<BTreeMap<Column, usize>, SchemaError> {
    let folded: Vec<String> = headers.iter().map(|h| fold_text(h)).collect();
    Column::ALL
        .iter()
        .map(|&col| {
            folded
                .iter()
                .position(|h| col.aliases().contains(&h.as_str()))
                .map(|idx| (col, idx))
                .ok_or(SchemaError::MissingColumn(col))
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Table cleaning
// ---------------------------------------------------------------------------

/// Clean a raw table into the dataset every chart is computed from.
///
/// Per row: fold the six categorical columns, apply the synonym maps, drop
/// the row if any of them is empty, then explode the variety list into one
/// record per token. Runs once per load.
pub fn normalize(raw: &RawTable) -> Result<SurveyDataset, SchemaError> {
    let index = resolve_columns(&raw.headers)?;
    let text_at = |row: usize, col: Column| -> String {
        raw.cell(row, index[&col])
            .as_text()
            .map(|s| fold_text(&s))
            .unwrap_or_default()
    };

    let mut records = Vec::with_capacity(raw.rows.len());
    let mut dropped = 0usize;

    for row in 0..raw.rows.len() {
        let nationality = canonical_nationality(text_at(row, Column::Nationality));
        let gender = canonical_gender(text_at(row, Column::Gender));
        let project = text_at(row, Column::Project);
        let region = text_at(row, Column::Region);
        let locality = text_at(row, Column::Locality);
        let variety = text_at(row, Column::Variety);

        let fields = [&nationality, &gender, &project, &region, &locality, &variety];
        if fields.iter().any(|f| f.is_empty()) {
            dropped += 1;
            continue;
        }

        let age = raw.cell(row, index[&Column::Age]).as_f64();
        let tokens = split_varieties(&variety);
        if tokens.is_empty() {
            dropped += 1;
            continue;
        }

        for token in tokens {
            records.push(SurveyRecord {
                nationality: nationality.clone(),
                gender: gender.clone(),
                project: project.clone(),
                region: region.clone(),
                locality: locality.clone(),
                variety: token,
                age,
            });
        }
    }

    log::info!(
        "Normalized {} source rows: {dropped} dropped, {} records after variety expansion",
        raw.rows.len(),
        records.len()
    );

    Ok(SurveyDataset::from_records(records))
}
