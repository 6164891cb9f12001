use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

// ---------------------------------------------------------------------------
// CellValue – a single raw cell as read from the source file
// ---------------------------------------------------------------------------

/// A dynamically-typed cell value, before any cleaning.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    String(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
    Null,
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::String(s) => write!(f, "{s}"),
            CellValue::Integer(i) => write!(f, "{i}"),
            CellValue::Float(v) => write!(f, "{v}"),
            CellValue::Bool(b) => write!(f, "{b}"),
            CellValue::Null => write!(f, "<null>"),
        }
    }
}

impl CellValue {
    /// Text view of the cell for categorical columns. `Null` has none.
    pub fn as_text(&self) -> Option<String> {
        match self {
            CellValue::Null => None,
            other => Some(other.to_string()),
        }
    }

    /// Numeric view of the cell. Strings are parsed; NaN and infinities count as missing.
    pub fn as_f64(&self) -> Option<f64> {
        let v = match self {
            CellValue::Float(v) => *v,
            CellValue::Integer(i) => *i as f64,
            CellValue::String(s) => s.trim().parse::<f64>().ok()?,
            _ => return None,
        };
        v.is_finite().then_some(v)
    }
}

// ---------------------------------------------------------------------------
// RawTable – what every loader produces
// ---------------------------------------------------------------------------

/// Header row plus data rows, untouched apart from cell typing.
#[derive(Debug, Clone, Default)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<CellValue>>,
}

static NULL_CELL: CellValue = CellValue::Null;

impl RawTable {
    pub fn new(headers: Vec<String>) -> Self {
        Self {
            headers,
            rows: Vec::new(),
        }
    }

    /// Cell at (`row`, `col`), `Null` when the row is short.
    pub fn cell(&self, row: usize, col: usize) -> &CellValue {
        self.rows
            .get(row)
            .and_then(|r| r.get(col))
            .unwrap_or(&NULL_CELL)
    }
}

// ---------------------------------------------------------------------------
// Column – the seven required survey columns
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Column {
    Nationality,
    Gender,
    Project,
    Region,
    Locality,
    Variety,
    Age,
}

impl Column {
    pub const ALL: [Column; 7] = [
        Column::Nationality,
        Column::Gender,
        Column::Project,
        Column::Region,
        Column::Locality,
        Column::Variety,
        Column::Age,
    ];

    /// The six text columns that must be non-empty on every kept row.
    pub const CATEGORICAL: [Column; 6] = [
        Column::Nationality,
        Column::Gender,
        Column::Project,
        Column::Region,
        Column::Locality,
        Column::Variety,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Column::Nationality => "Nationality",
            Column::Gender => "Gender",
            Column::Project => "Project",
            Column::Region => "Region",
            Column::Locality => "Locality",
            Column::Variety => "Variety",
            Column::Age => "Age",
        }
    }

    /// Accepted header spellings, already folded (lowercase, no accents).
    /// The French names are the ones used by the field survey workbooks.
    pub fn aliases(self) -> &'static [&'static str] {
        match self {
            Column::Nationality => &["nationality", "nationalite"],
            Column::Gender => &["gender", "sexe"],
            Column::Project => &["project", "projet"],
            Column::Region => &["region"],
            Column::Locality => &["locality", "localite"],
            Column::Variety => &["variety", "variete"],
            Column::Age => &["age"],
        }
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ---------------------------------------------------------------------------
// SurveyRecord – one cleaned observation
// ---------------------------------------------------------------------------

/// A single cleaned row. After variety expansion `variety` holds one token.
#[derive(Debug, Clone, PartialEq)]
pub struct SurveyRecord {
    pub nationality: String,
    pub gender: String,
    pub project: String,
    pub region: String,
    pub locality: String,
    pub variety: String,
    pub age: Option<f64>,
}

impl SurveyRecord {
    /// Value of a categorical column. `Age` has no text value.
    pub fn text(&self, column: Column) -> Option<&str> {
        match column {
            Column::Nationality => Some(&self.nationality),
            Column::Gender => Some(&self.gender),
            Column::Project => Some(&self.project),
            Column::Region => Some(&self.region),
            Column::Locality => Some(&self.locality),
            Column::Variety => Some(&self.variety),
            Column::Age => None,
        }
    }
}

// ---------------------------------------------------------------------------
// SurveyDataset – the cleaned, immutable table
// ---------------------------------------------------------------------------

/// The cleaned dataset with pre-computed dropdown options.
/// Never mutated after construction; share it behind an `Arc`.
#[derive(Debug, Clone, Default)]
pub struct SurveyDataset {
    pub records: Vec<SurveyRecord>,
    /// For each categorical column the sorted set of distinct non-empty values.
    options: BTreeMap<Column, BTreeSet<String>>,
}

impl SurveyDataset {
    /// Build the option index from cleaned records.
    pub fn from_records(records: Vec<SurveyRecord>) -> Self {
        let mut options: BTreeMap<Column, BTreeSet<String>> = BTreeMap::new();
        for rec in &records {
            for col in Column::CATEGORICAL {
                if let Some(v) = rec.text(col).filter(|v| !v.is_empty()) {
                    options.entry(col).or_default().insert(v.to_string());
                }
            }
        }
        SurveyDataset { records, options }
    }

    /// Distinct values offered by the filter control of `column`.
    pub fn options(&self, column: Column) -> Vec<String> {
        self.options
            .get(&column)
            .map(|vals| vals.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Number of (expanded) records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
