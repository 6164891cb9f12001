/// Data layer: loading, cleaning, filtering and chart aggregation.
///
/// Architecture:
/// ```text
///  .xlsx / .csv / .json / .parquet
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse file → RawTable
///   └──────────┘
///        │
///        ▼
///   ┌───────────┐
///   │ normalize │  fold text, map synonyms, explode varieties → SurveyDataset
///   └───────────┘
///        │
///        ▼
///   ┌──────────┐     ┌───────────┐
///   │  filter   │ ──▶ │ aggregate │  histogram + category counts
///   └──────────┘     └───────────┘
///        │                 │
///        └──── dashboard ──┘  (selection) → four chart payloads
/// ```

pub mod aggregate;
pub mod dashboard;
pub mod filter;
pub mod loader;
pub mod model;
pub mod normalize;
