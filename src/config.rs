use std::path::PathBuf;

use crate::data::dashboard::ChartSettings;

pub const DATA_PATH_VAR: &str = "RUSTY_SURVEY_DATA";
pub const AGE_BINS_VAR: &str = "RUSTY_SURVEY_AGE_BINS";
pub const MIN_LOCALITY_VAR: &str = "RUSTY_SURVEY_MIN_LOCALITY";

// ---------------------------------------------------------------------------
// Startup settings
// ---------------------------------------------------------------------------

/// Resolved once in `main`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Settings {
    /// Dataset opened before the window shows. `None` → pick one from the menu.
    pub data_path: Option<PathBuf>,
    pub charts: ChartSettings,
}

impl Settings {
    /// Read the first CLI argument and the `RUSTY_SURVEY_*` environment.
    pub fn from_env() -> Self {
        Self::from_sources(std::env::args().nth(1), |key| std::env::var(key).ok())
    }

    /// The CLI path wins over the environment path.
    pub fn from_sources(arg: Option<String>, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = ChartSettings::default();
        let data_path = arg
            .or_else(|| lookup(DATA_PATH_VAR))
            .filter(|p| !p.trim().is_empty())
            .map(PathBuf::from);

        Settings {
            data_path,
            charts: ChartSettings {
                age_bins: parse_count(&lookup, AGE_BINS_VAR, defaults.age_bins, 1),
                min_locality_count: parse_count(
                    &lookup,
                    MIN_LOCALITY_VAR,
                    defaults.min_locality_count,
                    0,
                ),
            },
        }
    }
}

fn parse_count(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: usize,
    min: usize,
) -> usize {
    let Some(raw) = lookup(key) else {
        return default;
    };
    match raw.trim().parse::<usize>() {
        Ok(v) if v >= min => v,
        _ => {
            log::warn!("Ignoring {key}={raw:?}: expected an integer >= {min}, using {default}");
            default
        }
    }
}
