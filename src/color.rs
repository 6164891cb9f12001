use std::collections::BTreeMap;

use eframe::egui::Color32;
use palette::{Hsl, IntoColor, Srgb};

// ---------------------------------------------------------------------------
// Color palette generator
// ---------------------------------------------------------------------------

/// Generates `n` visually distinct colours using evenly spaced hues.
pub fn generate_palette(n: usize) -> Vec<Color32> {
    (0..n)
        .map(|i| {
            let hue = (i as f32 / n as f32) * 360.0;
            let hsl = Hsl::new(hue, 0.65, 0.55);
            let rgb: Srgb = hsl.into_color();
            Color32::from_rgb(
                (rgb.red * 255.0) as u8,
                (rgb.green * 255.0) as u8,
                (rgb.blue * 255.0) as u8,
            )
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Fixed colours
// ---------------------------------------------------------------------------

pub const MALE: Color32 = Color32::from_rgb(66, 110, 230);
pub const FEMALE: Color32 = Color32::from_rgb(220, 60, 60);
pub const BAR: Color32 = Color32::from_rgb(90, 170, 200);

/// Histogram colour for a gender series; unlisted genders stay grey.
pub fn gender_color(gender: &str) -> Color32 {
    match gender {
        "male" => MALE,
        "female" => FEMALE,
        _ => Color32::GRAY,
    }
}

// ---------------------------------------------------------------------------
// Category colours (pie slices)
// ---------------------------------------------------------------------------

/// Stable label → colour assignment over every value a column can take, so
/// a region keeps its colour while filters change.
#[derive(Debug, Clone, Default)]
pub struct CategoryColors {
    mapping: BTreeMap<String, Color32>,
}

impl CategoryColors {
    pub fn new(labels: &[String]) -> Self {
        let mapping = labels
            .iter()
            .cloned()
            .zip(generate_palette(labels.len()))
            .collect();
        CategoryColors { mapping }
    }

    pub fn color_for(&self, label: &str) -> Color32 {
        self.mapping.get(label).copied().unwrap_or(Color32::GRAY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn palette_has_requested_size() {
        assert!(generate_palette(0).is_empty());
        let p = generate_palette(5);
        assert_eq!(p.len(), 5);
        assert_ne!(p[0], p[1]);
    }

    #[test]
    fn unknown_category_is_grey() {
        let colors = CategoryColors::new(&["kolda".to_string(), "thies".to_string()]);
        assert_ne!(colors.color_for("kolda"), colors.color_for("thies"));
        assert_eq!(colors.color_for("dakar"), Color32::GRAY);
        assert_eq!(gender_color("autre"), Color32::GRAY);
    }
}
