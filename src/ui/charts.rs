use std::f32::consts::{FRAC_PI_2, TAU};

use eframe::egui::{self, Align2, Color32, FontId, Pos2, Sense, Shape, Stroke, Ui, vec2};
use egui_plot::{Bar, BarChart, GridMark, Legend, Plot};

use crate::color::{self, CategoryColors};
use crate::data::aggregate::{AgeHistogram, CategoryCounts};
use crate::state::AppState;

const CHART_HEIGHT: f32 = 320.0;

// ---------------------------------------------------------------------------
// Central panel: the four linked charts
// ---------------------------------------------------------------------------

/// Render all four charts from the current payload.
pub fn dashboard(ui: &mut Ui, state: &AppState) {
    if state.dataset.is_none() {
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.heading("Open a survey file to build the dashboard  (File → Open…)");
        });
        return;
    }

    let payload = &state.payload;
    egui::ScrollArea::vertical().show(ui, |ui: &mut Ui| {
        ui.columns(2, |cols| {
            chart_frame(&mut cols[0], "Age distribution", |ui| age_histogram(ui, &payload.age));
            chart_frame(&mut cols[1], "Distribution by region", |ui| {
                region_pie(ui, &payload.region, &state.region_colors)
            });
        });
        ui.add_space(12.0);
        ui.columns(2, |cols| {
            let title = match &state.selection.region {
                Some(region) => format!("Distribution by locality ({region})"),
                None => "Distribution by locality".to_string(),
            };
            chart_frame(&mut cols[0], &title, |ui| {
                category_bars(ui, "locality_bars", "Locality", &payload.locality)
            });
            chart_frame(&mut cols[1], "Distribution by variety", |ui| {
                category_bars(ui, "variety_bars", "Variety", &payload.variety)
            });
        });
    });
}

fn chart_frame(ui: &mut Ui, title: &str, body: impl FnOnce(&mut Ui)) {
    ui.vertical_centered(|ui: &mut Ui| {
        ui.strong(title);
    });
    body(ui);
}

fn no_data(ui: &mut Ui) {
    ui.allocate_ui(vec2(ui.available_width(), CHART_HEIGHT), |ui: &mut Ui| {
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.weak("No data for this selection");
        });
    });
}

// ---------------------------------------------------------------------------
// Age histogram: one bar group per bin, one bar per gender
// ---------------------------------------------------------------------------

fn age_histogram(ui: &mut Ui, hist: &AgeHistogram) {
    if hist.is_empty() {
        no_data(ui);
        return;
    }

    let n_series = hist.series.len().max(1) as f64;
    let charts: Vec<BarChart> = hist
        .series
        .iter()
        .enumerate()
        .map(|(k, series)| {
            let bars = hist
                .bins
                .iter()
                .zip(&series.counts)
                .map(|(bin, &count)| {
                    let slot = bin.width() / n_series;
                    let x = bin.start + slot * (k as f64 + 0.5);
                    Bar::new(x, count as f64)
                        .width(slot * 0.9)
                        .name(format!("{:.0}–{:.0}", bin.start, bin.end))
                })
                .collect();
            let gender = series.gender.clone();
            BarChart::new(bars)
                .name(&series.gender)
                .color(color::gender_color(&series.gender))
                .element_formatter(Box::new(move |bar: &Bar, _chart: &BarChart| {
                    format!("{gender}, age {}: {}", bar.name, bar.value)
                }))
        })
        .collect();

    Plot::new("age_histogram")
        .legend(Legend::default())
        .height(CHART_HEIGHT)
        .x_axis_label("Age (years)")
        .y_axis_label("Number of individuals")
        .allow_scroll(false)
        .show(ui, |plot_ui| {
            for chart in charts {
                plot_ui.bar_chart(chart);
            }
        });
}

// ---------------------------------------------------------------------------
// Category bar charts (locality, variety)
// ---------------------------------------------------------------------------

fn category_bars(ui: &mut Ui, id: &str, axis_label: &str, counts: &CategoryCounts) {
    if counts.is_empty() {
        no_data(ui);
        return;
    }

    let labels: Vec<String> = counts.entries.iter().map(|e| e.label.clone()).collect();
    let bars = counts
        .entries
        .iter()
        .enumerate()
        .map(|(i, e)| Bar::new(i as f64, e.count as f64).width(0.7).name(&e.label))
        .collect();
    let chart = BarChart::new(bars)
        .color(color::BAR)
        .element_formatter(Box::new(|bar: &Bar, _chart: &BarChart| {
            format!("{}: {}", bar.name, bar.value)
        }));

    Plot::new(id)
        .height(CHART_HEIGHT)
        .x_axis_label(axis_label)
        .y_axis_label("Count")
        .allow_scroll(false)
        .x_axis_formatter(move |mark: GridMark, _range| {
            let idx = mark.value.round();
            if (mark.value - idx).abs() > 1e-6 || idx < 0.0 {
                return String::new();
            }
            labels.get(idx as usize).cloned().unwrap_or_default()
        })
        .show(ui, |plot_ui| plot_ui.bar_chart(chart));
}

// ---------------------------------------------------------------------------
// Region pie chart, painted directly
// ---------------------------------------------------------------------------

fn region_pie(ui: &mut Ui, counts: &CategoryCounts, colors: &CategoryColors) {
    let total = counts.total();
    if total == 0 {
        no_data(ui);
        return;
    }

    let (response, painter) =
        ui.allocate_painter(vec2(ui.available_width(), CHART_HEIGHT), Sense::hover());
    let rect = response.rect;
    let radius = (rect.width() * 0.5).min(rect.height()) * 0.45;
    let center = Pos2::new(rect.left() + rect.width() * 0.25, rect.center().y);
    let text_color = ui.visuals().text_color();

    // Slices start at 12 o'clock and run clockwise.
    let mut start = -FRAC_PI_2;
    let mut slices: Vec<(f32, f32, usize)> = Vec::with_capacity(counts.entries.len());
    for (i, entry) in counts.entries.iter().enumerate() {
        let sweep = TAU * entry.count as f32 / total as f32;
        let fill = colors.color_for(&entry.label);
        // Convex pieces only: split at quarter turns.
        let pieces = (sweep / FRAC_PI_2).ceil().max(1.0) as usize;
        for p in 0..pieces {
            let a0 = start + sweep * p as f32 / pieces as f32;
            let a1 = start + sweep * (p + 1) as f32 / pieces as f32;
            painter.add(Shape::convex_polygon(
                wedge(center, radius, a0, a1),
                fill,
                Stroke::new(0.5, fill),
            ));
        }
        let edge = center + radius * vec2(start.cos(), start.sin());
        painter.line_segment([center, edge], Stroke::new(1.0, Color32::BLACK));
        slices.push((start, start + sweep, i));
        start += sweep;
    }

    // Legend to the right of the pie.
    let row_height = 18.0;
    let legend_left = rect.left() + rect.width() * 0.55;
    let legend_top = (rect.center().y - row_height * counts.entries.len() as f32 / 2.0)
        .max(rect.top() + row_height / 2.0);
    for (i, entry) in counts.entries.iter().enumerate() {
        let y = legend_top + row_height * i as f32;
        if y > rect.bottom() {
            break;
        }
        let swatch = egui::Rect::from_center_size(Pos2::new(legend_left, y), vec2(10.0, 10.0));
        painter.rect_filled(swatch, 2.0, colors.color_for(&entry.label));
        painter.text(
            Pos2::new(legend_left + 10.0, y),
            Align2::LEFT_CENTER,
            slice_label(&entry.label, entry.count, total),
            FontId::proportional(13.0),
            text_color,
        );
    }

    if let Some(pos) = response.hover_pos() {
        let d = pos - center;
        if d.length() <= radius {
            let mut angle = d.y.atan2(d.x);
            if angle < -FRAC_PI_2 {
                angle += TAU;
            }
            if let Some(&(_, _, i)) = slices.iter().find(|(a0, a1, _)| angle >= *a0 && angle < *a1) {
                let entry = &counts.entries[i];
                response.on_hover_text(slice_label(&entry.label, entry.count, total));
            }
        }
    }
}

fn wedge(center: Pos2, radius: f32, a0: f32, a1: f32) -> Vec<Pos2> {
    let steps = (((a1 - a0) / 0.05).ceil() as usize).max(1);
    let mut points = Vec::with_capacity(steps + 2);
    points.push(center);
    for s in 0..=steps {
        let a = a0 + (a1 - a0) * s as f32 / steps as f32;
        points.push(center + radius * vec2(a.cos(), a.sin()));
    }
    points
}

fn slice_label(label: &str, count: usize, total: usize) -> String {
    format!("{label}: {count} ({:.1}%)", 100.0 * count as f64 / total as f64)
}
