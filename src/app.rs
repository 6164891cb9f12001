use eframe::egui::{self, Key, KeyboardShortcut, Modifiers, RichText};

use crate::state::AppState;
use crate::ui::{charts, panels};

const OPEN_SHORTCUT: KeyboardShortcut = KeyboardShortcut::new(Modifiers::COMMAND, Key::O);

// ---------------------------------------------------------------------------
// eframe App implementation
// ---------------------------------------------------------------------------

pub struct SurveyApp {
    pub state: AppState,
    /// Last title sent to the viewport, to avoid resending it every frame.
    shown_title: String,
}

impl SurveyApp {
    pub fn new(state: AppState) -> Self {
        Self {
            state,
            shown_title: String::new(),
        }
    }

    fn sync_title(&mut self, ctx: &egui::Context) {
        let title = self.state.window_title();
        if title != self.shown_title {
            ctx.send_viewport_cmd(egui::ViewportCommand::Title(title.clone()));
            self.shown_title = title;
        }
    }

    fn show_status_bar(&self, ctx: &egui::Context) {
        egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                if self.state.dataset.is_some() {
                    ui.label(RichText::new(self.state.selection.describe()).small());
                } else {
                    ui.label(RichText::new("Open a survey file (Ctrl+O) to begin.").small().weak());
                }
            });
        });
    }
}

impl eframe::App for SurveyApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        if ctx.input_mut(|i| i.consume_shortcut(&OPEN_SHORTCUT)) {
            panels::open_file_dialog(&mut self.state);
        }

        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            panels::top_bar(ui, &mut self.state);
        });
        self.show_status_bar(ctx);

        // Filters on the left; the charts take the rest of the window.
        egui::SidePanel::left("filter_panel")
            .default_width(260.0)
            .width_range(200.0..=420.0)
            .show(ctx, |ui| {
                panels::side_panel(ui, &mut self.state);
            });
        egui::CentralPanel::default().show(ctx, |ui| {
            charts::dashboard(ui, &self.state);
        });

        self.sync_title(ctx);
    }
}
