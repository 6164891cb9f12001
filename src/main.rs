mod app;
mod color;
mod config;
mod data;
mod state;
mod ui;

use app::SurveyApp;
use config::Settings;
use data::loader::load_dataset;
use eframe::egui;
use state::AppState;

fn main() -> eframe::Result {
    env_logger::init();

    let settings = Settings::from_env();
    log::info!("Starting with {settings:?}");

    let mut state = AppState::new(settings.charts);
    if let Some(path) = &settings.data_path {
        // A startup dataset that cannot be loaded is fatal: no partial dashboard.
        match load_dataset(path) {
            Ok(dataset) => {
                log::info!("Loaded {} records from {}", dataset.len(), path.display());
                state.set_dataset_from(path, dataset);
            }
            Err(e) => {
                log::error!("Cannot start dashboard from {}: {e:#}", path.display());
                eprintln!("error: {e:#}");
                std::process::exit(1);
            }
        }
    }

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 860.0])
            .with_min_inner_size([700.0, 500.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Rusty Survey – Interactive Dashboard",
        options,
        Box::new(|_cc| Ok(Box::new(SurveyApp::new(state)))),
    )
}
