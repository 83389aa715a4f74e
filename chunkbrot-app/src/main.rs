mod app;
mod app_dir;
mod config;
mod controller;
mod debounce;
mod error;

use eframe::egui;
use tracing::{error, info};

use app::ChunkBrotApp;
use config::RenderConfig;

fn main() -> eframe::Result {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    info!("Starting ChunkBrot");

    let config = match RenderConfig::load() {
        Ok(config) => config,
        Err(e) => {
            error!("Invalid configuration: {e}");
            std::process::exit(1);
        }
    };

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("ChunkBrot")
            .with_inner_size([config.window_width, config.window_height]),
        ..Default::default()
    };

    eframe::run_native(
        "ChunkBrot",
        options,
        Box::new(move |cc| Ok(Box::new(ChunkBrotApp::new(&cc.egui_ctx, config)))),
    )
}
