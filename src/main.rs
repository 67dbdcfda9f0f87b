//! Modbus AI Panel - Main Entry Point
//!
//! Operator panel for reading an analog input module over Modbus RTU.

use anyhow::Context;
use modbus_ai_panel::{
    backend::{BackendCommand, PanelBackend},
    config::AppConfig,
    frontend::PanelApp,
};
use std::sync::atomic::Ordering;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,modbus_ai_panel=debug")),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Modbus AI Panel");

    let config = AppConfig::load_or_default();
    let dark_mode = config.ui.dark_mode;

    // Spawn the acquisition backend
    let (backend, frontend) = PanelBackend::new(config.clone());
    let stop_handle = backend.stop_handle();
    let shutdown_tx = frontend.command_sender.clone();
    let backend_handle = std::thread::Builder::new()
        .name("acquisition".to_string())
        .spawn(move || backend.run())
        .context("Failed to spawn acquisition thread")?;

    // Configure eframe options
    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([960.0, 600.0])
            .with_min_inner_size([640.0, 400.0])
            .with_title("Modbus AI Panel"),
        ..Default::default()
    };

    // Run the eframe application
    let result = eframe::run_native(
        "Modbus AI Panel",
        native_options,
        Box::new(move |cc| {
            if dark_mode {
                cc.egui_ctx.set_visuals(egui::Visuals::dark());
            } else {
                cc.egui_ctx.set_visuals(egui::Visuals::light());
            }

            Ok(Box::new(PanelApp::new(cc, frontend, config)))
        }),
    );

    // Signal backend to stop and wait for it
    tracing::info!("Shutting down...");
    let _ = shutdown_tx.send(BackendCommand::Shutdown);
    stop_handle.store(false, Ordering::SeqCst);
    if backend_handle.join().is_err() {
        tracing::error!("Acquisition thread panicked");
    }

    result.map_err(|e| anyhow::anyhow!("UI error: {}", e))
}
