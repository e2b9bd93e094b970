pub mod acquisition;
pub mod config;
pub mod content;
pub mod controller;
pub mod navigation;
pub mod ui;

use crate::config::ViewerConfig;
use crate::ui::ViewerApp;
use color_eyre::{eyre::eyre, Result};
use eframe::egui;
use tokio::runtime::Handle;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[tokio::main]
async fn main() -> Result<()> {
    setup()?;

    let config_path = ViewerConfig::default_path();
    let config = ViewerConfig::load_or_default(&config_path).await;
    info!(
        "Controller polling every {} ms, debounce {} ms",
        config.controller.poll_interval_ms, config.controller.debounce_ms
    );

    let runtime = Handle::current();

    info!("Starting UI");
    let mut native_options = eframe::NativeOptions::default();
    native_options.viewport = egui::ViewportBuilder::default()
        .with_title("padview")
        .with_fullscreen(config.ui.fullscreen);

    eframe::run_native(
        "padview",
        native_options,
        Box::new(move |cc| Ok(Box::new(ViewerApp::new(cc, config, runtime)))),
    )
    .map_err(|e| eyre!("UI terminated with an error: {}", e))?;

    info!("Viewer closed");
    Ok(())
}

fn setup() -> Result<()> {
    if std::env::var("RUST_LIB_BACKTRACE").is_err() {
        std::env::set_var("RUST_LIB_BACKTRACE", "0")
    }
    color_eyre::install()?;
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "info")
    }
    setup_logging_env();
    Ok(())
}

/// `RUST_LOG` directives, falling back to `info` when they do not parse
fn log_filter(directives: Option<&str>) -> EnvFilter {
    directives
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| EnvFilter::new("info"))
}

fn setup_logging_env() {
    let directives = std::env::var("RUST_LOG").ok();
    FmtSubscriber::builder()
        .with_env_filter(log_filter(directives.as_deref()))
        .with_target(false)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .pretty()
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing::level_filters::LevelFilter;

    #[test]
    fn rust_log_enables_debug_output() {
        let filter = log_filter(Some("padview=debug"));
        assert_eq!(filter.max_level_hint(), Some(LevelFilter::DEBUG));
    }

    #[test]
    fn missing_or_broken_directives_log_at_info() {
        assert_eq!(log_filter(None).max_level_hint(), Some(LevelFilter::INFO));
        assert_eq!(
            log_filter(Some("padview=loud")).max_level_hint(),
            Some(LevelFilter::INFO)
        );
    }
}
