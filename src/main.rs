//! Mutuelle Desk - desktop client for mutuelle agents.

use std::path::PathBuf;

use clap::Parser;
use eframe::egui;
use mutuelle_desk as app;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use app::config::{AppConfig, ConfigLoadResult};
use app::ui::App;

/// Desktop client for care vouchers, member lookup and messaging.
#[derive(Parser)]
#[command(name = "mutuelle-desk")]
struct Cli {
    /// Use config.toml from current directory (dev mode)
    #[arg(long)]
    dev: bool,

    /// Path to a config file
    #[arg(long, value_name = "PATH", conflicts_with = "dev")]
    config: Option<PathBuf>,

    /// Override the server base URL
    #[arg(long, value_name = "URL")]
    server: Option<String>,
}

fn main() -> eframe::Result<()> {
    let cli = Cli::parse();

    // Keep the guard alive so buffered log lines are flushed on exit.
    let _log_guard = init_logging();

    tracing::info!("Mutuelle Desk starting...");

    let config_path = if cli.dev {
        tracing::info!("Dev mode: loading config from current directory");
        PathBuf::from("config.toml")
    } else {
        cli.config.clone().unwrap_or_else(AppConfig::default_path)
    };
    tracing::info!("Config path: {:?}", config_path);

    let (mut config, startup_error) = match AppConfig::try_load(&config_path) {
        ConfigLoadResult::Loaded(config) => {
            tracing::info!("Config loaded successfully");
            (config, None)
        }
        ConfigLoadResult::Missing => {
            tracing::info!("Config missing, writing defaults");
            let config = AppConfig::default();
            if let Err(e) = config.save(&config_path) {
                tracing::warn!("Could not write default config: {}", e);
            }
            (config, None)
        }
        ConfigLoadResult::Invalid(e) => {
            tracing::warn!("Config invalid: {}", e);
            (AppConfig::default(), Some(e.to_string()))
        }
    };

    if let Some(server) = cli.server {
        tracing::info!("Server override: {}", server);
        config.server.base_url = server;
    }

    run_main_app(config, startup_error)
}

/// Console output plus a daily rolling file in the data directory.
fn init_logging() -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let filter = EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into());
    let console = tracing_subscriber::fmt::layer();

    let log_dir = directories::ProjectDirs::from("org", "mutuelle", "mutuelle-desk")
        .map(|dirs| dirs.data_dir().join("logs"));

    match log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "mutuelle-desk.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            tracing_subscriber::registry()
                .with(filter)
                .with(console)
                .with(tracing_subscriber::fmt::layer().with_ansi(false).with_writer(writer))
                .init();
            Some(guard)
        }
        None => {
            tracing_subscriber::registry().with(filter).with(console).init();
            None
        }
    }
}

/// Run the main application.
fn run_main_app(config: AppConfig, startup_error: Option<String>) -> eframe::Result<()> {
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("Mutuelle Desk")
            .with_inner_size([1200.0, 800.0])
            .with_min_inner_size([900.0, 600.0]),
        ..Default::default()
    };

    // Create tokio runtime for async operations
    let rt = tokio::runtime::Runtime::new().expect("Failed to create tokio runtime");

    eframe::run_native(
        "Mutuelle Desk",
        options,
        Box::new(|cc| {
            egui_extras::install_image_loaders(&cc.egui_ctx);

            let mut fonts = egui::FontDefinitions::default();
            egui_phosphor::add_to_fonts(&mut fonts, egui_phosphor::Variant::Regular);
            cc.egui_ctx.set_fonts(fonts);

            Ok(Box::new(App::new(config, rt, cc.egui_ctx.clone(), startup_error)?))
        }),
    )
}
