use std::path::PathBuf;

use clap::Parser;
use log::{error, info};

mod color;
mod error;
mod fractal;
mod gpu;
mod gui;
mod io;

use gui::input::MIN_SURFACE_SIZE;
use gui::{JuliaApp, ViewerConfig};

/// Visualiseur interactif d'ensembles de Julia calculés sur GPU.
///
/// Exemple d'utilisation :
///   julia-viewer --width 1280 --height 800
#[derive(Parser, Debug)]
#[command(
    name = "julia-viewer",
    about = "Visualiseur temps réel d'ensembles de Julia (calcul wgpu)",
    version
)]
struct Cli {
    /// Largeur initiale de la fenêtre en points (minimum 500)
    #[arg(long, default_value_t = 800)]
    width: u32,

    /// Hauteur initiale de la fenêtre en points (minimum 500)
    #[arg(long, default_value_t = 800)]
    height: u32,

    /// Répertoire des captures (touche S)
    #[arg(long, value_name = "DOSSIER", default_value = ".")]
    screenshot_dir: PathBuf,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    // Message plus explicite que le panic brut quand le GPU ou l'affichage manque
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        let msg = panic_info
            .payload()
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| panic_info.payload().downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "Panic inconnu".to_string());

        error!("erreur fatale: {}", msg);
        if let Some(location) = panic_info.location() {
            error!("   fichier: {}:{}:{}", location.file(), location.line(), location.column());
        }
        if msg.contains("wgpu") || msg.contains("adapter") || msg.contains("surface") {
            error!("   un GPU compatible compute (Vulkan, Metal, DX12) est requis.");
            error!("   essayer de forcer un backend: WGPU_BACKEND=vulkan julia-viewer");
        }

        default_hook(panic_info);
    }));

    let width = cli.width.max(MIN_SURFACE_SIZE.0) as f32;
    let height = cli.height.max(MIN_SURFACE_SIZE.1) as f32;
    info!("fenêtre initiale {}x{}", width, height);

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("Julia - visualiseur temps réel")
            .with_inner_size([width, height])
            .with_min_inner_size([MIN_SURFACE_SIZE.0 as f32, MIN_SURFACE_SIZE.1 as f32]),
        hardware_acceleration: eframe::HardwareAcceleration::Required,
        // Le calcul partage le périphérique wgpu d'egui
        renderer: eframe::Renderer::Wgpu,
        ..Default::default()
    };

    let config = ViewerConfig {
        screenshot_dir: cli.screenshot_dir,
    };

    if let Err(e) = eframe::run_native(
        "julia-viewer",
        options,
        Box::new(move |cc: &eframe::CreationContext<'_>| -> Box<dyn eframe::App> {
            match JuliaApp::new(cc, config) {
                Ok(app) => Box::new(app),
                Err(e) => {
                    error!("initialisation GPU impossible: {e}");
                    std::process::exit(1);
                }
            }
        }),
    ) {
        error!("erreur lors du lancement de l'application: {}", e);
        std::process::exit(1);
    }
}
