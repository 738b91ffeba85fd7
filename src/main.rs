use std::process::ExitCode;

use clap::Parser;
use eframe::egui;

use maskview::app::{self, MaskviewApp};
use maskview::cli::{self, CliArgs};
use maskview::engine::ViewportConfig;
use maskview::{log_err, log_info, logger};

fn main() -> ExitCode {
    let args = CliArgs::parse();

    // -- Headless mode ----------------------------------------------------
    // A stamp list on the command line means batch replay: no window, no
    // logger file, output to the requested sink only.
    if args.is_headless() {
        return cli::run(&args);
    }

    // -- GUI mode ---------------------------------------------------------

    // Initialize session log (overwrites previous session log)
    logger::init();

    let content = match &args.image {
        Some(path) => match image::open(path) {
            Ok(img) => img.to_rgba8(),
            Err(e) => {
                log_err!("Failed to open {}: {}", path.display(), e);
                eprintln!("maskview: failed to open {}: {}", path.display(), e);
                return ExitCode::FAILURE;
            }
        },
        None => app::test_card(1024, 1024),
    };

    // The engine assumes a valid configuration; reject bad input here.
    let mut config = ViewportConfig::new(content.width(), content.height());
    config.min_scale = args.min_scale;
    config.max_scale = args.max_scale;
    if let Err(e) = config.validate() {
        eprintln!("maskview: invalid configuration: {}", e);
        return ExitCode::FAILURE;
    }
    log_info!(
        "Content raster {}×{}, scale limits {}..{}",
        content.width(),
        content.height(),
        config.min_scale,
        config.max_scale
    );

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 720.0])
            .with_title("maskview"),
        ..Default::default()
    };

    let result = eframe::run_native(
        "maskview",
        options,
        Box::new(move |cc| Box::new(MaskviewApp::new(cc, content, config))),
    );
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log_err!("eframe error: {}", e);
            eprintln!("maskview: {}", e);
            ExitCode::FAILURE
        }
    }
}
