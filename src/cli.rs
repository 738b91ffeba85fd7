//! maskview CLI — headless mask replay via command-line arguments.
//!
//! Usage examples:
//!   maskview                                              (GUI, test card)
//!   maskview --image photo.png                            (GUI)
//!   maskview --image photo.png --stamps brush.json --output mask.png
//!   maskview --image photo.png --stamps brush.json --base64 > mask.txt
//!
//! When a --stamps file is present no window is opened: the recorded stamp
//! list is replayed onto a fresh mask raster at the image's resolution and
//! the raw coverage is written out, exactly as the GUI export would produce.

use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use serde::Deserialize;

use crate::mask::MaskLayer;

/// Brush diameter for stamps that don't carry their own.
const DEFAULT_BRUSH: f32 = 25.0;

/// maskview — pan/zoom viewport with mask painting.
#[derive(Parser, Debug)]
#[command(
    name = "maskview",
    about = "Pan/zoom image viewport with region-of-interest mask painting",
    long_about = "Open an image in the interactive viewport, or replay a recorded\n\
                  stamp list headlessly and export the resulting coverage mask.\n\n\
                  Example:\n  \
                  maskview --image photo.png\n  \
                  maskview --image photo.png --stamps brush.json --output mask.png"
)]
pub struct CliArgs {
    /// Input image. Shown in the GUI; in headless mode it only sizes the
    /// mask raster.
    #[arg(short, long, value_name = "FILE")]
    pub image: Option<PathBuf>,

    /// JSON stamp list to replay headlessly:
    /// [{"x":512,"y":512,"d":50}, ...]. "d" falls back to --brush.
    #[arg(short, long, value_name = "STAMPS.json")]
    pub stamps: Option<PathBuf>,

    /// Output PNG path for the raw coverage (headless mode).
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Print the base64 PNG export to stdout instead of writing a file.
    #[arg(long, default_value_t = false)]
    pub base64: bool,

    /// Brush diameter for stamps without an explicit "d".
    #[arg(long, default_value_t = DEFAULT_BRUSH, value_name = "PIXELS")]
    pub brush: f32,

    /// Minimum zoom scale (GUI).
    #[arg(long, default_value_t = 0.25)]
    pub min_scale: f32,

    /// Maximum zoom scale (GUI).
    #[arg(long, default_value_t = 4.0)]
    pub max_scale: f32,
}

impl CliArgs {
    /// Headless mode runs whenever a stamp list is supplied.
    pub fn is_headless(&self) -> bool {
        self.stamps.is_some()
    }
}

/// One recorded brush stamp, in content coordinates.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct Stamp {
    pub x: f32,
    pub y: f32,
    /// Stamp-specific diameter; the CLI default applies when omitted.
    #[serde(default)]
    pub d: Option<f32>,
}

/// Replay a stamp list onto a fresh mask raster.
pub fn replay_stamps(width: u32, height: u32, stamps: &[Stamp], default_brush: f32) -> MaskLayer {
    let mut mask = MaskLayer::new(width, height);
    for stamp in stamps {
        mask.stamp(stamp.x, stamp.y, stamp.d.unwrap_or(default_brush));
    }
    mask
}

/// Run headless stamp replay.  All processing is synchronous on the current
/// thread; no GUI is opened.
pub fn run(args: &CliArgs) -> ExitCode {
    match run_inner(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("maskview: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run_inner(args: &CliArgs) -> Result<(), String> {
    let Some(stamps_path) = &args.stamps else {
        return Err("headless mode requires --stamps".into());
    };
    let Some(image_path) = &args.image else {
        return Err("headless mode requires --image to size the mask raster".into());
    };
    if args.output.is_none() && !args.base64 {
        return Err("headless mode needs --output or --base64".into());
    }

    let (width, height) = image::image_dimensions(image_path)
        .map_err(|e| format!("cannot read {}: {}", image_path.display(), e))?;

    let raw = fs::read_to_string(stamps_path)
        .map_err(|e| format!("cannot read {}: {}", stamps_path.display(), e))?;
    let stamps: Vec<Stamp> = serde_json::from_str(&raw)
        .map_err(|e| format!("invalid stamp list {}: {}", stamps_path.display(), e))?;

    let mask = replay_stamps(width, height, &stamps, args.brush);
    if !mask.has_mask() {
        return Err("no stamp touched the raster; nothing to export".into());
    }

    if args.base64 {
        match mask.export_base64() {
            Some(encoded) => println!("{}", encoded),
            None => return Err("mask export failed".into()),
        }
    }
    if let Some(output) = &args.output {
        let bytes = mask.export_png()?;
        fs::write(output, bytes)
            .map_err(|e| format!("cannot write {}: {}", output.display(), e))?;
        eprintln!(
            "Wrote {}×{} coverage mask ({} stamps) to {}",
            width,
            height,
            stamps.len(),
            output.display()
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replay_accumulates_all_stamps() {
        let stamps = [
            Stamp { x: 10.0, y: 10.0, d: Some(8.0) },
            Stamp { x: 50.0, y: 50.0, d: None },
        ];
        let mask = replay_stamps(100, 100, &stamps, 20.0);
        assert!(mask.has_mask());
        assert_eq!(mask.coverage().get_pixel(10, 10).0[0], 255);
        // The default brush applied to the second stamp: radius 10.
        assert_eq!(mask.coverage().get_pixel(59, 50).0[0], 255);
        assert_eq!(mask.coverage().get_pixel(70, 50).0[0], 0);
    }

    #[test]
    fn stamp_list_parses_with_optional_diameter() {
        let stamps: Vec<Stamp> =
            serde_json::from_str(r#"[{"x":1.5,"y":2.0},{"x":3.0,"y":4.0,"d":12.0}]"#)
                .expect("valid stamp JSON");
        assert_eq!(stamps.len(), 2);
        assert_eq!(stamps[0].d, None);
        assert_eq!(stamps[1].d, Some(12.0));
    }

    #[test]
    fn off_raster_replay_exports_nothing() {
        let stamps = [Stamp { x: -500.0, y: -500.0, d: Some(10.0) }];
        let mask = replay_stamps(64, 64, &stamps, 10.0);
        assert!(!mask.has_mask());
        assert_eq!(mask.export_base64(), None);
    }
}
