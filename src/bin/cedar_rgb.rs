// Copyright (c) 2025 Steven Rosenthal smr@dt3.org
// See LICENSE file in root directory for license terms.

use std::path::PathBuf;
use std::process;
use std::time::Instant;

use clap::Parser;
use image::ImageReader;
use log::{error, info};

use cedar_rgb::composite::{Band, CompositeOptions, RgbPlanes};
use cedar_rgb::error::{Result, RgbError};
use cedar_rgb::mapping::{AsinhMapping, Intensity, MappingParameters};
use cedar_rgb::output::{write_composite, OutputFormat};
use cedar_rgb::plane::{count_non_finite, plane_from_image, Plane};
use cedar_rgb::saturation::{mask_saturated, replace_saturated_pixels};
use cedar_rgb::synthetic::demo_star_field;

/// Makes an RGB picture from three single-band images of the same field.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about=None)]
struct Args {
    /// Image that becomes the red channel (e.g. i band).
    #[arg(long, required_unless_present = "synthetic")]
    red: Option<String>,

    /// Image that becomes the green channel (e.g. r band).
    #[arg(long, required_unless_present = "synthetic")]
    green: Option<String>,

    /// Image that becomes the blue channel (e.g. g band).
    #[arg(long, required_unless_present = "synthetic")]
    blue: Option<String>,

    /// Use a built-in synthetic star field instead of input images.
    #[arg(long, default_value_t = false,
          conflicts_with_all = ["red", "green", "blue"])]
    synthetic: std::primitive::bool,

    /// Output file; the extension (png, tiff) selects the format.
    #[arg(short, long)]
    output: String,

    /// Black point, subtracted from every band.
    #[arg(long, default_value_t = 0.0)]
    minimum: f32,

    /// Intensity range mapped to full scale by a linear stretch.
    #[arg(long, default_value_t = 5.0)]
    range: f32,

    /// Asinh softening parameter. 0 gives a linear stretch.
    #[arg(short, long, default_value_t = 20.0)]
    q: f32,

    /// Combine bands by root mean square instead of mean.
    #[arg(long, default_value_t = false)]
    rms: std::primitive::bool,

    /// Values at or above this level are treated as saturated.
    #[arg(short, long)]
    saturation: Option<f32>,

    /// Border around saturated regions used to estimate their colour.
    #[arg(long, default_value_t = 1)]
    border_width: u32,

    /// Brightness of repaired saturated pixels.
    #[arg(long, default_value_t = 2000.0)]
    saturated_value: f32,

    /// Put the first image row at the bottom of the output.
    #[arg(long, default_value_t = false)]
    flip: std::primitive::bool,
}

fn main() {
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    if let Err(e) = run(&args) {
        error!("{}", e);
        process::exit(1);
    }
}

fn read_plane(path: &str) -> Result<Plane> {
    info!("Reading {}", path);
    let image = ImageReader::open(path)?.decode()?;
    Ok(plane_from_image(&image))
}

fn run(args: &Args) -> Result<()> {
    let output_path = PathBuf::from(&args.output);
    // Fail before doing any work if we can't write the result.
    OutputFormat::from_path(&output_path)?;

    let mut planes = if args.synthetic {
        demo_star_field()
    } else {
        match (&args.red, &args.green, &args.blue) {
            (Some(r), Some(g), Some(b)) =>
                RgbPlanes::new(read_plane(r)?, read_plane(g)?, read_plane(b)?)?,
            _ => return Err(RgbError::InvalidParameter(
                "--red, --green and --blue are all required".to_string())),
        }
    };
    let (width, height) = planes.dimensions();
    info!("WxH: {}x{}", width, height);

    let start = Instant::now();
    if let Some(threshold) = args.saturation {
        for band in Band::ALL {
            let masked = mask_saturated(planes.band_mut(band), threshold);
            info!("{:?}: {} samples at or above {}", band, masked, threshold);
        }
    }
    let RgbPlanes{red, green, blue} = &mut planes;
    if count_non_finite(red) + count_non_finite(green) + count_non_finite(blue) > 0 {
        replace_saturated_pixels(red, green, blue,
                                 args.border_width, args.saturated_value)?;
    }

    let mapping = AsinhMapping::new(
        MappingParameters::new(args.minimum, args.range, args.q)?);
    let options = CompositeOptions{
        intensity: if args.rms { Intensity::Rms } else { Intensity::Mean },
        flip_vertical: args.flip,
    };
    let rgb = planes.compose(&mapping, &options)?;
    info!("Processed in {:?}", start.elapsed());

    write_composite(&rgb, &output_path)
}
