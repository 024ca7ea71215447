// Copyright (c) 2025 Steven Rosenthal smr@dt3.org
// See LICENSE file in root directory for license terms.

use std::time::Instant;

use image::{Rgb, RgbImage};
use log::{debug, info};

use crate::error::Result;
use crate::mapping::{Intensity, IntensityMapper};
use crate::plane::{check_dimensions, Plane};

/// Largest value of an output channel.
pub const CHANNEL_MAX: f32 = 255.0;

/// Identifies a physical colour band and the output channel it lands in.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Band {
    Red,
    Green,
    Blue,
}

impl Band {
    pub const ALL: [Band; 3] = [Band::Red, Band::Green, Band::Blue];

    /// Index of this band's channel within an `Rgb<u8>` output pixel.
    pub fn channel(&self) -> usize {
        match self {
            Band::Red => 0,
            Band::Green => 1,
            Band::Blue => 2,
        }
    }
}

/// The three bands of one composition, named by the channel each feeds. For
/// example a g, r, i observation would usually be supplied as blue = g,
/// green = r, red = i.
#[derive(Clone, Debug)]
pub struct RgbPlanes {
    pub red: Plane,
    pub green: Plane,
    pub blue: Plane,
}

impl RgbPlanes {
    pub fn new(red: Plane, green: Plane, blue: Plane) -> Result<RgbPlanes> {
        check_dimensions(&red, &green, &blue)?;
        Ok(RgbPlanes{red, green, blue})
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.red.dimensions()
    }

    pub fn band(&self, band: Band) -> &Plane {
        match band {
            Band::Red => &self.red,
            Band::Green => &self.green,
            Band::Blue => &self.blue,
        }
    }

    pub fn band_mut(&mut self, band: Band) -> &mut Plane {
        match band {
            Band::Red => &mut self.red,
            Band::Green => &mut self.green,
            Band::Blue => &mut self.blue,
        }
    }

    pub fn compose(&self, mapper: &dyn IntensityMapper,
                   options: &CompositeOptions) -> Result<RgbImage> {
        compose(&self.red, &self.green, &self.blue, mapper, options)
    }
}

#[derive(Copy, Clone, Debug, Default)]
pub struct CompositeOptions {
    /// Combination of the three bands on which the stretch operates.
    pub intensity: Intensity,

    /// If true, plane row 0 becomes the bottom row of the output (y axis
    /// pointing up, as in most astronomical image conventions). Otherwise row
    /// 0 is the top row.
    pub flip_vertical: bool,
}

/// Converts (red, green, blue) display values to an output pixel, preserving
/// the ratios of the bands.
///
/// Negative values are truncated to 0. If the largest value reaches
/// [CHANNEL_MAX] it is set to [CHANNEL_MAX] and the others are reduced
/// proportionally, rather than clipping each channel on its own (which would
/// shift a bright star's hue towards white).
pub fn true_colour_pixel(r: f32, g: f32, b: f32) -> Rgb<u8> {
    let mut vals = [f32::max(r, 0.0), f32::max(g, 0.0), f32::max(b, 0.0)];
    let largest = vals[0].max(vals[1]).max(vals[2]);
    if largest >= CHANNEL_MAX {
        let fac = CHANNEL_MAX / largest;
        for v in vals.iter_mut() {
            *v *= fac;
        }
    }
    // `as u8` saturates, so a NaN that slipped through becomes 0.
    Rgb([vals[0].round() as u8, vals[1].round() as u8, vals[2].round() as u8])
}

/// Maps one pixel's band values to the output pixel. The black points are
/// subtracted, the combined intensity is stretched, and one shared scale
/// factor is applied to all three bands.
pub fn map_pixel(r: f32, g: f32, b: f32, mapper: &dyn IntensityMapper,
                 intensity: Intensity) -> Rgb<u8> {
    let minimum = &mapper.params().minimum;
    let r = r - minimum[Band::Red.channel()];
    let g = g - minimum[Band::Green.channel()];
    let b = b - minimum[Band::Blue.channel()];

    let i = intensity.combine(r, g, b);
    if !(i > 0.0) {
        return Rgb([0, 0, 0]);
    }
    let fac = mapper.scale(i) * CHANNEL_MAX;
    true_colour_pixel(r * fac, g * fac, b * fac)
}

/// Composes three same-sized bands into an 8 bit RGB image.
///
/// # Arguments
///   `red`, `green`, `blue` - The bands feeding the output's red, green and
///   blue channels respectively. They should not contain non-finite values;
///   see [crate::saturation::replace_saturated_pixels()].
///
///   `mapper` - Stretch applied to the combined intensity of each pixel.
///
///   `options` - Intensity combination and output row order.
///
/// # Errors
/// [crate::error::RgbError::DimensionMismatch] if the bands differ in size;
/// no pixels are processed in that case.
pub fn compose(red: &Plane, green: &Plane, blue: &Plane,
               mapper: &dyn IntensityMapper, options: &CompositeOptions)
               -> Result<RgbImage> {
    let compose_start = Instant::now();
    let (width, height) = check_dimensions(red, green, blue)?;
    debug!("Composing {}x{} with {:?} and {:?}",
           width, height, mapper.params(), options);

    let mut output = RgbImage::new(width, height);
    if width == 0 || height == 0 {
        return Ok(output);
    }
    let row_len = width as usize;
    let rows = red.as_raw().chunks_exact(row_len)
        .zip(green.as_raw().chunks_exact(row_len))
        .zip(blue.as_raw().chunks_exact(row_len));
    for (y, ((red_row, green_row), blue_row)) in rows.enumerate() {
        let out_y = if options.flip_vertical {
            height - y as u32 - 1
        } else {
            y as u32
        };
        for x in 0..row_len {
            let pixel = map_pixel(red_row[x], green_row[x], blue_row[x],
                                  mapper, options.intensity);
            output.put_pixel(x as u32, out_y, pixel);
        }
    }
    info!("Composed {}x{} RGB image in {:?}",
          width, height, compose_start.elapsed());
    Ok(output)
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;
    use image::Luma;
    use crate::error::RgbError;
    use crate::mapping::{AsinhMapping, LinearMapping, MappingParameters};
    use crate::plane::new_plane;
    use super::*;

    fn uniform(width: u32, height: u32, value: f32) -> Plane {
        Plane::from_pixel(width, height, Luma([value]))
    }

    fn linear(minimum: f32, range: f32) -> LinearMapping {
        LinearMapping::new(MappingParameters::new(minimum, range, 0.0).unwrap())
    }

    #[test]
    fn test_band_channels() {
        let channels: Vec<usize> = Band::ALL.iter().map(|b| b.channel()).collect();
        assert_eq!(channels, vec![0, 1, 2]);
    }

    #[test]
    fn test_band_accessors() {
        let mut planes = RgbPlanes::new(uniform(2, 2, 1.0), uniform(2, 2, 2.0),
                                        uniform(2, 2, 3.0)).unwrap();
        for (band, value) in Band::ALL.iter().zip([1.0, 2.0, 3.0]) {
            assert_eq!(planes.band(*band).get_pixel(1, 1).0[0], value);
        }
        planes.band_mut(Band::Green).put_pixel(0, 0, Luma([9.0]));
        assert_eq!(planes.green.get_pixel(0, 0).0[0], 9.0);

        // A pure green pixel lands in channel 1 only.
        let mut red = new_plane(1, 1);
        let mut planes = RgbPlanes::new(red.clone(), red.clone(), red.clone())
            .unwrap();
        red.put_pixel(0, 0, Luma([30.0]));
        *planes.band_mut(Band::Green) = red;
        let image = planes.compose(&linear(0.0, 10.0),
                                   &CompositeOptions::default()).unwrap();
        assert_eq!(image.get_pixel(0, 0).0[Band::Green.channel()], 255);
        assert_eq!(image.get_pixel(0, 0).0[Band::Red.channel()], 0);
        assert_eq!(image.get_pixel(0, 0).0[Band::Blue.channel()], 0);
    }

    #[test]
    fn test_true_colour_pixel_in_range() {
        assert_eq!(true_colour_pixel(10.0, 20.4, 30.6), Rgb([10, 20, 31]));
        assert_eq!(true_colour_pixel(-5.0, 20.0, 30.0), Rgb([0, 20, 30]));
    }

    #[test]
    fn test_true_colour_pixel_preserves_ratio_when_clipping() {
        // Each band the brightest in turn.
        assert_eq!(true_colour_pixel(510.0, 255.0, 102.0), Rgb([255, 128, 51]));
        assert_eq!(true_colour_pixel(255.0, 510.0, 102.0), Rgb([128, 255, 51]));
        assert_eq!(true_colour_pixel(102.0, 255.0, 510.0), Rgb([51, 128, 255]));
        assert_eq!(true_colour_pixel(1000.0, 1000.0, 1000.0),
                   Rgb([255, 255, 255]));
        assert_eq!(true_colour_pixel(f32::NAN, 0.0, 0.0), Rgb([0, 0, 0]));
    }

    #[test]
    fn test_dimension_mismatch() {
        let a = new_plane(85, 75);
        let b = new_plane(85, 75);
        let c = new_plane(80, 75);
        let result = compose(&a, &b, &c, &linear(0.0, 5.0),
                             &CompositeOptions::default());
        assert!(matches!(result, Err(RgbError::DimensionMismatch{..})));
        assert!(RgbPlanes::new(a, c, b).is_err());
    }

    #[test]
    fn test_colour_ratio_preserved() {
        let (r, g, b) = (40.0, 20.0, 10.0);
        let planes = RgbPlanes::new(uniform(3, 2, r), uniform(3, 2, g),
                                    uniform(3, 2, b)).unwrap();
        let options = CompositeOptions::default();
        let mappers: Vec<Box<dyn IntensityMapper>> = vec![
            Box::new(linear(0.0, 30.0)),
            Box::new(AsinhMapping::new(
                MappingParameters::new(0.0, 5.0, 20.0).unwrap())),
        ];
        for mapper in &mappers {
            let image = planes.compose(mapper.as_ref(), &options).unwrap();
            let p = image.get_pixel(1, 1).0;
            assert!(p[2] > 20, "too faint to measure ratios: {:?}", p);
            assert_abs_diff_eq!(p[0] as f32 / p[1] as f32, r / g, epsilon = 0.05);
            assert_abs_diff_eq!(p[1] as f32 / p[2] as f32, g / b, epsilon = 0.1);
        }
    }

    #[test]
    fn test_shared_scale_not_per_band() {
        // Linear range 30: mean intensity 70/3 maps to 0.778, scale = 1/30.
        let mapper = linear(0.0, 30.0);
        let p = map_pixel(40.0, 20.0, 10.0, &mapper, Intensity::Mean).0;
        assert_eq!(p, [255, 128, 64]);
    }

    #[test]
    fn test_black_point_and_zero_intensity() {
        let mapper = LinearMapping::new(
            MappingParameters::with_band_minima([10.0, 20.0, 30.0], 10.0, 0.0)
                .unwrap());
        assert_eq!(map_pixel(10.0, 20.0, 30.0, &mapper, Intensity::Mean).0,
                   [0, 0, 0]);
        // Below the black point.
        assert_eq!(map_pixel(0.0, 0.0, 0.0, &mapper, Intensity::Mean).0,
                   [0, 0, 0]);
        // Equal excess in all bands gives grey.
        let p = map_pixel(15.0, 25.0, 35.0, &mapper, Intensity::Mean).0;
        assert_eq!(p[0], p[1]);
        assert_eq!(p[1], p[2]);
        assert_eq!(p[0], 128);
    }

    #[test]
    fn test_flip_vertical() {
        let mut red = new_plane(2, 3);
        red.put_pixel(0, 0, Luma([100.0]));
        let green = new_plane(2, 3);
        let blue = new_plane(2, 3);
        let mapper = linear(0.0, 10.0);

        let top_down = compose(&red, &green, &blue, &mapper,
                               &CompositeOptions::default()).unwrap();
        assert_eq!(top_down.get_pixel(0, 0).0, [255, 0, 0]);
        assert_eq!(top_down.get_pixel(0, 2).0, [0, 0, 0]);

        let options = CompositeOptions{flip_vertical: true,
                                       ..Default::default()};
        let bottom_up = compose(&red, &green, &blue, &mapper, &options).unwrap();
        assert_eq!(bottom_up.get_pixel(0, 0).0, [0, 0, 0]);
        assert_eq!(bottom_up.get_pixel(0, 2).0, [255, 0, 0]);
    }

    #[test]
    fn test_rms_intensity() {
        // A pixel with a negative band is dark under Mean but not under Rms.
        let mapper = linear(0.0, 10.0);
        assert_eq!(map_pixel(6.0, -6.0, -3.0, &mapper, Intensity::Mean).0,
                   [0, 0, 0]);
        let p = map_pixel(6.0, -6.0, -3.0, &mapper, Intensity::Rms).0;
        assert!(p[0] > 0);
        assert_eq!(p[1], 0);
        assert_eq!(p[2], 0);
    }

    #[test]
    fn test_empty_image() {
        let empty = new_plane(0, 0);
        let image = compose(&empty, &empty, &empty, &linear(0.0, 1.0),
                            &CompositeOptions::default()).unwrap();
        assert_eq!(image.dimensions(), (0, 0));
    }
}
