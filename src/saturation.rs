// Copyright (c) 2025 Steven Rosenthal smr@dt3.org
// See LICENSE file in root directory for license terms.

//! Repair of saturated pixels prior to composition.
//!
//! A saturated pixel is one whose sample is non-finite in any of the three
//! bands; callers typically produce these by passing each band through
//! [mask_saturated()]. Saturated pixels are grouped into connected regions
//! (footprints). The colour of each footprint is estimated from the
//! unsaturated pixels in a border around it, and every pixel of the footprint
//! is then given that colour at a fixed brightness. This keeps the cores of
//! bright stars the colour of their wings, instead of the white (or garbage)
//! that clipped bands would otherwise produce.

use std::time::Instant;

use image::{GrayImage, Luma};
use imageproc::distance_transform::Norm;
use imageproc::morphology::dilate;
use imageproc::rect::Rect;
use imageproc::region_labelling::{connected_components, Connectivity};
use log::{debug, info};

use crate::error::{Result, RgbError};
use crate::plane::{check_dimensions, Plane};

const SATURATED: u8 = 255;

/// Replaces every sample at or above `threshold` with NaN, marking it as
/// saturated. Returns the number of samples marked.
pub fn mask_saturated(plane: &mut Plane, threshold: f32) -> usize {
    let mut count = 0;
    for v in plane.iter_mut() {
        if *v >= threshold {
            *v = f32::NAN;
            count += 1;
        }
    }
    count
}

/// Returns an image that is 255 wherever any band is non-finite and 0
/// elsewhere.
pub fn saturation_mask(red: &Plane, green: &Plane, blue: &Plane)
                       -> Result<GrayImage> {
    let (width, height) = check_dimensions(red, green, blue)?;
    let pixels: Vec<u8> = red.iter().zip(green.iter()).zip(blue.iter())
        .map(|((r, g), b)| {
            if r.is_finite() && g.is_finite() && b.is_finite() { 0 } else { SATURATED }
        })
        .collect();
    // Length matches by construction.
    Ok(GrayImage::from_vec(width, height, pixels)
       .unwrap_or_else(|| GrayImage::new(width, height)))
}

/// A connected (8-neighbour) region of saturated pixels.
#[derive(Debug)]
pub struct Footprint {
    /// Pixel coordinates, in raster scan order.
    pub pixels: Vec<(u32, u32)>,

    /// Bounding box of `pixels`.
    pub bounding_box: Rect,
}

/// Groups the saturated pixels of `mask` into footprints.
pub fn find_footprints(mask: &GrayImage) -> Vec<Footprint> {
    let labels = connected_components(mask, Connectivity::Eight, Luma([0u8]));
    let mut by_label = Vec::<Vec<(u32, u32)>>::new();
    for (x, y, label) in labels.enumerate_pixels() {
        let label = label.0[0] as usize;
        if label == 0 {
            continue;
        }
        if label > by_label.len() {
            by_label.resize(label, Vec::new());
        }
        by_label[label - 1].push((x, y));
    }
    by_label.into_iter().filter(|p| !p.is_empty()).map(|pixels| {
        let mut x_min = u32::MAX;
        let mut x_max = 0_u32;
        let mut y_min = u32::MAX;
        let mut y_max = 0_u32;
        for &(x, y) in &pixels {
            x_min = x_min.min(x);
            x_max = x_max.max(x);
            y_min = y_min.min(y);
            y_max = y_max.max(y);
        }
        let bounding_box = Rect::at(x_min as i32, y_min as i32)
            .of_size(x_max - x_min + 1, y_max - y_min + 1);
        Footprint{pixels, bounding_box}
    }).collect()
}

// Sums each band over the unsaturated pixels within `border_width` (L-infinity
// distance) of the footprint.
fn sum_border(footprint: &Footprint, mask: &GrayImage,
              red: &Plane, green: &Plane, blue: &Plane, border_width: u32)
              -> (/*red*/f64, /*green*/f64, /*blue*/f64) {
    let (width, height) = mask.dimensions();
    let bbox = &footprint.bounding_box;
    // Grown bounding box, clipped to the image.
    let x0 = (bbox.left() as u32).saturating_sub(border_width);
    let y0 = (bbox.top() as u32).saturating_sub(border_width);
    let x1 = u32::min((bbox.right() as u32).saturating_add(border_width),
                      width - 1);
    let y1 = u32::min((bbox.bottom() as u32).saturating_add(border_width),
                      height - 1);

    let mut local = GrayImage::new(x1 - x0 + 1, y1 - y0 + 1);
    for &(x, y) in &footprint.pixels {
        local.put_pixel(x - x0, y - y0, Luma([SATURATED]));
    }
    let k = u32::min(border_width, u8::MAX as u32) as u8;
    let grown = if k > 0 { dilate(&local, Norm::LInf, k) } else { local };

    let (mut sum_r, mut sum_g, mut sum_b) = (0.0_f64, 0.0_f64, 0.0_f64);
    for (lx, ly, value) in grown.enumerate_pixels() {
        if value.0[0] == 0 {
            continue;
        }
        let (x, y) = (x0 + lx, y0 + ly);
        if mask.get_pixel(x, y).0[0] == SATURATED {
            continue;
        }
        sum_r += red.get_pixel(x, y).0[0] as f64;
        sum_g += green.get_pixel(x, y).0[0] as f64;
        sum_b += blue.get_pixel(x, y).0[0] as f64;
    }
    (sum_r, sum_g, sum_b)
}

/// Given the summed band fluxes around a footprint, returns the (red, green,
/// blue) values its pixels are set to: the brightest band gets
/// `saturated_value` and the others keep their ratio to it. Without usable
/// surroundings (no positive flux) all bands get `saturated_value`.
pub fn footprint_colour(sums: (f64, f64, f64), saturated_value: f32)
                        -> (f32, f32, f32) {
    let (sum_r, sum_g, sum_b) = sums;
    let sum_max = sum_r.max(sum_g).max(sum_b);
    if !(sum_r + sum_g + sum_b > 0.0) || !(sum_max > 0.0) {
        return (saturated_value, saturated_value, saturated_value);
    }
    let value = saturated_value as f64;
    let scaled = |sum: f64| f64::max(value * sum / sum_max, 0.0) as f32;
    (scaled(sum_r), scaled(sum_g), scaled(sum_b))
}

/// Replaces the saturated pixels of the three bands, in place, with values
/// that carry the colour of the surrounding unsaturated pixels.
///
/// # Arguments
///   `red`, `green`, `blue` - The bands, as later passed to
///   [crate::composite::compose()]. A pixel is saturated if its value is
///   non-finite in any band; all three bands of a saturated pixel are
///   replaced.
///
///   `border_width` - Width of the border around each saturated region used
///   to estimate the region's colour. Widths beyond 255 are treated as 255.
///
///   `saturated_value` - Brightness given to the brightest band of a repaired
///   pixel.
///
/// # Returns
/// The number of pixels replaced. Afterwards every sample of every band is
/// finite; calling this again is a no-op.
pub fn replace_saturated_pixels(red: &mut Plane, green: &mut Plane,
                                blue: &mut Plane, border_width: u32,
                                saturated_value: f32) -> Result<usize> {
    let repair_start = Instant::now();
    if !saturated_value.is_finite() {
        return Err(RgbError::InvalidParameter(
            format!("saturated value must be finite, got {}", saturated_value)));
    }
    let mask = saturation_mask(red, green, blue)?;
    if !mask.iter().any(|&m| m == SATURATED) {
        debug!("No saturated pixels");
        return Ok(0);
    }
    let footprints = find_footprints(&mask);

    // All colours are estimated before any pixel is modified; the mask keeps
    // repaired pixels out of neighbouring footprints' borders regardless.
    let mut replaced = 0;
    for footprint in &footprints {
        let sums = sum_border(footprint, &mask, red, green, blue, border_width);
        let (r, g, b) = footprint_colour(sums, saturated_value);
        debug!("Footprint {:?} ({} pixels): border sums {:?} -> {} {} {}",
               footprint.bounding_box, footprint.pixels.len(), sums, r, g, b);
        for &(x, y) in &footprint.pixels {
            red.put_pixel(x, y, Luma([r]));
            green.put_pixel(x, y, Luma([g]));
            blue.put_pixel(x, y, Luma([b]));
        }
        replaced += footprint.pixels.len();
    }
    info!("Replaced {} saturated pixels in {} regions in {:?}",
          replaced, footprints.len(), repair_start.elapsed());
    Ok(replaced)
}
