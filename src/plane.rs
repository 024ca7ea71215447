// Copyright (c) 2025 Steven Rosenthal smr@dt3.org
// See LICENSE file in root directory for license terms.

use image::{DynamicImage, ImageBuffer, Luma};

use crate::error::{Result, RgbError};

/// One colour band: a width x height grid of linear flux samples. Pixel (0, 0)
/// is the first sample of the first row.
pub type Plane = ImageBuffer<Luma<f32>, Vec<f32>>;

/// Returns a zero-filled plane.
pub fn new_plane(width: u32, height: u32) -> Plane {
    Plane::new(width, height)
}

/// Replaces the contents of `dst` with those of `src`. The planes must be the
/// same size.
pub fn assign(dst: &mut Plane, src: &Plane) -> Result<()> {
    if dst.dimensions() != src.dimensions() {
        return Err(RgbError::SizeMismatch{expected: dst.dimensions(),
                                          actual: src.dimensions()});
    }
    dst.copy_from_slice(src.as_raw());
    Ok(())
}

/// Verifies that the three bands share a size, returning (width, height).
pub fn check_dimensions(red: &Plane, green: &Plane, blue: &Plane)
                        -> Result<(u32, u32)> {
    let dims = red.dimensions();
    if green.dimensions() != dims || blue.dimensions() != dims {
        return Err(RgbError::DimensionMismatch{red: dims,
                                               green: green.dimensions(),
                                               blue: blue.dimensions()});
    }
    Ok(dims)
}

pub fn count_non_finite(plane: &Plane) -> usize {
    plane.iter().filter(|v| !v.is_finite()).count()
}

/// Converts a decoded image to a plane holding its luminance. Integer images
/// keep their native scale (0..255 for 8 bit, 0..65535 for 16 bit); float
/// images are taken as is.
pub fn plane_from_image(image: &DynamicImage) -> Plane {
    let full_scale = match image {
        DynamicImage::ImageLuma16(_) | DynamicImage::ImageLumaA16(_) |
        DynamicImage::ImageRgb16(_) | DynamicImage::ImageRgba16(_) => 65535.0,
        DynamicImage::ImageRgb32F(_) | DynamicImage::ImageRgba32F(_) => 1.0,
        _ => 255.0,
    };
    let mut plane = image.to_luma32f();
    if full_scale != 1.0 {
        for v in plane.iter_mut() {
            *v *= full_scale;
        }
    }
    plane
}
