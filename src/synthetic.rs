// Copyright (c) 2025 Steven Rosenthal smr@dt3.org
// See LICENSE file in root directory for license terms.

//! Synthetic star fields, for demonstrations and tests.

use image::Luma;

use crate::composite::RgbPlanes;
use crate::plane::{new_plane, Plane};

/// A point source and its colours, in magnitudes.
#[derive(Copy, Clone, Debug)]
pub struct StarSpec {
    pub x: f32,
    pub y: f32,

    /// Integrated flux in the blue band.
    pub amplitude: f32,

    /// g - r colour; sets the green band relative to blue.
    pub g_r: f32,

    /// r - i colour; sets the red band relative to blue.
    pub r_i: f32,
}

/// The flux in a band that is `colour` magnitudes brighter than a band with
/// flux `amplitude`.
pub fn band_amplitude(amplitude: f32, colour: f32) -> f32 {
    amplitude * 10_f32.powf(0.4 * colour)
}

/// Adds an elliptical Gaussian star with integrated flux `amplitude` centred
/// at (`x_centre`, `y_centre`). The profile is truncated at 4 sigma and clipped
/// to the plane.
pub fn add_star(plane: &mut Plane, amplitude: f32,
                x_centre: f32, y_centre: f32, sigma_x: f32, sigma_y: f32) {
    let (width, height) = plane.dimensions();
    let sigma_x = f32::max(sigma_x, 0.1);
    let sigma_y = f32::max(sigma_y, 0.1);
    let peak = amplitude / (2.0 * std::f32::consts::PI * sigma_x * sigma_y);
    let x_lo = f32::max((x_centre - 4.0 * sigma_x).floor(), 0.0) as u32;
    let y_lo = f32::max((y_centre - 4.0 * sigma_y).floor(), 0.0) as u32;
    let x_hi = f32::min((x_centre + 4.0 * sigma_x).ceil(), width as f32 - 1.0);
    let y_hi = f32::min((y_centre + 4.0 * sigma_y).ceil(), height as f32 - 1.0);
    if x_hi < 0.0 || y_hi < 0.0 {
        return;
    }
    for y in y_lo..=y_hi as u32 {
        let dy = (y as f32 - y_centre) / sigma_y;
        for x in x_lo..=x_hi as u32 {
            let dx = (x as f32 - x_centre) / sigma_x;
            let value = plane.get_pixel(x, y).0[0] +
                peak * (-0.5 * (dx * dx + dy * dy)).exp();
            plane.put_pixel(x, y, Luma([value]));
        }
    }
}

/// Renders `stars` into fresh red, green and blue planes. Blue receives each
/// star's `amplitude`, green and red are brighter by the star's g - r and
/// r - i colours.
pub fn render_star_field(width: u32, height: u32, stars: &[StarSpec],
                         sigma_x: f32, sigma_y: f32) -> RgbPlanes {
    let mut red = new_plane(width, height);
    let mut green = new_plane(width, height);
    let mut blue = new_plane(width, height);
    for star in stars {
        add_star(&mut blue, star.amplitude, star.x, star.y, sigma_x, sigma_y);
        add_star(&mut green, band_amplitude(star.amplitude, star.g_r),
                 star.x, star.y, sigma_x, sigma_y);
        add_star(&mut red, band_amplitude(star.amplitude, star.r_i),
                 star.x, star.y, sigma_x, sigma_y);
    }
    RgbPlanes{red, green, blue}
}

pub const DEMO_WIDTH: u32 = 85;
pub const DEMO_HEIGHT: u32 = 75;
/// Four stars of assorted brightness and colour; with the demo PSF the
/// brightest saturates at a threshold of 1000.
pub const DEMO_STARS: [StarSpec; 4] = [
    StarSpec{x: 15.0, y: 15.0, amplitude: 1000.0, g_r: 1.0, r_i: 2.0},
    StarSpec{x: 50.0, y: 45.0, amplitude: 5500.0, g_r: -1.0, r_i: -0.5},
    StarSpec{x: 30.0, y: 30.0, amplitude: 600.0, g_r: 1.0, r_i: 2.5},
    StarSpec{x: 45.0, y: 15.0, amplitude: 20000.0, g_r: 1.0, r_i: 1.0},
];
pub const DEMO_SIGMA_X: f32 = 2.5;
pub const DEMO_SIGMA_Y: f32 = 1.5;

pub fn demo_star_field() -> RgbPlanes {
    render_star_field(DEMO_WIDTH, DEMO_HEIGHT, &DEMO_STARS,
                      DEMO_SIGMA_X, DEMO_SIGMA_Y)
}
