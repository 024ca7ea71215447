// Copyright (c) 2025 Steven Rosenthal smr@dt3.org
// See LICENSE file in root directory for license terms.

//! Brightness mappings from the combined intensity of a pixel's three bands to
//! a display intensity in [0, 1].
//!
//! A mapping is applied to the pixel's combined intensity, not to each band
//! separately; the resulting scale factor `stretch(I) / I` multiplies all three
//! bands, so the ratios between bands (the colour) survive the stretch.

use crate::error::{Result, RgbError};

/// How the three (black point subtracted) band values of a pixel are reduced
/// to the single intensity on which the stretch operates.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub enum Intensity {
    /// Arithmetic mean (r + g + b) / 3.
    #[default]
    Mean,
    /// Root mean square sqrt((r² + g² + b²) / 3). Unlike `Mean` this is never
    /// pulled down by a negative band.
    Rms,
}

impl Intensity {
    pub fn combine(&self, r: f32, g: f32, b: f32) -> f32 {
        match self {
            Intensity::Mean => (r + g + b) / 3.0,
            Intensity::Rms => ((r * r + g * g + b * b) / 3.0).sqrt(),
        }
    }
}

/// Black point, dynamic range and softening of a stretch.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct MappingParameters {
    /// Black point of each band, indexed red, green, blue.
    pub minimum: [f32; 3],

    /// Intensity range above the black point that maps to full scale in a
    /// linear stretch.
    pub range: f32,

    /// Asinh softening parameter Q. Zero selects a linear stretch.
    pub softening: f32,
}

impl MappingParameters {
    /// Same black point for all three bands.
    pub fn new(minimum: f32, range: f32, softening: f32)
               -> Result<MappingParameters> {
        Self::with_band_minima([minimum; 3], range, softening)
    }

    pub fn with_band_minima(minimum: [f32; 3], range: f32, softening: f32)
                            -> Result<MappingParameters> {
        if !(range.is_finite() && range > 0.0) {
            return Err(RgbError::InvalidParameter(
                format!("range must be positive and finite, got {}", range)));
        }
        if minimum.iter().any(|m| !m.is_finite()) {
            return Err(RgbError::InvalidParameter(
                format!("minimum must be finite, got {:?}", minimum)));
        }
        if softening.is_nan() {
            return Err(RgbError::InvalidParameter(
                "softening must not be NaN".to_string()));
        }
        Ok(MappingParameters{minimum, range, softening})
    }
}

/// A stretch from combined intensity to display intensity in [0, 1].
///
/// Two entry points exist. [IntensityMapper::map()] takes a raw magnitude and
/// subtracts the black point itself. [IntensityMapper::stretch()] takes an
/// intensity whose black point has already been removed; the compositor uses
/// it because it subtracts each band's own minimum before combining bands.
pub trait IntensityMapper {
    fn params(&self) -> &MappingParameters;

    /// Display intensity for an intensity that is already relative to the
    /// black point. Intensities at or below zero map to 0. Never returns a
    /// non-finite value.
    fn stretch(&self, intensity: f32) -> f32;

    /// Black point of a combined magnitude: the mean of the band minima.
    fn black_point(&self) -> f32 {
        let minimum = &self.params().minimum;
        (minimum[0] + minimum[1] + minimum[2]) / 3.0
    }

    /// Display intensity of a raw magnitude, e.g. for the linear stretch
    /// clamp((magnitude - minimum) / range, 0, 1).
    fn map(&self, magnitude: f32) -> f32 {
        self.stretch(magnitude - self.black_point())
    }

    /// Factor by which each black point subtracted band value is multiplied:
    /// stretch(I) / I, or 0 when the intensity is not positive.
    fn scale(&self, intensity: f32) -> f32 {
        if !(intensity > 0.0) {
            return 0.0;
        }
        let scale = self.stretch(intensity) / intensity;
        if scale.is_finite() { scale } else { 0.0 }
    }
}

fn clamp_unit(value: f64) -> f32 {
    // NaN fails both comparisons and lands at 0.
    if value > 1.0 {
        1.0
    } else if value > 0.0 {
        value as f32
    } else {
        0.0
    }
}

/// output = (I - min) / range, clamped to [0, 1]. [IntensityMapper::stretch()]
/// receives I - min.
#[derive(Clone, Debug)]
pub struct LinearMapping {
    params: MappingParameters,
}

impl LinearMapping {
    pub fn new(params: MappingParameters) -> LinearMapping {
        LinearMapping{params}
    }
}

impl IntensityMapper for LinearMapping {
    fn params(&self) -> &MappingParameters { &self.params }

    fn stretch(&self, intensity: f32) -> f32 {
        if !(intensity > 0.0) {
            return 0.0;
        }
        clamp_unit(intensity as f64 / self.params.range as f64)
    }
}

// Largest softening we accept; beyond this asinh(Q x) is indistinguishable
// from a log stretch anyway.
const MAX_SOFTENING: f64 = 1e10;

// The asinh stretch is normalised so that an intensity of REFERENCE_FRACTION *
// range maps to REFERENCE_FRACTION, matching the linear stretch at that point.
const REFERENCE_FRACTION: f64 = 0.1;

/// Asinh stretch:
///
///   output = asinh(Q (I - min) / range) / Q_scale
///
/// where Q_scale = asinh(0.1 Q) / 0.1. Faint pixels are treated almost
/// linearly while bright pixels are compressed logarithmically. With Q == 0
/// this is exactly the linear stretch. [IntensityMapper::stretch()] receives
/// I - min.
#[derive(Clone, Debug)]
pub struct AsinhMapping {
    params: MappingParameters,

    // Q / range; the coefficient of I inside asinh(). Zero for linear.
    soften: f64,

    // 1 / Q_scale.
    slope: f64,
}

impl AsinhMapping {
    pub fn new(params: MappingParameters) -> AsinhMapping {
        let q = f64::min((params.softening as f64).abs(), MAX_SOFTENING);
        let (soften, slope) = if q == 0.0 {
            (0.0, 0.0)
        } else {
            (q / params.range as f64,
             REFERENCE_FRACTION / (REFERENCE_FRACTION * q).asinh())
        };
        AsinhMapping{params, soften, slope}
    }

    pub fn is_linear(&self) -> bool {
        self.soften == 0.0
    }
}

impl IntensityMapper for AsinhMapping {
    fn params(&self) -> &MappingParameters { &self.params }

    fn stretch(&self, intensity: f32) -> f32 {
        if !(intensity > 0.0) {
            return 0.0;
        }
        if self.is_linear() {
            return clamp_unit(intensity as f64 / self.params.range as f64);
        }
        clamp_unit((intensity as f64 * self.soften).asinh() * self.slope)
    }
}
