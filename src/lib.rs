// Copyright (c) 2025 Steven Rosenthal smr@dt3.org
// See LICENSE file in root directory for license terms.

//! CedarRgb makes colour pictures from astronomical images. Given three
//! co-registered images of the same field taken through different filters
//! (for example g, r and i), CedarRgb combines them into an 8 bit RGB image
//! suitable for display, writing it as PNG or TIFF.
//!
//! Features:
//!
//! * Asinh stretch (Lupton et al. 2004) of the combined intensity, so faint
//!   stars remain visible while bright stars are not blown out. A softening of
//!   zero gives a plain linear stretch.
//! * Colour preservation: one scale factor is applied to all three bands of a
//!   pixel, so the stretch changes brightness but not hue. When a pixel is too
//!   bright for the output range all three channels are reduced together.
//! * Saturated pixel repair: the saturated cores of bright stars are given the
//!   colour of the star's unsaturated wings.
//!
//! # Usage
//!
//! The bands are [plane::Plane]s (f32 luminance images). A typical pipeline:
//!
//! 1. Mark saturated pixels in each band, e.g. with
//!    [saturation::mask_saturated()].
//! 2. Call [saturation::replace_saturated_pixels()]. Afterwards no band
//!    contains non-finite values.
//! 3. Construct a [mapping::AsinhMapping] from [mapping::MappingParameters]
//!    and call [composite::compose()].
//! 4. Write the result with [output::write_composite()].
//!
//! # Caveats
//!
//! ## Dimensions
//!
//! The three bands must already be registered to a common pixel grid and have
//! the same width and height; CedarRgb does no resampling.
//!
//! ## Black points
//!
//! The stretch operates on intensities above the black point of each band.
//! Sky background should be subtracted (or given as the band's minimum),
//! otherwise the background takes on the colour of the sky.
//!
//! ## Saturation
//!
//! Saturated regions are identified purely by non-finite sample values. A
//! saturated star that bleeds into a neighbouring star merges with it into a
//! single region which receives one colour.

pub mod composite;
pub mod error;
pub mod mapping;
pub mod output;
pub mod plane;
pub mod saturation;
pub mod synthetic;
