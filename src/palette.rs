// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Contains the ColorPalette, a cyclic table of colors ordered by hue,
//! and the HSV color it is built from.  Escape iterations index into the
//! table modulo its length, so an arbitrarily deep zoom keeps cycling
//! through the same warm-to-cool gradient.

use image::{Pixel, Rgba};

use crate::engine::Escape;
use crate::errors::RenderError;

/// The hue of the first palette entry, in degrees.
pub const START_HUE: f64 = 30.0;

/// How far the palette travels around the color wheel.  Stopping short
/// of a full turn keeps the last entry visibly different from the first.
pub const SPREAD_HUE: f64 = 210.0;

/// A color as a hue in degrees [0, 360), and a saturation and value in
/// [0, 1].
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Hsv {
    /// Hue, in degrees.
    pub h: f64,
    /// Saturation.
    pub s: f64,
    /// Value (brightness).
    pub v: f64,
}

/// The color given to points that never escaped: black.
pub const IN_SET: Hsv = Hsv {
    h: 0.0,
    s: 0.0,
    v: 0.0,
};

impl Hsv {
    /// Hexagonal HSV to RGB conversion.  The hue picks one of six 60°
    /// sectors, which decides where the chroma and the intermediate
    /// component land; the match value lifts all three channels.
    /// Alpha is always opaque.
    pub fn to_rgba(&self) -> Rgba<u8> {
        let c = self.v * self.s;
        let x = c * (1.0 - ((self.h / 60.0) % 2.0 - 1.0).abs());
        let m = self.v - c;

        let (r, g, b) = if self.h < 60.0 {
            (c, x, 0.0)
        } else if self.h < 120.0 {
            (x, c, 0.0)
        } else if self.h < 180.0 {
            (0.0, c, x)
        } else if self.h < 240.0 {
            (0.0, x, c)
        } else if self.h < 300.0 {
            (x, 0.0, c)
        } else {
            (c, 0.0, x)
        };

        let channel = |v: f64| ((v + m) * 255.0) as u8;
        Rgba::from_channels(channel(r), channel(g), channel(b), 255)
    }
}

/// An ordered, cyclically-indexed table of colors.  Built once per run
/// and shared read-only by every region worker.
#[derive(Clone, Debug)]
pub struct ColorPalette {
    colors: Vec<Hsv>,
    // The same table, already converted; the workers only ever want this.
    rgba: Vec<Rgba<u8>>,
}

impl ColorPalette {
    /// Builds a palette of `count` fully saturated colors whose hues
    /// ascend evenly from `START_HUE` across `SPREAD_HUE` degrees.
    /// Hues keep their fractional part rather than being truncated to
    /// whole degrees, so neighbouring entries of a large palette can
    /// differ by less than one degree.
    pub fn generate(count: usize) -> Result<ColorPalette, RenderError> {
        if count == 0 {
            return Err(RenderError::EmptyPalette);
        }

        let colors: Vec<Hsv> = (0..count)
            .map(|i| Hsv {
                h: START_HUE + SPREAD_HUE * (i as f64) / (count as f64),
                s: 1.0,
                v: 1.0,
            })
            .collect();
        let rgba = colors.iter().map(Hsv::to_rgba).collect();

        Ok(ColorPalette { colors, rgba })
    }

    /// The number of distinct colors before the palette repeats.
    pub fn len(&self) -> usize {
        self.colors.len()
    }

    /// Always false for a generated palette; present for symmetry with
    /// `len`.
    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    /// The color for an iteration count.  Any index is valid; it wraps.
    pub fn get(&self, index: usize) -> Hsv {
        self.colors[index % self.colors.len()]
    }

    /// The RGBA form of `get`.
    pub fn rgba(&self, index: usize) -> Rgba<u8> {
        self.rgba[index % self.rgba.len()]
    }

    /// Colors one engine result.  Points that did not escape, whether
    /// they are truly in the set or were abandoned by the early stop,
    /// are painted with `IN_SET`.
    pub fn color_for(&self, escape: Escape) -> Rgba<u8> {
        match escape {
            Some(i) => self.rgba(i),
            None => IN_SET.to_rgba(),
        }
    }
}
