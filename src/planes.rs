// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Contains the Viewport, which describes a relationship between a
//! square on the integral plane with an origin at 0,0 and a square on
//! the complex plane centered on an arbitrary point, and the Region, a
//! rectangle of pixels inside that integral square.

use itertools::iproduct;
use num::Complex;

use crate::errors::RenderError;

/// The window onto the complex plane for one frame.  The sampled region
/// is a square `size` units wide centered on `center`; the image is a
/// square `dimension` pixels on a side.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Viewport {
    center: Complex<f64>,
    size: f64,
    dimension: usize,
}

impl Viewport {
    /// Constructor.  Rejects a viewport with no extent on either plane.
    pub fn new(center: Complex<f64>, size: f64, dimension: usize) -> Result<Viewport, RenderError> {
        if !(size > 0.0) || !size.is_finite() {
            return Err(RenderError::InvalidSize(size));
        }
        if dimension == 0 {
            return Err(RenderError::ZeroDimension);
        }
        Ok(Viewport {
            center,
            size,
            dimension,
        })
    }

    /// The point the viewport is centered on.
    pub fn center(&self) -> Complex<f64> {
        self.center
    }

    /// The width (and height) of the sampled square on the complex plane.
    pub fn size(&self) -> f64 {
        self.size
    }

    /// The width (and height) of the image in pixels.
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// A region covering the whole image.
    pub fn full_region(&self) -> Region {
        Region {
            left: 0,
            top: 0,
            width: self.dimension,
            height: self.dimension,
        }
    }

    /// Given the column and row of a pixel on the integral plane, return
    /// the complex number at the equivalent location on the complex
    /// plane.  Pixel (0, 0) maps to the corner `center - size/2` on both
    /// axes.
    pub fn pixel_to_point(&self, x: usize, y: usize) -> Complex<f64> {
        let half = self.size / 2.0;
        let dimension = self.dimension as f64;
        Complex::new(
            self.center.re - half + self.size * (x as f64) / dimension,
            self.center.im - half + self.size * (y as f64) / dimension,
        )
    }

    /// Produces the sample point of every pixel in `region`, column by
    /// column: the point for local pixel (x, y) lands at index
    /// `x * region.height + y`.  Writers of the results rely on this
    /// ordering, since results are matched to pixels by position.
    pub fn points(&self, region: &Region) -> Vec<Complex<f64>> {
        debug_assert!(region.right() <= self.dimension && region.bottom() <= self.dimension);
        iproduct!(0..region.width, 0..region.height)
            .map(|(x, y)| self.pixel_to_point(region.left + x, region.top + y))
            .collect()
    }
}

/// A rectangle of pixels, positioned by its upper-left corner.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Region {
    /// The first column of the region.
    pub left: usize,
    /// The first row of the region.
    pub top: usize,
    /// Columns in the region.
    pub width: usize,
    /// Rows in the region.
    pub height: usize,
}

impl Region {
    /// The total number of pixels in the region.
    pub fn len(&self) -> usize {
        self.width * self.height
    }

    /// Describes that the region has no pixels at all.
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// One past the last column.
    pub fn right(&self) -> usize {
        self.left + self.width
    }

    /// One past the last row.
    pub fn bottom(&self) -> usize {
        self.top + self.height
    }
}
