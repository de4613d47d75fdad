// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Turning a viewport into a frame.  The image is cut into horizontal
//! bands, one per worker thread.  Each band is a disjoint `&mut` slice
//! of the frame buffer, so the workers never need a lock; the palette,
//! engine and viewport are shared by plain reference for the lifetime
//! of the scope.

use image::{Pixel, Rgba, RgbaImage};
use log::debug;

use crate::engine::EscapeTimeEngine;
use crate::errors::RenderError;
use crate::palette::ColorPalette;
use crate::planes::{Region, Viewport};

/// Bytes per pixel in a frame buffer.
pub const CHANNELS: usize = 4;

/// A complete, square RGBA frame.  Once handed out it is never written
/// again.
pub struct Frame {
    image: RgbaImage,
}

impl Frame {
    /// The width (and height) of the frame in pixels.
    pub fn dimension(&self) -> usize {
        self.image.width() as usize
    }

    /// The color at column `x`, row `y`.
    ///
    /// # Panics
    ///
    /// Panics if either coordinate is not less than `dimension()`.
    pub fn pixel(&self, x: usize, y: usize) -> Rgba<u8> {
        *self.image.get_pixel(x as u32, y as u32)
    }

    /// The raw row-major RGBA bytes.
    pub fn as_raw(&self) -> &[u8] {
        &self.image
    }

    /// Gives up the frame as an image, ready to be encoded or blitted.
    pub fn into_image(self) -> RgbaImage {
        self.image
    }
}

/// The region worker.  Given a band of full-width rows starting at
/// `region.top`, fill in exactly the pixels of `region`: sample the
/// points, resolve their escapes, and color them.  Nothing outside the
/// region is touched.
pub fn render_region(
    viewport: &Viewport,
    region: &Region,
    palette: &ColorPalette,
    engine: &EscapeTimeEngine,
    band: &mut [u8],
) {
    let stride = viewport.dimension();
    debug_assert!(band.len() >= region.height * stride * CHANNELS);

    let points = viewport.points(region);
    let escapes = engine.resolve(&points);

    // Points come back column by column; see `Viewport::points`.
    for x in 0..region.width {
        for y in 0..region.height {
            let color = palette.color_for(escapes[x * region.height + y]);
            let offset = (y * stride + region.left + x) * CHANNELS;
            band[offset..offset + CHANNELS].copy_from_slice(color.channels());
        }
    }
}

/// Splits frames into bands and renders the bands concurrently.
#[derive(Copy, Clone, Debug)]
pub struct FrameScheduler {
    workers: usize,
}

impl FrameScheduler {
    /// Constructor.  Takes the number of bands, and therefore threads,
    /// per frame.
    pub fn new(workers: usize) -> Result<FrameScheduler, RenderError> {
        if workers == 0 {
            return Err(RenderError::NoWorkers);
        }
        Ok(FrameScheduler { workers })
    }

    /// Threads per frame.
    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Cuts a square image `dimension` pixels wide into one horizontal
    /// band per worker.  Every band is `dimension / workers` rows tall,
    /// except the last, which also takes the remainder.  Bands may be
    /// empty when there are more workers than rows.
    pub fn partition(&self, dimension: usize) -> Vec<Region> {
        let rows = dimension / self.workers;
        (0..self.workers)
            .map(|i| {
                let top = i * rows;
                let height = if i + 1 == self.workers {
                    dimension - top
                } else {
                    rows
                };
                Region {
                    left: 0,
                    top,
                    width: dimension,
                    height,
                }
            })
            .collect()
    }

    /// Renders a full frame.  Returns only after every band's worker has
    /// finished; if any of them panicked, no frame is returned at all.
    ///
    /// Each band is resolved as its own batch, so the engine's early stop
    /// judges each band separately.  When that stop fires, the number of
    /// workers can change which boundary pixels are left black; frames
    /// are only guaranteed identical across worker counts when every band
    /// ends at the cap or with all of its points escaped.
    pub fn render(
        &self,
        viewport: &Viewport,
        palette: &ColorPalette,
        engine: &EscapeTimeEngine,
    ) -> Result<Frame, RenderError> {
        let dimension = viewport.dimension();
        let mut image = RgbaImage::new(dimension as u32, dimension as u32);

        {
            let mut bands: Vec<(Region, &mut [u8])> = Vec::with_capacity(self.workers);
            let mut rest: &mut [u8] = &mut *image;
            for region in self.partition(dimension) {
                let (band, tail) =
                    std::mem::take(&mut rest).split_at_mut(region.len() * CHANNELS);
                bands.push((region, band));
                rest = tail;
            }

            crossbeam::scope(|spawner| {
                for (region, band) in bands {
                    debug!("dispatching rows {}..{}", region.top, region.bottom());
                    spawner.spawn(move |_| {
                        render_region(viewport, &region, palette, engine, band);
                    });
                }
            })
            .map_err(|_| RenderError::WorkerPanicked)?;
        }

        Ok(Frame { image })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::EngineConfig;
    use num::Complex;

    fn engine() -> EscapeTimeEngine {
        EscapeTimeEngine::new(EngineConfig::new(0.01, 0.05, Some(1000)).unwrap())
    }

    #[test]
    fn scheduler_rejects_zero_workers() {
        assert_eq!(FrameScheduler::new(0).unwrap_err(), RenderError::NoWorkers);
    }

    #[test]
    fn partition_covers_every_row_once() {
        for workers in 1..12 {
            let scheduler = FrameScheduler::new(workers).unwrap();
            for &dimension in &[1, 7, 10, 64, 701] {
                let bands = scheduler.partition(dimension);
                assert_eq!(bands.len(), workers);
                let mut next = 0;
                for band in &bands {
                    assert_eq!(band.top, next);
                    assert_eq!(band.left, 0);
                    assert_eq!(band.width, dimension);
                    next = band.bottom();
                }
                assert_eq!(next, dimension);
            }
        }
    }

    #[test]
    fn last_band_absorbs_the_remainder() {
        let bands = FrameScheduler::new(3).unwrap().partition(10);
        let heights: Vec<usize> = bands.iter().map(|b| b.height).collect();
        assert_eq!(heights, vec![3, 3, 4]);
    }

    #[test]
    fn region_worker_stays_inside_its_region() {
        let viewport = Viewport::new(Complex::new(0.0, 0.0), 4.0, 6).unwrap();
        let palette = ColorPalette::generate(16).unwrap();
        let region = Region {
            left: 2,
            top: 1,
            width: 3,
            height: 2,
        };
        // A band holding rows 1 and 2, prefilled with a marker.
        let mut band = vec![7u8; 2 * 6 * CHANNELS];
        render_region(&viewport, &region, &palette, &engine(), &mut band);

        for y in 0..2 {
            for x in 0..6 {
                let offset = (y * 6 + x) * CHANNELS;
                let pixel = &band[offset..offset + CHANNELS];
                if x >= 2 && x < 5 {
                    assert_eq!(pixel[3], 255);
                } else {
                    assert_eq!(pixel, &[7, 7, 7, 7]);
                }
            }
        }
    }

    #[test]
    fn frame_is_fully_written() {
        let viewport = Viewport::new(Complex::new(-0.5, 0.0), 3.0, 33).unwrap();
        let palette = ColorPalette::generate(32).unwrap();
        let frame = FrameScheduler::new(5)
            .unwrap()
            .render(&viewport, &palette, &engine())
            .unwrap();
        assert_eq!(frame.dimension(), 33);
        assert_eq!(frame.as_raw().len(), 33 * 33 * CHANNELS);
        // A freshly allocated buffer is all zeros, alpha included.
        assert!(frame.as_raw().chunks(CHANNELS).all(|p| p[3] == 255));
    }

    #[test]
    fn raw_bytes_match_pixels() {
        let viewport = Viewport::new(Complex::new(-0.5, 0.0), 3.0, 9).unwrap();
        let palette = ColorPalette::generate(12).unwrap();
        let frame = FrameScheduler::new(2)
            .unwrap()
            .render(&viewport, &palette, &engine())
            .unwrap();
        let raw = frame.as_raw();
        for y in 0..9 {
            for x in 0..9 {
                let offset = (y * 9 + x) * CHANNELS;
                assert_eq!(&raw[offset..offset + CHANNELS], frame.pixel(x, y).channels());
            }
        }
    }

    #[test]
    #[should_panic]
    fn pixel_outside_the_frame_panics() {
        let viewport = Viewport::new(Complex::new(0.0, 0.0), 4.0, 4).unwrap();
        let palette = ColorPalette::generate(8).unwrap();
        let frame = FrameScheduler::new(1)
            .unwrap()
            .render(&viewport, &palette, &engine())
            .unwrap();
        frame.pixel(4, 0);
    }

    #[test]
    fn each_band_is_resolved_on_its_own() {
        // The early stop is live here, so each band must come out exactly
        // as if it had been rendered alone.
        let config = EngineConfig::new(0.01, 0.05, Some(1 << 14)).unwrap();
        let engine = EscapeTimeEngine::new(config);
        let viewport = Viewport::new(Complex::new(-0.75, 0.1), 2.5, 64).unwrap();
        let palette = ColorPalette::generate(200).unwrap();
        let scheduler = FrameScheduler::new(4).unwrap();
        let frame = scheduler.render(&viewport, &palette, &engine).unwrap();

        for region in scheduler.partition(64) {
            let mut band = vec![0u8; region.len() * CHANNELS];
            render_region(&viewport, &region, &palette, &engine, &mut band);
            let start = region.top * 64 * CHANNELS;
            assert_eq!(&frame.as_raw()[start..start + band.len()], &band[..]);
        }
    }

    #[test]
    fn more_workers_than_rows() {
        let viewport = Viewport::new(Complex::new(0.0, 0.0), 4.0, 3).unwrap();
        let palette = ColorPalette::generate(8).unwrap();
        let frame = FrameScheduler::new(8)
            .unwrap()
            .render(&viewport, &palette, &engine())
            .unwrap();
        assert!(frame.as_raw().chunks(CHANNELS).all(|p| p[3] == 255));
    }
}
