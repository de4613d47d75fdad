// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The zoom animation: render a frame, hand it off, shrink the viewport,
//! repeat.  There is no end condition; whoever is consuming the frames
//! decides when to stop.

use log::info;
use num::Complex;

use crate::engine::{EngineConfig, EscapeTimeEngine};
use crate::errors::RenderError;
use crate::palette::ColorPalette;
use crate::planes::Viewport;
use crate::render::{Frame, FrameScheduler};

/// Everything needed to start a zoom.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ZoomConfig {
    /// The point the zoom closes in on.
    pub center: Complex<f64>,
    /// The width of the first frame on the complex plane.
    pub initial_size: f64,
    /// The size of each frame relative to the one before, in (0, 1).
    pub zoom: f64,
    /// Image side in pixels.
    pub dimension: usize,
    /// Palette length.
    pub colors: usize,
    /// Bands (and threads) per frame.
    pub workers: usize,
    /// Escape-time engine settings.
    pub engine: EngineConfig,
}

impl Default for ZoomConfig {
    fn default() -> Self {
        ZoomConfig {
            center: Complex::new(-1.162_781_26, 0.271_345_18),
            initial_size: 2.0,
            zoom: 0.9,
            dimension: 700,
            colors: 200,
            workers: 8,
            engine: EngineConfig::default(),
        }
    }
}

/// Whatever displays, stores, or otherwise consumes finished frames.
pub trait FrameSink {
    /// Takes ownership of a finished frame.  An error stops the zoom.
    fn present(&mut self, frame: Frame) -> Result<(), failure::Error>;
}

impl<F> FrameSink for F
where
    F: FnMut(Frame) -> Result<(), failure::Error>,
{
    fn present(&mut self, frame: Frame) -> Result<(), failure::Error> {
        self(frame)
    }
}

/// Drives the animation.  Also an endless iterator of frames, each one
/// `zoom` times the size of the last.
pub struct ZoomDriver {
    center: Complex<f64>,
    size: f64,
    zoom: f64,
    dimension: usize,
    palette: ColorPalette,
    engine: EscapeTimeEngine,
    scheduler: FrameScheduler,
    rendered: usize,
}

impl ZoomDriver {
    /// Validates the configuration and builds the palette, engine and
    /// scheduler that every frame will share.
    pub fn new(config: ZoomConfig) -> Result<ZoomDriver, RenderError> {
        if !(config.zoom > 0.0 && config.zoom < 1.0) {
            return Err(RenderError::InvalidZoom(config.zoom));
        }
        Viewport::new(config.center, config.initial_size, config.dimension)?;

        Ok(ZoomDriver {
            center: config.center,
            size: config.initial_size,
            zoom: config.zoom,
            dimension: config.dimension,
            palette: ColorPalette::generate(config.colors)?,
            engine: EscapeTimeEngine::new(config.engine),
            scheduler: FrameScheduler::new(config.workers)?,
            rendered: 0,
        })
    }

    /// The viewport the next frame will be rendered at.  Fails once the
    /// size has shrunk past what an `f64` can represent.
    pub fn viewport(&self) -> Result<Viewport, RenderError> {
        Viewport::new(self.center, self.size, self.dimension)
    }

    /// Frames rendered so far.
    pub fn rendered(&self) -> usize {
        self.rendered
    }

    /// Renders one frame at the current size, then shrinks the size.
    pub fn render_next(&mut self) -> Result<Frame, RenderError> {
        let viewport = self.viewport()?;
        let frame = self
            .scheduler
            .render(&viewport, &self.palette, &self.engine)?;
        self.rendered += 1;
        info!(
            "frame {}: size {:e} at ({}, {})",
            self.rendered, self.size, self.center.re, self.center.im
        );
        self.size *= self.zoom;
        Ok(frame)
    }

    /// Feeds frames to `sink` until rendering or the sink fails.  Never
    /// returns otherwise.
    pub fn run<S: FrameSink>(&mut self, sink: &mut S) -> Result<(), failure::Error> {
        loop {
            let frame = self.render_next()?;
            sink.present(frame)?;
        }
    }
}

impl Iterator for ZoomDriver {
    type Item = Result<Frame, RenderError>;

    fn next(&mut self) -> Option<Self::Item> {
        Some(self.render_next())
    }
}
