// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Construction-time failures.  Everything the renderer can refuse is
//! refused here, before any worker is started; once a frame begins it
//! either completes or a worker panicked.

use failure::Fail;

/// The ways a renderer configuration can be rejected.
#[derive(Debug, Fail, PartialEq)]
pub enum RenderError {
    /// A palette needs at least one color to index into.
    #[fail(display = "palette must hold at least one color")]
    EmptyPalette,

    /// The image must be at least one pixel on a side.
    #[fail(display = "pixel dimension must be positive")]
    ZeroDimension,

    /// The sampled region of the complex plane has no extent.
    #[fail(display = "viewport size must be positive and finite, got {}", _0)]
    InvalidSize(f64),

    /// A frame needs at least one band to render.
    #[fail(display = "worker count must be positive")]
    NoWorkers,

    /// One of the early-stop thresholds lies outside (0, 1].
    #[fail(display = "{} must lie in (0, 1], got {}", name, value)]
    OutOfRange {
        /// Which threshold was rejected.
        name: &'static str,
        /// The value that was supplied.
        value: f64,
    },

    /// The zoom factor would not shrink the viewport.
    #[fail(display = "zoom factor must lie in (0, 1), got {}", _0)]
    InvalidZoom(f64),

    /// A region worker died before finishing its band.
    #[fail(display = "a region worker panicked; frame abandoned")]
    WorkerPanicked,
}
