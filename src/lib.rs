#![deny(missing_docs)]
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Mandelbrot zoom renderer
//!
//! The Mandelbrot set is the set of points `c` on the complex plane for
//! which repeatedly squaring and adding, `z = z² + c` starting from
//! zero, never carries `z` beyond a magnitude of 2.  Points outside the
//! set escape, and how many iterations that takes is the number used to
//! color them.  Points inside the set never escape, which means no fixed
//! number of iterations can prove a point is inside; the renderer has
//! to decide when it has iterated enough.
//!
//! This crate makes that decision adaptively, per frame.  Each band of
//! the image is iterated in passes with a doubling budget, carrying every
//! orbit forward between passes, and stops when new escapes dry up.  The
//! bands run on their own threads, and a driver zooms the viewport in on
//! a fixed point one frame at a time.

pub mod engine;
pub mod errors;
pub mod palette;
pub mod planes;
pub mod render;
pub mod zoom;

pub use engine::{EngineConfig, Escape, EscapeTimeEngine, Refinement, StopReason};
pub use errors::RenderError;
pub use palette::{ColorPalette, Hsv};
pub use planes::{Region, Viewport};
pub use render::{render_region, Frame, FrameScheduler};
pub use zoom::{FrameSink, ZoomConfig, ZoomDriver};
