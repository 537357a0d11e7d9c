// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The knobs of a render.  Once validated, a `RenderConfig` is never
//! mutated; every stage of the pipeline reads from the same copy.

use errors::RenderError;
use num::Complex;
use num_cpus;
use std::path::PathBuf;

/// Pixels handed to a worker at a time.  Small relative to a row, so
/// expensive regions of the set get spread across workers.
pub const DEFAULT_CHUNK_SIZE: usize = 10;

/// Everything needed to render one image.
#[derive(Clone, Debug, PartialEq)]
pub struct RenderConfig {
    /// Image width in pixels
    pub width: usize,
    /// Image height in pixels
    pub height: usize,
    /// Iteration cap; points that reach it are presumed in the set
    pub max_iterations: usize,
    /// Center of the viewport on the complex plane
    pub center: Complex<f64>,
    /// Half the side of the (square) viewport
    pub zoom: f64,
    /// Number of render workers
    pub threads: usize,
    /// Pixels per unit of work handed to a worker
    pub chunk_size: usize,
    /// Where the pixmap gets written
    pub output: PathBuf,
}

impl Default for RenderConfig {
    fn default() -> Self {
        RenderConfig {
            width: 5000,
            height: 5000,
            max_iterations: 1000,
            center: Complex::new(-0.5, 0.0),
            zoom: 2.0,
            threads: num_cpus::get(),
            chunk_size: DEFAULT_CHUNK_SIZE,
            output: PathBuf::from("MandelbrotSet.ppm"),
        }
    }
}

impl RenderConfig {
    /// Checks every field, returning the first problem found.  Nothing
    /// is allocated and no file is touched before this passes.
    pub fn validate(&self) -> Result<(), RenderError> {
        if self.width == 0 || self.height == 0 {
            return Err(RenderError::InvalidDimensions {
                width: self.width,
                height: self.height,
            });
        }

        // The writer emits three bytes per pixel, so that product has to
        // fit as well as the pixel count.
        if self
            .width
            .checked_mul(self.height)
            .and_then(|n| n.checked_mul(3))
            .is_none()
        {
            return Err(RenderError::ImageTooLarge {
                width: self.width,
                height: self.height,
            });
        }

        if self.max_iterations == 0 {
            return Err(RenderError::InvalidIterations);
        }

        if !(self.zoom.is_finite() && self.zoom > 0.0) {
            return Err(RenderError::InvalidZoom(self.zoom));
        }

        if !(self.center.re.is_finite() && self.center.im.is_finite()) {
            return Err(RenderError::InvalidCenter(self.center.re, self.center.im));
        }

        if self.threads == 0 {
            return Err(RenderError::InvalidThreads);
        }

        if self.chunk_size == 0 {
            return Err(RenderError::InvalidChunkSize);
        }

        Ok(())
    }
}
