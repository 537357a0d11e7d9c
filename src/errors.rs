// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Everything that can go wrong during a render.  Evaluating a point
//! can't fail, so the whole error surface is configuration checking
//! up front, memory, the worker pool, and writing the file at the
//! end.

use std::io;
use std::path::Path;

/// The single error type of the renderer.
#[derive(Debug, Fail)]
pub enum RenderError {
    /// The image has no pixels along one of its axes.
    #[fail(display = "image dimensions must be positive, got {}x{}", width, height)]
    InvalidDimensions {
        /// Requested width in pixels
        width: usize,
        /// Requested height in pixels
        height: usize,
    },

    /// `width * height` (or its byte size) doesn't fit in memory
    /// addressing at all.
    #[fail(display = "image of {}x{} pixels is too large to address", width, height)]
    ImageTooLarge {
        /// Requested width in pixels
        width: usize,
        /// Requested height in pixels
        height: usize,
    },

    /// The iteration cap must allow at least one step.
    #[fail(display = "iteration cap must be positive")]
    InvalidIterations,

    /// The zoom radius must be a positive, finite number.
    #[fail(display = "zoom radius must be positive and finite, got {}", _0)]
    InvalidZoom(f64),

    /// The viewport center must be a finite point.
    #[fail(display = "viewport center must be finite, got {},{}", _0, _1)]
    InvalidCenter(f64, f64),

    /// At least one worker is needed to render anything.
    #[fail(display = "thread count must be positive")]
    InvalidThreads,

    /// Chunks handed to workers must hold at least one pixel.
    #[fail(display = "chunk size must be positive")]
    InvalidChunkSize,

    /// A buffer could not be reserved.
    #[fail(display = "could not allocate {} entries for the {}", count, what)]
    Allocation {
        /// Which buffer was being allocated
        what: &'static str,
        /// How many entries were requested
        count: usize,
    },

    /// A render worker died before finishing its chunks.
    #[fail(display = "render worker {} panicked", _0)]
    WorkerPanicked(usize),

    /// The worker pool itself failed outside any one worker.
    #[fail(display = "render worker pool failed")]
    PoolFailed,

    /// The output file could not be created, written, or closed.
    #[fail(display = "could not write image to {}", path)]
    Io {
        /// Destination being written
        path: String,
        /// The underlying failure
        #[cause]
        cause: io::Error,
    },
}

impl RenderError {
    /// Wraps an I/O failure with the path it happened on.
    pub fn io(path: &Path, cause: io::Error) -> RenderError {
        RenderError::Io {
            path: path.display().to_string(),
            cause,
        }
    }
}
