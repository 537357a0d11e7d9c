#![deny(missing_docs)]
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Mandelbrot renderer
//!
//! The Mandelbrot set is the set of points `c` on the complex plane
//! for which repeatedly squaring `z` and adding `c`, starting from
//! zero, never runs off to infinity.  Once `|z|` passes 2 it never
//! comes back, so we count how many steps that takes (the "escape
//! time") and use the count to pick a colour.  Points that survive up
//! to the iteration cap are presumed to be in the set and are painted
//! black.
//!
//! A render is a single pass: the mapping from pixels to points and
//! the palette are built first, then every pixel is evaluated on a
//! pool of workers, and only when all of them are done is the image
//! written out as a binary pixmap.

extern crate crossbeam;
#[macro_use]
extern crate failure;
extern crate itertools;
#[macro_use]
extern crate log;
extern crate num;
extern crate num_cpus;
extern crate tempfile;

#[cfg(test)]
extern crate image;
#[cfg(test)]
extern crate rand;

pub mod config;
pub mod errors;
pub mod escape;
pub mod palette;
pub mod pixmap;
pub mod planes;
pub mod render;

pub use config::RenderConfig;
pub use errors::RenderError;
pub use escape::escape_time;
pub use palette::{Palette, Rgb};
pub use pixmap::write_pixmap;
pub use planes::{Pixel, PlaneMapper, Viewport};
pub use render::{PixelBuffer, RenderStats, Renderer, WorkerStats};

use std::time::{Duration, Instant};

/// What a finished run produced.
#[derive(Clone, Debug)]
pub struct Summary {
    /// Bytes written to the output file
    pub bytes: usize,
    /// Wall-clock time spent rendering, in either mode
    pub elapsed: Duration,
    /// Per-worker load, when the image was rendered in parallel
    pub stats: Option<RenderStats>,
}

/// Validates the configuration, renders the image, and writes it to
/// `config.output`.  With `sequential` set, the image is rendered on
/// the calling thread instead of the worker pool.  Nothing is written
/// unless the configuration is sound and every pixel was rendered.
pub fn render_to_file(config: &RenderConfig, sequential: bool) -> Result<Summary, RenderError> {
    let renderer = Renderer::new(config)?;
    let start = Instant::now();
    let (image, stats) = if sequential {
        (renderer.render_sequential()?, None)
    } else {
        let (image, stats) = renderer.render()?;
        (image, Some(stats))
    };
    let elapsed = start.elapsed();
    let bytes = write_pixmap(&config.output, &image)?;
    info!(
        "{}x{} image, {} iterations, written to {}",
        config.width,
        config.height,
        config.max_iterations,
        config.output.display()
    );
    Ok(Summary {
        bytes,
        elapsed,
        stats,
    })
}
