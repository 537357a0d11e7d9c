// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The render driver.  Every pixel is independent of every other, so
//! the image buffer is cut into small chunks and a scoped pool of
//! workers pulls chunks off a shared queue until it runs dry.  Points
//! inside the set cost the whole iteration cap while points far
//! outside cost one step, so handing out short chunks on demand keeps
//! the workers evenly loaded where striping the image would not.

use config::RenderConfig;
use crossbeam;
use crossbeam::thread::ScopedJoinHandle;
use errors::RenderError;
use escape::escape_time;
use itertools::iproduct;
use palette::{Palette, Rgb};
use planes::{Pixel, PlaneMapper, Viewport};
use std::iter::Enumerate;
use std::slice::ChunksMut;
use std::sync::Mutex;
use std::time::{Duration, Instant};

type ChunkQueue<'a> = Mutex<Enumerate<ChunksMut<'a, Rgb>>>;

/// An owned, row-major grid of colours, `width * height` long.
#[derive(Clone, Debug, PartialEq)]
pub struct PixelBuffer {
    width: usize,
    height: usize,
    pixels: Vec<Rgb>,
}

impl PixelBuffer {
    /// Allocates a black buffer, reporting rather than aborting when
    /// the memory isn't there.
    pub fn new(width: usize, height: usize) -> Result<PixelBuffer, RenderError> {
        if width == 0 || height == 0 {
            return Err(RenderError::InvalidDimensions { width, height });
        }
        let count = width
            .checked_mul(height)
            .ok_or(RenderError::ImageTooLarge { width, height })?;
        let mut pixels = Vec::new();
        pixels
            .try_reserve_exact(count)
            .map_err(|_| RenderError::Allocation {
                what: "pixel buffer",
                count,
            })?;
        pixels.resize(count, Rgb::BLACK);
        Ok(PixelBuffer {
            width,
            height,
            pixels,
        })
    }

    /// Width in pixels.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Height in pixels.
    pub fn height(&self) -> usize {
        self.height
    }

    /// The slot that pixel `x, y` owns.
    #[inline]
    pub fn index(&self, x: usize, y: usize) -> usize {
        y * self.width + x
    }

    /// The colour at `x, y`, if that's inside the image.
    pub fn get(&self, x: usize, y: usize) -> Option<Rgb> {
        if x < self.width && y < self.height {
            Some(self.pixels[self.index(x, y)])
        } else {
            None
        }
    }

    /// All pixels, top row first, each row left to right.
    pub fn pixels(&self) -> &[Rgb] {
        &self.pixels
    }

    /// The pixels one row at a time.
    pub fn rows(&self) -> ::std::slice::Chunks<Rgb> {
        self.pixels.chunks(self.width)
    }

    /// Mutable access to every slot, in the same order as `pixels`.
    pub fn pixels_mut(&mut self) -> &mut [Rgb] {
        &mut self.pixels
    }
}

/// What one worker did during a parallel render.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct WorkerStats {
    /// Chunks this worker claimed
    pub chunks: usize,
    /// Pixels this worker evaluated
    pub pixels: usize,
    /// Time spent evaluating, excluding waits on the queue
    pub busy: Duration,
}

/// Per-worker load report, indexed by worker id.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RenderStats {
    /// One slot per worker
    pub workers: Vec<WorkerStats>,
    /// Wall-clock time of the evaluation phase
    pub elapsed: Duration,
}

impl RenderStats {
    /// Total pixels evaluated by all workers.
    pub fn pixels(&self) -> usize {
        self.workers.iter().map(|w| w.pixels).sum()
    }

    /// Busy time of the most loaded worker over the mean busy time;
    /// 1.0 is a perfect balance.
    pub fn imbalance(&self) -> f64 {
        let secs: Vec<f64> = self.workers.iter().map(|w| as_secs(w.busy)).collect();
        let total: f64 = secs.iter().sum();
        if secs.is_empty() || total <= 0.0 {
            return 1.0;
        }
        let mean = total / (secs.len() as f64);
        secs.iter().cloned().fold(0.0, f64::max) / mean
    }
}

/// Seconds in a duration, as a float.
pub fn as_secs(d: Duration) -> f64 {
    d.as_secs() as f64 + f64::from(d.subsec_nanos()) * 1e-9
}

/// Holds everything that stays fixed for a render: the mapping from
/// pixels to points, the palette, and how to split up the work.  Once
/// built it is only read, so it can be shared by reference with every
/// worker.
#[derive(Debug)]
pub struct Renderer {
    plane: PlaneMapper,
    palette: Palette,
    threads: usize,
    chunk_size: usize,
}

impl Renderer {
    /// Validates the configuration, then builds the plane mapper and
    /// palette.  Both are complete before any pixel is evaluated.
    pub fn new(config: &RenderConfig) -> Result<Renderer, RenderError> {
        config.validate()?;
        let viewport = Viewport::new(config.center, config.zoom)?;
        let plane = PlaneMapper::new(config.width, config.height, viewport)?;
        let palette = Palette::new(config.max_iterations)?;
        debug!(
            "plane {}x{} from {} to {}, scale {}",
            plane.width(),
            plane.height(),
            viewport.min_bounds(),
            viewport.max_bounds(),
            plane.scale()
        );
        Ok(Renderer {
            plane,
            palette,
            threads: config.threads,
            chunk_size: config.chunk_size,
        })
    }

    /// The pixel-to-point mapping in use.
    pub fn plane(&self) -> &PlaneMapper {
        &self.plane
    }

    /// The colour table in use.
    pub fn palette(&self) -> &Palette {
        &self.palette
    }

    /// The iteration count for a single pixel.
    #[inline]
    pub fn iterations_at(&self, pixel: &Pixel) -> usize {
        escape_time(self.plane.pixel_to_point(pixel), self.palette.max_iterations())
    }

    /// The colour of a single pixel.
    #[inline]
    pub fn color_at(&self, pixel: &Pixel) -> Rgb {
        self.palette.color(self.iterations_at(pixel))
    }

    // Fills a run of slots starting at `offset`.
    fn fill(&self, offset: usize, chunk: &mut [Rgb]) {
        for (i, slot) in chunk.iter_mut().enumerate() {
            *slot = self.color_at(&self.plane.pixel_at(offset + i));
        }
    }

    /// Workers actually started: never more than there are chunks to
    /// hand out.
    pub fn workers(&self) -> usize {
        let pixels = self.plane.pixel_count();
        let chunks = pixels / self.chunk_size + if pixels % self.chunk_size == 0 { 0 } else { 1 };
        ::std::cmp::min(self.threads, chunks)
    }

    /// Renders the image on the calling thread, one pixel at a time.
    /// Produces exactly the same buffer as `render`.
    pub fn render_sequential(&self) -> Result<PixelBuffer, RenderError> {
        let mut image = PixelBuffer::new(self.plane.width(), self.plane.height())?;
        let width = image.width();
        {
            let pixels = image.pixels_mut();
            for (y, x) in iproduct!(0..self.plane.height(), 0..width) {
                let pixel = Pixel(x, y);
                pixels[self.plane.offset(&pixel)] = self.color_at(&pixel);
            }
        }
        Ok(image)
    }

    /// Renders the image across the worker pool.  Returns once every
    /// worker has been joined, together with each worker's load.
    pub fn render(&self) -> Result<(PixelBuffer, RenderStats), RenderError> {
        let mut image = PixelBuffer::new(self.plane.width(), self.plane.height())?;
        let chunk_size = self.chunk_size;
        let threads = self.workers();
        let start = Instant::now();

        let results = {
            let queue: ChunkQueue =
                Mutex::new(image.pixels_mut().chunks_mut(chunk_size).enumerate());
            let queue = &queue;
            crossbeam::scope(|spawner| {
                let handles: Vec<ScopedJoinHandle<WorkerStats>> = (0..threads)
                    .map(|worker| {
                        spawner.spawn(move |_| {
                            let mut stats = WorkerStats::default();
                            loop {
                                // A poisoned queue means another worker died;
                                // stop and let the join report it.
                                let next = match queue.lock() {
                                    Ok(mut chunks) => chunks.next(),
                                    Err(_) => None,
                                };
                                match next {
                                    Some((index, chunk)) => {
                                        let began = Instant::now();
                                        self.fill(index * chunk_size, chunk);
                                        stats.busy += began.elapsed();
                                        stats.chunks += 1;
                                        stats.pixels += chunk.len();
                                    }
                                    None => {
                                        break;
                                    }
                                }
                            }
                            trace!("worker {} done: {:?}", worker, stats);
                            stats
                        })
                    })
                    .collect();

                handles
                    .into_iter()
                    .enumerate()
                    .map(|(worker, handle)| {
                        handle
                            .join()
                            .map_err(|_| RenderError::WorkerPanicked(worker))
                    })
                    .collect::<Result<Vec<WorkerStats>, RenderError>>()
            })
        };

        let workers = match results {
            Ok(workers) => workers?,
            Err(_) => return Err(RenderError::PoolFailed),
        };

        let stats = RenderStats {
            workers,
            elapsed: start.elapsed(),
        };
        debug!(
            "rendered {} pixels on {} workers in {:.3}s",
            stats.pixels(),
            threads,
            as_secs(stats.elapsed)
        );
        Ok((image, stats))
    }
}
