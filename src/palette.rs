//! The colour lookup table.  Iteration counts are mapped through a
//! fixed set of Bernstein polynomials, one per channel, which keeps
//! quick escapes dark, swings through blue and green for the middling
//! ones, and runs to red near the cap.  The cap itself is black.

use errors::RenderError;
use num::clamp;

/// The largest value of a single channel.
pub const MAX_CHANNEL: u8 = 255;

/// One pixel's worth of colour.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Rgb {
    /// Red channel
    pub r: u8,
    /// Green channel
    pub g: u8,
    /// Blue channel
    pub b: u8,
}

impl Rgb {
    /// The colour of points presumed to be in the set.
    pub const BLACK: Rgb = Rgb { r: 0, g: 0, b: 0 };

    /// Builder.
    pub fn new(r: u8, g: u8, b: u8) -> Rgb {
        Rgb { r, g, b }
    }

    /// The channels in the order they're written to disk.
    pub fn channels(&self) -> [u8; 3] {
        [self.r, self.g, self.b]
    }
}

// Scales a polynomial in [0, 1] to a channel, rounding to nearest.
fn channel(v: f64) -> u8 {
    clamp((v * f64::from(MAX_CHANNEL)).round(), 0.0, f64::from(MAX_CHANNEL)) as u8
}

/// A table with one colour per possible iteration count, from zero
/// through the cap inclusive.  Built once before rendering and only
/// ever read afterwards, from any number of workers.
#[derive(Clone, Debug)]
pub struct Palette {
    colors: Vec<Rgb>,
}

impl Palette {
    /// Builds the table for a given iteration cap.  Entry
    /// `max_iterations` is black.
    pub fn new(max_iterations: usize) -> Result<Palette, RenderError> {
        if max_iterations == 0 {
            return Err(RenderError::InvalidIterations);
        }
        let count = max_iterations
            .checked_add(1)
            .ok_or(RenderError::InvalidIterations)?;
        let mut colors = Vec::new();
        colors
            .try_reserve_exact(count)
            .map_err(|_| RenderError::Allocation {
                what: "palette",
                count,
            })?;

        let max = max_iterations as f64;
        colors.extend((0..max_iterations).map(|i| {
            let t = (i as f64) / max;
            let u = 1.0 - t;
            Rgb::new(
                channel(9.0 * u * t * t * t),
                channel(15.0 * u * u * t * t),
                channel(8.5 * u * u * u * t),
            )
        }));
        colors.push(Rgb::BLACK);
        Ok(Palette { colors })
    }

    /// The iteration cap this table was built for.
    pub fn max_iterations(&self) -> usize {
        self.colors.len() - 1
    }

    /// The colour for an iteration count.  Counts past the cap get the
    /// cap's colour.
    #[inline]
    pub fn color(&self, iterations: usize) -> Rgb {
        let last = self.colors.len() - 1;
        self.colors[if iterations < last { iterations } else { last }]
    }
}
