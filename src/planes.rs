//! Contains the Viewport and PlaneMapper structs.  The Viewport is a
//! square region of the complex plane described by a center and a
//! zoom radius; the PlaneMapper relates that region to a rectangle on
//! the integral plane with an origin at 0,0, one integral point per
//! pixel of the output image.
use errors::RenderError;
use num::Complex;

/// Describes the width and height of an integral plane that is assumed to start at
/// 0,0 and all values are assumed to be non-negative integers.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct IntegralPlane(pub usize, pub usize);

/// Describes the x, y of a pixel on the integral plane.  x runs left
/// to right, y runs top to bottom.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Pixel(pub usize, pub usize);

/// A square region of the complex plane, `radius` away from `center`
/// along both axes.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Viewport {
    center: Complex<f64>,
    radius: f64,
}

impl Viewport {
    /// A zero, negative, or non-finite radius would produce an empty or
    /// mirrored image, so those are refused outright.
    pub fn new(center: Complex<f64>, radius: f64) -> Result<Viewport, RenderError> {
        if !(radius.is_finite() && radius > 0.0) {
            return Err(RenderError::InvalidZoom(radius));
        }
        if !(center.re.is_finite() && center.im.is_finite()) {
            return Err(RenderError::InvalidCenter(center.re, center.im));
        }
        Ok(Viewport { center, radius })
    }

    /// The corner with the smallest real and imaginary parts.
    pub fn min_bounds(&self) -> Complex<f64> {
        Complex::new(self.center.re - self.radius, self.center.im - self.radius)
    }

    /// The corner with the largest real and imaginary parts.
    pub fn max_bounds(&self) -> Complex<f64> {
        Complex::new(self.center.re + self.radius, self.center.im + self.radius)
    }
}

/// Contains the definitions of two planes: an integral cartesian plane,
/// and the viewport on the complex plane.  Maps pixels from one to
/// points on the other.
#[derive(Debug)]
pub struct PlaneMapper {
    /// The right-lower hand corner of the integral cartesian plane.
    /// The left-upper is assumed to be at 0,0
    pub integral_plane: IntegralPlane,
    /// The region of the complex plane being rendered
    pub viewport: Viewport,
    // Where pixel 0,0 lands, cached from the viewport.
    origin: Complex<f64>,
    // The distance on the complex plane covered by one pixel step,
    // horizontally in the real part and vertically in the imaginary.
    scale: Complex<f64>,
}

impl PlaneMapper {
    /// Constructor.  Takes the size of the integral plane and the
    /// viewport it should cover.
    pub fn new(width: usize, height: usize, viewport: Viewport) -> Result<PlaneMapper, RenderError> {
        if width == 0 || height == 0 {
            return Err(RenderError::InvalidDimensions { width, height });
        }

        let min = viewport.min_bounds();
        let max = viewport.max_bounds();

        // Each axis is scaled by its own extent, so non-square images
        // keep the viewport's aspect.
        let scale = Complex::new(
            (max.re - min.re) / (width as f64),
            (max.im - min.im) / (height as f64),
        );

        Ok(PlaneMapper {
            integral_plane: IntegralPlane(width, height),
            viewport,
            origin: min,
            scale,
        })
    }

    /// Width of the integral plane.
    pub fn width(&self) -> usize {
        self.integral_plane.0
    }

    /// Height of the integral plane.
    pub fn height(&self) -> usize {
        self.integral_plane.1
    }

    /// The total number of points in the integral grid.  Used to
    /// size the work queue.
    pub fn pixel_count(&self) -> usize {
        self.integral_plane.0 * self.integral_plane.1
    }

    /// The per-axis distance on the complex plane of one pixel step.
    pub fn scale(&self) -> Complex<f64> {
        self.scale
    }

    /// Given a pixel on the integral cartesian plane, return the point
    /// on the complex plane it samples.
    #[inline]
    pub fn pixel_to_point(&self, pixel: &Pixel) -> Complex<f64> {
        Complex::new(
            self.origin.re + (pixel.0 as f64) * self.scale.re,
            self.origin.im + (pixel.1 as f64) * self.scale.im,
        )
    }

    /// The row-major offset of a pixel in an image buffer.
    #[inline]
    pub fn offset(&self, pixel: &Pixel) -> usize {
        pixel.1 * self.integral_plane.0 + pixel.0
    }

    /// The pixel that owns a given offset in an image buffer.
    #[inline]
    pub fn pixel_at(&self, offset: usize) -> Pixel {
        Pixel(offset % self.integral_plane.0, offset / self.integral_plane.0)
    }
}
