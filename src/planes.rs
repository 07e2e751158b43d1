// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Contains the Viewport struct, which describes a relationship
//! between a rectangle on the integral plane with an origin at 0,0
//! (the image), and a window on the complex plane bounded by
//! `xmin..xmax` on the real axis and `ymin..ymax` on the imaginary
//! axis.  Row 0 of the image maps to `ymin`.
//!
//! The window only ever moves by panning or zooming; the fractal
//! evaluator reads it but never changes it.
use crate::errors::{AutomataError, Result};
use num::Complex;

/// Describes the x, y of a point on the image.  Yes, x is the column.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Pixel(pub usize, pub usize);

// We don't need a Point, as a single Complex number is a Point.

/// The image size plus the complex-plane window it looks at.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Viewport {
    width: usize,
    height: usize,
    xmin: f64,
    xmax: f64,
    ymin: f64,
    ymax: f64,
}

impl Viewport {
    /// Constructor.  The window must have positive width and height.
    pub fn new(
        width: usize,
        height: usize,
        (xmin, xmax): (f64, f64),
        (ymin, ymax): (f64, f64),
    ) -> Result<Viewport> {
        if !(xmin < xmax) {
            return Err(AutomataError::invalid(
                "xmin is not to the left of xmax".to_string(),
            ));
        }
        if !(ymin < ymax) {
            return Err(AutomataError::invalid(
                "ymin is not below ymax".to_string(),
            ));
        }
        if width == 0 || height == 0 {
            return Err(AutomataError::invalid("the image has no pixels".to_string()));
        }
        Ok(Viewport {
            width,
            height,
            xmin,
            xmax,
            ymin,
            ymax,
        })
    }

    /// The classic starting view: x in [-2, 2], y in [-1, 1].
    pub fn default_for(width: usize, height: usize) -> Result<Viewport> {
        Viewport::new(width, height, (-2.0, 2.0), (-1.0, 1.0))
    }

    /// Width of the image in pixels.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Height of the image in pixels.
    pub fn height(&self) -> usize {
        self.height
    }

    /// The window as `(xmin, xmax, ymin, ymax)`.
    pub fn bounds(&self) -> (f64, f64, f64, f64) {
        (self.xmin, self.xmax, self.ymin, self.ymax)
    }

    /// How much of the complex plane one pixel covers, horizontally and
    /// vertically.
    pub fn pixel_size(&self) -> (f64, f64) {
        (
            (self.xmax - self.xmin) / self.width as f64,
            (self.ymax - self.ymin) / self.height as f64,
        )
    }

    /// Given a pixel on the image, map it to the matching point on the
    /// complex plane.
    #[inline]
    pub fn pixel_to_point(&self, pixel: &Pixel) -> Complex<f64> {
        let (dx, dy) = self.pixel_size();
        Complex::new(
            self.xmin + dx * pixel.0 as f64,
            self.ymin + dy * pixel.1 as f64,
        )
    }

    /// Given a point on the complex plane, map it as closely as
    /// possible to a pixel on the image.  Points left of or above the
    /// window land on column or row 0.
    pub fn point_to_pixel(&self, point: &Complex<f64>) -> Pixel {
        let left = (point.re - self.xmin) * self.width as f64 / (self.xmax - self.xmin);
        let top = (point.im - self.ymin) * self.height as f64 / (self.ymax - self.ymin);
        Pixel(left as usize, top as usize)
    }

    /// Slides the window so the image content moves `dx` pixels right
    /// and `dy` pixels down.
    pub fn pan(&mut self, dx: i64, dy: i64) {
        let (sx, sy) = self.pixel_size();
        let (cx, cy) = (dx as f64 * sx, dy as f64 * sy);
        self.xmin -= cx;
        self.xmax -= cx;
        self.ymin -= cy;
        self.ymax -= cy;
    }

    /// Rescales the window around the point under `pixel`, which stays
    /// put.  A factor of 2 halves the span (zoom in); 0.5 doubles it.
    pub fn zoom_toward(&mut self, pixel: &Pixel, factor: f64) -> Result<()> {
        if !(factor > 0.0) || !factor.is_finite() {
            return Err(AutomataError::invalid(format!(
                "zoom factor {} must be positive and finite",
                factor
            )));
        }
        let c = self.pixel_to_point(pixel);
        self.xmin = c.re - (c.re - self.xmin) / factor;
        self.xmax = c.re + (self.xmax - c.re) / factor;
        self.ymin = c.im - (c.im - self.ymin) / factor;
        self.ymax = c.im + (self.ymax - c.im) / factor;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(n: usize, lo: f64, hi: f64) -> Viewport {
        Viewport::new(n, n, (lo, hi), (lo, hi)).unwrap()
    }

    #[test]
    fn viewport_fails_on_bad_shape() {
        assert!(Viewport::new(4, 4, (1.0, -1.0), (-1.0, 1.0)).is_err());
        assert!(Viewport::new(4, 4, (-1.0, 1.0), (1.0, 1.0)).is_err());
        assert!(Viewport::new(0, 4, (-1.0, 1.0), (-1.0, 1.0)).is_err());
    }

    #[test]
    fn viewport_passes_on_good_shape() {
        assert!(Viewport::new(4, 4, (-1.0, 1.0), (-1.0, 1.0)).is_ok());
    }

    #[test]
    fn point_to_pixel_on_positive_planes() {
        let vp = square(5, 0.0, 5.0);
        assert_eq!(vp.point_to_pixel(&Complex::new(0.0, 0.0)), Pixel(0, 0));
        assert_eq!(vp.point_to_pixel(&Complex::new(2.0, 2.0)), Pixel(2, 2));
        assert_eq!(vp.point_to_pixel(&Complex::new(4.0, 4.0)), Pixel(4, 4));
    }

    #[test]
    fn point_to_pixel_on_mixed_planes() {
        let vp = square(640, -2.0, 2.0);
        assert_eq!(vp.point_to_pixel(&Complex::new(0.0, 0.0)), Pixel(320, 320));
        assert_eq!(vp.point_to_pixel(&Complex::new(-2.0, -2.0)), Pixel(0, 0));
        assert_eq!(vp.point_to_pixel(&Complex::new(1.0, 2.0)), Pixel(480, 640));
    }

    #[test]
    fn pixel_to_points_on_mixed_planes() {
        let vp = square(4, -2.0, 2.0);
        assert_eq!(vp.pixel_to_point(&Pixel(2, 2)), Complex::new(0.0, 0.0));
        assert_eq!(vp.pixel_to_point(&Pixel(0, 0)), Complex::new(-2.0, -2.0));
        assert_eq!(vp.pixel_to_point(&Pixel(4, 4)), Complex::new(2.0, 2.0));
    }

    #[test]
    fn pan_keeps_content_under_the_pixel() {
        let mut vp = square(8, -4.0, 4.0);
        let before = vp.pixel_to_point(&Pixel(2, 3));
        vp.pan(3, -1);
        // What was at (2, 3) is now drawn at (5, 2).
        assert_eq!(vp.pixel_to_point(&Pixel(5, 2)), before);
        assert_eq!(vp.pixel_size(), (1.0, 1.0));
    }

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-12
    }

    #[test]
    fn zoom_is_anchored_at_the_cursor() {
        let mut vp = Viewport::default_for(1000, 500).unwrap();
        let anchor = Pixel(250, 100);
        let before = vp.pixel_to_point(&anchor);
        vp.zoom_toward(&anchor, 2.0).unwrap();
        let after = vp.pixel_to_point(&anchor);
        assert!(close(after.re, before.re) && close(after.im, before.im));
        let (xmin, xmax, ymin, ymax) = vp.bounds();
        assert!(close(xmax - xmin, 2.0) && close(ymax - ymin, 1.0));
        vp.zoom_toward(&anchor, 0.5).unwrap();
        let (xmin, xmax, ymin, ymax) = vp.bounds();
        assert!(close(xmin, -2.0) && close(xmax, 2.0));
        assert!(close(ymin, -1.0) && close(ymax, 1.0));
        assert!(vp.zoom_toward(&anchor, 0.0).is_err());
        assert!(vp.zoom_toward(&anchor, std::f64::NAN).is_err());
    }
}
