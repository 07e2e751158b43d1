// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The fractal evaluator: paints a PixelBuffer with an escape-time
//! fractal using a pool of scoped worker threads.
//!
//! Rows are dealt out round-robin, so worker `k` of `n` owns rows
//! `k, k + n, k + 2n, ...`; no two workers ever touch the same pixel
//! and the tile loop needs no locking.  Pixels that are already
//! painted are skipped, which is what makes a re-render after a pan
//! cheap: only the strip uncovered by the pan is computed.

extern crate crossbeam;

use crate::errors::{AutomataError, Result};
use crate::fractal::{normalize_iteration, Escaper, FractalKind, Smoothing};
use crate::palette::Palette;
use crate::pixels::{write_pixel, Color, PixelBuffer, RowBand};
use crate::planes::{Pixel, Viewport};
use crossbeam::thread::ScopedJoinHandle;
use log::{debug, trace, warn};
use num::Complex;

/// Everything besides the viewport that decides a pixel's color.
#[derive(Clone, Debug, PartialEq)]
pub struct FractalParams {
    /// Mandelbrot or Julia (with its seed).
    pub kind: FractalKind,
    /// How escape counts are refined.
    pub smoothing: Smoothing,
    /// The iteration cap.
    pub max_iter: u32,
    /// The color ramp escaped points are looked up in.
    pub palette: Palette,
    /// The color of points that never escape.
    pub inside: Color,
    /// The color of points within `min_distance` of the boundary, in
    /// `Distance` mode.
    pub boundary: Color,
    /// The distance-estimate threshold.
    pub min_distance: f64,
}

impl Default for FractalParams {
    fn default() -> FractalParams {
        FractalParams {
            kind: FractalKind::Mandelbrot,
            smoothing: Smoothing::Logarithmic,
            max_iter: 1000,
            palette: Palette::default(),
            inside: Color::BLACK,
            boundary: Color::WHITE,
            min_distance: 0.01,
        }
    }
}

impl FractalParams {
    /// The color a single escape result maps to.
    pub fn shade(&self, value: Option<f64>) -> Color {
        match value {
            None => self.inside,
            Some(d) if self.smoothing == Smoothing::Distance && d < self.min_distance => {
                self.boundary
            }
            Some(v) => self.palette.color_at(normalize_iteration(v)),
        }
    }
}

/// Where the evaluator is in its render cycle.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum RenderState {
    /// Parameters have changed (or nothing has been drawn yet) and the
    /// buffer needs a render.
    Idle,
    /// A render is running; parameters are locked.
    Computing,
    /// The buffer matches the current parameters.
    Ready,
}

/// Renders one band of interleaved rows.  Returns the number of pixels
/// painted.
pub fn render_tile(band: &mut RowBand, viewport: &Viewport, params: &FractalParams) -> Result<usize> {
    let escaper = Escaper::new(params.kind, params.smoothing, params.max_iter);
    let width = band.width();
    let mut painted = 0;
    for (y, row) in band.rows_mut() {
        if row.len() != width * 4 || y >= viewport.height() {
            return Err(AutomataError::Bounds {
                row: y,
                col: 0,
                width: viewport.width(),
                height: viewport.height(),
            });
        }
        for (x, px) in row.chunks_mut(4).enumerate() {
            if px[3] != 0 {
                continue;
            }
            let point = viewport.pixel_to_point(&Pixel(x, y));
            write_pixel(px, params.shade(escaper.escape(point)));
            painted += 1;
        }
    }
    trace!("tile {} painted {} pixels", band.offset(), painted);
    Ok(painted)
}

/// Folds the per-tile outcomes into a single result.
pub fn collect_tiles(outcomes: Vec<Result<usize>>) -> Result<usize> {
    let total = outcomes.len();
    let mut painted = 0;
    let mut failed = 0;
    for outcome in outcomes {
        match outcome {
            Ok(n) => painted += n,
            Err(e) => {
                warn!("render tile failed: {}", e);
                failed += 1;
            }
        }
    }
    if failed > 0 {
        return Err(AutomataError::RenderFailure { failed, total });
    }
    Ok(painted)
}

/// Owns the viewport and the render parameters for one fractal view,
/// and keeps track of whether the buffer is up to date with them.  The
/// buffer itself is owned by the caller and lent in for each call.
#[derive(Clone, Debug)]
pub struct FractalEvaluator {
    viewport: Viewport,
    params: FractalParams,
    state: RenderState,
}

impl FractalEvaluator {
    /// Constructor.  Starts `Idle`.
    pub fn new(viewport: Viewport, params: FractalParams) -> FractalEvaluator {
        FractalEvaluator {
            viewport,
            params,
            state: RenderState::Idle,
        }
    }

    /// The current window.
    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    /// The current parameters.
    pub fn params(&self) -> &FractalParams {
        &self.params
    }

    /// Where the render cycle stands.
    pub fn state(&self) -> RenderState {
        self.state
    }

    // `render()` holds `&mut self` for its whole run, so safe callers
    // never see `Computing` here; the check keeps the gate explicit.
    fn unlocked(&self) -> Result<()> {
        if self.state == RenderState::Computing {
            return Err(AutomataError::Busy);
        }
        Ok(())
    }

    fn check_buffer(&self, buffer: &PixelBuffer) -> Result<()> {
        if buffer.width() != self.viewport.width() || buffer.height() != self.viewport.height() {
            return Err(AutomataError::invalid(format!(
                "buffer is {}x{} but the viewport is {}x{}",
                buffer.width(),
                buffer.height(),
                self.viewport.width(),
                self.viewport.height()
            )));
        }
        Ok(())
    }

    /// Swaps in new parameters.  Every existing pixel is stale, so the
    /// buffer is cleared.
    pub fn configure(&mut self, buffer: &mut PixelBuffer, params: FractalParams) -> Result<()> {
        self.unlocked()?;
        self.check_buffer(buffer)?;
        self.params = params;
        buffer.clear();
        self.state = RenderState::Idle;
        Ok(())
    }

    /// Drags the view `dx` pixels right and `dy` pixels down.  Pixels
    /// already rendered slide with it; only the uncovered strip needs
    /// computing on the next render.
    pub fn pan(&mut self, buffer: &mut PixelBuffer, dx: i64, dy: i64) -> Result<()> {
        self.unlocked()?;
        self.check_buffer(buffer)?;
        self.viewport.pan(dx, dy);
        buffer.translate(dx, dy);
        self.state = RenderState::Idle;
        Ok(())
    }

    /// Zooms around the point under `(x, y)`.  Every pixel's mapping
    /// changes, so the buffer is cleared.
    pub fn zoom_toward(&mut self, buffer: &mut PixelBuffer, x: usize, y: usize, factor: f64) -> Result<()> {
        self.unlocked()?;
        self.check_buffer(buffer)?;
        self.viewport.zoom_toward(&Pixel(x, y), factor)?;
        buffer.clear();
        self.state = RenderState::Idle;
        Ok(())
    }

    /// The escape value at an arbitrary complex point under the current
    /// parameters.  For debugging.
    pub fn escape_at(&self, point: Complex<f64>) -> Option<f64> {
        Escaper::new(self.params.kind, self.params.smoothing, self.params.max_iter).escape(point)
    }

    /// Fills every unpainted pixel of the buffer using `workers`
    /// threads.  Returns the number of pixels painted.  If any tile
    /// fails the whole render fails; the tiles that finished keep their
    /// pixels, and the state drops back to `Idle` so the frame is
    /// retried in full.
    pub fn render(&mut self, buffer: &mut PixelBuffer, workers: usize) -> Result<usize> {
        self.unlocked()?;
        self.check_buffer(buffer)?;
        if workers == 0 {
            return Err(AutomataError::invalid("worker count must be at least 1"));
        }

        self.state = RenderState::Computing;
        debug!(
            "rendering {}x{} with {} workers, {} smoothing, {} iterations",
            buffer.width(),
            buffer.height(),
            workers,
            self.params.smoothing,
            self.params.max_iter
        );

        let viewport = &self.viewport;
        let params = &self.params;
        let bands = buffer.bands_mut(workers);
        let outcome = crossbeam::scope(|spawner| {
            let handles: Vec<ScopedJoinHandle<Result<usize>>> = bands
                .into_iter()
                .map(|mut band| spawner.spawn(move |_| render_tile(&mut band, viewport, params)))
                .collect();
            handles
                .into_iter()
                .map(|handle| match handle.join() {
                    Ok(result) => result,
                    Err(_) => Err(AutomataError::invalid("render tile panicked")),
                })
                .collect::<Vec<Result<usize>>>()
        });

        let result = match outcome {
            Ok(outcomes) => collect_tiles(outcomes),
            Err(_) => Err(AutomataError::RenderFailure {
                failed: workers,
                total: workers,
            }),
        };
        self.state = match result {
            Ok(painted) => {
                debug!("render complete: {} pixels painted", painted);
                RenderState::Ready
            }
            Err(_) => RenderState::Idle,
        };
        result
    }
}
