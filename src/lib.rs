#![deny(missing_docs)]
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Cellular automata and escape-time fractals on a shared pixel grid
//!
//! Everything here draws into a `PixelBuffer`, a flat RGBA grid in
//! which a cell is "live" when its alpha is nonzero.  Two very
//! different kinds of program share it.
//!
//! Cellular automata step a whole generation at a time.  Each cell
//! looks at its neighborhood in the *current* generation, decides its
//! fate, and stages the change; only when every cell has been decided
//! are the staged changes committed.  The two-dimensional engine
//! handles discrete birth/survive rules (Conway's Life and friends,
//! over five neighborhood shapes) and gradient rules, which sum the
//! intensity of the neighbors instead of counting them.  The
//! one-dimensional engine runs Wolfram's elementary rules, one row per
//! generation, top to bottom.
//!
//! The fractal evaluator iterates `z -> z^2 + c` for every pixel of a
//! window on the complex plane, shading each by how quickly it escapes
//! through a cyclic palette.  Rendering is split over a pool of scoped
//! threads, each owning an interleaved set of rows, and already-painted
//! pixels are skipped, so panning the view only recomputes the strip
//! that scrolled into sight.

extern crate crossbeam;
extern crate itertools;
extern crate num;

pub mod elementary;
pub mod errors;
pub mod fractal;
pub mod life;
pub mod neighborhood;
pub mod palette;
pub mod pixels;
pub mod planes;
pub mod render;
pub mod rules;
pub mod upsample;

pub use elementary::SeedRow;
pub use errors::{AutomataError, Result};
pub use fractal::{escape_value, FractalKind, Smoothing};
pub use life::RuleEngine;
pub use neighborhood::{Boundary, Neighborhood};
pub use palette::Palette;
pub use pixels::{CellChange, Color, PixelBuffer};
pub use planes::{Pixel, Viewport};
pub use render::{FractalEvaluator, FractalParams, RenderState};
pub use rules::{preset, presets, GradientRule, Preset, Rule, RowRule};
pub use upsample::{upsample, upsample_into};
