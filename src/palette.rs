// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! A cyclic color ramp.  Two to four keyframes are spaced evenly around
//! a closed loop of `steps` entries, each arc a linear blend from one
//! keyframe to the next, the last arc blending back to the first.
//! Lookups take a continuous index, wrap it around the loop, and blend
//! between the two nearest entries.

use crate::errors::{AutomataError, Result};
use crate::pixels::Color;

/// Fewest keyframes a ramp may have.
pub const MIN_KEYFRAMES: usize = 2;
/// Most keyframes a ramp may have.
pub const MAX_KEYFRAMES: usize = 4;

/// A lookup table of colors built from a handful of keyframes.
#[derive(Clone, Debug, PartialEq)]
pub struct Palette {
    keyframes: Vec<Color>,
    ramp: Vec<Color>,
}

/// Rounds `steps` down to a multiple of `keyframes`, but never below
/// one step per keyframe.
pub fn reconcile_steps(steps: usize, keyframes: usize) -> usize {
    (steps - steps % keyframes).max(keyframes)
}

fn check_keyframes(keyframes: &[Color]) -> Result<()> {
    if keyframes.len() < MIN_KEYFRAMES || keyframes.len() > MAX_KEYFRAMES {
        return Err(AutomataError::invalid(format!(
            "a palette needs {} to {} colors, got {}",
            MIN_KEYFRAMES,
            MAX_KEYFRAMES,
            keyframes.len()
        )));
    }
    Ok(())
}

fn build_ramp(keyframes: &[Color], steps: usize) -> Vec<Color> {
    let n = keyframes.len();
    let arc = steps / n;
    (0..steps)
        .map(|i| {
            let k = i / arc;
            let t = (i % arc) as f64 / arc as f64;
            keyframes[k].lerp(keyframes[(k + 1) % n], t)
        })
        .collect()
}

impl Palette {
    /// Builds a ramp of (roughly) `steps` entries.  See
    /// `reconcile_steps()` for the exact length.
    pub fn new(keyframes: Vec<Color>, steps: usize) -> Result<Palette> {
        check_keyframes(&keyframes)?;
        let ramp = build_ramp(&keyframes, reconcile_steps(steps, keyframes.len()));
        Ok(Palette { keyframes, ramp })
    }

    /// The length of the ramp.
    pub fn steps(&self) -> usize {
        self.ramp.len()
    }

    /// The keyframes the ramp was built from.
    pub fn keyframes(&self) -> &[Color] {
        &self.keyframes
    }

    /// The ramp itself.
    pub fn ramp(&self) -> &[Color] {
        &self.ramp
    }

    /// Looks up a continuous index, wrapping around the loop.  Negative
    /// indices wrap too.
    pub fn color_at(&self, index: f64) -> Color {
        let steps = self.ramp.len();
        if !index.is_finite() {
            return self.ramp[0];
        }
        let m = index.rem_euclid(steps as f64);
        let base = (m.floor() as usize).min(steps - 1);
        let frac = m - base as f64;
        self.ramp[base].lerp(self.ramp[(base + 1) % steps], frac)
    }

    /// Rebuilds the ramp with a new length.
    pub fn resize(&mut self, steps: usize) {
        self.ramp = build_ramp(&self.keyframes, reconcile_steps(steps, self.keyframes.len()));
    }

    /// Rebuilds the ramp from new keyframes, keeping the requested
    /// length as close as the new keyframe count allows.
    pub fn update_colors(&mut self, keyframes: Vec<Color>) -> Result<()> {
        check_keyframes(&keyframes)?;
        let steps = reconcile_steps(self.ramp.len(), keyframes.len());
        self.ramp = build_ramp(&keyframes, steps);
        self.keyframes = keyframes;
        Ok(())
    }
}

impl Default for Palette {
    /// Black to white and back over 100 steps.
    fn default() -> Palette {
        let keyframes = vec![Color::BLACK, Color::WHITE];
        Palette {
            ramp: build_ramp(&keyframes, 100),
            keyframes,
        }
    }
}
