// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Elementary one-dimensional automata.  Row 0 is the seed; every row
//! after it is computed from the row above, so the finished buffer is
//! the automaton's whole history read top to bottom.

use crate::errors::Result;
use crate::neighborhood::Boundary;
use crate::pixels::{Color, PixelBuffer};
use crate::rules::RowRule;
use log::debug;
use rand::Rng;

/// How the first row is initialized.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SeedRow {
    /// A single live cell in the middle column.
    Center,
    /// Each cell independently live with probability one half.
    Random,
}

/// Clears the buffer and writes the seed row.
pub fn seed_row<R: Rng + ?Sized>(buffer: &mut PixelBuffer, seed: SeedRow, rng: &mut R) -> Result<()> {
    buffer.clear();
    if buffer.height() == 0 || buffer.width() == 0 {
        return Ok(());
    }
    match seed {
        SeedRow::Center => buffer.set_direct(0, buffer.width() / 2, Color::WHITE)?,
        SeedRow::Random => {
            for col in 0..buffer.width() {
                if rng.gen_bool(0.5) {
                    buffer.set_direct(0, col, Color::WHITE)?;
                }
            }
        }
    }
    Ok(())
}

fn parent(buffer: &PixelBuffer, row: usize, col: i64, boundary: Boundary) -> bool {
    match boundary.resolve(buffer, row as i64, col) {
        Some((r, c)) => buffer.is_live(r, c),
        None => false,
    }
}

/// Fills rows `1..height` from whatever is already in row 0.  Each row
/// depends only on the row above it, so cells are written directly.
pub fn run(buffer: &mut PixelBuffer, rule: RowRule, boundary: Boundary) -> Result<()> {
    for row in 1..buffer.height() {
        for col in 0..buffer.width() {
            let c = col as i64;
            let left = parent(buffer, row - 1, c - 1, boundary);
            let mid = parent(buffer, row - 1, c, boundary);
            let right = parent(buffer, row - 1, c + 1, boundary);
            let color = if rule.apply(left, mid, right) {
                Color::WHITE
            } else {
                Color::TRANSPARENT
            };
            buffer.set_direct(row, col, color)?;
        }
    }
    debug!("elementary rule {} ran over {} rows", rule.0, buffer.height());
    Ok(())
}

/// Seeds row 0 and runs the rule to the bottom of the buffer.
pub fn generate<R: Rng + ?Sized>(
    buffer: &mut PixelBuffer,
    rule: RowRule,
    boundary: Boundary,
    seed: SeedRow,
    rng: &mut R,
) -> Result<()> {
    seed_row(buffer, seed, rng)?;
    run(buffer, rule, boundary)
}
