// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Nearest-neighbor scaling, so a small automaton grid can be written
//! out as a viewable image: every cell becomes a `factor` by `factor`
//! block of identical pixels.

use crate::errors::{AutomataError, Result};
use crate::pixels::PixelBuffer;
use itertools::iproduct;

fn check_factor(factor: usize) -> Result<()> {
    if factor == 0 {
        return Err(AutomataError::invalid("scale factor must be at least 1"));
    }
    Ok(())
}

/// Writes `src` scaled by `factor` into `dst`, which must already be
/// exactly `factor` times larger on both axes.
pub fn upsample_into(src: &PixelBuffer, dst: &mut PixelBuffer, factor: usize) -> Result<()> {
    check_factor(factor)?;
    if dst.width() != src.width() * factor || dst.height() != src.height() * factor {
        return Err(AutomataError::invalid(format!(
            "a {}x{} buffer scaled by {} does not fit a {}x{} buffer",
            src.width(),
            src.height(),
            factor,
            dst.width(),
            dst.height()
        )));
    }
    for (row, col) in iproduct!(0..dst.height(), 0..dst.width()) {
        dst.set_direct(row, col, src.get(row / factor, col / factor))?;
    }
    Ok(())
}

/// Returns a new buffer holding `src` scaled by `factor`.
pub fn upsample(src: &PixelBuffer, factor: usize) -> Result<PixelBuffer> {
    check_factor(factor)?;
    let mut dst = PixelBuffer::new(src.width() * factor, src.height() * factor);
    upsample_into(src, &mut dst, factor)?;
    Ok(dst)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pixels::Color;

    #[test]
    fn factor_one_is_a_copy() {
        let mut src = PixelBuffer::new(3, 2);
        src.set_direct(1, 2, Color::WHITE).unwrap();
        let dst = upsample(&src, 1).unwrap();
        assert_eq!(dst.as_bytes(), src.as_bytes());
    }

    #[test]
    fn cells_become_blocks() {
        let mut src = PixelBuffer::new(2, 2);
        let red = Color::new(255, 0, 0, 255);
        src.set_direct(0, 1, red).unwrap();
        let dst = upsample(&src, 3).unwrap();
        assert_eq!((dst.width(), dst.height()), (6, 6));
        for (row, col) in iproduct!(0..6, 0..6) {
            let expected = if row < 3 && col >= 3 { red } else { Color::TRANSPARENT };
            assert_eq!(dst.get(row, col), expected);
        }
    }

    #[test]
    fn bad_shapes_are_rejected() {
        let src = PixelBuffer::new(2, 2);
        assert!(upsample(&src, 0).is_err());
        let mut dst = PixelBuffer::new(4, 5);
        assert!(upsample_into(&src, &mut dst, 2).is_err());
    }
}
