// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Contains the PixelBuffer, a flat RGBA byte array addressed by row
//! and column, along with the Color it stores.
//!
//! A buffer supports two kinds of writes.  Direct writes land
//! immediately and are used when nothing will read the cell back
//! during the same pass (fractal pixels).  Staged writes are queued
//! and applied all at once by `commit()`, which is what gives the
//! automata their synchronous, whole-generation semantics: generation
//! N+1 is computed entirely from generation N.

use crate::errors::{AutomataError, Result};

/// Four independent 8-bit channels.  Copied by value everywhere.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Color {
    /// Red
    pub r: u8,
    /// Green
    pub g: u8,
    /// Blue
    pub b: u8,
    /// Alpha.  A nonzero alpha is what makes an automaton cell "live."
    pub a: u8,
}

impl Color {
    /// Fully transparent black; a dead cell.
    pub const TRANSPARENT: Color = Color::new(0, 0, 0, 0);
    /// Opaque black.
    pub const BLACK: Color = Color::new(0, 0, 0, 255);
    /// Opaque white; the color of a freshly born discrete cell.
    pub const WHITE: Color = Color::new(255, 255, 255, 255);

    /// Constructor.
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Color {
        Color { r, g, b, a }
    }

    /// An opaque grey of the given level.
    pub const fn gray(level: u8) -> Color {
        Color::new(level, level, level, 255)
    }

    /// The mean of the red, green, and blue channels, 0-255.  This is
    /// what a neighbor contributes to a gradient rule's metric.
    pub fn intensity(self) -> u32 {
        (u32::from(self.r) + u32::from(self.g) + u32::from(self.b)) / 3
    }

    /// Channel-wise linear blend.  `t == 0.0` returns `self` exactly,
    /// `t == 1.0` returns `other` exactly.
    pub fn lerp(self, other: Color, t: f64) -> Color {
        let mix = |a: u8, b: u8| -> u8 {
            let v = f64::from(a) + (f64::from(b) - f64::from(a)) * t;
            v.round().max(0.0).min(255.0) as u8
        };
        Color {
            r: mix(self.r, other.r),
            g: mix(self.g, other.g),
            b: mix(self.b, other.b),
            a: mix(self.a, other.a),
        }
    }

    /// Parses `RRGGBB` or `RRGGBBAA` hex.  Alpha defaults to opaque.
    pub fn from_hex(s: &str) -> Result<Color> {
        let s = s.trim_start_matches('#');
        let channel = |i: usize| -> Result<u8> {
            s.get(i..i + 2)
                .and_then(|h| u8::from_str_radix(h, 16).ok())
                .ok_or_else(|| AutomataError::invalid(format!("bad hex color '{}'", s)))
        };
        match s.len() {
            6 => Ok(Color::new(channel(0)?, channel(2)?, channel(4)?, 255)),
            8 => Ok(Color::new(channel(0)?, channel(2)?, channel(4)?, channel(6)?)),
            _ => Err(AutomataError::invalid(format!("bad hex color '{}'", s))),
        }
    }
}

/// A single queued write.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct CellChange {
    /// Target row
    pub row: usize,
    /// Target column
    pub col: usize,
    /// The value to write
    pub color: Color,
}

/// A width x height grid of RGBA pixels stored row-major, four bytes
/// per pixel, plus a list of pending changes.
#[derive(Clone, Debug)]
pub struct PixelBuffer {
    width: usize,
    height: usize,
    data: Vec<u8>,
    changes: Vec<CellChange>,
}

impl PixelBuffer {
    /// A fully transparent buffer.
    pub fn new(width: usize, height: usize) -> PixelBuffer {
        PixelBuffer {
            width,
            height,
            data: vec![0 as u8; width * height * 4],
            changes: vec![],
        }
    }

    /// Width in pixels.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Height in pixels.
    pub fn height(&self) -> usize {
        self.height
    }

    /// The raw RGBA bytes, suitable for uploading to a display surface.
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Consumes the buffer, handing back its bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }

    /// Number of writes waiting for `commit()`.
    pub fn pending(&self) -> usize {
        self.changes.len()
    }

    #[inline]
    fn offset(&self, row: usize, col: usize) -> usize {
        (row * self.width + col) * 4
    }

    /// Reports a `Bounds` error for any coordinate outside the buffer.
    pub fn check_bounds(&self, row: usize, col: usize) -> Result<()> {
        if row >= self.height || col >= self.width {
            return Err(AutomataError::Bounds {
                row,
                col,
                width: self.width,
                height: self.height,
            });
        }
        Ok(())
    }

    /// Reads a pixel.  The caller is responsible for bounds; an out of
    /// range coordinate is a programming error and panics.
    #[inline]
    pub fn get(&self, row: usize, col: usize) -> Color {
        debug_assert!(row < self.height && col < self.width);
        let i = self.offset(row, col);
        read_pixel(&self.data[i..i + 4])
    }

    /// True if the alpha channel of the pixel is nonzero.  Same
    /// contract as `get()`.
    #[inline]
    pub fn is_live(&self, row: usize, col: usize) -> bool {
        debug_assert!(row < self.height && col < self.width);
        self.data[self.offset(row, col) + 3] != 0
    }

    /// Writes a pixel immediately.
    pub fn set_direct(&mut self, row: usize, col: usize, color: Color) -> Result<()> {
        self.check_bounds(row, col)?;
        let i = self.offset(row, col);
        write_pixel(&mut self.data[i..i + 4], color);
        Ok(())
    }

    /// Queues a write for the next `commit()`.
    pub fn stage(&mut self, row: usize, col: usize, color: Color) -> Result<()> {
        self.check_bounds(row, col)?;
        self.changes.push(CellChange { row, col, color });
        Ok(())
    }

    /// Applies every queued write in the order it was staged, so the
    /// last write to a coordinate wins, then empties the queue.
    pub fn commit(&mut self) {
        let changes = std::mem::replace(&mut self.changes, vec![]);
        for change in &changes {
            let i = self.offset(change.row, change.col);
            write_pixel(&mut self.data[i..i + 4], change.color);
        }
    }

    /// Zeroes every pixel and drops any pending writes.
    pub fn clear(&mut self) {
        for b in self.data.iter_mut() {
            *b = 0;
        }
        self.changes.clear();
    }

    /// Paints every pixel with the same color.
    pub fn fill(&mut self, color: Color) {
        for px in self.data.chunks_mut(4) {
            write_pixel(px, color);
        }
    }

    /// Shifts the image `dx` columns right and `dy` rows down.  Pixels
    /// pushed off the edge are lost; uncovered pixels are zeroed.  The
    /// shift is rendered into a scratch buffer and swapped in, so
    /// overlapping source and destination never corrupt each other.
    pub fn translate(&mut self, dx: i64, dy: i64) {
        let (w, h) = (self.width as u64, self.height as u64);
        let mut scratch = vec![0 as u8; self.data.len()];
        if dx.unsigned_abs() < w && dy.unsigned_abs() < h {
            let (w, h) = (w as i64, h as i64);
            // Source columns that survive, and where they land.
            let src_col = (-dx).max(0) as usize;
            let dst_col = dx.max(0) as usize;
            let span = (w - dx.abs()) as usize * 4;
            for row in 0..h {
                let target = row + dy;
                if target < 0 || target >= h {
                    continue;
                }
                let src = self.offset(row as usize, src_col);
                let dst = self.offset(target as usize, dst_col);
                scratch[dst..dst + span].copy_from_slice(&self.data[src..src + span]);
            }
        }
        self.data = scratch;
    }

    /// Splits the buffer into `stride` bands of interleaved rows: band
    /// `k` owns rows `k, k + stride, k + 2 * stride, ...`.  The bands
    /// never overlap, so each can be handed to its own thread.
    pub fn bands_mut(&mut self, stride: usize) -> Vec<RowBand<'_>> {
        let width = self.width;
        let mut bands: Vec<RowBand> = (0..stride)
            .map(|offset| RowBand {
                offset,
                stride,
                width,
                rows: vec![],
            })
            .collect();
        if width == 0 || stride == 0 {
            return bands;
        }
        for (y, row) in self.data.chunks_mut(width * 4).enumerate() {
            bands[y % stride].rows.push(row);
        }
        bands
    }
}

/// A set of interleaved rows borrowed mutably from a PixelBuffer.
pub struct RowBand<'a> {
    offset: usize,
    stride: usize,
    width: usize,
    rows: Vec<&'a mut [u8]>,
}

impl<'a> RowBand<'a> {
    /// The first row this band owns.
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// The distance between consecutive rows in this band.
    pub fn stride(&self) -> usize {
        self.stride
    }

    /// Width of every row, in pixels.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Iterates over `(absolute row index, row bytes)`.
    pub fn rows_mut(&mut self) -> Box<dyn Iterator<Item = (usize, &mut [u8])> + '_> {
        let (offset, stride) = (self.offset, self.stride);
        Box::new(
            self.rows
                .iter_mut()
                .enumerate()
                .map(move |(k, row)| (offset + k * stride, &mut **row)),
        )
    }
}

#[inline]
pub(crate) fn read_pixel(px: &[u8]) -> Color {
    Color::new(px[0], px[1], px[2], px[3])
}

#[inline]
pub(crate) fn write_pixel(px: &mut [u8], color: Color) {
    px[0] = color.r;
    px[1] = color.g;
    px[2] = color.b;
    px[3] = color.a;
}
