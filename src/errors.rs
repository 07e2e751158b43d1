// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The error taxonomy shared by every part of the renderer.  None of
//! these are fatal; the caller is expected to correct its parameters
//! and try again.

use failure::Fail;

/// Everything that can go wrong while mutating a buffer, building a
/// palette, stepping an automaton, or rendering a fractal.
#[derive(Debug, Clone, PartialEq, Fail)]
pub enum AutomataError {
    /// A coordinate fell outside the extent of the buffer.  Never
    /// silently clamped.
    #[fail(
        display = "cell ({}, {}) lies outside a {}x{} buffer",
        row, col, width, height
    )]
    Bounds {
        /// The offending row.
        row: usize,
        /// The offending column.
        col: usize,
        /// Width of the buffer that rejected the write.
        width: usize,
        /// Height of the buffer that rejected the write.
        height: usize,
    },

    /// A parameter was rejected before any work started.
    #[fail(display = "invalid argument: {}", _0)]
    InvalidArgument(String),

    /// One or more render tiles failed.  Tiles that succeeded have
    /// already written their pixels, so the frame should be retried
    /// as a whole.
    #[fail(display = "render failed: {} of {} tiles did not complete", failed, total)]
    RenderFailure {
        /// How many tiles failed.
        failed: usize,
        /// How many tiles were spawned.
        total: usize,
    },

    /// Parameters were changed while a render was in flight.  A
    /// render borrows its evaluator mutably until it returns, so this
    /// only surfaces if that borrow is bypassed.
    #[fail(display = "a render is in progress; parameters are locked")]
    Busy,
}

impl AutomataError {
    /// Shorthand for building an `InvalidArgument` from anything
    /// string-like.
    pub fn invalid<S: Into<String>>(msg: S) -> Self {
        AutomataError::InvalidArgument(msg.into())
    }
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, AutomataError>;
