// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Neighborhood shapes and the boundary policy used to resolve
//! neighbors that fall off the edge of the grid.

use crate::errors::{AutomataError, Result};
use crate::pixels::PixelBuffer;
use std::fmt;
use std::str::FromStr;

/// The fixed set of relative offsets examined around a cell.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Neighborhood {
    /// The eight surrounding cells.
    Moore1,
    /// The 5x5 square minus the center: 24 cells.
    Moore2,
    /// The four orthogonal neighbors.
    VonNeumann1,
    /// Manhattan distance two: 12 cells.
    VonNeumann2,
    /// The Moore-2 ring counted once plus the Moore-1 ring counted
    /// twice, the total halved.
    Weighted,
}

/// What happens to neighbors that fall off the grid.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Boundary {
    /// Toroidal: coordinates wrap around to the far side.  On a grid
    /// narrower than the neighborhood a cell can count itself.
    Wrap,
    /// Off-grid neighbors are dead and contribute nothing.
    Clamp,
}

/// Which quantity a rule measures across the neighborhood.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Metric {
    /// The number of live neighbors.
    Count,
    /// The sum of neighbor intensities, each 0-255.
    Intensity,
}

const MOORE1: [(i64, i64); 8] = [
    (-1, -1),
    (-1, 0),
    (-1, 1),
    (0, -1),
    (0, 1),
    (1, -1),
    (1, 0),
    (1, 1),
];

const MOORE2_RING: [(i64, i64); 16] = [
    (-2, -2),
    (-2, -1),
    (-2, 0),
    (-2, 1),
    (-2, 2),
    (-1, -2),
    (-1, 2),
    (0, -2),
    (0, 2),
    (1, -2),
    (1, 2),
    (2, -2),
    (2, -1),
    (2, 0),
    (2, 1),
    (2, 2),
];

const VON_NEUMANN1: [(i64, i64); 4] = [(-1, 0), (0, -1), (0, 1), (1, 0)];

const VON_NEUMANN2_RING: [(i64, i64); 8] = [
    (-2, 0),
    (-1, -1),
    (-1, 1),
    (0, -2),
    (0, 2),
    (1, -1),
    (1, 1),
    (2, 0),
];

impl Neighborhood {
    /// Every neighborhood, in menu order.
    pub const ALL: [Neighborhood; 5] = [
        Neighborhood::Moore1,
        Neighborhood::Moore2,
        Neighborhood::VonNeumann1,
        Neighborhood::VonNeumann2,
        Neighborhood::Weighted,
    ];

    /// The offsets and weights this shape examines, as
    /// `(drow, dcol, weight)`.
    pub fn offsets(self) -> Vec<(i64, i64, u32)> {
        let unit = |o: &(i64, i64)| (o.0, o.1, 1);
        match self {
            Neighborhood::Moore1 => MOORE1.iter().map(unit).collect(),
            Neighborhood::Moore2 => MOORE1.iter().chain(MOORE2_RING.iter()).map(unit).collect(),
            Neighborhood::VonNeumann1 => VON_NEUMANN1.iter().map(unit).collect(),
            Neighborhood::VonNeumann2 => VON_NEUMANN1
                .iter()
                .chain(VON_NEUMANN2_RING.iter())
                .map(unit)
                .collect(),
            Neighborhood::Weighted => MOORE1
                .iter()
                .map(|o| (o.0, o.1, 2))
                .chain(MOORE2_RING.iter().map(unit))
                .collect(),
        }
    }

    /// The nominal neighborhood size used to scale metric ranges.
    /// Equal to the number of cells examined, except for `Weighted`,
    /// which examines 24 cells but is sized at 16 after halving.
    pub fn size(self) -> u32 {
        match self {
            Neighborhood::Moore1 => 8,
            Neighborhood::Moore2 => 24,
            Neighborhood::VonNeumann1 => 4,
            Neighborhood::VonNeumann2 => 12,
            Neighborhood::Weighted => 16,
        }
    }

    /// The divisor applied to the weighted total.
    fn divisor(self) -> u32 {
        match self {
            Neighborhood::Weighted => 2,
            _ => 1,
        }
    }

    /// The largest value a live-neighbor count can take.
    pub fn max_count(self) -> u32 {
        let total: u32 = self.offsets().iter().map(|o| o.2).sum();
        total / self.divisor()
    }

    /// The largest value an intensity sum can take.
    pub fn max_intensity(self) -> u32 {
        255 * self.size()
    }

    /// The largest value `metric` can take in this neighborhood.
    pub fn max_metric(self, metric: Metric) -> u32 {
        match metric {
            Metric::Count => self.max_count(),
            Metric::Intensity => self.max_intensity(),
        }
    }

    /// Measures the neighborhood around `(row, col)`.  The buffer must
    /// not be empty.
    pub fn measure(
        self,
        buffer: &PixelBuffer,
        row: usize,
        col: usize,
        boundary: Boundary,
        metric: Metric,
    ) -> u32 {
        self.measure_with(&self.offsets(), buffer, row, col, boundary, metric)
    }

    /// As `measure()`, but with the offset table already built, so a
    /// full pass over the grid builds it once.
    pub(crate) fn measure_with(
        self,
        offsets: &[(i64, i64, u32)],
        buffer: &PixelBuffer,
        row: usize,
        col: usize,
        boundary: Boundary,
        metric: Metric,
    ) -> u32 {
        let total: u32 = offsets
            .iter()
            .filter_map(|&(dr, dc, weight)| {
                boundary
                    .resolve(buffer, row as i64 + dr, col as i64 + dc)
                    .map(|(r, c)| {
                        weight
                            * match metric {
                                Metric::Count => buffer.is_live(r, c) as u32,
                                Metric::Intensity => buffer.get(r, c).intensity(),
                            }
                    })
            })
            .sum();
        total / self.divisor()
    }
}

impl Boundary {
    /// Maps a possibly off-grid coordinate to a real cell, or `None`
    /// if the neighbor is absent.
    pub fn resolve(self, buffer: &PixelBuffer, row: i64, col: i64) -> Option<(usize, usize)> {
        let (h, w) = (buffer.height() as i64, buffer.width() as i64);
        if h == 0 || w == 0 {
            return None;
        }
        match self {
            Boundary::Wrap => Some((row.rem_euclid(h) as usize, col.rem_euclid(w) as usize)),
            Boundary::Clamp => {
                if row < 0 || row >= h || col < 0 || col >= w {
                    None
                } else {
                    Some((row as usize, col as usize))
                }
            }
        }
    }

    /// `true` selects `Wrap`.
    pub fn from_wrap(wrap: bool) -> Boundary {
        if wrap {
            Boundary::Wrap
        } else {
            Boundary::Clamp
        }
    }
}

impl FromStr for Neighborhood {
    type Err = AutomataError;

    fn from_str(s: &str) -> Result<Neighborhood> {
        match s.to_lowercase().replace(|c: char| c == '-' || c == '_' || c == ' ', "").as_str() {
            "moore1" | "moore" => Ok(Neighborhood::Moore1),
            "moore2" => Ok(Neighborhood::Moore2),
            "vonneumann1" | "vonneumann" => Ok(Neighborhood::VonNeumann1),
            "vonneumann2" => Ok(Neighborhood::VonNeumann2),
            "weighted" | "weighted16" => Ok(Neighborhood::Weighted),
            _ => Err(AutomataError::invalid(format!("unknown neighborhood '{}'", s))),
        }
    }
}

impl fmt::Display for Neighborhood {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            Neighborhood::Moore1 => "moore1",
            Neighborhood::Moore2 => "moore2",
            Neighborhood::VonNeumann1 => "vonneumann1",
            Neighborhood::VonNeumann2 => "vonneumann2",
            Neighborhood::Weighted => "weighted",
        };
        write!(f, "{}", name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pixels::Color;

    fn full(width: usize, height: usize) -> PixelBuffer {
        let mut pb = PixelBuffer::new(width, height);
        pb.fill(Color::WHITE);
        pb
    }

    #[test]
    fn shapes_have_documented_sizes() {
        for n in Neighborhood::ALL.iter() {
            if *n != Neighborhood::Weighted {
                assert_eq!(n.offsets().len() as u32, n.size());
            }
        }
        assert_eq!(Neighborhood::Weighted.offsets().len(), 24);
        assert_eq!(Neighborhood::Weighted.size(), 16);
        assert_eq!(Neighborhood::Weighted.max_intensity(), 255 * 16);
        assert_eq!(Neighborhood::Moore1.max_count(), 8);
        assert_eq!(Neighborhood::Moore2.max_count(), 24);
        assert_eq!(Neighborhood::VonNeumann1.max_count(), 4);
        assert_eq!(Neighborhood::VonNeumann2.max_count(), 12);
        // (8 * 2 + 16) / 2
        assert_eq!(Neighborhood::Weighted.max_count(), 16);
        assert_eq!(Neighborhood::Moore1.max_intensity(), 255 * 8);
    }

    #[test]
    fn no_offset_repeats() {
        for n in Neighborhood::ALL.iter() {
            let mut seen: Vec<(i64, i64)> = n.offsets().iter().map(|o| (o.0, o.1)).collect();
            seen.sort();
            seen.dedup();
            assert_eq!(seen.len(), n.offsets().len(), "{}", n);
            assert!(!seen.contains(&(0, 0)));
        }
    }

    #[test]
    fn full_grid_counts_every_neighbor_when_wrapping() {
        let pb = full(7, 7);
        for n in Neighborhood::ALL.iter() {
            assert_eq!(
                n.measure(&pb, 0, 0, Boundary::Wrap, Metric::Count),
                n.max_count()
            );
        }
    }

    #[test]
    fn clamp_drops_off_grid_neighbors() {
        let pb = full(7, 7);
        assert_eq!(
            Neighborhood::Moore1.measure(&pb, 0, 0, Boundary::Clamp, Metric::Count),
            3
        );
        assert_eq!(
            Neighborhood::Moore2.measure(&pb, 0, 0, Boundary::Clamp, Metric::Count),
            8
        );
        assert_eq!(
            Neighborhood::VonNeumann2.measure(&pb, 6, 6, Boundary::Clamp, Metric::Count),
            5
        );
    }

    #[test]
    fn wrapping_a_tiny_grid_counts_the_cell_itself() {
        let pb = full(1, 1);
        assert_eq!(Neighborhood::Moore1.measure(&pb, 0, 0, Boundary::Wrap, Metric::Count), 8);
        assert_eq!(Neighborhood::Moore1.measure(&pb, 0, 0, Boundary::Clamp, Metric::Count), 0);
    }

    #[test]
    fn wrap_and_clamp_agree_away_from_edges() {
        let mut pb = PixelBuffer::new(9, 9);
        for &(r, c) in &[(3, 3), (3, 4), (4, 5), (5, 3), (6, 6), (2, 4)] {
            pb.set_direct(r, c, Color::gray(200)).unwrap();
        }
        for n in Neighborhood::ALL.iter() {
            for metric in &[Metric::Count, Metric::Intensity] {
                for row in 2..7 {
                    for col in 2..7 {
                        assert_eq!(
                            n.measure(&pb, row, col, Boundary::Wrap, *metric),
                            n.measure(&pb, row, col, Boundary::Clamp, *metric)
                        );
                    }
                }
            }
        }
    }

    #[test]
    fn intensity_sums_channel_means() {
        let mut pb = PixelBuffer::new(3, 3);
        pb.set_direct(0, 0, Color::new(30, 60, 90, 255)).unwrap();
        pb.set_direct(0, 1, Color::gray(100)).unwrap();
        assert_eq!(
            Neighborhood::Moore1.measure(&pb, 1, 1, Boundary::Clamp, Metric::Intensity),
            160
        );
    }

    #[test]
    fn weighted_doubles_the_inner_ring() {
        let mut pb = PixelBuffer::new(5, 5);
        pb.set_direct(1, 1, Color::WHITE).unwrap();
        pb.set_direct(0, 0, Color::WHITE).unwrap();
        // (2 * 1 + 1) / 2
        assert_eq!(
            Neighborhood::Weighted.measure(&pb, 2, 2, Boundary::Clamp, Metric::Count),
            1
        );
        pb.set_direct(4, 4, Color::WHITE).unwrap();
        assert_eq!(
            Neighborhood::Weighted.measure(&pb, 2, 2, Boundary::Clamp, Metric::Count),
            2
        );
    }

    #[test]
    fn names_parse() {
        assert_eq!("Moore-2".parse::<Neighborhood>().unwrap(), Neighborhood::Moore2);
        assert_eq!(
            "von_neumann2".parse::<Neighborhood>().unwrap(),
            Neighborhood::VonNeumann2
        );
        assert!("hexagonal".parse::<Neighborhood>().is_err());
    }
}
