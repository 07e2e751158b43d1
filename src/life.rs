// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The two-dimensional rule engine.
//!
//! Every step measures each cell's neighborhood against the current
//! generation, decides whether it lives, and stages the result.  Only
//! after every cell has been decided are the staged changes committed,
//! so a cell visited late in the pass never sees a neighbor's new
//! value.

extern crate crossbeam;

use crate::errors::{AutomataError, Result};
use crate::neighborhood::{Boundary, Metric, Neighborhood};
use crate::pixels::{CellChange, Color, PixelBuffer};
use crate::rules::{GradientRule, Rule};
use crossbeam::thread::ScopedJoinHandle;
use itertools::iproduct;
use log::{debug, warn};
use rand::Rng;

/// Steps 2-D automata over a fixed neighborhood and boundary policy.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct RuleEngine {
    neighborhood: Neighborhood,
    boundary: Boundary,
}

impl RuleEngine {
    /// Constructor.
    pub fn new(neighborhood: Neighborhood, boundary: Boundary) -> RuleEngine {
        RuleEngine {
            neighborhood,
            boundary,
        }
    }

    /// The neighborhood shape.
    pub fn neighborhood(&self) -> Neighborhood {
        self.neighborhood
    }

    /// The boundary policy.
    pub fn boundary(&self) -> Boundary {
        self.boundary
    }

    /// Number of live neighbors around a cell.
    pub fn count_neighbors(&self, buffer: &PixelBuffer, row: usize, col: usize) -> u32 {
        self.neighborhood
            .measure(buffer, row, col, self.boundary, Metric::Count)
    }

    /// Summed intensity of the neighbors around a cell.
    pub fn sum_neighbors(&self, buffer: &PixelBuffer, row: usize, col: usize) -> u32 {
        self.neighborhood
            .measure(buffer, row, col, self.boundary, Metric::Intensity)
    }

    /// Decides the next value of every cell in `rows`, returning only
    /// the cells that change.  Reads the buffer, never writes it.
    fn decide<I, B, S, F>(
        &self,
        buffer: &PixelBuffer,
        rows: I,
        metric: Metric,
        born: B,
        survives: S,
        mut birth_color: F,
    ) -> Vec<CellChange>
    where
        I: Iterator<Item = usize>,
        B: Fn(u32) -> bool,
        S: Fn(u32) -> bool,
        F: FnMut() -> Color,
    {
        let offsets = self.neighborhood.offsets();
        let mut changes = vec![];
        for row in rows {
            for col in 0..buffer.width() {
                let n = self
                    .neighborhood
                    .measure_with(&offsets, buffer, row, col, self.boundary, metric);
                let color = if buffer.is_live(row, col) {
                    if survives(n) {
                        continue;
                    }
                    Color::TRANSPARENT
                } else {
                    if !born(n) {
                        continue;
                    }
                    birth_color()
                };
                changes.push(CellChange { row, col, color });
            }
        }
        changes
    }

    fn apply(buffer: &mut PixelBuffer, changes: Vec<CellChange>) -> Result<()> {
        for change in changes {
            buffer.stage(change.row, change.col, change.color)?;
        }
        buffer.commit();
        Ok(())
    }

    /// Advances a discrete automaton one generation.  Births are white;
    /// survivors keep their color.
    pub fn step(&self, buffer: &mut PixelBuffer, rule: &Rule) -> Result<()> {
        rule.validate(self.neighborhood)?;
        let changes = self.decide(
            buffer,
            0..buffer.height(),
            Metric::Count,
            |n| rule.born(n),
            |n| rule.survives(n),
            || Color::WHITE,
        );
        debug!("generation step: {} cells changed", changes.len());
        RuleEngine::apply(buffer, changes)
    }

    /// Advances a gradient automaton one generation.  Every birth gets
    /// a fresh random grey.
    pub fn step_gradient<R: Rng + ?Sized>(
        &self,
        buffer: &mut PixelBuffer,
        rule: &GradientRule,
        rng: &mut R,
    ) -> Result<()> {
        let changes = self.decide(
            buffer,
            0..buffer.height(),
            Metric::Intensity,
            |n| rule.born(n),
            |n| rule.survives(n),
            || Color::gray(rng.gen()),
        );
        debug!("gradient step: {} cells changed", changes.len());
        RuleEngine::apply(buffer, changes)
    }

    /// As `step()`, with the decisions spread across `threads` workers
    /// over interleaved rows.  Workers only read the current
    /// generation; the staging and commit happen here once they have
    /// all finished.
    pub fn step_threaded(&self, buffer: &mut PixelBuffer, rule: &Rule, threads: usize) -> Result<()> {
        if threads == 0 {
            return Err(AutomataError::invalid("thread count must be at least 1"));
        }
        rule.validate(self.neighborhood)?;
        let height = buffer.height();
        let snapshot: &PixelBuffer = &*buffer;
        let outcome = crossbeam::scope(|spawner| {
            let handles: Vec<ScopedJoinHandle<Vec<CellChange>>> = (0..threads)
                .map(|offset| {
                    spawner.spawn(move |_| {
                        self.decide(
                            snapshot,
                            (offset..height).step_by(threads),
                            Metric::Count,
                            |n| rule.born(n),
                            |n| rule.survives(n),
                            || Color::WHITE,
                        )
                    })
                })
                .collect();

            let mut changes = vec![];
            let mut failed = 0;
            for handle in handles {
                match handle.join() {
                    Ok(c) => changes.extend(c),
                    Err(_) => failed += 1,
                }
            }
            (changes, failed)
        });

        let (changes, failed) = match outcome {
            Ok(result) => result,
            Err(_) => (vec![], threads),
        };
        if failed > 0 {
            warn!("{} of {} generation workers failed", failed, threads);
            return Err(AutomataError::RenderFailure {
                failed,
                total: threads,
            });
        }
        debug!("threaded generation step: {} cells changed", changes.len());
        RuleEngine::apply(buffer, changes)
    }
}

/// Clears the buffer and brings each cell to life with probability
/// `density`.
pub fn seed_random<R: Rng + ?Sized>(buffer: &mut PixelBuffer, density: f64, rng: &mut R) -> Result<()> {
    if !(0.0..=1.0).contains(&density) {
        return Err(AutomataError::invalid(format!(
            "density {} is not within [0, 1]",
            density
        )));
    }
    buffer.clear();
    for (row, col) in iproduct!(0..buffer.height(), 0..buffer.width()) {
        if rng.gen_bool(density) {
            buffer.stage(row, col, Color::WHITE)?;
        }
    }
    buffer.commit();
    Ok(())
}

/// Fills every cell with an opaque random grey, the usual starting
/// point for gradient rules.
pub fn seed_gradient<R: Rng + ?Sized>(buffer: &mut PixelBuffer, rng: &mut R) -> Result<()> {
    buffer.clear();
    for (row, col) in iproduct!(0..buffer.height(), 0..buffer.width()) {
        buffer.stage(row, col, Color::gray(rng.gen()))?;
    }
    buffer.commit();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn grid(width: usize, height: usize, live: &[(usize, usize)]) -> PixelBuffer {
        let mut pb = PixelBuffer::new(width, height);
        for &(r, c) in live {
            pb.set_direct(r, c, Color::WHITE).unwrap();
        }
        pb
    }

    fn live_cells(pb: &PixelBuffer) -> Vec<(usize, usize)> {
        iproduct!(0..pb.height(), 0..pb.width())
            .filter(|&(r, c)| pb.is_live(r, c))
            .collect()
    }

    fn conway(boundary: Boundary) -> RuleEngine {
        RuleEngine::new(Neighborhood::Moore1, boundary)
    }

    #[test]
    fn block_is_a_still_life() {
        let block = [(3, 3), (3, 4), (4, 3), (4, 4)];
        let mut pb = grid(8, 8, &block);
        conway(Boundary::Clamp).step(&mut pb, &Rule::conway()).unwrap();
        assert_eq!(live_cells(&pb), block.to_vec());
    }

    #[test]
    fn blinker_oscillates() {
        let mut pb = grid(5, 5, &[(2, 1), (2, 2), (2, 3)]);
        let engine = conway(Boundary::Wrap);
        engine.step(&mut pb, &Rule::conway()).unwrap();
        assert_eq!(live_cells(&pb), vec![(1, 2), (2, 2), (3, 2)]);
        engine.step(&mut pb, &Rule::conway()).unwrap();
        assert_eq!(live_cells(&pb), vec![(2, 1), (2, 2), (2, 3)]);
    }

    #[test]
    fn glider_moves_one_cell_diagonally_every_four_steps() {
        let glider = [(0, 1), (1, 2), (2, 0), (2, 1), (2, 2)];
        let mut pb = grid(12, 12, &glider);
        let engine = conway(Boundary::Clamp);
        for _ in 0..4 {
            engine.step(&mut pb, &Rule::conway()).unwrap();
        }
        let shifted: Vec<(usize, usize)> = glider.iter().map(|&(r, c)| (r + 1, c + 1)).collect();
        assert_eq!(live_cells(&pb), shifted);
    }

    #[test]
    fn clamp_and_wrap_differ_at_the_edge() {
        // A blinker straddling the left edge only survives with wrap.
        let cells = [(2, 4), (2, 0), (2, 1)];
        let mut wrapped = grid(5, 5, &cells);
        let mut clamped = grid(5, 5, &cells);
        conway(Boundary::Wrap).step(&mut wrapped, &Rule::conway()).unwrap();
        conway(Boundary::Clamp).step(&mut clamped, &Rule::conway()).unwrap();
        assert_eq!(live_cells(&wrapped), vec![(1, 0), (2, 0), (3, 0)]);
        assert!(live_cells(&clamped).is_empty());
    }

    #[test]
    fn survivors_keep_their_color() {
        let teal = Color::new(0, 128, 128, 255);
        let mut pb = grid(6, 6, &[(2, 2), (2, 3), (3, 2)]);
        pb.set_direct(3, 3, teal).unwrap();
        conway(Boundary::Clamp).step(&mut pb, &Rule::conway()).unwrap();
        assert_eq!(pb.get(3, 3), teal);
    }

    #[test]
    fn dead_cells_are_cleared_completely() {
        let mut pb = grid(4, 4, &[(1, 1)]);
        conway(Boundary::Clamp).step(&mut pb, &Rule::conway()).unwrap();
        assert_eq!(pb.get(1, 1), Color::TRANSPARENT);
    }

    #[test]
    fn out_of_reach_rules_are_rejected() {
        let mut pb = grid(4, 4, &[]);
        let rule = Rule::new(&[9], &[]);
        assert!(conway(Boundary::Wrap).step(&mut pb, &rule).is_err());
    }

    #[test]
    fn threaded_matches_serial() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut serial = PixelBuffer::new(32, 24);
        seed_random(&mut serial, 0.35, &mut rng).unwrap();
        let mut threaded = serial.clone();
        let engine = RuleEngine::new(Neighborhood::Moore2, Boundary::Wrap);
        let rule = Rule::new(&[7, 8, 9], &(6..=11).collect::<Vec<u32>>());
        for _ in 0..5 {
            engine.step(&mut serial, &rule).unwrap();
            engine.step_threaded(&mut threaded, &rule, 3).unwrap();
        }
        assert_eq!(serial.as_bytes(), threaded.as_bytes());
    }

    #[test]
    fn gradient_births_are_grey_and_opaque() {
        let mut rng = StdRng::seed_from_u64(11);
        let mut pb = PixelBuffer::new(6, 6);
        seed_gradient(&mut pb, &mut rng).unwrap();
        let engine = RuleEngine::new(Neighborhood::Moore1, Boundary::Wrap);
        // Any dead cell is born; only a cell in total darkness survives.
        let flip = GradientRule::new((0, 255 * 8), (0, 0)).unwrap();
        engine.step_gradient(&mut pb, &flip, &mut rng).unwrap();
        engine.step_gradient(&mut pb, &flip, &mut rng).unwrap();
        for (r, c) in iproduct!(0..6, 0..6) {
            let px = pb.get(r, c);
            assert_eq!(px.a, 255);
            assert!(px.r == px.g && px.g == px.b);
        }
    }

    #[test]
    fn gradient_birth_uses_intensity_sum() {
        let mut pb = PixelBuffer::new(3, 3);
        pb.set_direct(0, 0, Color::gray(100)).unwrap();
        pb.set_direct(0, 2, Color::gray(100)).unwrap();
        let engine = RuleEngine::new(Neighborhood::Moore1, Boundary::Clamp);
        assert_eq!(engine.sum_neighbors(&pb, 1, 1), 200);
        let rule = GradientRule::new((200, 200), (1, 1)).unwrap();
        let mut rng = StdRng::seed_from_u64(3);
        engine.step_gradient(&mut pb, &rule, &mut rng).unwrap();
        assert!(pb.is_live(1, 1));
        // Clamped corners see no live neighbors, a sum of 0, and die.
        assert_eq!(engine.sum_neighbors(&PixelBuffer::new(3, 3), 0, 0), 0);
        assert!(!pb.is_live(0, 0) && !pb.is_live(0, 2));
    }

    #[test]
    fn seeding_checks_density() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut pb = PixelBuffer::new(4, 4);
        assert!(seed_random(&mut pb, 1.5, &mut rng).is_err());
        seed_random(&mut pb, 1.0, &mut rng).unwrap();
        assert_eq!(live_cells(&pb).len(), 16);
    }
}
