// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Rule values for the automata.  Rules are swapped wholesale between
//! generations and never mutated while a step is running.

use crate::errors::{AutomataError, Result};
use crate::neighborhood::{Metric, Neighborhood};
use std::collections::BTreeSet;

/// A discrete birth/survive rule over live-neighbor counts.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Rule {
    birth: BTreeSet<u32>,
    survive: BTreeSet<u32>,
}

impl Rule {
    /// Builds a rule from the two count lists.  Duplicates collapse.
    pub fn new(birth: &[u32], survive: &[u32]) -> Rule {
        Rule {
            birth: birth.iter().cloned().collect(),
            survive: survive.iter().cloned().collect(),
        }
    }

    /// Conway's Game of Life, B3/S23.
    pub fn conway() -> Rule {
        Rule::new(&[3], &[2, 3])
    }

    /// A dead cell with this many live neighbors is born.
    pub fn born(&self, count: u32) -> bool {
        self.birth.contains(&count)
    }

    /// A live cell with this many live neighbors stays alive.
    pub fn survives(&self, count: u32) -> bool {
        self.survive.contains(&count)
    }

    /// The birth counts, ascending.
    pub fn birth(&self) -> &BTreeSet<u32> {
        &self.birth
    }

    /// The survive counts, ascending.
    pub fn survive(&self) -> &BTreeSet<u32> {
        &self.survive
    }

    /// Verifies every count is reachable in `neighborhood`.
    pub fn validate(&self, neighborhood: Neighborhood) -> Result<()> {
        let max = neighborhood.max_count();
        match self.birth.iter().chain(self.survive.iter()).find(|&&n| n > max) {
            Some(n) => Err(AutomataError::invalid(format!(
                "count {} exceeds the {} maximum of {}",
                n, neighborhood, max
            ))),
            None => Ok(()),
        }
    }

    fn checked(count: u32, neighborhood: Neighborhood) -> Result<u32> {
        if count > neighborhood.max_count() {
            return Err(AutomataError::invalid(format!(
                "count {} exceeds the {} maximum of {}",
                count,
                neighborhood,
                neighborhood.max_count()
            )));
        }
        Ok(count)
    }

    /// Adds a birth count.
    pub fn add_birth(&mut self, count: u32, neighborhood: Neighborhood) -> Result<()> {
        self.birth.insert(Rule::checked(count, neighborhood)?);
        Ok(())
    }

    /// Removes a birth count; absent counts are ignored.
    pub fn remove_birth(&mut self, count: u32) {
        self.birth.remove(&count);
    }

    /// Adds a survive count.
    pub fn add_survive(&mut self, count: u32, neighborhood: Neighborhood) -> Result<()> {
        self.survive.insert(Rule::checked(count, neighborhood)?);
        Ok(())
    }

    /// Removes a survive count; absent counts are ignored.
    pub fn remove_survive(&mut self, count: u32) {
        self.survive.remove(&count);
    }
}

/// A continuous rule: closed intervals compared against the summed
/// intensity of the neighborhood.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct GradientRule {
    birth: (u32, u32),
    survive: (u32, u32),
}

impl GradientRule {
    /// Both intervals are inclusive and must satisfy `lo <= hi`.
    pub fn new(birth: (u32, u32), survive: (u32, u32)) -> Result<GradientRule> {
        for &(lo, hi) in &[birth, survive] {
            if lo > hi {
                return Err(AutomataError::invalid(format!(
                    "interval [{}, {}] is empty",
                    lo, hi
                )));
            }
        }
        Ok(GradientRule { birth, survive })
    }

    /// A dead cell with this intensity sum is born.
    pub fn born(&self, sum: u32) -> bool {
        self.birth.0 <= sum && sum <= self.birth.1
    }

    /// A live cell with this intensity sum stays alive.
    pub fn survives(&self, sum: u32) -> bool {
        self.survive.0 <= sum && sum <= self.survive.1
    }

    /// The birth interval.
    pub fn birth(&self) -> (u32, u32) {
        self.birth
    }

    /// The survive interval.
    pub fn survive(&self) -> (u32, u32) {
        self.survive
    }

    /// The range of sums that is meaningful for `neighborhood`.
    pub fn valid_range(neighborhood: Neighborhood) -> (u32, u32) {
        (0, neighborhood.max_metric(Metric::Intensity))
    }
}

impl Default for GradientRule {
    /// The flickering "fire" rule on a Moore-1 neighborhood.
    fn default() -> GradientRule {
        GradientRule {
            birth: (510, 765),
            survive: (255, 765),
        }
    }
}

/// An elementary (Wolfram) rule.  Bit `i` is the new cell value for
/// the neighbor triple `left * 4 + mid * 2 + right == i`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct RowRule(pub u8);

impl RowRule {
    /// The new cell value for a triple.
    #[inline]
    pub fn apply(self, left: bool, mid: bool, right: bool) -> bool {
        let i = (left as u8) << 2 | (mid as u8) << 1 | right as u8;
        self.0 >> i & 1 == 1
    }
}

impl Default for RowRule {
    fn default() -> RowRule {
        RowRule(30)
    }
}

/// A named, ready-to-run automaton configuration.
#[derive(Clone, Debug, PartialEq)]
pub struct Preset {
    /// Display name; also the lookup key.
    pub name: &'static str,
    /// The neighborhood the counts were written for.
    pub neighborhood: Neighborhood,
    /// The rule itself.
    pub rule: Rule,
}

fn span(lo: u32, hi: u32) -> Vec<u32> {
    (lo..=hi).collect()
}

/// Every named preset.
pub fn presets() -> Vec<Preset> {
    vec![
        Preset {
            name: "Conway's Game of Life",
            neighborhood: Neighborhood::Moore1,
            rule: Rule::conway(),
        },
        Preset {
            name: "Islands",
            neighborhood: Neighborhood::Moore1,
            rule: Rule::new(&[5, 6, 7, 8], &[4, 5, 6, 7, 8]),
        },
        Preset {
            name: "Majority",
            neighborhood: Neighborhood::Moore2,
            rule: Rule::new(&span(13, 24), &span(12, 24)),
        },
        Preset {
            name: "Bugs",
            neighborhood: Neighborhood::Moore2,
            rule: Rule::new(&[7, 8, 9], &span(6, 11)),
        },
        Preset {
            name: "Coral",
            neighborhood: Neighborhood::Moore2,
            rule: Rule::new(&[10, 11], &span(6, 24)),
        },
        Preset {
            name: "Weighted Amoeba",
            neighborhood: Neighborhood::Weighted,
            rule: Rule::new(&[5, 6], &span(4, 9)),
        },
        Preset {
            name: "Weighted Maze",
            neighborhood: Neighborhood::Weighted,
            rule: Rule::new(&[4], &span(3, 8)),
        },
    ]
}

/// Looks a preset up by name, ignoring case.
pub fn preset(name: &str) -> Result<Preset> {
    presets()
        .into_iter()
        .find(|p| p.name.eq_ignore_ascii_case(name))
        .ok_or_else(|| AutomataError::invalid(format!("no preset named '{}'", name)))
}
