//! Island generation and random land placement.
//!
//! The island is a `width x height` grid of land flags. It starts as random
//! noise, is smoothed by a cellular automaton, and is then trimmed to its
//! largest 4-connected landmass so every land tile can reach every other.
//!
//! # Smoothing rule
//!
//! For each cell, count land among its eight neighbours. Neighbours outside
//! the grid count *against* land (they subtract one), which pulls land away
//! from the edges and encourages a single central island.
//!
//! | Land neighbours | Next state |
//! |-----------------|------------|
//! | more than 4     | land       |
//! | fewer than 3    | water      |
//! | otherwise       | unchanged  |

use std::collections::{BTreeSet, VecDeque};

use castaway_types::Position;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::WorldError;

/// Cellular-automaton passes applied to the initial noise.
const SMOOTHING_PASSES: usize = 5;

/// Neighbour count above which a cell becomes land.
const BIRTH_THRESHOLD: i32 = 4;

/// Neighbour count below which a cell becomes water.
const DEATH_THRESHOLD: i32 = 3;

/// Land ratio increment used when a generation attempt produced no land.
const LAND_RATIO_STEP: f64 = 0.1;

/// Highest land ratio retried before falling back to a single tile.
const MAX_LAND_RATIO: f64 = 0.8;

/// The static traversability grid for one session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Island {
    /// Grid width in cells.
    width: u32,
    /// Grid height in cells.
    height: u32,
    /// Row-major land flags.
    land: Vec<bool>,
}

impl Island {
    /// Generate a new island.
    ///
    /// Each cell starts as land with probability `land_ratio`. If smoothing
    /// leaves no land at all, generation is retried with a higher ratio up
    /// to 0.8, and finally falls back to a single land tile at the centre.
    pub fn generate(
        width: u32,
        height: u32,
        land_ratio: f64,
        rng: &mut impl Rng,
    ) -> Result<Self, WorldError> {
        let cells = cell_count(width, height)
            .filter(|n| *n > 0)
            .ok_or(WorldError::EmptyMap { width, height })?;

        let mut ratio = land_ratio;
        loop {
            let mut island = Self {
                width,
                height,
                land: (0..cells).map(|_| rng.random::<f64>() < ratio).collect(),
            };
            for _ in 0..SMOOTHING_PASSES {
                island = island.smoothed();
            }
            if island.keep_largest_landmass() {
                debug!(
                    width,
                    height,
                    land_tiles = island.land_count(),
                    "island generated"
                );
                return Ok(island);
            }
            if ratio >= MAX_LAND_RATIO {
                debug!(width, height, "no landmass survived; using a single centre tile");
                return Ok(Self::single_tile(width, height, cells));
            }
            ratio += LAND_RATIO_STEP;
            debug!(ratio, "no landmass survived smoothing, retrying");
        }
    }

    /// An island where every cell is land.
    pub fn all_land(width: u32, height: u32) -> Result<Self, WorldError> {
        let cells = cell_count(width, height)
            .filter(|n| *n > 0)
            .ok_or(WorldError::EmptyMap { width, height })?;
        Ok(Self {
            width,
            height,
            land: vec![true; cells],
        })
    }

    fn single_tile(width: u32, height: u32, cells: usize) -> Self {
        let mut island = Self {
            width,
            height,
            land: vec![false; cells],
        };
        if let Some(cell) = island
            .index_of(Position::new(width / 2, height / 2))
            .and_then(|i| island.land.get_mut(i))
        {
            *cell = true;
        }
        island
    }

    /// Grid width in cells.
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Grid height in cells.
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Whether `position` is inside the grid and on land.
    pub fn is_land(&self, position: Position) -> bool {
        self.index_of(position)
            .and_then(|i| self.land.get(i))
            .copied()
            .unwrap_or(false)
    }

    /// Number of land tiles.
    pub fn land_count(&self) -> usize {
        self.land.iter().filter(|l| **l).count()
    }

    /// Every land tile in row-major order.
    pub fn land_tiles(&self) -> impl Iterator<Item = Position> + '_ {
        self.positions().filter(|p| self.is_land(*p))
    }

    /// The grid as rows of land flags, for presentation.
    pub fn rows(&self) -> Vec<Vec<bool>> {
        usize::try_from(self.width)
            .ok()
            .filter(|w| *w > 0)
            .map(|w| self.land.chunks(w).map(<[bool]>::to_vec).collect())
            .unwrap_or_default()
    }

    /// A uniformly random land tile not in `occupied`, or `None` when every
    /// land tile is taken.
    pub fn find_random_land_position(
        &self,
        occupied: &BTreeSet<Position>,
        rng: &mut impl Rng,
    ) -> Option<Position> {
        let available: Vec<Position> = self
            .land_tiles()
            .filter(|p| !occupied.contains(p))
            .collect();
        if available.is_empty() {
            return None;
        }
        let idx = rng.random_range(0..available.len());
        available.get(idx).copied()
    }

    // -------------------------------------------------------------------
    // Generation internals
    // -------------------------------------------------------------------

    fn index_of(&self, position: Position) -> Option<usize> {
        if position.x >= self.width || position.y >= self.height {
            return None;
        }
        let row = usize::try_from(position.y)
            .ok()?
            .checked_mul(usize::try_from(self.width).ok()?)?;
        row.checked_add(usize::try_from(position.x).ok()?)
    }

    fn positions(&self) -> impl Iterator<Item = Position> + '_ {
        (0..self.height).flat_map(move |y| (0..self.width).map(move |x| Position::new(x, y)))
    }

    fn land_neighbours(&self, position: Position) -> i32 {
        let mut count: i32 = 0;
        for dy in -1..=1_i32 {
            for dx in -1..=1_i32 {
                if dx == 0 && dy == 0 {
                    continue;
                }
                let neighbour = position
                    .x
                    .checked_add_signed(dx)
                    .zip(position.y.checked_add_signed(dy))
                    .and_then(|(x, y)| self.index_of(Position::new(x, y)));
                match neighbour {
                    Some(i) => {
                        if self.land.get(i).copied().unwrap_or(false) {
                            count = count.saturating_add(1);
                        }
                    }
                    None => count = count.saturating_sub(1),
                }
            }
        }
        count
    }

    fn smoothed(&self) -> Self {
        let mut next = self.land.clone();
        for position in self.positions() {
            let neighbours = self.land_neighbours(position);
            if let Some(cell) = self.index_of(position).and_then(|i| next.get_mut(i)) {
                if neighbours > BIRTH_THRESHOLD {
                    *cell = true;
                } else if neighbours < DEATH_THRESHOLD {
                    *cell = false;
                }
            }
        }
        Self {
            width: self.width,
            height: self.height,
            land: next,
        }
    }

    /// Clear every tile outside the largest 4-connected landmass.
    ///
    /// Returns `false` when the grid holds no land at all.
    fn keep_largest_landmass(&mut self) -> bool {
        let mut visited = vec![false; self.land.len()];
        let mut largest: Vec<Position> = Vec::new();

        for start in self.positions() {
            let Some(start_idx) = self.index_of(start) else {
                continue;
            };
            if !self.is_land(start) || visited.get(start_idx).copied().unwrap_or(true) {
                continue;
            }
            if let Some(v) = visited.get_mut(start_idx) {
                *v = true;
            }

            let mut component = Vec::new();
            let mut queue = VecDeque::from([start]);
            while let Some(current) = queue.pop_front() {
                component.push(current);
                for next in current.neighbours().into_iter().flatten() {
                    let Some(idx) = self.index_of(next) else {
                        continue;
                    };
                    if self.is_land(next) && !visited.get(idx).copied().unwrap_or(true) {
                        if let Some(v) = visited.get_mut(idx) {
                            *v = true;
                        }
                        queue.push_back(next);
                    }
                }
            }
            if component.len() > largest.len() {
                largest = component;
            }
        }

        if largest.is_empty() {
            return false;
        }
        self.land.iter_mut().for_each(|cell| *cell = false);
        for position in largest {
            if let Some(cell) = self.index_of(position).and_then(|i| self.land.get_mut(i)) {
                *cell = true;
            }
        }
        true
    }
}

fn cell_count(width: u32, height: u32) -> Option<usize> {
    usize::try_from(width)
        .ok()?
        .checked_mul(usize::try_from(height).ok()?)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;

    fn is_connected(island: &Island) -> bool {
        let tiles: BTreeSet<Position> = island.land_tiles().collect();
        let Some(start) = tiles.iter().next().copied() else {
            return true;
        };
        let mut seen = BTreeSet::from([start]);
        let mut queue = VecDeque::from([start]);
        while let Some(current) = queue.pop_front() {
            for next in current.neighbours().into_iter().flatten() {
                if tiles.contains(&next) && seen.insert(next) {
                    queue.push_back(next);
                }
            }
        }
        seen.len() == tiles.len()
    }

    #[test]
    fn generated_island_is_one_landmass() {
        for seed in 0..10 {
            let mut rng = StdRng::seed_from_u64(seed);
            let island = Island::generate(20, 20, 0.5, &mut rng).unwrap();
            assert!(island.land_count() > 0, "seed {seed} produced no land");
            assert!(is_connected(&island), "seed {seed} produced disjoint land");
        }
    }

    #[test]
    fn same_seed_same_island() {
        let a = Island::generate(20, 20, 0.5, &mut StdRng::seed_from_u64(7)).unwrap();
        let b = Island::generate(20, 20, 0.5, &mut StdRng::seed_from_u64(7)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn zero_ratio_falls_back_to_land() {
        // A 2x2 grid is all edge: smoothing always drowns it.
        let island = Island::generate(2, 2, 0.0, &mut StdRng::seed_from_u64(1)).unwrap();
        assert_eq!(island.land_count(), 1);
        assert!(island.is_land(Position::new(1, 1)));
    }

    #[test]
    fn empty_map_is_rejected() {
        let result = Island::generate(0, 5, 0.5, &mut StdRng::seed_from_u64(1));
        assert!(matches!(result, Err(WorldError::EmptyMap { .. })));
    }

    #[test]
    fn random_land_position_skips_occupied() {
        let island = Island::all_land(2, 1).unwrap();
        let occupied = BTreeSet::from([Position::new(0, 0)]);
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..20 {
            assert_eq!(
                island.find_random_land_position(&occupied, &mut rng),
                Some(Position::new(1, 0))
            );
        }
        let full = BTreeSet::from([Position::new(0, 0), Position::new(1, 0)]);
        assert_eq!(island.find_random_land_position(&full, &mut rng), None);
    }

    #[test]
    fn out_of_bounds_is_not_land() {
        let island = Island::all_land(3, 3).unwrap();
        assert!(island.is_land(Position::new(2, 2)));
        assert!(!island.is_land(Position::new(3, 0)));
        assert_eq!(island.rows().len(), 3);
    }
}
