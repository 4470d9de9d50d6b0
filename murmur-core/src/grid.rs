//! Uniform spatial partitioning for neighbor queries.
//!
//! Every entity lands in exactly one square cell per tick; a flocking query
//! then only has to look at the 3×3 block of cells around an agent instead
//! of the whole world. With `cell_size = 2 × sight_distance` that block is
//! guaranteed to cover the agent's full sight circle, so the grid can only
//! over-report, never miss — callers filter by exact distance.

use std::collections::HashMap;

use crate::entity::Position;

/// Signed cell coordinates: `(floor(x / cell_size), floor(y / cell_size))`.
pub type GridCell = (i64, i64);

/// Cell buckets hold indices into whatever slice the grid was last rebuilt
/// from, in insertion order. The grid never owns entities; it is cleared and
/// rebuilt from scratch once per tick, so there are no stale entries.
#[derive(Debug)]
pub struct SpatialGrid {
    cell_size: f64,
    cells: HashMap<GridCell, Vec<usize>>,
}

impl SpatialGrid {
    pub fn new(cell_size: f64) -> Self {
        assert!(cell_size > 0.0, "cell size must be positive");
        Self {
            cell_size,
            cells: HashMap::new(),
        }
    }

    pub fn cell_size(&self) -> f64 {
        self.cell_size
    }

    pub fn cell_of(&self, position: Position) -> GridCell {
        (
            (position.x / self.cell_size).floor() as i64,
            (position.y / self.cell_size).floor() as i64,
        )
    }

    /// Clears every bucket and re-inserts all positions. O(n).
    pub fn rebuild<I>(&mut self, positions: I)
    where
        I: IntoIterator<Item = Position>,
    {
        self.cells.clear();
        for (index, position) in positions.into_iter().enumerate() {
            let cell = self.cell_of(position);
            self.cells.entry(cell).or_default().push(index);
        }
    }

    /// Indices bucketed in `cell`. A cell nothing fell into is empty, not an
    /// error.
    pub fn bucket(&self, cell: GridCell) -> &[usize] {
        self.cells.get(&cell).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Concatenation of the (2r+1)² buckets centered on `position`'s own
    /// cell. Contains every index within one cell-size of `position` (and
    /// usually more); exact distance filtering is the caller's job.
    pub fn neighborhood(&self, position: Position, radius_in_cells: i64) -> Vec<usize> {
        let (cx, cy) = self.cell_of(position);
        let mut indices = Vec::new();
        for i in -radius_in_cells..=radius_in_cells {
            for j in -radius_in_cells..=radius_in_cells {
                indices.extend_from_slice(self.bucket((cx + i, cy + j)));
            }
        }
        indices
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::SmallRng;
    use rand::{Rng, SeedableRng};

    const SIGHT_DISTANCE: f64 = 55.0;

    fn grid() -> SpatialGrid {
        SpatialGrid::new(SIGHT_DISTANCE * 2.0)
    }

    #[test]
    #[should_panic(expected = "cell size must be positive")]
    fn zero_cell_size_is_rejected() {
        SpatialGrid::new(0.0);
    }

    #[test]
    fn cell_coordinates_use_floored_division() {
        let g = grid();
        assert_eq!(g.cell_of(Position::new(0.0, 0.0)), (0, 0));
        assert_eq!(g.cell_of(Position::new(109.9, 110.0)), (0, 1));
        assert_eq!(g.cell_of(Position::new(-0.1, -110.1)), (-1, -2));
    }

    #[test]
    fn rebuild_places_each_entity_in_exactly_its_own_cell() {
        let mut g = grid();
        let positions = [
            Position::new(5.0, 5.0),
            Position::new(115.0, 5.0),
            Position::new(5.0, 115.0),
            Position::new(-5.0, 5.0),
        ];
        g.rebuild(positions);

        for (index, position) in positions.iter().enumerate() {
            let own = g.bucket(g.cell_of(*position));
            assert!(own.contains(&index));
            // and nowhere else
            let everywhere: usize = positions
                .iter()
                .map(|p| g.cell_of(*p))
                .collect::<std::collections::HashSet<_>>()
                .into_iter()
                .map(|c| g.bucket(c).iter().filter(|&&i| i == index).count())
                .sum();
            assert_eq!(everywhere, 1);
        }
    }

    #[test]
    fn rebuild_discards_stale_entries() {
        let mut g = grid();
        g.rebuild([Position::new(5.0, 5.0)]);
        g.rebuild([Position::new(500.0, 500.0)]);
        assert!(g.bucket((0, 0)).is_empty());
        assert_eq!(g.neighborhood(Position::new(500.0, 500.0), 1), vec![0]);
    }

    #[test]
    fn missing_cells_are_empty_not_errors() {
        let g = grid();
        assert!(g.bucket((42, -7)).is_empty());
        assert!(g.neighborhood(Position::new(9999.0, 9999.0), 1).is_empty());
    }

    #[test]
    fn buckets_preserve_insertion_order() {
        let mut g = grid();
        g.rebuild([
            Position::new(1.0, 1.0),
            Position::new(2.0, 2.0),
            Position::new(3.0, 3.0),
        ]);
        assert_eq!(g.bucket((0, 0)), &[0, 1, 2]);
    }

    #[test]
    fn neighborhood_covers_the_full_sight_circle() {
        // Coverage property: anything within sight distance of the query
        // point must show up in its 3x3 neighborhood, for arbitrary layouts.
        let mut rng = SmallRng::seed_from_u64(7);
        for _ in 0..50 {
            let query = Position::new(rng.gen_range(-500.0..500.0), rng.gen_range(-500.0..500.0));
            let positions: Vec<Position> = (0..200)
                .map(|_| Position::new(rng.gen_range(-500.0..500.0), rng.gen_range(-500.0..500.0)))
                .collect();

            let mut g = grid();
            g.rebuild(positions.iter().copied());
            let found = g.neighborhood(query, 1);

            for (index, position) in positions.iter().enumerate() {
                if query.distance_to(position) < SIGHT_DISTANCE {
                    assert!(
                        found.contains(&index),
                        "entity at {position:?} within sight of {query:?} missing from neighborhood"
                    );
                }
            }
        }
    }

    #[test]
    fn neighborhood_never_reaches_past_the_3x3_block() {
        // Everything returned lies within 2 cells of the query cell along
        // each axis, i.e. the far corner is bounded by the block extent.
        let mut g = grid();
        let far = Position::new(SIGHT_DISTANCE * 2.0 * 3.5, 0.0);
        g.rebuild([Position::new(5.0, 5.0), far]);
        let found = g.neighborhood(Position::new(5.0, 5.0), 1);
        assert_eq!(found, vec![0]);
    }
}
