use crate::prelude::HashMap;

/// Uniform bucket grid over pixel-space positions.
///
/// Cells are `cell_size` wide, so any two positions closer than `cell_size`
/// sit in the same or adjacent cells and a 3x3 lookup finds every candidate.
pub struct BucketGrid {
    cell_size: f64,
    cells: HashMap<(i64, i64), Vec<usize>>,
}

impl BucketGrid {
    /// Buckets every position by index
    pub fn build(positions: &[(f64, f64)], cell_size: f64) -> Self {
        debug_assert!(cell_size > 0.0, "cell size must be positive");

        let mut grid = Self {
            cell_size,
            cells: HashMap::default(),
        };
        grid.cells.reserve((positions.len() / 4).max(16));

        for (index, position) in positions.iter().enumerate() {
            let cell = grid.cell_of(*position);
            grid.cells.entry(cell).or_default().push(index);
        }
        grid
    }

    pub fn cell_of(&self, (x, y): (f64, f64)) -> (i64, i64) {
        (
            (x / self.cell_size).floor() as i64,
            (y / self.cell_size).floor() as i64,
        )
    }

    /// Indices bucketed in the 3x3 block of cells around `position`
    pub fn neighbors(&self, position: (f64, f64)) -> impl Iterator<Item = usize> + '_ {
        let (cx, cy) = self.cell_of(position);
        (-1..=1)
            .flat_map(move |dx| {
                (-1..=1).map(move |dy| (cx.saturating_add(dx), cy.saturating_add(dy)))
            })
            .filter_map(move |cell| self.cells.get(&cell))
            .flat_map(|bucket| bucket.iter().copied())
    }

    /// Drops `index` from the cell holding `position`
    pub fn remove(&mut self, index: usize, position: (f64, f64)) {
        let cell = self.cell_of(position);
        if let Some(bucket) = self.cells.get_mut(&cell) {
            bucket.retain(|&i| i != index);
            if bucket.is_empty() {
                self.cells.remove(&cell);
            }
        }
    }

    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }
}
