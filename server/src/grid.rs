//! Procedural terrain for a round
//!
//! A grid holds `CELLS_PER_PLAYER` occupiable cells for every player and is
//! shaped to roughly a 1:2 (width:height) rectangle, the proportions of a
//! phone held upright. Rounding the shape up can produce a few cells too
//! many; those are blanked out at random afterwards.

use crate::identity::is_santa;
use log::debug;
use rand::seq::SliceRandom;
use rand::Rng;

pub const CELLS_PER_PLAYER: usize = 4;

pub const FOREST: [char; 4] = ['🌲', '🌳', '🌴', '🌵'];
pub const FESTIVE: [char; 1] = ['🎄'];
pub const INDOORS: [char; 1] = ['🚪'];

/// Encoding of a blank cell inside setup frames
pub const BLANK_SYMBOL: char = ' ';

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cell {
    Terrain(char),
    Blank,
}

impl Cell {
    pub fn is_occupiable(&self) -> bool {
        matches!(self, Cell::Terrain(_))
    }

    pub fn symbol(&self) -> char {
        match self {
            Cell::Terrain(symbol) => *symbol,
            Cell::Blank => BLANK_SYMBOL,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grid {
    width: usize,
    rows: Vec<Vec<Cell>>,
}

impl Grid {
    /// Builds a grid from explicit rows. All rows must share one width.
    pub fn from_rows(rows: Vec<Vec<Cell>>) -> Self {
        let width = rows.first().map_or(0, Vec::len);
        debug_assert!(rows.iter().all(|row| row.len() == width));
        Self { width, rows }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.rows.len()
    }

    pub fn cell(&self, row: usize, col: usize) -> Option<Cell> {
        self.rows.get(row)?.get(col).copied()
    }

    /// True when (row, col) is inside the grid and not blank
    pub fn is_occupiable(&self, row: usize, col: usize) -> bool {
        self.cell(row, col).is_some_and(|cell| cell.is_occupiable())
    }

    pub fn cells(&self) -> impl Iterator<Item = &Cell> {
        self.rows.iter().flatten()
    }

    pub fn occupiable_count(&self) -> usize {
        self.cells().filter(|cell| cell.is_occupiable()).count()
    }

    /// All rows concatenated, the way setup frames carry them
    pub fn terrain(&self) -> String {
        self.cells().map(Cell::symbol).collect()
    }
}

/// Picks the terrain symbols for a roster.
///
/// A Santa alias anywhere wins outright; otherwise a name mentioning
/// "indoor" or "inside" moves the game indoors. Names are scanned in the
/// order given.
pub fn terrain_for<'a, I>(names: I) -> &'static [char]
where
    I: IntoIterator<Item = &'a str>,
{
    let mut terrain: &'static [char] = &FOREST;

    for name in names {
        if is_santa(name) {
            return &FESTIVE;
        }
        let name = name.to_lowercase();
        if name.contains("indoor") || name.contains("inside") {
            terrain = &INDOORS;
        }
    }

    terrain
}

/// Cells per row for a grid of `cells` cells.
///
/// Small grids take the narrowest width with `2w² >= cells`; from 50 cells
/// on, the widest width with `2w² <= cells`. The last row may stay partial.
pub fn columns_for(cells: usize) -> usize {
    let area = |w: usize| 2 * w * w;

    let width = if cells < 50 {
        (0..).find(|&w| area(w) >= cells).unwrap_or(0)
    } else {
        (0..).find(|&w| area(w + 1) > cells).unwrap_or(0)
    };

    width.max(1)
}

/// Generates a fresh grid for the given roster names
pub fn generate<'a, I, R>(names: I, rng: &mut R) -> Grid
where
    I: IntoIterator<Item = &'a str>,
    R: Rng + ?Sized,
{
    let names: Vec<&str> = names.into_iter().collect();
    let terrain = terrain_for(names.iter().copied());
    grow(terrain, names.len() * CELLS_PER_PLAYER, rng)
}

/// Grows a grid with `budget` occupiable cells drawn from `terrain`
pub fn grow<R: Rng + ?Sized>(terrain: &[char], budget: usize, rng: &mut R) -> Grid {
    let width = columns_for(budget);
    let height = budget.div_ceil(width);

    let mut rows: Vec<Vec<Cell>> = (0..height)
        .map(|_| {
            (0..width)
                .map(|_| Cell::Terrain(*terrain.choose(rng).unwrap_or(&FOREST[0])))
                .collect()
        })
        .collect();

    // Blankings may land on the same cell twice; the surplus is an upper bound
    let surplus = height * width - budget;
    for _ in 0..surplus {
        let row = rng.gen_range(0..height);
        let col = rng.gen_range(0..width);
        rows[row][col] = Cell::Blank;
    }

    debug!(
        "Grew {}x{} grid for {} cells ({} blankings)",
        width, height, budget, surplus
    );

    Grid::from_rows(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_columns_for_small_grids() {
        assert_eq!(columns_for(8), 2);
        assert_eq!(columns_for(12), 3);
        assert_eq!(columns_for(16), 3);
        assert_eq!(columns_for(18), 3);
        assert_eq!(columns_for(20), 4);
        assert_eq!(columns_for(30), 4);
        assert_eq!(columns_for(32), 4);
        assert_eq!(columns_for(48), 5);
    }

    #[test]
    fn test_columns_for_large_grids() {
        assert_eq!(columns_for(50), 5);
        assert_eq!(columns_for(52), 5);
        assert_eq!(columns_for(71), 5);
        assert_eq!(columns_for(72), 6);
        assert_eq!(columns_for(100), 7);
        assert_eq!(columns_for(200), 10);
    }

    #[test]
    fn test_thirty_cells_make_eight_rows_of_four() {
        let mut rng = StdRng::seed_from_u64(30);

        for _ in 0..50 {
            let grid = grow(&FOREST, 30, &mut rng);
            assert_eq!(grid.width(), 4);
            assert_eq!(grid.height(), 8);
            assert_eq!(grid.cells().count(), 32);
            let blanks = grid.cells().filter(|c| !c.is_occupiable()).count();
            assert!((1..=2).contains(&blanks));
        }
    }

    #[test]
    fn test_exact_fit_has_no_blanks() {
        // 7 players: 28 cells, 4 columns, 7 full rows
        let mut rng = StdRng::seed_from_u64(28);
        let names: Vec<String> = (0..7).map(|i| format!("p{i}")).collect();

        let grid = generate(names.iter().map(String::as_str), &mut rng);
        assert_eq!(grid.width(), 4);
        assert_eq!(grid.height(), 7);
        assert_eq!(grid.occupiable_count(), 28);
    }

    #[test]
    fn test_surplus_cells_are_blanked() {
        // 9 players: 36 cells, 5 columns, 8 rows, 4 surplus
        let mut rng = StdRng::seed_from_u64(9);
        let names: Vec<String> = (0..9).map(|i| format!("p{i}")).collect();

        for _ in 0..50 {
            let grid = generate(names.iter().map(String::as_str), &mut rng);
            assert_eq!(grid.width(), 5);
            assert_eq!(grid.height(), 8);
            let blanks = grid.cells().filter(|c| !c.is_occupiable()).count();
            assert!((1..=4).contains(&blanks), "unexpected {} blanks", blanks);
            assert!(grid.occupiable_count() >= 36);
        }
    }

    #[test]
    fn test_default_terrain_is_forest() {
        let mut rng = StdRng::seed_from_u64(1);
        let grid = generate(["alice", "bob"], &mut rng);
        assert_eq!(grid.width(), 2);
        assert_eq!(grid.height(), 4);
        assert!(grid.cells().all(|cell| match cell {
            Cell::Terrain(symbol) => FOREST.contains(symbol),
            Cell::Blank => false,
        }));
    }

    #[test]
    fn test_terrain_overrides() {
        assert_eq!(terrain_for(["alice", "bob"]), &FOREST);
        assert_eq!(terrain_for(["alice", "Stay Inside"]), &INDOORS);
        assert_eq!(terrain_for(["INDOOR cat"]), &INDOORS);
        assert_eq!(terrain_for(["indoors", "Kris Kringle"]), &FESTIVE);
        assert_eq!(terrain_for(["santa", "inside"]), &FESTIVE);
    }

    #[test]
    fn test_terrain_string_encodes_blanks() {
        let grid = Grid::from_rows(vec![
            vec![Cell::Terrain('🌲'), Cell::Blank],
            vec![Cell::Terrain('🌵'), Cell::Terrain('🌳')],
        ]);
        assert_eq!(grid.terrain(), "🌲 🌵🌳");
        assert!(grid.is_occupiable(1, 1));
        assert!(!grid.is_occupiable(0, 1));
        assert!(!grid.is_occupiable(2, 0));
        assert!(!grid.is_occupiable(0, 5));
    }
}
