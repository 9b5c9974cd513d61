//! Random starting positions for a round

use crate::grid::Grid;
use rand::Rng;
use shared::Position;
use std::collections::HashSet;

/// Puts every position on its own occupiable cell.
///
/// All positions are reset first, then each is sampled uniformly until it
/// lands on a non-blank cell nobody else holds. There is no retry cap: the
/// grid carries several occupiable cells per player, so a free one is always
/// found eventually.
pub fn place<'a, I, R>(positions: I, grid: &Grid, rng: &mut R)
where
    I: IntoIterator<Item = &'a mut Position>,
    R: Rng + ?Sized,
{
    let mut positions: Vec<&mut Position> = positions.into_iter().collect();
    for position in positions.iter_mut() {
        **position = None;
    }

    debug_assert!(grid.occupiable_count() >= positions.len());
    if grid.width() == 0 || grid.height() == 0 {
        return;
    }

    let mut claimed = HashSet::with_capacity(positions.len());
    for position in positions {
        let cell = loop {
            let row = rng.gen_range(0..grid.height());
            let col = rng.gen_range(0..grid.width());
            if grid.is_occupiable(row, col) && !claimed.contains(&(row, col)) {
                break (row, col);
            }
        };
        claimed.insert(cell);
        *position = Some(cell);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::{self, Cell};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_place_never_shares_or_blanks() {
        let mut rng = StdRng::seed_from_u64(11);

        for players in 2..40 {
            let names: Vec<String> = (0..players).map(|i| format!("p{i}")).collect();
            let grid = grid::generate(names.iter().map(String::as_str), &mut rng);
            let mut positions: Vec<Position> = vec![Some((99, 99)); players];

            place(positions.iter_mut(), &grid, &mut rng);

            let mut seen = HashSet::new();
            for position in &positions {
                let (row, col) = position.expect("every player is placed");
                assert!(grid.is_occupiable(row, col));
                assert!(seen.insert((row, col)), "cell shared at {:?}", (row, col));
            }
        }
    }

    #[test]
    fn test_place_fills_a_tight_grid() {
        let mut rng = StdRng::seed_from_u64(5);
        let grid = Grid::from_rows(vec![
            vec![Cell::Terrain('🌲'), Cell::Blank, Cell::Terrain('🌳')],
            vec![Cell::Blank, Cell::Terrain('🌵'), Cell::Blank],
        ]);
        let mut positions: Vec<Position> = vec![None; 3];

        place(positions.iter_mut(), &grid, &mut rng);

        let mut cells: Vec<(usize, usize)> = positions.into_iter().flatten().collect();
        cells.sort();
        assert_eq!(cells, vec![(0, 0), (0, 2), (1, 1)]);
    }
}
