use log::debug;

use crate::geometry::{Direction, Pos};
use crate::grid::Grid;

/// Flood fills the clear cells reachable from `seed` and reports whether
/// that covers every clear cell on the grid.
///
/// A seed that is not itself clear reaches nothing, so the check then only
/// passes on a grid with no clear cells at all.
pub fn is_fully_reachable(grid: &Grid, seed: Pos) -> bool {
    assert!(grid.contains(seed), "Flood fill seed {:?} is off the board", seed);

    let size = grid.size();
    let width = size.width as usize;
    let mut visited = vec![false; size.area()];
    let mut stack = vec![seed];

    while let Some(pos) = stack.pop() {
        let index = pos.y as usize * width + pos.x as usize;
        if visited[index] || !grid.is_clear(pos) {
            continue;
        }
        visited[index] = true;

        for dir in Direction::ALL {
            if let Some(next) = pos.step(dir, size) {
                stack.push(next);
            }
        }
    }

    match grid
        .clear_cells()
        .find(|pos| !visited[pos.y as usize * width + pos.x as usize])
    {
        Some(pos) => {
            debug!("Clear cell {:?} is unreachable from {:?}", pos, seed);
            false
        }
        None => true,
    }
}
