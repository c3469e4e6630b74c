use log::{debug, info};
use rand::Rng;

use crate::connectivity::is_fully_reachable;
use crate::geometry::{Direction, Pos};
use crate::grid::{CellKind, Grid};

const STROKES_PER_BATCH: usize = 6;
const MIN_STROKE_LENGTH: usize = 7;
const MAX_STROKE_LENGTH: usize = 31;

/// Out of ten, rolls at or above this value bend the stroke.
const TURN_ROLL_THRESHOLD: u32 = 8;
/// The bending roll that turns right; the other one turns left.
const TURN_RIGHT_ROLL: u32 = 9;

/// Carves random wall strokes into `grid` until every clear cell can be
/// reached from `seed`. A batch that walls off any clear cell is thrown away
/// as a whole and a fresh batch is drawn. Returns the number of batches
/// drawn.
pub fn carve_walls(grid: &mut Grid, seed: Pos, rng: &mut impl Rng) -> usize {
    let mut attempts = 0;
    loop {
        attempts += 1;
        let snapshot = grid.clone();

        for _ in 0..STROKES_PER_BATCH {
            carve_stroke(grid, rng);
        }

        if is_fully_reachable(grid, seed) {
            info!("Walls carved after {} attempt(s)", attempts);
            return attempts;
        }

        debug!("Wall batch {} isolated part of the board, retrying", attempts);
        *grid = snapshot;
    }
}

/// Walks a random stroke of wall cells, stopping early at the edge of the
/// board or at the first cell that is not clear.
fn carve_stroke(grid: &mut Grid, rng: &mut impl Rng) {
    let size = grid.size();
    let length = rng.gen_range(MIN_STROKE_LENGTH..=MAX_STROKE_LENGTH);
    let mut pos = Pos {
        x: rng.gen_range(0..size.width),
        y: rng.gen_range(0..size.height),
    };
    let mut dir = Direction::from_index(rng.gen_range(0..4));

    for _ in 0..length {
        if !grid.is_clear(pos) {
            break;
        }
        grid.paint(pos, CellKind::Wall);

        let roll = rng.gen_range(0..10);
        if roll >= TURN_ROLL_THRESHOLD {
            dir = if roll == TURN_RIGHT_ROLL {
                dir.turned_right()
            } else {
                dir.turned_left()
            };
        }

        match pos.step(dir, size) {
            Some(next) => pos = next,
            None => break,
        }
    }
}
