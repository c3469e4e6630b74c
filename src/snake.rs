use log::debug;
use rand::Rng;

use crate::geometry::{Direction, Pos, PosDelta};
use crate::grid::{CellKind, Grid};

pub const INITIAL_LENGTH: usize = 7;
const SEGMENT_CAPACITY: usize = 1024;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Segment {
    pub pos: Pos,
    pub dir: Direction,
}

/// Ordered chain of segments, head first.
#[derive(Clone, Debug)]
pub struct Snake {
    segments: Vec<Segment>,
    alive: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TickResult {
    Continue,
    AteFood,
    GameOver,
}

impl Snake {
    /// Lays out a straight snake with its head at `head`, every segment
    /// facing `dir` and the body trailing behind.
    pub fn new(head: Pos, length: usize, dir: Direction) -> Self {
        assert!(length > 0, "Snake needs at least a head");

        let behind = PosDelta::from(dir.opposite());
        let mut segments = Vec::with_capacity(SEGMENT_CAPACITY.max(length));
        for i in 0..length as i32 {
            let x = head.x as i32 + behind.x * i;
            let y = head.y as i32 + behind.y * i;
            assert!(x >= 0 && y >= 0, "Snake body runs off the board at ({}, {})", x, y);
            segments.push(Segment {
                pos: Pos {
                    x: x as u16,
                    y: y as u16,
                },
                dir,
            });
        }

        Snake {
            segments,
            alive: true,
        }
    }

    pub fn head(&self) -> Segment {
        self.segments[0]
    }

    pub fn tail(&self) -> Segment {
        self.segments[self.segments.len() - 1]
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn is_alive(&self) -> bool {
        self.alive
    }

    /// Points the head somewhere new for the next tick. The rest of the body
    /// picks the heading up one segment per tick.
    pub fn set_heading(&mut self, dir: Direction) {
        self.segments[0].dir = dir;
    }

    /// Marks every segment as occupied on `grid`.
    pub fn lay_on(&self, grid: &mut Grid) {
        for segment in &self.segments {
            grid.paint(segment.pos, CellKind::Snake);
        }
    }

    /// Appends a segment behind the tail, offset against the tail's heading.
    /// The target cell is taken as-is, whatever it held before.
    fn grow(&mut self, grid: &mut Grid) {
        let tail = self.tail();
        let pos = tail
            .pos
            .step(tail.dir.opposite(), grid.size())
            .unwrap_or(tail.pos);
        grid.paint(pos, CellKind::Snake);
        self.segments.push(Segment { pos, dir: tail.dir });
    }
}

/// Advances the snake by one cell.
///
/// The head's destination decides the outcome. Food is eaten and the snake
/// grows by one; a wall or another segment ends the game with the snake left
/// where it was. Otherwise every segment steps along its own heading, the
/// vacated tail cell is cleared, and each segment then takes the heading its
/// predecessor moved with.
pub fn tick(snake: &mut Snake, grid: &mut Grid) -> TickResult {
    if !snake.is_alive() {
        return TickResult::GameOver;
    }

    let size = grid.size();
    let head = snake.head();
    let dest = match head.pos.step(head.dir, size) {
        Some(dest) => dest,
        None => {
            snake.alive = false;
            return TickResult::GameOver;
        }
    };

    let mut result = TickResult::Continue;
    if !grid.is_clear(dest) {
        if grid.kind(dest) != CellKind::Food {
            debug!("Head at {:?} ran into {:?} at {:?}", head.pos, grid.kind(dest), dest);
            snake.alive = false;
            return TickResult::GameOver;
        }
        snake.grow(grid);
        result = TickResult::AteFood;
    }

    grid.paint(snake.tail().pos, CellKind::Empty);
    for segment in snake.segments.iter_mut() {
        if let Some(next) = segment.pos.step(segment.dir, size) {
            segment.pos = next;
        }
    }
    grid.paint(dest, CellKind::Snake);

    for i in (1..snake.segments.len()).rev() {
        snake.segments[i].dir = snake.segments[i - 1].dir;
    }

    result
}

/// Drops food on a uniformly random clear cell and returns where it landed.
pub fn spawn_food(grid: &mut Grid, rng: &mut impl Rng) -> Pos {
    assert!(
        grid.clear_cells().next().is_some(),
        "No clear cell left for food"
    );

    let size = grid.size();
    loop {
        let pos = Pos {
            x: rng.gen_range(0..size.width),
            y: rng.gen_range(0..size.height),
        };
        if grid.is_clear(pos) {
            grid.paint(pos, CellKind::Food);
            debug!("Food at {:?}", pos);
            return pos;
        }
    }
}
