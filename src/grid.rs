use ratatui::style::Color;

use crate::geometry::{Pos, Size};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CellKind {
    Wall,
    Empty,
    Snake,
    Food,
}

impl CellKind {
    pub fn color(&self) -> Color {
        match self {
            CellKind::Wall => Color::Red,
            CellKind::Empty => Color::Black,
            CellKind::Snake => Color::Green,
            CellKind::Food => Color::Yellow,
        }
    }

    fn is_clear(&self) -> bool {
        matches!(self, CellKind::Empty)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Cell {
    pub pos: Pos,
    pub clear: bool,
    pub kind: CellKind,
}

/// The board. Border cells are walls for the lifetime of the grid.
#[derive(Clone, Debug)]
pub struct Grid {
    size: Size,
    cells: Vec<Cell>,
    dirty: Vec<Pos>,
}

impl Grid {
    pub fn new(size: Size) -> Self {
        assert!(
            size.width >= 3 && size.height >= 3,
            "Board of {}x{} has no interior",
            size.width,
            size.height
        );

        let mut cells = Vec::with_capacity(size.area());
        for y in 0..size.height {
            for x in 0..size.width {
                let pos = Pos { x, y };
                let kind = if Self::on_border(pos, size) {
                    CellKind::Wall
                } else {
                    CellKind::Empty
                };
                cells.push(Cell {
                    pos,
                    clear: kind.is_clear(),
                    kind,
                });
            }
        }

        Grid {
            size,
            cells,
            dirty: Vec::new(),
        }
    }

    pub fn size(&self) -> Size {
        self.size
    }

    pub fn contains(&self, pos: Pos) -> bool {
        pos.x < self.size.width && pos.y < self.size.height
    }

    pub fn is_border(&self, pos: Pos) -> bool {
        Self::on_border(pos, self.size)
    }

    fn on_border(pos: Pos, size: Size) -> bool {
        pos.x == 0 || pos.y == 0 || pos.x == size.width - 1 || pos.y == size.height - 1
    }

    fn index(&self, pos: Pos) -> usize {
        assert!(self.contains(pos), "{:?} is off the board", pos);
        pos.y as usize * self.size.width as usize + pos.x as usize
    }

    pub fn cell(&self, pos: Pos) -> &Cell {
        &self.cells[self.index(pos)]
    }

    pub fn kind(&self, pos: Pos) -> CellKind {
        self.cell(pos).kind
    }

    pub fn is_clear(&self, pos: Pos) -> bool {
        self.cell(pos).clear
    }

    /// Sets the kind of a cell and its clear flag. Border cells stay walls.
    pub fn paint(&mut self, pos: Pos, kind: CellKind) {
        if self.is_border(pos) {
            return;
        }
        let index = self.index(pos);
        let cell = &mut self.cells[index];
        cell.kind = kind;
        cell.clear = kind.is_clear();
        self.dirty.push(pos);
    }

    pub fn cells(&self) -> impl Iterator<Item = &Cell> {
        self.cells.iter()
    }

    pub fn clear_cells(&self) -> impl Iterator<Item = Pos> + '_ {
        self.cells.iter().filter(|c| c.clear).map(|c| c.pos)
    }

    /// Positions painted since the last call, in paint order.
    pub fn take_dirty(&mut self) -> Vec<Pos> {
        std::mem::take(&mut self.dirty)
    }
}
