#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Size {
    pub width: u16,
    pub height: u16,
}

impl Size {
    pub fn new(width: u16, height: u16) -> Self {
        Size { width, height }
    }

    pub fn center(&self) -> Pos {
        Pos {
            x: self.width / 2,
            y: self.height / 2,
        }
    }

    pub fn area(&self) -> usize {
        self.width as usize * self.height as usize
    }
}

/// Heading of a segment. The discriminants run clockwise, so turning is a
/// step of ±1 modulo 4.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    Up = 0,
    Right = 1,
    Down = 2,
    Left = 3,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::Up,
        Direction::Right,
        Direction::Down,
        Direction::Left,
    ];

    pub fn from_index(index: usize) -> Direction {
        Self::ALL[index % 4]
    }

    pub fn opposite(&self) -> Direction {
        match self {
            Direction::Up => Direction::Down,
            Direction::Down => Direction::Up,
            Direction::Right => Direction::Left,
            Direction::Left => Direction::Right,
        }
    }

    pub fn turned_right(&self) -> Direction {
        Self::from_index(*self as usize + 1)
    }

    pub fn turned_left(&self) -> Direction {
        Self::from_index(*self as usize + 3)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Pos {
    pub x: u16,
    pub y: u16,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PosDelta {
    pub x: i32,
    pub y: i32,
}

impl From<Direction> for PosDelta {
    fn from(dir: Direction) -> Self {
        match dir {
            Direction::Up => PosDelta { x: 0, y: -1 },
            Direction::Down => PosDelta { x: 0, y: 1 },
            Direction::Right => PosDelta { x: 1, y: 0 },
            Direction::Left => PosDelta { x: -1, y: 0 },
        }
    }
}

impl Pos {
    pub fn new(x: u16, y: u16) -> Self {
        Pos { x, y }
    }

    /// Offsets the position, returning `None` when the result falls outside
    /// `[0, width) x [0, height)`.
    pub fn checked_add(&self, delta: PosDelta, size: Size) -> Option<Pos> {
        let new_x = self.x as i32 + delta.x;
        let new_y = self.y as i32 + delta.y;
        if new_x < 0 || new_y < 0 || new_x >= size.width as i32 || new_y >= size.height as i32 {
            return None;
        }
        Some(Pos {
            x: new_x as u16,
            y: new_y as u16,
        })
    }

    pub fn step(&self, dir: Direction, size: Size) -> Option<Pos> {
        self.checked_add(dir.into(), size)
    }
}
