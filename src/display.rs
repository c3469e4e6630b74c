use std::io;

use ratatui::{
    backend::Backend,
    buffer::Buffer,
    layout::Rect,
    style::{Color, Style},
    widgets::Widget,
    Terminal,
};

use crate::geometry::{Pos, Size};

/// Background used for every snake cell once the game is over.
pub const GAME_OVER_COLOR: Color = Color::Red;

/// Sink for board cells. Paints are buffered until `flush`.
pub trait Display {
    /// Cells available for drawing.
    fn surface(&self) -> Size;

    fn paint_cell(&mut self, pos: Pos, background: Color);

    fn show_score(&mut self, score: u64);

    fn show_banner(&mut self, banner: Option<String>);

    fn flush(&mut self) -> io::Result<()>;
}

/// A `Display` drawn through ratatui. Cells are kept in a back buffer and
/// the whole buffer is rendered on every flush.
pub struct TerminalDisplay<B: Backend> {
    terminal: Terminal<B>,
    size: Size,
    colors: Vec<Color>,
    score: u64,
    banner: Option<String>,
}

impl<B: Backend> TerminalDisplay<B> {
    pub fn new(terminal: Terminal<B>) -> io::Result<Self> {
        let area = terminal.size()?;
        let size = Size::new(area.width, area.height);
        Ok(TerminalDisplay {
            terminal,
            size,
            colors: vec![Color::Reset; size.area()],
            score: 0,
            banner: None,
        })
    }
}

impl<B: Backend> Display for TerminalDisplay<B> {
    fn surface(&self) -> Size {
        self.size
    }

    fn paint_cell(&mut self, pos: Pos, background: Color) {
        if pos.x < self.size.width && pos.y < self.size.height {
            self.colors[pos.y as usize * self.size.width as usize + pos.x as usize] = background;
        }
    }

    fn show_score(&mut self, score: u64) {
        self.score = score;
    }

    fn show_banner(&mut self, banner: Option<String>) {
        self.banner = banner;
    }

    fn flush(&mut self) -> io::Result<()> {
        let view = BoardView {
            size: self.size,
            colors: &self.colors,
            score: self.score,
            banner: self.banner.as_deref(),
        };
        self.terminal.draw(|frame| frame.render_widget(view, frame.area()))?;
        Ok(())
    }
}

struct BoardView<'a> {
    size: Size,
    colors: &'a [Color],
    score: u64,
    banner: Option<&'a str>,
}

impl Widget for BoardView<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let width = self.size.width.min(area.width);
        let height = self.size.height.min(area.height);
        for y in 0..height {
            for x in 0..width {
                let color = self.colors[y as usize * self.size.width as usize + x as usize];
                buf[(area.x + x, area.y + y)].set_symbol(" ").set_bg(color);
            }
        }

        // Score sits on top of the board's top edge
        let score = self.score.to_string();
        let score_style = Style::default().fg(Color::Black).bg(Color::Red);
        buf.set_stringn(area.x, area.y, &score, area.width as usize, score_style);

        if let Some(banner) = self.banner {
            let x = score.len() as u16 + 2;
            if x < area.width {
                buf.set_stringn(
                    area.x + x,
                    area.y,
                    banner,
                    (area.width - x) as usize,
                    Style::default().fg(Color::White).bg(Color::Black),
                );
            }
        }
    }
}
