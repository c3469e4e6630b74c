use std::io;
use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use crate::geometry::Direction;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InputEvent {
    Turn(Direction),
    Quit,
    Restart,
}

/// Source of player events.
pub trait Input {
    /// Blocks for at most `timeout` waiting for the next event. `Ok(None)`
    /// means nothing relevant arrived in time.
    fn next_event(&mut self, timeout: Duration) -> io::Result<Option<InputEvent>>;
}

/// Reads key presses from the terminal.
#[derive(Debug, Default)]
pub struct KeyboardInput;

impl KeyboardInput {
    pub fn map_key(key: KeyEvent) -> Option<InputEvent> {
        if key.kind != KeyEventKind::Press {
            return None;
        }
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            return Some(InputEvent::Quit);
        }

        match key.code {
            KeyCode::Up | KeyCode::Char('w') => Some(InputEvent::Turn(Direction::Up)),
            KeyCode::Right | KeyCode::Char('d') => Some(InputEvent::Turn(Direction::Right)),
            KeyCode::Down | KeyCode::Char('s') => Some(InputEvent::Turn(Direction::Down)),
            KeyCode::Left | KeyCode::Char('a') => Some(InputEvent::Turn(Direction::Left)),
            KeyCode::Char('q') | KeyCode::Esc => Some(InputEvent::Quit),
            KeyCode::Char('n') | KeyCode::Char('r') => Some(InputEvent::Restart),
            _ => None,
        }
    }
}

impl Input for KeyboardInput {
    fn next_event(&mut self, timeout: Duration) -> io::Result<Option<InputEvent>> {
        if !event::poll(timeout)? {
            return Ok(None);
        }
        match event::read()? {
            Event::Key(key) => Ok(Self::map_key(key)),
            _ => Ok(None),
        }
    }
}
