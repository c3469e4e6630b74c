use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::sync::{Mutex, PoisonError};
use std::thread;
use std::time::{Duration, Instant};

use log::{debug, error, info};
use rand::Rng;

use crate::display::{Display, GAME_OVER_COLOR};
use crate::geometry::{Direction, Size};
use crate::grid::Grid;
use crate::input::{Input, InputEvent};
use crate::snake::{spawn_food, tick, Snake, TickResult, INITIAL_LENGTH};
use crate::walls::carve_walls;

const INITIAL_DIRECTION: Direction = Direction::Right;
/// How long the input side waits for an event before checking whether the
/// round is still going.
const INPUT_POLL: Duration = Duration::from_millis(25);
const MIN_BOARD: Size = Size {
    width: 2 * INITIAL_LENGTH as u16 + 2,
    height: 5,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Settings {
    /// Board height; the width is twice this. Both shrink to fit the display.
    pub board_height: u16,
    pub tick: Duration,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            board_height: 40,
            tick: Duration::from_millis(100),
        }
    }
}

impl Settings {
    pub fn board_size(&self, surface: Size) -> Size {
        Size {
            width: self.board_height.saturating_mul(2).min(surface.width),
            height: self.board_height.min(surface.height),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GameState {
    Idle,
    Running,
    GameOver { score: u64 },
    Restarted,
    Exit,
}

/// How a round came to an end.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RoundEnd {
    GameOver { score: u64 },
    Restart,
    Quit,
}

enum ClockEnd {
    GameOver { score: u64 },
    Stopped,
}

#[derive(Debug)]
struct Steering {
    pending: Direction,
    last: Direction,
}

/// State shared between the clock and the input side of a running round.
#[derive(Debug)]
pub struct RoundControl {
    steering: Mutex<Steering>,
    finished: AtomicBool,
}

impl RoundControl {
    pub fn new(heading: Direction) -> Self {
        RoundControl {
            steering: Mutex::new(Steering {
                pending: heading,
                last: heading,
            }),
            finished: AtomicBool::new(false),
        }
    }

    /// Queues `dir` for the next tick unless it would turn the head straight
    /// back onto the body. Later requests replace earlier ones.
    pub fn request_turn(&self, dir: Direction) -> bool {
        let mut steering = self.steering.lock().unwrap_or_else(PoisonError::into_inner);
        if dir == steering.last.opposite() {
            return false;
        }
        steering.pending = dir;
        true
    }

    pub fn pending_heading(&self) -> Direction {
        self.steering
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pending
    }

    pub fn record_heading(&self, dir: Direction) {
        self.steering
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .last = dir;
    }

    pub fn finish(&self) {
        self.finished.store(true, Ordering::Release);
    }

    pub fn is_finished(&self) -> bool {
        self.finished.load(Ordering::Acquire)
    }
}

/// Board and snake for one round.
struct Round {
    grid: Grid,
    snake: Snake,
    score: u64,
    food: bool,
}

impl Round {
    fn new(size: Size, rng: &mut impl Rng) -> Self {
        let mut grid = Grid::new(size);
        let snake = Snake::new(size.center(), INITIAL_LENGTH, INITIAL_DIRECTION);
        snake.lay_on(&mut grid);

        let seed = size
            .center()
            .step(INITIAL_DIRECTION, size)
            .unwrap_or(size.center());
        carve_walls(&mut grid, seed, rng);

        Round {
            grid,
            snake,
            score: 0,
            food: false,
        }
    }

    fn present(&mut self, display: &mut impl Display) {
        for pos in self.grid.take_dirty() {
            display.paint_cell(pos, self.grid.kind(pos).color());
        }
    }

    fn redraw(&mut self, display: &mut impl Display) -> io::Result<()> {
        self.grid.take_dirty();
        for cell in self.grid.cells() {
            display.paint_cell(cell.pos, cell.kind.color());
        }
        display.show_score(self.score);
        display.show_banner(None);
        display.flush()
    }
}

pub struct GameSession<D, I, R> {
    settings: Settings,
    display: D,
    input: I,
    rng: R,
    state: GameState,
}

impl<D, I, R> GameSession<D, I, R>
where
    D: Display + Send,
    I: Input,
    R: Rng + Send,
{
    pub fn new(settings: Settings, display: D, input: I, rng: R) -> Self {
        GameSession {
            settings,
            display,
            input,
            rng,
            state: GameState::Idle,
        }
    }

    pub fn state(&self) -> GameState {
        self.state
    }

    fn transition(&mut self, state: GameState) {
        info!("{:?} -> {:?}", self.state, state);
        self.state = state;
    }

    /// Plays rounds until the player quits.
    pub fn run(&mut self) -> io::Result<()> {
        loop {
            self.transition(GameState::Running);
            match self.play_round()? {
                RoundEnd::Quit => break,
                RoundEnd::Restart => self.transition(GameState::Restarted),
                RoundEnd::GameOver { score } => {
                    self.transition(GameState::GameOver { score });
                    self.display.show_banner(Some(format!(
                        "GAME OVER  score {}  n: new round  q: quit",
                        score
                    )));
                    self.display.flush()?;

                    if self.await_decision()? == RoundEnd::Quit {
                        break;
                    }
                    self.transition(GameState::Restarted);
                }
            }
        }

        self.transition(GameState::Exit);
        Ok(())
    }

    /// Blocks until the player asks for a new round or to quit. Steering
    /// keys are ignored.
    fn await_decision(&mut self) -> io::Result<RoundEnd> {
        loop {
            match self.input.next_event(INPUT_POLL)? {
                Some(InputEvent::Quit) => return Ok(RoundEnd::Quit),
                Some(InputEvent::Restart) => return Ok(RoundEnd::Restart),
                Some(InputEvent::Turn(_)) | None => {}
            }
        }
    }

    /// Sets up a fresh board and runs it until the snake dies or the player
    /// stops the round.
    pub fn play_round(&mut self) -> io::Result<RoundEnd> {
        let size = self.settings.board_size(self.display.surface());
        if size.width < MIN_BOARD.width || size.height < MIN_BOARD.height {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!(
                    "display of {}x{} is too small for a board",
                    size.width, size.height
                ),
            ));
        }
        info!("Starting round on a {}x{} board", size.width, size.height);

        let mut round = Round::new(size, &mut self.rng);
        round.redraw(&mut self.display)?;

        let control = RoundControl::new(INITIAL_DIRECTION);
        let (stop_tx, stop_rx) = mpsc::channel();
        let period = self.settings.tick;
        let GameSession {
            display,
            input,
            rng,
            ..
        } = self;

        let (steered, clocked) = thread::scope(|scope| {
            let control = &control;
            let clock = scope.spawn(move || {
                let result = run_clock(&mut round, display, rng, control, stop_rx, period);
                control.finish();
                result
            });

            let steered = steer(input, control);
            if !matches!(steered, Ok(None)) {
                // Nobody is left to watch for game over, so stop the clock
                let _ = stop_tx.send(());
            }

            let clocked = clock
                .join()
                .unwrap_or_else(|_| Err(io::Error::other("clock thread panicked")));
            (steered, clocked)
        });

        let clocked = clocked?;
        let end = match (steered?, clocked) {
            (Some(end), _) => end,
            (None, ClockEnd::GameOver { score }) => RoundEnd::GameOver { score },
            (None, ClockEnd::Stopped) => RoundEnd::Quit,
        };
        info!("Round ended: {:?}", end);
        Ok(end)
    }
}

/// Drives the snake on a fixed period until it dies or `stop` fires.
fn run_clock(
    round: &mut Round,
    display: &mut impl Display,
    rng: &mut impl Rng,
    control: &RoundControl,
    stop: Receiver<()>,
    period: Duration,
) -> io::Result<ClockEnd> {
    let mut next_tick = Instant::now();
    loop {
        if !round.food {
            spawn_food(&mut round.grid, rng);
            round.food = true;
        }

        round.snake.set_heading(control.pending_heading());
        match tick(&mut round.snake, &mut round.grid) {
            TickResult::Continue => {}
            TickResult::AteFood => {
                round.score += 1;
                round.food = false;
                display.show_score(round.score);
                debug!("Ate food, length now {}", round.snake.len());
            }
            TickResult::GameOver => {
                round.present(display);
                for segment in round.snake.segments() {
                    display.paint_cell(segment.pos, GAME_OVER_COLOR);
                }
                display.flush()?;
                info!(
                    "Game over with score {} at {:?}",
                    round.score,
                    round.snake.head().pos
                );
                return Ok(ClockEnd::GameOver { score: round.score });
            }
        }
        control.record_heading(round.snake.head().dir);

        round.present(display);
        display.flush()?;

        next_tick += period;
        match stop.recv_timeout(next_tick.saturating_duration_since(Instant::now())) {
            Err(RecvTimeoutError::Timeout) => {}
            Ok(()) | Err(RecvTimeoutError::Disconnected) => return Ok(ClockEnd::Stopped),
        }
    }
}

/// Feeds player events into the round until the clock finishes it or the
/// player quits or restarts.
fn steer(input: &mut impl Input, control: &RoundControl) -> io::Result<Option<RoundEnd>> {
    while !control.is_finished() {
        let event = match input.next_event(INPUT_POLL) {
            Ok(event) => event,
            Err(e) => {
                error!("Reading input failed: {}", e);
                return Err(e);
            }
        };
        match event {
            Some(InputEvent::Turn(dir)) => {
                if !control.request_turn(dir) {
                    debug!("Ignoring reversal to {:?}", dir);
                }
            }
            Some(InputEvent::Quit) => return Ok(Some(RoundEnd::Quit)),
            Some(InputEvent::Restart) => return Ok(Some(RoundEnd::Restart)),
            None => {}
        }
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connectivity::is_fully_reachable;
    use crate::geometry::Pos;
    use crate::grid::CellKind;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use ratatui::style::Color;
    use std::collections::{HashSet, VecDeque};
    use std::sync::Arc;

    #[derive(Default)]
    struct RecordingDisplay {
        surface: Size,
        painted: Vec<(Pos, Color)>,
        frames: Vec<Vec<(Pos, Color)>>,
        banner: Option<String>,
        rounds: usize,
        game_over: Arc<AtomicBool>,
    }

    impl RecordingDisplay {
        fn new(surface: Size) -> Self {
            RecordingDisplay {
                surface,
                ..Default::default()
            }
        }
    }

    impl Display for RecordingDisplay {
        fn surface(&self) -> Size {
            self.surface
        }

        fn paint_cell(&mut self, pos: Pos, background: Color) {
            self.painted.push((pos, background));
        }

        fn show_score(&mut self, _score: u64) {}

        fn show_banner(&mut self, banner: Option<String>) {
            match &banner {
                Some(_) => self.game_over.store(true, Ordering::SeqCst),
                None => {
                    self.rounds += 1;
                    self.game_over.store(false, Ordering::SeqCst);
                }
            }
            self.banner = banner;
        }

        fn flush(&mut self) -> io::Result<()> {
            self.frames.push(std::mem::take(&mut self.painted));
            Ok(())
        }
    }

    /// Replays a fixed list of events. With a gate, events are held back
    /// until the display shows the game over banner.
    struct ScriptedInput {
        events: VecDeque<InputEvent>,
        gate: Option<Arc<AtomicBool>>,
    }

    impl ScriptedInput {
        fn new(events: &[InputEvent]) -> Self {
            ScriptedInput {
                events: events.iter().copied().collect(),
                gate: None,
            }
        }

        fn after_game_over(events: &[InputEvent], display: &RecordingDisplay) -> Self {
            ScriptedInput {
                events: events.iter().copied().collect(),
                gate: Some(display.game_over.clone()),
            }
        }
    }

    impl Input for ScriptedInput {
        fn next_event(&mut self, timeout: Duration) -> io::Result<Option<InputEvent>> {
            let open = self
                .gate
                .as_ref()
                .map_or(true, |gate| gate.load(Ordering::SeqCst));
            if open {
                if let Some(event) = self.events.pop_front() {
                    return Ok(Some(event));
                }
            }
            thread::sleep(timeout);
            Ok(None)
        }
    }

    fn fast_settings() -> Settings {
        Settings {
            board_height: 16,
            tick: Duration::from_millis(1),
        }
    }

    #[test]
    fn test_board_size_defaults_and_clamping() {
        let settings = Settings::default();
        assert_eq!(settings.board_size(Size::new(200, 100)), Size::new(80, 40));
        assert_eq!(settings.board_size(Size::new(60, 30)), Size::new(60, 30));
        assert_eq!(settings.board_size(Size::new(100, 20)), Size::new(80, 20));
        assert_eq!(settings.tick, Duration::from_millis(100));
    }

    #[test]
    fn test_reversal_is_rejected() {
        let control = RoundControl::new(Direction::Right);

        assert!(!control.request_turn(Direction::Left));
        assert_eq!(control.pending_heading(), Direction::Right);

        assert!(control.request_turn(Direction::Up));
        assert_eq!(control.pending_heading(), Direction::Up);
        assert!(control.request_turn(Direction::Down));
        assert_eq!(control.pending_heading(), Direction::Down);
    }

    #[test]
    fn test_reversal_check_uses_last_tick_heading() {
        let control = RoundControl::new(Direction::Right);
        control.request_turn(Direction::Up);
        control.record_heading(Direction::Up);

        assert!(!control.request_turn(Direction::Down));
        assert_eq!(control.pending_heading(), Direction::Up);
        assert!(control.request_turn(Direction::Left));
        assert_eq!(control.pending_heading(), Direction::Left);
    }

    #[test]
    fn test_round_setup() {
        let mut rng = StdRng::seed_from_u64(9);
        let size = Size::new(80, 40);
        let round = Round::new(size, &mut rng);

        assert_eq!(round.snake.len(), INITIAL_LENGTH);
        assert_eq!(round.snake.head().pos, Pos::new(40, 20));
        for segment in round.snake.segments() {
            assert_eq!(round.grid.kind(segment.pos), CellKind::Snake);
            assert_eq!(segment.dir, Direction::Right);
        }
        assert!(round.grid.is_clear(Pos::new(41, 20)));
        assert!(is_fully_reachable(&round.grid, Pos::new(41, 20)));
        assert_eq!(round.score, 0);
        assert!(!round.food);
    }

    #[test]
    fn test_round_runs_until_game_over() {
        let display = RecordingDisplay::new(Size::new(32, 16));
        let mut session = GameSession::new(
            fast_settings(),
            display,
            ScriptedInput::new(&[]),
            StdRng::seed_from_u64(21),
        );

        let end = session.play_round().unwrap();
        assert!(matches!(end, RoundEnd::GameOver { .. }), "{:?}", end);

        // The first frame is the full board
        let frames = &session.display.frames;
        assert_eq!(frames[0].len(), 32 * 16);

        // The last frame overlays the whole snake in the game over colour
        let last = frames.last().unwrap();
        let overlay: Vec<Pos> = last
            .iter()
            .filter(|(_, color)| *color == GAME_OVER_COLOR)
            .map(|(pos, _)| *pos)
            .collect();
        assert!(overlay.len() >= INITIAL_LENGTH);
        let distinct: HashSet<Pos> = overlay.iter().copied().collect();
        assert_eq!(distinct.len(), overlay.len());
        for (_, color) in last {
            assert!(*color == GAME_OVER_COLOR || *color == CellKind::Food.color());
        }
    }

    #[test]
    fn test_quit_stops_the_clock() {
        let settings = Settings {
            board_height: 16,
            tick: Duration::from_millis(200),
        };
        let mut session = GameSession::new(
            settings,
            RecordingDisplay::new(Size::new(32, 16)),
            ScriptedInput::new(&[InputEvent::Quit]),
            StdRng::seed_from_u64(4),
        );

        let started = Instant::now();
        assert_eq!(session.play_round().unwrap(), RoundEnd::Quit);
        assert!(started.elapsed() < Duration::from_secs(2));
    }

    #[test]
    fn test_restart_then_quit() {
        let mut session = GameSession::new(
            fast_settings(),
            RecordingDisplay::new(Size::new(32, 16)),
            ScriptedInput::new(&[InputEvent::Restart, InputEvent::Quit]),
            StdRng::seed_from_u64(8),
        );
        assert_eq!(session.state(), GameState::Idle);

        session.run().unwrap();

        assert_eq!(session.state(), GameState::Exit);
        assert_eq!(session.display.rounds, 2);
    }

    #[test]
    fn test_game_over_waits_for_decision() {
        let display = RecordingDisplay::new(Size::new(32, 16));
        let input = ScriptedInput::after_game_over(
            &[
                InputEvent::Turn(Direction::Up),
                InputEvent::Restart,
                InputEvent::Quit,
            ],
            &display,
        );
        let mut session =
            GameSession::new(fast_settings(), display, input, StdRng::seed_from_u64(17));

        session.run().unwrap();

        assert_eq!(session.state(), GameState::Exit);
        // The turn is ignored, the restart plays a second round which also
        // ends in game over, and the quit then exits
        assert_eq!(session.display.rounds, 2);
        let banner = session.display.banner.clone().unwrap();
        assert!(banner.starts_with("GAME OVER"), "{}", banner);
    }

    #[test]
    fn test_tiny_display_is_rejected() {
        let mut session = GameSession::new(
            Settings::default(),
            RecordingDisplay::new(Size::new(10, 4)),
            ScriptedInput::new(&[]),
            StdRng::seed_from_u64(1),
        );

        let err = session.play_round().unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
    }
}
