use std::fmt;

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, trace};

use crate::{
    Direction, Position,
    config::{ConfigError, RoundConfig},
    field::{Cell, Field, Layout, generate_field, generate_layout, try_move},
    map::GridError,
};

/// Lifecycle of a round. `Won` and `Lost` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoundStatus {
    InProgress,
    Won,
    Lost,
}

/// The result handed back to the caller once a round is over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoundOutcome {
    Won { moves_left: u32 },
    Lost,
}

impl RoundOutcome {
    pub fn is_win(&self) -> bool {
        matches!(self, RoundOutcome::Won { .. })
    }
}

/// A line of status text shown under the field each tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StatusMessage {
    MovesLeft(u32),
    GotKey,
    Closed,
}

impl fmt::Display for StatusMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatusMessage::MovesLeft(moves) => write!(f, "Moves left: {moves}"),
            StatusMessage::GotKey => f.write_str("You've got a key!"),
            StatusMessage::Closed => f.write_str("Closed!"),
        }
    }
}

/// Failures coming from the collaborators that drive a round.
#[derive(Debug, thiserror::Error)]
pub enum RoundError {
    #[error("Round aborted by the player")]
    Aborted,
    #[error("Terminal I/O failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised when assembling a round from a hand-made layout.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LayoutError {
    #[error(transparent)]
    Grid(#[from] GridError),
    #[error("Correct exit index {index} is out of range for {exits} exits")]
    CorrectExit { index: usize, exits: usize },
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// What a renderer should draw at a given cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tile {
    Player,
    Key,
    Exit,
    Wall,
    Empty,
}

/// Read-only snapshot of a round handed to the renderer.
#[derive(Debug)]
pub struct RoundView<'a> {
    pub field: &'a Field,
    pub player: Position,
    pub key: Position,
    pub exits: &'a [Position],
    pub key_held: bool,
    pub moves_left: u32,
    pub messages: &'a [StatusMessage],
}

impl RoundView<'_> {
    /// Resolves the overlay at `position`: player, then the key while it is
    /// still on the ground, then exits, then the field cell itself.
    pub fn tile_at(&self, position: Position) -> Tile {
        if self.player == position {
            Tile::Player
        } else if self.key == position && !self.key_held {
            Tile::Key
        } else if self.exits.contains(&position) {
            Tile::Exit
        } else {
            match self.field.get(position) {
                Some(Cell::Wall) => Tile::Wall,
                _ => Tile::Empty,
            }
        }
    }
}

/// Draws the field and the status messages of the current tick.
pub trait Renderer {
    fn render(&mut self, view: &RoundView<'_>) -> Result<(), RoundError>;
}

/// Supplies one movement intent per tick, blocking until one is available.
pub trait InputSource {
    fn read_direction(&mut self) -> Result<Direction, RoundError>;
}

/// All mutable data of a single round.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoundState {
    field: Field,
    layout: Layout,
    correct_exit: usize,
    player: Position,
    key_held: bool,
    moves_left: u32,
    status: RoundStatus,
}

impl RoundState {
    /// Generates the special objects, then the field, then picks the correct exit.
    ///
    /// # Panics
    ///
    /// Panics if `config` has no exits or an empty field; see [`RoundConfig::validate`].
    pub fn generate<R: Rng + ?Sized>(config: &RoundConfig, rng: &mut R) -> Self {
        let layout = generate_layout(config, rng);
        let field = generate_field(config, &layout, rng);
        let correct_exit = rng.random_range(0..layout.exits.len());
        debug!(
            player = ?layout.player,
            key = ?layout.key,
            exits = ?layout.exits,
            correct_exit,
            "generated round"
        );
        RoundState {
            player: layout.player,
            field,
            layout,
            correct_exit,
            key_held: false,
            moves_left: config.max_moves,
            status: RoundStatus::InProgress,
        }
    }

    /// Builds a round from a prepared field and layout.
    ///
    /// Walls under special objects are cleared.
    pub fn with_layout(
        mut field: Field,
        layout: Layout,
        correct_exit: usize,
        max_moves: u32,
    ) -> Result<Self, LayoutError> {
        if max_moves == 0 {
            return Err(ConfigError::NoMoves.into());
        }
        if layout.exits.is_empty() {
            return Err(ConfigError::NoExits.into());
        }
        if correct_exit >= layout.exits.len() {
            return Err(LayoutError::CorrectExit {
                index: correct_exit,
                exits: layout.exits.len(),
            });
        }
        let specials = [layout.player, layout.key]
            .into_iter()
            .chain(layout.exits.iter().copied());
        for position in specials {
            field.set(position, Cell::Empty)?;
        }
        Ok(RoundState {
            player: layout.player,
            field,
            layout,
            correct_exit,
            key_held: false,
            moves_left: max_moves,
            status: RoundStatus::InProgress,
        })
    }

    pub fn field(&self) -> &Field {
        &self.field
    }

    pub fn player(&self) -> Position {
        self.player
    }

    pub fn key(&self) -> Position {
        self.layout.key
    }

    pub fn exits(&self) -> &[Position] {
        &self.layout.exits
    }

    pub fn correct_exit(&self) -> Position {
        self.layout.exits[self.correct_exit]
    }

    pub fn key_held(&self) -> bool {
        self.key_held
    }

    pub fn moves_left(&self) -> u32 {
        self.moves_left
    }

    pub fn status(&self) -> RoundStatus {
        self.status
    }

    pub fn outcome(&self) -> Option<RoundOutcome> {
        match self.status {
            RoundStatus::InProgress => None,
            RoundStatus::Won => Some(RoundOutcome::Won {
                moves_left: self.moves_left,
            }),
            RoundStatus::Lost => Some(RoundOutcome::Lost),
        }
    }

    fn on_key_unheld(&self) -> bool {
        self.player == self.layout.key && !self.key_held
    }

    /// Messages for the current tick. Must be taken before [`collect_key`](Self::collect_key)
    /// so the key message appears only on the pickup tick.
    pub fn status_messages(&self) -> Vec<StatusMessage> {
        let mut messages = vec![StatusMessage::MovesLeft(self.moves_left)];
        if self.on_key_unheld() {
            messages.push(StatusMessage::GotKey);
        }
        let on_correct_exit = self.player == self.correct_exit();
        if self.layout.is_exit(self.player) && (!on_correct_exit || !self.key_held) {
            messages.push(StatusMessage::Closed);
        }
        messages
    }

    /// Picks up the key if the player stands on it. Returns `true` on the pickup tick only.
    pub fn collect_key(&mut self) -> bool {
        if self.on_key_unheld() {
            self.key_held = true;
            debug!(position = ?self.player, "key collected");
            true
        } else {
            false
        }
    }

    /// Applies one movement intent. A rejected move still costs a turn.
    pub fn advance(&mut self, direction: Direction) -> RoundStatus {
        if self.status != RoundStatus::InProgress {
            return self.status;
        }
        let candidate = self.player + direction;
        let accepted = try_move(&self.field, candidate);
        if accepted {
            self.player = candidate;
        }
        self.moves_left = self.moves_left.saturating_sub(1);
        trace!(?direction, ?candidate, accepted, moves_left = self.moves_left, "move");
        self.check_end_game();
        self.status
    }

    /// Decides whether the round is over, recording the result. A win takes
    /// precedence over running out of moves on the same tick.
    pub fn check_end_game(&mut self) -> bool {
        if self.status != RoundStatus::InProgress {
            return true;
        }
        if self.key_held && self.player == self.correct_exit() {
            self.status = RoundStatus::Won;
        } else if self.moves_left == 0 {
            self.status = RoundStatus::Lost;
        } else {
            return false;
        }
        info!(status = ?self.status, moves_left = self.moves_left, "round over");
        true
    }

    pub fn view<'a>(&'a self, messages: &'a [StatusMessage]) -> RoundView<'a> {
        RoundView {
            field: &self.field,
            player: self.player,
            key: self.layout.key,
            exits: &self.layout.exits,
            key_held: self.key_held,
            moves_left: self.moves_left,
            messages,
        }
    }
}

/// Runs `round` to completion: render, messages, key pickup, input, move, check.
pub fn play_round<V, I>(
    round: &mut RoundState,
    renderer: &mut V,
    input: &mut I,
) -> Result<RoundOutcome, RoundError>
where
    V: Renderer + ?Sized,
    I: InputSource + ?Sized,
{
    loop {
        if let Some(outcome) = round.outcome() {
            return Ok(outcome);
        }
        let messages = round.status_messages();
        renderer.render(&round.view(&messages))?;
        round.collect_key();
        let direction = input.read_direction()?;
        round.advance(direction);
    }
}

/// Owns the round constants and the random source every round draws from.
#[derive(Debug)]
pub struct Game<R> {
    config: RoundConfig,
    rng: R,
}

impl<R: Rng> Game<R> {
    pub fn new(config: RoundConfig, rng: R) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Game { config, rng })
    }

    pub fn config(&self) -> &RoundConfig {
        &self.config
    }

    /// Generates a fresh round without playing it.
    pub fn new_round(&mut self) -> RoundState {
        RoundState::generate(&self.config, &mut self.rng)
    }

    /// Plays a freshly generated round and returns how it ended.
    pub fn start_new_round<V, I>(
        &mut self,
        renderer: &mut V,
        input: &mut I,
    ) -> Result<RoundOutcome, RoundError>
    where
        V: Renderer + ?Sized,
        I: InputSource + ?Sized,
    {
        let mut round = self.new_round();
        play_round(&mut round, renderer, input)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::parse_field;

    fn open_field(rows: usize, columns: usize) -> Field {
        let text = vec![".".repeat(columns); rows].join("\n");
        parse_field(&text).unwrap()
    }

    fn round_at(player: Position, key: Position, exits: Vec<Position>, correct: usize) -> RoundState {
        let layout = Layout { player, key, exits };
        RoundState::with_layout(open_field(5, 5), layout, correct, 40).unwrap()
    }

    #[test]
    fn messages_report_moves_left_first() {
        let round = round_at(
            Position::new(0, 0),
            Position::new(4, 4),
            vec![Position::new(2, 2)],
            0,
        );
        assert_eq!(round.status_messages(), vec![StatusMessage::MovesLeft(40)]);
    }

    #[test]
    fn wrong_exit_is_closed_even_with_key() {
        let mut round = round_at(
            Position::new(0, 0),
            Position::new(0, 1),
            vec![Position::new(0, 2), Position::new(4, 4)],
            1,
        );
        round.advance(Direction::Right);
        round.collect_key();
        round.advance(Direction::Right);
        assert!(round.key_held());
        assert_eq!(round.status(), RoundStatus::InProgress);
        assert!(round.status_messages().contains(&StatusMessage::Closed));
    }

    #[test]
    fn correct_exit_without_key_is_closed() {
        let mut round = round_at(
            Position::new(0, 0),
            Position::new(4, 4),
            vec![Position::new(0, 1)],
            0,
        );
        assert_eq!(round.advance(Direction::Right), RoundStatus::InProgress);
        assert!(round.status_messages().contains(&StatusMessage::Closed));
    }

    #[test]
    fn key_message_only_on_pickup_tick() {
        let mut round = round_at(
            Position::new(0, 0),
            Position::new(0, 1),
            vec![Position::new(4, 4)],
            0,
        );
        round.advance(Direction::Right);
        assert!(round.status_messages().contains(&StatusMessage::GotKey));
        assert!(round.collect_key());
        assert!(!round.status_messages().contains(&StatusMessage::GotKey));
        assert!(!round.collect_key());

        round.advance(Direction::Left);
        round.advance(Direction::Right);
        assert!(!round.status_messages().contains(&StatusMessage::GotKey));
        assert!(round.key_held());
    }

    #[test]
    fn win_takes_precedence_on_last_move() {
        let layout = Layout {
            player: Position::new(0, 0),
            key: Position::new(0, 0),
            exits: vec![Position::new(0, 1)],
        };
        let mut round = RoundState::with_layout(open_field(1, 2), layout, 0, 1).unwrap();
        round.collect_key();
        assert_eq!(round.advance(Direction::Right), RoundStatus::Won);
        assert_eq!(round.outcome(), Some(RoundOutcome::Won { moves_left: 0 }));
    }

    #[test]
    fn terminal_rounds_ignore_further_moves() {
        let layout = Layout {
            player: Position::new(0, 0),
            key: Position::new(1, 1),
            exits: vec![Position::new(1, 0)],
        };
        let mut round = RoundState::with_layout(open_field(2, 2), layout, 0, 1).unwrap();
        assert_eq!(round.advance(Direction::None), RoundStatus::Lost);
        assert_eq!(round.advance(Direction::Right), RoundStatus::Lost);
        assert_eq!(round.moves_left(), 0);
        assert_eq!(round.player(), Position::new(0, 0));
    }

    #[test]
    fn view_hides_collected_key_and_prefers_player() {
        let field = parse_field("..\n.#").unwrap();
        let layout = Layout {
            player: Position::new(0, 0),
            key: Position::new(0, 1),
            exits: vec![Position::new(1, 0), Position::new(0, 0)],
        };
        let mut round = RoundState::with_layout(field, layout, 0, 5).unwrap();
        let messages = round.status_messages();
        let view = round.view(&messages);
        assert_eq!(view.tile_at(Position::new(0, 0)), Tile::Player);
        assert_eq!(view.tile_at(Position::new(0, 1)), Tile::Key);
        assert_eq!(view.tile_at(Position::new(1, 0)), Tile::Exit);
        assert_eq!(view.tile_at(Position::new(1, 1)), Tile::Wall);

        round.advance(Direction::Right);
        round.collect_key();
        round.advance(Direction::Left);
        let view = round.view(&[]);
        assert_eq!(view.tile_at(Position::new(0, 1)), Tile::Empty);
    }

    #[test]
    fn with_layout_validates_and_clears_specials() {
        let field = parse_field("##\n##").unwrap();
        let layout = Layout {
            player: Position::new(0, 0),
            key: Position::new(1, 1),
            exits: vec![Position::new(1, 0)],
        };
        let round = RoundState::with_layout(field.clone(), layout.clone(), 0, 3).unwrap();
        assert_eq!(round.field()[Position::new(0, 0)], Cell::Empty);
        assert_eq!(round.field()[Position::new(1, 1)], Cell::Empty);
        assert_eq!(round.field()[Position::new(0, 1)], Cell::Wall);

        assert_eq!(
            RoundState::with_layout(field.clone(), layout.clone(), 1, 3).unwrap_err(),
            LayoutError::CorrectExit { index: 1, exits: 1 }
        );
        let outside = Layout {
            key: Position::new(2, 0),
            ..layout
        };
        assert!(matches!(
            RoundState::with_layout(field, outside, 0, 3),
            Err(LayoutError::Grid(GridError::OutOfBounds { .. }))
        ));
    }

    #[test]
    fn message_text() {
        assert_eq!(StatusMessage::MovesLeft(7).to_string(), "Moves left: 7");
        assert_eq!(StatusMessage::GotKey.to_string(), "You've got a key!");
        assert_eq!(StatusMessage::Closed.to_string(), "Closed!");
    }
}
