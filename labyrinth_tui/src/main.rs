use labyrinth_core::{
    Direction, Position,
    config::RoundConfig,
    round::{Game, InputSource, RoundError, RoundOutcome, RoundView, Renderer, StatusMessage, Tile},
};
use anyhow::{Context, Result};
use clap::Parser;
use rand::{SeedableRng, rngs::StdRng};
use ratatui::{
    Frame, Terminal,
    backend::CrosstermBackend,
    crossterm::{
        event::{self, Event, KeyCode, KeyEventKind},
        execute,
        terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
    },
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Color, Style, Stylize},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, Paragraph},
};
use std::{
    fs::File,
    io::{self, Stdout},
    path::{Path, PathBuf},
    sync::Mutex,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

type Term = Terminal<CrosstermBackend<Stdout>>;

#[derive(Parser, Debug)]
#[command(version, about = "Find the key, then the one unlocked exit", long_about = None)]
struct Args {
    /// Seed for a reproducible sequence of labyrinths
    #[arg(short, long)]
    seed: Option<u64>,

    /// Write diagnostics to this file (filter with RUST_LOG)
    #[arg(long, value_name = "LOG_FILE")]
    log_file: Option<PathBuf>,
}

fn main() -> Result<()> {
    let args = Args::parse();
    if let Some(path) = &args.log_file {
        init_logging(path)?;
    }

    let rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };
    let mut game = Game::new(RoundConfig::default(), rng)?;
    info!(seed = ?args.seed, "starting labyrinth");

    let mut terminal = setup_terminal()?;
    // Restore the terminal even if the session failed.
    let result = run_app(&mut terminal, &mut game);
    restore_terminal(&mut terminal)?;
    result
}

/// Sends tracing output to `path`; the terminal itself belongs to the UI.
fn init_logging(path: &Path) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("Failed to create log file {}", path.display()))?;
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

/// Configures the terminal for TUI interaction.
fn setup_terminal() -> Result<Term> {
    let mut stdout = io::stdout();
    enable_raw_mode()?;
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    Terminal::new(backend).map_err(Into::into)
}

/// Restores the terminal to its original state.
fn restore_terminal(terminal: &mut Term) -> Result<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}

/// Plays rounds until the player declines a replay or quits mid-round.
fn run_app(terminal: &mut Term, game: &mut Game<StdRng>) -> Result<()> {
    let mut input = KeyboardInput;
    loop {
        let outcome = {
            let mut renderer = TerminalRenderer { terminal: &mut *terminal };
            match game.start_new_round(&mut renderer, &mut input) {
                Ok(outcome) => outcome,
                Err(RoundError::Aborted) => {
                    info!("player quit mid-round");
                    return Ok(());
                }
                Err(err) => return Err(err.into()),
            }
        };
        info!(?outcome, "round finished");

        terminal.draw(|f| outcome_ui(f, outcome))?;
        if !wait_for_replay()? {
            return Ok(());
        }
    }
}

struct TerminalRenderer<'t> {
    terminal: &'t mut Term,
}

impl Renderer for TerminalRenderer<'_> {
    fn render(&mut self, view: &RoundView<'_>) -> Result<(), RoundError> {
        self.terminal.draw(|f| ui(f, view))?;
        Ok(())
    }
}

/// Reads movement keys from the keyboard.
struct KeyboardInput;

impl InputSource for KeyboardInput {
    fn read_direction(&mut self) -> Result<Direction, RoundError> {
        loop {
            let Event::Key(key) = event::read()? else {
                continue;
            };
            if key.kind != KeyEventKind::Press {
                continue;
            }
            return match key.code {
                KeyCode::Esc | KeyCode::Char('q') => Err(RoundError::Aborted),
                code => Ok(direction_for(code)),
            };
        }
    }
}

/// Arrows and WASD move; any other key passes the turn.
fn direction_for(code: KeyCode) -> Direction {
    match code {
        KeyCode::Up | KeyCode::Char('w') => Direction::Up,
        KeyCode::Down | KeyCode::Char('s') => Direction::Down,
        KeyCode::Left | KeyCode::Char('a') => Direction::Left,
        KeyCode::Right | KeyCode::Char('d') => Direction::Right,
        _ => Direction::None,
    }
}

fn wait_for_replay() -> Result<bool> {
    loop {
        if let Event::Key(key) = event::read()? {
            if key.kind != KeyEventKind::Press {
                continue;
            }
            return Ok(matches!(key.code, KeyCode::Char('y') | KeyCode::Enter));
        }
    }
}

/// Renders the field and the status messages of the current tick.
fn ui(frame: &mut Frame, view: &RoundView<'_>) {
    let map_height = view.field.rows() as u16 + 2;
    let main_layout = Layout::vertical([
        Constraint::Length(map_height),
        Constraint::Length(view.messages.len() as u16 + 2),
        Constraint::Min(1),
    ])
    .split(frame.area());

    render_map(frame, main_layout[0], view);
    render_messages(frame, main_layout[1], view.messages);

    let help_text = Paragraph::new("Arrows/WASD to move, 'q' or 'Esc' to quit.")
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::TOP));
    frame.render_widget(help_text, main_layout[2]);
}

fn tile_span(tile: Tile) -> Span<'static> {
    match tile {
        Tile::Player => Span::styled("@", Style::default().fg(Color::Red).bold()),
        Tile::Key => Span::styled("k", Style::default().fg(Color::Yellow)),
        Tile::Exit => Span::styled("E", Style::default().fg(Color::Green)),
        Tile::Wall => Span::styled("#", Style::default().fg(Color::DarkGray)),
        Tile::Empty => Span::raw("."),
    }
}

/// Renders the field with the player, key and exits overlaid.
fn render_map(frame: &mut Frame, area: Rect, view: &RoundView<'_>) {
    let field = view.field;
    let lines: Vec<Line> = (0..field.rows())
        .map(|row| {
            let spans: Vec<Span> = (0..field.columns())
                .map(|col| tile_span(view.tile_at(Position::new(row as i32, col as i32))))
                .collect();
            Line::from(spans)
        })
        .collect();

    let map_paragraph = Paragraph::new(lines)
        .block(Block::default().title("Labyrinth").borders(Borders::ALL))
        .alignment(Alignment::Center);
    frame.render_widget(map_paragraph, area);
}

fn render_messages(frame: &mut Frame, area: Rect, messages: &[StatusMessage]) {
    let items: Vec<ListItem> = messages
        .iter()
        .map(|message| {
            let style = match message {
                StatusMessage::MovesLeft(_) => Style::default(),
                StatusMessage::GotKey => Style::default().fg(Color::Yellow),
                StatusMessage::Closed => Style::default().fg(Color::Red),
            };
            ListItem::from(Line::from(Span::styled(message.to_string(), style)))
        })
        .collect();

    let list = List::new(items).block(Block::default().borders(Borders::ALL).title("Status"));
    frame.render_widget(list, area);
}

fn outcome_ui(frame: &mut Frame, outcome: RoundOutcome) {
    let headline = match outcome {
        RoundOutcome::Won { moves_left } => Line::from(Span::styled(
            format!("You won! {moves_left} moves to spare."),
            Style::default().fg(Color::Green).bold(),
        )),
        RoundOutcome::Lost => Line::from(Span::styled(
            "You lost! Out of moves.",
            Style::default().fg(Color::Red).bold(),
        )),
    };
    let text = vec![headline, Line::default(), Line::from("Play again? (y/n)")];
    let paragraph = Paragraph::new(text)
        .alignment(Alignment::Center)
        .block(Block::default().title("Labyrinth").borders(Borders::ALL));
    frame.render_widget(paragraph, frame.area());
}
