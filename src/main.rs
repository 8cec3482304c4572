use anyhow::Context;
use clap::Parser;
use clap_verbosity_flag::Verbosity;
use minesweeper_engine::{
    format_clock, CellView, ClickMode, EventSink, Game, GameConfig, GameEvent, GameState,
    JsonLinesReporter, Level, LogReporter, Position, ScoreReporter, Session, POLL_INTERVAL,
};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::mpsc;
use std::thread;

#[derive(Parser, Debug)]
#[command(name = "minesweeper", about = "Terminal minesweeper", version)]
struct Cli {
    /// Preset level: beginner, intermediate or expert
    #[arg(long, default_value_t = Level::Beginner)]
    level: Level,
    /// Custom board rows (needs --cols and --mines)
    #[arg(long, requires_all = ["cols", "mines"])]
    rows: Option<u32>,
    /// Custom board columns
    #[arg(long, requires_all = ["rows", "mines"])]
    cols: Option<u32>,
    /// Custom mine count
    #[arg(long, requires_all = ["rows", "cols"])]
    mines: Option<u32>,
    /// Seed for reproducible mine layouts
    #[arg(long)]
    seed: Option<u64>,
    /// Append finished games as JSON lines to this file
    #[arg(long)]
    report_file: Option<PathBuf>,
    #[command(flatten)]
    verbose: Verbosity,
}

enum Input {
    Line(String),
    Tick,
    Eof,
}

/// Counters and end state as the player sees them.
#[derive(Debug, Default)]
struct TerminalView {
    mines_remaining: i32,
    elapsed: u32,
    clock_changed: bool,
    outcome: Option<bool>,
}

impl TerminalView {
    /// True once after every `ClockTick`, so the timer is redrawn only when
    /// a second has actually passed.
    fn take_clock_update(&mut self) -> bool {
        std::mem::take(&mut self.clock_changed)
    }

    /// Timer plus prompt, redrawn in place on the current line.
    fn prompt_line(&self) -> String {
        format!("\r[{}] > ", format_clock(self.elapsed))
    }
}

impl EventSink for TerminalView {
    fn emit(&mut self, event: GameEvent) {
        match event {
            GameEvent::MinesRemaining(n) => self.mines_remaining = n,
            GameEvent::ClockTick(s) => {
                self.elapsed = s;
                self.clock_changed = true;
            }
            GameEvent::GameOver { won } => self.outcome = Some(won),
            GameEvent::CellRevealed { id, .. } => log::trace!("revealed {}", id),
            GameEvent::FlagToggled { id, is_flagged } => log::trace!("flag {} {}", id, is_flagged),
        }
    }
}

fn main() {
    let cli = Cli::parse();
    env_logger::Builder::new()
        .filter_level(cli.verbose.log_level_filter())
        .init();

    match run(cli) {
        Ok(_) => println!("Thanks for playing!"),
        Err(e) => {
            eprintln!("Game error: {:#}", e);
            std::process::exit(1);
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let reporter: Box<dyn ScoreReporter> = match &cli.report_file {
        Some(path) => Box::new(
            JsonLinesReporter::append_to(path)
                .with_context(|| format!("opening report file {}", path.display()))?,
        ),
        None => Box::new(LogReporter),
    };

    let mut session = Session::new(cli.level, reporter);
    if let Some(seed) = cli.seed {
        session = session.with_seed(seed);
    }

    let mut custom = match (cli.rows, cli.cols, cli.mines) {
        (Some(rows), Some(cols), Some(mines)) => Some(GameConfig::custom(rows, cols, mines)?),
        _ => None,
    };

    let mut view = TerminalView::default();
    new_game(&mut session, custom, &mut view)?;
    print_help();
    render(&session, &view);

    for input in spawn_inputs() {
        let line = match input {
            Input::Tick => {
                session.tick(&mut view);
                if view.take_clock_update() {
                    prompt(&view);
                }
                continue;
            }
            Input::Eof => break,
            Input::Line(line) => line,
        };

        let parts: Vec<&str> = line.split_whitespace().collect();
        let Some(&command) = parts.first() else {
            prompt(&view);
            continue;
        };

        match command {
            "q" | "quit" => break,
            "h" | "help" => print_help(),
            "n" | "new" => new_game(&mut session, custom, &mut view)?,
            "+" | "-" => {
                let level = if command == "+" {
                    session.increase_level()
                } else {
                    session.decrease_level()
                };
                custom = None;
                println!("Level: {}", level);
                new_game(&mut session, custom, &mut view)?;
            }
            "m" | "mode" => {
                if let Some(mode) = session.toggle_click_mode() {
                    println!("Click mode: {}", mode_name(mode));
                }
            }
            "p" | "pause" => session.toggle_pause(&mut view),
            "c" | "x" => {
                let Some(pos) = parse_position(&parts[1..]) else {
                    println!("Usage: {} <row> <col>", command);
                    prompt(&view);
                    continue;
                };
                let result = if command == "c" {
                    session.click(pos, &mut view)
                } else {
                    session.secondary_click(pos, &mut view)
                };
                if let Err(e) = result {
                    println!("Error: {}", e);
                }
            }
            other => println!("Unknown command {:?}, type 'h' for help", other),
        }

        render(&session, &view);
    }

    Ok(())
}

fn new_game(
    session: &mut Session<Box<dyn ScoreReporter>>,
    custom: Option<GameConfig>,
    view: &mut TerminalView,
) -> anyhow::Result<()> {
    *view = TerminalView::default();
    match custom {
        Some(config) => session.start_custom(config, view)?,
        None => session.start_game(view)?,
    };
    Ok(())
}

/// Stdin lines and clock ticks, merged into one stream so that all game
/// state is touched from the main thread only.
fn spawn_inputs() -> mpsc::Receiver<Input> {
    let (tx, rx) = mpsc::channel();

    let ticks = tx.clone();
    thread::spawn(move || loop {
        thread::sleep(POLL_INTERVAL);
        if ticks.send(Input::Tick).is_err() {
            break;
        }
    });

    thread::spawn(move || {
        for line in io::stdin().lock().lines() {
            let Ok(line) = line else { break };
            if tx.send(Input::Line(line)).is_err() {
                return;
            }
        }
        let _ = tx.send(Input::Eof);
    });

    rx
}

fn parse_position(args: &[&str]) -> Option<Position> {
    match args {
        [row, col] => Some(Position::new(row.parse().ok()?, col.parse().ok()?)),
        _ => None,
    }
}

fn mode_name(mode: ClickMode) -> &'static str {
    match mode {
        ClickMode::Reveal => "reveal",
        ClickMode::Flag => "flag",
    }
}

fn print_help() {
    println!("Commands:");
    println!("  c <row> <col>  click (reveal, flag or chord depending on mode and cell)");
    println!("  x <row> <col>  toggle flag");
    println!("  m              switch click mode between reveal and flag");
    println!("  p              pause / resume");
    println!("  n              new game");
    println!("  + / -          harder / easier level, starts a new game");
    println!("  q              quit");
}

fn prompt(view: &TerminalView) {
    print!("{}", view.prompt_line());
    let _ = io::stdout().flush();
}

fn render(session: &Session<Box<dyn ScoreReporter>>, view: &TerminalView) {
    let Some(game) = session.game() else {
        return;
    };

    println!();
    println!(
        "{}  Mines: {}  Time: {}  Mode: {}{}",
        game.level_name(),
        view.mines_remaining,
        format_clock(view.elapsed),
        mode_name(game.click_mode()),
        if game.is_paused() { "  [paused]" } else { "" }
    );
    print_board(game);

    match (game.state(), view.outcome) {
        (GameState::Won, _) | (_, Some(true)) => println!("YOU WIN! ('n' for a new game)"),
        (GameState::Lost, _) | (_, Some(false)) => println!("GAME OVER ('n' for a new game)"),
        _ => {}
    }
    prompt(view);
}

fn print_board(game: &Game) {
    let grid = game.board().view(game.state() == GameState::Lost);
    let (_, cols) = game.dimensions();

    // Print column numbers
    print!("    ");
    for col in 0..cols {
        print!("{:>3}", col);
    }
    println!();

    for (row, cells) in grid.outer_iter().enumerate() {
        print!("{:>3} ", row);
        for cell in cells.iter() {
            let symbol = match cell {
                CellView::Hidden => "#".to_string(),
                CellView::Flagged => "F".to_string(),
                CellView::Mine => "*".to_string(),
                CellView::Revealed(0) => " ".to_string(),
                CellView::Revealed(n) => n.to_string(),
            };
            print!("{:>3}", symbol);
        }
        println!();
    }
}
