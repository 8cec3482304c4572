use crate::{
    Board, EventSink, GameClock, GameConfig, GameEvent, GameReport, Level, MinePlacer, Position,
    Result, SystemTimeSource, TimeSource,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameState {
    NotStarted,
    Playing,
    Won,
    Lost,
}

impl GameState {
    pub fn is_over(self) -> bool {
        matches!(self, GameState::Won | GameState::Lost)
    }
}

/// What a primary click on a hidden cell does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClickMode {
    #[default]
    Reveal,
    Flag,
}

impl ClickMode {
    pub fn toggled(self) -> Self {
        match self {
            ClickMode::Reveal => ClickMode::Flag,
            ClickMode::Flag => ClickMode::Reveal,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevealOutcome {
    NoChange,
    Revealed,
    HitMine,
    Won,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkOutcome {
    NoChange,
    Changed,
}

/// One game of minesweeper: the board plus everything that changes while
/// playing it.
///
/// Every mutating call takes the sink that should receive presentation
/// events. Calls on a finished or paused game are no-ops; the only errors
/// are positions off the board and internal mine placement failures.
#[derive(Debug)]
pub struct Game {
    board: Board,
    level: Option<Level>,
    mine_count: u32,
    state: GameState,
    revealed_count: u32,
    flagged_count: u32,
    first_click_done: bool,
    paused: bool,
    click_mode: ClickMode,
    clock: GameClock,
    placer: MinePlacer,
    pending_report: Option<GameReport>,
}

impl Game {
    pub fn new(config: GameConfig) -> Result<Self> {
        Self::generate(config, MinePlacer::default())
    }

    pub fn with_seed(config: GameConfig, seed: u64) -> Result<Self> {
        Self::generate(config, MinePlacer::new(Some(seed)))
    }

    fn generate(config: GameConfig, mut placer: MinePlacer) -> Result<Self> {
        config.validate()?;
        let board = placer.generate(&config)?;
        Ok(Self::from_board(board, config.level).with_placer(placer))
    }

    /// Starts a game on a prepared board, e.g. one built with
    /// [`Board::with_mines`].
    pub fn from_board(board: Board, level: Option<Level>) -> Self {
        let mine_count = board.mine_count();
        log::debug!(
            "new {}x{} game with {} mines",
            board.dimensions().0,
            board.dimensions().1,
            mine_count
        );

        Self {
            board,
            level,
            mine_count,
            state: GameState::NotStarted,
            revealed_count: 0,
            flagged_count: 0,
            first_click_done: false,
            paused: false,
            click_mode: ClickMode::default(),
            clock: GameClock::new(Box::new(SystemTimeSource::new())),
            placer: MinePlacer::default(),
            pending_report: None,
        }
    }

    /// Replaces the clock's time source. Meant to be called before play starts.
    pub fn with_time_source(mut self, source: Box<dyn TimeSource>) -> Self {
        self.clock = GameClock::new(source);
        self
    }

    /// Replaces the RNG used when the first click moves mines.
    pub fn with_placer(mut self, placer: MinePlacer) -> Self {
        self.placer = placer;
        self
    }

    /// Emits the initial counter values so a fresh view can be drawn.
    pub fn announce(&self, sink: &mut dyn EventSink) {
        sink.emit(GameEvent::MinesRemaining(self.mines_remaining()));
        sink.emit(GameEvent::ClockTick(self.clock.elapsed_seconds()));
    }

    /// Primary action on a cell.
    ///
    /// The first click opens the board safely; clicking a revealed cell
    /// chords; otherwise the click mode decides between reveal and flag.
    pub fn click(&mut self, pos: Position, sink: &mut dyn EventSink) -> Result<()> {
        let is_revealed = self.board.get_cell(pos)?.is_revealed;
        if self.is_blocked() {
            return Ok(());
        }

        if !self.first_click_done {
            self.handle_first_click(pos, sink)?;
        } else if is_revealed {
            self.reveal_neighbors(pos, sink)?;
        } else {
            match self.click_mode {
                ClickMode::Reveal => {
                    self.reveal(pos, sink)?;
                }
                ClickMode::Flag => {
                    self.toggle_flag(pos, sink)?;
                }
            }
        }
        Ok(())
    }

    /// Secondary action (right click): always toggles the flag.
    pub fn secondary_click(&mut self, pos: Position, sink: &mut dyn EventSink) -> Result<()> {
        self.toggle_flag(pos, sink).map(|_| ())
    }

    /// Clears mines from `pos` and its neighbors, starts the game and the
    /// clock, then reveals `pos`. Does nothing once the game has started.
    pub fn handle_first_click(
        &mut self,
        pos: Position,
        sink: &mut dyn EventSink,
    ) -> Result<RevealOutcome> {
        self.board.get_cell(pos)?;
        if self.first_click_done || self.is_blocked() {
            return Ok(RevealOutcome::NoChange);
        }

        let zone = self.safe_zone(pos);
        let affected = self.placer.relocate_mines(&mut self.board, &zone)?;
        self.board.recompute_values(affected);

        self.start();
        self.reveal(pos, sink)
    }

    /// The first click's mine-free area: the cell and its neighbors, or just
    /// the cell when the board is too crowded for that.
    fn safe_zone(&self, pos: Position) -> Vec<Position> {
        let zone: Vec<Position> = std::iter::once(pos)
            .chain(self.board.neighbors_of(pos))
            .collect();

        if self.board.total_cells() - (zone.len() as u32) < self.mine_count {
            log::warn!("Cannot clear the neighborhood of {}, only the clicked cell is safe", pos);
            return vec![pos];
        }
        zone
    }

    fn start(&mut self) {
        if self.first_click_done {
            return;
        }
        self.first_click_done = true;
        self.state = GameState::Playing;
        self.clock.start();
        log::debug!("game started");
    }

    /// Reveals `pos`, flooding outward through zero-valued cells.
    ///
    /// Revealing before the first click skips mine relocation but still
    /// starts the game.
    pub fn reveal(&mut self, pos: Position, sink: &mut dyn EventSink) -> Result<RevealOutcome> {
        let cell = self.board.get_cell(pos)?;
        if self.is_blocked() || cell.is_revealed || cell.is_flagged {
            return Ok(RevealOutcome::NoChange);
        }

        self.start();
        Ok(self.reveal_batch(vec![pos], sink))
    }

    /// Chord: when a revealed cell has exactly as many flagged neighbors as
    /// its value, reveals every other neighbor.
    pub fn reveal_neighbors(
        &mut self,
        pos: Position,
        sink: &mut dyn EventSink,
    ) -> Result<RevealOutcome> {
        let cell = self.board.get_cell(pos)?;
        if self.is_blocked() || !cell.is_revealed {
            return Ok(RevealOutcome::NoChange);
        }
        let Some(value) = cell.value else {
            return Ok(RevealOutcome::NoChange);
        };

        if self.board.count_adjacent_flags(pos) != value {
            return Ok(RevealOutcome::NoChange);
        }

        let neighbors: Vec<Position> = self.board.neighbors_of(pos).collect();
        Ok(self.reveal_batch(neighbors, sink))
    }

    /// Reveals `batch` in order, depth first through zero cells, with an
    /// explicit stack. Stops at the first mine: nothing queued after it is
    /// revealed.
    fn reveal_batch(&mut self, batch: Vec<Position>, sink: &mut dyn EventSink) -> RevealOutcome {
        let mut stack: Vec<Position> = batch.into_iter().rev().collect();
        let mut outcome = RevealOutcome::NoChange;

        while let Some(pos) = stack.pop() {
            let Some(cell) = self.board.cells.get_mut(&pos) else {
                continue;
            };
            if cell.is_revealed || cell.is_flagged {
                continue;
            }

            cell.is_revealed = true;
            let (is_mine, value) = (cell.is_mine, cell.value);
            log::trace!("revealed {} ({:?})", pos, value);
            sink.emit(GameEvent::CellRevealed {
                id: pos.cell_id(),
                is_mine,
                value,
            });

            if is_mine {
                self.end_game(false, sink);
                return RevealOutcome::HitMine;
            }

            self.revealed_count += 1;
            outcome = RevealOutcome::Revealed;

            if value == Some(0) {
                let neighbors: Vec<Position> = self.board.neighbors_of(pos).collect();
                stack.extend(neighbors.into_iter().rev());
            }
        }

        if self.revealed_count == self.safe_cell_count() {
            self.end_game(true, sink);
            return RevealOutcome::Won;
        }
        outcome
    }

    /// Flips the flag on a hidden cell. Not allowed before the first click.
    pub fn toggle_flag(&mut self, pos: Position, sink: &mut dyn EventSink) -> Result<MarkOutcome> {
        let cell = self.board.get_cell(pos)?;
        if self.is_blocked() || !self.first_click_done || cell.is_revealed {
            return Ok(MarkOutcome::NoChange);
        }

        let cell = self.board.cell_mut(pos)?;
        cell.is_flagged = !cell.is_flagged;
        let is_flagged = cell.is_flagged;

        if is_flagged {
            self.flagged_count += 1;
        } else {
            self.flagged_count -= 1;
        }

        sink.emit(GameEvent::FlagToggled {
            id: pos.cell_id(),
            is_flagged,
        });
        sink.emit(GameEvent::MinesRemaining(self.mines_remaining()));
        Ok(MarkOutcome::Changed)
    }

    pub fn toggle_click_mode(&mut self) -> ClickMode {
        self.click_mode = self.click_mode.toggled();
        self.click_mode
    }

    /// Polls the clock, emitting one tick per newly completed second.
    pub fn tick(&mut self, sink: &mut dyn EventSink) {
        if self.paused {
            return;
        }
        for second in self.clock.poll() {
            sink.emit(GameEvent::ClockTick(second));
        }
    }

    /// Stops the clock of a running game and ignores input until resumed.
    pub fn pause(&mut self, sink: &mut dyn EventSink) {
        if self.state != GameState::Playing || self.paused {
            return;
        }
        for second in self.clock.stop() {
            sink.emit(GameEvent::ClockTick(second));
        }
        self.paused = true;
        log::debug!("paused at {}s", self.clock.elapsed_seconds());
    }

    pub fn resume(&mut self) {
        if !self.paused {
            return;
        }
        self.paused = false;
        self.clock.start();
        log::debug!("resumed at {}s", self.clock.elapsed_seconds());
    }

    fn end_game(&mut self, won: bool, sink: &mut dyn EventSink) {
        if self.state.is_over() {
            return;
        }

        self.state = if won { GameState::Won } else { GameState::Lost };
        for second in self.clock.stop() {
            sink.emit(GameEvent::ClockTick(second));
        }
        sink.emit(GameEvent::GameOver { won });

        let report = GameReport {
            elapsed_seconds: self.clock.elapsed_seconds(),
            won,
            level: self.level_name().to_string(),
            revealed_count: self.revealed_count,
        };
        log::info!(
            "game {} after {}s with {} cells revealed",
            if won { "won" } else { "lost" },
            report.elapsed_seconds,
            report.revealed_count
        );
        self.pending_report = Some(report);
    }

    /// The end-of-game report, handed out once.
    pub fn take_report(&mut self) -> Option<GameReport> {
        self.pending_report.take()
    }

    fn is_blocked(&self) -> bool {
        self.paused || self.state.is_over()
    }

    pub fn state(&self) -> GameState {
        self.state
    }

    pub fn is_over(&self) -> bool {
        self.state.is_over()
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn first_click_done(&self) -> bool {
        self.first_click_done
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.board.dimensions()
    }

    pub fn level_name(&self) -> &'static str {
        self.level.map_or("custom", Level::name)
    }

    pub fn click_mode(&self) -> ClickMode {
        self.click_mode
    }

    pub fn mine_count(&self) -> u32 {
        self.mine_count
    }

    pub fn revealed_count(&self) -> u32 {
        self.revealed_count
    }

    pub fn flagged_count(&self) -> u32 {
        self.flagged_count
    }

    fn safe_cell_count(&self) -> u32 {
        self.board.total_cells() - self.mine_count
    }

    /// Mines minus flags. Negative when the player has over-flagged.
    pub fn mines_remaining(&self) -> i32 {
        self.mine_count as i32 - self.flagged_count as i32
    }

    pub fn elapsed_seconds(&self) -> u32 {
        self.clock.elapsed_seconds()
    }

    pub fn is_clock_running(&self) -> bool {
        self.clock.is_running()
    }
}
