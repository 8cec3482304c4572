use crate::{
    ClickMode, EventSink, Game, GameConfig, Level, LogReporter, MinePlacer, Position, Result,
    ScoreReporter, SystemTimeSource, TimeSource,
};

type TimeSourceFactory = Box<dyn Fn() -> Box<dyn TimeSource>>;

/// Everything a front end keeps between games: the selected level, the
/// current game and where finished games are reported.
pub struct Session<R: ScoreReporter = LogReporter> {
    level: Level,
    seed: Option<u64>,
    games_started: u64,
    game: Option<Game>,
    reporter: R,
    time_sources: TimeSourceFactory,
}

impl<R: ScoreReporter> Session<R> {
    pub fn new(level: Level, reporter: R) -> Self {
        Self {
            level,
            seed: None,
            games_started: 0,
            game: None,
            reporter,
            time_sources: Box::new(|| Box::new(SystemTimeSource::new())),
        }
    }

    /// Makes every game of the session reproducible. Each new game derives
    /// its own seed from this one.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_time_sources<F>(mut self, factory: F) -> Self
    where
        F: Fn() -> Box<dyn TimeSource> + 'static,
    {
        self.time_sources = Box::new(factory);
        self
    }

    /// Selects the next harder preset for the next game.
    pub fn increase_level(&mut self) -> Level {
        self.level = self.level.next();
        self.level
    }

    /// Selects the next easier preset for the next game.
    pub fn decrease_level(&mut self) -> Level {
        self.level = self.level.prev();
        self.level
    }

    /// Throws away the current game, if any, and starts one at the selected level.
    pub fn start_game(&mut self, sink: &mut dyn EventSink) -> Result<&mut Game> {
        self.start_with(self.level.config(), sink)
    }

    pub fn start_custom(&mut self, config: GameConfig, sink: &mut dyn EventSink) -> Result<&mut Game> {
        self.start_with(config, sink)
    }

    fn start_with(&mut self, config: GameConfig, sink: &mut dyn EventSink) -> Result<&mut Game> {
        config.validate()?;

        let seed = self.seed.map(|seed| seed.wrapping_add(self.games_started));
        let mut placer = MinePlacer::new(seed);
        let board = placer.generate(&config)?;
        let game = Game::from_board(board, config.level)
            .with_placer(placer)
            .with_time_source((self.time_sources)());

        self.games_started += 1;
        log::debug!("starting game #{} ({})", self.games_started, config.level_name());
        game.announce(sink);

        Ok(self.game.insert(game))
    }

    pub fn game(&self) -> Option<&Game> {
        self.game.as_ref()
    }

    pub fn reporter(&self) -> &R {
        &self.reporter
    }

    pub fn games_started(&self) -> u64 {
        self.games_started
    }

    pub fn click(&mut self, pos: Position, sink: &mut dyn EventSink) -> Result<()> {
        if let Some(game) = self.game.as_mut() {
            game.click(pos, sink)?;
        }
        self.flush_report();
        Ok(())
    }

    pub fn secondary_click(&mut self, pos: Position, sink: &mut dyn EventSink) -> Result<()> {
        if let Some(game) = self.game.as_mut() {
            game.secondary_click(pos, sink)?;
        }
        self.flush_report();
        Ok(())
    }

    pub fn tick(&mut self, sink: &mut dyn EventSink) {
        if let Some(game) = self.game.as_mut() {
            game.tick(sink);
        }
    }

    pub fn toggle_click_mode(&mut self) -> Option<ClickMode> {
        self.game.as_mut().map(Game::toggle_click_mode)
    }

    /// Pauses a running game or resumes a paused one.
    pub fn toggle_pause(&mut self, sink: &mut dyn EventSink) {
        if let Some(game) = self.game.as_mut() {
            if game.is_paused() {
                game.resume();
            } else {
                game.pause(sink);
            }
        }
    }

    /// Hands a finished game's report to the reporter. Failures are logged
    /// and otherwise ignored.
    fn flush_report(&mut self) {
        let Some(report) = self.game.as_mut().and_then(Game::take_report) else {
            return;
        };
        if let Err(err) = self.reporter.submit(&report) {
            log::warn!("Could not submit game report: {}", err);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ReportError;
    use crate::{GameEvent, GameReport, GameState, ManualTimeSource, MemoryReporter, NullSink};
    use std::time::Duration;

    fn session() -> Session<MemoryReporter> {
        Session::new(Level::Beginner, MemoryReporter::default()).with_seed(1234)
    }

    #[test]
    fn test_start_game_announces_counters() {
        let mut session = session();
        let mut events = Vec::new();

        session.start_game(&mut events).unwrap();

        assert_eq!(
            events,
            vec![GameEvent::MinesRemaining(10), GameEvent::ClockTick(0)]
        );
        assert_eq!(session.game().unwrap().dimensions(), (9, 9));
    }

    #[test]
    fn test_level_changes_apply_to_next_game() {
        let mut session = session();
        session.start_game(&mut NullSink).unwrap();

        assert_eq!(session.increase_level(), Level::Intermediate);
        assert_eq!(session.increase_level(), Level::Expert);
        assert_eq!(session.increase_level(), Level::Expert);
        assert_eq!(session.game().unwrap().dimensions(), (9, 9));

        session.start_game(&mut NullSink).unwrap();
        assert_eq!(session.game().unwrap().dimensions(), (16, 30));
        assert_eq!(session.game().unwrap().mine_count(), 99);
        assert_eq!(session.decrease_level(), Level::Intermediate);
    }

    #[test]
    fn test_seeded_games_differ_but_repeat() {
        let mut first = session();
        let mut second = session();

        first.start_game(&mut NullSink).unwrap();
        second.start_game(&mut NullSink).unwrap();
        let a = first.game().unwrap().board().mine_positions();
        assert_eq!(a, second.game().unwrap().board().mine_positions());

        first.start_game(&mut NullSink).unwrap();
        assert_ne!(a, first.game().unwrap().board().mine_positions());
        assert_eq!(first.games_started(), 2);
    }

    #[test]
    fn test_custom_game_is_validated() {
        let mut session = session();
        let bad = GameConfig {
            rows: 2,
            cols: 2,
            mines: 4,
            level: None,
        };
        assert!(session.start_custom(bad, &mut NullSink).is_err());
        assert!(session.game().is_none());

        let good = GameConfig::custom(5, 8, 6).unwrap();
        session.start_custom(good, &mut NullSink).unwrap();
        assert_eq!(session.game().unwrap().level_name(), "custom");
    }

    /// 5x5 with 15 mines: opening the center reveals exactly the 3x3 safe
    /// zone and leaves one safe cell hidden in the outer ring.
    fn crowded(session: &mut Session<impl ScoreReporter>) {
        let config = GameConfig::custom(5, 5, 15).unwrap();
        session.start_custom(config, &mut NullSink).unwrap();
        session.click(Position::new(2, 2), &mut NullSink).unwrap();

        let game = session.game().unwrap();
        assert_eq!(game.state(), GameState::Playing);
        assert_eq!(game.revealed_count(), 9);
    }

    #[test]
    fn test_lost_game_is_reported_once() {
        let mut session = session();
        crowded(&mut session);
        let mine = session.game().unwrap().board().mine_positions()[0];

        session.click(mine, &mut NullSink).unwrap();
        session.click(mine, &mut NullSink).unwrap();

        assert_eq!(session.game().unwrap().state(), GameState::Lost);
        let reports = &session.reporter().reports;
        assert_eq!(reports.len(), 1);
        assert!(!reports[0].won);
        assert_eq!(reports[0].level, "custom");
        assert_eq!(reports[0].revealed_count, 9);
    }

    #[test]
    fn test_toggle_pause_freezes_clock() {
        let time = ManualTimeSource::new();
        let handle = time.clone();
        let mut session = session().with_time_sources(move || Box::new(handle.clone()));
        crowded(&mut session);

        time.advance(Duration::from_millis(2100));
        session.toggle_pause(&mut NullSink);
        time.advance(Duration::from_secs(100));
        session.tick(&mut NullSink);
        assert_eq!(session.game().unwrap().elapsed_seconds(), 2);

        session.toggle_pause(&mut NullSink);
        time.advance(Duration::from_secs(1));
        session.tick(&mut NullSink);
        assert_eq!(session.game().unwrap().elapsed_seconds(), 3);
    }

    #[test]
    fn test_click_mode_toggle() {
        let mut session = session();
        assert_eq!(session.toggle_click_mode(), None);
        session.start_game(&mut NullSink).unwrap();
        assert_eq!(session.toggle_click_mode(), Some(ClickMode::Flag));
        assert_eq!(session.toggle_click_mode(), Some(ClickMode::Reveal));
    }

    #[derive(Default)]
    struct BrokenReporter {
        calls: u32,
    }

    impl ScoreReporter for BrokenReporter {
        fn submit(&mut self, _report: &GameReport) -> std::result::Result<(), ReportError> {
            self.calls += 1;
            Err(ReportError::Io(std::io::Error::other("leaderboard unreachable")))
        }
    }

    #[test]
    fn test_reporter_failure_does_not_affect_game() {
        let mut session = Session::new(Level::Beginner, BrokenReporter::default()).with_seed(99);
        crowded(&mut session);
        let mine = session.game().unwrap().board().mine_positions()[0];

        session.click(mine, &mut NullSink).unwrap();
        session.click(Position::new(0, 0), &mut NullSink).unwrap();

        assert_eq!(session.game().unwrap().state(), GameState::Lost);
        assert_eq!(session.reporter().calls, 1);
    }
}
