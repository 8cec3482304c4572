use minesweeper_engine::{
    Board, Game, GameEvent, GameState, Level, ManualTimeSource, MemoryReporter, NullSink,
    Position, RevealOutcome, Session,
};
use std::time::Duration;

fn p(row: i32, col: i32) -> Position {
    Position::new(row, col)
}

fn safe_positions(game: &Game) -> Vec<Position> {
    game.board()
        .cells()
        .filter(|cell| !cell.is_mine)
        .map(|cell| cell.position)
        .collect()
}

#[test]
fn test_beginner_game_is_won_exactly_when_all_safe_cells_are_open() {
    let mut game = Game::with_seed(Level::Beginner.config(), 2024).unwrap();
    let mut events = Vec::new();

    for pos in safe_positions(&game) {
        if !game.board().get_cell(pos).unwrap().is_hidden() {
            continue;
        }
        assert_ne!(game.state(), GameState::Won);
        game.reveal(pos, &mut events).unwrap();
        assert_eq!(game.state() == GameState::Won, game.revealed_count() == 71);
    }

    assert_eq!(game.state(), GameState::Won);
    assert_eq!(game.revealed_count(), 71);

    let revealed_events = events
        .iter()
        .filter(|e| matches!(e, GameEvent::CellRevealed { .. }))
        .count();
    assert_eq!(revealed_events, 71);
    assert_eq!(
        events.last(),
        Some(&GameEvent::GameOver { won: true })
    );
}

#[test]
fn test_hitting_a_mine_ends_the_game() {
    let board = Board::with_mines(3, 3, &[p(2, 0), p(2, 2)]).unwrap();
    let mut game = Game::from_board(board, None);
    let mut events = Vec::new();

    assert_eq!(game.reveal(p(0, 0), &mut events).unwrap(), RevealOutcome::Revealed);
    assert_eq!(game.revealed_count(), 6);

    assert_eq!(game.reveal(p(2, 0), &mut events).unwrap(), RevealOutcome::HitMine);
    assert_eq!(game.state(), GameState::Lost);
    assert_eq!(events.last(), Some(&GameEvent::GameOver { won: false }));

    // finished games ignore input
    events.clear();
    game.reveal(p(2, 1), &mut events).unwrap();
    game.secondary_click(p(2, 2), &mut events).unwrap();
    assert!(events.is_empty());

    let report = game.take_report().unwrap();
    assert!(!report.won);
    assert_eq!(report.level, "custom");
    assert_eq!(report.revealed_count, 6);
    assert!(game.take_report().is_none());
}

#[test]
fn test_chord_with_correct_flag_wins() {
    let board = Board::with_mines(3, 3, &[p(0, 0)]).unwrap();
    let mut game = Game::from_board(board, None);

    game.reveal(p(1, 1), &mut NullSink).unwrap();
    assert_eq!(game.revealed_count(), 1);

    game.secondary_click(p(0, 0), &mut NullSink).unwrap();
    assert_eq!(game.mines_remaining(), 0);

    game.click(p(1, 1), &mut NullSink).unwrap();
    assert_eq!(game.state(), GameState::Won);
    assert_eq!(game.revealed_count(), 8);
}

#[test]
fn test_chord_with_wrong_flag_loses_before_revealing_the_rest() {
    let board = Board::with_mines(3, 3, &[p(0, 0)]).unwrap();
    let mut game = Game::from_board(board, None);

    game.reveal(p(1, 1), &mut NullSink).unwrap();
    game.secondary_click(p(0, 1), &mut NullSink).unwrap();

    let outcome = game.reveal_neighbors(p(1, 1), &mut NullSink).unwrap();
    assert_eq!(outcome, RevealOutcome::HitMine);
    assert_eq!(game.state(), GameState::Lost);
    assert_eq!(game.revealed_count(), 1);
    assert!(game.board().get_cell(p(2, 2)).unwrap().is_hidden());
}

#[test]
fn test_over_flagging_goes_negative() {
    let board = Board::with_mines(3, 3, &[p(0, 0)]).unwrap();
    let mut game = Game::from_board(board, None);
    let mut events = Vec::new();

    game.reveal(p(1, 1), &mut events).unwrap();
    game.secondary_click(p(2, 2), &mut events).unwrap();
    game.secondary_click(p(2, 1), &mut events).unwrap();

    assert_eq!(game.flagged_count(), 2);
    assert_eq!(game.mines_remaining(), -1);
    assert_eq!(events.last(), Some(&GameEvent::MinesRemaining(-1)));
}

#[test]
fn test_session_reports_a_won_game() {
    let time = ManualTimeSource::new();
    let handle = time.clone();
    let mut session = Session::new(Level::Beginner, MemoryReporter::default())
        .with_seed(77)
        .with_time_sources(move || Box::new(handle.clone()));
    let mut events = Vec::new();

    session.start_game(&mut events).unwrap();
    session.click(p(4, 4), &mut events).unwrap();
    time.advance(Duration::from_millis(5300));
    session.tick(&mut events);

    let game = session.game().unwrap();
    assert!(game.first_click_done());
    for pos in std::iter::once(p(4, 4)).chain(game.board().neighbors_of(p(4, 4))) {
        assert!(!game.board().get_cell(pos).unwrap().is_mine);
    }

    for pos in safe_positions(game) {
        let hidden = session.game().unwrap().board().get_cell(pos).unwrap().is_hidden();
        if hidden {
            session.click(pos, &mut events).unwrap();
        }
    }

    let game = session.game().unwrap();
    assert_eq!(game.state(), GameState::Won);
    assert_eq!(game.elapsed_seconds(), 5);

    let reports = &session.reporter().reports;
    assert_eq!(reports.len(), 1);
    assert!(reports[0].won);
    assert_eq!(reports[0].level, "beginner");
    assert_eq!(reports[0].elapsed_seconds, 5);
    assert_eq!(reports[0].revealed_count, 71);
    assert_eq!(
        reports[0].score().map(|s| s.time),
        Some(5)
    );

    let ticks: Vec<u32> = events
        .iter()
        .filter_map(|e| match e {
            GameEvent::ClockTick(s) => Some(*s),
            _ => None,
        })
        .collect();
    assert_eq!(ticks, vec![0, 1, 2, 3, 4, 5]);
}
