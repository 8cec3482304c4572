pub mod board;
pub mod clock;
pub mod config;
pub mod error;
pub mod event;
pub mod game;
pub mod placement;
pub mod position;
pub mod report;
pub mod session;

pub use board::{Board, BoardIterator, Cell, CellView};
pub use clock::{
    format_clock, GameClock, ManualTimeSource, SystemTimeSource, TimeSource, MAX_ELAPSED_SECONDS,
    POLL_INTERVAL,
};
pub use config::{GameConfig, Level};
pub use error::{GameError, ReportError, Result};
pub use event::{EventSink, GameEvent, NullSink};
pub use game::{ClickMode, Game, GameState, MarkOutcome, RevealOutcome};
pub use placement::MinePlacer;
pub use position::Position;
pub use report::{
    GameReport, JsonLinesReporter, LogReporter, MemoryReporter, ScoreReporter, ScoreSubmission,
    StatSubmission, Submission,
};
pub use session::Session;
