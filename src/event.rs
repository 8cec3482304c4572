/// Everything the presentation layer needs to redraw after an engine call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GameEvent {
    CellRevealed {
        id: String,
        is_mine: bool,
        value: Option<u8>,
    },
    FlagToggled {
        id: String,
        is_flagged: bool,
    },
    ClockTick(u32),
    /// `mines - flags`; negative when over-flagged.
    MinesRemaining(i32),
    GameOver {
        won: bool,
    },
}

pub trait EventSink {
    fn emit(&mut self, event: GameEvent);
}

impl EventSink for Vec<GameEvent> {
    fn emit(&mut self, event: GameEvent) {
        self.push(event);
    }
}

/// Discards every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl EventSink for NullSink {
    fn emit(&mut self, _event: GameEvent) {}
}
