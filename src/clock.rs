use std::fmt;
use std::rc::Rc;
use std::time::{Duration, Instant};

/// How often a driver should call [`GameClock::poll`]. Only bounds display
/// latency, never the value shown.
pub const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// 59:59, the largest time the display can show.
pub const MAX_ELAPSED_SECONDS: u32 = 59 * 60 + 59;

/// Monotonic time measured from an arbitrary origin.
pub trait TimeSource: fmt::Debug {
    fn now(&self) -> Duration;
}

/// Wall clock backed by [`Instant`].
#[derive(Debug, Clone, Copy)]
pub struct SystemTimeSource {
    origin: Instant,
}

impl SystemTimeSource {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemTimeSource {
    fn default() -> Self {
        Self::new()
    }
}

impl TimeSource for SystemTimeSource {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }
}

/// Hand-driven time source. Clones share the same instant, so a test can keep
/// one handle and give another to the clock.
#[derive(Debug, Clone, Default)]
pub struct ManualTimeSource {
    now: Rc<std::cell::Cell<Duration>>,
}

impl ManualTimeSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&self, by: Duration) {
        self.now.set(self.now.get() + by);
    }
}

impl TimeSource for ManualTimeSource {
    fn now(&self) -> Duration {
        self.now.get()
    }
}

/// Whole-second game timer with pause/resume.
///
/// The displayed value is always derived from the time source, so however
/// irregularly [`poll`](Self::poll) is called, every second is reported once
/// and in order.
#[derive(Debug)]
pub struct GameClock {
    source: Box<dyn TimeSource>,
    started_at: Option<Duration>,
    elapsed_seconds: u32,
}

impl GameClock {
    pub fn new(source: Box<dyn TimeSource>) -> Self {
        Self {
            source,
            started_at: None,
            elapsed_seconds: 0,
        }
    }

    /// Starts or resumes counting from the seconds already accumulated.
    pub fn start(&mut self) {
        if self.is_running() {
            return;
        }
        let carried = Duration::from_secs(self.elapsed_seconds.into());
        self.started_at = Some(self.source.now().saturating_sub(carried));
        log::trace!("clock started at {}s", self.elapsed_seconds);
    }

    /// Returns the seconds completed since the last poll, capped at
    /// [`MAX_ELAPSED_SECONDS`]. Empty when stopped or when no new second
    /// has passed.
    pub fn poll(&mut self) -> Vec<u32> {
        let Some(started_at) = self.started_at else {
            return Vec::new();
        };

        let wall = self.source.now().saturating_sub(started_at).as_secs();
        let wall = wall.min(MAX_ELAPSED_SECONDS.into()) as u32;
        if wall <= self.elapsed_seconds {
            return Vec::new();
        }

        let ticks = (self.elapsed_seconds + 1..=wall).collect();
        self.elapsed_seconds = wall;
        ticks
    }

    /// Catches up one last time and stops. The elapsed value is kept.
    pub fn stop(&mut self) -> Vec<u32> {
        let ticks = self.poll();
        self.started_at = None;
        ticks
    }

    pub fn is_running(&self) -> bool {
        self.started_at.is_some()
    }

    pub fn elapsed_seconds(&self) -> u32 {
        self.elapsed_seconds
    }
}

/// `MM:SS`, zero-padded.
pub fn format_clock(seconds: u32) -> String {
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}
