use crate::error::ReportError;
use crate::Level;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::Path;

/// What the engine hands over when a game ends.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameReport {
    pub elapsed_seconds: u32,
    pub won: bool,
    pub level: String,
    pub revealed_count: u32,
}

impl GameReport {
    /// Leaderboard entry. Only wins are scored.
    pub fn score(&self) -> Option<ScoreSubmission> {
        self.won.then(|| ScoreSubmission {
            time: self.elapsed_seconds,
            level: self.level.clone(),
        })
    }

    /// Per-game increments for the player's cumulative statistics.
    pub fn stats(&self, played_at: DateTime<Utc>) -> StatSubmission {
        let won_at = |level: Level| u32::from(self.won && self.level == level.name());

        StatSubmission {
            games_played: 1,
            games_won: u32::from(self.won),
            beginner_games_won: won_at(Level::Beginner),
            intermediate_games_won: won_at(Level::Intermediate),
            expert_games_won: won_at(Level::Expert),
            time_played: self.elapsed_seconds,
            cells_revealed: self.revealed_count,
            last_played_at: played_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreSubmission {
    pub time: u32,
    pub level: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatSubmission {
    pub games_played: u32,
    pub games_won: u32,
    pub beginner_games_won: u32,
    pub intermediate_games_won: u32,
    pub expert_games_won: u32,
    pub time_played: u32,
    pub cells_revealed: u32,
    pub last_played_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Submission {
    Score(ScoreSubmission),
    Stats(StatSubmission),
}

/// Receives finished games. Failures are the reporter's business: the game
/// has already ended by the time `submit` is called.
pub trait ScoreReporter {
    fn submit(&mut self, report: &GameReport) -> Result<(), ReportError>;
}

impl<R: ScoreReporter + ?Sized> ScoreReporter for Box<R> {
    fn submit(&mut self, report: &GameReport) -> Result<(), ReportError> {
        (**self).submit(report)
    }
}

/// Writes submissions to the log only.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogReporter;

impl ScoreReporter for LogReporter {
    fn submit(&mut self, report: &GameReport) -> Result<(), ReportError> {
        log::info!("game finished: {}", serde_json::to_string(report)?);
        Ok(())
    }
}

/// Appends one JSON object per submission, score first, then stats.
#[derive(Debug)]
pub struct JsonLinesReporter<W: Write> {
    writer: W,
}

impl JsonLinesReporter<BufWriter<File>> {
    pub fn append_to(path: impl AsRef<Path>) -> Result<Self, ReportError> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self::new(BufWriter::new(file)))
    }
}

impl<W: Write> JsonLinesReporter<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }

    fn write_line(&mut self, submission: &Submission) -> Result<(), ReportError> {
        serde_json::to_writer(&mut self.writer, submission)?;
        self.writer.write_all(b"\n")?;
        Ok(())
    }
}

impl<W: Write> ScoreReporter for JsonLinesReporter<W> {
    fn submit(&mut self, report: &GameReport) -> Result<(), ReportError> {
        if let Some(score) = report.score() {
            self.write_line(&Submission::Score(score))?;
        }
        self.write_line(&Submission::Stats(report.stats(Utc::now())))?;
        self.writer.flush()?;
        Ok(())
    }
}

/// Keeps every report in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryReporter {
    pub reports: Vec<GameReport>,
}

impl ScoreReporter for MemoryReporter {
    fn submit(&mut self, report: &GameReport) -> Result<(), ReportError> {
        self.reports.push(report.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn report(won: bool, level: &str) -> GameReport {
        GameReport {
            elapsed_seconds: 42,
            won,
            level: level.to_string(),
            revealed_count: 71,
        }
    }

    #[test]
    fn test_only_wins_are_scored() {
        assert_eq!(
            report(true, "expert").score(),
            Some(ScoreSubmission {
                time: 42,
                level: "expert".into()
            })
        );
        assert_eq!(report(false, "expert").score(), None);
    }

    #[test]
    fn test_stats_count_level_wins() {
        let at = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();

        let stats = report(true, "intermediate").stats(at);
        assert_eq!(stats.games_played, 1);
        assert_eq!(stats.games_won, 1);
        assert_eq!(stats.intermediate_games_won, 1);
        assert_eq!(stats.beginner_games_won + stats.expert_games_won, 0);
        assert_eq!(stats.time_played, 42);
        assert_eq!(stats.cells_revealed, 71);

        let lost = report(false, "beginner").stats(at);
        assert_eq!(lost.games_won, 0);
        assert_eq!(lost.beginner_games_won, 0);

        let custom = report(true, "custom").stats(at);
        assert_eq!(custom.games_won, 1);
        assert_eq!(
            custom.beginner_games_won + custom.intermediate_games_won + custom.expert_games_won,
            0
        );
    }

    #[test]
    fn test_json_lines_writes_score_then_stats() {
        let mut reporter = JsonLinesReporter::new(Vec::new());
        reporter.submit(&report(true, "beginner")).unwrap();
        reporter.submit(&report(false, "beginner")).unwrap();

        let out = String::from_utf8(reporter.into_inner()).unwrap();
        let kinds: Vec<String> = out
            .lines()
            .map(|line| {
                let value: serde_json::Value = serde_json::from_str(line).unwrap();
                value["kind"].as_str().unwrap().to_string()
            })
            .collect();

        assert_eq!(kinds, ["score", "stats", "stats"]);
        assert!(out.lines().next().unwrap().contains("\"time\":42"));
    }
}
