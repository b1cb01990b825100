use serde::{Deserialize, Serialize};

/// Question difficulty. Unknown strings are rejected at the serde boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    /// Score multiplier. Difficulty affects only the bonus, not the base.
    pub fn multiplier(&self) -> f64 {
        match self {
            Difficulty::Easy => 1.0,
            Difficulty::Medium => 1.5,
            Difficulty::Hard => 2.0,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }
}

/// Timing and correctness data for a single answered question.
#[derive(Debug, Clone, Deserialize)]
pub struct QuestionScoreInput {
    pub time_remaining: f64,
    pub difficulty: Difficulty,
    pub streak: u32,
    pub total_time: f64,
    pub question_time_limit: f64,
    pub is_correct: bool,
}

/// Per-question score breakdown. Immutable once computed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreBreakdown {
    pub total: u32,
    pub base: u32,
    pub time_bonus: u32,
    pub difficulty_bonus: u32,
    pub streak_bonus: u32,
    pub speed_bonus: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub multiplier: Option<f64>,
}

impl ScoreBreakdown {
    /// Breakdown for a wrong or timed-out answer. No partial credit.
    pub fn zero() -> Self {
        Self {
            total: 0,
            base: 0,
            time_bonus: 0,
            difficulty_bonus: 0,
            streak_bonus: 0,
            speed_bonus: 0,
            multiplier: None,
        }
    }
}

/// Full game session, supplied wholesale at game end.
///
/// `questions` may be empty when the caller only has aggregate counters;
/// when present its length must match `total_questions`.
#[derive(Debug, Clone, Deserialize)]
pub struct GameSessionData {
    #[serde(default)]
    pub questions: Vec<QuestionScoreInput>,
    pub total_questions: u32,
    pub correct_answers: u32,
    pub total_time: f64,
    pub difficulty: Difficulty,
    pub perfect_streak: u32,
}

/// Session-level bonuses, each evaluated independently.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PerformanceBonuses {
    pub perfect_game: u32,
    pub speed_completion: u32,
    pub accuracy: u32,
    pub long_streak: u32,
}

impl PerformanceBonuses {
    pub fn total(&self) -> u32 {
        self.perfect_game + self.speed_completion + self.accuracy + self.long_streak
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FinalBreakdown {
    pub question_points: u32,
    pub time_bonuses: u32,
    pub difficulty_bonuses: u32,
    pub streak_bonuses: u32,
    pub speed_bonuses: u32,
    pub performance_bonuses: PerformanceBonuses,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionStats {
    /// Percentage in [0, 100], rounded to 2 decimals.
    pub accuracy: f64,
    /// Seconds per question, rounded to 2 decimals.
    pub average_time: f64,
    pub perfect_streak: u32,
    pub difficulty: Difficulty,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FinalScoreResult {
    pub final_score: u32,
    pub breakdown: FinalBreakdown,
    pub stats: SessionStats,
}

/// One step of the rank ladder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Rank {
    pub name: &'static str,
    pub min: u32,
}

/// Rank for a score plus progress toward the next step.
#[derive(Debug, Clone, Serialize)]
pub struct RankProgress {
    pub rank: Rank,
    pub next_rank: Option<&'static str>,
    pub points_to_next: u32,
    /// Percentage toward the next rank, 100 at the top of the ladder.
    pub progress_percent: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AchievementRarity {
    Common,
    Rare,
    Epic,
    Legendary,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Achievement {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub rarity: AchievementRarity,
}

/// Display-ready composition of rank, progress and achievements.
#[derive(Debug, Clone, Serialize)]
pub struct ScoreSummary {
    pub final_score: u32,
    pub formatted_score: String,
    pub rank: RankProgress,
    pub achievements: Vec<Achievement>,
    pub accuracy_display: String,
    pub average_time_display: String,
}
