pub mod rate_limit;
pub mod score;

pub use rate_limit::{LimitDecision, Tier, TierLimits, UsageSnapshot, UserRateState};
pub use score::{Difficulty, FinalScoreResult, GameSessionData, QuestionScoreInput, ScoreBreakdown};
