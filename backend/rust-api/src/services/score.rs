use thiserror::Error;

use crate::models::score::{
    Achievement, AchievementRarity, FinalBreakdown, FinalScoreResult, GameSessionData,
    PerformanceBonuses, QuestionScoreInput, Rank, RankProgress, ScoreBreakdown, ScoreSummary,
    SessionStats,
};

/// Points awarded for any correct answer before bonuses.
const BASE_SCORE: u32 = 100;

/// Rank ladder, thresholds strictly increasing. The floor rank has min = 0
/// so every score maps to exactly one rank.
pub const RANKS: [Rank; 6] = [
    Rank {
        name: "Civilian",
        min: 0,
    },
    Rank {
        name: "Trainee",
        min: 500,
    },
    Rank {
        name: "Skilled Fighter",
        min: 1200,
    },
    Rank {
        name: "Enhanced Human",
        min: 2000,
    },
    Rank {
        name: "Superhero",
        min: 3000,
    },
    Rank {
        name: "Cosmic Entity",
        min: 5000,
    },
];

#[derive(Debug, Error, PartialEq)]
pub enum ScoreError {
    #[error("question_time_limit must be a positive finite number")]
    NonPositiveTimeLimit,
    #[error("{field} must be a non-negative finite number")]
    NegativeTime { field: &'static str },
    #[error("time_remaining exceeds question_time_limit")]
    TimeRemainingExceedsLimit,
    #[error("correct_answers ({correct}) exceeds total_questions ({total})")]
    CorrectExceedsTotal { correct: u32, total: u32 },
    #[error("questions list length ({got}) does not match total_questions ({expected})")]
    QuestionCountMismatch { got: usize, expected: u32 },
}

fn validate_question_input(input: &QuestionScoreInput) -> Result<(), ScoreError> {
    if !input.question_time_limit.is_finite() || input.question_time_limit <= 0.0 {
        return Err(ScoreError::NonPositiveTimeLimit);
    }
    if !input.time_remaining.is_finite() || input.time_remaining < 0.0 {
        return Err(ScoreError::NegativeTime {
            field: "time_remaining",
        });
    }
    if !input.total_time.is_finite() || input.total_time < 0.0 {
        return Err(ScoreError::NegativeTime {
            field: "total_time",
        });
    }
    if input.time_remaining > input.question_time_limit {
        return Err(ScoreError::TimeRemainingExceedsLimit);
    }
    Ok(())
}

/// Score a single answered question.
///
/// Wrong or timed-out answers earn nothing, regardless of timing. For
/// correct answers the bonuses stack on a fixed base:
/// time (proportional to time left, max 50), difficulty (bonus on the base,
/// not a multiplier of the total), streak (steps of 25 per full 3-streak)
/// and speed (25 under 10s, 15 under 20s). Bonus arithmetic saturates, so
/// absurd streak values cap the score instead of wrapping.
pub fn calculate_question_score(input: &QuestionScoreInput) -> Result<ScoreBreakdown, ScoreError> {
    validate_question_input(input)?;

    if !input.is_correct {
        return Ok(ScoreBreakdown::zero());
    }

    let base = BASE_SCORE;
    let time_bonus = ((input.time_remaining / input.question_time_limit) * 50.0).floor() as u32;
    let multiplier = input.difficulty.multiplier();
    let difficulty_bonus = ((base as f64) * (multiplier - 1.0)).floor() as u32;
    let streak_bonus = if input.streak >= 3 {
        (input.streak / 3).saturating_mul(25)
    } else {
        0
    };
    let speed_bonus = if input.total_time <= 10.0 {
        25
    } else if input.total_time <= 20.0 {
        15
    } else {
        0
    };

    Ok(ScoreBreakdown {
        total: base
            .saturating_add(time_bonus)
            .saturating_add(difficulty_bonus)
            .saturating_add(streak_bonus)
            .saturating_add(speed_bonus),
        base,
        time_bonus,
        difficulty_bonus,
        streak_bonus,
        speed_bonus,
        multiplier: Some(multiplier),
    })
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Aggregate a full session: per-question totals plus session-level
/// performance bonuses, with stats rounded for display.
pub fn calculate_final_score(session: &GameSessionData) -> Result<FinalScoreResult, ScoreError> {
    if session.correct_answers > session.total_questions {
        return Err(ScoreError::CorrectExceedsTotal {
            correct: session.correct_answers,
            total: session.total_questions,
        });
    }
    if !session.total_time.is_finite() || session.total_time < 0.0 {
        return Err(ScoreError::NegativeTime {
            field: "total_time",
        });
    }
    if !session.questions.is_empty() && session.questions.len() != session.total_questions as usize
    {
        return Err(ScoreError::QuestionCountMismatch {
            got: session.questions.len(),
            expected: session.total_questions,
        });
    }

    let mut question_points = 0u32;
    let mut time_bonuses = 0u32;
    let mut difficulty_bonuses = 0u32;
    let mut streak_bonuses = 0u32;
    let mut speed_bonuses = 0u32;

    for question in &session.questions {
        let breakdown = calculate_question_score(question)?;
        question_points = question_points.saturating_add(breakdown.total);
        time_bonuses = time_bonuses.saturating_add(breakdown.time_bonus);
        difficulty_bonuses = difficulty_bonuses.saturating_add(breakdown.difficulty_bonus);
        streak_bonuses = streak_bonuses.saturating_add(breakdown.streak_bonus);
        speed_bonuses = speed_bonuses.saturating_add(breakdown.speed_bonus);
    }

    let (accuracy, average_time) = if session.total_questions == 0 {
        (0.0, 0.0)
    } else {
        (
            session.correct_answers as f64 / session.total_questions as f64 * 100.0,
            session.total_time / session.total_questions as f64,
        )
    };

    let performance_bonuses = PerformanceBonuses {
        perfect_game: if accuracy == 100.0 { 500 } else { 0 },
        speed_completion: if session.total_questions == 0 {
            0
        } else if average_time < 15.0 {
            200
        } else if average_time < 25.0 {
            100
        } else {
            0
        },
        accuracy: if accuracy >= 90.0 {
            300
        } else if accuracy >= 80.0 {
            200
        } else if accuracy >= 70.0 {
            100
        } else {
            0
        },
        long_streak: if session.perfect_streak >= 10 {
            400
        } else if session.perfect_streak >= 5 {
            200
        } else {
            0
        },
    };

    let final_score = question_points.saturating_add(performance_bonuses.total());

    Ok(FinalScoreResult {
        final_score,
        breakdown: FinalBreakdown {
            question_points,
            time_bonuses,
            difficulty_bonuses,
            streak_bonuses,
            speed_bonuses,
            performance_bonuses,
        },
        stats: SessionStats {
            accuracy: round2(accuracy),
            average_time: round2(average_time),
            perfect_streak: session.perfect_streak,
            difficulty: session.difficulty,
        },
    })
}

/// Rank for a score. Always succeeds: the ladder floor catches everything.
pub fn score_rank(score: u32) -> Rank {
    RANKS
        .iter()
        .rev()
        .find(|rank| rank.min <= score)
        .copied()
        .unwrap_or(RANKS[0])
}

/// Rank plus progress toward the next ladder step.
pub fn rank_progress(score: u32) -> RankProgress {
    let rank = score_rank(score);
    let next = RANKS.iter().find(|r| r.min > rank.min);

    match next {
        Some(next_rank) => {
            let span = (next_rank.min - rank.min) as f64;
            let into = (score - rank.min) as f64;
            RankProgress {
                rank,
                next_rank: Some(next_rank.name),
                points_to_next: next_rank.min - score,
                progress_percent: round2((into / span) * 100.0),
            }
        }
        None => RankProgress {
            rank,
            next_rank: None,
            points_to_next: 0,
            progress_percent: 100.0,
        },
    }
}

/// Evaluate the achievement gates. Independent predicates, not mutually
/// exclusive; a session may earn zero or several.
pub fn check_achievements(result: &FinalScoreResult) -> Vec<Achievement> {
    let mut achievements = Vec::new();

    if result.stats.accuracy == 100.0 {
        achievements.push(Achievement {
            id: "perfect_game",
            name: "Flawless Victory",
            description: "Answer every question correctly",
            rarity: AchievementRarity::Legendary,
        });
    }
    if result.stats.average_time < 10.0 {
        achievements.push(Achievement {
            id: "speed_demon",
            name: "Speed Demon",
            description: "Average under 10 seconds per question",
            rarity: AchievementRarity::Epic,
        });
    }
    if result.stats.perfect_streak >= 10 {
        achievements.push(Achievement {
            id: "unstoppable",
            name: "Unstoppable",
            description: "Chain 10 correct answers in a row",
            rarity: AchievementRarity::Rare,
        });
    }
    if result.final_score >= 5000 {
        achievements.push(Achievement {
            id: "cosmic_score",
            name: "Cosmic Score",
            description: "Finish a game with 5000 points or more",
            rarity: AchievementRarity::Epic,
        });
    }

    achievements
}

fn format_thousands(value: u32) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// Compose rank, progress and achievements into a display-ready summary.
/// Pure: no side effects, same input always yields the same summary.
pub fn generate_score_summary(result: &FinalScoreResult) -> ScoreSummary {
    ScoreSummary {
        final_score: result.final_score,
        formatted_score: format_thousands(result.final_score),
        rank: rank_progress(result.final_score),
        achievements: check_achievements(result),
        accuracy_display: format!("{:.1}%", result.stats.accuracy),
        average_time_display: format!("{:.1}s", result.stats.average_time),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::score::Difficulty;

    fn correct_input(difficulty: Difficulty) -> QuestionScoreInput {
        QuestionScoreInput {
            time_remaining: 0.0,
            difficulty,
            streak: 0,
            total_time: 30.0,
            question_time_limit: 30.0,
            is_correct: true,
        }
    }

    #[test]
    fn wrong_answer_scores_zero_regardless_of_other_fields() {
        let input = QuestionScoreInput {
            time_remaining: 30.0,
            difficulty: Difficulty::Hard,
            streak: 12,
            total_time: 1.0,
            question_time_limit: 30.0,
            is_correct: false,
        };
        let breakdown = calculate_question_score(&input).unwrap();
        assert_eq!(breakdown, ScoreBreakdown::zero());
    }

    #[test]
    fn base_only_when_no_bonuses_apply() {
        let breakdown = calculate_question_score(&correct_input(Difficulty::Easy)).unwrap();
        assert_eq!(breakdown.total, 100);
        assert_eq!(breakdown.base, 100);
        assert_eq!(breakdown.time_bonus, 0);
        assert_eq!(breakdown.difficulty_bonus, 0);
        assert_eq!(breakdown.streak_bonus, 0);
        assert_eq!(breakdown.speed_bonus, 0);
    }

    #[test]
    fn hard_difficulty_bonus_is_always_100() {
        let mut input = correct_input(Difficulty::Hard);
        assert_eq!(
            calculate_question_score(&input).unwrap().difficulty_bonus,
            100
        );

        input.streak = 7;
        input.total_time = 5.0;
        input.time_remaining = 12.0;
        assert_eq!(
            calculate_question_score(&input).unwrap().difficulty_bonus,
            100
        );
    }

    #[test]
    fn time_bonus_is_proportional_and_capped_at_50() {
        let mut input = correct_input(Difficulty::Easy);
        input.time_remaining = 15.0;
        assert_eq!(calculate_question_score(&input).unwrap().time_bonus, 25);

        input.time_remaining = 30.0;
        assert_eq!(calculate_question_score(&input).unwrap().time_bonus, 50);
    }

    #[test]
    fn streak_bonus_steps_at_multiples_of_three() {
        let mut input = correct_input(Difficulty::Easy);
        for (streak, expected) in [
            (0, 0),
            (1, 0),
            (2, 0),
            (3, 25),
            (4, 25),
            (5, 25),
            (6, 50),
            (7, 50),
            (8, 50),
        ] {
            input.streak = streak;
            assert_eq!(
                calculate_question_score(&input).unwrap().streak_bonus,
                expected,
                "streak={streak}"
            );
        }
    }

    #[test]
    fn extreme_streak_saturates_instead_of_wrapping() {
        // u32::MAX deserializes fine; the bonus must cap, not panic or wrap.
        let mut input = correct_input(Difficulty::Hard);
        input.streak = u32::MAX;
        let breakdown = calculate_question_score(&input).unwrap();
        assert_eq!(breakdown.streak_bonus, u32::MAX);
        assert_eq!(breakdown.total, u32::MAX);
    }

    #[test]
    fn final_score_saturates_at_extreme_streaks() {
        let extreme = QuestionScoreInput {
            time_remaining: 0.0,
            difficulty: Difficulty::Easy,
            streak: u32::MAX,
            total_time: 30.0,
            question_time_limit: 30.0,
            is_correct: true,
        };
        let session = GameSessionData {
            questions: vec![extreme.clone(), extreme],
            total_questions: 2,
            correct_answers: 2,
            total_time: 60.0,
            difficulty: Difficulty::Easy,
            perfect_streak: u32::MAX,
        };

        let result = calculate_final_score(&session).unwrap();
        assert_eq!(result.breakdown.question_points, u32::MAX);
        assert_eq!(result.final_score, u32::MAX);
    }

    #[test]
    fn speed_bonus_tiers_are_exclusive() {
        let mut input = correct_input(Difficulty::Easy);
        input.total_time = 10.0;
        assert_eq!(calculate_question_score(&input).unwrap().speed_bonus, 25);
        input.total_time = 10.5;
        assert_eq!(calculate_question_score(&input).unwrap().speed_bonus, 15);
        input.total_time = 20.0;
        assert_eq!(calculate_question_score(&input).unwrap().speed_bonus, 15);
        input.total_time = 20.1;
        assert_eq!(calculate_question_score(&input).unwrap().speed_bonus, 0);
    }

    #[test]
    fn question_score_is_idempotent() {
        let input = QuestionScoreInput {
            time_remaining: 12.5,
            difficulty: Difficulty::Medium,
            streak: 4,
            total_time: 17.5,
            question_time_limit: 30.0,
            is_correct: true,
        };
        let first = calculate_question_score(&input).unwrap();
        let second = calculate_question_score(&input).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn zero_time_limit_is_rejected_not_nan() {
        let mut input = correct_input(Difficulty::Easy);
        input.question_time_limit = 0.0;
        input.time_remaining = 0.0;
        assert_eq!(
            calculate_question_score(&input),
            Err(ScoreError::NonPositiveTimeLimit)
        );
    }

    #[test]
    fn negative_times_are_rejected() {
        let mut input = correct_input(Difficulty::Easy);
        input.time_remaining = -1.0;
        assert!(calculate_question_score(&input).is_err());

        let mut input = correct_input(Difficulty::Easy);
        input.total_time = -0.5;
        assert!(calculate_question_score(&input).is_err());
    }

    #[test]
    fn time_remaining_above_limit_is_rejected() {
        let mut input = correct_input(Difficulty::Easy);
        input.time_remaining = 31.0;
        assert_eq!(
            calculate_question_score(&input),
            Err(ScoreError::TimeRemainingExceedsLimit)
        );
    }

    #[test]
    fn empty_session_yields_zero_stats_without_panicking() {
        let session = GameSessionData {
            questions: vec![],
            total_questions: 0,
            correct_answers: 0,
            total_time: 0.0,
            difficulty: Difficulty::Easy,
            perfect_streak: 0,
        };
        let result = calculate_final_score(&session).unwrap();
        assert_eq!(result.stats.accuracy, 0.0);
        assert_eq!(result.stats.average_time, 0.0);
        assert_eq!(result.final_score, 0);
    }

    #[test]
    fn correct_answers_above_total_is_rejected() {
        let session = GameSessionData {
            questions: vec![],
            total_questions: 5,
            correct_answers: 6,
            total_time: 50.0,
            difficulty: Difficulty::Easy,
            perfect_streak: 0,
        };
        assert_eq!(
            calculate_final_score(&session),
            Err(ScoreError::CorrectExceedsTotal {
                correct: 6,
                total: 5
            })
        );
    }

    #[test]
    fn question_count_mismatch_is_rejected() {
        let session = GameSessionData {
            questions: vec![correct_input(Difficulty::Easy)],
            total_questions: 3,
            correct_answers: 1,
            total_time: 30.0,
            difficulty: Difficulty::Easy,
            perfect_streak: 1,
        };
        assert!(matches!(
            calculate_final_score(&session),
            Err(ScoreError::QuestionCountMismatch { got: 1, expected: 3 })
        ));
    }

    #[test]
    fn perfect_medium_game_earns_1400_in_performance_bonuses() {
        // 10 questions, all correct, 100s total: accuracy 100 (perfect 500,
        // accuracy 300), average 10s (speed 200), streak 10 (long streak 400).
        let questions: Vec<QuestionScoreInput> = (0..10)
            .map(|i| QuestionScoreInput {
                time_remaining: 0.0,
                difficulty: Difficulty::Medium,
                streak: i,
                total_time: 10.0,
                question_time_limit: 30.0,
                is_correct: true,
            })
            .collect();
        let session = GameSessionData {
            questions,
            total_questions: 10,
            correct_answers: 10,
            total_time: 100.0,
            difficulty: Difficulty::Medium,
            perfect_streak: 10,
        };

        let result = calculate_final_score(&session).unwrap();
        let bonuses = &result.breakdown.performance_bonuses;
        assert_eq!(bonuses.perfect_game, 500);
        assert_eq!(bonuses.accuracy, 300);
        assert_eq!(bonuses.speed_completion, 200);
        assert_eq!(bonuses.long_streak, 400);
        assert_eq!(bonuses.total(), 1400);
        assert_eq!(
            result.final_score,
            result.breakdown.question_points + 1400
        );
    }

    #[test]
    fn bonus_categories_accumulate_separately() {
        let questions = vec![
            QuestionScoreInput {
                time_remaining: 15.0,
                difficulty: Difficulty::Hard,
                streak: 3,
                total_time: 8.0,
                question_time_limit: 30.0,
                is_correct: true,
            },
            QuestionScoreInput {
                time_remaining: 0.0,
                difficulty: Difficulty::Hard,
                streak: 0,
                total_time: 25.0,
                question_time_limit: 30.0,
                is_correct: false,
            },
        ];
        let session = GameSessionData {
            questions,
            total_questions: 2,
            correct_answers: 1,
            total_time: 33.0,
            difficulty: Difficulty::Hard,
            perfect_streak: 3,
        };

        let result = calculate_final_score(&session).unwrap();
        assert_eq!(result.breakdown.time_bonuses, 25);
        assert_eq!(result.breakdown.difficulty_bonuses, 100);
        assert_eq!(result.breakdown.streak_bonuses, 25);
        assert_eq!(result.breakdown.speed_bonuses, 25);
        assert_eq!(result.breakdown.question_points, 100 + 25 + 100 + 25 + 25);
    }

    #[test]
    fn rank_boundaries() {
        assert_eq!(score_rank(0).name, "Civilian");
        assert_eq!(score_rank(499).name, "Civilian");
        assert_eq!(score_rank(500).name, "Trainee");
        assert_eq!(score_rank(5000).name, "Cosmic Entity");
        assert_eq!(score_rank(u32::MAX).name, "Cosmic Entity");
    }

    #[test]
    fn rank_is_monotonically_non_decreasing() {
        let mut last_min = 0;
        for score in (0..6000).step_by(50) {
            let rank = score_rank(score);
            assert!(rank.min >= last_min, "rank regressed at score {score}");
            last_min = rank.min;
        }
    }

    #[test]
    fn rank_thresholds_strictly_increase() {
        for pair in RANKS.windows(2) {
            assert!(pair[0].min < pair[1].min);
        }
        assert_eq!(RANKS[0].min, 0);
    }

    #[test]
    fn rank_progress_midway_between_ranks() {
        let progress = rank_progress(250);
        assert_eq!(progress.rank.name, "Civilian");
        assert_eq!(progress.next_rank, Some("Trainee"));
        assert_eq!(progress.points_to_next, 250);
        assert_eq!(progress.progress_percent, 50.0);
    }

    #[test]
    fn rank_progress_at_ladder_top() {
        let progress = rank_progress(9000);
        assert_eq!(progress.rank.name, "Cosmic Entity");
        assert_eq!(progress.next_rank, None);
        assert_eq!(progress.points_to_next, 0);
        assert_eq!(progress.progress_percent, 100.0);
    }

    fn result_with(accuracy: f64, average_time: f64, streak: u32, score: u32) -> FinalScoreResult {
        FinalScoreResult {
            final_score: score,
            breakdown: FinalBreakdown {
                question_points: score,
                time_bonuses: 0,
                difficulty_bonuses: 0,
                streak_bonuses: 0,
                speed_bonuses: 0,
                performance_bonuses: PerformanceBonuses::default(),
            },
            stats: SessionStats {
                accuracy,
                average_time,
                perfect_streak: streak,
                difficulty: Difficulty::Medium,
            },
        }
    }

    #[test]
    fn achievements_are_independent_gates() {
        let none = check_achievements(&result_with(50.0, 20.0, 2, 400));
        assert!(none.is_empty());

        let all = check_achievements(&result_with(100.0, 9.0, 10, 5000));
        let ids: Vec<&str> = all.iter().map(|a| a.id).collect();
        assert_eq!(
            ids,
            vec!["perfect_game", "speed_demon", "unstoppable", "cosmic_score"]
        );

        let one = check_achievements(&result_with(100.0, 15.0, 3, 1000));
        assert_eq!(one.len(), 1);
        assert_eq!(one[0].id, "perfect_game");
    }

    #[test]
    fn summary_formats_score_with_separators() {
        let summary = generate_score_summary(&result_with(87.5, 12.34, 6, 12500));
        assert_eq!(summary.formatted_score, "12,500");
        assert_eq!(summary.accuracy_display, "87.5%");
        assert_eq!(summary.average_time_display, "12.3s");
        assert_eq!(summary.rank.rank.name, "Cosmic Entity");
    }

    #[test]
    fn format_thousands_edges() {
        assert_eq!(format_thousands(0), "0");
        assert_eq!(format_thousands(999), "999");
        assert_eq!(format_thousands(1000), "1,000");
        assert_eq!(format_thousands(1234567), "1,234,567");
    }
}
