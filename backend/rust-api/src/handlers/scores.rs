use axum::{
    extract::Path,
    http::StatusCode,
    response::IntoResponse,
    Json,
};

use crate::extractors::AppJson;
use crate::metrics::{record_achievement, record_game_scored, record_question_scored};
use crate::models::score::{GameSessionData, QuestionScoreInput};
use crate::services::score;

pub async fn score_question(
    AppJson(input): AppJson<QuestionScoreInput>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    match score::calculate_question_score(&input) {
        Ok(breakdown) => {
            record_question_scored(input.is_correct);
            Ok((StatusCode::OK, Json(breakdown)))
        }
        Err(e) => {
            tracing::warn!("Rejected question score input: {}", e);
            Err((StatusCode::BAD_REQUEST, e.to_string()))
        }
    }
}

pub async fn score_final(
    AppJson(session): AppJson<GameSessionData>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    match score::calculate_final_score(&session) {
        Ok(result) => {
            record_game_scored(session.difficulty.as_str());
            tracing::info!(
                final_score = result.final_score,
                accuracy = result.stats.accuracy,
                "Scored completed game"
            );
            Ok((StatusCode::OK, Json(result)))
        }
        Err(e) => {
            tracing::warn!("Rejected game session data: {}", e);
            Err((StatusCode::BAD_REQUEST, e.to_string()))
        }
    }
}

pub async fn score_summary(
    AppJson(session): AppJson<GameSessionData>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let result = score::calculate_final_score(&session).map_err(|e| {
        tracing::warn!("Rejected game session data: {}", e);
        (StatusCode::BAD_REQUEST, e.to_string())
    })?;

    let summary = score::generate_score_summary(&result);
    for achievement in &summary.achievements {
        record_achievement(achievement.id);
    }
    record_game_scored(session.difficulty.as_str());

    Ok((StatusCode::OK, Json(summary)))
}

pub async fn get_rank(Path(score_value): Path<u32>) -> impl IntoResponse {
    (StatusCode::OK, Json(score::rank_progress(score_value)))
}
