//! Theme + duration to validated [`LessonPlan`].

use cycle_core::normalize::{normalize, NormalizeError};
use cycle_core::plan::LessonPlan;

use crate::claude::{ClaudeApi, ClaudeApiError};
use crate::prompt::{user_prompt, SYSTEM_PROMPT};

#[derive(Debug, thiserror::Error)]
pub enum GenerateError {
    #[error(transparent)]
    Api(#[from] ClaudeApiError),

    #[error(transparent)]
    Normalize(#[from] NormalizeError),
}

/// Ask the model for a plan and normalize its answer.
pub async fn generate_lesson_plan(
    api: &ClaudeApi,
    theme: &str,
    duration_minutes: u32,
) -> Result<LessonPlan, GenerateError> {
    let completion = api
        .complete(SYSTEM_PROMPT, &user_prompt(theme, duration_minutes))
        .await?;

    tracing::info!(
        model = api.model(),
        input_tokens = completion.usage.input_tokens,
        output_tokens = completion.usage.output_tokens,
        stop_reason = ?completion.stop_reason,
        "Lesson plan generation completed",
    );

    let plan = normalize(&completion.text, &completion.stop_reason, &completion.usage)?;
    Ok(plan)
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use axum::routing::post;
    use axum::{Json, Router};
    use serde_json::{json, Value};

    use super::*;
    use crate::claude::{ClaudeConfig, DEFAULT_MAX_TOKENS};

    async fn stub(response: Value) -> ClaudeApi {
        let router = Router::new().route(
            "/v1/messages",
            post(move |Json(request): Json<Value>| {
                let response = response.clone();
                async move {
                    assert_eq!(request["messages"][0]["role"], "user");
                    assert!(request["system"].as_str().unwrap().contains("cycle/spin"));
                    Json(response)
                }
            }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });

        ClaudeApi::new(ClaudeConfig {
            api_key: "test-key".to_string(),
            model: "test-model".to_string(),
            api_url: format!("http://{addr}"),
            max_tokens: DEFAULT_MAX_TOKENS,
        })
    }

    fn plan_text() -> String {
        json!({
            "theme": "Space",
            "total_duration_minutes": 1,
            "segments": [{
                "name": "Warm-Up",
                "duration_seconds": 240,
                "intensity": "low",
                "position": "seated",
                "description": "Lift off slowly",
                "suggested_bpm_range": "80-90",
                "song": "Space Oddity - David Bowie"
            }],
            "notes": null
        })
        .to_string()
    }

    #[tokio::test]
    async fn fenced_response_is_normalized() {
        let api = stub(json!({
            "content": [{ "type": "text", "text": format!("```json\n{}\n```", plan_text()) }],
            "stop_reason": "end_turn",
            "usage": { "input_tokens": 900, "output_tokens": 300 }
        }))
        .await;

        let plan = generate_lesson_plan(&api, "Space", 45).await.unwrap();
        assert_eq!(plan.theme, "Space");
        assert_eq!(plan.total_duration_minutes(), 4);
    }

    #[tokio::test]
    async fn truncated_response_is_rejected() {
        let api = stub(json!({
            "content": [{ "type": "text", "text": plan_text() }],
            "stop_reason": "max_tokens",
            "usage": { "input_tokens": 900, "output_tokens": 4096 }
        }))
        .await;

        let err = generate_lesson_plan(&api, "Space", 45).await.unwrap_err();
        assert_matches!(
            err,
            GenerateError::Normalize(NormalizeError::TruncatedOutput { output_tokens: 4096 })
        );
    }
}
