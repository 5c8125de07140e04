// src/web/handlers.rs
use rocket::http::Status;
use rocket::response::status::Custom;
use rocket::serde::json::Json;
use rocket::State;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::error;

use super::types::{
    AnalyzeRequest, ApiError, ChatRequest, ChatResponse, FeedbackRequest, InsightsRequest,
};
use crate::ai::{prompts, ChatTurn, InsightSummary, JobAnalysis, OpenAiClient, ResumeFeedback};

pub type ApiResult<T> = Result<Json<T>, Custom<Json<ApiError>>>;

fn bad_request(message: &str) -> Custom<Json<ApiError>> {
    Custom(Status::BadRequest, Json(ApiError::new(message)))
}

fn bad_gateway(err: anyhow::Error) -> Custom<Json<ApiError>> {
    error!("Upstream model call failed: {:#}", err);
    Custom(Status::BadGateway, Json(ApiError::new(err.to_string())))
}

fn decode_reply<T: DeserializeOwned>(value: Value) -> Result<T, Custom<Json<ApiError>>> {
    serde_json::from_value(value).map_err(|err| {
        error!("Model reply had an unexpected shape: {}", err);
        Custom(
            Status::BadGateway,
            Json(ApiError::new("Model reply had an unexpected shape")),
        )
    })
}

pub async fn resume_feedback_handler(
    request: Json<FeedbackRequest>,
    ai: &State<OpenAiClient>,
) -> ApiResult<ResumeFeedback> {
    let text = request.text.trim();
    if text.is_empty() {
        return Err(bad_request("Resume text is required"));
    }

    let prompt = prompts::resume_feedback(text);
    let reply = ai
        .complete_json("resume feedback", &prompt)
        .await
        .map_err(bad_gateway)?;
    Ok(Json(decode_reply(reply)?))
}

pub async fn job_analyze_handler(
    request: Json<AnalyzeRequest>,
    ai: &State<OpenAiClient>,
) -> ApiResult<JobAnalysis> {
    let text = request.text.trim();
    if text.is_empty() {
        return Err(bad_request("Job description is required"));
    }

    let prompt = prompts::job_analysis(text);
    let reply = ai
        .complete_json("job analysis", &prompt)
        .await
        .map_err(bad_gateway)?;
    Ok(Json(decode_reply(reply)?))
}

pub async fn dashboard_insights_handler(
    request: Json<InsightsRequest>,
    ai: &State<OpenAiClient>,
) -> ApiResult<InsightSummary> {
    let prompt = prompts::dashboard_insights(&request.stats);
    let reply = ai
        .complete_json("dashboard insights", &prompt)
        .await
        .map_err(bad_gateway)?;
    Ok(Json(decode_reply(reply)?))
}

pub async fn chatbot_handler(
    request: Json<ChatRequest>,
    ai: &State<OpenAiClient>,
) -> ApiResult<ChatResponse> {
    let ChatRequest {
        message,
        mut conversation,
    } = request.into_inner();

    let message = message.trim();
    if message.is_empty() {
        return Err(bad_request("Message is required"));
    }

    conversation.push(ChatTurn::user(message));
    let reply = ai
        .complete_chat("chatbot", &conversation)
        .await
        .map_err(bad_gateway)?;
    Ok(Json(ChatResponse { message: reply }))
}
