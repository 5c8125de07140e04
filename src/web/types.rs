// src/web/types.rs
use rocket::serde::{Deserialize, Serialize};

use crate::ai::ChatTurn;
use crate::state::StatusCounts;

#[derive(Deserialize)]
#[serde(crate = "rocket::serde")]
pub struct FeedbackRequest {
    pub text: String,
}

#[derive(Deserialize)]
#[serde(crate = "rocket::serde")]
pub struct AnalyzeRequest {
    pub text: String,
}

#[derive(Deserialize)]
#[serde(crate = "rocket::serde")]
pub struct InsightsRequest {
    pub stats: StatusCounts,
}

#[derive(Deserialize)]
#[serde(crate = "rocket::serde")]
pub struct ChatRequest {
    pub message: String,
    #[serde(default)]
    pub conversation: Vec<ChatTurn>,
}

#[derive(Serialize)]
#[serde(crate = "rocket::serde")]
pub struct ChatResponse {
    pub message: String,
}

/// Body of every non-2xx response, catchers included.
#[derive(Serialize)]
#[serde(crate = "rocket::serde")]
pub struct ApiError {
    pub error: String,
}

impl ApiError {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}
