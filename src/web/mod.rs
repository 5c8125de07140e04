// src/web/mod.rs
pub mod handlers;
pub mod types;

pub use types::*;

use anyhow::Result;
use rocket::fairing::{Fairing, Info, Kind};
use rocket::http::{Header, Status};
use rocket::serde::json::Json;
use rocket::{catchers, get, options, post, routes, Build, Request, Response, Rocket, State};
use tracing::info;

use crate::ai::{InsightSummary, JobAnalysis, OpenAiClient, ResumeFeedback};
use crate::config::RelayConfig;
use handlers::ApiResult;

// CORS Fairing
pub struct Cors {
    allowed_origin: String,
}

#[rocket::async_trait]
impl Fairing for Cors {
    fn info(&self) -> Info {
        Info {
            name: "Add CORS headers to responses",
            kind: Kind::Response,
        }
    }

    async fn on_response<'r>(&self, _request: &'r Request<'_>, response: &mut Response<'r>) {
        response.set_header(Header::new(
            "Access-Control-Allow-Origin",
            self.allowed_origin.clone(),
        ));
        response.set_header(Header::new(
            "Access-Control-Allow-Methods",
            "POST, GET, OPTIONS",
        ));
        response.set_header(Header::new("Access-Control-Allow-Headers", "*"));
    }
}

#[post("/resume-feedback", data = "<request>")]
pub async fn resume_feedback(
    request: Json<FeedbackRequest>,
    ai: &State<OpenAiClient>,
) -> ApiResult<ResumeFeedback> {
    handlers::resume_feedback_handler(request, ai).await
}

#[post("/job-analyze", data = "<request>")]
pub async fn job_analyze(
    request: Json<AnalyzeRequest>,
    ai: &State<OpenAiClient>,
) -> ApiResult<JobAnalysis> {
    handlers::job_analyze_handler(request, ai).await
}

#[post("/dashboard-insights", data = "<request>")]
pub async fn dashboard_insights(
    request: Json<InsightsRequest>,
    ai: &State<OpenAiClient>,
) -> ApiResult<InsightSummary> {
    handlers::dashboard_insights_handler(request, ai).await
}

#[post("/chatbot", data = "<request>")]
pub async fn chatbot(
    request: Json<ChatRequest>,
    ai: &State<OpenAiClient>,
) -> ApiResult<ChatResponse> {
    handlers::chatbot_handler(request, ai).await
}

#[get("/health")]
pub async fn health() -> &'static str {
    "OK"
}

#[options("/<_..>")]
pub async fn options() -> Status {
    Status::Ok
}

// Error catchers
#[rocket::catch(400)]
pub fn bad_request() -> Json<ApiError> {
    Json(ApiError::new("Invalid request format"))
}

#[rocket::catch(404)]
pub fn not_found() -> Json<ApiError> {
    Json(ApiError::new("Resource not found"))
}

#[rocket::catch(422)]
pub fn unprocessable() -> Json<ApiError> {
    Json(ApiError::new("Invalid request body"))
}

#[rocket::catch(500)]
pub fn internal_error() -> Json<ApiError> {
    Json(ApiError::new("Internal server error"))
}

pub fn build_rocket(config: &RelayConfig) -> Result<Rocket<Build>> {
    let client = OpenAiClient::new(config)?;
    let figment = rocket::Config::figment()
        .merge(("port", config.port))
        .merge(("address", "0.0.0.0"));

    Ok(rocket::custom(figment)
        .attach(Cors {
            allowed_origin: config.allowed_origin.clone(),
        })
        .manage(client)
        .register(
            "/api",
            catchers![bad_request, not_found, unprocessable, internal_error],
        )
        .mount(
            "/api",
            routes![
                resume_feedback,
                job_analyze,
                dashboard_insights,
                chatbot,
                health,
                options,
            ],
        ))
}

// Main server start function
pub async fn start_relay_server(config: RelayConfig) -> Result<()> {
    info!("Starting relay server on port {}", config.port);
    info!("Model: {}", config.openai_model);
    info!("Allowed origin: {}", config.allowed_origin);

    let rocket = build_rocket(&config)?;
    rocket.launch().await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rocket::http::ContentType;
    use rocket::local::asynchronous::Client;

    fn test_config() -> RelayConfig {
        RelayConfig {
            port: 0,
            openai_api_key: "sk-test".to_string(),
            // Nothing listens here, so upstream calls fail fast.
            openai_api_url: "http://127.0.0.1:1/v1".to_string(),
            openai_model: "gpt-4o-mini".to_string(),
            allowed_origin: "*".to_string(),
        }
    }

    async fn client() -> Client {
        let rocket = build_rocket(&test_config()).unwrap();
        Client::tracked(rocket).await.unwrap()
    }

    #[tokio::test]
    async fn test_health_reports_ok() {
        let client = client().await;
        let response = client.get("/api/health").dispatch().await;
        assert_eq!(response.status(), Status::Ok);
        assert_eq!(response.into_string().await.unwrap(), "OK");
    }

    #[tokio::test]
    async fn test_blank_text_is_rejected() {
        let client = client().await;
        for endpoint in ["/api/resume-feedback", "/api/job-analyze"] {
            let response = client
                .post(endpoint)
                .header(ContentType::JSON)
                .body(r#"{"text":"   "}"#)
                .dispatch()
                .await;
            assert_eq!(response.status(), Status::BadRequest);
            let body: serde_json::Value = response.into_json().await.unwrap();
            assert!(body["error"].as_str().unwrap().contains("required"));
        }
    }

    #[tokio::test]
    async fn test_blank_chat_message_is_rejected() {
        let client = client().await;
        let response = client
            .post("/api/chatbot")
            .header(ContentType::JSON)
            .body(r#"{"message":""}"#)
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::BadRequest);
        let body: serde_json::Value = response.into_json().await.unwrap();
        assert_eq!(body["error"], "Message is required");
    }

    #[tokio::test]
    async fn test_unreachable_upstream_becomes_502() {
        let client = client().await;
        let response = client
            .post("/api/job-analyze")
            .header(ContentType::JSON)
            .body(r#"{"text":"Backend role, Rust."}"#)
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::BadGateway);
        let body: serde_json::Value = response.into_json().await.unwrap();
        assert!(body["error"].is_string());
    }

    #[tokio::test]
    async fn test_unknown_route_gets_error_body() {
        let client = client().await;
        let response = client.get("/api/nope").dispatch().await;
        assert_eq!(response.status(), Status::NotFound);
        let body: serde_json::Value = response.into_json().await.unwrap();
        assert_eq!(body["error"], "Resource not found");
    }

    #[tokio::test]
    async fn test_malformed_json_gets_error_body() {
        let client = client().await;

        // Truncated JSON is a syntax error.
        let response = client
            .post("/api/chatbot")
            .header(ContentType::JSON)
            .body(r#"{"message":"#)
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::BadRequest);
        let body: serde_json::Value = response.into_json().await.unwrap();
        assert_eq!(body["error"], "Invalid request format");

        // A missing field is a data error.
        let response = client
            .post("/api/resume-feedback")
            .header(ContentType::JSON)
            .body(r#"{}"#)
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::UnprocessableEntity);
        let body: serde_json::Value = response.into_json().await.unwrap();
        assert_eq!(body["error"], "Invalid request body");
    }

    #[tokio::test]
    async fn test_cors_headers_follow_config() {
        let client = client().await;
        let response = client.options("/api/chatbot").dispatch().await;
        assert_eq!(response.status(), Status::Ok);
        assert_eq!(
            response.headers().get_one("Access-Control-Allow-Origin"),
            Some("*")
        );
        assert_eq!(
            response.headers().get_one("Access-Control-Allow-Methods"),
            Some("POST, GET, OPTIONS")
        );

        let response = client.get("/api/health").dispatch().await;
        assert_eq!(
            response.headers().get_one("Access-Control-Allow-Origin"),
            Some("*")
        );
    }
}
