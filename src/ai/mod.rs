// src/ai/mod.rs
//
// AI feature layer: typed replies for the four assistant features and
// the chat-completions client that produces them. Models are loose
// about shapes even under `json_object` mode, so every reply type
// normalizes what actually comes back instead of trusting the schema
// the prompt asked for.

pub mod client;
pub mod prompts;

pub use client::OpenAiClient;

use serde::de::Deserializer;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Structured resume review. All four sections are lists of short
/// remarks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResumeFeedback {
    #[serde(default, deserialize_with = "string_list")]
    pub grammar: Vec<String>,
    #[serde(default, deserialize_with = "string_list")]
    pub strengths: Vec<String>,
    #[serde(default, deserialize_with = "string_list")]
    pub weaknesses: Vec<String>,
    #[serde(default, deserialize_with = "string_list")]
    pub keywords: Vec<String>,
}

/// Job-description analysis with a 0-100 fit rating.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobAnalysis {
    #[serde(default, deserialize_with = "string_list")]
    pub skills: Vec<String>,
    #[serde(default, deserialize_with = "string_list")]
    pub keywords: Vec<String>,
    #[serde(default, deserialize_with = "rating")]
    pub suitability: u8,
}

/// Short motivational summary for the dashboard.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InsightSummary {
    #[serde(default, deserialize_with = "text")]
    pub summary: String,
}

/// One turn of a chatbot conversation, `role` being `user` or
/// `assistant`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: String,
    pub content: String,
}

impl ChatTurn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// Accepts a string, a list, or a keyed object where a list of strings
/// was requested, flattening everything into remarks.
fn string_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(flatten_strings(value))
}

fn flatten_strings(value: Value) -> Vec<String> {
    match value {
        Value::Null => Vec::new(),
        Value::String(s) => {
            if s.trim().is_empty() {
                Vec::new()
            } else {
                vec![s]
            }
        }
        Value::Array(items) => items.into_iter().flat_map(flatten_strings).collect(),
        Value::Object(map) => map.into_values().flat_map(flatten_strings).collect(),
        other => vec![other.to_string()],
    }
}

/// Accepts a number or a numeric string (with or without a `%` sign)
/// and clamps it into 0-100.
fn rating<'de, D>(deserializer: D) -> Result<u8, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    let score = match &value {
        Value::Number(n) => n.as_f64().unwrap_or(0.0),
        Value::String(s) => s
            .trim()
            .trim_end_matches('%')
            .trim()
            .parse::<f64>()
            .unwrap_or(0.0),
        _ => 0.0,
    };
    Ok(score.clamp(0.0, 100.0).round() as u8)
}

/// Accepts a string, or a list the model split a paragraph into, and
/// joins it back to one text.
fn text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(flatten_strings(value).join(" "))
}
