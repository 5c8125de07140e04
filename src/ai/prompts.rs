// src/ai/prompts.rs
//
// Prompt construction for the structured features. Each prompt names
// the exact JSON keys the reply types expect; the chatbot endpoint has
// no prompt of its own, it forwards the conversation as-is.

use crate::state::StatusCounts;

pub fn resume_feedback(text: &str) -> String {
    format!(
        r#"Analyze this resume and give structured feedback.

Resume text:
{}

Return JSON with:
- grammar: grammar improvements
- strengths: strong points
- weaknesses: weak points
- keywords: recommended keywords to add"#,
        text
    )
}

pub fn job_analysis(text: &str) -> String {
    format!(
        r#"Analyze the following job description and return JSON.

Job description:
{}

Return JSON with:
- skills: key required skills
- keywords: recommended keywords
- suitability: a suitability rating between 0 and 100"#,
        text
    )
}

pub fn dashboard_insights(stats: &StatusCounts) -> String {
    let stats_json = serde_json::to_string(stats).unwrap_or_default();
    format!(
        r#"You are a motivational career assistant.
Based on the following job search stats, write a short motivational summary (max 3 sentences).

Stats: {}

Return JSON with:
- summary: motivational text"#,
        stats_json
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resume_prompt_embeds_text_and_keys() {
        let prompt = resume_feedback("Senior engineer, 8 years of Rust.");
        assert!(prompt.contains("Senior engineer, 8 years of Rust."));
        assert!(prompt.contains("- grammar"));
        assert!(prompt.contains("- strengths"));
        assert!(prompt.contains("- weaknesses"));
        assert!(prompt.contains("- keywords"));
    }

    #[test]
    fn test_analysis_prompt_asks_for_bounded_rating() {
        let prompt = job_analysis("Backend role, Rust and Postgres.");
        assert!(prompt.contains("Backend role, Rust and Postgres."));
        assert!(prompt.contains("- skills"));
        assert!(prompt.contains("between 0 and 100"));
    }

    #[test]
    fn test_insights_prompt_embeds_stats_json() {
        let stats = StatusCounts {
            applied: 7,
            interview: 3,
            accepted: 1,
            rejected: 2,
        };
        let prompt = dashboard_insights(&stats);
        assert!(prompt.contains(r#""applied":7"#));
        assert!(prompt.contains(r#""interview":3"#));
        assert!(prompt.contains("max 3 sentences"));
        assert!(prompt.contains("- summary"));
    }
}
