//! Script generation against the Gemini generateContent API.
//!
//! The model is asked to respond with only a JSON object; in practice it
//! often wraps the payload in a ```json fence, which is stripped before
//! parsing.

use async_trait::async_trait;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

use crate::contract::{GenerateError, LessonContent, ScriptGenerator};
use crate::plan::ContentPlan;

const MODEL: &str = "gemini-2.5-flash";
const API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

pub struct GeminiClient {
    client: reqwest::Client,
    api_key: String,
    presenter: String,
    series: String,
}

#[derive(Serialize)]
struct GenerateContentRequest {
    contents: Vec<Content>,
}

#[derive(Serialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Serialize)]
struct Part {
    text: String,
}

#[derive(Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: CandidateContent,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: String,
}

impl GeminiClient {
    pub fn new(api_key: String, presenter: String, series: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key,
            presenter,
            series,
        }
    }

    async fn generate_text(&self, prompt: String) -> Result<String, GenerateError> {
        let url = format!(
            "{}/models/{}:generateContent?key={}",
            API_BASE, MODEL, self.api_key
        );
        let body = GenerateContentRequest {
            contents: vec![Content {
                parts: vec![Part { text: prompt }],
            }],
        };

        let response = self.client.post(&url).json(&body).send().await?;
        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            error!(status = %status, "Gemini API returned error: {text}");
            return Err(format!("Gemini API error (status {status}): {text}").into());
        }

        let parsed: GenerateContentResponse = response.json().await?;
        let text = parsed
            .candidates
            .first()
            .and_then(|c| c.content.parts.first())
            .map(|p| p.text.clone())
            .ok_or("Gemini response contained no candidates")?;
        debug!(chars = text.len(), "Received model response");
        Ok(text)
    }

    fn curriculum_prompt(&self, previous_titles: &[String]) -> String {
        let history = if previous_titles.is_empty() {
            String::new()
        } else {
            let formatted = previous_titles
                .iter()
                .enumerate()
                .map(|(i, t)| format!("{}. {}", i + 1, t))
                .collect::<Vec<_>>()
                .join("\n");
            format!(
                "The following lessons have already been created:\n{formatted}\n\n\
                 Please continue from where this series left off.\n"
            )
        };

        format!(
            "You are an expert AI educator. Generate a curriculum for a YouTube series called \
             '{series} by {presenter}'.\n{history}\
             The style must be: 'Assume the viewer is a beginner or non-technical person starting \
             their journey into AI as a developer. Use simple real-world analogies, relatable \
             examples, and then connect to technical concepts.'\n\n\
             The curriculum must guide a developer from absolute beginner to advanced AI, covering \
             foundations like Generative AI, LLMs, Vector Databases, and Agentic AI, then continue \
             into deep AI topics like Reinforcement Learning, Transformers internals, multi-agent \
             systems, tool use, and AI architecture.\n\n\
             Respond with ONLY a valid JSON object. The object must contain a key \"lessons\" which \
             is a list of 20 lesson objects. Each lesson object must have these keys: \"chapter\", \
             \"part\", \"title\", \"status\" (defaulted to \"pending\"), and \"youtube_id\" \
             (defaulted to null).",
            series = self.series,
            presenter = self.presenter,
            history = history,
        )
    }

    fn lesson_prompt(&self, title: &str) -> String {
        format!(
            "You are creating a lesson for the '{series} by {presenter}' series. The topic is \
             '{title}'.\nThe style is: Assume the viewer is a beginner developer or non-tech person \
             who wants to learn AI from scratch. Use analogies and clear, simple language. Each \
             concept must be explained from a developer's perspective, assuming no prior AI or ML \
             knowledge.\n\n\
             Generate a JSON response with three keys:\n\
             1. \"long_form_slides\": A list of 7 to 8 slide objects for a longer, more detailed \
             main video. Each object needs a \"title\" and \"content\" key.\n\
             2. \"short_form_highlight\": A single, punchy, 1-2 sentence summary for a YouTube \
             Short.\n\
             3. \"hashtags\": A string of 5-7 relevant, space-separated hashtags for this lesson.\n\n\
             Return only valid JSON.",
            series = self.series,
            presenter = self.presenter,
            title = title,
        )
    }
}

/// Strip markdown code fences the model sometimes wraps JSON payloads in.
pub fn strip_code_fences(text: &str) -> String {
    // Matches ```json ... ``` or bare ``` fences around the whole payload.
    let fence = Regex::new(r"(?s)^\s*```(?:json)?\s*(.*?)\s*```\s*$").expect("static regex");
    match fence.captures(text.trim()) {
        Some(caps) => caps[1].to_string(),
        None => text.trim().to_string(),
    }
}

#[async_trait]
impl ScriptGenerator for GeminiClient {
    async fn generate_curriculum(
        &self,
        previous_titles: &[String],
    ) -> Result<ContentPlan, GenerateError> {
        info!(
            previous = previous_titles.len(),
            "Generating curriculum from scratch"
        );
        let raw = self
            .generate_text(self.curriculum_prompt(previous_titles))
            .await?;
        let json = strip_code_fences(&raw);
        let plan: ContentPlan = serde_json::from_str(&json)
            .map_err(|e| format!("Curriculum response was not valid JSON: {e}"))?;
        if plan.lessons.is_empty() {
            return Err("Curriculum generated but no lessons found".into());
        }
        info!(lessons = plan.lessons.len(), "New curriculum generated");
        Ok(plan)
    }

    async fn generate_lesson(&self, title: &str) -> Result<LessonContent, GenerateError> {
        info!(title, "Generating lesson content");
        let raw = self.generate_text(self.lesson_prompt(title)).await?;
        let json = strip_code_fences(&raw);
        let content: LessonContent = serde_json::from_str(&json)
            .map_err(|e| format!("Lesson response was not valid JSON: {e}"))?;
        if content.long_form_slides.is_empty() {
            return Err(format!("Lesson '{title}' generated with no slides").into());
        }
        info!(
            slides = content.long_form_slides.len(),
            "Lesson content generated"
        );
        Ok(content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_json_fence() {
        let raw = "```json\n{\"lessons\": []}\n```";
        assert_eq!(strip_code_fences(raw), "{\"lessons\": []}");
    }

    #[test]
    fn strips_bare_fence() {
        let raw = "```\n{\"a\": 1}\n```";
        assert_eq!(strip_code_fences(raw), "{\"a\": 1}");
    }

    #[test]
    fn leaves_unfenced_payload_alone() {
        let raw = "  {\"a\": 1}  ";
        assert_eq!(strip_code_fences(raw), "{\"a\": 1}");
    }

    #[test]
    fn parses_lesson_content_without_hashtags() {
        let raw = r#"{
            "long_form_slides": [{"title": "Intro", "content": "Welcome."}],
            "short_form_highlight": "AI in one minute."
        }"#;
        let content: LessonContent = serde_json::from_str(raw).unwrap();
        assert_eq!(content.hashtags, "");
        assert_eq!(content.hashtags_or_default(), "#AI #Developer #LearnAI");
    }

    #[test]
    fn curriculum_prompt_lists_previous_titles() {
        let client = GeminiClient::new(
            "key".into(),
            "Chaitanya".into(),
            "AI for Developers".into(),
        );
        let prompt = client.curriculum_prompt(&["What is AI?".to_string()]);
        assert!(prompt.contains("1. What is AI?"));
        assert!(prompt.contains("continue from where this series left off"));

        let fresh = client.curriculum_prompt(&[]);
        assert!(!fresh.contains("already been created"));
    }
}
