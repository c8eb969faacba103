//! Content-plan store: the ordered sequence of lesson records persisted as a
//! single JSON document. Order encodes curriculum sequence; the pipeline only
//! ever flips a record's status in place or rewrites the whole plan.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::{debug, info, warn};

/// Completion status of a lesson, tracked across runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LessonStatus {
    Pending,
    Complete,
}

/// One curriculum entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lesson {
    pub chapter: u32,
    pub part: u32,
    pub title: String,
    pub status: LessonStatus,
    #[serde(default)]
    pub youtube_id: Option<String>,
}

/// The persisted plan: an ordered list of lessons.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentPlan {
    pub lessons: Vec<Lesson>,
}

impl ContentPlan {
    /// Index of the first pending lesson in stored order, if any.
    pub fn first_pending(&self) -> Option<usize> {
        self.lessons
            .iter()
            .position(|l| l.status == LessonStatus::Pending)
    }

    /// Indices of all pending lessons, in stored order.
    pub fn pending_indices(&self) -> Vec<usize> {
        self.lessons
            .iter()
            .enumerate()
            .filter(|(_, l)| l.status == LessonStatus::Pending)
            .map(|(i, _)| i)
            .collect()
    }

    /// All lesson titles in stored order, used to seed curriculum continuation.
    pub fn titles(&self) -> Vec<String> {
        self.lessons.iter().map(|l| l.title.clone()).collect()
    }

    /// Mark the lesson matching `title` complete and record its video id.
    ///
    /// Matching is case-insensitive on the trimmed title, mirroring how the
    /// produced lesson is matched back to its record. Returns false when no
    /// record matched.
    pub fn mark_complete(&mut self, title: &str, youtube_id: &str) -> bool {
        let wanted = title.trim().to_lowercase();
        for lesson in &mut self.lessons {
            if lesson.title.trim().to_lowercase() == wanted {
                lesson.status = LessonStatus::Complete;
                lesson.youtube_id = Some(youtube_id.to_string());
                info!(title = %lesson.title, youtube_id, "Marked lesson complete");
                return true;
            }
        }
        warn!(title, "No matching lesson found to mark complete");
        false
    }
}

/// Load the plan from `path`, requiring a non-empty lesson list.
pub fn load_plan<P: AsRef<Path>>(path: P) -> Result<ContentPlan> {
    let path = path.as_ref();
    let raw = fs::read_to_string(path)
        .with_context(|| format!("Failed to read content plan {:?}", path))?;
    let plan: ContentPlan = serde_json::from_str(&raw)
        .with_context(|| format!("Failed to parse content plan {:?}", path))?;
    if plan.lessons.is_empty() {
        anyhow::bail!("Invalid or empty lesson plan in {:?}", path);
    }
    debug!(lessons = plan.lessons.len(), path = ?path, "Loaded content plan");
    Ok(plan)
}

/// Persist the plan to `path` as pretty-printed JSON.
pub fn save_plan<P: AsRef<Path>>(path: P, plan: &ContentPlan) -> Result<()> {
    let path = path.as_ref();
    let json = serde_json::to_string_pretty(plan).context("Failed to serialize content plan")?;
    fs::write(path, json).with_context(|| format!("Failed to write content plan {:?}", path))?;
    debug!(path = ?path, "Saved content plan");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lesson(chapter: u32, part: u32, title: &str, status: LessonStatus) -> Lesson {
        Lesson {
            chapter,
            part,
            title: title.to_string(),
            status,
            youtube_id: None,
        }
    }

    fn sample_plan() -> ContentPlan {
        ContentPlan {
            lessons: vec![
                lesson(1, 1, "What is Generative AI?", LessonStatus::Complete),
                lesson(1, 2, "How LLMs Predict Text", LessonStatus::Pending),
                lesson(2, 1, "Vector Databases Explained", LessonStatus::Pending),
            ],
        }
    }

    #[test]
    fn first_pending_respects_stored_order() {
        let plan = sample_plan();
        assert_eq!(plan.first_pending(), Some(1));
        assert_eq!(plan.pending_indices(), vec![1, 2]);
    }

    #[test]
    fn first_pending_is_none_when_all_complete() {
        let mut plan = sample_plan();
        for l in &mut plan.lessons {
            l.status = LessonStatus::Complete;
        }
        assert_eq!(plan.first_pending(), None);
        assert!(plan.pending_indices().is_empty());
    }

    #[test]
    fn mark_complete_matches_title_case_insensitively() {
        let mut plan = sample_plan();
        assert!(plan.mark_complete("  how llms predict text ", "abc123"));
        assert_eq!(plan.lessons[1].status, LessonStatus::Complete);
        assert_eq!(plan.lessons[1].youtube_id.as_deref(), Some("abc123"));
        // Other records untouched.
        assert_eq!(plan.lessons[2].status, LessonStatus::Pending);
        assert_eq!(plan.lessons[2].youtube_id, None);
    }

    #[test]
    fn mark_complete_returns_false_for_unknown_title() {
        let mut plan = sample_plan();
        assert!(!plan.mark_complete("Nonexistent Lesson", "zzz"));
        assert_eq!(plan, sample_plan());
    }

    #[test]
    fn plan_json_round_trips_all_records() {
        let plan = sample_plan();
        let json = serde_json::to_string_pretty(&plan).unwrap();
        let back: ContentPlan = serde_json::from_str(&json).unwrap();
        assert_eq!(back, plan);
    }

    #[test]
    fn status_serializes_lowercase() {
        let json = serde_json::to_string(&LessonStatus::Pending).unwrap();
        assert_eq!(json, "\"pending\"");
        let json = serde_json::to_string(&LessonStatus::Complete).unwrap();
        assert_eq!(json, "\"complete\"");
    }

    #[test]
    fn missing_youtube_id_defaults_to_none() {
        let raw = r#"{"lessons":[{"chapter":1,"part":1,"title":"Intro","status":"pending"}]}"#;
        let plan: ContentPlan = serde_json::from_str(raw).unwrap();
        assert_eq!(plan.lessons[0].youtube_id, None);
    }
}
