//! Plan bootstrap from a YouTube search: builds a fresh pending-only content
//! plan out of the top results for a topic, via yt-dlp (no API key needed).

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;
use std::process::Command;
use tracing::{info, warn};

use crate::plan::{self, ContentPlan, Lesson, LessonStatus};

#[derive(Debug, Deserialize)]
struct SearchResult {
    // yt-dlp emits null for entries it could not resolve.
    #[serde(default)]
    entries: Vec<Option<SearchEntry>>,
}

#[derive(Debug, Deserialize)]
pub struct SearchEntry {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    title: Option<String>,
}

/// Search YouTube for `topic` and return up to `limit` entries with ids.
pub fn search_youtube(topic: &str, limit: usize) -> Result<Vec<SearchEntry>> {
    let query = format!("ytsearch{limit}:{topic}");
    info!(query, "Searching YouTube via yt-dlp");

    let output = Command::new("yt-dlp")
        .args(["--quiet", "--no-warnings", "--flat-playlist", "-J"])
        .arg(&query)
        .output()
        .context("Failed to launch yt-dlp (is it installed?)")?;
    if !output.status.success() {
        anyhow::bail!(
            "yt-dlp exited with {}: {}",
            output.status,
            String::from_utf8_lossy(&output.stderr)
        );
    }

    let parsed: SearchResult =
        serde_json::from_slice(&output.stdout).context("Failed to parse yt-dlp JSON output")?;
    let hits: Vec<SearchEntry> = parsed
        .entries
        .into_iter()
        .flatten()
        .filter(|e| e.id.is_some())
        .collect();
    info!(results = hits.len(), "YouTube search complete");
    Ok(hits)
}

/// Build a pending-only plan from search results. When `target_count`
/// exceeds the number of results, generic lesson titles pad the tail.
fn build_plan(hits: &[SearchEntry], target_count: usize) -> ContentPlan {
    let count = if target_count > 0 {
        target_count
    } else {
        hits.len()
    };
    let lessons = (0..count)
        .map(|idx| {
            let title = hits
                .get(idx)
                .and_then(|h| h.title.clone())
                .unwrap_or_else(|| format!("Lesson {}", idx + 1));
            Lesson {
                chapter: (idx / 2 + 1) as u32,
                part: (idx % 2 + 1) as u32,
                title,
                status: LessonStatus::Pending,
                youtube_id: None,
            }
        })
        .collect();
    ContentPlan { lessons }
}

/// Entry point for the `plan` subcommand: search, build and save a new plan.
pub fn run(topic: &str, count: usize, out: &Path) -> Result<()> {
    let hits = search_youtube(topic, count)?;
    if hits.is_empty() {
        warn!(topic, "No videos found or unable to parse search results");
        anyhow::bail!("No videos found for topic '{topic}'");
    }

    let new_plan = build_plan(&hits, count);
    plan::save_plan(out, &new_plan)?;
    println!(
        "Saved new content plan to {:?} ({} lessons).",
        out,
        new_plan.lessons.len()
    );
    for (i, lesson) in new_plan.lessons.iter().enumerate() {
        println!(
            " {:2}. Chapter {} Part {} | {}",
            i + 1,
            lesson.chapter,
            lesson.part,
            lesson.title
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hit(id: &str, title: &str) -> SearchEntry {
        SearchEntry {
            id: Some(id.to_string()),
            title: Some(title.to_string()),
        }
    }

    #[test]
    fn build_plan_assigns_chapters_in_pairs() {
        let hits = vec![hit("a", "One"), hit("b", "Two"), hit("c", "Three")];
        let plan = build_plan(&hits, 3);
        let parts: Vec<(u32, u32)> = plan
            .lessons
            .iter()
            .map(|l| (l.chapter, l.part))
            .collect();
        assert_eq!(parts, vec![(1, 1), (1, 2), (2, 1)]);
    }

    #[test]
    fn build_plan_pads_with_generic_titles() {
        let hits = vec![hit("a", "One")];
        let plan = build_plan(&hits, 3);
        assert_eq!(plan.lessons[0].title, "One");
        assert_eq!(plan.lessons[1].title, "Lesson 2");
        assert_eq!(plan.lessons[2].title, "Lesson 3");
    }

    #[test]
    fn build_plan_records_start_pending_without_ids() {
        let plan = build_plan(&[hit("a", "One")], 1);
        assert_eq!(plan.lessons[0].status, LessonStatus::Pending);
        assert_eq!(plan.lessons[0].youtube_id, None);
    }

    #[test]
    fn parses_flat_playlist_json_with_null_entries() {
        let raw = r#"{"entries":[{"id":"abc","title":"A"},{"title":"no id"},null]}"#;
        let parsed: SearchResult = serde_json::from_str(raw).unwrap();
        let hits: Vec<SearchEntry> = parsed
            .entries
            .into_iter()
            .flatten()
            .filter(|e| e.id.is_some())
            .collect();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id.as_deref(), Some("abc"));
    }
}
