//! High-level pipeline: orchestrates generate → render → upload for lessons.
//!
//! This module provides the top-level orchestration logic for one production
//! run against the loaded config. It implements a coordinated pipeline that:
//!   - Loads the content plan (generating a fresh curriculum when the file is
//!     missing, invalid, or fully produced)
//!   - Picks the first pending lessons in stored order, up to the per-run limit
//!   - Generates content, renders videos and uploads them per lesson
//!   - Flips each successful lesson to complete and rewrites the plan file
//!     after every attempt, so a failed run never advances status.
//!
//! # Error Handling
//! Each failed lesson is logged and leaves its record pending; the run as a
//! whole fails only when nothing was produced. The plan file is rewritten
//! after every lesson attempt, pass or fail.
//!
//! # Callable From
//! Used by both the CLI and the integration tests, which drive it with
//! mocked generator/renderer/uploader implementations.

use std::path::Path;
use tokio::time::{sleep, Duration};
use tracing::{error, info, warn};

use crate::contract::{LessonContent, LessonRenderer, ScriptGenerator, UploadRequest, VideoUploader};
use crate::plan::{self, ContentPlan, Lesson};

/// The top-level production configuration.
#[derive(Debug, Clone)]
pub struct ProduceConfig {
    pub plan_file: std::path::PathBuf,
    pub output_dir: std::path::PathBuf,
    pub lessons_per_run: usize,
    pub presenter: String,
    pub series: String,
    /// Pause between the long upload and the short upload.
    pub short_upload_delay_secs: u64,
}

/// Report of everything produced in one run.
#[derive(Debug)]
pub struct ProduceReport {
    pub lessons: Vec<LessonReport>,
}

#[derive(Debug)]
pub struct LessonReport {
    pub title: String,
    pub long_video_id: String,
    pub short_video_id: Option<String>,
}

/// Short title: the highlight truncated to 90 characters plus the #Shorts tag.
fn short_title(highlight: &str, lesson_title: &str) -> String {
    let highlight = highlight.trim();
    let base = if highlight.is_empty() {
        format!("AI Quick Tip: {lesson_title}")
    } else {
        highlight.to_string()
    };
    let truncated: String = base.chars().take(90).collect();
    format!("{} #Shorts", truncated.trim_end())
}

fn long_tags(title: &str) -> String {
    format!(
        "AI, Artificial Intelligence, Developer, Programming, Tutorial, {}",
        title.replace(' ', ", ")
    )
}

fn long_description(config: &ProduceConfig, title: &str, hashtags: &str) -> String {
    format!(
        "Part of the '{}' series by {}.\n\nToday's Lesson: {}\n\n{}",
        config.series, config.presenter, title, hashtags
    )
}

fn short_description(
    config: &ProduceConfig,
    content: &LessonContent,
    long_video_id: &str,
) -> String {
    format!(
        "{}\n\nWatch the full lesson with {} here: https://www.youtube.com/watch?v={}\n\n{}",
        content.short_form_highlight,
        config.presenter,
        long_video_id,
        content.hashtags_or_default()
    )
}

/// Load the plan, falling back to a freshly generated curriculum when the
/// file is missing or unreadable.
async fn load_or_generate_plan<G: ScriptGenerator>(
    config: &ProduceConfig,
    generator: &G,
) -> Result<ContentPlan, String> {
    if !config.plan_file.exists() {
        info!(plan_file = ?config.plan_file, "[PRODUCE] Plan file not found, generating new curriculum");
        let fresh = generator
            .generate_curriculum(&[])
            .await
            .map_err(|e| format!("Failed to generate curriculum: {e}"))?;
        plan::save_plan(&config.plan_file, &fresh).map_err(|e| e.to_string())?;
        return Ok(fresh);
    }
    match plan::load_plan(&config.plan_file) {
        Ok(existing) => Ok(existing),
        Err(e) => {
            error!(error = %e, "[PRODUCE] Failed to load existing plan, regenerating");
            let fresh = generator
                .generate_curriculum(&[])
                .await
                .map_err(|e| format!("Failed to regenerate curriculum: {e}"))?;
            plan::save_plan(&config.plan_file, &fresh).map_err(|e| e.to_string())?;
            Ok(fresh)
        }
    }
}

/// Produce and publish one lesson. Returns the long and short video ids.
async fn produce_lesson<G, R, U>(
    config: &ProduceConfig,
    lesson: &Lesson,
    generator: &G,
    renderer: &R,
    uploader: &U,
) -> Result<(String, Option<String>), String>
where
    G: ScriptGenerator,
    R: LessonRenderer,
    U: VideoUploader,
{
    info!(title = %lesson.title, "[PRODUCE] Starting production for lesson");

    let content = match generator.generate_lesson(&lesson.title).await {
        Ok(c) => c,
        Err(e) => {
            error!(title = %lesson.title, error = %e, "[PRODUCE][ERROR] Content generation failed");
            return Err(format!("Content generation failed for '{}': {e}", lesson.title));
        }
    };

    let rendered = match renderer.render_lesson(lesson, &content).await {
        Ok(r) => r,
        Err(e) => {
            error!(title = %lesson.title, error = %e, "[PRODUCE][ERROR] Rendering failed");
            return Err(format!("Rendering failed for '{}': {e}", lesson.title));
        }
    };

    let hashtags = content.hashtags_or_default().to_string();
    let description = long_description(config, &lesson.title, &hashtags);
    let tags = long_tags(&lesson.title);

    info!(video = ?rendered.long_video, "[PRODUCE][UPLOAD] Uploading long-form video");
    let long_video_id = uploader
        .upload(UploadRequest {
            video_path: &rendered.long_video,
            title: &lesson.title,
            description: &description,
            tags: &tags,
            thumbnail_path: Some(&rendered.long_thumbnail),
        })
        .await
        .map_err(|e| {
            error!(error = %e, "[PRODUCE][ERROR][UPLOAD] Long-form upload failed");
            format!("[UPLOAD fail @ long video for '{}']: {e}", lesson.title)
        })?;
    info!(video_id = %long_video_id, "[PRODUCE][UPLOAD] Long-form upload succeeded");

    if config.short_upload_delay_secs > 0 {
        info!(
            secs = config.short_upload_delay_secs,
            "[PRODUCE] Waiting before uploading the short"
        );
        sleep(Duration::from_secs(config.short_upload_delay_secs)).await;
    }

    let title = short_title(&content.short_form_highlight, &lesson.title);
    let description = short_description(config, &content, &long_video_id);
    let short_video_id = uploader
        .upload(UploadRequest {
            video_path: &rendered.short_video,
            title: &title,
            description: &description,
            tags: "AI,Shorts,TechTip",
            thumbnail_path: Some(&rendered.short_thumbnail),
        })
        .await
        .map_err(|e| {
            error!(error = %e, "[PRODUCE][ERROR][UPLOAD] Short upload failed");
            format!("[UPLOAD fail @ short video for '{}']: {e}", lesson.title)
        })?;
    info!(video_id = %short_video_id, "[PRODUCE][UPLOAD] Short upload succeeded");

    Ok((long_video_id, Some(short_video_id)))
}

/// Entrypoint: run the full production pipeline according to config.
pub async fn produce<G, R, U>(
    config: &ProduceConfig,
    generator: &G,
    renderer: &R,
    uploader: &U,
) -> Result<ProduceReport, String>
where
    G: ScriptGenerator,
    R: LessonRenderer,
    U: VideoUploader,
{
    info!("[PRODUCE] Starting production pipeline");
    std::fs::create_dir_all(&config.output_dir)
        .map_err(|e| format!("Failed to create output dir: {e}"))?;

    let mut plan = load_or_generate_plan(config, generator).await?;

    if plan.first_pending().is_none() {
        info!("[PRODUCE] All lessons produced, generating continuation curriculum");
        let previous = plan.titles();
        plan = generator
            .generate_curriculum(&previous)
            .await
            .map_err(|e| format!("Failed to generate continuation curriculum: {e}"))?;
        plan::save_plan(&config.plan_file, &plan).map_err(|e| e.to_string())?;
        if plan.first_pending().is_none() {
            warn!("[PRODUCE] Curriculum generated but no pending lessons found");
            return Ok(ProduceReport { lessons: vec![] });
        }
    }

    let mut report = ProduceReport { lessons: vec![] };
    let mut first_failure: Option<String> = None;

    let pending = plan.pending_indices();
    for &idx in pending.iter().take(config.lessons_per_run) {
        let lesson = plan.lessons[idx].clone();
        let outcome = produce_lesson(config, &lesson, generator, renderer, uploader).await;

        match outcome {
            Ok((long_id, short_id)) => {
                if !plan.mark_complete(&lesson.title, &long_id) {
                    warn!(title = %lesson.title, "[PRODUCE] Could not find lesson in plan to mark complete");
                }
                report.lessons.push(LessonReport {
                    title: lesson.title.clone(),
                    long_video_id: long_id,
                    short_video_id: short_id,
                });
                info!(title = %lesson.title, "[PRODUCE] Completed lesson");
            }
            Err(e) => {
                error!(title = %lesson.title, error = %e, "[PRODUCE][ERROR] Failed producing lesson");
                first_failure.get_or_insert(e);
            }
        }

        // The plan is rewritten after every attempt, success or not.
        plan::save_plan(&config.plan_file, &plan).map_err(|e| e.to_string())?;
        info!("[PRODUCE] Content plan updated");
    }

    clean_intermediate_audio(&config.output_dir);

    match (report.lessons.is_empty(), first_failure) {
        (true, Some(failure)) => Err(failure),
        _ => Ok(report),
    }
}

/// Remove intermediate narration files from the output directory. Cleanup
/// trouble is never fatal.
fn clean_intermediate_audio(output_dir: &Path) {
    let entries = match std::fs::read_dir(output_dir) {
        Ok(entries) => entries,
        Err(e) => {
            warn!(error = %e, "Could not scan output dir for audio cleanup");
            return;
        }
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) == Some("mp3") {
            match std::fs::remove_file(&path) {
                Ok(()) => info!(path = %path.display(), "Deleted intermediate audio"),
                Err(e) => warn!(error = %e, path = %path.display(), "Could not delete audio file"),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> ProduceConfig {
        ProduceConfig {
            plan_file: "content_plan.json".into(),
            output_dir: "output".into(),
            lessons_per_run: 1,
            presenter: "Chaitanya".to_string(),
            series: "AI for Developers".to_string(),
            short_upload_delay_secs: 0,
        }
    }

    #[test]
    fn short_title_truncates_to_90_chars() {
        let highlight = "x".repeat(200);
        let title = short_title(&highlight, "Lesson");
        assert!(title.ends_with(" #Shorts"));
        let base = title.strip_suffix(" #Shorts").unwrap();
        assert_eq!(base.chars().count(), 90);
    }

    #[test]
    fn short_title_falls_back_to_lesson_title() {
        let title = short_title("   ", "What is AI?");
        assert_eq!(title, "AI Quick Tip: What is AI? #Shorts");
    }

    #[test]
    fn long_tags_derive_from_title() {
        let tags = long_tags("Vector Databases Explained");
        assert!(tags.starts_with("AI, Artificial Intelligence"));
        assert!(tags.ends_with("Vector, Databases, Explained"));
    }

    #[test]
    fn short_description_links_long_video() {
        let content = LessonContent {
            long_form_slides: vec![],
            short_form_highlight: "Embeddings are coordinates for meaning.".to_string(),
            hashtags: "#AI #Embeddings".to_string(),
        };
        let desc = short_description(&config(), &content, "vid123");
        assert!(desc.contains("https://www.youtube.com/watch?v=vid123"));
        assert!(desc.contains("#AI #Embeddings"));
        assert!(desc.contains("Chaitanya"));
    }
}
