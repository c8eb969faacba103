//! # contract: trait seams between the pipeline stages
//!
//! This module defines the interfaces the production pipeline is orchestrated
//! against: script generation (LLM), speech synthesis (TTS), lesson rendering
//! (slides + audio + video assembly) and video upload (hosting API).
//!
//! ## Interface & Extensibility
//! - Implement [`ScriptGenerator`] to plug in a different language model.
//! - Implement [`VideoUploader`] to publish to a different hosting platform.
//! - All methods are async, returning results and using boxed error types.
//! - Meant for both production code and robust mocking in tests.
//!
//! ## Mocking & Testing
//! - The traits are annotated for `mockall` so consumers can generate
//!   deterministic mocks for unit/integration tests (behind the
//!   `test-export-mocks` feature).

use async_trait::async_trait;
use std::path::{Path, PathBuf};

#[cfg(any(test, feature = "test-export-mocks"))]
use mockall::automock;

use crate::plan::{ContentPlan, Lesson};

/// One slide of a lesson: a heading and the narrated body text.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Slide {
    pub title: String,
    pub content: String,
}

/// Structured content for one lesson, as produced by the script generator.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct LessonContent {
    /// 7-8 slides for the long-form video.
    pub long_form_slides: Vec<Slide>,
    /// A punchy 1-2 sentence summary used for the promotional short.
    pub short_form_highlight: String,
    /// Space-separated hashtags for descriptions.
    #[serde(default)]
    pub hashtags: String,
}

impl LessonContent {
    /// Hashtags with a sensible default when the model omitted them.
    pub fn hashtags_or_default(&self) -> &str {
        if self.hashtags.trim().is_empty() {
            "#AI #Developer #LearnAI"
        } else {
            &self.hashtags
        }
    }
}

pub type GenerateError = Box<dyn std::error::Error + Send + Sync>;

/// Trait for generating curriculum and lesson scripts from a language model.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait ScriptGenerator: Send + Sync {
    /// Generate a fresh curriculum. `previous_titles` lists lessons already
    /// produced; when non-empty the series should continue from them.
    async fn generate_curriculum(
        &self,
        previous_titles: &[String],
    ) -> Result<ContentPlan, GenerateError>;

    /// Generate the slides, short highlight and hashtags for one lesson title.
    async fn generate_lesson(&self, title: &str) -> Result<LessonContent, GenerateError>;
}

pub type SpeechError = Box<dyn std::error::Error + Send + Sync>;

/// Trait for converting script text into an audio file on disk.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    /// Synthesize `text` into `out_path` and return the path actually written.
    async fn synthesize(&self, text: &str, out_path: &Path) -> Result<PathBuf, SpeechError>;
}

/// Artifacts produced by rendering one lesson.
#[derive(Debug, Clone)]
pub struct RenderedLesson {
    pub long_video: PathBuf,
    pub long_thumbnail: PathBuf,
    pub short_video: PathBuf,
    pub short_thumbnail: PathBuf,
}

/// Error type for the rendering stage.
#[derive(Debug)]
pub enum RenderError {
    Io(std::io::Error),
    Font(String),
    Ffmpeg(String),
    Speech(SpeechError),
    Other(String),
}

impl From<std::io::Error> for RenderError {
    fn from(e: std::io::Error) -> Self {
        RenderError::Io(e)
    }
}

impl std::fmt::Display for RenderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RenderError::Io(e) => write!(f, "io error: {e}"),
            RenderError::Font(d) => write!(f, "font error: {d}"),
            RenderError::Ffmpeg(d) => write!(f, "ffmpeg error: {d}"),
            RenderError::Speech(e) => write!(f, "speech error: {e}"),
            RenderError::Other(d) => write!(f, "{d}"),
        }
    }
}

impl std::error::Error for RenderError {}

/// Trait for turning a lesson plus its generated content into finished
/// video files and thumbnails on disk.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait LessonRenderer: Send + Sync {
    async fn render_lesson(
        &self,
        lesson: &Lesson,
        content: &LessonContent,
    ) -> Result<RenderedLesson, RenderError>;
}

/// Represents the metadata and files needed to publish one video.
pub struct UploadRequest<'a> {
    pub video_path: &'a Path,
    pub title: &'a str,
    pub description: &'a str,
    /// Comma-separated tag list, split by the implementor.
    pub tags: &'a str,
    pub thumbnail_path: Option<&'a Path>,
}

pub type UploadError = Box<dyn std::error::Error + Send + Sync>;

/// Trait for uploading a finished video (and optional thumbnail) to the
/// hosting platform. Returns the platform-assigned video id.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait VideoUploader: Send + Sync {
    async fn upload<'a>(&self, req: UploadRequest<'a>) -> Result<String, UploadError>;
}
