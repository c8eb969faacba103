//! Lesson rendering: turns one lesson's generated content into finished
//! video files and thumbnails in the output directory.
//!
//! Long-form: intro slide + content slides + outro slide, each narrated
//! separately so audio and visuals stay in sync. Short-form: a single
//! "Quick Tip" slide narrated with the highlight.

use async_trait::async_trait;
use chrono::Local;
use std::path::PathBuf;
use tracing::info;

use crate::contract::{
    LessonContent, LessonRenderer, RenderError, RenderedLesson, Slide, SpeechSynthesizer,
};
use crate::plan::Lesson;
use crate::video;
use crate::visuals::{SlideRenderer, VideoKind};

/// Static inputs for rendering: paths and the series identity.
#[derive(Debug, Clone)]
pub struct RenderSettings {
    pub output_dir: PathBuf,
    /// Optional background music track, mixed in when the file exists.
    pub music_file: PathBuf,
    pub presenter: String,
    pub series: String,
}

pub struct StudioRenderer<S: SpeechSynthesizer> {
    settings: RenderSettings,
    visuals: SlideRenderer,
    tts: S,
}

/// Date-stamped id so artifacts from different lessons and days never collide.
fn unique_id(lesson: &Lesson) -> String {
    format!(
        "{}_{}_{}",
        Local::now().format("%Y%m%d"),
        lesson.chapter,
        lesson.part
    )
}

fn intro_slide(lesson: &Lesson) -> Slide {
    Slide {
        title: lesson.title.clone(),
        content: format!("Chapter {} | Part {}", lesson.chapter, lesson.part),
    }
}

fn outro_slide() -> Slide {
    Slide {
        title: "Thanks for Watching!".to_string(),
        content: "Like, Share & Subscribe for more daily AI content!\n#AIforDevelopers"
            .to_string(),
    }
}

fn intro_script(series: &str, presenter: &str, title: &str) -> String {
    format!(
        "Hello and welcome to {series}. I'm {presenter} talking bot. \
         Today's lesson is titled {title}."
    )
}

fn outro_script() -> String {
    "Thanks for watching! If you found this helpful, make sure to subscribe to our channel \
     and hit the like button."
        .to_string()
}

impl<S: SpeechSynthesizer> StudioRenderer<S> {
    pub fn new(settings: RenderSettings, visuals: SlideRenderer, tts: S) -> Self {
        Self {
            settings,
            visuals,
            tts,
        }
    }

    async fn render_long_form(
        &self,
        lesson: &Lesson,
        content: &LessonContent,
        id: &str,
    ) -> Result<(PathBuf, PathBuf), RenderError> {
        let out = &self.settings.output_dir;

        let mut slides = vec![intro_slide(lesson)];
        slides.extend(content.long_form_slides.iter().cloned());
        slides.push(outro_slide());

        let mut scripts = vec![intro_script(
            &self.settings.series,
            &self.settings.presenter,
            &lesson.title,
        )];
        scripts.extend(content.long_form_slides.iter().map(|s| s.content.clone()));
        scripts.push(outro_script());

        let mut audio_paths = Vec::with_capacity(scripts.len());
        for (i, script) in scripts.iter().enumerate() {
            let path = out.join(format!("audio_slide_{}_{id}.mp3", i + 1));
            let written = self
                .tts
                .synthesize(script, &path)
                .await
                .map_err(RenderError::Speech)?;
            audio_paths.push(written);
        }
        info!(clips = audio_paths.len(), "Narration synthesized for long form");

        let slide_dir = out.join(format!("slides_long_{id}"));
        let mut slide_paths = Vec::with_capacity(slides.len());
        let total = slides.len();
        for (i, slide) in slides.iter().enumerate() {
            let path = self
                .visuals
                .render_slide(&slide_dir, VideoKind::Long, slide, i + 1, total)
                .await?;
            slide_paths.push(path);
        }

        let video_path = out.join(format!("long_video_{id}.mp4"));
        video::assemble(
            &slide_paths,
            &audio_paths,
            &video_path,
            Some(&self.settings.music_file),
        )?;

        let thumb_path = self
            .visuals
            .render_thumbnail(
                &out.join(format!("thumbnail_long_{id}.png")),
                VideoKind::Long,
                &lesson.title,
            )
            .await?;

        Ok((video_path, thumb_path))
    }

    async fn render_short_form(
        &self,
        lesson: &Lesson,
        content: &LessonContent,
        id: &str,
    ) -> Result<(PathBuf, PathBuf), RenderError> {
        let out = &self.settings.output_dir;
        let highlight = content.short_form_highlight.trim();

        let script = format!("{highlight}\n\nLink to the full lesson is in the description below.");
        let audio_path = self
            .tts
            .synthesize(&script, &out.join(format!("short_audio_{id}.mp3")))
            .await
            .map_err(RenderError::Speech)?;

        let slide = Slide {
            title: "Quick Tip!".to_string(),
            content: format!("{highlight}\n\n{} by {}", self.settings.series, self.settings.presenter),
        };
        let slide_path = self
            .visuals
            .render_slide(
                &out.join(format!("slides_short_{id}")),
                VideoKind::Short,
                &slide,
                1,
                1,
            )
            .await?;

        let video_path = out.join(format!("short_video_{id}.mp4"));
        video::assemble(&[slide_path], &[audio_path], &video_path, None)?;

        let thumb_path = self
            .visuals
            .render_thumbnail(
                &out.join(format!("thumbnail_short_{id}.png")),
                VideoKind::Short,
                &format!("Quick Tip: {}", lesson.title),
            )
            .await?;

        Ok((video_path, thumb_path))
    }
}

#[async_trait]
impl<S: SpeechSynthesizer> LessonRenderer for StudioRenderer<S> {
    async fn render_lesson(
        &self,
        lesson: &Lesson,
        content: &LessonContent,
    ) -> Result<RenderedLesson, RenderError> {
        std::fs::create_dir_all(&self.settings.output_dir)?;
        let id = unique_id(lesson);
        info!(title = %lesson.title, id, "Starting production for lesson");

        let (long_video, long_thumbnail) = self.render_long_form(lesson, content, &id).await?;
        let (short_video, short_thumbnail) = self.render_short_form(lesson, content, &id).await?;

        Ok(RenderedLesson {
            long_video,
            long_thumbnail,
            short_video,
            short_thumbnail,
        })
    }
}
