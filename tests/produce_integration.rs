//! Pipeline integration tests driven by mocked generator/renderer/uploader
//! implementations: exactly one record flips per successful run, selection
//! follows stored order, and a failed external call never corrupts the plan.

use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tempfile::tempdir;

use autocourse::contract::{
    LessonContent, MockLessonRenderer, MockScriptGenerator, MockVideoUploader, RenderedLesson,
    Slide,
};
use autocourse::plan::{load_plan, save_plan, ContentPlan, Lesson, LessonStatus};
use autocourse::produce::{produce, ProduceConfig};

fn lesson(chapter: u32, part: u32, title: &str, status: LessonStatus) -> Lesson {
    Lesson {
        chapter,
        part,
        title: title.to_string(),
        status,
        youtube_id: None,
    }
}

fn three_pending_plan() -> ContentPlan {
    ContentPlan {
        lessons: vec![
            lesson(1, 1, "What is Generative AI?", LessonStatus::Pending),
            lesson(1, 2, "How LLMs Predict Text", LessonStatus::Pending),
            lesson(2, 1, "Vector Databases Explained", LessonStatus::Pending),
        ],
    }
}

fn config(dir: &std::path::Path) -> ProduceConfig {
    ProduceConfig {
        plan_file: dir.join("content_plan.json"),
        output_dir: dir.join("output"),
        lessons_per_run: 1,
        presenter: "Chaitanya".to_string(),
        series: "AI for Developers".to_string(),
        short_upload_delay_secs: 0,
    }
}

fn sample_content() -> LessonContent {
    LessonContent {
        long_form_slides: vec![Slide {
            title: "Intro".to_string(),
            content: "Welcome to the lesson.".to_string(),
        }],
        short_form_highlight: "AI in one minute.".to_string(),
        hashtags: "#AI #Developer".to_string(),
    }
}

fn rendered(dir: &std::path::Path) -> RenderedLesson {
    RenderedLesson {
        long_video: dir.join("long.mp4"),
        long_thumbnail: dir.join("long.png"),
        short_video: dir.join("short.mp4"),
        short_thumbnail: dir.join("short.png"),
    }
}

fn happy_generator() -> MockScriptGenerator {
    let mut generator = MockScriptGenerator::new();
    generator
        .expect_generate_lesson()
        .returning(|_| Ok(sample_content()));
    generator
}

fn happy_renderer(dir: PathBuf) -> MockLessonRenderer {
    let mut renderer = MockLessonRenderer::new();
    renderer
        .expect_render_lesson()
        .returning(move |_, _| Ok(rendered(&dir)));
    renderer
}

/// Uploader that hands out sequential video ids.
fn happy_uploader(counter: Arc<AtomicUsize>) -> MockVideoUploader {
    let mut uploader = MockVideoUploader::new();
    uploader.expect_upload().returning(move |_| {
        let n = counter.fetch_add(1, Ordering::SeqCst);
        Ok(format!("vid{n}"))
    });
    uploader
}

#[tokio::test]
async fn exactly_one_record_flips_per_successful_run() {
    let dir = tempdir().unwrap();
    let config = config(dir.path());
    save_plan(&config.plan_file, &three_pending_plan()).unwrap();

    let generator = happy_generator();
    let renderer = happy_renderer(dir.path().to_path_buf());
    let uploader = happy_uploader(Arc::new(AtomicUsize::new(0)));

    let report = produce(&config, &generator, &renderer, &uploader)
        .await
        .expect("produce should succeed");

    assert_eq!(report.lessons.len(), 1);
    assert_eq!(report.lessons[0].title, "What is Generative AI?");
    assert_eq!(report.lessons[0].long_video_id, "vid0");
    assert_eq!(report.lessons[0].short_video_id.as_deref(), Some("vid1"));

    let plan = load_plan(&config.plan_file).unwrap();
    let statuses: Vec<LessonStatus> = plan.lessons.iter().map(|l| l.status).collect();
    assert_eq!(
        statuses,
        vec![
            LessonStatus::Complete,
            LessonStatus::Pending,
            LessonStatus::Pending,
        ]
    );
    // youtube_id records the long-form video.
    assert_eq!(plan.lessons[0].youtube_id.as_deref(), Some("vid0"));
    assert_eq!(plan.lessons[1].youtube_id, None);
}

#[tokio::test]
async fn next_run_selects_first_remaining_pending_in_order() {
    let dir = tempdir().unwrap();
    let config = config(dir.path());
    let mut plan = three_pending_plan();
    plan.lessons[0].status = LessonStatus::Complete;
    plan.lessons[0].youtube_id = Some("done".to_string());
    save_plan(&config.plan_file, &plan).unwrap();

    let generator = happy_generator();
    let renderer = happy_renderer(dir.path().to_path_buf());
    let uploader = happy_uploader(Arc::new(AtomicUsize::new(10)));

    let report = produce(&config, &generator, &renderer, &uploader)
        .await
        .unwrap();
    assert_eq!(report.lessons[0].title, "How LLMs Predict Text");

    let reloaded = load_plan(&config.plan_file).unwrap();
    assert_eq!(reloaded.lessons[1].status, LessonStatus::Complete);
    assert_eq!(reloaded.lessons[2].status, LessonStatus::Pending);
    // The already-complete record is not re-produced or duplicated.
    assert_eq!(reloaded.lessons[0].youtube_id.as_deref(), Some("done"));
    assert_eq!(reloaded.lessons.len(), 3);
}

#[tokio::test]
async fn failed_upload_leaves_plan_valid_and_pending() {
    let dir = tempdir().unwrap();
    let config = config(dir.path());
    save_plan(&config.plan_file, &three_pending_plan()).unwrap();

    let generator = happy_generator();
    let renderer = happy_renderer(dir.path().to_path_buf());
    let mut uploader = MockVideoUploader::new();
    uploader
        .expect_upload()
        .returning(|_| Err("quota exceeded".into()));

    let err = produce(&config, &generator, &renderer, &uploader)
        .await
        .expect_err("produce should fail when upload fails");
    assert!(err.contains("UPLOAD fail"), "got: {err}");

    // The plan file is still valid and unchanged.
    let plan = load_plan(&config.plan_file).unwrap();
    assert_eq!(plan, three_pending_plan());
}

#[tokio::test]
async fn failed_generation_leaves_plan_valid_and_pending() {
    let dir = tempdir().unwrap();
    let config = config(dir.path());
    save_plan(&config.plan_file, &three_pending_plan()).unwrap();

    let mut generator = MockScriptGenerator::new();
    generator
        .expect_generate_lesson()
        .returning(|_| Err("model unavailable".into()));
    let renderer = MockLessonRenderer::new();
    let uploader = MockVideoUploader::new();

    let err = produce(&config, &generator, &renderer, &uploader)
        .await
        .expect_err("produce should fail when generation fails");
    assert!(err.contains("Content generation failed"), "got: {err}");

    let plan = load_plan(&config.plan_file).unwrap();
    assert_eq!(plan, three_pending_plan());
}

#[tokio::test]
async fn missing_plan_file_triggers_fresh_curriculum() {
    let dir = tempdir().unwrap();
    let config = config(dir.path());

    let mut generator = happy_generator();
    generator
        .expect_generate_curriculum()
        .withf(|previous: &[String]| previous.is_empty())
        .returning(|_| Ok(three_pending_plan()));
    let renderer = happy_renderer(dir.path().to_path_buf());
    let uploader = happy_uploader(Arc::new(AtomicUsize::new(0)));

    let report = produce(&config, &generator, &renderer, &uploader)
        .await
        .unwrap();
    assert_eq!(report.lessons.len(), 1);

    let plan = load_plan(&config.plan_file).unwrap();
    assert_eq!(plan.lessons.len(), 3);
    assert_eq!(plan.lessons[0].status, LessonStatus::Complete);
}

#[tokio::test]
async fn fully_produced_plan_is_continued_with_previous_titles() {
    let dir = tempdir().unwrap();
    let config = config(dir.path());
    let mut plan = three_pending_plan();
    for l in &mut plan.lessons {
        l.status = LessonStatus::Complete;
    }
    save_plan(&config.plan_file, &plan).unwrap();

    let mut generator = happy_generator();
    generator
        .expect_generate_curriculum()
        .withf(|previous: &[String]| {
            previous.len() == 3 && previous[0] == "What is Generative AI?"
        })
        .returning(|_| {
            Ok(ContentPlan {
                lessons: vec![lesson(3, 1, "Agentic AI Basics", LessonStatus::Pending)],
            })
        });
    let renderer = happy_renderer(dir.path().to_path_buf());
    let uploader = happy_uploader(Arc::new(AtomicUsize::new(0)));

    let report = produce(&config, &generator, &renderer, &uploader)
        .await
        .unwrap();
    assert_eq!(report.lessons[0].title, "Agentic AI Basics");

    let reloaded = load_plan(&config.plan_file).unwrap();
    assert_eq!(reloaded.lessons.len(), 1);
    assert_eq!(reloaded.lessons[0].status, LessonStatus::Complete);
}

#[tokio::test]
async fn two_runs_complete_two_lessons_without_duplicates() {
    let dir = tempdir().unwrap();
    let config = config(dir.path());
    save_plan(&config.plan_file, &three_pending_plan()).unwrap();

    for run in 0..2 {
        let generator = happy_generator();
        let renderer = happy_renderer(dir.path().to_path_buf());
        let uploader = happy_uploader(Arc::new(AtomicUsize::new(run * 10)));
        produce(&config, &generator, &renderer, &uploader)
            .await
            .unwrap();
    }

    let plan = load_plan(&config.plan_file).unwrap();
    assert_eq!(plan.lessons.len(), 3);
    let complete = plan
        .lessons
        .iter()
        .filter(|l| l.status == LessonStatus::Complete)
        .count();
    assert_eq!(complete, 2);
    assert_eq!(plan.lessons[2].status, LessonStatus::Pending);
}
