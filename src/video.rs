//! Video assembly with ffmpeg.
//!
//! Each slide becomes a short H.264 segment: the still image looped for the
//! narration's duration plus half a second of padding, with a 0.5s fade in
//! and out. Segments are joined with the concat demuxer; optional background
//! music is mixed in at low volume afterwards.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::contract::RenderError;

const FADE_SECS: f64 = 0.5;
const PADDING_SECS: f64 = 0.5;
const MUSIC_VOLUME: f64 = 0.15;
const NARRATION_VOLUME: f64 = 1.2;

/// Duration of a media file in seconds, via ffprobe.
pub fn probe_duration(path: &Path) -> Result<f64, RenderError> {
    let output = Command::new("ffprobe")
        .args([
            "-v",
            "error",
            "-show_entries",
            "format=duration",
            "-of",
            "default=noprint_wrappers=1:nokey=1",
        ])
        .arg(path)
        .output()
        .map_err(|e| RenderError::Ffmpeg(format!("failed to launch ffprobe: {e}")))?;
    if !output.status.success() {
        return Err(RenderError::Ffmpeg(format!(
            "ffprobe failed for {:?}: {}",
            path,
            String::from_utf8_lossy(&output.stderr)
        )));
    }
    let raw = String::from_utf8_lossy(&output.stdout);
    raw.trim()
        .parse::<f64>()
        .map_err(|e| RenderError::Ffmpeg(format!("unparseable ffprobe duration {raw:?}: {e}")))
}

fn run_ffmpeg(args: &[String], what: &str) -> Result<(), RenderError> {
    debug!(?args, what, "Running ffmpeg");
    let status = Command::new("ffmpeg")
        .args(args)
        .status()
        .map_err(|e| RenderError::Ffmpeg(format!("failed to launch ffmpeg ({what}): {e}")))?;
    if !status.success() {
        return Err(RenderError::Ffmpeg(format!(
            "ffmpeg exited with {status} during {what}"
        )));
    }
    Ok(())
}

/// Arguments for one slide segment: loop the still for the narration length
/// plus padding, pad the audio tail, fade video in and out.
fn segment_args(
    slide: &Path,
    audio: &Path,
    duration: f64,
    out: &Path,
) -> Vec<String> {
    let total = duration + PADDING_SECS;
    let fade_out_start = (total - FADE_SECS).max(0.0);
    vec![
        "-y".into(),
        "-loop".into(),
        "1".into(),
        "-i".into(),
        slide.to_string_lossy().into_owned(),
        "-i".into(),
        audio.to_string_lossy().into_owned(),
        "-vf".into(),
        format!(
            "fade=t=in:st=0:d={FADE_SECS},fade=t=out:st={fade_out_start:.3}:d={FADE_SECS},format=yuv420p"
        ),
        "-af".into(),
        "apad".into(),
        "-t".into(),
        format!("{total:.3}"),
        "-r".into(),
        "24".into(),
        "-c:v".into(),
        "libx264".into(),
        "-preset".into(),
        "medium".into(),
        "-c:a".into(),
        "aac".into(),
        "-b:a".into(),
        "192k".into(),
        out.to_string_lossy().into_owned(),
    ]
}

/// Arguments to mix looping background music under the narration track.
fn music_mix_args(video: &Path, music: &Path, out: &Path) -> Vec<String> {
    vec![
        "-y".into(),
        "-i".into(),
        video.to_string_lossy().into_owned(),
        "-stream_loop".into(),
        "-1".into(),
        "-i".into(),
        music.to_string_lossy().into_owned(),
        "-filter_complex".into(),
        format!(
            "[0:a]volume={NARRATION_VOLUME}[narration];[1:a]volume={MUSIC_VOLUME}[music];\
             [narration][music]amix=inputs=2:duration=first[mixed]"
        ),
        "-map".into(),
        "0:v".into(),
        "-map".into(),
        "[mixed]".into(),
        "-c:v".into(),
        "copy".into(),
        "-c:a".into(),
        "aac".into(),
        "-b:a".into(),
        "192k".into(),
        out.to_string_lossy().into_owned(),
    ]
}

/// Assemble slides and per-slide narration into a single video at `out_path`.
///
/// `slides` and `audio` must be the same non-zero length. `music` points at
/// an optional background track mixed in when the file exists.
pub fn assemble(
    slides: &[PathBuf],
    audio: &[PathBuf],
    out_path: &Path,
    music: Option<&Path>,
) -> Result<(), RenderError> {
    if slides.is_empty() || slides.len() != audio.len() {
        return Err(RenderError::Other(format!(
            "mismatch between slides ({}) and audio clips ({}), or no slides provided",
            slides.len(),
            audio.len()
        )));
    }

    let scratch = out_path
        .parent()
        .unwrap_or_else(|| Path::new("."))
        .join(format!("segments_{}", Uuid::new_v4()));
    std::fs::create_dir_all(&scratch)?;
    info!(segments = slides.len(), out = %out_path.display(), "Assembling video");

    let result = assemble_in(slides, audio, out_path, music, &scratch);
    if let Err(e) = std::fs::remove_dir_all(&scratch) {
        warn!(error = %e, path = %scratch.display(), "Could not remove segment scratch dir");
    }
    result
}

fn assemble_in(
    slides: &[PathBuf],
    audio: &[PathBuf],
    out_path: &Path,
    music: Option<&Path>,
    scratch: &Path,
) -> Result<(), RenderError> {
    let mut segments = Vec::with_capacity(slides.len());
    for (i, (slide, clip)) in slides.iter().zip(audio).enumerate() {
        let duration = probe_duration(clip)?;
        let segment = scratch.join(format!("segment_{i:03}.mp4"));
        run_ffmpeg(
            &segment_args(slide, clip, duration, &segment),
            "segment encode",
        )?;
        segments.push(segment);
    }

    // Concat demuxer needs a list file; absolute paths with -safe 0.
    let mut list_file = tempfile::NamedTempFile::new()?;
    for segment in &segments {
        let absolute = segment.canonicalize()?;
        writeln!(list_file, "file '{}'", absolute.display())?;
    }
    list_file.flush()?;

    let joined = match music {
        Some(m) if m.exists() => scratch.join("joined.mp4"),
        _ => out_path.to_path_buf(),
    };
    run_ffmpeg(
        &[
            "-y".into(),
            "-f".into(),
            "concat".into(),
            "-safe".into(),
            "0".into(),
            "-i".into(),
            list_file.path().to_string_lossy().into_owned(),
            "-c".into(),
            "copy".into(),
            joined.to_string_lossy().into_owned(),
        ],
        "segment concat",
    )?;

    if let Some(m) = music {
        if m.exists() {
            info!(music = %m.display(), "Mixing background music");
            run_ffmpeg(&music_mix_args(&joined, m, out_path), "music mix")?;
        } else {
            debug!(music = %m.display(), "No background music file, skipping mix");
        }
    }
    info!(out = %out_path.display(), "Video assembled");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_mismatched_inputs() {
        let err = assemble(
            &[PathBuf::from("a.png")],
            &[],
            Path::new("out.mp4"),
            None,
        )
        .unwrap_err();
        assert!(matches!(err, RenderError::Other(_)));
    }

    #[test]
    fn rejects_empty_inputs() {
        let err = assemble(&[], &[], Path::new("out.mp4"), None).unwrap_err();
        assert!(matches!(err, RenderError::Other(_)));
    }

    #[test]
    fn segment_args_pad_and_fade() {
        let args = segment_args(
            Path::new("slide.png"),
            Path::new("clip.mp3"),
            4.0,
            Path::new("seg.mp4"),
        );
        let vf = &args[args.iter().position(|a| a == "-vf").unwrap() + 1];
        assert!(vf.contains("fade=t=in:st=0:d=0.5"));
        assert!(vf.contains("fade=t=out:st=4.000:d=0.5"));
        let t = &args[args.iter().position(|a| a == "-t").unwrap() + 1];
        assert_eq!(t, "4.500");
    }

    #[test]
    fn music_mix_keeps_video_stream() {
        let args = music_mix_args(
            Path::new("joined.mp4"),
            Path::new("bg.mp3"),
            Path::new("final.mp4"),
        );
        assert!(args.contains(&"-stream_loop".to_string()));
        let fc = &args[args.iter().position(|a| a == "-filter_complex").unwrap() + 1];
        assert!(fc.contains("volume=0.15"));
        assert!(fc.contains("amix=inputs=2:duration=first"));
    }
}
