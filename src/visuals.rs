//! Slide and thumbnail rendering.
//!
//! Slides are PPT-style stills: an optional stock-photo background (Pexels),
//! blurred and darkened, with a header band for the title, centred body text
//! and a footer band carrying the series byline and slide counter. Thumbnails
//! are a single outlined title over the same background treatment.

use ab_glyph::{Font, FontVec, PxScale, ScaleFont};
use image::{imageops, Rgba, RgbaImage};
use imageproc::drawing::{draw_filled_rect_mut, draw_text_mut, text_size};
use imageproc::rect::Rect;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::contract::{RenderError, Slide};

const PEXELS_SEARCH_URL: &str = "https://api.pexels.com/v1/search";

/// Output orientation: long-form landscape or short-form portrait.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VideoKind {
    Long,
    Short,
}

impl VideoKind {
    pub fn dimensions(self) -> (u32, u32) {
        match self {
            VideoKind::Long => (1920, 1080),
            VideoKind::Short => (1080, 1920),
        }
    }

    fn orientation(self) -> &'static str {
        match self {
            VideoKind::Long => "landscape",
            VideoKind::Short => "portrait",
        }
    }
}

#[derive(Deserialize)]
struct PexelsResponse {
    #[serde(default)]
    photos: Vec<PexelsPhoto>,
}

#[derive(Deserialize)]
struct PexelsPhoto {
    src: PexelsSrc,
}

#[derive(Deserialize)]
struct PexelsSrc {
    large2x: String,
}

pub struct SlideRenderer {
    font: FontVec,
    client: reqwest::Client,
    pexels_api_key: Option<String>,
    byline: String,
}

impl SlideRenderer {
    /// Load the renderer's font from a TTF file. There is no usable default
    /// font, so a missing file is a hard error.
    pub fn from_font_file(
        font_file: &Path,
        pexels_api_key: Option<String>,
        byline: String,
    ) -> Result<Self, RenderError> {
        let bytes = std::fs::read(font_file).map_err(|e| {
            RenderError::Font(format!("failed to read font {:?}: {e}", font_file))
        })?;
        let font = FontVec::try_from_vec(bytes)
            .map_err(|e| RenderError::Font(format!("invalid font {:?}: {e}", font_file)))?;
        Ok(Self {
            font,
            client: reqwest::Client::new(),
            pexels_api_key,
            byline,
        })
    }

    /// Fetch a relevant background photo, or None when the key is missing or
    /// anything goes wrong. Callers fall back to a solid colour.
    async fn fetch_background(&self, query: &str, kind: VideoKind) -> Option<RgbaImage> {
        let api_key = match &self.pexels_api_key {
            Some(key) => key,
            None => {
                debug!("PEXELS_API_KEY not configured, using solid colour background");
                return None;
            }
        };

        let request = self
            .client
            .get(PEXELS_SEARCH_URL)
            .header("Authorization", api_key)
            .query(&[
                ("query", format!("abstract {query}")),
                ("per_page", "1".to_string()),
                ("orientation", kind.orientation().to_string()),
            ]);

        let response = match request.send().await.and_then(|r| r.error_for_status()) {
            Ok(r) => r,
            Err(e) => {
                warn!(error = %e, query, "Pexels search failed, using solid colour");
                return None;
            }
        };
        let parsed: PexelsResponse = match response.json().await {
            Ok(p) => p,
            Err(e) => {
                warn!(error = %e, "Pexels response was not valid JSON");
                return None;
            }
        };
        let url = parsed.photos.first().map(|p| p.src.large2x.clone())?;

        let bytes = match self.client.get(&url).send().await {
            Ok(r) => match r.bytes().await {
                Ok(b) => b,
                Err(e) => {
                    warn!(error = %e, "Failed to read Pexels image body");
                    return None;
                }
            },
            Err(e) => {
                warn!(error = %e, url, "Failed to download Pexels image");
                return None;
            }
        };
        match image::load_from_memory(&bytes) {
            Ok(img) => Some(img.to_rgba8()),
            Err(e) => {
                warn!(error = %e, "Failed to decode Pexels image");
                None
            }
        }
    }

    /// Background canvas: fetched photo (resized, blurred, darkened) or a
    /// solid dark blue. With `rotate_portrait`, a portrait-sourced photo is
    /// rotated to landscape before resizing instead of being squashed.
    async fn background(&self, query: &str, kind: VideoKind, rotate_portrait: bool) -> RgbaImage {
        let (width, height) = kind.dimensions();
        match self.fetch_background(query, kind).await {
            Some(photo) => {
                let photo = if rotate_portrait {
                    orient_landscape(photo)
                } else {
                    photo
                };
                let resized =
                    imageops::resize(&photo, width, height, imageops::FilterType::Triangle);
                let blurred = imageops::blur(&resized, 5.0);
                darken(blurred, 0.45)
            }
            None => RgbaImage::from_pixel(width, height, Rgba([12, 17, 29, 255])),
        }
    }

    /// Render one slide to `slide_dir/slide_NN.png`.
    pub async fn render_slide(
        &self,
        slide_dir: &Path,
        kind: VideoKind,
        slide: &Slide,
        number: usize,
        total: usize,
    ) -> Result<PathBuf, RenderError> {
        std::fs::create_dir_all(slide_dir)?;
        let (width, height) = kind.dimensions();
        let mut canvas = self.background(&slide.title, kind, false).await;

        let title_scale = scale_for(kind, 80.0, 90.0);
        let content_scale = scale_for(kind, 45.0, 55.0);
        let footer_scale = scale_for(kind, 25.0, 35.0);

        // Header band with the wrapped, centred title.
        let header_height = (height as f32 * 0.18) as u32;
        draw_filled_rect_mut(
            &mut canvas,
            Rect::at(0, 0).of_size(width, header_height),
            Rgba([25, 40, 65, 255]),
        );
        let title_lines = wrap_lines(&slide.title, (width as f32 * 0.9) as u32, |s| {
            text_width(title_scale, &self.font, s)
        });
        let title_line_height = line_height(title_scale, &self.font) + 10;
        let mut y = (header_height.saturating_sub(title_lines.len() as u32 * title_line_height)
            / 2) as i32;
        for line in &title_lines {
            let x = ((width - text_width(title_scale, &self.font, line).min(width)) / 2) as i32;
            draw_text_mut(
                &mut canvas,
                Rgba([255, 255, 255, 255]),
                x,
                y,
                title_scale,
                &self.font,
                line,
            );
            y += title_line_height as i32;
        }

        // Body text: vertically centred for short slides, below the header
        // otherwise.
        let body_lines = wrap_lines(&slide.content, (width as f32 * 0.85) as u32, |s| {
            text_width(content_scale, &self.font, s)
        });
        let body_line_height = line_height(content_scale, &self.font) + 15;
        let is_special = slide.content.split_whitespace().count() < 10;
        let total_text_height = body_lines.len() as u32 * body_line_height;
        let mut y = if is_special {
            (height.saturating_sub(total_text_height) / 2) as i32
        } else {
            header_height as i32 + 100
        };
        for line in &body_lines {
            let x = ((width - text_width(content_scale, &self.font, line).min(width)) / 2) as i32;
            draw_text_mut(
                &mut canvas,
                Rgba([230, 230, 230, 255]),
                x,
                y,
                content_scale,
                &self.font,
                line,
            );
            y += body_line_height as i32;
        }

        // Footer band: byline left, slide counter right.
        let footer_height = (height as f32 * 0.06) as u32;
        draw_filled_rect_mut(
            &mut canvas,
            Rect::at(0, (height - footer_height) as i32).of_size(width, footer_height),
            Rgba([25, 40, 65, 255]),
        );
        let footer_y = (height - footer_height + 12) as i32;
        draw_text_mut(
            &mut canvas,
            Rgba([180, 180, 180, 255]),
            40,
            footer_y,
            footer_scale,
            &self.font,
            &self.byline,
        );
        if total > 0 {
            let counter = format!("Slide {number} of {total}");
            let counter_width = text_width(footer_scale, &self.font, &counter);
            draw_text_mut(
                &mut canvas,
                Rgba([180, 180, 180, 255]),
                (width.saturating_sub(counter_width + 40)) as i32,
                footer_y,
                footer_scale,
                &self.font,
                &counter,
            );
        }

        let path = slide_dir.join(format!("slide_{number:02}.png"));
        canvas
            .save(&path)
            .map_err(|e| RenderError::Other(format!("failed to save slide: {e}")))?;
        debug!(path = %path.display(), "Rendered slide");
        Ok(path)
    }

    /// Render a thumbnail with the title centred and outlined, to `out_path`.
    pub async fn render_thumbnail(
        &self,
        out_path: &Path,
        kind: VideoKind,
        title: &str,
    ) -> Result<PathBuf, RenderError> {
        if let Some(parent) = out_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let (width, height) = kind.dimensions();
        // Pexels sometimes serves portrait art for a landscape query; rotate
        // rather than squash it for the long-form thumbnail.
        let mut canvas = self
            .background(title, kind, kind == VideoKind::Long)
            .await;

        let title_scale = scale_for(kind, 80.0, 90.0);
        let lines = wrap_lines(title, (width as f32 * 0.9) as u32, |s| {
            text_width(title_scale, &self.font, s)
        });
        let lh = line_height(title_scale, &self.font) + 10;
        let mut y = (height.saturating_sub(lines.len() as u32 * lh) / 2) as i32;
        for line in &lines {
            let x = ((width - text_width(title_scale, &self.font, line).min(width)) / 2) as i32;
            // Outline: draw the line offset in black before the white fill.
            for (dx, dy) in [(-2i32, 0i32), (2, 0), (0, -2), (0, 2)] {
                draw_text_mut(
                    &mut canvas,
                    Rgba([0, 0, 0, 255]),
                    x + dx,
                    y + dy,
                    title_scale,
                    &self.font,
                    line,
                );
            }
            draw_text_mut(
                &mut canvas,
                Rgba([255, 255, 255, 255]),
                x,
                y,
                title_scale,
                &self.font,
                line,
            );
            y += lh as i32;
        }

        canvas
            .save(out_path)
            .map_err(|e| RenderError::Other(format!("failed to save thumbnail: {e}")))?;
        info!(path = %out_path.display(), "Rendered thumbnail");
        Ok(out_path.to_path_buf())
    }
}

fn scale_for(kind: VideoKind, long: f32, short: f32) -> PxScale {
    PxScale::from(match kind {
        VideoKind::Long => long,
        VideoKind::Short => short,
    })
}

fn text_width(scale: PxScale, font: &FontVec, text: &str) -> u32 {
    text_size(scale, font, text).0
}

fn line_height(scale: PxScale, font: &FontVec) -> u32 {
    let scaled = font.as_scaled(scale);
    (scaled.ascent() - scaled.descent()).ceil() as u32
}

/// Rotate a portrait photo a quarter turn into landscape; landscape and
/// square photos pass through untouched.
fn orient_landscape(photo: RgbaImage) -> RgbaImage {
    if photo.height() > photo.width() {
        imageops::rotate270(&photo)
    } else {
        photo
    }
}

/// Multiply every colour channel, keeping alpha. Stands in for compositing a
/// translucent black layer over the photo.
fn darken(mut img: RgbaImage, factor: f32) -> RgbaImage {
    for pixel in img.pixels_mut() {
        for c in 0..3 {
            pixel[c] = (pixel[c] as f32 * factor) as u8;
        }
    }
    img
}

/// Greedy word wrap: pack words into lines no wider than `max_width`
/// according to `measure`. A single over-wide word gets its own line.
pub fn wrap_lines(text: &str, max_width: u32, measure: impl Fn(&str) -> u32) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    for word in text.split_whitespace() {
        let candidate = if current.is_empty() {
            word.to_string()
        } else {
            format!("{current} {word}")
        };
        if measure(&candidate) <= max_width || current.is_empty() {
            current = candidate;
        } else {
            lines.push(std::mem::replace(&mut current, word.to_string()));
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}
