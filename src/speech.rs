//! Speech synthesis over the Google Translate TTS endpoint.
//!
//! The endpoint only accepts short inputs, so scripts are split into chunks
//! of at most 200 characters on sentence/whitespace boundaries and the MP3
//! bodies are concatenated into a single output file. MP3 frames are
//! self-contained, so byte-level concatenation plays back (and feeds ffmpeg)
//! cleanly.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info};

use crate::contract::{SpeechError, SpeechSynthesizer};

const TTS_URL: &str = "https://translate.google.com/translate_tts";
const MAX_CHUNK_CHARS: usize = 200;

pub struct GoogleTts {
    client: reqwest::Client,
    language: String,
}

impl GoogleTts {
    pub fn new(language: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            language: language.into(),
        }
    }

    async fn fetch_chunk(&self, chunk: &str) -> Result<Vec<u8>, SpeechError> {
        let url = format!(
            "{}?ie=UTF-8&client=tw-ob&tl={}&q={}",
            TTS_URL,
            self.language,
            urlencoding::encode(chunk)
        );
        let response = self.client.get(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            error!(status = %status, "TTS endpoint returned error");
            return Err(format!("TTS endpoint error (status {status})").into());
        }
        Ok(response.bytes().await?.to_vec())
    }
}

impl Default for GoogleTts {
    fn default() -> Self {
        Self::new("en")
    }
}

/// Split `text` into chunks of at most `max_chars` characters, preferring
/// sentence boundaries and falling back to whitespace.
pub fn chunk_text(text: &str, max_chars: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        // A single over-long word (a URL, say) is split by character count.
        if word.chars().count() > max_chars {
            if !current.is_empty() {
                chunks.push(std::mem::take(&mut current));
            }
            let mut len = 0;
            for ch in word.chars() {
                if len == max_chars {
                    chunks.push(std::mem::take(&mut current));
                    len = 0;
                }
                current.push(ch);
                len += 1;
            }
            continue;
        }

        let candidate_len = if current.is_empty() {
            word.chars().count()
        } else {
            current.chars().count() + 1 + word.chars().count()
        };
        if candidate_len > max_chars && !current.is_empty() {
            chunks.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);

        // Prefer to cut after sentence-ending punctuation once the chunk is
        // reasonably full, so pauses land naturally.
        if current.chars().count() > max_chars / 2 && word.ends_with(['.', '!', '?']) {
            chunks.push(std::mem::take(&mut current));
        }
    }
    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

#[async_trait]
impl SpeechSynthesizer for GoogleTts {
    async fn synthesize(&self, text: &str, out_path: &Path) -> Result<PathBuf, SpeechError> {
        let chunks = chunk_text(text, MAX_CHUNK_CHARS);
        if chunks.is_empty() {
            return Err("Cannot synthesize empty script".into());
        }
        info!(chunks = chunks.len(), out = ?out_path, "Synthesizing speech");

        let mut audio: Vec<u8> = Vec::new();
        for (i, chunk) in chunks.iter().enumerate() {
            debug!(chunk = i, chars = chunk.len(), "Fetching TTS chunk");
            let bytes = self.fetch_chunk(chunk).await?;
            audio.extend_from_slice(&bytes);
        }

        if let Some(parent) = out_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(out_path, &audio)?;
        info!(bytes = audio.len(), out = ?out_path, "Speech written");
        Ok(out_path.to_path_buf())
    }
}
