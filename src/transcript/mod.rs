//! Transcript acquisition for Laer.
//!
//! Extracts video IDs from YouTube URLs and fetches time-coded captions.

mod youtube;

pub use youtube::YoutubeCaptionClient;

use crate::error::Result;
use async_trait::async_trait;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

/// A single time-coded segment of a video transcript.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptSegment {
    /// Caption text.
    pub text: String,
    /// Start time in the video (seconds).
    pub start_seconds: f64,
    /// Duration of the segment (seconds).
    pub duration_seconds: f64,
}

impl TranscriptSegment {
    pub fn new(text: impl Into<String>, start_seconds: f64, duration_seconds: f64) -> Self {
        Self {
            text: text.into(),
            start_seconds,
            duration_seconds,
        }
    }

    /// End time of the segment (seconds).
    pub fn end_seconds(&self) -> f64 {
        self.start_seconds + self.duration_seconds
    }
}

/// Trait for transcript sources.
#[async_trait]
pub trait TranscriptFetcher: Send + Sync {
    /// Fetch a time-coded transcript, preferring the given language codes in order.
    async fn fetch(&self, video_id: &str, languages: &[String]) -> Result<Vec<TranscriptSegment>>;
}

fn video_id_patterns() -> &'static [Regex; 3] {
    static PATTERNS: OnceLock<[Regex; 3]> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        [
            Regex::new(r"(?:youtube\.com/watch\?v=|youtu\.be/)([^&\n?#/]+)").unwrap(),
            Regex::new(r"youtube\.com/embed/([^&\n?#/]+)").unwrap(),
            Regex::new(r"youtube\.com/v/([^&\n?#/]+)").unwrap(),
        ]
    })
}

/// Extract a video ID from a YouTube URL.
///
/// Accepts `watch?v=`, `youtu.be/`, `/embed/`, and `/v/` URL shapes.
/// Returns `None` for anything else; the caller must treat that as a
/// client error, not a fetch failure.
pub fn extract_video_id(youtube_url: &str) -> Option<String> {
    for pattern in video_id_patterns() {
        if let Some(caps) = pattern.captures(youtube_url.trim()) {
            return caps.get(1).map(|m| m.as_str().to_string());
        }
    }
    None
}

/// Total video duration in whole seconds, derived from the last segment.
pub fn video_duration(segments: &[TranscriptSegment]) -> u32 {
    segments
        .last()
        .map(|s| s.end_seconds() as u32)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_video_id() {
        assert_eq!(
            extract_video_id("https://www.youtube.com/watch?v=dQw4w9WgXcQ"),
            Some("dQw4w9WgXcQ".to_string())
        );
        assert_eq!(
            extract_video_id("https://youtu.be/abc123"),
            Some("abc123".to_string())
        );
        assert_eq!(
            extract_video_id("https://youtube.com/embed/dQw4w9WgXcQ"),
            Some("dQw4w9WgXcQ".to_string())
        );
        assert_eq!(
            extract_video_id("https://www.youtube.com/v/dQw4w9WgXcQ"),
            Some("dQw4w9WgXcQ".to_string())
        );
        // Trailing query parameters are not part of the ID
        assert_eq!(
            extract_video_id("https://www.youtube.com/watch?v=dQw4w9WgXcQ&t=42s"),
            Some("dQw4w9WgXcQ".to_string())
        );
    }

    #[test]
    fn test_extract_video_id_rejects_other_urls() {
        assert_eq!(extract_video_id("https://vimeo.com/12345"), None);
        assert_eq!(extract_video_id("not a url"), None);
        assert_eq!(extract_video_id(""), None);
    }

    #[test]
    fn test_video_duration() {
        assert_eq!(video_duration(&[]), 0);

        let segments = vec![
            TranscriptSegment::new("first", 0.0, 4.5),
            TranscriptSegment::new("second", 4.5, 3.2),
        ];
        assert_eq!(video_duration(&segments), 7);
    }
}
