//! YouTube caption (timedtext) client.
//!
//! Fetches captions from YouTube's timedtext endpoint in the json3 format.
//! If the direct fetch fails, falls back to listing the available caption
//! tracks and selecting one by language preference.

use super::{TranscriptFetcher, TranscriptSegment};
use crate::error::{LaerError, Result};
use async_trait::async_trait;
use regex::Regex;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, instrument};
use url::Url;

const TIMEDTEXT_URL: &str = "https://www.youtube.com/api/timedtext";

/// Caption client backed by YouTube's timedtext endpoints.
pub struct YoutubeCaptionClient {
    http: reqwest::Client,
}

impl YoutubeCaptionClient {
    /// Create a client with the given request timeout.
    pub fn new(timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { http })
    }

    /// Fetch one caption track in the json3 format.
    async fn fetch_track(&self, video_id: &str, lang: &str) -> Result<Vec<TranscriptSegment>> {
        let url = Url::parse_with_params(
            TIMEDTEXT_URL,
            &[("v", video_id), ("lang", lang), ("fmt", "json3")],
        )
        .map_err(|e| LaerError::Captions(e.to_string()))?;

        let response = self.http.get(url).send().await?.error_for_status()?;
        let body = response.text().await?;

        if body.trim().is_empty() {
            return Err(LaerError::Captions(format!(
                "no '{}' captions for video {}",
                lang, video_id
            )));
        }

        let timed_text: TimedText = serde_json::from_str(&body)
            .map_err(|e| LaerError::Captions(format!("unexpected caption format: {}", e)))?;

        let segments: Vec<TranscriptSegment> = timed_text
            .events
            .into_iter()
            .filter_map(|event| {
                let text: String = event
                    .segs
                    .iter()
                    .map(|seg| seg.utf8.as_str())
                    .collect::<Vec<_>>()
                    .join("")
                    .replace('\n', " ")
                    .trim()
                    .to_string();

                if text.is_empty() {
                    return None;
                }

                Some(TranscriptSegment::new(
                    text,
                    event.start_ms as f64 / 1000.0,
                    event.duration_ms as f64 / 1000.0,
                ))
            })
            .collect();

        if segments.is_empty() {
            return Err(LaerError::Captions(format!(
                "'{}' caption track for video {} is empty",
                lang, video_id
            )));
        }

        Ok(segments)
    }

    /// List the language codes of all available caption tracks.
    async fn list_tracks(&self, video_id: &str) -> Result<Vec<String>> {
        let url = Url::parse_with_params(TIMEDTEXT_URL, &[("v", video_id), ("type", "list")])
            .map_err(|e| LaerError::Captions(e.to_string()))?;

        let response = self.http.get(url).send().await?.error_for_status()?;
        let body = response.text().await?;

        // The track list is a small XML document; pull out the lang_code attributes.
        let lang_re = Regex::new(r#"lang_code="([^"]+)""#).expect("valid regex");
        let codes: Vec<String> = lang_re
            .captures_iter(&body)
            .map(|caps| caps[1].to_string())
            .collect();

        if codes.is_empty() {
            return Err(LaerError::Captions(format!(
                "no caption tracks listed for video {}",
                video_id
            )));
        }

        Ok(codes)
    }
}

#[async_trait]
impl TranscriptFetcher for YoutubeCaptionClient {
    #[instrument(skip(self), fields(video_id = %video_id))]
    async fn fetch(&self, video_id: &str, languages: &[String]) -> Result<Vec<TranscriptSegment>> {
        let primary_lang = languages.first().map(String::as_str).unwrap_or("en");

        // Primary attempt: fetch the preferred track directly.
        let primary_err = match self.fetch_track(video_id, primary_lang).await {
            Ok(segments) => {
                debug!("Fetched {} caption segments ({})", segments.len(), primary_lang);
                return Ok(segments);
            }
            Err(e) => e,
        };

        // Fallback: enumerate available tracks and pick by language preference.
        let fallback = async {
            let available = self.list_tracks(video_id).await?;
            let chosen = languages
                .iter()
                .find(|lang| available.contains(lang))
                .cloned()
                .unwrap_or_else(|| available[0].clone());
            self.fetch_track(video_id, &chosen).await
        };

        match fallback.await {
            Ok(segments) => {
                debug!("Fetched {} caption segments via track list", segments.len());
                Ok(segments)
            }
            Err(fallback_err) => Err(LaerError::Captions(format!(
                "{}. Alternative attempt: {}",
                primary_err, fallback_err
            ))),
        }
    }
}

/// json3 timedtext payload.
#[derive(Debug, Deserialize)]
struct TimedText {
    #[serde(default)]
    events: Vec<TimedTextEvent>,
}

#[derive(Debug, Deserialize)]
struct TimedTextEvent {
    #[serde(rename = "tStartMs", default)]
    start_ms: u64,
    #[serde(rename = "dDurationMs", default)]
    duration_ms: u64,
    #[serde(default)]
    segs: Vec<TimedTextSeg>,
}

#[derive(Debug, Deserialize)]
struct TimedTextSeg {
    #[serde(default)]
    utf8: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_json3_events() {
        let body = r#"{
            "events": [
                {"tStartMs": 0, "dDurationMs": 2500, "segs": [{"utf8": "hello "}, {"utf8": "world"}]},
                {"tStartMs": 2500, "dDurationMs": 1000, "segs": [{"utf8": "\n"}]},
                {"tStartMs": 3500, "dDurationMs": 2000, "segs": [{"utf8": "again"}]}
            ]
        }"#;

        let timed_text: TimedText = serde_json::from_str(body).unwrap();
        assert_eq!(timed_text.events.len(), 3);
        assert_eq!(timed_text.events[0].start_ms, 0);
        assert_eq!(timed_text.events[0].segs.len(), 2);
    }

    #[test]
    fn test_track_list_lang_codes() {
        let body = r#"<?xml version="1.0" encoding="utf-8"?>
<transcript_list docid="x">
  <track id="0" name="" lang_code="en" lang_original="English"/>
  <track id="1" name="" lang_code="de" lang_original="Deutsch"/>
</transcript_list>"#;

        let lang_re = Regex::new(r#"lang_code="([^"]+)""#).unwrap();
        let codes: Vec<String> = lang_re
            .captures_iter(body)
            .map(|caps| caps[1].to_string())
            .collect();
        assert_eq!(codes, vec!["en", "de"]);
    }
}
