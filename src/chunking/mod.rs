//! Transcript chunking for Laer.
//!
//! Splits a time-coded transcript into overlapping character windows, each
//! tagged with start/end timestamps, for use as retrieval units.

use crate::transcript::TranscriptSegment;
use serde::{Deserialize, Serialize};

/// A time-bounded slice of transcript text used as a retrieval unit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chunk {
    /// Position of this chunk in the video, ascending.
    pub chunk_index: usize,
    /// Text content, including any overlap carried from the previous chunk.
    pub text: String,
    /// Start time in seconds.
    pub start_seconds: f64,
    /// End time in seconds.
    pub end_seconds: f64,
}

/// Trailing `overlap` characters of a buffer, on char boundaries.
fn overlap_tail(buffer: &str, overlap: usize) -> String {
    if overlap == 0 {
        return String::new();
    }
    let chars: Vec<char> = buffer.chars().collect();
    chars[chars.len().saturating_sub(overlap)..].iter().collect()
}

/// Split a transcript into chunks with time boundaries.
///
/// Segment texts accumulate into a running buffer; once the buffer reaches
/// `chunk_size` characters the chunk is closed at the current segment's end
/// time, and the next buffer is seeded with the trailing `overlap`
/// characters of the closed chunk. The seeded chunk's start time is the
/// *current* segment's start, so the reported start slightly trails the
/// overlap text's true origin.
///
/// Any non-empty remainder is flushed as a final chunk bounded by the last
/// segment's end. An empty transcript yields an empty chunk list.
pub fn chunk_transcript(
    segments: &[TranscriptSegment],
    chunk_size: usize,
    overlap: usize,
) -> Vec<Chunk> {
    let mut chunks = Vec::new();
    let mut buffer = String::new();
    let mut chunk_start: Option<f64> = None;
    let mut chunk_index = 0;

    for segment in segments {
        if chunk_start.is_none() {
            chunk_start = Some(segment.start_seconds);
        }

        buffer.push(' ');
        buffer.push_str(&segment.text);

        if buffer.chars().count() >= chunk_size {
            chunks.push(Chunk {
                chunk_index,
                text: buffer.trim().to_string(),
                start_seconds: chunk_start.unwrap_or(segment.start_seconds),
                end_seconds: segment.end_seconds(),
            });

            buffer = overlap_tail(&buffer, overlap);
            chunk_start = Some(segment.start_seconds);
            chunk_index += 1;
        }
    }

    if let Some(last) = segments.last() {
        if !buffer.trim().is_empty() {
            chunks.push(Chunk {
                chunk_index,
                text: buffer.trim().to_string(),
                start_seconds: chunk_start.unwrap_or(last.start_seconds),
                end_seconds: last.end_seconds(),
            });
        }
    }

    chunks
}

#[cfg(test)]
mod tests {
    use super::*;

    fn segments(texts: &[&str]) -> Vec<TranscriptSegment> {
        texts
            .iter()
            .enumerate()
            .map(|(i, text)| TranscriptSegment::new(*text, i as f64 * 5.0, 5.0))
            .collect()
    }

    #[test]
    fn test_empty_transcript() {
        assert!(chunk_transcript(&[], 500, 50).is_empty());
    }

    #[test]
    fn test_single_chunk_remainder() {
        let segs = segments(&["hello there", "short transcript"]);
        let chunks = chunk_transcript(&segs, 500, 50);

        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].chunk_index, 0);
        assert_eq!(chunks[0].text, "hello there short transcript");
        assert_eq!(chunks[0].start_seconds, 0.0);
        assert_eq!(chunks[0].end_seconds, 10.0);
    }

    #[test]
    fn test_chunk_boundaries_and_order() {
        let segs = segments(&["aaaa", "bbbb", "cccc", "dddd", "eeee", "ffff"]);
        let chunks = chunk_transcript(&segs, 10, 0);

        assert!(chunks.len() > 1);
        for chunk in &chunks {
            assert!(chunk.end_seconds >= chunk.start_seconds);
        }
        for pair in chunks.windows(2) {
            assert!(pair[0].start_seconds <= pair[1].start_seconds);
            assert_eq!(pair[0].chunk_index + 1, pair[1].chunk_index);
        }
    }

    #[test]
    fn test_reconstruction_without_overlap() {
        let texts = ["the quick", "brown fox", "jumps over", "the lazy", "dog today"];
        let segs = segments(&texts);
        let chunks = chunk_transcript(&segs, 15, 0);

        let rebuilt = chunks
            .iter()
            .map(|c| c.text.as_str())
            .collect::<Vec<_>>()
            .join(" ");
        assert_eq!(rebuilt, texts.join(" "));
    }

    #[test]
    fn test_overlap_is_carried_as_prefix() {
        let segs = segments(&["aaaaaaaaaa", "bbbbbbbbbb", "cccccccccc"]);
        let chunks = chunk_transcript(&segs, 10, 4);

        assert!(chunks.len() >= 2);
        // The next chunk starts with the closed chunk's trailing characters.
        let carried: String = chunks[0].text.chars().rev().take(4).collect::<Vec<_>>()
            .into_iter()
            .rev()
            .collect();
        assert!(chunks[1].text.starts_with(&carried));
        // The seeded chunk reports the closing segment's start, not the
        // overlap text's true origin.
        assert_eq!(chunks[1].start_seconds, 0.0);
    }

    #[test]
    fn test_chunk_count_nondecreasing_as_size_shrinks() {
        let segs = segments(&[
            "one two three", "four five six", "seven eight nine", "ten eleven twelve",
            "thirteen fourteen", "fifteen sixteen",
        ]);

        let mut previous = 0;
        for chunk_size in [200, 60, 30, 15].iter() {
            let count = chunk_transcript(&segs, *chunk_size, 5).len();
            assert!(count >= previous);
            previous = count;
        }
    }

    #[test]
    fn test_final_chunk_bounded_by_last_segment() {
        let segs = segments(&["aaaaaaaa", "bbbbbbbb", "cc"]);
        let chunks = chunk_transcript(&segs, 10, 3);

        let last = chunks.last().unwrap();
        assert_eq!(last.end_seconds, 15.0);
    }
}
