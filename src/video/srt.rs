use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;

use crate::video::timeline::MIN_ENTRY_SECONDS;

lazy_static! {
    // A run of non-terminators, closed by a run of terminators or the end of text
    static ref SENTENCE: Regex = Regex::new(r"[^.!?]+(?:[.!?]+|$)").expect("valid sentence regex");
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubtitleCue {
    pub index: usize,
    pub start: f64,
    pub end: f64,
    pub text: String,
}

/// Split `text` into sentence-like segments on `.`, `!` and `?`.
pub fn split_sentences(text: &str) -> Vec<String> {
    let segments: Vec<String> = SENTENCE
        .find_iter(text)
        .map(|m| m.as_str().trim())
        .filter(|segment| {
            segment
                .trim_end_matches(['.', '!', '?'])
                .chars()
                .any(|c| !c.is_whitespace())
        })
        .map(str::to_string)
        .collect();

    if segments.is_empty() {
        let whole = text.trim();
        if whole.is_empty() {
            return Vec::new();
        }
        return vec![whole.to_string()];
    }

    segments
}

/// Evenly partition `[0, total_duration]` across the sentences of `text`.
pub fn synthesize_subtitles(text: &str, total_duration: f64) -> Vec<SubtitleCue> {
    let segments = split_sentences(text);
    if segments.is_empty() {
        return Vec::new();
    }

    let count = segments.len();
    // Same floor as the timeline, so every cue stays visible
    let total = if total_duration.is_finite() && total_duration > 0.0 {
        total_duration
    } else {
        MIN_ENTRY_SECONDS * count as f64
    };
    let per_segment = total / count as f64;

    segments
        .into_iter()
        .enumerate()
        .map(|(i, text)| SubtitleCue {
            index: i + 1,
            start: per_segment * i as f64,
            end: if i + 1 == count {
                total
            } else {
                per_segment * (i + 1) as f64
            },
            text,
        })
        .collect()
}

/// Render seconds as an SRT timestamp (`HH:MM:SS,mmm`).
pub fn format_time(seconds: f64) -> String {
    let total_millis = if seconds.is_finite() && seconds > 0.0 {
        (seconds * 1000.0).round() as u64
    } else {
        0
    };
    let hours = total_millis / 3_600_000;
    let minutes = (total_millis % 3_600_000) / 60_000;
    let secs = (total_millis % 60_000) / 1000;
    let millis = total_millis % 1000;
    format!("{hours:02}:{minutes:02}:{secs:02},{millis:03}")
}

pub fn to_srt(cues: &[SubtitleCue]) -> String {
    let mut out = String::new();
    for cue in cues {
        out.push_str(&format!(
            "{}\n{} --> {}\n{}\n\n",
            cue.index,
            format_time(cue.start),
            format_time(cue.end),
            cue.text
        ));
    }
    out
}
