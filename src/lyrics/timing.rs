//! Timing windows of two lyric lines, used to loop a song section
//!
//! Unlike [`super::segmenter`], windows carry no text. When the lyrics have too
//! few line breaks for the wanted number of windows, the rest of the song is
//! split evenly.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use super::aligned::AlignedWord;

static TAG_ONLY: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\[.*\]$").expect("valid tag pattern"));

/// Fallback pieces at or below this length (seconds) are dropped
const MIN_FALLBACK_SECS: f64 = 0.05;
/// Gap forced between overlapping windows
const OVERLAP_NUDGE_SECS: f64 = 0.01;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TimingWindow {
    pub start: f64,
    pub end: f64,
}

/// Cut `words` into at most `desired` windows of two lines each
pub fn timing_windows(words: &[AlignedWord], desired: usize) -> Vec<TimingWindow> {
    if words.is_empty() || desired == 0 {
        return Vec::new();
    }

    let mut cut = cut_by_line_breaks(words);
    if cut.len() >= desired {
        cut.truncate(desired);
        return cut;
    }

    let total_end = words.last().map(|w| w.end_s).unwrap_or(0.0);
    if total_end <= 0.0 {
        return vec![TimingWindow { start: 0.0, end: 0.0 }];
    }

    let remain = desired - cut.len();
    let start_at = cut.last().map(|w| w.end).unwrap_or(0.0);
    let step = (total_end - start_at).max(0.0) / remain as f64;

    let fallback = (0..remain).filter_map(|i| {
        let start = start_at + step * i as f64;
        let end = if i == remain - 1 {
            total_end
        } else {
            start_at + step * (i + 1) as f64
        };
        (end - start > MIN_FALLBACK_SECS).then_some(TimingWindow { start, end })
    });

    let mut merged: Vec<TimingWindow> = cut.into_iter().chain(fallback).take(desired).collect();
    for i in 1..merged.len() {
        let prev_end = merged[i - 1].end;
        let cur = &mut merged[i];
        if cur.start < prev_end {
            cur.start = (prev_end + OVERLAP_NUDGE_SECS).min(cur.end);
        }
    }
    merged
}

fn cut_by_line_breaks(words: &[AlignedWord]) -> Vec<TimingWindow> {
    let mut cut = Vec::new();
    let mut start: Option<f64> = None;
    let mut last_end: Option<f64> = None;
    let mut breaks = 0;

    for w in words {
        if TAG_ONLY.is_match(w.word.trim()) {
            continue;
        }

        if w.word.chars().any(|c| c != '\n') {
            if start.is_none() {
                start = Some(w.start_s);
            }
            last_end = Some(w.end_s);
        }

        if w.word.ends_with('\n') {
            breaks += 1;
            if breaks >= 2
                && let (Some(s), Some(e)) = (start, last_end)
            {
                cut.push(TimingWindow { start: s, end: e });
                start = None;
                last_end = None;
                breaks = 0;
            }
        }
    }

    if let (Some(s), Some(e)) = (start, last_end) {
        cut.push(TimingWindow { start: s, end: e });
    }
    cut
}

#[cfg(test)]
mod tests {
    use super::*;

    fn w(word: &str, start: f64, end: f64) -> AlignedWord {
        AlignedWord::new(word, start, end)
    }

    fn win(start: f64, end: f64) -> TimingWindow {
        TimingWindow { start, end }
    }

    fn song() -> Vec<AlignedWord> {
        vec![
            w("[Verse]\n", 0.0, 0.5),
            w("별빛 ", 1.0, 1.5),
            w("아래\n", 1.5, 2.0),
            w("꿈을\n", 2.0, 3.0),
            w("다시 ", 3.0, 3.5),
            w("그려\n", 3.5, 4.0),
            w("끝\n", 4.0, 5.0),
        ]
    }

    #[test]
    fn test_windows_from_line_breaks() {
        assert_eq!(timing_windows(&song(), 2), vec![win(1.0, 3.0), win(3.0, 5.0)]);
        assert_eq!(timing_windows(&song(), 1), vec![win(1.0, 3.0)]);
    }

    #[test]
    fn test_trailing_open_window() {
        let words = vec![w("a\n", 0.0, 1.0), w("b\n", 1.0, 2.0), w("c ", 2.0, 3.0)];
        assert_eq!(timing_windows(&words, 2), vec![win(0.0, 2.0), win(2.0, 3.0)]);
    }

    #[test]
    fn test_even_split_fallback() {
        let words = vec![w("a\n", 0.0, 1.0), w("b\n", 1.0, 2.0), w("tail", 2.0, 8.0)];
        // one cut window (0..2) and the open tail (2..8), then 8..8 has nothing left
        assert_eq!(timing_windows(&words, 3), vec![win(0.0, 2.0), win(2.0, 8.0)]);

        let words = vec![w("a\n", 0.0, 1.0), w("b\n", 1.0, 2.0), w("", 2.0, 8.0)];
        assert_eq!(
            timing_windows(&words, 4),
            vec![win(0.0, 2.0), win(2.0, 4.0), win(4.0, 6.0), win(6.0, 8.0)]
        );
    }

    #[test]
    fn test_zero_length_song() {
        let words = vec![w("", 0.0, 0.0)];
        assert_eq!(timing_windows(&words, 2), vec![win(0.0, 0.0)]);
    }

    #[test]
    fn test_overlap_is_nudged() {
        let words = vec![
            w("a\n", 0.0, 5.0),
            w("b\n", 1.0, 6.0),
            w("c\n", 2.0, 3.0),
            w("d\n", 3.0, 4.0),
        ];
        // second window starts inside the first and is clamped to its own end
        assert_eq!(timing_windows(&words, 3), vec![win(0.0, 6.0), win(4.0, 4.0)]);
    }

    #[test]
    fn test_fallback_follows_last_cut() {
        let words = vec![w("x ", 3.0, 4.0), w("", 0.0, 10.0)];
        let out = timing_windows(&words, 3);
        assert_eq!(out, vec![win(3.0, 4.0), win(4.0, 7.0), win(7.0, 10.0)]);
    }

    #[test]
    fn test_degenerate_requests() {
        assert!(timing_windows(&[], 3).is_empty());
        assert!(timing_windows(&song(), 0).is_empty());
    }
}
