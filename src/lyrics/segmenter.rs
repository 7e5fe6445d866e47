//! Aligned words to two-line display blocks
//!
//! Words are folded into lines at their embedded line breaks, each line
//! spanning from the first word that put text on it to the last fragment that
//! reached it. Lines are then paired into blocks in order.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::aligned::AlignedWord;

/// Stands in for the missing second line of an odd trailing block
pub const PLACEHOLDER_LINE: &str = " ";

/// Bracketed section label, up to the first closing bracket
static SECTION_TAG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[[^\]]*\]").expect("valid section tag pattern"));

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SegmentOptions {
    /// Keep labels like "[Verse]" in the display text
    pub include_section_tags: bool,
}

/// Two lines of lyrics shown together, with the span they are sung over
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LyricsBlock {
    pub lines: [String; 2],
    pub start: f64,
    pub end: f64,
}

impl LyricsBlock {
    /// Whether the second line is the odd-count placeholder
    pub fn is_single(&self) -> bool {
        self.lines[1] == PLACEHOLDER_LINE
    }

    /// Both lines joined for display or analysis
    pub fn text(&self) -> String {
        if self.is_single() {
            self.lines[0].clone()
        } else {
            self.lines.join("\n")
        }
    }
}

/// Blocks plus every cleaned line, one per row, regardless of pairing
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SegmentedLyrics {
    pub blocks: Vec<LyricsBlock>,
    pub full_lyrics: String,
}

#[derive(Debug, Clone, PartialEq)]
struct TimedLine {
    text: String,
    start: f64,
    end: f64,
}

/// Fold state: finished lines plus the line still being built
#[derive(Debug, Default)]
struct LineAccumulator {
    lines: Vec<TimedLine>,
    pending: String,
    pending_start: Option<f64>,
    pending_end: Option<f64>,
}

impl LineAccumulator {
    fn push_word(mut self, word: &AlignedWord, opts: SegmentOptions) -> Self {
        let mut pieces = word.word.split('\n').peekable();

        while let Some(piece) = pieces.next() {
            // Only the separator space can sit in `pending` before real text,
            // and it must not pin the line start to an earlier word.
            if self.pending.trim().is_empty() {
                self.pending_start = Some(word.start_s);
            }
            self.pending.push_str(piece);
            self.pending_end = Some(word.end_s);

            if pieces.peek().is_some() {
                self.flush(opts);
            } else {
                self.pending.push(' ');
            }
        }

        self
    }

    fn flush(&mut self, opts: SegmentOptions) {
        let text = clean_line(&self.pending, opts);
        let start = self.pending_start.take();
        let end = self.pending_end.take();
        self.pending.clear();

        if let (false, Some(start), Some(end)) = (text.is_empty(), start, end) {
            self.lines.push(TimedLine { text, start, end });
        }
    }

    fn finish(mut self, opts: SegmentOptions) -> Vec<TimedLine> {
        self.flush(opts);
        self.lines
    }
}

/// Remove every bracketed section tag, then trim
pub fn strip_section_tags(text: &str) -> String {
    SECTION_TAG.replace_all(text, "").trim().to_string()
}

fn clean_line(raw: &str, opts: SegmentOptions) -> String {
    let text = raw.trim();
    if opts.include_section_tags {
        text.to_string()
    } else {
        strip_section_tags(text)
    }
}

fn split_lines(words: &[AlignedWord], opts: SegmentOptions) -> Vec<TimedLine> {
    words
        .iter()
        .fold(LineAccumulator::default(), |acc, word| acc.push_word(word, opts))
        .finish(opts)
}

fn pair_lines(lines: &[TimedLine]) -> Vec<LyricsBlock> {
    lines
        .chunks(2)
        .filter_map(|pair| {
            let (first, rest) = pair.split_first()?;
            let block = match rest.first() {
                Some(second) => LyricsBlock {
                    lines: [first.text.clone(), second.text.clone()],
                    start: first.start,
                    end: second.end,
                },
                None => LyricsBlock {
                    lines: [first.text.clone(), PLACEHOLDER_LINE.to_string()],
                    start: first.start,
                    end: first.end,
                },
            };
            Some(block)
        })
        .collect()
}

/// Group aligned words into two-line blocks
pub fn segment(words: &[AlignedWord], opts: SegmentOptions) -> Vec<LyricsBlock> {
    pair_lines(&split_lines(words, opts))
}

/// Like [`segment`], also returning the cleaned lines joined by line breaks
pub fn segment_lyrics(words: &[AlignedWord], opts: SegmentOptions) -> SegmentedLyrics {
    let lines = split_lines(words, opts);
    let full_lyrics = lines
        .iter()
        .map(|l| l.text.as_str())
        .collect::<Vec<_>>()
        .join("\n");

    SegmentedLyrics {
        blocks: pair_lines(&lines),
        full_lyrics,
    }
}
