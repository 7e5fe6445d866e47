//! Plain lyrics text, without timing

use once_cell::sync::Lazy;
use regex::Regex;

use super::aligned::{normalize_line_breaks, AlignedWord};

static BLANK_RUN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[ \t\x0B\x0C\r]+").expect("valid blank run pattern"));
static BREAK_RUN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r" *\n+ *").expect("valid line break pattern"));
static TAG_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[[^\]\n]*\]\n?").expect("valid tag line pattern"));

/// Join word fragments into lyrics text that keeps its line breaks.
///
/// Fragments already carry their own spacing, so nothing is inserted between
/// them; each one only has its blank runs squeezed.
pub fn plain_lyrics(words: &[AlignedWord]) -> String {
    let joined: String = words
        .iter()
        .map(|w| {
            let squeezed = BLANK_RUN.replace_all(&w.word, " ");
            BREAK_RUN.replace_all(&squeezed, "\n").into_owned()
        })
        .collect();
    joined.trim().to_string()
}

/// Clean stored plain lyrics for display: real line breaks, no section tags
pub fn sanitize_plain_lyrics(src: &str) -> String {
    let text = normalize_line_breaks(src).replace('\r', "");
    TAG_LINE.replace_all(&text, "").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_lyrics() {
        let words = vec![
            AlignedWord::new("[Verse]\n별빛 ", 0.0, 0.5),
            AlignedWord::new("아래\t\t", 0.5, 1.0),
            AlignedWord::new("그려 \n\n ", 1.0, 1.5),
            AlignedWord::new("다시\r\n", 1.5, 2.0),
        ];
        assert_eq!(plain_lyrics(&words), "[Verse]\n별빛 아래 그려\n다시");
    }

    #[test]
    fn test_plain_lyrics_empty() {
        assert_eq!(plain_lyrics(&[]), "");
    }

    #[test]
    fn test_sanitize_plain_lyrics() {
        let stored = "[Verse]\\n별빛 아래\\n[Chorus]\n그려\r\n";
        assert_eq!(sanitize_plain_lyrics(stored), "별빛 아래\n그려");

        assert_eq!(sanitize_plain_lyrics("[Intro]\n[Verse]\nla la\n"), "la la");
        assert_eq!(sanitize_plain_lyrics("  "), "");
    }
}
