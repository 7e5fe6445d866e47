//! Synchronized lyrics from word-level timing
//!
//! This module provides:
//! - Timing payload decoding (aligned words)
//! - Segmentation of aligned words into two-line display blocks
//! - Block lookup by playback position
//! - Plain lyrics text and loop timing windows

pub mod aligned;
pub mod cursor;
pub mod plain;
pub mod segmenter;
pub mod source;
pub mod timing;

pub use aligned::{AlignedWord, TimestampPayload};
pub use cursor::{block_index_at, BlockCursor, CursorMove};
pub use segmenter::{segment, segment_lyrics, LyricsBlock, SegmentOptions};
pub use source::load_payload;
