//! Which block is under the playhead

use super::segmenter::LyricsBlock;

/// Index of the first block whose `[start, end)` holds `position`
///
/// Blocks built from badly ordered timing may overlap or run backwards, so
/// this is a plain scan rather than a binary search.
pub fn block_index_at(blocks: &[LyricsBlock], position: f64) -> Option<usize> {
    blocks
        .iter()
        .position(|b| b.start <= position && position < b.end)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorMove {
    /// Same block (or still none) as the previous update
    Unchanged,
    /// The block under the playhead changed; `None` means a gap or the end
    Changed(Option<usize>),
}

/// Follows a playhead across blocks, reporting only transitions.
///
/// Every update rescans with [`block_index_at`], so a followed playhead always
/// shows the same block as a one-off lookup, overlapping blocks included.
#[derive(Debug, Clone, Default)]
pub struct BlockCursor {
    current: Option<usize>,
}

impl BlockCursor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Move to `position` and report whether the shown block changes
    pub fn update(&mut self, blocks: &[LyricsBlock], position: f64) -> CursorMove {
        let next = block_index_at(blocks, position);
        if next == self.current {
            CursorMove::Unchanged
        } else {
            self.current = next;
            CursorMove::Changed(next)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block(start: f64, end: f64) -> LyricsBlock {
        LyricsBlock {
            lines: [format!("{start}"), " ".to_string()],
            start,
            end,
        }
    }

    fn blocks() -> Vec<LyricsBlock> {
        vec![block(1.0, 3.0), block(3.0, 5.0), block(6.0, 8.0)]
    }

    #[test]
    fn test_block_index_at() {
        let b = blocks();
        assert_eq!(block_index_at(&b, 0.5), None);
        assert_eq!(block_index_at(&b, 1.0), Some(0));
        assert_eq!(block_index_at(&b, 3.0), Some(1));
        assert_eq!(block_index_at(&b, 5.5), None);
        assert_eq!(block_index_at(&b, 7.9), Some(2));
        assert_eq!(block_index_at(&b, 8.0), None);
        assert_eq!(block_index_at(&[], 1.0), None);
    }

    #[test]
    fn test_inverted_block_never_matches() {
        let b = vec![block(5.0, 4.0)];
        assert_eq!(block_index_at(&b, 4.5), None);
    }

    #[test]
    fn test_cursor_reports_transitions() {
        let b = blocks();
        let mut cursor = BlockCursor::new();

        assert_eq!(cursor.update(&b, 0.0), CursorMove::Unchanged);
        assert_eq!(cursor.update(&b, 1.5), CursorMove::Changed(Some(0)));
        assert_eq!(cursor.update(&b, 2.0), CursorMove::Unchanged);
        assert_eq!(cursor.update(&b, 3.5), CursorMove::Changed(Some(1)));
        assert_eq!(cursor.update(&b, 5.5), CursorMove::Changed(None));
        assert_eq!(cursor.update(&b, 6.0), CursorMove::Changed(Some(2)));
        assert_eq!(cursor.update(&b, 9.0), CursorMove::Changed(None));
    }

    #[test]
    fn test_cursor_seek_back() {
        let b = blocks();
        let mut cursor = BlockCursor::new();
        cursor.update(&b, 4.0);
        assert_eq!(cursor.update(&b, 1.0), CursorMove::Changed(Some(0)));
        assert_eq!(cursor.update(&b, 1.5), CursorMove::Unchanged);
    }

    #[test]
    fn test_cursor_agrees_with_lookup_on_overlap() {
        let b = vec![block(5.0, 10.0), block(0.0, 8.0)];
        let mut cursor = BlockCursor::new();

        assert_eq!(cursor.update(&b, 1.0), CursorMove::Changed(Some(1)));
        assert_eq!(cursor.update(&b, 6.0), CursorMove::Changed(Some(0)));
        assert_eq!(block_index_at(&b, 6.0), Some(0));
        assert_eq!(cursor.update(&b, 9.0), CursorMove::Unchanged);
    }
}
