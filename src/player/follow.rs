use std::time::Duration;

use tokio::time::MissedTickBehavior;

use super::clock::PlaybackClock;
use crate::lyrics::{BlockCursor, CursorMove, LyricsBlock};

/// Anything that can report the current playback position in seconds
pub trait Playhead {
    fn position(&self) -> f64;
}

impl Playhead for PlaybackClock {
    fn position(&self) -> f64 {
        PlaybackClock::position(self)
    }
}

const MIN_POLL: Duration = Duration::from_millis(1);

/// Poll `playhead` every `poll` and call `on_change` whenever the block under
/// it changes (`None` for a gap). Returns once the playhead reaches the end of
/// the last block, with the number of changes reported.
pub async fn follow<P, F>(
    blocks: &[LyricsBlock],
    playhead: &P,
    poll: Duration,
    mut on_change: F,
) -> usize
where
    P: Playhead + ?Sized,
    F: FnMut(Option<&LyricsBlock>, f64),
{
    let Some(lyrics_end) = blocks.iter().map(|b| b.end).reduce(f64::max) else {
        return 0;
    };

    let mut cursor = BlockCursor::new();
    let mut ticker = tokio::time::interval(poll.max(MIN_POLL));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut changes = 0;

    loop {
        ticker.tick().await;
        let position = playhead.position();

        if let CursorMove::Changed(index) = cursor.update(blocks, position) {
            changes += 1;
            tracing::debug!(position, ?index, "lyrics block changed");
            on_change(index.and_then(|i| blocks.get(i)), position);
        }

        if position >= lyrics_end {
            break;
        }
    }

    changes
}
