use anyhow::Context;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;

use crate::lyrics::plain::{plain_lyrics, sanitize_plain_lyrics};
use crate::lyrics::{AlignedWord, TimestampPayload};

/// A song's alignment result as stored
#[derive(Debug, Clone, PartialEq)]
pub struct SongRecord {
    pub task_id: String,
    pub audio_id: String,
    /// The aligned-word array as received, as JSON
    pub lyrics_json: String,
    pub plain_lyrics: String,
    pub waveform_json: Option<String>,
    pub hoot_cer: Option<f64>,
    pub is_streamed: Option<bool>,
    pub saved_at: i64,
}

impl SongRecord {
    pub fn from_payload(
        task_id: &str,
        audio_id: &str,
        payload: &TimestampPayload,
        now_unix: i64,
    ) -> anyhow::Result<Self> {
        if payload.aligned_words.is_empty() {
            anyhow::bail!("alignedWords is empty, nothing to store for {task_id}/{audio_id}");
        }

        let waveform_json = payload
            .waveform
            .as_ref()
            .map(serde_json::to_string)
            .transpose()
            .context("serialize waveform")?;

        Ok(Self {
            task_id: task_id.to_string(),
            audio_id: audio_id.to_string(),
            lyrics_json: payload.words_json()?,
            plain_lyrics: plain_lyrics(&payload.aligned_words),
            waveform_json,
            hoot_cer: payload.hoot_cer,
            is_streamed: payload.is_streamed,
            saved_at: now_unix,
        })
    }

    pub fn aligned_words(&self) -> anyhow::Result<Vec<AlignedWord>> {
        Ok(TimestampPayload::from_json(&self.lyrics_json)
            .with_context(|| format!("stored lyrics of {}/{}", self.task_id, self.audio_id))?
            .aligned_words)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SongSummary {
    pub task_id: String,
    pub audio_id: String,
    /// First lyric line, section tags removed
    pub first_line: String,
    pub saved_at: i64,
}

pub struct Storage {
    conn: Connection,
}

impl Storage {
    pub fn open(path: &Path) -> anyhow::Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("create dir {}", parent.display()))?;
        }

        let conn = Connection::open(path).with_context(|| format!("open {}", path.display()))?;
        Self::with_connection(conn)
    }

    #[cfg(test)]
    pub fn open_in_memory() -> anyhow::Result<Self> {
        let conn = Connection::open_in_memory().context("open in-memory database")?;
        Self::with_connection(conn)
    }

    fn with_connection(conn: Connection) -> anyhow::Result<Self> {
        let s = Self { conn };
        s.init_schema()?;
        Ok(s)
    }

    fn init_schema(&self) -> anyhow::Result<()> {
        self.conn
            .execute_batch(
                r#"
CREATE TABLE IF NOT EXISTS songs (
  task_id TEXT NOT NULL,
  audio_id TEXT NOT NULL,
  lyrics_json TEXT NOT NULL,
  plain_lyrics TEXT NOT NULL,
  waveform_json TEXT,
  hoot_cer REAL,
  is_streamed INTEGER,
  saved_at INTEGER NOT NULL,
  PRIMARY KEY (task_id, audio_id)
);

CREATE INDEX IF NOT EXISTS idx_songs_saved_at ON songs(saved_at DESC);
"#,
            )
            .context("init schema")?;
        Ok(())
    }

    /// Insert or replace the alignment result of one song
    pub fn save_song(&self, song: &SongRecord) -> anyhow::Result<()> {
        self.conn
            .execute(
                r#"
INSERT INTO songs(task_id, audio_id, lyrics_json, plain_lyrics, waveform_json, hoot_cer, is_streamed, saved_at)
VALUES(?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
ON CONFLICT(task_id, audio_id) DO UPDATE SET
  lyrics_json=excluded.lyrics_json,
  plain_lyrics=excluded.plain_lyrics,
  waveform_json=excluded.waveform_json,
  hoot_cer=excluded.hoot_cer,
  is_streamed=excluded.is_streamed,
  saved_at=excluded.saved_at
"#,
                params![
                    song.task_id,
                    song.audio_id,
                    song.lyrics_json,
                    song.plain_lyrics,
                    song.waveform_json,
                    song.hoot_cer,
                    song.is_streamed,
                    song.saved_at
                ],
            )
            .context("save song")?;
        Ok(())
    }

    pub fn get_song(&self, task_id: &str, audio_id: &str) -> anyhow::Result<Option<SongRecord>> {
        self.conn
            .query_row(
                r#"
SELECT task_id, audio_id, lyrics_json, plain_lyrics, waveform_json, hoot_cer, is_streamed, saved_at
FROM songs WHERE task_id=?1 AND audio_id=?2
"#,
                params![task_id, audio_id],
                |row| {
                    Ok(SongRecord {
                        task_id: row.get(0)?,
                        audio_id: row.get(1)?,
                        lyrics_json: row.get(2)?,
                        plain_lyrics: row.get(3)?,
                        waveform_json: row.get(4)?,
                        hoot_cer: row.get(5)?,
                        is_streamed: row.get(6)?,
                        saved_at: row.get(7)?,
                    })
                },
            )
            .optional()
            .context("get song")
    }

    /// Stored songs, most recently saved first
    pub fn list_songs(&self, limit: usize) -> anyhow::Result<Vec<SongSummary>> {
        let mut stmt = self
            .conn
            .prepare(
                r#"
SELECT task_id, audio_id, plain_lyrics, saved_at
FROM songs
ORDER BY saved_at DESC, task_id, audio_id
LIMIT ?1
"#,
            )
            .context("prepare list songs")?;

        let songs = stmt
            .query_map(params![limit as i64], |row| {
                let plain: String = row.get(2)?;
                let first_line = sanitize_plain_lyrics(&plain)
                    .lines()
                    .next()
                    .unwrap_or_default()
                    .to_string();
                Ok(SongSummary {
                    task_id: row.get(0)?,
                    audio_id: row.get(1)?,
                    first_line,
                    saved_at: row.get(3)?,
                })
            })
            .context("list songs")?
            .collect::<Result<Vec<_>, _>>()
            .context("read song row")?;

        Ok(songs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload() -> TimestampPayload {
        TimestampPayload::from_json(
            r#"{ "data": {
                "alignedWords": [
                    { "word": "[Verse]\n별빛 ", "startS": 0.5, "endS": 1.0 },
                    { "word": "아래\n", "startS": 1.0, "endS": 1.5 }
                ],
                "waveformData": [0.5, 1.0],
                "hootCer": 0.25,
                "isStreamed": true
            } }"#,
        )
        .unwrap()
    }

    #[test]
    fn test_save_and_get() {
        let storage = Storage::open_in_memory().unwrap();
        let song = SongRecord::from_payload("task-1", "audio-1", &payload(), 100).unwrap();
        assert_eq!(song.plain_lyrics, "[Verse]\n별빛 아래");
        assert_eq!(song.waveform_json.as_deref(), Some("[0.5,1.0]"));

        storage.save_song(&song).unwrap();
        let loaded = storage.get_song("task-1", "audio-1").unwrap().unwrap();
        assert_eq!(loaded, song);
        assert_eq!(loaded.aligned_words().unwrap(), payload().aligned_words);

        assert!(storage.get_song("task-1", "other").unwrap().is_none());
    }

    #[test]
    fn test_save_replaces_existing() {
        let storage = Storage::open_in_memory().unwrap();
        let mut song = SongRecord::from_payload("t", "a", &payload(), 100).unwrap();
        storage.save_song(&song).unwrap();

        song.hoot_cer = None;
        song.saved_at = 200;
        storage.save_song(&song).unwrap();

        let loaded = storage.get_song("t", "a").unwrap().unwrap();
        assert_eq!(loaded.hoot_cer, None);
        assert_eq!(loaded.saved_at, 200);
        assert_eq!(storage.list_songs(10).unwrap().len(), 1);
    }

    #[test]
    fn test_list_songs_newest_first() {
        let storage = Storage::open_in_memory().unwrap();
        for (task, at) in [("old", 1), ("new", 3), ("mid", 2)] {
            let song = SongRecord::from_payload(task, "a", &payload(), at).unwrap();
            storage.save_song(&song).unwrap();
        }

        let songs = storage.list_songs(2).unwrap();
        let tasks: Vec<_> = songs.iter().map(|s| s.task_id.as_str()).collect();
        assert_eq!(tasks, vec!["new", "mid"]);
        assert_eq!(songs[0].first_line, "별빛 아래");
    }

    #[test]
    fn test_stores_received_words_verbatim() {
        let payload = TimestampPayload::from_json(
            r#"[{ "word": "hi\\nthere", "startS": 0, "endS": 1, "palign": 0.9, "lang": "ko" }]"#,
        )
        .unwrap();
        let song = SongRecord::from_payload("t", "a", &payload, 0).unwrap();

        let stored: serde_json::Value = serde_json::from_str(&song.lyrics_json).unwrap();
        assert_eq!(stored[0]["lang"], "ko");
        assert_eq!(stored[0]["word"], "hi\\nthere");
        assert_eq!(song.aligned_words().unwrap()[0].word, "hi\nthere");
    }

    #[test]
    fn test_empty_payload_is_rejected() {
        let empty = TimestampPayload::default();
        assert!(SongRecord::from_payload("t", "a", &empty, 0).is_err());
    }
}
