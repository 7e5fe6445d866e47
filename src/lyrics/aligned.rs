//! Word-level timing payloads
//!
//! The alignment service answers with an envelope:
//! { "data": { "alignedWords": [ { "word": "별빛 ", "startS": 1.2, "endS": 1.5 }, ... ] } }
//!
//! Stored songs keep only the bare `alignedWords` array, so both shapes decode.

use anyhow::Context;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// A text fragment with the time span it is sung over
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlignedWord {
    /// Fragment text, may carry line breaks and section tags like "[Verse]"
    #[serde(default, deserialize_with = "lenient_text")]
    pub word: String,
    /// Start time in seconds
    #[serde(rename = "startS", default, deserialize_with = "lenient_seconds")]
    pub start_s: f64,
    /// End time in seconds
    #[serde(rename = "endS", default, deserialize_with = "lenient_seconds")]
    pub end_s: f64,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "lenient_flag")]
    pub success: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "lenient_score")]
    pub palign: Option<f64>,
}

#[cfg(test)]
impl AlignedWord {
    pub fn new(word: impl Into<String>, start_s: f64, end_s: f64) -> Self {
        Self {
            word: word.into(),
            start_s,
            end_s,
            success: None,
            palign: None,
        }
    }
}

/// Decoded timing payload
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TimestampPayload {
    pub aligned_words: Vec<AlignedWord>,
    /// `alignedWords` exactly as received
    pub raw_words: Option<Value>,
    /// `waveformData`, kept verbatim
    pub waveform: Option<Value>,
    pub hoot_cer: Option<f64>,
    pub is_streamed: Option<bool>,
}

impl TimestampPayload {
    /// Parse either the service envelope or a bare aligned-word array
    pub fn from_json(raw: &str) -> anyhow::Result<Self> {
        let root: Value = serde_json::from_str(raw).context("parse timing payload")?;

        match root {
            Value::Array(_) => Ok(Self {
                aligned_words: decode_words(root.clone())?,
                raw_words: Some(root),
                ..Self::default()
            }),
            Value::Object(mut obj) => {
                // Callers sometimes hand over `data` already unwrapped.
                let mut data = match obj.remove("data") {
                    Some(Value::Object(data)) => data,
                    Some(_) => anyhow::bail!("timing payload: `data` is not an object"),
                    None => obj,
                };

                let raw_words = match data.remove("alignedWords") {
                    Some(words @ Value::Array(_)) => words,
                    _ => anyhow::bail!("timing payload: `alignedWords` missing or not an array"),
                };

                Ok(Self {
                    aligned_words: decode_words(raw_words.clone())?,
                    raw_words: Some(raw_words),
                    waveform: data.remove("waveformData").filter(|v| !v.is_null()),
                    hoot_cer: data.get("hootCer").and_then(Value::as_f64),
                    is_streamed: data.get("isStreamed").and_then(Value::as_bool),
                })
            }
            _ => anyhow::bail!("timing payload: expected an object or an array"),
        }
    }

    /// Serialize the aligned words alone, the form songs are stored in.
    /// The received array is kept as is when there is one.
    pub fn words_json(&self) -> anyhow::Result<String> {
        match &self.raw_words {
            Some(raw) => serde_json::to_string(raw),
            None => serde_json::to_string(&self.aligned_words),
        }
        .context("serialize aligned words")
    }
}

fn decode_words(words: Value) -> anyhow::Result<Vec<AlignedWord>> {
    serde_json::from_value(words).context("decode aligned words")
}

/// Turn a literal backslash-n (double escaped upstream) into a line break
pub fn normalize_line_breaks(text: &str) -> String {
    text.replace("\\n", "\n")
}

fn lenient_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let text = match Value::deserialize(deserializer)? {
        Value::Null => String::new(),
        Value::String(s) => s,
        other => other.to_string(),
    };
    Ok(normalize_line_breaks(&text))
}

fn lenient_seconds<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let secs = match Value::deserialize(deserializer)? {
        Value::Number(n) => n.as_f64().unwrap_or(0.0),
        Value::String(s) => s.trim().parse().unwrap_or(0.0),
        _ => 0.0,
    };
    Ok(secs)
}

fn lenient_flag<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Value::deserialize(deserializer)?.as_bool())
}

fn lenient_score<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let score = match Value::deserialize(deserializer)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    };
    Ok(score)
}
