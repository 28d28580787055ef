use std::path::Path;
use tokio::fs;
use tracing::{debug, warn};

use crate::error::{Result, SubtransError};

/// One subtitle cue as read from an SRT file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubtitleRecord {
    id: i64,
    timestamp_range: String,
    pub source_text: String,
    translated_text: Option<String>,
}

impl SubtitleRecord {
    pub fn new<T: Into<String>, S: Into<String>>(id: i64, timestamp_range: T, source_text: S) -> Self {
        Self {
            id,
            timestamp_range: timestamp_range.into(),
            source_text: source_text.into(),
            translated_text: None,
        }
    }

    pub fn id(&self) -> i64 {
        self.id
    }

    /// Timestamp line exactly as found in the source, never interpreted
    pub fn timestamp_range(&self) -> &str {
        &self.timestamp_range
    }

    pub fn translated_text(&self) -> Option<&str> {
        self.translated_text.as_deref()
    }

    pub fn is_translated(&self) -> bool {
        self.translated_text.is_some()
    }

    /// Store the translation; a record accepts exactly one.
    pub fn set_translation<S: Into<String>>(&mut self, text: S) -> Result<()> {
        if self.translated_text.is_some() {
            return Err(SubtransError::AlreadyTranslated(self.id));
        }
        self.translated_text = Some(text.into());
        Ok(())
    }

    /// Render an SRT block with `text` in place of the cue body
    pub fn format_block(&self, text: &str) -> String {
        format!("{}\n{}\n{}\n\n", self.id, self.timestamp_range, text)
    }

    pub fn source_block(&self) -> String {
        self.format_block(&self.source_text)
    }

    /// `None` until a translation has been stored
    pub fn translated_block(&self) -> Option<String> {
        self.translated_text.as_deref().map(|text| self.format_block(text))
    }
}

/// Parse SRT text into records, skipping malformed blocks
pub fn parse_srt(content: &str) -> Vec<SubtitleRecord> {
    let mut records = Vec::new();
    // UTF-8 byte order mark, as written by mkvextract
    let content = content.strip_prefix('\u{feff}').unwrap_or(content);

    for block in split_blocks(content) {
        if block.len() < 3 {
            warn!("Incomplete subtitle block: {:?}", block.join("\n"));
            continue;
        }

        let id = match block[0].parse::<i64>() {
            Ok(id) => id,
            Err(_) => {
                warn!("Invalid subtitle block: {:?}", block.join("\n"));
                continue;
            }
        };

        records.push(SubtitleRecord::new(id, block[1], block[2..].join("\n")));
    }

    debug!("Parsed {} subtitle records", records.len());
    records
}

/// Group trimmed lines into blocks separated by blank lines
fn split_blocks(content: &str) -> Vec<Vec<&str>> {
    let mut blocks = Vec::new();
    let mut current = Vec::new();

    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() {
            if !current.is_empty() {
                blocks.push(std::mem::take(&mut current));
            }
        } else {
            current.push(line);
        }
    }
    if !current.is_empty() {
        blocks.push(current);
    }

    blocks
}

/// Read and parse an SRT file
pub async fn read_srt_file<P: AsRef<Path>>(path: P) -> Result<Vec<SubtitleRecord>> {
    let path = path.as_ref();
    let content = fs::read_to_string(path).await.map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => SubtransError::FileNotFound(path.display().to_string()),
        _ => SubtransError::Io(e),
    })?;

    Ok(parse_srt(&content))
}
