//! Translation of whole subtitle files.
//! This module wires SRT loading, backend calls and output writing.

use crate::srt::{self, SrtBlock};
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use std::path::Path;
use tracing::{debug, info, trace};

pub mod google;
pub mod openai;

/// Default number of subtitle blocks sent to the backend per batch.
pub const DEFAULT_BATCH_SIZE: usize = 50;

/// How many times a batch is sent before the file is given up.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Locale of the input subtitles.
pub const SOURCE_LOCALE: &str = "en";

/// Locale the subtitles are translated into.
pub const TARGET_LOCALE: &str = "ru";

/// Represents the text of one block paired with its SRT index.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexedLine {
    /// SRT index associated with the line.
    pub index: u32,
    /// Text content; multi-line blocks are joined with `\n`.
    pub text: String,
}

/// A text translation backend.
#[async_trait]
pub trait Translator: Send + Sync {
    /// Translate `lines` from `source` to `target`, returning one line per
    /// input line in the same order.
    async fn translate_batch(
        &self,
        lines: &[IndexedLine],
        source: &str,
        target: &str,
    ) -> Result<Vec<IndexedLine>>;
}

/// Translates one subtitle file into another. This is the unit of work the
/// runner executes per task.
#[async_trait]
pub trait FileTranslator: Send + Sync {
    /// Translate `input` and write the result to `output`. Returns the
    /// number of subtitle blocks written.
    async fn translate_file(&self, input: &Path, output: &Path) -> Result<usize>;
}

/// Loads an SRT file, translates its text in batches and saves a copy with
/// the same indices and timing.
pub struct SrtFileTranslator<T> {
    translator: T,
    batch_size: usize,
    max_attempts: u32,
}

impl<T: Translator> SrtFileTranslator<T> {
    pub fn new(translator: T) -> Self {
        Self {
            translator,
            batch_size: DEFAULT_BATCH_SIZE,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    /// Replace the text of every non-empty block with its translation.
    async fn translate_blocks(&self, blocks: &mut [SrtBlock]) -> Result<()> {
        let total = blocks.len();
        let mut done = 0;
        for chunk in blocks.chunks_mut(self.batch_size) {
            let positions: Vec<usize> = chunk
                .iter()
                .enumerate()
                .filter(|(_, b)| b.text.iter().any(|l| !l.trim().is_empty()))
                .map(|(i, _)| i)
                .collect();
            let lines: Vec<IndexedLine> = positions
                .iter()
                .map(|&i| IndexedLine {
                    index: chunk[i].index,
                    text: chunk[i].text.join("\n"),
                })
                .collect();
            if !lines.is_empty() {
                let translated = self.translate_with_retry(&lines).await?;
                for (&i, line) in positions.iter().zip(translated) {
                    chunk[i].text = text_lines(&line.text);
                }
            }
            done += chunk.len();
            debug!("translated blocks {done}/{total}");
        }
        Ok(())
    }

    /// Send one batch, resending it when the backend fails, returns the
    /// wrong number of lines or leaves a block without text.
    async fn translate_with_retry(&self, lines: &[IndexedLine]) -> Result<Vec<IndexedLine>> {
        let first = lines.first().map(|l| l.index).unwrap_or_default();
        let last = lines.last().map(|l| l.index).unwrap_or_default();
        let mut last_err = anyhow!("no attempt made");
        for attempt in 1..=self.max_attempts {
            trace!("blocks {first}-{last} attempt {attempt}");
            match self
                .translator
                .translate_batch(lines, SOURCE_LOCALE, TARGET_LOCALE)
                .await
            {
                Ok(translated) if translated.len() != lines.len() => {
                    last_err = anyhow!(
                        "backend returned {} lines for {}",
                        translated.len(),
                        lines.len()
                    );
                }
                Ok(translated) => {
                    match translated.iter().find(|l| text_lines(&l.text).is_empty()) {
                        Some(empty) => {
                            last_err = anyhow!("empty translation for block {}", empty.index);
                        }
                        None => return Ok(translated),
                    }
                }
                Err(err) => last_err = err,
            }
            if attempt < self.max_attempts {
                info!("retrying blocks {first}-{last} after error: {last_err:#}");
            }
        }
        Err(last_err.context(format!(
            "blocks {first}-{last} failed after {} attempts",
            self.max_attempts
        )))
    }
}

/// Split translated text into block lines. Blank lines are dropped since
/// they would end the block in the written file.
fn text_lines(text: &str) -> Vec<String> {
    text.lines()
        .filter(|l| !l.trim().is_empty())
        .map(|l| l.to_string())
        .collect()
}

#[async_trait]
impl<T: Translator> FileTranslator for SrtFileTranslator<T> {
    async fn translate_file(&self, input: &Path, output: &Path) -> Result<usize> {
        trace!(
            "translate_file input={} output={}",
            input.display(),
            output.display()
        );
        let mut blocks = srt::load(input)?;
        self.translate_blocks(&mut blocks).await?;
        srt::save(&blocks, output)?;
        Ok(blocks.len())
    }
}
