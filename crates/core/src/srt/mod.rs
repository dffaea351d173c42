//! This module is responsible for SRT parsing and writing.
//! It exposes helpers to read and write SRT blocks while preserving timing.

use anyhow::{anyhow, Context, Result};
use std::fs;
use std::path::Path;
use tracing::trace;

/// Represents a single SRT block (index, time range, text lines).
#[derive(Debug, Clone, PartialEq)]
pub struct SrtBlock {
    pub index: u32,
    pub start_ms: u64,
    pub end_ms: u64,
    pub text: Vec<String>,
}

/// Parse SRT text into a list of blocks.
/// Indices, times and text lines are kept in file order. A leading BOM,
/// CRLF endings and runs of blank lines between blocks are accepted.
pub fn parse(input: &str) -> Result<Vec<SrtBlock>> {
    let input = input.strip_prefix('\u{feff}').unwrap_or(input);
    let mut blocks = Vec::new();
    let mut lines = input.lines();
    loop {
        let index_line = match lines.next() {
            Some(l) if !l.trim().is_empty() => l.trim(),
            Some(_) => continue,
            None => break,
        };
        let index: u32 = index_line
            .parse()
            .with_context(|| format!("bad block index {index_line:?}"))?;
        let time_line = lines
            .next()
            .ok_or_else(|| anyhow!("block {index}: missing time"))?;
        let (start_ms, end_ms) =
            parse_times(time_line).with_context(|| format!("block {index}: bad time range"))?;
        let mut text = Vec::new();
        for line in lines.by_ref() {
            if line.trim().is_empty() {
                break;
            }
            text.push(line.to_string());
        }
        blocks.push(SrtBlock {
            index,
            start_ms,
            end_ms,
            text,
        });
    }
    Ok(blocks)
}

/// Format SRT blocks back to text.
/// Each block is written sequentially, followed by a blank line.
pub fn format(blocks: &[SrtBlock]) -> String {
    let mut out = String::new();
    for block in blocks {
        out.push_str(&format!(
            "{}\n{} --> {}\n{}\n\n",
            block.index,
            format_time(block.start_ms),
            format_time(block.end_ms),
            block.text.join("\n")
        ));
    }
    out
}

/// Read and parse an SRT file.
pub fn load(path: &Path) -> Result<Vec<SrtBlock>> {
    trace!("load path={}", path.display());
    let content =
        fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    parse(&content).with_context(|| format!("parsing {}", path.display()))
}

/// Format and write blocks to `path`, replacing any existing file.
pub fn save(blocks: &[SrtBlock], path: &Path) -> Result<()> {
    trace!("save path={} blocks={}", path.display(), blocks.len());
    fs::write(path, format(blocks)).with_context(|| format!("writing {}", path.display()))
}

/// Parse a time range like `00:00:01,000 --> 00:00:02,000` to milliseconds.
/// Anything after the end time (position hints) is ignored.
fn parse_times(line: &str) -> Result<(u64, u64)> {
    let mut parts = line.trim().split("-->");
    let start = parts.next().ok_or_else(|| anyhow!("no start"))?.trim();
    let end = parts
        .next()
        .and_then(|e| e.split_whitespace().next())
        .ok_or_else(|| anyhow!("no end"))?;
    Ok((parse_time(start)?, parse_time(end)?))
}

/// Parse `HH:MM:SS,mmm` into milliseconds. A `.` before the milliseconds is
/// accepted as well. Minutes and seconds must be below 60, milliseconds
/// below 1000.
fn parse_time(t: &str) -> Result<u64> {
    let parts: Vec<&str> = t.split([':', ',', '.']).collect();
    if parts.len() != 4 {
        return Err(anyhow!("bad time {t:?}"));
    }
    let h: u64 = parts[0].parse()?;
    let m: u64 = parts[1].parse()?;
    let s: u64 = parts[2].parse()?;
    let ms: u64 = parts[3].parse()?;
    if m >= 60 || s >= 60 || ms >= 1000 {
        return Err(anyhow!("time field out of range in {t:?}"));
    }
    h.checked_mul(3_600_000)
        .and_then(|v| v.checked_add((m * 60 + s) * 1000 + ms))
        .ok_or_else(|| anyhow!("time {t:?} is too large"))
}

/// Format milliseconds back to `HH:MM:SS,mmm`.
fn format_time(ms: u64) -> String {
    let h = ms / 3_600_000;
    let m = (ms % 3_600_000) / 60_000;
    let s = (ms % 60_000) / 1000;
    let ms = ms % 1000;
    format!("{h:02}:{m:02}:{s:02},{ms:03}")
}
